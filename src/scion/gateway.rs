//! SCION IP gateway (SIG) configuration.
//!
//! Gateways are stored in a [`GatewayTable`] whose capacity is checked on
//! insertion. The limit is currently one gateway per AS.

use super::error::ScionError;
use super::ia::{Asn, IsdAsn};
use indexmap::IndexMap;
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_CTRL_PORT: u16 = 30256;
pub const DEFAULT_DATA_PORT: u16 = 30056;
pub const DEFAULT_PROBE_PORT: u16 = 30856;

/// Gateways supported per AS
pub const MAX_GATEWAYS_PER_AS: usize = 1;

/// Version stamped into generated traffic policies
const TRAFFIC_POLICY_VERSION: u32 = 9001;

/// Remote network reachable through a gateway of another AS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayRemote {
    pub ia: IsdAsn,
    pub net: Ipv4Net,
}

/// Configuration of one gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub name: String,
    /// Host node the gateway runs on
    pub host: String,
    pub local_net: Ipv4Net,
    #[serde(default)]
    pub remotes: Vec<GatewayRemote>,
    #[serde(default = "default_ctrl_port")]
    pub ctrl_port: u16,
    #[serde(default = "default_data_port")]
    pub data_port: u16,
    #[serde(default = "default_probe_port")]
    pub probe_port: u16,
    #[serde(default = "default_debug_level")]
    pub debug_level: String,
}

fn default_ctrl_port() -> u16 {
    DEFAULT_CTRL_PORT
}

fn default_data_port() -> u16 {
    DEFAULT_DATA_PORT
}

fn default_probe_port() -> u16 {
    DEFAULT_PROBE_PORT
}

fn default_debug_level() -> String {
    "debug".to_string()
}

impl GatewayConfig {
    /// Gateway with default ports and debug level
    pub fn new(name: impl Into<String>, host: impl Into<String>, local_net: Ipv4Net) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            local_net,
            remotes: Vec::new(),
            ctrl_port: DEFAULT_CTRL_PORT,
            data_port: DEFAULT_DATA_PORT,
            probe_port: DEFAULT_PROBE_PORT,
            debug_level: default_debug_level(),
        }
    }

    pub fn remote(mut self, ia: impl Into<IsdAsn>, net: Ipv4Net) -> Self {
        self.remotes.push(GatewayRemote { ia: ia.into(), net });
        self
    }

    pub fn ports(mut self, ctrl_port: u16, data_port: u16, probe_port: u16) -> Self {
        self.ctrl_port = ctrl_port;
        self.data_port = data_port;
        self.probe_port = probe_port;
        self
    }

    pub fn debug_level(mut self, level: impl Into<String>) -> Self {
        self.debug_level = level.into();
        self
    }

    fn port_triple(&self) -> [u16; 3] {
        [self.ctrl_port, self.data_port, self.probe_port]
    }

    /// Traffic policy consumed by the gateway: remote ASes and their networks
    pub fn traffic_policy(&self) -> TrafficPolicy {
        let mut ases: BTreeMap<String, TrafficPolicyNets> = BTreeMap::new();
        for remote in &self.remotes {
            ases.entry(remote.ia.to_string())
                .or_default()
                .nets
                .push(remote.net);
        }
        TrafficPolicy {
            ases,
            config_version: TRAFFIC_POLICY_VERSION,
        }
    }
}

/// Serialized as the gateway's `sig.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficPolicy {
    #[serde(rename = "ASes")]
    pub ases: BTreeMap<String, TrafficPolicyNets>,
    #[serde(rename = "ConfigVersion")]
    pub config_version: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficPolicyNets {
    #[serde(rename = "Nets")]
    pub nets: Vec<Ipv4Net>,
}

/// Gateways of one AS, bounded in size
#[derive(Debug, Clone)]
pub struct GatewayTable {
    limit: usize,
    gateways: IndexMap<String, GatewayConfig>,
}

impl Default for GatewayTable {
    fn default() -> Self {
        Self::with_limit(MAX_GATEWAYS_PER_AS)
    }
}

impl GatewayTable {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            gateways: IndexMap::new(),
        }
    }

    /// Store a gateway configuration.
    ///
    /// Port collisions with gateways on the same host are checked before the
    /// capacity limit.
    pub fn insert(&mut self, asn: Asn, config: GatewayConfig) -> Result<(), ScionError> {
        let ports = config.port_triple();
        for (i, port) in ports.iter().enumerate() {
            if ports[..i].contains(port) {
                return Err(ScionError::PortConflict {
                    host: config.host.clone(),
                    port: *port,
                });
            }
        }
        for existing in self.gateways.values().filter(|gw| gw.host == config.host) {
            if let Some(port) = ports.iter().find(|port| existing.port_triple().contains(*port)) {
                return Err(ScionError::PortConflict {
                    host: config.host.clone(),
                    port: *port,
                });
            }
        }
        if self.gateways.len() >= self.limit || self.gateways.contains_key(&config.name) {
            return Err(ScionError::Capacity {
                asn,
                limit: self.limit,
            });
        }
        self.gateways.insert(config.name.clone(), config);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&GatewayConfig, ScionError> {
        self.gateways.get(name).ok_or_else(|| ScionError::NotFound {
            kind: "gateway",
            name: name.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &GatewayConfig> {
        self.gateways.values()
    }

    pub fn len(&self) -> usize {
        self.gateways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> Ipv4Net {
        s.parse().unwrap()
    }

    #[test]
    fn test_single_gateway_limit() {
        let mut table = GatewayTable::default();
        table.insert(150, GatewayConfig::new("sig0", "sig0", net("172.16.11.0/24"))).unwrap();
        let err = table
            .insert(
                150,
                GatewayConfig::new("sig1", "other", net("172.16.12.0/24")),
            )
            .unwrap_err();
        assert_eq!(err, ScionError::Capacity { asn: 150, limit: 1 });
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_port_conflict_on_same_host() {
        let mut table = GatewayTable::default();
        table.insert(150, GatewayConfig::new("sig0", "sig", net("172.16.11.0/24"))).unwrap();
        let err = table
            .insert(
                150,
                GatewayConfig::new("sig1", "sig", net("172.16.11.0/24")).ports(30256, 40000, 40001),
            )
            .unwrap_err();
        assert_eq!(
            err,
            ScionError::PortConflict {
                host: "sig".to_string(),
                port: 30256
            }
        );
    }

    #[test]
    fn test_ports_checked_across_roles_with_raised_limit() {
        let mut table = GatewayTable::with_limit(2);
        table.insert(150, GatewayConfig::new("sig0", "sig", net("172.16.11.0/24"))).unwrap();
        // data port of the new gateway equals the control port of the existing one
        let err = table
            .insert(
                150,
                GatewayConfig::new("sig1", "sig", net("172.16.13.0/24")).ports(40000, 30256, 40001),
            )
            .unwrap_err();
        assert!(matches!(err, ScionError::PortConflict { port: 30256, .. }));

        table
            .insert(
                150,
                GatewayConfig::new("sig1", "sig", net("172.16.13.0/24")).ports(40000, 40001, 40002),
            )
            .unwrap();
        // same ports on a different host are fine, but the table is now full
        let err = table
            .insert(150, GatewayConfig::new("sig2", "other", net("172.16.14.0/24")))
            .unwrap_err();
        assert!(matches!(err, ScionError::Capacity { limit: 2, .. }));
    }

    #[test]
    fn test_ports_within_one_gateway_must_differ() {
        let mut table = GatewayTable::default();
        let err = table
            .insert(
                150,
                GatewayConfig::new("sig0", "sig", net("172.16.11.0/24")).ports(30256, 30256, 30856),
            )
            .unwrap_err();
        assert!(matches!(err, ScionError::PortConflict { .. }));
        assert!(table.is_empty());
    }

    #[test]
    fn test_get_missing_gateway() {
        let table = GatewayTable::default();
        assert_eq!(
            table.get("sig0").unwrap_err(),
            ScionError::NotFound {
                kind: "gateway",
                name: "sig0".to_string()
            }
        );
    }

    #[test]
    fn test_traffic_policy() {
        let config = GatewayConfig::new("sig0", "sig", net("172.16.12.0/24"))
            .remote((1, 150), net("172.16.11.0/24"))
            .remote((1, 152), net("172.16.14.0/24"));
        let json = serde_json::to_value(config.traffic_policy()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ASes": {
                    "1-150": {"Nets": ["172.16.11.0/24"]},
                    "1-152": {"Nets": ["172.16.14.0/24"]}
                },
                "ConfigVersion": 9001
            })
        );
    }

    #[test]
    fn test_yaml_defaults() {
        let config: GatewayConfig = serde_yaml::from_str(
            "name: sig0\nhost: sig\nlocal_net: 172.16.11.0/24\nremotes:\n  - ia: 1-153\n    net: 172.16.12.0/24\n",
        )
        .unwrap();
        assert_eq!(config.ctrl_port, DEFAULT_CTRL_PORT);
        assert_eq!(config.data_port, DEFAULT_DATA_PORT);
        assert_eq!(config.probe_port, DEFAULT_PROBE_PORT);
        assert_eq!(config.debug_level, "debug");
        assert_eq!(config.remotes[0].ia, IsdAsn::new(1, 153));
    }
}
