//! YAML configuration of a SCION topology.
//!
//! A configuration declares the ISDs, the internet exchanges, every AS with
//! its networks, nodes and SCION settings, and the inter-AS links. It is
//! parsed with `serde_yaml` and checked by [`Config::validate`] before
//! anything is built from it.

use crate::scion::{Asn, BeaconingIntervals, GatewayConfig, Isd, IsdAsn, LinkType, PolicyKind};
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Complete topology configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    pub isds: Vec<Isd>,
    #[serde(default)]
    pub internet_exchanges: Vec<ExchangeConfig>,
    pub ases: Vec<AsConfig>,
    #[serde(default)]
    pub links: Vec<LinkConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Set `remote_interface_id` on peering links (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_remote_interface_ids: Option<bool>,
}

impl GeneralConfig {
    pub fn peer_remote_interface_ids(&self) -> bool {
        self.peer_remote_interface_ids.unwrap_or(true)
    }
}

/// Internet exchange; its shared network is named `ix<id>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<Ipv4Net>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsConfig {
    pub asn: Asn,
    pub isds: Vec<MembershipConfig>,
    #[serde(default)]
    pub networks: Vec<NetworkConfig>,
    #[serde(default)]
    pub control_services: Vec<NodeConfig>,
    #[serde(default)]
    pub hosts: Vec<NodeConfig>,
    #[serde(default)]
    pub routers: Vec<RouterConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beaconing: Option<BeaconingConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub gateways: Vec<GatewayConfig>,
    /// Emit `staticInfoConfig.json` for this AS
    #[serde(default)]
    pub generate_static_info_config: bool,
}

impl AsConfig {
    /// Names of all routers, hosts and control services
    fn node_names(&self) -> impl Iterator<Item = &str> {
        self.routers
            .iter()
            .map(|r| r.name.as_str())
            .chain(self.hosts.iter().map(|h| h.name.as_str()))
            .chain(self.control_services.iter().map(|cs| cs.name.as_str()))
    }

    /// Networks joined by hosts and control services, with the node name
    fn node_networks(&self) -> impl Iterator<Item = (&str, &str)> {
        self.hosts
            .iter()
            .chain(self.control_services.iter())
            .flat_map(|node| node.networks.iter().map(move |n| (node.name.as_str(), n.as_str())))
    }

    /// Networks joined by border routers, with the router name
    fn router_networks(&self) -> impl Iterator<Item = (&str, &str)> {
        self.routers
            .iter()
            .flat_map(|r| r.networks.iter().map(move |n| (r.name.as_str(), n.as_str())))
    }
}

/// Membership of an AS in an ISD
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipConfig {
    pub isd: Isd,
    #[serde(default)]
    pub core: bool,
    /// Explicit attributes; overrides the ones implied by `core`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<Ipv4Net>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
}

/// Host or control-service node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub name: String,
    #[serde(default)]
    pub networks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    pub name: String,
    #[serde(default)]
    pub networks: Vec<String>,
    #[serde(default)]
    pub cross_connects: Vec<CrossConnectConfig>,
}

/// One side of a physical point-to-point connection between border routers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossConnectConfig {
    pub peer_asn: Asn,
    pub peer_router: String,
    /// Local address with the prefix length of the link network
    pub address: Ipv4Net,
    /// Link network name; derived from both endpoints when omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
}

/// Beaconing settings; the intervals sit directly in this mapping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeaconingConfig {
    #[serde(flatten)]
    pub intervals: BeaconingIntervals,
    #[serde(default)]
    pub policies: BTreeMap<PolicyKind, serde_yaml::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMedium {
    CrossConnect,
    Exchange,
}

/// Declared inter-AS link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    pub kind: LinkMedium,
    /// Exchange id; required for exchange links
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<u32>,
    pub a: IsdAsn,
    pub b: IsdAsn,
    #[serde(rename = "type")]
    pub link_type: LinkType,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a_router: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b_router: Option<String>,
}

fn default_count() -> u32 {
    1
}

/// Exchange id of an `ix<id>` network name
pub fn exchange_id(network: &str) -> Option<u32> {
    network.strip_prefix("ix")?.parse().ok()
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("ISD {0} is declared more than once")]
    DuplicateIsd(Isd),
    #[error("AS {0} is declared more than once")]
    DuplicateAs(Asn),
    #[error("internet exchange {0} is declared more than once")]
    DuplicateExchange(u32),
    #[error("AS {asn} is not a member of any ISD")]
    NoMembership { asn: Asn },
    #[error("AS {asn} joins undeclared ISD {isd}")]
    UndeclaredIsd { asn: Asn, isd: Isd },
    #[error("AS {asn} declares {name} more than once")]
    DuplicateName { asn: Asn, name: String },
    #[error("node {node} of AS {asn} joins unknown network {network}")]
    UnknownNetwork { asn: Asn, node: String, network: String },
    #[error("cannot derive a default prefix for {0}; set one explicitly")]
    AddressTemplate(String),
    #[error("invalid MTU for {0}")]
    InvalidMtu(String),
    #[error("invalid link {index}: {reason}")]
    InvalidLink { index: usize, reason: String },
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut isds = HashSet::new();
        for isd in &self.isds {
            if !isds.insert(*isd) {
                return Err(ValidationError::DuplicateIsd(*isd));
            }
        }

        let mut exchanges = HashSet::new();
        for ix in &self.internet_exchanges {
            if !exchanges.insert(ix.id) {
                return Err(ValidationError::DuplicateExchange(ix.id));
            }
            if ix.prefix.is_none() && ix.id > 255 {
                return Err(ValidationError::AddressTemplate(format!("IX{}", ix.id)));
            }
            if ix.mtu == Some(0) {
                return Err(ValidationError::InvalidMtu(format!("IX{}", ix.id)));
            }
        }

        let mut asns = HashSet::new();
        for as_ in &self.ases {
            if !asns.insert(as_.asn) {
                return Err(ValidationError::DuplicateAs(as_.asn));
            }
            Self::validate_as(as_, &isds, &exchanges)?;
        }

        for (index, link) in self.links.iter().enumerate() {
            Self::validate_link(index, link, &exchanges)?;
        }
        Ok(())
    }

    fn validate_as(as_: &AsConfig, isds: &HashSet<Isd>, exchanges: &HashSet<u32>) -> Result<(), ValidationError> {
        let asn = as_.asn;
        if as_.isds.is_empty() {
            return Err(ValidationError::NoMembership { asn });
        }
        let mut memberships = HashSet::new();
        for membership in &as_.isds {
            if !isds.contains(&membership.isd) {
                return Err(ValidationError::UndeclaredIsd { asn, isd: membership.isd });
            }
            if !memberships.insert(membership.isd) {
                return Err(ValidationError::DuplicateName {
                    asn,
                    name: format!("ISD {}", membership.isd),
                });
            }
        }

        let mut networks = HashSet::new();
        for (index, net) in as_.networks.iter().enumerate() {
            if !networks.insert(net.name.as_str()) {
                return Err(ValidationError::DuplicateName {
                    asn,
                    name: net.name.clone(),
                });
            }
            if net.prefix.is_none() && (asn > 255 || index > 255) {
                return Err(ValidationError::AddressTemplate(format!("network {} of AS {}", net.name, asn)));
            }
            if net.mtu == Some(0) {
                return Err(ValidationError::InvalidMtu(format!("network {} of AS {}", net.name, asn)));
            }
        }

        let mut names = HashSet::new();
        for name in as_.node_names() {
            if !names.insert(name) {
                return Err(ValidationError::DuplicateName {
                    asn,
                    name: name.to_string(),
                });
            }
        }

        // Only border routers attach to internet exchanges
        let unknown = |node: &str, network: &str| ValidationError::UnknownNetwork {
            asn,
            node: node.to_string(),
            network: network.to_string(),
        };
        for (node, network) in as_.node_networks() {
            if !networks.contains(network) {
                return Err(unknown(node, network));
            }
        }
        for (router, network) in as_.router_networks() {
            let on_exchange = exchange_id(network).is_some_and(|id| exchanges.contains(&id));
            if !networks.contains(network) && !on_exchange {
                return Err(unknown(router, network));
            }
        }

        for router in &as_.routers {
            for xc in &router.cross_connects {
                if xc.mtu == Some(0) {
                    return Err(ValidationError::InvalidMtu(format!(
                        "cross-connect {} of AS {} to AS {}",
                        router.name, asn, xc.peer_asn
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_link(index: usize, link: &LinkConfig, exchanges: &HashSet<u32>) -> Result<(), ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidLink { index, reason };
        if link.count == 0 {
            return Err(invalid("count must be at least 1".to_string()));
        }
        match (link.kind, link.exchange) {
            (LinkMedium::Exchange, None) => Err(invalid("exchange links need an exchange id".to_string())),
            (LinkMedium::Exchange, Some(id)) if !exchanges.contains(&id) => {
                Err(invalid(format!("internet exchange {} is not declared", id)))
            }
            (LinkMedium::CrossConnect, Some(_)) => {
                Err(invalid("cross-connect links cannot name an exchange".to_string()))
            }
            _ => Ok(()),
        }
    }
}
