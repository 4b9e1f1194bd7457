//! SCION-enabled autonomous system.
//!
//! Besides the networks, routers and hosts an AS owns in the emulation, this
//! holds the AS configuration state: per-ISD attributes, beaconing settings,
//! gateways, control services and the interface id allocator. MTU and master
//! keys are frozen by [`ScionAutonomousSystem::configure`].

use super::error::ScionError;
use super::gateway::{GatewayConfig, GatewayTable};
use super::ia::{Asn, Isd, IsdAsn};
use crate::emulation::{Network, Node, Router};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

/// Attributes given to core ASes unless configured explicitly
pub const CORE_ATTRIBUTES: [&str; 4] = ["authoritative", "core", "issuing", "voting"];

/// Beaconing intervals. `None` keeps the control service default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconingIntervals {
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub origination: Option<Duration>,
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub propagation: Option<Duration>,
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub registration: Option<Duration>,
}

/// Kinds of beaconing policy a control service accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Propagation,
    CoreRegistration,
    UpRegistration,
    DownRegistration,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 4] = [
        PolicyKind::Propagation,
        PolicyKind::CoreRegistration,
        PolicyKind::UpRegistration,
        PolicyKind::DownRegistration,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::Propagation => "propagation",
            PolicyKind::CoreRegistration => "core_registration",
            PolicyKind::UpRegistration => "up_registration",
            PolicyKind::DownRegistration => "down_registration",
        }
    }
}

impl Display for PolicyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two AS master secrets
#[derive(Clone, PartialEq, Eq)]
pub struct MasterKeys {
    pub master0: [u8; 16],
    pub master1: [u8; 16],
}

impl MasterKeys {
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        Self {
            master0: rng.gen(),
            master1: rng.gen(),
        }
    }

    /// Base64 text of both keys, as written to `master0.key` / `master1.key`
    pub fn encoded(&self) -> (String, String) {
        (STANDARD.encode(self.master0), STANDARD.encode(self.master1))
    }
}

impl fmt::Debug for MasterKeys {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKeys(..)")
    }
}

#[derive(Debug, Clone)]
pub struct ScionAutonomousSystem {
    asn: Asn,
    networks: IndexMap<String, Network>,
    routers: IndexMap<String, Router>,
    hosts: IndexMap<String, Node>,
    control_services: IndexMap<String, Node>,
    attributes: BTreeMap<Isd, BTreeSet<String>>,
    mtu: Option<u32>,
    keys: Option<MasterKeys>,
    beaconing_intervals: BeaconingIntervals,
    beaconing_policy: BTreeMap<PolicyKind, serde_yaml::Value>,
    next_ifid: u32,
    gateways: GatewayTable,
    note: Option<String>,
    generate_static_info_config: bool,
}

impl ScionAutonomousSystem {
    pub fn new(asn: Asn) -> Self {
        Self {
            asn,
            networks: IndexMap::new(),
            routers: IndexMap::new(),
            hosts: IndexMap::new(),
            control_services: IndexMap::new(),
            attributes: BTreeMap::new(),
            mtu: None,
            keys: None,
            beaconing_intervals: BeaconingIntervals::default(),
            beaconing_policy: BTreeMap::new(),
            next_ifid: 1,
            gateways: GatewayTable::default(),
            note: None,
            generate_static_info_config: false,
        }
    }

    pub fn asn(&self) -> Asn {
        self.asn
    }

    /// Identifier in the first ISD this AS is a member of
    pub fn ia(&self) -> IsdAsn {
        IsdAsn::new(self.isds().next().unwrap_or_default(), self.asn)
    }

    /// ISDs this AS has attributes (and thus membership) in
    pub fn isds(&self) -> impl Iterator<Item = Isd> + '_ {
        self.attributes.keys().copied()
    }

    // ------------------------------------------------------------------
    // Emulated objects
    // ------------------------------------------------------------------

    fn ensure_unique_node(&self, name: &str) -> Result<(), ScionError> {
        if self.routers.contains_key(name)
            || self.hosts.contains_key(name)
            || self.control_services.contains_key(name)
        {
            return Err(ScionError::DuplicateNode {
                asn: self.asn,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    pub fn add_network(&mut self, network: Network) -> Result<&mut Network, ScionError> {
        if self.networks.contains_key(&network.name) {
            return Err(ScionError::DuplicateNode {
                asn: self.asn,
                name: network.name,
            });
        }
        let name = network.name.clone();
        Ok(self.networks.entry(name).or_insert(network))
    }

    pub fn network(&self, name: &str) -> Option<&Network> {
        self.networks.get(name)
    }

    pub fn networks(&self) -> impl Iterator<Item = &Network> {
        self.networks.values()
    }

    pub fn add_router(&mut self, router: Router) -> Result<&mut Router, ScionError> {
        self.ensure_unique_node(router.name())?;
        let name = router.name().to_string();
        Ok(self.routers.entry(name).or_insert(router))
    }

    pub fn router(&self, name: &str) -> Option<&Router> {
        self.routers.get(name)
    }

    pub fn router_mut(&mut self, name: &str) -> Option<&mut Router> {
        self.routers.get_mut(name)
    }

    pub fn routers(&self) -> impl Iterator<Item = &Router> {
        self.routers.values()
    }

    pub fn create_host(&mut self, name: &str) -> Result<&mut Node, ScionError> {
        self.ensure_unique_node(name)?;
        Ok(self.hosts.entry(name.to_string()).or_insert_with(|| Node::new(name)))
    }

    pub fn host(&self, name: &str) -> Option<&Node> {
        self.hosts.get(name)
    }

    /// Create a SCION control service node
    pub fn create_control_service(&mut self, name: &str) -> Result<&mut Node, ScionError> {
        self.ensure_unique_node(name)?;
        Ok(self
            .control_services
            .entry(name.to_string())
            .or_insert_with(|| Node::new(name)))
    }

    pub fn control_service(&self, name: &str) -> Option<&Node> {
        self.control_services.get(name)
    }

    pub fn control_services(&self) -> impl Iterator<Item = &Node> {
        self.control_services.values()
    }

    // ------------------------------------------------------------------
    // SCION attributes
    // ------------------------------------------------------------------

    /// Set the AS attributes for an ISD, replacing previous ones
    pub fn set_as_attributes<I, S>(&mut self, isd: Isd, attributes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .insert(isd, attributes.into_iter().map(Into::into).collect());
        self
    }

    /// Attributes for an ISD, sorted
    pub fn as_attributes(&self, isd: Isd) -> Vec<String> {
        self.attributes
            .get(&isd)
            .map(|attrs| attrs.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_core(&self, isd: Isd) -> bool {
        self.attributes
            .get(&isd)
            .is_some_and(|attrs| attrs.contains("core"))
    }

    pub fn set_beaconing_intervals(&mut self, intervals: BeaconingIntervals) -> &mut Self {
        self.beaconing_intervals = intervals;
        self
    }

    pub fn beaconing_intervals(&self) -> BeaconingIntervals {
        self.beaconing_intervals
    }

    /// Set a beaconing policy. `None` clears it.
    pub fn set_beacon_policy(&mut self, kind: PolicyKind, policy: Option<serde_yaml::Value>) -> &mut Self {
        match policy {
            Some(policy) => {
                self.beaconing_policy.insert(kind, policy);
            }
            None => {
                self.beaconing_policy.remove(&kind);
            }
        }
        self
    }

    pub fn beacon_policy(&self, kind: PolicyKind) -> Option<&serde_yaml::Value> {
        self.beaconing_policy.get(&kind)
    }

    pub fn beacon_policies(&self) -> impl Iterator<Item = (PolicyKind, &serde_yaml::Value)> {
        self.beaconing_policy.iter().map(|(kind, policy)| (*kind, policy))
    }

    pub fn set_note(&mut self, note: impl Into<String>) -> &mut Self {
        self.note = Some(note.into());
        self
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Also emit `staticInfoConfig.json` for this AS
    pub fn set_generate_static_info_config(&mut self, generate: bool) -> &mut Self {
        self.generate_static_info_config = generate;
        self
    }

    pub fn generate_static_info_config(&self) -> bool {
        self.generate_static_info_config
    }

    // ------------------------------------------------------------------
    // Gateways
    // ------------------------------------------------------------------

    /// Configure a SCION IP gateway running on one of this AS's hosts
    pub fn set_gateway_config(&mut self, config: GatewayConfig) -> Result<&mut Self, ScionError> {
        if !self.hosts.contains_key(&config.host) {
            return Err(ScionError::UnknownHost {
                asn: self.asn,
                host: config.host,
            });
        }
        self.gateways.insert(self.asn, config)?;
        Ok(self)
    }

    pub fn gateway_config(&self, name: &str) -> Result<&GatewayConfig, ScionError> {
        self.gateways.get(name)
    }

    pub fn gateways(&self) -> impl Iterator<Item = &GatewayConfig> {
        self.gateways.iter()
    }

    // ------------------------------------------------------------------
    // Configuration phase
    // ------------------------------------------------------------------

    /// Freeze the MTU (smallest MTU of the AS-internal networks) and generate
    /// the master keys. Runs once.
    pub fn configure<R: Rng>(&mut self, rng: &mut R) -> Result<(), ScionError> {
        if self.is_configured() {
            return Err(ScionError::AlreadyConfigured { asn: self.asn });
        }
        let mtu = self
            .networks
            .values()
            .map(|net| net.mtu)
            .min()
            .ok_or(ScionError::NoInternalNetworks { asn: self.asn })?;
        self.mtu = Some(mtu);
        self.keys = Some(MasterKeys::generate(rng));
        log::debug!("AS {} configured with MTU {}", self.asn, mtu);
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.mtu.is_some()
    }

    pub fn mtu(&self) -> Option<u32> {
        self.mtu
    }

    pub fn keys(&self) -> Result<&MasterKeys, ScionError> {
        self.keys
            .as_ref()
            .ok_or(ScionError::NotConfigured { asn: self.asn })
    }

    /// Next unused interface id. Ids start at 1 and are never reused.
    pub fn next_ifid(&mut self) -> Result<u16, ScionError> {
        let ifid = u16::try_from(self.next_ifid).map_err(|_| ScionError::IfidExhausted { asn: self.asn })?;
        self.next_ifid += 1;
        Ok(ifid)
    }

    /// Number of interface ids still available
    pub fn free_ifids(&self) -> u32 {
        (u32::from(u16::MAX) + 1).saturating_sub(self.next_ifid)
    }
}
