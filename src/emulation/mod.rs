//! Emulated network the SCION layer is configured on.
//!
//! This module contains the objects the SCION configuration is resolved
//! against: autonomous systems with their routers, hosts and networks, the
//! internet exchanges, and the cross-connect networks between border routers.
//!
//! The pipeline is strictly ordered: [`builder`] constructs the objects,
//! [`Emulation::configure`] freezes every AS and resolves the declared links,
//! and only then are topology descriptors rendered.

pub mod builder;
pub mod model;
pub mod registry;

pub use builder::{build_emulation, cross_connect_network_name, declare_links, BuildError};
pub use model::{
    exchange_network_name, CrossConnect, Interface, Network, NetworkScope, Node, Router,
    DEFAULT_MTU, FIRST_UNDERLAY_PORT,
};
pub use registry::{Registry, RegistryMut};

use crate::links::{LinkRegistry, LinkResolver, ResolvedLink, ResolverOptions};
use crate::scion::{Asn, Isd, IsdAsn, ScionAutonomousSystem, ScionError};
use indexmap::IndexMap;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct Emulation {
    isds: BTreeSet<Isd>,
    ases: BTreeMap<Asn, ScionAutonomousSystem>,
    exchanges: IndexMap<u32, Network>,
    cross_connect_networks: IndexMap<String, Network>,
}

impl Emulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_isolation_domain(&mut self, isd: Isd) -> &mut Self {
        self.isds.insert(isd);
        self
    }

    pub fn isolation_domains(&self) -> impl Iterator<Item = Isd> + '_ {
        self.isds.iter().copied()
    }

    /// Register an AS. Returns `false` if the ASN is already taken.
    pub fn add_autonomous_system(&mut self, as_: ScionAutonomousSystem) -> bool {
        if self.ases.contains_key(&as_.asn()) {
            return false;
        }
        self.ases.insert(as_.asn(), as_);
        true
    }

    pub fn autonomous_system(&self, asn: Asn) -> Option<&ScionAutonomousSystem> {
        self.ases.get(&asn)
    }

    pub fn autonomous_system_mut(&mut self, asn: Asn) -> Option<&mut ScionAutonomousSystem> {
        self.ases.get_mut(&asn)
    }

    /// All ASes ordered by ASN
    pub fn autonomous_systems(&self) -> impl Iterator<Item = &ScionAutonomousSystem> {
        self.ases.values()
    }

    /// Register the shared network of internet exchange `id`
    pub fn add_exchange(&mut self, id: u32, network: Network) -> &mut Self {
        self.exchanges.insert(id, network);
        self
    }

    pub fn exchange(&self, id: u32) -> Option<&Network> {
        self.exchanges.get(&id)
    }

    pub fn exchanges(&self) -> impl Iterator<Item = &Network> {
        self.exchanges.values()
    }

    pub fn add_cross_connect_network(&mut self, network: Network) -> &mut Self {
        self.cross_connect_networks.insert(network.name.clone(), network);
        self
    }

    pub fn cross_connect_network(&self, name: &str) -> Option<&Network> {
        self.cross_connect_networks.get(name)
    }

    pub fn cross_connect_networks(&self) -> impl Iterator<Item = &Network> {
        self.cross_connect_networks.values()
    }

    /// Whether the AS is a core AS of the given ISD
    pub fn is_core_as(&self, ia: IsdAsn) -> bool {
        self.autonomous_system(ia.asn)
            .is_some_and(|as_| as_.is_core(ia.isd))
    }

    /// Run the configuration phase: freeze MTU and keys of every AS, then
    /// resolve all declared links.
    ///
    /// Any error aborts the whole pass. Link resolution validates every
    /// declaration before the first interface is attached.
    pub fn configure<R: Rng>(
        &mut self,
        links: &LinkRegistry,
        options: ResolverOptions,
        rng: &mut R,
    ) -> Result<Vec<ResolvedLink>, ScionError> {
        for as_ in self.ases.values_mut() {
            as_.configure(rng)?;
        }
        LinkResolver::new(options).resolve(links, self)
    }
}
