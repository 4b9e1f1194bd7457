//! Objects of the emulated network: networks, nodes and border routers.
//!
//! These are built once by [`super::builder`] and afterwards only mutated by
//! the link resolver (port allocation and interface attachment).

use crate::links::InterfaceDescriptor;
use crate::scion::Asn;
use indexmap::IndexMap;
use ipnet::Ipv4Net;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::net::Ipv4Addr;

/// Default MTU of every network unless configured otherwise
pub const DEFAULT_MTU: u32 = 1500;

/// First underlay port handed out by a border router
pub const FIRST_UNDERLAY_PORT: u16 = 50000;

/// Name scope a network is registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NetworkScope {
    /// AS-internal network
    As(Asn),
    /// Internet exchange networks (`ix<id>`)
    Ix,
    /// Cross-connect networks
    Xc,
}

impl Display for NetworkScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            NetworkScope::As(asn) => write!(f, "AS{}", asn),
            NetworkScope::Ix => f.write_str("ix"),
            NetworkScope::Xc => f.write_str("xc"),
        }
    }
}

/// Name of the exchange network for an IX id
pub fn exchange_network_name(id: u32) -> String {
    format!("ix{}", id)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    pub name: String,
    pub scope: NetworkScope,
    pub prefix: Ipv4Net,
    pub mtu: u32,
}

impl Network {
    pub fn new(name: impl Into<String>, scope: NetworkScope, prefix: Ipv4Net, mtu: u32) -> Self {
        Self {
            name: name.into(),
            scope,
            prefix,
            mtu,
        }
    }

    /// Host address at `offset` within the prefix, if it is a usable host address
    pub fn host_address(&self, offset: u32) -> Option<Ipv4Addr> {
        let base = u32::from(self.prefix.network());
        let addr = Ipv4Addr::from(base.checked_add(offset)?);
        if offset == 0 || addr >= self.prefix.broadcast() {
            return None;
        }
        Some(addr)
    }
}

/// Attachment of a node to a network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub scope: NetworkScope,
    pub network: String,
    pub address: Ipv4Addr,
}

impl Interface {
    pub fn attaches_to(&self, network: &Network) -> bool {
        self.scope == network.scope && self.network == network.name
    }
}

/// A host or control-service node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    interfaces: Vec<Interface>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interfaces: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn join_network(&mut self, interface: Interface) -> &mut Self {
        self.interfaces.push(interface);
        self
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    /// Address of the first interface, the one SCION services bind to
    pub fn address(&self) -> Option<Ipv4Addr> {
        self.interfaces.first().map(|iface| iface.address)
    }
}

/// Physical point-to-point connection recorded on one side of a cross-connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossConnect {
    pub address: Ipv4Net,
    pub network: String,
}

/// SCION border router
#[derive(Debug, Clone)]
pub struct Router {
    name: String,
    asn: Asn,
    loopback: Ipv4Addr,
    interfaces: Vec<Interface>,
    cross_connects: IndexMap<(Asn, String), CrossConnect>,
    next_port: u32,
    scion_interfaces: BTreeMap<u16, InterfaceDescriptor>,
}

impl Router {
    pub fn new(name: impl Into<String>, asn: Asn, loopback: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            asn,
            loopback,
            interfaces: Vec::new(),
            cross_connects: IndexMap::new(),
            next_port: u32::from(FIRST_UNDERLAY_PORT),
            scion_interfaces: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn asn(&self) -> Asn {
        self.asn
    }

    pub fn loopback(&self) -> Ipv4Addr {
        self.loopback
    }

    pub fn join_network(&mut self, interface: Interface) -> &mut Self {
        self.interfaces.push(interface);
        self
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    /// Record a cross-connect to router `peer_router` of AS `peer_asn`
    pub fn cross_connect(
        &mut self,
        peer_asn: Asn,
        peer_router: impl Into<String>,
        connection: CrossConnect,
    ) -> &mut Self {
        self.cross_connects.insert((peer_asn, peer_router.into()), connection);
        self
    }

    pub fn cross_connects(&self) -> &IndexMap<(Asn, String), CrossConnect> {
        &self.cross_connects
    }

    pub fn get_cross_connect(&self, peer_asn: Asn, peer_router: &str) -> Option<&CrossConnect> {
        self.cross_connects.get(&(peer_asn, peer_router.to_string()))
    }

    /// Hand out the next unused underlay port
    pub fn next_port(&mut self) -> Option<u16> {
        let port = u16::try_from(self.next_port).ok()?;
        self.next_port += 1;
        Some(port)
    }

    /// Number of underlay ports still available
    pub fn free_ports(&self) -> u32 {
        (u32::from(u16::MAX) + 1).saturating_sub(self.next_port)
    }

    pub fn add_scion_interface(&mut self, ifid: u16, descriptor: InterfaceDescriptor) {
        self.scion_interfaces.insert(ifid, descriptor);
    }

    /// Resolved SCION interfaces keyed by interface id
    pub fn scion_interfaces(&self) -> &BTreeMap<u16, InterfaceDescriptor> {
        &self.scion_interfaces
    }
}
