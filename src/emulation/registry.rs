//! Scoped lookup of emulated objects.
//!
//! The link resolver never reaches into global state: it is handed a
//! [`RegistryMut`] and only sees ASes, routers and networks through it. Tests
//! can substitute their own implementation.

use super::model::{Network, NetworkScope, Router};
use super::Emulation;
use crate::links::InterfaceDescriptor;
use crate::scion::{Asn, ScionError};

/// Read-only, name-scoped lookups
pub trait Registry {
    /// Whether an AS with this number exists
    fn contains_as(&self, asn: Asn) -> bool;

    /// All border routers of an AS, in creation order
    fn routers(&self, asn: Asn) -> Vec<&Router>;

    fn router(&self, asn: Asn, name: &str) -> Option<&Router>;

    fn has_router(&self, asn: Asn, name: &str) -> bool {
        self.router(asn, name).is_some()
    }

    fn network(&self, scope: NetworkScope, name: &str) -> Option<&Network>;

    /// All networks registered under a scope
    fn networks(&self, scope: NetworkScope) -> Vec<&Network>;

    /// Interface ids an AS can still hand out; 0 for unknown ASes
    fn free_ifids(&self, asn: Asn) -> u32;

    /// Underlay ports a router can still hand out; 0 for unknown routers
    fn free_ports(&self, asn: Asn, router: &str) -> u32;
}

/// Allocation and write-back operations used while committing resolved links
pub trait RegistryMut: Registry {
    /// Next unused interface id of an AS
    fn allocate_ifid(&mut self, asn: Asn) -> Result<u16, ScionError>;

    /// Next unused underlay port of a router
    fn allocate_port(&mut self, asn: Asn, router: &str) -> Result<u16, ScionError>;

    /// Attach a resolved interface to a router under its interface id
    fn attach_interface(
        &mut self,
        asn: Asn,
        router: &str,
        ifid: u16,
        descriptor: InterfaceDescriptor,
    ) -> Result<(), ScionError>;
}

impl Registry for Emulation {
    fn contains_as(&self, asn: Asn) -> bool {
        self.autonomous_system(asn).is_some()
    }

    fn routers(&self, asn: Asn) -> Vec<&Router> {
        self.autonomous_system(asn)
            .map(|as_| as_.routers().collect())
            .unwrap_or_default()
    }

    fn router(&self, asn: Asn, name: &str) -> Option<&Router> {
        self.autonomous_system(asn)?.router(name)
    }

    fn network(&self, scope: NetworkScope, name: &str) -> Option<&Network> {
        match scope {
            NetworkScope::As(asn) => self.autonomous_system(asn)?.network(name),
            NetworkScope::Ix => self.exchanges().find(|net| net.name == name),
            NetworkScope::Xc => self.cross_connect_network(name),
        }
    }

    fn networks(&self, scope: NetworkScope) -> Vec<&Network> {
        match scope {
            NetworkScope::As(asn) => self
                .autonomous_system(asn)
                .map(|as_| as_.networks().collect())
                .unwrap_or_default(),
            NetworkScope::Ix => self.exchanges().collect(),
            NetworkScope::Xc => self.cross_connect_networks().collect(),
        }
    }

    fn free_ifids(&self, asn: Asn) -> u32 {
        self.autonomous_system(asn).map_or(0, |as_| as_.free_ifids())
    }

    fn free_ports(&self, asn: Asn, router: &str) -> u32 {
        Registry::router(self, asn, router).map_or(0, Router::free_ports)
    }
}

impl RegistryMut for Emulation {
    fn allocate_ifid(&mut self, asn: Asn) -> Result<u16, ScionError> {
        self.autonomous_system_mut(asn)
            .ok_or(ScionError::UnknownAs { asn })?
            .next_ifid()
    }

    fn allocate_port(&mut self, asn: Asn, router: &str) -> Result<u16, ScionError> {
        let as_ = self.autonomous_system_mut(asn).ok_or(ScionError::UnknownAs { asn })?;
        let ia = as_.ia();
        let router_obj = as_.router_mut(router).ok_or_else(|| ScionError::UnknownRouter {
            ia,
            router: router.to_string(),
        })?;
        router_obj.next_port().ok_or_else(|| ScionError::PortsExhausted {
            asn,
            router: router.to_string(),
        })
    }

    fn attach_interface(
        &mut self,
        asn: Asn,
        router: &str,
        ifid: u16,
        descriptor: InterfaceDescriptor,
    ) -> Result<(), ScionError> {
        let as_ = self.autonomous_system_mut(asn).ok_or(ScionError::UnknownAs { asn })?;
        let ia = as_.ia();
        as_.router_mut(router)
            .ok_or_else(|| ScionError::UnknownRouter {
                ia,
                router: router.to_string(),
            })?
            .add_scion_interface(ifid, descriptor);
        Ok(())
    }
}
