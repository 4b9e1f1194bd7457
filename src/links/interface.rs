//! Resolved SCION interface descriptors.
//!
//! Field names are part of the control-plane topology schema and must not be
//! renamed.

use crate::scion::{IsdAsn, Relationship};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Underlay addresses of an inter-AS interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Underlay {
    /// Local address and port
    pub public: SocketAddr,
    /// Address and port of the neighbor's interface
    pub remote: SocketAddr,
}

/// Descriptor of one border-router interface, keyed by its interface id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDescriptor {
    pub underlay: Underlay,
    /// Neighbor AS
    pub isd_as: IsdAsn,
    pub link_to: Relationship,
    pub mtu: u32,
    /// Interface id on the neighbor side; only set on peering links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_interface_id: Option<u16>,
}
