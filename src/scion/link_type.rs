//! Inter-AS link types and the relationship strings derived from them.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Type of a SCION link between two ASes.
///
/// For [`LinkType::Transit`] the declaration order decides the strings
/// written to `link_to`: the first endpoint's descriptor carries `CHILD` and
/// the second endpoint's carries `PARENT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LinkType {
    /// Core link between core ASes
    Core,
    /// Customer-provider transit link
    Transit,
    /// Peering link between non-core ASes
    Peer,
}

/// Which end of a declared link an endpoint is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointRole {
    First,
    Second,
}

/// Relationship string written into an interface descriptor's `link_to` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Relationship {
    Core,
    Child,
    Parent,
    Peer,
}

impl LinkType {
    /// Relationship carried by the descriptor on the given end of the link.
    pub fn relationship(self, role: EndpointRole) -> Relationship {
        match (self, role) {
            (LinkType::Core, _) => Relationship::Core,
            (LinkType::Peer, _) => Relationship::Peer,
            (LinkType::Transit, EndpointRole::First) => Relationship::Child,
            (LinkType::Transit, EndpointRole::Second) => Relationship::Parent,
        }
    }
}

impl Display for LinkType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkType::Core => "Core",
            LinkType::Transit => "Transit",
            LinkType::Peer => "Peer",
        };
        f.write_str(name)
    }
}

impl Display for Relationship {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Relationship::Core => "CORE",
            Relationship::Child => "CHILD",
            Relationship::Parent => "PARENT",
            Relationship::Peer => "PEER",
        };
        f.write_str(name)
    }
}
