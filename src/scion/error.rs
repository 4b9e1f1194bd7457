//! Errors raised while declaring, resolving and exporting a SCION topology.
//!
//! All of these are configuration-time validation failures. Any of them aborts
//! the configuration pass; nothing is retried.

use super::ia::{Asn, IsdAsn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScionError {
    #[error("cannot link AS {asn} to itself")]
    SelfLink { asn: Asn },

    #[error("link {link} is already declared")]
    DuplicateLink { link: String },

    #[error("link {link} must be repeated at least once")]
    InvalidLinkCount { link: String },

    #[error("AS {asn} does not exist")]
    UnknownAs { asn: Asn },

    #[error("cannot find router {router} in AS {ia}")]
    UnknownRouter { ia: IsdAsn, router: String },

    #[error("cannot find a cross-connect to configure link {a} -> {b}: {reason}")]
    UnresolvedLink { a: IsdAsn, b: IsdAsn, reason: String },

    #[error("link {a} -> {b} is asymmetric: {a} reports network {a_network}, {b} reports {b_network}")]
    AsymmetricLink {
        a: IsdAsn,
        b: IsdAsn,
        a_network: String,
        b_network: String,
    },

    #[error("cannot resolve SCION link: AS {ia} has no router in ix{exchange}")]
    ExchangeMembership { ia: IsdAsn, exchange: u32 },

    #[error("network {name} does not exist in scope {scope}")]
    UnknownNetwork { scope: String, name: String },

    #[error("AS {asn} already has {limit} gateway(s) configured, which is the supported maximum")]
    Capacity { asn: Asn, limit: usize },

    #[error("port {port} is already used by a gateway on host {host}")]
    PortConflict { host: String, port: u16 },

    #[error("host {host} does not exist in AS {asn}")]
    UnknownHost { asn: Asn, host: String },

    #[error("node {name} already exists in AS {asn}")]
    DuplicateNode { asn: Asn, name: String },

    #[error("AS {asn} is not configured yet")]
    NotConfigured { asn: Asn },

    #[error("AS {asn} is already configured")]
    AlreadyConfigured { asn: Asn },

    #[error("AS {asn} has no internal networks to derive an MTU from")]
    NoInternalNetworks { asn: Asn },

    #[error("{kind} {name} not found")]
    NotFound { kind: &'static str, name: String },

    #[error("AS {asn} ran out of interface identifiers")]
    IfidExhausted { asn: Asn },

    #[error("router {router} in AS {asn} ran out of underlay ports")]
    PortsExhausted { asn: Asn, router: String },
}
