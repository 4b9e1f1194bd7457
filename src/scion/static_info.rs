//! Static path metadata (`staticInfoConfig.json`).
//!
//! Only written for ASes that opt in. The control service attaches this
//! information to the beacons it originates and propagates.

use super::autonomous_system::ScionAutonomousSystem;
use crate::links::{LinkKind, ResolvedLink};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// File name of the static info configuration in the AS directory
pub const STATIC_INFO_FILE: &str = "staticInfoConfig.json";

/// Physical nature of the link behind an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaticLinkType {
    Direct,
    Multihop,
    Opennet,
}

impl From<LinkKind> for StaticLinkType {
    fn from(kind: LinkKind) -> Self {
        match kind {
            LinkKind::CrossConnect => StaticLinkType::Direct,
            // exchange fabrics are switched
            LinkKind::Exchange(_) => StaticLinkType::Multihop,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticInfoConfig {
    /// Link type per interface id
    #[serde(rename = "LinkType")]
    pub link_type: BTreeMap<u16, StaticLinkType>,
    #[serde(rename = "Note", default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Static info of an AS, or `None` if the AS did not ask for it
pub fn build_static_info(as_: &ScionAutonomousSystem, resolved: &[ResolvedLink]) -> Option<StaticInfoConfig> {
    if !as_.generate_static_info_config() {
        return None;
    }
    let mut link_type = BTreeMap::new();
    for link in resolved {
        for end in [&link.a, &link.b] {
            if end.ia.asn == as_.asn() {
                link_type.insert(end.ifid, StaticLinkType::from(link.kind));
            }
        }
    }
    Some(StaticInfoConfig {
        link_type,
        note: as_.note().map(str::to_string),
    })
}
