//! Control-service configuration (`control/<name>.toml`).
//!
//! Only the sections this generator owns are written: the service identity and
//! the beaconing settings of the AS. Policy files are referenced by their path
//! inside the service's configuration directory.

use super::autonomous_system::{PolicyKind, ScionAutonomousSystem};
use crate::utils::duration::format_scion_duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Directory the SCION services read their configuration from
pub const CONFIG_DIR: &str = "/etc/scion";

/// Path of a beaconing policy file, relative to the AS output directory
pub fn policy_file(kind: PolicyKind) -> String {
    format!("beacon_policy/{}.yaml", kind)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlConfig {
    pub general: GeneralSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beaconing: Option<BeaconingSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralSection {
    pub id: String,
    pub config_dir: String,
}

/// Intervals are SCION duration strings; policies map a policy kind to its file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconingSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origination_interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub propagation_interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_interval: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub policies: BTreeMap<String, String>,
}

/// Configuration of one control service. The beaconing section is omitted
/// when the AS keeps all daemon defaults.
pub fn control_config(as_: &ScionAutonomousSystem, cs_name: &str) -> ControlConfig {
    let intervals = as_.beaconing_intervals();
    let beaconing = BeaconingSection {
        origination_interval: intervals.origination.map(format_scion_duration),
        propagation_interval: intervals.propagation.map(format_scion_duration),
        registration_interval: intervals.registration.map(format_scion_duration),
        policies: as_
            .beacon_policies()
            .map(|(kind, _)| (kind.to_string(), format!("{}/{}", CONFIG_DIR, policy_file(kind))))
            .collect(),
    };

    ControlConfig {
        general: GeneralSection {
            id: cs_name.to_string(),
            config_dir: CONFIG_DIR.to_string(),
        },
        beaconing: (beaconing != BeaconingSection::default()).then_some(beaconing),
    }
}

/// Render the TOML configuration of one control service
pub fn render_control_config(as_: &ScionAutonomousSystem, cs_name: &str) -> Result<String, toml::ser::Error> {
    toml::to_string(&control_config(as_, cs_name))
}
