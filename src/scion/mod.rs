//! SCION layer of the topology builder.
//!
//! Identifiers, link types, the per-AS configuration state and the
//! artifacts derived from it (topology descriptor, control-service
//! configuration, gateway traffic policy, static path metadata).

pub mod autonomous_system;
pub mod control;
pub mod error;
pub mod gateway;
pub mod ia;
pub mod link_type;
pub mod static_info;
pub mod topology;

pub use autonomous_system::{BeaconingIntervals, MasterKeys, PolicyKind, ScionAutonomousSystem, CORE_ATTRIBUTES};
pub use error::ScionError;
pub use gateway::{GatewayConfig, GatewayRemote, GatewayTable, TrafficPolicy, MAX_GATEWAYS_PER_AS};
pub use ia::{Asn, Isd, IsdAsn, IsdAsnParseError};
pub use link_type::{EndpointRole, LinkType, Relationship};
pub use static_info::{build_static_info, StaticInfoConfig, STATIC_INFO_FILE};
pub use topology::{build_topology, TopologyDescriptor};
