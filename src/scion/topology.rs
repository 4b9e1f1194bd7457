//! Per-AS topology descriptor (`topology.json`).
//!
//! The layout and field names are the schema the SCION daemons parse. Maps are
//! ordered so the serialized output is deterministic.

use super::autonomous_system::ScionAutonomousSystem;
use super::error::ScionError;
use super::ia::{Isd, IsdAsn};
use crate::links::InterfaceDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Port the control and discovery services listen on
pub const CONTROL_SERVICE_PORT: u16 = 30252;

/// Port of a border router's internal (intra-AS) address
pub const ROUTER_INTERNAL_PORT: u16 = 30042;

/// Port range handed to the dispatcher
pub const DISPATCHED_PORTS: &str = "30000-32767";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAddress {
    pub addr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorderRouterEntry {
    pub internal_addr: String,
    pub interfaces: BTreeMap<u16, InterfaceDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayEntry {
    pub ctrl_addr: String,
    pub data_addr: String,
}

/// Reserved, always empty
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColibriService {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyDescriptor {
    pub attributes: Vec<String>,
    pub isd_as: IsdAsn,
    pub mtu: u32,
    pub test_dispatcher: bool,
    pub dispatched_ports: String,
    pub control_service: BTreeMap<String, ServiceAddress>,
    pub discovery_service: BTreeMap<String, ServiceAddress>,
    pub border_routers: BTreeMap<String, BorderRouterEntry>,
    pub colibri_service: ColibriService,
    pub sigs: BTreeMap<String, GatewayEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Assemble the topology descriptor of an AS for one of its ISDs.
///
/// Needs the frozen MTU, so the AS must be configured. Calling this again
/// without changes in between yields an identical descriptor.
pub fn build_topology(as_: &ScionAutonomousSystem, isd: Isd) -> Result<TopologyDescriptor, ScionError> {
    let mtu = as_.mtu().ok_or(ScionError::NotConfigured { asn: as_.asn() })?;

    let mut control_service = BTreeMap::new();
    for cs in as_.control_services() {
        match cs.address() {
            Some(addr) => {
                control_service.insert(
                    cs.name().to_string(),
                    ServiceAddress {
                        addr: format!("{}:{}", addr, CONTROL_SERVICE_PORT),
                    },
                );
            }
            None => log::warn!("Control service {} of AS {} has no interface, skipping", cs.name(), as_.asn()),
        }
    }

    let border_routers = as_
        .routers()
        .map(|router| {
            (
                router.name().to_string(),
                BorderRouterEntry {
                    internal_addr: format!("{}:{}", router.loopback(), ROUTER_INTERNAL_PORT),
                    interfaces: router.scion_interfaces().clone(),
                },
            )
        })
        .collect();

    let mut sigs = BTreeMap::new();
    for gateway in as_.gateways() {
        let addr = as_
            .host(&gateway.host)
            .and_then(|host| host.address())
            .ok_or_else(|| ScionError::UnknownHost {
                asn: as_.asn(),
                host: gateway.host.clone(),
            })?;
        sigs.insert(
            gateway.name.clone(),
            GatewayEntry {
                ctrl_addr: format!("{}:{}", addr, gateway.ctrl_port),
                data_addr: format!("{}:{}", addr, gateway.data_port),
            },
        );
    }

    Ok(TopologyDescriptor {
        attributes: as_.as_attributes(isd),
        isd_as: IsdAsn::new(isd, as_.asn()),
        mtu,
        test_dispatcher: true,
        dispatched_ports: DISPATCHED_PORTS.to_string(),
        discovery_service: control_service.clone(),
        control_service,
        border_routers,
        colibri_service: ColibriService {},
        sigs,
        note: as_.note().map(str::to_string),
    })
}
