//! Builds the emulated network from a validated [`Config`].
//!
//! Addressing follows fixed templates:
//! - AS networks default to `10.<asn>.<index>.0/24`, exchanges to `10.<id>.0.0/24`
//! - hosts and control services take addresses from `.71` upward, border
//!   routers from `.254` downward
//! - on an exchange, a router uses host offset `<asn>`
//! - router loopbacks are handed out sequentially from `10.0.0.1`
//!
//! Cross-connects are recorded on each router as declared. Both ends derive
//! the same default network name from the sorted endpoint pair, so a link is
//! only asymmetric when a network name is given explicitly.

use super::model::{exchange_network_name, CrossConnect, Interface, Network, NetworkScope, Router, DEFAULT_MTU};
use super::Emulation;
use crate::config::{AsConfig, Config, LinkMedium, NodeConfig};
use crate::links::{LinkEnds, LinkRegistry};
use crate::scion::{Asn, ScionAutonomousSystem, ScionError, CORE_ATTRIBUTES};
use ipnet::Ipv4Net;
use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;

/// First host offset handed to hosts and control services
const FIRST_HOST_OFFSET: u32 = 71;

/// Highest host offset handed to routers
const LAST_ROUTER_OFFSET: u32 = 254;

const FIRST_LOOPBACK: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);

/// Errors while building the emulation
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Scion(#[from] ScionError),
    #[error("AS {0} is declared more than once")]
    DuplicateAs(Asn),
    #[error("cannot derive a default prefix for {0}")]
    AddressTemplate(String),
    #[error("no free address left in network {network}")]
    AddressExhausted { network: String },
    #[error("address {address} in network {network} is already taken")]
    AddressConflict { network: String, address: Ipv4Addr },
    #[error("node {node} of AS {asn} joins unknown network {network}")]
    UnknownNetwork { asn: Asn, node: String, network: String },
    #[error("invalid link {index}: {reason}")]
    InvalidLink { index: usize, reason: String },
}

/// `10.<second>.<third>.0/24`
fn default_prefix(second: u32, third: usize, what: impl FnOnce() -> String) -> Result<Ipv4Net, BuildError> {
    match (u8::try_from(second), u8::try_from(third)) {
        (Ok(b), Ok(c)) => Ipv4Net::new(Ipv4Addr::new(10, b, c, 0), 24).map_err(|_| BuildError::AddressTemplate(what())),
        _ => Err(BuildError::AddressTemplate(what())),
    }
}

/// Default name of the network behind a cross-connect, identical from both ends
pub fn cross_connect_network_name(a: (Asn, &str), b: (Asn, &str)) -> String {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    format!("xc_{}_{}_{}_{}", first.0, first.1, second.0, second.1)
}

/// Next free host offsets of one network: low for hosts, high for routers
#[derive(Debug, Clone, Copy)]
struct OffsetRange {
    low: u32,
    high: u32,
}

impl OffsetRange {
    fn for_network(network: &Network) -> Self {
        let size = 1u64 << (32 - u32::from(network.prefix.prefix_len()));
        let last_host = size.saturating_sub(2).min(u64::from(LAST_ROUTER_OFFSET));
        Self {
            low: FIRST_HOST_OFFSET,
            high: last_host as u32,
        }
    }

    fn take_low(&mut self) -> Option<u32> {
        if self.low > self.high {
            return None;
        }
        self.low += 1;
        Some(self.low - 1)
    }

    fn take_high(&mut self) -> Option<u32> {
        if self.high < self.low || self.high == 0 {
            return None;
        }
        self.high -= 1;
        Some(self.high + 1)
    }
}

/// Per-AS address allocation state
struct AsAddressing<'a> {
    asn: Asn,
    networks: HashMap<String, (Network, OffsetRange)>,
    exchanges: &'a HashMap<String, Network>,
}

impl<'a> AsAddressing<'a> {
    fn new(as_: &ScionAutonomousSystem, exchanges: &'a HashMap<String, Network>) -> Self {
        let networks = as_
            .networks()
            .map(|net| (net.name.clone(), (net.clone(), OffsetRange::for_network(net))))
            .collect();
        Self {
            asn: as_.asn(),
            networks,
            exchanges,
        }
    }

    fn unknown(&self, node: &str, network: &str) -> BuildError {
        BuildError::UnknownNetwork {
            asn: self.asn,
            node: node.to_string(),
            network: network.to_string(),
        }
    }

    /// Interface of a host or control service on an AS network
    fn host_interface(&mut self, node: &str, network: &str) -> Result<Interface, BuildError> {
        let (net, range) = self
            .networks
            .get_mut(network)
            .ok_or_else(|| BuildError::UnknownNetwork {
                asn: self.asn,
                node: node.to_string(),
                network: network.to_string(),
            })?;
        let address = range
            .take_low()
            .and_then(|offset| net.host_address(offset))
            .ok_or_else(|| BuildError::AddressExhausted {
                network: net.name.clone(),
            })?;
        Ok(Interface {
            scope: net.scope,
            network: net.name.clone(),
            address,
        })
    }

    /// Interface of a border router on an AS network or an exchange
    fn router_interface(&mut self, router: &str, network: &str) -> Result<Interface, BuildError> {
        if let Some((net, range)) = self.networks.get_mut(network) {
            let address = range
                .take_high()
                .and_then(|offset| net.host_address(offset))
                .ok_or_else(|| BuildError::AddressExhausted {
                    network: net.name.clone(),
                })?;
            return Ok(Interface {
                scope: net.scope,
                network: net.name.clone(),
                address,
            });
        }
        let net = self
            .exchanges
            .get(network)
            .ok_or_else(|| self.unknown(router, network))?;
        let address = net
            .host_address(self.asn)
            .ok_or_else(|| BuildError::AddressExhausted {
                network: net.name.clone(),
            })?;
        Ok(Interface {
            scope: NetworkScope::Ix,
            network: net.name.clone(),
            address,
        })
    }
}

fn node_interfaces(
    addressing: &mut AsAddressing<'_>,
    node: &NodeConfig,
) -> Result<Vec<Interface>, BuildError> {
    node.networks
        .iter()
        .map(|network| addressing.host_interface(&node.name, network))
        .collect()
}

/// Build all ISDs, exchanges and ASes of a configuration.
///
/// The configuration is expected to be validated. Links are declared
/// separately with [`declare_links`].
pub fn build_emulation(config: &Config) -> Result<Emulation, BuildError> {
    let mut emulation = Emulation::new();
    for isd in &config.isds {
        emulation.add_isolation_domain(*isd);
    }

    let mut exchanges = HashMap::new();
    for ix in &config.internet_exchanges {
        let prefix = match ix.prefix {
            Some(prefix) => prefix,
            None => default_prefix(ix.id, 0, || format!("IX{}", ix.id))?,
        };
        let network = Network::new(
            exchange_network_name(ix.id),
            NetworkScope::Ix,
            prefix,
            ix.mtu.unwrap_or(DEFAULT_MTU),
        );
        log::debug!("Internet exchange {} on {}", ix.id, prefix);
        exchanges.insert(network.name.clone(), network.clone());
        emulation.add_exchange(ix.id, network);
    }

    let mut next_loopback = u32::from(FIRST_LOOPBACK);
    let mut exchange_addresses: HashSet<(String, Ipv4Addr)> = HashSet::new();
    for as_config in &config.ases {
        let (as_, xc_networks) = build_as(as_config, &exchanges, &mut next_loopback)?;
        for router in as_.routers() {
            for iface in router.interfaces().iter().filter(|iface| iface.scope == NetworkScope::Ix) {
                if !exchange_addresses.insert((iface.network.clone(), iface.address)) {
                    return Err(BuildError::AddressConflict {
                        network: iface.network.clone(),
                        address: iface.address,
                    });
                }
            }
        }
        if !emulation.add_autonomous_system(as_) {
            return Err(BuildError::DuplicateAs(as_config.asn));
        }
        for network in xc_networks {
            if emulation.cross_connect_network(&network.name).is_none() {
                emulation.add_cross_connect_network(network);
            }
        }
    }

    log::info!(
        "Built {} AS(es) in {} ISD(s) with {} internet exchange(s)",
        config.ases.len(),
        config.isds.len(),
        config.internet_exchanges.len()
    );
    Ok(emulation)
}

fn build_as(
    config: &AsConfig,
    exchanges: &HashMap<String, Network>,
    next_loopback: &mut u32,
) -> Result<(ScionAutonomousSystem, Vec<Network>), BuildError> {
    let asn = config.asn;
    let mut as_ = ScionAutonomousSystem::new(asn);

    for membership in &config.isds {
        match &membership.attributes {
            Some(attributes) => as_.set_as_attributes(membership.isd, attributes.iter().cloned()),
            None if membership.core => as_.set_as_attributes(membership.isd, CORE_ATTRIBUTES),
            None => as_.set_as_attributes(membership.isd, Vec::<String>::new()),
        };
    }

    for (index, net) in config.networks.iter().enumerate() {
        let prefix = match net.prefix {
            Some(prefix) => prefix,
            None => default_prefix(asn, index, || format!("network {} of AS {}", net.name, asn))?,
        };
        as_.add_network(Network::new(
            net.name.clone(),
            NetworkScope::As(asn),
            prefix,
            net.mtu.unwrap_or(DEFAULT_MTU),
        ))?;
    }

    let mut addressing = AsAddressing::new(&as_, exchanges);

    for cs in &config.control_services {
        let interfaces = node_interfaces(&mut addressing, cs)?;
        let node = as_.create_control_service(&cs.name)?;
        for iface in interfaces {
            node.join_network(iface);
        }
    }
    for host in &config.hosts {
        let interfaces = node_interfaces(&mut addressing, host)?;
        let node = as_.create_host(&host.name)?;
        for iface in interfaces {
            node.join_network(iface);
        }
    }

    let mut xc_networks = Vec::new();
    for router_config in &config.routers {
        let loopback = Ipv4Addr::from(*next_loopback);
        *next_loopback += 1;
        let mut router = Router::new(router_config.name.clone(), asn, loopback);

        for network in &router_config.networks {
            router.join_network(addressing.router_interface(&router_config.name, network)?);
        }

        for xc in &router_config.cross_connects {
            let network = xc.network.clone().unwrap_or_else(|| {
                cross_connect_network_name((asn, router_config.name.as_str()), (xc.peer_asn, xc.peer_router.as_str()))
            });
            log::debug!(
                "AS{} {} cross-connects to AS{} {} on {} ({})",
                asn, router_config.name, xc.peer_asn, xc.peer_router, network, xc.address
            );
            xc_networks.push(Network::new(
                network.clone(),
                NetworkScope::Xc,
                xc.address.trunc(),
                xc.mtu.unwrap_or(DEFAULT_MTU),
            ));
            router.cross_connect(
                xc.peer_asn,
                &xc.peer_router,
                CrossConnect {
                    address: xc.address,
                    network,
                },
            );
        }
        as_.add_router(router)?;
    }

    if let Some(beaconing) = &config.beaconing {
        as_.set_beaconing_intervals(beaconing.intervals);
        for (kind, policy) in &beaconing.policies {
            as_.set_beacon_policy(*kind, Some(policy.clone()));
        }
    }
    if let Some(note) = &config.note {
        as_.set_note(note.clone());
    }
    as_.set_generate_static_info_config(config.generate_static_info_config);
    for gateway in &config.gateways {
        as_.set_gateway_config(gateway.clone())?;
    }

    Ok((as_, xc_networks))
}

/// Declare every configured link in a fresh [`LinkRegistry`]
pub fn declare_links(config: &Config) -> Result<LinkRegistry, BuildError> {
    let mut registry = LinkRegistry::new();
    for (index, link) in config.links.iter().enumerate() {
        let ends = LinkEnds::new(link.a, link.b, link.link_type).routers(
            link.a_router.as_deref().unwrap_or(""),
            link.b_router.as_deref().unwrap_or(""),
        );
        match (link.kind, link.exchange) {
            (LinkMedium::CrossConnect, None) => {
                registry.add_cross_connect(ends, link.count)?;
            }
            (LinkMedium::Exchange, Some(exchange)) => {
                registry.add_exchange_link(exchange, ends, link.count)?;
            }
            (LinkMedium::CrossConnect, Some(_)) => {
                return Err(BuildError::InvalidLink {
                    index,
                    reason: "cross-connect links cannot name an exchange".to_string(),
                });
            }
            (LinkMedium::Exchange, None) => {
                return Err(BuildError::InvalidLink {
                    index,
                    reason: "exchange links need an exchange id".to_string(),
                });
            }
        }
    }
    log::info!("Declared {} SCION link(s)", registry.len());
    Ok(registry)
}
