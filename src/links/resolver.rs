//! Link resolution: declared links to concrete SCION interfaces.
//!
//! Resolution runs in two steps. First every declaration is resolved to a pair
//! of border routers, their underlay addresses and the MTU of the network
//! between them, and the interface ids and ports the whole plan needs are
//! checked against what each AS and router has left. All validation happens
//! here and nothing is written. Then the plan is committed: for each
//! repetition of a link, one interface id is taken from each AS, one port from
//! each router, and the two interface descriptors are attached to the routers.
//!
//! Cross-connects are resolved before exchange links, each group in
//! declaration order. Interface ids therefore follow that order.

use super::declaration::{LinkEnds, LinkRegistry};
use super::interface::{InterfaceDescriptor, Underlay};
use crate::emulation::{exchange_network_name, NetworkScope, Registry, RegistryMut, Router};
use crate::scion::{Asn, EndpointRole, IsdAsn, LinkType, ScionError};
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::net::{Ipv4Addr, SocketAddr};

/// Tunables of the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Set `remote_interface_id` on both ends of peering links.
    ///
    /// Not every control-plane release understands this field yet.
    pub peer_remote_interface_ids: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            peer_remote_interface_ids: true,
        }
    }
}

/// Physical kind of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    CrossConnect,
    Exchange(u32),
}

impl Display for LinkKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LinkKind::CrossConnect => f.write_str("XC"),
            LinkKind::Exchange(id) => write!(f, "IX{}", id),
        }
    }
}

/// One side of a committed link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEnd {
    pub ia: IsdAsn,
    pub router: String,
    pub ifid: u16,
    pub underlay: SocketAddr,
}

/// One committed link instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub kind: LinkKind,
    pub link_type: LinkType,
    pub a: ResolvedEnd,
    pub b: ResolvedEnd,
}

#[derive(Debug, Clone)]
struct PlannedEnd {
    ia: IsdAsn,
    router: String,
    address: Ipv4Addr,
}

#[derive(Debug, Clone)]
struct PlannedLink {
    kind: LinkKind,
    link_type: LinkType,
    a: PlannedEnd,
    b: PlannedEnd,
    mtu: u32,
    count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct LinkResolver {
    options: ResolverOptions,
}

impl LinkResolver {
    pub fn new(options: ResolverOptions) -> Self {
        Self { options }
    }

    /// Resolve every declared link and attach the resulting interfaces.
    ///
    /// Fails without touching the registry if any declaration cannot be
    /// resolved.
    pub fn resolve<R: RegistryMut>(
        &self,
        links: &LinkRegistry,
        registry: &mut R,
    ) -> Result<Vec<ResolvedLink>, ScionError> {
        let plan = self.plan(links, registry)?;

        let mut resolved = Vec::new();
        for link in &plan {
            for _ in 0..link.count {
                resolved.push(self.commit(link, registry)?);
            }
        }
        log::info!("Resolved {} SCION link(s) from {} declaration(s)", resolved.len(), plan.len());
        Ok(resolved)
    }

    fn plan<R: Registry>(&self, links: &LinkRegistry, registry: &R) -> Result<Vec<PlannedLink>, ScionError> {
        let mut plan = Vec::with_capacity(links.len());
        for (ends, count) in links.cross_connects() {
            plan.push(plan_cross_connect(ends, count, registry)?);
        }
        for (exchange, ends, count) in links.exchange_links() {
            plan.push(plan_exchange_link(exchange, ends, count, registry)?);
        }
        check_capacity(&plan, registry)?;
        Ok(plan)
    }

    fn commit<R: RegistryMut>(&self, link: &PlannedLink, registry: &mut R) -> Result<ResolvedLink, ScionError> {
        let (a, b) = (&link.a, &link.b);
        let a_ifid = registry.allocate_ifid(a.ia.asn)?;
        let b_ifid = registry.allocate_ifid(b.ia.asn)?;
        let a_port = registry.allocate_port(a.ia.asn, &a.router)?;
        let b_port = registry.allocate_port(b.ia.asn, &b.router)?;
        let a_underlay = SocketAddr::new(a.address.into(), a_port);
        let b_underlay = SocketAddr::new(b.address.into(), b_port);

        log::info!(
            "add scion {} link: {} AS{} -({})-> {} AS{}",
            link.kind, a_underlay, a.ia, link.link_type, b_underlay, b.ia
        );
        log::debug!("AS{} ifid {} <-> AS{} ifid {}", a.ia, a_ifid, b.ia, b_ifid);

        let mut a_iface = InterfaceDescriptor {
            underlay: Underlay {
                public: a_underlay,
                remote: b_underlay,
            },
            isd_as: b.ia,
            link_to: link.link_type.relationship(EndpointRole::First),
            mtu: link.mtu,
            remote_interface_id: None,
        };
        let mut b_iface = InterfaceDescriptor {
            underlay: Underlay {
                public: b_underlay,
                remote: a_underlay,
            },
            isd_as: a.ia,
            link_to: link.link_type.relationship(EndpointRole::Second),
            mtu: link.mtu,
            remote_interface_id: None,
        };

        if link.link_type == LinkType::Peer && self.options.peer_remote_interface_ids {
            log::warn!(
                "Peering link AS{} <-> AS{}: remote_interface_id is not supported by all SCION control-plane releases",
                a.ia, b.ia
            );
            a_iface.remote_interface_id = Some(b_ifid);
            b_iface.remote_interface_id = Some(a_ifid);
        }

        registry.attach_interface(a.ia.asn, &a.router, a_ifid, a_iface)?;
        registry.attach_interface(b.ia.asn, &b.router, b_ifid, b_iface)?;

        Ok(ResolvedLink {
            kind: link.kind,
            link_type: link.link_type,
            a: ResolvedEnd {
                ia: a.ia,
                router: a.router.clone(),
                ifid: a_ifid,
                underlay: a_underlay,
            },
            b: ResolvedEnd {
                ia: b.ia,
                router: b.router.clone(),
                ifid: b_ifid,
                underlay: b_underlay,
            },
        })
    }
}

/// Fail if committing the plan would run any AS out of interface ids or any
/// router out of ports
fn check_capacity<R: Registry>(plan: &[PlannedLink], registry: &R) -> Result<(), ScionError> {
    let mut ifids: HashMap<Asn, u64> = HashMap::new();
    let mut ports: HashMap<(Asn, &str), u64> = HashMap::new();
    for link in plan {
        for end in [&link.a, &link.b] {
            let asn = end.ia.asn;
            let needed = ifids.entry(asn).or_default();
            *needed += u64::from(link.count);
            if *needed > u64::from(registry.free_ifids(asn)) {
                return Err(ScionError::IfidExhausted { asn });
            }
            let needed = ports.entry((asn, end.router.as_str())).or_default();
            *needed += u64::from(link.count);
            if *needed > u64::from(registry.free_ports(asn, &end.router)) {
                return Err(ScionError::PortsExhausted {
                    asn,
                    router: end.router.clone(),
                });
            }
        }
    }
    Ok(())
}

fn ensure_as<R: Registry>(registry: &R, ia: IsdAsn) -> Result<(), ScionError> {
    if registry.contains_as(ia.asn) {
        Ok(())
    } else {
        Err(ScionError::UnknownAs { asn: ia.asn })
    }
}

fn ensure_router<R: Registry>(registry: &R, ia: IsdAsn, name: &str) -> Result<(), ScionError> {
    if registry.has_router(ia.asn, name) {
        Ok(())
    } else {
        Err(ScionError::UnknownRouter {
            ia,
            router: name.to_string(),
        })
    }
}

fn named_router<'r, R: Registry>(registry: &'r R, ia: IsdAsn, name: &str) -> Result<&'r Router, ScionError> {
    registry.router(ia.asn, name).ok_or_else(|| ScionError::UnknownRouter {
        ia,
        router: name.to_string(),
    })
}

/// Find the first pair of routers with a recorded cross-connect from AS `a` to
/// AS `b`, restricted to the named routers where given.
fn find_cross_connect_routers<'r, R: Registry>(
    registry: &'r R,
    ends: &LinkEnds,
) -> Result<(&'r Router, &'r Router), ScionError> {
    let (a, b) = (ends.a, ends.b);
    for router in registry.routers(a.asn) {
        if ends.a_router.as_deref().is_some_and(|name| name != router.name()) {
            continue;
        }
        for (peer_asn, peer_name) in router.cross_connects().keys() {
            if *peer_asn != b.asn {
                continue;
            }
            if ends.b_router.as_deref().is_some_and(|name| name != peer_name) {
                continue;
            }
            if let Some(peer) = registry.router(b.asn, peer_name) {
                return Ok((router, peer));
            }
        }
    }
    Err(ScionError::UnresolvedLink {
        a,
        b,
        reason: format!("no router of AS{} has a cross-connect to AS{}", a, b),
    })
}

fn plan_cross_connect<R: Registry>(ends: &LinkEnds, count: u32, registry: &R) -> Result<PlannedLink, ScionError> {
    let (a, b) = (ends.a, ends.b);
    ensure_as(registry, a)?;
    ensure_as(registry, b)?;

    let (a_router, b_router) = match (&ends.a_router, &ends.b_router) {
        (Some(a_name), Some(b_name)) => (
            named_router(registry, a, a_name)?,
            named_router(registry, b, b_name)?,
        ),
        (a_name, b_name) => {
            // Named ends must exist even when the other end is discovered
            if let Some(name) = a_name {
                ensure_router(registry, a, name)?;
            }
            if let Some(name) = b_name {
                ensure_router(registry, b, name)?;
            }
            find_cross_connect_routers(registry, ends)?
        }
    };

    let a_xc = a_router
        .get_cross_connect(b.asn, b_router.name())
        .ok_or_else(|| ScionError::UnresolvedLink {
            a,
            b,
            reason: format!("router {} has no cross-connect to router {} of AS{}", a_router.name(), b_router.name(), b),
        })?;
    let b_xc = b_router
        .get_cross_connect(a.asn, a_router.name())
        .ok_or_else(|| ScionError::UnresolvedLink {
            a,
            b,
            reason: format!("router {} has no cross-connect to router {} of AS{}", b_router.name(), a_router.name(), a),
        })?;
    if a_xc.network != b_xc.network {
        return Err(ScionError::AsymmetricLink {
            a,
            b,
            a_network: a_xc.network.clone(),
            b_network: b_xc.network.clone(),
        });
    }
    let net = registry
        .network(NetworkScope::Xc, &a_xc.network)
        .ok_or_else(|| ScionError::UnknownNetwork {
            scope: NetworkScope::Xc.to_string(),
            name: a_xc.network.clone(),
        })?;

    Ok(PlannedLink {
        kind: LinkKind::CrossConnect,
        link_type: ends.link_type,
        a: PlannedEnd {
            ia: a,
            router: a_router.name().to_string(),
            address: a_xc.address.addr(),
        },
        b: PlannedEnd {
            ia: b,
            router: b_router.name().to_string(),
            address: b_xc.address.addr(),
        },
        mtu: net.mtu,
        count,
    })
}

/// Router of AS `ia` attached to the exchange network, and its address there
fn exchange_port<R: Registry>(
    registry: &R,
    ia: IsdAsn,
    router: Option<&str>,
    exchange: u32,
) -> Result<PlannedEnd, ScionError> {
    let not_member = || ScionError::ExchangeMembership { ia, exchange };
    let net = registry
        .network(NetworkScope::Ix, &exchange_network_name(exchange))
        .ok_or_else(not_member)?;
    let candidates = match router {
        Some(name) => vec![named_router(registry, ia, name)?],
        None => registry.routers(ia.asn),
    };
    candidates
        .into_iter()
        .find_map(|router| {
            router
                .interfaces()
                .iter()
                .find(|iface| iface.attaches_to(net))
                .map(|iface| PlannedEnd {
                    ia,
                    router: router.name().to_string(),
                    address: iface.address,
                })
        })
        .ok_or_else(not_member)
}

fn plan_exchange_link<R: Registry>(
    exchange: u32,
    ends: &LinkEnds,
    count: u32,
    registry: &R,
) -> Result<PlannedLink, ScionError> {
    ensure_as(registry, ends.a)?;
    ensure_as(registry, ends.b)?;
    let a = exchange_port(registry, ends.a, ends.a_router.as_deref(), exchange)?;
    let b = exchange_port(registry, ends.b, ends.b_router.as_deref(), exchange)?;
    let mtu = registry
        .network(NetworkScope::Ix, &exchange_network_name(exchange))
        .map(|net| net.mtu)
        .ok_or(ScionError::ExchangeMembership { ia: ends.a, exchange })?;

    Ok(PlannedLink {
        kind: LinkKind::Exchange(exchange),
        link_type: ends.link_type,
        a,
        b,
        mtu,
        count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulation::{CrossConnect, Emulation, Interface, Network, Router, DEFAULT_MTU};
    use crate::links::LinkEnds;
    use crate::scion::{Relationship, ScionAutonomousSystem};
    use pretty_assertions::assert_eq;

    fn new_as(emu: &mut Emulation, isd: u16, asn: u32, routers: &[&str]) {
        let mut as_ = ScionAutonomousSystem::new(asn);
        as_.set_as_attributes(isd, ["core"]);
        as_.add_network(Network::new(
            "net0",
            NetworkScope::As(asn),
            format!("10.{}.0.0/24", asn).parse().unwrap(),
            DEFAULT_MTU,
        ))
        .unwrap();
        for (i, name) in routers.iter().enumerate() {
            as_.add_router(Router::new(*name, asn, Ipv4Addr::new(10, 0, asn as u8, i as u8 + 1)))
                .unwrap();
        }
        emu.add_autonomous_system(as_);
    }

    fn record_xc(emu: &mut Emulation, asn: u32, router: &str, peer_asn: u32, peer: &str, addr: &str, net: &str) {
        emu.autonomous_system_mut(asn)
            .unwrap()
            .router_mut(router)
            .unwrap()
            .cross_connect(
                peer_asn,
                peer,
                CrossConnect {
                    address: addr.parse().unwrap(),
                    network: net.to_string(),
                },
            );
    }

    fn xc(emu: &mut Emulation, a: (u32, &str, &str), b: (u32, &str, &str), mtu: u32) {
        let name = format!("xc_{}_{}_{}_{}", a.0, a.1, b.0, b.1);
        record_xc(emu, a.0, a.1, b.0, b.1, a.2, &name);
        record_xc(emu, b.0, b.1, a.0, a.1, b.2, &name);
        emu.add_cross_connect_network(Network::new(name, NetworkScope::Xc, "10.3.0.0/29".parse().unwrap(), mtu));
    }

    fn join_ix(emu: &mut Emulation, asn: u32, router: &str, ix: u32) {
        let name = exchange_network_name(ix);
        if emu.exchange(ix).is_none() {
            emu.add_exchange(
                ix,
                Network::new(name.clone(), NetworkScope::Ix, format!("10.{}.0.0/24", ix).parse().unwrap(), 1400),
            );
        }
        emu.autonomous_system_mut(asn)
            .unwrap()
            .router_mut(router)
            .unwrap()
            .join_network(Interface {
                scope: NetworkScope::Ix,
                network: name,
                address: Ipv4Addr::new(10, ix as u8, 0, asn as u8),
            });
    }

    fn core_pair() -> Emulation {
        let mut emu = Emulation::new();
        new_as(&mut emu, 1, 110, &["br1", "br2"]);
        new_as(&mut emu, 1, 120, &["br1"]);
        xc(&mut emu, (110, "br1", "10.3.0.2/29"), (120, "br1", "10.3.0.3/29"), 1450);
        emu
    }

    fn iface(emu: &Emulation, asn: u32, router: &str, ifid: u16) -> InterfaceDescriptor {
        emu.router(asn, router).unwrap().scion_interfaces()[&ifid].clone()
    }

    #[test]
    fn test_core_cross_connect_named_routers() {
        let mut emu = core_pair();
        let mut links = LinkRegistry::new();
        links
            .add_cross_connect(LinkEnds::new((1, 110), (1, 120), LinkType::Core).routers("br1", "br1"), 1)
            .unwrap();

        let resolved = LinkResolver::default().resolve(&links, &mut emu).unwrap();
        assert_eq!(resolved.len(), 1);

        let a = emu.router(110, "br1").unwrap().scion_interfaces();
        let b = emu.router(120, "br1").unwrap().scion_interfaces();
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        let (a, b) = (&a[&1], &b[&1]);
        assert_eq!(a.link_to, Relationship::Core);
        assert_eq!(b.link_to, Relationship::Core);
        assert_eq!(a.mtu, 1450);
        assert_eq!(b.mtu, 1450);
        assert_eq!(a.isd_as, IsdAsn::new(1, 120));
        assert_eq!(b.isd_as, IsdAsn::new(1, 110));
        assert_eq!(a.underlay.public, "10.3.0.2:50000".parse::<SocketAddr>().unwrap());
        assert_eq!(a.underlay.remote, b.underlay.public);
        assert_eq!(b.underlay.remote, a.underlay.public);
        assert_eq!(a.remote_interface_id, None);

        // both counters moved from 1 to 2
        assert_eq!(emu.autonomous_system_mut(110).unwrap().next_ifid(), Ok(2));
        assert_eq!(emu.autonomous_system_mut(120).unwrap().next_ifid(), Ok(2));
    }

    #[test]
    fn test_transit_child_and_parent() {
        let mut emu = Emulation::new();
        new_as(&mut emu, 1, 120, &["br1"]);
        new_as(&mut emu, 1, 121, &["br1"]);
        xc(&mut emu, (121, "br1", "10.4.0.2/29"), (120, "br1", "10.4.0.3/29"), DEFAULT_MTU);
        let mut links = LinkRegistry::new();
        links
            .add_cross_connect(LinkEnds::new((1, 120), (1, 121), LinkType::Transit), 1)
            .unwrap();

        LinkResolver::default().resolve(&links, &mut emu).unwrap();
        // the first declared end carries CHILD
        assert_eq!(iface(&emu, 120, "br1", 1).link_to, Relationship::Child);
        assert_eq!(iface(&emu, 121, "br1", 1).link_to, Relationship::Parent);
    }

    #[test]
    fn test_transit_follows_declaration_order() {
        let mut emu = Emulation::new();
        new_as(&mut emu, 1, 120, &["br1"]);
        new_as(&mut emu, 1, 121, &["br1"]);
        xc(&mut emu, (121, "br1", "10.4.0.2/29"), (120, "br1", "10.4.0.3/29"), DEFAULT_MTU);
        let mut links = LinkRegistry::new();
        links
            .add_cross_connect(LinkEnds::new((1, 121), (1, 120), LinkType::Transit), 1)
            .unwrap();

        let resolved = LinkResolver::default().resolve(&links, &mut emu).unwrap();
        assert_eq!(resolved[0].a.ia, IsdAsn::new(1, 121));
        assert_eq!(iface(&emu, 121, "br1", 1).link_to, Relationship::Child);
        assert_eq!(iface(&emu, 120, "br1", 1).link_to, Relationship::Parent);
    }

    #[test]
    fn test_unnamed_routers_are_discovered() {
        let mut emu = core_pair();
        // br2 of AS110 also connects to AS130 only
        new_as(&mut emu, 1, 130, &["br1"]);
        xc(&mut emu, (110, "br2", "10.3.0.10/29"), (130, "br1", "10.3.0.11/29"), DEFAULT_MTU);

        let mut links = LinkRegistry::new();
        links
            .add_cross_connect(LinkEnds::new((1, 110), (1, 130), LinkType::Core), 1)
            .unwrap()
            .add_cross_connect(LinkEnds::new((1, 110), (1, 120), LinkType::Core).routers("", "br1"), 1)
            .unwrap();

        let resolved = LinkResolver::default().resolve(&links, &mut emu).unwrap();
        assert_eq!(resolved[0].a.router, "br2");
        assert_eq!(resolved[0].b.router, "br1");
        assert_eq!(resolved[1].a.router, "br1");
        // ifids follow declaration order
        assert_eq!(resolved[0].a.ifid, 1);
        assert_eq!(resolved[1].a.ifid, 2);
    }

    #[test]
    fn test_repeated_link_allocates_fresh_ids_and_ports() {
        let mut emu = core_pair();
        let mut links = LinkRegistry::new();
        links
            .add_cross_connect(LinkEnds::new((1, 110), (1, 120), LinkType::Core), 3)
            .unwrap();

        let resolved = LinkResolver::default().resolve(&links, &mut emu).unwrap();
        let ifids: Vec<u16> = resolved.iter().map(|link| link.a.ifid).collect();
        let ports: Vec<u16> = resolved.iter().map(|link| link.a.underlay.port()).collect();
        assert_eq!(ifids, vec![1, 2, 3]);
        assert_eq!(ports, vec![50000, 50001, 50002]);
        assert_eq!(emu.router(110, "br1").unwrap().scion_interfaces().len(), 3);
    }

    #[test]
    fn test_peer_link_sets_remote_interface_ids() {
        let mut emu = core_pair();
        // take ifid 1 on AS110 so both sides differ
        emu.autonomous_system_mut(110).unwrap().next_ifid().unwrap();
        let mut links = LinkRegistry::new();
        links
            .add_cross_connect(LinkEnds::new((1, 110), (1, 120), LinkType::Peer), 1)
            .unwrap();

        let resolved = LinkResolver::default().resolve(&links, &mut emu).unwrap();
        let (a, b) = (&resolved[0].a, &resolved[0].b);
        assert_eq!((a.ifid, b.ifid), (2, 1));
        assert_eq!(iface(&emu, 110, "br1", 2).remote_interface_id, Some(1));
        assert_eq!(iface(&emu, 120, "br1", 1).remote_interface_id, Some(2));
        assert_eq!(iface(&emu, 120, "br1", 1).link_to, Relationship::Peer);
    }

    #[test]
    fn test_peer_remote_interface_ids_can_be_disabled() {
        let mut emu = core_pair();
        let mut links = LinkRegistry::new();
        links
            .add_cross_connect(LinkEnds::new((1, 110), (1, 120), LinkType::Peer), 1)
            .unwrap();
        let options = ResolverOptions {
            peer_remote_interface_ids: false,
        };
        LinkResolver::new(options).resolve(&links, &mut emu).unwrap();
        assert_eq!(iface(&emu, 110, "br1", 1).remote_interface_id, None);
    }

    #[test]
    fn test_unknown_router() {
        let mut emu = core_pair();
        let mut links = LinkRegistry::new();
        links
            .add_cross_connect(LinkEnds::new((1, 110), (1, 120), LinkType::Core).routers("br9", "br1"), 1)
            .unwrap();
        let err = LinkResolver::default().resolve(&links, &mut emu).unwrap_err();
        assert_eq!(
            err,
            ScionError::UnknownRouter {
                ia: IsdAsn::new(1, 110),
                router: "br9".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_router_with_discovered_peer() {
        let mut emu = core_pair();
        let mut links = LinkRegistry::new();
        links
            .add_cross_connect(LinkEnds::new((1, 110), (1, 120), LinkType::Core).routers("", "br7"), 1)
            .unwrap();
        let err = LinkResolver::default().resolve(&links, &mut emu).unwrap_err();
        assert_eq!(
            err,
            ScionError::UnknownRouter {
                ia: IsdAsn::new(1, 120),
                router: "br7".to_string()
            }
        );
    }

    #[test]
    fn test_unresolved_without_cross_connect() {
        let mut emu = core_pair();
        new_as(&mut emu, 1, 130, &["br1"]);
        let mut links = LinkRegistry::new();
        links
            .add_cross_connect(LinkEnds::new((1, 120), (1, 130), LinkType::Core), 1)
            .unwrap();
        let err = LinkResolver::default().resolve(&links, &mut emu).unwrap_err();
        assert!(matches!(err, ScionError::UnresolvedLink { .. }));
    }

    #[test]
    fn test_unknown_as() {
        let mut emu = core_pair();
        let mut links = LinkRegistry::new();
        links
            .add_cross_connect(LinkEnds::new((1, 110), (1, 999), LinkType::Core), 1)
            .unwrap();
        let err = LinkResolver::default().resolve(&links, &mut emu).unwrap_err();
        assert_eq!(err, ScionError::UnknownAs { asn: 999 });
    }

    #[test]
    fn test_asymmetric_networks_rejected() {
        let mut emu = Emulation::new();
        new_as(&mut emu, 1, 110, &["br1"]);
        new_as(&mut emu, 1, 120, &["br1"]);
        record_xc(&mut emu, 110, "br1", 120, "br1", "10.3.0.2/29", "xc_left");
        record_xc(&mut emu, 120, "br1", 110, "br1", "10.3.0.3/29", "xc_right");
        let mut links = LinkRegistry::new();
        links
            .add_cross_connect(LinkEnds::new((1, 110), (1, 120), LinkType::Core).routers("br1", "br1"), 1)
            .unwrap();
        let err = LinkResolver::default().resolve(&links, &mut emu).unwrap_err();
        assert!(matches!(err, ScionError::AsymmetricLink { .. }));
    }

    #[test]
    fn test_failure_leaves_no_partial_interfaces() {
        let mut emu = core_pair();
        let mut links = LinkRegistry::new();
        links
            .add_cross_connect(LinkEnds::new((1, 110), (1, 120), LinkType::Core), 1)
            .unwrap()
            .add_exchange_link(100, LinkEnds::new((1, 110), (1, 120), LinkType::Core), 1)
            .unwrap();
        let err = LinkResolver::default().resolve(&links, &mut emu).unwrap_err();
        assert!(matches!(err, ScionError::ExchangeMembership { exchange: 100, .. }));
        assert!(emu.router(110, "br1").unwrap().scion_interfaces().is_empty());
        assert!(emu.router(120, "br1").unwrap().scion_interfaces().is_empty());
        assert_eq!(emu.autonomous_system_mut(110).unwrap().next_ifid(), Ok(1));
    }

    #[test]
    fn test_exhaustion_is_detected_before_attaching() {
        let mut emu = core_pair();
        let mut links = LinkRegistry::new();
        links
            .add_cross_connect(LinkEnds::new((1, 110), (1, 120), LinkType::Core), 20_000)
            .unwrap();
        let err = LinkResolver::default().resolve(&links, &mut emu).unwrap_err();
        assert_eq!(
            err,
            ScionError::PortsExhausted {
                asn: 110,
                router: "br1".to_string()
            }
        );
        assert!(emu.router(110, "br1").unwrap().scion_interfaces().is_empty());
        assert!(emu.router(120, "br1").unwrap().scion_interfaces().is_empty());
        assert_eq!(emu.free_ports(110, "br1"), 15536);
        assert_eq!(emu.free_ifids(110), 65535);
    }

    #[test]
    fn test_capacity_is_summed_across_declarations() {
        let mut emu = core_pair();
        let mut links = LinkRegistry::new();
        // each declaration fits on its own, both together do not
        links
            .add_cross_connect(LinkEnds::new((1, 110), (1, 120), LinkType::Core), 10_000)
            .unwrap()
            .add_cross_connect(LinkEnds::new((1, 120), (1, 110), LinkType::Core), 10_000)
            .unwrap();
        let err = LinkResolver::default().resolve(&links, &mut emu).unwrap_err();
        assert!(matches!(err, ScionError::PortsExhausted { .. }));
        assert!(emu.router(110, "br1").unwrap().scion_interfaces().is_empty());
        assert!(emu.router(120, "br1").unwrap().scion_interfaces().is_empty());
    }

    #[test]
    fn test_exact_capacity_is_accepted() {
        let mut emu = core_pair();
        let mut links = LinkRegistry::new();
        links
            .add_cross_connect(LinkEnds::new((1, 110), (1, 120), LinkType::Core), 15_536)
            .unwrap();
        let resolved = LinkResolver::default().resolve(&links, &mut emu).unwrap();
        assert_eq!(resolved.len(), 15_536);
        assert_eq!(emu.free_ports(110, "br1"), 0);
        assert_eq!(emu.free_ifids(120), 65535 - 15_536);
    }

    #[test]
    fn test_exchange_link() {
        let mut emu = Emulation::new();
        new_as(&mut emu, 1, 150, &["br0"]);
        new_as(&mut emu, 1, 151, &["br0", "br1"]);
        join_ix(&mut emu, 150, "br0", 100);
        join_ix(&mut emu, 151, "br1", 100);
        let mut links = LinkRegistry::new();
        links
            .add_exchange_link(100, LinkEnds::new((1, 150), (1, 151), LinkType::Core), 1)
            .unwrap();

        let resolved = LinkResolver::default().resolve(&links, &mut emu).unwrap();
        assert_eq!(resolved[0].kind, LinkKind::Exchange(100));
        assert_eq!(resolved[0].b.router, "br1");
        let a = iface(&emu, 150, "br0", 1);
        assert_eq!(a.underlay.public, "10.100.0.150:50000".parse::<SocketAddr>().unwrap());
        assert_eq!(a.underlay.remote, "10.100.0.151:50000".parse::<SocketAddr>().unwrap());
        assert_eq!(a.mtu, 1400);
    }

    #[test]
    fn test_exchange_membership_required() {
        let mut emu = Emulation::new();
        new_as(&mut emu, 1, 150, &["br0"]);
        new_as(&mut emu, 1, 151, &["br0"]);
        join_ix(&mut emu, 150, "br0", 100);
        let mut links = LinkRegistry::new();
        links
            .add_exchange_link(100, LinkEnds::new((1, 150), (1, 151), LinkType::Peer), 1)
            .unwrap();
        let err = LinkResolver::default().resolve(&links, &mut emu).unwrap_err();
        assert_eq!(
            err,
            ScionError::ExchangeMembership {
                ia: IsdAsn::new(1, 151),
                exchange: 100
            }
        );
    }

    #[test]
    fn test_exchange_nobody_attached() {
        let mut emu = Emulation::new();
        new_as(&mut emu, 1, 150, &["br0"]);
        new_as(&mut emu, 1, 151, &["br0"]);
        let mut links = LinkRegistry::new();
        links
            .add_exchange_link(101, LinkEnds::new((1, 150), (1, 151), LinkType::Core), 1)
            .unwrap();
        let err = LinkResolver::default().resolve(&links, &mut emu).unwrap_err();
        assert!(matches!(err, ScionError::ExchangeMembership { exchange: 101, .. }));
        assert!(emu.router(150, "br0").unwrap().scion_interfaces().is_empty());
    }

    #[test]
    fn test_named_exchange_router_must_be_attached() {
        let mut emu = Emulation::new();
        new_as(&mut emu, 1, 150, &["br0", "br1"]);
        new_as(&mut emu, 1, 151, &["br0"]);
        join_ix(&mut emu, 150, "br0", 100);
        join_ix(&mut emu, 151, "br0", 100);
        let mut links = LinkRegistry::new();
        links
            .add_exchange_link(100, LinkEnds::new((1, 150), (1, 151), LinkType::Core).routers("br1", ""), 1)
            .unwrap();
        let err = LinkResolver::default().resolve(&links, &mut emu).unwrap_err();
        assert!(matches!(err, ScionError::ExchangeMembership { .. }));
    }
}
