//! Declared SCION links.
//!
//! Declaring a link only records it; resolution to concrete routers,
//! interface ids and ports happens later in [`super::resolver`]. Declarations
//! are kept in insertion order, which is the order they are resolved in.

use crate::scion::{IsdAsn, LinkType, ScionError};
use indexmap::IndexMap;
use std::fmt::{self, Display, Formatter};

/// The two ends of a declared link and its type.
///
/// Router names are optional; an unnamed end is discovered during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkEnds {
    pub a: IsdAsn,
    pub b: IsdAsn,
    pub a_router: Option<String>,
    pub b_router: Option<String>,
    pub link_type: LinkType,
}

impl LinkEnds {
    pub fn new(a: impl Into<IsdAsn>, b: impl Into<IsdAsn>, link_type: LinkType) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            a_router: None,
            b_router: None,
            link_type,
        }
    }

    /// Pin the link to named border routers. Empty names leave an end unnamed.
    pub fn routers(mut self, a_router: &str, b_router: &str) -> Self {
        self.a_router = non_empty(a_router);
        self.b_router = non_empty(b_router);
        self
    }

    fn validate(&self, kind: &str, count: u32) -> Result<(), ScionError> {
        if self.a.asn == self.b.asn {
            return Err(ScionError::SelfLink { asn: self.a.asn });
        }
        if count == 0 {
            return Err(ScionError::InvalidLinkCount {
                link: format!("{}: {}", kind, self),
            });
        }
        Ok(())
    }
}

fn non_empty(name: &str) -> Option<String> {
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

impl Display for LinkEnds {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.a_router {
            Some(router) => write!(f, "AS{}_{} -({})-> ", self.a, router, self.link_type)?,
            None => write!(f, "AS{} -({})-> ", self.a, self.link_type)?,
        }
        match &self.b_router {
            Some(router) => write!(f, "AS{}_{}", self.b, router),
            None => write!(f, "AS{}", self.b),
        }
    }
}

/// Registry of declared cross-connect and exchange links with their repeat counts
#[derive(Debug, Clone, Default)]
pub struct LinkRegistry {
    cross_connects: IndexMap<LinkEnds, u32>,
    exchange_links: IndexMap<(u32, LinkEnds), u32>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `count` parallel cross-connect links.
    ///
    /// Fails if the link connects an AS to itself or if the exact same
    /// declaration (ends, routers and type) already exists.
    pub fn add_cross_connect(&mut self, ends: LinkEnds, count: u32) -> Result<&mut Self, ScionError> {
        ends.validate("XC", count)?;
        if self.cross_connects.contains_key(&ends) {
            return Err(ScionError::DuplicateLink {
                link: format!("XC: {}", ends),
            });
        }
        log::debug!("declared SCION XC link {} ({} times)", ends, count);
        self.cross_connects.insert(ends, count);
        Ok(self)
    }

    /// Declare `count` parallel links between two ASes over exchange `exchange`.
    pub fn add_exchange_link(
        &mut self,
        exchange: u32,
        ends: LinkEnds,
        count: u32,
    ) -> Result<&mut Self, ScionError> {
        ends.validate(&format!("IX{}", exchange), count)?;
        let key = (exchange, ends);
        if self.exchange_links.contains_key(&key) {
            return Err(ScionError::DuplicateLink {
                link: format!("IX{}: {}", exchange, key.1),
            });
        }
        log::debug!("declared SCION IX{} link {} ({} times)", exchange, key.1, count);
        self.exchange_links.insert(key, count);
        Ok(self)
    }

    /// All cross-connect declarations in declaration order
    pub fn cross_connects(&self) -> impl Iterator<Item = (&LinkEnds, u32)> {
        self.cross_connects.iter().map(|(ends, count)| (ends, *count))
    }

    /// All exchange declarations in declaration order
    pub fn exchange_links(&self) -> impl Iterator<Item = (u32, &LinkEnds, u32)> {
        self.exchange_links
            .iter()
            .map(|((exchange, ends), count)| (*exchange, ends, *count))
    }

    pub fn len(&self) -> usize {
        self.cross_connects.len() + self.exchange_links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Display for LinkRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "ScionLayer:")?;
        for (exchange, ends, count) in self.exchange_links() {
            write!(f, "    IX{}: {}", exchange, ends)?;
            if count > 1 {
                write!(f, " ({} times)", count)?;
            }
            writeln!(f)?;
        }
        for (ends, count) in self.cross_connects() {
            write!(f, "    XC: {}", ends)?;
            if count > 1 {
                write!(f, " ({} times)", count)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_cross_connect_rejected() {
        let mut links = LinkRegistry::new();
        links
            .add_cross_connect(LinkEnds::new((1, 110), (1, 120), LinkType::Core).routers("br1", "br1"), 1)
            .unwrap();
        let err = links
            .add_cross_connect(LinkEnds::new((1, 110), (1, 120), LinkType::Core).routers("br1", "br1"), 2)
            .unwrap_err();
        assert!(matches!(err, ScionError::DuplicateLink { .. }));
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_same_ends_different_type_or_router_allowed() {
        let mut links = LinkRegistry::new();
        links
            .add_cross_connect(LinkEnds::new((1, 110), (1, 120), LinkType::Core), 1)
            .unwrap()
            .add_cross_connect(LinkEnds::new((1, 110), (1, 120), LinkType::Peer), 1)
            .unwrap()
            .add_cross_connect(LinkEnds::new((1, 110), (1, 120), LinkType::Core).routers("br2", ""), 1)
            .unwrap();
        assert_eq!(links.cross_connects().count(), 3);
    }

    #[test]
    fn test_self_link_rejected() {
        let mut links = LinkRegistry::new();
        let err = links
            .add_cross_connect(LinkEnds::new((1, 110), (2, 110), LinkType::Core), 1)
            .unwrap_err();
        assert_eq!(err, ScionError::SelfLink { asn: 110 });

        let err = links
            .add_exchange_link(100, LinkEnds::new((1, 150), (1, 150), LinkType::Peer), 1)
            .unwrap_err();
        assert_eq!(err, ScionError::SelfLink { asn: 150 });
        assert!(links.is_empty());
    }

    #[test]
    fn test_zero_count_rejected() {
        let mut links = LinkRegistry::new();
        let err = links
            .add_cross_connect(LinkEnds::new((1, 110), (1, 120), LinkType::Core), 0)
            .unwrap_err();
        assert!(matches!(err, ScionError::InvalidLinkCount { .. }));
    }

    #[test]
    fn test_exchange_links_keyed_by_exchange() {
        let mut links = LinkRegistry::new();
        let ends = LinkEnds::new((1, 150), (1, 151), LinkType::Core);
        links.add_exchange_link(100, ends.clone(), 1).unwrap();
        links.add_exchange_link(101, ends.clone(), 1).unwrap();
        let err = links.add_exchange_link(100, ends, 1).unwrap_err();
        assert!(matches!(err, ScionError::DuplicateLink { .. }));
        let exchanges: Vec<u32> = links.exchange_links().map(|(ix, _, _)| ix).collect();
        assert_eq!(exchanges, vec![100, 101]);
    }

    #[test]
    fn test_declaration_order_preserved() {
        let mut links = LinkRegistry::new();
        for asn in [130, 120, 140] {
            links
                .add_cross_connect(LinkEnds::new((1, 110), (1, asn), LinkType::Core), 1)
                .unwrap();
        }
        let order: Vec<u32> = links.cross_connects().map(|(ends, _)| ends.b.asn).collect();
        assert_eq!(order, vec![130, 120, 140]);
    }

    #[test]
    fn test_display() {
        let mut links = LinkRegistry::new();
        links
            .add_exchange_link(100, LinkEnds::new((1, 150), (1, 151), LinkType::Core), 1)
            .unwrap()
            .add_cross_connect(
                LinkEnds::new((1, 110), (1, 120), LinkType::Transit).routers("br1", ""),
                2,
            )
            .unwrap();
        assert_eq!(
            links.to_string(),
            "ScionLayer:\n    IX100: AS1-150 -(Core)-> AS1-151\n    XC: AS1-110_br1 -(Transit)-> AS1-120 (2 times)\n"
        );
    }
}
