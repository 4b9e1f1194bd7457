//! SCION link declaration and resolution.
//!
//! Links are declared between ASes in a [`LinkRegistry`] and turned into
//! border-router interfaces by the [`LinkResolver`].

pub mod declaration;
pub mod interface;
pub mod resolver;

pub use declaration::{LinkEnds, LinkRegistry};
pub use interface::{InterfaceDescriptor, Underlay};
pub use resolver::{LinkKind, LinkResolver, ResolvedEnd, ResolvedLink, ResolverOptions};
