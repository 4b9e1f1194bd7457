//! # sciontopo - Declarative SCION topology builder
//!
//! This library compiles a declarative description of a multi-AS SCION
//! network into the configuration files the SCION daemons consume: one
//! topology descriptor per AS and ISD, master keys, beaconing policies,
//! control-service and gateway configuration, plus a connection graph.
//!
//! ## Overview
//!
//! A topology is declared as ASes with their networks, border routers, hosts
//! and control services, and as logical links between ASes. The hard part is
//! link resolution: a link names only two ASes (and optionally their border
//! routers), and the resolver has to find the physical connection between
//! them, allocate interface ids and underlay ports, and build matching
//! interface descriptors on both sides.
//!
//! ## Architecture
//!
//! - `scion`: identifiers, link types, per-AS configuration state and the
//!   topology, control-service and gateway artifacts
//! - `links`: link declaration registry and the link resolution engine
//! - `emulation`: emulated network objects, registry traits and the builder
//!   turning a configuration into an emulation
//! - `graph`: connection graph and GraphViz rendering
//! - `config`, `config_loader`: YAML configuration schema, validation, loading
//! - `orchestrator`: phase driver from configuration to written artifacts
//! - `utils`: SCION duration formatting
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use sciontopo::links::ResolverOptions;
//! use sciontopo::{config_loader, orchestrator};
//! use std::path::Path;
//!
//! let config = config_loader::load_config(Path::new("topology.yaml"))?;
//! let mut rng = StdRng::seed_from_u64(42);
//! orchestrator::generate_scion_config(&config, Path::new("scion_output"), ResolverOptions::default(), &mut rng)?;
//!
//! // scion_output/ now contains one directory per AS and ISD, e.g.
//! // - 1-110/topology.json
//! // - 1-110/keys/master0.key, 1-110/keys/master1.key
//! // - 1-110/control/cs1.toml
//! // and the connection graph scion_links.dot
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! isds: [1]
//! ases:
//!   - asn: 110
//!     isds: [{ isd: 1, core: true }]
//!     networks: [{ name: net0 }]
//!     control_services: [{ name: cs1, networks: [net0] }]
//!     routers:
//!       - name: br1
//!         networks: [net0]
//!         cross_connects: [{ peer_asn: 120, peer_router: br1, address: 10.3.0.2/29 }]
//!   - asn: 120
//!     # ...
//! links:
//!   - { kind: cross_connect, a: 1-110, b: 1-120, type: Core }
//! ```
//!
//! ## Error Handling
//!
//! Library components return typed errors (`ScionError`, `ValidationError`,
//! `BuildError`). The orchestrator and the binary report them through
//! `color_eyre` with context. Every error aborts the whole pass; no files are
//! written for a failed pass.

pub mod config;
pub mod config_loader;
pub mod emulation;
pub mod graph;
pub mod links;
pub mod orchestrator;
pub mod scion;
pub mod utils;
