//! Configuration orchestrator.
//!
//! Drives the generation in strict phase order: build the emulated network,
//! declare the links, configure (freeze ASes and resolve links), render all
//! artifacts in memory and only then write them to the output directory. A
//! failure in any phase leaves the output directory untouched.

use crate::config::Config;
use crate::emulation::{build_emulation, declare_links, Emulation};
use crate::graph::build_link_graph;
use crate::links::{LinkRegistry, ResolvedLink, ResolverOptions};
use crate::scion::{build_static_info, build_topology, STATIC_INFO_FILE};
use crate::scion::control::{policy_file, render_control_config};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use rand::Rng;
use std::path::{Path, PathBuf};

/// File name of the connection graph in the output root
pub const LINK_GRAPH_FILE: &str = "scion_links.dot";

/// A generated file, relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub contents: String,
}

impl Artifact {
    fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Result of a successful generation pass
#[derive(Debug)]
pub struct Generation {
    pub emulation: Emulation,
    pub links: LinkRegistry,
    pub resolved: Vec<ResolvedLink>,
    pub artifacts: Vec<Artifact>,
}

/// Run every phase up to rendering. Nothing is written.
pub fn generate<R: Rng>(config: &Config, options: ResolverOptions, rng: &mut R) -> Result<Generation> {
    let mut emulation = build_emulation(config).wrap_err("Failed to build the emulated network")?;
    let links = declare_links(config).wrap_err("Failed to declare SCION links")?;
    log::info!("{}", links);

    let resolved = emulation
        .configure(&links, options, rng)
        .wrap_err("SCION configuration failed")?;
    let artifacts = render_artifacts(&emulation, &links, &resolved)?;

    Ok(Generation {
        emulation,
        links,
        resolved,
        artifacts,
    })
}

/// Render all artifacts of a configured emulation
pub fn render_artifacts(
    emulation: &Emulation,
    links: &LinkRegistry,
    resolved: &[ResolvedLink],
) -> Result<Vec<Artifact>> {
    let mut artifacts = Vec::new();

    for as_ in emulation.autonomous_systems() {
        for isd in as_.isds() {
            let dir = PathBuf::from(format!("{}-{}", isd, as_.asn()));

            let topology = build_topology(as_, isd)
                .wrap_err_with(|| format!("Failed to build topology of AS {}-{}", isd, as_.asn()))?;
            artifacts.push(Artifact::new(
                dir.join("topology.json"),
                serde_json::to_string_pretty(&topology)? + "\n",
            ));

            let (master0, master1) = as_.keys()?.encoded();
            artifacts.push(Artifact::new(dir.join("keys/master0.key"), master0));
            artifacts.push(Artifact::new(dir.join("keys/master1.key"), master1));

            if let Some(static_info) = build_static_info(as_, resolved) {
                artifacts.push(Artifact::new(
                    dir.join(STATIC_INFO_FILE),
                    serde_json::to_string_pretty(&static_info)? + "\n",
                ));
            }

            for (kind, policy) in as_.beacon_policies() {
                let yaml = serde_yaml::to_string(policy)
                    .wrap_err_with(|| format!("Failed to serialize {} policy of AS {}", kind, as_.asn()))?;
                artifacts.push(Artifact::new(dir.join(policy_file(kind)), yaml));
            }

            for cs in as_.control_services() {
                let toml = render_control_config(as_, cs.name()).wrap_err_with(|| {
                    format!("Failed to render control service {} of AS {}", cs.name(), as_.asn())
                })?;
                artifacts.push(Artifact::new(dir.join(format!("control/{}.toml", cs.name())), toml));
            }

            for gateway in as_.gateways() {
                artifacts.push(Artifact::new(
                    dir.join(format!("gateways/{}.json", gateway.name)),
                    serde_json::to_string_pretty(&gateway.traffic_policy())? + "\n",
                ));
            }
        }
    }

    artifacts.push(Artifact::new(LINK_GRAPH_FILE, build_link_graph(links, emulation).to_dot()));
    Ok(artifacts)
}

/// Write artifacts below `output_dir`, creating directories as needed
pub fn write_artifacts(output_dir: &Path, artifacts: &[Artifact]) -> Result<()> {
    for artifact in artifacts {
        let path = output_dir.join(&artifact.path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create directory {:?}", parent))?;
        }
        std::fs::write(&path, &artifact.contents).wrap_err_with(|| format!("Failed to write {:?}", path))?;
        log::debug!("Wrote {:?}", path);
    }
    Ok(())
}

/// Generate the SCION configuration of a topology and write it to `output_dir`
pub fn generate_scion_config<R: Rng>(
    config: &Config,
    output_dir: &Path,
    options: ResolverOptions,
    rng: &mut R,
) -> Result<Generation> {
    let generation = generate(config, options, rng)?;
    write_artifacts(output_dir, &generation.artifacts)?;
    print_summary(output_dir, &generation);
    Ok(generation)
}

pub fn print_summary(output_dir: &Path, generation: &Generation) {
    println!("Generated SCION configuration at {:?}", output_dir);
    println!("  - ISDs: {}", generation.emulation.isolation_domains().count());
    println!("  - ASes: {}", generation.emulation.autonomous_systems().count());
    println!("  - Link declarations: {}", generation.links.len());
    println!("  - Resolved links: {}", generation.resolved.len());
    println!("  - Files written: {}", generation.artifacts.len());
}
