use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sciontopo::config_loader;
use sciontopo::links::ResolverOptions;
use sciontopo::orchestrator;
use std::fs;
use std::path::PathBuf;

/// Compile a declarative SCION topology into control-plane configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the topology configuration YAML file
    #[arg(short, long)]
    config: PathBuf,

    /// Output directory for the generated configuration
    #[arg(short, long, default_value = "scion_output")]
    output: PathBuf,

    /// Seed for master key generation; random if omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Do not set remote interface ids on peering links
    #[arg(long)]
    no_peer_remote_ifid: bool,

    /// Run all phases and print the link summary without writing files
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    // Peek at the configured log level before the logger is set up
    let log_level = fs::read_to_string(&args.config)
        .ok()
        .and_then(|yaml| serde_yaml::from_str::<serde_yaml::Value>(&yaml).ok())
        .and_then(|doc| doc["general"]["log_level"].as_str().map(str::to_string))
        .unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    info!("Configuration file: {:?}", args.config);
    info!("Output directory: {:?}", args.output);

    let config = config_loader::load_config(&args.config)?;
    let options = ResolverOptions {
        peer_remote_interface_ids: config.general.peer_remote_interface_ids() && !args.no_peer_remote_ifid,
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let generation = orchestrator::generate(&config, options, &mut rng)?;
    if args.dry_run {
        print!("{}", generation.links);
        println!(
            "{} link(s) resolved, {} file(s) rendered",
            generation.resolved.len(),
            generation.artifacts.len()
        );
        return Ok(());
    }

    if args.output.exists() {
        fs::remove_dir_all(&args.output)
            .wrap_err_with(|| format!("Failed to remove output directory '{}'", args.output.display()))?;
    }
    orchestrator::write_artifacts(&args.output, &generation.artifacts)?;
    orchestrator::print_summary(&args.output, &generation);

    info!("SCION configuration generated successfully");
    Ok(())
}
