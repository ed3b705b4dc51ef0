//! Point d'entrée CLI pour geolandy

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

use geolandy_cli::Config;

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::{Commands, QueryArgs};

/// Évaluation environnementale des prédios de la réserve forestière
#[derive(Parser)]
#[command(name = "geolandy")]
#[command(author, version)]
#[command(about = "Assess land parcels against the environmental zoning of the Bosque Oriental de Bogota forest reserve")]
#[command(long_about = "Looks up a parcel by CHIP code or by EPSG:9377 coordinates, intersects it with every zone of the reserve zoning and reports affected areas per category.\n\nData layers come from the 'bogota' preset, a JSON config file, GEOLANDY_PARCELS / GEOLANDY_ZONES / GEOLANDY_POLICY or the flags below.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config preset name (bogota) or path to a JSON config
    #[arg(long, default_value = "bogota", global = true)]
    config: String,

    /// Parcel layer (GeoJSON), overrides the config
    #[arg(long, global = true)]
    parcels: Option<PathBuf>,

    /// Zoning layer (GeoJSON), overrides the config
    #[arg(long, global = true)]
    zones: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    debug!(config = ?config, "Configuration resolved");

    match cli.command {
        Commands::Query {
            code,
            x,
            y,
            policy,
            report,
            geojson,
            report_style,
        } => cli::cmd_query(
            &config,
            QueryArgs {
                code,
                x,
                y,
                policy,
                report,
                geojson,
                report_style,
            },
        )?,
        Commands::Session {
            policy,
            report_style,
        } => cli::cmd_session(&config, policy, report_style)?,
        Commands::Zones => cli::cmd_zones(&config)?,
    }

    Ok(())
}

/// Preset ou fichier, puis variables d'environnement, puis options CLI
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_spec(&cli.config)?;
    config.apply_env()?;

    if let Some(path) = &cli.parcels {
        config.parcels.path = path.clone();
    }
    if let Some(path) = &cli.zones {
        config.zones.path = path.clone();
    }

    Ok(config)
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
