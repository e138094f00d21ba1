use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ponte_core::config::{api_key, SiteConfig, DEFAULT_CONFIG_FILE};
use ponte_core::services::build::{build, cache_status, BuildOptions, CacheState};

/// Bilingual (EN/PT-BR) static blog generator.
#[derive(Parser, Debug)]
#[command(name = "ponte", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate what changed and regenerate the whole site
    Build {
        /// Site config file
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Retranslate every unit, ignoring the translation cache
        #[arg(long)]
        force: bool,

        /// Skip the critique and refine stages
        #[arg(long)]
        no_critique: bool,
    },

    /// Show which units are cached, stale or missing (no network)
    CacheStatus {
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    if Path::new(".env").exists() {
        if let Err(e) = dotenvy::dotenv() {
            eprintln!("failed to load .env: {e}");
        }
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build {
            config,
            force,
            no_critique,
        } => {
            let cfg = SiteConfig::load(&config)?;
            let key = api_key()?;
            let opts = BuildOptions {
                force,
                critique: no_critique.then_some(false),
            };

            let report = build(&cfg, &key, opts).context("build aborted")?;
            if report.qa_issues > 0 {
                info!("{} translation QA warning(s), see above", report.qa_issues);
            }
        }

        Command::CacheStatus { config } => {
            let cfg = SiteConfig::load(&config)?;
            let states = cache_status(&cfg)?;

            let width = states.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
            let mut pending = 0;
            for (key, state) in &states {
                println!("{key:<width$}  {state}");
                if !matches!(state, CacheState::Fresh | CacheState::Empty) {
                    pending += 1;
                }
            }
            info!("{} unit(s), {} need translation", states.len(), pending);
        }
    }

    Ok(())
}
