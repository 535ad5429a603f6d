/// Lyra Simulator - headless listening sessions
use clap::{Parser, Subcommand, ValueEnum};
use lyra_playback::RepeatMode;
use lyra_sim::{run_session, SimConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lyra-sim")]
#[command(about = "Drive the Lyra playback engine through a simulated session", long_about = None)]
struct Cli {
    /// Configuration file path (default: ./lyra-sim.toml if present)
    #[arg(short, long, global = true, env = "LYRA_SIM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the catalog and report views
    Run {
        /// Shuffle the queue
        #[arg(long)]
        shuffle: bool,

        /// Repeat mode
        #[arg(long, value_enum)]
        repeat: Option<RepeatArg>,

        /// Seed for the shuffle picker
        #[arg(long)]
        seed: Option<u64>,

        /// Print the session report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load, validate and print the resolved configuration
    CheckConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum RepeatArg {
    Off,
    All,
    One,
}

impl From<RepeatArg> for RepeatMode {
    fn from(arg: RepeatArg) -> Self {
        match arg {
            RepeatArg::Off => RepeatMode::Off,
            RepeatArg::All => RepeatMode::All,
            RepeatArg::One => RepeatMode::One,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lyra_sim=info,lyra_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = SimConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            shuffle,
            repeat,
            seed,
            json,
        } => {
            if shuffle {
                config.playback.shuffle = true;
            }
            if let Some(repeat) = repeat {
                config.playback.repeat = repeat.into();
            }
            if seed.is_some() {
                config.playback.shuffle_seed = seed;
            }
            config.validate()?;

            run(&config, json).await?;
        }
        Commands::CheckConfig => {
            config.validate()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

async fn run(config: &SimConfig, json: bool) -> anyhow::Result<()> {
    tracing::info!("Starting Lyra simulator");
    tracing::info!("Catalog: {} tracks", config.catalog.len());
    tracing::info!(
        "Clock: {}ms ticks at {}x ({:.2}s per tick)",
        config.clock.tick_ms,
        config.clock.speed,
        config.clock.step_secs()
    );

    let report = run_session(config).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Played {} tracks, credited {} views, {} failures{}",
            report.tracks_played.len(),
            report.views.len(),
            report.failures.len(),
            if report.completed { "" } else { " (time limit hit)" }
        );
        for track_id in &report.views {
            println!("  view: {}", track_id);
        }
    }

    Ok(())
}
