use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelsort_core::{
    load_config_or_default, AudioLanguageScanner, Config, Organizer, QbClient, SubtitleEmbedder,
};

/// Organize completed media downloads into a Plex-compatible library.
#[derive(Parser)]
#[command(name = "reelsort", version, about)]
struct Cli {
    /// Config file path (defaults to $REELSORT_CONFIG or ./reelsort.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Clean, rename, move and index media under a start path.
    Organize {
        /// A library root (containing tv/ and/or movies/) or a single
        /// downloaded item folder.
        start_path: PathBuf,

        /// Completion token of the finished download; passed to the
        /// torrent-removal collaborator. "test" skips removal.
        #[arg(long)]
        torrent_hash: Option<String>,
    },
    /// Backfill index files for an already-organized library.
    Index {
        /// The library root, the tv/ or movies/ folder, or a tv/<show>
        /// folder.
        root: PathBuf,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run() {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var("REELSORT_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("reelsort.toml"));
    let config = load_config_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    match cli.command {
        Command::Organize {
            start_path,
            torrent_hash,
        } => {
            let organizer = build_organizer(&config);
            let summary = organizer
                .organize(&start_path, torrent_hash.as_deref())
                .context("Organize run failed")?;

            println!("{}", summary);
            for skip in &summary.skips {
                println!("skipped {}: {}", skip.path.display(), skip.reason);
            }
            Ok(())
        }
        Command::Index { root } => {
            let summary = reelsort_core::generate_indexes(&root, &config)
                .context("Index backfill failed")?;

            println!("Scanned: {}", root.display());
            println!("Videos found: {}", summary.total_videos);
            println!("Eligible (correct place/name): {}", summary.eligible_videos);
            println!("Newly indexed: {}", summary.newly_indexed);
            Ok(())
        }
    }
}

fn build_organizer(config: &Config) -> Organizer {
    let mut organizer = Organizer::new(config.clone());

    if let Some(qb_config) = &config.qbittorrent {
        match QbClient::new(qb_config.clone()) {
            Ok(client) => {
                organizer = organizer.with_torrent_remover(Box::new(client));
            }
            Err(e) => warn!("qBittorrent client unavailable: {}", e),
        }
    } else {
        info!("No [qbittorrent] section configured, torrent removal disabled");
    }

    if config.audio.enable_scan {
        organizer = organizer.with_post_move_hook(Box::new(AudioLanguageScanner::new()));
    }
    if config.subtitles.enable_embedding {
        organizer =
            organizer.with_post_move_hook(Box::new(SubtitleEmbedder::new(&config.subtitles)));
    }

    organizer
}
