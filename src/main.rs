//! # Tilecrawl Main Entry Point
//!
//! Generates a floor from the command line, validates it and prints either
//! an ASCII overview or a JSON summary.

use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use tilecrawl::{CrawlError, CrawlResult, GenerationConfig, MacroGrid, PathRequest, RoomCatalog};

/// Command line arguments for the Tilecrawl floor generator.
#[derive(Parser, Debug)]
#[command(name = "tilecrawl")]
#[command(about = "Procedural tile-graph dungeon floors")]
#[command(version)]
struct Args {
    /// Random seed for floor generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON generation config; missing fields use the defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Generate the boss layout instead of a normal floor
    #[arg(long)]
    boss: bool,

    /// Print a JSON summary instead of the ASCII map
    #[arg(long)]
    json: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = initialize_logging(&args.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(2);
    }

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> CrawlResult<()> {
    info!("Starting Tilecrawl v{}", tilecrawl::VERSION);

    let mut config = match &args.config {
        Some(path) => GenerationConfig::from_json_file(path)?,
        None => GenerationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.validate()?;
    info!(
        "Generating {}x{} floor with seed {}",
        config.map_height, config.map_width, config.seed
    );

    let mut grid = MacroGrid::new(config, RoomCatalog::standard())?;
    if args.boss {
        if !grid.generate_boss_room() {
            return Err(CrawlError::GenerationFailed(
                "catalog has no complete boss layout".to_string(),
            ));
        }
    } else {
        let report = grid.generate_floor();
        info!(
            "Resolved {} connectors, {} off the map, {} unmatched",
            report.connectors_resolved, report.out_of_bounds_connectors, report.unmatched_patterns
        );
        grid.validate_floor()?;
    }
    grid.populate_floor();

    let summary = grid.summary();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print!("{}", summary.ascii_map());
    println!(
        "{} rooms, {} enemies, {} eyes",
        summary.rooms.len(),
        summary.enemies,
        summary.eyes
    );
    if let (Some(start), Some(exit)) = (grid.starter_tile(), grid.escape_tile()) {
        let path = grid.find_path(&PathRequest::new(start, exit).get_closest(false));
        println!("Starter to escape: {} steps", path.len());
    }
    Ok(())
}

/// Initializes logging for the binary.
fn initialize_logging(log_level: &str) -> CrawlResult<()> {
    #[cfg(feature = "dev-tools")]
    {
        use tracing::Level;

        let level = match log_level.to_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" => Level::WARN,
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::INFO,
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .try_init()
            .map_err(|e| CrawlError::InvalidConfig(e.to_string()))?;
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        let level: log::LevelFilter = log_level
            .parse()
            .map_err(|_| CrawlError::InvalidConfig(format!("unknown log level '{}'", log_level)))?;

        env_logger::Builder::new()
            .filter_level(level)
            .format_target(false)
            .try_init()
            .map_err(|e| CrawlError::InvalidConfig(e.to_string()))?;
    }

    Ok(())
}
