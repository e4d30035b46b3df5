//! Padel tournament simulator.
//!
//! Creates a tournament, draws and scores every round with random results,
//! optionally plays a final round and prints the standings.

mod config;
mod simulation;

use std::sync::Arc;

use anyhow::Error;
use config::{CliConfig, CliOverrides};
use log::info;
use padel::{
    Shuffler, TournamentManager,
    db::{Database, MemoryTournamentRepository, PgTournamentRepository, TournamentRepository},
};
use pico_args::Arguments;
use rand::SeedableRng;
use rand::rngs::StdRng;

const HELP: &str = "\
Simulate an Americano or Mexicano padel tournament

USAGE:
  padel_cli [OPTIONS]

OPTIONS:
  --players      N       Number of players, a multiple of 4  [default: env PADEL_PLAYERS or 8]
  --courts       N       Number of courts                    [default: env PADEL_COURTS or 2]
  --rounds       N       Regular rounds to play              [default: env PADEL_ROUNDS or 3]
  --points       N       Points per match (1-50)             [default: env PADEL_POINTS_PER_MATCH or 21]
  --format       NAME    AMERICANO or MEXICANO               [default: env PADEL_FORMAT or AMERICANO]
  --final-match  CODE    Final seeding: 1 = 1&3 vs 2&4, 2 = 1&2 vs 3&4, 3 = 1&4 vs 2&3
                                                             [default: env PADEL_FINAL_MATCH or 2]
  --seed         N       Seed for pairings and scores        [default: env PADEL_SEED or random]
  --db-url       URL     Database connection string          [default: env DATABASE_URL]

FLAGS:
  --final                Play a final round after the regular rounds
  --postgres             Store the tournament in PostgreSQL instead of memory
  --json                 Print the report as JSON
  -h, --help             Print help information

ENVIRONMENT:
  RUST_LOG               Log level (e.g., info, padel=debug)
  (A .env file in the working directory is loaded if present)
";

fn parse_overrides(mut pargs: Arguments) -> Result<CliOverrides, pico_args::Error> {
    Ok(CliOverrides {
        players: pargs.opt_value_from_str("--players")?,
        courts: pargs.opt_value_from_str("--courts")?,
        rounds: pargs.opt_value_from_str("--rounds")?,
        points_per_match: pargs.opt_value_from_str("--points")?,
        format: pargs.opt_value_from_str("--format")?,
        final_match: pargs.opt_value_from_str("--final-match")?,
        seed: pargs.opt_value_from_str("--seed")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        play_final: pargs.contains("--final"),
        postgres: pargs.contains("--postgres"),
        json: pargs.contains("--json"),
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let config = CliConfig::from_env(parse_overrides(pargs)?)?;
    config.validate()?;

    env_logger::builder().format_target(false).init();

    let database = match &config.database {
        Some(db_config) => {
            info!("Connecting to database: {}", db_config.database_url);
            let db = Database::new(db_config)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
            db.health_check()
                .await
                .map_err(|e| anyhow::anyhow!("Database health check failed: {}", e))?;
            db.run_migrations().await?;
            info!("Database connected successfully");
            Some(db)
        }
        None => None,
    };

    let repo: Arc<dyn TournamentRepository> = match &database {
        Some(db) => Arc::new(PgTournamentRepository::new(db.pool().clone())),
        None => Arc::new(MemoryTournamentRepository::new()),
    };

    let (shuffler, mut rng) = match config.seed {
        Some(seed) => (Shuffler::seeded(seed), StdRng::seed_from_u64(seed)),
        None => (Shuffler::new(), StdRng::from_os_rng()),
    };

    let manager = TournamentManager::with_shuffler(repo, shuffler);

    info!(
        "Simulating {} tournament: {} players, {} courts, {} rounds{}",
        config.format,
        config.players,
        config.courts,
        config.rounds,
        if config.play_final { " plus final" } else { "" }
    );

    let report = simulation::run(&manager, &config, &mut rng).await?;

    if config.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", simulation::render(&report));
    }

    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}
