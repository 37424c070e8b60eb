use clap::Parser;
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use server::config::GameConfig;
use server::dispatch::Dispatcher;
use server::game::GameState;
use server::grid::Grid;
use server::network::Server;
use std::path::PathBuf;

/// Nuggets game server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Map file to play on
    map: PathBuf,
    /// Positive seed for a reproducible game
    seed: Option<u64>,
    /// Address to bind to
    #[clap(short = 'H', long, default_value = "0.0.0.0")]
    host: String,
    /// Port to listen on, 0 picks a free one
    #[clap(short, long, default_value = "0")]
    port: u16,
    /// TOML file with game tunables
    #[clap(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };

    let rng = match args.seed {
        Some(0) => return Err("seed must be a positive integer".into()),
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let grid = Grid::load(&args.map)?;
    info!(
        "Loaded {} ({} rows, {} columns)",
        args.map.display(),
        grid.rows(),
        grid.columns()
    );

    let mut game = GameState::new(grid, rng);
    game.load_gold(
        config.gold_total,
        config.gold_min_piles,
        config.gold_max_piles,
    )?;

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::new(&address, Dispatcher::new(game, config)).await?;
    println!("Ready to play, waiting at port {}", server.local_addr()?.port());

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server failed: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("Received Ctrl+C, shutting down...");
        }
    }

    Ok(())
}
