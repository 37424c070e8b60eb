//! # Nuggets Game Server Library
//!
//! Authoritative server for a text-mode, multi-player gold-collecting game
//! played on a character grid. Players join over UDP, move one cell (or one
//! run of cells) per keystroke, and see only what lies in their line of
//! sight. The game ends when the last nugget is picked up.
//!
//! ## Architecture
//!
//! A single [`game::GameState`] is owned by the dispatch loop in
//! [`network::Server`]. Datagrams arrive on a receiver task, are handled one
//! at a time by [`dispatch::Dispatcher`], and the resulting messages are
//! handed to a sender task. Nothing else touches the game, so no locking is
//! needed.
//!
//! ## Module Organization
//!
//! - `grid`: map loading, cell access and random placement
//! - `visibility`: line-of-sight and per-player remembered views
//! - `gold`: pile partitioning and the pile lifecycle
//! - `client_manager`: player and spectator registry
//! - `game`: the game state tying the above together
//! - `movement`: one-step move resolution, swaps and pickups
//! - `dispatch`: request handling and outgoing messages
//! - `config`: tunables loaded from TOML
//! - `network`: UDP transport
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use rand::{rngs::StdRng, SeedableRng};
//! use server::config::GameConfig;
//! use server::dispatch::Dispatcher;
//! use server::game::GameState;
//! use server::grid::Grid;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GameConfig::default();
//!     let mut game = GameState::new(Grid::load("maps/main.txt")?, StdRng::seed_from_u64(7));
//!     game.load_gold(config.gold_total, config.gold_min_piles, config.gold_max_piles)?;
//!
//!     let mut server = Server::new("0.0.0.0:0", Dispatcher::new(game, config)).await?;
//!     println!("Ready on port {}", server.local_addr()?.port());
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod dispatch;
pub mod game;
pub mod gold;
pub mod grid;
pub mod movement;
pub mod network;
pub mod visibility;
