//! Performance tests for the hot paths of the game server

use rand::rngs::StdRng;
use rand::SeedableRng;
use server::config::GameConfig;
use server::dispatch::Dispatcher;
use server::game::GameState;
use server::gold::partition_gold;
use server::grid::{Grid, Pos};
use server::visibility::is_visible;
use std::net::SocketAddr;
use std::time::Instant;

/// An open room of the given interior size.
fn open_room(rows: usize, columns: usize) -> String {
    let border = format!("+{}+", "-".repeat(columns));
    let inner = format!("|{}|", ".".repeat(columns));
    let mut lines = vec![border.clone()];
    lines.extend(std::iter::repeat(inner).take(rows));
    lines.push(border);
    lines.join("\n")
}

fn peer(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

#[test]
fn benchmark_line_of_sight() {
    let grid = Grid::parse(&open_room(20, 78)).unwrap();
    let origin = Pos::new(10, 40);

    let start = Instant::now();
    let visible = grid
        .positions()
        .filter(|&pos| is_visible(&grid, origin, pos))
        .count();
    let duration = start.elapsed();

    println!("Line of sight over {} cells took: {:?}", visible, duration);
    assert_eq!(visible, grid.rows() * grid.columns());
    assert!(duration.as_millis() < 2000);
}

#[test]
fn benchmark_gold_partition() {
    let mut rng = StdRng::seed_from_u64(1);

    let start = Instant::now();
    for _ in 0..10_000 {
        let piles = partition_gold(&mut rng, 250, 10, 30).unwrap();
        assert_eq!(piles.iter().sum::<u32>(), 250);
    }
    let duration = start.elapsed();

    println!("10,000 partitions took: {:?}", duration);
    assert!(duration.as_millis() < 2000);
}

#[test]
fn benchmark_full_house_join() {
    let grid = Grid::parse(&open_room(20, 78)).unwrap();
    let mut game = GameState::new(grid, StdRng::seed_from_u64(9));
    game.load_gold(250, 10, 30).unwrap();
    let mut dispatcher = Dispatcher::new(game, GameConfig::default());

    let start = Instant::now();
    for port in 0..26 {
        let out = dispatcher.handle(peer(10_000 + port), &format!("PLAY p{}", port));
        assert!(!out.outbox.is_empty());
    }
    let duration = start.elapsed();

    println!("26 joins with display updates took: {:?}", duration);
    assert_eq!(dispatcher.game().clients().joined(), 26);
    assert!(duration.as_millis() < 5000);
}

#[test]
fn benchmark_movement_runs() {
    let grid = Grid::parse(&open_room(20, 78)).unwrap();
    let game = GameState::new(grid, StdRng::seed_from_u64(4));
    let mut dispatcher = Dispatcher::new(game, GameConfig::default());
    for port in 0..4 {
        dispatcher.handle(peer(20_000 + port), &format!("PLAY p{}", port));
    }

    let start = Instant::now();
    for key in ["L", "H", "J", "K"].iter().cycle().take(40) {
        dispatcher.handle(peer(20_000), &format!("KEY {}", key));
    }
    let duration = start.elapsed();

    println!("40 movement runs took: {:?}", duration);
    assert!(duration.as_millis() < 5000);
}
