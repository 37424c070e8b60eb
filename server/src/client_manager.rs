//! Client registry for the game server
//!
//! Players are keyed by their id letter and kept in join order; the single
//! optional spectator lives in its own slot so it can never alias a player.
//! Players who quit stay registered (marked `quit`) so the final leaderboard
//! still lists them, but they no longer match address lookups.

use crate::grid::{Grid, Pos};
use log::info;
use shared::MAX_PLAYER_IDS;
use std::collections::BTreeMap;
use std::net::SocketAddr;

/// A player's id letter, `A` for the first to join.
pub type PlayerId = char;

/// A participant who moves around the map and collects gold.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub addr: SocketAddr,
    pub pos: Pos,
    /// Nuggets collected so far
    pub purse: u32,
    /// True while standing on a tunnel cell
    pub in_tunnel: bool,
    pub quit: bool,
    /// Private view of the map; released when the player quits
    pub view: Option<Grid>,
}

impl Player {
    pub fn new(id: PlayerId, name: String, addr: SocketAddr, pos: Pos, view: Grid) -> Self {
        Self {
            id,
            name,
            addr,
            pos,
            purse: 0,
            in_tunnel: false,
            quit: false,
            view: Some(view),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.quit
    }
}

/// The observer with an unobstructed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spectator {
    pub addr: SocketAddr,
}

/// Result of looking up a peer address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientRef {
    Player(PlayerId),
    Spectator,
}

#[derive(Debug, Default)]
pub struct ClientRegistry {
    players: BTreeMap<PlayerId, Player>,
    spectator: Option<Spectator>,
    /// Players ever joined, which also picks the next id letter
    joined: usize,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next player will receive, or `None` once every letter has
    /// been handed out.
    pub fn next_id(&self) -> Option<PlayerId> {
        if self.joined >= MAX_PLAYER_IDS {
            return None;
        }
        Some((b'A' + self.joined as u8) as char)
    }

    /// Registers a player under the next id. The caller obtains the id from
    /// [`ClientRegistry::next_id`] so it can place the player first.
    pub fn insert_player(&mut self, player: Player) {
        info!(
            "Player {} ({}) joined from {}",
            player.id, player.name, player.addr
        );
        self.joined += 1;
        self.players.insert(player.id, player);
    }

    /// Installs a spectator, returning the one it displaced.
    pub fn set_spectator(&mut self, addr: SocketAddr) -> Option<Spectator> {
        info!("Spectator joined from {}", addr);
        self.spectator.replace(Spectator { addr })
    }

    pub fn take_spectator(&mut self) -> Option<Spectator> {
        self.spectator.take()
    }

    pub fn spectator(&self) -> Option<Spectator> {
        self.spectator
    }

    /// Marks a player as quit and releases its view.
    pub fn mark_quit(&mut self, id: PlayerId) -> Option<&Player> {
        let player = self.players.get_mut(&id)?;
        player.quit = true;
        player.view = None;
        info!("Player {} ({}) quit", player.id, player.name);
        Some(player)
    }

    /// Finds the active client at an address. The spectator is checked
    /// first.
    pub fn find_by_addr(&self, addr: SocketAddr) -> Option<ClientRef> {
        if self.spectator.map(|s| s.addr) == Some(addr) {
            return Some(ClientRef::Spectator);
        }
        self.players
            .values()
            .find(|player| player.is_active() && player.addr == addr)
            .map(|player| ClientRef::Player(player.id))
    }

    /// Finds a player by id letter, including players who have quit.
    pub fn find_by_id(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn find_by_id_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Every player ever registered, in join order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut()
    }

    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|player| player.is_active())
    }

    /// Number of players ever joined, quitters included.
    pub fn joined(&self) -> usize {
        self.joined
    }
}
