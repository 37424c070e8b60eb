//! Authoritative game state
//!
//! [`GameState`] owns the global grid, the client registry and the gold
//! ledger. The invariant kept here is that the sum of the remaining pile
//! counts always equals `gold_remaining`, and that every active player's
//! position holds its id letter in the grid.

use crate::client_manager::{ClientRef, ClientRegistry, Player, PlayerId, Spectator};
use crate::gold::{partition_gold, place_pile, GoldError, GoldPile};
use crate::grid::{Grid, GridError, Pos};
use crate::visibility::refresh_player_view;
use log::{info, warn};
use rand::rngs::StdRng;
use shared::{ScoreLine, FLOOR, TUNNEL};
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Gold(#[from] GoldError),
    #[error("no player ids left")]
    GameFull,
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    #[error("no gold pile recorded at {0}")]
    MissingPile(Pos),
    #[error("the game is already over")]
    GameFinished,
}

#[derive(Debug)]
pub struct GameState {
    grid: Grid,
    clients: ClientRegistry,
    piles: Vec<GoldPile>,
    gold_remaining: u32,
    finished: bool,
    rng: StdRng,
}

impl GameState {
    /// Creates a game on a loaded map with no gold and no clients.
    pub fn new(grid: Grid, rng: StdRng) -> Self {
        Self {
            grid,
            clients: ClientRegistry::new(),
            piles: Vec::new(),
            gold_remaining: 0,
            finished: false,
            rng,
        }
    }

    /// Partitions `total` nuggets and scatters the piles over open floor.
    pub fn load_gold(
        &mut self,
        total: u32,
        min_piles: usize,
        max_piles: usize,
    ) -> Result<(), GameError> {
        let sizes = partition_gold(&mut self.rng, total, min_piles, max_piles)?;
        for size in sizes {
            let pile = place_pile(&mut self.grid, &mut self.rng, size)?;
            self.gold_remaining += size;
            self.piles.push(pile);
        }
        info!(
            "Placed {} nuggets in {} piles",
            self.gold_remaining,
            self.piles.len()
        );
        Ok(())
    }

    /// Adds a player on a random floor cell and computes its first view.
    ///
    /// The caller enforces the configured player cap; this only fails once
    /// the id letters run out or the map has no floor left.
    pub fn join_player(&mut self, name: String, addr: SocketAddr) -> Result<PlayerId, GameError> {
        let id = self.clients.next_id().ok_or(GameError::GameFull)?;
        let pos = self.grid.place_random(&mut self.rng, id as u8)?;
        let view = self.grid.blank_like();

        self.clients.insert_player(Player::new(id, name, addr, pos, view));
        refresh_player_view(self, id);
        Ok(id)
    }

    /// Installs the spectator. Any current spectator must already have been
    /// removed and notified by the caller.
    pub fn join_spectator(&mut self, addr: SocketAddr) {
        if let Some(previous) = self.clients.set_spectator(addr) {
            warn!("Spectator {} replaced without notice", previous.addr);
        }
    }

    pub fn remove_spectator(&mut self) -> Option<Spectator> {
        self.clients.take_spectator()
    }

    /// Takes a player out of play, restoring the cell it stood on.
    /// Returns the vacated position.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Pos> {
        let player = self.clients.find_by_id(id)?;
        if player.quit {
            return None;
        }
        let pos = player.pos;
        let symbol = if player.in_tunnel { TUNNEL } else { FLOOR };
        self.grid.set(pos, symbol);
        self.clients.mark_quit(id);
        Some(pos)
    }

    /// Removes whichever client `client` refers to.
    pub fn remove_client(&mut self, client: ClientRef) -> bool {
        match client {
            ClientRef::Player(id) => self.remove_player(id).is_some(),
            ClientRef::Spectator => self.remove_spectator().is_some(),
        }
    }

    pub fn find_by_addr(&self, addr: SocketAddr) -> Option<ClientRef> {
        self.clients.find_by_addr(addr)
    }

    pub fn find_by_id(&self, id: PlayerId) -> Option<&Player> {
        self.clients.find_by_id(id)
    }

    /// Moves the pile at `pos` into the player's purse and returns the
    /// number of nuggets taken.
    pub fn collect_gold(&mut self, id: PlayerId, pos: Pos) -> Result<u32, GameError> {
        let pile = self
            .piles
            .iter_mut()
            .find(|pile| pile.pos == pos && !pile.is_exhausted())
            .ok_or(GameError::MissingPile(pos))?;
        let player = self
            .clients
            .find_by_id_mut(id)
            .ok_or(GameError::UnknownPlayer(id))?;

        let nuggets = pile.collect().unwrap_or(0);
        player.purse += nuggets;
        self.gold_remaining -= nuggets;
        info!(
            "Player {} picked up {} nuggets, {} remain",
            id, nuggets, self.gold_remaining
        );
        Ok(nuggets)
    }

    /// Final standings in join order, including players who quit.
    pub fn leaderboard(&self) -> Vec<ScoreLine> {
        self.clients
            .players()
            .map(|player| ScoreLine {
                id: player.id,
                gold: player.purse,
                name: player.name.clone(),
            })
            .collect()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub(crate) fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    pub(crate) fn clients_mut(&mut self) -> &mut ClientRegistry {
        &mut self.clients
    }

    pub fn piles(&self) -> &[GoldPile] {
        &self.piles
    }

    pub fn gold_remaining(&self) -> u32 {
        self.gold_remaining
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn finish(&mut self) {
        self.finished = true;
    }

    /// Places a pile at a fixed cell, bypassing random placement.
    #[cfg(test)]
    pub(crate) fn add_pile_at(&mut self, pos: Pos, size: u32) {
        self.grid.set(pos, shared::GOLD);
        self.piles.push(GoldPile::new(pos, size));
        self.gold_remaining += size;
    }

    /// Registers a player at a fixed floor or tunnel cell.
    #[cfg(test)]
    pub(crate) fn add_player_at(&mut self, name: &str, addr: SocketAddr, pos: Pos) -> PlayerId {
        let id = self.clients.next_id().expect("ids left");
        let in_tunnel = self.grid.get(pos) == Some(TUNNEL);
        self.grid.set(pos, id as u8);
        let mut player = Player::new(id, name.to_string(), addr, pos, self.grid.blank_like());
        player.in_tunnel = in_tunnel;
        self.clients.insert_player(player);
        refresh_player_view(self, id);
        id
    }
}
