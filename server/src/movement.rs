//! Single-step movement resolution
//!
//! [`resolve_move`] performs exactly one step. Holding a key (an uppercase
//! direction) is the caller's loop: it keeps calling until the outcome is
//! terminal, observing every intermediate step.

use crate::client_manager::PlayerId;
use crate::game::{GameError, GameState};
use crate::grid::Pos;
use log::{debug, info};
use shared::{is_player_symbol, FLOOR, GOLD, TUNNEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Down,
    Up,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Direction {
    /// Maps a movement key to its direction, ignoring case.
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'h' => Some(Direction::Left),
            'l' => Some(Direction::Right),
            'j' => Some(Direction::Down),
            'k' => Some(Direction::Up),
            'y' => Some(Direction::UpLeft),
            'u' => Some(Direction::UpRight),
            'b' => Some(Direction::DownLeft),
            'n' => Some(Direction::DownRight),
            _ => None,
        }
    }

    /// (Δcol, Δrow) for one step.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Up => (0, -1),
            Direction::UpLeft => (-1, -1),
            Direction::UpRight => (1, -1),
            Direction::DownLeft => (-1, 1),
            Direction::DownRight => (1, 1),
        }
    }
}

/// Uppercase keys keep moving until blocked.
pub fn is_repeat_key(key: char) -> bool {
    key.is_ascii_uppercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Blocked,
    Moved,
    Swapped { with: PlayerId },
    PickedUp { nuggets: u32 },
    /// The last nuggets were collected. Reported once.
    GameOver { nuggets: u32 },
}

impl MoveOutcome {
    /// True when a held key should stop repeating.
    pub fn is_terminal(self) -> bool {
        matches!(self, MoveOutcome::Blocked | MoveOutcome::GameOver { .. })
    }
}

/// Moves the player onto `dest`, which held `dest_symbol`, restoring the
/// cell it leaves.
fn step_onto(
    game: &mut GameState,
    id: PlayerId,
    dest: Pos,
    dest_symbol: u8,
) -> Result<(), GameError> {
    let player = game
        .clients_mut()
        .find_by_id_mut(id)
        .ok_or(GameError::UnknownPlayer(id))?;
    let origin = player.pos;
    let vacated = if player.in_tunnel { TUNNEL } else { FLOOR };
    player.pos = dest;
    player.in_tunnel = dest_symbol == TUNNEL;

    let grid = game.grid_mut();
    grid.set(origin, vacated);
    grid.set(dest, id as u8);
    Ok(())
}

fn swap_with(game: &mut GameState, id: PlayerId, other_id: PlayerId) -> Result<(), GameError> {
    let (pos, in_tunnel) = {
        let player = game.find_by_id(id).ok_or(GameError::UnknownPlayer(id))?;
        (player.pos, player.in_tunnel)
    };
    let other = game
        .clients_mut()
        .find_by_id_mut(other_id)
        .filter(|other| !other.quit)
        .ok_or(GameError::UnknownPlayer(other_id))?;
    let other_pos = std::mem::replace(&mut other.pos, pos);
    let other_in_tunnel = std::mem::replace(&mut other.in_tunnel, in_tunnel);

    if let Some(player) = game.clients_mut().find_by_id_mut(id) {
        player.pos = other_pos;
        player.in_tunnel = other_in_tunnel;
    }

    let grid = game.grid_mut();
    grid.set(other_pos, id as u8);
    grid.set(pos, other_id as u8);
    Ok(())
}

/// Resolves one step of player `id` in `direction`.
pub fn resolve_move(
    game: &mut GameState,
    id: PlayerId,
    direction: Direction,
) -> Result<MoveOutcome, GameError> {
    if game.is_finished() {
        return Err(GameError::GameFinished);
    }

    let origin = match game.find_by_id(id) {
        Some(player) if !player.quit => player.pos,
        _ => return Err(GameError::UnknownPlayer(id)),
    };

    let (d_col, d_row) = direction.delta();
    let dest = match origin.offset(d_row, d_col) {
        Some(dest) => dest,
        None => return Ok(MoveOutcome::Blocked),
    };
    let symbol = match game.grid().get(dest) {
        Some(symbol) => symbol,
        None => return Ok(MoveOutcome::Blocked),
    };

    match symbol {
        FLOOR | TUNNEL => {
            step_onto(game, id, dest, symbol)?;
            Ok(MoveOutcome::Moved)
        }
        GOLD => {
            let nuggets = game.collect_gold(id, dest)?;
            step_onto(game, id, dest, FLOOR)?;

            if game.gold_remaining() == 0 {
                game.finish();
                info!("Player {} collected the last gold", id);
                Ok(MoveOutcome::GameOver { nuggets })
            } else {
                Ok(MoveOutcome::PickedUp { nuggets })
            }
        }
        symbol if is_player_symbol(symbol) => {
            let other = symbol as char;
            swap_with(game, id, other)?;
            debug!("Player {} swapped places with {}", id, other);
            Ok(MoveOutcome::Swapped { with: other })
        }
        // walls and solid rock
        _ => Ok(MoveOutcome::Blocked),
    }
}
