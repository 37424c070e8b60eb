//! Line-of-sight and per-player views
//!
//! Visibility follows the straight line between two cell centers. Every
//! column strictly between the endpoints is probed at the row the line
//! crosses it, then every row strictly between them at the crossing column.
//! A probe that lands exactly on a cell checks that cell; one that falls
//! between two cells is blocked only when both neighbors block. All of the
//! crossing points are computed as exact fractions, so no probe is lost to
//! rounding.

use crate::client_manager::{ClientRegistry, PlayerId};
use crate::game::GameState;
use crate::grid::{Grid, Pos};
use shared::{is_blocking, is_player_symbol, FLOOR, GOLD, SELF, TUNNEL, VOID};

/// True for cells that let sight through: floor, tunnel, gold and players.
pub fn is_open(grid: &Grid, row: i64, col: i64) -> bool {
    if row < 0 || col < 0 {
        return false;
    }
    match grid.get(Pos::new(row as usize, col as usize)) {
        Some(symbol) => !is_blocking(symbol),
        None => false,
    }
}

/// Checks the probe at `num / den` along one axis with the other axis fixed
/// at `fixed`. `rows` selects whether the fraction is a row or a column.
fn probe_open(grid: &Grid, num: i64, den: i64, fixed: i64, rows: bool) -> bool {
    let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };
    let open = |along: i64| {
        if rows {
            is_open(grid, along, fixed)
        } else {
            is_open(grid, fixed, along)
        }
    };

    if num % den == 0 {
        open(num / den)
    } else {
        let below = num.div_euclid(den);
        open(below) || open(below + 1)
    }
}

fn between(a: i64, b: i64) -> std::ops::Range<i64> {
    a.min(b) + 1..a.max(b)
}

/// Returns true if `target` can be seen from `origin`.
pub fn is_visible(grid: &Grid, origin: Pos, target: Pos) -> bool {
    let (r0, c0) = (origin.row as i64, origin.col as i64);
    let (r1, c1) = (target.row as i64, target.col as i64);
    let d_row = r1 - r0;
    let d_col = c1 - c0;

    // Crossing row at column c: r0 + d_row * (c - c0) / d_col
    if d_col != 0 {
        for col in between(c0, c1) {
            let num = r0 * d_col + d_row * (col - c0);
            if !probe_open(grid, num, d_col, col, true) {
                return false;
            }
        }
    }

    // Crossing column at row r: c0 + d_col * (r - r0) / d_row
    if d_row != 0 {
        for row in between(r0, r1) {
            let num = c0 * d_row + d_col * (row - r0);
            if !probe_open(grid, num, d_row, row, false) {
                return false;
            }
        }
    }

    true
}

/// Brings one view up to date for a viewer standing at `origin`.
fn update_view(grid: &Grid, clients: &ClientRegistry, origin: Pos, view: &mut Grid) -> bool {
    let mut changed = false;

    for pos in grid.positions() {
        let actual = match grid.get(pos) {
            Some(VOID) | None => continue,
            Some(symbol) => symbol,
        };
        let shown = view.get(pos).unwrap_or(VOID);

        let next = if pos == origin {
            SELF
        } else if is_visible(grid, origin, pos) {
            actual
        } else if shown == GOLD {
            FLOOR
        } else if is_player_symbol(shown) {
            let in_tunnel = clients
                .find_by_id(shown as char)
                .map(|other| other.in_tunnel)
                .unwrap_or(false);
            if in_tunnel {
                TUNNEL
            } else {
                FLOOR
            }
        } else {
            shown
        };

        if next != shown {
            view.set(pos, next);
            changed = true;
        }
    }

    changed
}

/// Recomputes a player's view from the global grid.
///
/// Cells in sight show their current symbol. Remembered gold that is out of
/// sight degrades to floor, and a remembered player to floor or tunnel
/// depending on where that player last stood. Returns whether anything
/// changed.
pub fn refresh_player_view(game: &mut GameState, id: PlayerId) -> bool {
    let (origin, mut view) = match game.clients_mut().find_by_id_mut(id) {
        Some(player) if !player.quit => match player.view.take() {
            Some(view) => (player.pos, view),
            None => return false,
        },
        _ => return false,
    };

    let changed = update_view(game.grid(), game.clients(), origin, &mut view);

    if let Some(player) = game.clients_mut().find_by_id_mut(id) {
        player.view = Some(view);
    }
    changed
}
