//! Gold partitioning and pile placement

use crate::grid::{Grid, GridError, Pos};
use log::debug;
use rand::Rng;
use shared::GOLD;
use thiserror::Error;

/// Smallest pile drawn by the partitioner.
pub const PILE_MIN: u32 = 5;
/// Largest pile drawn by the partitioner.
pub const PILE_MAX: u32 = 30;

const PARTITION_ATTEMPTS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GoldError {
    #[error("cannot split {total} nuggets into {min_piles}..={max_piles} piles")]
    InvalidBounds {
        total: u32,
        min_piles: usize,
        max_piles: usize,
    },
    #[error("no partition within bounds after {attempts} attempts")]
    PartitionExhausted { attempts: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PileState {
    Remaining(u32),
    /// Collected; never refilled or moved.
    Exhausted,
}

/// A fixed-location bundle of nuggets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoldPile {
    pub pos: Pos,
    pub size: u32,
    state: PileState,
}

impl GoldPile {
    pub fn new(pos: Pos, size: u32) -> Self {
        Self {
            pos,
            size,
            state: PileState::Remaining(size),
        }
    }

    pub fn state(&self) -> PileState {
        self.state
    }

    pub fn remaining(&self) -> u32 {
        match self.state {
            PileState::Remaining(count) => count,
            PileState::Exhausted => 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == PileState::Exhausted
    }

    /// Takes the whole pile. Returns `None` once it has been collected.
    pub fn collect(&mut self) -> Option<u32> {
        match self.state {
            PileState::Remaining(count) => {
                self.state = PileState::Exhausted;
                Some(count)
            }
            PileState::Exhausted => None,
        }
    }
}

/// Splits `total` nuggets into between `min_piles` and `max_piles` piles.
///
/// Each attempt draws sizes uniformly from [`PILE_MIN`]..=[`PILE_MAX`],
/// clamping so the sum never passes `total`; the pile at `max_piles` absorbs
/// whatever remains. Attempts that stop short of `min_piles` are discarded.
/// The returned vector's length is the pile count.
pub fn partition_gold<R: Rng + ?Sized>(
    rng: &mut R,
    total: u32,
    min_piles: usize,
    max_piles: usize,
) -> Result<Vec<u32>, GoldError> {
    let reachable = (min_piles.saturating_sub(1) as u64) * u64::from(PILE_MIN) < u64::from(total);
    if total == 0 || min_piles == 0 || min_piles > max_piles || !reachable {
        return Err(GoldError::InvalidBounds {
            total,
            min_piles,
            max_piles,
        });
    }

    for attempt in 0..PARTITION_ATTEMPTS {
        let mut piles = Vec::with_capacity(max_piles);
        let mut added = 0;

        while piles.len() < max_piles && added < total {
            let mut amount = rng.gen_range(PILE_MIN..=PILE_MAX);
            if amount + added > total || piles.len() == max_piles - 1 {
                amount = total - added;
            }
            piles.push(amount);
            added += amount;
        }

        if piles.len() >= min_piles {
            debug!(
                "Partitioned {} nuggets into {} piles after {} retries",
                total,
                piles.len(),
                attempt
            );
            return Ok(piles);
        }
    }

    Err(GoldError::PartitionExhausted {
        attempts: PARTITION_ATTEMPTS,
    })
}

/// Drops one pile on a random floor cell.
pub fn place_pile<R: Rng + ?Sized>(
    grid: &mut Grid,
    rng: &mut R,
    size: u32,
) -> Result<GoldPile, GridError> {
    let pos = grid.place_random(rng, GOLD)?;
    Ok(GoldPile::new(pos, size))
}
