//! Seeded randomness and weighted selection.
//!
//! The kernel never touches system randomness. Every random decision
//! draws from a [`SimRng`] seeded from the session seed, so a session
//! replays identically given the same seed and inputs.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::math::Fixed;

/// Deterministic RNG stream used by the simulation.
pub type SimRng = ChaCha8Rng;

/// Create a simulation RNG from a seed.
#[must_use]
pub fn seeded(seed: u64) -> SimRng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Pick an index by cumulative weighted draw.
///
/// Items with zero or negative weight are never chosen. When the roll
/// lands on a boundary the first item in declaration order wins.
/// Returns `None` for an empty slice or a non-positive total weight.
pub fn weighted_index<R: Rng + ?Sized>(weights: &[Fixed], rng: &mut R) -> Option<usize> {
    let total = weights
        .iter()
        .filter(|w| **w > Fixed::ZERO)
        .fold(Fixed::ZERO, |acc, w| acc.saturating_add(*w));

    if total <= Fixed::ZERO {
        return None;
    }

    let roll = Fixed::from_bits(rng.gen_range(0..total.to_bits()));
    let mut cumulative = Fixed::ZERO;
    for (index, weight) in weights.iter().enumerate() {
        if *weight <= Fixed::ZERO {
            continue;
        }
        cumulative = cumulative.saturating_add(*weight);
        if roll < cumulative {
            return Some(index);
        }
    }

    // Unreachable with a positive total, but fall back to the last
    // positively weighted entry rather than panicking.
    weights.iter().rposition(|w| *w > Fixed::ZERO)
}

/// Uniform fixed-point value in `[min, min + spread)`.
///
/// A non-positive spread returns `min`.
pub fn uniform_fixed<R: Rng + ?Sized>(min: Fixed, spread: Fixed, rng: &mut R) -> Fixed {
    if spread <= Fixed::ZERO {
        return min;
    }
    min + Fixed::from_bits(rng.gen_range(0..spread.to_bits()))
}
