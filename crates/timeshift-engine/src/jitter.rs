//! Cosmetic spreading of solved timestamps inside their windows.
//!
//! Runs only after every constraint is satisfied. Each timestamp moves
//! forward by a seeded pseudo-random amount, capped so that it stays inside
//! its own window and leaves the following event at least its required gap
//! away. Walking the placements back to front makes the cap for event `i`
//! depend only on the already-final position of event `i + 1`.

use chrono::{DateTime, Duration, Utc};
use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;

use crate::config::Config;
use crate::solver::Placement;

pub(crate) fn spread(placements: &[Placement], config: &Config) -> Vec<DateTime<Utc>> {
    let max_secs = config.max_jitter.num_seconds();
    if max_secs <= 0 {
        return placements.iter().map(|p| p.at).collect();
    }

    // Drawn in input order so the offset of event `i` depends only on the seed.
    let mut rng = Mcg128Xsl64::seed_from_u64(config.jitter_seed);
    let wanted: Vec<i64> = placements
        .iter()
        .map(|_| rng.gen_range(0..=max_secs))
        .collect();

    let mut shifted: Vec<DateTime<Utc>> = Vec::with_capacity(placements.len());
    let mut next: Option<(DateTime<Utc>, Duration)> = None;

    for (placement, &wanted_secs) in placements.iter().zip(&wanted).rev() {
        let tail = placement.window.end - placement.at - Duration::seconds(1);
        let mut cap = Duration::seconds(wanted_secs).min(tail);
        if let Some((next_at, next_gap)) = next {
            cap = cap.min(next_at - placement.at - next_gap);
        }
        let at = placement.at + cap.max(Duration::zero());

        shifted.push(at);
        next = Some((at, placement.required_gap));
    }

    shifted.reverse();
    shifted
}
