use rand::Rng;

/// Draws per slot before the slot is given up.
pub const ATTEMPTS_PER_SLOT: usize = 3;

/// Picks up to `count` distinct whole seconds in `[0, duration)`.
///
/// Each slot gets [`ATTEMPTS_PER_SLOT`] draws; a slot whose draws all collide with
/// already accepted values is dropped, so the result can be shorter than `count`.
/// A zero duration always draws 0, which yields `[0]` for any non-zero count.
/// Values come back in acceptance order.
pub fn sample_timestamps<R: Rng>(count: usize, duration: u64, rng: &mut R) -> Vec<u64> {
    // At most `duration` distinct seconds exist (one for a zero duration).
    let distinct = usize::try_from(duration.max(1)).unwrap_or(usize::MAX);
    let mut accepted: Vec<u64> = Vec::with_capacity(count.min(distinct));

    for _ in 0..count {
        if accepted.len() == distinct {
            break;
        }
        for _ in 0..ATTEMPTS_PER_SLOT {
            let candidate = draw(duration, rng);
            if !accepted.contains(&candidate) {
                accepted.push(candidate);
                break;
            }
        }
    }

    accepted
}

fn draw<R: Rng>(upper: u64, rng: &mut R) -> u64 {
    if upper == 0 {
        0
    } else {
        rng.gen_range(0..upper)
    }
}
