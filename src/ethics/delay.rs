//! Randomized politeness delay
//!
//! Delays are drawn from a triangular distribution whose mode sits at the
//! midpoint of the configured bounds, so most waits cluster in the middle
//! and bursts of back-to-back scans are smoothed out.

use rand::Rng;
use std::time::Duration;

/// Default lower bound of the politeness delay
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(2500);

/// Default upper bound of the politeness delay
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(7000);

/// Samples a politeness delay in `[min, max]`
pub fn sample_delay(min: Duration, max: Duration) -> Duration {
    let u = rand::rng().random::<f64>();
    triangular(min, max, u)
}

/// Maps a uniform sample `u` in `[0, 1]` onto a triangular distribution
///
/// The mode is the midpoint of `[min, max]`. Swapped bounds are reordered.
pub fn triangular(min: Duration, max: Duration, u: f64) -> Duration {
    let (a, b) = if min <= max {
        (min.as_secs_f64(), max.as_secs_f64())
    } else {
        (max.as_secs_f64(), min.as_secs_f64())
    };
    let span = b - a;
    if span <= 0.0 {
        return Duration::from_secs_f64(a);
    }

    let u = u.clamp(0.0, 1.0);
    let c = a + span / 2.0;
    let split = (c - a) / span;

    let value = if u < split {
        a + (u * span * (c - a)).sqrt()
    } else {
        b - ((1.0 - u) * span * (b - c)).sqrt()
    };

    Duration::from_secs_f64(value.clamp(a, b))
}
