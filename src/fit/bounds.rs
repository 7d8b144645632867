//! Box constraints via parameter transformation.
//!
//! The optimizer works on unconstrained "internal" values; the model sees
//! "external" values that can never leave their bounds:
//!
//! - `[min, max]`: `ext = min + (sin(int) + 1)(max − min)/2`
//! - `[min, ∞)`:   `ext = min − 1 + √(int² + 1)`
//! - `(−∞, max]`:  `ext = max + 1 − √(int² + 1)`
//! - unbounded:    `ext = int`

use crate::domain::Bounds;

/// Map a bounded value to the optimizer's unconstrained space.
///
/// Values outside the bounds are clamped first.
pub fn to_internal(value: f64, bounds: Bounds) -> f64 {
    match (bounds.min.is_finite(), bounds.max.is_finite()) {
        (true, true) => {
            let span = bounds.max - bounds.min;
            if span <= 0.0 {
                return 0.0;
            }
            (2.0 * (value - bounds.min) / span - 1.0).clamp(-1.0, 1.0).asin()
        }
        (true, false) => {
            let u = (value - bounds.min).max(0.0) + 1.0;
            (u * u - 1.0).sqrt()
        }
        (false, true) => {
            let u = (bounds.max - value).max(0.0) + 1.0;
            (u * u - 1.0).sqrt()
        }
        (false, false) => value,
    }
}

/// Inverse of [`to_internal`].
pub fn to_external(internal: f64, bounds: Bounds) -> f64 {
    match (bounds.min.is_finite(), bounds.max.is_finite()) {
        (true, true) => bounds.min + (internal.sin() + 1.0) * (bounds.max - bounds.min) / 2.0,
        (true, false) => bounds.min - 1.0 + (internal * internal + 1.0).sqrt(),
        (false, true) => bounds.max + 1.0 - (internal * internal + 1.0).sqrt(),
        (false, false) => internal,
    }
}
