//! # Industrial Load Curves
//!
//! Hour-indexed daily load profiles for the energy-meter simulation. The
//! curve shapes are fixed at compile time; only amplitudes and offsets are
//! configurable on the meter itself.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};

use crate::core::RandomStream;

/// Weekday profile, normalised 0-1: high during business hours, low at night.
pub const WEEKDAY_LOAD_CURVE: [f64; 24] = [
    0.30, // 00:00 - night shift minimal
    0.28, // 01:00
    0.25, // 02:00
    0.25, // 03:00
    0.27, // 04:00
    0.35, // 05:00 - early morning ramp-up
    0.55, // 06:00 - shift start
    0.75, // 07:00 - production ramp-up
    0.90, // 08:00 - full production
    0.95, // 09:00 - peak morning
    1.00, // 10:00 - maximum load
    0.98, // 11:00
    0.85, // 12:00 - lunch break dip
    0.92, // 13:00 - afternoon production
    0.98, // 14:00 - peak afternoon
    0.95, // 15:00
    0.88, // 16:00 - late afternoon
    0.70, // 17:00 - shift end ramp-down
    0.50, // 18:00 - evening shift
    0.45, // 19:00
    0.40, // 20:00
    0.38, // 21:00
    0.35, // 22:00
    0.32, // 23:00
];

/// Weekend profile, roughly 60% of the weekday curve.
pub const WEEKEND_LOAD_CURVE: [f64; 24] = [
    0.20, // 00:00 - minimal overnight
    0.18, // 01:00
    0.16, // 02:00
    0.15, // 03:00
    0.15, // 04:00
    0.18, // 05:00
    0.25, // 06:00 - slight morning increase
    0.35, // 07:00
    0.45, // 08:00 - maintenance/monitoring
    0.50, // 09:00
    0.55, // 10:00 - peak weekend activity
    0.52, // 11:00
    0.45, // 12:00
    0.48, // 13:00
    0.50, // 14:00
    0.48, // 15:00
    0.42, // 16:00
    0.35, // 17:00
    0.30, // 18:00
    0.28, // 19:00
    0.25, // 20:00
    0.23, // 21:00
    0.22, // 22:00
    0.21, // 23:00
];

/// Saturday and Sunday (UTC) use the weekend curve.
pub fn is_weekend(timestamp: DateTime<Utc>) -> bool {
    matches!(timestamp.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Interpolated load factor for a timestamp, in `[0, 1]`.
///
/// Linear interpolation between the hour slots using the minute, so
/// 15-minute readings transition smoothly.
pub fn load_factor(timestamp: DateTime<Utc>) -> f64 {
    let curve = if is_weekend(timestamp) {
        &WEEKEND_LOAD_CURVE
    } else {
        &WEEKDAY_LOAD_CURVE
    };

    let hour = timestamp.hour() as usize;
    let current = curve[hour];
    let next = curve[(hour + 1) % 24];
    let interpolation = timestamp.minute() as f64 / 60.0;
    current + (next - current) * interpolation
}

/// Load factor with Gaussian noise, clamped to `[0.1, 1.0]`.
pub fn load_factor_with_noise(
    timestamp: DateTime<Utc>,
    rng: &mut RandomStream,
    noise_factor: f64,
) -> f64 {
    (load_factor(timestamp) + rng.normal(0.0, noise_factor)).clamp(0.1, 1.0)
}

/// Split total power across three phases with bounded imbalance.
///
/// L1 and L2 take independent uniform perturbations; L3 compensates so the
/// deviations sum to zero and the phase total stays exact.
pub fn distribute_across_phases(
    total_power_w: f64,
    rng: &mut RandomStream,
    imbalance_factor: f64,
) -> (f64, f64, f64) {
    let base_share = total_power_w / 3.0;

    let imbalance_l1 = rng.uniform(-imbalance_factor, imbalance_factor);
    let imbalance_l2 = rng.uniform(-imbalance_factor, imbalance_factor);
    let imbalance_l3 = -(imbalance_l1 + imbalance_l2);

    (
        base_share * (1.0 + imbalance_l1),
        base_share * (1.0 + imbalance_l2),
        base_share * (1.0 + imbalance_l3),
    )
}
