//! # Energy-Price Generator
//!
//! EPEX-spot-style day-ahead prices: a time-of-day tariff state machine,
//! an hourly multiplier curve for smooth intra-period transitions, weekend
//! discount, Gaussian volatility and a hard price floor.

use chrono::{DateTime, TimeZone, Timelike, Utc};

use crate::core::{DeterministicRng, IntervalMinutes, TimeSeriesGenerator};
use crate::domain::{PriceConfig, PriceReading, TariffType};
use crate::simulation::load_curves::is_weekend;

/// Hourly price multipliers for smooth intra-period transitions.
pub const HOURLY_MULTIPLIERS: [f64; 24] = [
    0.90, // 00:00 - deep night, lowest
    0.85, // 01:00
    0.82, // 02:00 - absolute minimum
    0.83, // 03:00
    0.88, // 04:00 - early morning start
    0.95, // 05:00 - pre-dawn ramp
    1.05, // 06:00 - morning peak begins
    1.15, // 07:00 - morning ramp
    1.25, // 08:00 - peak morning
    1.10, // 09:00 - transition to midday
    1.05, // 10:00
    1.00, // 11:00 - midday baseline
    0.98, // 12:00 - lunch dip (solar peak)
    0.95, // 13:00 - solar generation peak
    0.97, // 14:00
    1.02, // 15:00 - afternoon rise
    1.08, // 16:00
    1.20, // 17:00 - evening peak begins
    1.35, // 18:00 - peak demand
    1.40, // 19:00 - maximum evening peak
    1.15, // 20:00 - post-peak decline
    1.05, // 21:00
    0.98, // 22:00
    0.93, // 23:00 - late evening
];

/// Tariff band for a UTC hour of day.
pub fn tariff_type(timestamp: DateTime<Utc>) -> TariffType {
    match timestamp.hour() {
        0..=5 => TariffType::Night,
        6..=8 => TariffType::MorningPeak,
        9..=16 => TariffType::Midday,
        17..=19 => TariffType::EveningPeak,
        _ => TariffType::Evening,
    }
}

/// Minute-interpolated hourly multiplier.
pub fn hourly_multiplier(timestamp: DateTime<Utc>) -> f64 {
    let hour = timestamp.hour() as usize;
    let current = HOURLY_MULTIPLIERS[hour];
    let next = HOURLY_MULTIPLIERS[(hour + 1) % 24];
    let interpolation = timestamp.minute() as f64 / 60.0;
    current + (next - current) * interpolation
}

/// Spot price feed.
pub struct EnergyPriceSimulator {
    entity_id: String,
    rng: DeterministicRng,
    interval: IntervalMinutes,
    config: PriceConfig,
}

impl EnergyPriceSimulator {
    pub fn new(
        entity_id: impl Into<String>,
        rng: DeterministicRng,
        interval: IntervalMinutes,
        config: PriceConfig,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            rng,
            interval,
            config,
        }
    }

    pub fn config(&self) -> &PriceConfig {
        &self.config
    }

    /// Clone with a different interval, for history and forecast queries.
    pub fn with_interval(&self, interval: IntervalMinutes) -> Self {
        Self::new(
            self.entity_id.clone(),
            self.rng,
            interval,
            self.config.clone(),
        )
    }

    fn base_price(&self, tariff: TariffType) -> f64 {
        match tariff {
            TariffType::Night => self.config.night_price,
            TariffType::MorningPeak => self.config.morning_peak_price,
            TariffType::Midday => self.config.midday_price,
            TariffType::EveningPeak => self.config.evening_peak_price,
            TariffType::Evening => self.config.evening_price,
        }
    }

    /// Mean price over one UTC day at quarter-hour resolution.
    pub fn average_daily_price(&self, date: DateTime<Utc>) -> f64 {
        let start = day_start(date);
        let mut total = 0.0;
        for slot in 0..96 {
            let ts = start + chrono::Duration::minutes(15 * slot);
            total += self.generate_value(ts).price_eur_per_kwh;
        }
        total / 96.0
    }

    /// Minimum and maximum hourly price over one UTC day.
    pub fn daily_price_range(&self, date: DateTime<Utc>) -> (f64, f64) {
        let start = day_start(date);
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for hour in 0..24 {
            let price = self
                .generate_value(start + chrono::Duration::hours(hour))
                .price_eur_per_kwh;
            min = min.min(price);
            max = max.max(price);
        }
        (min, max)
    }
}

fn day_start(date: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(
        &date
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .expect("midnight exists"),
    )
}

impl TimeSeriesGenerator for EnergyPriceSimulator {
    type Value = PriceReading;

    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn interval(&self) -> IntervalMinutes {
        self.interval
    }

    fn generate_value(&self, timestamp: DateTime<Utc>) -> PriceReading {
        let ts_ms = timestamp.timestamp_millis();
        let mut stream = self.rng.timestamp_stream(&self.entity_id, ts_ms);

        let tariff = tariff_type(timestamp);
        let mut price = self.base_price(tariff) * hourly_multiplier(timestamp);

        if is_weekend(timestamp) {
            price *= 1.0 - self.config.weekend_discount_pct / 100.0;
        }

        // Single volatility draw per timestamp.
        price *= 1.0 + stream.normal(0.0, self.config.volatility_pct / 100.0);

        PriceReading {
            timestamp,
            price_eur_per_kwh: price.max(self.config.min_price),
            tariff_type: tariff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn simulator(seed: u64, config: PriceConfig) -> EnergyPriceSimulator {
        EnergyPriceSimulator::new(
            "epex-spot-de",
            DeterministicRng::new(seed),
            IntervalMinutes::FifteenMinutes,
            config,
        )
    }

    #[rstest]
    #[case(0, TariffType::Night)]
    #[case(5, TariffType::Night)]
    #[case(6, TariffType::MorningPeak)]
    #[case(8, TariffType::MorningPeak)]
    #[case(9, TariffType::Midday)]
    #[case(16, TariffType::Midday)]
    #[case(17, TariffType::EveningPeak)]
    #[case(19, TariffType::EveningPeak)]
    #[case(20, TariffType::Evening)]
    #[case(23, TariffType::Evening)]
    fn test_tariff_bands(#[case] hour: u32, #[case] expected: TariffType) {
        let timestamp = ts(&format!("2024-06-12T{hour:02}:00:00Z"));
        assert_eq!(tariff_type(timestamp), expected);
    }

    #[test]
    fn test_deterministic() {
        let a = simulator(12345, PriceConfig::default());
        let b = simulator(12345, PriceConfig::default());
        let timestamp = ts("2024-06-12T18:00:00Z");

        assert_eq!(a.generate_value(timestamp), b.generate_value(timestamp));
    }

    #[test]
    fn test_price_floor_holds_under_high_volatility() {
        let config = PriceConfig {
            volatility_pct: 35.0,
            min_price: 0.05,
            ..Default::default()
        };
        let sim = simulator(45678, config);

        let mut timestamp = ts("2024-02-05T00:00:00Z");
        for _ in 0..(4 * 24 * 14) {
            let price = sim.generate_value(timestamp).price_eur_per_kwh;
            assert!(price >= 0.05);
            timestamp += chrono::Duration::minutes(15);
        }
    }

    #[test]
    fn test_weekend_discount_lowers_mean() {
        let sim = simulator(12345, PriceConfig::default());

        // Saturday 2024-03-16 vs Monday 2024-03-18; averaging washes out
        // volatility.
        let saturday = sim.average_daily_price(ts("2024-03-16T00:00:00Z"));
        let monday = sim.average_daily_price(ts("2024-03-18T00:00:00Z"));
        assert!(saturday < monday);
    }

    #[test]
    fn test_evening_peak_exceeds_night() {
        let sim = simulator(12345, PriceConfig::default());
        // Compare means across two weeks of weekdays at fixed hours.
        let mean_at = |hour: u32| -> f64 {
            (0..5)
                .map(|d| {
                    let t = ts(&format!("2024-06-{:02}T{hour:02}:00:00Z", 10 + d));
                    sim.generate_value(t).price_eur_per_kwh
                })
                .sum::<f64>()
                / 5.0
        };

        assert!(mean_at(19) > mean_at(2) * 2.0);
    }

    #[test]
    fn test_hourly_multiplier_interpolates() {
        // Halfway between 18:00 (1.35) and 19:00 (1.40).
        let m = hourly_multiplier(ts("2024-06-12T18:30:00Z"));
        assert!((m - 1.375).abs() < 1e-9);
    }

    #[test]
    fn test_daily_price_range_ordering() {
        let sim = simulator(12345, PriceConfig::default());
        let (min, max) = sim.daily_price_range(ts("2024-06-12T00:00:00Z"));
        assert!(min >= 0.05);
        assert!(max > min);
    }

    #[test]
    fn test_zero_volatility_is_analytic() {
        let config = PriceConfig {
            volatility_pct: 0.0,
            weekend_discount_pct: 0.0,
            ..Default::default()
        };
        let sim = simulator(1, config);

        // 19:00 weekday: evening peak base x multiplier, no noise.
        let price = sim
            .generate_value(ts("2024-06-12T19:00:00Z"))
            .price_eur_per_kwh;
        assert!((price - 0.40 * 1.40).abs() < 1e-12);
    }
}
