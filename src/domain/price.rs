//! Energy price reading and configuration types.
//!
//! Prices model an EPEX-spot-like day-ahead feed and are analytic only;
//! they feed derived cost metrics, never billing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use strum_macros::{Display, EnumString};

use super::{iso_z, round_to};

/// Time-of-day tariff band.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TariffType {
    /// 00:00 - 06:00
    Night,
    /// 06:00 - 09:00
    MorningPeak,
    /// 09:00 - 17:00
    Midday,
    /// 17:00 - 20:00
    EveningPeak,
    /// 20:00 - 00:00
    Evening,
}

/// Spot price at one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceReading {
    pub timestamp: DateTime<Utc>,
    pub price_eur_per_kwh: f64,
    pub tariff_type: TariffType,
}

impl PriceReading {
    pub fn to_wire(&self) -> Value {
        json!({
            "timestamp": iso_z(self.timestamp),
            "price_eur_per_kwh": round_to(self.price_eur_per_kwh, 4),
            "tariff_type": self.tariff_type.to_string(),
        })
    }
}

/// Price feed parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceConfig {
    pub night_price: f64,
    pub morning_peak_price: f64,
    pub midday_price: f64,
    pub evening_peak_price: f64,
    pub evening_price: f64,
    pub weekend_discount_pct: f64,
    pub volatility_pct: f64,
    /// Floor in EUR/kWh; prices never drop below this.
    pub min_price: f64,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            night_price: 0.15,
            morning_peak_price: 0.33,
            midday_price: 0.26,
            evening_peak_price: 0.40,
            evening_price: 0.22,
            weekend_discount_pct: 7.5,
            volatility_pct: 10.0,
            min_price: 0.05,
        }
    }
}
