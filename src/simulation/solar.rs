//! # Solar Position and Irradiance
//!
//! Simplified astronomical model: declination and equation of time from the
//! day of year, hour angle using longitude as a UTC-offset proxy, then a
//! clear-sky transmission model and the Erbs correlation to split global
//! irradiance into direct and diffuse components.

use std::f64::consts::PI;

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::core::RandomStream;

/// Floor for `sin(altitude)` divisors near the horizon.
const MIN_SIN_ALTITUDE: f64 = 0.05;
/// Physical cap on direct normal irradiance.
const MAX_DNI_W_M2: f64 = 1200.0;

/// Solar position in the sky.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarPosition {
    /// Angle above the horizon, clamped to `[0, 90]`.
    pub altitude_deg: f64,
    /// Compass direction (0 = N, 90 = E, 180 = S, 270 = W).
    pub azimuth_deg: f64,
    pub is_daylight: bool,
}

/// Irradiance components.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IrradianceComponents {
    pub ghi_w_m2: f64,
    pub dni_w_m2: f64,
    pub dhi_w_m2: f64,
}

/// Solar position for a location and UTC time.
pub fn solar_position(timestamp: DateTime<Utc>, latitude: f64, longitude: f64) -> SolarPosition {
    let day_of_year = timestamp.ordinal() as f64;
    let hour_utc = timestamp.hour() as f64
        + timestamp.minute() as f64 / 60.0
        + timestamp.second() as f64 / 3600.0;

    // Declination swings between -23.45 (winter) and +23.45 (summer solstice).
    let declination_rad = (23.45 * (2.0 * PI * (284.0 + day_of_year) / 365.0).sin()).to_radians();

    // Equation of time corrects for the elliptical orbit.
    let b = 2.0 * PI * (day_of_year - 81.0) / 365.0;
    let eot_minutes = 9.87 * (2.0 * b).sin() - 7.53 * b.cos() - 1.5 * b.sin();

    // Solar time in minutes; 4 minutes per degree of longitude from the
    // reference meridian (UTC).
    let solar_time = hour_utc * 60.0 + 4.0 * longitude + eot_minutes;
    let hour_angle_deg = solar_time / 4.0 - 180.0;
    let hour_angle_rad = hour_angle_deg.to_radians();

    let lat_rad = latitude.to_radians();

    let sin_altitude = lat_rad.sin() * declination_rad.sin()
        + lat_rad.cos() * declination_rad.cos() * hour_angle_rad.cos();
    let altitude_rad = sin_altitude.clamp(-1.0, 1.0).asin();
    let altitude_deg = altitude_rad.to_degrees();

    let cos_azimuth = (declination_rad.sin() - lat_rad.sin() * altitude_rad.sin())
        / (lat_rad.cos() * altitude_rad.cos() + 1e-10);
    let cos_azimuth = cos_azimuth.clamp(-1.0, 1.0);
    let azimuth_deg = if hour_angle_deg < 0.0 {
        cos_azimuth.acos().to_degrees()
    } else {
        360.0 - cos_azimuth.acos().to_degrees()
    };

    SolarPosition {
        altitude_deg: altitude_deg.max(0.0),
        azimuth_deg,
        is_daylight: altitude_deg > 0.0,
    }
}

/// Day length in hours for a day of year and latitude. Polar day and night
/// saturate at 24 and 0.
pub fn day_length_hours(day_of_year: u32, latitude: f64) -> f64 {
    let declination_rad =
        (23.45 * (2.0 * PI * (284.0 + day_of_year as f64) / 365.0).sin()).to_radians();
    let lat_rad = latitude.to_radians();

    let cos_hour_angle = -lat_rad.tan() * declination_rad.tan();
    if cos_hour_angle < -1.0 {
        return 24.0;
    }
    if cos_hour_angle > 1.0 {
        return 0.0;
    }
    2.0 * cos_hour_angle.acos().to_degrees() / 15.0
}

/// Clear-sky Global Horizontal Irradiance in W/m².
///
/// `max_ghi * sin(altitude) * 0.7^(AM^0.678)` with the air mass
/// approximated by `1/sin(altitude)`, floored near the horizon.
pub fn clear_sky_ghi(altitude_deg: f64, max_ghi_w_m2: f64) -> f64 {
    if altitude_deg <= 0.0 {
        return 0.0;
    }
    let sin_altitude = altitude_deg.to_radians().sin();
    let air_mass = 1.0 / sin_altitude.max(MIN_SIN_ALTITUDE);
    let transmission = 0.7_f64.powf(air_mass.powf(0.678));
    (max_ghi_w_m2 * sin_altitude * transmission).max(0.0)
}

/// Attenuate clear-sky GHI for cloud cover.
///
/// The multiplier runs from 1.0 (clear) to 0.5 (overcast) with a small
/// uniform micro-variability term, clamped to `[0.3, 1.0]`.
pub fn apply_cloud_factor(
    clear_sky_ghi: f64,
    cloud_cover_pct: f64,
    rng: Option<&mut RandomStream>,
) -> f64 {
    if clear_sky_ghi <= 0.0 {
        return 0.0;
    }
    let mut factor = 1.0 - 0.5 * (cloud_cover_pct / 100.0);
    if let Some(rng) = rng {
        factor = (factor + rng.uniform(-0.05, 0.05)).clamp(0.3, 1.0);
    }
    clear_sky_ghi * factor
}

/// Split GHI into direct and diffuse components.
///
/// Clearness index is approximated from cloud cover and fed through the
/// Erbs piecewise diffuse-fraction polynomial.
pub fn split_irradiance(
    ghi_w_m2: f64,
    altitude_deg: f64,
    cloud_cover_pct: f64,
) -> IrradianceComponents {
    if ghi_w_m2 <= 0.0 || altitude_deg <= 0.0 {
        return IrradianceComponents::default();
    }

    let kt = 1.0 - 0.7 * (cloud_cover_pct / 100.0);
    let diffuse_fraction = if kt <= 0.22 {
        1.0 - 0.09 * kt
    } else if kt <= 0.80 {
        0.9511 - 0.1604 * kt + 4.388 * kt.powi(2) - 16.638 * kt.powi(3) + 12.336 * kt.powi(4)
    } else {
        0.165
    };

    let dhi = ghi_w_m2 * diffuse_fraction;
    let direct_horizontal = ghi_w_m2 - dhi;
    let sin_altitude = altitude_deg.to_radians().sin();
    let dni = direct_horizontal / sin_altitude.max(MIN_SIN_ALTITUDE);

    IrradianceComponents {
        ghi_w_m2: ghi_w_m2.max(0.0),
        dni_w_m2: dni.clamp(0.0, MAX_DNI_W_M2),
        dhi_w_m2: dhi.max(0.0),
    }
}

/// Full irradiance pipeline: position, clear sky, clouds, Erbs split.
pub fn full_irradiance(
    timestamp: DateTime<Utc>,
    latitude: f64,
    longitude: f64,
    cloud_cover_pct: f64,
    max_ghi_w_m2: f64,
    rng: Option<&mut RandomStream>,
) -> IrradianceComponents {
    let position = solar_position(timestamp, latitude, longitude);
    if !position.is_daylight {
        return IrradianceComponents::default();
    }

    let clear = clear_sky_ghi(position.altitude_deg, max_ghi_w_m2);
    let actual = apply_cloud_factor(clear, cloud_cover_pct, rng);
    split_irradiance(actual, position.altitude_deg, cloud_cover_pct)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BERLIN_LAT: f64 = 52.52;
    const BERLIN_LON: f64 = 13.405;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_summer_noon_position() {
        // Berlin near solar noon on the solstice: sun high and southerly.
        let pos = solar_position(ts("2024-06-21T11:00:00Z"), BERLIN_LAT, BERLIN_LON);
        assert!(pos.is_daylight);
        assert!(pos.altitude_deg > 55.0 && pos.altitude_deg < 65.0);
        assert!(pos.azimuth_deg > 150.0 && pos.azimuth_deg < 210.0);
    }

    #[test]
    fn test_winter_night_below_horizon() {
        let pos = solar_position(ts("2024-12-21T02:00:00Z"), BERLIN_LAT, BERLIN_LON);
        assert!(!pos.is_daylight);
        assert_eq!(pos.altitude_deg, 0.0);
    }

    #[test]
    fn test_clear_sky_ghi_values() {
        assert_eq!(clear_sky_ghi(0.0, 1000.0), 0.0);
        assert_eq!(clear_sky_ghi(-10.0, 1000.0), 0.0);

        // Reference value for the attenuation model at 60 degrees altitude.
        let ghi = clear_sky_ghi(60.0, 1000.0);
        assert!((ghi - 581.0).abs() < 5.0, "got {ghi}");

        // Higher sun, more irradiance.
        assert!(clear_sky_ghi(90.0, 1000.0) > clear_sky_ghi(30.0, 1000.0));
    }

    #[test]
    fn test_seasonal_irradiance_contrast() {
        let summer = solar_position(ts("2024-06-21T11:00:00Z"), BERLIN_LAT, BERLIN_LON);
        let winter = solar_position(ts("2024-12-21T11:00:00Z"), BERLIN_LAT, BERLIN_LON);

        let summer_ghi = clear_sky_ghi(summer.altitude_deg, 1000.0);
        let winter_ghi = clear_sky_ghi(winter.altitude_deg, 1000.0);
        assert!(winter_ghi > 0.0);
        assert!(summer_ghi > winter_ghi * 3.0);
    }

    #[test]
    fn test_cloud_factor_range() {
        // Without a noise stream the attenuation is exact.
        assert_eq!(apply_cloud_factor(800.0, 0.0, None), 800.0);
        assert_eq!(apply_cloud_factor(800.0, 100.0, None), 400.0);
        assert_eq!(apply_cloud_factor(0.0, 50.0, None), 0.0);
    }

    #[test]
    fn test_split_preserves_ghi() {
        let components = split_irradiance(600.0, 45.0, 30.0);
        assert_eq!(components.ghi_w_m2, 600.0);
        assert!(components.dhi_w_m2 > 0.0);
        assert!(components.dni_w_m2 > 0.0);
        assert!(components.dni_w_m2 <= MAX_DNI_W_M2);

        // Direct horizontal + diffuse reconstruct GHI.
        let sin_alt = 45.0_f64.to_radians().sin();
        let reconstructed = components.dni_w_m2 * sin_alt + components.dhi_w_m2;
        assert!((reconstructed - 600.0).abs() < 1.0);
    }

    #[test]
    fn test_overcast_is_mostly_diffuse() {
        let overcast = split_irradiance(300.0, 40.0, 100.0);
        assert!(overcast.dhi_w_m2 / overcast.ghi_w_m2 > 0.8);

        let clear = split_irradiance(700.0, 40.0, 0.0);
        assert!(clear.dhi_w_m2 / clear.ghi_w_m2 < 0.3);
    }

    #[test]
    fn test_night_is_dark() {
        let components = full_irradiance(
            ts("2024-12-21T02:00:00Z"),
            BERLIN_LAT,
            BERLIN_LON,
            20.0,
            1000.0,
            None,
        );
        assert_eq!(components.ghi_w_m2, 0.0);
        assert_eq!(components.dni_w_m2, 0.0);
        assert_eq!(components.dhi_w_m2, 0.0);
    }

    #[test]
    fn test_day_length_extremes() {
        // Equator stays close to 12 h year round.
        assert!((day_length_hours(172, 0.0) - 12.0).abs() < 0.3);
        // North pole: polar day in June, polar night in December.
        assert_eq!(day_length_hours(172, 89.9), 24.0);
        assert_eq!(day_length_hours(355, 89.9), 0.0);
        // Berlin midsummer is long.
        let berlin_summer = day_length_hours(172, BERLIN_LAT);
        assert!(berlin_summer > 16.0 && berlin_summer < 17.5);
    }
}
