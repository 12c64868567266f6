//! Solar geometry and thermodynamic helpers.

use crate::error::{DateContext, Result};
use roadcast_core::constants::{
    ASTRONOMICAL_UNIT, CLOUDS_DAY, CLOUDS_NIGHT_COEFF1, CLOUDS_NIGHT_COEFF2,
    DIFFUSE_SOLAR_CONSTANT, EARTH_MEAN_RADIUS, EPS1, EPS2, SOLAR_CONSTANT, TCDK, TRPL,
};
use roadcast_utils::dates;
use std::f64::consts::PI;

/// `|a|` with the sign of `b`.
fn sign(a: f64, b: f64) -> f64 {
    if b >= 0.0 {
        a.abs()
    } else {
        -a.abs()
    }
}

/// Saturation vapour pressure (Pa) over water or ice at `t` kelvins.
pub fn saturation_vapour_pressure(t: f64) -> f64 {
    let d = t - TRPL;
    610.78
        * (sign(17.269, d).min(sign(21.875, d)) * d.abs() / (t - 35.86 + sign(28.2, -d).max(0.0)))
            .exp()
}

/// Saturation specific humidity (kg/kg) at `td` kelvins and `po` pascals.
pub fn saturation_humidity(td: f64, po: f64) -> f64 {
    EPS1 / ((po / saturation_vapour_pressure(td)).max(1.0) - EPS2)
}

/// Absolute humidity from the dew point (°C) and the pressure (Pa).
pub fn absolute_humidity(dew_point: f64, pressure: f64) -> f64 {
    saturation_humidity(dew_point + TCDK, pressure)
}

/// Eccentricity correction of the solar constant for the orbit angle `a`.
pub fn eccentricity_factor(a: f64) -> f64 {
    let d = 1.0 - 9.464e-4 * a.sin() - 0.01671 * a.cos() - 1.489e-4 * (2.0 * a).cos()
        - 2.917e-5 * (3.0 * a).sin()
        - 3.438e-4 * (4.0 * a).cos();
    1.0 / (d * d)
}

/// Sun position terms for one instant and latitude.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct SolarTerms {
    /// Equation of time, radians
    pub eot: f64,
    /// Top of atmosphere radiation, W/m²
    pub radiation: f64,
    /// sin(lat) sin(declination)
    pub d1: f64,
    /// cos(lat) cos(declination)
    pub d2: f64,
}

impl SolarTerms {
    /// `time` in epoch seconds, `latitude` in degrees.
    pub fn at(time: f64, latitude: f64) -> Result<SolarTerms> {
        let hour = dates::hour_of(time).date()? as f64;
        let minute = dates::minute_of(time).date()? as f64;
        let day = dates::day_of_year(time).date()? as f64;
        let days_in_year = if dates::is_leap_year(time).date()? {
            366.0
        } else {
            365.0
        };
        let julian = day + (hour + minute / 60.0) / 24.0;
        let a = julian / days_in_year * 2.0 * PI;
        let declination = 0.412 * ((julian + 10.0) * 2.0 * PI / days_in_year - PI).cos();
        let lat = latitude.to_radians();
        let eot = 0.002733 - 7.343 * a.sin() + 0.5519 * a.cos() - 9.47 * (2.0 * a).sin()
            - 3.02 * (2.0 * a).cos()
            - 0.3289 * (3.0 * a).sin()
            - 0.07581 * (3.0 * a).cos()
            - 0.1935 * (4.0 * a).sin()
            - 0.1245 * (4.0 * a).cos();
        Ok(SolarTerms {
            eot: eot / 60.0 * 15.0 * PI / 180.0,
            radiation: eccentricity_factor(a) * SOLAR_CONSTANT,
            d1: lat.sin() * declination.sin(),
            d2: lat.cos() * declination.cos(),
        })
    }

    /// Hour angle at the given UTC hour and longitude (degrees).
    pub fn hour_angle(&self, hour: f64, longitude: f64) -> f64 {
        PI * (hour / 12.0 + longitude / 180.0 - 1.0) + self.eot
    }

    pub fn cos_zenith(&self, hour: f64, longitude: f64) -> f64 {
        self.d1 + self.d2 * self.hour_angle(hour, longitude).cos()
    }

    /// Sunrise and sunset in UTC decimal hours, `None` when the sun does
    /// not cross the horizon that day.
    pub fn sunrise_sunset(&self, longitude: f64) -> Option<(f64, f64)> {
        if self.d2 == 0.0 {
            return None;
        }
        let cos_angle = -self.d1 / self.d2;
        if !(-1.0..=1.0).contains(&cos_angle) {
            return None;
        }
        let angle = cos_angle.acos();
        let hour = |dh: f64| (12.0 * ((dh - self.eot) / PI + 1.0 - longitude / 180.0)).rem_euclid(24.0);
        Some((hour(-angle), hour(angle)))
    }
}

/// Whether `hour` lies outside `[sunrise, sunset]`, across midnight if needed.
pub fn in_the_dark(hour: f64, sunrise: f64, sunset: f64) -> bool {
    let rise = sunrise % 24.0;
    let set = sunset % 24.0;
    if set > rise {
        hour < sunrise || hour > sunset
    } else {
        hour > set && hour < rise
    }
}

fn octal_index(octal: f64) -> Option<usize> {
    if (0.0..=8.0).contains(&octal) && octal.fract() == 0.0 {
        Some(octal as usize)
    } else {
        None
    }
}

/// Daytime attenuation for a cloud octal, 1.0 when unknown.
pub fn cloud_day_factor(octal: f64) -> f64 {
    octal_index(octal).map_or(1.0, |i| CLOUDS_DAY[i])
}

/// Slope and intercept of the infrared flux for a cloud octal.
pub fn cloud_coefficients(octal: f64) -> (f64, f64) {
    let i = octal_index(octal).unwrap_or(8);
    (CLOUDS_NIGHT_COEFF1[i], CLOUDS_NIGHT_COEFF2[i])
}

/// Atmospheric transmission of clear-sky radiation `sft` (W/m²).
pub fn transmission(sft: f64) -> f64 {
    let c = -1.56e-12 * sft.powi(4) + 5.972e-9 * sft.powi(3) - 8.364e-6 * sft.powi(2)
        + 5.183e-3 * sft
        - 0.435;
    c.max(0.0)
}

/// Incoming solar flux (W/m²) at hourly forecast times.
pub fn solar_flux(
    clouds: &[f64],
    forecast_time: &[f64],
    daylight: Option<(f64, f64)>,
    latitude: f64,
    longitude: f64,
) -> Result<Vec<f64>> {
    forecast_time
        .iter()
        .zip(clouds)
        .map(|(&time, &octal)| {
            let hour = dates::hour_of(time).date()? as f64;
            let terms = SolarTerms::at(time, latitude)?;
            let dark = daylight.is_some_and(|(rise, set)| in_the_dark(hour, rise, set));
            let sft = if dark {
                0.0
            } else {
                terms.cos_zenith(hour, longitude).max(0.0) * terms.radiation
            };
            Ok(sft * transmission(sft) * cloud_day_factor(octal))
        })
        .collect()
}

/// Incoming infrared flux (W/m²) from the cloud octal and air temperature.
pub fn infrared_flux(clouds: &[f64], air_temperature: &[f64]) -> Vec<f64> {
    clouds
        .iter()
        .zip(air_temperature)
        .map(|(&octal, &at)| {
            let (slope, intercept) = cloud_coefficients(octal);
            slope * at + intercept
        })
        .collect()
}

/// Apparent sun position at `time` (epoch seconds) seen from `latitude`,
/// `longitude`, as `(azimuth, elevation)` in degrees. Azimuth is clockwise
/// from north in `[0, 360)`.
///
/// Blanco-Muriel et al. (2001), "Computing the solar vector", accurate to
/// about half an arc minute between 1999 and 2015.
pub fn sun_position(time: f64, latitude: f64, longitude: f64) -> (f64, f64) {
    let elapsed = dates::julian_date(time) - 2_451_545.0;
    let hours = time.rem_euclid(86_400.0) / 3600.0;

    // ecliptic coordinates
    let omega = 2.1429 - 0.0010394594 * elapsed;
    let mean_longitude = 4.8950630 + 0.017202791698 * elapsed;
    let mean_anomaly = 6.2400600 + 0.0172019699 * elapsed;
    let ecliptic_longitude = mean_longitude
        + 0.03341607 * mean_anomaly.sin()
        + 0.00034894 * (2.0 * mean_anomaly).sin()
        - 0.0001134
        - 0.0000203 * omega.sin();
    let obliquity = 0.4090928 - 6.2140e-9 * elapsed + 0.0000396 * omega.cos();

    // celestial coordinates
    let sin_longitude = ecliptic_longitude.sin();
    let right_ascension = (obliquity.cos() * sin_longitude)
        .atan2(ecliptic_longitude.cos())
        .rem_euclid(2.0 * PI);
    let declination = (obliquity.sin() * sin_longitude).asin();

    // local coordinates
    let sidereal = 6.6974243242 + 0.0657098283 * elapsed + hours;
    let hour_angle = (sidereal * 15.0 + longitude).to_radians() - right_ascension;
    let lat = latitude.to_radians();
    let zenith = (lat.cos() * hour_angle.cos() * declination.cos() + declination.sin() * lat.sin())
        .clamp(-1.0, 1.0)
        .acos();
    let azimuth = (-hour_angle.sin())
        .atan2(declination.tan() * lat.cos() - lat.sin() * hour_angle.cos())
        .rem_euclid(2.0 * PI);
    let parallax = EARTH_MEAN_RADIUS / ASTRONOMICAL_UNIT * zenith.sin();

    (azimuth.to_degrees(), 90.0 - (zenith + parallax).to_degrees())
}

/// Part of the global radiation that is diffuse for the clearness index
/// `kt` (Orgill and Hollands, 1977).
pub fn diffuse_fraction(kt: f64) -> f64 {
    if kt < 0.35 {
        1.0 - 0.249 * kt
    } else if kt > 0.75 {
        0.177
    } else {
        1.577 - 1.84 * kt
    }
}

/// Diffuse part of the `global` solar flux with the sun `elevation` degrees
/// above the horizontal. All of it is diffuse once the sun is below.
pub fn diffuse_component(global: f64, elevation: f64) -> f64 {
    if elevation <= 0.0 {
        return global;
    }
    let extraterrestrial = DIFFUSE_SOLAR_CONSTANT * elevation.to_radians().sin();
    global * diffuse_fraction(global / extraterrestrial)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturation_pressure_at_triple_point() {
        assert!((saturation_vapour_pressure(TRPL) - 610.78).abs() < 1e-9);
        // warmer air holds more water
        assert!(
            saturation_vapour_pressure(TRPL + 20.0) > saturation_vapour_pressure(TRPL + 10.0)
        );
    }

    #[test]
    fn test_absolute_humidity() {
        let q = absolute_humidity(0.0, 101325.0);
        assert!(q > 0.003 && q < 0.004, "{}", q);
        assert!(absolute_humidity(10.0, 101325.0) > q);
    }

    #[test]
    fn test_eccentricity_near_unity() {
        for a in [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0] {
            let s = eccentricity_factor(a);
            assert!(s > 0.96 && s < 1.04, "{}", s);
        }
    }

    #[test]
    fn test_in_the_dark() {
        assert!(in_the_dark(3.0, 12.0, 22.0));
        assert!(!in_the_dark(15.0, 12.0, 22.0));
        // daylight across midnight UTC
        assert!(!in_the_dark(23.0, 12.0, 2.0));
        assert!(in_the_dark(5.0, 12.0, 2.0));
    }

    #[test]
    fn test_sunrise_before_sunset_in_winter() {
        let time = dates::parse_iso8601("2004-01-30T12:00Z").unwrap();
        let terms = SolarTerms::at(time, 45.5).unwrap();
        let (rise, set) = terms.sunrise_sunset(-73.6).unwrap();
        // about 7h20 and 17h05 local, i.e. 12h20 and 22h05 UTC
        assert!(rise > 11.5 && rise < 13.0, "{}", rise);
        assert!(set > 21.5 && set < 23.0, "{}", set);
        assert!(terms.cos_zenith(17.0, -73.6) > 0.3);
    }

    #[test]
    fn test_solar_flux_zero_at_night() {
        let start = dates::parse_iso8601("2004-01-30T00:00Z").unwrap();
        let times: Vec<f64> = (0..24).map(|h| start + 3600.0 * h as f64).collect();
        let clouds = vec![0.0; 24];
        let terms = SolarTerms::at(start + 12.0 * 3600.0, 45.5).unwrap();
        let daylight = terms.sunrise_sunset(-73.6);
        let sf = solar_flux(&clouds, &times, daylight, 45.5, -73.6).unwrap();
        assert_eq!(sf[5], 0.0);
        assert!(sf[17] > 200.0, "{}", sf[17]);
        assert!(sf.iter().all(|v| *v >= 0.0));

        let overcast = solar_flux(&[8.0], &times[17..18], daylight, 45.5, -73.6).unwrap();
        assert!(overcast[0] < sf[17]);
    }

    #[test]
    fn test_infrared_flux() {
        let ir = infrared_flux(&[0.0, 8.0], &[0.0, 10.0]);
        assert_eq!(ir[0], 214.7);
        assert!((ir[1] - (45.1 + 298.4)).abs() < 1e-9);
    }

    #[test]
    fn test_sun_position_summer_noon() {
        // solar noon at Montreal near the solstice
        let time = dates::parse_iso8601("2004-06-21T17:00Z").unwrap();
        let (azimuth, elevation) = sun_position(time, 45.5, -73.6);
        assert!(elevation > 66.0 && elevation < 69.0, "{}", elevation);
        assert!(azimuth > 170.0 && azimuth < 190.0, "{}", azimuth);
    }

    #[test]
    fn test_sun_position_night() {
        let time = dates::parse_iso8601("2004-01-30T05:00Z").unwrap();
        let (azimuth, elevation) = sun_position(time, 45.5, -73.6);
        assert!(elevation < 0.0);
        assert!((0.0..360.0).contains(&azimuth));
    }

    #[test]
    fn test_diffuse_component() {
        assert!((diffuse_fraction(0.2) - (1.0 - 0.249 * 0.2)).abs() < 1e-12);
        assert!((diffuse_fraction(0.5) - (1.577 - 0.92)).abs() < 1e-12);
        assert_eq!(diffuse_fraction(0.9), 0.177);
        assert_eq!(diffuse_component(120.0, -3.0), 120.0);
        // overcast sky, low clearness index
        let diffuse = diffuse_component(100.0, 30.0);
        assert!((diffuse - 100.0 * (1.0 - 0.249 * 100.0 / 683.0)).abs() < 1e-6);
        assert!(diffuse_component(900.0, 60.0) < 200.0);
    }
}
