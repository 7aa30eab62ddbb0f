use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
pub const FEET_PER_METER: f64 = 3.28084;
pub const DEFAULT_RADIUS_FEET: f64 = 300.0;
pub const DEFAULT_EARLY_CLOCK_IN_MINUTES: i64 = 60;

/// A WGS84 point. `(0.0, 0.0)` is the legacy "no location yet" sentinel
/// and is rejected everywhere a real device/site position is required.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinate {
    #[schema(example = 40.7128)]
    pub latitude: f64,
    #[schema(example = -74.0060)]
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_unset(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    pub fn is_valid(&self) -> bool {
        !self.is_unset()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

#[derive(Debug, Error)]
pub enum GeofenceError {
    #[error("invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("invalid shift time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("invalid shift date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// Distance and inclusion verdict for one device-vs-site evaluation.
/// Recomputed on every check, never stored.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GeofenceResult {
    pub is_within_radius: bool,
    #[schema(example = 182.35)]
    pub distance_feet: f64,
    #[schema(example = 55.58)]
    pub distance_meters: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClockInWindow {
    pub can_clock_in: bool,
    #[schema(example = "You can clock in now")]
    pub message: String,
    #[schema(example = 15, nullable = true)]
    pub minutes_until_allowed: Option<i64>,
}

/// Great-circle distance between two points in meters (Haversine).
/// Pure math; the caller guarantees valid coordinates.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// How far is `current` from `target`, and is it inside `radius_feet`?
///
/// The inclusion test runs in meters against the once-converted radius so
/// the reported rounded distances never flip the verdict. The boundary is
/// inclusive: exactly at the radius counts as inside.
pub fn check_geofence(
    current: Coordinate,
    target: Coordinate,
    radius_feet: f64,
) -> Result<GeofenceResult, GeofenceError> {
    for point in [current, target] {
        if !point.is_valid() {
            return Err(GeofenceError::InvalidCoordinate {
                latitude: point.latitude,
                longitude: point.longitude,
            });
        }
    }

    let meters = distance_meters(current, target);
    let radius_meters = radius_feet / FEET_PER_METER;

    Ok(GeofenceResult {
        is_within_radius: meters <= radius_meters,
        distance_feet: round2(meters * FEET_PER_METER),
        distance_meters: round2(meters),
    })
}

/// Is "now" inside the allowed early clock-in window for a shift?
///
/// Strings are validated up front; malformed input is an error, never a
/// silently wrong verdict. Once the window opens there is no upper cutoff:
/// clock-in stays allowed for the rest of the day.
pub fn check_clock_in_time_window(
    shift_start_time: &str,
    shift_date: &str,
    early_minutes: i64,
) -> Result<ClockInWindow, GeofenceError> {
    let time = NaiveTime::parse_from_str(shift_start_time, "%H:%M")
        .map_err(|_| GeofenceError::InvalidTime(shift_start_time.to_string()))?;
    let date = NaiveDate::parse_from_str(shift_date, "%Y-%m-%d")
        .map_err(|_| GeofenceError::InvalidDate(shift_date.to_string()))?;

    Ok(clock_in_window_at(
        date.and_time(time),
        early_minutes,
        Local::now().naive_local(),
    ))
}

/// Pure form of the window check with an injectable clock.
pub fn clock_in_window_at(
    shift_start: NaiveDateTime,
    early_minutes: i64,
    now: NaiveDateTime,
) -> ClockInWindow {
    let earliest_allowed = shift_start - Duration::minutes(early_minutes);

    if now < earliest_allowed {
        let wait_seconds = (earliest_allowed - now).num_seconds();
        // round up: a partial minute still blocks clock-in
        let minutes = (wait_seconds + 59) / 60;

        return ClockInWindow {
            can_clock_in: false,
            message: format!(
                "Clock-in opens {} minutes before the shift. Try again in {} minute(s).",
                early_minutes, minutes
            ),
            minutes_until_allowed: Some(minutes),
        };
    }

    ClockInWindow {
        can_clock_in: true,
        message: "You can clock in now".to_string(),
        minutes_until_allowed: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon)
    }

    // exact per-degree arc of latitude on the 6371 km sphere
    const ONE_LAT_DEGREE_METERS: f64 = EARTH_RADIUS_METERS * std::f64::consts::PI / 180.0;

    #[test]
    fn distance_to_self_is_zero() {
        let c = coord(40.7128, -74.0060);
        assert_eq!(distance_meters(c, c), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = coord(40.7128, -74.0060);
        let b = coord(40.7138, -74.0010);
        let forward = distance_meters(a, b);
        let back = distance_meters(b, a);
        assert!((forward - back).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude_matches_sphere() {
        let d = distance_meters(coord(0.0, 10.0), coord(1.0, 10.0));
        assert!((d - ONE_LAT_DEGREE_METERS).abs() < 10.0);
    }

    /// Offsets `base` north by roughly `feet`.
    fn offset_north_feet(base: Coordinate, feet: f64) -> Coordinate {
        let meters = feet / FEET_PER_METER;
        coord(base.latitude + meters / ONE_LAT_DEGREE_METERS, base.longitude)
    }

    #[test]
    fn geofence_boundary_is_inclusive() {
        let site = coord(40.7128, -74.0060);

        // a float-exact tie is unreachable through the trig, so probe a
        // hair inside and a hair outside the 300 ft boundary
        let just_inside = offset_north_feet(site, 299.99);
        let result = check_geofence(just_inside, site, 300.0).unwrap();
        assert!(result.is_within_radius, "inside the radius counts as inside");

        let just_outside = offset_north_feet(site, 300.01);
        let result = check_geofence(just_outside, site, 300.0).unwrap();
        assert!(!result.is_within_radius);
    }

    #[test]
    fn geofence_reports_both_units_rounded() {
        let site = coord(40.7128, -74.0060);
        let device = offset_north_feet(site, 150.0);
        let result = check_geofence(device, site, 300.0).unwrap();

        assert!(result.is_within_radius);
        assert!((result.distance_feet - 150.0).abs() < 1.0);
        assert!((result.distance_meters - 150.0 / FEET_PER_METER).abs() < 1.0);
        // rounded to 2 decimals
        assert_eq!(result.distance_feet, round2(result.distance_feet));
        assert_eq!(result.distance_meters, round2(result.distance_meters));
    }

    #[test]
    fn geofence_rejects_unset_sentinel() {
        let site = coord(40.7128, -74.0060);
        let err = check_geofence(coord(0.0, 0.0), site, 300.0).unwrap_err();
        assert!(matches!(err, GeofenceError::InvalidCoordinate { .. }));
    }

    #[test]
    fn geofence_rejects_out_of_range_latitude() {
        let site = coord(40.7128, -74.0060);
        let err = check_geofence(site, coord(91.0, 10.0), 300.0).unwrap_err();
        assert!(matches!(err, GeofenceError::InvalidCoordinate { .. }));
    }

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_time(NaiveTime::parse_from_str(time, "%H:%M").unwrap())
    }

    #[test]
    fn window_opens_exactly_early_minutes_before_shift() {
        let shift_start = at("2024-03-05", "09:00");

        let open = clock_in_window_at(shift_start, 60, at("2024-03-05", "08:00"));
        assert!(open.can_clock_in);
        assert_eq!(open.minutes_until_allowed, None);

        let closed = clock_in_window_at(shift_start, 60, at("2024-03-05", "07:59"));
        assert!(!closed.can_clock_in);
        assert_eq!(closed.minutes_until_allowed, Some(1));
    }

    #[test]
    fn window_rounds_partial_minutes_up() {
        let shift_start = at("2024-03-05", "09:00");
        let now = at("2024-03-05", "07:30") + Duration::seconds(30);

        let window = clock_in_window_at(shift_start, 60, now);
        assert!(!window.can_clock_in);
        assert_eq!(window.minutes_until_allowed, Some(30));
    }

    #[test]
    fn window_has_no_late_cutoff() {
        let shift_start = at("2024-03-05", "09:00");
        let late = clock_in_window_at(shift_start, 60, at("2024-03-05", "23:30"));
        assert!(late.can_clock_in);
    }

    #[test]
    fn malformed_strings_fail_explicitly() {
        assert!(matches!(
            check_clock_in_time_window("9 o'clock", "2024-03-05", 60),
            Err(GeofenceError::InvalidTime(_))
        ));
        assert!(matches!(
            check_clock_in_time_window("09:00", "03/05/2024", 60),
            Err(GeofenceError::InvalidDate(_))
        ));
    }
}
