// WGS-84 <-> GCJ-02 point conversion.
//
// GCJ-02 is the offset datum required for published maps of mainland China.
// Outside the China bounding box no offset is applied in either direction.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::bounds::CHINA;
use crate::error::GeoJsonError;

/// Semi-major axis of the Krasovsky 1940 ellipsoid used by GCJ-02 (meters).
pub const A: f64 = 6378245.0;
/// Eccentricity squared of the same ellipsoid.
pub const EE: f64 = 0.00669342162296594323;

/// Convergence threshold of the iterative inverse, in degrees.
pub const PRECISE_THRESHOLD: f64 = 1e-10;
/// Upper bound on refinement steps of the iterative inverse.
pub const PRECISE_MAX_ITERATIONS: usize = 30;

/// Check if a coordinate falls inside the region where GCJ-02 applies
pub fn is_in_china(lng: f64, lat: f64) -> bool {
    CHINA.contains(lng, lat)
}

// Latitude offset in meters-equivalent units, evaluated relative to (105E, 35N).
// Term grouping must stay as is; reordering changes the last bits of the result.
pub fn transform_lat(lng: f64, lat: f64) -> f64 {
    let mut ret = -100.0 + 2.0 * lng + 3.0 * lat + 0.2 * lat * lat
        + 0.1 * lng * lat + 0.2 * lng.abs().sqrt();
    ret += (20.0 * (6.0 * lng * PI).sin() + 20.0 * (2.0 * lng * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (lat * PI).sin() + 40.0 * (lat / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (160.0 * (lat / 12.0 * PI).sin() + 320.0 * (lat * PI / 30.0).sin()) * 2.0 / 3.0;
    ret
}

// Longitude counterpart of `transform_lat`.
pub fn transform_lng(lng: f64, lat: f64) -> f64 {
    let mut ret = 300.0 + lng + 2.0 * lat + 0.1 * lng * lng
        + 0.1 * lng * lat + 0.1 * lng.abs().sqrt();
    ret += (20.0 * (6.0 * lng * PI).sin() + 20.0 * (2.0 * lng * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (lng * PI).sin() + 40.0 * (lng / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (150.0 * (lng / 12.0 * PI).sin() + 300.0 * (lng / 30.0 * PI).sin()) * 2.0 / 3.0;
    ret
}

/// Forward GCJ-02 offset at a point, in degrees, as `(d_lng, d_lat)`.
///
/// The raw offsets are scaled by the meridian and prime-vertical radii of
/// curvature at `lat`.
fn offset(lng: f64, lat: f64) -> (f64, f64) {
    let mut d_lat = transform_lat(lng - 105.0, lat - 35.0);
    let mut d_lng = transform_lng(lng - 105.0, lat - 35.0);
    let rad_lat = lat / 180.0 * PI;
    let mut magic = rad_lat.sin();
    magic = 1.0 - EE * magic * magic;
    let sqrt_magic = magic.sqrt();
    d_lat = (d_lat * 180.0) / ((A * (1.0 - EE)) / (magic * sqrt_magic) * PI);
    d_lng = (d_lng * 180.0) / (A / sqrt_magic * rad_lat.cos() * PI);
    (d_lng, d_lat)
}

/// Convert a WGS-84 coordinate to GCJ-02.
///
/// Coordinates outside China are returned unchanged.
pub fn wgs84_to_gcj02(lng: f64, lat: f64) -> (f64, f64) {
    if !is_in_china(lng, lat) {
        return (lng, lat);
    }

    let (d_lng, d_lat) = offset(lng, lat);
    let mg_lat = lat + d_lat;
    let mg_lng = lng + d_lng;
    (mg_lng, mg_lat)
}

/// Convert a GCJ-02 coordinate back to WGS-84.
///
/// This is a single-step approximation: the offset is evaluated at the GCJ-02
/// point itself and subtracted. The residual error is typically one to two
/// meters. Use [`gcj02_to_wgs84_precise`] when that is not good enough.
pub fn gcj02_to_wgs84(lng: f64, lat: f64) -> (f64, f64) {
    if !is_in_china(lng, lat) {
        return (lng, lat);
    }

    let (d_lng, d_lat) = offset(lng, lat);
    let mg_lat = lat + d_lat;
    let mg_lng = lng + d_lng;
    (lng * 2.0 - mg_lng, lat * 2.0 - mg_lat)
}

/// Iteratively inverted GCJ-02 -> WGS-84 conversion.
///
/// Starts from [`gcj02_to_wgs84`] and corrects the guess by the residual of the
/// forward transform until it drops below [`PRECISE_THRESHOLD`].
pub fn gcj02_to_wgs84_precise(lng: f64, lat: f64) -> (f64, f64) {
    if !is_in_china(lng, lat) {
        return (lng, lat);
    }

    let (mut guess_lng, mut guess_lat) = gcj02_to_wgs84(lng, lat);
    for _ in 0..PRECISE_MAX_ITERATIONS {
        let (fwd_lng, fwd_lat) = wgs84_to_gcj02(guess_lng, guess_lat);
        let err_lng = fwd_lng - lng;
        let err_lat = fwd_lat - lat;
        if err_lng.abs() < PRECISE_THRESHOLD && err_lat.abs() < PRECISE_THRESHOLD {
            break;
        }
        guess_lng -= err_lng;
        guess_lat -= err_lat;
    }
    (guess_lng, guess_lat)
}

/// Direction of a datum conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Conversion {
    #[default]
    #[serde(alias = "wgs84_to_gcj02", alias = "toGcj02")]
    Wgs84ToGcj02,
    #[serde(alias = "gcj02_to_wgs84", alias = "toWgs84")]
    Gcj02ToWgs84,
    #[serde(alias = "gcj02_to_wgs84_precise")]
    Gcj02ToWgs84Precise,
}

impl Conversion {
    pub const ALL: [Conversion; 3] = [
        Conversion::Wgs84ToGcj02,
        Conversion::Gcj02ToWgs84,
        Conversion::Gcj02ToWgs84Precise,
    ];

    pub fn apply(self, lng: f64, lat: f64) -> (f64, f64) {
        match self {
            Conversion::Wgs84ToGcj02 => wgs84_to_gcj02(lng, lat),
            Conversion::Gcj02ToWgs84 => gcj02_to_wgs84(lng, lat),
            Conversion::Gcj02ToWgs84Precise => gcj02_to_wgs84_precise(lng, lat),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Conversion::Wgs84ToGcj02 => "wgs84ToGcj02",
            Conversion::Gcj02ToWgs84 => "gcj02ToWgs84",
            Conversion::Gcj02ToWgs84Precise => "gcj02ToWgs84Precise",
        }
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Conversion {
    type Err = GeoJsonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "wgs84ToGcj02" | "wgs84_to_gcj02" | "toGcj02" => Ok(Conversion::Wgs84ToGcj02),
            "gcj02ToWgs84" | "gcj02_to_wgs84" | "toWgs84" => Ok(Conversion::Gcj02ToWgs84),
            "gcj02ToWgs84Precise" | "gcj02_to_wgs84_precise" => {
                Ok(Conversion::Gcj02ToWgs84Precise)
            }
            other => Err(GeoJsonError::UnknownConversion(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference output of the published formula for (110.3167, 20.05)
    const GOLDEN_HAIKOU: (f64, f64) = (110.32103976635199, 20.047910544947097);
    // ~11 m at these latitudes, far above the observed 1-2 m residual
    const ROUND_TRIP_TOLERANCE: f64 = 1e-4;

    fn assert_close(a: (f64, f64), b: (f64, f64), eps: f64) {
        assert!((a.0 - b.0).abs() <= eps, "lng mismatch: {a:?} vs {b:?}");
        assert!((a.1 - b.1).abs() <= eps, "lat mismatch: {a:?} vs {b:?}");
    }

    #[test]
    fn china_box_is_inclusive() {
        assert!(is_in_china(72.004, 0.8293));
        assert!(is_in_china(137.8347, 55.8271));
        assert!(is_in_china(116.39, 39.9));
        assert!(!is_in_china(72.0039, 30.0));
        assert!(!is_in_china(100.0, 55.8272));
        assert!(!is_in_china(-0.1276, 51.5072));
    }

    #[test]
    fn outside_china_passes_through_exactly() {
        for &(lng, lat) in &[(-0.1276, 51.5072), (151.2093, -33.8688), (0.0, 0.0), (139.6917, 35.6895)] {
            assert_eq!(wgs84_to_gcj02(lng, lat), (lng, lat));
            assert_eq!(gcj02_to_wgs84(lng, lat), (lng, lat));
            assert_eq!(gcj02_to_wgs84_precise(lng, lat), (lng, lat));
        }
    }

    #[test]
    fn offset_polynomials_at_origin() {
        assert_eq!(transform_lat(0.0, 0.0), -100.0);
        assert_eq!(transform_lng(0.0, 0.0), 300.0);
    }

    #[test]
    fn offset_polynomials_match_reference() {
        assert!((transform_lat(5.3167, -14.95) - -231.31704030290845).abs() < 1e-9);
        assert!((transform_lng(5.3167, -14.95) - 454.0080000113277).abs() < 1e-9);
    }

    #[test]
    fn forward_matches_golden_value() {
        assert_close(wgs84_to_gcj02(110.3167, 20.05), GOLDEN_HAIKOU, 1e-9);
        assert_close(
            wgs84_to_gcj02(116.3912757, 39.906217),
            (116.39751670534572, 39.907618208506655),
            1e-9,
        );
    }

    #[test]
    fn inverse_recovers_within_tolerance() {
        for &(lng, lat) in &[(110.3167, 20.05), (116.3912757, 39.906217), (121.4737, 31.2304), (116.30, 39.99)] {
            let (g_lng, g_lat) = wgs84_to_gcj02(lng, lat);
            let back = gcj02_to_wgs84(g_lng, g_lat);
            assert_close(back, (lng, lat), ROUND_TRIP_TOLERANCE);
            // approximate, never exact
            assert_ne!(back, (lng, lat));
        }
    }

    #[test]
    fn precise_inverse_converges() {
        for &(lng, lat) in &[(110.3167, 20.05), (121.4737, 31.2304), (87.6168, 43.8256)] {
            let (g_lng, g_lat) = wgs84_to_gcj02(lng, lat);
            assert_close(gcj02_to_wgs84_precise(g_lng, g_lat), (lng, lat), 1e-9);
        }
    }

    #[test]
    fn forward_is_not_idempotent() {
        let once = wgs84_to_gcj02(110.3167, 20.05);
        let twice = wgs84_to_gcj02(once.0, once.1);
        assert_ne!(once, twice);
        assert_close(twice, (110.32538889961394, 20.045830948523154), 1e-9);
    }

    #[test]
    fn conversion_parses_and_applies() {
        assert_eq!("wgs84ToGcj02".parse::<Conversion>().unwrap(), Conversion::Wgs84ToGcj02);
        assert_eq!("toWgs84".parse::<Conversion>().unwrap(), Conversion::Gcj02ToWgs84);
        assert_eq!(
            "gcj02_to_wgs84_precise".parse::<Conversion>().unwrap(),
            Conversion::Gcj02ToWgs84Precise
        );
        assert!(matches!(
            "bd09ToGcj02".parse::<Conversion>(),
            Err(GeoJsonError::UnknownConversion(s)) if s == "bd09ToGcj02"
        ));

        assert_eq!(Conversion::Wgs84ToGcj02.apply(110.3167, 20.05), wgs84_to_gcj02(110.3167, 20.05));
        for conversion in Conversion::ALL {
            assert_eq!(conversion.to_string().parse::<Conversion>().unwrap(), conversion);
        }
    }
}
