/// Axis-aligned lng/lat box, edges inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LngLatBounds {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

/// Rough bounding box of mainland China, the region where GCJ-02 offsets apply
pub const CHINA: LngLatBounds = LngLatBounds::new(72.004, 0.8293, 137.8347, 55.8271);

impl LngLatBounds {
    pub const fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Self {
        Self { min_lng, min_lat, max_lng, max_lat }
    }

    // NaN on either axis is never inside
    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        lng >= self.min_lng && lng <= self.max_lng && lat >= self.min_lat && lat <= self.max_lat
    }

    /// `[minLng, minLat, maxLng, maxLat]`, the GeoJSON `bbox` layout.
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_lng, self.min_lat, self.max_lng, self.max_lat]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_are_inside() {
        let b = LngLatBounds::new(0.0, 0.0, 10.0, 5.0);
        assert!(b.contains(0.0, 0.0));
        assert!(b.contains(10.0, 5.0));
        assert!(b.contains(3.0, 2.5));
        assert!(!b.contains(10.000001, 2.0));
        assert!(!b.contains(3.0, -0.000001));
    }

    #[test]
    fn nan_is_outside() {
        assert!(!CHINA.contains(f64::NAN, 30.0));
        assert!(!CHINA.contains(110.0, f64::NAN));
    }

    #[test]
    fn china_bbox_layout() {
        assert_eq!(CHINA.to_array(), [72.004, 0.8293, 137.8347, 55.8271]);
    }
}
