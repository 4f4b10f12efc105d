// Options accepted by the JSON string entry point.
use serde::Deserialize;

use crate::coord_transform::Conversion;
use crate::error::GeoJsonError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct TransformOptions {
    pub direction: Conversion,
    /// Reject malformed GeoJSON instead of passing it through.
    pub strict: bool,
}

impl TransformOptions {
    /// Parse options from JSON. A blank string yields the defaults.
    pub fn from_json(options_json: &str) -> Result<Self, GeoJsonError> {
        if options_json.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(options_json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_means_defaults() {
        let options = TransformOptions::from_json("  ").unwrap();
        assert_eq!(options.direction, Conversion::Wgs84ToGcj02);
        assert!(!options.strict);
        assert_eq!(TransformOptions::from_json("{}").unwrap(), options);
    }

    #[test]
    fn camel_case_keys() {
        let options = TransformOptions::from_json(r#"{"direction":"gcj02ToWgs84","strict":true}"#).unwrap();
        assert_eq!(options.direction, Conversion::Gcj02ToWgs84);
        assert!(options.strict);

        let options = TransformOptions::from_json(r#"{"direction":"toGcj02"}"#).unwrap();
        assert_eq!(options.direction, Conversion::Wgs84ToGcj02);
    }

    #[test]
    fn rejects_unknown_direction_and_fields() {
        assert!(matches!(
            TransformOptions::from_json(r#"{"direction":"bd09"}"#),
            Err(GeoJsonError::Json(_))
        ));
        assert!(TransformOptions::from_json(r#"{"precision":3}"#).is_err());
    }
}
