use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum GeoJsonError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("Unknown conversion '{0}', expected one of wgs84ToGcj02, gcj02ToWgs84, gcj02ToWgs84Precise")]
    UnknownConversion(String),

    #[error("Transform callback failed: {0}")]
    Callback(String),
}

// Errors cross the JS boundary as plain strings
impl From<GeoJsonError> for JsValue {
    fn from(err: GeoJsonError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
