use std::cell::RefCell;

use js_sys::{Array, Function};
use serde::Serialize;
use wasm_bindgen::prelude::*;

// Create a console module for logging
pub mod console;
pub mod bounds;
// WGS-84 <-> GCJ-02 point math
pub mod coord_transform;
pub mod error;
pub mod geojson_transform;
pub mod options;

pub use bounds::{LngLatBounds, CHINA};
pub use coord_transform::{
    gcj02_to_wgs84, gcj02_to_wgs84_precise, is_in_china, wgs84_to_gcj02, Conversion,
};
pub use error::GeoJsonError;
pub use geojson;
pub use geojson_transform::{
    geojson_to_gcj02, geojson_to_wgs84, transform_coordinates, transform_geojson,
    transform_geojson_json, validate_geojson, MapLngLat,
};
pub use options::TransformOptions;

// Enable better panic messages in console during development
#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

// Use the macro from our console module
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => ($crate::console::log(&format!($($t)*)))
}

use std::sync::Once;
static INIT: Once = Once::new();

#[wasm_bindgen(start)]
pub fn start() {
    INIT.call_once(|| {
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        console_log!("mapcoord module initialized");
    });
}

fn lnglat_array((lng, lat): (f64, f64)) -> Array {
    Array::of2(&JsValue::from_f64(lng), &JsValue::from_f64(lat))
}

#[wasm_bindgen(js_name = isInChina)]
pub fn is_in_china_js(lng: f64, lat: f64) -> bool {
    is_in_china(lng, lat)
}

/// Returns `[lng, lat]` in GCJ-02.
#[wasm_bindgen(js_name = wgs84ToGcj02)]
pub fn wgs84_to_gcj02_js(lng: f64, lat: f64) -> Array {
    lnglat_array(wgs84_to_gcj02(lng, lat))
}

/// Returns `[lng, lat]` in WGS-84 (single-step approximation).
#[wasm_bindgen(js_name = gcj02ToWgs84)]
pub fn gcj02_to_wgs84_js(lng: f64, lat: f64) -> Array {
    lnglat_array(gcj02_to_wgs84(lng, lat))
}

#[wasm_bindgen(js_name = gcj02ToWgs84Precise)]
pub fn gcj02_to_wgs84_precise_js(lng: f64, lat: f64) -> Array {
    lnglat_array(gcj02_to_wgs84_precise(lng, lat))
}

fn geojson_from_js(geojson: JsValue) -> Result<serde_json::Value, JsValue> {
    serde_wasm_bindgen::from_value(geojson)
        .map_err(|e| JsValue::from_str(&format!("Invalid GeoJSON object: {}", e)))
}

// Plain objects and arrays on the JS side, not Maps
fn geojson_to_js(geojson: &serde_json::Value) -> Result<JsValue, JsValue> {
    Ok(geojson.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?)
}

fn convert_js(geojson: JsValue, conversion: Conversion) -> Result<JsValue, JsValue> {
    let input = geojson_from_js(geojson)?;
    let output = transform_geojson(&input, |lng, lat| conversion.apply(lng, lat));
    geojson_to_js(&output)
}

/// Convert a GeoJSON object from WGS-84 to GCJ-02. The argument is not modified.
#[wasm_bindgen(js_name = geoJSONToGcj02)]
pub fn geojson_to_gcj02_js(geojson: JsValue) -> Result<JsValue, JsValue> {
    convert_js(geojson, Conversion::Wgs84ToGcj02)
}

/// Convert a GeoJSON object from GCJ-02 to WGS-84. The argument is not modified.
#[wasm_bindgen(js_name = geoJSONToWgs84)]
pub fn geojson_to_wgs84_js(geojson: JsValue) -> Result<JsValue, JsValue> {
    convert_js(geojson, Conversion::Gcj02ToWgs84)
}

fn call_transform_fn(transform_fn: &Function, lng: f64, lat: f64) -> Result<(f64, f64), JsValue> {
    let result = transform_fn.call2(&JsValue::NULL, &JsValue::from_f64(lng), &JsValue::from_f64(lat))?;
    let pair = Array::from(&result);
    match (pair.get(0).as_f64(), pair.get(1).as_f64()) {
        (Some(lng), Some(lat)) => Ok((lng, lat)),
        _ => Err(GeoJsonError::Callback(format!("expected [lng, lat], got {:?}", result)).into()),
    }
}

/// Transform a GeoJSON object with a caller-supplied `(lng, lat) => [lng, lat]`.
///
/// The first exception thrown by `transformFn` aborts the call and is rethrown.
#[wasm_bindgen(js_name = transformGeoJSON)]
pub fn transform_geojson_js(geojson: JsValue, transform_fn: &Function) -> Result<JsValue, JsValue> {
    let input = geojson_from_js(geojson)?;

    let failure: RefCell<Option<JsValue>> = RefCell::new(None);
    let output = transform_geojson(&input, |lng, lat| {
        if failure.borrow().is_some() {
            return (lng, lat);
        }
        match call_transform_fn(transform_fn, lng, lat) {
            Ok(pair) => pair,
            Err(err) => {
                *failure.borrow_mut() = Some(err);
                (lng, lat)
            }
        }
    });

    if let Some(err) = failure.into_inner() {
        console_log!("transformGeoJSON aborted: transform callback failed");
        return Err(err);
    }
    geojson_to_js(&output)
}

/// JSON string in, JSON string out. `options` is a JSON `TransformOptions`
/// object such as `{"direction":"gcj02ToWgs84","strict":true}`; empty for defaults.
#[wasm_bindgen(js_name = transformGeoJSONString)]
pub fn transform_geojson_string(input: &str, options: &str) -> Result<String, JsValue> {
    let options = TransformOptions::from_json(options)?;
    console_log!(
        "Transforming GeoJSON ({} bytes), direction: {}, strict: {}",
        input.len(),
        options.direction,
        options.strict
    );

    let result = transform_geojson_json(input, &options)?;
    console_log!("Transform completed, result size: {} bytes", result.len());
    Ok(result)
}

// Get information about the module's constants and supported directions
#[wasm_bindgen(js_name = getModuleInfo)]
pub fn get_module_info() -> String {
    let directions: Vec<&str> = Conversion::ALL.iter().map(|c| c.as_str()).collect();
    serde_json::to_string(&serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "ellipsoid": {
            "a": coord_transform::A,
            "ee": coord_transform::EE,
        },
        "chinaBounds": CHINA.to_array(),
        "directions": directions,
    }))
    .unwrap_or_else(|_| "{}".to_string())
}
