// Coordinate transforms over whole GeoJSON documents.
//
// Every transform borrows its input and builds a new value, so callers never
// observe their own data being modified.

use geo_types::{Coord, LineString, Polygon};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry};
use serde_json::Value;

use crate::coord_transform::{gcj02_to_wgs84, wgs84_to_gcj02};
use crate::error::GeoJsonError;
use crate::options::TransformOptions;

/// Types whose lng/lat values can be remapped without changing their shape.
pub trait MapLngLat {
    fn map_lnglat<F>(&self, f: &F) -> Self
    where
        F: Fn(f64, f64) -> (f64, f64);
}

/// Apply `transform_fn` to every coordinate of `geojson`, returning a new value.
pub fn transform_geojson<T, F>(geojson: &T, transform_fn: F) -> T
where
    T: MapLngLat,
    F: Fn(f64, f64) -> (f64, f64),
{
    geojson.map_lnglat(&transform_fn)
}

pub fn geojson_to_gcj02<T: MapLngLat>(geojson: &T) -> T {
    transform_geojson(geojson, wgs84_to_gcj02)
}

pub fn geojson_to_wgs84<T: MapLngLat>(geojson: &T) -> T {
    transform_geojson(geojson, gcj02_to_wgs84)
}

/// Check that `value` is well-formed GeoJSON and return its typed form.
///
/// `"bbox": null` is accepted as an absent bbox.
pub fn validate_geojson(value: &Value) -> Result<GeoJson, GeoJsonError> {
    let mut document = value.clone();
    strip_null_bbox(&mut document);
    Ok(GeoJson::from_json_value(document)?)
}

fn strip_null_bbox(value: &mut Value) {
    match value {
        Value::Object(object) => {
            if object.get("bbox").is_some_and(Value::is_null) {
                object.remove("bbox");
            }
            for (key, member) in object.iter_mut() {
                if key != "coordinates" {
                    strip_null_bbox(member);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(strip_null_bbox),
        _ => {}
    }
}

/// Transform a GeoJSON document held as a JSON string.
///
/// Strict mode rejects anything that is not valid GeoJSON. Lenient mode passes
/// unrecognized shapes through untouched. In both modes the output is the input
/// document with only coordinate values replaced.
pub fn transform_geojson_json(input: &str, options: &TransformOptions) -> Result<String, GeoJsonError> {
    let direction = options.direction;
    let geojson: Value = serde_json::from_str(input)?;
    if options.strict {
        validate_geojson(&geojson)?;
    }
    let output = transform_geojson(&geojson, |lng, lat| direction.apply(lng, lat));
    Ok(serde_json::to_string(&output)?)
}

// Unchanged components keep their original JSON number, so `[0, 0]` stays integral
fn coordinate_value(original: &Value, before: f64, after: f64) -> Value {
    if before.to_bits() == after.to_bits() {
        original.clone()
    } else {
        Value::from(after)
    }
}

/// Recursively transform a nested coordinate array.
///
/// An array whose first two entries are numbers is a position: those two are
/// transformed and any trailing entries are kept in place. Other arrays are
/// mapped element-wise and everything else is returned as is.
///
/// JSON has no NaN or infinity: a non-finite result from `f` is written as `null`.
pub fn transform_coordinates<F>(coords: &Value, f: &F) -> Value
where
    F: Fn(f64, f64) -> (f64, f64),
{
    let Value::Array(items) = coords else {
        return coords.clone();
    };

    match (items.first().and_then(Value::as_f64), items.get(1).and_then(Value::as_f64)) {
        (Some(lng), Some(lat)) => {
            let (new_lng, new_lat) = f(lng, lat);
            let mut out = Vec::with_capacity(items.len());
            out.push(coordinate_value(&items[0], lng, new_lng));
            out.push(coordinate_value(&items[1], lat, new_lat));
            out.extend(items[2..].iter().cloned());
            Value::Array(out)
        }
        _ => Value::Array(items.iter().map(|c| transform_coordinates(c, f)).collect()),
    }
}

// Lenient geometry walk: `coordinates` is always remapped, `geometries` only on
// a GeometryCollection. Non-objects (including null) come back unchanged.
fn transform_geometry_value<F>(geometry: &Value, f: &F) -> Value
where
    F: Fn(f64, f64) -> (f64, f64),
{
    let Value::Object(object) = geometry else {
        return geometry.clone();
    };

    let is_collection = object.get("type").and_then(Value::as_str) == Some("GeometryCollection");
    let out: serde_json::Map<String, Value> = object
        .iter()
        .map(|(key, value)| {
            let value = match (key.as_str(), value) {
                ("coordinates", coords) => transform_coordinates(coords, f),
                ("geometries", Value::Array(members)) if is_collection => Value::Array(
                    members
                        .iter()
                        .map(|member| transform_geometry_value(member, f))
                        .collect(),
                ),
                _ => value.clone(),
            };
            (key.clone(), value)
        })
        .collect();
    Value::Object(out)
}

fn transform_feature_value<F>(feature: &Value, f: &F) -> Value
where
    F: Fn(f64, f64) -> (f64, f64),
{
    map_member(feature, "geometry", |geometry| transform_geometry_value(geometry, f))
}

// Clone `object`, replacing one member with `map(member)`.
fn map_member(object: &Value, member: &str, map: impl Fn(&Value) -> Value) -> Value {
    let Value::Object(fields) = object else {
        return object.clone();
    };
    let out: serde_json::Map<String, Value> = fields
        .iter()
        .map(|(key, value)| {
            let value = if key == member { map(value) } else { value.clone() };
            (key.clone(), value)
        })
        .collect();
    Value::Object(out)
}

/// Lenient transform of untyped GeoJSON. Unknown or malformed shapes pass through.
impl MapLngLat for Value {
    fn map_lnglat<F>(&self, f: &F) -> Self
    where
        F: Fn(f64, f64) -> (f64, f64),
    {
        match self.get("type").and_then(Value::as_str) {
            Some("FeatureCollection") => map_member(self, "features", |features| match features {
                Value::Array(items) => {
                    Value::Array(items.iter().map(|item| transform_feature_value(item, f)).collect())
                }
                other => other.clone(),
            }),
            Some("Feature") => transform_feature_value(self, f),
            _ => transform_geometry_value(self, f),
        }
    }
}

// Positions shorter than two entries are copied as is
fn map_position<F>(position: &[f64], f: &F) -> Vec<f64>
where
    F: Fn(f64, f64) -> (f64, f64),
{
    if position.len() < 2 {
        return position.to_vec();
    }
    let (lng, lat) = f(position[0], position[1]);
    let mut out = Vec::with_capacity(position.len());
    out.push(lng);
    out.push(lat);
    out.extend_from_slice(&position[2..]);
    out
}

fn map_positions<F>(positions: &[Vec<f64>], f: &F) -> Vec<Vec<f64>>
where
    F: Fn(f64, f64) -> (f64, f64),
{
    positions.iter().map(|p| map_position(p, f)).collect()
}

fn map_rings<F>(rings: &[Vec<Vec<f64>>], f: &F) -> Vec<Vec<Vec<f64>>>
where
    F: Fn(f64, f64) -> (f64, f64),
{
    rings.iter().map(|ring| map_positions(ring, f)).collect()
}

impl MapLngLat for geojson::Value {
    fn map_lnglat<F>(&self, f: &F) -> Self
    where
        F: Fn(f64, f64) -> (f64, f64),
    {
        use geojson::Value as V;

        match self {
            V::Point(position) => V::Point(map_position(position, f)),
            V::MultiPoint(positions) => V::MultiPoint(map_positions(positions, f)),
            V::LineString(positions) => V::LineString(map_positions(positions, f)),
            V::MultiLineString(lines) => V::MultiLineString(map_rings(lines, f)),
            V::Polygon(rings) => V::Polygon(map_rings(rings, f)),
            V::MultiPolygon(polygons) => {
                V::MultiPolygon(polygons.iter().map(|rings| map_rings(rings, f)).collect())
            }
            V::GeometryCollection(geometries) => V::GeometryCollection(
                geometries.iter().map(|geometry| geometry.map_lnglat(f)).collect(),
            ),
        }
    }
}

impl MapLngLat for Geometry {
    fn map_lnglat<F>(&self, f: &F) -> Self
    where
        F: Fn(f64, f64) -> (f64, f64),
    {
        Geometry {
            bbox: self.bbox.clone(),
            value: self.value.map_lnglat(f),
            foreign_members: self.foreign_members.clone(),
        }
    }
}

impl MapLngLat for Feature {
    fn map_lnglat<F>(&self, f: &F) -> Self
    where
        F: Fn(f64, f64) -> (f64, f64),
    {
        Feature {
            bbox: self.bbox.clone(),
            geometry: self.geometry.as_ref().map(|geometry| geometry.map_lnglat(f)),
            id: self.id.clone(),
            properties: self.properties.clone(),
            foreign_members: self.foreign_members.clone(),
        }
    }
}

impl MapLngLat for FeatureCollection {
    fn map_lnglat<F>(&self, f: &F) -> Self
    where
        F: Fn(f64, f64) -> (f64, f64),
    {
        FeatureCollection {
            bbox: self.bbox.clone(),
            features: self.features.iter().map(|feature| feature.map_lnglat(f)).collect(),
            foreign_members: self.foreign_members.clone(),
        }
    }
}

impl MapLngLat for GeoJson {
    fn map_lnglat<F>(&self, f: &F) -> Self
    where
        F: Fn(f64, f64) -> (f64, f64),
    {
        match self {
            GeoJson::Geometry(geometry) => GeoJson::Geometry(geometry.map_lnglat(f)),
            GeoJson::Feature(feature) => GeoJson::Feature(feature.map_lnglat(f)),
            GeoJson::FeatureCollection(collection) => {
                GeoJson::FeatureCollection(collection.map_lnglat(f))
            }
        }
    }
}

impl MapLngLat for Coord<f64> {
    fn map_lnglat<F>(&self, f: &F) -> Self
    where
        F: Fn(f64, f64) -> (f64, f64),
    {
        let (x, y) = f(self.x, self.y);
        Coord { x, y }
    }
}

fn map_line_string<F>(line: &LineString<f64>, f: &F) -> LineString<f64>
where
    F: Fn(f64, f64) -> (f64, f64),
{
    LineString::new(line.coords().map(|c| c.map_lnglat(f)).collect())
}

fn map_polygon<F>(polygon: &Polygon<f64>, f: &F) -> Polygon<f64>
where
    F: Fn(f64, f64) -> (f64, f64),
{
    let exterior = map_line_string(polygon.exterior(), f);
    let interiors = polygon
        .interiors()
        .iter()
        .map(|ring| map_line_string(ring, f))
        .collect();
    Polygon::new(exterior, interiors)
}

/// geo-types geometries use x = longitude, y = latitude.
impl MapLngLat for geo_types::Geometry<f64> {
    fn map_lnglat<F>(&self, f: &F) -> Self
    where
        F: Fn(f64, f64) -> (f64, f64),
    {
        use geo_types::Geometry as G;

        match self {
            G::Point(point) => G::Point(geo_types::Point(point.0.map_lnglat(f))),
            G::Line(line) => G::Line(geo_types::Line::new(
                line.start.map_lnglat(f),
                line.end.map_lnglat(f),
            )),
            G::LineString(line) => G::LineString(map_line_string(line, f)),
            G::Polygon(polygon) => G::Polygon(map_polygon(polygon, f)),
            G::MultiPoint(points) => G::MultiPoint(geo_types::MultiPoint::new(
                points
                    .0
                    .iter()
                    .map(|point| geo_types::Point(point.0.map_lnglat(f)))
                    .collect(),
            )),
            G::MultiLineString(lines) => G::MultiLineString(geo_types::MultiLineString::new(
                lines.0.iter().map(|line| map_line_string(line, f)).collect(),
            )),
            G::MultiPolygon(polygons) => G::MultiPolygon(geo_types::MultiPolygon::new(
                polygons.0.iter().map(|polygon| map_polygon(polygon, f)).collect(),
            )),
            G::GeometryCollection(collection) => G::GeometryCollection(
                geo_types::GeometryCollection(
                    collection.0.iter().map(|geometry| geometry.map_lnglat(f)).collect(),
                ),
            ),
            // corners re-normalized by Rect::new
            G::Rect(rect) => G::Rect(geo_types::Rect::new(
                rect.min().map_lnglat(f),
                rect.max().map_lnglat(f),
            )),
            G::Triangle(triangle) => G::Triangle(geo_types::Triangle::new(
                triangle.v1().map_lnglat(f),
                triangle.v2().map_lnglat(f),
                triangle.v3().map_lnglat(f),
            )),
        }
    }
}
