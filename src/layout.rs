//! Import/export boundary for building layouts and prediction responses.
//!
//! ## Layout file
//!
//! ```json
//! [ { "id": 1, "position": [0, 0.5, 0], "size": [1, 1, 1], "damageRadiusSqM": 20, ... } ]
//! ```
//!
//! ## Prediction response
//!
//! ```json
//! { "predictions": [ { "buildings": { "id": 1, "position": [..], "size": [..] },
//!                      "debris_area_m2": 31.5, "predicted_grade": "Grade 3" } ] }
//! ```
//!
//! Only `id`, `position`, `size` and the damage area feed the simulation.
//! Every other field is kept in [`Building::metadata`] so a layout survives
//! an import/export round trip.

use crate::error::LayoutError;
use crate::types::{Building, Vec3};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Layout key holding the damage area in m².
pub const DAMAGE_AREA_KEY: &str = "damageRadiusSqM";
/// Prediction key holding the damage area in m².
pub const DEBRIS_AREA_KEY: &str = "debris_area_m2";

/// Damage area the builder assigns to a footprint: 2.5 × its area in m².
pub const DEFAULT_DAMAGE_MULTIPLIER: f32 = 2.5;

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn read_vec3(record: &Map<String, Value>, index: usize, field: &'static str) -> Result<Vec3, LayoutError> {
    let missing = || LayoutError::MissingField { index, field };
    let arr = record.get(field).and_then(Value::as_array).ok_or_else(missing)?;
    if arr.len() != 3 {
        return Err(missing());
    }
    let mut out = [0.0f32; 3];
    for (slot, v) in out.iter_mut().zip(arr) {
        *slot = v.as_f64().ok_or_else(missing)? as f32;
    }
    let v = Vec3::from(out);
    if !v.is_finite() {
        return Err(missing());
    }
    Ok(v)
}

fn read_id(record: &Map<String, Value>, index: usize) -> String {
    match record.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("b-{}", index),
    }
}

/// Missing, non-numeric and non-finite areas count as 0; negatives clamp to 0.
fn read_area(value: Option<&Value>) -> f32 {
    value
        .and_then(Value::as_f64)
        .map(|a| a as f32)
        .filter(|a| a.is_finite())
        .map_or(0.0, |a| a.max(0.0))
}

fn building_from_record(
    record: &Map<String, Value>,
    index: usize,
    area: Option<&Value>,
    passthrough: impl Iterator<Item = (String, Value)>,
) -> Result<Building, LayoutError> {
    let position = read_vec3(record, index, "position")?;
    let size = read_vec3(record, index, "size")?;
    check_size(index, size)?;

    let mut building = Building::new(read_id(record, index), position, size, read_area(area));
    building.metadata = passthrough.collect();
    Ok(building)
}

/// Every size component must be finite and positive.
pub(crate) fn check_size(index: usize, size: Vec3) -> Result<(), LayoutError> {
    if size.is_finite() && size.x > 0.0 && size.y > 0.0 && size.z > 0.0 {
        Ok(())
    } else {
        Err(LayoutError::InvalidSize { index, size })
    }
}

pub(crate) fn ensure_unique(buildings: &[Building]) -> Result<(), LayoutError> {
    let mut seen = HashSet::new();
    for b in buildings {
        if !seen.insert(b.id.as_str()) {
            return Err(LayoutError::DuplicateId(b.id.clone()));
        }
    }
    Ok(())
}

const GEOMETRY_KEYS: [&str; 6] = [
    "id",
    "position",
    "size",
    DAMAGE_AREA_KEY,
    "destroyed",
    "shaking",
];

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Parse a layout file into buildings. All buildings start standing.
pub fn parse_layout(json: &str) -> Result<Vec<Building>, LayoutError> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Array(records) = value else {
        return Err(LayoutError::NotAnArray);
    };

    let mut buildings = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let record = record.as_object().ok_or(LayoutError::NotAnObject { index })?;
        let extra = record
            .iter()
            .filter(|(k, _)| !GEOMETRY_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()));
        buildings.push(building_from_record(
            record,
            index,
            record.get(DAMAGE_AREA_KEY),
            extra,
        )?);
    }

    ensure_unique(&buildings)?;
    Ok(buildings)
}

/// Parse a prediction service response.
///
/// Accepts `{ "predictions": [...] }`, `{ "predictions": {...} }` or a bare
/// array of prediction records.
pub fn parse_predictions(json: &str) -> Result<Vec<Building>, LayoutError> {
    let value: Value = serde_json::from_str(json)?;
    let records = match value {
        Value::Array(records) => records,
        Value::Object(mut obj) => match obj.remove("predictions") {
            Some(Value::Array(records)) => records,
            Some(single @ Value::Object(_)) => vec![single],
            _ => return Err(LayoutError::MissingPredictions),
        },
        _ => return Err(LayoutError::MissingPredictions),
    };

    let mut buildings = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let record = record.as_object().ok_or(LayoutError::NotAnObject { index })?;
        let geometry = record
            .get("buildings")
            .and_then(Value::as_object)
            .ok_or(LayoutError::MissingField { index, field: "buildings" })?;
        let grade = record
            .get("predicted_grade")
            .cloned()
            .map(|g| ("predicted_grade".to_string(), g));
        buildings.push(building_from_record(
            geometry,
            index,
            record.get(DEBRIS_AREA_KEY),
            grade.into_iter(),
        )?);
    }

    ensure_unique(&buildings)?;
    Ok(buildings)
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Builder default for a footprint measured in scene units.
pub fn estimate_damage_area(size: Vec3, meters_per_unit: f32) -> f32 {
    let w = size.x * meters_per_unit;
    let d = size.z * meters_per_unit;
    w * d * DEFAULT_DAMAGE_MULTIPLIER
}

/// Serialize buildings back into the layout file format.
pub fn layout_to_json(buildings: &[Building]) -> serde_json::Result<String> {
    let records: Vec<Value> = buildings
        .iter()
        .map(|b| {
            let mut record: Map<String, Value> = b
                .metadata
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            record.insert("id".into(), Value::String(b.id.clone()));
            record.insert("position".into(), serde_json::json!(b.position.to_array()));
            record.insert("size".into(), serde_json::json!(b.size.to_array()));
            record.insert(DAMAGE_AREA_KEY.into(), serde_json::json!(b.damage_area_sq_m));
            Value::Object(record)
        })
        .collect();
    serde_json::to_string_pretty(&records)
}
