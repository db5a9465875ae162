//! Flattens one raw location-history record into a flat row of named scalars.
//!
//! Every extraction rule is independent: a missing source field means the
//! corresponding output field is absent, never an error. The one exception is
//! numeric coercion, which aborts the run when a value cannot convert to a
//! float.

use serde_json::{Map, Number, Value};

use crate::error::{PipelineError, Result};
use crate::geo::parse_geo;

/// A flattened record: field name to scalar value, sparsely populated.
pub type FlatRow = Map<String, Value>;

/// Flatten one raw record into a row of named scalars.
pub fn flatten_record(entry: &Value) -> Result<FlatRow> {
    let mut row = FlatRow::new();

    for key in ["startTime", "endTime"] {
        if let Some(value) = entry.get(key) {
            if !value.is_null() {
                row.insert(key.to_string(), value.clone());
            }
        }
    }

    if let Some(candidate) = entry.pointer("/visit/topCandidate") {
        if let Some(value) = candidate.get("semanticType") {
            row.insert("semanticType".to_string(), value.clone());
        }
        if let Some(value) = candidate.get("probability") {
            row.insert(
                "probability".to_string(),
                float_value("visit.topCandidate.probability", value)?,
            );
        }
        if let Some(value) = candidate.get("placeID") {
            row.insert("placeID".to_string(), value.clone());
        }
        if let Some(Value::String(location)) = candidate.get("placeLocation") {
            if let Some((lat, lng)) = parse_geo(location) {
                row.insert("latitude".to_string(), json_f64(lat));
                row.insert("longitude".to_string(), json_f64(lng));
            }
        }
    }

    if let Some(activity) = entry.get("activity") {
        if let Some(Value::String(start)) = activity.get("start") {
            if let Some((lat, lng)) = parse_geo(start) {
                row.insert("start_lat".to_string(), json_f64(lat));
                row.insert("start_lng".to_string(), json_f64(lng));
            }
        }
        if let Some(Value::String(end)) = activity.get("end") {
            if let Some((lat, lng)) = parse_geo(end) {
                row.insert("end_lat".to_string(), json_f64(lat));
                row.insert("end_lng".to_string(), json_f64(lng));
            }
        }
        if let Some(value) = activity.get("distanceMeters") {
            row.insert(
                "distance_meters".to_string(),
                float_value("activity.distanceMeters", value)?,
            );
        }
        if let Some(candidate) = activity.get("topCandidate") {
            if let Some(value) = candidate.get("type") {
                row.insert("activity_type".to_string(), value.clone());
            }
            if let Some(value) = candidate.get("probability") {
                row.insert(
                    "activity_probability".to_string(),
                    float_value("activity.topCandidate.probability", value)?,
                );
            }
        }
    }

    if let Some(segment) = entry.get("activitySegment") {
        if let Some(Value::Array(activities)) = segment.get("activities") {
            // Only the first listed activity matters
            if let Some(first) = activities.first() {
                if let Some(value) = first.get("activityType") {
                    row.insert("activityType".to_string(), value.clone());
                }
                let confidence = match first.get("probability") {
                    Some(value) => coerce_f64("activitySegment.activities[0].probability", value)?,
                    None => 0.0,
                };
                row.insert("activityConfidence".to_string(), json_f64(confidence));
            }
        }
        for key in ["distance", "duration", "activityType", "confidence"] {
            if let Some(value) = segment.get(key) {
                row.insert(format!("segment_{key}"), value.clone());
            }
        }
    }

    Ok(row)
}

/// Coerce a JSON number or numeric string to a float.
fn coerce_f64(field: &str, value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| numeric_err(field, value)),
        Value::String(s) => s.trim().parse().map_err(|_| numeric_err(field, value)),
        _ => Err(numeric_err(field, value)),
    }
}

fn float_value(field: &str, value: &Value) -> Result<Value> {
    coerce_f64(field, value).map(json_f64)
}

fn json_f64(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn numeric_err(field: &str, value: &Value) -> PipelineError {
    PipelineError::NumericField {
        field: field.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_record_keeps_only_timestamps() {
        let row = flatten_record(&json!({
            "startTime": "2024-01-15T08:00:00.000Z",
            "endTime": "2024-01-15T09:00:00.000Z"
        }))
        .unwrap();

        assert_eq!(row.len(), 2);
        assert_eq!(row["startTime"], "2024-01-15T08:00:00.000Z");
        assert_eq!(row["endTime"], "2024-01-15T09:00:00.000Z");
    }

    #[test]
    fn test_empty_record_flattens_to_empty_row() {
        let row = flatten_record(&json!({})).unwrap();
        assert!(row.is_empty());
    }

    #[test]
    fn test_visit_top_candidate() {
        let row = flatten_record(&json!({
            "visit": {
                "topCandidate": {
                    "semanticType": "HOME",
                    "probability": "0.87",
                    "placeID": "ChIJabc123",
                    "placeLocation": "geo:37.422,-122.084"
                }
            }
        }))
        .unwrap();

        assert_eq!(row["semanticType"], "HOME");
        assert_eq!(row["probability"], json!(0.87));
        assert_eq!(row["placeID"], "ChIJabc123");
        assert_eq!(row["latitude"], json!(37.422));
        assert_eq!(row["longitude"], json!(-122.084));
    }

    #[test]
    fn test_unparseable_place_location_is_skipped() {
        let row = flatten_record(&json!({
            "visit": { "topCandidate": { "placeLocation": "unknown" } }
        }))
        .unwrap();

        assert!(!row.contains_key("latitude"));
        assert!(!row.contains_key("longitude"));
    }

    #[test]
    fn test_activity_fields() {
        let row = flatten_record(&json!({
            "activity": {
                "start": "geo:37.0,-122.0",
                "end": "geo:37.5,-122.5",
                "distanceMeters": "1234.5",
                "topCandidate": { "type": "in passenger vehicle", "probability": 0.93 }
            }
        }))
        .unwrap();

        assert_eq!(row["start_lat"], json!(37.0));
        assert_eq!(row["start_lng"], json!(-122.0));
        assert_eq!(row["end_lat"], json!(37.5));
        assert_eq!(row["end_lng"], json!(-122.5));
        assert_eq!(row["distance_meters"], json!(1234.5));
        assert_eq!(row["activity_type"], "in passenger vehicle");
        assert_eq!(row["activity_probability"], json!(0.93));
    }

    #[test]
    fn test_activity_segment_uses_first_activity_only() {
        let row = flatten_record(&json!({
            "activitySegment": {
                "activities": [
                    { "activityType": "WALKING", "probability": "0.9" },
                    { "activityType": "CYCLING", "probability": "0.1" }
                ]
            }
        }))
        .unwrap();

        assert_eq!(row["activityType"], "WALKING");
        assert_eq!(row["activityConfidence"], json!(0.9));
    }

    #[test]
    fn test_activity_segment_missing_probability_defaults_to_zero() {
        let row = flatten_record(&json!({
            "activitySegment": { "activities": [{ "activityType": "WALKING" }] }
        }))
        .unwrap();

        assert_eq!(row["activityConfidence"], json!(0.0));
    }

    #[test]
    fn test_activity_segment_passthrough_fields() {
        let row = flatten_record(&json!({
            "activitySegment": {
                "activities": [],
                "distance": 420,
                "duration": "PT5M",
                "activityType": "IN_VEHICLE",
                "confidence": "HIGH"
            }
        }))
        .unwrap();

        // Empty activities list contributes nothing
        assert!(!row.contains_key("activityType"));
        assert!(!row.contains_key("activityConfidence"));
        assert_eq!(row["segment_distance"], json!(420));
        assert_eq!(row["segment_duration"], "PT5M");
        assert_eq!(row["segment_activityType"], "IN_VEHICLE");
        assert_eq!(row["segment_confidence"], "HIGH");
    }

    #[test]
    fn test_non_numeric_distance_is_an_error() {
        let err = flatten_record(&json!({
            "activity": { "distanceMeters": "not-a-number" }
        }))
        .unwrap_err();

        assert!(matches!(err, PipelineError::NumericField { .. }));
    }

    #[test]
    fn test_non_numeric_probability_is_an_error() {
        let err = flatten_record(&json!({
            "visit": { "topCandidate": { "probability": [1, 2] } }
        }))
        .unwrap_err();

        assert!(matches!(err, PipelineError::NumericField { .. }));
    }
}
