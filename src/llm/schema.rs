//! JSON schemas constraining each purpose's model output (spec.md §4.7).
//!
//! Strict-mode schema-constrained model APIs require every property to
//! appear in `required[]`; the route-mapper schema's `required` list is
//! kept in lockstep with [`crate::model::RouteMapping::REQUIRED_PROPERTIES`].

use serde_json::{json, Value};

pub fn gate_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "isFoodOrPlaceQuery": {"type": "boolean"},
            "reason": {"type": "string"}
        },
        "required": ["isFoodOrPlaceQuery", "reason"],
        "additionalProperties": false
    })
}

pub fn intent_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "reason": {"type": "string"},
            "cityText": {"type": ["string", "null"]},
            "blocksSearch": {"type": "boolean"}
        },
        "required": ["reason", "cityText", "blocksSearch"],
        "additionalProperties": false
    })
}

pub fn base_filters_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "openState": {"type": "string", "enum": ["any", "open_now"]},
            "language": {"type": "string"},
            "priceIntent": {"type": "string", "enum": ["any", "cheap", "mid", "expensive"]},
            "minRatingBucket": {"type": "number"}
        },
        "required": ["openState", "language", "priceIntent", "minRatingBucket"],
        "additionalProperties": false
    })
}

/// The full RouteMapping schema. Every property in `crate::model::route::RouteMapping`
/// is listed in `required`, matching spec.md §4.7 bit-for-bit.
pub fn route_mapper_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "providerMethod": {"type": "string", "enum": ["textSearch", "nearbySearch", "landmarkPlan"]},
            "textQuery": {"type": "string"},
            "region": {"type": "string"},
            "language": {"type": "string", "enum": ["he", "en"]},
            "bias": {
                "type": ["object", "null"],
                "properties": {
                    "center": {"type": "object", "properties": {"lat": {"type": "number"}, "lng": {"type": "number"}}, "required": ["lat", "lng"]},
                    "radiusMeters": {"type": "number"}
                },
                "required": ["center", "radiusMeters"]
            },
            "cityText": {"type": ["string", "null"]},
            "cityCenter": {"type": ["object", "null"]},
            "requiredTerms": {"type": "array", "items": {"type": "string"}},
            "preferredTerms": {"type": "array", "items": {"type": "string"}},
            "strictness": {"type": "string", "enum": ["STRICT", "RELAX_IF_EMPTY"]},
            "typeHint": {"type": "string", "enum": ["restaurant", "cafe", "bar", "any"]}
        },
        "required": [
            "providerMethod", "textQuery", "region", "language", "bias", "cityText",
            "cityCenter", "requiredTerms", "preferredTerms", "strictness", "typeHint"
        ],
        "additionalProperties": false
    })
}

pub fn cuisine_enforcer_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "keptPlaceIds": {"type": "array", "items": {"type": "string"}},
            "relaxationApplied": {"type": ["string", "null"], "enum": ["fallback_preferred", "drop_required_once", null]}
        },
        "required": ["keptPlaceIds", "relaxationApplied"],
        "additionalProperties": false
    })
}

pub fn ranking_profile_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "mode": {"type": "string", "enum": ["QUALITY_FOCUSED", "DISTANCE_FOCUSED", "BALANCED", "GOOGLE"]}
        },
        "required": ["mode"],
        "additionalProperties": false
    })
}

pub fn assistant_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "kind": {"type": "string", "enum": ["CLARIFY", "SUMMARY", "GATE_FAIL", "NUDGE_REFINE"]},
            "text": {"type": "string"},
            "blocksSearch": {"type": "boolean"}
        },
        "required": ["kind", "text", "blocksSearch"],
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::route::RouteMapping;

    #[test]
    fn route_mapper_schema_required_matches_struct_field_set() {
        let schema = route_mapper_schema();
        let required: Vec<&str> =
            schema["required"].as_array().unwrap().iter().map(|v| v.as_str().unwrap()).collect();
        assert_eq!(required, RouteMapping::REQUIRED_PROPERTIES);
    }
}
