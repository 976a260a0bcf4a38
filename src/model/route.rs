//! §3.6 RouteMapping and §4.7 schema properties.

use super::language::SearchLanguage;
use super::request::Coordinate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProviderMethod {
    TextSearch,
    NearbySearch,
    LandmarkPlan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CuisineStrictness {
    #[serde(rename = "STRICT")]
    Strict,
    #[serde(rename = "RELAX_IF_EMPTY")]
    RelaxIfEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeHint {
    Restaurant,
    Cafe,
    Bar,
    Any,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationBias {
    pub center: Coordinate,
    pub radius_meters: u32,
}

/// Output of the route-mapper LLM stage. All fields are required in the
/// returned document (spec.md §3.6, §4.7): the schema used to constrain the
/// model's JSON output lists every one of them in `required[]`, so a
/// response missing `required_terms`/`preferred_terms`/`strictness`/
/// `type_hint` is rejected by the provider as invalid before it ever reaches
/// this struct's `Deserialize` impl.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMapping {
    pub provider_method: ProviderMethod,
    pub text_query: String,
    pub region: String,
    pub language: SearchLanguage,
    pub bias: Option<LocationBias>,
    pub city_text: Option<String>,
    pub city_center: Option<Coordinate>,
    pub required_terms: Vec<String>,
    pub preferred_terms: Vec<String>,
    pub strictness: CuisineStrictness,
    pub type_hint: TypeHint,
}

impl RouteMapping {
    /// Minimal default mapping used when the route-mapper's JSON fails
    /// schema validation (spec.md §4.6 stage 4).
    pub fn fallback_default(text_query: String, region: String, language: SearchLanguage) -> Self {
        Self {
            provider_method: ProviderMethod::TextSearch,
            text_query,
            region,
            language,
            bias: None,
            city_text: None,
            city_center: None,
            required_terms: Vec::new(),
            preferred_terms: Vec::new(),
            strictness: CuisineStrictness::RelaxIfEmpty,
            type_hint: TypeHint::Any,
        }
    }

    /// Every property required in the JSON-schema's `required[]` (spec.md §4.7).
    /// Kept in sync with this struct's field set; a field added here without
    /// a matching schema entry would make the schema under-constrain the model.
    pub const REQUIRED_PROPERTIES: &'static [&'static str] = &[
        "providerMethod",
        "textQuery",
        "region",
        "language",
        "bias",
        "cityText",
        "cityCenter",
        "requiredTerms",
        "preferredTerms",
        "strictness",
        "typeHint",
    ];
}
