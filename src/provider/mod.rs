//! C4 — Place provider: text-search, geocoding, in-process cache.

pub mod cache;

use crate::model::request::Coordinate;
use crate::model::place::Place;
use async_trait::async_trait;
use cache::{GeocodeCache, TextSearchCache};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct LocationBias {
    pub center: Coordinate,
    pub radius_meters: u32,
}

#[derive(Debug, Clone)]
pub struct TextSearchRequest {
    pub text_query: String,
    pub region_code: String,
    pub language_code: String,
    pub location_bias: Option<LocationBias>,
    pub field_mask: &'static str,
}

impl TextSearchRequest {
    /// Cache key per spec.md §4.2: derived only from textQuery, languageCode,
    /// regionCode, bias, fieldMask, and pipeline version — never any
    /// assistant/UI/intent language.
    pub fn cache_key(&self, pipeline_version: &str) -> String {
        let bias_part = match &self.location_bias {
            Some(b) => format!("{:.4},{:.4}:{}", b.center.lat, b.center.lng, b.radius_meters),
            None => "none".to_string(),
        };
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.text_query, self.language_code, self.region_code, bias_part, self.field_mask, pipeline_version
        )
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider_5xx: {status}")]
    Server { status: u16 },
    #[error("provider_4xx: {status}")]
    Client { status: u16 },
    #[error("timeout")]
    Timeout,
}

pub const CANDIDATE_POOL_SIZE: usize = 30;
const TEXT_SEARCH_TIMEOUT: Duration = Duration::from_secs(6);
const GEOCODE_TIMEOUT: Duration = Duration::from_secs(3);

/// External SDK boundary (spec.md §1 out-of-scope collaborator); this crate
/// only defines the contract it calls against.
#[async_trait]
pub trait PlaceProviderTransport: Send + Sync {
    async fn text_search_raw(&self, req: &TextSearchRequest) -> Result<Vec<Place>, ProviderError>;
    async fn geocode_raw(&self, city_text: &str, region_code: &str) -> Result<Coordinate, ProviderError>;
}

/// HTTP transport calling the external place SDK's REST surface.
pub struct HttpPlaceProviderTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpPlaceProviderTransport {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into(), api_key: api_key.into() }
    }
}

#[async_trait]
impl PlaceProviderTransport for HttpPlaceProviderTransport {
    async fn text_search_raw(&self, req: &TextSearchRequest) -> Result<Vec<Place>, ProviderError> {
        let resp = self
            .client
            .get(format!("{}/v1/places:searchText", self.base_url))
            .query(&[
                ("textQuery", req.text_query.as_str()),
                ("regionCode", req.region_code.as_str()),
                ("languageCode", req.language_code.as_str()),
                ("fields", req.field_mask),
            ])
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|_| ProviderError::Timeout)?;
        if resp.status().is_server_error() {
            return Err(ProviderError::Server { status: resp.status().as_u16() });
        }
        if resp.status().is_client_error() {
            return Err(ProviderError::Client { status: resp.status().as_u16() });
        }
        let places: Vec<Place> = resp.json().await.map_err(|_| ProviderError::Client { status: 0 })?;
        Ok(places.into_iter().take(CANDIDATE_POOL_SIZE).collect())
    }

    async fn geocode_raw(&self, city_text: &str, region_code: &str) -> Result<Coordinate, ProviderError> {
        let resp = self
            .client
            .get(format!("{}/v1/geocode", self.base_url))
            .query(&[("address", city_text), ("region", region_code)])
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|_| ProviderError::Timeout)?;
        if resp.status().is_server_error() {
            return Err(ProviderError::Server { status: resp.status().as_u16() });
        }
        if resp.status().is_client_error() {
            return Err(ProviderError::Client { status: resp.status().as_u16() });
        }
        resp.json().await.map_err(|_| ProviderError::Client { status: 0 })
    }
}

/// Text-search + geocode with an in-process cache (spec.md §4.2). The
/// geocode TTL cache and the text-search result cache both live here,
/// keyed per their respective rules.
pub struct PlaceProvider {
    transport: Box<dyn PlaceProviderTransport>,
    geocode_cache: GeocodeCache,
    text_search_cache: TextSearchCache,
    pipeline_version: String,
}

impl PlaceProvider {
    pub fn new(transport: Box<dyn PlaceProviderTransport>, geocode_ttl: Duration, pipeline_version: impl Into<String>) -> Self {
        Self {
            transport,
            geocode_cache: GeocodeCache::new(geocode_ttl),
            text_search_cache: TextSearchCache::new(),
            pipeline_version: pipeline_version.into(),
        }
    }

    /// Text search: one retry on 5xx at this layer (spec.md §4.2 failure model).
    pub async fn text_search(&self, req: TextSearchRequest) -> Result<Vec<Place>, ProviderError> {
        let key = req.cache_key(&self.pipeline_version);
        if let Some(cached) = self.text_search_cache.get(&key) {
            return Ok(cached);
        }

        let first = tokio::time::timeout(TEXT_SEARCH_TIMEOUT, self.transport.text_search_raw(&req)).await;
        let result = match first {
            Ok(Ok(places)) => Ok(places),
            // Single outer timeout, one retry on 5xx only (spec.md §4.2).
            Ok(Err(ProviderError::Server { .. })) => {
                match tokio::time::timeout(TEXT_SEARCH_TIMEOUT, self.transport.text_search_raw(&req)).await {
                    Ok(r) => r,
                    Err(_) => Err(ProviderError::Timeout),
                }
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ProviderError::Timeout),
        };

        if let Ok(places) = &result {
            self.text_search_cache.put(key, places.clone());
        }
        result
    }

    /// Geocode: single timeout, no retry — cache absorbs repeat cost
    /// (spec.md §4.2, §5).
    pub async fn geocode(&self, city_text: &str, region_code: &str) -> Result<Coordinate, ProviderError> {
        let key = format!("{city_text}|{region_code}");
        if let Some(cached) = self.geocode_cache.get(&key) {
            return Ok(cached);
        }
        let result = tokio::time::timeout(GEOCODE_TIMEOUT, self.transport.geocode_raw(city_text, region_code))
            .await
            .map_err(|_| ProviderError::Timeout)?;
        if let Ok(coord) = result {
            self.geocode_cache.put(key, coord);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_excludes_assistant_ui_intent_language() {
        let req = TextSearchRequest {
            text_query: "pizza".into(),
            region_code: "IL".into(),
            language_code: "en".into(),
            location_bias: None,
            field_mask: "basic",
        };
        let key = req.cache_key("v1");
        // Only fields named in spec.md §4.2 may appear.
        assert!(key.contains("pizza"));
        assert!(key.contains("en"));
        assert!(key.contains("IL"));
        assert!(key.contains("v1"));
    }

    #[test]
    fn cache_key_identical_for_identical_inputs_regardless_of_assistant_language() {
        let base = TextSearchRequest {
            text_query: "sushi".into(),
            region_code: "FR".into(),
            language_code: "en".into(),
            location_bias: None,
            field_mask: "basic",
        };
        // Same provider-facing fields -> same key, even if the caller's
        // assistant/ui language differed (those never enter this struct).
        let same = TextSearchRequest { ..base.clone_for_test() };
        assert_eq!(base.cache_key("v1"), same.cache_key("v1"));
    }

    impl TextSearchRequest {
        fn clone_for_test(&self) -> Self {
            Self {
                text_query: self.text_query.clone(),
                region_code: self.region_code.clone(),
                language_code: self.language_code.clone(),
                location_bias: self.location_bias.clone(),
                field_mask: self.field_mask,
            }
        }
    }
}
