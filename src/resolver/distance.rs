//! C10 — Distance-origin resolver (spec.md §4.4). Priority order:
//! 1. Explicit city mention + successful geocode of that city -> CITY_CENTER
//! 2. User location present -> USER_LOCATION
//! 3. Otherwise -> NONE
//!
//! Step 1 takes priority over step 2 even when a user location is also
//! present — an explicitly named city always wins once it geocodes.

use crate::model::intent::IntentDecision;
use crate::model::request::Coordinate;
use crate::model::result::DistanceOrigin;
use crate::provider::PlaceProvider;

#[derive(Debug, Clone)]
pub struct DistanceOriginDecision {
    pub origin: DistanceOrigin,
    pub reference: Option<Coordinate>,
    pub city_text: Option<String>,
}

pub async fn resolve_distance_origin(
    intent: &IntentDecision,
    user_location: Option<Coordinate>,
    region_code: &str,
    place_provider: &PlaceProvider,
) -> DistanceOriginDecision {
    if intent.is_explicit_city() {
        let city_text = intent.city_text.clone().expect("is_explicit_city guarantees Some");
        if let Ok(center) = place_provider.geocode(&city_text, region_code).await {
            return DistanceOriginDecision {
                origin: DistanceOrigin::CityCenter,
                reference: Some(center),
                city_text: Some(city_text),
            };
        }
        // Geocode failed: fall through to the next priority tier rather than
        // surface a distance anchor we couldn't resolve.
    }

    if let Some(loc) = user_location {
        return DistanceOriginDecision { origin: DistanceOrigin::UserLocation, reference: Some(loc), city_text: None };
    }

    DistanceOriginDecision { origin: DistanceOrigin::None, reference: None, city_text: None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ProviderError, PlaceProviderTransport, TextSearchRequest};
    use crate::model::place::Place;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FakeTransport {
        geocode_calls: AtomicUsize,
        geocode_result: Result<Coordinate, ProviderError>,
    }

    #[async_trait]
    impl PlaceProviderTransport for FakeTransport {
        async fn text_search_raw(&self, _req: &TextSearchRequest) -> Result<Vec<Place>, ProviderError> {
            Ok(vec![])
        }

        async fn geocode_raw(&self, _city_text: &str, _region_code: &str) -> Result<Coordinate, ProviderError> {
            self.geocode_calls.fetch_add(1, Ordering::SeqCst);
            match &self.geocode_result {
                Ok(c) => Ok(*c),
                Err(ProviderError::Timeout) => Err(ProviderError::Timeout),
                Err(ProviderError::Server { status }) => Err(ProviderError::Server { status: *status }),
                Err(ProviderError::Client { status }) => Err(ProviderError::Client { status: *status }),
            }
        }
    }

    fn provider_with(geocode_result: Result<Coordinate, ProviderError>) -> PlaceProvider {
        let transport = Box::new(FakeTransport { geocode_calls: AtomicUsize::new(0), geocode_result });
        PlaceProvider::new(transport, Duration::from_secs(3600), "v1")
    }

    #[tokio::test]
    async fn explicit_city_wins_over_user_location_when_geocode_succeeds() {
        let provider = provider_with(Ok(Coordinate { lat: 48.85, lng: 2.35 }));
        let intent = IntentDecision {
            reason: IntentDecision::EXPLICIT_CITY_MENTIONED.into(),
            city_text: Some("Paris".into()),
            blocks_search: false,
        };
        let decision = resolve_distance_origin(
            &intent,
            Some(Coordinate { lat: 1.0, lng: 1.0 }),
            "FR",
            &provider,
        )
        .await;
        assert_eq!(decision.origin, DistanceOrigin::CityCenter);
        assert_eq!(decision.reference, Some(Coordinate { lat: 48.85, lng: 2.35 }));
    }

    #[tokio::test]
    async fn falls_back_to_user_location_when_geocode_fails() {
        let provider = provider_with(Err(ProviderError::Timeout));
        let intent = IntentDecision {
            reason: IntentDecision::EXPLICIT_CITY_MENTIONED.into(),
            city_text: Some("Nowhere".into()),
            blocks_search: false,
        };
        let user_loc = Coordinate { lat: 2.0, lng: 2.0 };
        let decision = resolve_distance_origin(&intent, Some(user_loc), "FR", &provider).await;
        assert_eq!(decision.origin, DistanceOrigin::UserLocation);
        assert_eq!(decision.reference, Some(user_loc));
    }

    #[tokio::test]
    async fn no_city_and_no_user_location_is_none() {
        let provider = provider_with(Ok(Coordinate { lat: 0.0, lng: 0.0 }));
        let intent = IntentDecision {
            reason: IntentDecision::DEFAULT_TEXTSEARCH.into(),
            city_text: None,
            blocks_search: false,
        };
        let decision = resolve_distance_origin(&intent, None, "FR", &provider).await;
        assert_eq!(decision.origin, DistanceOrigin::None);
        assert!(decision.reference.is_none());
    }
}
