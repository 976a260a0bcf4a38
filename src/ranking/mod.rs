//! C11 — Ranking engine (spec.md §4.5). Deterministic, weighted scoring plus
//! a profile-selection LLM call with a GOOGLE order-preserving fallback.

pub mod profile;
pub mod score;

use crate::model::place::Place;
use crate::model::result::DistanceOrigin;
use profile::RankingProfile;
use score::{distance_meters, score_place, ScoreBreakdown};

pub use profile::select_profile;

/// Inputs the scorer needs beyond the place list itself.
pub struct RankingInput<'a> {
    pub places: &'a [Place],
    pub profile: &'a RankingProfile,
    pub distance_origin: DistanceOrigin,
    pub ref_lat_lng: Option<crate::model::request::Coordinate>,
}

pub struct RankedPlace {
    pub place: Place,
    pub breakdown: ScoreBreakdown,
}

/// `rank(places[], profile, refLatLng|null) -> places[]` with a deterministic
/// tie-break on original input index (spec.md §4.5).
pub fn rank(input: RankingInput<'_>) -> Vec<RankedPlace> {
    let max_count = input
        .places
        .iter()
        .filter_map(|p| p.user_rating_count)
        .max()
        .unwrap_or(0);

    let distances: Vec<Option<f64>> = input
        .places
        .iter()
        .map(|p| match (input.distance_origin, input.ref_lat_lng, p.coordinate) {
            (DistanceOrigin::None, _, _) => None,
            (_, Some(origin), Some(coord)) => Some(distance_meters(origin, coord)),
            _ => None,
        })
        .collect();
    let max_meters = distances.iter().flatten().cloned().fold(0.0_f64, f64::max);

    let mut scored: Vec<(usize, RankedPlace)> = input
        .places
        .iter()
        .enumerate()
        .map(|(idx, place)| {
            let breakdown = score_place(place, input.profile, distances[idx], max_meters, max_count);
            (idx, RankedPlace { place: place.clone(), breakdown })
        })
        .collect();

    // Deterministic tie-break: stable sort by score desc, ties keep original
    // (Google) order since `idx` is carried and the sort is stable.
    scored.sort_by(|a, b| {
        b.1.breakdown
            .total
            .partial_cmp(&a.1.breakdown.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    scored.into_iter().map(|(_, ranked)| ranked).collect()
}

/// Top-10 place ids, for the `ranking_input_order`/`ranking_output_order`
/// observability events (spec.md §4.5).
pub fn top_ids(places: &[Place]) -> Vec<String> {
    places.iter().take(10).map(|p| p.id.clone()).collect()
}

pub fn log_ranking_events(
    input_places: &[Place],
    ranked: &[RankedPlace],
    distance_origin: DistanceOrigin,
    ref_lat_lng: Option<crate::model::request::Coordinate>,
    city_text: Option<&str>,
    intent_reason: &str,
) {
    tracing::info!(place_ids = ?top_ids(input_places), "ranking_input_order");
    let output_ids: Vec<&str> = ranked.iter().take(10).map(|r| r.place.id.as_str()).collect();
    tracing::info!(place_ids = ?output_ids, "ranking_output_order");
    tracing::info!(
        origin = ?distance_origin,
        ref_lat_lng = ?ref_lat_lng,
        city_text = ?city_text,
        intent_reason,
        "ranking_distance_origin_selected"
    );
    for r in ranked.iter().take(10) {
        tracing::info!(
            place_id = %r.place.id,
            rating = r.breakdown.rating,
            reviews = r.breakdown.reviews,
            distance = r.breakdown.distance,
            open_boost = r.breakdown.open_boost,
            total = r.breakdown.total,
            "ranking_score_breakdown"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::request::Coordinate;

    fn place(id: &str, rating: Option<f32>, count: Option<u32>, coord: Option<Coordinate>) -> Place {
        Place {
            id: id.into(),
            name: id.into(),
            rating,
            user_rating_count: count,
            address: None,
            types: vec![],
            coordinate: coord,
            price_level: None,
            open_now: None,
        }
    }

    #[test]
    fn ties_break_on_original_input_order() {
        let places = vec![
            place("a", Some(4.0), Some(10), None),
            place("b", Some(4.0), Some(10), None),
        ];
        let profile = RankingProfile::balanced();
        let ranked = rank(RankingInput {
            places: &places,
            profile: &profile,
            distance_origin: DistanceOrigin::None,
            ref_lat_lng: None,
        });
        assert_eq!(ranked[0].place.id, "a");
        assert_eq!(ranked[1].place.id, "b");
    }

    #[test]
    fn none_origin_zeroes_distance_weight_regardless_of_profile() {
        let places = vec![place("a", Some(5.0), Some(100), Some(Coordinate { lat: 0.0, lng: 0.0 }))];
        let profile = RankingProfile::distance_focused();
        let ranked = rank(RankingInput {
            places: &places,
            profile: &profile,
            distance_origin: DistanceOrigin::None,
            ref_lat_lng: Some(Coordinate { lat: 1.0, lng: 1.0 }),
        });
        assert_eq!(ranked[0].breakdown.distance, 0.0);
    }

    #[test]
    fn higher_rating_scores_above_lower_rating_under_quality_profile() {
        let places = vec![
            place("low", Some(3.0), Some(50), None),
            place("high", Some(4.9), Some(50), None),
        ];
        let profile = RankingProfile::quality_focused();
        let ranked = rank(RankingInput {
            places: &places,
            profile: &profile,
            distance_origin: DistanceOrigin::None,
            ref_lat_lng: None,
        });
        assert_eq!(ranked[0].place.id, "high");
    }
}
