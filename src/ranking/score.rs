//! Per-place scoring (spec.md §4.5): four normalized signals combined by a
//! profile's weights.

use super::profile::RankingProfile;
use crate::model::place::Place;
use crate::model::request::Coordinate;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
const OPEN_BOOST: f64 = 0.1;

#[derive(Debug, Clone, Copy)]
pub struct ScoreBreakdown {
    pub rating: f64,
    pub reviews: f64,
    pub distance: f64,
    pub open_boost: f64,
    pub total: f64,
}

pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

pub fn score_place(
    place: &Place,
    profile: &RankingProfile,
    distance_to_ref: Option<f64>,
    max_meters: f64,
    max_review_count: u32,
) -> ScoreBreakdown {
    let rating = place.rating.map(|r| (r as f64 / 5.0).clamp(0.0, 1.0)).unwrap_or(0.0);

    let reviews = match place.user_rating_count {
        Some(count) if max_review_count > 0 => {
            (((1 + count) as f64).log10() / ((1 + max_review_count) as f64).log10()).clamp(0.0, 1.0)
        }
        _ => 0.0,
    };

    let distance = match distance_to_ref {
        Some(meters) if max_meters > 0.0 => (1.0 - meters / max_meters).max(0.0),
        _ => 0.0,
    };

    let open_boost = if place.open_now == Some(true) { OPEN_BOOST } else { 0.0 };

    let total = profile.rating * rating
        + profile.reviews * reviews
        + profile.distance * distance
        + profile.open_boost * (open_boost / OPEN_BOOST).min(1.0);

    ScoreBreakdown { rating, reviews, distance, open_boost, total }
}
