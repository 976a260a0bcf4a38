pub mod distance;
pub mod language;

pub use distance::{resolve_distance_origin, DistanceOriginDecision};
pub use language::{resolve_language_context, LanguageResolverInput};
