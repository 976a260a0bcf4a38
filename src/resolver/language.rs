//! C9 — Language-context resolver (spec.md §4.3). A pure function:
//! `resolve({regionCode, uiLanguage, queryLanguage, intentLanguage}) -> LanguageContext`.
//!
//! `searchLanguage` is derived *only* from `regionCode`; `assistantLanguage`
//! is derived independently from model confidence and the UI language, and
//! never feeds back into `searchLanguage` (spec.md §3.4 invariants).

use crate::config::RegionPolicyConfig;
use crate::model::language::{LanguageContext, LanguageContextInvariantViolation, SearchLanguage};

const ASSISTANT_CONFIDENCE_THRESHOLD: f32 = 0.7;
const SUPPORTED_ASSISTANT_LANGUAGES: &[&str] = &["he", "en"];

pub struct LanguageResolverInput<'a> {
    pub region_code: &'a str,
    pub ui_language: Option<&'a str>,
    /// Language the model detected in the user's query, with its confidence.
    pub model_detected_language: Option<&'a str>,
    pub model_confidence: f32,
}

pub fn resolve_language_context(
    input: LanguageResolverInput<'_>,
    region_policy: &RegionPolicyConfig,
) -> Result<LanguageContext, LanguageContextInvariantViolation> {
    let (search_lang_code, search_source) = region_policy.resolve(input.region_code);
    let search_language = if search_lang_code == "he" { SearchLanguage::He } else { SearchLanguage::En };

    let (assistant_language, assistant_source) = resolve_assistant_language(&input);

    LanguageContext::new(search_language, search_source, assistant_language, assistant_source)
}

fn resolve_assistant_language(input: &LanguageResolverInput<'_>) -> (String, &'static str) {
    if let Some(lang) = input.model_detected_language {
        if input.model_confidence >= ASSISTANT_CONFIDENCE_THRESHOLD
            && SUPPORTED_ASSISTANT_LANGUAGES.contains(&lang)
        {
            return (lang.to_string(), "llm_confident");
        }
    }
    if let Some(ui) = input.ui_language {
        if SUPPORTED_ASSISTANT_LANGUAGES.contains(&ui) {
            return (ui.to_string(), "ui_fallback");
        }
    }
    ("en".to_string(), "global_default")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RegionPolicyConfig {
        RegionPolicyConfig::default()
    }

    #[test]
    fn search_language_fixed_by_region_regardless_of_ui_or_query_language() {
        let a = resolve_language_context(
            LanguageResolverInput {
                region_code: "FR",
                ui_language: Some("he"),
                model_detected_language: Some("he"),
                model_confidence: 0.95,
            },
            &policy(),
        )
        .unwrap();
        let b = resolve_language_context(
            LanguageResolverInput {
                region_code: "FR",
                ui_language: Some("en"),
                model_detected_language: None,
                model_confidence: 0.0,
            },
            &policy(),
        )
        .unwrap();
        assert_eq!(a.search_language, b.search_language);
        assert_eq!(a.search_language, SearchLanguage::En);
        assert_ne!(a.assistant_language, b.assistant_language);
    }

    #[test]
    fn low_confidence_falls_back_to_ui_language() {
        let ctx = resolve_language_context(
            LanguageResolverInput {
                region_code: "IL",
                ui_language: Some("en"),
                model_detected_language: Some("he"),
                model_confidence: 0.3,
            },
            &policy(),
        )
        .unwrap();
        assert_eq!(ctx.assistant_language, "en");
    }

    #[test]
    fn no_signal_falls_back_to_global_default_en() {
        let ctx = resolve_language_context(
            LanguageResolverInput {
                region_code: "IL",
                ui_language: None,
                model_detected_language: None,
                model_confidence: 0.0,
            },
            &policy(),
        )
        .unwrap();
        assert_eq!(ctx.assistant_language, "en");
        assert_eq!(ctx.assistant_language_source, "global_default");
    }
}
