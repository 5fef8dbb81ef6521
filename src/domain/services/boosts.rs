//! The two context-aware multiplicative boosts applied to a fused RRF score
//! before page-local normalization (§4.4.1).

use crate::domain::{FileTypeTag, Intent};

use super::intent::matching_framework;

/// Additional multiplier layered on top of `FileTypeTag::baseline_boost()`
/// for a given query intent. Only the combinations the spec calls out
/// deviate from 1.0 (no adjustment); every other (intent, tag) pair is
/// neutral.
fn intent_adjustment(intent: Intent, tag: FileTypeTag) -> f32 {
    match (intent, tag) {
        (Intent::HowTo, FileTypeTag::Example) => 1.5,
        (Intent::HowTo, FileTypeTag::SourceInternal) => 0.7,
        (Intent::Implementation, FileTypeTag::Source) => 1.1,
        (Intent::Implementation, FileTypeTag::DocumentationPrimary) => 0.95,
        _ => 1.0,
    }
}

/// `baselineBoost(tag) * intentAdjustment(intent, tag)`.
pub fn file_type_boost(tag: FileTypeTag, intent: Intent) -> f32 {
    tag.baseline_boost() * intent_adjustment(intent, tag)
}

/// ×1.5 if `query` triggers a framework family and `path`/`content` mention
/// one of its keywords, ×0.8 if a family triggers but this result doesn't
/// mention its keywords, or ×1.0 if no framework family is triggered by the
/// query at all.
pub fn framework_boost(query: &str, path: &str, content: &str) -> f32 {
    let Some(family) = matching_framework(query) else {
        return 1.0;
    };
    let haystack_path = path.to_lowercase();
    let haystack_content = content.to_lowercase();
    let mentions = family
        .keywords
        .iter()
        .any(|kw| haystack_path.contains(kw) || haystack_content.contains(kw));
    if mentions {
        1.5
    } else {
        0.8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_ordering_preserved_with_neutral_intent() {
        assert!(
            file_type_boost(FileTypeTag::DocumentationPrimary, Intent::Conceptual)
                > file_type_boost(FileTypeTag::Source, Intent::Conceptual)
        );
    }

    #[test]
    fn how_to_boosts_examples_and_penalizes_internal() {
        let example = file_type_boost(FileTypeTag::Example, Intent::HowTo);
        let baseline_example = FileTypeTag::Example.baseline_boost();
        assert!((example - baseline_example * 1.5).abs() < f32::EPSILON);

        let internal = file_type_boost(FileTypeTag::SourceInternal, Intent::HowTo);
        let baseline_internal = FileTypeTag::SourceInternal.baseline_boost();
        assert!((internal - baseline_internal * 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn implementation_favors_source_over_doc_primary_relatively() {
        let source = file_type_boost(FileTypeTag::Source, Intent::Implementation);
        let doc = file_type_boost(FileTypeTag::DocumentationPrimary, Intent::Implementation);
        assert!((source - FileTypeTag::Source.baseline_boost() * 1.1).abs() < f32::EPSILON);
        assert!((doc - FileTypeTag::DocumentationPrimary.baseline_boost() * 0.95).abs() < f32::EPSILON);
    }

    #[test]
    fn framework_boost_rewards_matching_content() {
        let boost = framework_boost("how does react handle state", "src/react/hooks.ts", "");
        assert_eq!(boost, 1.5);
    }

    #[test]
    fn framework_boost_penalizes_unrelated_result() {
        let boost = framework_boost("how does react handle state", "src/server/db.rs", "no mention here");
        assert_eq!(boost, 0.8);
    }

    #[test]
    fn framework_boost_neutral_when_query_triggers_no_family() {
        let boost = framework_boost("how do caches work", "src/cache.rs", "");
        assert_eq!(boost, 1.0);
    }
}
