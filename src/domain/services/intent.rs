//! Query intent classification via ordered regex families (§4.4.1).
//! Families are tried in the order implementation → debugging → comparison
//! → how-to → conceptual because several patterns overlap (e.g. a debugging
//! question can also read like a how-to one) and the spec fixes this order
//! to make classification deterministic.

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};

use crate::domain::Intent;

struct Family {
    intent: Intent,
    set: RegexSet,
}

static IMPLEMENTATION: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)how (does|is) .* (implemented|work internally)",
        r"(?i)internal(ly)?",
        r"(?i)source code",
        r"(?i)under the hood",
    ])
    .unwrap()
});

static DEBUGGING: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)\b(error|bug|issue|problem|crash|broken)\b",
        r"(?i)why (is|does|doesn't)",
        r"(?i)how do i (fix|debug|solve)",
    ])
    .unwrap()
});

static COMPARISON: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)\b(vs\.?|versus)\b",
        r"(?i)difference(s)? between",
        r"(?i)compare",
        r"(?i)which (one|is better)",
    ])
    .unwrap()
});

static HOW_TO: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)how (do|can|should) (i|you|we)",
        r"(?i)how to\b",
        r"(?i)i (need|want) to",
    ])
    .unwrap()
});

static CONCEPTUAL: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([r"(?i)what (is|are)", r"(?i)explain", r"(?i)how does .* work"]).unwrap()
});

fn families() -> [Family; 5] {
    [
        Family { intent: Intent::Implementation, set: IMPLEMENTATION.clone() },
        Family { intent: Intent::Debugging, set: DEBUGGING.clone() },
        Family { intent: Intent::Comparison, set: COMPARISON.clone() },
        Family { intent: Intent::HowTo, set: HOW_TO.clone() },
        Family { intent: Intent::Conceptual, set: CONCEPTUAL.clone() },
    ]
}

/// Classifies `query` into one of the five intents. Defaults to `HowTo` when
/// no family matches, per §4.4.1.
pub fn classify(query: &str) -> Intent {
    for family in families() {
        if family.set.is_match(query) {
            return family.intent;
        }
    }
    Intent::HowTo
}

/// A single `(regex -> keyword set)` framework family (§4.4.1). Exposed so
/// `boosts::framework_boost` can both detect the matching family and test
/// candidate content/paths against its keyword set.
pub struct FrameworkFamily {
    pub trigger: &'static Regex,
    pub keywords: &'static [&'static str],
}

static REACT_TRIGGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\breact\b").unwrap());
static VUE_TRIGGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bvue\b").unwrap());
static ANGULAR_TRIGGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bangular\b").unwrap());
static NODE_TRIGGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bnode(\.js)?\b").unwrap());

const REACT_KEYWORDS: &[&str] = &["react", "reactjs", "react.js"];
const VUE_KEYWORDS: &[&str] = &["vue", "vuejs", "vue.js"];
const ANGULAR_KEYWORDS: &[&str] = &["angular", "angularjs", "@angular"];
const NODE_KEYWORDS: &[&str] = &["node", "nodejs", "node.js"];

/// Returns the first framework family (in this fixed order) whose trigger
/// regex matches `query`, or `None` if none do. "First to match" is the
/// iteration order below, matching §4.4.1's "at most one framework family
/// applies per query".
pub fn matching_framework(query: &str) -> Option<FrameworkFamily> {
    let families: [FrameworkFamily; 4] = [
        FrameworkFamily { trigger: &REACT_TRIGGER, keywords: REACT_KEYWORDS },
        FrameworkFamily { trigger: &VUE_TRIGGER, keywords: VUE_KEYWORDS },
        FrameworkFamily { trigger: &ANGULAR_TRIGGER, keywords: ANGULAR_KEYWORDS },
        FrameworkFamily { trigger: &NODE_TRIGGER, keywords: NODE_KEYWORDS },
    ];
    families.into_iter().find(|f| f.trigger.is_match(query))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implementation_beats_howto_when_both_could_match() {
        assert_eq!(classify("how is the cache implemented internally"), Intent::Implementation);
    }

    #[test]
    fn debugging_detected() {
        assert_eq!(classify("why does this crash on startup"), Intent::Debugging);
        assert_eq!(classify("how do i fix this error"), Intent::Debugging);
    }

    #[test]
    fn comparison_detected() {
        assert_eq!(classify("react vs vue for this project"), Intent::Comparison);
    }

    #[test]
    fn how_to_detected() {
        assert_eq!(classify("how do I add a new route"), Intent::HowTo);
    }

    #[test]
    fn conceptual_detected() {
        assert_eq!(classify("what is a reducer"), Intent::Conceptual);
    }

    #[test]
    fn default_is_how_to() {
        assert_eq!(classify("some query with no matching pattern"), Intent::HowTo);
    }

    #[test]
    fn framework_family_first_match_wins() {
        let family = matching_framework("how does react compare to vue").unwrap();
        assert_eq!(family.keywords, REACT_KEYWORDS);
    }

    #[test]
    fn no_framework_family_matches() {
        assert!(matching_framework("how do caches work").is_none());
    }
}
