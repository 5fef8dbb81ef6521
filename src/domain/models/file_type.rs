use serde::{Deserialize, Serialize};

/// One of eight tags assigned to every indexed file, used as the baseline
/// multiplier in ranking (see `domain::services::boosts`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileTypeTag {
    DocumentationPrimary,
    Documentation,
    Example,
    Source,
    SourceInternal,
    Test,
    Config,
    Other,
}

impl FileTypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileTypeTag::DocumentationPrimary => "documentation-primary",
            FileTypeTag::Documentation => "documentation",
            FileTypeTag::Example => "example",
            FileTypeTag::Source => "source",
            FileTypeTag::SourceInternal => "source-internal",
            FileTypeTag::Test => "test",
            FileTypeTag::Config => "config",
            FileTypeTag::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "documentation-primary" => FileTypeTag::DocumentationPrimary,
            "documentation" => FileTypeTag::Documentation,
            "example" => FileTypeTag::Example,
            "source" => FileTypeTag::Source,
            "source-internal" => FileTypeTag::SourceInternal,
            "test" => FileTypeTag::Test,
            "config" => FileTypeTag::Config,
            _ => FileTypeTag::Other,
        }
    }

    /// The baseline ranking multiplier for this tag, before intent
    /// adjustment (§4.4.1).
    pub fn baseline_boost(&self) -> f32 {
        match self {
            FileTypeTag::DocumentationPrimary => 1.8,
            FileTypeTag::Documentation => 1.5,
            FileTypeTag::Example => 1.4,
            FileTypeTag::Source => 1.0,
            FileTypeTag::SourceInternal => 0.75,
            FileTypeTag::Test => 0.7,
            FileTypeTag::Config => 0.5,
            FileTypeTag::Other => 0.5,
        }
    }

    pub fn is_documentation(&self) -> bool {
        matches!(self, FileTypeTag::DocumentationPrimary | FileTypeTag::Documentation)
    }
}

impl std::fmt::Display for FileTypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        for tag in [
            FileTypeTag::DocumentationPrimary,
            FileTypeTag::Documentation,
            FileTypeTag::Example,
            FileTypeTag::Source,
            FileTypeTag::SourceInternal,
            FileTypeTag::Test,
            FileTypeTag::Config,
            FileTypeTag::Other,
        ] {
            assert_eq!(FileTypeTag::parse(tag.as_str()), tag);
        }
    }

    #[test]
    fn baseline_order() {
        assert!(FileTypeTag::DocumentationPrimary.baseline_boost() > FileTypeTag::Documentation.baseline_boost());
        assert!(FileTypeTag::Documentation.baseline_boost() > FileTypeTag::Example.baseline_boost());
        assert!(FileTypeTag::Example.baseline_boost() > FileTypeTag::Source.baseline_boost());
        assert!(FileTypeTag::Source.baseline_boost() > FileTypeTag::SourceInternal.baseline_boost());
        assert!(FileTypeTag::SourceInternal.baseline_boost() > FileTypeTag::Test.baseline_boost());
    }
}
