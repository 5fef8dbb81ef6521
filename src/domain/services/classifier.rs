use std::path::Path;

use crate::domain::FileTypeTag;

/// Directory segments the walker refuses to descend into; files inside them
/// are never classified (§4.1).
pub const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    ".venv",
    "__pycache__",
    "coverage",
];

const RECOGNIZED_SOURCE_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "mjs", "cjs", "py", "rs", "go", "rb", "java", "c", "cpp", "h", "hpp",
    "php", "kt", "swift", "sh",
];

const DOC_EXTENSIONS: &[&str] = &["md", "mdx", "rst", "txt"];

pub fn is_ignored_path(path: &Path) -> bool {
    path.components().any(|c| {
        let s = c.as_os_str().to_string_lossy();
        IGNORED_DIRS.contains(&s.as_ref())
    })
}

fn path_contains_segment(path: &Path, segment: &str) -> bool {
    path.components()
        .any(|c| c.as_os_str().to_string_lossy() == segment)
}

fn file_name_matches(name: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| glob_match(p, name))
}

/// Minimal `*`-glob matcher sufficient for the fixed name patterns in §4.1
/// (no `?`, no character classes — those never appear in the rule table).
fn glob_match(pattern: &str, name: &str) -> bool {
    let name = name.to_lowercase();
    let pattern = pattern.to_lowercase();
    if let Some(prefix) = pattern.strip_suffix('*') {
        return name.starts_with(prefix);
    }
    if let Some(rest) = pattern.strip_prefix('*') {
        if let Some(mid) = rest.strip_suffix('*') {
            return name.contains(mid);
        }
        return name.ends_with(rest);
    }
    if let Some(idx) = pattern.find('*') {
        let (prefix, rest) = pattern.split_at(idx);
        let suffix = &rest[1..];
        return name.starts_with(prefix) && name.ends_with(suffix) && name.len() >= prefix.len() + suffix.len();
    }
    name == pattern
}

/// Pure function from a path to one of the eight file-type tags (§4.1). The
/// rules are applied in order; the first match wins.
pub fn classify(path: &Path) -> FileTypeTag {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    // 1. README / CHANGELOG / MIGRATION / CONTRIBUTING
    if file_name_matches(
        &file_name,
        &["README.*", "CHANGELOG.*", "MIGRATION.*", "CONTRIBUTING.*"],
    ) {
        return FileTypeTag::DocumentationPrimary;
    }

    // 2. docs/ documentation/ guide/ tutorials/ segments, or doc extensions
    if ["docs", "documentation", "guide", "tutorials"]
        .iter()
        .any(|seg| path_contains_segment(path, seg))
        || DOC_EXTENSIONS.contains(&extension.as_str())
    {
        return FileTypeTag::Documentation;
    }

    // 3. examples/ demo/ samples/
    if ["examples", "demo", "samples"]
        .iter()
        .any(|seg| path_contains_segment(path, seg))
    {
        return FileTypeTag::Example;
    }

    // 4. *.test.* / *.spec.* / __tests__/ / tests/
    if file_name_matches(&file_name, &["*.test.*", "*.spec.*"])
        || path_contains_segment(path, "__tests__")
        || path_contains_segment(path, "tests")
    {
        return FileTypeTag::Test;
    }

    // 5. config files
    if file_name_matches(
        &file_name,
        &[
            "package.json",
            "tsconfig*.json",
            "*.yaml",
            "*.yml",
            "*.toml",
            "Dockerfile",
            ".env*",
        ],
    ) {
        return FileTypeTag::Config;
    }

    // 6. internal/ private/ compiler/ or packages/*/src/ (not an index entrypoint)
    if ["internal", "private", "compiler"]
        .iter()
        .any(|seg| path_contains_segment(path, seg))
        || is_packages_src_non_index(path, &file_name)
    {
        return FileTypeTag::SourceInternal;
    }

    // 7. recognized source extension
    if RECOGNIZED_SOURCE_EXTENSIONS.contains(&extension.as_str()) {
        return FileTypeTag::Source;
    }

    // 8. else
    FileTypeTag::Other
}

fn is_packages_src_non_index(path: &Path, file_name: &str) -> bool {
    let components: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    let Some(pkg_idx) = components.iter().position(|c| c == "packages") else {
        return false;
    };
    let has_src_after = components
        .get(pkg_idx + 1..)
        .map(|rest| rest.iter().any(|c| c == "src"))
        .unwrap_or(false);
    if !has_src_after {
        return false;
    }
    let stem = file_name.split('.').next().unwrap_or(file_name);
    stem != "index"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn readme_is_documentation_primary() {
        assert_eq!(classify(&p("README.md")), FileTypeTag::DocumentationPrimary);
        assert_eq!(classify(&p("CHANGELOG.rst")), FileTypeTag::DocumentationPrimary);
    }

    #[test]
    fn docs_segment_is_documentation() {
        assert_eq!(classify(&p("docs/guide.md")), FileTypeTag::Documentation);
        assert_eq!(classify(&p("notes.txt")), FileTypeTag::Documentation);
    }

    #[test]
    fn examples_segment_is_example() {
        assert_eq!(classify(&p("examples/basic.ts")), FileTypeTag::Example);
    }

    #[test]
    fn test_patterns_are_tagged_test() {
        assert_eq!(classify(&p("src/foo.test.ts")), FileTypeTag::Test);
        assert_eq!(classify(&p("__tests__/foo.ts")), FileTypeTag::Test);
    }

    #[test]
    fn config_file_names() {
        assert_eq!(classify(&p("package.json")), FileTypeTag::Config);
        assert_eq!(classify(&p("tsconfig.base.json")), FileTypeTag::Config);
        assert_eq!(classify(&p("Dockerfile")), FileTypeTag::Config);
        assert_eq!(classify(&p(".env.local")), FileTypeTag::Config);
    }

    #[test]
    fn internal_segment_is_source_internal() {
        assert_eq!(classify(&p("src/internal/runner.ts")), FileTypeTag::SourceInternal);
        assert_eq!(
            classify(&p("packages/foo/src/impl.ts")),
            FileTypeTag::SourceInternal
        );
        assert_eq!(classify(&p("packages/foo/src/index.ts")), FileTypeTag::Source);
    }

    #[test]
    fn recognized_extension_is_source() {
        assert_eq!(classify(&p("src/lib.rs")), FileTypeTag::Source);
        assert_eq!(classify(&p("main.py")), FileTypeTag::Source);
    }

    #[test]
    fn unrecognized_is_other() {
        assert_eq!(classify(&p("data.bin")), FileTypeTag::Other);
    }

    #[test]
    fn rule_order_readme_beats_docs_segment() {
        assert_eq!(classify(&p("docs/README.md")), FileTypeTag::DocumentationPrimary);
    }

    #[test]
    fn ignored_dirs_detected() {
        assert!(is_ignored_path(&p("node_modules/pkg/index.js")));
        assert!(!is_ignored_path(&p("src/index.js")));
    }
}
