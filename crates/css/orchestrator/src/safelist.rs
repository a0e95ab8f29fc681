//! Safelist resolution: scan markup sources for the tags, ids and classes
//! they use and merge them with user entries into an [`AllowList`].

use crate::options::{PurgeOptions, SafelistEntry};
use css_selectors::{AllowList, Matcher};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs::read_to_string;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Extensions that may be scanned; anything else requested is ignored.
pub const ALLOWED_EXTENSIONS: [&str; 8] = ["html", "htm", "astro", "jsx", "tsx", "vue", "svelte", "php"];

static OPEN_TAG: Lazy<Option<Regex>> = Lazy::new(|| compile(r"<([a-zA-Z][a-zA-Z0-9-]*)\b[^>]*>"));
static ID_ATTRIBUTE: Lazy<Option<Regex>> = Lazy::new(|| compile(r#"(?i)\bid\s*=\s*["']([^"']+)["']"#));
static CLASS_ATTRIBUTE: Lazy<Option<Regex>> =
    Lazy::new(|| compile(r#"(?i)\b(?:class|className)\s*=\s*["']([^"']+)["']"#));

/// Compile an extraction pattern; one that fails to compile extracts nothing.
fn compile(source: &str) -> Option<Regex> {
    match Regex::new(source) {
        Ok(regex) => Some(regex),
        Err(err) => {
            log::error!(target: "css_orchestrator", "invalid extraction pattern `{source}`: {err}");
            None
        }
    }
}

/// First capture group of every match of `pattern` in `text`.
fn first_captures<'text>(pattern: &Lazy<Option<Regex>>, text: &'text str) -> Vec<&'text str> {
    pattern.as_ref().map_or_else(Vec::new, |regex| {
        regex
            .captures_iter(text)
            .filter_map(|found| found.get(1))
            .map(|group| group.as_str())
            .collect()
    })
}

/// Trim, strip the leading dot and lowercase each requested extension,
/// warning about and dropping those outside [`ALLOWED_EXTENSIONS`].
pub fn normalize_extensions(requested: &[String]) -> BTreeSet<String> {
    let mut accepted = BTreeSet::new();
    for raw in requested {
        let extension = raw.trim().trim_start_matches('.').to_ascii_lowercase();
        if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            accepted.insert(extension);
        } else {
            log::warn!(target: "css_orchestrator", "Ignoring unsupported source extension `.{extension}`");
        }
    }
    accepted
}

/// Whether `path` (relative to the scan root) is pruned by an exclude entry.
///
/// Entries containing a path separator match as a relative path prefix,
/// other entries match any single path segment.
fn is_excluded(relative: &Path, exclude_paths: &[String]) -> bool {
    exclude_paths.iter().any(|excluded| {
        if excluded.contains(['/', '\\']) {
            relative.starts_with(excluded.trim_start_matches("./"))
        } else {
            relative
                .components()
                .any(|component| matches!(component, Component::Normal(segment) if segment == OsStr::new(excluded)))
        }
    })
}

fn has_extension(path: &Path, extensions: &BTreeSet<String>) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|extension| extensions.contains(&extension.to_ascii_lowercase()))
}

/// Read every matching file under `base`, in file-name order.
fn collect_files(base: &Path, root: &Path, exclude_paths: &[String], extensions: &BTreeSet<String>) -> Vec<String> {
    let mut contents = Vec::new();
    let walker = WalkDir::new(base)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap_or_else(|_| entry.path());
            !is_excluded(relative, exclude_paths)
        });
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!(target: "css_orchestrator", "Skipping unreadable entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() || !has_extension(entry.path(), extensions) {
            continue;
        }
        match read_to_string(entry.path()) {
            Ok(text) => contents.push(text),
            Err(err) => {
                log::warn!(target: "css_orchestrator", "Skipping {}: {err}", entry.path().display());
            }
        }
    }
    contents
}

/// Concatenate the markup sources under `include_paths` (resolved against
/// `root`), newline separated. Returns an empty string when nothing matched.
pub fn resolve_source(
    root: &Path,
    include_paths: &[PathBuf],
    exclude_paths: &[String],
    requested_extensions: &[String],
) -> String {
    let extensions = normalize_extensions(requested_extensions);
    let mut contents: Vec<String> = Vec::new();
    for include in include_paths {
        let base = root.join(include);
        if !base.exists() {
            log::warn!(target: "css_orchestrator", "Include path does not exist: {}", include.display());
            continue;
        }
        contents.extend(collect_files(&base, root, exclude_paths, &extensions));
    }
    let source = contents.join("\n");
    if source.trim().is_empty() {
        log::warn!(target: "css_orchestrator", "No source files matched the given patterns");
    }
    source
}

/// Lowercased names of every opening tag.
pub fn extract_tags(text: &str) -> BTreeSet<String> {
    first_captures(&OPEN_TAG, text)
        .into_iter()
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Whitespace-separated values of one attribute pattern, each prefixed.
fn attribute_tokens(attribute: &Lazy<Option<Regex>>, text: &str, prefix: char) -> BTreeSet<String> {
    first_captures(attribute, text)
        .into_iter()
        .flat_map(str::split_whitespace)
        .map(|token| format!("{prefix}{token}"))
        .collect()
}

/// `#id` for every value of every `id` attribute.
pub fn extract_ids(text: &str) -> BTreeSet<String> {
    attribute_tokens(&ID_ATTRIBUTE, text, '#')
}

/// `.class` for every value of every `class` or `className` attribute.
pub fn extract_classes(text: &str) -> BTreeSet<String> {
    attribute_tokens(&CLASS_ATTRIBUTE, text, '.')
}

/// Merge scanned tokens, user entries and the global set into one allow-list.
///
/// Invalid user patterns are warned about and dropped.
pub fn build_allow_list(source: &str, safelist: &[SafelistEntry]) -> AllowList {
    let mut allow = AllowList::new();
    for token in extract_tags(source)
        .into_iter()
        .chain(extract_ids(source))
        .chain(extract_classes(source))
    {
        allow.insert(Matcher::Literal(token));
    }
    for entry in safelist {
        match entry {
            SafelistEntry::Literal(token) => allow.insert_literal(token),
            SafelistEntry::Pattern { pattern: source_pattern } => match Matcher::pattern(source_pattern) {
                Ok(matcher) => allow.insert(matcher),
                Err(err) => {
                    log::warn!(target: "css_orchestrator", "Dropping invalid safelist pattern `{source_pattern}`: {err}");
                }
            },
        }
    }
    allow
}

/// Scan the configured sources and build the allow-list for a purge run.
pub fn resolve_allow_list(options: &PurgeOptions) -> AllowList {
    let source = resolve_source(
        &options.root,
        &options.include_paths,
        &options.exclude_paths,
        &options.source_extensions,
    );
    let allow = build_allow_list(&source, &options.safelist);
    log::debug!(
        target: "css_orchestrator",
        "allow-list holds {} literal(s) and {} pattern(s)",
        allow.literal_count(),
        allow.pattern_count()
    );
    allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{create_dir_all, write};

    const MARKUP: &str = r#"<main id="app main-1">
  <H1 class="title  big">Hello</H1>
  <Card className='card xs:fs-1' />
  <custom-element></custom-element>
</main>"#;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|item| (*item).to_owned()).collect()
    }

    #[test]
    fn tokens_are_extracted_and_prefixed() {
        assert_eq!(extract_tags(MARKUP), set(&["card", "custom-element", "h1", "main"]));
        assert_eq!(extract_ids(MARKUP), set(&["#app", "#main-1"]));
        assert_eq!(
            extract_classes(MARKUP),
            set(&[".big", ".card", ".title", ".xs:fs-1"])
        );
        assert!(extract_tags("no markup here").is_empty());
    }

    #[test]
    fn extraction_patterns_compile() {
        assert!(OPEN_TAG.is_some());
        assert!(ID_ATTRIBUTE.is_some());
        assert!(CLASS_ATTRIBUTE.is_some());
    }

    #[test]
    fn extensions_are_normalized() {
        let requested = vec![" .HTML".to_owned(), "tsx".to_owned(), "exe".to_owned()];
        assert_eq!(normalize_extensions(&requested), set(&["html", "tsx"]));
    }

    #[test]
    fn exclusions_match_segments_or_prefixes() {
        let excludes = vec!["node_modules".to_owned(), "docs/drafts".to_owned()];
        assert!(is_excluded(Path::new("a/node_modules/x.html"), &excludes));
        assert!(is_excluded(Path::new("docs/drafts/x.html"), &excludes));
        assert!(!is_excluded(Path::new("docs/final/x.html"), &excludes));
        assert!(!is_excluded(Path::new("node_modules_extra/x.html"), &excludes));
    }

    #[test]
    fn allow_list_merges_user_entries() {
        let safelist = vec![
            SafelistEntry::Literal("#not-included".to_owned()),
            SafelistEntry::Pattern {
                pattern: r"^\.col-\d+$".to_owned(),
            },
            SafelistEntry::Pattern {
                pattern: "(".to_owned(),
            },
        ];
        let allow = build_allow_list(MARKUP, &safelist);
        assert!(allow.matches("h1"));
        assert!(allow.matches(".xs:fs-1"));
        assert!(allow.matches("#not-included"));
        assert!(allow.matches(".col-12"));
        assert!(allow.matches("body"));
        assert!(!allow.matches("p"));
        assert_eq!(allow.pattern_count(), 1);
    }

    #[test]
    fn sources_are_scanned_from_disk() -> Result<(), std::io::Error> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        create_dir_all(root.join("src/components"))?;
        create_dir_all(root.join("node_modules/pkg"))?;
        write(root.join("src/index.html"), "<section class=\"hero\"></section>")?;
        write(root.join("src/components/nav.JSX"), "<nav className=\"menu\" />")?;
        write(root.join("src/notes.txt"), "<article class=\"ignored\">")?;
        write(root.join("node_modules/pkg/index.html"), "<aside class=\"vendor\">")?;

        let source = resolve_source(
            root,
            &[PathBuf::from("src"), PathBuf::from("missing")],
            &["node_modules".to_owned()],
            &["html".to_owned(), "jsx".to_owned()],
        );
        assert_eq!(extract_classes(&source), set(&[".hero", ".menu"]));
        assert_eq!(extract_tags(&source), set(&["nav", "section"]));

        let everything = resolve_source(root, &[PathBuf::from(".")], &[], &["html".to_owned()]);
        assert!(extract_classes(&everything).contains(".vendor"));
        Ok(())
    }

    #[test]
    fn empty_scan_yields_empty_source() -> Result<(), std::io::Error> {
        let dir = tempfile::tempdir()?;
        let source = resolve_source(dir.path(), &[PathBuf::from(".")], &[], &["html".to_owned()]);
        assert!(source.is_empty());
        Ok(())
    }
}
