//! Pipeline options, loaded from camelCase JSON with a default for every field.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}

/// One user safelist entry: a literal token in prefixed form (`.card`,
/// `#main`, `h1`) or `{ "pattern": "…" }` for a regular expression.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SafelistEntry {
    Literal(String),
    Pattern { pattern: String },
}

/// Which comments the comment pass removes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommentRemoval {
    /// Keep every comment.
    None,
    /// Remove comments that do not start with `!`.
    #[default]
    NonBang,
    /// Remove every comment.
    All,
}

/// Selector purging and safelist resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PurgeOptions {
    pub enabled: bool,
    pub safelist: Vec<SafelistEntry>,
    /// Directory that include paths are resolved against.
    pub root: PathBuf,
    pub include_paths: Vec<PathBuf>,
    /// Path segments (or relative path prefixes) pruned from the scan.
    pub exclude_paths: Vec<String>,
    /// Markup file extensions to scan, without the dot.
    pub source_extensions: Vec<String>,
}

impl Default for PurgeOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            safelist: Vec::new(),
            root: PathBuf::from("."),
            include_paths: vec![PathBuf::from(".")],
            exclude_paths: owned(&[
                ".git",
                ".vscode",
                ".next",
                ".cache",
                ".tmp",
                ".vercel",
                "tmp",
                "test",
                "tests",
                "vendor",
                "node_modules",
            ]),
            source_extensions: owned(&["html", "astro", "jsx", "tsx"]),
        }
    }
}

/// Layer grouping and ordering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayerOptions {
    /// Name of the synthetic layer holding nodes found outside any layer.
    pub orphans_name: String,
    pub order: Vec<String>,
    /// Layers never purged.
    pub exempt: BTreeSet<String>,
}

impl Default for LayerOptions {
    fn default() -> Self {
        Self {
            orphans_name: "orphans".to_owned(),
            order: owned(&[
                "theme",
                "reset",
                "base",
                "layout.containers",
                "layout.grid",
                "layout.flex",
                "layout.shortcuts",
                "shortcuts",
                "orphans",
            ]),
            exempt: owned(&["theme", "reset"]).into_iter().collect(),
        }
    }
}

/// Per-pass toggles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OptimizeOptions {
    pub media_queries: bool,
    pub background: bool,
    pub border: bool,
    pub font: bool,
    pub comments: CommentRemoval,
    /// Prepend `@charset "UTF-8";` to the output.
    pub charset: bool,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            media_queries: true,
            background: true,
            border: true,
            font: true,
            comments: CommentRemoval::NonBang,
            charset: true,
        }
    }
}

/// Every option the pipeline recognizes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Serialize without optional whitespace.
    pub minify: bool,
    pub purge: PurgeOptions,
    pub layers: LayerOptions,
    pub optimize: OptimizeOptions,
}

impl Options {
    /// Parse options from JSON text; missing fields take their defaults.
    ///
    /// # Errors
    /// Returns an error if the text is not valid JSON for these options.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid pipeline options JSON")
    }

    /// Read and parse a JSON options file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or does not parse.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = read_to_string(path)
            .with_context(|| format!("reading options from {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("parsing options in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::write;

    #[test]
    fn empty_object_yields_defaults() {
        let parsed = Options::from_json_str("{}").unwrap_or_else(|_| Options {
            minify: true,
            ..Options::default()
        });
        assert_eq!(parsed, Options::default());
        assert!(parsed.purge.enabled);
        assert_eq!(parsed.layers.orphans_name, "orphans");
        assert_eq!(parsed.optimize.comments, CommentRemoval::NonBang);
        assert!(parsed.layers.exempt.contains("theme"));
    }

    #[test]
    fn partial_options_keep_other_defaults() {
        let parsed = Options::from_json_str(
            r#"{
                "minify": true,
                "purge": { "safelist": ["h1", { "pattern": "^\\.col-" }], "sourceExtensions": ["vue"] },
                "layers": { "orphansName": "medias", "order": ["theme", "medias"] },
                "optimize": { "comments": "all", "charset": false }
            }"#,
        )
        .unwrap_or_default();
        assert!(parsed.minify);
        assert_eq!(
            parsed.purge.safelist,
            vec![
                SafelistEntry::Literal("h1".to_owned()),
                SafelistEntry::Pattern {
                    pattern: "^\\.col-".to_owned()
                },
            ]
        );
        assert_eq!(parsed.purge.source_extensions, vec!["vue".to_owned()]);
        assert_eq!(parsed.purge.include_paths, vec![PathBuf::from(".")]);
        assert_eq!(parsed.layers.orphans_name, "medias");
        assert_eq!(parsed.optimize.comments, CommentRemoval::All);
        assert!(!parsed.optimize.charset);
        assert!(parsed.optimize.media_queries);
    }

    #[test]
    fn invalid_options_are_errors() {
        assert!(matches!(Options::from_json_str(r#"{ "optimize": { "comments": "some" } }"#), Err(_)));
        assert!(matches!(Options::from_path(Path::new("/nonexistent/options.json")), Err(_)));
    }

    #[test]
    fn options_load_from_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("options.json");
        write(&path, r#"{ "purge": { "enabled": false } }"#)?;
        let parsed = Options::from_path(&path)?;
        assert!(!parsed.purge.enabled);
        Ok(())
    }
}
