//! Stylesheet post-processing pipeline.
//!
//! Ties the per-module passes together: layers are regrouped and ordered,
//! each layer is purged against the markup-derived allow-list, its `@media`
//! blocks are merged and sorted, and longhand declarations are fused into
//! shorthands.

#![forbid(unsafe_code)]

pub mod housekeeping;
pub mod options;
pub mod safelist;

pub use options::{CommentRemoval, LayerOptions, OptimizeOptions, Options, PurgeOptions, SafelistEntry};

use css_backgrounds_borders::{BorderReport, optimize_backgrounds, optimize_borders};
use css_cascade::{LayerPlan, organize_layers};
use css_fonts::optimize_fonts;
use css_media_queries::{MediaReport, normalize_layer};
use css_selectors::{AllowList, PurgeReport, purge_nodes};
use css_syntax::{Document, LayerBlock, OutputStyle, parse_stylesheet};
use tracing::debug_span;

/// Summary of one pipeline run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Names written to the `@layer` ordering statement.
    pub layer_order: Vec<String>,
    pub purge: PurgeReport,
    pub media: MediaReport,
    pub backgrounds: usize,
    pub borders: BorderReport,
    pub fonts: usize,
    pub charsets_removed: usize,
}

/// Run every per-layer pass on one block.
fn process_layer(
    name: &str,
    block: &mut LayerBlock,
    allow: Option<&AllowList>,
    options: &Options,
    report: &mut ProcessReport,
) {
    let _span = debug_span!("layer", layer = name).entered();
    let optimize = &options.optimize;

    if let Some(allow) = allow {
        if options.layers.exempt.contains(name) {
            log::debug!(target: "css_orchestrator", "layer `{name}` is exempt from purging");
        } else {
            report.purge.merge(purge_nodes(&mut block.children, allow));
        }
    }
    if optimize.media_queries {
        let media = normalize_layer(block);
        report.media.emptied = report.media.emptied.saturating_add(media.emptied);
        report.media.merged = report.media.merged.saturating_add(media.merged);
    }
    housekeeping::remove_comments(&mut block.children, optimize.comments);
    if optimize.background {
        report.backgrounds = report
            .backgrounds
            .saturating_add(optimize_backgrounds(&mut block.children));
    }
    if optimize.border {
        let borders = optimize_borders(&mut block.children);
        report.borders.sides = report.borders.sides.saturating_add(borders.sides);
        report.borders.images = report.borders.images.saturating_add(borders.images);
        report.borders.radii = report.borders.radii.saturating_add(borders.radii);
    }
    if optimize.font {
        report.fonts = report.fonts.saturating_add(optimize_fonts(&mut block.children));
    }
}

/// Run the whole pipeline over `document` in place.
///
/// No pass fails; anomalies such as unparsable selectors or unreadable
/// sources are logged and the affected input is left as it was.
pub fn process(document: &mut Document, options: &Options) -> ProcessReport {
    let _span = debug_span!("process").entered();
    let mut report = ProcessReport {
        charsets_removed: housekeeping::strip_charsets(&mut document.nodes),
        ..ProcessReport::default()
    };

    let allow = options
        .purge
        .enabled
        .then(|| safelist::resolve_allow_list(&options.purge));

    let plan = LayerPlan {
        orphans_name: &options.layers.orphans_name,
        order: &options.layers.order,
    };
    let layer_order = organize_layers(document, plan, |name, block| {
        process_layer(name, block, allow.as_ref(), options, &mut report);
    });
    report.layer_order = layer_order;

    housekeeping::remove_root_comments(document, options.optimize.comments);
    if options.optimize.charset {
        housekeeping::prepend_charset(document);
    }

    log::debug!(
        target: "css_orchestrator",
        "layers {:?}: removed {} rule(s) and {} branch(es), fused {} background(s), {} font(s)",
        report.layer_order,
        report.purge.rules_removed,
        report.purge.branches_removed,
        report.backgrounds,
        report.fonts
    );
    report
}

/// Parse, process and serialize a stylesheet.
///
/// Output is minified when `options.minify` is set.
pub fn process_str(css: &str, options: &Options) -> String {
    let mut document = parse_stylesheet(css);
    process(&mut document, options);
    let style = if options.minify {
        OutputStyle::Minified
    } else {
        OutputStyle::Pretty
    };
    document.to_css(style)
}
