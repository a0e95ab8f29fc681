#![cfg(test)]

use core::error::Error;
use css_orchestrator::{CommentRemoval, Options, SafelistEntry, process, process_str};
use css_syntax::{OutputStyle, parse_stylesheet};
use std::fs::write;
use std::path::Path;
use tempfile::TempDir;

fn init_logging() {
    let _ignored = env_logger::builder().is_test(true).try_init();
}

/// Minified options with purging disabled and no charset prefix.
fn plain_options() -> Options {
    let mut options = Options {
        minify: true,
        ..Options::default()
    };
    options.purge.enabled = false;
    options.optimize.charset = false;
    options
}

/// Minified options that purge against the markup found under `root`.
fn purging_options(root: &Path) -> Options {
    let mut options = plain_options();
    options.purge.enabled = true;
    options.purge.root = root.to_path_buf();
    options
}

fn markup_dir(markup: &str) -> Result<TempDir, Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    write(dir.path().join("index.html"), markup)?;
    Ok(dir)
}

#[test]
fn unused_selectors_are_purged_per_layer() -> Result<(), Box<dyn Error>> {
    init_logging();
    let dir = markup_dir("<h1 class=\"xs:fs-1 title\">Hello</h1>")?;
    let css = r"
        @layer base { h1 { margin: 0 } p { margin: 0 } }
        @layer layout.grid { .grid { display: grid } }
        .unlayered { color: red }
        .xs\:fs-1 { font-size: 1rem }
    ";
    let mut document = parse_stylesheet(css);
    let report = process(&mut document, &purging_options(dir.path()));
    assert_eq!(
        document.to_css(OutputStyle::Minified),
        r"@layer base,orphans;@layer base{h1{margin:0}}@layer orphans{.xs\:fs-1{font-size:1rem}}"
    );
    assert_eq!(report.layer_order, vec!["base".to_owned(), "orphans".to_owned()]);
    assert_eq!(report.purge.rules_removed, 3);
    Ok(())
}

#[test]
fn exempt_layers_and_safelist_entries_survive() -> Result<(), Box<dyn Error>> {
    init_logging();
    let dir = markup_dir("<main></main>")?;
    let mut options = purging_options(dir.path());
    options.purge.safelist = vec![
        SafelistEntry::Literal(".keep".to_owned()),
        SafelistEntry::Pattern {
            pattern: r"^\.col-\d+$".to_owned(),
        },
    ];
    let out = process_str(
        "@layer theme { .unused { color: red } } @layer base { .keep, .drop { top: 0 } .col-3 { top: 0 } .col-x { top: 0 } }",
        &options,
    );
    assert_eq!(
        out,
        "@layer theme,base;@layer theme{.unused{color:red}}@layer base{.keep{top:0}.col-3{top:0}}"
    );
    Ok(())
}

#[test]
fn orphans_follow_configured_order() {
    init_logging();
    let mut options = plain_options();
    options.layers.order = vec!["orphans".to_owned(), "base".to_owned()];
    let out = process_str(
        "@layer extra { a { top: 0 } } b { top: 1px } @layer base { c { top: 2px } } @layer extra { d { top: 3px } }",
        &options,
    );
    assert_eq!(
        out,
        "@layer orphans,base,extra;@layer extra{a{top:0}}@layer extra{d{top:3px}}@layer base{c{top:2px}}@layer orphans{b{top:1px}}"
    );
}

#[test]
fn media_blocks_are_merged_inside_layers() {
    init_logging();
    let out = process_str(
        "@layer base { @media print { a { top: 0 } } @media (min-width: 10px) { b { top: 0 } } @media print { c { top: 0 } } @media screen {} }",
        &plain_options(),
    );
    assert_eq!(
        out,
        "@layer base;@layer base{@media (min-width: 10px){b{top:0}}@media print{a{top:0}c{top:0}}}"
    );
}

#[test]
fn longhands_are_fused() {
    init_logging();
    let out = process_str(
        ".hero { background-color: red; background-position: left top; font-size: 12px; font-family: serif; border-width: 1px; border-style: solid; border-color: blue }",
        &plain_options(),
    );
    assert_eq!(
        out,
        "@layer orphans;@layer orphans{.hero{background:red 0% 0%;font:12px serif;border:1px solid blue}}"
    );
}

#[test]
fn fusion_toggles_are_respected() {
    init_logging();
    let mut options = plain_options();
    options.optimize.background = false;
    options.optimize.font = false;
    let css = ".a { background-color: red; background-image: none; font-size: 1px; font-family: serif }";
    assert_eq!(
        process_str(css, &options),
        "@layer orphans;@layer orphans{.a{background-color:red;background-image:none;font-size:1px;font-family:serif}}"
    );
}

#[test]
fn charset_and_comments_are_housekept() {
    init_logging();
    let mut options = plain_options();
    options.optimize.charset = true;
    let css = "@charset \"latin1\"; /*! license */ /* note */ @layer base { /* gone */ a { top: 0 } } /*# sourceMappingURL=site.css.map */";
    assert_eq!(
        process_str(css, &options),
        "@charset \"UTF-8\";@layer base,orphans;@layer base{a{top:0}}@layer orphans{/*! license */}/*# sourceMappingURL=site.css.map */"
    );

    options.optimize.comments = CommentRemoval::All;
    options.optimize.charset = false;
    assert_eq!(
        process_str(css, &options),
        "@layer base;@layer base{a{top:0}}/*# sourceMappingURL=site.css.map */"
    );
}

#[test]
fn pretty_output_uses_tabs() {
    init_logging();
    let mut options = plain_options();
    options.minify = false;
    assert_eq!(
        process_str("@layer base { a { color: red } }", &options),
        "@layer base;\n@layer base {\n\ta {\n\t\tcolor: red;\n\t}\n}"
    );
}

#[test]
fn empty_input_stays_empty() {
    init_logging();
    assert_eq!(process_str("", &plain_options()), "");
    let mut options = plain_options();
    options.optimize.charset = true;
    assert_eq!(process_str("   ", &options), "@charset \"UTF-8\";");
}

#[test]
fn minified_input_survives_the_pipeline() -> Result<(), Box<dyn Error>> {
    init_logging();
    let out = process_str(
        "@layer base{@media (min-width:10px){a{top:0}}@media (max-width:900px){b{top:0}}.c{color:rgb(1,2,3)}}",
        &plain_options(),
    );
    assert_eq!(
        out,
        "@layer base;@layer base{.c{color:rgb(1,2,3)}@media (min-width:10px){a{top:0}}@media (max-width:900px){b{top:0}}}"
    );

    let dir = markup_dir("<a class=\"link\"></a>")?;
    let purged = process_str(
        "@layer base{a:not(.link){top:0}.link[title=\"x,  y\"]{top:0}p:is(.c){top:0}}",
        &purging_options(dir.path()),
    );
    assert_eq!(
        purged,
        "@layer base;@layer base{a:not(.link){top:0}.link[title=\"x,  y\"]{top:0}}"
    );
    Ok(())
}
