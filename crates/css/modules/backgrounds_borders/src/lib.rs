//! CSS Backgrounds and Borders Module Level 3 — Shorthand fusion.
//! Spec: <https://www.w3.org/TR/css-backgrounds-3/>
//!
//! Rewrites background values into a compact canonical form and folds
//! complete sets of background, border, border-image and corner-radius
//! longhands into their shorthands without changing the cascade result of a
//! rule.

#![forbid(unsafe_code)]

mod background;
mod border;

pub use background::{BACKGROUND_LONGHANDS, collapse_repeat, normalize_position, optimize_backgrounds};
pub use border::{
    BORDER_DIRECTIONS, BORDER_IMAGE_LONGHANDS, BorderReport, RADIUS_LONGHANDS, optimize_borders,
};
