// src/checker/mod.rs
// =============================================================================
// This module contains the page and link analysis logic.
//
// Submodules:
// - html: Pulls features (version, title, headings, links, login form) out
//         of an HTML document and classifies links as internal/external
// - http: Probes a single link with HEAD, falling back to GET
// - pool: Runs the prober over every link with a bounded worker pool
// - aggregate: Folds probe results into link counts
//
// This file (mod.rs) is the module root - it re-exports the public API.
// =============================================================================

mod aggregate;
mod html;
mod http;
mod pool;

pub use aggregate::LinkTally;
pub use html::{
    classify_link, count_headings, detect_version, extract_features, extract_links,
    extract_title, has_login_form, LinkScope, PageFeatures,
};
pub use http::{is_skipped, resolve_link, HttpProber, LinkProber};
pub use pool::{pool_size, LinkChecker};
