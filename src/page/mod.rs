// src/page/mod.rs
// =============================================================================
// This module handles downloading the page under analysis.
// =============================================================================

mod fetch;

pub use fetch::PageFetcher;
