//! Web page fetching for Datasynth.
//!
//! [`HttpFetcher`] downloads a page with `reqwest` and hands the body to
//! [`html::extract_page`], a pattern-based stripper that keeps the title and
//! the visible text. No markup tree is built; scripts, styles and tags are
//! removed by substitution.

pub mod html;
pub mod http;

pub use html::extract_page;
pub use http::HttpFetcher;
