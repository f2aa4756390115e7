//! Parser module: tag parsing and declaration extraction.
//!
//! [`extract_entities`] is the only entry point downstream stages use, so the
//! regex-based extractor can be swapped for a real grammar without touching
//! metadata synthesis or rendering.

pub mod extract;
pub mod mask;
pub mod params;
pub mod tags;

pub use extract::extract_entities;
pub use tags::parse_tags;
