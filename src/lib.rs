//! natdoc: metadata and README generation for NatSpec-annotated Solidity starters.
//!
//! The pipeline runs one way: raw doc comments are normalized ([`docblock`]),
//! parsed into tag records ([`parser::tags`]), attached to declarations found
//! in the source ([`parser::extract`]), merged into a [`metadata::Metadata`]
//! record, validated, and rendered ([`render`]). [`pipeline`] sequences these
//! stages over a draft directory and publishes the result into a catalog.

pub mod config;
pub mod docblock;
pub mod metadata;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod toc;
