//! PPTX (Office Open XML) slide text extraction.
//!
//! A .pptx file is a ZIP archive of XML parts. [`PptxExtractor`] reads the
//! slide parts in presentation order and produces a
//! [`SlideDeck`](deckexplain_utils::types::SlideDeck).

pub mod parser;

#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;

pub use parser::PptxExtractor;
