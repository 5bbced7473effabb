//! Shared domain types: slide indices, decks, and explanation results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 1-based position of a slide in its source deck.
///
/// Indices are assigned once at extraction time and never renumbered. Zero is
/// not a valid index; use [`SlideIndex::new`] to construct one.
///
/// Serializes as a plain number, which `serde_json` renders as a string when
/// the index is used as an object key:
///
/// ```rust
/// use deckexplain_utils::types::{ExplanationResult, SlideIndex};
///
/// let mut result = ExplanationResult::new();
/// result.insert(SlideIndex::new(1).unwrap(), "Welcome".to_string());
/// assert_eq!(serde_json::to_string(&result).unwrap(), r#"{"1":"Welcome"}"#);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SlideIndex(u32);

impl SlideIndex {
    /// Create an index, returning `None` for zero.
    #[must_use]
    pub fn new(index: u32) -> Option<Self> {
        (index > 0).then_some(Self(index))
    }

    /// The raw 1-based value.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for SlideIndex {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "slide index must be 1 or greater".to_string())
    }
}

impl From<SlideIndex> for u32 {
    fn from(index: SlideIndex) -> Self {
        index.0
    }
}

impl fmt::Display for SlideIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered mapping of slide index to the raw text extracted from that slide.
///
/// A deck is read-only input to the explanation pipeline. Slide text may be
/// empty; blank slides are explained with a fixed sentinel rather than a
/// remote call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlideDeck {
    slides: BTreeMap<SlideIndex, String>,
}

impl SlideDeck {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a deck from slide texts in presentation order, numbering them 1..n.
    #[must_use]
    pub fn from_ordered<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let slides = texts
            .into_iter()
            .zip(1u32..)
            .filter_map(|(text, n)| SlideIndex::new(n).map(|idx| (idx, text.into())))
            .collect();
        Self { slides }
    }

    /// Insert or replace the text for `index`.
    pub fn insert(&mut self, index: SlideIndex, text: impl Into<String>) {
        self.slides.insert(index, text.into());
    }

    #[must_use]
    pub fn get(&self, index: SlideIndex) -> Option<&str> {
        self.slides.get(&index).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Iterate slides in index order.
    pub fn iter(&self) -> impl Iterator<Item = (SlideIndex, &str)> {
        self.slides.iter().map(|(idx, text)| (*idx, text.as_str()))
    }

    pub fn indices(&self) -> impl Iterator<Item = SlideIndex> + '_ {
        self.slides.keys().copied()
    }

    /// All slide text concatenated in slide order, each slide followed by a
    /// single space. This is the input for topic resolution.
    #[must_use]
    pub fn full_text(&self) -> String {
        let mut out = String::new();
        for text in self.slides.values() {
            out.push_str(text);
            out.push(' ');
        }
        out
    }
}

impl FromIterator<(SlideIndex, String)> for SlideDeck {
    fn from_iter<T: IntoIterator<Item = (SlideIndex, String)>>(iter: T) -> Self {
        Self {
            slides: iter.into_iter().collect(),
        }
    }
}

/// Mapping of slide index to its explanation, one entry per input slide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExplanationResult {
    explanations: BTreeMap<SlideIndex, String>,
}

impl ExplanationResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an explanation. Returns the previous value if the index was
    /// already present.
    pub fn insert(&mut self, index: SlideIndex, explanation: String) -> Option<String> {
        self.explanations.insert(index, explanation)
    }

    #[must_use]
    pub fn get(&self, index: SlideIndex) -> Option<&str> {
        self.explanations.get(&index).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.explanations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.explanations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlideIndex, &str)> {
        self.explanations
            .iter()
            .map(|(idx, text)| (*idx, text.as_str()))
    }

    /// True when this result has exactly the key set of `deck`.
    #[must_use]
    pub fn covers(&self, deck: &SlideDeck) -> bool {
        self.len() == deck.len() && deck.indices().all(|idx| self.explanations.contains_key(&idx))
    }
}

/// Source of a configuration value, for attribution in `deckexplain config`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Value provided via CLI argument (highest precedence).
    Cli,
    /// Value loaded from configuration file.
    Config,
    /// Value provided programmatically (e.g., `Config::builder()`).
    Programmatic,
    /// Built-in default value (lowest precedence).
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::Config => write!(f, "config"),
            Self::Programmatic => write!(f, "programmatic"),
            Self::Default => write!(f, "default"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(n: u32) -> SlideIndex {
        SlideIndex::new(n).unwrap()
    }

    #[test]
    fn test_slide_index_rejects_zero() {
        assert!(SlideIndex::new(0).is_none());
        assert_eq!(SlideIndex::new(7).map(SlideIndex::get), Some(7));
        assert!(serde_json::from_str::<SlideIndex>("0").is_err());
    }

    #[test]
    fn test_from_ordered_numbers_from_one() {
        let deck = SlideDeck::from_ordered(["Intro", "", "Conclusion"]);
        assert_eq!(deck.len(), 3);
        assert_eq!(deck.get(idx(1)), Some("Intro"));
        assert_eq!(deck.get(idx(2)), Some(""));
        assert_eq!(deck.get(idx(3)), Some("Conclusion"));
    }

    #[test]
    fn test_full_text_appends_space_per_slide() {
        let deck = SlideDeck::from_ordered(["Intro", "", "End"]);
        assert_eq!(deck.full_text(), "Intro  End ");
        assert_eq!(SlideDeck::new().full_text(), "");
    }

    #[test]
    fn test_explanation_result_json_keys_are_strings() {
        let mut result = ExplanationResult::new();
        result.insert(idx(2), "second".to_string());
        result.insert(idx(10), "tenth".to_string());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["2"], "second");
        assert_eq!(json["10"], "tenth");

        let back: ExplanationResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_covers_requires_exact_key_set() {
        let deck = SlideDeck::from_ordered(["a", "b"]);
        let mut result = ExplanationResult::new();
        result.insert(idx(1), "x".to_string());
        assert!(!result.covers(&deck));

        result.insert(idx(2), "y".to_string());
        assert!(result.covers(&deck));

        result.insert(idx(3), "z".to_string());
        assert!(!result.covers(&deck));
    }
}
