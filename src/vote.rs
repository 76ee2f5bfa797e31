//! Code extraction and majority voting
//!
//! A candidate only counts when the OCR text starts with six ASCII digits.
//! The tally keeps codes in the order they were first seen so ties resolve
//! to the earliest variant.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Number of digits in a captcha code
pub const CODE_LEN: usize = 6;

static CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^[0-9]{{{}}}", CODE_LEN)).expect("static regex"));

/// Six ASCII digits read from the start of an OCR result
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Code(String);

impl Code {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Take the leading six-digit run of `text`, if there is one
///
/// Anything after the sixth digit is ignored, so `"1234567"` and
/// `"123456abc"` both yield `123456`.
pub fn extract_code(text: &str) -> Option<Code> {
    CODE_RE.find(text).map(|m| Code(m.as_str().to_string()))
}

/// One row of the tally
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TallyEntry {
    pub code: Code,
    pub votes: u32,
}

/// Vote counts per code, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VoteTally {
    entries: Vec<TallyEntry>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one vote for `code`
    pub fn record(&mut self, code: Code) {
        match self.entries.iter_mut().find(|e| e.code == code) {
            Some(entry) => entry.votes += 1,
            None => self.entries.push(TallyEntry { code, votes: 1 }),
        }
    }

    /// Extract a code from raw OCR text and count it
    ///
    /// Returns the code that was counted, or `None` for a miss.
    pub fn record_text(&mut self, text: &str) -> Option<Code> {
        let code = extract_code(text)?;
        self.record(code.clone());
        Some(code)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[TallyEntry] {
        &self.entries
    }

    #[cfg(test)]
    pub fn votes_for(&self, code: &str) -> u32 {
        self.entries
            .iter()
            .find(|e| e.code.as_str() == code)
            .map_or(0, |e| e.votes)
    }

    /// The code with the most votes; ties go to the first code seen
    pub fn winner(&self) -> Option<&TallyEntry> {
        self.entries
            .iter()
            .fold(None, |best: Option<&TallyEntry>, entry| match best {
                Some(b) if b.votes >= entry.votes => Some(b),
                _ => Some(entry),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally_of(outputs: &[&str]) -> VoteTally {
        let mut tally = VoteTally::new();
        for text in outputs {
            tally.record_text(text);
        }
        tally
    }

    #[test]
    fn test_extract_exact_code() {
        assert_eq!(extract_code("123456").unwrap().as_str(), "123456");
    }

    #[test]
    fn test_extract_ignores_trailing_characters() {
        assert_eq!(extract_code("123456abc").unwrap().as_str(), "123456");
        assert_eq!(extract_code("1234567").unwrap().as_str(), "123456");
        assert_eq!(extract_code("123456\n").unwrap().as_str(), "123456");
    }

    #[test]
    fn test_extract_rejects_short_runs() {
        assert!(extract_code("12345").is_none());
        assert!(extract_code("12345a6").is_none());
        assert!(extract_code("").is_none());
    }

    #[test]
    fn test_extract_is_anchored_at_start() {
        assert!(extract_code("a123456").is_none());
        assert!(extract_code(" 123456").is_none());
        assert!(extract_code("\n123456").is_none());
    }

    #[test]
    fn test_extract_rejects_non_ascii_digits() {
        // Arabic-Indic digits are \d in Unicode but not valid code characters
        assert!(extract_code("١٢٣٤٥٦").is_none());
    }

    #[test]
    fn test_majority_wins() {
        let tally = tally_of(&["123456", "123456", "654321", "12", "123456"]);
        let winner = tally.winner().unwrap();

        assert_eq!(winner.code.as_str(), "123456");
        assert_eq!(winner.votes, 3);
        assert_eq!(tally.votes_for("654321"), 1);
        assert_eq!(tally.entries().len(), 2);
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let tally = tally_of(&["111111", "222222"]);
        assert_eq!(tally.winner().unwrap().code.as_str(), "111111");

        let tally = tally_of(&["222222", "111111"]);
        assert_eq!(tally.winner().unwrap().code.as_str(), "222222");
    }

    #[test]
    fn test_tie_uses_first_seen_not_first_to_reach_count() {
        // 222222 reaches two votes first, but 111111 entered the tally first
        let tally = tally_of(&["111111", "222222", "222222", "111111"]);
        assert_eq!(tally.winner().unwrap().code.as_str(), "111111");
    }

    #[test]
    fn test_strictly_higher_count_beats_earlier_entry() {
        let tally = tally_of(&["111111", "222222", "222222"]);
        let winner = tally.winner().unwrap();
        assert_eq!(winner.code.as_str(), "222222");
        assert_eq!(winner.votes, 2);
    }

    #[test]
    fn test_empty_tally_has_no_winner() {
        let tally = tally_of(&["", "abc", "12 34 56"]);
        assert!(tally.is_empty());
        assert!(tally.winner().is_none());
    }

    #[test]
    fn test_record_text_reports_counted_code() {
        let mut tally = VoteTally::new();
        assert_eq!(tally.record_text("987654x").unwrap().as_str(), "987654");
        assert!(tally.record_text("98765").is_none());
        assert_eq!(tally.votes_for("987654"), 1);
    }
}
