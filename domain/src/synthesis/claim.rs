//! Claim extraction: sentence segmentation, tokenization and polarity.

use serde::{Deserialize, Serialize};

/// Function words dropped before comparison. Negation words are deliberately
/// absent: they carry polarity.
const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "also", "and", "any", "are", "because", "been", "before",
    "being", "below", "both", "but", "can", "could", "did", "does", "doing", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "her", "here", "hers", "him", "his", "how",
    "into", "its", "itself", "just", "may", "might", "more", "most", "must", "our", "ours", "out",
    "over", "own", "same", "she", "should", "some", "such", "than", "that", "the", "their",
    "theirs", "them", "then", "there", "these", "they", "this", "those", "through", "too",
    "under", "until", "very", "was", "were", "what", "when", "where", "which", "while", "who",
    "whom", "why", "will", "with", "would", "you", "your", "yours",
];

/// Tokens (after stripping non-alphanumerics) that negate a sentence.
const NEGATION_TOKENS: &[&str] = &[
    "no", "not", "never", "none", "nor", "neither", "cannot", "cant", "dont", "doesnt", "didnt",
    "shouldnt", "wont", "wouldnt", "mustnt", "isnt", "arent", "wasnt", "werent",
];

/// Stance of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn is_negative(&self) -> bool {
        matches!(self, Polarity::Negative)
    }
}

/// An atomic proposition extracted from one sentence of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    raw_text: String,
    tokens: Vec<String>,
    polarity: Polarity,
}

impl Claim {
    /// Build a claim from a sentence. Returns `None` when no content token
    /// survives filtering.
    pub fn from_sentence(sentence: &str, min_token_len: usize) -> Option<Self> {
        let raw_text = sentence.trim();
        let mut tokens = tokenize(raw_text, min_token_len);
        if tokens.is_empty() {
            return None;
        }
        tokens.sort();
        tokens.dedup();

        let polarity = if has_negation(raw_text) {
            Polarity::Negative
        } else {
            Polarity::Positive
        };

        Some(Self {
            raw_text: raw_text.to_string(),
            tokens,
            polarity,
        })
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Sorted, deduplicated content tokens.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Identity used for cross-source agreement.
    pub fn key(&self) -> String {
        self.tokens.join(" ")
    }

    /// Tokens present in both claims, in sorted order.
    pub fn shared_tokens<'a>(&'a self, other: &Claim) -> Vec<&'a str> {
        let mut shared = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.tokens.len() && j < other.tokens.len() {
            match self.tokens[i].cmp(&other.tokens[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    shared.push(self.tokens[i].as_str());
                    i += 1;
                    j += 1;
                }
            }
        }
        shared
    }

    /// `|shared| / min(|self|, |other|)`.
    pub fn overlap_ratio(&self, other: &Claim) -> f64 {
        let smaller = self.tokens.len().min(other.tokens.len());
        if smaller == 0 {
            return 0.0;
        }
        self.shared_tokens(other).len() as f64 / smaller as f64
    }
}

/// Split a response into at most `max_units` sentence-like units.
///
/// Blank lines, bullet markers and headings start a new unit; inside a unit,
/// sentence-ending punctuation followed by whitespace splits further.
pub fn segment(text: &str, max_units: usize) -> Vec<String> {
    let mut blocks: Vec<String> = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            flush(&mut blocks, &mut current);
            continue;
        }
        if let Some(rest) = strip_list_marker(trimmed) {
            flush(&mut blocks, &mut current);
            current.push_str(rest.trim());
            continue;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(trimmed);
    }
    flush(&mut blocks, &mut current);

    blocks
        .iter()
        .flat_map(|block| split_sentences(block))
        .filter(|s| !s.is_empty())
        .take(max_units)
        .collect()
}

/// Lowercased alphanumeric tokens of at least `min_len` characters that are
/// not stop words.
pub fn tokenize(text: &str, min_len: usize) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c == '/')
        .map(normalize_word)
        .filter(|t| t.chars().count() >= min_len && !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

fn normalize_word(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn has_negation(raw: &str) -> bool {
    raw.split(|c: char| c.is_whitespace() || c == '/')
        .map(normalize_word)
        .any(|w| NEGATION_TOKENS.contains(&w.as_str()))
}

fn flush(blocks: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        blocks.push(std::mem::take(current));
    }
}

/// Returns the remainder of the line if it starts with a bullet, an ordered
/// list marker or a markdown heading.
fn strip_list_marker(line: &str) -> Option<&str> {
    for marker in ["- ", "* ", "+ ", "• "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some(rest);
        }
    }

    if line.starts_with('#') {
        let rest = line.trim_start_matches('#');
        if rest.starts_with(' ') {
            return Some(rest);
        }
    }

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        for marker in [". ", ") "] {
            if let Some(rest) = rest.strip_prefix(marker) {
                return Some(rest);
            }
        }
    }

    None
}

fn split_sentences(block: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = block.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let at_boundary = match chars.peek() {
            None => true,
            Some((_, next)) => next.is_whitespace(),
        };
        if at_boundary {
            let end = idx + c.len_utf8();
            let sentence = block[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = end;
        }
    }

    let tail = block[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_on_punctuation() {
        let units = segment("Use Rust. It is fast! Is it safe? Yes", 12);
        assert_eq!(units, vec!["Use Rust.", "It is fast!", "Is it safe?", "Yes"]);
    }

    #[test]
    fn test_segment_keeps_decimals_together() {
        let units = segment("Version 3.5 is stable. Upgrade soon.", 12);
        assert_eq!(units, vec!["Version 3.5 is stable.", "Upgrade soon."]);
    }

    #[test]
    fn test_segment_bullets_and_blank_lines() {
        let text = "Summary line\ncontinues here\n\n- first point\n* second point\n1. third point\n## Heading";
        let units = segment(text, 12);
        assert_eq!(
            units,
            vec![
                "Summary line continues here",
                "first point",
                "second point",
                "third point",
                "Heading",
            ]
        );
    }

    #[test]
    fn test_segment_caps_units() {
        let text = (0..20).map(|i| format!("Sentence {i}.")).collect::<Vec<_>>().join(" ");
        assert_eq!(segment(&text, 12).len(), 12);
    }

    #[test]
    fn test_tokenize_filters_short_and_stop_words() {
        let tokens = tokenize("Use MongoDB for the flexibility, OK?", 3);
        assert_eq!(tokens, vec!["use", "mongodb", "flexibility"]);
    }

    #[test]
    fn test_tokenize_keeps_negations() {
        let tokens = tokenize("Don't use it; never!", 3);
        assert_eq!(tokens, vec!["dont", "use", "never"]);
    }

    #[test]
    fn test_claim_key_is_sorted_and_unique() {
        let claim = Claim::from_sentence("Use strict null checks, strict!", 3).unwrap();
        assert_eq!(claim.tokens(), ["checks", "null", "strict", "use"]);
        assert_eq!(claim.key(), "checks null strict use");
        assert_eq!(claim.polarity(), Polarity::Positive);
    }

    #[test]
    fn test_claim_without_content_is_skipped() {
        assert!(Claim::from_sentence("It is so.", 3).is_none());
    }

    #[test]
    fn test_negative_polarity_markers() {
        for sentence in [
            "Do not use MongoDB here.",
            "You shouldn't use MongoDB.",
            "Don’t rely on globals.",
            "There is no reason to cache this.",
            "Never block the executor.",
        ] {
            let claim = Claim::from_sentence(sentence, 3).unwrap();
            assert!(claim.polarity().is_negative(), "{sentence}");
        }
    }

    #[test]
    fn test_overlap_ratio_uses_smaller_claim() {
        let a = Claim::from_sentence("Use MongoDB for flexibility.", 3).unwrap();
        let b = Claim::from_sentence("Do not use MongoDB here, use Postgres.", 3).unwrap();

        assert_eq!(a.shared_tokens(&b), vec!["mongodb", "use"]);
        // shared = 2, min(3, 4) = 3
        assert!((a.overlap_ratio(&b) - 2.0 / 3.0).abs() < f64::EPSILON);
        assert!((b.overlap_ratio(&a) - 2.0 / 3.0).abs() < f64::EPSILON);
    }
}
