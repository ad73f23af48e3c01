//! Synthesis engine: agreement, disagreement, insights and confidence.

use super::claim::{Claim, Polarity, segment};
use super::value_objects::{Disagreement, KeyInsight, Position, SynthesisData};
use crate::deliberation::value_objects::BackendResponse;
use std::collections::{HashMap, HashSet};

/// Topic used when two conflicting claims share no token.
const GENERAL_TOPIC: &str = "general";

/// Tunables of the lexical heuristic.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisConfig {
    /// Sentence-like units considered per response
    pub max_sentences_per_response: usize,
    /// Shortest token kept, in characters
    pub min_token_len: usize,
    /// Overlap ratio at which two claims are considered comparable
    pub overlap_threshold: f64,
    pub max_agreement_points: usize,
    pub max_disagreements: usize,
    pub max_key_insights: usize,
    /// Shared tokens used to name a disagreement topic
    pub topic_tokens: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_sentences_per_response: 12,
            min_token_len: 3,
            overlap_threshold: 0.5,
            max_agreement_points: 5,
            max_disagreements: 5,
            max_key_insights: 6,
            topic_tokens: 4,
        }
    }
}

/// Pure, stateless synthesis over a set of backend responses.
#[derive(Debug, Clone, Default)]
pub struct SynthesisEngine {
    config: SynthesisConfig,
}

/// Claims of one successful source.
struct SourceClaims<'a> {
    name: &'a str,
    claims: Vec<Claim>,
}

/// One side of a topic while pairs are being scanned.
struct StanceAccumulator {
    sources: Vec<String>,
    view: String,
}

impl StanceAccumulator {
    fn record(slot: &mut Option<Self>, source: &str, view: &str) {
        let stance = slot.get_or_insert_with(|| Self {
            sources: Vec::new(),
            view: view.to_string(),
        });
        if !stance.sources.iter().any(|s| s == source) {
            stance.sources.push(source.to_string());
        }
    }

    fn into_position(self, stance: Polarity) -> Position {
        Position {
            sources: self.sources,
            view: self.view,
            stance,
        }
    }
}

#[derive(Default)]
struct TopicAccumulator {
    positive: Option<StanceAccumulator>,
    negative: Option<StanceAccumulator>,
}

/// Signals collected from every cross-source claim pair.
#[derive(Default)]
struct PairScan {
    agreement_pairs: usize,
    disagreement_pairs: usize,
    /// Topics in first-seen order
    topics: Vec<(String, TopicAccumulator)>,
}

impl SynthesisEngine {
    pub fn new(config: SynthesisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Synthesize with the default configuration.
    pub fn extract(responses: &[BackendResponse]) -> SynthesisData {
        Self::default().synthesize(responses)
    }

    /// Synthesize the successful subset of `responses`.
    ///
    /// Failed and blank responses are ignored. With no usable response the
    /// result is empty with confidence 0.
    pub fn synthesize(&self, responses: &[BackendResponse]) -> SynthesisData {
        let sources: Vec<SourceClaims<'_>> = responses
            .iter()
            .filter(|r| r.has_content())
            .map(|r| SourceClaims {
                name: r.source_name.as_str(),
                claims: self.extract_claims(&r.text),
            })
            .collect();

        if sources.is_empty() {
            return SynthesisData::empty();
        }

        let agreement_points = self.agreement_points(&sources);
        let scan = self.scan_pairs(&sources);
        let confidence = confidence(sources.len(), &scan);

        let disagreements = scan
            .topics
            .into_iter()
            .filter_map(|(topic, acc)| match (acc.positive, acc.negative) {
                (Some(positive), Some(negative)) => Some(Disagreement {
                    topic,
                    positions: vec![
                        positive.into_position(Polarity::Positive),
                        negative.into_position(Polarity::Negative),
                    ],
                }),
                _ => None,
            })
            .take(self.config.max_disagreements)
            .collect();

        SynthesisData {
            agreement_points,
            disagreements,
            key_insights: self.key_insights(&sources),
            confidence,
        }
    }

    fn extract_claims(&self, text: &str) -> Vec<Claim> {
        segment(text, self.config.max_sentences_per_response)
            .iter()
            .filter_map(|sentence| Claim::from_sentence(sentence, self.config.min_token_len))
            .collect()
    }

    /// Claim keys every source holds, reported with the first source's
    /// sentence. A lone source cannot agree with itself.
    fn agreement_points(&self, sources: &[SourceClaims<'_>]) -> Vec<String> {
        let Some((first, rest)) = sources.split_first() else {
            return Vec::new();
        };
        if rest.is_empty() {
            return Vec::new();
        }

        let other_keys: Vec<HashSet<String>> = rest
            .iter()
            .map(|s| s.claims.iter().map(Claim::key).collect())
            .collect();

        let mut seen = HashSet::new();
        let mut points = Vec::new();
        for claim in &first.claims {
            if points.len() >= self.config.max_agreement_points {
                break;
            }
            let key = claim.key();
            if other_keys.iter().all(|keys| keys.contains(&key)) && seen.insert(key) {
                points.push(claim.raw_text().to_string());
            }
        }
        points
    }

    /// Compare every claim of every source against every claim of every
    /// other source.
    fn scan_pairs(&self, sources: &[SourceClaims<'_>]) -> PairScan {
        let mut scan = PairScan::default();
        let mut topic_index: HashMap<String, usize> = HashMap::new();

        for (i, left) in sources.iter().enumerate() {
            for right in &sources[i + 1..] {
                for a in &left.claims {
                    for b in &right.claims {
                        if a.overlap_ratio(b) < self.config.overlap_threshold {
                            continue;
                        }
                        if a.polarity() == b.polarity() {
                            scan.agreement_pairs += 1;
                            continue;
                        }

                        scan.disagreement_pairs += 1;
                        let topic = self.topic_for(a, b);
                        let slot = *topic_index.entry(topic.clone()).or_insert_with(|| {
                            scan.topics.push((topic, TopicAccumulator::default()));
                            scan.topics.len() - 1
                        });
                        let acc = &mut scan.topics[slot].1;

                        let ((pos_source, pos), (neg_source, neg)) = if a.polarity().is_negative() {
                            ((right.name, b), (left.name, a))
                        } else {
                            ((left.name, a), (right.name, b))
                        };
                        StanceAccumulator::record(&mut acc.positive, pos_source, pos.raw_text());
                        StanceAccumulator::record(&mut acc.negative, neg_source, neg.raw_text());
                    }
                }
            }
        }

        scan
    }

    fn topic_for(&self, a: &Claim, b: &Claim) -> String {
        let shared = a.shared_tokens(b);
        if shared.is_empty() {
            return GENERAL_TOPIC.to_string();
        }
        shared
            .into_iter()
            .take(self.config.topic_tokens)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The claim with the most tokens per source; ties go to the earlier one.
    fn key_insights(&self, sources: &[SourceClaims<'_>]) -> Vec<KeyInsight> {
        sources
            .iter()
            .filter_map(|source| {
                let mut best: Option<&Claim> = None;
                for claim in &source.claims {
                    if best.is_none_or(|b| claim.tokens().len() > b.tokens().len()) {
                        best = Some(claim);
                    }
                }
                best.map(|claim| KeyInsight {
                    source: source.name.to_string(),
                    insight: claim.raw_text().to_string(),
                })
            })
            .take(self.config.max_key_insights)
            .collect()
    }
}

/// `(agreement - disagreement) / C(n, 2)`, mapped from `[-1, 1]` onto
/// `[0, 1]`. No pairs at all means no signal: 0.5.
fn confidence(source_count: usize, scan: &PairScan) -> f64 {
    let total_pairs = source_count * source_count.saturating_sub(1) / 2;
    let score = if total_pairs == 0 {
        0.0
    } else {
        (scan.agreement_pairs as f64 - scan.disagreement_pairs as f64) / total_pairs as f64
    };
    ((score + 1.0) / 2.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ok(source: &str, text: &str) -> BackendResponse {
        BackendResponse::success(source, format!("{source}-model"), text, Duration::ZERO)
    }

    fn failed(source: &str) -> BackendResponse {
        BackendResponse::failure(source, "network error", Duration::ZERO)
    }

    #[test]
    fn test_empty_input_yields_zero_confidence() {
        let data = SynthesisEngine::extract(&[]);
        assert!(data.is_empty());
        assert_eq!(data.confidence, 0.0);
    }

    #[test]
    fn test_only_failures_yield_zero_confidence() {
        let data = SynthesisEngine::extract(&[failed("a"), failed("b")]);
        assert!(data.is_empty());
        assert_eq!(data.confidence, 0.0);
    }

    #[test]
    fn test_blank_successes_are_ignored() {
        let data = SynthesisEngine::extract(&[ok("a", "   "), ok("b", "")]);
        assert_eq!(data, SynthesisData::empty());
    }

    #[test]
    fn test_identical_answers_agree() {
        let responses = vec![
            ok("claude", "Use strict null checks."),
            ok("gpt", "Use strict null checks."),
            ok("gemini", "Use strict null checks."),
        ];

        let data = SynthesisEngine::extract(&responses);

        assert_eq!(data.agreement_points, vec!["Use strict null checks."]);
        assert!(data.disagreements.is_empty());
        assert!(data.confidence >= 0.8, "confidence = {}", data.confidence);
        assert_eq!(data.key_insights.len(), 3);
    }

    #[test]
    fn test_opposite_stances_disagree() {
        let responses = vec![
            ok("claude", "Use MongoDB for flexibility."),
            ok("gpt", "Do not use MongoDB here, use Postgres."),
        ];

        let data = SynthesisEngine::extract(&responses);

        assert_eq!(data.disagreements.len(), 1);
        let disagreement = &data.disagreements[0];
        assert!(disagreement.topic.contains("mongodb"));
        assert_eq!(disagreement.positions.len(), 2);

        let positive = &disagreement.positions[0];
        assert_eq!(positive.stance, Polarity::Positive);
        assert_eq!(positive.sources, vec!["claude"]);
        assert_eq!(positive.view, "Use MongoDB for flexibility.");

        let negative = &disagreement.positions[1];
        assert_eq!(negative.stance, Polarity::Negative);
        assert_eq!(negative.sources, vec!["gpt"]);

        assert!(data.agreement_points.is_empty());
        assert!(data.confidence < 0.6, "confidence = {}", data.confidence);
    }

    #[test]
    fn test_negative_first_source_is_still_reported_as_negative_stance() {
        let responses = vec![
            ok("gpt", "Do not use MongoDB here, use Postgres."),
            ok("claude", "Use MongoDB for flexibility."),
        ];

        let data = SynthesisEngine::extract(&responses);
        let positions = &data.disagreements[0].positions;
        assert_eq!(positions[0].sources, vec!["claude"]);
        assert_eq!(positions[1].sources, vec!["gpt"]);
    }

    #[test]
    fn test_single_source_cannot_agree_with_itself() {
        let responses = vec![ok("claude", "Use strict null checks."), failed("gpt")];

        let data = SynthesisEngine::extract(&responses);

        assert!(data.agreement_points.is_empty());
        assert!(data.disagreements.is_empty());
        assert_eq!(data.confidence, 0.5);
        assert_eq!(data.key_insights.len(), 1);
        assert_eq!(data.key_insights[0].source, "claude");
    }

    #[test]
    fn test_unrelated_answers_are_neutral() {
        let responses = vec![
            ok("a", "Prefer composition over inheritance."),
            ok("b", "Benchmark before optimizing hot loops."),
        ];

        let data = SynthesisEngine::extract(&responses);
        assert!(data.agreement_points.is_empty());
        assert!(data.disagreements.is_empty());
        assert_eq!(data.confidence, 0.5);
    }

    #[test]
    fn test_key_insight_is_densest_claim() {
        let responses = vec![ok(
            "claude",
            "Cache it. Cache expensive database lookups behind a bounded LRU layer. Done.",
        )];

        let data = SynthesisEngine::extract(&responses);
        assert_eq!(
            data.key_insights[0].insight,
            "Cache expensive database lookups behind a bounded LRU layer."
        );
    }

    #[test]
    fn test_caps_are_respected() {
        let sentences: Vec<String> = (0..12)
            .map(|i| format!("Topic{i} alpha{i} beta{i} matters."))
            .collect();
        let text = sentences.join(" ");
        let responses: Vec<BackendResponse> = (0..8)
            .map(|i| ok(&format!("seat{i}"), &text))
            .collect();

        let data = SynthesisEngine::extract(&responses);
        assert_eq!(data.agreement_points.len(), 5);
        assert_eq!(data.key_insights.len(), 6);
        assert!(data.confidence <= 1.0);
    }

    #[test]
    fn test_disagreement_topics_are_capped() {
        let positive: Vec<String> = (0..8)
            .map(|i| format!("Enable feature{i} flag{i}."))
            .collect();
        let negative: Vec<String> = (0..8)
            .map(|i| format!("Never enable feature{i} flag{i}."))
            .collect();

        let data = SynthesisEngine::extract(&[
            ok("a", &positive.join(" ")),
            ok("b", &negative.join(" ")),
        ]);

        assert_eq!(data.disagreements.len(), 5);
        assert!(data.disagreements.iter().all(|d| d.positions.len() == 2));
        assert_eq!(data.confidence, 0.0);
    }

    #[test]
    fn test_synthesis_is_idempotent() {
        let responses = vec![
            ok("a", "Use MongoDB for flexibility. Add indexes early."),
            ok("b", "Do not use MongoDB here, use Postgres. Add indexes early."),
            ok("c", "Postgres is a safe default. Add indexes early."),
        ];

        let first = SynthesisEngine::extract(&responses);
        let second = SynthesisEngine::extract(&responses);
        assert_eq!(first, second);
        assert_eq!(first.agreement_points, vec!["Add indexes early."]);
    }

    #[test]
    fn test_confidence_stays_in_range() {
        let texts = [
            "Use Rust. Use Rust. Use Rust.",
            "Use Rust. Use Rust.",
            "Do not use Rust. Never use Rust.",
        ];
        let responses: Vec<BackendResponse> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| ok(&format!("s{i}"), t))
            .collect();

        let data = SynthesisEngine::extract(&responses);
        assert!((0.0..=1.0).contains(&data.confidence));
    }

    #[test]
    fn test_custom_threshold_is_honoured() {
        let engine = SynthesisEngine::new(SynthesisConfig {
            overlap_threshold: 0.9,
            ..SynthesisConfig::default()
        });
        let data = engine.synthesize(&[
            ok("claude", "Use MongoDB for flexibility."),
            ok("gpt", "Do not use MongoDB here, use Postgres."),
        ]);
        assert!(data.disagreements.is_empty());
        assert_eq!(data.confidence, 0.5);
    }
}
