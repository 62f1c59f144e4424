// 🙂 Sentiment Scorer - Free text → (polarity, subjectivity)
//
// The pipeline only depends on the output contract:
//   polarity ∈ [-1, 1], subjectivity ∈ [0, 1], deterministic per text.
// The default scorer is a small civic-feedback lexicon with negation and
// intensifier handling; anything implementing SentimentScorer can replace it.

use crate::feedback::FeedbackRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// SCORE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    /// -1.0 (negative) ..= 1.0 (positive)
    pub polarity: f64,

    /// 0.0 (objective) ..= 1.0 (subjective)
    pub subjectivity: f64,
}

impl SentimentScore {
    /// Build a score, clamping into the contract ranges (NaN becomes 0)
    pub fn new(polarity: f64, subjectivity: f64) -> Self {
        SentimentScore {
            polarity: clamp_or_zero(polarity, -1.0, 1.0),
            subjectivity: clamp_or_zero(subjectivity, 0.0, 1.0),
        }
    }

    pub fn neutral() -> Self {
        SentimentScore {
            polarity: 0.0,
            subjectivity: 0.0,
        }
    }
}

fn clamp_or_zero(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(min, max)
    }
}

/// Anything that can score feedback text
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> SentimentScore;
}

// ============================================================================
// SCORED FEEDBACK
// ============================================================================

/// A feedback record plus its derived sentiment; the record itself is untouched
#[derive(Debug, Clone, Serialize)]
pub struct ScoredFeedback {
    pub record: FeedbackRecord,
    pub polarity: f64,
    pub subjectivity: f64,
}

impl ScoredFeedback {
    pub fn location_name(&self) -> &str {
        self.record.location_name()
    }
}

/// Score every record with the given scorer
pub fn score_feedback(scorer: &dyn SentimentScorer, records: &[FeedbackRecord]) -> Vec<ScoredFeedback> {
    let scored: Vec<ScoredFeedback> = records
        .iter()
        .map(|record| {
            let score = scorer.score(record.text());
            ScoredFeedback {
                record: record.clone(),
                polarity: score.polarity,
                subjectivity: score.subjectivity,
            }
        })
        .collect();

    tracing::info!(count = scored.len(), "Performed sentiment analysis on feedback");
    scored
}

// ============================================================================
// LEXICON SCORER
// ============================================================================

/// How many non-lexicon words a negator/intensifier reaches across
const MODIFIER_WINDOW: usize = 2;

/// Polarity multiplier applied to a negated word
const NEGATION_FACTOR: f64 = -0.5;

pub struct LexiconScorer {
    /// word -> (polarity, subjectivity)
    words: HashMap<&'static str, (f64, f64)>,

    /// word -> multiplier
    intensifiers: HashMap<&'static str, f64>,

    negators: Vec<&'static str>,
}

impl LexiconScorer {
    pub fn new() -> Self {
        let words: HashMap<&'static str, (f64, f64)> = [
            // positive
            ("beautiful", (0.85, 1.0)),
            ("great", (0.8, 0.75)),
            ("excellent", (1.0, 1.0)),
            ("good", (0.7, 0.6)),
            ("nice", (0.6, 1.0)),
            ("happy", (0.8, 1.0)),
            ("love", (0.5, 0.6)),
            ("clean", (0.37, 0.69)),
            ("convenient", (0.4, 0.5)),
            ("helpful", (0.6, 0.7)),
            ("improved", (0.5, 0.6)),
            ("safe", (0.5, 0.5)),
            ("smooth", (0.4, 0.6)),
            ("quick", (0.33, 0.5)),
            ("new", (0.14, 0.45)),
            ("working", (0.2, 0.3)),
            ("thanks", (0.3, 0.4)),
            ("thank", (0.3, 0.4)),
            // negative
            ("jam", (-0.4, 0.6)),
            ("congested", (-0.4, 0.5)),
            ("crowded", (-0.3, 0.5)),
            ("stuck", (-0.4, 0.5)),
            ("delay", (-0.3, 0.4)),
            ("delayed", (-0.3, 0.4)),
            ("slow", (-0.3, 0.4)),
            ("late", (-0.3, 0.6)),
            ("garbage", (-0.5, 0.7)),
            ("dirty", (-0.6, 0.8)),
            ("smelly", (-0.5, 0.8)),
            ("noise", (-0.3, 0.5)),
            ("pollution", (-0.5, 0.6)),
            ("potholes", (-0.5, 0.5)),
            ("pothole", (-0.5, 0.5)),
            ("damaging", (-0.6, 0.7)),
            ("broken", (-0.4, 0.6)),
            ("logging", (-0.3, 0.4)),
            ("flooding", (-0.4, 0.5)),
            ("concern", (-0.3, 0.5)),
            ("unsafe", (-0.5, 0.7)),
            ("dangerous", (-0.6, 0.9)),
            ("unacceptable", (-0.7, 0.8)),
            ("frustrating", (-0.6, 0.9)),
            ("bad", (-0.7, 0.67)),
            ("terrible", (-1.0, 1.0)),
            ("horrible", (-1.0, 1.0)),
            ("awful", (-1.0, 1.0)),
            ("worst", (-1.0, 1.0)),
        ]
        .into_iter()
        .collect();

        let intensifiers: HashMap<&'static str, f64> = [
            ("very", 1.3),
            ("so", 1.3),
            ("too", 1.3),
            ("huge", 1.3),
            ("really", 1.2),
            ("much", 1.2),
            ("extremely", 1.5),
        ]
        .into_iter()
        .collect();

        LexiconScorer {
            words,
            intensifiers,
            negators: vec!["not", "no", "never", "cannot", "without"],
        }
    }

    fn is_negator(&self, token: &str) -> bool {
        self.negators.iter().any(|n| *n == token) || token.ends_with("n't")
    }
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentScorer for LexiconScorer {
    fn score(&self, text: &str) -> SentimentScore {
        let lowered = text.to_lowercase();
        let tokens = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|t| !t.is_empty());

        let mut hits: Vec<(f64, f64)> = Vec::new();
        let mut negated: Option<usize> = None;
        let mut intensity: Option<(f64, usize)> = None;

        for token in tokens {
            if self.is_negator(token) {
                negated = Some(0);
                continue;
            }
            if let Some(&factor) = self.intensifiers.get(token) {
                intensity = Some((factor, 0));
                continue;
            }

            if let Some(&(mut polarity, mut subjectivity)) = self.words.get(token) {
                if let Some((factor, _)) = intensity.take() {
                    polarity *= factor;
                    subjectivity *= factor;
                }
                if negated.take().is_some() {
                    polarity *= NEGATION_FACTOR;
                }
                hits.push((polarity.clamp(-1.0, 1.0), subjectivity.min(1.0)));
                continue;
            }

            // Plain word: age out pending modifiers
            negated = negated.map(|d| d + 1).filter(|&d| d < MODIFIER_WINDOW);
            intensity = intensity
                .map(|(f, d)| (f, d + 1))
                .filter(|&(_, d)| d < MODIFIER_WINDOW);
        }

        if hits.is_empty() {
            return SentimentScore::neutral();
        }

        let n = hits.len() as f64;
        let polarity = hits.iter().map(|(p, _)| p).sum::<f64>() / n;
        let subjectivity = hits.iter().map(|(_, s)| s).sum::<f64>() / n;
        SentimentScore::new(polarity, subjectivity)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_text() {
        let scorer = LexiconScorer::new();
        let score = scorer.score("The bus arrived at 9am.");

        assert_eq!(score, SentimentScore::neutral());
    }

    #[test]
    fn test_positive_and_negative() {
        let scorer = LexiconScorer::new();

        let positive = scorer.score("The new park is beautiful, great work by the municipality.");
        assert!(positive.polarity > 0.4);

        let negative = scorer.score("Water logging after just a little rain is unacceptable.");
        assert!(negative.polarity < -0.4);
    }

    #[test]
    fn test_intensifier_reaches_across_one_word() {
        let scorer = LexiconScorer::new();

        let plain = scorer.score("traffic jam");
        let intensified = scorer.score("Huge traffic jam");

        assert!((plain.polarity - (-0.4)).abs() < 1e-9);
        assert!((intensified.polarity - (-0.52)).abs() < 1e-9);
    }

    #[test]
    fn test_negation_flips_and_dampens() {
        let scorer = LexiconScorer::new();

        let score = scorer.score("Streetlight is not working");
        assert!((score.polarity - (-0.1)).abs() < 1e-9);

        let contraction = scorer.score("It isn't clean");
        assert!(contraction.polarity < 0.0);
    }

    #[test]
    fn test_negation_expires() {
        let scorer = LexiconScorer::new();

        // "not" is three plain words away from "good"
        let score = scorer.score("not on this side of town good");
        assert!((score.polarity - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_output_contract() {
        let scorer = LexiconScorer::new();
        let texts = [
            "extremely terrible awful worst",
            "extremely excellent!!!",
            "a",
            "Too much noise pollution from construction late at night.",
            "😀",
        ];

        for text in texts {
            let score = scorer.score(text);
            assert!((-1.0..=1.0).contains(&score.polarity), "{}", text);
            assert!((0.0..=1.0).contains(&score.subjectivity), "{}", text);
        }
    }

    #[test]
    fn test_deterministic() {
        let scorer = LexiconScorer::new();
        let text = "The metro is so convenient and clean, love it!";

        assert_eq!(scorer.score(text), scorer.score(text));
    }

    #[test]
    fn test_score_clamps_nan() {
        let score = SentimentScore::new(f64::NAN, 2.0);
        assert_eq!(score.polarity, 0.0);
        assert_eq!(score.subjectivity, 1.0);
    }
}
