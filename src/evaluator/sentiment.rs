use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use super::safety::RiskLevel;
use crate::error::SentimentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentSignal {
    pub polarity: Polarity,
    pub confidence: f32,
}

impl SentimentSignal {
    pub fn neutral_fallback() -> Self {
        SentimentSignal {
            polarity: Polarity::Neutral,
            confidence: 0.0,
        }
    }

    pub fn risk(&self) -> RiskLevel {
        match self.polarity {
            Polarity::Positive => RiskLevel::None,
            Polarity::Neutral => RiskLevel::Low,
            Polarity::Negative => RiskLevel::Medium,
        }
    }
}

/// Exchangeable polarity oracle.
pub trait SentimentAnalyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Result<SentimentSignal, SentimentError>;
}

/// Runs the analyzer, degrading any failure (including a panic) to neutral.
pub(crate) fn sentiment_or_neutral(analyzer: &dyn SentimentAnalyzer, text: &str) -> SentimentSignal {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| analyzer.analyze(text)))
        .unwrap_or_else(|_| Err(SentimentError("analyzer panicked".to_string())));
    match outcome {
        Ok(signal) => signal,
        Err(err) => {
            log::warn!("Sentiment analysis degraded to neutral: {}", err);
            SentimentSignal::neutral_fallback()
        }
    }
}

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "amazing", "love", "happy", "wonderful", "fantastic", "best",
    "enjoy", "delighted", "thanks", "thank", "awesome", "pleased", "beautiful", "perfect",
    "helpful", "excited", "glad",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "hate", "worst", "angry", "horrible", "disgusting", "sad",
    "disappointed", "useless", "ugly", "annoying", "stupid", "pathetic", "furious", "broken",
    "fail", "failed", "scam",
];

const NEGATORS: &[&str] = &["not", "no", "never", "don't", "isn't", "wasn't", "can't", "won't"];

/// Word-list polarity with single-word negation.
#[derive(Debug, Clone, Default)]
pub struct LexiconSentiment;

impl SentimentAnalyzer for LexiconSentiment {
    fn analyze(&self, text: &str) -> Result<SentimentSignal, SentimentError> {
        let mut positive = 0u32;
        let mut negative = 0u32;
        let mut negate_next = false;

        for raw in text.split_whitespace() {
            let word = raw
                .trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .to_lowercase();
            if word.is_empty() {
                continue;
            }
            if NEGATORS.contains(&word.as_str()) {
                negate_next = true;
                continue;
            }
            let is_positive = POSITIVE_WORDS.contains(&word.as_str());
            let is_negative = NEGATIVE_WORDS.contains(&word.as_str());
            match (is_positive, is_negative, negate_next) {
                (true, _, false) | (_, true, true) => positive += 1,
                (true, _, true) | (_, true, false) => negative += 1,
                _ => {}
            }
            negate_next = false;
        }

        let total = positive + negative;
        if total == 0 {
            return Ok(SentimentSignal {
                polarity: Polarity::Neutral,
                confidence: 0.5,
            });
        }
        let polarity = if positive > negative {
            Polarity::Positive
        } else if negative > positive {
            Polarity::Negative
        } else {
            Polarity::Neutral
        };
        let confidence = (positive.abs_diff(negative) as f32 / total as f32).max(0.5);
        Ok(SentimentSignal {
            polarity,
            confidence,
        })
    }
}
