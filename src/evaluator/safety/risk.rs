use serde::{Deserialize, Serialize};

use crate::evaluator::types::{CategoryEvaluation, ContextVerdict, ContextualAssessment};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::None,
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::VeryHigh,
    ];

    /// One tier down, saturating at `None`.
    pub fn lower(self) -> RiskLevel {
        match self {
            RiskLevel::None | RiskLevel::Low => RiskLevel::None,
            RiskLevel::Medium => RiskLevel::Low,
            RiskLevel::High => RiskLevel::Medium,
            RiskLevel::VeryHigh => RiskLevel::High,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::None => "none",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::VeryHigh => "very_high",
        }
    }

    pub fn parse(value: &str) -> Option<RiskLevel> {
        match value.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "none" => Some(RiskLevel::None),
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            "very_high" | "veryhigh" => Some(RiskLevel::VeryHigh),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the overall level was reached, kept for summaries and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskAggregation {
    pub baseline: RiskLevel,
    pub escalated: bool,
    pub overall: RiskLevel,
}

/// Fuses keyword category results, the sentiment contribution and an optional
/// contextual judgment into a single level.
///
/// `categories` holds the independent keyword categories only. Sentiment joins
/// the baseline but never counts toward the two-MEDIUM escalation.
pub(crate) fn aggregate_risk(
    categories: &[CategoryEvaluation],
    sentiment: RiskLevel,
    contextual: Option<&ContextualAssessment>,
) -> RiskAggregation {
    let mut baseline = categories
        .iter()
        .map(|evaluation| evaluation.risk_level)
        .fold(sentiment, RiskLevel::max);

    let medium_hits = categories
        .iter()
        .filter(|evaluation| evaluation.risk_level == RiskLevel::Medium)
        .count();
    let escalated = medium_hits >= 2 && baseline < RiskLevel::High;
    if escalated {
        baseline = RiskLevel::High;
    }

    let overall = match contextual {
        Some(assessment) => apply_contextual(baseline, assessment),
        None => baseline,
    };

    RiskAggregation {
        baseline,
        escalated,
        overall,
    }
}

fn apply_contextual(baseline: RiskLevel, assessment: &ContextualAssessment) -> RiskLevel {
    let suggested = assessment.suggested_risk;
    match assessment.verdict {
        ContextVerdict::UnsafeDueToContext => baseline
            .max(RiskLevel::High)
            .max(suggested.unwrap_or(RiskLevel::High)),
        ContextVerdict::BorderlineContextualRisk => baseline
            .max(RiskLevel::Medium)
            .max(suggested.unwrap_or(RiskLevel::Medium)),
        ContextVerdict::SafeInContext => {
            // A high detection may only be softened to MEDIUM, never cleared.
            let floor = if baseline >= RiskLevel::High {
                RiskLevel::Medium
            } else {
                RiskLevel::None
            };
            let target = suggested.unwrap_or_else(|| baseline.lower());
            target.clamp(floor, baseline.max(floor))
        }
        ContextVerdict::Unknown => baseline.max(suggested.unwrap_or(baseline)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str, level: RiskLevel) -> CategoryEvaluation {
        CategoryEvaluation {
            category: name.to_string(),
            risk_level: level,
            explanation: String::new(),
        }
    }

    fn context(verdict: ContextVerdict, suggested: Option<RiskLevel>) -> ContextualAssessment {
        ContextualAssessment {
            verdict,
            explanation: "test".into(),
            suggested_risk: suggested,
        }
    }

    #[test]
    fn default_level_is_none() {
        assert_eq!(RiskLevel::default(), RiskLevel::None);
        assert_eq!(RiskLevel::default(), RiskLevel::ALL[0]);
    }

    #[test]
    fn levels_are_totally_ordered() {
        for pair in RiskLevel::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn parse_accepts_common_spellings() {
        assert_eq!(RiskLevel::parse("VERY_HIGH"), Some(RiskLevel::VeryHigh));
        assert_eq!(RiskLevel::parse("very high"), Some(RiskLevel::VeryHigh));
        assert_eq!(RiskLevel::parse(" Medium "), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::parse("severe"), None);
    }

    #[test]
    fn baseline_is_the_join_of_categories_and_sentiment() {
        let categories = vec![
            category("violence", RiskLevel::Low),
            category("drugs", RiskLevel::High),
        ];
        let result = aggregate_risk(&categories, RiskLevel::Medium, None);
        assert_eq!(result.overall, RiskLevel::High);
        assert!(!result.escalated);
    }

    #[test]
    fn two_independent_mediums_escalate_to_high() {
        let categories = vec![
            category("profanity", RiskLevel::Medium),
            category("alcohol", RiskLevel::Medium),
            category("violence", RiskLevel::None),
        ];
        let result = aggregate_risk(&categories, RiskLevel::Low, None);
        assert!(result.escalated);
        assert_eq!(result.overall, RiskLevel::High);
    }

    #[test]
    fn negative_sentiment_does_not_count_toward_escalation() {
        let categories = vec![category("profanity", RiskLevel::Medium)];
        let result = aggregate_risk(&categories, RiskLevel::Medium, None);
        assert!(!result.escalated);
        assert_eq!(result.overall, RiskLevel::Medium);
    }

    #[test]
    fn unsafe_context_forces_high_on_clean_scan() {
        let categories = vec![category("violence", RiskLevel::None)];
        let assessment = context(ContextVerdict::UnsafeDueToContext, None);
        let result = aggregate_risk(&categories, RiskLevel::None, Some(&assessment));
        assert_eq!(result.overall, RiskLevel::High);

        let assessment = context(ContextVerdict::UnsafeDueToContext, Some(RiskLevel::VeryHigh));
        let result = aggregate_risk(&categories, RiskLevel::None, Some(&assessment));
        assert_eq!(result.overall, RiskLevel::VeryHigh);
    }

    #[test]
    fn borderline_context_sets_medium_floor() {
        let categories = vec![category("violence", RiskLevel::Low)];
        let assessment = context(ContextVerdict::BorderlineContextualRisk, Some(RiskLevel::Low));
        let result = aggregate_risk(&categories, RiskLevel::None, Some(&assessment));
        assert_eq!(result.overall, RiskLevel::Medium);
    }

    #[test]
    fn safe_context_cannot_clear_high_detection() {
        let categories = vec![category("violence", RiskLevel::VeryHigh)];
        let assessment = context(ContextVerdict::SafeInContext, Some(RiskLevel::None));
        let result = aggregate_risk(&categories, RiskLevel::None, Some(&assessment));
        assert_eq!(result.overall, RiskLevel::Medium);
    }

    #[test]
    fn safe_context_never_raises_the_baseline() {
        let categories = vec![category("violence", RiskLevel::Low)];
        let assessment = context(ContextVerdict::SafeInContext, Some(RiskLevel::High));
        let result = aggregate_risk(&categories, RiskLevel::None, Some(&assessment));
        assert_eq!(result.overall, RiskLevel::Low);
    }

    #[test]
    fn safe_context_keeps_clean_content_clean() {
        let categories = vec![category("violence", RiskLevel::None)];
        let assessment = context(ContextVerdict::SafeInContext, Some(RiskLevel::None));
        let result = aggregate_risk(&categories, RiskLevel::None, Some(&assessment));
        assert_eq!(result.overall, RiskLevel::None);
    }

    #[test]
    fn safe_context_without_suggestion_steps_down_one_tier() {
        let categories = vec![category("alcohol", RiskLevel::Medium)];
        let assessment = context(ContextVerdict::SafeInContext, None);
        let result = aggregate_risk(&categories, RiskLevel::None, Some(&assessment));
        assert_eq!(result.overall, RiskLevel::Low);
    }

    #[test]
    fn unknown_verdict_only_raises() {
        let categories = vec![category("drugs", RiskLevel::Medium)];
        let lower = context(ContextVerdict::Unknown, Some(RiskLevel::None));
        let higher = context(ContextVerdict::Unknown, Some(RiskLevel::High));
        assert_eq!(
            aggregate_risk(&categories, RiskLevel::None, Some(&lower)).overall,
            RiskLevel::Medium
        );
        assert_eq!(
            aggregate_risk(&categories, RiskLevel::None, Some(&higher)).overall,
            RiskLevel::High
        );
    }
}
