use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::safety::RiskLevel;
use super::types::{EvaluationOutcome, IssueType};

const TOP_ISSUES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueFrequency {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub description: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BatchSummary {
    pub total_items: usize,
    pub successes: usize,
    pub failures: usize,
    pub success_rate: f64,
    pub average_processing_time_ms: f64,
    pub average_score: Option<f64>,
    pub high_risk_count: usize,
    pub compliant_count: usize,
    pub top_issues: Vec<IssueFrequency>,
}

/// Accumulates per-item outcomes while a batch runs.
pub struct BatchStatsCollector {
    successes: usize,
    failures: usize,
    score_total: f64,
    scored: usize,
    high_risk: usize,
    compliant: usize,
    // first-seen order breaks ties
    issues: Vec<IssueFrequency>,
    timer: Option<Instant>,
    elapsed_ms: u64,
}

impl BatchStatsCollector {
    pub fn new() -> Self {
        Self {
            successes: 0,
            failures: 0,
            score_total: 0.0,
            scored: 0,
            high_risk: 0,
            compliant: 0,
            issues: Vec::new(),
            timer: None,
            elapsed_ms: 0,
        }
    }

    pub fn start(&mut self) {
        self.timer = Some(Instant::now());
    }

    pub fn finish(&mut self) {
        if let Some(t0) = self.timer.take() {
            self.elapsed_ms = t0.elapsed().as_millis() as u64;
        }
    }

    pub fn track_success(&mut self, outcome: &EvaluationOutcome) {
        self.successes += 1;
        if let Some(score) = outcome.score() {
            self.score_total += score;
            self.scored += 1;
        }
        if outcome.overall_risk().is_some_and(|risk| risk >= RiskLevel::High) {
            self.high_risk += 1;
        }
        if outcome.is_compliant() {
            self.compliant += 1;
        }
        for issue in outcome.issues() {
            match self
                .issues
                .iter_mut()
                .find(|seen| seen.issue_type == issue.issue_type && seen.description == issue.description)
            {
                Some(seen) => seen.count += 1,
                None => self.issues.push(IssueFrequency {
                    issue_type: issue.issue_type,
                    description: issue.description.clone(),
                    count: 1,
                }),
            }
        }
    }

    pub fn track_failure(&mut self) {
        self.failures += 1;
    }

    pub fn summary(&self) -> BatchSummary {
        let processed = self.successes + self.failures;
        let mut top_issues = self.issues.clone();
        // stable sort keeps first occurrence ahead on equal counts
        top_issues.sort_by(|a, b| b.count.cmp(&a.count));
        top_issues.truncate(TOP_ISSUES);

        BatchSummary {
            total_items: processed,
            successes: self.successes,
            failures: self.failures,
            success_rate: if processed == 0 {
                0.0
            } else {
                self.successes as f64 * 100.0 / processed as f64
            },
            average_processing_time_ms: if processed == 0 {
                0.0
            } else {
                self.elapsed_ms as f64 / processed as f64
            },
            average_score: (self.scored > 0).then(|| self.score_total / self.scored as f64),
            high_risk_count: self.high_risk,
            compliant_count: self.compliant,
            top_issues,
        }
    }
}

impl Default for BatchStatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::types::{ComplianceEvaluation, ComplianceIssue, Severity};

    fn compliance(score: u8, issues: Vec<ComplianceIssue>) -> EvaluationOutcome {
        EvaluationOutcome::Compliance(ComplianceEvaluation {
            content: "text".into(),
            guideline: "acme".into(),
            score,
            issues,
            is_compliant: score >= 70,
            summary: String::new(),
            context: None,
        })
    }

    fn issue(description: &str) -> ComplianceIssue {
        ComplianceIssue::new(IssueType::Terminology, Severity::Medium, description, "fix")
    }

    #[test]
    fn rates_and_averages() {
        let mut stats = BatchStatsCollector::new();
        stats.start();
        stats.track_success(&compliance(90, vec![]));
        stats.track_success(&compliance(50, vec![]));
        stats.track_failure();
        stats.finish();

        let summary = stats.summary();
        assert_eq!(summary.total_items, 3);
        assert!((summary.success_rate - 66.666).abs() < 0.01);
        assert_eq!(summary.average_score, Some(70.0));
        assert_eq!(summary.compliant_count, 1);
        assert_eq!(summary.high_risk_count, 0);
    }

    #[test]
    fn top_issues_ranked_by_frequency_then_first_seen() {
        let mut stats = BatchStatsCollector::new();
        let names = ["a", "b", "c", "d", "e", "f"];
        for name in names {
            stats.track_success(&compliance(95, vec![issue(name)]));
        }
        stats.track_success(&compliance(90, vec![issue("f"), issue("f")]));

        let top = stats.summary().top_issues;
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].description, "f");
        assert_eq!(top[0].count, 3);
        let rest: Vec<_> = top[1..].iter().map(|i| i.description.as_str()).collect();
        assert_eq!(rest, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn empty_collector_has_no_score() {
        let summary = BatchStatsCollector::new().summary();
        assert_eq!(summary.average_score, None);
        assert_eq!(summary.success_rate, 0.0);
    }
}
