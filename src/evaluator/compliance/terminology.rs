use std::collections::BTreeMap;

use super::super::safety::TermSet;
use super::guideline::BrandGuideline;
use crate::evaluator::content::Content;
use crate::evaluator::types::{ComplianceIssue, IssueType, Severity};

#[derive(Debug, Clone)]
struct PreferredMatcher {
    term: String,
    alternatives: TermSet,
}

/// Terminology rules of one guideline, compiled once per load.
#[derive(Debug, Clone)]
pub(crate) struct TerminologyMatcher {
    avoid: TermSet,
    preferred: Vec<PreferredMatcher>,
    context_avoid: BTreeMap<String, TermSet>,
    technical_allow: Vec<String>,
}

impl TerminologyMatcher {
    pub(crate) fn compile(guideline: &BrandGuideline) -> Self {
        let rules = &guideline.terminology;
        let preferred = rules
            .preferred
            .iter()
            .map(|entry| {
                let term = entry.term.trim().to_lowercase();
                let alternatives = entry
                    .alternatives
                    .iter()
                    .filter(|alternative| alternative.trim().to_lowercase() != term);
                PreferredMatcher {
                    alternatives: TermSet::new(alternatives),
                    term,
                }
            })
            .filter(|matcher| !matcher.alternatives.is_empty())
            .collect();
        let context_avoid = guideline
            .contexts
            .iter()
            .filter(|(_, over)| !over.avoid_terms.is_empty())
            .map(|(tag, over)| (tag.trim().to_lowercase(), TermSet::new(&over.avoid_terms)))
            .collect();

        TerminologyMatcher {
            avoid: TermSet::new(&rules.avoid),
            preferred,
            context_avoid,
            technical_allow: rules
                .technical_allow
                .iter()
                .map(|term| term.trim().to_lowercase())
                .collect(),
        }
    }

    fn exempt(&self, term: &str, technical: bool) -> bool {
        technical && self.technical_allow.iter().any(|allowed| allowed == term)
    }

    pub(crate) fn check(
        &self,
        content: &Content,
        context: Option<&str>,
        technical: bool,
    ) -> Vec<ComplianceIssue> {
        let text = content.normalized();
        let mut issues = Vec::new();

        for term in self.avoid.all_matches(text) {
            if self.exempt(&term, technical) {
                continue;
            }
            issues.push(ComplianceIssue::new(
                IssueType::Terminology,
                Severity::High,
                format!("Avoided term \"{term}\" used"),
                format!("Remove or replace \"{term}\""),
            ));
        }

        for preferred in &self.preferred {
            for alternative in preferred.alternatives.all_matches(text) {
                issues.push(ComplianceIssue::new(
                    IssueType::Terminology,
                    Severity::Medium,
                    format!("Use \"{}\" instead of \"{alternative}\"", preferred.term),
                    format!("Replace \"{alternative}\" with \"{}\"", preferred.term),
                ));
            }
        }

        if let Some((tag, scoped)) = context.and_then(|ctx| {
            let tag = ctx.trim().to_lowercase();
            self.context_avoid.get(&tag).map(|set| (tag, set))
        }) {
            for term in scoped.all_matches(text) {
                if self.exempt(&term, technical) {
                    continue;
                }
                issues.push(ComplianceIssue::new(
                    IssueType::Terminology,
                    Severity::Medium,
                    format!("\"{term}\" should be avoided in {tag} content"),
                    format!("Find an alternative to \"{term}\" for {tag} audiences"),
                ));
            }
        }

        issues
    }
}
