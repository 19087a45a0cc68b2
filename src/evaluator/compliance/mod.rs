mod guideline;
mod terminology;
mod tone;
mod voice;

pub use guideline::{
    BrandGuideline, ContextOverride, GuidelineSource, JsonGuidelineSource, PreferredTerm,
    TerminologyRules, ToneOverride, ToneRules, VoiceOverride, VoiceRules, GUIDELINE_PATH_ENV,
};

use super::content::Content;
use super::types::{ComplianceEvaluation, ComplianceIssue, IssueType, Severity};
use terminology::TerminologyMatcher;

/// Minimum score for content to count as on-brand.
pub const COMPLIANCE_PASS_SCORE: u8 = 70;

const TECHNICAL_CONTEXTS: &[&str] = &["technical", "documentation", "developer", "api"];

/// A loaded guideline with its term lists compiled.
#[derive(Debug, Clone)]
pub struct CompiledGuideline {
    guideline: BrandGuideline,
    terminology: TerminologyMatcher,
}

impl CompiledGuideline {
    pub fn new(guideline: BrandGuideline) -> Self {
        let terminology = TerminologyMatcher::compile(&guideline);
        CompiledGuideline {
            guideline,
            terminology,
        }
    }

    pub fn guideline(&self) -> &BrandGuideline {
        &self.guideline
    }

    pub fn name(&self) -> &str {
        if self.guideline.name.trim().is_empty() {
            "brand guideline"
        } else {
            &self.guideline.name
        }
    }

    pub fn is_technical_context(&self, context: Option<&str>) -> bool {
        let Some(context) = context else {
            return false;
        };
        self.guideline
            .context_override(context)
            .map(|over| over.technical)
            .unwrap_or(false)
            || TECHNICAL_CONTEXTS.contains(&context.trim().to_lowercase().as_str())
    }

    pub fn evaluate(&self, content: &Content, context: Option<&str>) -> ComplianceEvaluation {
        let context = context.map(str::trim).filter(|ctx| !ctx.is_empty());
        let technical = self.is_technical_context(context);
        let tone_rules = self.guideline.effective_tone(context);
        let voice_rules = self.guideline.effective_voice(context);

        let mut issues = Vec::new();
        if !technical {
            issues.extend(tone::check_tone(content, &tone_rules));
        }
        issues.extend(voice::check_voice(content, &voice_rules));
        issues.extend(self.terminology.check(content, context, technical));

        let score = compliance_score(&issues);
        let is_compliant = score >= COMPLIANCE_PASS_SCORE;
        let summary = summarize(self.name(), score, &issues, is_compliant);

        ComplianceEvaluation {
            content: content.raw().to_string(),
            guideline: self.name().to_string(),
            score,
            issues,
            is_compliant,
            summary,
            context: context.map(str::to_string),
        }
    }
}

/// 100 minus severity penalties, floored at 0.
pub fn compliance_score(issues: &[ComplianceIssue]) -> u8 {
    let penalty: u32 = issues.iter().map(|issue| issue.severity.penalty()).sum();
    100u32.saturating_sub(penalty) as u8
}

fn summarize(guideline: &str, score: u8, issues: &[ComplianceIssue], compliant: bool) -> String {
    if issues.is_empty() {
        return format!("Content fully complies with {guideline} (score {score}/100).");
    }
    let count = |kind: IssueType| issues.iter().filter(|issue| issue.issue_type == kind).count();
    let high = issues
        .iter()
        .filter(|issue| issue.severity == Severity::High)
        .count();
    format!(
        "Content {} {guideline} (score {score}/100): {} tone, {} voice, {} terminology issue(s); {high} high severity.",
        if compliant { "mostly complies with" } else { "does not comply with" },
        count(IssueType::Tone),
        count(IssueType::Voice),
        count(IssueType::Terminology),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(severity: Severity) -> ComplianceIssue {
        ComplianceIssue::new(IssueType::Tone, severity, "d", "s")
    }

    fn guideline() -> CompiledGuideline {
        CompiledGuideline::new(
            BrandGuideline::from_json_str(
                r#"{
                    "name": "acme",
                    "tone": {"primary": ["professional"], "avoid": ["aggressive"]},
                    "voice": {"use_contractions": false},
                    "terminology": {"avoid": ["cheap"], "technical_allow": ["cheap"]},
                    "contexts": {
                        "social": {"tone": {"primary": ["friendly"]}, "voice": {"use_contractions": true}},
                        "release-notes": {"technical": true}
                    }
                }"#,
            )
            .unwrap(),
        )
    }

    #[test]
    fn score_penalties_and_floor() {
        assert_eq!(compliance_score(&[]), 100);
        assert_eq!(
            compliance_score(&[issue(Severity::High), issue(Severity::Medium), issue(Severity::Low)]),
            65
        );
        let many: Vec<_> = (0..6).map(|_| issue(Severity::High)).collect();
        assert_eq!(compliance_score(&many), 0);
    }

    #[test]
    fn context_overrides_change_the_verdict() {
        let compiled = guideline();
        let content = Content::new("Hey, we're gonna love this", 1_000).unwrap();

        let default = compiled.evaluate(&content, None);
        // casual wording vs professional tone + disallowed contraction
        assert_eq!(default.score, 80);
        assert!(default.is_compliant);

        let social = compiled.evaluate(&content, Some("social"));
        assert!(social.issues.is_empty());
        assert_eq!(social.score, 100);
        assert_eq!(social.context.as_deref(), Some("social"));
    }

    #[test]
    fn technical_contexts_skip_tone_and_allow_terms() {
        let compiled = guideline();
        let content = Content::new("You MUST NOT use the cheap allocator. Demand review.", 1_000).unwrap();

        let general = compiled.evaluate(&content, None);
        assert!(general.issues.iter().any(|issue| issue.issue_type == IssueType::Tone));
        assert!(general
            .issues
            .iter()
            .any(|issue| issue.issue_type == IssueType::Terminology));

        assert!(compiled.is_technical_context(Some("release-notes")));
        assert!(compiled.is_technical_context(Some("API")));
        let technical = compiled.evaluate(&content, Some("release-notes"));
        assert!(technical.issues.is_empty());
        assert_eq!(technical.score, 100);
    }
}
