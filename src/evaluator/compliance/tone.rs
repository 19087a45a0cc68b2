use lazy_static::lazy_static;

use super::super::safety::TermSet;
use super::guideline::ToneRules;
use crate::evaluator::content::Content;
use crate::evaluator::types::{ComplianceIssue, IssueType, Severity};

lazy_static! {
    static ref AGGRESSIVE: TermSet = TermSet::new([
        "you must", "demand", "immediately", "or else", "you'd better", "no excuses", "shut up",
    ]);
    static ref CASUAL: TermSet = TermSet::new([
        "gonna", "wanna", "gotta", "lol", "hey", "awesome", "yeah", "kinda", "omg", "dude", "btw",
    ]);
    static ref FORMAL: TermSet = TermSet::new([
        "hereby", "pursuant", "aforementioned", "herein", "henceforth", "whereas",
        "notwithstanding", "heretofore",
    ]);
    static ref NEGATIVE: TermSet = TermSet::new([
        "terrible", "awful", "hate", "worst", "horrible", "disappointing", "pathetic",
    ]);
    static ref SARCASTIC: TermSet = TermSet::new([
        "yeah right", "oh great", "as if", "big surprise", "what a shock", "thanks a lot",
    ]);
    static ref PUSHY: TermSet = TermSet::new([
        "buy now", "act now", "limited time", "don't miss out", "hurry", "once in a lifetime",
        "last chance",
    ]);
    static ref JARGON: TermSet = TermSet::new([
        "synergy", "leverage", "paradigm", "circle back", "move the needle", "low-hanging fruit",
    ]);
}

const FORMAL_PRIMARY: &[&str] = &["professional", "formal", "authoritative", "corporate"];
const CASUAL_PRIMARY: &[&str] = &["friendly", "casual", "conversational", "warm", "approachable", "playful"];

fn markers_for(attribute: &str) -> Option<&'static TermSet> {
    match attribute.trim().to_lowercase().as_str() {
        "aggressive" | "hostile" | "confrontational" => Some(&*AGGRESSIVE),
        "casual" | "informal" | "slangy" => Some(&*CASUAL),
        "formal" | "stiff" | "legalistic" => Some(&*FORMAL),
        "negative" | "pessimistic" => Some(&*NEGATIVE),
        "sarcastic" | "snarky" => Some(&*SARCASTIC),
        "pushy" | "salesy" | "hype" => Some(&*PUSHY),
        "jargon" | "buzzwordy" => Some(&*JARGON),
        _ => None,
    }
}

fn primary_is_any(tone: &ToneRules, family: &[&str]) -> Option<String> {
    tone.primary
        .iter()
        .find(|attribute| family.contains(&attribute.trim().to_lowercase().as_str()))
        .map(|attribute| attribute.trim().to_lowercase())
}

pub(crate) fn check_tone(content: &Content, tone: &ToneRules) -> Vec<ComplianceIssue> {
    let text = content.normalized();
    let mut issues = Vec::new();

    for attribute in &tone.avoid {
        if let Some(term) = markers_for(attribute).and_then(|markers| markers.first_match(text)) {
            let attribute = attribute.trim().to_lowercase();
            issues.push(ComplianceIssue::new(
                IssueType::Tone,
                Severity::Medium,
                format!("Content reads as {attribute} (\"{term}\")"),
                format!("Rephrase to avoid a {attribute} tone"),
            ));
        }
    }

    let formal_primary = primary_is_any(tone, FORMAL_PRIMARY);
    if let Some(primary) = formal_primary.as_deref() {
        if let Some(term) = CASUAL.first_match(text) {
            issues.push(ComplianceIssue::new(
                IssueType::Tone,
                Severity::Medium,
                format!("Casual wording conflicts with a {primary} tone (\"{term}\")"),
                "Replace slang and casual phrasing with neutral wording",
            ));
        }
        if text.matches('!').count() > 2 {
            issues.push(ComplianceIssue::new(
                IssueType::Tone,
                Severity::Low,
                format!("Frequent exclamation marks undercut a {primary} tone"),
                "Keep exclamation marks to one at most",
            ));
        }
    }

    if let Some(primary) = primary_is_any(tone, CASUAL_PRIMARY) {
        if let Some(term) = FORMAL.first_match(text) {
            issues.push(ComplianceIssue::new(
                IssueType::Tone,
                Severity::Low,
                format!("Overly formal wording conflicts with a {primary} tone (\"{term}\")"),
                "Use plain, conversational language",
            ));
        }
    }

    if shouting_words(content.raw()) >= 2 {
        issues.push(ComplianceIssue::new(
            IssueType::Tone,
            Severity::Medium,
            "Excessive capitalization reads as shouting",
            "Use sentence case instead of all caps",
        ));
    }

    issues
}

fn shouting_words(raw: &str) -> usize {
    raw.split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphabetic()))
        .filter(|word| {
            word.chars().count() >= 4
                && word.chars().all(|c| c.is_alphabetic())
                && word.chars().all(|c| c.is_uppercase())
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(text: &str) -> Content {
        Content::new(text, 10_000).unwrap()
    }

    fn rules(primary: &[&str], avoid: &[&str]) -> ToneRules {
        ToneRules {
            primary: primary.iter().map(|s| s.to_string()).collect(),
            avoid: avoid.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn avoided_tone_markers_are_flagged() {
        let issues = check_tone(&content("Act now, or else you lose out"), &rules(&[], &["aggressive"]));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Medium);
        assert!(issues[0].description.contains("aggressive"));
    }

    #[test]
    fn casual_language_conflicts_with_professional_tone() {
        let issues = check_tone(
            &content("Hey folks, we're gonna ship it!!!"),
            &rules(&["Professional"], &[]),
        );
        let descriptions: Vec<_> = issues.iter().map(|i| i.description.as_str()).collect();
        assert_eq!(issues.len(), 2, "{descriptions:?}");
        assert!(descriptions[0].starts_with("Casual wording conflicts"));
        assert_eq!(issues[1].severity, Severity::Low);
    }

    #[test]
    fn formal_language_conflicts_with_friendly_tone() {
        let issues = check_tone(
            &content("The aforementioned update is live."),
            &rules(&["friendly"], &[]),
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Low);
    }

    #[test]
    fn all_caps_counts_as_shouting_but_acronyms_do_not() {
        assert_eq!(shouting_words("THIS IS HUGE NEWS"), 3);
        assert_eq!(shouting_words("Our API and SDK ship today"), 0);
        let issues = check_tone(&content("HUGE SALE today"), &rules(&[], &[]));
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn clean_text_has_no_tone_issues() {
        let issues = check_tone(
            &content("We are happy to share our spring collection."),
            &rules(&["friendly"], &["aggressive", "sarcastic"]),
        );
        assert!(issues.is_empty());
    }
}
