use lazy_static::lazy_static;
use regex::Regex;

use super::super::safety::TermSet;
use super::guideline::VoiceRules;
use crate::evaluator::content::Content;
use crate::evaluator::types::{ComplianceIssue, IssueType, Severity};

/// Below this many words, absence of a voice marker is not meaningful.
const MIN_WORDS_FOR_ABSENCE: usize = 20;

lazy_static! {
    static ref CONTRACTION: Option<Regex> = Regex::new(
        r"(?i)\b(?:\w+n't|\w+'(?:re|ve|ll|d|m)|(?:it|that|let|what|there|here|he|she|who)'s)\b"
    )
    .ok();
    static ref FIRST_PERSON_SINGULAR: TermSet = TermSet::new(["i", "me", "my", "mine", "myself"]);
    static ref FIRST_PERSON_PLURAL: TermSet = TermSet::new(["we", "us", "our", "ours", "ourselves"]);
    static ref SECOND_PERSON: TermSet = TermSet::new(["you", "your", "yours", "yourself"]);
}

pub(crate) fn check_voice(content: &Content, voice: &VoiceRules) -> Vec<ComplianceIssue> {
    let text = content.normalized().replace('\u{2019}', "'");
    let long_enough = content.word_count() >= MIN_WORDS_FOR_ABSENCE;
    let mut issues = Vec::new();

    let contractions: Vec<String> = {
        let mut found: Vec<String> = Vec::new();
        if let Some(pattern) = CONTRACTION.as_ref() {
            for hit in pattern.find_iter(&text) {
                let hit = hit.as_str().to_string();
                if !found.contains(&hit) {
                    found.push(hit);
                }
            }
        }
        found
    };
    match voice.use_contractions {
        Some(false) if !contractions.is_empty() => issues.push(ComplianceIssue::new(
            IssueType::Voice,
            Severity::Medium,
            "Contractions conflict with the brand's formal voice",
            format!("Write out contractions such as \"{}\"", contractions[0]),
        )),
        Some(true) if contractions.is_empty() && long_enough => issues.push(ComplianceIssue::new(
            IssueType::Voice,
            Severity::Low,
            "No contractions used in a conversational voice",
            "Use contractions like \"we're\" or \"you'll\" to sound natural",
        )),
        _ => {}
    }

    if voice.avoid_first_person_singular && FIRST_PERSON_SINGULAR.is_match(&text) {
        issues.push(ComplianceIssue::new(
            IssueType::Voice,
            Severity::Medium,
            "First-person singular pronouns used",
            "Speak as the brand (\"we\") rather than as an individual (\"I\")",
        ));
    }

    push_pronoun_expectation(
        &mut issues,
        voice.first_person_plural,
        FIRST_PERSON_PLURAL.is_match(&text),
        long_enough,
        ("Brand voice should speak as \"we\"", "Refer to the brand as \"we\" and \"our\""),
        ("First-person plural pronouns used", "Refer to the brand by name instead of \"we\""),
    );
    push_pronoun_expectation(
        &mut issues,
        voice.address_reader,
        SECOND_PERSON.is_match(&text),
        long_enough,
        ("Content does not address the reader directly", "Speak to the reader as \"you\""),
        ("Content addresses the reader directly", "Use third person instead of \"you\""),
    );

    issues
}

fn push_pronoun_expectation(
    issues: &mut Vec<ComplianceIssue>,
    expected: Option<bool>,
    present: bool,
    long_enough: bool,
    missing: (&str, &str),
    unwanted: (&str, &str),
) {
    let message = match expected {
        Some(true) if !present && long_enough => missing,
        Some(false) if present => unwanted,
        _ => return,
    };
    issues.push(ComplianceIssue::new(
        IssueType::Voice,
        Severity::Low,
        message.0,
        message.1,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(text: &str) -> Content {
        Content::new(text, 10_000).unwrap()
    }

    #[test]
    fn contractions_are_flagged_when_disallowed() {
        let voice = VoiceRules {
            use_contractions: Some(false),
            ..VoiceRules::default()
        };
        let issues = check_voice(&content("We can’t wait, it's here"), &voice);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Medium);
        assert!(issues[0].suggestion.contains("can't"));
    }

    #[test]
    fn possessives_are_not_contractions() {
        let voice = VoiceRules {
            use_contractions: Some(false),
            ..VoiceRules::default()
        };
        assert!(check_voice(&content("The company's new office opens"), &voice).is_empty());
    }

    #[test]
    fn missing_markers_only_matter_for_longer_text() {
        let voice = VoiceRules {
            use_contractions: Some(true),
            first_person_plural: Some(true),
            address_reader: Some(true),
            avoid_first_person_singular: false,
        };
        assert!(check_voice(&content("The product ships on Monday."), &voice).is_empty());

        let long = "The product ships on Monday with a refreshed design, a longer battery life, \
                    improved sound quality and a new companion application for every platform.";
        let issues = check_voice(&content(long), &voice);
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|issue| issue.severity == Severity::Low));
    }

    #[test]
    fn singular_first_person_is_flagged() {
        let voice = VoiceRules {
            avoid_first_person_singular: true,
            first_person_plural: Some(false),
            ..VoiceRules::default()
        };
        let issues = check_voice(&content("I think my team and our partners agree"), &voice);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].description, "First-person singular pronouns used");
        assert_eq!(issues[1].description, "First-person plural pronouns used");
    }
}
