use std::collections::HashSet;

use regex::{Regex, RegexBuilder};

/// Terms per compiled alternation; larger lists are split across several patterns.
const CHUNK_TERMS: usize = 2_000;
const PATTERN_SIZE_LIMIT: usize = 64 * (1 << 20);

/// A compiled, case-insensitive set of terms and phrases.
///
/// Word boundaries are asserted only on edges that are word characters, so
/// "hell" does not fire inside "shell" while "!!!" or "18+" still match.
/// Every term stays matchable: a list too large for one pattern is chunked, and
/// a term no pattern can be built for is scanned literally.
#[derive(Debug, Clone)]
pub(crate) struct TermSet {
    terms: Vec<String>,
    patterns: Vec<Regex>,
    literals: Vec<String>,
}

impl TermSet {
    pub(crate) fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut cleaned: Vec<String> = Vec::new();
        for term in terms {
            let term = term.as_ref().trim().to_lowercase();
            if !term.is_empty() && seen.insert(term.clone()) {
                cleaned.push(term);
            }
        }
        // Longest first so the reported match is the most specific phrase.
        cleaned.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));

        let mut patterns = Vec::new();
        let mut literals = Vec::new();
        for chunk in cleaned.chunks(CHUNK_TERMS) {
            compile_chunk(chunk, &mut patterns, &mut literals);
        }

        TermSet {
            terms: cleaned,
            patterns,
            literals,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub(crate) fn is_match(&self, text: &str) -> bool {
        if self.patterns.iter().any(|regex| regex.is_match(text)) {
            return true;
        }
        if self.literals.is_empty() {
            return false;
        }
        let lowered = text.to_lowercase();
        self.literals
            .iter()
            .any(|term| literal_hits(term, &lowered).next().is_some())
    }

    pub(crate) fn first_match(&self, text: &str) -> Option<String> {
        self.hits(text, false).into_iter().next().map(|(_, term)| term)
    }

    /// Distinct matched terms in order of first appearance.
    pub(crate) fn all_matches(&self, text: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for (_, term) in self.hits(text, true) {
            if !found.contains(&term) {
                found.push(term);
            }
        }
        found
    }

    /// Matches as (offset, lowercased term), earliest first, longer first on ties.
    fn hits(&self, text: &str, every: bool) -> Vec<(usize, String)> {
        let mut hits: Vec<(usize, String)> = Vec::new();
        for regex in &self.patterns {
            if every {
                hits.extend(
                    regex
                        .find_iter(text)
                        .map(|found| (found.start(), found.as_str().to_lowercase())),
                );
            } else if let Some(found) = regex.find(text) {
                hits.push((found.start(), found.as_str().to_lowercase()));
            }
        }
        if !self.literals.is_empty() {
            let lowered = text.to_lowercase();
            for term in &self.literals {
                let mut offsets = literal_hits(term, &lowered);
                if every {
                    hits.extend(offsets.map(|offset| (offset, term.clone())));
                } else if let Some(offset) = offsets.next() {
                    hits.push((offset, term.clone()));
                }
            }
        }
        hits.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.len().cmp(&a.1.len())));
        hits
    }
}

fn compile_chunk(chunk: &[String], patterns: &mut Vec<Regex>, literals: &mut Vec<String>) {
    match build_alternation(chunk) {
        Ok(regex) => patterns.push(regex),
        Err(err) if chunk.len() > 1 => {
            log::debug!("Splitting term pattern of {} terms: {}", chunk.len(), err);
            let (left, right) = chunk.split_at(chunk.len() / 2);
            compile_chunk(left, patterns, literals);
            compile_chunk(right, patterns, literals);
        }
        Err(err) => {
            log::warn!("Matching term \"{}\" literally: {}", chunk[0], err);
            literals.extend(chunk.iter().cloned());
        }
    }
}

fn build_alternation(terms: &[String]) -> Result<Regex, regex::Error> {
    let alternation = terms
        .iter()
        .map(|term| term_pattern(term))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&format!("(?:{alternation})"))
        .case_insensitive(true)
        .size_limit(PATTERN_SIZE_LIMIT)
        .dfa_size_limit(PATTERN_SIZE_LIMIT)
        .build()
}

/// Offsets of `term` in already-lowercased text, honoring the same edge rules.
fn literal_hits<'a>(term: &'a str, lowered: &'a str) -> impl Iterator<Item = usize> + 'a {
    let leading = term.chars().next().is_some_and(is_word_char);
    let trailing = term.chars().last().is_some_and(is_word_char);
    lowered
        .match_indices(term)
        .map(|(offset, _)| offset)
        .filter(move |&offset| {
            let before = lowered[..offset].chars().next_back().is_some_and(is_word_char);
            let after = lowered[offset + term.len()..]
                .chars()
                .next()
                .is_some_and(is_word_char);
            !(leading && before) && !(trailing && after)
        })
}

fn term_pattern(term: &str) -> String {
    let escaped = regex::escape(term);
    let leading = term.chars().next().map(is_word_char).unwrap_or(false);
    let trailing = term.chars().last().map(is_word_char).unwrap_or(false);
    format!(
        "{}{}{}",
        if leading { r"\b" } else { "" },
        escaped,
        if trailing { r"\b" } else { "" }
    )
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
