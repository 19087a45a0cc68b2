use crate::error::EvaluationError;

/// Text under evaluation. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    raw: String,
    normalized: String,
    length: usize,
}

impl Content {
    pub fn new(raw: impl Into<String>, max_chars: usize) -> Result<Self, EvaluationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EvaluationError::validation("content must not be empty"));
        }
        let length = raw.chars().count();
        if length > max_chars {
            return Err(EvaluationError::validation(format!(
                "content is {length} characters, limit is {max_chars}"
            )));
        }
        let normalized = trimmed.to_lowercase();
        Ok(Content {
            raw,
            normalized,
            length,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn word_count(&self) -> usize {
        self.normalized.split_whitespace().count()
    }

    pub fn preview(&self, max_chars: usize) -> String {
        preview(&self.raw, max_chars)
    }
}

/// Truncates on a char boundary, marking the cut with "...".
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
