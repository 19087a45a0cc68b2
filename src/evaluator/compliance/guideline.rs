use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::GuidelineError;

/// Environment variable pointing at a guideline JSON file.
pub const GUIDELINE_PATH_ENV: &str = "BRAND_SAFETY_GUIDELINE";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneRules {
    /// Attributes the brand should sound like, e.g. "professional", "friendly".
    pub primary: Vec<String>,
    /// Attributes the brand must not sound like, e.g. "aggressive", "sarcastic".
    pub avoid: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceRules {
    pub use_contractions: Option<bool>,
    pub first_person_plural: Option<bool>,
    pub address_reader: Option<bool>,
    pub avoid_first_person_singular: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferredTerm {
    pub term: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminologyRules {
    pub avoid: Vec<String>,
    pub preferred: Vec<PreferredTerm>,
    /// Terms exempt from avoid-lists in technical contexts.
    pub technical_allow: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneOverride {
    pub primary: Option<Vec<String>>,
    pub avoid: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceOverride {
    pub use_contractions: Option<bool>,
    pub first_person_plural: Option<bool>,
    pub address_reader: Option<bool>,
    pub avoid_first_person_singular: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextOverride {
    pub tone: Option<ToneOverride>,
    pub voice: Option<VoiceOverride>,
    pub avoid_terms: Vec<String>,
    pub technical: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandGuideline {
    pub name: String,
    pub tone: ToneRules,
    pub voice: VoiceRules,
    pub terminology: TerminologyRules,
    pub contexts: BTreeMap<String, ContextOverride>,
}

impl BrandGuideline {
    pub fn from_json_str(raw: &str) -> Result<Self, GuidelineError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn context_override(&self, context: &str) -> Option<&ContextOverride> {
        let wanted = context.trim().to_lowercase();
        self.contexts
            .iter()
            .find(|(key, _)| key.trim().to_lowercase() == wanted)
            .map(|(_, value)| value)
    }

    /// Tone rules after applying the context's redefinitions.
    pub fn effective_tone(&self, context: Option<&str>) -> ToneRules {
        let mut tone = self.tone.clone();
        if let Some(over) = context
            .and_then(|ctx| self.context_override(ctx))
            .and_then(|over| over.tone.as_ref())
        {
            if let Some(primary) = &over.primary {
                tone.primary = primary.clone();
            }
            if let Some(avoid) = &over.avoid {
                tone.avoid = avoid.clone();
            }
        }
        tone
    }

    /// Voice rules after applying the context's redefinitions.
    pub fn effective_voice(&self, context: Option<&str>) -> VoiceRules {
        let mut voice = self.voice.clone();
        if let Some(over) = context
            .and_then(|ctx| self.context_override(ctx))
            .and_then(|over| over.voice.as_ref())
        {
            if over.use_contractions.is_some() {
                voice.use_contractions = over.use_contractions;
            }
            if over.first_person_plural.is_some() {
                voice.first_person_plural = over.first_person_plural;
            }
            if over.address_reader.is_some() {
                voice.address_reader = over.address_reader;
            }
            if let Some(avoid) = over.avoid_first_person_singular {
                voice.avoid_first_person_singular = avoid;
            }
        }
        voice
    }
}

/// Supplies the brand guideline. Failure disables compliance evaluation only.
pub trait GuidelineSource: Send + Sync {
    fn load_guideline(&self) -> Result<BrandGuideline, GuidelineError>;
}

/// Reads a guideline from a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonGuidelineSource {
    path: PathBuf,
}

impl JsonGuidelineSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonGuidelineSource {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn from_env() -> Option<Self> {
        std::env::var_os(GUIDELINE_PATH_ENV)
            .filter(|value| !value.is_empty())
            .map(JsonGuidelineSource::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GuidelineSource for JsonGuidelineSource {
    fn load_guideline(&self) -> Result<BrandGuideline, GuidelineError> {
        let raw = fs::read_to_string(&self.path)?;
        let mut guideline = BrandGuideline::from_json_str(&raw)?;
        if guideline.name.trim().is_empty() {
            guideline.name = self
                .path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("guideline")
                .to_string();
        }
        Ok(guideline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const GUIDELINE_JSON: &str = r#"{
        "tone": {"primary": ["friendly"], "avoid": ["aggressive"]},
        "voice": {"use_contractions": true},
        "contexts": {
            "Legal": {
                "tone": {"primary": ["formal"]},
                "voice": {"use_contractions": false}
            }
        }
    }"#;

    #[test]
    fn json_source_loads_and_names_guideline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("acme.json");
        fs::write(&path, GUIDELINE_JSON).unwrap();

        let guideline = JsonGuidelineSource::new(&path).load_guideline().unwrap();
        assert_eq!(guideline.name, "acme");
        assert_eq!(guideline.tone.primary, vec!["friendly".to_string()]);
        assert!(guideline.terminology.avoid.is_empty());
    }

    #[test]
    fn missing_or_invalid_files_fail() {
        let dir = TempDir::new().unwrap();
        let missing = JsonGuidelineSource::new(dir.path().join("none.json"));
        assert!(matches!(missing.load_guideline(), Err(GuidelineError::Io(_))));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            JsonGuidelineSource::new(&broken).load_guideline(),
            Err(GuidelineError::Parse(_))
        ));
    }

    #[test]
    fn context_overrides_redefine_tone_and_voice() {
        let guideline = BrandGuideline::from_json_str(GUIDELINE_JSON).unwrap();

        let tone = guideline.effective_tone(Some("legal"));
        assert_eq!(tone.primary, vec!["formal".to_string()]);
        assert_eq!(tone.avoid, vec!["aggressive".to_string()]);
        assert_eq!(guideline.effective_voice(Some("LEGAL")).use_contractions, Some(false));

        assert_eq!(guideline.effective_tone(None).primary, vec!["friendly".to_string()]);
        assert_eq!(guideline.effective_voice(Some("blog")).use_contractions, Some(true));
    }
}
