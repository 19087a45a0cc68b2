// src/config.rs

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::evaluator::RiskLevel;

/// One severity tier of a category: any of `terms` present yields `level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTier {
    pub level: RiskLevel,
    pub terms: Vec<String>,
}

fn tier(level: RiskLevel, terms: &[&str]) -> RiskTier {
    RiskTier {
        level,
        terms: terms.iter().map(|term| term.to_string()).collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub name: String,
    pub tiers: Vec<RiskTier>,
}

impl CategoryDefinition {
    fn new(name: &str, tiers: Vec<RiskTier>) -> Self {
        CategoryDefinition {
            name: name.to_string(),
            tiers,
        }
    }
}

/// Highest tolerated level per category, plus `default` and `overall` keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskTolerances(pub BTreeMap<String, RiskLevel>);

impl RiskTolerances {
    pub const DEFAULT_KEY: &'static str = "default";
    pub const OVERALL_KEY: &'static str = "overall";

    pub fn tolerance_for(&self, category: &str) -> RiskLevel {
        self.0
            .get(category)
            .or_else(|| self.0.get(Self::DEFAULT_KEY))
            .copied()
            .unwrap_or(RiskLevel::Medium)
    }

    pub fn overall(&self) -> RiskLevel {
        self.tolerance_for(Self::OVERALL_KEY)
    }

    fn merge(&mut self, update: BTreeMap<String, RiskLevel>) {
        for (category, level) in update {
            self.0.insert(category, level);
        }
    }
}

impl Default for RiskTolerances {
    fn default() -> Self {
        let mut map = BTreeMap::new();
        map.insert(Self::DEFAULT_KEY.to_string(), RiskLevel::Medium);
        map.insert(Self::OVERALL_KEY.to_string(), RiskLevel::Medium);
        map.insert("hate_speech".to_string(), RiskLevel::Low);
        map.insert("self_harm".to_string(), RiskLevel::Low);
        RiskTolerances(map)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyConfig {
    pub sensitive_keywords: Vec<String>,
    pub allowed_topics: Vec<String>,
    pub blocked_topics: Vec<String>,
    pub risk_tolerances: RiskTolerances,
    pub categories: Vec<CategoryDefinition>,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        SafetyConfig {
            sensitive_keywords: Vec::new(),
            allowed_topics: Vec::new(),
            blocked_topics: Vec::new(),
            risk_tolerances: RiskTolerances::default(),
            categories: DEFAULT_CATEGORIES.clone(),
        }
    }
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfigUpdate {
    pub sensitive_keywords: Option<Vec<String>>,
    pub allowed_topics: Option<Vec<String>>,
    pub blocked_topics: Option<Vec<String>>,
    pub risk_tolerances: Option<BTreeMap<String, RiskLevel>>,
    pub categories: Option<Vec<CategoryDefinition>>,
}

impl SafetyConfig {
    /// Shallow merge; `risk_tolerances` is merged one level deep.
    pub fn merge(&self, update: SafetyConfigUpdate) -> SafetyConfig {
        let mut merged = self.clone();
        if let Some(keywords) = update.sensitive_keywords {
            merged.sensitive_keywords = keywords;
        }
        if let Some(topics) = update.allowed_topics {
            merged.allowed_topics = topics;
        }
        if let Some(topics) = update.blocked_topics {
            merged.blocked_topics = topics;
        }
        if let Some(tolerances) = update.risk_tolerances {
            merged.risk_tolerances.merge(tolerances);
        }
        if let Some(categories) = update.categories {
            merged.categories = categories;
        }
        merged
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // Batch windowing
    pub batch_window: usize,       // Default: 10, capped at max_concurrent
    pub max_concurrent: usize,     // Default: 10 items in flight per batch
    // Contextual oracle
    pub oracle_timeout_ms: u64,    // Default: 10 seconds
    pub oracle_max_chars: usize,   // Default: 4000 chars sent to the provider
    // Input limits
    pub max_content_chars: usize,  // Default: 100_000
}

impl EngineConfig {
    pub const DEFAULT_MAX_CONCURRENT: usize = 10;

    /// Window for one batch: the requested size, else `batch_window`, within 1..=max_concurrent.
    pub fn window_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.batch_window)
            .clamp(1, self.max_concurrent.max(1))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            batch_window: 10,
            max_concurrent: Self::DEFAULT_MAX_CONCURRENT,
            oracle_timeout_ms: 10_000,
            oracle_max_chars: 4_000,
            max_content_chars: 100_000,
        }
    }
}

lazy_static! {
    static ref DEFAULT_CATEGORIES: Vec<CategoryDefinition> = vec![
        CategoryDefinition::new(
            "violence",
            vec![
                tier(RiskLevel::VeryHigh, &["mass shooting", "bomb threat", "behead", "massacre"]),
                tier(RiskLevel::High, &["kill", "murder", "shoot", "stab", "assault", "bloodbath"]),
                tier(RiskLevel::Medium, &["fight", "attack", "weapon", "gun", "blood", "punch"]),
                tier(RiskLevel::Low, &["battle", "hit", "destroy", "crush"]),
            ],
        ),
        CategoryDefinition::new(
            "hate_speech",
            vec![
                tier(RiskLevel::VeryHigh, &["ethnic cleansing", "white power", "racial purity"]),
                tier(RiskLevel::High, &["subhuman", "vermin", "go back to your country"]),
                tier(RiskLevel::Medium, &["those people", "inferior race", "bigot"]),
            ],
        ),
        CategoryDefinition::new(
            "sexual",
            vec![
                tier(RiskLevel::VeryHigh, &["explicit sex", "porn", "pornography"]),
                tier(RiskLevel::High, &["nude", "nsfw", "xxx", "18+"]),
                tier(RiskLevel::Medium, &["sexy", "seductive", "lingerie"]),
                tier(RiskLevel::Low, &["flirt", "romantic"]),
            ],
        ),
        CategoryDefinition::new(
            "self_harm",
            vec![
                tier(RiskLevel::VeryHigh, &["kill myself", "suicide method", "end my life"]),
                tier(RiskLevel::High, &["suicide", "self-harm", "self harm", "cutting myself"]),
                tier(RiskLevel::Medium, &["hopeless", "want to disappear"]),
            ],
        ),
        CategoryDefinition::new(
            "profanity",
            vec![
                tier(RiskLevel::High, &["fuck", "motherfucker", "cunt"]),
                tier(RiskLevel::Medium, &["shit", "bitch", "bastard", "asshole", "damn", "hell"]),
                tier(RiskLevel::Low, &["crap", "freaking", "sucks"]),
            ],
        ),
        CategoryDefinition::new(
            "alcohol",
            vec![
                tier(RiskLevel::High, &["binge drinking", "get wasted", "blackout drunk"]),
                tier(RiskLevel::Medium, &["beer", "wine", "vodka", "whiskey", "cocktail", "drunk", "booze"]),
                tier(RiskLevel::Low, &["bar", "pub", "happy hour"]),
            ],
        ),
        CategoryDefinition::new(
            "drugs",
            vec![
                tier(RiskLevel::VeryHigh, &["buy cocaine", "buy heroin", "sell drugs"]),
                tier(RiskLevel::High, &["cocaine", "heroin", "meth", "fentanyl", "lsd"]),
                tier(RiskLevel::Medium, &["marijuana", "cannabis", "weed", "get high"]),
                tier(RiskLevel::Low, &["stoned", "420"]),
            ],
        ),
        CategoryDefinition::new(
            "gambling",
            vec![
                tier(RiskLevel::High, &["guaranteed win", "can't lose", "bet your savings"]),
                tier(RiskLevel::Medium, &["casino", "betting", "jackpot", "poker", "slot machine"]),
                tier(RiskLevel::Low, &["lottery", "raffle", "odds"]),
            ],
        ),
    ];
}
