use crate::config::LevelSettings;
use crate::error::PipelineError;
use crate::generation::GenerationConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How hard the rewrite pushes. Ordered from most to least aggressive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimplificationLevel {
    Basic,
    Intermediate,
    Advanced,
}

impl SimplificationLevel {
    pub const ALL: [SimplificationLevel; 3] = [Self::Basic, Self::Intermediate, Self::Advanced];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }

    fn builtin(self) -> GenerationConfig {
        match self {
            Self::Basic => GenerationConfig::rewrite(
                "Simplify the following legal text into very simple English that a 10-year-old can understand:",
                160,
                0.7,
            ),
            Self::Intermediate => {
                GenerationConfig::rewrite("Simplify the following legal text into plain English:", 256, 0.5)
            }
            Self::Advanced => GenerationConfig::rewrite(
                "Rewrite the following legal text in clearer, more accessible language:",
                384,
                0.3,
            ),
        }
    }
}

impl Default for SimplificationLevel {
    fn default() -> Self {
        Self::Intermediate
    }
}

impl fmt::Display for SimplificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimplificationLevel {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(PipelineError::InvalidLevel(s.to_string())),
        }
    }
}

/// Level → generation config table, fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelProfiles {
    primary: [GenerationConfig; 3],
    fallback: [GenerationConfig; 3],
}

impl LevelProfiles {
    pub fn from_settings(overrides: &LevelSettings) -> Self {
        let pick = |level: SimplificationLevel, custom: &Option<GenerationConfig>| {
            custom.clone().unwrap_or_else(|| level.builtin())
        };
        let primary = [
            pick(SimplificationLevel::Basic, &overrides.basic),
            pick(SimplificationLevel::Intermediate, &overrides.intermediate),
            pick(SimplificationLevel::Advanced, &overrides.advanced),
        ];
        let fallback = [primary[0].reduced(), primary[1].reduced(), primary[2].reduced()];
        Self { primary, fallback }
    }

    pub fn config(&self, level: SimplificationLevel) -> &GenerationConfig {
        &self.primary[level.slot()]
    }

    pub fn fallback(&self, level: SimplificationLevel) -> &GenerationConfig {
        &self.fallback[level.slot()]
    }
}

impl Default for LevelProfiles {
    fn default() -> Self {
        Self::from_settings(&LevelSettings::default())
    }
}
