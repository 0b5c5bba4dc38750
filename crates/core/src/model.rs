//! Model selection: user-facing tiers mapped to provider model ids by config.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The small set of user-facing model labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    #[default]
    Lite,
    Fast,
    Smart,
    Turbo,
}

impl ModelTier {
    pub const ALL: [ModelTier; 4] = [Self::Lite, Self::Fast, Self::Smart, Self::Turbo];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Lite => "Lite",
            Self::Fast => "Fast",
            Self::Smart => "Smart",
            Self::Turbo => "Turbo",
        }
    }
}

impl std::fmt::Display for ModelTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ModelTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown model '{s}' (choose Lite, Fast, Smart or Turbo)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("smart".parse::<ModelTier>().unwrap(), ModelTier::Smart);
        assert_eq!(" TURBO ".parse::<ModelTier>().unwrap(), ModelTier::Turbo);
        assert!("mega".parse::<ModelTier>().is_err());
    }

    #[test]
    fn default_is_first_tier() {
        assert_eq!(ModelTier::default(), ModelTier::Lite);
    }
}
