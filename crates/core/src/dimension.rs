//! Dimension identifiers.
//!
//! Gameplay scripts are dimension-scoped (the shulker respawn loop only runs
//! for players in the End, sapling checks always read the Overworld), so every
//! world query carries a dimension.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for a world dimension.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DimensionId {
    /// The Overworld dimension.
    #[default]
    Overworld,
    /// The Nether dimension.
    Nether,
    /// The End dimension.
    #[serde(rename = "the_end", alias = "end")]
    End,
}

impl DimensionId {
    /// Namespaced identifier used by the scripting host (`minecraft:the_end`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overworld => "minecraft:overworld",
            Self::Nether => "minecraft:nether",
            Self::End => "minecraft:the_end",
        }
    }
}

impl fmt::Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_namespaced_ids() {
        assert_eq!(DimensionId::End.to_string(), "minecraft:the_end");
        assert_eq!(DimensionId::default(), DimensionId::Overworld);
    }

    #[test]
    fn serde_uses_host_names() {
        let json = serde_json::to_string(&DimensionId::End).unwrap();
        assert_eq!(json, "\"the_end\"");
        let parsed: DimensionId = serde_json::from_str("\"end\"").unwrap();
        assert_eq!(parsed, DimensionId::End);
        let parsed: DimensionId = serde_json::from_str("\"overworld\"").unwrap();
        assert_eq!(parsed, DimensionId::Overworld);
    }
}
