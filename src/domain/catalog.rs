//! Fixed vocabularies an event is described with.
//!
//! Every enum here serializes to the token operators pick in the command
//! surface and exposes a human label for the rendered post.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Whether the community attacks or defends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    /// Attacking side.
    Attack,
    /// Defending side.
    Defense,
}

impl Mode {
    /// All modes in display order.
    pub const ALL: [Self; 2] = [Self::Attack, Self::Defense];

    /// Label shown in the event headline.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Attack => "ATTACK",
            Self::Defense => "DEFENSE",
        }
    }
}

/// Consumable rule that applies during the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Alcohol and painkillers allowed.
    Alcohol,
    /// Joints allowed.
    Joints,
    /// Medkits allowed.
    Medkits,
    /// Body armor allowed.
    Armor,
}

impl Condition {
    /// All conditions in display order.
    pub const ALL: [Self; 4] = [Self::Alcohol, Self::Joints, Self::Medkits, Self::Armor];

    /// Label shown in the event post.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Alcohol => "Alcohol/painkillers",
            Self::Joints => "Joints/SPANK",
            Self::Medkits => "Medkits",
            Self::Armor => "Armor",
        }
    }
}

/// Ammunition caliber allowed in the loadout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Caliber {
    /// 5.56 mm.
    #[serde(rename = "5.56")]
    C556,
    /// 7.62 mm.
    #[serde(rename = "7.62")]
    C762,
    /// 11.43 mm.
    #[serde(rename = "11.43")]
    C1143,
    /// 9 mm.
    #[serde(rename = "9")]
    C9,
    /// 12 mm.
    #[serde(rename = "12")]
    C12,
}

impl Caliber {
    /// All calibers in display order.
    pub const ALL: [Self; 5] = [Self::C556, Self::C762, Self::C1143, Self::C9, Self::C12];

    /// Label shown in the event post.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::C556 => "5.56 mm",
            Self::C762 => "7.62 mm",
            Self::C1143 => "11.43 mm",
            Self::C9 => "9 mm",
            Self::C12 => "12 mm",
        }
    }
}

/// Result recorded when an event is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// The community won.
    Win,
    /// The community lost.
    Lose,
}

impl Outcome {
    /// Label used in notifications and archive listings.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Win => "WIN",
            Self::Lose => "LOSE",
        }
    }
}

/// Participant classification derived from role membership.
///
/// Only tiers `1..=3` exist; deserialization rejects anything else so a
/// hand-edited snapshot cannot smuggle in an unrenderable tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Tier(u8);

impl Tier {
    /// Highest tier number.
    pub const MAX: u8 = 3;

    /// All tiers in display order.
    pub const ALL: [Self; 3] = [Self(1), Self(2), Self(3)];

    /// Creates a tier, returning `None` outside `1..=3`.
    #[must_use]
    pub const fn new(n: u8) -> Option<Self> {
        if n >= 1 && n <= Self::MAX {
            Some(Self(n))
        } else {
            None
        }
    }

    /// Returns the tier number.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Self::new(n).ok_or_else(|| format!("tier must be between 1 and {}, got {n}", Self::MAX))
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier.0
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TIER {}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn caliber_uses_operator_tokens() {
        let Ok(json) = serde_json::to_string(&Caliber::C556) else {
            panic!("serialization failed");
        };
        assert_eq!(json, "\"5.56\"");
        let Ok(parsed) = serde_json::from_str::<Caliber>("\"11.43\"") else {
            panic!("deserialization failed");
        };
        assert_eq!(parsed, Caliber::C1143);
    }

    #[test]
    fn mode_and_condition_tokens() {
        let Ok(mode) = serde_json::from_str::<Mode>("\"DEFENSE\"") else {
            panic!("deserialization failed");
        };
        assert_eq!(mode, Mode::Defense);
        let Ok(cond) = serde_json::from_str::<Condition>("\"armor\"") else {
            panic!("deserialization failed");
        };
        assert_eq!(cond, Condition::Armor);
    }

    #[test]
    fn tier_bounds() {
        assert!(Tier::new(0).is_none());
        assert!(Tier::new(4).is_none());
        assert_eq!(Tier::new(2).map(Tier::get), Some(2));
        assert!(serde_json::from_str::<Tier>("7").is_err());
    }
}
