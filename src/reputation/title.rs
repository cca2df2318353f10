//! Secondary Titles
//!
//! Cosmetic rank shown next to a name. Combines the tier with fame and
//! alignment breakpoints; it never feeds back into the tier.

use serde::{Deserialize, Serialize};

use crate::reputation::{ActorStanding, ReputationTier};

pub const FAME_HIGH: i32 = 750;
pub const FAME_LOW: i32 = 250;
pub const ALIGNMENT_HIGH: i32 = 1000;
pub const ALIGNMENT_LOW: i32 = 500;

/// Breakpoint reached by an actor, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleRank {
    /// fame >= 750
    Legendary,
    /// fame >= 250
    Renowned,
    /// alignment >= 1000
    Exalted,
    /// alignment >= 500
    Respected,
}

impl TitleRank {
    /// Fame breakpoints are checked before alignment breakpoints.
    pub fn from_values(fame: i32, alignment: i32) -> Option<Self> {
        if fame >= FAME_HIGH {
            Some(TitleRank::Legendary)
        } else if fame >= FAME_LOW {
            Some(TitleRank::Renowned)
        } else if alignment >= ALIGNMENT_HIGH {
            Some(TitleRank::Exalted)
        } else if alignment >= ALIGNMENT_LOW {
            Some(TitleRank::Respected)
        } else {
            None
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            TitleRank::Legendary => "legendary",
            TitleRank::Renowned => "renowned",
            TitleRank::Exalted => "exalted",
            TitleRank::Respected => "respected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Title {
    pub tier: ReputationTier,
    /// `None` only for the base RED title
    pub rank: Option<TitleRank>,
}

impl Title {
    /// Message key for external localization, e.g. `title.red.base`.
    pub fn key(&self) -> String {
        let rank = self.rank.map(|r| r.as_str()).unwrap_or("base");
        format!("title.{}.{}", self.tier.as_str(), rank)
    }
}

/// BLUE and GRAY without a breakpoint have no title; RED always has one.
pub fn title_for(tier: ReputationTier, fame: i32, alignment: i32) -> Option<Title> {
    let rank = TitleRank::from_values(fame, alignment);
    match (tier, rank) {
        (ReputationTier::Red, rank) => Some(Title { tier, rank }),
        (_, Some(rank)) => Some(Title { tier, rank: Some(rank) }),
        (_, None) => None,
    }
}

pub fn title_of(standing: &ActorStanding) -> Option<Title> {
    title_for(standing.tier(), standing.fame, standing.alignment)
}

/// Renders titles for a locale. Localization proper lives outside the core.
pub trait TitleCatalog: Send + Sync {
    fn render(&self, title: &Title, locale: &str) -> String;
}

/// Built-in English names; every locale falls back to them.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnglishTitles;

impl TitleCatalog for EnglishTitles {
    fn render(&self, title: &Title, _locale: &str) -> String {
        use ReputationTier::*;
        use TitleRank::*;

        let name = match (title.tier, title.rank) {
            (Blue, Some(Legendary)) => "Paragon",
            (Blue, Some(Renowned)) => "Champion",
            (Blue, Some(Exalted)) => "Saint",
            (Blue, Some(Respected)) => "Guardian",
            (Gray, Some(Legendary)) => "Infamous Rogue",
            (Gray, Some(Renowned)) => "Rogue",
            (Gray, Some(Exalted)) => "Repentant",
            (Gray, Some(Respected)) => "Drifter",
            (Red, Some(Legendary)) => "Dread Lord",
            (Red, Some(Renowned)) => "Reaver",
            (Red, Some(Exalted)) => "Penitent Killer",
            (Red, Some(Respected)) => "Cutthroat",
            (Red, None) => "Murderer",
            (Blue, None) | (Gray, None) => "",
        };
        name.to_string()
    }
}
