//! Flag colors that posts can be marked with.
//!
//! The set of colors is fixed; consumers identify them either by numeric id
//! (wire/persistence contract) or by lowercase name (config and CLI input).

use serde::{Deserialize, Serialize};

/// A flag color assignable to posts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagColor {
    Gray,
    Blue,
    Green,
    Yellow,
    Orange,
    Red,
    Purple,
}

impl FlagColor {
    /// All flag colors, in id order.
    pub const ALL: [FlagColor; 7] = [
        FlagColor::Gray,
        FlagColor::Blue,
        FlagColor::Green,
        FlagColor::Yellow,
        FlagColor::Orange,
        FlagColor::Red,
        FlagColor::Purple,
    ];

    /// Returns the stable numeric id for this color.
    pub fn id(&self) -> u8 {
        match self {
            FlagColor::Gray => 1,
            FlagColor::Blue => 2,
            FlagColor::Green => 3,
            FlagColor::Yellow => 4,
            FlagColor::Orange => 5,
            FlagColor::Red => 6,
            FlagColor::Purple => 7,
        }
    }

    /// Looks up a color by its numeric id.
    pub fn from_id(id: u8) -> Option<FlagColor> {
        FlagColor::ALL.into_iter().find(|c| c.id() == id)
    }

    /// Returns the lowercase name for this color.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagColor::Gray => "gray",
            FlagColor::Blue => "blue",
            FlagColor::Green => "green",
            FlagColor::Yellow => "yellow",
            FlagColor::Orange => "orange",
            FlagColor::Red => "red",
            FlagColor::Purple => "purple",
        }
    }

    /// Looks up a color by its lowercase name.
    pub fn from_name(name: &str) -> Option<FlagColor> {
        FlagColor::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl std::fmt::Display for FlagColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
