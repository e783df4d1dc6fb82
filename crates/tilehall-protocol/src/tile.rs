//! Tile faces and their wire codes.
//!
//! A tile is a plain value: two tiles with the same face are
//! interchangeable, so `Tile` is `Copy` and compares by value. The full
//! set is 34 faces, each present four times in a fresh deck.
//!
//! On the wire every tile is a short string code, using the same codes the
//! browser client renders:
//!
//! ```text
//! 1t … 9t   bamboo
//! 1p … 9p   dots
//! 1w … 9w   characters
//! east south west north
//! red green white
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Face components
// ---------------------------------------------------------------------------

/// The three numbered suits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Suit {
    /// Bamboo (`t`).
    Bamboo,
    /// Dots (`p`).
    Dots,
    /// Characters (`w`).
    Characters,
}

impl Suit {
    /// All suits in canonical deck order.
    pub const ALL: [Suit; 3] = [Suit::Bamboo, Suit::Dots, Suit::Characters];

    /// The one-letter suffix used in the wire code.
    pub fn code(self) -> char {
        match self {
            Self::Bamboo => 't',
            Self::Dots => 'p',
            Self::Characters => 'w',
        }
    }

    fn from_code(c: char) -> Option<Self> {
        match c {
            't' => Some(Self::Bamboo),
            'p' => Some(Self::Dots),
            'w' => Some(Self::Characters),
            _ => None,
        }
    }
}

/// The four wind tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Wind {
    East,
    South,
    West,
    North,
}

impl Wind {
    /// All winds in canonical deck order.
    pub const ALL: [Wind; 4] = [Wind::East, Wind::South, Wind::West, Wind::North];

    fn code(self) -> &'static str {
        match self {
            Self::East => "east",
            Self::South => "south",
            Self::West => "west",
            Self::North => "north",
        }
    }
}

/// The three dragon (honor) tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dragon {
    Red,
    Green,
    White,
}

impl Dragon {
    /// All dragons in canonical deck order.
    pub const ALL: [Dragon; 3] = [Dragon::Red, Dragon::Green, Dragon::White];

    fn code(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::White => "white",
        }
    }
}

// ---------------------------------------------------------------------------
// Tile
// ---------------------------------------------------------------------------

/// One tile face.
///
/// Serialized as its string code (`"5p"`, `"north"`, …) via the
/// `Display` / `FromStr` pair, so a malformed code is rejected when the
/// client message is decoded rather than deep inside a room.
///
/// Construct suited tiles with [`Tile::suited`], which checks the rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Tile {
    /// A numbered tile, rank 1–9.
    Suited { suit: Suit, rank: u8 },
    /// A wind tile.
    Wind(Wind),
    /// A dragon tile.
    Dragon(Dragon),
}

impl Tile {
    /// Number of distinct faces.
    pub const FACE_COUNT: usize = 34;

    /// Copies of each face in a full set.
    pub const COPIES_PER_FACE: usize = 4;

    /// Total tiles in a full set (34 × 4).
    pub const FULL_SET: usize = Self::FACE_COUNT * Self::COPIES_PER_FACE;

    /// Builds a suited tile, or `None` if `rank` is outside 1–9.
    pub fn suited(suit: Suit, rank: u8) -> Option<Self> {
        (1..=9)
            .contains(&rank)
            .then_some(Self::Suited { suit, rank })
    }

    /// Every face exactly once, in canonical deck order:
    /// bamboo 1–9, dots 1–9, characters 1–9, winds, dragons.
    pub fn faces() -> impl Iterator<Item = Tile> {
        Suit::ALL
            .into_iter()
            .flat_map(|suit| (1..=9).map(move |rank| Tile::Suited { suit, rank }))
            .chain(Wind::ALL.into_iter().map(Tile::Wind))
            .chain(Dragon::ALL.into_iter().map(Tile::Dragon))
    }

    /// Returns `true` for wind and dragon tiles.
    pub fn is_honor(&self) -> bool {
        !matches!(self, Self::Suited { .. })
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Suited { suit, rank } => write!(f, "{rank}{}", suit.code()),
            Self::Wind(w) => f.write_str(w.code()),
            Self::Dragon(d) => f.write_str(d.code()),
        }
    }
}

impl FromStr for Tile {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProtocolError::InvalidTile(s.to_string());

        if let Some(w) = Wind::ALL.into_iter().find(|w| w.code() == s) {
            return Ok(Self::Wind(w));
        }
        if let Some(d) = Dragon::ALL.into_iter().find(|d| d.code() == s) {
            return Ok(Self::Dragon(d));
        }

        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(r), Some(c), None) => {
                let rank = r.to_digit(10).ok_or_else(invalid)? as u8;
                let suit = Suit::from_code(c).ok_or_else(invalid)?;
                Self::suited(suit, rank).ok_or_else(invalid)
            }
            _ => Err(invalid()),
        }
    }
}

impl From<Tile> for String {
    fn from(tile: Tile) -> Self {
        tile.to_string()
    }
}

impl TryFrom<String> for Tile {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
