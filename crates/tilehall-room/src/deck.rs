//! The wall: a full tile set in draw order.

use std::collections::VecDeque;
#[cfg(test)]
use std::collections::HashMap;

use rand::Rng;
use rand::seq::SliceRandom;
use tilehall_protocol::Tile;

use crate::RoomError;

/// An ordered pile of tiles. Draws come off the front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    tiles: VecDeque<Tile>,
}

impl Deck {
    /// A full, unshuffled set: every face four times, grouped by face in
    /// canonical order (four `1t`, four `2t`, …, four `white`).
    pub fn build() -> Self {
        let tiles = Tile::faces()
            .flat_map(|face| std::iter::repeat_n(face, Tile::COPIES_PER_FACE))
            .collect();
        Self { tiles }
    }

    /// A deck with no tiles.
    pub fn empty() -> Self {
        Self {
            tiles: VecDeque::new(),
        }
    }

    /// Shuffles in place with the thread-local RNG.
    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rand::rng());
    }

    /// Shuffles in place (Fisher–Yates) with the given RNG.
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.tiles.make_contiguous().shuffle(rng);
    }

    /// Removes and returns the front tile.
    pub fn draw(&mut self) -> Result<Tile, RoomError> {
        self.tiles.pop_front().ok_or(RoomError::DeckExhausted)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tiles in draw order.
    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// How many copies of each face remain.
    #[cfg(test)]
    pub(crate) fn counts(&self) -> HashMap<Tile, usize> {
        let mut counts = HashMap::with_capacity(Tile::FACE_COUNT);
        for tile in &self.tiles {
            *counts.entry(*tile).or_insert(0) += 1;
        }
        counts
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::build()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tilehall_protocol::{Dragon, Suit};

    use super::*;

    fn full_counts(counts: &HashMap<Tile, usize>) -> bool {
        counts.len() == Tile::FACE_COUNT
            && counts.values().all(|&n| n == Tile::COPIES_PER_FACE)
    }

    #[test]
    fn test_build_has_full_set() {
        let deck = Deck::build();
        assert_eq!(deck.len(), Tile::FULL_SET);
        assert!(full_counts(&deck.counts()));
    }

    #[test]
    fn test_build_is_canonical_order() {
        let deck = Deck::build();
        let tiles: Vec<Tile> = deck.iter().copied().collect();
        let one_bamboo = Tile::suited(Suit::Bamboo, 1).unwrap();

        assert!(tiles[..4].iter().all(|t| *t == one_bamboo));
        assert_eq!(tiles[4], Tile::suited(Suit::Bamboo, 2).unwrap());
        assert_eq!(tiles[Tile::FULL_SET - 1], Tile::Dragon(Dragon::White));
    }

    #[test]
    fn test_shuffle_preserves_multiset() {
        let mut deck = Deck::build();
        for _ in 0..5 {
            deck.shuffle();
            assert_eq!(deck.len(), Tile::FULL_SET);
            assert!(full_counts(&deck.counts()));
        }
    }

    #[test]
    fn test_shuffle_changes_order() {
        let fresh = Deck::build();
        let mut a = Deck::build();
        let mut b = Deck::build();
        a.shuffle();
        b.shuffle();

        // 136! orderings; a collision here means the RNG is broken.
        assert_ne!(a, fresh);
        assert_ne!(a, b);
    }

    #[test]
    fn test_shuffle_with_seed_is_reproducible() {
        let mut a = Deck::build();
        let mut b = Deck::build();
        a.shuffle_with(&mut StdRng::seed_from_u64(7));
        b.shuffle_with(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_draw_takes_front() {
        let mut deck = Deck::build();
        assert_eq!(deck.draw().unwrap(), Tile::suited(Suit::Bamboo, 1).unwrap());
        assert_eq!(deck.len(), Tile::FULL_SET - 1);
    }

    #[test]
    fn test_draw_empty_is_exhausted() {
        let mut deck = Deck::empty();
        assert!(deck.is_empty());
        assert_eq!(deck.draw(), Err(RoomError::DeckExhausted));
    }

    #[test]
    fn test_draw_until_exhausted() {
        let mut deck = Deck::build();
        for _ in 0..Tile::FULL_SET {
            deck.draw().unwrap();
        }
        assert_eq!(deck.draw(), Err(RoomError::DeckExhausted));
    }
}
