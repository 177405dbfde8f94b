//! Piece kinds and the static shape catalog.
//!
//! Shapes are fixed-orientation: a kind's offset set never changes for the
//! process lifetime. There is no rotation anywhere in the core.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Board coordinate. Also used for piece offsets relative to the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Closed enumeration of every piece shape the game can deliver.
///
/// Three tiers: tetromino-like shapes, small "well" helper shapes used to
/// relieve pressure, and heavy five-cell shapes. Declaration order is the
/// canonical iteration order and must stay stable: candidate evaluation and
/// bag refills walk it, so reordering variants changes emitted sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
    Dot,
    DominoH,
    DominoV,
    DiagDown,
    DiagUp,
    TriLineH,
    TriLineV,
    TriCorner,
    Square2,
    Plus5,
    LongL,
}

const ALL_KINDS: [PieceKind; 18] = [
    PieceKind::I,
    PieceKind::O,
    PieceKind::T,
    PieceKind::S,
    PieceKind::Z,
    PieceKind::J,
    PieceKind::L,
    PieceKind::Dot,
    PieceKind::DominoH,
    PieceKind::DominoV,
    PieceKind::DiagDown,
    PieceKind::DiagUp,
    PieceKind::TriLineH,
    PieceKind::TriLineV,
    PieceKind::TriCorner,
    PieceKind::Square2,
    PieceKind::Plus5,
    PieceKind::LongL,
];

/// Pool family used by the enabled-kind toggles. Tetromino and Core kinds
/// are always enabled; the other families can be switched off per config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceFamily {
    Tetromino,
    Core,
    Domino,
    Tromino,
    Heavy,
}

impl PieceKind {
    /// Offsets of the shape's cells relative to the anchor cell.
    #[must_use]
    pub const fn offsets(self) -> &'static [Coord] {
        const fn c(x: i32, y: i32) -> Coord {
            Coord::new(x, y)
        }
        match self {
            Self::I => const { &[c(0, 0), c(1, 0), c(2, 0), c(3, 0)] },
            Self::O => const { &[c(0, 0), c(1, 0), c(0, 1), c(1, 1)] },
            Self::T => const { &[c(0, 0), c(1, 0), c(2, 0), c(1, 1)] },
            Self::S => const { &[c(1, 0), c(2, 0), c(0, 1), c(1, 1)] },
            Self::Z => const { &[c(0, 0), c(1, 0), c(1, 1), c(2, 1)] },
            Self::J => const { &[c(0, 0), c(0, 1), c(1, 1), c(2, 1)] },
            Self::L => const { &[c(2, 0), c(0, 1), c(1, 1), c(2, 1)] },
            Self::Dot => const { &[c(0, 0)] },
            Self::DominoH => const { &[c(0, 0), c(1, 0)] },
            Self::DominoV => const { &[c(0, 0), c(0, 1)] },
            Self::DiagDown => const { &[c(0, 0), c(1, 1)] },
            Self::DiagUp => const { &[c(0, 1), c(1, 0)] },
            Self::TriLineH => const { &[c(0, 0), c(1, 0), c(2, 0)] },
            Self::TriLineV => const { &[c(0, 0), c(0, 1), c(0, 2)] },
            Self::TriCorner => const { &[c(0, 0), c(1, 0), c(0, 1)] },
            Self::Square2 => const { &[c(0, 0), c(1, 0), c(0, 1), c(1, 1)] },
            Self::Plus5 => const { &[c(1, 0), c(0, 1), c(1, 1), c(2, 1), c(1, 2)] },
            Self::LongL => const { &[c(0, 0), c(0, 1), c(0, 2), c(0, 3), c(1, 3)] },
        }
    }

    /// Number of cells in the shape.
    #[must_use]
    pub const fn cell_count(self) -> usize {
        self.offsets().len()
    }

    /// Every kind in canonical declaration order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &ALL_KINDS
    }

    #[must_use]
    pub const fn family(self) -> PieceFamily {
        match self {
            Self::I | Self::O | Self::T | Self::S | Self::Z | Self::J | Self::L => {
                PieceFamily::Tetromino
            }
            Self::Dot | Self::Square2 => PieceFamily::Core,
            Self::DominoH | Self::DominoV | Self::DiagDown | Self::DiagUp => PieceFamily::Domino,
            Self::TriLineH | Self::TriLineV | Self::TriCorner => PieceFamily::Tromino,
            Self::Plus5 | Self::LongL => PieceFamily::Heavy,
        }
    }

    /// Well-tier shapes relieve backlog pressure and are never sticky.
    #[must_use]
    pub const fn is_well_kind(self) -> bool {
        matches!(
            self,
            Self::Dot
                | Self::DominoH
                | Self::DominoV
                | Self::DiagDown
                | Self::DiagUp
                | Self::TriLineH
                | Self::TriLineV
                | Self::TriCorner
                | Self::Square2
        )
    }
}

/// An immutable piece instance handed to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    kind: PieceKind,
    cells: SmallVec<[Coord; 5]>,
    sticky: bool,
}

impl Piece {
    #[must_use]
    pub fn new(kind: PieceKind) -> Self {
        Self::with_sticky(kind, false)
    }

    #[must_use]
    pub fn with_sticky(kind: PieceKind, sticky: bool) -> Self {
        Self {
            kind,
            cells: SmallVec::from_slice(kind.offsets()),
            sticky,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub fn cells(&self) -> &[Coord] {
        &self.cells
    }

    #[must_use]
    pub const fn is_sticky(&self) -> bool {
        self.sticky
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_cell_counts_match_tiers() {
        assert_eq!(PieceKind::Dot.cell_count(), 1);
        assert_eq!(PieceKind::DominoH.cell_count(), 2);
        assert_eq!(PieceKind::DiagUp.cell_count(), 2);
        assert_eq!(PieceKind::TriCorner.cell_count(), 3);
        assert_eq!(PieceKind::I.cell_count(), 4);
        assert_eq!(PieceKind::Plus5.cell_count(), 5);
        assert_eq!(PieceKind::LongL.cell_count(), 5);
    }

    #[test]
    fn all_kinds_are_distinct_and_cover_catalog() {
        let kinds = PieceKind::all();
        assert_eq!(kinds.len(), 18);
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn well_tier_is_small_shapes_only() {
        for kind in PieceKind::all() {
            if kind.is_well_kind() {
                assert!(kind.cell_count() <= 4, "{kind:?} too large for well tier");
            }
        }
        assert!(!PieceKind::I.is_well_kind());
        assert!(!PieceKind::Plus5.is_well_kind());
        assert!(PieceKind::Square2.is_well_kind());
        assert!(PieceKind::DiagDown.is_well_kind());
    }

    #[test]
    fn tetromino_and_core_families_are_fixed() {
        assert_eq!(PieceKind::I.family(), PieceFamily::Tetromino);
        assert_eq!(PieceKind::Dot.family(), PieceFamily::Core);
        assert_eq!(PieceKind::Square2.family(), PieceFamily::Core);
        assert_eq!(PieceKind::DominoV.family(), PieceFamily::Domino);
        assert_eq!(PieceKind::TriLineV.family(), PieceFamily::Tromino);
        assert_eq!(PieceKind::LongL.family(), PieceFamily::Heavy);
    }

    #[test]
    fn piece_copies_catalog_offsets() {
        let piece = Piece::new(PieceKind::L);
        assert_eq!(piece.cells(), PieceKind::L.offsets());
        assert!(!piece.is_sticky());
        let hazard = Piece::with_sticky(PieceKind::Z, true);
        assert!(hazard.is_sticky());
    }
}
