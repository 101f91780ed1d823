use crate::bitboard::Bitboard;
use crate::types::{CastlingSide, Color};

#[inline]
pub const fn offset(c: Color) -> usize {
    match c {
        Color::White => 0,
        Color::Black => 56,
    }
}

/// Squares between the king and the rook, which must be empty to allow castling.
#[inline]
pub const fn pass(c: Color, s: CastlingSide) -> Bitboard {
    let x: u64 = match s {
        CastlingSide::King => 0x60,
        CastlingSide::Queen => 0x0e,
    };
    Bitboard::from_raw(x << offset(c))
}

/// Initial king and rook squares for the given castling right.
#[inline]
pub const fn srcs(c: Color, s: CastlingSide) -> Bitboard {
    let x: u64 = match s {
        CastlingSide::King => 0x90,
        CastlingSide::Queen => 0x11,
    };
    Bitboard::from_raw(x << offset(c))
}

pub const ALL_SRCS: Bitboard = Bitboard::from_raw(0x91 | (0x91 << 56));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Coord, File, Rank};

    #[test]
    fn test_masks() {
        for (c, rank) in [(Color::White, Rank::R1), (Color::Black, Rank::R8)] {
            assert_eq!(
                pass(c, CastlingSide::King),
                Bitboard::EMPTY
                    .with(Coord::from_parts(File::F, rank))
                    .with(Coord::from_parts(File::G, rank))
            );
            assert_eq!(
                pass(c, CastlingSide::Queen),
                Bitboard::EMPTY
                    .with(Coord::from_parts(File::B, rank))
                    .with(Coord::from_parts(File::C, rank))
                    .with(Coord::from_parts(File::D, rank))
            );
            assert_eq!(
                srcs(c, CastlingSide::King),
                Bitboard::EMPTY
                    .with(Coord::from_parts(File::E, rank))
                    .with(Coord::from_parts(File::H, rank))
            );
            assert_eq!(
                srcs(c, CastlingSide::Queen),
                Bitboard::EMPTY
                    .with(Coord::from_parts(File::A, rank))
                    .with(Coord::from_parts(File::E, rank))
            );
        }
        assert_eq!(
            ALL_SRCS,
            srcs(Color::White, CastlingSide::King)
                | srcs(Color::White, CastlingSide::Queen)
                | srcs(Color::Black, CastlingSide::King)
                | srcs(Color::Black, CastlingSide::Queen)
        );
    }
}
