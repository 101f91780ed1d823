use crate::bitboard::Bitboard;
use crate::types::{Color, Coord};

#[inline]
const fn bb(val: u64) -> Bitboard {
    Bitboard::from_raw(val)
}

include!(concat!(env!("OUT_DIR"), "/near_attacks.rs"));
include!(concat!(env!("OUT_DIR"), "/magic.rs"));

#[inline]
pub fn king(coord: Coord) -> Bitboard {
    unsafe { *KING_ATTACKS.get_unchecked(coord.index()) }
}

#[inline]
pub fn knight(coord: Coord) -> Bitboard {
    unsafe { *KNIGHT_ATTACKS.get_unchecked(coord.index()) }
}

#[inline]
pub fn pawn(color: Color, coord: Coord) -> Bitboard {
    match color {
        Color::White => unsafe { *WHITE_PAWN_ATTACKS.get_unchecked(coord.index()) },
        Color::Black => unsafe { *BLACK_PAWN_ATTACKS.get_unchecked(coord.index()) },
    }
}

#[inline]
pub fn rook(coord: Coord, occupied: Bitboard) -> Bitboard {
    unsafe {
        let i = coord.index();
        let magic = *MAGIC_CONSTS_ROOK.get_unchecked(i);
        let shift = *MAGIC_SHIFTS_ROOK.get_unchecked(i);
        let mask = *MAGIC_MASKS_ROOK.get_unchecked(i);
        let idx = (occupied & mask).as_raw().wrapping_mul(magic) >> shift;
        *MAGIC_LOOKUP_ROOK.get_unchecked(*MAGIC_OFFSETS_ROOK.get_unchecked(i) + idx as usize)
    }
}

#[inline]
pub fn bishop(coord: Coord, occupied: Bitboard) -> Bitboard {
    unsafe {
        let i = coord.index();
        let magic = *MAGIC_CONSTS_BISHOP.get_unchecked(i);
        let shift = *MAGIC_SHIFTS_BISHOP.get_unchecked(i);
        let mask = *MAGIC_MASKS_BISHOP.get_unchecked(i);
        let idx = (occupied & mask).as_raw().wrapping_mul(magic) >> shift;
        *MAGIC_LOOKUP_BISHOP.get_unchecked(*MAGIC_OFFSETS_BISHOP.get_unchecked(i) + idx as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{File, Rank};

    fn c(file: File, rank: Rank) -> Coord {
        Coord::from_parts(file, rank)
    }

    #[test]
    fn test_near() {
        assert_eq!(king(c(File::A, Rank::R1)).popcount(), 3);
        assert_eq!(king(c(File::E, Rank::R4)).popcount(), 8);
        assert_eq!(knight(c(File::A, Rank::R1)).popcount(), 2);
        assert_eq!(knight(c(File::D, Rank::R4)).popcount(), 8);
        assert_eq!(
            pawn(Color::White, c(File::E, Rank::R2)),
            Bitboard::EMPTY
                .with(c(File::D, Rank::R3))
                .with(c(File::F, Rank::R3))
        );
        assert_eq!(
            pawn(Color::Black, c(File::A, Rank::R7)),
            Bitboard::EMPTY.with(c(File::B, Rank::R6))
        );
    }

    #[test]
    fn test_sliders() {
        let empty = Bitboard::EMPTY;
        assert_eq!(rook(c(File::A, Rank::R1), empty).popcount(), 14);
        assert_eq!(bishop(c(File::A, Rank::R1), empty).popcount(), 7);
        assert_eq!(bishop(c(File::D, Rank::R4), empty).popcount(), 13);

        // A blocker stops the ray but is itself attacked.
        let occupied = Bitboard::EMPTY.with(c(File::A, Rank::R4));
        let att = rook(c(File::A, Rank::R1), occupied);
        assert!(att.has(c(File::A, Rank::R4)));
        assert!(!att.has(c(File::A, Rank::R5)));
        assert!(att.has(c(File::H, Rank::R1)));
    }
}
