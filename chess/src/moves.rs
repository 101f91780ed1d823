//! Moves and their application

use crate::bitboard::Bitboard;
use crate::board::Position;
use crate::types::{CastlingSide, Cell, Color, Coord, File, Piece};
use crate::{attack, castling, geometry, movegen};

use std::fmt;

use thiserror::Error;

/// Move kind
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MoveKind {
    /// Non-capturing move, including non-capturing promotions
    Quiet = 0,
    /// Capture of an enemy piece on the destination square
    Capture = 1,
    /// En passant capture
    EnPassant = 2,
    /// Kingside castling
    CastleKingside = 3,
    /// Queenside castling
    CastleQueenside = 4,
    /// Double pawn push from the home rank
    DoublePush = 5,
}

/// Target piece for promotion
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PromotePiece {
    Knight = 0,
    Bishop = 1,
    Rook = 2,
    Queen = 3,
}

impl From<PromotePiece> for Piece {
    #[inline]
    fn from(p: PromotePiece) -> Self {
        match p {
            PromotePiece::Knight => Piece::Knight,
            PromotePiece::Bishop => Piece::Bishop,
            PromotePiece::Rook => Piece::Rook,
            PromotePiece::Queen => Piece::Queen,
        }
    }
}

impl PromotePiece {
    pub fn as_char(&self) -> char {
        match *self {
            PromotePiece::Knight => 'n',
            PromotePiece::Bishop => 'b',
            PromotePiece::Rook => 'r',
            PromotePiece::Queen => 'q',
        }
    }
}

/// Chess move
///
/// A move only makes sense relative to the position it was generated in. Applying it
/// to any other position yields an error from [`Position::make()`] in the best case
/// and an arbitrary legal move in the worst one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Move {
    /// Source square
    pub src: Coord,
    /// Destination square
    ///
    /// For castling, this is the destination square of the king.
    pub dst: Coord,
    /// Promotion target, present iff the move is a pawn move onto the last rank
    pub promote: Option<PromotePiece>,
    /// Move kind
    pub kind: MoveKind,
}

/// Error indicating that the move cannot be applied to the given position
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum IllegalMoveError {
    /// The move doesn't pass the structural checks against the position
    #[error("move is not semi-legal")]
    NotSemiLegal,
    /// The move is structurally fine but leaves the own king under attack
    #[error("move leaves own king under attack")]
    KingAttacked,
}

impl Move {
    /// Creates a castling move made by `color` with side `side`
    #[inline]
    pub fn from_castling(color: Color, side: CastlingSide) -> Move {
        let rank = geometry::castling_rank(color);
        let (dst_file, kind) = match side {
            CastlingSide::King => (File::G, MoveKind::CastleKingside),
            CastlingSide::Queen => (File::C, MoveKind::CastleQueenside),
        };
        Move {
            src: Coord::from_parts(File::E, rank),
            dst: Coord::from_parts(dst_file, rank),
            promote: None,
            kind,
        }
    }

    /// Returns `true` if the move captures something, including en passant
    #[inline]
    pub fn is_capture(&self) -> bool {
        matches!(self.kind, MoveKind::Capture | MoveKind::EnPassant)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}{}", self.src, self.dst)?;
        if let Some(p) = self.promote {
            write!(f, "{}", p.as_char())?;
        }
        Ok(())
    }
}

/// Verifies the move against the position, ignoring king safety.
///
/// Checks that the moved piece exists, that the geometry of the move is possible on the
/// current occupancy, and that the kind and promotion fields are consistent with it.
pub(crate) fn is_semilegal(pos: &Position, mv: Move) -> bool {
    let side = pos.side();
    let src_cell = pos.get(mv.src);
    if src_cell.color() != Some(side) {
        return false;
    }
    let pawn = Cell::from_parts(side, Piece::Pawn);

    // Promotion requires a pawn arriving at the last rank, and vice versa.
    if mv.promote.is_some() {
        if src_cell != pawn
            || mv.dst.rank() != geometry::pawn_promote_rank(side)
            || !matches!(mv.kind, MoveKind::Quiet | MoveKind::Capture)
        {
            return false;
        }
    } else if src_cell == pawn && mv.dst.rank() == geometry::pawn_promote_rank(side) {
        return false;
    }

    match mv.kind {
        MoveKind::Quiet | MoveKind::Capture => {
            let dst = Bitboard::from_coord(mv.dst);
            match mv.kind {
                MoveKind::Quiet => {
                    if (dst & pos.all).is_nonempty() {
                        return false;
                    }
                }
                _ => {
                    if (dst & pos.color(side.inv())).is_empty() {
                        return false;
                    }
                }
            }
            match src_cell.piece() {
                Some(Piece::Pawn) => match mv.kind {
                    MoveKind::Quiet => {
                        mv.dst == mv.src.add(geometry::pawn_forward_delta(side))
                    }
                    _ => attack::pawn(side, mv.src).has(mv.dst),
                },
                Some(Piece::Knight) => attack::knight(mv.src).has(mv.dst),
                Some(Piece::Bishop) => attack::bishop(mv.src, pos.all).has(mv.dst),
                Some(Piece::Rook) => attack::rook(mv.src, pos.all).has(mv.dst),
                Some(Piece::Queen) => {
                    attack::bishop(mv.src, pos.all).has(mv.dst)
                        || attack::rook(mv.src, pos.all).has(mv.dst)
                }
                Some(Piece::King) => attack::king(mv.src).has(mv.dst),
                None => unreachable!(),
            }
        }
        MoveKind::DoublePush => {
            if src_cell != pawn
                || mv.src.rank() != geometry::pawn_home_rank(side)
                || mv.src.file() != mv.dst.file()
                || mv.dst != mv.src.add(2 * geometry::pawn_forward_delta(side))
            {
                return false;
            }
            let must_empty = match side {
                Color::White => Bitboard::from_raw(0x0101 << (mv.src.index() + 8)),
                Color::Black => Bitboard::from_raw(0x0101 << (mv.src.index() - 16)),
            };
            (pos.all & must_empty).is_empty()
        }
        MoveKind::EnPassant => {
            src_cell == pawn
                && pos.s.ep_target == Some(mv.dst)
                && attack::pawn(side, mv.src).has(mv.dst)
        }
        MoveKind::CastleKingside => {
            mv.src == Coord::from_parts(File::E, geometry::castling_rank(side))
                && mv.dst == Coord::from_parts(File::G, geometry::castling_rank(side))
                && pos.s.castling.has(side, CastlingSide::King)
                && (pos.all & castling::pass(side, CastlingSide::King)).is_empty()
                && !movegen::is_attacked(pos, mv.src, side.inv())
                && !movegen::is_attacked(pos, mv.src.add(1), side.inv())
        }
        MoveKind::CastleQueenside => {
            mv.src == Coord::from_parts(File::E, geometry::castling_rank(side))
                && mv.dst == Coord::from_parts(File::C, geometry::castling_rank(side))
                && pos.s.castling.has(side, CastlingSide::Queen)
                && (pos.all & castling::pass(side, CastlingSide::Queen)).is_empty()
                && !movegen::is_attacked(pos, mv.src, side.inv())
                && !movegen::is_attacked(pos, mv.src.add(-1), side.inv())
        }
    }
}

fn update_castling(pos: &mut Position, change: Bitboard) {
    if (change & castling::ALL_SRCS).is_empty() {
        return;
    }
    for (c, s) in [
        (Color::White, CastlingSide::Queen),
        (Color::White, CastlingSide::King),
        (Color::Black, CastlingSide::Queen),
        (Color::Black, CastlingSide::King),
    ] {
        if (change & castling::srcs(c, s)).is_nonempty() {
            pos.s.castling.unset(c, s);
        }
    }
}

fn apply_castling(pos: &mut Position, side: Color, castle: CastlingSide) {
    let king = Cell::from_parts(side, Piece::King);
    let rook = Cell::from_parts(side, Piece::Rook);
    let rank = geometry::castling_rank(side);
    let off = castling::offset(side);
    match castle {
        CastlingSide::King => {
            pos.s.put2(File::E, rank, Cell::EMPTY);
            pos.s.put2(File::F, rank, rook);
            pos.s.put2(File::G, rank, king);
            pos.s.put2(File::H, rank, Cell::EMPTY);
            *pos.color_mut(side) ^= Bitboard::from_raw(0xf0 << off);
            *pos.piece_mut(rook) ^= Bitboard::from_raw(0xa0 << off);
            *pos.piece_mut(king) ^= Bitboard::from_raw(0x50 << off);
        }
        CastlingSide::Queen => {
            pos.s.put2(File::A, rank, Cell::EMPTY);
            pos.s.put2(File::C, rank, king);
            pos.s.put2(File::D, rank, rook);
            pos.s.put2(File::E, rank, Cell::EMPTY);
            *pos.color_mut(side) ^= Bitboard::from_raw(0x1d << off);
            *pos.piece_mut(rook) ^= Bitboard::from_raw(0x09 << off);
            *pos.piece_mut(king) ^= Bitboard::from_raw(0x14 << off);
        }
    }
    pos.s.castling.unset_color(side);
}

/// Applies the move in place, without any validity checks.
///
/// The move must be semi-legal in `pos`. The resulting position may still leave the
/// mover's king under attack, which the caller must detect and discard.
pub(crate) fn apply_unchecked(pos: &mut Position, mv: Move) {
    let side = pos.s.side;
    let src_cell = pos.get(mv.src);
    let dst_cell = pos.get(mv.dst);
    let src = Bitboard::from_coord(mv.src);
    let dst = Bitboard::from_coord(mv.dst);
    let change = src | dst;
    pos.s.ep_target = None;

    match mv.kind {
        MoveKind::Quiet | MoveKind::Capture => {
            let new_cell = match mv.promote {
                Some(p) => Cell::from_parts(side, p.into()),
                None => src_cell,
            };
            pos.s.put(mv.src, Cell::EMPTY);
            pos.s.put(mv.dst, new_cell);
            *pos.color_mut(side) ^= change;
            *pos.piece_mut(src_cell) ^= src;
            *pos.piece_mut(new_cell) ^= dst;
            if dst_cell.is_occupied() {
                *pos.color_mut(side.inv()) &= !dst;
                *pos.piece_mut(dst_cell) &= !dst;
            }
            update_castling(pos, change);
        }
        MoveKind::DoublePush => {
            pos.s.put(mv.src, Cell::EMPTY);
            pos.s.put(mv.dst, src_cell);
            *pos.color_mut(side) ^= change;
            *pos.piece_mut(src_cell) ^= change;
            pos.s.ep_target = Some(mv.src.add(geometry::pawn_forward_delta(side)));
        }
        MoveKind::EnPassant => {
            let victim_pos = mv.dst.add(-geometry::pawn_forward_delta(side));
            let victim = Bitboard::from_coord(victim_pos);
            let their_pawn = Cell::from_parts(side.inv(), Piece::Pawn);
            pos.s.put(mv.src, Cell::EMPTY);
            pos.s.put(mv.dst, src_cell);
            pos.s.put(victim_pos, Cell::EMPTY);
            *pos.color_mut(side) ^= change;
            *pos.piece_mut(src_cell) ^= change;
            *pos.color_mut(side.inv()) ^= victim;
            *pos.piece_mut(their_pawn) ^= victim;
        }
        MoveKind::CastleKingside => apply_castling(pos, side, CastlingSide::King),
        MoveKind::CastleQueenside => apply_castling(pos, side, CastlingSide::Queen),
    }

    if mv.is_capture() || dst_cell.is_occupied() || src_cell == Cell::from_parts(side, Piece::Pawn)
    {
        pos.s.halfmove_clock = 0;
    } else {
        pos.s.halfmove_clock += 1;
    }
    pos.s.side = side.inv();
    if side == Color::Black {
        pos.s.fullmove_number += 1;
    }
    pos.all = pos.white | pos.black;
}

impl Position {
    /// Applies `mv` and returns the successor position, leaving `self` untouched.
    ///
    /// Fails if the move is not legal in `self`.
    pub fn make(&self, mv: Move) -> Result<Position, IllegalMoveError> {
        if !is_semilegal(self, mv) {
            return Err(IllegalMoveError::NotSemiLegal);
        }
        let mut next = self.clone();
        apply_unchecked(&mut next, mv);
        if next.is_opponent_king_attacked() {
            return Err(IllegalMoveError::KingAttacked);
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;
    use std::str::FromStr;

    fn c(s: &str) -> Coord {
        Coord::from_str(s).unwrap()
    }

    fn quiet(src: &str, dst: &str) -> Move {
        Move {
            src: c(src),
            dst: c(dst),
            promote: None,
            kind: MoveKind::Quiet,
        }
    }

    fn capture(src: &str, dst: &str) -> Move {
        Move {
            src: c(src),
            dst: c(dst),
            promote: None,
            kind: MoveKind::Capture,
        }
    }

    #[test]
    fn test_size() {
        assert_eq!(mem::size_of::<Move>(), 4);
    }

    #[test]
    fn test_simple() {
        let mut pos = Position::initial();
        for (mv, fen_str) in [
            (
                Move {
                    kind: MoveKind::DoublePush,
                    ..quiet("e2", "e4")
                },
                "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
            ),
            (
                quiet("b8", "c6"),
                "r1bqkbnr/pppppppp/2n5/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 1 2",
            ),
            (
                quiet("g1", "f3"),
                "r1bqkbnr/pppppppp/2n5/8/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 2 2",
            ),
            (
                Move {
                    kind: MoveKind::DoublePush,
                    ..quiet("e7", "e5")
                },
                "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq e6 0 3",
            ),
            (
                quiet("f1", "b5"),
                "r1bqkbnr/pppp1ppp/2n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 1 3",
            ),
            (
                quiet("g8", "f6"),
                "r1bqkb1r/pppp1ppp/2n2n2/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 2 4",
            ),
            (
                Move::from_castling(Color::White, CastlingSide::King),
                "r1bqkb1r/pppp1ppp/2n2n2/1B2p3/4P3/5N2/PPPP1PPP/RNBQ1RK1 b kq - 3 4",
            ),
            (
                capture("f6", "e4"),
                "r1bqkb1r/pppp1ppp/2n5/1B2p3/4n3/5N2/PPPP1PPP/RNBQ1RK1 w kq - 0 5",
            ),
        ] {
            let prev_fen = pos.as_fen();
            let next = pos.make(mv).unwrap();
            // The source position must stay untouched.
            assert_eq!(pos.as_fen(), prev_fen);
            assert_eq!(next.as_fen(), fen_str);
            assert_eq!(Position::try_from(next.setup()), Ok(next.clone()));
            pos = next;
        }
    }

    #[test]
    fn test_promote() {
        let pos = Position::from_fen("1b1b1K2/2P5/8/8/7k/8/8/8 w - - 0 1").unwrap();

        for (mv, fen_str) in [
            (
                Move {
                    promote: Some(PromotePiece::Queen),
                    ..quiet("c7", "c8")
                },
                "1bQb1K2/8/8/8/7k/8/8/8 b - - 0 1",
            ),
            (
                Move {
                    promote: Some(PromotePiece::Knight),
                    ..capture("c7", "b8")
                },
                "1N1b1K2/8/8/8/7k/8/8/8 b - - 0 1",
            ),
            (
                Move {
                    promote: Some(PromotePiece::Rook),
                    ..capture("c7", "d8")
                },
                "1b1R1K2/8/8/8/7k/8/8/8 b - - 0 1",
            ),
        ] {
            let next = pos.make(mv).unwrap();
            assert_eq!(next.as_fen(), fen_str);
            assert_eq!(Position::try_from(next.setup()), Ok(next.clone()));
        }

        // Promotion field must be consistent with the move.
        assert_eq!(
            pos.make(quiet("c7", "c8")),
            Err(IllegalMoveError::NotSemiLegal)
        );
        assert_eq!(
            pos.make(Move {
                promote: Some(PromotePiece::Queen),
                ..quiet("f8", "f7")
            }),
            Err(IllegalMoveError::NotSemiLegal)
        );
    }

    #[test]
    fn test_pawns() {
        let pos = Position::from_fen("3K4/3p4/8/3PpP2/8/5p2/6P1/2k5 w - e6 0 1").unwrap();

        for (mv, fen_str) in [
            (quiet("g2", "g3"), "3K4/3p4/8/3PpP2/8/5pP1/8/2k5 b - - 0 1"),
            (
                Move {
                    kind: MoveKind::DoublePush,
                    ..quiet("g2", "g4")
                },
                "3K4/3p4/8/3PpP2/6P1/5p2/8/2k5 b - g3 0 1",
            ),
            (capture("g2", "f3"), "3K4/3p4/8/3PpP2/8/5P2/8/2k5 b - - 0 1"),
            (
                Move {
                    kind: MoveKind::EnPassant,
                    ..quiet("d5", "e6")
                },
                "3K4/3p4/4P3/5P2/8/5p2/6P1/2k5 b - - 0 1",
            ),
            (
                Move {
                    kind: MoveKind::EnPassant,
                    ..quiet("f5", "e6")
                },
                "3K4/3p4/4P3/3P4/8/5p2/6P1/2k5 b - - 0 1",
            ),
        ] {
            let next = pos.make(mv).unwrap();
            assert_eq!(next.as_fen(), fen_str);
            assert_eq!(Position::try_from(next.setup()), Ok(next.clone()));
        }
    }

    #[test]
    fn test_illegal() {
        let pos = Position::from_fen(
            "r1bqk2r/ppp2ppp/2np1n2/1Bb1p3/4P3/2PP1N2/PP3PPP/RNBQK2R w KQkq - 0 6",
        )
        .unwrap();

        // Queenside castling path is blocked.
        assert_eq!(
            pos.make(Move::from_castling(Color::White, CastlingSide::Queen)),
            Err(IllegalMoveError::NotSemiLegal)
        );
        // Bishop path is blocked.
        assert_eq!(
            pos.make(capture("b5", "e8")),
            Err(IllegalMoveError::NotSemiLegal)
        );
        // No piece on the source square.
        assert_eq!(
            pos.make(quiet("a3", "a4")),
            Err(IllegalMoveError::NotSemiLegal)
        );
        // Destination occupied by own piece.
        assert_eq!(
            pos.make(quiet("e1", "d1")),
            Err(IllegalMoveError::NotSemiLegal)
        );
        assert_eq!(
            pos.make(capture("e1", "d1")),
            Err(IllegalMoveError::NotSemiLegal)
        );
    }

    #[test]
    fn test_king_safety() {
        // The knight on e2 is pinned by the rook on e8.
        let pos = Position::from_fen("k3r3/8/8/8/8/8/4N3/4K3 w - - 0 1").unwrap();
        assert_eq!(
            pos.make(quiet("e2", "c3")),
            Err(IllegalMoveError::KingAttacked)
        );
        assert!(pos.make(quiet("e1", "d1")).is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(quiet("e2", "e4").to_string(), "e2e4");
        assert_eq!(
            Move {
                promote: Some(PromotePiece::Queen),
                ..quiet("e7", "e8")
            }
            .to_string(),
            "e7e8q"
        );
        assert_eq!(
            Move::from_castling(Color::Black, CastlingSide::Queen).to_string(),
            "e8c8"
        );
    }
}
