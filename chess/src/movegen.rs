//! Legal move generation

use crate::bitboard::Bitboard;
use crate::board::Position;
use crate::moves::{self, Move, MoveKind, PromotePiece};
use crate::types::{CastlingSide, Color, Coord, Piece};
use crate::{attack, bitboard_consts, castling, geometry, pawns};

use std::ops::{Deref, DerefMut};
use std::slice;

use arrayvec::ArrayVec;

/// List of moves, stored on the stack
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct MoveList(ArrayVec<Move, 256>);

impl MoveList {
    pub fn new() -> MoveList {
        MoveList(ArrayVec::new())
    }
}

impl Deref for MoveList {
    type Target = ArrayVec<Move, 256>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for MoveList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a mut MoveList {
    type Item = &'a mut Move;
    type IntoIter = slice::IterMut<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter_mut()
    }
}

/// Returns `true` if the square `coord` is attacked by any piece of color `by`
pub fn is_attacked(pos: &Position, coord: Coord, by: Color) -> bool {
    // The attack is traced from the target square, so the pawn attack map is
    // taken for the opposite color.
    let pawn_attacks = attack::pawn(by.inv(), coord);

    // Near attacks
    if (pos.piece2(by, Piece::Pawn) & pawn_attacks).is_nonempty()
        || (pos.piece2(by, Piece::King) & attack::king(coord)).is_nonempty()
        || (pos.piece2(by, Piece::Knight) & attack::knight(coord)).is_nonempty()
    {
        return true;
    }

    // Far attacks
    (attack::bishop(coord, pos.all) & pos.piece_diag(by)).is_nonempty()
        || (attack::rook(coord, pos.all) & pos.piece_line(by)).is_nonempty()
}

/// Returns the set of pieces of color `by` attacking the square `coord`
pub fn attackers(pos: &Position, coord: Coord, by: Color) -> Bitboard {
    let pawn_attacks = attack::pawn(by.inv(), coord);
    (pos.piece2(by, Piece::Pawn) & pawn_attacks)
        | (pos.piece2(by, Piece::King) & attack::king(coord))
        | (pos.piece2(by, Piece::Knight) & attack::knight(coord))
        | (attack::bishop(coord, pos.all) & pos.piece_diag(by))
        | (attack::rook(coord, pos.all) & pos.piece_line(by))
}

/// Returns `true` if the king of the side to move is currently attacked
pub fn in_check(pos: &Position) -> bool {
    let side = pos.side();
    is_attacked(pos, pos.king_pos(side), side.inv())
}

fn push_pawn(list: &mut MoveList, src: Coord, dst: Coord, kind: MoveKind, is_promote: bool) {
    if is_promote {
        for p in [
            PromotePiece::Knight,
            PromotePiece::Bishop,
            PromotePiece::Rook,
            PromotePiece::Queen,
        ] {
            list.push(Move {
                src,
                dst,
                promote: Some(p),
                kind,
            });
        }
    } else {
        list.push(Move {
            src,
            dst,
            promote: None,
            kind,
        });
    }
}

fn gen_pawn(pos: &Position, side: Color, list: &mut MoveList) {
    let our_pawns = pos.piece2(side, Piece::Pawn);
    let promote_rank = bitboard_consts::rank(geometry::pawn_promote_rank(side));
    let forward = geometry::pawn_forward_delta(side);

    for dst in pawns::advance_forward(side, our_pawns) & !pos.all {
        push_pawn(
            list,
            dst.add(-forward),
            dst,
            MoveKind::Quiet,
            promote_rank.has(dst),
        );
    }

    let home = our_pawns & bitboard_consts::rank(geometry::pawn_home_rank(side));
    let step = pawns::advance_forward(side, home) & !pos.all;
    for dst in pawns::advance_forward(side, step) & !pos.all {
        list.push(Move {
            src: dst.add(-2 * forward),
            dst,
            promote: None,
            kind: MoveKind::DoublePush,
        });
    }

    let enemies = pos.color(side.inv());
    for dst in pawns::advance_left(side, our_pawns) & enemies {
        push_pawn(
            list,
            dst.add(-geometry::pawn_left_delta(side)),
            dst,
            MoveKind::Capture,
            promote_rank.has(dst),
        );
    }
    for dst in pawns::advance_right(side, our_pawns) & enemies {
        push_pawn(
            list,
            dst.add(-geometry::pawn_right_delta(side)),
            dst,
            MoveKind::Capture,
            promote_rank.has(dst),
        );
    }

    if let Some(target) = pos.s.ep_target {
        // Pawns able to capture onto the target square are exactly those a pawn
        // of the opposite color would attack from there.
        for src in attack::pawn(side.inv(), target) & our_pawns {
            list.push(Move {
                src,
                dst: target,
                promote: None,
                kind: MoveKind::EnPassant,
            });
        }
    }
}

fn push_attacks(pos: &Position, side: Color, src: Coord, att: Bitboard, list: &mut MoveList) {
    for dst in att & !pos.color(side) {
        let kind = match pos.all.has(dst) {
            true => MoveKind::Capture,
            false => MoveKind::Quiet,
        };
        list.push(Move {
            src,
            dst,
            promote: None,
            kind,
        });
    }
}

fn gen_near(pos: &Position, side: Color, list: &mut MoveList) {
    for src in pos.piece2(side, Piece::Knight) {
        push_attacks(pos, side, src, attack::knight(src), list);
    }
    for src in pos.piece2(side, Piece::King) {
        push_attacks(pos, side, src, attack::king(src), list);
    }
}

fn gen_sliders(pos: &Position, side: Color, list: &mut MoveList) {
    for src in pos.piece_diag(side) {
        push_attacks(pos, side, src, attack::bishop(src, pos.all), list);
    }
    for src in pos.piece_line(side) {
        push_attacks(pos, side, src, attack::rook(src, pos.all), list);
    }
}

fn gen_castling(pos: &Position, side: Color, list: &mut MoveList) {
    for s in [CastlingSide::King, CastlingSide::Queen] {
        if !pos.s.castling.has(side, s) {
            continue;
        }
        if (pos.all & castling::pass(side, s)).is_nonempty() {
            continue;
        }
        let mv = Move::from_castling(side, s);
        let transit = match s {
            CastlingSide::King => mv.src.add(1),
            CastlingSide::Queen => mv.src.add(-1),
        };
        if !is_attacked(pos, mv.src, side.inv()) && !is_attacked(pos, transit, side.inv()) {
            list.push(mv);
        }
    }
}

fn gen_semilegal(pos: &Position) -> MoveList {
    let side = pos.side();
    let mut list = MoveList::new();
    gen_pawn(pos, side, &mut list);
    gen_near(pos, side, &mut list);
    gen_sliders(pos, side, &mut list);
    gen_castling(pos, side, &mut list);
    list
}

fn is_move_legal(pos: &Position, mv: Move) -> bool {
    let mut next = pos.clone();
    moves::apply_unchecked(&mut next, mv);
    !next.is_opponent_king_attacked()
}

/// Generates all legal moves in the given position
pub fn legal_moves(pos: &Position) -> MoveList {
    let mut list = gen_semilegal(pos);
    list.retain(|&mut mv| is_move_legal(pos, mv));
    list
}

/// Returns `true` if the side to move has at least one legal move
pub fn has_legal_moves(pos: &Position) -> bool {
    gen_semilegal(pos).iter().any(|&mv| is_move_legal(pos, mv))
}

/// Returns `true` if the side to move is checkmated
pub fn is_checkmate(pos: &Position) -> bool {
    in_check(pos) && !has_legal_moves(pos)
}

/// Returns `true` if the side to move is stalemated
pub fn is_stalemate(pos: &Position) -> bool {
    !in_check(pos) && !has_legal_moves(pos)
}

/// Counts the leaf nodes of the legal move tree of the given depth
///
/// Useful to verify move generation, see [Perft](https://www.chessprogramming.org/Perft).
pub fn perft(pos: &Position, depth: usize) -> u64 {
    match depth {
        0 => 1,
        1 => legal_moves(pos).len() as u64,
        _ => legal_moves(pos)
            .iter()
            .map(|&mv| {
                let mut next = pos.clone();
                moves::apply_unchecked(&mut next, mv);
                perft(&next, depth - 1)
            })
            .sum(),
    }
}
