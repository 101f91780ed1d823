//! Moves in SAN format

use crate::board::Position;
use crate::movegen;
use crate::moves::{IllegalMoveError, Move, MoveKind, PromotePiece};
use crate::types::{CastlingSide, Coord, File, Piece, Rank};

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error parsing SAN representation from string
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ParseError {
    /// String is empty
    #[error("string is empty")]
    EmptyString,
    /// Parsing failed for unspecified reasons
    #[error("syntax error")]
    Syntax,
}

/// Error resolving a parsed SAN move against a position
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ResolveError {
    /// No legal move matches the description
    #[error("no such move")]
    NotFound,
    /// More than one legal move matches the description
    #[error("ambiguous move (candidates are at least `{0}` and `{1}`)")]
    Ambiguous(Move, Move),
}

/// Parsed SAN string, with check and annotation marks stripped
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum San {
    /// Castling
    Castling(CastlingSide),
    /// Non-capturing pawn move
    PawnMove {
        /// Destination square
        dst: Coord,
        /// Piece to promote, if any
        promote: Option<PromotePiece>,
    },
    /// Pawn capture
    PawnCapture {
        /// Source file
        src: File,
        /// Destination square
        dst: Coord,
        /// Piece to promote, if any
        promote: Option<PromotePiece>,
    },
    /// Non-pawn move
    Simple {
        /// Piece to move
        piece: Piece,
        /// Source file, if specified
        file: Option<File>,
        /// Source rank, if specified
        rank: Option<Rank>,
        /// Is the move a capture?
        is_capture: bool,
        /// Destination square
        dst: Coord,
    },
}

fn piece_from_char(c: char) -> Option<Piece> {
    match c {
        'N' => Some(Piece::Knight),
        'B' => Some(Piece::Bishop),
        'R' => Some(Piece::Rook),
        'Q' => Some(Piece::Queen),
        'K' => Some(Piece::King),
        _ => None,
    }
}

fn promote_from_char(c: char) -> Option<PromotePiece> {
    match c {
        'N' => Some(PromotePiece::Knight),
        'B' => Some(PromotePiece::Bishop),
        'R' => Some(PromotePiece::Rook),
        'Q' => Some(PromotePiece::Queen),
        _ => None,
    }
}

fn parse_simple(s: &str) -> Result<San, ParseError> {
    let mut chars = s.chars();
    let piece = chars
        .next()
        .and_then(piece_from_char)
        .ok_or(ParseError::Syntax)?;
    let rest = chars.as_str();
    if rest.len() < 2 {
        return Err(ParseError::Syntax);
    }
    let (mid, dst) = rest.split_at(rest.len() - 2);
    let dst = Coord::from_str(dst).map_err(|_| ParseError::Syntax)?;
    let (mid, is_capture) = match mid.strip_suffix('x') {
        Some(mid) => (mid, true),
        None => (mid, false),
    };
    let (mut file, mut rank) = (None, None);
    for c in mid.chars() {
        if let Some(f) = File::from_char(c) {
            if file.is_some() {
                return Err(ParseError::Syntax);
            }
            file = Some(f);
        } else if let Some(r) = Rank::from_char(c) {
            if rank.is_some() {
                return Err(ParseError::Syntax);
            }
            rank = Some(r);
        } else {
            return Err(ParseError::Syntax);
        }
    }
    Ok(San::Simple {
        piece,
        file,
        rank,
        is_capture,
        dst,
    })
}

fn parse_pawn(s: &str) -> Result<San, ParseError> {
    let (s, promote) = match s.chars().last().and_then(promote_from_char) {
        Some(p) => {
            let s = &s[..s.len() - 1];
            (s.strip_suffix('=').unwrap_or(s), Some(p))
        }
        None => (s, None),
    };
    match s.len() {
        2 => Ok(San::PawnMove {
            dst: Coord::from_str(s).map_err(|_| ParseError::Syntax)?,
            promote,
        }),
        4 => {
            let mut chars = s.chars();
            let src = chars
                .next()
                .and_then(File::from_char)
                .ok_or(ParseError::Syntax)?;
            if chars.next() != Some('x') {
                return Err(ParseError::Syntax);
            }
            let dst = Coord::from_str(chars.as_str()).map_err(|_| ParseError::Syntax)?;
            Ok(San::PawnCapture { src, dst, promote })
        }
        _ => Err(ParseError::Syntax),
    }
}

impl FromStr for San {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<San, Self::Err> {
        let s = s.trim_end_matches(['+', '#', '!', '?']);
        if s.is_empty() {
            return Err(ParseError::EmptyString);
        }
        match s {
            "O-O" | "0-0" => return Ok(San::Castling(CastlingSide::King)),
            "O-O-O" | "0-0-0" => return Ok(San::Castling(CastlingSide::Queen)),
            _ => {}
        }
        match s.chars().next() {
            Some(c) if c.is_ascii_uppercase() => parse_simple(s),
            _ => parse_pawn(s),
        }
    }
}

impl San {
    fn matches(&self, pos: &Position, mv: Move) -> bool {
        match *self {
            San::Castling(CastlingSide::King) => mv.kind == MoveKind::CastleKingside,
            San::Castling(CastlingSide::Queen) => mv.kind == MoveKind::CastleQueenside,
            San::PawnMove { dst, promote } => {
                matches!(mv.kind, MoveKind::Quiet | MoveKind::DoublePush)
                    && pos.get(mv.src).piece() == Some(Piece::Pawn)
                    && mv.dst == dst
                    && mv.promote == promote
            }
            San::PawnCapture { src, dst, promote } => {
                mv.is_capture()
                    && pos.get(mv.src).piece() == Some(Piece::Pawn)
                    && mv.src.file() == src
                    && mv.dst == dst
                    && mv.promote == promote
            }
            San::Simple {
                piece,
                file,
                rank,
                is_capture,
                dst,
            } => {
                matches!(mv.kind, MoveKind::Quiet | MoveKind::Capture)
                    && pos.get(mv.src).piece() == Some(piece)
                    && piece != Piece::Pawn
                    && mv.dst == dst
                    && mv.is_capture() == is_capture
                    && file.map_or(true, |f| mv.src.file() == f)
                    && rank.map_or(true, |r| mv.src.rank() == r)
            }
        }
    }

    /// Finds the unique legal move described by `self` in the given position
    pub fn resolve(&self, pos: &Position) -> Result<Move, ResolveError> {
        let mut found = None;
        for &mv in &movegen::legal_moves(pos) {
            if !self.matches(pos, mv) {
                continue;
            }
            match found {
                None => found = Some(mv),
                Some(prev) => return Err(ResolveError::Ambiguous(prev, mv)),
            }
        }
        found.ok_or(ResolveError::NotFound)
    }
}

impl fmt::Display for San {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match *self {
            San::Castling(CastlingSide::King) => write!(f, "O-O"),
            San::Castling(CastlingSide::Queen) => write!(f, "O-O-O"),
            San::PawnMove { dst, promote } => {
                write!(f, "{}", dst)?;
                if let Some(p) = promote {
                    write!(f, "={}", p.as_char().to_ascii_uppercase())?;
                }
                Ok(())
            }
            San::PawnCapture { src, dst, promote } => {
                write!(f, "{}x{}", src.as_char(), dst)?;
                if let Some(p) = promote {
                    write!(f, "={}", p.as_char().to_ascii_uppercase())?;
                }
                Ok(())
            }
            San::Simple {
                piece,
                file,
                rank,
                is_capture,
                dst,
            } => {
                let c = match piece {
                    Piece::Knight => 'N',
                    Piece::Bishop => 'B',
                    Piece::Rook => 'R',
                    Piece::Queen => 'Q',
                    Piece::King => 'K',
                    Piece::Pawn => return Err(fmt::Error),
                };
                write!(f, "{}", c)?;
                if let Some(file) = file {
                    write!(f, "{}", file.as_char())?;
                }
                if let Some(rank) = rank {
                    write!(f, "{}", rank.as_char())?;
                }
                if is_capture {
                    write!(f, "x")?;
                }
                write!(f, "{}", dst)
            }
        }
    }
}

/// Converts a legal move into its parsed SAN form, with minimal disambiguation
fn from_move(mv: Move, pos: &Position) -> San {
    match mv.kind {
        MoveKind::CastleKingside => return San::Castling(CastlingSide::King),
        MoveKind::CastleQueenside => return San::Castling(CastlingSide::Queen),
        _ => {}
    }
    let piece = match pos.get(mv.src).piece() {
        Some(p) => p,
        None => Piece::Pawn,
    };
    if piece == Piece::Pawn {
        return match mv.is_capture() {
            true => San::PawnCapture {
                src: mv.src.file(),
                dst: mv.dst,
                promote: mv.promote,
            },
            false => San::PawnMove {
                dst: mv.dst,
                promote: mv.promote,
            },
        };
    }
    // Minimal disambiguation against other legal moves of the same piece kind
    // onto the same square.
    let (mut sim_any, mut sim_file, mut sim_rank) = (false, false, false);
    for &other in &movegen::legal_moves(pos) {
        if other == mv || other.dst != mv.dst || pos.get(other.src).piece() != Some(piece) {
            continue;
        }
        sim_any = true;
        if other.src.file() == mv.src.file() {
            sim_file = true;
        }
        if other.src.rank() == mv.src.rank() {
            sim_rank = true;
        }
    }
    let file = (sim_any && (sim_rank || !sim_file)).then(|| mv.src.file());
    let rank = (sim_any && sim_file).then(|| mv.src.rank());
    San::Simple {
        piece,
        file,
        rank,
        is_capture: mv.is_capture(),
        dst: mv.dst,
    }
}

/// Formats a legal move as canonical SAN, including the `+`/`#` mark
pub fn format(mv: Move, pos: &Position) -> Result<String, IllegalMoveError> {
    let next = pos.make(mv)?;
    let mark = if movegen::is_checkmate(&next) {
        "#"
    } else if next.is_check() {
        "+"
    } else {
        ""
    };
    Ok(format!("{}{}", from_move(mv, pos), mark))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(s: &str) -> Coord {
        Coord::from_str(s).unwrap()
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            San::from_str("e4"),
            Ok(San::PawnMove {
                dst: c("e4"),
                promote: None
            })
        );
        assert_eq!(
            San::from_str("exd5"),
            Ok(San::PawnCapture {
                src: File::E,
                dst: c("d5"),
                promote: None
            })
        );
        assert_eq!(
            San::from_str("e8=Q+"),
            Ok(San::PawnMove {
                dst: c("e8"),
                promote: Some(PromotePiece::Queen)
            })
        );
        assert_eq!(San::from_str("O-O"), Ok(San::Castling(CastlingSide::King)));
        assert_eq!(
            San::from_str("0-0-0"),
            Ok(San::Castling(CastlingSide::Queen))
        );
        assert_eq!(
            San::from_str("Nbd7"),
            Ok(San::Simple {
                piece: Piece::Knight,
                file: Some(File::B),
                rank: None,
                is_capture: false,
                dst: c("d7")
            })
        );
        assert_eq!(
            San::from_str("R1xa3#"),
            Ok(San::Simple {
                piece: Piece::Rook,
                file: None,
                rank: Some(Rank::R1),
                is_capture: true,
                dst: c("a3")
            })
        );
        assert_eq!(San::from_str(""), Err(ParseError::EmptyString));
        assert_eq!(San::from_str("++"), Err(ParseError::EmptyString));
        assert_eq!(San::from_str("hello"), Err(ParseError::Syntax));
        assert_eq!(San::from_str("Zf3"), Err(ParseError::Syntax));
    }

    #[test]
    fn test_resolve() {
        let pos = Position::initial();
        let mv = San::from_str("e4").unwrap().resolve(&pos).unwrap();
        assert_eq!(mv.to_string(), "e2e4");
        assert_eq!(mv.kind, MoveKind::DoublePush);
        let mv = San::from_str("Nf3").unwrap().resolve(&pos).unwrap();
        assert_eq!(mv.to_string(), "g1f3");
        assert_eq!(
            San::from_str("Ne4").unwrap().resolve(&pos),
            Err(ResolveError::NotFound)
        );

        // Both knights can jump to d2.
        let pos = Position::from_fen("4k3/8/8/8/8/5N2/8/1N2K3 w - - 0 1").unwrap();
        assert!(matches!(
            San::from_str("Nd2").unwrap().resolve(&pos),
            Err(ResolveError::Ambiguous(_, _))
        ));
        let mv = San::from_str("Nbd2").unwrap().resolve(&pos).unwrap();
        assert_eq!(mv.to_string(), "b1d2");

        let pos = Position::from_fen("3K4/3p4/8/3PpP2/8/5p2/6P1/2k5 w - e6 0 1").unwrap();
        let mv = San::from_str("fxe6").unwrap().resolve(&pos).unwrap();
        assert_eq!(mv.kind, MoveKind::EnPassant);
        assert_eq!(mv.to_string(), "f5e6");
    }

    #[test]
    fn test_format() {
        let pos = Position::initial();
        let mv = San::from_str("Nf3").unwrap().resolve(&pos).unwrap();
        assert_eq!(format(mv, &pos).unwrap(), "Nf3");

        let pos = Position::from_fen("4k3/8/8/8/8/5N2/8/1N2K3 w - - 0 1").unwrap();
        let mv = San::from_str("Nbd2").unwrap().resolve(&pos).unwrap();
        assert_eq!(format(mv, &pos).unwrap(), "Nbd2");

        // Scholar's mate.
        let pos = Position::from_fen(
            "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/8/PPPP1PPP/RNBQK1NR w KQkq - 4 4",
        )
        .unwrap();
        let mv = Move {
            src: c("d1"),
            dst: c("f3"),
            promote: None,
            kind: MoveKind::Quiet,
        };
        assert_eq!(format(mv, &pos).unwrap(), "Qf3");
        let pos = pos.make(mv).unwrap();
        let pos = pos
            .make(Move {
                src: c("b7"),
                dst: c("b6"),
                promote: None,
                kind: MoveKind::Quiet,
            })
            .unwrap();
        let mv = San::from_str("Qxf7").unwrap().resolve(&pos).unwrap();
        assert_eq!(format(mv, &pos).unwrap(), "Qxf7#");
    }
}
