//! # finchess
//!
//! Chess rules engine: position representation, legal move generation with
//! check and mate detection, and parsers for the FEN, EPD and PGN text
//! formats.
//!
//! ```
//! use finchess::{san::San, Position};
//! use std::str::FromStr;
//!
//! let pos = Position::initial();
//! let mv = San::from_str("e4").unwrap().resolve(&pos).unwrap();
//! let pos = pos.make(mv).unwrap();
//! assert_eq!(
//!     pos.as_fen(),
//!     "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
//! );
//! ```

pub use finchess_base::{bitboard, bitboard_consts, geometry, types};

pub mod attack;
pub mod board;
pub mod epd;
pub mod movegen;
pub mod moves;
pub mod pgn;
pub mod san;

mod castling;
mod pawns;

pub use bitboard::Bitboard;
pub use board::{Position, Setup};
pub use movegen::MoveList;
pub use moves::{Move, MoveKind, PromotePiece};
pub use types::{CastlingRights, CastlingSide, Cell, Color, Coord, File, Piece, Rank};
