//! Board setup and validated positions

use crate::bitboard::Bitboard;
use crate::types::{
    self, CastlingRights, CastlingSide, Cell, Color, Coord, File, Piece, Rank,
};
use crate::{geometry, movegen};

use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::num::ParseIntError;
use std::str::FromStr;

use thiserror::Error;

/// Position validation error
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ValidateError {
    /// Too many pieces of given color
    ///
    /// No more than 16 pieces of each color is allowed.
    #[error("too many pieces of color {0:?}")]
    TooManyPieces(Color),
    /// One of the sides doesn't have a king
    #[error("no king of color {0:?}")]
    NoKing(Color),
    /// One of the sides has more than one king
    #[error("more than one king of color {0:?}")]
    TooManyKings(Color),
    /// There is a pawn on the 1st or on the 8th rank
    #[error("invalid pawn position {0}")]
    InvalidPawn(Coord),
    /// Opponent's king is under attack
    #[error("opponent's king is attacked")]
    OpponentKingAttacked,
}

/// Error parsing the first part of FEN (i.e. the positions of pieces on the board)
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum CellsParseError {
    /// Rank is too large
    #[error("too many items in rank {0}")]
    RankOverflow(Rank),
    /// Rank is too small
    #[error("not enough items in rank {0}")]
    RankUnderflow(Rank),
    /// Too many ranks
    #[error("too many ranks")]
    Overflow,
    /// Not enough ranks
    #[error("not enough ranks")]
    Underflow,
    /// Unexpected character
    #[error("unexpected char {0:?}")]
    UnexpectedChar(char),
}

/// Error parsing [`Setup`] from FEN
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum SetupParseError {
    /// FEN contains non-ASCII characters
    #[error("non-ASCII data in FEN")]
    NonAscii,
    /// FEN doesn't have board part
    #[error("board not specified")]
    NoBoard,
    /// Error parsing board from FEN
    #[error("bad board: {0}")]
    Board(#[from] CellsParseError),
    /// FEN doesn't have move side part
    #[error("no move side")]
    NoMoveSide,
    /// Error parsing move side from FEN
    #[error("bad move side: {0}")]
    MoveSide(#[from] types::ColorParseError),
    /// FEN doesn't have castling rights part
    #[error("no castling rights")]
    NoCastling,
    /// Error parsing castling rights from FEN
    #[error("bad castling rights: {0}")]
    Castling(#[from] types::CastlingRightsParseError),
    /// FEN doesn't have en passant part
    #[error("no enpassant")]
    NoEnpassant,
    /// Error parsing en passant from FEN
    #[error("bad enpassant: {0}")]
    Enpassant(#[from] types::CoordParseError),
    /// En passant rank is invalid
    #[error("invalid enpassant rank {0}")]
    InvalidEnpassantRank(Rank),
    /// Error parsing halfmove clock
    #[error("bad halfmove clock: {0}")]
    HalfmoveClock(ParseIntError),
    /// Error parsing move number
    #[error("bad move number: {0}")]
    MoveNumber(ParseIntError),
    /// FEN contains extra data
    #[error("extra data in FEN")]
    ExtraData,
}

/// Error parsing [`Position`] from FEN
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum FenParseError {
    /// Setup cannot be parsed
    #[error("cannot parse fen: {0}")]
    Fen(#[from] SetupParseError),
    /// Setup was parsed, but it's invalid
    #[error("invalid position: {0}")]
    Valid(#[from] ValidateError),
}

/// Plain, unvalidated board description
///
/// A setup contains all the necessary information about a chess position, but, unlike
/// [`Position`], it is not validated and may describe an unreachable or broken state.
///
/// A setup can be used to build or edit a position programmatically. After changing the
/// necessary fields, it must be converted into [`Position`] via [`Position::try_from()`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Setup {
    /// Contents of the board
    ///
    /// The indices in this array are the indices of coordinates. You might probably want
    /// to use the functions like [`Setup::get()`] or [`Setup::put()`] instead of indexing
    /// this array directly.
    pub cells: [Cell; 64],
    /// Side to move
    pub side: Color,
    /// Castling rights
    pub castling: CastlingRights,
    /// Destination square of a possible en passant capture
    ///
    /// It is equal to `None` if no en passant capture is allowed. This is the same square
    /// that appears in the fourth FEN field (e.g. `e3` after White's `e2e4`).
    pub ep_target: Option<Coord>,
    /// Number of half-moves without pawn moves or captures
    pub halfmove_clock: u16,
    /// Move number
    ///
    /// Note that this is move number, not half-move number. It is incremented after each
    /// move by Black.
    pub fullmove_number: u16,
}

impl Setup {
    /// Returns an empty `Setup`
    ///
    /// Does the same as [`Setup::default()`], except that this function is `const`.
    #[inline]
    pub const fn empty() -> Setup {
        Setup {
            cells: [Cell::EMPTY; 64],
            side: Color::White,
            castling: CastlingRights::EMPTY,
            ep_target: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Returns a setup with the initial position
    pub fn initial() -> Setup {
        let mut res = Setup {
            cells: [Cell::EMPTY; 64],
            side: Color::White,
            castling: CastlingRights::FULL,
            ep_target: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        };
        for file in File::iter() {
            res.put2(file, Rank::R2, Cell::from_parts(Color::White, Piece::Pawn));
            res.put2(file, Rank::R7, Cell::from_parts(Color::Black, Piece::Pawn));
        }
        for (color, rank) in [(Color::White, Rank::R1), (Color::Black, Rank::R8)] {
            res.put2(File::A, rank, Cell::from_parts(color, Piece::Rook));
            res.put2(File::B, rank, Cell::from_parts(color, Piece::Knight));
            res.put2(File::C, rank, Cell::from_parts(color, Piece::Bishop));
            res.put2(File::D, rank, Cell::from_parts(color, Piece::Queen));
            res.put2(File::E, rank, Cell::from_parts(color, Piece::King));
            res.put2(File::F, rank, Cell::from_parts(color, Piece::Bishop));
            res.put2(File::G, rank, Cell::from_parts(color, Piece::Knight));
            res.put2(File::H, rank, Cell::from_parts(color, Piece::Rook));
        }
        res
    }

    /// Parses a setup from FEN
    ///
    /// Does the same as [`Setup::from_str`]. It is recommended to use this function
    /// instead of `from_str()` for better readability.
    #[inline]
    pub fn from_fen(fen: &str) -> Result<Setup, SetupParseError> {
        Setup::from_str(fen)
    }

    /// Returns the contents of the square with coordinate `c`
    #[inline]
    pub fn get(&self, c: Coord) -> Cell {
        unsafe { *self.cells.get_unchecked(c.index()) }
    }

    /// Returns the contents of the square with file `file` and rank `rank`
    #[inline]
    pub fn get2(&self, file: File, rank: Rank) -> Cell {
        self.get(Coord::from_parts(file, rank))
    }

    /// Puts `cell` to the square with coordinate `c`
    #[inline]
    pub fn put(&mut self, c: Coord, cell: Cell) {
        unsafe {
            *self.cells.get_unchecked_mut(c.index()) = cell;
        }
    }

    /// Puts `cell` to the square with file `file` and rank `rank`
    #[inline]
    pub fn put2(&mut self, file: File, rank: Rank, cell: Cell) {
        self.put(Coord::from_parts(file, rank), cell);
    }

    /// Returns the square with the pawn which can be captured en passant, if any
    #[inline]
    pub fn ep_victim(&self) -> Option<Coord> {
        let p = self.ep_target?;
        Some(p.add(geometry::pawn_forward_delta(self.side.inv())))
    }

    /// Converts the setup into a FEN string
    ///
    /// Does the same as `Setup::to_string()`. It is recommended to use this function
    /// instead of `to_string()` for better readability.
    #[inline]
    pub fn as_fen(&self) -> String {
        self.to_string()
    }
}

impl Default for Setup {
    #[inline]
    fn default() -> Setup {
        Setup::empty()
    }
}

/// Board that contains a valid position
///
/// This type always holds a valid chess position and is used for literally every chess
/// operation: move generation, making and validating moves, verifying for check and
/// checkmate.
///
/// It contains a [`Setup`] alongside with bitboards kept permanently in sync with it.
#[derive(Debug, Clone)]
pub struct Position {
    pub(crate) s: Setup,
    pub(crate) white: Bitboard,
    pub(crate) black: Bitboard,
    pub(crate) all: Bitboard,
    pub(crate) pieces: [Bitboard; Cell::MAX_INDEX],
}

impl Position {
    /// Returns a position with the initial placement
    pub fn initial() -> Position {
        Setup::initial().try_into().unwrap()
    }

    /// Parses a position from FEN
    ///
    /// Does the same as [`Position::from_str`]. It is recommended to use this function
    /// instead of `from_str()` for better readability.
    pub fn from_fen(fen: &str) -> Result<Position, FenParseError> {
        Position::from_str(fen)
    }

    /// Returns a view over the underlying setup
    #[inline]
    pub fn setup(&self) -> &Setup {
        &self.s
    }

    /// Returns the contents of the square with coordinate `c`
    #[inline]
    pub fn get(&self, c: Coord) -> Cell {
        self.s.get(c)
    }

    /// Returns the contents of the square with file `file` and rank `rank`
    #[inline]
    pub fn get2(&self, file: File, rank: Rank) -> Cell {
        self.s.get2(file, rank)
    }

    /// Returns side to move
    #[inline]
    pub fn side(&self) -> Color {
        self.s.side
    }

    /// Returns the bitboard over all the pieces with color `c`
    #[inline]
    pub fn color(&self, c: Color) -> Bitboard {
        if c == Color::White {
            self.white
        } else {
            self.black
        }
    }

    #[inline]
    pub(crate) fn color_mut(&mut self, c: Color) -> &mut Bitboard {
        if c == Color::White {
            &mut self.white
        } else {
            &mut self.black
        }
    }

    /// Returns the bitboard over all the squares occupied by some piece
    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.all
    }

    /// Returns the bitboard over all the cells equal to `c`
    ///
    /// **Note**: when `c` is an empty cell, the function just returns an empty bitboard,
    /// not the bitboard over all the empty cells.
    #[inline]
    pub fn piece(&self, c: Cell) -> Bitboard {
        unsafe { *self.pieces.get_unchecked(c.index()) }
    }

    /// Returns the bitboard over all the pieces of color `c` and kind `p`
    #[inline]
    pub fn piece2(&self, c: Color, p: Piece) -> Bitboard {
        self.piece(Cell::from_parts(c, p))
    }

    #[inline]
    pub(crate) fn piece_diag(&self, c: Color) -> Bitboard {
        self.piece2(c, Piece::Bishop) | self.piece2(c, Piece::Queen)
    }

    #[inline]
    pub(crate) fn piece_line(&self, c: Color) -> Bitboard {
        self.piece2(c, Piece::Rook) | self.piece2(c, Piece::Queen)
    }

    #[inline]
    pub(crate) fn piece_mut(&mut self, c: Cell) -> &mut Bitboard {
        unsafe { self.pieces.get_unchecked_mut(c.index()) }
    }

    /// Returns the position of the king of color `c`
    #[inline]
    pub fn king_pos(&self, c: Color) -> Coord {
        self.piece(Cell::from_parts(c, Piece::King))
            .into_iter()
            .next()
            .unwrap()
    }

    /// Returns `true` if the opponent's king is under attack
    ///
    /// Such positions cannot arise from legal play, so this is only interesting for the
    /// legality filter inside the move generator.
    #[inline]
    pub(crate) fn is_opponent_king_attacked(&self) -> bool {
        let c = self.s.side;
        movegen::is_attacked(self, self.king_pos(c.inv()), c)
    }

    /// Returns `true` if the current side is in check
    #[inline]
    pub fn is_check(&self) -> bool {
        movegen::in_check(self)
    }

    /// Converts the position into a FEN string
    ///
    /// Does the same as `Position::to_string()`. It is recommended to use this function
    /// instead of `to_string()` for better readability.
    #[inline]
    pub fn as_fen(&self) -> String {
        self.to_string()
    }
}

impl PartialEq for Position {
    #[inline]
    fn eq(&self, other: &Position) -> bool {
        self.s == other.s
    }
}

impl Eq for Position {}

impl Hash for Position {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.s.hash(state)
    }
}

impl TryFrom<Setup> for Position {
    type Error = ValidateError;

    fn try_from(mut raw: Setup) -> Result<Position, ValidateError> {
        // Reset a stale en passant target. The target must lie on the proper rank, the
        // target square must be free, and the pawn to be captured must be present.
        if let Some(p) = raw.ep_target {
            let victim = p.add(geometry::pawn_forward_delta(raw.side.inv()));
            if p.rank() != geometry::enpassant_dst_rank(raw.side)
                || raw.get(p) != Cell::EMPTY
                || raw.get(victim) != Cell::from_parts(raw.side.inv(), Piece::Pawn)
            {
                raw.ep_target = None;
            }
        }

        // Reset bad castling flags
        for color in [Color::White, Color::Black] {
            let rank = geometry::castling_rank(color);
            if raw.get2(File::E, rank) != Cell::from_parts(color, Piece::King) {
                raw.castling.unset(color, CastlingSide::Queen);
                raw.castling.unset(color, CastlingSide::King);
            }
            if raw.get2(File::A, rank) != Cell::from_parts(color, Piece::Rook) {
                raw.castling.unset(color, CastlingSide::Queen);
            }
            if raw.get2(File::H, rank) != Cell::from_parts(color, Piece::Rook) {
                raw.castling.unset(color, CastlingSide::King);
            }
        }

        // Calculate bitboards
        let mut white = Bitboard::EMPTY;
        let mut black = Bitboard::EMPTY;
        let mut pieces = [Bitboard::EMPTY; Cell::MAX_INDEX];
        for (idx, cell) in raw.cells.iter().enumerate() {
            let coord = Coord::from_index(idx);
            if let Some(color) = cell.color() {
                match color {
                    Color::White => white.set(coord),
                    Color::Black => black.set(coord),
                };
                pieces[cell.index()].set(coord);
            }
        }

        // Check TooManyPieces, NoKing, TooManyKings
        if white.popcount() > 16 {
            return Err(ValidateError::TooManyPieces(Color::White));
        }
        if black.popcount() > 16 {
            return Err(ValidateError::TooManyPieces(Color::Black));
        }
        let white_king = pieces[Cell::from_parts(Color::White, Piece::King).index()];
        let black_king = pieces[Cell::from_parts(Color::Black, Piece::King).index()];
        if white_king.is_empty() {
            return Err(ValidateError::NoKing(Color::White));
        }
        if black_king.is_empty() {
            return Err(ValidateError::NoKing(Color::Black));
        }
        if white_king.popcount() > 1 {
            return Err(ValidateError::TooManyKings(Color::White));
        }
        if black_king.popcount() > 1 {
            return Err(ValidateError::TooManyKings(Color::Black));
        }

        // Check InvalidPawn
        let pawns = pieces[Cell::from_parts(Color::White, Piece::Pawn).index()]
            | pieces[Cell::from_parts(Color::Black, Piece::Pawn).index()];
        const BAD_PAWN_POSES: Bitboard = Bitboard::from_raw(0xff000000000000ff);
        let bad_pawns = pawns & BAD_PAWN_POSES;
        if bad_pawns.is_nonempty() {
            return Err(ValidateError::InvalidPawn(
                bad_pawns.into_iter().next().unwrap(),
            ));
        }

        // Check OpponentKingAttacked
        let res = Position {
            s: raw,
            white,
            black,
            all: white | black,
            pieces,
        };
        if res.is_opponent_king_attacked() {
            return Err(ValidateError::OpponentKingAttacked);
        }

        Ok(res)
    }
}

impl TryFrom<&Setup> for Position {
    type Error = ValidateError;

    fn try_from(raw: &Setup) -> Result<Position, ValidateError> {
        (*raw).try_into()
    }
}

pub(crate) fn parse_cells(s: &str) -> Result<[Cell; 64], CellsParseError> {
    type Error = CellsParseError;

    let mut file = 0_usize;
    let mut row = 0_usize;
    let mut cells = [Cell::EMPTY; 64];
    for b in s.bytes() {
        match b {
            b'1'..=b'8' => {
                let add = (b - b'0') as usize;
                if file + add > 8 {
                    return Err(Error::RankOverflow(Rank::from_index(7 - row)));
                }
                file += add;
            }
            b'/' => {
                if file < 8 {
                    return Err(Error::RankUnderflow(Rank::from_index(7 - row)));
                }
                row += 1;
                file = 0;
                if row >= 8 {
                    return Err(Error::Overflow);
                }
            }
            _ => {
                if file >= 8 {
                    return Err(Error::RankOverflow(Rank::from_index(7 - row)));
                }
                // FEN lists rank 8 first, so row 0 is the topmost rank.
                cells[(7 - row) * 8 + file] =
                    Cell::from_char(b as char).ok_or(Error::UnexpectedChar(b as char))?;
                file += 1;
            }
        };
    }

    if file < 8 {
        return Err(Error::RankUnderflow(Rank::from_index(7 - row)));
    }
    if row < 7 {
        return Err(Error::Underflow);
    }

    Ok(cells)
}

fn parse_ep_target(s: &str, side: Color) -> Result<Option<Coord>, SetupParseError> {
    if s == "-" {
        return Ok(None);
    }
    let enpassant = Coord::from_str(s)?;
    if enpassant.rank() != geometry::enpassant_dst_rank(side) {
        return Err(SetupParseError::InvalidEnpassantRank(enpassant.rank()));
    }
    Ok(Some(enpassant))
}

impl FromStr for Setup {
    type Err = SetupParseError;

    fn from_str(s: &str) -> Result<Setup, Self::Err> {
        type Error = SetupParseError;

        if !s.is_ascii() {
            return Err(Error::NonAscii);
        }
        let mut iter = s.split(' ').fuse();

        let cells = parse_cells(iter.next().ok_or(Error::NoBoard)?)?;
        let side = Color::from_str(iter.next().ok_or(Error::NoMoveSide)?)?;
        let castling = CastlingRights::from_str(iter.next().ok_or(Error::NoCastling)?)?;
        let ep_target = parse_ep_target(iter.next().ok_or(Error::NoEnpassant)?, side)?;
        let halfmove_clock = match iter.next() {
            Some(s) => u16::from_str(s).map_err(Error::HalfmoveClock)?,
            None => 0,
        };
        let fullmove_number = match iter.next() {
            Some(s) => u16::from_str(s).map_err(Error::MoveNumber)?,
            None => 1,
        };

        if iter.next().is_some() {
            return Err(Error::ExtraData);
        }

        Ok(Setup {
            cells,
            side,
            castling,
            ep_target,
            halfmove_clock,
            fullmove_number,
        })
    }
}

impl FromStr for Position {
    type Err = FenParseError;

    fn from_str(s: &str) -> Result<Position, Self::Err> {
        Ok(Setup::from_str(s)?.try_into()?)
    }
}

fn format_cells(cells: &[Cell; 64], f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
    for rank in Rank::iter().rev() {
        if rank != Rank::R8 {
            write!(f, "/")?;
        }
        let mut empty = 0;
        for file in File::iter() {
            let cell = cells[Coord::from_parts(file, rank).index()];
            if cell.is_empty() {
                empty += 1;
                continue;
            }
            if empty != 0 {
                write!(f, "{}", (b'0' + empty) as char)?;
                empty = 0;
            }
            write!(f, "{}", cell)?;
        }
        if empty != 0 {
            write!(f, "{}", (b'0' + empty) as char)?;
        }
    }
    Ok(())
}

impl Display for Setup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        format_cells(&self.cells, f)?;
        write!(f, " {} {}", self.side, self.castling)?;
        match self.ep_target {
            Some(p) => write!(f, " {}", p)?,
            None => write!(f, " -")?,
        };
        write!(f, " {} {}", self.halfmove_clock, self.fullmove_number)?;
        Ok(())
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        self.s.fmt(f)
    }
}
