//! PGN games: splitting, movetext tokens and the move listener protocol

pub mod movetext;
pub mod splitter;

pub use movetext::{MovetextError, Token, Tokenizer};
pub use splitter::GameSplitter;

use crate::board::Position;
use crate::moves;
use crate::san::{self, San};

use std::fmt;
use std::ops::ControlFlow;
use std::str::FromStr;

use thiserror::Error;

/// Result of a finished (or unfinished) game
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    /// The `*` marker: the game is unterminated or the result is unknown
    Unknown,
}

/// Error parsing [`GameResult`] from string
#[derive(Debug, Clone, Error, Eq, PartialEq)]
#[error("invalid game result")]
pub struct GameResultParseError;

impl FromStr for GameResult {
    type Err = GameResultParseError;

    fn from_str(s: &str) -> Result<GameResult, Self::Err> {
        match s {
            "1-0" => Ok(GameResult::WhiteWins),
            "0-1" => Ok(GameResult::BlackWins),
            "1/2-1/2" => Ok(GameResult::Draw),
            "*" => Ok(GameResult::Unknown),
            _ => Err(GameResultParseError),
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        let s = match self {
            GameResult::WhiteWins => "1-0",
            GameResult::BlackWins => "0-1",
            GameResult::Draw => "1/2-1/2",
            GameResult::Unknown => "*",
        };
        write!(f, "{}", s)
    }
}

/// Error parsing a single game's movetext
///
/// All of these are isolated to the game they occur in; the caller skips the
/// game and moves on to the next one.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum GameParseError {
    /// The movetext failed to tokenize
    #[error("bad movetext: {0}")]
    Movetext(#[from] MovetextError),
    /// A SAN token failed to parse
    #[error("cannot parse move `{san}`: {source}")]
    InvalidSan {
        san: String,
        source: san::ParseError,
    },
    /// A SAN token matched zero or more than one legal move
    #[error("cannot resolve move `{san}`: {source}")]
    Resolve {
        san: String,
        source: san::ResolveError,
    },
}

/// Observer of the moves of one game
///
/// A capability handed to [`GameParser::parse()`]; returning
/// [`ControlFlow::Break`] from any callback halts parsing cleanly.
pub trait MoveListener {
    /// Called after each move is applied, with the position it leads to
    fn on_move(&mut self, pos: &Position, san: &str, suffix: &str) -> ControlFlow<()>;

    /// Called for each comment
    fn on_comment(&mut self, comment: &str) -> ControlFlow<()> {
        let _comment = comment;
        ControlFlow::Continue(())
    }

    /// Called for each numeric annotation glyph
    fn on_nag(&mut self, nag: u32) -> ControlFlow<()> {
        let _nag = nag;
        ControlFlow::Continue(())
    }
}

/// Replays one game's movetext, feeding each move to a listener
pub struct GameParser {
    pos: Position,
}

impl GameParser {
    /// Creates a parser starting from the standard initial position
    pub fn new() -> GameParser {
        GameParser {
            pos: Position::initial(),
        }
    }

    /// Creates a parser starting from the given position
    pub fn from_position(pos: Position) -> GameParser {
        GameParser { pos }
    }

    /// Returns the current position
    pub fn position(&self) -> &Position {
        &self.pos
    }

    /// Parses `game`, advancing the position move by move
    ///
    /// Returns the game result token, or `None` if the movetext ends without
    /// one or the listener broke off early. Any failure abandons the rest of
    /// this game only.
    pub fn parse<L: MoveListener>(
        &mut self,
        game: &str,
        listener: &mut L,
    ) -> Result<Option<GameResult>, GameParseError> {
        for token in Tokenizer::new(game) {
            match token? {
                Token::MoveNumber(_) => {}
                Token::San { san, suffix } => {
                    let parsed =
                        San::from_str(san).map_err(|source| GameParseError::InvalidSan {
                            san: san.to_string(),
                            source,
                        })?;
                    let mv =
                        parsed
                            .resolve(&self.pos)
                            .map_err(|source| GameParseError::Resolve {
                                san: san.to_string(),
                                source,
                            })?;
                    // The move came from the legal move list, so it applies
                    // without further checks.
                    let mut next = self.pos.clone();
                    moves::apply_unchecked(&mut next, mv);
                    self.pos = next;
                    if listener.on_move(&self.pos, san, suffix).is_break() {
                        return Ok(None);
                    }
                }
                Token::Comment(comment) => {
                    if listener.on_comment(comment).is_break() {
                        return Ok(None);
                    }
                }
                Token::Nag(nag) => {
                    if listener.on_nag(nag).is_break() {
                        return Ok(None);
                    }
                }
                Token::Result(result) => return Ok(Some(result)),
            }
        }
        Ok(None)
    }
}

impl Default for GameParser {
    fn default() -> GameParser {
        GameParser::new()
    }
}
