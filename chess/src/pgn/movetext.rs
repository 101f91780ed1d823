//! Lexing PGN movetext into tokens

use super::GameResult;

use std::str::FromStr;

use thiserror::Error;

/// Error produced while lexing movetext
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum MovetextError {
    /// Recursive variations are not supported
    #[error("unsupported syntax: recursive variation")]
    UnsupportedSyntax,
    /// A brace comment is missing its closing brace
    #[error("unterminated comment")]
    UnterminatedComment,
    /// A token that fits no lexical class
    #[error("bad token `{0}`")]
    BadToken(String),
}

/// Lexical unit of one game's movetext
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Token<'a> {
    /// Move number, like `12.` or `12...`
    MoveNumber(u32),
    /// SAN move with its suffix annotation split off (`Nf3+!` has suffix `+!`)
    San {
        /// The move itself
        san: &'a str,
        /// Trailing run of `+`, `#`, `!` and `?` marks
        suffix: &'a str,
    },
    /// Brace or rest-of-line comment, trimmed
    Comment(&'a str),
    /// Numeric annotation glyph, like `$7`
    Nag(u32),
    /// Game termination marker
    Result(GameResult),
}

/// Lazy tokenizer over one game's movetext
///
/// Tag-pair lines are skipped. The iterator is finite and fused: after the
/// first error no further tokens are produced, so a fresh tokenizer must be
/// constructed per game.
pub struct Tokenizer<'a> {
    rest: &'a str,
    failed: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(game: &'a str) -> Tokenizer<'a> {
        Tokenizer {
            rest: game,
            failed: false,
        }
    }

    fn skip_line(&mut self) {
        match self.rest.find('\n') {
            Some(i) => self.rest = &self.rest[i + 1..],
            None => self.rest = "",
        }
    }

    fn take_line(&mut self) -> &'a str {
        match self.rest.find('\n') {
            Some(i) => {
                let line = &self.rest[..i];
                self.rest = &self.rest[i + 1..];
                line
            }
            None => {
                let line = self.rest;
                self.rest = "";
                line
            }
        }
    }

    fn fail(&mut self, err: MovetextError) -> Option<Result<Token<'a>, MovetextError>> {
        self.failed = true;
        Some(Err(err))
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Token<'a>, MovetextError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            self.rest = self.rest.trim_start();
            let c = self.rest.chars().next()?;
            match c {
                // Tag pair line, out of scope here.
                '[' => self.skip_line(),
                ';' => {
                    self.rest = &self.rest[1..];
                    return Some(Ok(Token::Comment(self.take_line().trim())));
                }
                '{' => {
                    return match self.rest.find('}') {
                        Some(i) => {
                            let inner = self.rest[1..i].trim();
                            self.rest = &self.rest[i + 1..];
                            Some(Ok(Token::Comment(inner)))
                        }
                        None => {
                            self.rest = "";
                            self.fail(MovetextError::UnterminatedComment)
                        }
                    };
                }
                '(' | ')' => return self.fail(MovetextError::UnsupportedSyntax),
                '$' => {
                    let end = self.rest[1..]
                        .find(|ch: char| !ch.is_ascii_digit())
                        .map(|i| i + 1)
                        .unwrap_or(self.rest.len());
                    let word = &self.rest[..end];
                    self.rest = &self.rest[end..];
                    return match word[1..].parse::<u32>() {
                        Ok(nag) => Some(Ok(Token::Nag(nag))),
                        Err(_) => self.fail(MovetextError::BadToken(word.to_string())),
                    };
                }
                _ => {
                    let end = self
                        .rest
                        .find(|ch: char| {
                            ch.is_whitespace() || matches!(ch, '{' | '}' | '(' | ')' | ';')
                        })
                        .unwrap_or(self.rest.len());
                    let word = &self.rest[..end];
                    if let Ok(result) = GameResult::from_str(word) {
                        self.rest = &self.rest[end..];
                        return Some(Ok(Token::Result(result)));
                    }
                    if c.is_ascii_digit() {
                        // Move number, possibly glued to the move like `1.e4`.
                        let digits = word
                            .find(|ch: char| !ch.is_ascii_digit())
                            .unwrap_or(word.len());
                        let mut after = digits;
                        while after < word.len() && word.as_bytes()[after] == b'.' {
                            after += 1;
                        }
                        if after == digits {
                            self.rest = &self.rest[end..];
                            return self.fail(MovetextError::BadToken(word.to_string()));
                        }
                        let number = match word[..digits].parse::<u32>() {
                            Ok(number) => number,
                            Err(_) => {
                                self.rest = &self.rest[end..];
                                return self.fail(MovetextError::BadToken(word.to_string()));
                            }
                        };
                        self.rest = &self.rest[after..];
                        return Some(Ok(Token::MoveNumber(number)));
                    }
                    self.rest = &self.rest[end..];
                    let san = word.trim_end_matches(['+', '#', '!', '?']);
                    if san.is_empty() {
                        return self.fail(MovetextError::BadToken(word.to_string()));
                    }
                    return Some(Ok(Token::San {
                        san,
                        suffix: &word[san.len()..],
                    }));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> Vec<Token<'_>> {
        Tokenizer::new(s).map(|t| t.unwrap()).collect()
    }

    #[test]
    fn test_tokens() {
        assert_eq!(
            tokens("1. e4! e5 {Open game} 2.Nf3 $1 Nc6?! 1/2-1/2"),
            vec![
                Token::MoveNumber(1),
                Token::San {
                    san: "e4",
                    suffix: "!"
                },
                Token::San {
                    san: "e5",
                    suffix: ""
                },
                Token::Comment("Open game"),
                Token::MoveNumber(2),
                Token::San {
                    san: "Nf3",
                    suffix: ""
                },
                Token::Nag(1),
                Token::San {
                    san: "Nc6",
                    suffix: "?!"
                },
                Token::Result(GameResult::Draw),
            ]
        );
    }

    #[test]
    fn test_tag_lines_and_comments() {
        let game = "[Event \"test\"]\n[Site \"?\"]\n\n1. d4 ; queen's pawn\n1... d5 *";
        assert_eq!(
            tokens(game),
            vec![
                Token::MoveNumber(1),
                Token::San {
                    san: "d4",
                    suffix: ""
                },
                Token::Comment("queen's pawn"),
                Token::MoveNumber(1),
                Token::San {
                    san: "d5",
                    suffix: ""
                },
                Token::Result(GameResult::Unknown),
            ]
        );
    }

    #[test]
    fn test_errors() {
        let mut t = Tokenizer::new("1. e4 (1. d4) e5");
        assert_eq!(t.next(), Some(Ok(Token::MoveNumber(1))));
        assert_eq!(
            t.next(),
            Some(Ok(Token::San {
                san: "e4",
                suffix: ""
            }))
        );
        assert_eq!(t.next(), Some(Err(MovetextError::UnsupportedSyntax)));
        // Fused after an error.
        assert_eq!(t.next(), None);

        let mut t = Tokenizer::new("{never closed");
        assert_eq!(t.next(), Some(Err(MovetextError::UnterminatedComment)));
        assert_eq!(t.next(), None);
    }
}
