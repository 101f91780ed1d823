//! Splitting PGN streams into per-game text blocks

use std::io::BufRead;

const GAME_MARKER: &str = "[Event ";

/// Splits a line-oriented stream into PGN games
///
/// A game starts at a line containing the `[Event ` marker and runs up to the
/// next such line, which is kept aside for the following call. The splitter
/// has no notion of chess semantics; it only assembles text blocks.
pub struct GameSplitter<R> {
    reader: R,
    pending: Option<String>,
    done: bool,
    failed: bool,
}

impl<R: BufRead> GameSplitter<R> {
    pub fn new(reader: R) -> GameSplitter<R> {
        GameSplitter {
            reader,
            pending: None,
            done: false,
            failed: false,
        }
    }

    fn next_line(&mut self) -> Option<String> {
        if let Some(line) = self.pending.take() {
            return Some(line);
        }
        if self.done {
            return None;
        }
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => Some(line.trim_end().to_string()),
            Err(_) => {
                // A read error is treated as end of input.
                self.done = true;
                self.failed = true;
                None
            }
        }
    }

    /// Returns the next game's text, or `None` once the input is exhausted
    ///
    /// Text before the first marker belongs to no game and is discarded. The
    /// assembled game is CRLF-normalized and trimmed. A game cut short by a
    /// read error is never surfaced.
    pub fn read_game(&mut self) -> Option<String> {
        let mut game = loop {
            let line = self.next_line()?;
            if let Some(at) = line.find(GAME_MARKER) {
                break line[at..].to_string();
            }
        };
        while let Some(line) = self.next_line() {
            match line.find(GAME_MARKER) {
                Some(at) => {
                    if at > 0 {
                        game.push_str("\r\n");
                        game.push_str(&line[..at]);
                    }
                    self.pending = Some(line[at..].to_string());
                    break;
                }
                None => {
                    game.push_str("\r\n");
                    game.push_str(&line);
                }
            }
        }
        if self.failed {
            return None;
        }
        Some(game.trim().to_string())
    }
}

impl<R: BufRead> Iterator for GameSplitter<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.read_game()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, BufReader, Cursor, Read};

    #[test]
    fn test_split() {
        let src = "junk before\n\
            [Event \"First\"]\n\
            [Site \"?\"]\n\
            \n\
            1. e4 e5 1-0\n\
            [Event \"Second\"]\n\
            \n\
            1. d4 *\n";
        let mut splitter = GameSplitter::new(Cursor::new(src));
        let first = splitter.read_game().unwrap();
        assert!(first.starts_with("[Event \"First\"]"));
        assert!(first.ends_with("1. e4 e5 1-0"));
        assert!(first.contains("\r\n"));
        let second = splitter.read_game().unwrap();
        assert_eq!(second, "[Event \"Second\"]\r\n\r\n1. d4 *");
        assert_eq!(splitter.read_game(), None);
        assert_eq!(splitter.read_game(), None);
    }

    #[test]
    fn test_marker_mid_line() {
        let src = "garbage[Event \"A\"]\n1. e4 *[Event \"B\"]\n1. d4 *\n";
        let mut splitter = GameSplitter::new(Cursor::new(src));
        assert_eq!(splitter.read_game().unwrap(), "[Event \"A\"]\r\n1. e4 *");
        assert_eq!(splitter.read_game().unwrap(), "[Event \"B\"]\r\n1. d4 *");
        assert_eq!(splitter.read_game(), None);
    }

    #[test]
    fn test_no_marker() {
        let mut splitter = GameSplitter::new(Cursor::new("1. e4 e5\nno tags at all\n"));
        assert_eq!(splitter.read_game(), None);
    }

    struct PartialReader {
        data: &'static [u8],
        pos: usize,
    }

    impl Read for PartialReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pos == self.data.len() {
                return Err(io::Error::new(io::ErrorKind::Other, "boom"));
            }
            let n = buf.len().min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn test_read_error() {
        let reader = PartialReader {
            data: b"[Event \"Good\"]\n1. e4 *\n[Event \"Cut\"]\n1. d4\n",
            pos: 0,
        };
        let mut splitter = GameSplitter::new(BufReader::new(reader));
        // The first game is complete and is returned as usual.
        assert_eq!(
            splitter.read_game().unwrap(),
            "[Event \"Good\"]\r\n1. e4 *"
        );
        // The second one is cut short by the error and never surfaces.
        assert_eq!(splitter.read_game(), None);
        assert_eq!(splitter.read_game(), None);
    }
}
