//! EPD records with op-code annotations
//!
//! An EPD record is a FEN position without move counters, followed by zero or
//! more `opcode operand;` pairs (`bm`, `id` and friends). The parsers here are
//! tolerant: structural mismatch yields an absent result, never an error.

use crate::board::{self, Position, Setup};
use crate::geometry;
use crate::types::{CastlingRights, Color, Coord};

use std::collections::HashMap;
use std::ops::Range;
use std::str::FromStr;

fn skip_ws(b: &[u8], mut i: usize) -> usize {
    while i < b.len() && b[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

fn token(b: &[u8], i: usize) -> Option<(usize, usize)> {
    let s = skip_ws(b, i);
    if s == b.len() {
        return None;
    }
    let mut e = s;
    while e < b.len() && !b[e].is_ascii_whitespace() {
        e += 1;
    }
    Some((s, e))
}

// Matches the four FEN fields anchored at the start of `text`, tolerating
// arbitrary trailing content. Returns the setup with default counters and the
// number of bytes consumed.
fn parse_fen4(text: &str) -> Option<(Setup, usize)> {
    let b = text.as_bytes();
    let (s0, e0) = token(b, 0)?;
    if s0 != 0 {
        return None;
    }
    let cells = board::parse_cells(&text[s0..e0]).ok()?;
    let (s1, e1) = token(b, e0)?;
    let side = match &text[s1..e1] {
        "w" => Color::White,
        "b" => Color::Black,
        _ => return None,
    };
    let (s2, e2) = token(b, e1)?;
    let castling = CastlingRights::from_str(&text[s2..e2]).ok()?;
    let (s3, e3) = token(b, e2)?;
    let ep_target = match &text[s3..e3] {
        "-" => None,
        t => {
            let c = Coord::from_str(t).ok()?;
            if c.rank() != geometry::enpassant_dst_rank(side) {
                return None;
            }
            Some(c)
        }
    };
    let setup = Setup {
        cells,
        side,
        castling,
        ep_target,
        halfmove_clock: 0,
        fullmove_number: 1,
    };
    Some((setup, e3))
}

/// Matches a FEN string at the start of `text`, tolerating trailing content.
///
/// The halfmove clock and fullmove number are consumed only if both are
/// present and parse; otherwise they keep their default values and the match
/// ends after the en passant field. Returns the parsed [`Setup`] and the
/// number of bytes matched, or `None` on structural mismatch.
pub fn parse_fen_prefix(text: &str) -> Option<(Setup, usize)> {
    let (mut setup, mut len) = parse_fen4(text)?;
    let b = text.as_bytes();
    if let Some((s1, e1)) = token(b, len) {
        if let Ok(halfmove) = u16::from_str(&text[s1..e1]) {
            if let Some((s2, e2)) = token(b, e1) {
                if let Ok(fullmove) = u16::from_str(&text[s2..e2]) {
                    setup.halfmove_clock = halfmove;
                    setup.fullmove_number = fullmove;
                    len = e2;
                }
            }
        }
    }
    Some((setup, len))
}

struct OpScan {
    ops: HashMap<String, String>,
    // Byte position right after the last successfully parsed `;`.
    end: usize,
    // Whether the scan consumed the whole input.
    complete: bool,
}

fn scan_ops(text: &str) -> OpScan {
    let b = text.as_bytes();
    let mut res = OpScan {
        ops: HashMap::new(),
        end: 0,
        complete: false,
    };
    let mut i = 0;
    loop {
        let s = skip_ws(b, i);
        if s == b.len() {
            res.complete = true;
            return res;
        }
        let mut e = s;
        while e < b.len() && (b[e].is_ascii_alphanumeric() || b[e] == b'_') {
            e += 1;
        }
        if !(1..=14).contains(&(e - s)) {
            return res;
        }
        let opcode = text[s..e].to_lowercase();
        let vs = skip_ws(b, e);
        if vs == e || vs == b.len() {
            return res;
        }
        let (operand, after) = if b[vs] == b'"' {
            match text[vs + 1..].find('"') {
                Some(q) => (text[vs + 1..vs + 1 + q].to_string(), vs + q + 2),
                None => return res,
            }
        } else {
            let mut ve = vs;
            while ve < b.len() && !b[ve].is_ascii_whitespace() && b[ve] != b';' {
                ve += 1;
            }
            if ve == vs {
                return res;
            }
            (text[vs..ve].to_string(), ve)
        };
        let t = skip_ws(b, after);
        if t == b.len() || b[t] != b';' {
            return res;
        }
        res.ops.insert(opcode, operand);
        i = t + 1;
        res.end = i;
    }
}

/// Parsed EPD record
///
/// Duplicate op-codes overwrite each other and the keys are folded to
/// lowercase, so lookups via [`Epd::operand()`] are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct Epd {
    /// The position, absent if the record failed to parse
    pub position: Option<Position>,
    ops: HashMap<String, String>,
}

impl Epd {
    /// Parses an EPD record from `text`
    ///
    /// A structural mismatch anywhere in the record yields an invalid record
    /// with an absent position and an empty op-code map, not an error.
    pub fn parse(text: &str) -> Epd {
        let (setup, len) = match parse_fen4(text) {
            Some(res) => res,
            None => return Epd::default(),
        };
        let position = match Position::try_from(setup) {
            Ok(pos) => pos,
            Err(_) => return Epd::default(),
        };
        let scan = scan_ops(&text[len..]);
        if !scan.complete {
            return Epd::default();
        }
        Epd {
            position: Some(position),
            ops: scan.ops,
        }
    }

    /// Returns `true` if the record holds a position and at least one op-code
    pub fn is_valid(&self) -> bool {
        self.position.is_some() && !self.ops.is_empty()
    }

    /// Looks up the operand stored for `op`, ignoring the case of the key
    pub fn operand(&self, op: &str) -> Option<&str> {
        self.ops.get(&op.to_lowercase()).map(String::as_str)
    }

    /// Returns the op-code map
    pub fn ops(&self) -> &HashMap<String, String> {
        &self.ops
    }

    /// Finds the extent of the first valid EPD record inside `text`
    ///
    /// The probe tries every position following a whitespace boundary and
    /// reports the byte range covering the FEN prefix and all op-code pairs
    /// matched there. A valid record requires at least one op-code.
    pub fn locate(text: &str) -> Option<Range<usize>> {
        let b = text.as_bytes();
        for start in 0..b.len() {
            if b[start].is_ascii_whitespace() {
                continue;
            }
            if start != 0 && !b[start - 1].is_ascii_whitespace() {
                continue;
            }
            if let Some(end) = match_at(&text[start..]) {
                return Some(start..start + end);
            }
        }
        None
    }
}

fn match_at(text: &str) -> Option<usize> {
    let (setup, len) = parse_fen4(text)?;
    Position::try_from(setup).ok()?;
    let scan = scan_ops(&text[len..]);
    if scan.ops.is_empty() {
        return None;
    }
    Some(len + scan.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fen_prefix() {
        let text = "8/8/8/8/8/8/8/K6k w - - 10 42 trailing garbage";
        let (setup, len) = parse_fen_prefix(text).unwrap();
        assert_eq!(&text[..len], "8/8/8/8/8/8/8/K6k w - - 10 42");
        assert_eq!(setup.halfmove_clock, 10);
        assert_eq!(setup.fullmove_number, 42);

        // An incomplete counter pair is left unconsumed.
        let text = "8/8/8/8/8/8/8/K6k w - - 10 xyz";
        let (setup, len) = parse_fen_prefix(text).unwrap();
        assert_eq!(&text[..len], "8/8/8/8/8/8/8/K6k w - -");
        assert_eq!(setup.halfmove_clock, 0);
        assert_eq!(setup.fullmove_number, 1);

        assert!(parse_fen_prefix("totally not a fen").is_none());
        assert!(parse_fen_prefix("8/8/8/8/8/8/8/K6k w -").is_none());
    }

    #[test]
    fn test_parse() {
        let epd = Epd::parse("r3k2r/8/8/8/8/5q2/8/4K3 b kq f3 bm Rxf3; id \"test1\";");
        assert!(epd.is_valid());
        assert_eq!(epd.operand("bm"), Some("Rxf3"));
        assert_eq!(epd.operand("id"), Some("test1"));
        assert_eq!(epd.operand("ID"), Some("test1"));
        assert_eq!(epd.operand("ce"), None);

        // Opcodes are case-folded and duplicates overwrite.
        let epd = Epd::parse("4k3/8/8/8/8/8/8/4K3 w - - ID a; id b;");
        assert!(epd.is_valid());
        assert_eq!(epd.ops().len(), 1);
        assert_eq!(epd.operand("id"), Some("b"));

        // A position without op-codes is not a valid record.
        let epd = Epd::parse("4k3/8/8/8/8/8/8/4K3 w - -");
        assert!(epd.position.is_some());
        assert!(!epd.is_valid());

        // Structural mismatch yields an invalid record, not an error.
        let epd = Epd::parse("hello world");
        assert!(epd.position.is_none());
        assert!(epd.ops().is_empty());
        let epd = Epd::parse("4k3/8/8/8/8/8/8/4K3 w - - id missing_semicolon");
        assert!(epd.position.is_none());
        let epd = Epd::parse("4k3/8/8/8/8/8/8/4K3 w - - waytoolongopcode x;");
        assert!(epd.position.is_none());
    }

    #[test]
    fn test_locate() {
        let text = "noise here 4k3/8/8/8/8/8/8/4K3 w - - bm Ke2; and more";
        let range = Epd::locate(text).unwrap();
        assert_eq!(&text[range.clone()], "4k3/8/8/8/8/8/8/4K3 w - - bm Ke2;");
        assert!(Epd::parse(&text[range]).is_valid());

        assert!(Epd::locate("no epd anywhere").is_none());
        // Positions without op-codes are not located.
        assert!(Epd::locate("4k3/8/8/8/8/8/8/4K3 w - -").is_none());
    }
}
