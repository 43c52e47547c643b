//! Canonical S-expression encoding for key and credential records.
//!
//! Records are nested lists of byte atoms in the Rivest S-expression
//! "advanced" surface form. The serializer is deterministic: a given
//! tree always produces identical bytes, which is what makes record
//! fingerprints and detached signatures reproducible. The parser
//! accepts the full surface grammar (tokens, quoted strings, `#hex#`,
//! `|base64|`, length-prefixed verbatim atoms, nested lists) but the
//! serializer only ever emits one spelling per atom, so signer and
//! verifier always see identical bytes.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

use crate::error::CodecError;

/// Default cap on parser input, sized generously above the largest
/// key record the format produces.
pub const DEFAULT_MAX_INPUT_LEN: usize = 16 * 1024;

/// Maximum list nesting the parser will follow.
const MAX_DEPTH: usize = 128;

/// Per-call parser limits. No global buffers: every parse carries its
/// own capacity.
#[derive(Debug, Clone)]
pub struct ParseLimits {
    /// Inputs longer than this are rejected with `BufferExceeded`,
    /// never truncated.
    pub max_input_len: usize,
    /// When set, any non-ASCII input byte is rejected with
    /// `NonAsciiRejected`. Binary data belongs in `|base64|` or
    /// `#hex#` atoms.
    pub ascii_only: bool,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_input_len: DEFAULT_MAX_INPUT_LEN,
            ascii_only: true,
        }
    }
}

/// A canonical record value: a byte atom or an ordered list.
///
/// Immutable once constructed. Equality is structural, and
/// `parse(serialize(v)) == v` holds for every value.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sexp {
    Atom(Vec<u8>),
    List(Vec<Sexp>),
}

impl Sexp {
    /// Build an atom from raw bytes or a string.
    pub fn atom(bytes: impl Into<Vec<u8>>) -> Self {
        Sexp::Atom(bytes.into())
    }

    /// Build a list from elements.
    pub fn list(items: Vec<Sexp>) -> Self {
        Sexp::List(items)
    }

    /// Build a two-element `(tag value)` pair.
    pub fn pair(tag: &str, value: impl Into<Vec<u8>>) -> Self {
        Sexp::List(vec![Sexp::atom(tag), Sexp::atom(value)])
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Sexp::Atom(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Sexp::List(_))
    }

    pub fn as_atom(&self) -> Option<&[u8]> {
        match self {
            Sexp::Atom(bytes) => Some(bytes),
            Sexp::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Sexp]> {
        match self {
            Sexp::Atom(_) => None,
            Sexp::List(items) => Some(items),
        }
    }

    /// The head atom of a list, if any.
    pub fn tag(&self) -> Option<&[u8]> {
        self.as_list()?.first()?.as_atom()
    }

    /// Whether this value is a list whose head atom equals `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag() == Some(tag.as_bytes())
    }

    /// Depth-first search for the first sub-list tagged `tag`,
    /// returning the whole tagged list. The search includes `self`.
    pub fn find_token(&self, tag: &str) -> Option<&Sexp> {
        if self.has_tag(tag) {
            return Some(self);
        }
        if let Sexp::List(items) = self {
            for item in items {
                if let found @ Some(_) = item.find_token(tag) {
                    return found;
                }
            }
        }
        None
    }

    /// The value atom of the first `(tag value)` pair found under
    /// `self`.
    pub fn value_of(&self, tag: &str) -> Option<&[u8]> {
        self.find_token(tag)?.as_list()?.get(1)?.as_atom()
    }

    /// Overwrite every atom in the tree with zeros. Used by the
    /// secret wrappers on drop.
    pub(crate) fn zeroize_atoms(&mut self) {
        match self {
            Sexp::Atom(bytes) => bytes.zeroize(),
            Sexp::List(items) => {
                for item in items {
                    item.zeroize_atoms();
                }
            }
        }
    }
}

impl fmt::Debug for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sexp({})", self)
    }
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Serialized output is pure ASCII by construction.
        f.write_str(&String::from_utf8_lossy(&serialize(self)))
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Serialization
// ─────────────────────────────────────────────────────────────────────────

/// Encode a value to its canonical byte form.
///
/// Total and deterministic. Atoms use the shortest unambiguous
/// self-delimiting spelling: a bare token where the bytes allow it, a
/// quoted string for printable ASCII, `|base64|` otherwise. Lists are
/// parenthesized with single-space separation; whitespace never
/// carries meaning.
pub fn serialize(sexp: &Sexp) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value(&mut buf, sexp);
    buf
}

fn encode_value(buf: &mut Vec<u8>, sexp: &Sexp) {
    match sexp {
        Sexp::Atom(bytes) => encode_atom(buf, bytes),
        Sexp::List(items) => {
            buf.push(b'(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b' ');
                }
                encode_value(buf, item);
            }
            buf.push(b')');
        }
    }
}

fn encode_atom(buf: &mut Vec<u8>, bytes: &[u8]) {
    if is_token(bytes) {
        buf.extend_from_slice(bytes);
    } else if is_quotable(bytes) {
        encode_quoted(buf, bytes);
    } else {
        buf.push(b'|');
        buf.extend_from_slice(BASE64.encode(bytes).as_bytes());
        buf.push(b'|');
    }
}

fn encode_quoted(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.push(b'"');
    for &b in bytes {
        match b {
            b'"' => buf.extend_from_slice(b"\\\""),
            b'\\' => buf.extend_from_slice(b"\\\\"),
            b'\n' => buf.extend_from_slice(b"\\n"),
            b'\t' => buf.extend_from_slice(b"\\t"),
            b'\r' => buf.extend_from_slice(b"\\r"),
            _ => buf.push(b),
        }
    }
    buf.push(b'"');
}

/// Token atoms begin with an alphabetic or pseudo-alphabetic byte and
/// never with a digit, which is reserved for verbatim length prefixes.
fn is_token_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || matches!(b, b'-' | b'.' | b'/' | b'_' | b':' | b'*' | b'+' | b'=')
}

fn is_token_byte(b: u8) -> bool {
    is_token_start(b) || b.is_ascii_digit()
}

fn is_token(bytes: &[u8]) -> bool {
    !bytes.is_empty() && is_token_start(bytes[0]) && bytes.iter().all(|&b| is_token_byte(b))
}

fn is_quotable(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|&b| (0x20..=0x7e).contains(&b) || matches!(b, b'\n' | b'\t' | b'\r'))
}

// ─────────────────────────────────────────────────────────────────────────
// Parsing
// ─────────────────────────────────────────────────────────────────────────

/// Parse one record from `input`.
///
/// Exactly one top-level expression must be present; trailing bytes
/// other than whitespace are an error. Limits are enforced before any
/// byte is interpreted.
pub fn parse(input: &[u8], limits: &ParseLimits) -> Result<Sexp, CodecError> {
    if input.len() > limits.max_input_len {
        return Err(CodecError::BufferExceeded {
            len: input.len(),
            max: limits.max_input_len,
        });
    }
    if limits.ascii_only {
        if let Some(position) = input.iter().position(|b| !b.is_ascii()) {
            return Err(CodecError::NonAsciiRejected {
                byte: input[position],
                position,
            });
        }
    }

    let mut parser = Parser { input, pos: 0 };
    parser.skip_whitespace();
    let value = parser.parse_value(0)?;
    parser.skip_whitespace();
    if parser.pos != input.len() {
        return Err(CodecError::malformed(
            "trailing bytes after record",
            parser.pos,
        ));
    }
    Ok(value)
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<Sexp, CodecError> {
        if depth > MAX_DEPTH {
            return Err(CodecError::malformed("list nesting too deep", self.pos));
        }
        match self.peek() {
            Some(b'(') => self.parse_list(depth),
            Some(b'"') => self.parse_quoted(),
            Some(b'#') => self.parse_hex(),
            Some(b'|') => self.parse_base64(),
            Some(b) if b.is_ascii_digit() => self.parse_verbatim(),
            Some(b) if is_token_start(b) => Ok(self.parse_token()),
            Some(b')') => Err(CodecError::malformed("unbalanced parenthesis", self.pos)),
            Some(b) => Err(CodecError::malformed(
                format!("unexpected byte 0x{b:02x}"),
                self.pos,
            )),
            None => Err(CodecError::malformed("unexpected end of input", self.pos)),
        }
    }

    fn parse_list(&mut self, depth: usize) -> Result<Sexp, CodecError> {
        let open = self.pos;
        self.bump(); // consume '('
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b')') => {
                    self.bump();
                    return Ok(Sexp::List(items));
                }
                Some(_) => items.push(self.parse_value(depth + 1)?),
                None => {
                    return Err(CodecError::malformed("unterminated list", open));
                }
            }
        }
    }

    fn parse_token(&mut self) -> Sexp {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if is_token_byte(b)) {
            self.pos += 1;
        }
        Sexp::Atom(self.input[start..self.pos].to_vec())
    }

    fn parse_quoted(&mut self) -> Result<Sexp, CodecError> {
        let open = self.pos;
        self.bump(); // consume '"'
        let mut bytes = Vec::new();
        loop {
            match self.bump() {
                Some(b'"') => return Ok(Sexp::Atom(bytes)),
                Some(b'\\') => match self.bump() {
                    Some(b'"') => bytes.push(b'"'),
                    Some(b'\\') => bytes.push(b'\\'),
                    Some(b'n') => bytes.push(b'\n'),
                    Some(b't') => bytes.push(b'\t'),
                    Some(b'r') => bytes.push(b'\r'),
                    Some(b) => {
                        return Err(CodecError::malformed(
                            format!("unknown string escape \\{}", b as char),
                            self.pos - 1,
                        ));
                    }
                    None => {
                        return Err(CodecError::malformed("unterminated string atom", open));
                    }
                },
                Some(b) => bytes.push(b),
                None => {
                    return Err(CodecError::malformed("unterminated string atom", open));
                }
            }
        }
    }

    fn parse_hex(&mut self) -> Result<Sexp, CodecError> {
        let open = self.pos;
        self.bump(); // consume '#'
        let mut digits = Vec::new();
        loop {
            match self.bump() {
                Some(b'#') => break,
                Some(b' ' | b'\t' | b'\n' | b'\r') => continue,
                Some(b) => digits.push(b),
                None => {
                    return Err(CodecError::malformed("unterminated hex atom", open));
                }
            }
        }
        let bytes = hex::decode(&digits)
            .map_err(|e| CodecError::malformed(format!("invalid hex atom: {e}"), open))?;
        Ok(Sexp::Atom(bytes))
    }

    fn parse_base64(&mut self) -> Result<Sexp, CodecError> {
        let open = self.pos;
        self.bump(); // consume '|'
        let mut digits = Vec::new();
        loop {
            match self.bump() {
                Some(b'|') => break,
                Some(b' ' | b'\t' | b'\n' | b'\r') => continue,
                Some(b) => digits.push(b),
                None => {
                    return Err(CodecError::malformed("unterminated base64 atom", open));
                }
            }
        }
        let bytes = BASE64
            .decode(&digits)
            .map_err(|e| CodecError::malformed(format!("invalid base64 atom: {e}"), open))?;
        Ok(Sexp::Atom(bytes))
    }

    fn parse_verbatim(&mut self) -> Result<Sexp, CodecError> {
        let start = self.pos;
        let mut len: usize = 0;
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() {
                len = len
                    .checked_mul(10)
                    .and_then(|n| n.checked_add((b - b'0') as usize))
                    .ok_or_else(|| CodecError::malformed("verbatim length overflow", start))?;
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.bump() != Some(b':') {
            return Err(CodecError::malformed(
                "verbatim atom requires ':' after length",
                self.pos.saturating_sub(1),
            ));
        }
        if self.input.len() - self.pos < len {
            return Err(CodecError::malformed("unterminated verbatim atom", start));
        }
        let bytes = self.input[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(Sexp::Atom(bytes))
    }
}
