//! Access records and the line-oriented trace reader that produces them.
//!
//! Trace lines look like
//!
//! ```text
//! load  0x1f40 4
//! store 0x1f40 4 deadbeef
//! ```
//!
//! Store values are hex digits giving the bytes in memory order. Blank lines
//! and `#` comments are ignored; malformed lines are skipped with a warning.

use std::fmt::{Display, Formatter};
use std::io::BufRead;

use log::{debug, warn};
use phf::phf_map;
use serde::Serialize;
use smallvec::SmallVec;
use thiserror::Error;

/// Widest single access, in bytes.
pub const MAX_ACCESS_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessKind {
    Load,
    Store,
}

static ACCESS_KINDS: phf::Map<&'static str, AccessKind> = phf_map! {
    "load" => AccessKind::Load,
    "store" => AccessKind::Store,
};

impl Display for AccessKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessKind::Load => write!(f, "load"),
            AccessKind::Store => write!(f, "store"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRecord {
    Load { addr: u32, size: u8 },
    Store { addr: u32, data: SmallVec<[u8; MAX_ACCESS_SIZE]> },
}

impl AccessRecord {
    pub fn load(addr: u32, size: u8) -> Self {
        debug_assert!((1..=MAX_ACCESS_SIZE).contains(&(size as usize)));
        AccessRecord::Load { addr, size }
    }

    pub fn store(addr: u32, data: &[u8]) -> Self {
        debug_assert!((1..=MAX_ACCESS_SIZE).contains(&data.len()));
        AccessRecord::Store {
            addr,
            data: SmallVec::from_slice(data),
        }
    }

    pub fn kind(&self) -> AccessKind {
        match self {
            AccessRecord::Load { .. } => AccessKind::Load,
            AccessRecord::Store { .. } => AccessKind::Store,
        }
    }

    pub fn addr(&self) -> u32 {
        match self {
            AccessRecord::Load { addr, .. } | AccessRecord::Store { addr, .. } => *addr,
        }
    }

    pub fn size(&self) -> usize {
        match self {
            AccessRecord::Load { size, .. } => *size as usize,
            AccessRecord::Store { data, .. } => data.len(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown operation '{0}'")]
    UnknownOp(String),
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("invalid address '{0}'")]
    BadAddress(String),
    #[error("invalid access size '{0}', expected 1..=8")]
    BadSize(String),
    #[error("invalid store value '{value}' for a {size}-byte store")]
    BadValue { value: String, size: usize },
}

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: ParseError,
    },
    #[error("failed to read trace")]
    Io(#[from] std::io::Error),
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

fn parse_addr(field: &str) -> Result<u32, ParseError> {
    let digits = strip_hex_prefix(field);
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ParseError::BadAddress(field.to_string()));
    }
    u32::from_str_radix(digits, 16).map_err(|_| ParseError::BadAddress(field.to_string()))
}

fn parse_size(field: &str) -> Result<u8, ParseError> {
    match field.parse::<u8>() {
        Ok(size) if (1..=MAX_ACCESS_SIZE as u8).contains(&size) => Ok(size),
        _ => Err(ParseError::BadSize(field.to_string())),
    }
}

fn parse_value(field: &str, size: usize) -> Result<SmallVec<[u8; MAX_ACCESS_SIZE]>, ParseError> {
    let bad = || ParseError::BadValue {
        value: field.to_string(),
        size,
    };
    let digits = strip_hex_prefix(field);
    if digits.len() != size * 2 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(bad());
    }
    (0..size)
        .map(|i| u8::from_str_radix(&digits[2 * i..2 * i + 2], 16).map_err(|_| bad()))
        .collect()
}

/// Parse one non-empty, non-comment trace line.
pub fn parse_line(line: &str) -> Result<AccessRecord, ParseError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let op = fields.first().copied().unwrap_or_default();
    let kind = *ACCESS_KINDS
        .get(op)
        .ok_or_else(|| ParseError::UnknownOp(op.to_string()))?;

    let expected = match kind {
        AccessKind::Load => 3,
        AccessKind::Store => 4,
    };
    if fields.len() != expected {
        return Err(ParseError::FieldCount {
            expected,
            found: fields.len(),
        });
    }

    let addr = parse_addr(fields[1])?;
    let size = parse_size(fields[2])?;
    Ok(match kind {
        AccessKind::Load => AccessRecord::Load { addr, size },
        AccessKind::Store => AccessRecord::Store {
            addr,
            data: parse_value(fields[3], size as usize)?,
        },
    })
}

/// Iterator of well-formed access records over a trace. Malformed lines are
/// logged and skipped; read failures are yielded as errors.
pub struct TraceReader<R> {
    reader: R,
    buf: String,
    line_no: usize,
    skipped: usize,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            line_no: 0,
            skipped: 0,
        }
    }

    /// Number of malformed lines skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<AccessRecord, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => return Some(Err(err.into())),
            }
            self.line_no += 1;

            let line = self.buf.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_line(line) {
                Ok(record) => {
                    debug!("trace line {}: {:?}", self.line_no, record);
                    return Some(Ok(record));
                }
                Err(source) => {
                    self.skipped += 1;
                    let err = TraceError::Malformed {
                        line: self.line_no,
                        source,
                    };
                    warn!("skipping trace {}", err);
                }
            }
        }
    }
}
