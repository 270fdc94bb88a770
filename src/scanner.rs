//! Header line scanner
//!
//! Turns raw header bytes into `(name, raw-value-text)` pairs, one per line,
//! without backtracking. Bytes are consumed a line at a time so the stream
//! is left at the first byte after the last line handed out.

use std::io::BufRead;

use crate::error::{MetaError, Result};

/// One scanned header line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedLine {
    /// Text left of the separator, trimmed
    pub name: String,
    /// Text right of the separator, trimmed
    pub value: String,
}

/// Pulls header lines off a buffered stream.
pub struct FieldScanner<'a, R: BufRead> {
    reader: &'a mut R,
    separator: char,
    buf: Vec<u8>,
}

impl<'a, R: BufRead> FieldScanner<'a, R> {
    pub fn new(reader: &'a mut R, separator: char) -> Self {
        Self {
            reader,
            separator,
            buf: Vec::new(),
        }
    }

    /// Next non-blank line, or `None` at end of stream.
    ///
    /// A non-blank line with no separator is a [`MetaError::MalformedLine`].
    pub fn next_line(&mut self) -> Result<Option<ScannedLine>> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
                return Ok(None);
            }

            let line = String::from_utf8_lossy(&self.buf);
            let line = line.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() {
                continue;
            }

            let Some((name, value)) = line.split_once(self.separator) else {
                return Err(MetaError::MalformedLine(line.to_string()));
            };

            return Ok(Some(ScannedLine {
                name: name.trim().to_string(),
                value: value.trim().to_string(),
            }));
        }
    }
}
