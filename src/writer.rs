//! Generic field writer
//!
//! Emits a write schema as `Name = value...` lines in schema order. Which
//! fields appear is decided entirely by the schema.

use std::io::Write;

use crate::error::Result;
use crate::field::{FieldArena, FieldRecord};
use crate::schema::Schema;
use crate::value::{format_value, ValueShape};

/// Default number of significant digits for floating-point values
pub const DEFAULT_DOUBLE_PRECISION: usize = 17;

/// Formats descriptors onto an output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldWriter {
    separator: char,
    precision: usize,
}

impl Default for FieldWriter {
    fn default() -> Self {
        Self::new('=', DEFAULT_DOUBLE_PRECISION)
    }
}

impl FieldWriter {
    pub fn new(separator: char, precision: usize) -> Self {
        Self {
            separator,
            precision,
        }
    }

    /// Write every live descriptor of `schema`, one line each
    pub fn write_fields<W: Write>(&self, out: &mut W, arena: &FieldArena, schema: &Schema) -> Result<()> {
        for record in schema.records(arena) {
            writeln!(out, "{} {} {}", record.name, self.separator, self.format_record(record))?;
        }
        Ok(())
    }

    /// Value text of one descriptor
    pub fn format_record(&self, record: &FieldRecord) -> String {
        let count = match record.value_type.shape() {
            ValueShape::Text => return record.text.clone(),
            ValueShape::Scalar => 1,
            ValueShape::Array => record.length,
            ValueShape::Matrix => record.length * record.length,
        };

        record
            .values
            .iter()
            .take(count)
            .map(|&v| format_value(v, record.value_type, self.precision))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
