//! Generic field parser
//!
//! Drives a read schema against a header stream: every scanned line is
//! matched to its descriptor by name and decoded according to the
//! descriptor's shape. Lines with no descriptor are kept verbatim.

use std::io::BufRead;

use tracing::debug;

use crate::error::{MetaError, Result};
use crate::field::{AdditionalField, FieldArena, FieldId};
use crate::scanner::FieldScanner;
use crate::schema::Schema;
use crate::value::{parse_token, ValueShape};

/// Options for one read pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Field/value separator
    pub separator: char,
    /// Decode a single header line and stop
    pub one_line: bool,
    /// Report unrecognised fields
    pub display_warnings: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            separator: '=',
            one_line: false,
            display_warnings: true,
        }
    }
}

/// Scan `reader` and decode every line into `schema`'s descriptors.
///
/// Unmatched lines are appended to `additional`. Fails on the first numeric
/// parse error or token-count mismatch, and when a required descriptor is
/// still undefined once the header ends. In one-line mode the required check
/// is skipped.
pub fn read_fields<R: BufRead>(
    reader: &mut R,
    arena: &mut FieldArena,
    schema: &Schema,
    options: &ReadOptions,
    additional: &mut Vec<AdditionalField>,
) -> Result<()> {
    let mut scanner = FieldScanner::new(reader, options.separator);

    while let Some(line) = scanner.next_line()? {
        let Some(id) = schema.find(arena, &line.name) else {
            if options.display_warnings {
                debug!(field = %line.name, "Keeping unrecognized field");
            }
            additional.push(AdditionalField {
                name: line.name,
                value: line.value,
            });
            if options.one_line {
                break;
            }
            continue;
        };

        let terminate = decode_field(arena, schema, id, &line.value)?;
        if terminate || options.one_line {
            break;
        }
    }

    if options.one_line {
        return Ok(());
    }

    match schema.records(arena).find(|r| r.required && !r.defined) {
        Some(missing) => Err(MetaError::MissingRequiredField {
            name: missing.name.clone(),
        }),
        None => Ok(()),
    }
}

/// Length of descriptor `id`: the value of its dependency when it has one,
/// its declared length otherwise.
fn resolve_length(arena: &FieldArena, schema: &Schema, id: FieldId) -> Result<usize> {
    let Some(record) = arena.get(id) else {
        return Ok(0);
    };
    let Some(dep) = record.depends_on.as_deref() else {
        return Ok(record.length);
    };

    schema
        .defined(arena, dep)
        .and_then(|d| d.value())
        .map(|v| v.max(0.0) as usize)
        .ok_or_else(|| MetaError::UndefinedDependency {
            field: record.name.clone(),
            depends_on: dep.to_string(),
        })
}

/// Decode `raw` into descriptor `id`. Returns whether the scan should stop.
fn decode_field(arena: &mut FieldArena, schema: &Schema, id: FieldId, raw: &str) -> Result<bool> {
    let length = resolve_length(arena, schema, id)?;
    let Some(record) = arena.get_mut(id) else {
        return Ok(false);
    };

    let expected = match record.value_type.shape() {
        ValueShape::Text => {
            record.text = raw.to_string();
            record.length = raw.len();
            record.defined = true;
            return Ok(record.terminate_read);
        }
        ValueShape::Scalar => 1,
        ValueShape::Array => length,
        ValueShape::Matrix => match length.checked_mul(length) {
            Some(count) => count,
            None => {
                return Err(MetaError::TokenCountMismatch {
                    field: record.name.clone(),
                    expected: usize::MAX,
                    actual: raw.split_whitespace().count(),
                })
            }
        },
    };

    let tokens: Vec<&str> = raw.split_whitespace().collect();
    if tokens.len() != expected {
        return Err(MetaError::TokenCountMismatch {
            field: record.name.clone(),
            expected,
            actual: tokens.len(),
        });
    }

    let values = tokens
        .iter()
        .map(|t| parse_token(&record.name, t))
        .collect::<Result<Vec<f64>>>()?;

    record.values = values;
    if record.value_type.shape() != ValueShape::Scalar {
        record.length = length;
    }
    record.defined = true;
    Ok(record.terminate_read)
}
