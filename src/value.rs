//! Value coercion between canonical `f64` storage and external representations
//!
//! Every numeric field, whatever its declared external type, is stored as a
//! sequence of `f64`. This module converts that storage to and from header
//! text tokens and typed external buffers.

use byteorder::{ByteOrder, NativeEndian};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MetaError, Result};

/// Declared external type of a header field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Signed 8-bit integer
    Char,
    /// Unsigned 8-bit integer
    UChar,
    /// Signed 16-bit integer
    Short,
    /// Unsigned 16-bit integer
    UShort,
    /// Signed 32-bit integer
    Int,
    /// Unsigned 32-bit integer
    UInt,
    /// Signed 64-bit integer
    LongLong,
    /// Unsigned 64-bit integer
    ULongLong,
    /// Single-precision float
    Float,
    /// Double-precision float
    Double,
    /// Free text, the remainder of the header line
    String,
    /// Array of signed 8-bit integers
    CharArray,
    /// Array of unsigned 8-bit integers
    UCharArray,
    /// Array of signed 32-bit integers
    IntArray,
    /// Array of unsigned 32-bit integers
    UIntArray,
    /// Array of single-precision floats
    FloatArray,
    /// Array of double-precision floats
    DoubleArray,
    /// Square row-major matrix of single-precision floats
    FloatMatrix,
}

/// How many tokens a field of a given type consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// Exactly one numeric token
    Scalar,
    /// `L` numeric tokens
    Array,
    /// `L * L` numeric tokens, row-major
    Matrix,
    /// The rest of the line, verbatim
    Text,
}

impl ValueType {
    /// Token shape of this type
    pub const fn shape(self) -> ValueShape {
        match self {
            Self::String => ValueShape::Text,
            Self::CharArray
            | Self::UCharArray
            | Self::IntArray
            | Self::UIntArray
            | Self::FloatArray
            | Self::DoubleArray => ValueShape::Array,
            Self::FloatMatrix => ValueShape::Matrix,
            _ => ValueShape::Scalar,
        }
    }

    /// Scalar type of one element
    pub const fn element_type(self) -> Self {
        match self {
            Self::CharArray => Self::Char,
            Self::UCharArray => Self::UChar,
            Self::IntArray => Self::Int,
            Self::UIntArray => Self::UInt,
            Self::FloatArray | Self::FloatMatrix => Self::Float,
            Self::DoubleArray => Self::Double,
            other => other,
        }
    }

    /// Width in bytes of one element in an external buffer
    pub const fn element_size(self) -> usize {
        match self.element_type() {
            Self::Char | Self::UChar | Self::String => 1,
            Self::Short | Self::UShort => 2,
            Self::Int | Self::UInt | Self::Float => 4,
            _ => 8,
        }
    }

    /// Whether elements are written as integers
    pub const fn is_integer(self) -> bool {
        matches!(
            self.element_type(),
            Self::Char
                | Self::UChar
                | Self::Short
                | Self::UShort
                | Self::Int
                | Self::UInt
                | Self::LongLong
                | Self::ULongLong
        )
    }

    /// Whether elements are unsigned integers
    pub const fn is_unsigned(self) -> bool {
        matches!(
            self.element_type(),
            Self::UChar | Self::UShort | Self::UInt | Self::ULongLong
        )
    }

    /// Mnemonic name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::UChar => "uchar",
            Self::Short => "short",
            Self::UShort => "ushort",
            Self::Int => "int",
            Self::UInt => "uint",
            Self::LongLong => "long_long",
            Self::ULongLong => "ulong_long",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::CharArray => "char_array",
            Self::UCharArray => "uchar_array",
            Self::IntArray => "int_array",
            Self::UIntArray => "uint_array",
            Self::FloatArray => "float_array",
            Self::DoubleArray => "double_array",
            Self::FloatMatrix => "float_matrix",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rust scalar types that can cross the user-field boundary
pub trait MetaValue: Copy {
    /// External type of one element
    const VALUE_TYPE: ValueType;

    /// Widen into canonical storage
    fn to_f64(self) -> f64;

    /// Narrow out of canonical storage (saturating for integers)
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_meta_value {
    ($($ty:ty => $vt:ident),* $(,)?) => {
        $(
            impl MetaValue for $ty {
                const VALUE_TYPE: ValueType = ValueType::$vt;

                fn to_f64(self) -> f64 {
                    self as f64
                }

                fn from_f64(value: f64) -> Self {
                    value as $ty
                }
            }
        )*
    };
}

impl_meta_value! {
    i8 => Char,
    u8 => UChar,
    i16 => Short,
    u16 => UShort,
    i32 => Int,
    u32 => UInt,
    i64 => LongLong,
    u64 => ULongLong,
    f32 => Float,
    f64 => Double,
}

/// Parse one numeric header token into canonical storage.
pub fn parse_token(field: &str, token: &str) -> Result<f64> {
    token.parse::<f64>().map_err(|_| MetaError::InvalidNumber {
        field: field.to_string(),
        token: token.to_string(),
    })
}

/// Format one canonical value as a header token.
///
/// Integer types are written without a fraction; float types use `precision`
/// significant digits, switching to exponent notation the way C's `%g` does.
pub fn format_value(value: f64, value_type: ValueType, precision: usize) -> String {
    if value_type.is_integer() {
        if value_type.is_unsigned() {
            (value as u64).to_string()
        } else {
            (value as i64).to_string()
        }
    } else {
        format_significant(value, precision)
    }
}

/// Format `value` with at most `precision` significant digits.
pub fn format_significant(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let precision = precision.max(1);

    // Rounding can carry into a new leading digit, so take the exponent
    // from the rounded scientific form.
    let scientific = format!("{:.*e}", precision - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Interpret a boolean-valued text field: `T`, `t` or `1` as first character.
pub fn parse_bool(text: &str) -> bool {
    matches!(text.trim_start().chars().next(), Some('T' | 't' | '1'))
}

/// Text written for a boolean-valued field
pub fn format_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Convert canonical values into a buffer of `count` external elements.
///
/// The buffer holds `count * value_type.element_size()` bytes in native byte
/// order; elements missing from `values` are left zeroed.
pub fn encode_values(values: &[f64], value_type: ValueType, count: usize) -> Vec<u8> {
    let width = value_type.element_size();
    let mut out = vec![0u8; count * width];

    for (i, &v) in values.iter().take(count).enumerate() {
        let chunk = &mut out[i * width..(i + 1) * width];
        match value_type.element_type() {
            ValueType::Char => chunk[0] = (v as i8) as u8,
            ValueType::UChar | ValueType::String => chunk[0] = v as u8,
            ValueType::Short => NativeEndian::write_i16(chunk, v as i16),
            ValueType::UShort => NativeEndian::write_u16(chunk, v as u16),
            ValueType::Int => NativeEndian::write_i32(chunk, v as i32),
            ValueType::UInt => NativeEndian::write_u32(chunk, v as u32),
            ValueType::LongLong => NativeEndian::write_i64(chunk, v as i64),
            ValueType::ULongLong => NativeEndian::write_u64(chunk, v as u64),
            ValueType::Float => NativeEndian::write_f32(chunk, v as f32),
            _ => NativeEndian::write_f64(chunk, v),
        }
    }

    out
}
