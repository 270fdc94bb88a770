//! Aliasing and compatibility resolution
//!
//! Copies a decoded read schema into an [`ObjectHeader`]. Under the legacy
//! file format the deprecated names `Position`, `Origin`, `Rotation` and
//! `Orientation` are folded in first, in that order, each overwriting the
//! last; the canonical `Offset` and `TransformMatrix` are applied after them
//! and so win whenever present.

use crate::field::{FieldArena, FieldRecord};
use crate::header::ObjectHeader;
use crate::registry::names;
use crate::schema::Schema;
use crate::value::parse_bool;
use crate::version::FileFormatVersion;

/// Apply every defined field of `schema` to `header`.
pub fn apply_read_fields(header: &mut ObjectHeader, arena: &FieldArena, schema: &Schema) {
    let field = |name: &str| schema.defined(arena, name);

    if let Some(n) = field(names::N_DIMS).and_then(FieldRecord::value) {
        header.initialize_essential(n as i32);
    }

    let version = field(names::FILE_FORMAT_VERSION)
        .and_then(FieldRecord::value)
        .map(|v| FileFormatVersion(v as u32))
        .unwrap_or(FileFormatVersion::LEGACY);
    header.set_file_format_version(version);

    if let Some(r) = field(names::OBJECT_TYPE) {
        header.set_object_type_name(r.as_text());
    }
    if let Some(r) = field(names::OBJECT_SUB_TYPE) {
        header.set_object_sub_type_name(r.as_text());
    }
    if let Some(r) = field(names::COMMENT) {
        header.set_comment(r.as_text());
    }
    if let Some(r) = field(names::NAME) {
        header.set_name(r.as_text());
    }
    if let Some(r) = field(names::ACQUISITION_DATE) {
        header.set_acquisition_date(r.as_text());
    }
    if let Some(v) = field(names::ID).and_then(FieldRecord::value) {
        header.set_id(v as i32);
    }
    if let Some(v) = field(names::PARENT_ID).and_then(FieldRecord::value) {
        header.set_parent_id(v as i32);
    }

    if let Some(r) = field(names::COMPRESSED_DATA) {
        header.set_compressed_data(parse_bool(r.as_text()));
    }
    if let Some(v) = field(names::COMPRESSED_DATA_SIZE).and_then(FieldRecord::value) {
        header.set_compressed_data_size(v as u64);
    }
    if let Some(r) = field(names::BINARY_DATA) {
        header.set_binary_data(parse_bool(r.as_text()));
    }
    if let Some(r) = field(names::ELEMENT_BYTE_ORDER_MSB) {
        header.set_binary_data_byte_order_msb(parse_bool(r.as_text()));
    }
    if let Some(r) = field(names::BINARY_DATA_BYTE_ORDER_MSB) {
        header.set_binary_data_byte_order_msb(parse_bool(r.as_text()));
    }

    if let Some(r) = field(names::COLOR) {
        let c: Vec<f32> = r.values.iter().map(|&v| v as f32).collect();
        if let [red, green, blue, alpha] = c[..] {
            header.set_color(red, green, blue, alpha);
        }
    }

    if version.is_legacy() {
        for alias in [names::POSITION, names::ORIGIN] {
            if let Some(r) = field(alias) {
                header.set_offset(&r.values);
            }
        }
        for alias in [names::ROTATION, names::ORIENTATION] {
            if let Some(r) = field(alias) {
                header.set_transform_matrix(&r.values);
            }
        }
    }

    if let Some(r) = field(names::OFFSET) {
        header.set_offset(&r.values);
    }
    if let Some(r) = field(names::TRANSFORM_MATRIX) {
        header.set_transform_matrix(&r.values);
    }

    if let Some(r) = field(names::CENTER_OF_ROTATION) {
        header.set_center_of_rotation(&r.values);
    }
    if let Some(r) = field(names::DISTANCE_UNITS) {
        header.set_distance_units_name(r.as_text());
    }
    if let Some(r) = field(names::ANATOMICAL_ORIENTATION) {
        header.set_anatomical_orientation_acronym(r.as_text());
    }
    if let Some(r) = field(names::ELEMENT_SPACING) {
        header.set_element_spacing(&r.values);
    }
}
