//! Field Schema Registry
//!
//! Assembles the ordered descriptor lists for a read or a write pass and
//! keeps the caller-registered user fields that extend them.
//!
//! Every descriptor lives in one [`FieldArena`]. Core descriptors are created
//! for a single pass and released by [`FieldRegistry::release_schema`]; user
//! descriptors persist until [`FieldRegistry::clear_user_fields`]. A user
//! descriptor may sit in both the read and the write list at once and is
//! still released exactly once.

use std::collections::BTreeSet;

use crate::error::{MetaError, Result};
use crate::field::{FieldArena, FieldId, FieldRecord};
use crate::header::ObjectHeader;
use crate::schema::Schema;
use crate::value::{format_bool, MetaValue, ValueType};

/// Names of the core header fields
pub mod names {
    pub const OBJECT_TYPE: &str = "ObjectType";
    pub const OBJECT_SUB_TYPE: &str = "ObjectSubType";
    pub const FILE_FORMAT_VERSION: &str = "FileFormatVersion";
    pub const COMMENT: &str = "Comment";
    pub const ACQUISITION_DATE: &str = "AcquisitionDate";
    pub const N_DIMS: &str = "NDims";
    pub const NAME: &str = "Name";
    pub const ID: &str = "ID";
    pub const PARENT_ID: &str = "ParentID";
    pub const COMPRESSED_DATA: &str = "CompressedData";
    pub const COMPRESSED_DATA_SIZE: &str = "CompressedDataSize";
    pub const BINARY_DATA: &str = "BinaryData";
    pub const ELEMENT_BYTE_ORDER_MSB: &str = "ElementByteOrderMSB";
    pub const BINARY_DATA_BYTE_ORDER_MSB: &str = "BinaryDataByteOrderMSB";
    pub const COLOR: &str = "Color";
    pub const POSITION: &str = "Position";
    pub const ORIGIN: &str = "Origin";
    pub const OFFSET: &str = "Offset";
    pub const TRANSFORM_MATRIX: &str = "TransformMatrix";
    pub const ROTATION: &str = "Rotation";
    pub const ORIENTATION: &str = "Orientation";
    pub const CENTER_OF_ROTATION: &str = "CenterOfRotation";
    pub const DISTANCE_UNITS: &str = "DistanceUnits";
    pub const ANATOMICAL_ORIENTATION: &str = "AnatomicalOrientation";
    pub const ELEMENT_SPACING: &str = "ElementSpacing";
}

/// Core read descriptors, in schema order
fn core_read_fields() -> Vec<FieldRecord> {
    use names::*;

    vec![
        FieldRecord::read(OBJECT_TYPE, ValueType::String, false),
        FieldRecord::read(OBJECT_SUB_TYPE, ValueType::String, false),
        FieldRecord::read(FILE_FORMAT_VERSION, ValueType::UInt, false),
        FieldRecord::read(COMMENT, ValueType::String, false),
        FieldRecord::read(ACQUISITION_DATE, ValueType::String, false),
        // Every dimension-sized field below depends on this one
        FieldRecord::read(N_DIMS, ValueType::Int, true),
        FieldRecord::read(NAME, ValueType::String, false),
        FieldRecord::read(ID, ValueType::Int, false),
        FieldRecord::read(PARENT_ID, ValueType::Int, false),
        FieldRecord::read(COMPRESSED_DATA, ValueType::String, false),
        FieldRecord::read(COMPRESSED_DATA_SIZE, ValueType::ULongLong, false),
        FieldRecord::read(BINARY_DATA, ValueType::String, false),
        FieldRecord::read(ELEMENT_BYTE_ORDER_MSB, ValueType::String, false),
        FieldRecord::read(BINARY_DATA_BYTE_ORDER_MSB, ValueType::String, false),
        FieldRecord::read(COLOR, ValueType::FloatArray, false).with_length(4),
        FieldRecord::read(POSITION, ValueType::FloatArray, false).depending_on(N_DIMS),
        FieldRecord::read(ORIGIN, ValueType::FloatArray, false).depending_on(N_DIMS),
        FieldRecord::read(OFFSET, ValueType::FloatArray, false).depending_on(N_DIMS),
        FieldRecord::read(TRANSFORM_MATRIX, ValueType::FloatMatrix, false).depending_on(N_DIMS),
        FieldRecord::read(ROTATION, ValueType::FloatMatrix, false).depending_on(N_DIMS),
        FieldRecord::read(ORIENTATION, ValueType::FloatMatrix, false).depending_on(N_DIMS),
        FieldRecord::read(CENTER_OF_ROTATION, ValueType::FloatArray, false).depending_on(N_DIMS),
        FieldRecord::read(DISTANCE_UNITS, ValueType::String, false),
        FieldRecord::read(ANATOMICAL_ORIENTATION, ValueType::String, false),
        FieldRecord::read(ELEMENT_SPACING, ValueType::FloatArray, false).depending_on(N_DIMS),
    ]
}

/// Core write descriptors for `header`, omitting fields at their default
fn core_write_fields(header: &ObjectHeader) -> Vec<FieldRecord> {
    use names::*;

    let n = header.n_dims();
    let mut fields = Vec::new();

    fields.push(FieldRecord::text(OBJECT_TYPE, header.object_type_name()));

    if !header.object_sub_type_name().is_empty() {
        fields.push(FieldRecord::text(OBJECT_SUB_TYPE, header.object_sub_type_name()));
    }

    if header.file_format_version().is_written() {
        fields.push(FieldRecord::scalar(
            FILE_FORMAT_VERSION,
            ValueType::UInt,
            f64::from(header.file_format_version().0),
        ));
    }

    if !header.comment().is_empty() {
        fields.push(FieldRecord::text(COMMENT, header.comment()));
    }

    fields.push(FieldRecord::scalar(N_DIMS, ValueType::Int, n as f64));

    if !header.name().is_empty() {
        fields.push(FieldRecord::text(NAME, header.name()));
    }

    if header.id() >= 0 {
        fields.push(FieldRecord::scalar(ID, ValueType::Int, f64::from(header.id())));
    }

    if header.parent_id() >= 0 {
        fields.push(FieldRecord::scalar(PARENT_ID, ValueType::Int, f64::from(header.parent_id())));
    }

    if !header.acquisition_date().is_empty() {
        fields.push(FieldRecord::text(ACQUISITION_DATE, header.acquisition_date()));
    }

    let color = header.color();
    if color.iter().any(|&c| c != 1.0) {
        let values: Vec<f64> = color.iter().map(|&c| f64::from(c)).collect();
        fields.push(FieldRecord::array(COLOR, ValueType::FloatArray, &values));
    }

    if header.binary_data() {
        fields.push(FieldRecord::text(BINARY_DATA, format_bool(true)));
        fields.push(FieldRecord::text(
            BINARY_DATA_BYTE_ORDER_MSB,
            format_bool(header.binary_data_byte_order_msb()),
        ));

        if header.compressed_data() {
            fields.push(FieldRecord::text(COMPRESSED_DATA, format_bool(true)));
            if header.write_compressed_data_size() && header.compressed_data_size() > 0 {
                fields.push(FieldRecord::scalar(
                    COMPRESSED_DATA_SIZE,
                    ValueType::ULongLong,
                    header.compressed_data_size() as f64,
                ));
            }
        } else {
            fields.push(FieldRecord::text(COMPRESSED_DATA, format_bool(false)));
        }
    }

    if !header.is_identity_transform() {
        fields.push(FieldRecord::matrix(TRANSFORM_MATRIX, n, header.transform_matrix()));
    }

    if header.offset().iter().any(|&v| v != 0.0) {
        fields.push(FieldRecord::array(OFFSET, ValueType::FloatArray, header.offset()));
    }

    if header.center_of_rotation().iter().any(|&v| v != 0.0) {
        fields.push(FieldRecord::array(
            CENTER_OF_ROTATION,
            ValueType::FloatArray,
            header.center_of_rotation(),
        ));
    }

    if header.distance_units() != crate::units::DistanceUnits::Unknown {
        fields.push(FieldRecord::text(DISTANCE_UNITS, header.distance_units_name()));
    }

    if header
        .anatomical_orientation()
        .iter()
        .any(|&o| o != crate::units::AnatomicalOrientation::Unknown)
    {
        fields.push(FieldRecord::text(
            ANATOMICAL_ORIENTATION,
            header.anatomical_orientation_acronym(),
        ));
    }

    if header.element_spacing().iter().any(|&v| v != 1.0) {
        fields.push(FieldRecord::array(
            ELEMENT_SPACING,
            ValueType::FloatArray,
            header.element_spacing(),
        ));
    }

    fields
}

/// Owner of all descriptors and of the user-field lists
#[derive(Debug)]
pub struct FieldRegistry {
    /// Every descriptor, core and user
    arena: FieldArena,
    /// Caller-registered fields merged into the read schema
    user_read: Vec<FieldId>,
    /// Caller-registered fields merged into the write schema
    user_write: Vec<FieldId>,
    /// Names a user field may not take
    reserved: BTreeSet<String>,
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldRegistry {
    /// Create a registry whose reserved keywords are the core field names
    pub fn new() -> Self {
        let reserved = core_read_fields().into_iter().map(|f| f.name).collect();
        Self {
            arena: FieldArena::new(),
            user_read: Vec::new(),
            user_write: Vec::new(),
            reserved,
        }
    }

    /// The arena behind every handle this registry hands out
    pub fn arena(&self) -> &FieldArena {
        &self.arena
    }

    /// Mutable access to the arena, for the read pass
    pub fn arena_mut(&mut self) -> &mut FieldArena {
        &mut self.arena
    }

    /// Assemble the read schema: core fields in fixed order, then user read fields.
    ///
    /// User read fields are reset so a previous pass's values do not leak.
    pub fn build_read_schema(&mut self) -> Schema {
        let mut schema = Schema::new();
        for record in core_read_fields() {
            schema.push(self.arena.insert(record));
        }
        for &id in &self.user_read {
            if let Some(record) = self.arena.get_mut(id) {
                record.reset();
                schema.push(id);
            }
        }
        schema
    }

    /// Assemble the write schema for `header`, then append user write fields.
    ///
    /// A user field promoted from an earlier read is skipped when the latest
    /// read did not define it.
    pub fn build_write_schema(&mut self, header: &ObjectHeader) -> Schema {
        let mut schema = Schema::new();
        for record in core_write_fields(header) {
            schema.push(self.arena.insert(record));
        }
        for &id in &self.user_write {
            if self.arena.get(id).is_some_and(|r| r.defined) {
                schema.push(id);
            }
        }
        schema
    }

    /// Release the per-pass descriptors of `schema`, leaving user fields alone
    pub fn release_schema(&mut self, schema: Schema) {
        for &id in schema.ids() {
            if !self.is_user_field(id) {
                self.arena.release(id);
            }
        }
    }

    fn is_user_field(&self, id: FieldId) -> bool {
        self.user_read.contains(&id) || self.user_write.contains(&id)
    }

    fn find_in(&self, list: &[FieldId], name: &str) -> Option<FieldId> {
        list.iter()
            .copied()
            .find(|&id| self.arena.get(id).is_some_and(|r| r.name == name))
    }

    /// Register a user read field.
    ///
    /// Fails when `name` is already a read field, either a user one or a
    /// reserved core name. `depends_on` names the field whose value supplies
    /// the length at decode time; otherwise `length` is used.
    pub fn add_user_field(
        &mut self,
        name: &str,
        value_type: ValueType,
        length: usize,
        required: bool,
        depends_on: Option<&str>,
    ) -> Result<()> {
        if self.reserved.contains(name) || self.find_in(&self.user_read, name).is_some() {
            return Err(MetaError::DuplicateUserField(name.to_string()));
        }

        let mut record = FieldRecord::read(name, value_type, required).with_length(length);
        if let Some(dep) = depends_on {
            record = record.depending_on(dep);
        }
        let id = self.arena.insert(record);
        self.user_read.push(id);
        Ok(())
    }

    /// Register a user read field whose line ends the header scan
    pub fn add_terminating_user_field(&mut self, name: &str, value_type: ValueType) -> Result<()> {
        self.add_user_field(name, value_type, 0, false, None)?;
        if let Some(record) = self
            .find_in(&self.user_read, name)
            .and_then(|id| self.arena.get_mut(id))
        {
            record.terminate_read = true;
        }
        Ok(())
    }

    /// Register a numeric user field carrying a value to write.
    ///
    /// Also registers the matching read field when none exists yet. When a
    /// write field of that name is already registered its value is replaced.
    pub fn add_user_field_with_values<T: MetaValue>(
        &mut self,
        name: &str,
        value_type: ValueType,
        values: &[T],
    ) -> Result<()> {
        let canonical: Vec<f64> = values.iter().map(|v| v.to_f64()).collect();
        let record = match value_type.shape() {
            crate::value::ValueShape::Matrix => {
                let dim = (canonical.len() as f64).sqrt() as usize;
                FieldRecord::matrix(name, dim, &canonical)
            }
            crate::value::ValueShape::Scalar => {
                FieldRecord::scalar(name, value_type, canonical.first().copied().unwrap_or(0.0))
            }
            _ => FieldRecord::array(name, value_type, &canonical),
        };
        let length = record.length;
        self.register_write_record(record)?;

        if self.find_in(&self.user_read, name).is_none() && !self.reserved.contains(name) {
            let id = self
                .arena
                .insert(FieldRecord::read(name, value_type, false).with_length(length));
            self.user_read.push(id);
        }
        Ok(())
    }

    /// Register a string user field carrying text to write
    pub fn add_user_text_field(&mut self, name: &str, text: &str) -> Result<()> {
        self.register_write_record(FieldRecord::text(name, text))?;
        if self.find_in(&self.user_read, name).is_none() && !self.reserved.contains(name) {
            let id = self.arena.insert(FieldRecord::read(name, ValueType::String, false));
            self.user_read.push(id);
        }
        Ok(())
    }

    fn register_write_record(&mut self, record: FieldRecord) -> Result<()> {
        if self.reserved.contains(&record.name) {
            return Err(MetaError::DuplicateUserField(record.name));
        }
        match self.find_in(&self.user_write, &record.name) {
            Some(id) => {
                if let Some(existing) = self.arena.get_mut(id) {
                    *existing = FieldRecord {
                        required: existing.required,
                        depends_on: existing.depends_on.take(),
                        ..record
                    };
                }
            }
            None => {
                let id = self.arena.insert(record);
                self.user_write.push(id);
            }
        }
        Ok(())
    }

    /// After a read, add every user read field that was parsed to the write
    /// list (once), so a round trip preserves caller-extended attributes.
    pub fn promote_read_user_fields(&mut self) {
        let parsed: Vec<FieldId> = self
            .user_read
            .iter()
            .copied()
            .filter(|&id| self.arena.get(id).is_some_and(|r| r.defined))
            .collect();

        for id in parsed {
            if self.user_write.contains(&id) {
                continue;
            }
            let Some(name) = self.arena.get(id).map(|r| r.name.clone()) else {
                continue;
            };
            // A parsed value supersedes a stale write field of the same name
            if let Some(stale) = self.find_in(&self.user_write, &name) {
                self.user_write.retain(|&w| w != stale);
                if !self.user_read.contains(&stale) {
                    self.arena.release(stale);
                }
            }
            self.user_write.push(id);
        }
    }

    /// Handles of the user read fields, in registration order
    pub fn user_read_fields(&self) -> &[FieldId] {
        &self.user_read
    }

    /// Handles of the user write fields, in registration order
    pub fn user_write_fields(&self) -> &[FieldId] {
        &self.user_write
    }

    /// The user read field named `name`
    pub fn user_field(&self, name: &str) -> Option<&FieldRecord> {
        self.find_in(&self.user_read, name)
            .and_then(|id| self.arena.get(id))
    }

    /// The user write field named `name`
    pub fn user_write_field(&self, name: &str) -> Option<&FieldRecord> {
        self.find_in(&self.user_write, name)
            .and_then(|id| self.arena.get(id))
    }

    /// Release every user field exactly once and empty both lists
    pub fn clear_user_fields(&mut self) {
        for id in self.user_write.drain(..) {
            self.arena.release(id);
        }
        for id in self.user_read.drain(..) {
            // Already gone if it was shared with the write list
            self.arena.release(id);
        }
    }

    /// Names a user field may not take
    pub fn reserved_keywords(&self) -> &BTreeSet<String> {
        &self.reserved
    }

    /// Claim more names for the object kind
    pub fn add_reserved_keywords<I, S>(&mut self, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved.extend(keywords.into_iter().map(Into::into));
    }
}
