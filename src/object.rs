//! The `MetaObject` facade
//!
//! Ties the object model to the registry, parser and writer, and provides
//! the path-based and stream-based entry points.
//!
//! Stream entry points borrow the caller's stream and never close it. Path
//! entry points open, use and drop their own file.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error};

use crate::codec::{PayloadCodec, ZlibCodec};
use crate::config::MetaIoConfig;
use crate::error::{MetaError, Result};
use crate::field::{AdditionalField, FieldRecord};
use crate::header::ObjectHeader;
use crate::reader::{read_fields, ReadOptions};
use crate::registry::{names, FieldRegistry};
use crate::value::{encode_values, format_bool, format_significant, MetaValue, ValueShape, ValueType};
use crate::version::{ApiVersion, FileFormatVersion};
use crate::writer::{FieldWriter, DEFAULT_DOUBLE_PRECISION};

/// A header-described object: model state plus the machinery to read and
/// write it.
#[derive(Debug)]
pub struct MetaObject {
    header: ObjectHeader,
    registry: FieldRegistry,
    additional_fields: Vec<AdditionalField>,
    file_name: Option<PathBuf>,
    separator: char,
    double_precision: usize,
    display_warnings: bool,
    codec: Box<dyn PayloadCodec>,
}

impl Default for MetaObject {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaObject {
    /// Create a zero-dimensional object
    pub fn new() -> Self {
        Self {
            header: ObjectHeader::new(),
            registry: FieldRegistry::new(),
            additional_fields: Vec::new(),
            file_name: None,
            separator: '=',
            double_precision: DEFAULT_DOUBLE_PRECISION,
            display_warnings: true,
            codec: Box::new(ZlibCodec),
        }
    }

    /// Create an object of the given dimensionality
    pub fn with_dims(n_dims: i32) -> Self {
        let mut object = Self::new();
        object.header.initialize_essential(n_dims);
        object
    }

    /// Create an object configured by `config`
    pub fn with_config(config: &MetaIoConfig) -> Self {
        let mut object = Self::new();
        object.apply_config(config);
        object
    }

    /// Apply text, version and payload settings from `config`
    pub fn apply_config(&mut self, config: &MetaIoConfig) {
        self.separator = config.io.separator;
        self.double_precision = config.io.double_precision;
        self.display_warnings = config.io.display_warnings;
        self.header.set_api_version(ApiVersion(config.compat.api_version));
        self.header
            .set_file_format_version(FileFormatVersion(config.compat.file_format_version));
        self.header.set_compression_level(config.payload.compression_level);
        self.header
            .set_write_compressed_data_size(config.payload.write_compressed_data_size);
    }

    // =========================================================================
    // Model access
    // =========================================================================

    pub fn header(&self) -> &ObjectHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut ObjectHeader {
        &mut self.header
    }

    /// Reset the model to defaults and drop preserved unknown fields
    pub fn clear(&mut self) {
        self.header.clear();
        self.additional_fields.clear();
    }

    /// Copy every model attribute, and the file name, from `other`
    pub fn copy_info(&mut self, other: &MetaObject) {
        self.header.copy_info(&other.header);
        self.file_name = other.file_name.clone();
    }

    pub fn file_name(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }

    pub fn set_file_name(&mut self, path: impl Into<PathBuf>) {
        self.file_name = Some(path.into());
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn set_separator(&mut self, separator: char) {
        self.separator = separator;
    }

    /// Significant digits used for floating-point values on write
    pub fn double_precision(&self) -> usize {
        self.double_precision
    }

    pub fn set_double_precision(&mut self, precision: usize) {
        self.double_precision = precision;
    }

    pub fn display_warnings(&self) -> bool {
        self.display_warnings
    }

    pub fn set_display_warnings(&mut self, display: bool) {
        self.display_warnings = display;
    }

    /// Replace the payload codec
    pub fn set_codec(&mut self, codec: impl PayloadCodec + 'static) {
        self.codec = Box::new(codec);
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// Read the header at `path`; `path` becomes the file name.
    pub fn read(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.file_name = Some(path.to_path_buf());
        let mut reader = BufReader::new(open_for_read(path)?);
        self.read_stream(&mut reader)
    }

    /// Re-read the header from the current file name
    pub fn reload(&mut self) -> Result<()> {
        let path = self.file_name.clone().ok_or(MetaError::MissingFileName)?;
        self.read(path)
    }

    /// Read a header from an open stream, leaving the stream open.
    pub fn read_stream<R: BufRead>(&mut self, reader: &mut R) -> Result<()> {
        let options = self.read_options(false);
        self.read_with(reader, &options, None)
    }

    /// Read a header whose dimensionality is known in advance.
    ///
    /// `NDims` is defined before scanning so dimension-sized fields resolve
    /// even when the stream omits it; an `NDims` line in the stream still
    /// overrides.
    pub fn read_stream_with_dims<R: BufRead>(&mut self, reader: &mut R, n_dims: i32) -> Result<()> {
        let options = self.read_options(false);
        self.read_with(reader, &options, Some(n_dims))
    }

    /// Decode exactly one header line, e.g. to peek at `ObjectType`
    pub fn read_stream_one_line<R: BufRead>(&mut self, reader: &mut R) -> Result<()> {
        let options = self.read_options(true);
        self.read_with(reader, &options, None)
    }

    /// Read the header at `path` followed by a payload of `len` decoded bytes.
    ///
    /// The header must end with a terminating user field (see
    /// [`Self::add_terminating_user_field`]) so the scan stops at the payload.
    pub fn read_with_payload(&mut self, path: impl AsRef<Path>, len: usize) -> Result<Vec<u8>> {
        let path = path.as_ref();
        self.file_name = Some(path.to_path_buf());
        let mut reader = BufReader::new(open_for_read(path)?);
        self.read_stream(&mut reader)?;
        self.read_payload(&mut reader, len)
    }

    /// Read the payload that follows a header just read from `reader`.
    ///
    /// Compressed payloads are decoded by the codec; `len` is the expected
    /// decoded size.
    pub fn read_payload<R: Read>(&self, reader: &mut R, len: usize) -> Result<Vec<u8>> {
        if !self.header.compressed_data() {
            let mut raw = vec![0u8; len];
            reader.read_exact(&mut raw)?;
            return Ok(raw);
        }

        let mut compressed = Vec::new();
        match self.header.compressed_data_size() {
            0 => {
                reader.read_to_end(&mut compressed)?;
            }
            size => {
                reader.by_ref().take(size).read_to_end(&mut compressed)?;
                if compressed.len() as u64 != size {
                    return Err(MetaError::Codec(format!(
                        "CompressedDataSize is {} bytes, stream holds {}",
                        size,
                        compressed.len()
                    )));
                }
            }
        }

        let raw = self.codec.decompress(&compressed, len)?;
        if raw.len() != len {
            return Err(MetaError::Codec(format!(
                "expected {} decompressed bytes, got {}",
                len,
                raw.len()
            )));
        }
        Ok(raw)
    }

    fn read_options(&self, one_line: bool) -> ReadOptions {
        ReadOptions {
            separator: self.separator,
            one_line,
            display_warnings: self.display_warnings,
        }
    }

    fn read_with<R: BufRead>(
        &mut self,
        reader: &mut R,
        options: &ReadOptions,
        n_dims: Option<i32>,
    ) -> Result<()> {
        self.clear();

        let schema = self.registry.build_read_schema();
        if let Some(n) = n_dims {
            let ndims = schema.find(self.registry.arena(), names::N_DIMS);
            if let Some(record) = ndims.and_then(|id| self.registry.arena_mut().get_mut(id)) {
                record.values = vec![f64::from(n)];
                record.defined = true;
            }
        }

        let result = read_fields(
            reader,
            self.registry.arena_mut(),
            &schema,
            options,
            &mut self.additional_fields,
        );

        if result.is_ok() {
            crate::compat::apply_read_fields(&mut self.header, self.registry.arena(), &schema);
            self.registry.promote_read_user_fields();
            debug!(
                fields = schema.len(),
                additional = self.additional_fields.len(),
                "Header read"
            );
        }
        self.registry.release_schema(schema);

        if let Err(e) = &result {
            error!(error = %e, "Header read failed");
        }
        result
    }

    // =========================================================================
    // Writing
    // =========================================================================

    /// Write the header to `path`; `path` becomes the file name.
    pub fn write(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.file_name = Some(path.to_path_buf());
        let mut out = BufWriter::new(open_for_write(path, false)?);
        self.write_stream(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Write the header to the current file name
    pub fn save(&mut self) -> Result<()> {
        let path = self.file_name.clone().ok_or(MetaError::MissingFileName)?;
        self.write(path)
    }

    /// Write the header at the end of `path`, creating it if needed
    pub fn append(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.file_name = Some(path.to_path_buf());
        let mut out = BufWriter::new(open_for_write(path, true)?);
        self.write_stream(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Write the header to an open stream, leaving the stream open.
    ///
    /// Nothing already written is rolled back on failure.
    pub fn write_stream<W: Write>(&mut self, out: &mut W) -> Result<()> {
        self.header.normalize_transform();
        let schema = self.registry.build_write_schema(&self.header);

        let writer = FieldWriter::new(self.separator, self.double_precision);
        let result = writer.write_fields(out, self.registry.arena(), &schema);
        self.registry.release_schema(schema);

        if let Err(e) = &result {
            error!(error = %e, "Header write failed");
        }
        result
    }

    /// Write the header followed by `raw` to `path`.
    ///
    /// Sets the binary-data flag. When the compressed-data flag is set `raw`
    /// goes through the codec and the compressed size is recorded first.
    pub fn write_with_payload(&mut self, path: impl AsRef<Path>, raw: &[u8]) -> Result<()> {
        let path = path.as_ref();
        self.header.set_binary_data(true);

        let block = if self.header.compressed_data() {
            let compressed = self.codec.compress(raw, self.header.compression_level())?;
            self.header.set_compressed_data_size(compressed.len() as u64);
            compressed
        } else {
            raw.to_vec()
        };

        self.file_name = Some(path.to_path_buf());
        let mut out = BufWriter::new(open_for_write(path, false)?);
        self.write_stream(&mut out)?;
        out.write_all(&block)?;
        out.flush()?;
        Ok(())
    }

    // =========================================================================
    // User fields
    // =========================================================================

    /// Register a user read field; fails if `name` is already a read field
    /// or a reserved keyword.
    pub fn add_user_field(
        &mut self,
        name: &str,
        value_type: ValueType,
        length: usize,
        required: bool,
        depends_on: Option<&str>,
    ) -> Result<()> {
        self.registry
            .add_user_field(name, value_type, length, required, depends_on)
    }

    /// Register a user read field whose line ends the header
    pub fn add_terminating_user_field(&mut self, name: &str, value_type: ValueType) -> Result<()> {
        self.registry.add_terminating_user_field(name, value_type)
    }

    /// Register a numeric user field to write (and read back)
    pub fn add_user_field_with_values<T: MetaValue>(
        &mut self,
        name: &str,
        value_type: ValueType,
        values: &[T],
    ) -> Result<()> {
        self.registry
            .add_user_field_with_values(name, value_type, values)
    }

    /// Register a string user field to write (and read back)
    pub fn add_user_text_field(&mut self, name: &str, text: &str) -> Result<()> {
        self.registry.add_user_text_field(name, text)
    }

    /// Current value of a user field: the parsed one if any, else the one
    /// registered for writing
    fn user_value(&self, name: &str) -> Option<&FieldRecord> {
        self.registry
            .user_field(name)
            .filter(|r| r.defined)
            .or_else(|| self.registry.user_write_field(name))
            .filter(|r| r.defined)
    }

    /// User field value as a buffer of external elements in native byte order.
    ///
    /// Sized to the field's length (squared for matrices) times the element
    /// width; string fields yield their bytes.
    pub fn user_field_bytes(&self, name: &str) -> Option<Vec<u8>> {
        let record = self.user_value(name)?;
        match record.value_type.shape() {
            ValueShape::Text => Some(record.text.as_bytes().to_vec()),
            _ => Some(encode_values(
                &record.values,
                record.value_type,
                record.element_count(),
            )),
        }
    }

    /// User field value converted to `T`
    pub fn user_field<T: MetaValue>(&self, name: &str) -> Option<Vec<T>> {
        let record = self.user_value(name)?;
        if record.value_type.shape() == ValueShape::Text {
            return None;
        }
        Some(
            record
                .values
                .iter()
                .take(record.element_count())
                .map(|&v| T::from_f64(v))
                .collect(),
        )
    }

    /// Text of a string user field
    pub fn user_field_text(&self, name: &str) -> Option<String> {
        self.user_value(name)
            .filter(|r| r.value_type.shape() == ValueShape::Text)
            .map(|r| r.text.clone())
    }

    /// Names of the user read fields, in registration order
    pub fn user_field_names(&self) -> Vec<String> {
        let arena = self.registry.arena();
        self.registry
            .user_read_fields()
            .iter()
            .filter_map(|&id| arena.get(id))
            .map(|r| r.name.clone())
            .collect()
    }

    /// Forget every user field
    pub fn clear_user_fields(&mut self) {
        self.registry.clear_user_fields();
    }

    pub fn reserved_keywords(&self) -> impl Iterator<Item = &str> {
        self.registry.reserved_keywords().iter().map(String::as_str)
    }

    /// Claim more names so user fields cannot shadow them
    pub fn add_reserved_keywords<I, S>(&mut self, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registry.add_reserved_keywords(keywords);
    }

    // =========================================================================
    // Additional fields
    // =========================================================================

    /// Lines of the last read that matched no field, in stream order
    pub fn additional_fields(&self) -> &[AdditionalField] {
        &self.additional_fields
    }

    /// Raw text of the first additional field named `name`
    pub fn additional_field(&self, name: &str) -> Option<&str> {
        self.additional_fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    pub fn clear_additional_fields(&mut self) {
        self.additional_fields.clear();
    }

    // =========================================================================
    // Info
    // =========================================================================

    /// Snapshot of every model attribute
    pub fn info(&self) -> ObjectInfo {
        let h = &self.header;
        ObjectInfo {
            file_name: self.file_name.clone(),
            object_type: h.object_type_name().to_string(),
            object_sub_type: h.object_sub_type_name().to_string(),
            comment: h.comment().to_string(),
            name: h.name().to_string(),
            acquisition_date: h.acquisition_date().to_string(),
            file_format_version: h.file_format_version(),
            api_version: h.api_version(),
            n_dims: h.n_dims(),
            id: h.id(),
            parent_id: h.parent_id(),
            color: h.color(),
            binary_data: h.binary_data(),
            binary_data_byte_order_msb: h.binary_data_byte_order_msb(),
            compressed_data: h.compressed_data(),
            compressed_data_size: h.compressed_data_size(),
            compression_level: h.compression_level(),
            offset: h.offset().to_vec(),
            transform_matrix: h.transform_matrix().to_vec(),
            center_of_rotation: h.center_of_rotation().to_vec(),
            element_spacing: h.element_spacing().to_vec(),
            distance_units: h.distance_units_name().to_string(),
            anatomical_orientation: h.anatomical_orientation_acronym(),
            user_fields: self.user_field_names(),
            additional_fields: self.additional_fields.clone(),
        }
    }

    /// [`Self::info`] as pretty-printed JSON
    pub fn info_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.info())?)
    }
}

impl fmt::Display for MetaObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = self.info();
        let join = |values: &[f64]| {
            values
                .iter()
                .map(|&v| format_significant(v, self.double_precision))
                .collect::<Vec<_>>()
                .join(" ")
        };
        let color: Vec<f64> = info.color.iter().map(|&c| f64::from(c)).collect();

        let file_name = info
            .file_name
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        writeln!(f, "FileName = \"{}\"", file_name)?;
        writeln!(f, "Comment = \"{}\"", info.comment)?;
        writeln!(f, "ObjectType = \"{}\"", info.object_type)?;
        writeln!(f, "ObjectSubType = \"{}\"", info.object_sub_type)?;
        writeln!(f, "FileFormatVersion = {}", info.file_format_version)?;
        writeln!(f, "NDims = {}", info.n_dims)?;
        writeln!(f, "Name = \"{}\"", info.name)?;
        writeln!(f, "ID = {}", info.id)?;
        writeln!(f, "ParentID = {}", info.parent_id)?;
        writeln!(f, "AcquisitionDate = \"{}\"", info.acquisition_date)?;
        writeln!(f, "CompressedData = {}", format_bool(info.compressed_data))?;
        writeln!(f, "CompressedDataSize = {}", info.compressed_data_size)?;
        writeln!(f, "BinaryData = {}", format_bool(info.binary_data))?;
        writeln!(
            f,
            "BinaryDataByteOrderMSB = {}",
            format_bool(info.binary_data_byte_order_msb)
        )?;
        writeln!(f, "Color = {}", join(&color))?;
        writeln!(f, "Offset = {}", join(&info.offset))?;
        writeln!(f, "TransformMatrix = {}", join(&info.transform_matrix))?;
        writeln!(f, "CenterOfRotation = {}", join(&info.center_of_rotation))?;
        writeln!(f, "ElementSpacing = {}", join(&info.element_spacing))?;
        writeln!(f, "DistanceUnits = {}", info.distance_units)?;
        writeln!(f, "AnatomicalOrientation = {}", info.anatomical_orientation)?;

        for field in &info.additional_fields {
            writeln!(f, "{} = {}", field.name, field.value)?;
        }
        Ok(())
    }
}

/// Serialisable snapshot of a [`MetaObject`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectInfo {
    pub file_name: Option<PathBuf>,
    pub object_type: String,
    pub object_sub_type: String,
    pub comment: String,
    pub name: String,
    pub acquisition_date: String,
    pub file_format_version: FileFormatVersion,
    pub api_version: ApiVersion,
    pub n_dims: usize,
    pub id: i32,
    pub parent_id: i32,
    pub color: [f32; 4],
    pub binary_data: bool,
    pub binary_data_byte_order_msb: bool,
    pub compressed_data: bool,
    pub compressed_data_size: u64,
    pub compression_level: i32,
    pub offset: Vec<f64>,
    pub transform_matrix: Vec<f64>,
    pub center_of_rotation: Vec<f64>,
    pub element_spacing: Vec<f64>,
    pub distance_units: String,
    pub anatomical_orientation: String,
    pub user_fields: Vec<String>,
    pub additional_fields: Vec<AdditionalField>,
}

fn open_for_read(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        error!(path = %path.display(), error = %e, "Cannot open header for reading");
        MetaError::Io(e)
    })
}

fn open_for_write(path: &Path, append: bool) -> Result<File> {
    let mut options = OpenOptions::new();
    if append {
        options.append(true).create(true);
    } else {
        options.write(true).create(true).truncate(true);
    }
    options.open(path).map_err(|e| {
        error!(path = %path.display(), error = %e, "Cannot open header for writing");
        MetaError::Io(e)
    })
}
