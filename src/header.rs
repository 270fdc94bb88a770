//! The canonical in-memory object descriptor
//!
//! Dimension-sized attributes live in fixed-capacity arrays of
//! [`MAX_DIMS`] elements; only the first `n_dims` (or `n_dims²` for the
//! transform matrix) entries are meaningful.

use tracing::warn;

use crate::units::{AnatomicalOrientation, DistanceUnits};
use crate::version::{ApiVersion, FileFormatVersion};

/// Hard cap on dimensionality
pub const MAX_DIMS: usize = 10;

/// Object-type tag of the base object kind
pub const DEFAULT_OBJECT_TYPE: &str = "Object";

/// Default compression level handed to the payload codec
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 2;

/// Canonical header attributes shared by every object kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectHeader {
    n_dims: usize,
    object_type_name: String,
    object_sub_type_name: String,
    comment: String,
    name: String,
    acquisition_date: String,
    file_format_version: FileFormatVersion,
    api_version: ApiVersion,
    id: i32,
    parent_id: i32,
    offset: [f64; MAX_DIMS],
    transform_matrix: [f64; MAX_DIMS * MAX_DIMS],
    center_of_rotation: [f64; MAX_DIMS],
    element_spacing: [f64; MAX_DIMS],
    anatomical_orientation: [AnatomicalOrientation; MAX_DIMS],
    color: [f32; 4],
    binary_data: bool,
    binary_data_byte_order_msb: bool,
    compressed_data: bool,
    compressed_data_size: u64,
    compression_level: i32,
    write_compressed_data_size: bool,
    distance_units: DistanceUnits,
}

impl Default for ObjectHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectHeader {
    /// Create a zero-dimensional header with every attribute at its default
    pub fn new() -> Self {
        let mut header = Self {
            n_dims: 0,
            object_type_name: String::new(),
            object_sub_type_name: String::new(),
            comment: String::new(),
            name: String::new(),
            acquisition_date: String::new(),
            file_format_version: FileFormatVersion::default(),
            api_version: ApiVersion::default(),
            id: -1,
            parent_id: -1,
            offset: [0.0; MAX_DIMS],
            transform_matrix: [0.0; MAX_DIMS * MAX_DIMS],
            center_of_rotation: [0.0; MAX_DIMS],
            element_spacing: [1.0; MAX_DIMS],
            anatomical_orientation: [AnatomicalOrientation::Unknown; MAX_DIMS],
            color: [1.0; 4],
            binary_data: false,
            binary_data_byte_order_msb: system_byte_order_msb(),
            compressed_data: false,
            compressed_data_size: 0,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            write_compressed_data_size: true,
            distance_units: DistanceUnits::Unknown,
        };
        header.clear();
        header
    }

    /// Create a header of the given dimensionality
    pub fn with_dims(n_dims: i32) -> Self {
        let mut header = Self::new();
        header.initialize_essential(n_dims);
        header
    }

    /// Reset every attribute to its default.
    ///
    /// Dimensionality, versions and the payload writing preferences
    /// (compression level, size line) are kept.
    pub fn clear(&mut self) {
        self.comment.clear();
        self.object_type_name = DEFAULT_OBJECT_TYPE.to_string();
        self.object_sub_type_name.clear();
        self.name.clear();
        self.acquisition_date.clear();

        self.offset = [0.0; MAX_DIMS];
        self.transform_matrix = [0.0; MAX_DIMS * MAX_DIMS];
        self.center_of_rotation = [0.0; MAX_DIMS];
        self.element_spacing = [1.0; MAX_DIMS];
        self.anatomical_orientation = [AnatomicalOrientation::Unknown; MAX_DIMS];

        self.id = -1;
        self.parent_id = -1;
        self.color = [1.0; 4];
        self.binary_data = false;
        self.binary_data_byte_order_msb = system_byte_order_msb();
        self.compressed_data = false;
        self.compressed_data_size = 0;
        self.distance_units = DistanceUnits::Unknown;

        self.set_identity_transform();
    }

    /// Set the dimensionality and reset the dimension-sized attributes.
    ///
    /// `n_dims` is clamped to `0..=MAX_DIMS` with a warning. Identity
    /// metadata (name, ids, comment, dates) is left alone.
    pub fn initialize_essential(&mut self, n_dims: i32) {
        let n_dims = if n_dims > MAX_DIMS as i32 {
            warn!(
                requested = n_dims,
                "Number of dimensions limited to {}, resetting to {}", MAX_DIMS, MAX_DIMS
            );
            MAX_DIMS
        } else if n_dims < 0 {
            warn!(
                requested = n_dims,
                "Number of dimensions must be >= 0, resetting to 0"
            );
            0
        } else {
            n_dims as usize
        };

        self.n_dims = n_dims;
        self.offset = [0.0; MAX_DIMS];
        self.center_of_rotation = [0.0; MAX_DIMS];
        self.element_spacing = [1.0; MAX_DIMS];
        self.anatomical_orientation = [AnatomicalOrientation::Unknown; MAX_DIMS];
        self.set_identity_transform();
    }

    /// Copy every attribute from `other`.
    ///
    /// Dimensionality is not copied. When it differs a warning is logged and
    /// the copy goes ahead anyway, taking `other`'s own `n_dims` (and
    /// `n_dims²` matrix entries) from each dimension-sized attribute.
    pub fn copy_info(&mut self, other: &ObjectHeader) {
        if self.n_dims != other.n_dims {
            warn!(
                destination = self.n_dims,
                source = other.n_dims,
                "CopyInfo: NDims not same size"
            );
        }

        let n = other.n_dims;
        self.file_format_version = other.file_format_version;
        self.api_version = other.api_version;
        self.comment = other.comment.clone();
        self.object_type_name = other.object_type_name.clone();
        self.object_sub_type_name = other.object_sub_type_name.clone();
        self.center_of_rotation[..n].copy_from_slice(&other.center_of_rotation[..n]);
        self.offset[..n].copy_from_slice(&other.offset[..n]);
        self.transform_matrix[..n * n].copy_from_slice(&other.transform_matrix[..n * n]);
        self.element_spacing[..n].copy_from_slice(&other.element_spacing[..n]);
        self.anatomical_orientation[..n].copy_from_slice(&other.anatomical_orientation[..n]);
        self.id = other.id;
        self.color = other.color;
        self.parent_id = other.parent_id;
        self.acquisition_date = other.acquisition_date.clone();
        self.name = other.name.clone();
        self.binary_data = other.binary_data;
        self.binary_data_byte_order_msb = other.binary_data_byte_order_msb;
        self.compressed_data = other.compressed_data;
        self.distance_units = other.distance_units;
    }

    fn set_identity_transform(&mut self) {
        let n = self.n_dims;
        self.transform_matrix[..n * n].fill(0.0);
        for i in 0..n {
            self.transform_matrix[i * n + i] = 1.0;
        }
    }

    /// Whether the transform is the `n_dims` identity
    pub fn is_identity_transform(&self) -> bool {
        let n = self.n_dims;
        (0..n).all(|i| {
            (0..n).all(|j| {
                let expected = if i == j { 1.0 } else { 0.0 };
                self.transform_matrix[i * n + j] == expected
            })
        })
    }

    /// Replace an all-zero (never set) transform with the identity
    pub fn normalize_transform(&mut self) {
        let n = self.n_dims;
        if self.transform_matrix[..n * n].iter().all(|&v| v == 0.0) {
            self.set_identity_transform();
        }
    }

    fn warn_deprecated(&self, old: &str, new: &str) {
        if self.api_version.warns_on_deprecated() {
            warn!("{} is deprecated, please use {}", old, new);
        }
    }

    // =========================================================================
    // Scalar metadata
    // =========================================================================

    /// Dimensionality
    pub fn n_dims(&self) -> usize {
        self.n_dims
    }

    pub fn object_type_name(&self) -> &str {
        &self.object_type_name
    }

    pub fn set_object_type_name(&mut self, name: &str) {
        self.object_type_name = name.to_string();
    }

    pub fn object_sub_type_name(&self) -> &str {
        &self.object_sub_type_name
    }

    pub fn set_object_sub_type_name(&mut self, name: &str) {
        self.object_sub_type_name = name.to_string();
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn set_comment(&mut self, comment: &str) {
        self.comment = comment.to_string();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn acquisition_date(&self) -> &str {
        &self.acquisition_date
    }

    pub fn set_acquisition_date(&mut self, date: &str) {
        self.acquisition_date = date.to_string();
    }

    pub fn file_format_version(&self) -> FileFormatVersion {
        self.file_format_version
    }

    pub fn set_file_format_version(&mut self, version: impl Into<FileFormatVersion>) {
        self.file_format_version = version.into();
    }

    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    pub fn set_api_version(&mut self, version: impl Into<ApiVersion>) {
        self.api_version = version.into();
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn set_id(&mut self, id: i32) {
        self.id = id;
    }

    pub fn parent_id(&self) -> i32 {
        self.parent_id
    }

    pub fn set_parent_id(&mut self, parent_id: i32) {
        self.parent_id = parent_id;
    }

    /// RGBA color, opaque white by default
    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    pub fn set_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.color = [r, g, b, a];
    }

    // =========================================================================
    // Binary payload flags
    // =========================================================================

    pub fn binary_data(&self) -> bool {
        self.binary_data
    }

    pub fn set_binary_data(&mut self, binary: bool) {
        self.binary_data = binary;
    }

    /// Whether binary elements are stored most-significant byte first
    pub fn binary_data_byte_order_msb(&self) -> bool {
        self.binary_data_byte_order_msb
    }

    pub fn set_binary_data_byte_order_msb(&mut self, msb: bool) {
        self.binary_data_byte_order_msb = msb;
    }

    pub fn compressed_data(&self) -> bool {
        self.compressed_data
    }

    pub fn set_compressed_data(&mut self, compressed: bool) {
        self.compressed_data = compressed;
    }

    /// Size in bytes of the compressed payload, 0 when unknown
    pub fn compressed_data_size(&self) -> u64 {
        self.compressed_data_size
    }

    pub fn set_compressed_data_size(&mut self, size: u64) {
        self.compressed_data_size = size;
    }

    pub fn compression_level(&self) -> i32 {
        self.compression_level
    }

    pub fn set_compression_level(&mut self, level: i32) {
        self.compression_level = level;
    }

    /// Whether `CompressedDataSize` is written alongside compressed payloads
    pub fn write_compressed_data_size(&self) -> bool {
        self.write_compressed_data_size
    }

    pub fn set_write_compressed_data_size(&mut self, write: bool) {
        self.write_compressed_data_size = write;
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Offset of the first element, `n_dims` values
    pub fn offset(&self) -> &[f64] {
        &self.offset[..self.n_dims]
    }

    /// Offset along axis `i`. Panics if `i >= MAX_DIMS`.
    pub fn offset_at(&self, i: usize) -> f64 {
        self.offset[i]
    }

    /// Copy up to `n_dims` values into the offset
    pub fn set_offset(&mut self, offset: &[f64]) {
        let n = self.n_dims.min(offset.len());
        self.offset[..n].copy_from_slice(&offset[..n]);
    }

    pub fn set_offset_at(&mut self, i: usize, value: f64) {
        self.offset[i] = value;
    }

    /// Row-major `n_dims x n_dims` transform
    pub fn transform_matrix(&self) -> &[f64] {
        &self.transform_matrix[..self.n_dims * self.n_dims]
    }

    /// Element at row `i`, column `j`; both must be below `n_dims`
    pub fn transform_matrix_at(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.n_dims && j < self.n_dims, "matrix index ({i}, {j}) out of range");
        self.transform_matrix[i * self.n_dims + j]
    }

    /// Copy up to `n_dims²` row-major values into the transform
    pub fn set_transform_matrix(&mut self, matrix: &[f64]) {
        let n = (self.n_dims * self.n_dims).min(matrix.len());
        self.transform_matrix[..n].copy_from_slice(&matrix[..n]);
    }

    pub fn set_transform_matrix_at(&mut self, i: usize, j: usize, value: f64) {
        assert!(i < self.n_dims && j < self.n_dims, "matrix index ({i}, {j}) out of range");
        self.transform_matrix[i * self.n_dims + j] = value;
    }

    pub fn center_of_rotation(&self) -> &[f64] {
        &self.center_of_rotation[..self.n_dims]
    }

    pub fn center_of_rotation_at(&self, i: usize) -> f64 {
        self.center_of_rotation[i]
    }

    pub fn set_center_of_rotation(&mut self, center: &[f64]) {
        let n = self.n_dims.min(center.len());
        self.center_of_rotation[..n].copy_from_slice(&center[..n]);
    }

    pub fn set_center_of_rotation_at(&mut self, i: usize, value: f64) {
        self.center_of_rotation[i] = value;
    }

    /// Distance between element centers along each axis
    pub fn element_spacing(&self) -> &[f64] {
        &self.element_spacing[..self.n_dims]
    }

    pub fn element_spacing_at(&self, i: usize) -> f64 {
        self.element_spacing[i]
    }

    pub fn set_element_spacing(&mut self, spacing: &[f64]) {
        let n = self.n_dims.min(spacing.len());
        self.element_spacing[..n].copy_from_slice(&spacing[..n]);
    }

    /// Single-precision variant of [`Self::set_element_spacing`]
    pub fn set_element_spacing_f32(&mut self, spacing: &[f32]) {
        for (dst, &src) in self.element_spacing[..self.n_dims].iter_mut().zip(spacing) {
            *dst = f64::from(src);
        }
    }

    pub fn set_element_spacing_at(&mut self, i: usize, value: f64) {
        self.element_spacing[i] = value;
    }

    // =========================================================================
    // Deprecated aliases of Offset and TransformMatrix
    // =========================================================================

    #[deprecated(note = "use offset")]
    pub fn position(&self) -> &[f64] {
        self.warn_deprecated("Position", "Offset");
        self.offset()
    }

    #[deprecated(note = "use offset_at")]
    pub fn position_at(&self, i: usize) -> f64 {
        self.warn_deprecated("Position", "Offset");
        self.offset_at(i)
    }

    #[deprecated(note = "use set_offset")]
    pub fn set_position(&mut self, position: &[f64]) {
        self.warn_deprecated("Position", "Offset");
        self.set_offset(position);
    }

    #[deprecated(note = "use set_offset_at")]
    pub fn set_position_at(&mut self, i: usize, value: f64) {
        self.warn_deprecated("Position", "Offset");
        self.set_offset_at(i, value);
    }

    #[deprecated(note = "use offset")]
    pub fn origin(&self) -> &[f64] {
        self.warn_deprecated("Origin", "Offset");
        self.offset()
    }

    #[deprecated(note = "use offset_at")]
    pub fn origin_at(&self, i: usize) -> f64 {
        self.warn_deprecated("Origin", "Offset");
        self.offset_at(i)
    }

    #[deprecated(note = "use set_offset")]
    pub fn set_origin(&mut self, origin: &[f64]) {
        self.warn_deprecated("Origin", "Offset");
        self.set_offset(origin);
    }

    #[deprecated(note = "use set_offset_at")]
    pub fn set_origin_at(&mut self, i: usize, value: f64) {
        self.warn_deprecated("Origin", "Offset");
        self.set_offset_at(i, value);
    }

    #[deprecated(note = "use transform_matrix")]
    pub fn rotation(&self) -> &[f64] {
        self.warn_deprecated("Rotation", "TransformMatrix");
        self.transform_matrix()
    }

    #[deprecated(note = "use transform_matrix_at")]
    pub fn rotation_at(&self, i: usize, j: usize) -> f64 {
        self.warn_deprecated("Rotation", "TransformMatrix");
        self.transform_matrix_at(i, j)
    }

    #[deprecated(note = "use set_transform_matrix")]
    pub fn set_rotation(&mut self, matrix: &[f64]) {
        self.warn_deprecated("Rotation", "TransformMatrix");
        self.set_transform_matrix(matrix);
    }

    #[deprecated(note = "use set_transform_matrix_at")]
    pub fn set_rotation_at(&mut self, i: usize, j: usize, value: f64) {
        self.warn_deprecated("Rotation", "TransformMatrix");
        self.set_transform_matrix_at(i, j, value);
    }

    #[deprecated(note = "use transform_matrix")]
    pub fn orientation(&self) -> &[f64] {
        self.warn_deprecated("Orientation", "TransformMatrix");
        self.transform_matrix()
    }

    #[deprecated(note = "use transform_matrix_at")]
    pub fn orientation_at(&self, i: usize, j: usize) -> f64 {
        self.warn_deprecated("Orientation", "TransformMatrix");
        self.transform_matrix_at(i, j)
    }

    #[deprecated(note = "use set_transform_matrix")]
    pub fn set_orientation(&mut self, matrix: &[f64]) {
        self.warn_deprecated("Orientation", "TransformMatrix");
        self.set_transform_matrix(matrix);
    }

    #[deprecated(note = "use set_transform_matrix_at")]
    pub fn set_orientation_at(&mut self, i: usize, j: usize, value: f64) {
        self.warn_deprecated("Orientation", "TransformMatrix");
        self.set_transform_matrix_at(i, j, value);
    }

    // =========================================================================
    // Mnemonic enumerants
    // =========================================================================

    pub fn distance_units(&self) -> DistanceUnits {
        self.distance_units
    }

    pub fn set_distance_units(&mut self, units: DistanceUnits) {
        self.distance_units = units;
    }

    /// Set units from a mnemonic; no exact match means `Unknown`
    pub fn set_distance_units_name(&mut self, name: &str) {
        self.distance_units = DistanceUnits::from_name(name);
    }

    pub fn distance_units_name(&self) -> &'static str {
        self.distance_units.name()
    }

    /// Per-axis orientation, `n_dims` entries
    pub fn anatomical_orientation(&self) -> &[AnatomicalOrientation] {
        &self.anatomical_orientation[..self.n_dims]
    }

    pub fn anatomical_orientation_at(&self, axis: usize) -> AnatomicalOrientation {
        self.anatomical_orientation[axis]
    }

    pub fn set_anatomical_orientation(&mut self, orientation: &[AnatomicalOrientation]) {
        let n = self.n_dims.min(orientation.len());
        self.anatomical_orientation[..n].copy_from_slice(&orientation[..n]);
    }

    pub fn set_anatomical_orientation_at(&mut self, axis: usize, orientation: AnatomicalOrientation) {
        self.anatomical_orientation[axis] = orientation;
    }

    /// Set one axis from its acronym character
    pub fn set_anatomical_orientation_char(&mut self, axis: usize, c: char) {
        self.anatomical_orientation[axis] = AnatomicalOrientation::from_char(c);
    }

    /// Set every axis from an acronym such as `RAS`.
    ///
    /// Axes beyond the end of the acronym, and unrecognised characters,
    /// become `Unknown`.
    pub fn set_anatomical_orientation_acronym(&mut self, acronym: &str) {
        let mut chars = acronym.chars();
        for axis in 0..self.n_dims {
            self.anatomical_orientation[axis] = chars
                .next()
                .map(AnatomicalOrientation::from_char)
                .unwrap_or(AnatomicalOrientation::Unknown);
        }
    }

    /// One character per axis, e.g. `RAS`
    pub fn anatomical_orientation_acronym(&self) -> String {
        self.anatomical_orientation()
            .iter()
            .map(|o| o.acronym_char())
            .collect()
    }
}

/// Byte order of the running platform
pub fn system_byte_order_msb() -> bool {
    cfg!(target_endian = "big")
}
