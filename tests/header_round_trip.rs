//! Header Round-Trip Tests
//!
//! Write-then-read symmetry, default elision and format tolerance through
//! the public `MetaObject` entry points.

use std::io::Cursor;
use std::path::Path;

use metaio::{
    AnatomicalOrientation, DistanceUnits, FileFormatVersion, MetaError, MetaObject, ValueType,
    MAX_DIMS,
};
use tempfile::TempDir;

mod common;
use common::capture_warnings;

fn fixtures_path() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").leak()
}

fn written(object: &mut MetaObject) -> String {
    let mut out = Vec::new();
    object.write_stream(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

// =============================================================================
// Round Trip
// =============================================================================

#[test]
fn test_round_trip_every_dimensionality() {
    let dir = TempDir::new().unwrap();

    for n in 1..=MAX_DIMS {
        let mut object = MetaObject::with_dims(n as i32);
        {
            let h = object.header_mut();
            let offset: Vec<f64> = (0..n).map(|i| i as f64 * 0.37 - 2.0).collect();
            let spacing: Vec<f64> = (0..n).map(|i| 0.1 + i as f64 / 7.0).collect();
            let center: Vec<f64> = (0..n).map(|i| (i * i) as f64).collect();
            let matrix: Vec<f64> = (0..n * n).map(|i| (i % (n + 1)) as f64 * 0.5).collect();
            h.set_offset(&offset);
            h.set_element_spacing(&spacing);
            h.set_center_of_rotation(&center);
            h.set_transform_matrix(&matrix);
            h.set_name(&format!("object {n}"));
            h.set_id(n as i32);
            h.set_parent_id(0);
            h.set_color(0.2, 0.4, 0.6, 0.8);
            h.set_distance_units(DistanceUnits::Micrometer);
            h.set_anatomical_orientation_at(0, AnatomicalOrientation::InferiorToSuperior);
        }

        let path = dir.path().join(format!("object{n}.mha"));
        object.write(&path).unwrap();

        let mut back = MetaObject::new();
        back.read(&path).unwrap();

        let (a, b) = (object.header(), back.header());
        assert_eq!(b.n_dims(), n);
        assert_eq!(b.offset(), a.offset());
        assert_eq!(b.element_spacing(), a.element_spacing());
        assert_eq!(b.center_of_rotation(), a.center_of_rotation());
        assert_eq!(b.transform_matrix(), a.transform_matrix());
        assert_eq!(b.name(), a.name());
        assert_eq!(b.id(), a.id());
        assert_eq!(b.parent_id(), 0);
        assert_eq!(b.color(), a.color());
        assert_eq!(b.distance_units(), DistanceUnits::Micrometer);
        assert_eq!(b.anatomical_orientation_acronym(), a.anatomical_orientation_acronym());
        assert_eq!(back.file_name(), Some(path.as_path()));
    }
}

#[test]
fn test_round_trip_through_config_precision() {
    let mut object = MetaObject::with_dims(1);
    object.set_double_precision(4);
    object.header_mut().set_offset(&[2.0 / 3.0]);
    assert_eq!(written(&mut object), "ObjectType = Object\nNDims = 1\nOffset = 0.6667\n");
}

// =============================================================================
// Default Elision
// =============================================================================

#[test]
fn test_defaults_are_not_written() {
    let mut object = MetaObject::with_dims(3);
    object.header_mut().set_name("plain");

    let text = written(&mut object);
    assert_eq!(text, "ObjectType = Object\nNDims = 3\nName = plain\n");
    for absent in ["TransformMatrix", "Color", "Offset", "ElementSpacing", "BinaryData", "ID"] {
        assert!(!text.contains(absent), "{absent} should be elided");
    }

    let mut back = MetaObject::new();
    back.read_stream(&mut Cursor::new(text)).unwrap();
    assert!(back.header().is_identity_transform());
    assert_eq!(back.header().transform_matrix().len(), 9);
    assert_eq!(back.header().color(), [1.0; 4]);
    assert_eq!(back.header().element_spacing(), &[1.0, 1.0, 1.0]);
    assert_eq!(back.header().id(), -1);
}

#[test]
fn test_binary_flags_written_together() {
    let mut object = MetaObject::with_dims(2);
    object.header_mut().set_binary_data(true);
    object.header_mut().set_binary_data_byte_order_msb(true);

    let text = written(&mut object);
    assert!(text.contains("BinaryData = True\nBinaryDataByteOrderMSB = True\nCompressedData = False\n"));
    assert!(!text.contains("CompressedDataSize"));

    object.header_mut().set_compressed_data(true);
    object.header_mut().set_compressed_data_size(99);
    object.header_mut().set_write_compressed_data_size(false);
    let text = written(&mut object);
    assert!(text.contains("CompressedData = True\n"));
    assert!(!text.contains("CompressedDataSize"));
}

// =============================================================================
// Fixtures
// =============================================================================

#[test]
fn test_read_full_fixture() {
    let mut object = MetaObject::new();
    object.read(fixtures_path().join("full_header.txt")).unwrap();
    let h = object.header();

    assert_eq!(h.object_type_name(), "Image");
    assert_eq!(h.object_sub_type_name(), "Segmentation");
    assert_eq!(h.file_format_version(), FileFormatVersion(1));
    assert_eq!(h.comment(), "liver = left lobe");
    assert_eq!(h.n_dims(), 3);
    assert_eq!(h.name(), "liver");
    assert_eq!(h.id(), 12);
    assert_eq!(h.parent_id(), 3);
    assert_eq!(h.acquisition_date(), "2019.11.05");
    assert_eq!(h.color(), [0.5, 0.25, 1.0, 0.75]);
    assert!(h.binary_data());
    assert!(h.binary_data_byte_order_msb());
    assert!(h.compressed_data());
    assert_eq!(h.compressed_data_size(), 2048);
    assert_eq!(h.transform_matrix(), &[0.0, 1.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    assert_eq!(h.offset(), &[-12.5, 40.0, 7.25]);
    assert_eq!(h.center_of_rotation(), &[1.0, 2.0, 3.0]);
    assert_eq!(h.distance_units(), DistanceUnits::Centimeter);
    assert_eq!(h.anatomical_orientation_acronym(), "LPS");
    assert_eq!(h.element_spacing(), &[0.75, 0.75, 2.5]);

    assert_eq!(object.additional_fields().len(), 1);
    assert_eq!(object.additional_field("ElementType"), Some("MET_SHORT"));
}

#[test]
fn test_full_fixture_rewrites_identically() {
    let fixture = std::fs::read_to_string(fixtures_path().join("full_header.txt")).unwrap();
    let mut object = MetaObject::new();
    object.read_stream(&mut Cursor::new(fixture.as_bytes())).unwrap();

    // Unknown fields are kept for inspection but not written back
    let expected: String = fixture
        .lines()
        .filter(|l| !l.starts_with("ElementType"))
        .map(|l| format!("{l}\n"))
        .collect();
    assert_eq!(written(&mut object), expected);
}

// =============================================================================
// Format Tolerance
// =============================================================================

#[test]
fn test_unknown_field_preserved() {
    let mut object = MetaObject::new();
    object
        .read_stream(&mut Cursor::new("NDims = 2\nFoo = bar\nHeaderSize = -1\n"))
        .unwrap();

    let extra = object.additional_fields();
    assert_eq!(extra.len(), 2);
    assert_eq!((extra[0].name.as_str(), extra[0].value.as_str()), ("Foo", "bar"));
    assert_eq!(extra[0].length(), 3);
    assert_eq!(object.additional_field("HeaderSize"), Some("-1"));

    object.clear_additional_fields();
    assert!(object.additional_fields().is_empty());
}

#[test]
fn test_dependent_length_comes_from_ndims() {
    let mut object = MetaObject::new();
    let err = object
        .read_stream(&mut Cursor::new("NDims = 2\nOffset = 1 2 3\n"))
        .unwrap_err();
    assert!(matches!(
        err,
        MetaError::TokenCountMismatch { ref field, expected: 2, actual: 3 } if field == "Offset"
    ));

    let err = object
        .read_stream(&mut Cursor::new("NDims = 2\nTransformMatrix = 1 0 0 1 0\n"))
        .unwrap_err();
    assert!(matches!(err, MetaError::TokenCountMismatch { expected: 4, actual: 5, .. }));
}

#[test]
fn test_read_failures() {
    let mut object = MetaObject::new();
    assert!(matches!(
        object.read_stream(&mut Cursor::new("Name = no dims\n")),
        Err(MetaError::MissingRequiredField { ref name }) if name == "NDims"
    ));
    assert!(matches!(
        object.read_stream(&mut Cursor::new("NDims = three\n")),
        Err(MetaError::InvalidNumber { .. })
    ));
    assert!(matches!(
        object.read_stream(&mut Cursor::new("NDims = 3\nthis line has no separator\n")),
        Err(MetaError::MalformedLine(_))
    ));

    let dir = TempDir::new().unwrap();
    assert!(matches!(
        object.read(dir.path().join("missing.mha")),
        Err(MetaError::Io(_))
    ));
}

#[test]
fn test_ndims_clamped() {
    let mut object = MetaObject::new();

    let logs = capture_warnings(|| {
        object.read_stream(&mut Cursor::new("NDims = 12\n")).unwrap();
    });
    assert_eq!(object.header().n_dims(), MAX_DIMS);
    assert!(logs.contains("Number of dimensions limited to 10"), "{logs}");

    let logs = capture_warnings(|| {
        object.read_stream(&mut Cursor::new("NDims = -3\n")).unwrap();
    });
    assert_eq!(object.header().n_dims(), 0);
    assert!(logs.contains("Number of dimensions must be >= 0"), "{logs}");

    let logs = capture_warnings(|| {
        object.read_stream(&mut Cursor::new("NDims = 3\n")).unwrap();
    });
    assert_eq!(object.header().n_dims(), 3);
    assert!(!logs.contains("Number of dimensions"), "{logs}");
}

// =============================================================================
// Anatomical Orientation
// =============================================================================

#[test]
fn test_anatomical_orientation_round_trip() {
    let mut object = MetaObject::with_dims(3);
    object.header_mut().set_anatomical_orientation_acronym("RAS");
    assert_eq!(object.header().anatomical_orientation_acronym(), "RAS");

    let text = written(&mut object);
    assert!(text.contains("AnatomicalOrientation = RAS\n"));

    let mut back = MetaObject::new();
    back.read_stream(&mut Cursor::new(text)).unwrap();
    assert_eq!(back.header().anatomical_orientation_acronym(), "RAS");

    back.header_mut().set_anatomical_orientation_char(1, 'Z');
    assert_eq!(back.header().anatomical_orientation_at(1), AnatomicalOrientation::Unknown);
    assert_eq!(back.header().anatomical_orientation_acronym(), "R?S");
}

#[test]
fn test_partial_orientation_round_trip() {
    let mut object = MetaObject::with_dims(3);
    object.header_mut().set_anatomical_orientation_acronym("?AS");

    let text = written(&mut object);
    assert!(text.contains("AnatomicalOrientation = ?AS\n"), "{text}");

    let mut back = MetaObject::new();
    back.read_stream(&mut Cursor::new(text)).unwrap();
    assert_eq!(back.header().anatomical_orientation_acronym(), "?AS");
    assert_eq!(back.header().anatomical_orientation_at(0), AnatomicalOrientation::Unknown);

    let mut unset = MetaObject::with_dims(3);
    assert!(!written(&mut unset).contains("AnatomicalOrientation"));
}

#[test]
fn test_unknown_distance_units_in_stream() {
    let mut object = MetaObject::new();
    object
        .read_stream(&mut Cursor::new("NDims = 1\nDistanceUnits = mmm\n"))
        .unwrap();
    assert_eq!(object.header().distance_units(), DistanceUnits::Unknown);
}

// =============================================================================
// Path Entry Points and Payloads
// =============================================================================

#[test]
fn test_append_adds_after_existing_content() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scene.mha");

    let mut first = MetaObject::with_dims(2);
    first.header_mut().set_name("first");
    first.write(&path).unwrap();

    let mut second = MetaObject::with_dims(2);
    second.header_mut().set_name("second");
    second.append(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        text,
        "ObjectType = Object\nNDims = 2\nName = first\nObjectType = Object\nNDims = 2\nName = second\n"
    );
}

#[test]
fn test_save_and_reload_use_file_name() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("saved.mha");

    let mut object = MetaObject::with_dims(2);
    object.set_file_name(&path);
    object.header_mut().set_comment("kept");
    object.save().unwrap();

    let mut back = MetaObject::new();
    back.set_file_name(&path);
    back.reload().unwrap();
    assert_eq!(back.header().comment(), "kept");
}

fn payload_reader() -> MetaObject {
    let mut object = MetaObject::new();
    object
        .add_terminating_user_field("ElementDataFile", ValueType::String)
        .unwrap();
    object
}

#[test]
fn test_raw_payload_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.mha");
    let raw: Vec<u8> = (0..=255u8).chain(b"\nNDims = 9\n".iter().copied()).collect();

    let mut object = payload_reader();
    object.header_mut().initialize_essential(1);
    object.add_user_text_field("ElementDataFile", "LOCAL").unwrap();
    object.write_with_payload(&path, &raw).unwrap();

    let mut back = payload_reader();
    let payload = back.read_with_payload(&path, raw.len()).unwrap();
    assert_eq!(payload, raw);
    assert!(back.header().binary_data());
    assert!(!back.header().compressed_data());
    assert_eq!(back.user_field_text("ElementDataFile").as_deref(), Some("LOCAL"));
}

#[test]
fn test_compressed_payload_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("zipped.mha");
    let raw: Vec<u8> = (0..10_000u32).map(|i| (i / 100) as u8).collect();

    let mut object = payload_reader();
    object.header_mut().initialize_essential(3);
    object.header_mut().set_compressed_data(true);
    object.add_user_text_field("ElementDataFile", "LOCAL").unwrap();
    object.write_with_payload(&path, &raw).unwrap();

    let size = object.header().compressed_data_size();
    assert!(size > 0 && size < raw.len() as u64);
    let text = std::fs::read(&path).unwrap();
    let header_text = String::from_utf8_lossy(&text[..text.len() - size as usize]).to_string();
    assert!(header_text.contains(&format!("CompressedDataSize = {size}\n")));
    assert!(header_text.ends_with("ElementDataFile = LOCAL\n"));

    let mut back = payload_reader();
    let payload = back.read_with_payload(&path, raw.len()).unwrap();
    assert_eq!(payload, raw);
    assert_eq!(back.header().compressed_data_size(), size);
}

#[test]
fn test_declared_compressed_size_beyond_stream() {
    let mut object = payload_reader();
    let header = "NDims = 1\nCompressedData = True\nCompressedDataSize = 100000000000000000\n\
                  ElementDataFile = LOCAL\n";
    let mut input = Cursor::new(format!("{header}{}", "\0".repeat(16)).into_bytes());
    object.read_stream(&mut input).unwrap();
    assert_eq!(object.header().compressed_data_size(), 100_000_000_000_000_000);

    let err = object.read_payload(&mut input, 4).unwrap_err();
    assert!(matches!(err, MetaError::Codec(ref msg) if msg.contains("stream holds 16")));
}
