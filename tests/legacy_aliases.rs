//! Legacy Alias Tests
//!
//! Precedence of the deprecated `Position`/`Origin` and `Rotation`/`Orientation`
//! names against the canonical `Offset` and `TransformMatrix`, and the
//! deprecation warnings of the matching accessors.

use std::io::Cursor;
use std::path::Path;

use metaio::{ApiVersion, FileFormatVersion, MetaObject, ObjectHeader};

mod common;
use common::capture_warnings;

fn fixtures_path() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").leak()
}

fn read(text: &str) -> MetaObject {
    let mut object = MetaObject::new();
    object.read_stream(&mut Cursor::new(text)).unwrap();
    object
}

/// Every subset of `names`, in order
fn subsets<'a>(names: &[&'a str]) -> Vec<Vec<&'a str>> {
    (0..1u32 << names.len())
        .map(|mask| {
            names
                .iter()
                .enumerate()
                .filter(|&(i, _)| mask & (1 << i) != 0)
                .map(|(_, n)| *n)
                .collect()
        })
        .collect()
}

// =============================================================================
// Offset Precedence
// =============================================================================

fn offset_values(name: &str) -> [f64; 3] {
    match name {
        "Position" => [1.0, 2.0, 3.0],
        "Origin" => [4.0, 5.0, 6.0],
        _ => [9.0, 9.0, 9.0],
    }
}

#[test]
fn test_offset_alias_combinations() {
    for present in subsets(&["Position", "Origin", "Offset"]) {
        // Stream order is the reverse of precedence, so the result cannot
        // come from line order
        let mut text = String::from("NDims = 3\n");
        for name in present.iter().rev() {
            let v = offset_values(name);
            text.push_str(&format!("{} = {} {} {}\n", name, v[0], v[1], v[2]));
        }

        let expected = ["Offset", "Origin", "Position"]
            .into_iter()
            .find(|n| present.contains(n))
            .map(offset_values)
            .unwrap_or([0.0; 3]);

        let object = read(&text);
        assert_eq!(object.header().offset(), &expected, "fields present: {present:?}");
    }
}

#[test]
fn test_canonical_offset_wins() {
    let object = read("NDims = 3\nOrigin = 1 2 3\nOffset = 9 9 9\n");
    assert_eq!(object.header().offset(), &[9.0, 9.0, 9.0]);

    let object = read("NDims = 3\nOffset = 9 9 9\nOrigin = 1 2 3\n");
    assert_eq!(object.header().offset(), &[9.0, 9.0, 9.0]);
}

// =============================================================================
// Transform Precedence
// =============================================================================

fn matrix_values(name: &str) -> [f64; 4] {
    match name {
        "Rotation" => [0.0, 1.0, 1.0, 0.0],
        "Orientation" => [0.0, -1.0, 1.0, 0.0],
        _ => [2.0, 0.0, 0.0, 2.0],
    }
}

#[test]
fn test_transform_alias_combinations() {
    for present in subsets(&["Rotation", "Orientation", "TransformMatrix"]) {
        let mut text = String::from("NDims = 2\n");
        for name in present.iter().rev() {
            let m = matrix_values(name);
            text.push_str(&format!("{} = {} {} {} {}\n", name, m[0], m[1], m[2], m[3]));
        }

        let expected = ["TransformMatrix", "Orientation", "Rotation"]
            .into_iter()
            .find(|n| present.contains(n))
            .map(matrix_values)
            .unwrap_or([1.0, 0.0, 0.0, 1.0]);

        let object = read(&text);
        assert_eq!(object.header().transform_matrix(), &expected, "fields present: {present:?}");
    }
}

#[test]
fn test_alias_lengths_follow_ndims() {
    let mut object = MetaObject::new();
    assert!(object
        .read_stream(&mut Cursor::new("NDims = 2\nRotation = 1 0 0 0 1 0 0 0 1\n"))
        .is_err());
    assert!(object
        .read_stream(&mut Cursor::new("NDims = 4\nPosition = 1 2 3\n"))
        .is_err());
}

// =============================================================================
// Version Gating
// =============================================================================

#[test]
fn test_aliases_ignored_after_format_version_zero() {
    let object = read(
        "FileFormatVersion = 1\nNDims = 2\nPosition = 5 5\nOrigin = 6 6\n\
         Rotation = 0 1 1 0\nOrientation = 0 1 1 0\n",
    );
    assert_eq!(object.header().file_format_version(), FileFormatVersion(1));
    assert_eq!(object.header().offset(), &[0.0, 0.0]);
    assert!(object.header().is_identity_transform());
    // The alias fields were still recognised, not treated as unknown
    assert!(object.additional_fields().is_empty());
}

#[test]
fn test_legacy_fixture() {
    let mut object = MetaObject::new();
    object.read(fixtures_path().join("legacy_tube.txt")).unwrap();
    let h = object.header();

    assert_eq!(h.object_type_name(), "Tube");
    assert_eq!(h.file_format_version(), FileFormatVersion::LEGACY);
    assert_eq!(h.offset(), &[4.0, 5.0, 6.0]);
    assert_eq!(h.transform_matrix(), &[0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    assert_eq!(h.anatomical_orientation_acronym(), "RAS");
    assert_eq!(object.additional_field("Modality"), Some("MET_MOD_CT"));
    assert_eq!(object.additional_field("PointDim"), Some("x y z r"));
}

#[test]
fn test_legacy_fixture_rewritten_with_canonical_names() {
    let mut object = MetaObject::new();
    object.read(fixtures_path().join("legacy_tube.txt")).unwrap();

    let mut out = Vec::new();
    object.write_stream(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("TransformMatrix = 0 1 0 1 0 0 0 0 1\n"));
    assert!(text.contains("Offset = 4 5 6\n"));
    for legacy in ["Position", "Origin", "Rotation", "Orientation"] {
        assert!(!text.lines().any(|l| l.starts_with(legacy)), "{legacy} written");
    }
}

// =============================================================================
// Deprecated Accessors
// =============================================================================

#[allow(deprecated)]
fn exercise_deprecated(header: &mut ObjectHeader) {
    header.set_position(&[1.0, 2.0]);
    let _ = header.origin();
    header.set_rotation_at(0, 1, 0.5);
    let _ = header.orientation_at(0, 1);
}

#[test]
fn test_deprecated_accessors_warn_under_api_version_one() {
    let mut header = ObjectHeader::with_dims(2);
    header.set_api_version(ApiVersion::DEPRECATION_WARNINGS);

    let logs = capture_warnings(|| exercise_deprecated(&mut header));
    assert!(logs.contains("Position is deprecated, please use Offset"));
    assert!(logs.contains("Origin is deprecated, please use Offset"));
    assert!(logs.contains("Rotation is deprecated, please use TransformMatrix"));
    assert!(logs.contains("Orientation is deprecated, please use TransformMatrix"));

    // Behaviour matches the canonical accessors
    assert_eq!(header.offset(), &[1.0, 2.0]);
    assert_eq!(header.transform_matrix_at(0, 1), 0.5);
}

#[test]
fn test_deprecated_accessors_silent_otherwise() {
    for api in [0u32, 2] {
        let mut header = ObjectHeader::with_dims(2);
        header.set_api_version(ApiVersion(api));

        let logs = capture_warnings(|| exercise_deprecated(&mut header));
        assert!(!logs.contains("deprecated"), "api version {api}: {logs}");
        assert_eq!(header.offset(), &[1.0, 2.0]);
    }
}
