use std::fs;

use twpb::{decode, OneofResolver, Value};
use twpb_fixtures::cli::{check, generate};
use twpb_fixtures::{fixtures, Fixture, FixtureError, Schemas};

const SIMPLE: &[u8] = b"\x0a\x06serial\x12\x08firmware\x1a\x06vendor\x22\x07product";

fn fixture(name: &str) -> Fixture {
    let schemas = Schemas::load().unwrap();
    fixtures(&schemas)
        .unwrap()
        .into_iter()
        .find(|f| f.file_name == name)
        .unwrap()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[test]
fn simple_fixture_bytes() {
    assert_eq!(fixture("twpb.simple.bin").encode().unwrap(), SIMPLE);
}

#[test]
fn oneof_simple_fixture_bytes() {
    let f = fixture("twpb.oneof.simple.bin");
    let bytes = f.encode().unwrap();
    assert_eq!(bytes, b"\x1a\x07teststr");

    let msg = decode(&bytes, &f.descriptor).unwrap();
    assert_eq!(
        msg.value_by_name(&f.descriptor, "test").as_deref(),
        Some(&Value::from("teststr"))
    );
    assert_eq!(
        msg.value_by_name(&f.descriptor, "something_else").as_deref(),
        Some(&Value::from(""))
    );
    assert_eq!(msg.value_by_name(&f.descriptor, "ss"), None);
}

#[test]
fn oneof_embedded_fixture_bytes() {
    let f = fixture("twpb.oneof.embedded.bin");
    let bytes = f.encode().unwrap();
    let mut expected = vec![0x0a, 0x23];
    expected.extend_from_slice(SIMPLE);
    expected.extend_from_slice(b"\x2a\x0esomething else");
    assert_eq!(bytes, expected);

    // The embedded message must consume exactly its own bytes.
    let msg = decode(&bytes, &f.descriptor).unwrap();
    assert_eq!(msg.get(5), Some(&Value::from("something else")));
    let ss = msg.get(1).and_then(Value::as_message).unwrap();
    assert_eq!(ss.get(4), Some(&Value::from("product")));

    // Decoding the nested message leaves the sibling member unset.
    assert_eq!(msg.value_by_name(&f.descriptor, "test"), None);
    let content = OneofResolver::new(&f.descriptor);
    assert_eq!(content.active_member(&msg, 0), Some(1));
}

#[test]
fn get_info_fixture_bytes() {
    let schemas = Schemas::load().unwrap();
    let f = fixture("twpb.api.getInfo.bin");
    let bytes = f.encode().unwrap();
    assert_eq!(bytes, [0x0a, 0x02, 0x0a, 0x00]);

    let msg = decode(&bytes, &schemas.api_message).unwrap();
    let api = OneofResolver::new(&schemas.api_message);
    assert_eq!(api.active_member(&msg, 0), Some(1));
    let request = msg.get(1).and_then(Value::as_message).unwrap();
    let v1 = OneofResolver::new(&schemas.v1_request);
    let get_info = schemas.v1_request.field_by_name("getInfo").unwrap().number;
    assert_eq!(v1.active_member(request, 0), Some(get_info));
    assert!(request
        .value_by_name(&schemas.v1_request, "getOtherThing")
        .is_none());
}

#[test]
fn simple_types_fixture_bytes() {
    let bytes = fixture("twpb.types.simple.bin").encode().unwrap();
    let mut expected = Vec::new();
    expected.extend_from_slice(&[0x08, 0xbb, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01]);
    expected.extend_from_slice(&[0x10, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x01]);
    expected.extend_from_slice(&[0x18, 0x2a]);
    expected.extend_from_slice(&[0x20, 0x01]);
    expected.extend_from_slice(&[0x28, 0x89, 0x01]);
    expected.extend_from_slice(&[0x30, 0x8a, 0x01]);
    expected.extend_from_slice(&[0x3d, 0xff, 0xff, 0xff, 0xff]);
    expected.extend_from_slice(&[0x41, 0x2a, 0, 0, 0, 0, 0, 0, 0]);
    expected.extend_from_slice(&[0x4d, 0xff, 0xff, 0xff, 0x7f]);
    expected.extend_from_slice(&[0x51, 0x01, 0, 0, 0, 0, 0, 0, 0x80]);
    expected.extend_from_slice(&[0x59, 0, 0, 0, 0, 0, 0, 0xf0, 0x3f]);
    expected.extend_from_slice(&[0x65, 0xdb, 0x0f, 0x49, 0x40]);
    expected.extend_from_slice(&[0x68, 0x01]);
    expected.extend_from_slice(&[0x72, 0x04, 0xf0, 0x9f, 0x90, 0x89]);
    expected.extend_from_slice(&[0x7a, 0x04, b'A', b'S', b'D', b'F']);
    assert_eq!(bytes, expected);
}

#[test]
fn repeated_types_fixture_fragments() {
    let f = fixture("twpb.types.repeated.bin");
    let bytes = f.encode().unwrap();

    // packed int32 [4, -300]
    assert!(contains(
        &bytes,
        &[0x0a, 0x0b, 0x04, 0xd4, 0xfd, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01]
    ));
    // packed fixed32 [u32::MAX, 1]
    assert!(contains(&bytes, &[0x3a, 0x08, 0xff, 0xff, 0xff, 0xff, 0x01, 0, 0, 0]));
    // packed sfixed64 [42, -42]
    assert!(contains(
        &bytes,
        &[
            0x52, 0x10, 0x2a, 0, 0, 0, 0, 0, 0, 0, 0xd6, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff
        ]
    ));
    // packed bool [true, false]
    assert!(contains(&bytes, &[0x6a, 0x02, 0x01, 0x00]));
    // one tag per string
    let mut strings = vec![0x72, 0x04, 0xf0, 0x9f, 0x90, 0x89, 0x72, 0x09];
    strings.extend_from_slice("अरे".as_bytes());
    assert!(contains(&bytes, &strings));
    // int32_notpacked ends the message, one tag per element
    assert!(bytes.ends_with(&[
        0x80, 0x01, 0x04, 0x80, 0x01, 0xd4, 0xfd, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01
    ]));

    let msg = decode(&bytes, &f.descriptor).unwrap();
    assert_eq!(msg, f.message);
}

#[test]
fn generated_files_pass_the_checker() {
    let dir = tempfile::tempdir().unwrap();
    let written = generate(dir.path()).unwrap();
    assert_eq!(written.len(), 6);
    for path in &written {
        assert!(path.exists(), "{}", path.display());
    }
    assert_eq!(
        fs::read(dir.path().join("twpb.simple.bin")).unwrap(),
        SIMPLE
    );

    let checked = check(dir.path()).unwrap();
    assert_eq!(
        checked,
        vec![
            "twpb.simple.bin",
            "twpb.oneof.simple.bin",
            "twpb.oneof.embedded.bin",
            "twpb.api.getInfo.bin",
            "twpb.types.simple.bin",
            "twpb.types.repeated.bin",
        ]
    );
}

#[test]
fn generator_creates_nested_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("fixtures").join("bin");
    generate(&out).unwrap();
    assert!(out.join("twpb.types.repeated.bin").exists());
}

#[test]
fn checker_reports_tampered_file() {
    let dir = tempfile::tempdir().unwrap();
    generate(dir.path()).unwrap();
    // "serial" -> "seriaL"
    let path = dir.path().join("twpb.simple.bin");
    let mut bytes = fs::read(&path).unwrap();
    bytes[7] = b'L';
    fs::write(&path, &bytes).unwrap();

    match check(dir.path()) {
        Err(FixtureError::Mismatch { file, path, .. }) => {
            assert_eq!(file, "twpb.simple.bin");
            assert_eq!(path, "serial_number");
        }
        other => panic!("expected mismatch, got {other:?}"),
    }
}

#[test]
fn checker_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = check(dir.path()).unwrap_err();
    assert!(matches!(err, FixtureError::Io { .. }));
    assert!(err.to_string().contains("twpb.simple.bin"));
    let source = std::error::Error::source(&err).unwrap();
    assert!(source.downcast_ref::<std::io::Error>().is_some());
}
