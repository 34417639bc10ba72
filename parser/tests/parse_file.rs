//! Integration tests running the file entry points over complete
//! DICOM Part 10 files written to disk.

use dcmio_core::{Tag, Value, VR};
use dcmio_parser::{Error, Parser};
use std::io::Write;
use tempfile::NamedTempFile;

const TAG_SPECIFIC_CHARACTER_SET: Tag = Tag(0x0008, 0x0005);
const TAG_STUDY_DATE: Tag = Tag(0x0008, 0x0020);
const TAG_PATIENT_NAME: Tag = Tag(0x0010, 0x0010);
const TAG_PATIENT_ID: Tag = Tag(0x0010, 0x0020);
const TAG_ROWS: Tag = Tag(0x0028, 0x0010);
const TAG_META_GROUP_LENGTH: Tag = Tag(0x0002, 0x0000);
const TAG_TRANSFER_SYNTAX_UID: Tag = Tag(0x0002, 0x0010);

/// 128 zero bytes and the DICM magic code.
fn prologue() -> Vec<u8> {
    let mut out = vec![0u8; 128];
    out.extend_from_slice(b"DICM");
    out
}

/// One explicit VR little endian element in the short length form.
fn element_short(tag: Tag, vr: &str, value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + value.len());
    out.extend_from_slice(&tag.group().to_le_bytes());
    out.extend_from_slice(&tag.element().to_le_bytes());
    out.extend_from_slice(vr.as_bytes());
    out.extend_from_slice(&(value.len() as u16).to_le_bytes());
    out.extend_from_slice(value);
    out
}

/// A file meta group: the group length element followed by the given
/// elements, which it measures.
fn meta_group(elements: &[Vec<u8>]) -> Vec<u8> {
    let total: usize = elements.iter().map(Vec::len).sum();
    let mut out = element_short(TAG_META_GROUP_LENGTH, "UL", &(total as u32).to_le_bytes());
    for e in elements {
        out.extend_from_slice(e);
    }
    out
}

fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("should create a temporary file");
    file.write_all(bytes).expect("should write the test file");
    file
}

#[test]
fn minimal_file_with_empty_meta_group() {
    let mut bytes = prologue();
    bytes.extend_from_slice(&meta_group(&[]));
    let file = write_temp(&bytes);

    let ds = Parser::new().parse_file(file.path()).unwrap();
    assert_eq!(ds.len(), 1);
    let elem = ds.get(TAG_META_GROUP_LENGTH).unwrap();
    assert_eq!(elem.vr(), VR::UL);
    assert_eq!(elem.value().uint32().unwrap(), 0);
}

#[test]
fn meta_group_without_group_length() {
    // a transfer syntax element alone; the meta loop stops at EOF
    let mut bytes = prologue();
    bytes.extend_from_slice(&element_short(
        TAG_TRANSFER_SYNTAX_UID,
        "UI",
        b"1.2.840.10008.1.2\0\0\0",
    ));
    let file = write_temp(&bytes);

    let ds = Parser::new().parse_file(file.path()).unwrap();
    assert_eq!(ds.len(), 1);
    assert_eq!(
        ds.get_string(TAG_TRANSFER_SYNTAX_UID).unwrap(),
        "1.2.840.10008.1.2"
    );
}

#[test]
fn implicit_transfer_syntax_switches_the_body_decoding() {
    let mut bytes = prologue();
    bytes.extend_from_slice(&meta_group(&[element_short(
        TAG_TRANSFER_SYNTAX_UID,
        "UI",
        b"1.2.840.10008.1.2\0",
    )]));
    // body in implicit VR little endian
    bytes.extend_from_slice(&[0x10, 0x00, 0x10, 0x00, 0x0C, 0x00, 0x00, 0x00]);
    bytes.extend_from_slice(b"DOE^JOHN\0\0\0\0");
    bytes.extend_from_slice(&[0x28, 0x00, 0x10, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x02]);
    let file = write_temp(&bytes);

    let ds = Parser::new().parse_file(file.path()).unwrap();
    assert_eq!(ds.len(), 4);
    assert_eq!(ds.get_string(TAG_PATIENT_NAME).unwrap(), "DOE^JOHN");
    let rows = ds.get(TAG_ROWS).unwrap();
    assert_eq!(rows.vr(), VR::US);
    assert_eq!(rows.value().uint16().unwrap(), 512);
}

#[test]
fn explicit_file_with_sequence_dump() {
    let mut bytes = prologue();
    bytes.extend_from_slice(&meta_group(&[element_short(
        TAG_TRANSFER_SYNTAX_UID,
        "UI",
        b"1.2.840.10008.1.2.1\0",
    )]));
    bytes.extend_from_slice(&element_short(TAG_SPECIFIC_CHARACTER_SET, "CS", b"ISO_IR 100"));
    // (0008,1140) SQ with one undefined-length item holding a PN
    bytes.extend_from_slice(&[0x08, 0x00, 0x40, 0x11, b'S', b'Q', 0x00, 0x00]);
    bytes.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
    bytes.extend_from_slice(&[0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF]);
    bytes.extend_from_slice(&element_short(TAG_PATIENT_NAME, "PN", b"DOE^JANE\0\0\0\0"));
    bytes.extend_from_slice(&[0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00]);
    bytes.extend_from_slice(&[0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00]);
    let file = write_temp(&bytes);

    let ds = Parser::new().parse_file(file.path()).unwrap();
    let sq = ds.get(Tag(0x0008, 0x1140)).unwrap();
    assert!(sq.length().is_undefined());
    let items = sq.value().items().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].get_string(TAG_PATIENT_NAME).unwrap(), "DOE^JANE");

    let dump = ds.to_string();
    let lines: Vec<&str> = dump.lines().collect();
    assert!(lines
        .iter()
        .any(|l| l.starts_with("(0008,1140) SQ #-1 [1 item]")));
    assert!(lines.iter().any(|l| l.starts_with(">(0010,0010) PN")));
}

#[test]
fn parse_file_until_extracts_a_header_prefix() {
    let mut bytes = prologue();
    bytes.extend_from_slice(&meta_group(&[element_short(
        TAG_TRANSFER_SYNTAX_UID,
        "UI",
        b"1.2.840.10008.1.2.1\0",
    )]));
    bytes.extend_from_slice(&element_short(TAG_SPECIFIC_CHARACTER_SET, "CS", b"ISO_IR 100"));
    bytes.extend_from_slice(&element_short(TAG_STUDY_DATE, "DA", b"20230102"));
    bytes.extend_from_slice(&element_short(TAG_PATIENT_NAME, "PN", b"DOE^JOHN\0\0\0\0"));
    bytes.extend_from_slice(&element_short(TAG_PATIENT_ID, "LO", b"ABC123"));
    let file = write_temp(&bytes);

    let ds = Parser::new()
        .parse_file_until(file.path(), TAG_PATIENT_NAME)
        .unwrap();
    // the meta group plus the first three data set elements
    assert_eq!(ds.len(), 5);
    assert!(ds.get(TAG_SPECIFIC_CHARACTER_SET).is_ok());
    assert!(ds.get(TAG_STUDY_DATE).is_ok());
    assert!(ds.get(TAG_PATIENT_NAME).is_ok());
    assert!(ds.get(TAG_PATIENT_ID).is_err());
}

#[test]
fn bad_magic_is_rejected_at_offset_128() {
    let mut bytes = vec![0u8; 128];
    bytes.extend_from_slice(b"DCMX");
    let file = write_temp(&bytes);

    let err = Parser::new().parse_file(file.path()).unwrap_err();
    match err {
        Error::BadMagic { position, magic } => {
            assert_eq!(position, 128);
            assert_eq!(&magic, b"DCMX");
        }
        e => panic!("expected a bad magic error, got {:?}", e),
    }
}

#[test]
fn truncated_prologue_is_a_fault() {
    let file = write_temp(&[0u8; 40]);
    let err = Parser::new().parse_file(file.path()).unwrap_err();
    assert!(matches!(err, Error::UnexpectedEof { .. }));
}

#[test]
fn zero_length_value_in_a_file() {
    let mut bytes = prologue();
    bytes.extend_from_slice(&meta_group(&[]));
    bytes.extend_from_slice(&element_short(TAG_PATIENT_NAME, "PN", b""));
    let file = write_temp(&bytes);

    let ds = Parser::new().parse_file(file.path()).unwrap();
    assert_eq!(ds.get_string(TAG_PATIENT_NAME).unwrap(), "");
    assert_eq!(
        ds.get(TAG_PATIENT_NAME).unwrap().value(),
        &Value::Str(String::new())
    );
}
