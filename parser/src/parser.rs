//! The stateful DICOM stream decoder.
//!
//! [`Parser`] turns a byte stream (or a Part 10 file) into a tree of data
//! sets. The file entry points validate the 132-byte prologue, decode the
//! file meta group in explicit VR little endian, then switch the reader
//! to implicit VR if the announced transfer syntax demands it and decode
//! the remainder of the stream. Sequence elements recurse: item framing
//! is always implicit little endian, item bodies follow the data set's
//! transfer syntax.

use crate::error::{
    BadMagicSnafu, Error, InvalidVrSnafu, IoSnafu, MissingGroupLengthSnafu, Result,
    UndefinedLengthSnafu, UnexpectedTagSnafu, UnsupportedVrSnafu,
};
use crate::read::DataReader;
use byteordered::byteorder::{ByteOrder, LittleEndian};
use byteordered::Endianness;
use dcmio_core::dictionary::{self, uids};
use dcmio_core::{DataElement, Dataset, Length, SequenceItemHeader, Tag, Value, VR};
use smallvec::smallvec;
use snafu::{ensure, ResultExt};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const DICM_MAGIC_CODE: [u8; 4] = [b'D', b'I', b'C', b'M'];
const PREAMBLE_LENGTH: usize = 128;

const TAG_META_GROUP_LENGTH: Tag = Tag(0x0002, 0x0000);
const TAG_TRANSFER_SYNTAX_UID: Tag = Tag(0x0002, 0x0010);
/// Group number of the file meta information elements.
const META_GROUP: u16 = 0x0002;

/// A decoder of DICOM data set streams.
///
/// The parser holds no state of its own: each call builds its decoding
/// state on a per-call reader, so one parser may be shared freely between
/// threads and calls never observe each other's transfer syntax switch.
#[derive(Debug, Default, Clone, Copy)]
pub struct Parser;

impl Parser {
    /// Create a new parser.
    pub fn new() -> Self {
        Parser
    }

    /// Decode a raw little-endian data set stream with the given
    /// explicitness until the stream ends.
    ///
    /// No prologue or file meta group is expected; decoding starts at the
    /// first byte. Useful for pre-positioned substreams.
    pub fn parse<R: Read>(&self, source: R, explicit: bool) -> Result<Dataset> {
        let mut reader = DataReader::new(source, Endianness::Little, explicit);
        let mut dataset = Dataset::new();
        parse_all(&mut dataset, &mut reader, None)?;
        Ok(dataset)
    }

    /// Decode a raw little-endian data set stream with the given
    /// explicitness, stopping after the element whose tag is `max_tag`
    /// or right before the first element whose tag exceeds it.
    pub fn parse_until<R: Read>(&self, source: R, explicit: bool, max_tag: Tag) -> Result<Dataset> {
        let mut reader = DataReader::new(source, Endianness::Little, explicit);
        let mut dataset = Dataset::new();
        parse_until(&mut dataset, &mut reader, max_tag)?;
        Ok(dataset)
    }

    /// Decode a complete DICOM Part 10 file.
    ///
    /// Validates the preamble and `DICM` magic, decodes the file meta
    /// group in explicit VR little endian, switches to implicit VR if the
    /// transfer syntax is Implicit VR Little Endian, and decodes the
    /// remainder of the file. The file is closed when this returns.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Dataset> {
        let file = File::open(path).context(IoSnafu { position: 0u64 })?;
        let mut reader = DataReader::new(file, Endianness::Little, true);
        check_preamble(&mut reader)?;
        let mut dataset = Dataset::new();
        parse_file_meta(&mut dataset, &mut reader)?;
        check_transfer_syntax(&dataset, &mut reader);
        parse_all(&mut dataset, &mut reader, None)?;
        Ok(dataset)
    }

    /// Decode a DICOM Part 10 file up to and including the element whose
    /// tag is `max_tag`, or up to the first element whose tag exceeds it.
    ///
    /// The file meta group is always decoded in full; the bound applies
    /// to the main data set. This allows extracting a header prefix
    /// without reading the whole file.
    pub fn parse_file_until<P: AsRef<Path>>(&self, path: P, max_tag: Tag) -> Result<Dataset> {
        let file = File::open(path).context(IoSnafu { position: 0u64 })?;
        let mut reader = DataReader::new(file, Endianness::Little, true);
        check_preamble(&mut reader)?;
        let mut dataset = Dataset::new();
        parse_file_meta(&mut dataset, &mut reader)?;
        check_transfer_syntax(&dataset, &mut reader);
        parse_until(&mut dataset, &mut reader, max_tag)?;
        Ok(dataset)
    }
}

/// Consume the 128-byte preamble (content ignored) and require the
/// `DICM` magic code.
fn check_preamble<R: Read>(reader: &mut DataReader<R>) -> Result<()> {
    let mut preamble = [0u8; PREAMBLE_LENGTH];
    reader
        .read_exact(&mut preamble)
        .map_err(|e| e.into_unexpected(reader.bytes_read()))?;
    let position = reader.bytes_read();
    let mut magic = [0u8; 4];
    reader
        .read_exact(&mut magic)
        .map_err(|e| e.into_unexpected(reader.bytes_read()))?;
    ensure!(magic == DICM_MAGIC_CODE, BadMagicSnafu { magic, position });
    Ok(())
}

/// Decode the file meta group, always in explicit VR little endian.
///
/// The group length element (0002,0000) bounds the loop by a byte budget
/// measured from the end of that element. A meta group without a leading
/// group length is read until the first peeked tag outside group 0x0002,
/// or until the stream ends.
fn parse_file_meta<R: Read>(dataset: &mut Dataset, reader: &mut DataReader<R>) -> Result<()> {
    let mut limit: Option<u64> = None;
    loop {
        match limit {
            Some(end) => {
                if reader.bytes_read() >= end {
                    break;
                }
            }
            None => {
                let group = match reader.peek(4) {
                    Ok(bytes) => LittleEndian::read_u16(&bytes[0..2]),
                    Err(Error::Eof) => break,
                    Err(e) => return Err(e),
                };
                if group != META_GROUP {
                    break;
                }
            }
        }
        let element = read_element(reader)?;
        if element.tag() == TAG_META_GROUP_LENGTH {
            let group_length = element.value().uint32().map_err(|_| {
                MissingGroupLengthSnafu {
                    position: reader.bytes_read(),
                }
                .build()
            })?;
            limit = Some(reader.bytes_read() + u64::from(group_length));
        }
        dataset.put(element);
    }
    Ok(())
}

/// Switch the reader to implicit VR when the data set announces the
/// Implicit VR Little Endian transfer syntax. Any other recognized
/// syntax, and a missing transfer syntax element, keep explicit VR
/// little endian in force.
fn check_transfer_syntax<R: Read>(dataset: &Dataset, reader: &mut DataReader<R>) {
    if let Ok(uid) = dataset.get_string(TAG_TRANSFER_SYNTAX_UID) {
        if uid == uids::IMPLICIT_VR_LITTLE_ENDIAN {
            reader.set_explicit(false);
        }
    }
}

/// Decode elements into `dataset` until the stream ends cleanly, the
/// optional byte budget is exhausted, or an item delimiter marker is
/// read (which ends the data set of an undefined-length sequence item;
/// at the top level it also terminates the parse, a deliberate tolerance
/// of malformed input).
fn parse_all<R: Read>(
    dataset: &mut Dataset,
    reader: &mut DataReader<R>,
    limit: Option<u64>,
) -> Result<()> {
    loop {
        if let Some(end) = limit {
            if reader.bytes_read() >= end {
                break;
            }
        }
        let element = match read_element(reader) {
            Ok(element) => element,
            Err(Error::Eof) => break,
            Err(e) => return Err(e),
        };
        if element.tag().is_item_delimiter() {
            break;
        }
        dataset.put(element);
    }
    Ok(())
}

/// Decode elements into `dataset` until the stream ends, an item
/// delimiter is read, the element with tag `max_tag` has been stored
/// (inclusive), or the next peeked tag exceeds `max_tag` (exclusive).
fn parse_until<R: Read>(
    dataset: &mut Dataset,
    reader: &mut DataReader<R>,
    max_tag: Tag,
) -> Result<()> {
    loop {
        let element = match read_element_peek(reader, max_tag) {
            Ok(element) => element,
            Err(Error::Eof) => break,
            Err(e) => return Err(e),
        };
        if element.tag().is_item_delimiter() {
            break;
        }
        let tag = element.tag();
        dataset.put(element);
        if tag == max_tag {
            break;
        }
    }
    Ok(())
}

/// Decode one data element at the reader's position.
///
/// A clean end of stream before the tag's group word surfaces as
/// [`Error::Eof`]; any truncation past that point is a fault. Sequence
/// framing markers short-circuit into synthetic marker elements after
/// their zero length field is consumed.
fn read_element<R: Read>(reader: &mut DataReader<R>) -> Result<DataElement> {
    let tag = read_tag(reader)?;
    if tag.is_item() || tag.is_item_delimiter() || tag.is_sequence_delimiter() {
        // the marker's length field, always zero
        reader.skip(4)?;
        return Ok(DataElement::marker(tag));
    }
    read_element_body(reader, tag)
}

/// Decode one data element, peeking its tag first: if the peeked tag
/// exceeds `max_tag`, a synthetic [`Error::Eof`] is raised without
/// consuming the element, so the caller stops before it.
fn read_element_peek<R: Read>(reader: &mut DataReader<R>, max_tag: Tag) -> Result<DataElement> {
    let tag = {
        let bytes = reader.peek(4)?;
        Tag(
            LittleEndian::read_u16(&bytes[0..2]),
            LittleEndian::read_u16(&bytes[2..4]),
        )
    };
    if tag > max_tag {
        // pretend the stream ended right before this element
        return Err(Error::Eof);
    }
    if tag.is_item() || tag.is_item_delimiter() || tag.is_sequence_delimiter() {
        // the whole 8-byte marker
        reader.skip(8)?;
        return Ok(DataElement::marker(tag));
    }
    // commit the peeked tag
    reader.skip(4)?;
    read_element_body(reader, tag)
}

fn read_element_body<R: Read>(reader: &mut DataReader<R>, tag: Tag) -> Result<DataElement> {
    let vr = read_vr(reader, tag)?;
    let len = read_vl(reader, vr)?;
    let value = read_value(reader, vr, len)?;
    Ok(DataElement::new_with_len(tag, vr, len, value))
}

/// Read a tag as two little-endian words, regardless of the reader's
/// byte order. End of stream before the group word is a clean EOF; end
/// of stream between the two words is a truncation fault.
fn read_tag<R: Read>(reader: &mut DataReader<R>) -> Result<Tag> {
    let group = reader.read_u16_le()?;
    let element = reader
        .read_u16_le()
        .map_err(|e| e.into_unexpected(reader.bytes_read()))?;
    Ok(Tag(group, element))
}

/// Determine the element's VR: from the stream in explicit mode, from
/// the tag dictionary (default `UN`) in implicit mode.
fn read_vr<R: Read>(reader: &mut DataReader<R>, tag: Tag) -> Result<VR> {
    if !reader.is_explicit() {
        return Ok(dictionary::vr_of(tag));
    }
    let position = reader.bytes_read();
    let mut bytes = [0u8; 2];
    reader
        .read_exact(&mut bytes)
        .map_err(|e| e.into_unexpected(reader.bytes_read()))?;
    match VR::from_binary(bytes) {
        Some(vr) => Ok(vr),
        None => InvalidVrSnafu { bytes, position }.fail(),
    }
}

/// Read the value length. Implicit mode always carries a 32-bit length;
/// explicit mode uses a 16-bit length for the short-form VRs and a
/// 32-bit length preceded by two reserved bytes for the rest.
fn read_vl<R: Read>(reader: &mut DataReader<R>, vr: VR) -> Result<Length> {
    if !reader.is_explicit() {
        let len = reader
            .read_u32()
            .map_err(|e| e.into_unexpected(reader.bytes_read()))?;
        return Ok(Length(len));
    }
    use VR::*;
    match vr {
        AE | AS | AT | CS | DA | DS | DT | FL | FD | IS | LO | LT | PN | SH | SL | SS | ST
        | TM | UI | UL | US => {
            let len = reader
                .read_u16()
                .map_err(|e| e.into_unexpected(reader.bytes_read()))?;
            Ok(Length(u32::from(len)))
        }
        _ => {
            // two reserved bytes, ignored on read
            let _ = reader
                .read_u16()
                .map_err(|e| e.into_unexpected(reader.bytes_read()))?;
            let len = reader
                .read_u32()
                .map_err(|e| e.into_unexpected(reader.bytes_read()))?;
            Ok(Length(len))
        }
    }
}

/// Decode the element's payload, dispatching on the VR and on whether
/// the length is undefined.
fn read_value<R: Read>(reader: &mut DataReader<R>, vr: VR, len: Length) -> Result<Value> {
    use VR::*;
    if len.is_undefined() {
        // undefined lengths are only admitted for sequences;
        // encapsulated pixel data is not supported
        return match vr {
            SQ => read_sequence(reader, len),
            _ => UndefinedLengthSnafu {
                vr,
                position: reader.bytes_read(),
            }
            .fail(),
        };
    }
    let n = len.0;
    if n == 0 {
        return Ok(match vr {
            OB | UN | OX | PX => Value::Bytes(Default::default()),
            AE | AS | CS | DA | DS | DT | IS | LO | LT | PN | SH | ST | TM | UI => {
                Value::Str(String::new())
            }
            SQ => Value::Sequence(Vec::new()),
            _ => Value::Empty,
        });
    }
    match vr {
        AE | AS | CS | DA | DS | DT | IS | LO | LT | PN | SH | ST | TM | UI => {
            reader.read_str(n).map(Value::text)
        }
        UL => {
            let mut data = smallvec![0u32; (n / 4) as usize];
            reader
                .read_u32_into(&mut data)
                .map_err(|e| e.into_unexpected(reader.bytes_read()))?;
            Ok(Value::U32(data))
        }
        // "xs" (from the data dictionary) means US or SS; read as US,
        // it can be converted later if required
        US | XS => {
            let mut data = smallvec![0u16; (n / 2) as usize];
            reader
                .read_u16_into(&mut data)
                .map_err(|e| e.into_unexpected(reader.bytes_read()))?;
            Ok(Value::U16(data))
        }
        SL => {
            let mut data = smallvec![0i32; (n / 4) as usize];
            reader
                .read_i32_into(&mut data)
                .map_err(|e| e.into_unexpected(reader.bytes_read()))?;
            Ok(Value::I32(data))
        }
        SS | OW => {
            let mut data = smallvec![0i16; (n / 2) as usize];
            reader
                .read_i16_into(&mut data)
                .map_err(|e| e.into_unexpected(reader.bytes_read()))?;
            Ok(Value::I16(data))
        }
        FL => {
            let mut data = smallvec![0f32; (n / 4) as usize];
            reader
                .read_f32_into(&mut data)
                .map_err(|e| e.into_unexpected(reader.bytes_read()))?;
            Ok(Value::F32(data))
        }
        FD => {
            let mut data = smallvec![0f64; (n / 8) as usize];
            reader
                .read_f64_into(&mut data)
                .map_err(|e| e.into_unexpected(reader.bytes_read()))?;
            Ok(Value::F64(data))
        }
        // "ox" and "px" (from the data dictionary) mean OB or OW;
        // read as a byte blob, it can be converted later if required
        OB | UN | OX | PX => {
            let mut data = smallvec![0u8; n as usize];
            reader
                .read_exact(&mut data)
                .map_err(|e| e.into_unexpected(reader.bytes_read()))?;
            Ok(Value::Bytes(data))
        }
        SQ => read_sequence(reader, len),
        other => UnsupportedVrSnafu {
            vr: other,
            position: reader.bytes_read(),
        }
        .fail(),
    }
}

/// Decode a sequence of items into nested data sets.
///
/// Item framing is always implicit little endian. An undefined-length
/// sequence runs until its sequence delimiter; a defined-length sequence
/// is bounded by its byte budget. Likewise for the items inside: an
/// undefined-length item body runs until its item delimiter, a
/// defined-length body is bounded by byte count. Item bodies follow the
/// reader's current transfer syntax.
fn read_sequence<R: Read>(reader: &mut DataReader<R>, len: Length) -> Result<Value> {
    let mut items = Vec::new();
    let end = len.get().map(|n| reader.bytes_read() + u64::from(n));
    loop {
        if let Some(end) = end {
            if reader.bytes_read() >= end {
                break;
            }
        }
        let position = reader.bytes_read();
        match read_item_header(reader)? {
            SequenceItemHeader::SequenceDelimiter => break,
            SequenceItemHeader::Item { len } => {
                let limit = len.get().map(|n| reader.bytes_read() + u64::from(n));
                let mut item = Dataset::new();
                parse_all(&mut item, reader, limit)?;
                items.push(item);
            }
            SequenceItemHeader::ItemDelimiter => {
                return UnexpectedTagSnafu {
                    tag: Tag(0xFFFE, 0xE00D),
                    position,
                }
                .fail();
            }
        }
    }
    Ok(Value::Sequence(items))
}

/// Read one item framing header (tag + 32-bit length, both little
/// endian, no VR on the wire).
fn read_item_header<R: Read>(reader: &mut DataReader<R>) -> Result<SequenceItemHeader> {
    let position = reader.bytes_read();
    let tag = read_tag(reader).map_err(|e| e.into_unexpected(reader.bytes_read()))?;
    let len = reader
        .read_u32_le()
        .map_err(|e| e.into_unexpected(reader.bytes_read()))?;
    SequenceItemHeader::new(tag, Length(len))
        .map_err(|_| UnexpectedTagSnafu { tag, position }.build())
}
