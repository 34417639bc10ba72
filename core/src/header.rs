//! Basic types for interpreting DICOM data elements: the attribute tag,
//! the value representation, the value length and the data element itself.

use crate::dictionary;
use crate::value::Value;
use snafu::Snafu;
use std::fmt;
use std::str::{from_utf8, FromStr};

/// Idiomatic alias for a tag's group number.
pub type GroupNumber = u16;
/// Idiomatic alias for a tag's element number.
pub type ElementNumber = u16;

/// A DICOM data element tag, a `(group, element)` pair of 16-bit words.
///
/// Ordering and hashing are equivalent to those of the packed 32-bit form
/// with the group in the high half, which is also the order in which a data
/// set iterates its elements.
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy)]
pub struct Tag(pub GroupNumber, pub ElementNumber);

impl Tag {
    /// Getter for the tag's group value.
    #[inline]
    pub fn group(self) -> GroupNumber {
        self.0
    }

    /// Getter for the tag's element value.
    #[inline]
    pub fn element(self) -> ElementNumber {
        self.1
    }

    /// Check whether this is the item start marker (FFFE,E000).
    #[inline]
    pub fn is_item(self) -> bool {
        self == Tag(0xFFFE, 0xE000)
    }

    /// Check whether this is the item delimiter marker (FFFE,E00D).
    #[inline]
    pub fn is_item_delimiter(self) -> bool {
        self == Tag(0xFFFE, 0xE00D)
    }

    /// Check whether this is the sequence delimiter marker (FFFE,E0DD).
    #[inline]
    pub fn is_sequence_delimiter(self) -> bool {
        self == Tag(0xFFFE, 0xE0DD)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag({:#06X?}, {:#06X?})", self.0, self.1)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:04X},{:04X})", self.0, self.1)
    }
}

impl PartialEq<(u16, u16)> for Tag {
    fn eq(&self, other: &(u16, u16)) -> bool {
        self.0 == other.0 && self.1 == other.1
    }
}

impl From<(u16, u16)> for Tag {
    #[inline]
    fn from(value: (u16, u16)) -> Tag {
        Tag(value.0, value.1)
    }
}

impl From<[u16; 2]> for Tag {
    #[inline]
    fn from(value: [u16; 2]) -> Tag {
        Tag(value[0], value[1])
    }
}

impl From<u32> for Tag {
    #[inline]
    fn from(value: u32) -> Tag {
        Tag((value >> 16) as u16, value as u16)
    }
}

impl From<Tag> for u32 {
    #[inline]
    fn from(tag: Tag) -> u32 {
        (u32::from(tag.0) << 16) | u32::from(tag.1)
    }
}

/// A data element value length, in bytes.
///
/// The value `0xFFFF_FFFF` is reserved on the wire for an undefined
/// (delimited) length, which in this library is only admitted for
/// sequence elements.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Length(pub u32);

const UNDEFINED_LEN: u32 = 0xFFFF_FFFF;

impl Length {
    /// A length that is undefined.
    pub const UNDEFINED: Self = Length(UNDEFINED_LEN);

    /// Create a new length value from its wire representation.
    #[inline]
    pub fn new(len: u32) -> Self {
        Length(len)
    }

    /// Check whether this length is undefined (delimited).
    #[inline]
    pub fn is_undefined(self) -> bool {
        self.0 == UNDEFINED_LEN
    }

    /// Check whether this length is well defined.
    #[inline]
    pub fn is_defined(self) -> bool {
        !self.is_undefined()
    }

    /// Fetch the concrete length value, if defined.
    #[inline]
    pub fn get(self) -> Option<u32> {
        match self.0 {
            UNDEFINED_LEN => None,
            v => Some(v),
        }
    }
}

impl From<u32> for Length {
    #[inline]
    fn from(o: u32) -> Self {
        Length(o)
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            UNDEFINED_LEN => f.write_str("-1"),
            l => write!(f, "{}", l),
        }
    }
}

/// An enum type for a DICOM value representation.
///
/// Besides the codes defined by the standard, this type admits the legacy
/// data dictionary aliases `xs` (US or SS), `ox` and `px` (OB or OW), which
/// never appear on the wire but may be produced by a tag dictionary lookup
/// in the implicit VR transfer syntax.
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Ord, PartialOrd)]
pub enum VR {
    /// Application Entity
    AE,
    /// Age String
    AS,
    /// Attribute Tag
    AT,
    /// Code String
    CS,
    /// Date
    DA,
    /// Decimal String
    DS,
    /// Date Time
    DT,
    /// Floating Point Single
    FL,
    /// Floating Point Double
    FD,
    /// Integer String
    IS,
    /// Long String
    LO,
    /// Long Text
    LT,
    /// Other Byte
    OB,
    /// Other Double
    OD,
    /// Other Float
    OF,
    /// Other Long
    OL,
    /// Other Very Long
    OV,
    /// Other Word
    OW,
    /// Person Name
    PN,
    /// Short String
    SH,
    /// Signed Long
    SL,
    /// Sequence of Items
    SQ,
    /// Signed Short
    SS,
    /// Short Text
    ST,
    /// Signed Very Long
    SV,
    /// Time
    TM,
    /// Unlimited Characters
    UC,
    /// Unique Identifier (UID)
    UI,
    /// Unsigned Long
    UL,
    /// Unknown
    UN,
    /// Universal Resource Identifier or Universal Resource Locator
    UR,
    /// Unsigned Short
    US,
    /// Unlimited Text
    UT,
    /// Unsigned Very Long
    UV,
    /// Either US or SS (legacy data dictionary alias "xs")
    XS,
    /// Either OB or OW (legacy data dictionary alias "ox")
    OX,
    /// Either OB or OW, pixel data flavour (legacy data dictionary alias "px")
    PX,
}

impl VR {
    /// Obtain the value representation corresponding to the given two bytes.
    /// Each byte should represent an alphabetic character in upper case.
    pub fn from_binary(chars: [u8; 2]) -> Option<Self> {
        from_utf8(chars.as_ref())
            .ok()
            .and_then(|s| VR::from_str(s).ok())
    }

    /// Retrieve a string representation of this VR.
    pub fn to_str(self) -> &'static str {
        use VR::*;
        match self {
            AE => "AE",
            AS => "AS",
            AT => "AT",
            CS => "CS",
            DA => "DA",
            DS => "DS",
            DT => "DT",
            FL => "FL",
            FD => "FD",
            IS => "IS",
            LO => "LO",
            LT => "LT",
            OB => "OB",
            OD => "OD",
            OF => "OF",
            OL => "OL",
            OV => "OV",
            OW => "OW",
            PN => "PN",
            SH => "SH",
            SL => "SL",
            SQ => "SQ",
            SS => "SS",
            ST => "ST",
            SV => "SV",
            TM => "TM",
            UC => "UC",
            UI => "UI",
            UL => "UL",
            UN => "UN",
            UR => "UR",
            US => "US",
            UT => "UT",
            UV => "UV",
            XS => "xs",
            OX => "ox",
            PX => "px",
        }
    }

    /// Whether values of this representation carry a text payload.
    ///
    /// This is the classifier consulted by
    /// [`Dataset::put_string`](crate::dataset::Dataset::put_string):
    /// only these representations admit a string value.
    pub fn is_text(self) -> bool {
        use VR::*;
        matches!(
            self,
            AE | AS | CS | DA | DS | DT | IS | LO | LT | PN | SH | ST | TM | UC | UI | UR | UT
        )
    }
}

/// Obtain the value representation corresponding to the given string.
/// The string should hold exactly two UTF-8 encoded alphabetic characters,
/// otherwise no match is made.
impl FromStr for VR {
    type Err = &'static str;

    fn from_str(string: &str) -> std::result::Result<Self, Self::Err> {
        use VR::*;
        match string {
            "AE" => Ok(AE),
            "AS" => Ok(AS),
            "AT" => Ok(AT),
            "CS" => Ok(CS),
            "DA" => Ok(DA),
            "DS" => Ok(DS),
            "DT" => Ok(DT),
            "FL" => Ok(FL),
            "FD" => Ok(FD),
            "IS" => Ok(IS),
            "LO" => Ok(LO),
            "LT" => Ok(LT),
            "OB" => Ok(OB),
            "OD" => Ok(OD),
            "OF" => Ok(OF),
            "OL" => Ok(OL),
            "OV" => Ok(OV),
            "OW" => Ok(OW),
            "PN" => Ok(PN),
            "SH" => Ok(SH),
            "SL" => Ok(SL),
            "SQ" => Ok(SQ),
            "SS" => Ok(SS),
            "ST" => Ok(ST),
            "SV" => Ok(SV),
            "TM" => Ok(TM),
            "UC" => Ok(UC),
            "UI" => Ok(UI),
            "UL" => Ok(UL),
            "UN" => Ok(UN),
            "UR" => Ok(UR),
            "US" => Ok(US),
            "UT" => Ok(UT),
            "UV" => Ok(UV),
            "xs" => Ok(XS),
            "ox" => Ok(OX),
            "px" => Ok(PX),
            _ => Err("no such value representation"),
        }
    }
}

impl fmt::Display for VR {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// A data structure for a data element header, containing
/// a tag, value representation and specified length.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct DataElementHeader {
    /// DICOM tag
    pub tag: Tag,
    /// Value Representation
    pub vr: VR,
    /// Element length
    pub len: Length,
}

impl DataElementHeader {
    /// Create a new data element header with the given properties.
    #[inline]
    pub fn new<T: Into<Tag>>(tag: T, vr: VR, len: Length) -> DataElementHeader {
        DataElementHeader {
            tag: tag.into(),
            vr,
            len,
        }
    }
}

/// A data type that represents and owns a DICOM data element:
/// a header plus a value, which may itself hold nested data sets.
#[derive(Debug, PartialEq, Clone)]
pub struct DataElement {
    header: DataElementHeader,
    value: Value,
}

impl DataElement {
    /// Create a data element from the given parts, where the length is
    /// inferred from the value's byte length.
    pub fn new<T: Into<Tag>>(tag: T, vr: VR, value: Value) -> Self {
        let len = value.byte_len();
        DataElement {
            header: DataElementHeader::new(tag, vr, len),
            value,
        }
    }

    /// Create a data element from the given parts.
    ///
    /// This method will not check whether the length accurately represents
    /// the given value's byte length.
    pub fn new_with_len<T: Into<Tag>>(tag: T, vr: VR, len: Length, value: Value) -> Self {
        DataElement {
            header: DataElementHeader::new(tag, vr, len),
            value,
        }
    }

    /// Create an empty data element.
    pub fn empty<T: Into<Tag>>(tag: T, vr: VR) -> Self {
        DataElement {
            header: DataElementHeader::new(tag, vr, Length(0)),
            value: Value::Empty,
        }
    }

    /// Create the synthetic element which stands for a sequence framing
    /// marker (item, item delimiter or sequence delimiter) in the stream.
    pub fn marker(tag: Tag) -> Self {
        DataElement {
            header: DataElementHeader::new(tag, VR::UN, Length::UNDEFINED),
            value: Value::Empty,
        }
    }

    /// Retrieve the element header.
    #[inline]
    pub fn header(&self) -> &DataElementHeader {
        &self.header
    }

    /// Retrieve the element's tag.
    #[inline]
    pub fn tag(&self) -> Tag {
        self.header.tag
    }

    /// Retrieve the element's value representation.
    #[inline]
    pub fn vr(&self) -> VR {
        self.header.vr
    }

    /// Retrieve the element's value length as specified by its header.
    #[inline]
    pub fn length(&self) -> Length {
        self.header.len
    }

    /// Retrieve the data value.
    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Move the data value out of the element, discarding the header.
    pub fn into_value(self) -> Value {
        self.value
    }
}

/// Maximum number of characters in a data element value preview.
const PREVIEW_LIMIT: usize = 64;

/// The one-line textual rendering used by the data set dump:
/// `(GGGG,EEEE) VR #length [value-preview] CanonicalName`.
///
/// Multi-valued payloads are joined with `\` and the preview is capped at
/// 64 characters. Sequence elements show their item count in place of a
/// preview and render their length as `-1`.
impl fmt::Display for DataElement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let tag = self.tag();
        if let Value::Sequence(items) = self.value() {
            let noun = if items.len() == 1 { "item" } else { "items" };
            return write!(
                f,
                "{} {} #-1 [{} {}] {}",
                tag,
                self.vr(),
                items.len(),
                noun,
                dictionary::name_of(tag)
            );
        }
        write!(
            f,
            "{} {} #{} [{}] {}",
            tag,
            self.vr(),
            self.length(),
            self.value().preview(PREVIEW_LIMIT),
            dictionary::name_of(tag)
        )
    }
}

/// Error raised when a tag/length pair does not describe a sequence item,
/// an item delimiter or a sequence delimiter.
#[derive(Debug, Snafu)]
#[snafu(display("unexpected sequence item tag {}", tag))]
pub struct UnexpectedItemTag {
    /// the offending tag
    pub tag: Tag,
}

/// Data type for describing the header of one step of sequence framing,
/// which on the wire is always encoded as implicit VR little endian
/// regardless of the data set's transfer syntax.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SequenceItemHeader {
    /// The start of a new item, with its specified length
    /// (`Length::UNDEFINED` when the item is delimited).
    Item {
        /// the length of the item in bytes
        len: Length,
    },
    /// An item delimiter; the current item's data set ends here.
    ItemDelimiter,
    /// A sequence delimiter; the sequence ends here.
    SequenceDelimiter,
}

impl SequenceItemHeader {
    /// Interpret a decoded tag and length as a sequence item header.
    pub fn new<T: Into<Tag>>(
        tag: T,
        len: Length,
    ) -> std::result::Result<SequenceItemHeader, UnexpectedItemTag> {
        match tag.into() {
            Tag(0xFFFE, 0xE000) => Ok(SequenceItemHeader::Item { len }),
            Tag(0xFFFE, 0xE00D) => Ok(SequenceItemHeader::ItemDelimiter),
            Tag(0xFFFE, 0xE0DD) => Ok(SequenceItemHeader::SequenceDelimiter),
            tag => UnexpectedItemTagSnafu { tag }.fail(),
        }
    }

    /// Retrieve the tag that produced this header.
    pub fn tag(&self) -> Tag {
        match self {
            SequenceItemHeader::Item { .. } => Tag(0xFFFE, 0xE000),
            SequenceItemHeader::ItemDelimiter => Tag(0xFFFE, 0xE00D),
            SequenceItemHeader::SequenceDelimiter => Tag(0xFFFE, 0xE0DD),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::C;
    use smallvec::smallvec;

    #[test]
    fn tag_from_u16_pair() {
        let t = Tag::from((0x0010u16, 0x0020u16));
        assert_eq!(0x0010u16, t.group());
        assert_eq!(0x0020u16, t.element());
    }

    #[test]
    fn tag_u32_roundtrip() {
        let t = Tag::from(0x0008_0005_u32);
        assert_eq!(t, Tag(0x0008, 0x0005));
        assert_eq!(u32::from(t), 0x0008_0005);
    }

    #[test]
    fn tag_order_matches_packed_form() {
        let mut tags = vec![Tag(0x0010, 0x0010), Tag(0x0008, 0x103E), Tag(0x0008, 0x0005)];
        tags.sort();
        assert_eq!(
            tags,
            vec![Tag(0x0008, 0x0005), Tag(0x0008, 0x103E), Tag(0x0010, 0x0010)]
        );
    }

    #[test]
    fn marker_predicates() {
        assert!(Tag(0xFFFE, 0xE000).is_item());
        assert!(Tag(0xFFFE, 0xE00D).is_item_delimiter());
        assert!(Tag(0xFFFE, 0xE0DD).is_sequence_delimiter());
        assert!(!Tag(0x0008, 0x0005).is_item());
    }

    #[test]
    fn length_display() {
        assert_eq!(Length(10).to_string(), "10");
        assert_eq!(Length::UNDEFINED.to_string(), "-1");
        assert!(Length::UNDEFINED.is_undefined());
        assert_eq!(Length(12).get(), Some(12));
        assert_eq!(Length::UNDEFINED.get(), None);
    }

    #[test]
    fn vr_from_binary() {
        assert_eq!(VR::from_binary([b'C', b'S']), Some(VR::CS));
        assert_eq!(VR::from_binary([b'S', b'Q']), Some(VR::SQ));
        assert_eq!(VR::from_binary([0x00, 0x43]), None);
    }

    #[test]
    fn vr_text_classifier() {
        assert!(VR::PN.is_text());
        assert!(VR::UI.is_text());
        assert!(VR::UT.is_text());
        assert!(!VR::US.is_text());
        assert!(!VR::SQ.is_text());
        assert!(!VR::OB.is_text());
    }

    #[test]
    fn element_display_text() {
        let e = DataElement::new_with_len(
            Tag(0x0008, 0x0005),
            VR::CS,
            Length(10),
            Value::text("ISO_IR 100"),
        );
        assert_eq!(
            e.to_string(),
            "(0008,0005) CS #10 [ISO_IR 100] SpecificCharacterSet"
        );
    }

    #[test]
    fn element_display_multi_valued() {
        let data: C<u16> = smallvec![256, 0, 16];
        let e = DataElement::new(Tag(0x0028, 0x0010), VR::US, Value::U16(data));
        assert_eq!(e.to_string(), "(0028,0010) US #6 [256\\0\\16] Rows");
    }

    #[test]
    fn element_display_truncates_long_preview() {
        let text = "X".repeat(100);
        let e = DataElement::new(Tag(0x0010, 0x0010), VR::PN, Value::text(text));
        let line = e.to_string();
        let preview = line.split('[').nth(1).unwrap().split(']').next().unwrap();
        assert_eq!(preview.chars().count(), 64);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn element_display_sequence() {
        use crate::dataset::Dataset;
        let e = DataElement::new_with_len(
            Tag(0x0008, 0x1140),
            VR::SQ,
            Length::UNDEFINED,
            Value::Sequence(vec![Dataset::new(), Dataset::new()]),
        );
        assert_eq!(
            e.to_string(),
            "(0008,1140) SQ #-1 [2 items] ReferencedImageSequence"
        );

        let single = DataElement::new_with_len(
            Tag(0x0008, 0x1140),
            VR::SQ,
            Length::UNDEFINED,
            Value::Sequence(vec![Dataset::new()]),
        );
        assert!(single.to_string().contains("#-1 [1 item]"));
    }

    #[test]
    fn sequence_item_header_from_markers() {
        assert_eq!(
            SequenceItemHeader::new(Tag(0xFFFE, 0xE000), Length(24)).unwrap(),
            SequenceItemHeader::Item { len: Length(24) }
        );
        assert_eq!(
            SequenceItemHeader::new(Tag(0xFFFE, 0xE00D), Length(0)).unwrap(),
            SequenceItemHeader::ItemDelimiter
        );
        assert_eq!(
            SequenceItemHeader::new(Tag(0xFFFE, 0xE0DD), Length(0)).unwrap(),
            SequenceItemHeader::SequenceDelimiter
        );
        assert!(SequenceItemHeader::new(Tag(0x0008, 0x0005), Length(0)).is_err());
    }
}
