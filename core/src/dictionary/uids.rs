//! UID declarations: the transfer syntaxes and SOP classes this library
//! is likely to meet, plus the lookup from a UID value to its human name.

use once_cell::sync::Lazy;
use snafu::Snafu;
use std::collections::HashMap;

/// Transfer Syntax: Implicit VR Little Endian, the default transfer
/// syntax for DICOM. The only syntax that switches the parser to
/// implicit VR decoding.
pub const IMPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2";
/// Transfer Syntax: Explicit VR Little Endian
pub const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";
/// Transfer Syntax: Deflated Explicit VR Little Endian (not decoded)
pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1.99";
/// Transfer Syntax: Explicit VR Big Endian, retired (not decoded)
pub const EXPLICIT_VR_BIG_ENDIAN: &str = "1.2.840.10008.1.2.2";
/// Transfer Syntax: JPEG Baseline (Process 1) (not decoded)
pub const JPEG_BASELINE: &str = "1.2.840.10008.1.2.4.50";
/// Transfer Syntax: JPEG Lossless, Non-Hierarchical, First-Order
/// Prediction (Process 14, Selection Value 1) (not decoded)
pub const JPEG_LOSSLESS_SV1: &str = "1.2.840.10008.1.2.4.70";
/// Transfer Syntax: JPEG 2000 Image Compression (Lossless Only) (not decoded)
pub const JPEG_2000_LOSSLESS: &str = "1.2.840.10008.1.2.4.90";
/// Transfer Syntax: RLE Lossless (not decoded)
pub const RLE_LOSSLESS: &str = "1.2.840.10008.1.2.5";

/// SOP Class: Verification
pub const VERIFICATION: &str = "1.2.840.10008.1.1";
/// SOP Class: Computed Radiography Image Storage
pub const CR_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.1";
/// SOP Class: CT Image Storage
pub const CT_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.2";
/// SOP Class: Ultrasound Image Storage
pub const US_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.6.1";
/// SOP Class: Secondary Capture Image Storage
pub const SECONDARY_CAPTURE_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.7";
/// SOP Class: MR Image Storage
pub const MR_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.4";
/// SOP Class: Positron Emission Tomography Image Storage
pub const PET_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.128";

/// The kind of entity a UID identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UidKind {
    /// A wire encoding of a data set.
    TransferSyntax,
    /// A service-object pair class.
    SopClass,
}

/// An entry of the UID dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UidEntry {
    /// the UID value
    pub uid: &'static str,
    /// the UID's human name
    pub name: &'static str,
    /// what the UID identifies
    pub kind: UidKind,
}

const fn ts(uid: &'static str, name: &'static str) -> UidEntry {
    UidEntry {
        uid,
        name,
        kind: UidKind::TransferSyntax,
    }
}

const fn sop(uid: &'static str, name: &'static str) -> UidEntry {
    UidEntry {
        uid,
        name,
        kind: UidKind::SopClass,
    }
}

/// The entries of the UID dictionary.
#[rustfmt::skip]
pub static ENTRIES: &[UidEntry] = &[
    ts(IMPLICIT_VR_LITTLE_ENDIAN, "Implicit VR Little Endian"),
    ts(EXPLICIT_VR_LITTLE_ENDIAN, "Explicit VR Little Endian"),
    ts(DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN, "Deflated Explicit VR Little Endian"),
    ts(EXPLICIT_VR_BIG_ENDIAN, "Explicit VR Big Endian"),
    ts(JPEG_BASELINE, "JPEG Baseline (Process 1)"),
    ts(JPEG_LOSSLESS_SV1, "JPEG Lossless, Non-Hierarchical, First-Order Prediction"),
    ts(JPEG_2000_LOSSLESS, "JPEG 2000 Image Compression (Lossless Only)"),
    ts(RLE_LOSSLESS, "RLE Lossless"),
    sop(VERIFICATION, "Verification SOP Class"),
    sop(CR_IMAGE_STORAGE, "Computed Radiography Image Storage"),
    sop(CT_IMAGE_STORAGE, "CT Image Storage"),
    sop(MR_IMAGE_STORAGE, "MR Image Storage"),
    sop(US_IMAGE_STORAGE, "Ultrasound Image Storage"),
    sop(SECONDARY_CAPTURE_IMAGE_STORAGE, "Secondary Capture Image Storage"),
    sop(PET_IMAGE_STORAGE, "Positron Emission Tomography Image Storage"),
];

static REGISTRY: Lazy<HashMap<&'static str, &'static UidEntry>> =
    Lazy::new(|| ENTRIES.iter().map(|e| (e.uid, e)).collect());

/// Error raised when a UID is not in the dictionary.
#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[snafu(display("unknown UID {}", uid))]
pub struct UidNotFound {
    /// the unrecognized UID value
    pub uid: String,
}

/// Retrieve the dictionary entry for the given UID value.
pub fn entry(uid: &str) -> Option<&'static UidEntry> {
    REGISTRY.get(uid).copied()
}

/// Retrieve the human name of the given UID value.
pub fn name_of(uid: &str) -> Result<&'static str, UidNotFound> {
    match entry(uid) {
        Some(e) => Ok(e.name),
        None => UidNotFoundSnafu { uid }.fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_syntax_lookup() {
        assert_eq!(
            name_of("1.2.840.10008.1.2").unwrap(),
            "Implicit VR Little Endian"
        );
        let e = entry(EXPLICIT_VR_LITTLE_ENDIAN).unwrap();
        assert_eq!(e.kind, UidKind::TransferSyntax);
    }

    #[test]
    fn unknown_uid_is_an_error() {
        let err = name_of("1.2.3.4").unwrap_err();
        assert_eq!(err.uid, "1.2.3.4");
    }
}
