//! Attribute and UID dictionaries.
//!
//! The tag dictionary maps an attribute tag to its canonical name and its
//! default value representation, which is what the parser consults when a
//! stream is encoded in the implicit VR transfer syntax. Unknown tags
//! resolve to `"UNKNOWN"` / [`VR::UN`]. The UID dictionary maps the unique
//! identifiers of transfer syntaxes and SOP classes to their human names.

pub mod entries;
pub mod uids;

use crate::header::{Tag, VR};
use self::entries::ENTRIES;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// An entry of the attribute dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DictionaryEntry {
    /// the attribute tag
    pub tag: Tag,
    /// the canonical keyword of the attribute
    pub alias: &'static str,
    /// the attribute's default value representation
    pub vr: VR,
}

static REGISTRY: Lazy<HashMap<Tag, &'static DictionaryEntry>> =
    Lazy::new(|| ENTRIES.iter().map(|e| (e.tag, e)).collect());

/// Retrieve the dictionary entry for the given tag.
pub fn entry(tag: Tag) -> Option<&'static DictionaryEntry> {
    REGISTRY.get(&tag).copied()
}

/// Retrieve the canonical name of the given tag,
/// or `"UNKNOWN"` if the tag is not in the dictionary.
pub fn name_of(tag: Tag) -> &'static str {
    entry(tag).map(|e| e.alias).unwrap_or("UNKNOWN")
}

/// Retrieve the default value representation of the given tag,
/// or [`VR::UN`] if the tag is not in the dictionary.
pub fn vr_of(tag: Tag) -> VR {
    entry(tag).map(|e| e.vr).unwrap_or(VR::UN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_resolve() {
        assert_eq!(name_of(Tag(0x0010, 0x0010)), "PatientName");
        assert_eq!(vr_of(Tag(0x0010, 0x0010)), VR::PN);
        assert_eq!(name_of(Tag(0x0002, 0x0010)), "TransferSyntaxUID");
        assert_eq!(vr_of(Tag(0x0008, 0x0020)), VR::DA);
    }

    #[test]
    fn legacy_alias_vrs() {
        assert_eq!(vr_of(Tag(0x0028, 0x0106)), VR::XS);
        assert_eq!(vr_of(Tag(0x7FE0, 0x0010)), VR::PX);
    }

    #[test]
    fn unknown_tags_fall_back() {
        assert_eq!(name_of(Tag(0x4321, 0x1234)), "UNKNOWN");
        assert_eq!(vr_of(Tag(0x4321, 0x1234)), VR::UN);
        assert!(entry(Tag(0x4321, 0x1234)).is_none());
    }
}
