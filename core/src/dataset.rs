//! An in-memory DICOM data set: a mapping from attribute tags to data
//! elements with canonical ascending-tag iteration and the classic
//! recursive dump rendering.

use crate::header::{DataElement, Length, Tag, VR};
use crate::value::Value;
use snafu::{ensure, Snafu};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

/// An error raised by the data set accessors.
#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AccessError {
    /// The requested element is not in the data set.
    #[snafu(display("no such element {}", tag))]
    NotFound {
        /// the requested tag
        tag: Tag,
    },
    /// The element exists but cannot take or yield the requested form.
    #[snafu(display("element {} is not convertible to the requested form", tag))]
    NotConvertible {
        /// the offending tag
        tag: Tag,
    },
}

type Result<T, E = AccessError> = std::result::Result<T, E>;

/// A DICOM data set: data elements keyed and ordered by tag.
///
/// Iteration always yields elements in ascending tag order, with the tag
/// compared as its packed 32-bit form; insertion order is irrelevant.
/// A data set is owned either by its caller (top level) or by the
/// [`Value::Sequence`] variant that contains it (nested items), so the
/// data sets of a parsed stream form a tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    entries: BTreeMap<Tag, DataElement>,
}

impl Dataset {
    /// Create a new empty data set.
    pub fn new() -> Dataset {
        Dataset {
            entries: BTreeMap::new(),
        }
    }

    /// Insert a data element into the data set, replacing (and returning)
    /// any element with the same tag.
    pub fn put(&mut self, elem: DataElement) -> Option<DataElement> {
        self.entries.insert(elem.tag(), elem)
    }

    /// Retrieve the element with the given tag.
    pub fn get<T: Into<Tag>>(&self, tag: T) -> Result<&DataElement> {
        let tag = tag.into();
        self.entries.get(&tag).ok_or(AccessError::NotFound { tag })
    }

    /// Retrieve the text value of the element with the given tag, trimmed
    /// of surrounding whitespace and NUL padding.
    ///
    /// Returns [`AccessError::NotConvertible`] if the element's value is
    /// not textual.
    pub fn get_string<T: Into<Tag>>(&self, tag: T) -> Result<&str> {
        let tag = tag.into();
        let elem = self.get(tag)?;
        elem.value()
            .string()
            .map_err(|_| AccessError::NotConvertible { tag })
    }

    /// Insert a text element with the given tag and VR.
    ///
    /// Only representations classified as text by [`VR::is_text`] are
    /// admitted; the recorded length is the byte count of `text` before
    /// NUL stripping.
    pub fn put_string<T: Into<Tag>>(&mut self, tag: T, vr: VR, text: &str) -> Result<()> {
        let tag = tag.into();
        ensure!(vr.is_text(), NotConvertibleSnafu { tag });
        let len = Length(text.len() as u32);
        self.put(DataElement::new_with_len(tag, vr, len, Value::text(text)));
        Ok(())
    }

    /// Retrieve the number of elements in this data set.
    /// Elements inside nested sequence items are not counted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the data set holds no elements.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the elements in ascending tag order.
    pub fn iter(&self) -> Iter {
        Iter {
            inner: self.entries.values(),
        }
    }

    /// Write the dump of this data set into `out`, one line per element,
    /// descending into sequence items with a `>` indent per level.
    fn dump_into(&self, out: &mut String, indent: &str) {
        for elem in self {
            out.push_str(indent);
            out.push_str(&elem.to_string());
            out.push('\n');
            if let Value::Sequence(items) = elem.value() {
                let nested = format!(">{}", indent);
                for item in items {
                    item.dump_into(out, &nested);
                }
            }
        }
    }
}

/// An iterator over the data elements of a data set, in ascending tag
/// order.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    inner: btree_map::Values<'a, Tag, DataElement>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a DataElement;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a DataElement;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The classic DICOM dump tree view: the element lines of this data set,
/// with each nested sequence item indented by one additional `>`.
impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut out = String::with_capacity(self.len() * 128);
        self.dump_into(&mut out, "");
        f.write_str(out.trim_end_matches('\n'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::C;
    use smallvec::smallvec;

    fn sample() -> Dataset {
        let mut ds = Dataset::new();
        ds.put(DataElement::new(
            Tag(0x0010, 0x0010),
            VR::PN,
            Value::text("DOE^JOHN"),
        ));
        ds.put(DataElement::new(
            Tag(0x0008, 0x0060),
            VR::CS,
            Value::text("MR"),
        ));
        let rows: C<u16> = smallvec![512];
        ds.put(DataElement::new(Tag(0x0028, 0x0010), VR::US, Value::U16(rows)));
        ds
    }

    #[test]
    fn get_and_get_string() {
        let ds = sample();
        let elem = ds.get(Tag(0x0008, 0x0060)).unwrap();
        assert_eq!(elem.vr(), VR::CS);
        assert_eq!(ds.get_string(Tag(0x0010, 0x0010)).unwrap(), "DOE^JOHN");

        assert_eq!(
            ds.get(Tag(0x0008, 0x0070)),
            Err(AccessError::NotFound {
                tag: Tag(0x0008, 0x0070)
            })
        );
        assert_eq!(
            ds.get_string(Tag(0x0028, 0x0010)),
            Err(AccessError::NotConvertible {
                tag: Tag(0x0028, 0x0010)
            })
        );
    }

    #[test]
    fn put_replaces_same_tag() {
        let mut ds = sample();
        let old = ds.put(DataElement::new(
            Tag(0x0008, 0x0060),
            VR::CS,
            Value::text("CT"),
        ));
        assert!(old.is_some());
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.get_string(Tag(0x0008, 0x0060)).unwrap(), "CT");
    }

    #[test]
    fn put_string_checks_the_vr() {
        let mut ds = Dataset::new();
        ds.put_string(Tag(0x0010, 0x0020), VR::LO, "ABC123").unwrap();
        assert_eq!(ds.get_string(Tag(0x0010, 0x0020)).unwrap(), "ABC123");

        let err = ds
            .put_string(Tag(0x0028, 0x0010), VR::US, "512")
            .unwrap_err();
        assert_eq!(
            err,
            AccessError::NotConvertible {
                tag: Tag(0x0028, 0x0010)
            }
        );
    }

    #[test]
    fn put_string_length_counts_padding() {
        let mut ds = Dataset::new();
        ds.put_string(Tag(0x0002, 0x0010), VR::UI, "1.2.840.10008.1.2\0")
            .unwrap();
        let elem = ds.get(Tag(0x0002, 0x0010)).unwrap();
        assert_eq!(elem.length(), Length(18));
        assert_eq!(elem.value().string().unwrap(), "1.2.840.10008.1.2");
    }

    #[test]
    fn iteration_is_sorted_by_tag() {
        let ds = sample();
        let tags: Vec<Tag> = ds.iter().map(|e| e.tag()).collect();
        assert_eq!(
            tags,
            vec![Tag(0x0008, 0x0060), Tag(0x0010, 0x0010), Tag(0x0028, 0x0010)]
        );
    }

    #[test]
    fn dump_renders_nested_items_indented() {
        let mut inner = Dataset::new();
        inner.put(DataElement::new(
            Tag(0x0010, 0x0010),
            VR::PN,
            Value::text("DOE^JANE"),
        ));
        let mut ds = Dataset::new();
        ds.put(DataElement::new_with_len(
            Tag(0x0008, 0x1140),
            VR::SQ,
            Length::UNDEFINED,
            Value::Sequence(vec![inner]),
        ));
        ds.put(DataElement::new(
            Tag(0x0008, 0x0060),
            VR::CS,
            Value::text("CT"),
        ));

        let dump = ds.to_string();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("(0008,0060) CS"));
        assert!(lines[1].starts_with("(0008,1140) SQ #-1 [1 item]"));
        assert!(lines[2].starts_with(">(0010,0010) PN"));
        assert!(!dump.ends_with('\n'));
    }
}
