//! This crate contains the DICOM data model of the `dcmio` library.
//!
//! It comprises the basic building blocks for decoded DICOM content:
//! attribute tags, value representations, lengths, data element values,
//! data elements and the tag-ordered data set, plus the attribute and UID
//! dictionaries consumed by the parser and the dump rendering.
//!
//! ## Example
//!
//! ```
//! use dcmio_core::{DataElement, Dataset, Tag, Value, VR};
//!
//! let mut ds = Dataset::new();
//! ds.put(DataElement::new(
//!     Tag(0x0010, 0x0010),
//!     VR::PN,
//!     Value::text("DOE^JOHN"),
//! ));
//! assert_eq!(ds.get_string(Tag(0x0010, 0x0010)).unwrap(), "DOE^JOHN");
//! ```

pub mod dataset;
pub mod dictionary;
pub mod header;
pub mod value;

pub use crate::dataset::{AccessError, Dataset};
pub use crate::header::{
    DataElement, DataElementHeader, Length, SequenceItemHeader, Tag, VR,
};
pub use crate::value::{CastValueError, Value, ValueType, C};
