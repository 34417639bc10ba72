//! This crate decodes DICOM data set streams and Part 10 files into the
//! in-memory tree defined by `dcmio-core`.
//!
//! The entry points live on [`Parser`]: raw streams are decoded with an
//! externally supplied explicitness, files go through the full prologue,
//! file meta group and transfer syntax switch. The supported transfer
//! syntaxes are Explicit VR Little Endian and Implicit VR Little Endian;
//! compressed and big endian syntaxes are out of scope, as is
//! encapsulated pixel data.
//!
//! ## Example
//!
//! ```no_run
//! use dcmio_parser::Parser;
//! use dcmio_core::Tag;
//!
//! # fn main() -> dcmio_parser::Result<()> {
//! let parser = Parser::new();
//! let ds = parser.parse_file("image.dcm")?;
//! if let Ok(name) = ds.get_string(Tag(0x0010, 0x0010)) {
//!     println!("patient: {}", name);
//! }
//! println!("{}", ds);
//! # Ok(())
//! # }
//! ```

pub mod error;
mod parser;
mod read;

pub use crate::error::{Error, Result};
pub use crate::parser::Parser;
pub use crate::read::DataReader;
