//! The error taxonomy of the stream parser.
//!
//! Every fault raised while decoding carries the byte offset at which it
//! was detected. The [`Eof`](Error::Eof) kind is a control signal rather
//! than a fault: it reports a clean end of stream at an element boundary,
//! which the data set loops convert into a normal return.

use dcmio_core::{Tag, VR};
use snafu::Snafu;
use std::io;

/// The error type of the parser and its byte reader.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum Error {
    /// The underlying stream ended at an element boundary.
    /// This is a clean termination signal, not a fault.
    #[snafu(display("end of stream"))]
    Eof,

    /// The underlying stream ended in the middle of an element.
    #[snafu(display(
        "unexpected end of stream near byte {} ({:#010x})",
        position,
        position
    ))]
    UnexpectedEof {
        /// offset at which the truncation was detected
        position: u64,
    },

    /// The file prologue does not carry the `DICM` magic code.
    #[snafu(display("bad magic code {:?} at byte {} ({:#010x})", magic, position, position))]
    BadMagic {
        /// the four bytes found in place of the magic code
        magic: [u8; 4],
        /// offset of the magic code in the stream
        position: u64,
    },

    /// A read from the underlying stream failed.
    #[snafu(display("I/O error near byte {} ({:#010x}): {}", position, position, source))]
    Io {
        /// offset at which the failure occurred
        position: u64,
        /// the underlying I/O error
        source: io::Error,
    },

    /// An element other than a sequence declared an undefined length.
    #[snafu(display(
        "undefined length for VR {} near byte {} ({:#010x})",
        vr,
        position,
        position
    ))]
    UndefinedLength {
        /// the element's value representation
        vr: VR,
        /// offset of the element's value
        position: u64,
    },

    /// The element's value representation has no value decoder.
    #[snafu(display("unsupported VR {} near byte {} ({:#010x})", vr, position, position))]
    UnsupportedVr {
        /// the unsupported value representation
        vr: VR,
        /// offset of the element's value
        position: u64,
    },

    /// The two bytes in the value representation slot of an explicit VR
    /// element are not a known code.
    #[snafu(display(
        "unknown VR code {:?} at byte {} ({:#010x})",
        bytes,
        position,
        position
    ))]
    InvalidVr {
        /// the offending bytes
        bytes: [u8; 2],
        /// offset of the VR field
        position: u64,
    },

    /// Sequence item framing was violated: an item start or sequence
    /// delimiter was expected at this position.
    #[snafu(display(
        "sequence item expected at byte {} ({:#010x}), found {}",
        position,
        position,
        tag
    ))]
    UnexpectedTag {
        /// the tag found instead of a sequence item marker
        tag: Tag,
        /// offset of the offending tag
        position: u64,
    },

    /// The file meta group length element is missing or malformed.
    #[snafu(display(
        "file meta group length missing or malformed near byte {}",
        position
    ))]
    MissingGroupLength {
        /// offset at which the group length was expected
        position: u64,
    },
}

/// Type alias for a result from this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Whether this is the clean end-of-stream signal.
    pub fn is_eof(&self) -> bool {
        matches!(self, Error::Eof)
    }

    /// Promote a clean end-of-stream signal into a truncation fault at
    /// `position`. Used once an element's first tag byte has been read,
    /// past which the stream may no longer end.
    pub(crate) fn into_unexpected(self, position: u64) -> Error {
        match self {
            Error::Eof => Error::UnexpectedEof { position },
            e => e,
        }
    }
}
