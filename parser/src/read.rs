//! The byte-level source of the parser: a buffered reader with a read
//! count, a small look-ahead window, endian-aware scalar reads and the
//! mutable explicit-VR flag that the parser flips when the transfer
//! syntax demands it.

use crate::error::{Error, IoSnafu, Result, UnexpectedEofSnafu};
use byteordered::byteorder::{BigEndian, ByteOrder, LittleEndian};
use byteordered::{ByteOrdered, Endianness};
use snafu::ResultExt;
use std::io::{BufReader, ErrorKind, Read};

/// A buffered reading abstraction over a DICOM stream.
///
/// The reader tracks the number of bytes consumed (peeked bytes are not
/// counted until they are committed by a read or a skip), decodes scalars
/// with the byte order fixed at construction, and carries the
/// explicit-VR flag consulted by the parser. End of stream on the first
/// byte of a read surfaces as the clean [`Error::Eof`] signal; end of
/// stream in the middle of a read is the [`Error::UnexpectedEof`] fault.
#[derive(Debug)]
pub struct DataReader<R> {
    inner: BufReader<R>,
    /// bytes pulled ahead of the read position by `peek`
    lookahead: Vec<u8>,
    position: u64,
    endianness: Endianness,
    explicit: bool,
}

impl<R: Read> DataReader<R> {
    /// Create a new reader over the given source with the given byte
    /// order and explicitness.
    pub fn new(source: R, endianness: Endianness, explicit: bool) -> Self {
        DataReader {
            inner: BufReader::new(source),
            lookahead: Vec::new(),
            position: 0,
            endianness,
            explicit,
        }
    }

    /// Retrieve the total number of bytes consumed so far.
    #[inline]
    pub fn bytes_read(&self) -> u64 {
        self.position
    }

    /// Retrieve the reader's byte order.
    #[inline]
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Whether the reader is decoding explicit VR content.
    #[inline]
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    /// Update the explicit VR flag.
    #[inline]
    pub fn set_explicit(&mut self, explicit: bool) {
        self.explicit = explicit;
    }

    /// Pull bytes into `buf`, draining the look-ahead window first.
    /// Returns the number of bytes delivered, 0 on end of stream.
    fn pull(&mut self, buf: &mut [u8]) -> Result<usize> {
        if !self.lookahead.is_empty() {
            let n = self.lookahead.len().min(buf.len());
            buf[..n].copy_from_slice(&self.lookahead[..n]);
            self.lookahead.drain(..n);
            self.position += n as u64;
            return Ok(n);
        }
        loop {
            match self.inner.read(buf) {
                Ok(n) => {
                    self.position += n as u64;
                    return Ok(n);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(e).context(IoSnafu {
                        position: self.position,
                    })
                }
            }
        }
    }

    /// Fill `buf` entirely.
    ///
    /// End of stream before the first byte yields [`Error::Eof`]; end of
    /// stream after at least one byte yields [`Error::UnexpectedEof`].
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.pull(&mut buf[filled..])?;
            if n == 0 {
                return if filled == 0 {
                    Err(Error::Eof)
                } else {
                    UnexpectedEofSnafu {
                        position: self.position,
                    }
                    .fail()
                };
            }
            filled += n;
        }
        Ok(())
    }

    /// Borrow the next `n` bytes without consuming them.
    ///
    /// Yields [`Error::Eof`] if the stream ends before `n` bytes are
    /// available.
    pub fn peek(&mut self, n: usize) -> Result<&[u8]> {
        while self.lookahead.len() < n {
            let mut chunk = [0u8; 8];
            let want = (n - self.lookahead.len()).min(chunk.len());
            let got = loop {
                match self.inner.read(&mut chunk[..want]) {
                    Ok(got) => break got,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => {
                        return Err(e).context(IoSnafu {
                            position: self.position,
                        })
                    }
                }
            };
            if got == 0 {
                return Err(Error::Eof);
            }
            self.lookahead.extend_from_slice(&chunk[..got]);
        }
        Ok(&self.lookahead[..n])
    }

    /// Discard `n` bytes, advancing the read count.
    ///
    /// A stream that ends before `n` bytes are consumed yields
    /// [`Error::UnexpectedEof`].
    pub fn skip(&mut self, n: u64) -> Result<()> {
        let mut scratch = [0u8; 64];
        let mut remaining = n;
        while remaining > 0 {
            let want = remaining.min(scratch.len() as u64) as usize;
            let got = self.pull(&mut scratch[..want])?;
            if got == 0 {
                return UnexpectedEofSnafu {
                    position: self.position,
                }
                .fail();
            }
            remaining -= got as u64;
        }
        Ok(())
    }

    /// Read `n` bytes of raw 8-bit text, mapping each byte to the
    /// character of the same code point.
    ///
    /// Unlike the scalar reads, a stream that ends anywhere inside the
    /// text is a truncation fault, never a clean end of stream.
    pub fn read_str(&mut self, n: u32) -> Result<String> {
        let mut buf = vec![0u8; n as usize];
        self.read_exact(&mut buf)
            .map_err(|e| e.into_unexpected(self.position))?;
        Ok(buf.into_iter().map(char::from).collect())
    }

    /// Read one `u16` in the reader's byte order.
    pub fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(match self.endianness {
            Endianness::Little => LittleEndian::read_u16(&buf),
            Endianness::Big => BigEndian::read_u16(&buf),
        })
    }

    /// Read one `u32` in the reader's byte order.
    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(match self.endianness {
            Endianness::Little => LittleEndian::read_u32(&buf),
            Endianness::Big => BigEndian::read_u32(&buf),
        })
    }

    /// Read one `i16` in the reader's byte order.
    pub fn read_i16(&mut self) -> Result<i16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(match self.endianness {
            Endianness::Little => LittleEndian::read_i16(&buf),
            Endianness::Big => BigEndian::read_i16(&buf),
        })
    }

    /// Read one `i32` in the reader's byte order.
    pub fn read_i32(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(match self.endianness {
            Endianness::Little => LittleEndian::read_i32(&buf),
            Endianness::Big => BigEndian::read_i32(&buf),
        })
    }

    /// Read one `f32` in the reader's byte order.
    pub fn read_f32(&mut self) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(match self.endianness {
            Endianness::Little => LittleEndian::read_f32(&buf),
            Endianness::Big => BigEndian::read_f32(&buf),
        })
    }

    /// Read one `f64` in the reader's byte order.
    pub fn read_f64(&mut self) -> Result<f64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(match self.endianness {
            Endianness::Little => LittleEndian::read_f64(&buf),
            Endianness::Big => BigEndian::read_f64(&buf),
        })
    }

    /// Read one `u16` in little endian order, regardless of the reader's
    /// byte order. Tags are always little endian in the transfer
    /// syntaxes this library supports.
    pub fn read_u16_le(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(LittleEndian::read_u16(&buf))
    }

    /// Read one `u32` in little endian order, regardless of the reader's
    /// byte order. Sequence item framing is always little endian.
    pub fn read_u32_le(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(LittleEndian::read_u32(&buf))
    }

    /// Fill `target` with `u16` values in the reader's byte order.
    pub fn read_u16_into(&mut self, target: &mut [u16]) -> Result<()> {
        let mut raw = vec![0u8; target.len() * 2];
        self.read_exact(&mut raw)?;
        match self.endianness {
            Endianness::Little => ByteOrdered::le(&raw[..]).read_u16_into(target),
            Endianness::Big => ByteOrdered::be(&raw[..]).read_u16_into(target),
        }
        .context(IoSnafu {
            position: self.position,
        })
    }

    /// Fill `target` with `i16` values in the reader's byte order.
    pub fn read_i16_into(&mut self, target: &mut [i16]) -> Result<()> {
        let mut raw = vec![0u8; target.len() * 2];
        self.read_exact(&mut raw)?;
        match self.endianness {
            Endianness::Little => ByteOrdered::le(&raw[..]).read_i16_into(target),
            Endianness::Big => ByteOrdered::be(&raw[..]).read_i16_into(target),
        }
        .context(IoSnafu {
            position: self.position,
        })
    }

    /// Fill `target` with `u32` values in the reader's byte order.
    pub fn read_u32_into(&mut self, target: &mut [u32]) -> Result<()> {
        let mut raw = vec![0u8; target.len() * 4];
        self.read_exact(&mut raw)?;
        match self.endianness {
            Endianness::Little => ByteOrdered::le(&raw[..]).read_u32_into(target),
            Endianness::Big => ByteOrdered::be(&raw[..]).read_u32_into(target),
        }
        .context(IoSnafu {
            position: self.position,
        })
    }

    /// Fill `target` with `i32` values in the reader's byte order.
    pub fn read_i32_into(&mut self, target: &mut [i32]) -> Result<()> {
        let mut raw = vec![0u8; target.len() * 4];
        self.read_exact(&mut raw)?;
        match self.endianness {
            Endianness::Little => ByteOrdered::le(&raw[..]).read_i32_into(target),
            Endianness::Big => ByteOrdered::be(&raw[..]).read_i32_into(target),
        }
        .context(IoSnafu {
            position: self.position,
        })
    }

    /// Fill `target` with `f32` values in the reader's byte order.
    pub fn read_f32_into(&mut self, target: &mut [f32]) -> Result<()> {
        let mut raw = vec![0u8; target.len() * 4];
        self.read_exact(&mut raw)?;
        match self.endianness {
            Endianness::Little => ByteOrdered::le(&raw[..]).read_f32_into(target),
            Endianness::Big => ByteOrdered::be(&raw[..]).read_f32_into(target),
        }
        .context(IoSnafu {
            position: self.position,
        })
    }

    /// Fill `target` with `f64` values in the reader's byte order.
    pub fn read_f64_into(&mut self, target: &mut [f64]) -> Result<()> {
        let mut raw = vec![0u8; target.len() * 8];
        self.read_exact(&mut raw)?;
        match self.endianness {
            Endianness::Little => ByteOrdered::le(&raw[..]).read_f64_into(target),
            Endianness::Big => ByteOrdered::be(&raw[..]).read_f64_into(target),
        }
        .context(IoSnafu {
            position: self.position,
        })
    }
}
