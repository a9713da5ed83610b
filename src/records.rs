//! The `cdbmake` text format.
//!
//! Each record is written as
//!
//! ```text
//! +klen,dlen:key->data
//! ```
//!
//! followed by a newline, where `klen` and `dlen` are the decimal byte
//! lengths of `key` and `data`. Both may contain any bytes, newlines
//! included. An empty line ends the stream.

use std::io::{self, BufRead, Read, Write};

use byteorder::ReadBytesExt;

use crate::error::{Error, Result};

/// Reads records from a `cdbmake` stream.
///
/// ```
/// let input = &b"+3,5:one->Hello\n+3,7:two->Goodbye\n\n"[..];
/// let records = factoid_cdb::Records::new(input)
///     .collect::<factoid_cdb::Result<Vec<_>>>()
///     .unwrap();
/// assert_eq!(records[1], (b"two".to_vec(), b"Goodbye".to_vec()));
/// ```
pub struct Records<R> {
    src: R,
    record: usize,
    done: bool,
}

impl<R: BufRead> Records<R> {
    pub fn new(src: R) -> Self {
        Records {
            src,
            record: 0,
            done: false,
        }
    }

    fn syntax(&self, reason: &'static str) -> Error {
        Error::Syntax {
            record: self.record,
            reason,
        }
    }

    fn byte(&mut self) -> Result<u8> {
        match self.src.read_u8() {
            Ok(c) => Ok(c),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(self.syntax("unexpected end of input"))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn expect(&mut self, want: u8, reason: &'static str) -> Result<()> {
        if self.byte()? != want {
            return Err(self.syntax(reason));
        }
        Ok(())
    }

    fn length(&mut self, term: u8) -> Result<u32> {
        let mut n: u32 = 0;
        let mut digits = 0;
        loop {
            let c = self.byte()?;
            if c == term && digits > 0 {
                return Ok(n);
            }
            if !c.is_ascii_digit() {
                return Err(self.syntax("bad length"));
            }
            n = n
                .checked_mul(10)
                .and_then(|n| n.checked_add(u32::from(c - b'0')))
                .ok_or_else(|| self.syntax("length out of range"))?;
            digits += 1;
        }
    }

    fn field(&mut self, len: u32) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.src
            .by_ref()
            .take(u64::from(len))
            .read_to_end(&mut buf)?;
        if buf.len() != len as usize {
            return Err(self.syntax("unexpected end of input"));
        }
        Ok(buf)
    }

    /// Read the next record, or `None` at the terminating empty line or
    /// at end of input between records.
    pub fn read_record(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        if self.done {
            return Ok(None);
        }
        self.record += 1;
        let first = match self.src.read_u8() {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                self.done = true;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        match first {
            b'\n' => {
                self.done = true;
                return Ok(None);
            }
            b'+' => {}
            _ => return Err(self.syntax("expected '+'")),
        }

        let klen = self.length(b',')?;
        let dlen = self.length(b':')?;
        let key = self.field(klen)?;
        self.expect(b'-', "expected '->'")?;
        self.expect(b'>', "expected '->'")?;
        let data = self.field(dlen)?;
        self.expect(b'\n', "expected newline")?;
        Ok(Some((key, data)))
    }
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.read_record().transpose();
        if let Some(Err(_)) = item {
            self.done = true;
        }
        item
    }
}

/// Write one record in `cdbmake` format.
pub fn write_record<W: Write>(w: &mut W, key: &[u8], data: &[u8]) -> io::Result<()> {
    write!(w, "+{},{}:", key.len(), data.len())?;
    w.write_all(key)?;
    w.write_all(b"->")?;
    w.write_all(data)?;
    w.write_all(b"\n")
}

/// Write the empty line that ends a `cdbmake` stream.
pub fn write_end<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(b"\n")
}
