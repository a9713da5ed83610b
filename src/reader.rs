use filebuffer::FileBuffer;
use std::cmp::min;
use std::io;
use std::ops::Deref;
use std::path::Path;

use tracing::trace;

use crate::dump::CDBDump;
use crate::error::{Error, Result};
use crate::format::{self, HEADER_SIZE, RECORD_HEADER_SIZE, SLOT_SIZE};
use crate::hash::{self, hash};
use crate::uint32;

/// CDB file reader
///
/// The reader works over any byte buffer: a memory-mapped file from
/// [`CDB::open`], or an in-memory image through [`CDB::new`]. It never
/// modifies the data, so any number of cursors may search one `CDB` at the
/// same time.
///
/// # Example
///
/// ```
/// let cdb = factoid_cdb::CDB::open("tests/test1.cdb").unwrap();
///
/// for result in cdb.find(b"one") {
///     println!("{:?}", result.unwrap());
/// }
/// ```
pub struct CDB<B = FileBuffer> {
    file: B,
    size: usize,
}

impl CDB<FileBuffer> {
    /// Opens the named file and returns the CDB reader.
    ///
    /// # Examples
    ///
    /// ```
    /// let cdb = factoid_cdb::CDB::open("tests/test1.cdb").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(filename: P) -> Result<CDB> {
        let path = filename.as_ref();
        let file = FileBuffer::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        trace!(path = %path.display(), size = file.len(), "opened cdb");
        CDB::new(file)
    }
}

impl<B: Deref<Target = [u8]>> CDB<B> {
    /// Wrap an already loaded database image.
    ///
    /// Fails with [`Error::BadFile`] if the image cannot even hold the
    /// header, or is larger than the 32-bit offsets can address.
    pub fn new(file: B) -> Result<CDB<B>> {
        let size = file.len();
        if size < HEADER_SIZE || size as u64 > u64::from(u32::MAX) {
            return Err(Error::BadFile);
        }
        Ok(CDB { file, size })
    }

    /// Size of the database in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    fn slice(&self, pos: u64, len: u64) -> Result<&[u8]> {
        let end = pos + len;
        if end > self.size as u64 {
            return Err(Error::BadFile);
        }
        Ok(&self.file[pos as usize..end as usize])
    }

    fn hash_table(&self, khash: u32) -> (u32, u32) {
        format::header_slot(&self.file[..HEADER_SIZE], hash::bucket(khash))
    }

    fn match_key(&self, key: &[u8], pos: u64) -> Result<bool> {
        Ok(self.slice(pos, key.len() as u64)? == key)
    }

    /// Find all records with the named key. The returned iterator
    /// produces each value associated with the key, in the order they
    /// were added.
    ///
    /// # Examples
    ///
    /// ```
    /// let cdb = factoid_cdb::CDB::open("tests/test1.cdb").unwrap();
    ///
    /// for result in cdb.find(b"one") {
    ///     println!("{:?}", result.unwrap());
    /// }
    /// ```
    pub fn find(&self, key: &[u8]) -> CDBValueIter<'_, B> {
        let mut cursor = self.cursor();
        cursor.find(key);
        CDBValueIter { cursor }
    }

    /// A fresh search cursor. It yields nothing until [`CDBCursor::find`]
    /// is called.
    pub fn cursor(&self) -> CDBCursor<'_, B> {
        CDBCursor {
            cdb: self,
            key: Vec::new(),
            khash: 0,
            kloop: 0,
            kpos: 0,
            hpos: 0,
            hslots: 0,
        }
    }

    /// Iterate over every record in file order, without using the hash
    /// tables.
    pub fn iter(&self) -> CDBDump<io::Cursor<&[u8]>> {
        CDBDump::new(io::Cursor::new(&self.file[..]))
    }
}

/// A keyed search over a [`CDB`].
///
/// A cursor holds the state of one search at a time. [`find`] (re)arms it
/// for a key; each [`next`] then yields the following value for that key.
///
/// ```
/// let cdb = factoid_cdb::CDB::open("tests/test1.cdb").unwrap();
/// let mut cursor = cdb.cursor();
/// let mut buf = [0u8; 4];
///
/// cursor.find(b"one");
/// assert_eq!(cursor.next(None).unwrap(), Some(5));
/// assert_eq!(cursor.next(Some(&mut buf[..])).unwrap(), Some(4));
/// assert_eq!(&buf, b", Wo");
/// assert_eq!(cursor.next(None).unwrap(), None);
/// ```
///
/// [`find`]: CDBCursor::find
/// [`next`]: CDBCursor::next
pub struct CDBCursor<'a, B = FileBuffer> {
    cdb: &'a CDB<B>,
    key: Vec<u8>,
    khash: u32,
    kloop: u32,
    kpos: u32,
    hpos: u32,
    hslots: u32,
}

impl<'a, B: Deref<Target = [u8]>> CDBCursor<'a, B> {
    /// Start a new search for `key`, abandoning any search in progress.
    pub fn find(&mut self, key: &[u8]) {
        let khash = hash(key);
        let (hpos, hslots) = self.cdb.hash_table(khash);

        self.key.clear();
        self.key.extend_from_slice(key);
        self.khash = khash;
        self.kloop = 0;
        self.kpos = if hslots > 0 {
            hash::start_slot(khash, hslots)
        } else {
            0
        };
        self.hpos = hpos;
        self.hslots = hslots;
    }

    /// Probe for the next record matching the key, returning the position
    /// and length of its value.
    fn next_match(&mut self) -> Result<Option<(u64, u32)>> {
        while self.kloop < self.hslots {
            let slot = u64::from(self.hpos) + u64::from(self.kpos) * SLOT_SIZE as u64;
            let (khash, pos) = uint32::unpack2(self.cdb.slice(slot, SLOT_SIZE as u64)?);
            if pos == 0 {
                // An empty slot ends the chain for good.
                self.kloop = self.hslots;
                return Ok(None);
            }
            self.kloop += 1;
            self.kpos = (self.kpos + 1) % self.hslots;
            if khash != self.khash {
                continue;
            }

            let pos = u64::from(pos);
            let (klen, dlen) =
                uint32::unpack2(self.cdb.slice(pos, u64::from(RECORD_HEADER_SIZE))?);
            let kpos = pos + u64::from(RECORD_HEADER_SIZE);
            if klen as usize == self.key.len() && self.cdb.match_key(&self.key, kpos)? {
                return Ok(Some((kpos + u64::from(klen), dlen)));
            }
        }
        Ok(None)
    }

    /// Advance to the next value for the key.
    ///
    /// Without a buffer this only reports the length of the value. With a
    /// buffer, up to `buf.len()` bytes of the value are copied into it and
    /// the number copied is returned; longer values are silently
    /// truncated. `Ok(None)` means there are no more values.
    pub fn next(&mut self, buf: Option<&mut [u8]>) -> Result<Option<usize>> {
        let (dpos, dlen) = match self.next_match()? {
            Some(found) => found,
            None => return Ok(None),
        };
        match buf {
            None => Ok(Some(dlen as usize)),
            Some(buf) => {
                let n = min(dlen as usize, buf.len());
                buf[..n].copy_from_slice(self.cdb.slice(dpos, n as u64)?);
                Ok(Some(n))
            }
        }
    }

    /// Advance to the next value for the key and return all of it.
    pub fn next_value(&mut self) -> Result<Option<Vec<u8>>> {
        match self.next_match()? {
            Some((dpos, dlen)) => Ok(Some(self.cdb.slice(dpos, u64::from(dlen))?.to_vec())),
            None => Ok(None),
        }
    }
}

/// Iterator over a set of records in the CDB with the same key.
pub struct CDBValueIter<'a, B = FileBuffer> {
    cursor: CDBCursor<'a, B>,
}

impl<'a, B: Deref<Target = [u8]>> Iterator for CDBValueIter<'a, B> {
    type Item = Result<Vec<u8>>;
    fn next(&mut self) -> Option<Result<Vec<u8>>> {
        self.cursor.next_value().transpose()
    }
}
