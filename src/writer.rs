use std::cmp::max;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Seek, SeekFrom, Write};
use std::iter;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};
use tracing::debug;

use crate::error::{Error, Result};
use crate::format::{BUCKETS, HEADER_SIZE, RECORD_HEADER_SIZE, SLOT_SIZE};
use crate::hash;
use crate::uint32;

#[derive(Clone, Copy, Debug, Default)]
struct HashPos {
    hash: u32,
    pos: u32,
}

impl HashPos {
    fn pack(&self, buf: &mut [u8]) {
        uint32::pack2(buf, self.hash, self.pos);
    }
}

fn len32(data: &[u8]) -> Result<u32> {
    match u32::try_from(data.len()) {
        Ok(len) if len < u32::MAX => Ok(len),
        _ => Err(Error::TooBig),
    }
}

/// Base interface for making a CDB.
///
/// Records are streamed to the sink as they are added; only the
/// `(hash, offset)` pair of each record is kept in memory until
/// [`finish`](CDBMake::finish) writes the hash tables and the header.
///
/// # Example
///
/// ```no_run
/// fn main() -> factoid_cdb::Result<()> {
///     let file = std::fs::File::create("temporary.cdb")?;
///     let mut cdb = factoid_cdb::CDBMake::new(file)?;
///     cdb.add(b"one", b"Hello,")?;
///     cdb.add(b"two", b"world!")?;
///     cdb.finish()?;
///     Ok(())
/// }
/// ```
pub struct CDBMake<W: Write + Seek> {
    entries: Vec<Vec<HashPos>>,
    pos: u32,
    file: io::BufWriter<W>,
}

impl<W: Write + Seek> CDBMake<W> {
    /// Create a new CDB maker, reserving the header at the start of `file`.
    pub fn new(file: W) -> Result<CDBMake<W>> {
        let mut w = io::BufWriter::new(file);
        w.seek(SeekFrom::Start(0))?;
        w.write_all(&[0; HEADER_SIZE])?;
        Ok(CDBMake {
            entries: iter::repeat_with(Vec::new).take(BUCKETS).collect(),
            pos: HEADER_SIZE as u32,
            file: w,
        })
    }

    fn pos_plus(&mut self, len: u32) -> Result<()> {
        self.pos = self.pos.checked_add(len).ok_or(Error::TooBig)?;
        Ok(())
    }

    /// Add a record to the CDB.
    pub fn add(&mut self, key: &[u8], data: &[u8]) -> Result<()> {
        let keylen = len32(key)?;
        let datalen = len32(data)?;
        let start = self.pos;
        self.pos_plus(RECORD_HEADER_SIZE)?;
        self.pos_plus(keylen)?;
        self.pos_plus(datalen)?;

        let khash = hash::hash(key);
        let bucket = &mut self.entries[hash::bucket(khash)];
        bucket.try_reserve(1).map_err(Error::alloc("bucket entries"))?;
        bucket.push(HashPos {
            hash: khash,
            pos: start,
        });

        self.file.write_u32::<LittleEndian>(keylen)?;
        self.file.write_u32::<LittleEndian>(datalen)?;
        self.file.write_all(key)?;
        self.file.write_all(data)?;
        Ok(())
    }

    /// Write the hash tables and the header, flush, and hand back the sink.
    pub fn finish(mut self) -> Result<W> {
        let mut buf = [0; SLOT_SIZE];

        let maxsize = self.entries.iter().fold(1, |acc, e| max(acc, e.len() * 2));
        let count = self.entries.iter().fold(0, |acc, e| acc + e.len());
        if maxsize + count > (u32::MAX as usize / SLOT_SIZE) {
            return Err(Error::TooBig);
        }

        // One table is reused for every bucket, sized for the largest.
        let mut table: Vec<HashPos> = Vec::new();
        table
            .try_reserve_exact(maxsize)
            .map_err(Error::alloc("hash table"))?;
        table.resize(maxsize, HashPos::default());

        let mut header = [0u8; HEADER_SIZE];
        for i in 0..BUCKETS {
            let len = self.entries[i].len() * 2;
            let j = i * SLOT_SIZE;
            uint32::pack2(&mut header[j..j + SLOT_SIZE], self.pos, len as u32);

            for e in self.entries[i].iter() {
                let mut wh = hash::start_slot(e.hash, len as u32) as usize;
                while table[wh].pos != 0 {
                    wh += 1;
                    if wh == len {
                        wh = 0;
                    }
                }
                table[wh] = *e;
            }

            for hp in table.iter_mut().take(len) {
                hp.pack(&mut buf);
                self.file.write_all(&buf)?;
                self.pos = self.pos.checked_add(SLOT_SIZE as u32).ok_or(Error::TooBig)?;
                *hp = HashPos::default();
            }
        }

        self.file.flush()?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&header)?;
        self.file.flush()?;
        debug!(records = count, size = self.pos, "cdb tables written");
        self.file.into_inner().map_err(|e| Error::Io(e.into_error()))
    }
}

impl CDBMake<fs::File> {
    /// Set the permissions on the underlying file.
    pub fn set_permissions(&self, perm: fs::Permissions) -> Result<()> {
        Ok(self.file.get_ref().set_permissions(perm)?)
    }
}

/// A CDB file writer which handles atomic updating.
///
/// Using this type, a CDB file is safely written by first creating a
/// temporary file, building the CDB structure into that temporary file,
/// and finally renaming that temporary file over the final file name.
/// If the temporary file is not properly finished (ie due to an error),
/// the temporary file is deleted when this writer is dropped.
///
/// # Example
///
/// ```no_run
/// use factoid_cdb::CDBWriter;
///
/// fn main() -> factoid_cdb::Result<()> {
///     let mut cdb = CDBWriter::create("temporary.cdb")?;
///     cdb.add(b"one", b"Hello")?;
///     cdb.finish()?;
///     Ok(())
/// }
/// ```
pub struct CDBWriter {
    dstname: PathBuf,
    tmpname: PathBuf,
    cdb: Option<CDBMake<fs::File>>,
}

impl CDBWriter {
    /// Safely create a new CDB file.
    ///
    /// The suffix for the temporary file defaults to `".tmp"`.
    pub fn create<P: AsRef<Path>>(filename: P) -> Result<CDBWriter> {
        CDBWriter::with_suffix(filename, ".tmp")
    }

    /// Safely create a new CDB file, using a specific suffix for the temporary file.
    pub fn with_suffix<P: AsRef<Path>>(filename: P, suffix: &str) -> Result<CDBWriter> {
        let mut tmpname = OsString::from(filename.as_ref());
        tmpname.push(suffix);
        CDBWriter::with_filenames(filename, tmpname)
    }

    /// Safely create a new CDB file, using two specific file names.
    ///
    /// Note that the temporary file name must be on the same filesystem
    /// as the destination, or else the final rename will fail.
    pub fn with_filenames<P: AsRef<Path>, Q: AsRef<Path>>(
        filename: P,
        tmpname: Q,
    ) -> Result<CDBWriter> {
        let tmpname = tmpname.as_ref().to_path_buf();
        let file = fs::File::create(&tmpname).map_err(|source| Error::Create {
            path: tmpname.clone(),
            source,
        })?;
        let cdb = match CDBMake::new(file) {
            Ok(cdb) => cdb,
            Err(e) => {
                let _ = fs::remove_file(&tmpname);
                return Err(e);
            }
        };
        Ok(CDBWriter {
            dstname: filename.as_ref().to_path_buf(),
            tmpname,
            cdb: Some(cdb),
        })
    }

    fn make(&mut self) -> &mut CDBMake<fs::File> {
        // The unwrap() is safe here, as the internal cdb is only ever
        // None during finish(), which does not call this.
        self.cdb.as_mut().unwrap()
    }

    /// Add a record to the CDB file.
    pub fn add(&mut self, key: &[u8], data: &[u8]) -> Result<()> {
        self.make().add(key, data)
    }

    /// Set permissions on the temporary file.
    ///
    /// This must be done before the file is finished, as the temporary
    /// file will no longer exist at that point.
    pub fn set_permissions(&mut self, perm: fs::Permissions) -> Result<()> {
        self.make().set_permissions(perm)
    }

    /// Path of the file being written until [`finish`](CDBWriter::finish).
    pub fn temp_path(&self) -> &Path {
        &self.tmpname
    }

    /// Finish the CDB and rename it over the destination.
    ///
    /// On failure the temporary file is removed and the destination is
    /// left as it was.
    pub fn finish(mut self) -> Result<()> {
        let cdb = match self.cdb.take() {
            Some(cdb) => cdb,
            None => return Ok(()),
        };
        let result = self.commit(cdb);
        if result.is_err() {
            let _ = fs::remove_file(&self.tmpname);
        }
        result
    }

    fn commit(&self, cdb: CDBMake<fs::File>) -> Result<()> {
        let file = cdb.finish()?;
        file.sync_all()?;
        drop(file);
        fs::rename(&self.tmpname, &self.dstname)?;
        debug!(path = %self.dstname.display(), "cdb committed");
        Ok(())
    }
}

impl Drop for CDBWriter {
    fn drop(&mut self) {
        if self.cdb.is_some() {
            let _ = fs::remove_file(&self.tmpname);
        }
    }
}
