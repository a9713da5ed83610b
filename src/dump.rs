use std::fs;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};
use crate::format::{self, HEADER_SIZE, RECORD_HEADER_SIZE};

/// Sequential reader of every record in a CDB, in the order they were
/// added.
///
/// The dump walks the record region directly and never consults the hash
/// tables. The only thing it takes from the header is where the records
/// stop. Record lengths are trusted as found; a length that runs past the
/// end of the file surfaces as an `UnexpectedEof` I/O error.
///
/// # Example
///
/// ```
/// let mut dump = factoid_cdb::CDBDump::open("tests/test1.cdb").unwrap();
///
/// while let Some((key, value)) = dump.next_record().unwrap() {
///     println!("{:?} => {:?}", key, value);
/// }
/// ```
pub struct CDBDump<R> {
    src: R,
    pos: u64,
    end: Option<u64>,
    failed: bool,
}

impl CDBDump<BufReader<fs::File>> {
    /// Opens the named file for dumping.
    pub fn open<P: AsRef<Path>>(filename: P) -> Result<Self> {
        let path = filename.as_ref();
        let file = fs::File::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(CDBDump::new(BufReader::new(file)))
    }
}

impl<R: Read + Seek> CDBDump<R> {
    pub fn new(src: R) -> Self {
        CDBDump {
            src,
            pos: HEADER_SIZE as u64,
            end: None,
            failed: false,
        }
    }

    /// Rewind to the first record. The header is read again on the next
    /// call.
    pub fn reset(&mut self) {
        self.end = None;
        self.failed = false;
    }

    fn start(&mut self) -> Result<u64> {
        let mut header = [0u8; HEADER_SIZE];
        self.src.seek(SeekFrom::Start(0))?;
        self.src.read_exact(&mut header)?;
        let end = u64::from(format::records_end(&header));
        self.pos = HEADER_SIZE as u64;
        self.end = Some(end);
        Ok(end)
    }

    /// Read the next `(key, value)` record, or `None` past the last one.
    pub fn next_record(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let end = match self.end {
            Some(end) => end,
            None => self.start()?,
        };
        if self.pos >= end {
            return Ok(None);
        }

        let klen = self.src.read_u32::<LittleEndian>()?;
        let dlen = self.src.read_u32::<LittleEndian>()?;
        let key = read_field(&mut self.src, klen)?;
        let data = read_field(&mut self.src, dlen)?;
        self.pos += u64::from(RECORD_HEADER_SIZE) + u64::from(klen) + u64::from(dlen);
        Ok(Some((key, data)))
    }

    pub fn into_inner(self) -> R {
        self.src
    }
}

// Lengths come straight from the file, so the buffer grows with what is
// actually read instead of being allocated up front.
fn read_field<R: Read>(src: &mut R, len: u32) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    src.by_ref().take(u64::from(len)).read_to_end(&mut buf)?;
    if buf.len() != len as usize {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
    }
    Ok(buf)
}

impl<R: Read + Seek> Iterator for CDBDump<R> {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.next_record().transpose();
        if let Some(Err(_)) = item {
            self.failed = true;
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uint32;
    use crate::CDBMake;
    use std::io::Cursor;

    fn build(pairs: &[(&[u8], &[u8])]) -> Vec<u8> {
        let mut cdb = CDBMake::new(Cursor::new(Vec::new())).unwrap();
        for (k, v) in pairs {
            cdb.add(k, v).unwrap();
        }
        cdb.finish().unwrap().into_inner()
    }

    fn records(data: Vec<u8>) -> Vec<(Vec<u8>, Vec<u8>)> {
        CDBDump::new(Cursor::new(data))
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn empty_database() {
        assert!(records(build(&[])).is_empty());
        assert!(records(vec![0u8; HEADER_SIZE]).is_empty());
    }

    #[test]
    fn file_order_with_duplicates() {
        let data = build(&[(b"foo", b"bar1"), (b"baz", b"qux"), (b"foo", b"bar2")]);
        assert_eq!(
            records(data),
            vec![
                (b"foo".to_vec(), b"bar1".to_vec()),
                (b"baz".to_vec(), b"qux".to_vec()),
                (b"foo".to_vec(), b"bar2".to_vec()),
            ]
        );
    }

    #[test]
    fn empty_key_and_value() {
        let data = build(&[(b"", b""), (b"k", b"")]);
        assert_eq!(
            records(data),
            vec![(b"".to_vec(), b"".to_vec()), (b"k".to_vec(), b"".to_vec())]
        );
    }

    #[test]
    fn reset_starts_over() {
        let mut dump = CDBDump::new(Cursor::new(build(&[(b"a", b"1"), (b"b", b"2")])));
        assert_eq!(dump.next_record().unwrap().unwrap().0, b"a");
        assert_eq!(dump.next_record().unwrap().unwrap().0, b"b");
        assert!(dump.next_record().unwrap().is_none());
        dump.reset();
        assert_eq!(dump.next_record().unwrap().unwrap().0, b"a");
    }

    #[test]
    fn stops_at_end_of_records() {
        let data = build(&[(b"a", b"1"), (b"bb", b"22")]);
        let len = data.len() as u64;
        let mut dump = CDBDump::new(Cursor::new(data));
        while dump.next_record().unwrap().is_some() {}
        // The hash tables after the records are never read.
        let src = dump.into_inner();
        assert_eq!(src.position(), 2048 + 10 + 12);
        assert!(src.position() < len);
    }

    #[test]
    fn zero_pointers_mark_empty_buckets() {
        // Only one bucket is populated; the rest have zero pointers.
        let mut data = vec![0u8; HEADER_SIZE];
        data.extend_from_slice(&[1, 0, 0, 0, 2, 0, 0, 0, b'k', b'v', b'w']);
        let table = data.len() as u32;
        data.extend_from_slice(&[0u8; 16]);
        uint32::pack2(&mut data[40..48], table, 2);
        assert_eq!(records(data), vec![(b"k".to_vec(), b"vw".to_vec())]);
    }

    #[test]
    fn truncated_record_is_an_error() {
        let mut data = build(&[(b"key", b"value")]);
        // Claim a value far longer than the file.
        uint32::pack(&mut data[2052..2056], 1 << 30);
        let mut dump = CDBDump::new(Cursor::new(data));
        match dump.next() {
            Some(Err(Error::Io(e))) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected {:?}", other),
        }
        assert!(dump.next().is_none());
    }
}
