//! Updating a constant database by rebuilding it.
//!
//! A CDB cannot be changed in place. Every update here dumps the old file
//! record by record, filters the records into a fresh file next to the
//! destination, optionally appends one new record, and renames the new
//! file over the destination. Until that rename the destination is never
//! touched, and a failed rebuild removes its temporary file.

use std::path::Path;
use std::process;

use tracing::{debug, instrument};

use crate::dump::CDBDump;
use crate::error::Result;
use crate::glob::Glob;
use crate::writer::CDBWriter;

/// What a rebuild did with the records it saw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RebuildStats {
    /// Records copied from the source.
    pub kept: usize,
    /// Records the filter rejected.
    pub dropped: usize,
    /// Records appended after the copy.
    pub added: usize,
}

/// Rebuild `source` into `destination`.
///
/// Every record of `source` for which `keep(key, value)` returns true is
/// copied in its original order; `extra`, if given, is appended after them.
/// The new database is built in `destination` plus a `.<pid>` suffix and
/// renamed over `destination` once complete. `source` and `destination`
/// may be the same path.
pub fn rebuild<P, Q, F>(
    source: P,
    destination: Q,
    mut keep: F,
    extra: Option<(&[u8], &[u8])>,
) -> Result<RebuildStats>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    F: FnMut(&[u8], &[u8]) -> bool,
{
    let mut stats = RebuildStats::default();
    let mut dump = CDBDump::open(source.as_ref())?;
    let mut cdb = CDBWriter::with_suffix(destination.as_ref(), &format!(".{}", process::id()))?;

    while let Some((key, value)) = dump.next_record()? {
        if keep(&key, &value) {
            cdb.add(&key, &value)?;
            stats.kept += 1;
        } else {
            stats.dropped += 1;
        }
    }
    drop(dump);

    if let Some((key, value)) = extra {
        cdb.add(key, value)?;
        stats.added += 1;
    }

    cdb.finish()?;
    debug!(
        source = %source.as_ref().display(),
        destination = %destination.as_ref().display(),
        kept = stats.kept,
        dropped = stats.dropped,
        added = stats.added,
        "cdb rebuilt"
    );
    Ok(stats)
}

/// Rewrite `path` with the same records, dropping nothing.
#[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
pub fn compact<P: AsRef<Path>>(path: P) -> Result<RebuildStats> {
    rebuild(&path, &path, |_, _| true, None)
}

/// Add `value` under `key`. Existing values, including identical ones,
/// are all kept.
#[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
pub fn append<P: AsRef<Path>>(path: P, key: &[u8], value: &[u8]) -> Result<RebuildStats> {
    rebuild(&path, &path, |_, _| true, Some((key, value)))
}

/// Remove every value of `key` that matches `glob`.
#[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
pub fn remove<P: AsRef<Path>>(path: P, key: &[u8], glob: &Glob) -> Result<RebuildStats> {
    rebuild(&path, &path, |k, v| !(k == key && glob.matches(v)), None)
}

/// Create (or replace) `path` with an empty database.
#[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
pub fn create<P: AsRef<Path>>(path: P) -> Result<()> {
    CDBWriter::create(path)?.finish()
}
