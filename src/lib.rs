//! This crate provides support for reading, writing and rewriting
//! [CDB](https://cr.yp.to/cdb.html) files, and the factoid tools built on
//! them. A CDB is a "constant database" that acts as an on-disk
//! associative array mapping keys to values, allowing multiple values for
//! each key. It provides for fast lookups and low overheads. A constant
//! database has no provision for updating, only rewriting from scratch;
//! the [`rewrite`] module does that rewriting.
//!
//! # Examples
//!
//! Reading a set of records:
//!
//! ```
//! let cdb = factoid_cdb::CDB::open("tests/test1.cdb").unwrap();
//!
//! for result in cdb.find(b"one") {
//!     println!("{:?}", result.unwrap());
//! }
//! ```
//!
//! Creating a database with safe atomic updating:
//!
//! ```no_run
//! fn main() -> factoid_cdb::Result<()> {
//!     let mut cdb = factoid_cdb::CDBWriter::create("temporary.cdb")?;
//!     cdb.add(b"one", b"Hello, ")?;
//!     cdb.add(b"one", b"world!\n")?;
//!     cdb.add(b"two", &[1, 2, 3, 4])?;
//!     cdb.finish()?;
//!     Ok(())
//! }
//! ```
//!
//! Adding to and removing from an existing database:
//!
//! ```no_run
//! use factoid_cdb::{rewrite, Glob};
//!
//! fn main() -> factoid_cdb::Result<()> {
//!     rewrite::append("factoids.cdb", b"rust", b"a systems language")?;
//!     rewrite::remove("factoids.cdb", b"rust", &Glob::new(b"*language"))?;
//!     Ok(())
//! }
//! ```
//!
//! # References
//!
//!  * [D. J. Bernstein's original software](https://cr.yp.to/cdb.html)
//!  * [Constant Database (cdb) Internals](https://www.unixuser.org/~euske/doc/cdbinternals/index.html)
//!  * [Wikipedia](https://en.wikipedia.org/wiki/Cdb_(software))

mod dump;
mod error;
mod format;
mod glob;
mod hash;
mod reader;
pub mod records;
pub mod rewrite;
pub mod tool;
mod uint32;
mod writer;

pub use dump::CDBDump;
pub use error::{Error, Result};
pub use glob::Glob;
pub use hash::hash;
pub use reader::{CDBCursor, CDBValueIter, CDB};
pub use records::Records;
pub use rewrite::RebuildStats;
pub use writer::{CDBMake, CDBWriter};
