use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::info;

use factoid_cdb::{tool, CDBWriter, Records, Result};

/// Build `filename` from `cdbmake` records on stdin. The old file, if any,
/// is replaced only once the new one is complete.
fn make(filename: PathBuf) -> Result<()> {
    let mut cdb = CDBWriter::create(&filename)?;
    let mut count = 0usize;
    for record in Records::new(io::stdin().lock()) {
        let (key, data) = record?;
        cdb.add(&key, &data)?;
        count += 1;
    }
    cdb.finish()?;
    info!(path = %filename.display(), records = count, "cdb built");
    Ok(())
}

fn main() -> ExitCode {
    tool::init_logging();
    let mut args = env::args_os();
    let prog = args
        .next()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cdbmake".into());

    let filename = match (args.next(), args.next()) {
        (Some(filename), None) => PathBuf::from(filename),
        _ => {
            eprintln!("Usage: {} CDB < records", prog);
            return ExitCode::from(tool::EX_USAGE);
        }
    };
    match make(filename) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => tool::fail(&prog, &e),
    }
}
