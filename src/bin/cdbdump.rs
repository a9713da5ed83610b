use std::env;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use factoid_cdb::{records, tool, CDBDump, Result};

/// Write every record of `filename` to stdout in `cdbmake` format.
fn dump(filename: PathBuf) -> Result<()> {
    let mut out = BufWriter::new(io::stdout().lock());
    for record in CDBDump::open(&filename)? {
        let (key, data) = record?;
        records::write_record(&mut out, &key, &data)?;
    }
    records::write_end(&mut out)?;
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    tool::init_logging();
    let mut args = env::args_os();
    let prog = args
        .next()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cdbdump".into());

    let filename = match (args.next(), args.next()) {
        (Some(filename), None) => PathBuf::from(filename),
        _ => {
            eprintln!("Usage: {} CDB", prog);
            return ExitCode::from(tool::EX_USAGE);
        }
    };
    match dump(filename) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => tool::fail(&prog, &e),
    }
}
