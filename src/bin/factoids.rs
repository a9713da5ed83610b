use std::env;
use std::ffi::OsString;
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use rand::Rng;
use tracing::debug;

use factoid_cdb::{rewrite, tool, Glob, Result, CDB};

// Longest value printed; anything past this is cut off.
const MAX_VALUE: usize = 8192;

#[derive(Debug, PartialEq, Eq)]
enum Action {
    One,
    All,
    Add(Vec<u8>),
    Del(Vec<u8>),
    New,
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    action: Action,
    filename: PathBuf,
    key: Vec<u8>,
}

fn usage(prog: &str) -> ExitCode {
    eprintln!("Usage: {} [OPTIONS] CDB \"KEY\"", prog);
    eprintln!();
    eprintln!("Default:   Display one randomly-picked entry for KEY");
    eprintln!("-n         Create database from scratch, ignoring KEY");
    eprintln!("-l         Display all entries for KEY");
    eprintln!("-a VAL     Append VAL to entries for KEY");
    eprintln!("-r GLOB    Remove entries matching GLOB from KEY");
    eprintln!();
    eprintln!("KEY is always converted to lowercase (ASCII only)");
    ExitCode::from(tool::EX_USAGE)
}

/// getopt-style parsing of `hlna:r:`: options may be grouped, their
/// arguments attached or separate, and mixed with operands until `--`.
fn parse_args<I: IntoIterator<Item = OsString>>(args: I) -> Option<Args> {
    let mut action = Action::One;
    let mut operands = Vec::new();
    let mut args = args.into_iter();
    let mut options_done = false;

    while let Some(arg) = args.next() {
        let bytes = arg.as_bytes();
        if options_done || bytes.len() < 2 || bytes[0] != b'-' {
            operands.push(arg);
            continue;
        }
        if bytes == b"--" {
            options_done = true;
            continue;
        }
        for (i, &opt) in bytes.iter().enumerate().skip(1) {
            match opt {
                b'l' => action = Action::All,
                b'n' => action = Action::New,
                b'a' | b'r' => {
                    let val = if i + 1 < bytes.len() {
                        bytes[i + 1..].to_vec()
                    } else {
                        args.next()?.as_bytes().to_vec()
                    };
                    action = if opt == b'a' {
                        Action::Add(val)
                    } else {
                        Action::Del(val)
                    };
                    break;
                }
                _ => return None,
            }
        }
    }

    let mut operands = operands.into_iter();
    let filename = PathBuf::from(operands.next()?);
    let key = match action {
        Action::New => Vec::new(),
        _ => operands.next()?.as_bytes().to_ascii_lowercase(),
    };
    if operands.next().is_some() {
        return None;
    }
    Some(Args {
        action,
        filename,
        key,
    })
}

fn print_value(out: &mut impl Write, value: &[u8]) -> io::Result<()> {
    out.write_all(value)?;
    out.write_all(b"\n")
}

fn choose(filename: &Path, key: &[u8]) -> Result<()> {
    let cdb = CDB::open(filename)?;
    let mut cursor = cdb.cursor();

    cursor.find(key);
    let mut nresults: u32 = 0;
    while cursor.next(None)?.is_some() {
        nresults += 1;
    }
    if nresults == 0 {
        return Ok(());
    }

    // Plain modulo: unless nresults divides 2^32 the lower indices are
    // very slightly favoured.
    let which = rand::thread_rng().gen::<u32>() % nresults;
    debug!(nresults, which, "picking a value");

    cursor.find(key);
    for _ in 0..which {
        cursor.next(None)?;
    }
    let mut val = [0u8; MAX_VALUE];
    if let Some(n) = cursor.next(Some(&mut val[..]))? {
        print_value(&mut io::stdout().lock(), &val[..n])?;
    }
    Ok(())
}

fn list(filename: &Path, key: &[u8]) -> Result<()> {
    let cdb = CDB::open(filename)?;
    let mut cursor = cdb.cursor();
    let mut out = io::stdout().lock();
    let mut val = [0u8; MAX_VALUE];

    cursor.find(key);
    while let Some(n) = cursor.next(Some(&mut val[..]))? {
        print_value(&mut out, &val[..n])?;
    }
    out.flush()?;
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let filename = args.filename.as_path();
    match &args.action {
        Action::One => choose(filename, &args.key),
        Action::All => list(filename, &args.key),
        Action::Add(val) => rewrite::append(filename, &args.key, val).map(|_| ()),
        Action::Del(glob) => rewrite::remove(filename, &args.key, &Glob::new(glob)).map(|_| ()),
        Action::New => rewrite::create(filename),
    }
}

fn main() -> ExitCode {
    tool::init_logging();
    let prog = env::args_os()
        .next()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "factoids".into());

    let args = match parse_args(env::args_os().skip(1)) {
        Some(args) => args,
        None => return usage(&prog),
    };
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => tool::fail(&prog, &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Option<Args> {
        parse_args(args.iter().map(OsString::from))
    }

    #[test]
    fn default_picks_one() {
        let args = parse(&["db.cdb", "Rust"]).unwrap();
        assert_eq!(args.action, Action::One);
        assert_eq!(args.filename, PathBuf::from("db.cdb"));
        assert_eq!(args.key, b"rust");
    }

    #[test]
    fn option_arguments() {
        let args = parse(&["-a", "a value", "db.cdb", "key"]).unwrap();
        assert_eq!(args.action, Action::Add(b"a value".to_vec()));
        let args = parse(&["-rbar*", "db.cdb", "key"]).unwrap();
        assert_eq!(args.action, Action::Del(b"bar*".to_vec()));
        let args = parse(&["db.cdb", "key", "-l"]).unwrap();
        assert_eq!(args.action, Action::All);
    }

    #[test]
    fn grouped_flags() {
        let args = parse(&["-la", "v", "db.cdb", "KEY"]).unwrap();
        assert_eq!(args.action, Action::Add(b"v".to_vec()));
        assert_eq!(args.key, b"key");
    }

    #[test]
    fn new_takes_no_key() {
        assert_eq!(parse(&["-n", "db.cdb"]).unwrap().action, Action::New);
        assert!(parse(&["-n", "db.cdb", "key"]).is_none());
    }

    #[test]
    fn dash_dash_ends_options() {
        let args = parse(&["--", "db.cdb", "-l"]).unwrap();
        assert_eq!(args.action, Action::One);
        assert_eq!(args.key, b"-l");
    }

    #[test]
    fn usage_errors() {
        assert!(parse(&[]).is_none());
        assert!(parse(&["db.cdb"]).is_none());
        assert!(parse(&["-h", "db.cdb", "key"]).is_none());
        assert!(parse(&["-x", "db.cdb", "key"]).is_none());
        assert!(parse(&["db.cdb", "key", "extra"]).is_none());
        assert!(parse(&["db.cdb", "key", "-a"]).is_none());
    }
}
