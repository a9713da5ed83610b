use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

const FACTOIDS: &str = env!("CARGO_BIN_EXE_factoids");
const CDBMAKE: &str = env!("CARGO_BIN_EXE_cdbmake");
const CDBDUMP: &str = env!("CARGO_BIN_EXE_cdbdump");

fn factoids(args: &[&str]) -> Output {
    Command::new(FACTOIDS).args(args).output().unwrap()
}

fn lines(out: &Output) -> Vec<&[u8]> {
    let mut lines: Vec<&[u8]> = out.stdout.split(|&b| b == b'\n').collect();
    assert_eq!(lines.pop(), Some(&b""[..]), "output ends with a newline");
    lines
}

fn code(out: &Output) -> i32 {
    out.status.code().unwrap()
}

#[test]
fn missing_database_is_noinput() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("missing.cdb");
    let db = db.to_str().unwrap();

    assert_eq!(code(&factoids(&[db, "key"])), 66);
    assert_eq!(code(&factoids(&["-l", db, "key"])), 66);
    assert_eq!(code(&factoids(&["-a", "value", db, "key"])), 66);
    assert_eq!(code(&factoids(&["-r", "*", db, "key"])), 66);
    assert!(!Path::new(db).exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn bad_usage() {
    assert_eq!(code(&factoids(&[])), 64);
    assert_eq!(code(&factoids(&["db.cdb"])), 64);
    assert_eq!(code(&factoids(&["-x", "db.cdb", "key"])), 64);
    assert_eq!(code(&factoids(&["-n", "db.cdb", "key"])), 64);
    assert_eq!(code(&factoids(&["db.cdb", "key", "extra"])), 64);
    assert!(!Path::new("db.cdb").exists());
}

#[test]
fn add_list_remove_pick() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("factoids.cdb");
    let db = db.to_str().unwrap();
    let long = "x".repeat(9000);

    let out = factoids(&["-n", db]);
    assert_eq!(code(&out), 0);
    assert_eq!(fs::metadata(db).unwrap().len(), 2048);

    // KEY is lowercased for every action.
    assert_eq!(code(&factoids(&["-a", "bar1", db, "Foo"])), 0);
    assert_eq!(code(&factoids(&["-a", "", db, "foo"])), 0);
    assert_eq!(code(&factoids(&["-a", long.as_str(), db, "FOO"])), 0);
    assert_eq!(code(&factoids(&["-a", "other", db, "baz"])), 0);

    let out = factoids(&["-l", db, "FOO"]);
    assert_eq!(code(&out), 0);
    assert_eq!(
        lines(&out),
        vec![&b"bar1"[..], &b""[..], &long.as_bytes()[..8192]]
    );

    // No values is not an error.
    let out = factoids(&[db, "nope"]);
    assert_eq!(code(&out), 0);
    assert!(out.stdout.is_empty());
    let out = factoids(&["-l", db, "nope"]);
    assert_eq!(code(&out), 0);
    assert!(out.stdout.is_empty());

    assert_eq!(code(&factoids(&["-r", "bar*", db, "FOO"])), 0);
    let out = factoids(&["-l", db, "foo"]);
    assert_eq!(lines(&out), vec![&b""[..], &long.as_bytes()[..8192]]);
    assert_eq!(lines(&factoids(&["-l", db, "baz"])), vec![&b"other"[..]]);

    for _ in 0..8 {
        let out = factoids(&[db, "Foo"]);
        assert_eq!(code(&out), 0);
        let picked = lines(&out);
        assert_eq!(picked.len(), 1);
        assert!(picked[0].is_empty() || picked[0] == &long.as_bytes()[..8192]);
    }

    // Only the database itself is left behind.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn cdbmake_then_cdbdump() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("text.cdb");
    let input: &[u8] = b"+3,5:one->Hello\n+3,7:two->Goodbye\n+3,8:one->, World!\n+0,0:->\n\n";

    let mut make = Command::new(CDBMAKE)
        .arg(&db)
        .stdin(Stdio::piped())
        .spawn()
        .unwrap();
    make.stdin.take().unwrap().write_all(input).unwrap();
    assert!(make.wait().unwrap().success());
    assert!(!dir.path().join("text.cdb.tmp").exists());

    let out = Command::new(CDBDUMP).arg(&db).output().unwrap();
    assert!(out.status.success());
    assert_eq!(out.stdout, input);

    let out = Command::new(CDBDUMP).arg(&db).arg("extra").output().unwrap();
    assert_eq!(out.status.code(), Some(64));
    let out = Command::new(CDBDUMP)
        .arg(dir.path().join("missing.cdb"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(66));
}

#[test]
fn cdbmake_rejects_bad_input() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("bad.cdb");

    let mut make = Command::new(CDBMAKE)
        .arg(&db)
        .stdin(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    make.stdin.take().unwrap().write_all(b"+3,5:one=>Hello\n\n").unwrap();
    assert_eq!(make.wait().unwrap().code(), Some(65));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
