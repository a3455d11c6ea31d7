use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

use lexdump::testing::{build_fixture_index, FixtureDoc};

fn lexdump(index: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lexdump"))
        .arg("--index")
        .arg(index)
        .args(args)
        .env_remove("LEXDUMP_CONFIG")
        .env_remove("LEXDUMP_OUTPUT_DIR")
        .env("RUST_LOG", "error")
        .output()
        .unwrap()
}

fn fixture() -> TempDir {
    let tmp = TempDir::new().unwrap();
    build_fixture_index(
        tmp.path(),
        &[
            FixtureDoc::new("d1").contents("first doc").raw("<p>one</p>"),
            FixtureDoc::new("d2").contents("second doc"),
        ],
    )
    .unwrap();
    tmp
}

#[test]
fn successful_operations_exit_zero() {
    let tmp = fixture();
    let output = lexdump(tmp.path(), &["--convert-docid-to-ordinal", "d2"]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "1\n");
}

#[test]
fn failed_operation_does_not_stop_later_ones() {
    let tmp = fixture();
    let output = lexdump(
        tmp.path(),
        &["--dump-raw-doc", "d2", "--convert-docid-to-ordinal", "d1"],
    );

    // d2 has no raw text; the conversion still runs, the exit status reports the failure
    assert!(!output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "0\n");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("dump-raw-doc"), "{}", stderr);
}

#[test]
fn unreadable_index_aborts_before_any_operation() {
    let tmp = TempDir::new().unwrap();
    let output = lexdump(
        &tmp.path().join("missing"),
        &["--convert-docid-to-ordinal", "d1"],
    );

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}
