use std::path::PathBuf;
use std::process::Command;

fn onsong() -> Command {
    Command::new(env!("CARGO_BIN_EXE_onsong"))
}

fn conformance_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/conformance")
}

#[test]
fn conformance_suite_passes() {
    let output = onsong()
        .args(["--no-color", "test"])
        .arg(conformance_dir())
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{}", stderr);
    assert!(stderr.contains("test result: ok."), "{}", stderr);
}

#[test]
fn category_filter_runs_only_that_category() {
    let output = onsong()
        .args(["--no-color", "test", "--category", "flow"])
        .arg(conformance_dir())
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{}", stderr);
    assert!(stderr.contains("3 passed"), "{}", stderr);
    assert!(!stderr.contains("metadata"), "{}", stderr);
}

#[test]
fn parse_lists_sections_in_play_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.onsong");
    std::fs::write(&path, "Title\nFlow: C V1 C\n\nVerse 1:\nOne\n\nChorus:\nTwo\n").unwrap();

    let output = onsong()
        .args(["parse", "--list-sections"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Chorus\nVerse 1\nChorus\n"
    );
}

#[test]
fn parse_reports_errors_with_trace() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.onsong");
    std::fs::write(&path, "Title\n\nIntro:\n{sot}\ntab\n").unwrap();

    let output = onsong()
        .args(["--no-color", "parse", "--trace"])
        .arg(&path)
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("unterminated tab"), "{}", stderr);
    assert!(stderr.contains("trace:"), "{}", stderr);
    assert!(stderr.contains("Tab at"), "{}", stderr);
}

#[test]
fn parse_prints_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.onsong");
    std::fs::write(&path, "Title\nKey: G\n\nVerse:\n[G]Hi\n").unwrap();

    let output = onsong().args(["parse", "--json"]).arg(&path).output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["metadata"]["key"], "G");
    assert_eq!(value["document"]["declared"][0]["name"], "Verse");
}
