use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_flag() {
    cargo_bin_cmd!("stencil")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Render placeholder templates"))
        .stdout(predicate::str::contains("--json-source"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("stencil")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("stencil"));
}

#[test]
fn test_requires_a_template() {
    cargo_bin_cmd!("stencil").assert().failure();
}

// ============================================================================
// Rendering Tests
// ============================================================================

#[test]
fn test_renders_env_placeholder() {
    cargo_bin_cmd!("stencil")
        .env("STENCIL_GREETING", "hello world")
        .arg("Say: @{env.STENCIL_GREETING | case_title}")
        .assert()
        .success()
        .stdout("Say: Hello World\n");
}

#[test]
fn test_each_template_on_its_own_line() {
    cargo_bin_cmd!("stencil")
        .env("STENCIL_A", "a")
        .args(["first @{env.STENCIL_A}", "second", "${env.STENCIL_A}"])
        .assert()
        .success()
        .stdout("first a\nsecond\n${env.STENCIL_A}\n");
}

#[test]
fn test_dollar_delimiter() {
    cargo_bin_cmd!("stencil")
        .env("STENCIL_A", "value")
        .args(["--delimiter", "dollar", "${env.STENCIL_A | case_upper}"])
        .assert()
        .success()
        .stdout("VALUE\n");
}

#[test]
fn test_builtin_date_with_time_zone() {
    cargo_bin_cmd!("stencil")
        .args(["--time-zone", "-05:30", "@{builtin.CURR_DATE}"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^\d{4}-\d{2}-\d{2}\n$").unwrap());
}

#[test]
fn test_apostrophe_in_bare_argument() {
    cargo_bin_cmd!("stencil")
        .env("STENCIL_EMPTY", "")
        .arg("@{env.STENCIL_EMPTY | or(O'Brien)} done")
        .assert()
        .success()
        .stdout("O'Brien done\n");
}

#[test]
fn test_json_source_flag_overrides_malformed_environment() {
    cargo_bin_cmd!("stencil")
        .env("CONTENT_JSON", "not a url")
        .args(["--json-source", "https://example.com/x.json", "hi"])
        .assert()
        .success()
        .stdout("hi\n");
}

#[test]
fn test_malformed_content_json_without_flag_is_rejected() {
    cargo_bin_cmd!("stencil")
        .env("CONTENT_JSON", "not a url")
        .arg("hi")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid environment"));
}

#[cfg(unix)]
#[test]
fn test_non_utf8_environment_is_skipped() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    cargo_bin_cmd!("stencil")
        .env("STENCIL_BAD", OsStr::from_bytes(b"\xff"))
        .env("STENCIL_A", "fine")
        .arg("@{env.STENCIL_A}")
        .assert()
        .success()
        .stdout("fine\n");
}

#[test]
fn test_template_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("title.txt");
    std::fs::write(&path, "@{env.STENCIL_TITLE | max_length(9, '...')}\n").unwrap();

    cargo_bin_cmd!("stencil")
        .env("STENCIL_TITLE", "A rather long title")
        .arg("--file")
        .arg(&path)
        .assert()
        .success()
        .stdout("A...\n");
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_missing_variable_exits_with_error() {
    cargo_bin_cmd!("stencil")
        .env_remove("STENCIL_NOT_SET")
        .args(["ok", "@{env.STENCIL_NOT_SET}"])
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains(
            "error: environment variable 'STENCIL_NOT_SET' is not set",
        ));
}

#[test]
fn test_json_without_source_exits_with_error() {
    cargo_bin_cmd!("stencil")
        .env_remove("CONTENT_JSON")
        .arg("@{json.title}")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no JSON source is configured"));
}

#[test]
fn test_invalid_delimiter_is_rejected() {
    cargo_bin_cmd!("stencil")
        .args(["--delimiter", "percent", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("percent"));
}
