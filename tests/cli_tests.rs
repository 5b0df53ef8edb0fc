//! Tests driving the `gf` binary

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::{tempdir, TempDir};

fn gf(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gf"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("run gf")
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_owned)
        .collect()
}

/// root/{a.txt, sub/{a.txt, b.md}}
fn scenario_tree() -> TempDir {
    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::write(root.join("a.txt"), b"").unwrap();
    fs::write(root.join("sub/a.txt"), b"").unwrap();
    fs::write(root.join("sub/b.md"), b"").unwrap();
    dir
}

#[test]
fn test_relative_root_output() {
    let dir = scenario_tree();
    let output = gf(dir.path(), &[r"\.txt$", "root"]);

    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout_lines(&output), vec!["root/a.txt", "root/sub/a.txt"]);
}

#[test]
fn test_default_root_has_no_dot_prefix() {
    let dir = scenario_tree();
    let output = gf(&dir.path().join("root"), &[r"\.md$"]);

    assert!(output.status.success());
    assert_eq!(stdout_lines(&output), vec!["sub/b.md"]);
}

#[test]
fn test_invalid_pattern_exits_with_usage_code() {
    let dir = scenario_tree();
    let output = gf(dir.path(), &["(", "root"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR"));
}

#[test]
fn test_missing_pattern_exits_with_usage_code() {
    let dir = tempdir().unwrap();
    let output = gf(dir.path(), &[]);

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_zero_budget_still_requires_pattern() {
    // Argument parsing runs before the budget is looked at
    let dir = tempdir().unwrap();
    let output = gf(dir.path(), &["-n", "0"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_zero_budget_exits_immediately() {
    let dir = scenario_tree();
    // The pattern is never compiled
    let output = gf(dir.path(), &["-n", "0", "(", "root"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_budget_of_one() {
    let dir = scenario_tree();
    let output = gf(dir.path(), &["-n", "1", r"\.txt$", "root"]);

    assert!(output.status.success());
    assert_eq!(stdout_lines(&output), vec!["root/a.txt"]);
}

#[test]
fn test_quiet_suppresses_diagnostics() {
    let dir = scenario_tree();

    let loud = gf(dir.path(), &["x", "missing"]);
    assert!(loud.status.success());
    assert!(String::from_utf8_lossy(&loud.stderr).starts_with("ERROR: "));

    let quiet = gf(dir.path(), &["-q", "x", "missing"]);
    assert!(quiet.status.success());
    assert!(quiet.stderr.is_empty());
}

#[test]
fn test_full_path_output() {
    let dir = scenario_tree();
    let output = gf(dir.path(), &["-p", r"\.md$", "root"]);

    let cwd = dir.path().canonicalize().unwrap();
    assert!(output.status.success());
    assert_eq!(
        stdout_lines(&output),
        vec![cwd.join("root/sub/b.md").display().to_string()]
    );
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_names_printed_verbatim() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join(OsStr::from_bytes(b"bad\xffname.txt")), b"").unwrap();

    let output = gf(dir.path(), &[r"\.txt$", "root"]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(output.stdout, b"root/bad\xffname.txt\n");

    let printed = OsStr::from_bytes(output.stdout.strip_suffix(b"\n").unwrap());
    assert!(dir.path().join(printed).exists());
}
