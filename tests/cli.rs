use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const RECT_SCRIPT: &str = "\
tool rect
down 0 10 10
move 0 60 40
up 0 60 40
";

/// Runs with an empty config home so a user's config never leaks in.
fn overscribe_cmd(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("overscribe").expect("binary exists");
    cmd.env("XDG_CONFIG_HOME", config_home.path());
    cmd
}

#[test]
fn overscribe_help_prints_usage() {
    let temp = TempDir::new().unwrap();
    overscribe_cmd(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Multi-monitor screen annotation overlay",
        ));
}

#[test]
fn script_from_stdin_prints_reports() {
    let temp = TempDir::new().unwrap();
    overscribe_cmd(&temp)
        .args(["--display", "100x100", "--display", "100x100+100+0"])
        .write_stdin(RECT_SCRIPT)
        .assert()
        .success()
        .stdout(predicate::str::contains("surface-0 tool=rect"))
        .stdout(predicate::str::contains("entries=2 index=1 blank=false"))
        .stdout(predicate::str::contains("surface-1 tool=rect"))
        .stdout(predicate::str::contains("entries=1 index=0 blank=true"));
}

#[test]
fn undo_shortcut_on_surface_restores_blank() {
    let temp = TempDir::new().unwrap();
    let script = format!("{RECT_SCRIPT}key 0 Ctrl+Z\n");
    overscribe_cmd(&temp)
        .args(["--display", "100x100"])
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("entries=2 index=0 blank=true"));
}

#[test]
fn script_file_with_bad_line_reports_line_number() {
    let temp = TempDir::new().unwrap();
    let script = temp.path().join("bad.script");
    std::fs::write(&script, "tool pen\nscribble 0 1 1\n").unwrap();

    overscribe_cmd(&temp)
        .args(["--display", "100x100", "--script"])
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2: unknown command 'scribble'"));
}

#[test]
fn missing_script_file_fails() {
    let temp = TempDir::new().unwrap();
    overscribe_cmd(&temp)
        .args(["--script", "/nonexistent/overscribe.script"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open script"));
}

#[test]
fn bad_display_spec_fails() {
    let temp = TempDir::new().unwrap();
    overscribe_cmd(&temp)
        .args(["--display", "wide"])
        .write_stdin("")
        .assert()
        .failure();
}

#[test]
fn dump_dir_receives_one_png_per_surface() {
    let temp = TempDir::new().unwrap();
    let dump = temp.path().join("frames");

    overscribe_cmd(&temp)
        .args(["--display", "80x60", "--display", "80x60+80+0", "--dump-dir"])
        .arg(&dump)
        .write_stdin(RECT_SCRIPT)
        .assert()
        .success();

    assert!(dump.join("surface-0.png").is_file());
    assert!(dump.join("surface-1.png").is_file());
}

#[test]
fn config_file_sets_initial_color() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("custom.toml");
    std::fs::write(
        &config,
        "[drawing]\ndefault_color = \"blue\"\n\n[[displays]]\nid = 0\nwidth = 64\nheight = 64\n",
    )
    .unwrap();

    overscribe_cmd(&temp)
        .arg("--config")
        .arg(&config)
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("surface-0 tool=cursor color=#3b82f6"))
        .stdout(predicate::str::contains("surface-1").not());
}
