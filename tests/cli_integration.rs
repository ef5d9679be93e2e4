//! CLI integration tests for harbour-layout.
//!
//! These tests drive the binary end to end: schema lookup, layout output,
//! fingerprints and scoped writes.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const X64: &str = "x86_64-unknown-linux-gnu";

const SCENARIO: &str = r#"
[[group]]
name = "tagged"
kind = "struct"
fields = [
  { name = "a", type = "int32_t" },
  { name = "b", type = "int32_t" },
  { name = "u", group = "either" },
]
"#;

const EITHER: &str = r#"
[[group]]
name = "either"
kind = "union"
fields = [
  { name = "u32", type = "int32_t" },
  { name = "u16", type = "int16_t", count = 2 },
]
"#;

/// Get the harbour-layout binary command, isolated from the user's config.
fn harbour_layout(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("harbour-layout").unwrap();
    cmd.env("HOME", home)
        .env_remove("HARBOUR_LAYOUT_TARGET")
        .current_dir(home);
    cmd
}

/// Create a temporary directory for test schemas.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

fn write_scenario(dir: &Path) -> String {
    let path = dir.join("tagged.toml");
    fs::write(&path, format!("{}{}", EITHER, SCENARIO)).unwrap();
    path.display().to_string()
}

// ============================================================================
// harbour-layout show
// ============================================================================

#[test]
fn test_show_builtin_harfbuzz() {
    let tmp = temp_dir();

    harbour_layout(tmp.path())
        .args(["show", "builtin:harfbuzz", "--group", "hb_glyph_info_t", "--target", X64])
        .assert()
        .success()
        .stdout(predicate::str::contains("struct hb_glyph_info_t (size 20, align 4)"))
        .stdout(predicate::str::contains("var1.u16"));
}

#[test]
fn test_show_json() {
    let tmp = temp_dir();
    let schema = write_scenario(tmp.path());

    let output = harbour_layout(tmp.path())
        .args(["show", &schema, "--group", "tagged", "--target", X64, "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let group = &json["groups"][0];
    assert_eq!(group["name"], "tagged");
    assert_eq!(group["size"], 12);

    let fields = group["fields"].as_array().unwrap();
    let u16_entry = fields.iter().find(|f| f["path"] == "u.u16").unwrap();
    assert_eq!(u16_entry["offset"], 8);
    assert_eq!(u16_entry["type"], "i16[2]");
}

#[test]
fn test_show_i686_target() {
    let tmp = temp_dir();

    harbour_layout(tmp.path())
        .args([
            "show",
            "builtin:zimg",
            "--group",
            "zimg_image_format",
            "--target",
            "i686-unknown-linux-gnu",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("(size 92, align 4)"));
}

#[test]
fn test_show_unknown_group() {
    let tmp = temp_dir();

    harbour_layout(tmp.path())
        .args(["show", "builtin:harfbuzz", "--group", "hb_font_t"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no group `hb_font_t`"));
}

#[test]
fn test_show_missing_schema() {
    let tmp = temp_dir();

    harbour_layout(tmp.path())
        .args(["show", "nothing-here"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("schema `nothing-here` not found"));
}

#[test]
fn test_show_reports_layout_errors() {
    let tmp = temp_dir();
    let path = tmp.path().join("bad.toml");
    fs::write(
        &path,
        "[[group]]\nname = \"g\"\nfields = [{ name = \"x\", type = \"long double\" }]\n",
    )
    .unwrap();

    harbour_layout(tmp.path())
        .args(["show", path.to_str().unwrap(), "--target", X64])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown type `long double`"));
}

#[test]
fn test_show_reports_syntax_errors() {
    let tmp = temp_dir();
    let path = tmp.path().join("broken.toml");
    fs::write(&path, "[[group]\nname = \"g\"\n").unwrap();

    harbour_layout(tmp.path())
        .args(["show", path.to_str().unwrap(), "--no-color"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid schema"));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_project_config_target_and_schema_paths() {
    let tmp = temp_dir();
    let schemas = tmp.path().join("layouts");
    fs::create_dir_all(&schemas).unwrap();
    fs::write(
        schemas.join("wide.toml"),
        "[[group]]\nname = \"wide\"\nfields = [\n  { name = \"c\", type = \"char\" },\n  { name = \"d\", type = \"double\" },\n]\n",
    )
    .unwrap();

    let config_dir = tmp.path().join(".harbour-layout");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        "target = \"i686-unknown-linux-gnu\"\nschema_paths = [\"layouts\"]\n",
    )
    .unwrap();

    // Config target applies when neither CLI nor schema names one
    harbour_layout(tmp.path())
        .args(["show", "wide"])
        .assert()
        .success()
        .stdout(predicate::str::contains("struct wide (size 12, align 4)"));

    // The command line wins over config
    harbour_layout(tmp.path())
        .args(["show", "wide", "--target", X64])
        .assert()
        .success()
        .stdout(predicate::str::contains("struct wide (size 16, align 8)"));

    // So does the environment, through the same flag
    harbour_layout(tmp.path())
        .env("HARBOUR_LAYOUT_TARGET", X64)
        .args(["show", "wide"])
        .assert()
        .success()
        .stdout(predicate::str::contains("struct wide (size 16, align 8)"));
}

#[test]
fn test_invalid_target() {
    let tmp = temp_dir();

    harbour_layout(tmp.path())
        .args(["show", "builtin:zimg", "--target", "bogus", "--no-color"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid target triple `bogus`"));
}

#[test]
fn test_invalid_project_config_warns_and_continues() {
    let tmp = temp_dir();
    let config_dir = tmp.path().join(".harbour-layout");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "target = [\n").unwrap();

    harbour_layout(tmp.path())
        .args(["show", "builtin:harfbuzz", "--group", "hb_glyph_info_t", "--target", X64])
        .assert()
        .success()
        .stdout(predicate::str::contains("struct hb_glyph_info_t (size 20, align 4)"))
        .stderr(predicate::str::contains("warning: ignoring invalid config file"))
        .stderr(predicate::str::contains(".harbour-layout/config.toml"));
}

// ============================================================================
// harbour-layout fingerprint
// ============================================================================

#[test]
fn test_fingerprint_is_stable_and_target_sensitive() {
    let tmp = temp_dir();
    let run = |target: &str| {
        let output = harbour_layout(tmp.path())
            .args(["fingerprint", "builtin:zimg", "--group", "zimg_image_format", "--target", target])
            .output()
            .unwrap();
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap()
    };

    let first = run(X64);
    let second = run(X64);
    let i686 = run("i686-unknown-linux-gnu");

    assert_eq!(first, second);
    assert_ne!(first, i686);
    assert!(first.trim_end().ends_with("  zimg_image_format"));
    assert_eq!(first.split_whitespace().next().unwrap().len(), 64);
}

// ============================================================================
// harbour-layout poke
// ============================================================================

#[test]
fn test_poke_writes_union_view() {
    let tmp = temp_dir();
    let schema = write_scenario(tmp.path());

    harbour_layout(tmp.path())
        .args([
            "poke", &schema, "--group", "tagged", "--target", X64,
            "--set", "a=-1",
            "--set", "u.u32=0x00020001",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("a     = -1"))
        .stdout(predicate::str::contains("u.u32 = 131073"))
        .stdout(predicate::str::contains("00000000  ff ff ff ff"));
}

#[test]
fn test_poke_indexed_json() {
    let tmp = temp_dir();
    let schema = write_scenario(tmp.path());

    let output = harbour_layout(tmp.path())
        .args([
            "poke", &schema, "--group", "tagged", "--target", X64,
            "--count", "3", "--index", "2", "--set", "b=7", "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["count"], 3);
    assert_eq!(json["index"], 2);
    assert_eq!(json["fields"]["b"], 7);
    assert_eq!(json["fields"]["u.u16"], serde_json::json!([0, 0]));
    assert_eq!(json["bytes"], "000000000700000000000000");
    assert_eq!(json["sha256"].as_str().unwrap().len(), 64);
}

#[test]
fn test_poke_index_out_of_range() {
    let tmp = temp_dir();
    let schema = write_scenario(tmp.path());

    harbour_layout(tmp.path())
        .args(["poke", &schema, "--group", "tagged", "--target", X64, "--count", "3", "--index", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("element index 3 out of range for 3 elements"));
}

#[test]
fn test_poke_negative_count() {
    let tmp = temp_dir();
    let schema = write_scenario(tmp.path());

    harbour_layout(tmp.path())
        .args(["poke", &schema, "--group", "tagged", "--count", "-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid argument"));
}

#[test]
fn test_poke_bad_assignment() {
    let tmp = temp_dir();
    let schema = write_scenario(tmp.path());

    harbour_layout(tmp.path())
        .args(["poke", &schema, "--group", "tagged", "--set", "a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected PATH=VALUE"));

    harbour_layout(tmp.path())
        .args(["poke", &schema, "--group", "tagged", "--set", "nope=1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no field `nope`"));
}

// ============================================================================
// harbour-layout builtins / completions
// ============================================================================

#[test]
fn test_builtins_lists_schemas() {
    let tmp = temp_dir();

    harbour_layout(tmp.path())
        .arg("builtins")
        .assert()
        .success()
        .stdout(predicate::str::contains("builtin:harfbuzz"))
        .stdout(predicate::str::contains("zimg_graph_builder_params"));
}

#[test]
fn test_completions_bash() {
    let tmp = temp_dir();

    harbour_layout(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("harbour-layout"));
}
