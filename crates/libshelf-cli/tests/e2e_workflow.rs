//! End-to-end workflow: analyze a small library tree with a fake `nm`, then
//! query, edit and export the resulting catalog.
#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// A temp dir holding `lib/` (the artifacts), `tables/` (what the fake `nm`
/// prints for each artifact) and the fake `nm` itself.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        fs::create_dir_all(dir.path().join("lib")).expect("lib dir");
        fs::create_dir_all(dir.path().join("tables")).expect("tables dir");

        let nm = dir.path().join("fake-nm");
        fs::write(
            &nm,
            "#!/bin/sh\n\
             for last; do :; done\n\
             cat \"$(dirname \"$0\")/tables/$(basename \"$last\").txt\"\n",
        )
        .expect("write fake nm");
        fs::set_permissions(&nm, fs::Permissions::from_mode(0o755)).expect("chmod");

        let fixture = Self { dir };
        // app -> util -> z, app -> z
        fixture.library(
            "libapp.so",
            "0000000000001000 T main\n                 U util_fn\n                 U compress\n                 U missing_sym\n",
        );
        fixture.library(
            "libutil.a",
            "0000000000000000 T util_fn\n                 U compress\n",
        );
        fixture.library("libz.so", "0000000000002000 T compress\n");
        fixture
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn library(&self, file: &str, table: &str) {
        let contents: &[u8] = if file.ends_with(".a") {
            b"!<arch>\n"
        } else {
            b"\x7fELF\x02\x01\x01"
        };
        fs::write(self.path().join("lib").join(file), contents).expect("write library");
        fs::write(self.path().join("tables").join(format!("{file}.txt")), table)
            .expect("write table");
    }

    fn snapshot(&self) -> PathBuf {
        self.path().join("libshelf.json")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("libshelf"));
        cmd.current_dir(self.path());
        cmd.env("LIBSHELF_NM", self.path().join("fake-nm"));
        cmd.env("LIBSHELF_LOG", "error");
        cmd.env_remove("LIBSHELF_PROJECT");
        cmd.env_remove("FORMAT");
        cmd
    }

    fn analyzed() -> Self {
        let fixture = Self::new();
        fixture.cmd().args(["analyze", "lib"]).assert().success();
        fixture
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(args)
            .arg("--json")
            .output()
            .expect("command should not crash");
        assert!(
            output.status.success(),
            "{args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("valid JSON")
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[test]
fn analyze_writes_snapshot_with_inferred_edges() {
    let fixture = Fixture::analyzed();
    let snapshot: Value =
        serde_json::from_str(&fs::read_to_string(fixture.snapshot()).expect("snapshot written"))
            .expect("valid snapshot");

    let needs = |file: &str| -> Vec<String> {
        snapshot["libraries"]
            .as_array()
            .expect("libraries table")
            .iter()
            .find(|lib| lib["file"] == file)
            .and_then(|lib| lib["needs"].as_array())
            .map(|needs| needs.iter().filter_map(|n| n.as_str().map(str::to_string)).collect())
            .unwrap_or_default()
    };
    assert_eq!(needs("libapp.so"), ["libutil.a", "libz.so"]);
    assert_eq!(needs("libutil.a"), ["libz.so"]);
    assert!(needs("libz.so").is_empty());
}

#[test]
fn reanalyzing_skips_known_libraries() {
    let fixture = Fixture::analyzed();
    let out = fixture.json(&["analyze", "lib"]);
    assert_eq!(out["analyzed"].as_array().map(Vec::len), Some(0));
    assert_eq!(out["skipped"].as_array().map(Vec::len), Some(3));
}

#[test]
fn missing_paths_are_reported_not_fatal() {
    let fixture = Fixture::new();
    let out = fixture.json(&["analyze", "lib/libz.so", "nowhere"]);
    assert_eq!(out["analyzed"][0]["library"], "libz.so");
    assert_eq!(out["missing"][0], "nowhere");
}

#[test]
fn failing_extractor_aborts() {
    let fixture = Fixture::new();
    fs::remove_file(fixture.path().join("tables/libz.so.txt")).expect("remove table");
    fixture
        .cmd()
        .args(["analyze", "lib/libz.so"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
    assert!(!fixture.snapshot().exists());
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[test]
fn sort_prints_link_order() {
    let fixture = Fixture::analyzed();
    fixture
        .cmd()
        .args(["sort", "app"])
        .assert()
        .success()
        .stdout("app, util, z\n");

    fixture
        .cmd()
        .args(["sort", "z", "app", "--no-deps", "--names", "full", "--sep", " "])
        .assert()
        .success()
        .stdout("libapp.so libz.so\n");
}

#[test]
fn sort_skips_unknown_libraries() {
    let fixture = Fixture::analyzed();
    let out = fixture.json(&["sort", "ghost", "util"]);
    assert_eq!(out["libraries"], serde_json::json!(["util", "z"]));
}

#[test]
fn find_reports_definer() {
    let fixture = Fixture::analyzed();
    fixture
        .cmd()
        .args(["find", "compress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("found in library z"));

    fixture
        .cmd()
        .args(["find", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("symbol 'nope' not found"));
}

#[test]
fn dependencies_minimized_and_recursive() {
    let fixture = Fixture::analyzed();
    let out = fixture.json(&["dependencies", "app", "--minimize"]);
    assert_eq!(out[0]["dependencies"], serde_json::json!(["util"]));

    let out = fixture.json(&["dependencies", "app", "-r"]);
    assert_eq!(out[0]["dependencies"], serde_json::json!(["util", "z"]));

    let out = fixture.json(&["dependencies", "ghost"]);
    assert_eq!(out[0]["found"], false);
}

#[test]
fn pending_symbols_are_listed() {
    let fixture = Fixture::analyzed();
    let out = fixture.json(&["symbols", "--undefined"]);
    assert_eq!(out[0]["symbol"], "missing_sym");
    assert_eq!(out[0]["libraries"], serde_json::json!(["app"]));
}

#[test]
fn symbols_of_one_library() {
    let fixture = Fixture::analyzed();
    let out = fixture.json(&["symbols", "--library", "util"]);
    assert_eq!(out, serde_json::json!([{"symbol": "util_fn", "libraries": ["util"]}]));

    let output = fixture
        .cmd()
        .args(["symbols", "--library", "libutil.so", "--json"])
        .output()
        .expect("command should not crash");
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).expect("JSON error");
    assert_eq!(err["error"]["error_code"], "E2001");
}

// ---------------------------------------------------------------------------
// Editing
// ---------------------------------------------------------------------------

#[test]
fn declare_then_forget() {
    let fixture = Fixture::analyzed();
    fixture.library("libplugin.so", "0000000000001000 T plugin_init\n");
    fixture.cmd().args(["analyze", "lib"]).assert().success();

    let out = fixture.json(&["declare", "app", "plugin"]);
    assert_eq!(out["added"], serde_json::json!(["libplugin.so"]));
    let out = fixture.json(&["sort", "app", "--names", "full"]);
    assert_eq!(
        out["libraries"],
        serde_json::json!(["libapp.so", "libplugin.so", "libutil.a", "libz.so"])
    );

    fixture.cmd().args(["forget", "plugin"]).assert().success();
    let out = fixture.json(&["dependencies", "app"]);
    assert_eq!(out[0]["dependencies"], serde_json::json!(["util", "z"]));
}

#[test]
fn forget_with_other_extension_keeps_library() {
    let fixture = Fixture::analyzed();
    let out = fixture.json(&["forget", "libz.a"]);
    assert_eq!(out["removed"], serde_json::json!([]));
    assert_eq!(out["not_found"], serde_json::json!(["libz.a"]));

    let out = fixture.json(&["dependencies", "app"]);
    assert_eq!(out[0]["dependencies"], serde_json::json!(["util", "z"]));
}

#[test]
fn declaring_a_cycle_warns_and_records_the_edge() {
    let fixture = Fixture::analyzed();
    let output = fixture
        .cmd()
        .env("LIBSHELF_LOG", "warn")
        .args(["declare", "z", "app", "util", "--json"])
        .output()
        .expect("command should not crash");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("closes a cycle"), "stderr: {stderr}");

    let out: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(out["added"], serde_json::json!(["libapp.so", "libutil.a"]));
}

#[test]
fn component_can_be_removed() {
    let fixture = Fixture::analyzed();
    fixture
        .cmd()
        .args(["component", "core", "libutil*", "libz*"])
        .assert()
        .success();

    let out = fixture.json(&["component", "core", "--remove"]);
    assert_eq!(out["members"], serde_json::json!(["libutil.a", "libz.so"]));
    fixture
        .cmd()
        .args(["graph", "app", "--show-components"])
        .assert()
        .success()
        .stdout(predicate::str::contains("shape = box").not());
    fixture
        .cmd()
        .args(["component", "core", "--remove"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("component 'core' not defined"));
}

#[test]
fn declaring_for_unknown_library_fails_with_code() {
    let fixture = Fixture::analyzed();
    let output = fixture
        .cmd()
        .args(["declare", "ghost", "z", "--json"])
        .output()
        .expect("command should not crash");
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).expect("JSON error");
    assert_eq!(err["error"]["error_code"], "E2001");
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[test]
fn graph_with_components_draws_boxes() {
    let fixture = Fixture::analyzed();
    fixture
        .cmd()
        .args(["component", "core", "libutil*", "libz*"])
        .assert()
        .success();

    fixture
        .cmd()
        .args(["graph", "app", "--show-components"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("digraph {"))
        .stdout(predicate::str::contains("label = \"core\""))
        .stdout(predicate::str::contains("shape = box"))
        .stdout(predicate::str::contains("libutil.a").not());
}

#[test]
fn graph_json_minimized() {
    let fixture = Fixture::analyzed();
    let out = fixture.json(&["graph", "app", "--minimize"]);
    let edges: Vec<(String, String)> = out["edges"]
        .as_array()
        .expect("edges")
        .iter()
        .map(|e| {
            (
                e["from"].as_str().unwrap_or_default().to_string(),
                e["to"].as_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    assert_eq!(
        edges,
        [
            ("libapp.so".to_string(), "libutil.a".to_string()),
            ("libutil.a".to_string(), "libz.so".to_string()),
        ]
    );
    assert_eq!(out["nodes"][0]["wave"], 0);
}

#[test]
fn cppinfo_renders_conan_template() {
    let fixture = Fixture::analyzed();
    fixture
        .cmd()
        .args(["cppinfo", "app", "--minimize", "--indent", "4"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "from conan import ConanFile\nclass Template(ConanFile):\n    def package_info(self):\n",
        ))
        .stdout(predicate::str::contains(
            "        self.cpp_info.components[\"app\"].libs = [\"app\"]\n        self.cpp_info.components[\"app\"].requires.extend([\n            \"util\",\n        ])\n",
        ));
}

#[test]
fn broken_config_maps_to_config_code() {
    let fixture = Fixture::analyzed();
    fs::write(fixture.path().join("libshelf.toml"), "[output\nnames = ").expect("write config");
    let output = fixture
        .cmd()
        .args(["symbols", "--json"])
        .output()
        .expect("command should not crash");
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).expect("JSON error");
    assert_eq!(err["error"]["error_code"], "E1001");
}

#[test]
fn config_file_sets_name_style() {
    let fixture = Fixture::analyzed();
    fs::write(
        fixture.path().join("libshelf.toml"),
        "[output]\nnames = \"full\"\nseparator = \" \"\n",
    )
    .expect("write config");
    fixture
        .cmd()
        .args(["sort", "app"])
        .assert()
        .success()
        .stdout("libapp.so libutil.a libz.so\n");
}
