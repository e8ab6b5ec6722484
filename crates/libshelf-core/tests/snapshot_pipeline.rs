//! Analyze → save → load keeps every table of the catalog.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use libshelf_core::analyze::analyze_paths;
use libshelf_core::extract::{ExtractError, SymbolSource, SymbolTable};
use libshelf_core::snapshot::{SnapshotError, SnapshotFile};
use libshelf_core::{AnalysisOptions, Catalog};

struct Tables(HashMap<&'static str, SymbolTable>);

impl SymbolSource for Tables {
    fn symbols(&self, path: &Path) -> Result<SymbolTable, ExtractError> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        self.0.get(name).cloned().ok_or_else(|| ExtractError::Unsupported {
            path: path.to_path_buf(),
        })
    }
}

fn table(defined: &[&str], undefined: &[&str]) -> SymbolTable {
    SymbolTable {
        defined: defined.iter().map(ToString::to_string).collect(),
        undefined: undefined.iter().map(ToString::to_string).collect(),
    }
}

fn analyzed_catalog(dir: &Path) -> Catalog {
    let tables = Tables(HashMap::from([
        ("libapp.so", table(&["main"], &["inflate", "sqrt", "unknown_fn"])),
        ("libz.so", table(&["inflate"], &["sqrt"])),
        ("libm.so.6", table(&["sqrt"], &[])),
    ]));
    let files: Vec<PathBuf> = ["libapp.so", "libz.so"]
        .iter()
        .map(|f| dir.join(f))
        .collect();
    for file in &files {
        std::fs::write(file, b"").expect("write artifact");
    }
    let libm = dir.join("libm.so.6");
    std::fs::write(&libm, b"").expect("write artifact");

    let mut catalog = Catalog::new();
    analyze_paths(
        &mut catalog,
        &tables,
        &files,
        &AnalysisOptions {
            system: false,
            package: Some("zstack".into()),
        },
    )
    .expect("analysis");
    analyze_paths(
        &mut catalog,
        &tables,
        &[libm],
        &AnalysisOptions {
            system: true,
            package: None,
        },
    )
    .expect("analysis");
    catalog.set_component_members("runtime", ["libapp.so", "libz.so"]);
    catalog
}

#[test]
fn snapshot_round_trip_preserves_catalog() {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog = analyzed_catalog(dir.path());
    let snapshot = SnapshotFile::new(dir.path().join("state").join("libshelf.json"));
    snapshot.save(&catalog).expect("save");

    let loaded = snapshot.load().expect("load");
    assert_eq!(loaded.library_files(), catalog.library_files());
    for file in catalog.library_files() {
        assert_eq!(
            loaded.dependencies_of(&file).expect("known"),
            catalog.dependencies_of(&file).expect("known"),
            "edges of {file}"
        );
    }
    assert_eq!(loaded.definer_of("sqrt"), Some("libm.so.6"));
    assert_eq!(
        loaded.symbols().pending_for("unknown_fn").into_iter().collect::<Vec<_>>(),
        ["libapp.so"]
    );
    assert!(loaded.get_library("m").is_some_and(|lib| lib.system));
    assert_eq!(loaded.package_libraries("zstack"), ["libapp.so", "libz.so"]);
    assert_eq!(loaded.owner_of("libz.so"), Some("runtime"));
}

#[test]
fn saved_snapshot_is_deterministic() {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog = analyzed_catalog(dir.path());
    let first = dir.path().join("a.json");
    let second = dir.path().join("b.json");
    SnapshotFile::new(&first).save(&catalog).expect("save");
    let reloaded = SnapshotFile::new(&first).load().expect("load");
    SnapshotFile::new(&second).save(&reloaded).expect("save");

    assert_eq!(
        std::fs::read_to_string(&first).expect("read"),
        std::fs::read_to_string(&second).expect("read")
    );
}

#[test]
fn corrupt_snapshot_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("libshelf.json");
    std::fs::write(&path, "{ not json").expect("write");
    let err = SnapshotFile::new(&path).load().expect_err("corrupt");
    assert!(matches!(err, SnapshotError::Corrupt { .. }));
    assert_eq!(err.error_code().code(), "E3001");
}
