//! End-to-end tests of the td-sync command line
//!
//! Every test works on fixtures written to a temporary directory; nothing
//! touches the network.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

fn td_sync() -> Command {
    let mut cmd = Command::cargo_bin("td-sync").expect("binary should build");
    cmd.env_remove("TD_SYNC_STORE").env_remove("TD_SYNC_PANELAPP_URL");
    cmd
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write fixture");
    path
}

/// Store with panel 1 at 1.0 (HGNC:1, HGNC:2) and local panel R5 (HGNC:3)
fn store_fixture(dir: &Path) -> PathBuf {
    let store = json!({
        "version": "1.0.0",
        "updated_at": "2024-05-01T00:00:00+00:00",
        "tables": {
            "panels": [
                {"panel_id": "1", "panel_name": "Panel one", "panel_version": "1.0",
                 "clinical_indication_code": "R1", "status": "current"},
                {"panel_id": "R5", "panel_name": "Local panel", "panel_version": "0.0",
                 "clinical_indication_code": "R5", "status": "current"}
            ],
            "genes": [
                {"hgnc_id": "HGNC:1", "confidence_level": "green"},
                {"hgnc_id": "HGNC:2", "confidence_level": "green"},
                {"hgnc_id": "HGNC:3", "confidence_level": "green"}
            ],
            "panel_gene_links": [
                {"panel_id": "1", "panel_version": "1.0", "hgnc_id": "HGNC:1",
                 "confidence_level": "green", "status": "current"},
                {"panel_id": "1", "panel_version": "1.0", "hgnc_id": "HGNC:2",
                 "confidence_level": "green", "status": "current"},
                {"panel_id": "R5", "panel_version": "0.0", "hgnc_id": "HGNC:3",
                 "confidence_level": "green", "status": "current"}
            ]
        }
    });
    write(dir, "td.json", &store.to_string())
}

/// Registry content of panel 1 at 2.0: HGNC:1 green, HGNC:4 amber, HGNC:5 green
fn registry_fixture(dir: &Path) -> PathBuf {
    let snapshot = json!({
        "fetched_at": "2024-05-02T00:00:00+00:00",
        "definitions": [{
            "id": "1",
            "name": "Panel one",
            "version": "2.0",
            "signed_off": "2024-05-02",
            "genes": [
                {"hgnc_id": "HGNC:1", "confidence_level": "3"},
                {"hgnc_id": "HGNC:4", "confidence_level": "2"},
                {"hgnc_id": "HGNC:5", "confidence_level": "3"}
            ]
        }]
    });
    write(dir, "panelapp.json", &snapshot.to_string())
}

#[test]
fn test_build_writes_sorted_export() {
    let dir = TempDir::new().unwrap();
    let store = store_fixture(dir.path());
    let output = dir.path().join("out_genepanels.tsv");

    td_sync()
        .args(["build", "--store"])
        .arg(&store)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3 rows for 2 panels"))
        .stdout(predicate::str::contains("MD5: "));

    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        content,
        "1\tPanel one\tHGNC:1\n1\tPanel one\tHGNC:2\nR5\tLocal panel\tHGNC:3\n"
    );
}

#[test]
fn test_build_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let store = store_fixture(dir.path());

    let digest = |name: &str| {
        let assert = td_sync()
            .args(["--format", "json", "build", "--store"])
            .arg(&store)
            .arg("--output")
            .arg(dir.path().join(name))
            .assert()
            .success();
        let out: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
        out["md5"].as_str().unwrap().to_string()
    };

    assert_eq!(digest("a.tsv"), digest("b.tsv"));
}

#[test]
fn test_build_rejects_panel_without_genes() {
    let dir = TempDir::new().unwrap();
    let store = json!({
        "version": "1.0.0",
        "updated_at": "",
        "tables": {
            "panels": [{"panel_id": "7", "panel_name": "Empty", "panel_version": "1.0"}]
        }
    });
    let store = write(dir.path(), "td.json", &store.to_string());

    td_sync()
        .args(["build", "--store"])
        .arg(&store)
        .arg("--output")
        .arg(dir.path().join("out.tsv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no current genes"));
}

#[test]
fn test_compare_reports_gene_swap() {
    let dir = TempDir::new().unwrap();
    let previous = write(dir.path(), "prev.tsv", "P1\tPanel\tHGNC:1\n");
    let new = write(dir.path(), "new.tsv", "P1\tPanel\tHGNC:2\n");

    td_sync()
        .arg("compare")
        .arg(&previous)
        .arg(&new)
        .assert()
        .success()
        .stdout(predicate::str::contains("P1\tHGNC:1\tmissing_right"))
        .stdout(predicate::str::contains("P1\tHGNC:2\tmissing_left"));

    td_sync()
        .arg("compare")
        .arg(&previous)
        .arg(&new)
        .arg("--fail-on-diff")
        .assert()
        .failure();

    td_sync()
        .arg("compare")
        .arg(&previous)
        .arg(&previous)
        .assert()
        .success()
        .stdout(predicate::str::contains("No differences."));
}

#[test]
fn test_check_transcripts_blocks_missing_gene() {
    let dir = TempDir::new().unwrap();
    let export = write(dir.path(), "genepanels.tsv", "P1\tPanel\tHGNC:1\nP1\tPanel\tHGNC:9\n");
    let g2t = write(
        dir.path(),
        "g2t.tsv",
        "HGNC:1\tNM_000001.1\tclinical_transcript\tTrue\nHGNC:9\tNM_000009.1\tnon_clinical_transcript\tFalse\n",
    );

    td_sync()
        .arg("check-transcripts")
        .arg(&export)
        .arg(&g2t)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Genes missing: 1"))
        .stdout(predicate::str::contains("HGNC:9"))
        .stderr(predicate::str::contains("cannot be promoted"));
}

#[test]
fn test_check_transcripts_passes_full_coverage() {
    let dir = TempDir::new().unwrap();
    let export = write(dir.path(), "genepanels.tsv", "P1\tPanel\tHGNC:1\n");
    let g2t = write(dir.path(), "g2t.tsv", "HGNC:1\tNM_000001.1\tclinical_transcript\tTrue\n");

    td_sync()
        .args(["--format", "json", "check-transcripts"])
        .arg(&export)
        .arg(&g2t)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"covered\": 1"));
}

#[test]
fn test_plan_dry_run_then_apply() {
    let dir = TempDir::new().unwrap();
    let store = store_fixture(dir.path());
    let registry = registry_fixture(dir.path());
    let before = std::fs::read_to_string(&store).unwrap();

    td_sync()
        .args(["plan", "--store"])
        .arg(&store)
        .arg("--registry-snapshot")
        .arg(&registry)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"))
        .stdout(predicate::str::contains("1.0 -> 2.0"));
    assert_eq!(std::fs::read_to_string(&store).unwrap(), before);

    td_sync()
        .args(["plan", "--no-dry-run", "--store"])
        .arg(&store)
        .arg("--registry-snapshot")
        .arg(&registry)
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied"));

    let after = std::fs::read_to_string(&store).unwrap();
    assert!(after.contains("\"2.0\""));
    assert!(after.contains("HGNC:5"));
    assert!(!after.contains("HGNC:4"));

    td_sync()
        .args(["plan", "--store"])
        .arg(&store)
        .arg("--registry-snapshot")
        .arg(&registry)
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date (database 2.0, registry 2.0)"));
}

#[test]
fn test_plan_min_confidence_and_changes_csv() {
    let dir = TempDir::new().unwrap();
    let store = store_fixture(dir.path());
    let registry = registry_fixture(dir.path());
    let changes = dir.path().join("changes.csv");

    td_sync()
        .args(["plan", "--min-confidence", "amber", "--store"])
        .arg(&store)
        .arg("--registry-snapshot")
        .arg(&registry)
        .arg("--changes")
        .arg(&changes)
        .assert()
        .success();

    let csv = std::fs::read_to_string(&changes).unwrap();
    assert!(csv.starts_with("panel_id,operation,table,panel_version,hgnc_id,detail"));
    assert!(csv.contains("1,upsert_link,panel_gene_links,2.0,HGNC:4,added (amber)"));
    assert!(csv.contains("1,retire_link,panel_gene_links,1.0,HGNC:2,dropped (green)"));
}

#[test]
fn test_plan_saves_snapshot() {
    let dir = TempDir::new().unwrap();
    let store = store_fixture(dir.path());
    let registry = registry_fixture(dir.path());
    let saved = dir.path().join("saved.json");

    td_sync()
        .args(["plan", "--store"])
        .arg(&store)
        .arg("--registry-snapshot")
        .arg(&registry)
        .arg("--save-snapshot")
        .arg(&saved)
        .assert()
        .success();

    let content: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&saved).unwrap()).unwrap();
    assert_eq!(content["definitions"][0]["version"], "2.0");
    // The local panel is never sent to the registry
    assert_eq!(content["failures"].as_array().unwrap().len(), 0);
}

#[test]
fn test_check_db_reports_orphans() {
    let dir = TempDir::new().unwrap();
    let clean = store_fixture(dir.path());

    td_sync()
        .args(["check-db", "--strict", "--store"])
        .arg(&clean)
        .assert()
        .success()
        .stdout(predicate::str::contains("No problems found."));

    let broken = json!({
        "version": "1.0.0",
        "updated_at": "",
        "tables": {
            "panels": [{"panel_id": "1", "panel_name": "One", "panel_version": "1.0"}],
            "panel_gene_links": [
                {"panel_id": "1", "panel_version": "1.0", "hgnc_id": "HGNC:1"},
                {"panel_id": "2", "panel_version": "1.0", "hgnc_id": "HGNC:1"}
            ]
        }
    });
    let broken = write(dir.path(), "broken.json", &broken.to_string());

    td_sync()
        .args(["check-db", "--strict", "--store"])
        .arg(&broken)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Links without a panel row"));
}

#[test]
fn test_store_from_environment() {
    let dir = TempDir::new().unwrap();
    let store = store_fixture(dir.path());

    td_sync()
        .env("TD_SYNC_STORE", &store)
        .arg("check-db")
        .assert()
        .success();
}

#[test]
fn test_validate_spreadsheet() {
    let dir = TempDir::new().unwrap();
    let store = store_fixture(dir.path());
    let agreeing = write(
        dir.path(),
        "td.csv",
        "Clinical indication ID,Clinical indication,Target genes\n\
         R1,Panel one,Panel one (1)\n\
         R5,Local panel,HGNC:3\n",
    );

    td_sync()
        .arg("validate-spreadsheet")
        .arg(&agreeing)
        .arg("--store")
        .arg(&store)
        .assert()
        .success()
        .stdout(predicate::str::contains("Spreadsheet and database agree."));

    let renamed = write(
        dir.path(),
        "renamed.csv",
        "Clinical indication ID,Clinical indication,Target genes\n\
         R1,Panel one,Panel one (1)\n\
         R5,Renamed panel,HGNC:3;HGNC:6\n",
    );

    td_sync()
        .arg("validate-spreadsheet")
        .arg(&renamed)
        .arg("--store")
        .arg(&store)
        .assert()
        .success()
        .stdout(predicate::str::contains("R5 name: 'Renamed panel' vs 'Local panel'"))
        .stdout(predicate::str::contains("R5 HGNC:6 missing_right"));
}

#[test]
fn test_missing_store_is_an_error() {
    let dir = TempDir::new().unwrap();

    td_sync()
        .args(["check-db", "--store"])
        .arg(dir.path().join("absent.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read store"));
}
