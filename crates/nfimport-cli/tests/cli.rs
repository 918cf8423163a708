use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../nfimport-core/tests/fixtures")
        .join(name)
}

/// Binary running inside `dir`, with its config directory there too.
fn nfimport(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("nfimport").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("config"));
    cmd
}

fn workspace_with_receipt() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::copy(fixture("loja_exemplo.xml"), dir.path().join("receipt.xml")).unwrap();
    dir
}

#[test]
fn help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();

    nfimport(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("xml"))
        .stdout(predicate::str::contains("restore"))
        .stdout(predicate::str::contains("orphans"));
}

#[test]
fn xml_import_writes_store_and_output() {
    let dir = workspace_with_receipt();

    nfimport(&dir)
        .args(["xml", "receipt.xml", "--output-dir", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 of 1 files"));

    let rendered = fs::read_to_string(dir.path().join("out/receipt.json")).unwrap();
    assert!(rendered.contains("LOJA EXEMPLO LTDA"));

    let store = fs::read_to_string(dir.path().join("data/fiscal_documents.json")).unwrap();
    assert!(store.contains("3326 0210 6976 9700 0660 6510 7000 3680 6612 6649 4182"));
}

#[test]
fn xml_import_twice_is_rejected() {
    let dir = workspace_with_receipt();

    nfimport(&dir).args(["xml", "receipt.xml"]).assert().success();

    nfimport(&dir)
        .args(["xml", "receipt.xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already imported"));
}

#[test]
fn xml_import_continues_past_failures() {
    let dir = workspace_with_receipt();
    fs::write(dir.path().join("broken.xml"), "<nfeProc><NFe>").unwrap();

    nfimport(&dir)
        .args(["xml", "*.xml", "--continue-on-error"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 of 2 files"))
        .stdout(predicate::str::contains("broken.xml"));
}

#[test]
fn xml_without_matches_fails() {
    let dir = tempfile::tempdir().unwrap();

    nfimport(&dir)
        .args(["xml", "*.xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn orphans_lists_items_without_code() {
    let dir = workspace_with_receipt();

    nfimport(&dir).args(["xml", "receipt.xml"]).assert().success();

    nfimport(&dir)
        .arg("orphans")
        .assert()
        .success()
        .stdout(predicate::str::contains("ARROZ TIPO 1 KG"))
        .stdout(predicate::str::contains("FEIJAO").not());
}

#[test]
fn mapping_table_resolves_items_on_import() {
    let dir = workspace_with_receipt();
    fs::create_dir_all(dir.path().join("data")).unwrap();
    fs::write(
        dir.path().join("data/product_mappings.json"),
        r#"[{"raw_description": "ARROZ TIPO 1 KG", "seller_name": "LOJA EXEMPLO LTDA", "product_code": "7890000000001"}]"#,
    )
    .unwrap();

    nfimport(&dir).args(["xml", "receipt.xml"]).assert().success();

    nfimport(&dir)
        .arg("orphans")
        .assert()
        .success()
        .stdout(predicate::str::contains("Every stored item has a product code"));
}

#[test]
fn restore_with_empty_log_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();

    nfimport(&dir)
        .arg("restore")
        .assert()
        .success()
        .stdout(predicate::str::contains("No URLs"));
}

#[test]
fn url_rejects_non_http_input() {
    let dir = tempfile::tempdir().unwrap();

    nfimport(&dir)
        .args(["url", "receipt.xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not an http(s) URL"));
}

#[test]
fn config_init_set_and_get() {
    let dir = tempfile::tempdir().unwrap();

    nfimport(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"));

    nfimport(&dir).args(["config", "init"]).assert().success();
    assert!(dir.path().join("config/nfimport/config.json").exists());

    nfimport(&dir)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    nfimport(&dir)
        .args(["config", "set", "restore.cooldown_secs", "1"])
        .assert()
        .success();

    nfimport(&dir)
        .args(["config", "get", "restore.cooldown_secs"])
        .assert()
        .success()
        .stdout(predicate::str::diff("1\n"));

    nfimport(&dir)
        .args(["config", "set", "restore.cooldown_secs", "soon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value"));
}
