use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use csvexcel::config::{AutoWidthConfig, SheetSelector};
use csvexcel::model::{CellValue, Table, Workbook};
use csvexcel::output::write_workbook;
use csvexcel::parser::{read_sheet, sheet_names};

fn csvexcel() -> Command {
    let mut cmd = Command::cargo_bin("csvexcel").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn union_removes_duplicates_by_default() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.csv", "id,name\n1,Jo\n2,Bo\n");
    let b = write(&dir, "b.csv", "id,name\n2,Bo\n3,Al\n");
    let out = dir.path().join("out.csv");

    csvexcel()
        .arg("union")
        .arg(&a)
        .arg(&b)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));

    assert_eq!(lines(&out), vec!["id,name", "1,Jo", "2,Bo", "3,Al"]);
}

#[test]
fn union_keeps_duplicates_when_asked() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.csv", "id,name\n1,Jo\n");
    let b = write(&dir, "b.csv", "id,name\n1,Jo\n");
    let out = dir.path().join("out.csv");

    csvexcel()
        .args(["union", "--no-dedupe", "-o"])
        .arg(&out)
        .arg(&a)
        .arg(&b)
        .assert()
        .success();

    assert_eq!(lines(&out).len(), 3);
}

#[test]
fn union_accepts_both_dedupe_spellings() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.csv", "id,name\n1,Jo\n");
    let b = write(&dir, "b.csv", "id,name\n1,Jo\n");
    let out = dir.path().join("out.csv");

    csvexcel()
        .args(["union", "--dedupe", "-o"])
        .arg(&out)
        .arg(&a)
        .arg(&b)
        .assert()
        .success();
    assert_eq!(lines(&out).len(), 2);

    csvexcel()
        .args(["union", "--dedupe", "--no-dedupe", "-o"])
        .arg(&out)
        .arg(&a)
        .arg(&b)
        .assert()
        .success();
    assert_eq!(lines(&out).len(), 3);
}

#[test]
fn union_multiple_chunked_pads_missing_columns() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.csv", "id,name\n1,Jo\n");
    let b = write(&dir, "b.csv", "id,city\n2,Oslo\n");
    let c = write(&dir, "c.csv", "id,name\n1,Jo\n");
    let out = dir.path().join("out.csv");

    csvexcel()
        .args(["union-multiple", "--dedupe", "--chunksize", "1", "-o"])
        .arg(&out)
        .arg(&a)
        .arg(&b)
        .arg(&c)
        .assert()
        .success();

    assert_eq!(lines(&out), vec!["id,name,city", "1,Jo,", "2,,Oslo"]);
}

#[test]
fn union_multiple_strict_columns_fails() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.csv", "id,name\n1,Jo\n");
    let b = write(&dir, "b.csv", "id,city\n2,Oslo\n");
    let out = dir.path().join("out.csv");

    csvexcel()
        .args(["union-multiple", "--strict-columns", "-o"])
        .arg(&out)
        .arg(&a)
        .arg(&b)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error:"));

    assert!(!out.exists());
}

#[test]
fn join_inner_on_key() {
    let dir = TempDir::new().unwrap();
    let people = write(&dir, "people.csv", "id,name\n1,Jo\n2,Bo\n3,Al\n");
    let orders = write(&dir, "orders.csv", "id,item\n2,pen\n3,ink\n4,cup\n");
    let out = dir.path().join("joined.csv");

    csvexcel()
        .arg("join")
        .arg(&people)
        .arg(&orders)
        .args(["--on", "id", "-o"])
        .arg(&out)
        .assert()
        .success();

    assert_eq!(lines(&out), vec!["id,name,item", "2,Bo,pen", "3,Al,ink"]);
}

#[test]
fn join_rejects_unknown_mode() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.csv", "id\n1\n");
    let b = write(&dir, "b.csv", "id\n1\n");

    csvexcel()
        .arg("join")
        .arg(&a)
        .arg(&b)
        .args(["--on", "id", "--how", "sideways", "-o"])
        .arg(dir.path().join("out.csv"))
        .assert()
        .failure();
}

#[test]
fn join_missing_key_column_fails() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.csv", "id,name\n1,Jo\n");
    let b = write(&dir, "b.csv", "code,item\n1,pen\n");

    csvexcel()
        .arg("join")
        .arg(&a)
        .arg(&b)
        .args(["--on", "id", "-o"])
        .arg(dir.path().join("out.csv"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("id"));
}

#[test]
fn missing_input_reports_error() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.csv", "id\n1\n");

    csvexcel()
        .arg("union")
        .arg(&a)
        .arg(dir.path().join("nope.csv"))
        .arg("-o")
        .arg(dir.path().join("out.csv"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error:").and(predicate::str::contains("nope.csv")));
}

#[test]
fn csv_to_excel_names_sheets() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "sales.csv", "region,total\nNorth,10\n");
    let b = write(&dir, "costs.csv", "region,total\nNorth,4\nSouth,3\n");
    let out = dir.path().join("book.xlsx");

    csvexcel()
        .arg("csv-to-excel")
        .arg(&a)
        .arg(&b)
        .args(["-s", "Sales, Costs", "-o"])
        .arg(&out)
        .assert()
        .success();

    assert_eq!(sheet_names(&out).unwrap(), vec!["Sales", "Costs"]);
    let costs = read_sheet(&out, &SheetSelector::Name("Costs".to_string())).unwrap();
    assert_eq!(costs.row_count(), 2);
}

#[test]
fn csv_to_excel_sheet_name_count_mismatch() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.csv", "id\n1\n");

    csvexcel()
        .arg("csv-to-excel")
        .arg(&a)
        .args(["-s", "One,Two", "-o"])
        .arg(dir.path().join("book.xlsx"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("sheet names"));
}

fn workbook(path: &Path, sheets: Vec<(&str, Vec<&str>, Vec<Vec<CellValue>>)>) {
    let mut book = Workbook::new();
    for (name, columns, rows) in sheets {
        book.insert(name, Table::from_rows(&columns, rows));
    }
    write_workbook(&book, path, &AutoWidthConfig::default()).unwrap();
}

fn merge_inputs(dir: &TempDir) -> (PathBuf, PathBuf) {
    let a = dir.path().join("a.xlsx");
    let b = dir.path().join("b.xlsx");
    workbook(
        &a,
        vec![(
            "Data",
            vec!["id", "name"],
            vec![vec![CellValue::Int(1), CellValue::from("Jo")]],
        )],
    );
    workbook(
        &b,
        vec![(
            "Data",
            vec!["id", "name", "extra"],
            vec![vec![CellValue::Int(2), CellValue::from("Bo"), CellValue::from("x")]],
        )],
    );
    (a, b)
}

#[test]
fn merge_excel_lenient() {
    let dir = TempDir::new().unwrap();
    let (a, b) = merge_inputs(&dir);
    let out = dir.path().join("merged.xlsx");

    csvexcel()
        .arg("merge-excel")
        .arg(&a)
        .arg(&b)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let data = read_sheet(&out, &SheetSelector::Name("Data".to_string())).unwrap();
    assert_eq!(data.column_names(), vec!["id", "name", "extra"]);
    assert_eq!(data.row_count(), 2);
}

#[test]
fn merge_excel_strict_reports_mismatch() {
    let dir = TempDir::new().unwrap();
    let (a, b) = merge_inputs(&dir);
    let out = dir.path().join("merged.xlsx");

    csvexcel()
        .args(["merge-excel", "--mode", "strict", "-o"])
        .arg(&out)
        .arg(&a)
        .arg(&b)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("strict mode").and(predicate::str::contains("Data")));

    assert!(!out.exists());
}

#[test]
fn merge_sheet_writes_single_sheet() {
    let dir = TempDir::new().unwrap();
    let (a, b) = merge_inputs(&dir);
    let out = dir.path().join("data.xlsx");

    csvexcel()
        .args(["merge-sheet", "--sheet", "Data", "-o"])
        .arg(&out)
        .arg(&a)
        .arg(&b)
        .assert()
        .success();

    assert_eq!(sheet_names(&out).unwrap(), vec!["Data"]);
}

fn diff_inputs(dir: &TempDir) -> (PathBuf, PathBuf) {
    let a = write(dir, "old.csv", "id,name,score\n1,Jo,10\n2,Bo,20\n3,Al,30\n");
    let b = write(dir, "new.csv", "id,name,score\n1,Jo,10\n2,Bo,25\n4,Cy,40\n");
    (a, b)
}

#[test]
fn diff_stats_only_prints_json() {
    let dir = TempDir::new().unwrap();
    let (a, b) = diff_inputs(&dir);

    let output = csvexcel()
        .arg("diff")
        .arg(&a)
        .arg(&b)
        .args(["--key-columns", "id", "--stats-only"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["total"], 4);
    assert_eq!(stats["matching"], 1);
    assert_eq!(stats["different"], 1);
    assert_eq!(stats["only_a"], 1);
    assert_eq!(stats["only_b"], 1);
}

#[test]
fn diff_to_csv_report() {
    let dir = TempDir::new().unwrap();
    let (a, b) = diff_inputs(&dir);
    let out = dir.path().join("report.csv");

    csvexcel()
        .arg("diff")
        .arg(&a)
        .arg(&b)
        .args(["--key-columns", "id", "--show-only-diffs", "-o"])
        .arg(&out)
        .assert()
        .success();

    let report = lines(&out);
    assert_eq!(
        report[0],
        "Row_Index,Status,id_A,id_B,name_A,name_B,score_A,score_B"
    );
    assert_eq!(report.len(), 4);
    assert!(report.iter().skip(1).all(|l| !l.contains("MATCH")));
}

#[test]
fn diff_to_workbook_report() {
    let dir = TempDir::new().unwrap();
    let (a, b) = diff_inputs(&dir);
    let out = dir.path().join("report.xlsx");

    csvexcel()
        .arg("diff")
        .arg(&a)
        .arg(&b)
        .args(["--key-columns", "id", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));

    let sheets = sheet_names(&out).unwrap();
    assert_eq!(sheets[0], "Comparison");
    assert_eq!(sheets[1], "Summary");
}

#[test]
fn diff_prints_table_to_terminal() {
    let dir = TempDir::new().unwrap();
    let (a, b) = diff_inputs(&dir);

    csvexcel()
        .arg("diff")
        .arg(&a)
        .arg(&b)
        .args(["--key-columns", "id"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ONLY_A").and(predicate::str::contains("ONLY_B")));
}

#[test]
fn diff_duplicate_key_fails() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.csv", "id,v\n1,x\n1,y\n");
    let b = write(&dir, "b.csv", "id,v\n1,x\n");

    csvexcel()
        .arg("diff")
        .arg(&a)
        .arg(&b)
        .args(["--key-columns", "id", "--stats-only"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("duplicate key"));
}
