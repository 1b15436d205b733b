use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_runledger"))
}

#[test]
fn timeline_compiles_journals_latest_first() {
    let temp = TempDir::new().expect("tempdir");
    let journal_dir = temp.path().join("artifacts/journal");
    fs::create_dir_all(&journal_dir).expect("journal dir");
    fs::write(
        journal_dir.join("2026-01-02-fix.md"),
        "# Fix run\nSummary: patched the cache\n",
    )
    .expect("write journal");
    fs::write(
        journal_dir.join("2026-01-05-probe.md"),
        "# Probe run\n\nLooked at the allocator.\n",
    )
    .expect("write journal");

    let output = bin()
        .arg("--root")
        .arg(temp.path())
        .arg("timeline")
        .output()
        .expect("run timeline");
    assert!(output.status.success());

    let timeline = fs::read_to_string(temp.path().join("artifacts/history/timeline.md"))
        .expect("read timeline");
    assert!(timeline.starts_with("# Deep Thoughts Timeline"));
    let probe = timeline.find("2026-01-05 - Probe run").expect("probe entry");
    let fix = timeline.find("2026-01-02 - Fix run").expect("fix entry");
    assert!(probe < fix);
    assert!(timeline.contains("[View Journal](artifacts/journal/2026-01-02-fix.md)"));
}

#[test]
fn timeline_csv_exports_the_history_log() {
    let temp = TempDir::new().expect("tempdir");
    let run_dir = temp.path().join("artifacts/history/runs/run1");
    fs::create_dir_all(&run_dir).expect("run dir");
    fs::write(
        run_dir.join("implementation_plan.json"),
        r#"{"items": [{"id": "HYP-0001", "hypothesis": "X", "status": "proposed"}]}"#,
    )
    .expect("write plan");

    let output = bin()
        .arg("--root")
        .arg(temp.path())
        .arg("reconcile")
        .output()
        .expect("run reconcile");
    assert!(output.status.success());

    let csv_path = temp.path().join("artifacts/history/timeline.csv");
    let output = bin()
        .arg("--root")
        .arg(temp.path())
        .arg("timeline")
        .arg("--csv")
        .arg(&csv_path)
        .output()
        .expect("run timeline");
    assert!(output.status.success());

    let csv_text = fs::read_to_string(&csv_path).expect("read csv");
    let mut lines = csv_text.lines();
    assert_eq!(
        lines.next(),
        Some("timestamp,record_type,id,status,summary,evidence")
    );
    let row = lines.next().expect("data row");
    assert!(row.contains("HYP-0001"));
    assert!(row.contains("proposed"));
}

#[test]
fn version_subcommand_prints_the_crate_version() {
    let output = bin().arg("version").output().expect("run version");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert!(stdout.starts_with("runledger "));
}
