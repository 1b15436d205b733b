use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use serde_json::json;

use runledger_core::activity::{append_activity_event, ActivityEvent};
use runledger_core::config::resolve_paths;
use runledger_core::journal::load_journal_entries;
use runledger_core::lessons::append_lessons;
use runledger_core::paths::LedgerPaths;
use runledger_core::plan::{summarize_plan, PLAN_FILENAME};
use runledger_core::report::report_outcome;
use runledger_core::store;
use runledger_core::store::Strictness;
use runledger_core::walkthrough::lessons_for_run;
use runledger_render::index::{parse_history_rows, render_history_index};
use runledger_render::journal::{render_journal_entry, JournalContext};
use runledger_render::narrative::{render_narrative, NarrativeEntry};
use runledger_render::timeline::{render_timeline, render_timeline_csv, TimelineSource};

mod version;

#[derive(Parser)]
#[command(
    name = "runledger",
    version = version::FULL,
    about = "Rebuild project history from run artifacts"
)]
struct Cli {
    /// Repository root (defaults to the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the history log and derived documents
    Reconcile {
        /// Where to write the history NDJSON (defaults to the configured layout)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Where to write the narrative markdown
        #[arg(long)]
        narrative: Option<PathBuf>,
        /// Where to write the history index markdown
        #[arg(long)]
        index: Option<PathBuf>,
        /// Do not write; exit non-zero if any output would change
        #[arg(long)]
        check: bool,
        /// Treat a corrupt persisted history line as fatal
        #[arg(long)]
        strict: bool,
    },
    /// Emit the reconstructed journal entry for a run
    Journal {
        /// Run directory name (defaults to the latest run)
        run: Option<String>,
    },
    /// Close a run: journal entry, lessons promotion, closure stamp
    CloseRun {
        /// Run directory name (defaults to the latest run)
        run: Option<String>,
    },
    /// Compile the journal timeline
    Timeline {
        /// Also write a CSV export of the history log
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let repo_root = resolve_root(cli.root)?;
    let paths = resolve_paths(&repo_root);

    match cli.command {
        Some(Command::Reconcile {
            output,
            narrative,
            index,
            check,
            strict,
        }) => {
            let changed = run_reconcile(&repo_root, &paths, output, narrative, index, check, strict)?;
            if check && changed {
                std::process::exit(1);
            }
        }
        Some(Command::Journal { run }) => {
            run_journal(&repo_root, &paths, run)?;
        }
        Some(Command::CloseRun { run }) => {
            run_close_run(&repo_root, &paths, run)?;
        }
        Some(Command::Timeline { csv }) => {
            run_timeline(&repo_root, &paths, csv)?;
        }
        Some(Command::Version) => {
            println!("runledger {}", runledger_core::version());
        }
        None => {
            Cli::command().print_help()?;
            println!();
        }
    }
    Ok(())
}

fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    match root {
        Some(path) => Ok(path),
        None => std::env::current_dir().context("resolve current directory"),
    }
}

fn run_reconcile(
    repo_root: &Path,
    paths: &LedgerPaths,
    output: Option<PathBuf>,
    narrative: Option<PathBuf>,
    index: Option<PathBuf>,
    check: bool,
    strict: bool,
) -> Result<bool> {
    let strictness = if strict {
        Strictness::Strict
    } else {
        Strictness::Lenient
    };
    let history_path = output.unwrap_or_else(|| paths.history_path(repo_root));
    let records = store::collect_records(repo_root, paths, &history_path, strictness)?;
    let content = store::serialize_records(&records)?;

    let entries = load_journal_entries(repo_root, paths);
    let narrative_entries: Vec<NarrativeEntry> = entries
        .iter()
        .map(|entry| NarrativeEntry {
            run_id: entry.run_id.clone(),
            body: entry.body.clone(),
        })
        .collect();
    let narrative_text = render_narrative(&narrative_entries);
    let narrative_path = narrative.unwrap_or_else(|| repo_root.join(&paths.narrative_file));

    let history_dir = Path::new(&paths.history_file)
        .parent()
        .map(|dir| dir.to_string_lossy().to_string())
        .unwrap_or_default();
    let index_text = render_history_index(&parse_history_rows(&content), &history_dir);
    let index_path = index.unwrap_or_else(|| repo_root.join(&paths.index_file));

    if check {
        let changed = store::would_change(&history_path, &content)
            .with_context(|| format!("compare {}", history_path.display()))?
            | store::would_change(&narrative_path, &narrative_text)
                .with_context(|| format!("compare {}", narrative_path.display()))?
            | store::would_change(&index_path, &index_text)
                .with_context(|| format!("compare {}", index_path.display()))?;
        if changed {
            println!("reconcile: pending changes");
        } else {
            println!("reconcile: no changes");
        }
        return Ok(changed);
    }

    store::write_output(&history_path, &content)
        .with_context(|| format!("write {}", history_path.display()))?;
    store::write_output(&narrative_path, &narrative_text)
        .with_context(|| format!("write {}", narrative_path.display()))?;
    store::write_output(&index_path, &index_text)
        .with_context(|| format!("write {}", index_path.display()))?;

    append_activity_event(
        repo_root,
        paths,
        &ActivityEvent::new(
            "reconcile",
            json!({
                "records": records.len(),
                "digest": store::content_digest(&content),
            }),
        ),
    )?;

    println!("Wrote {} records to {}", records.len(), history_path.display());
    println!("Wrote narrative to {}", narrative_path.display());
    println!("Wrote history index to {}", index_path.display());
    Ok(false)
}

fn run_journal(repo_root: &Path, paths: &LedgerPaths, run: Option<String>) -> Result<PathBuf> {
    let run_dir = resolve_run_dir(repo_root, paths, run)?;
    let out_path = emit_journal(repo_root, paths, &run_dir)?;
    println!("journal: wrote {}", out_path.display());
    Ok(out_path)
}

fn run_close_run(repo_root: &Path, paths: &LedgerPaths, run: Option<String>) -> Result<()> {
    let run_dir = resolve_run_dir(repo_root, paths, run)?;
    let run_name = run_dir_name(&run_dir);
    if !run_dir.join(PLAN_FILENAME).exists() {
        bail!(
            "close-run: missing {} in {}",
            PLAN_FILENAME,
            run_dir.display()
        );
    }
    println!("close-run: closing {run_name}");

    let journal_path = emit_journal(repo_root, paths, &run_dir)?;
    println!("close-run: journal written to {}", journal_path.display());

    let lessons = lessons_for_run(&run_dir);
    let promoted = append_lessons(repo_root, paths, &run_name, &lessons)?;
    if promoted > 0 {
        println!("close-run: promoted {promoted} lessons");
    } else {
        println!("close-run: no lessons found in walkthrough");
    }

    let closure = json!({
        "closed_at": chrono::Local::now().to_rfc3339(),
        "final_status": "closed",
        "lessons_promoted": promoted,
    });
    let closure_path = run_dir.join("closure.json");
    fs::write(&closure_path, serde_json::to_string_pretty(&closure)?)
        .with_context(|| format!("write {}", closure_path.display()))?;

    append_activity_event(
        repo_root,
        paths,
        &ActivityEvent::new(
            "close_run",
            json!({
                "run": run_name,
                "lessons_promoted": promoted,
            }),
        ),
    )?;

    println!("close-run: {run_name} closed");
    Ok(())
}

fn run_timeline(repo_root: &Path, paths: &LedgerPaths, csv: Option<PathBuf>) -> Result<()> {
    let entries = load_journal_entries(repo_root, paths);
    let sources: Vec<TimelineSource> = entries
        .iter()
        .map(|entry| TimelineSource {
            run_id: entry.run_id.clone(),
            rel_path: entry.rel_path.clone(),
            body: entry.body.clone(),
        })
        .collect();
    let timeline_path = repo_root.join(&paths.timeline_file);
    store::write_output(&timeline_path, &render_timeline(&sources))
        .with_context(|| format!("write {}", timeline_path.display()))?;
    println!("Wrote timeline to {}", timeline_path.display());

    if let Some(csv_path) = csv {
        let history_text = fs::read_to_string(paths.history_path(repo_root)).unwrap_or_default();
        let csv_text = render_timeline_csv(&parse_history_rows(&history_text))?;
        store::write_output(&csv_path, &csv_text)
            .with_context(|| format!("write {}", csv_path.display()))?;
        println!("Wrote CSV export to {}", csv_path.display());
    }
    Ok(())
}

fn emit_journal(repo_root: &Path, paths: &LedgerPaths, run_dir: &Path) -> Result<PathBuf> {
    let run_id = run_dir_name(run_dir);
    let context = JournalContext {
        run_id: run_id.clone(),
        plan_summary: summarize_plan(run_dir),
        outcome: report_outcome(run_dir),
        lessons: lessons_for_run(run_dir),
    };
    let journal_root = paths.journal_root(repo_root);
    fs::create_dir_all(&journal_root)
        .with_context(|| format!("create journal dir {}", journal_root.display()))?;
    let out_path = journal_root.join(format!("{run_id}.md"));
    fs::write(&out_path, render_journal_entry(&context))
        .with_context(|| format!("write {}", out_path.display()))?;
    Ok(out_path)
}

fn resolve_run_dir(repo_root: &Path, paths: &LedgerPaths, run: Option<String>) -> Result<PathBuf> {
    let runs_root = paths.runs_root(repo_root);
    let run_dir = match run {
        Some(name) => runs_root.join(name),
        None => match latest_run(&runs_root) {
            Some(dir) => dir,
            None => bail!("no runs found under {}", runs_root.display()),
        },
    };
    if !run_dir.is_dir() {
        bail!("run directory {} does not exist", run_dir.display());
    }
    Ok(run_dir)
}

fn latest_run(runs_root: &Path) -> Option<PathBuf> {
    let read_dir = fs::read_dir(runs_root).ok()?;
    let mut dirs: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs.pop()
}

fn run_dir_name(run_dir: &Path) -> String {
    run_dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}
