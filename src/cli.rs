use crate::{
    aggregate::ExclusionPolicy,
    config::Config,
    engine::{Engine, python::PythonEngine},
    folder,
    pipeline::{Pipeline, RunEvent, RunOutput},
    util::ensure_dir,
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "perf-check")]
#[command(about = "Extract streaming performance metrics from test-report PDFs and aggregate them per folder")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./perf-check.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the text extraction engine is usable.
    Doctor {},
    /// Extract metrics from a single document.
    Extract {
        #[arg(long)]
        input: PathBuf,
    },
    /// Decode the test dimensions encoded in a folder path.
    Decode {
        #[arg(long)]
        path: String,
    },
    /// Process every document below a root folder and write reports.
    Run {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long, value_enum)]
        playtime_policy: Option<ExclusionPolicy>,
        #[arg(long, value_enum)]
        fps_policy: Option<ExclusionPolicy>,
        #[arg(long, value_enum)]
        bandwidth_policy: Option<ExclusionPolicy>,
        #[arg(long, value_enum)]
        rtt_policy: Option<ExclusionPolicy>,
        #[arg(long)]
        no_xlsx: bool,
        #[arg(long)]
        no_csv: bool,
        /// Also render PNG charts (needs the `charts` feature).
        #[arg(long)]
        charts: bool,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg = match resolve_config_path(args.config.as_deref()) {
        Some(p) => Config::load(&p)?,
        None => Config::default(),
    };

    match &args.cmd {
        Command::Doctor {} => {
            let _guard = init_logging(&args, &cfg, None)?;
            doctor(&cfg)
        }
        Command::Extract { input } => {
            let _guard = init_logging(&args, &cfg, None)?;
            extract(&cfg, input)
        }
        Command::Decode { path } => {
            println!("{}", serde_json::to_string_pretty(&folder::decode(path))?);
            Ok(())
        }
        Command::Run {
            root,
            out_dir,
            playtime_policy,
            fps_policy,
            bandwidth_policy,
            rtt_policy,
            no_xlsx,
            no_csv,
            charts,
        } => {
            let mut cfg = cfg.clone();
            let avg = &mut cfg.averaging;
            for (slot, value) in [
                (&mut avg.playtime, playtime_policy),
                (&mut avg.fps, fps_policy),
                (&mut avg.bandwidth, bandwidth_policy),
                (&mut avg.rtt, rtt_policy),
            ] {
                if let Some(v) = value {
                    *slot = *v;
                }
            }
            if *no_xlsx {
                cfg.output.write_xlsx = false;
            }
            if *no_csv {
                cfg.output.write_csv = false;
            }
            if *charts {
                cfg.output.write_charts = true;
            }
            run(&args, &cfg, root, out_dir.as_deref())
        }
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    ["perf-check.toml", "perf-check.example.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let mut file_error = None;
    let (file_layer, guard) = match file_path.map(open_log_file) {
        Some(Ok(file)) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .boxed();
            (Some(layer), Some(guard))
        }
        Some(Err(e)) => {
            file_error = Some(e);
            (None, None)
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    if let Some(e) = file_error {
        warn!("log file disabled: {:#}", e);
    }

    Ok(guard)
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    ensure_dir(parent)?;
    std::fs::File::create(path).with_context(|| format!("create log file: {}", path.display()))
}

fn doctor(cfg: &Config) -> Result<()> {
    let engine = PythonEngine::new(cfg)?;
    let diag = engine.doctor()?;
    println!("{}", serde_json::to_string_pretty(&diag)?);
    Ok(())
}

fn extract(cfg: &Config, input: &Path) -> Result<()> {
    let engine = PythonEngine::new(cfg)?;
    let pipeline = Pipeline::new(cfg, engine)?;
    let record = pipeline.extract_file(input)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn run(args: &Args, cfg: &Config, root: &Path, out_override: Option<&Path>) -> Result<()> {
    let engine = PythonEngine::new(cfg)?;
    let pipeline = Pipeline::new(cfg, engine)?;
    let out_dir = out_override
        .map(PathBuf::from)
        .unwrap_or_else(|| pipeline.default_output_dir(root));

    let log_path = resolve_log_path(cfg, &out_dir);
    let _guard = init_logging(args, cfg, log_path.as_deref())?;

    info!("root={} out={}", root.display(), out_dir.display());

    let (tx, rx) = mpsc::channel::<RunEvent>();
    let worker_out = out_dir.clone();
    let output = std::thread::scope(|s| -> Result<RunOutput> {
        let worker = s.spawn(move || pipeline.run(root, Some(worker_out.as_path()), &tx));
        for event in rx {
            report_progress(&event);
        }
        worker
            .join()
            .map_err(|_| anyhow!("processing thread panicked"))?
    })?;

    let written_dir = output.outcome.output_dir.clone();

    if cfg.global.dump_effective_config {
        if let Some(dir) = &written_dir {
            let raw = toml::to_string(cfg).unwrap_or_default();
            if let Err(e) = std::fs::write(dir.join("effective-config.toml"), raw) {
                warn!("could not write effective-config.toml: {e}");
            }
        }
    }

    let failed: Vec<_> = output.outcome.failed().collect();
    let summary = serde_json::json!({
        "root": root,
        "output_dir": written_dir,
        "generated_at": output.model.generated_at,
        "files": output.model.stats,
        "folders": output.model.folders.len(),
        "artifacts": output.outcome.artifacts,
        "status": if failed.is_empty() { "ok" } else { "partial" },
    });

    if cfg.output.write_summary_json {
        if let Some(dir) = &written_dir {
            let path = dir.join(format!("run_summary_{}.json", output.model.file_stamp));
            if let Err(e) = std::fs::write(&path, serde_json::to_string_pretty(&summary)?) {
                warn!("could not write {}: {e}", path.display());
            }
        }
    }

    for a in &failed {
        warn!("{} was not generated", a.kind);
    }

    if cfg.global.print_summary {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

fn report_progress(event: &RunEvent) {
    match event {
        RunEvent::Discovered { total } => info!(target: "perf_check::progress", "{total} documents to process"),
        RunEvent::FileDone { index, total } => {
            info!(target: "perf_check::progress", "{index}/{total} done")
        }
        RunEvent::FileSkipped {
            index,
            total,
            path,
            ..
        } => info!(target: "perf_check::progress", "{index}/{total} skipped {}", path.display()),
        RunEvent::Finished {
            processed,
            skipped,
            failed_artifacts,
        } => info!(
            target: "perf_check::progress",
            "finished: processed={processed} skipped={skipped} failed_artifacts={failed_artifacts}"
        ),
        _ => {}
    }
}

fn resolve_log_path(cfg: &Config, out_dir: &Path) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }

    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }

    Some(out_dir.join("logs").join("perf-check.log"))
}
