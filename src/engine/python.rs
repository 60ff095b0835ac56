use super::{Engine, types::*};
use crate::config::Config;
use anyhow::{Context, Result, anyhow, bail};
use serde::{Serialize, de::DeserializeOwned};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const DOCTOR_TIMEOUT_SECS: u64 = 60;
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Text extraction through a helper script: one request object on stdin, one
/// response object on stdout, one interpreter process per document.
pub struct PythonEngine {
    cfg: Config,
    interpreter: PathBuf,
    script: PathBuf,
}

/// Everything a finished helper process left behind.
struct Finished {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl PythonEngine {
    pub fn new(cfg: &Config) -> Result<Self> {
        let script = Path::new(&cfg.paths.scripts_dir).join(&cfg.engine.script);
        if !script.is_file() {
            bail!("text extraction script not found: {}", script.display());
        }
        Ok(Self {
            cfg: cfg.clone(),
            interpreter: interpreter_path(&cfg.engine.python_exe),
            script,
        })
    }

    fn call<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        request: &Req,
        limit: Option<Duration>,
    ) -> Result<Resp> {
        debug!(
            script = %self.script.display(),
            interpreter = %self.interpreter.display(),
            "calling helper (limit {:?})",
            limit
        );

        let mut child = Command::new(&self.interpreter)
            .arg(&self.script)
            .envs(&self.cfg.engine.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| {
                format!(
                    "starting {} {}",
                    self.interpreter.display(),
                    self.script.display()
                )
            })?;

        let payload = serde_json::to_vec(request)?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("helper stdin unavailable"))?;
        stdin
            .write_all(&payload)
            .with_context(|| "writing request to helper")?;
        // Closing stdin tells the helper the request is complete.
        drop(stdin);

        let done = finish(&mut child, limit)?;
        let stderr = String::from_utf8_lossy(&done.stderr);

        if !done.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.script.display(),
                done.status,
                stderr.trim()
            );
        }
        if self.cfg.engine.keep_python_stderr && !stderr.trim().is_empty() {
            debug!(script = %self.script.display(), "helper stderr: {}", stderr.trim());
        }

        serde_json::from_slice(&done.stdout)
            .with_context(|| format!("decoding response of {}", self.script.display()))
    }

    fn extract_limit(&self) -> Option<Duration> {
        match self.cfg.engine.timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl Engine for PythonEngine {
    fn doctor(&self) -> Result<EngineDiag> {
        self.call(
            &serde_json::json!({ "cmd": "doctor" }),
            Some(Duration::from_secs(DOCTOR_TIMEOUT_SECS)),
        )
    }

    fn extract_text(&self, input: &Path) -> Result<String> {
        let req = ExtractIn {
            input_pdf: input.display().to_string(),
        };
        let request = serde_json::json!({ "cmd": "extract", "req": req });
        let resp: ExtractOut = self.call(&request, self.extract_limit())?;
        if !resp.ok {
            let reason = resp.error.as_deref().unwrap_or("no reason given");
            bail!("helper could not read {}: {reason}", input.display());
        }
        for w in &resp.warnings {
            warn!("{}: {w}", input.display());
        }
        debug!(
            pages = resp.page_count,
            chars = resp.text.len(),
            "text layer of {}",
            input.display()
        );
        Ok(resp.text)
    }
}

/// `python_exe = "auto"` (or empty) consults `$PERF_CHECK_PYTHON` before
/// falling back to `python3` on `PATH`.
fn interpreter_path(configured: &str) -> PathBuf {
    let configured = configured.trim();
    if !configured.is_empty() && !configured.eq_ignore_ascii_case("auto") {
        return home_relative(configured);
    }
    std::env::var("PERF_CHECK_PYTHON")
        .ok()
        .map(|v| home_relative(&v))
        .filter(|p| p.exists())
        .unwrap_or_else(|| PathBuf::from("python3"))
}

fn home_relative(raw: &str) -> PathBuf {
    match (raw.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(raw),
    }
}

/// Wait for `child`, draining both pipes on background threads so a large
/// response cannot stall the helper. Kills the child once `limit` passes.
fn finish(child: &mut Child, limit: Option<Duration>) -> Result<Finished> {
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let started = Instant::now();

    let status = loop {
        if let Some(status) = child.try_wait().with_context(|| "polling helper")? {
            break status;
        }
        if limit.is_some_and(|l| started.elapsed() > l) {
            warn!("helper still running after {:?}; killing it", started.elapsed());
            let _ = child.kill();
            child.wait().with_context(|| "reaping killed helper")?;
            let stderr = collect(stderr, "stderr")?;
            bail!(
                "helper timed out after {:?}: {}",
                started.elapsed(),
                String::from_utf8_lossy(&stderr).trim()
            );
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    Ok(Finished {
        status,
        stdout: collect(stdout, "stdout")?,
        stderr: collect(stderr, "stderr")?,
    })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut p) = pipe {
            p.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn collect(handle: JoinHandle<std::io::Result<Vec<u8>>>, name: &str) -> Result<Vec<u8>> {
    handle
        .join()
        .map_err(|_| anyhow!("{name} reader panicked"))?
        .with_context(|| format!("reading helper {name}"))
}
