// src/exec/task_runner.rs

//! Shell-command task bodies.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::Context;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::model::ConfigFile;
use crate::dag::{Task, TaskInstance};
use crate::engine::Outcome;
use crate::errors::{Result, SchedError};
use crate::types::{MeasuredValue, TaskId};

/// A configured command plus the pattern that extracts its measured value.
#[derive(Debug, Clone)]
pub struct CommandBody {
    pub cmd: String,
    pub measure: Option<Regex>,
}

/// Runs task bodies as shell commands.
///
/// Success is the process exit status. If `measure_on_stdout` is configured,
/// the last stdout line matching it provides the measured value (capture
/// group 1).
#[derive(Debug, Default)]
pub struct CommandExecutor {
    bodies: HashMap<TaskId, CommandBody>,
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let mut exec = Self::new();
        for tc in cfg.task.iter() {
            let Some(cmd) = tc.cmd.clone() else {
                continue;
            };
            let measure = tc
                .measure_on_stdout
                .as_deref()
                .map(Regex::new)
                .transpose()
                .map_err(|e| {
                    SchedError::ConfigError(format!(
                        "task {}: invalid measure_on_stdout regex: {e}",
                        tc.id
                    ))
                })?;
            exec.bodies.insert(tc.id, CommandBody { cmd, measure });
        }
        Ok(exec)
    }

    pub fn has_body(&self, task: TaskId) -> bool {
        self.bodies.contains_key(&task)
    }
}

impl super::backend::TaskExecutor for CommandExecutor {
    fn execute<'a>(
        &'a mut self,
        task: &'a Task,
        instance: TaskInstance,
    ) -> Pin<Box<dyn Future<Output = Result<Outcome>> + Send + 'a>> {
        let body = self.bodies.get(&task.id).cloned();

        Box::pin(async move {
            let body = body.ok_or_else(|| {
                SchedError::Other(anyhow::anyhow!(
                    "no command configured for task {} ('{}')",
                    task.id,
                    task.name
                ))
            })?;
            let outcome = run_body(task, &body, instance).await?;
            Ok(outcome)
        })
    }
}

async fn run_body(
    task: &Task,
    body: &CommandBody,
    instance: TaskInstance,
) -> anyhow::Result<Outcome> {
    info!(
        task_id = task.id,
        task = %task.name,
        cmd = %body.cmd,
        start = ?instance.start_time,
        "starting task body"
    );

    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&body.cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&body.cmd);
        c
    };

    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning body for task '{}'", task.name))?;

    // Consume stderr so the pipe never fills; log at debug.
    if let Some(stderr) = child.stderr.take() {
        let task_name = task.name.clone();
        tokio::spawn(async move {
            let mut segments = BufReader::new(stderr).split(b'\n');
            while let Ok(Some(raw)) = segments.next_segment().await {
                debug!(task = %task_name, "stderr: {}", decode_line(&raw));
            }
        });
    }

    // Body output is raw bytes; a non-UTF-8 line must not abort the run.
    let mut measured_value: Option<MeasuredValue> = None;
    if let Some(stdout) = child.stdout.take() {
        let mut segments = BufReader::new(stdout).split(b'\n');
        loop {
            match segments.next_segment().await {
                Ok(Some(raw)) => {
                    let line = decode_line(&raw);
                    debug!(task = %task.name, "stdout: {}", line);
                    if let Some(value) =
                        body.measure.as_ref().and_then(|re| parse_measure(re, &line))
                    {
                        measured_value = Some(value);
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!(task = %task.name, error = %err, "stopped reading stdout");
                    break;
                }
            }
        }
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for body of task '{}'", task.name))?;

    let code = status.code().unwrap_or(-1);
    info!(
        task_id = task.id,
        task = %task.name,
        exit_code = code,
        success = status.success(),
        measured = ?measured_value,
        "task body exited"
    );

    if body.measure.is_some() && measured_value.is_none() {
        warn!(task = %task.name, "measure_on_stdout configured but no line matched");
    }

    Ok(Outcome {
        success: status.success(),
        measured_value,
    })
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Extract capture group 1 of `re` from `line` as a measured value.
pub fn parse_measure(re: &Regex, line: &str) -> Option<MeasuredValue> {
    let caps = re.captures(line)?;
    caps.get(1)?.as_str().trim().parse::<MeasuredValue>().ok()
}
