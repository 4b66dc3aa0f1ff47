use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::common::error::PipelineError;

/// One line of live output from a child process, followed by exactly one
/// `Exited` event once the process is gone.
#[derive(Debug)]
pub enum ProcessEvent {
    Stdout(String),
    Stderr(String),
    Exited(i32),
}

/// Registry of every live encoder/prober child. The shutdown listener in
/// `main` cancels all of them through this, instead of installing a fresh
/// signal handler per invocation.
#[derive(Clone, Default)]
pub struct ProcessRegistry {
    inner: Arc<Mutex<HashMap<u64, CancellationToken>>>,
    next_id: Arc<AtomicU64>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn active_count(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// Cancel every registered child. Each pump task kills its own process.
    pub async fn shutdown_all(&self) {
        let tokens: Vec<CancellationToken> = self.inner.lock().await.values().cloned().collect();
        for token in tokens {
            token.cancel();
        }
    }

    async fn register(&self) -> (u64, CancellationToken) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        self.inner.lock().await.insert(id, token.clone());
        (id, token)
    }

    async fn deregister(&self, id: u64) {
        self.inner.lock().await.remove(&id);
    }

    /// Spawn a child process with piped stdout/stderr and stream its output
    /// line by line. Fails only when the OS refuses to start the process;
    /// whatever the process then prints is the caller's concern.
    pub async fn spawn(
        &self,
        command: &str,
        args: &[String],
    ) -> Result<RunningProcess, PipelineError> {
        debug!("Spawning: {} {}", command, args.join(" "));

        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PipelineError::SpawnFailed {
                command: command.to_string(),
                reason: e.to_string(),
            })?;

        let stdout = child.stdout.take().ok_or_else(|| PipelineError::SpawnFailed {
            command: command.to_string(),
            reason: "stdout not captured".to_string(),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| PipelineError::SpawnFailed {
            command: command.to_string(),
            reason: "stderr not captured".to_string(),
        })?;

        let (id, token) = self.register().await;
        let (tx, rx) = mpsc::channel(64);

        let registry = self.clone();
        let pump_token = token.clone();
        let name = command.to_string();

        tokio::spawn(async move {
            let mut out_lines = BufReader::new(stdout).lines();
            let mut err_lines = BufReader::new(stderr).lines();
            let mut out_done = false;
            let mut err_done = false;
            let mut killed = false;

            while !(out_done && err_done) {
                tokio::select! {
                    _ = pump_token.cancelled(), if !killed => {
                        warn!("Killing {} (cancelled)", name);
                        let _ = child.start_kill();
                        killed = true;
                    }
                    line = out_lines.next_line(), if !out_done => match line {
                        Ok(Some(line)) => {
                            let _ = tx.send(ProcessEvent::Stdout(line)).await;
                        }
                        _ => out_done = true,
                    },
                    line = err_lines.next_line(), if !err_done => match line {
                        Ok(Some(line)) => {
                            let _ = tx.send(ProcessEvent::Stderr(line)).await;
                        }
                        _ => err_done = true,
                    },
                }
            }

            let status = loop {
                if pump_token.is_cancelled() && !killed {
                    warn!("Killing {} (cancelled)", name);
                    let _ = child.start_kill();
                    killed = true;
                }
                tokio::select! {
                    status = child.wait() => break status,
                    _ = pump_token.cancelled(), if !killed => continue,
                }
            };

            let code = status.ok().and_then(|s| s.code()).unwrap_or(-1);
            let _ = tx.send(ProcessEvent::Exited(code)).await;
            registry.deregister(id).await;
        });

        Ok(RunningProcess { events: rx, cancel: token })
    }
}

/// Preflight check that a required external binary is on PATH.
pub fn ensure_tool(name: &str) -> Result<(), PipelineError> {
    which::which(name)
        .map(|_| ())
        .map_err(|_| PipelineError::SpawnFailed {
            command: name.to_string(),
            reason: "not found in PATH".to_string(),
        })
}

/// Handle to one spawned child: a stream of output events plus cancellation.
pub struct RunningProcess {
    events: mpsc::Receiver<ProcessEvent>,
    cancel: CancellationToken,
}

impl RunningProcess {
    /// Next output line, or the final exit code. `None` after `Exited`.
    pub async fn next_event(&mut self) -> Option<ProcessEvent> {
        self.events.recv().await
    }

    /// Send the child a termination signal. Safe to call more than once.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn drain(proc: &mut RunningProcess) -> (Vec<String>, Vec<String>, i32) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut code = i32::MIN;
        while let Some(event) = proc.next_event().await {
            match event {
                ProcessEvent::Stdout(line) => out.push(line),
                ProcessEvent::Stderr(line) => err.push(line),
                ProcessEvent::Exited(c) => code = c,
            }
        }
        (out, err, code)
    }

    #[tokio::test]
    async fn streams_stdout_and_stderr_then_exit_code() {
        let registry = ProcessRegistry::new();
        let args = vec!["-c".to_string(), "echo one; echo two >&2; exit 3".to_string()];
        let mut proc = registry.spawn("sh", &args).await.unwrap();

        let (out, err, code) = drain(&mut proc).await;
        assert_eq!(out, vec!["one".to_string()]);
        assert_eq!(err, vec!["two".to_string()]);
        assert_eq!(code, 3);
    }

    #[tokio::test]
    async fn spawn_failure_is_reported() {
        let registry = ProcessRegistry::new();
        let result = registry.spawn("definitely-not-a-real-binary-xyz", &[]).await;
        assert!(matches!(result, Err(PipelineError::SpawnFailed { .. })));
        assert_eq!(registry.active_count().await, 0);
    }

    #[tokio::test]
    async fn cancel_terminates_long_running_child() {
        let registry = ProcessRegistry::new();
        let args = vec!["-c".to_string(), "sleep 30".to_string()];
        let mut proc = registry.spawn("sh", &args).await.unwrap();

        proc.cancel();
        let (_, _, code) = drain(&mut proc).await;
        assert_ne!(code, 0);
        assert_eq!(registry.active_count().await, 0);
    }

    #[tokio::test]
    async fn shutdown_all_drains_the_registry() {
        let registry = ProcessRegistry::new();
        let args = vec!["-c".to_string(), "sleep 30".to_string()];
        let mut a = registry.spawn("sh", &args).await.unwrap();
        let mut b = registry.spawn("sh", &args).await.unwrap();
        assert_eq!(registry.active_count().await, 2);

        registry.shutdown_all().await;
        drain(&mut a).await;
        drain(&mut b).await;
        assert_eq!(registry.active_count().await, 0);
    }
}
