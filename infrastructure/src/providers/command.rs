//! Backend that shells out to a local model CLI.
//!
//! The prompt goes to the child's stdin, or is appended as the last
//! argument when `prompt_arg` is set. Standard output is the answer.

use async_trait::async_trait;
use council_application::ports::backend::{
    BackendError, BackendReply, ModelBackend, QueryOptions, StreamHandle,
};
use council_domain::StreamEvent;
use council_domain::util::truncate_str;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

const STDERR_EXCERPT_BYTES: usize = 500;

#[derive(Debug, Clone)]
pub struct CommandBackendConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Pass the prompt as a trailing argument instead of on stdin
    pub prompt_arg: bool,
    pub timeout: Option<Duration>,
}

impl CommandBackendConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            prompt_arg: false,
            timeout: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

pub struct CommandBackend {
    config: CommandBackendConfig,
}

impl CommandBackend {
    pub fn new(config: CommandBackendConfig) -> Self {
        Self { config }
    }

    fn spawn(&self, prompt: &str) -> Result<Child, BackendError> {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args);
        if self.config.prompt_arg {
            cmd.arg(prompt);
            cmd.stdin(Stdio::null());
        } else {
            cmd.stdin(Stdio::piped());
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        debug!(program = %self.config.program, "Spawning model command");
        let mut child = cmd.spawn().map_err(|e| {
            BackendError::Process(format!("failed to start '{}': {e}", self.config.program))
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            let prompt = prompt.to_string();
            // The caller drains stdout while this task feeds stdin.
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(prompt.as_bytes()).await {
                    debug!("Could not write prompt to child stdin: {}", e);
                }
            });
        }
        Ok(child)
    }

    async fn run(&self, prompt: &str) -> Result<String, BackendError> {
        let child = self.spawn(prompt)?;
        let output = child.wait_with_output().await.map_err(|e| {
            BackendError::Process(format!("'{}' failed: {e}", self.config.program))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(exit_error(&self.config.program, output.status, &stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

fn exit_error(program: &str, status: ExitStatus, stderr: &str) -> BackendError {
    let excerpt = truncate_str(stderr.trim(), STDERR_EXCERPT_BYTES);
    if excerpt.is_empty() {
        BackendError::Process(format!("'{program}' exited with {status}"))
    } else {
        BackendError::Process(format!("'{program}' exited with {status}: {excerpt}"))
    }
}

/// Resolves at `deadline`, or never without one.
async fn expiry(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn read_stderr(stderr: Option<ChildStderr>) -> String {
    let mut buf = String::new();
    if let Some(mut stderr) = stderr {
        let _ = stderr.read_to_string(&mut buf).await;
    }
    buf
}

#[async_trait]
impl ModelBackend for CommandBackend {
    fn name(&self) -> &str {
        &self.config.program
    }

    async fn query(
        &self,
        prompt: &str,
        options: &QueryOptions,
    ) -> Result<BackendReply, BackendError> {
        options.check_cancelled()?;
        let prompt = options.render_prompt(prompt)?;
        let started = Instant::now();

        let text = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(&prompt))
                .await
                .map_err(|_| BackendError::Timeout(limit))??,
            None => self.run(&prompt).await?,
        };

        Ok(BackendReply::new(
            text,
            self.config.program.clone(),
            started.elapsed(),
        ))
    }

    /// Streams stdout line by line. The child is killed once the handle is
    /// dropped.
    async fn query_stream(
        &self,
        prompt: &str,
        options: &QueryOptions,
    ) -> Result<StreamHandle, BackendError> {
        options.check_cancelled()?;
        let prompt = options.render_prompt(prompt)?;
        let mut child = self.spawn(&prompt)?;

        let stdout = child.stdout.take().ok_or_else(|| {
            BackendError::Process(format!("'{}' has no stdout", self.config.program))
        })?;
        let stderr_task = tokio::spawn(read_stderr(child.stderr.take()));

        let (tx, rx) = mpsc::channel(64);
        let program = self.config.program.clone();
        let limit = self.config.timeout;
        let deadline = limit.map(|limit| Instant::now() + limit);

        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            let mut full = String::new();

            loop {
                let line = tokio::select! {
                    _ = tx.closed() => return,
                    _ = expiry(deadline) => {
                        if let Some(limit) = limit {
                            warn!(program = %program, "Model command timed out while streaming");
                            let _ = tx
                                .send(StreamEvent::Error(BackendError::Timeout(limit).to_string()))
                                .await;
                        }
                        // Dropping the child kills it.
                        return;
                    }
                    line = lines.next_line() => line,
                };
                match line {
                    Ok(Some(line)) => {
                        full.push_str(&line);
                        full.push('\n');
                        if tx.send(StreamEvent::Delta(format!("{line}\n"))).await.is_err() {
                            return;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        let _ = tx
                            .send(StreamEvent::Error(format!("'{program}' output: {e}")))
                            .await;
                        return;
                    }
                }
            }

            let status = tokio::select! {
                status = child.wait() => status,
                _ = expiry(deadline) => {
                    if let Some(limit) = limit {
                        let _ = tx
                            .send(StreamEvent::Error(BackendError::Timeout(limit).to_string()))
                            .await;
                    }
                    return;
                }
            };
            let stderr = stderr_task.await.unwrap_or_default();
            let event = match status {
                Ok(status) if status.success() => StreamEvent::Completed(full.trim().to_string()),
                Ok(status) => StreamEvent::Error(exit_error(&program, status, &stderr).to_string()),
                Err(e) => {
                    warn!(program = %program, "Could not reap child: {}", e);
                    StreamEvent::Error(format!("'{program}' failed: {e}"))
                }
            };
            let _ = tx.send(event).await;
        });

        Ok(StreamHandle::new(rx).with_source_id(self.config.program.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandBackend {
        CommandBackend::new(CommandBackendConfig::new("sh").with_args(["-c", script]))
    }

    #[tokio::test]
    async fn test_prompt_on_stdin() {
        let backend = CommandBackend::new(CommandBackendConfig::new("cat"));

        let reply = backend
            .query("Is Rust memory safe?", &QueryOptions::new())
            .await
            .unwrap();

        assert_eq!(reply.text, "Is Rust memory safe?");
        assert_eq!(reply.source_id, "cat");
    }

    #[tokio::test]
    async fn test_stream_honours_timeout() {
        let mut config = CommandBackendConfig::new("sh").with_args(["-c", "sleep 3; echo late"]);
        config.timeout = Some(Duration::from_millis(200));
        let backend = CommandBackend::new(config);

        let started = std::time::Instant::now();
        let mut handle = backend
            .query_stream("q", &QueryOptions::new())
            .await
            .unwrap();

        assert_eq!(
            handle.next().await,
            Some(StreamEvent::Error(
                BackendError::Timeout(Duration::from_millis(200)).to_string()
            ))
        );
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(handle.next().await, None);
    }

    #[tokio::test]
    async fn test_prompt_as_argument() {
        let mut config = CommandBackendConfig::new("echo").with_args(["answer:"]);
        config.prompt_arg = true;
        let backend = CommandBackend::new(config);

        let reply = backend.query("yes", &QueryOptions::new()).await.unwrap();
        assert_eq!(reply.text, "answer: yes");
    }

    #[tokio::test]
    async fn test_non_zero_exit_reports_stderr() {
        let backend = sh("echo 'model not found' >&2; exit 3");

        let err = backend.query("q", &QueryOptions::new()).await.unwrap_err();

        match err {
            BackendError::Process(message) => {
                assert!(message.contains("model not found"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program() {
        let backend = CommandBackend::new(CommandBackendConfig::new("council-no-such-binary"));
        let err = backend.query("q", &QueryOptions::new()).await.unwrap_err();
        assert!(matches!(err, BackendError::Process(m) if m.contains("failed to start")));
    }

    #[tokio::test]
    async fn test_timeout() {
        let mut config = CommandBackendConfig::new("sleep").with_args(["5"]);
        config.timeout = Some(Duration::from_millis(100));
        let backend = CommandBackend::new(config);

        let err = backend.query("q", &QueryOptions::new()).await.unwrap_err();
        assert_eq!(err, BackendError::Timeout(Duration::from_millis(100)));
    }

    #[tokio::test]
    async fn test_stream_emits_lines() {
        let backend = sh("printf 'first\\nsecond\\n'");

        let mut handle = backend
            .query_stream("q", &QueryOptions::new())
            .await
            .unwrap();

        assert_eq!(
            handle.next().await,
            Some(StreamEvent::Delta("first\n".to_string()))
        );
        assert_eq!(
            handle.next().await,
            Some(StreamEvent::Delta("second\n".to_string()))
        );
        assert_eq!(
            handle.next().await,
            Some(StreamEvent::Completed("first\nsecond".to_string()))
        );
    }

    #[tokio::test]
    async fn test_stream_failure_after_output() {
        let backend = sh("echo partial; echo crashed >&2; exit 1");

        let mut handle = backend
            .query_stream("q", &QueryOptions::new())
            .await
            .unwrap();

        assert_eq!(
            handle.next().await,
            Some(StreamEvent::Delta("partial\n".to_string()))
        );
        match handle.next().await {
            Some(StreamEvent::Error(message)) => assert!(message.contains("crashed")),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
