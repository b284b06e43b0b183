//! Shell Capability Runtime
//!
//! Each capability is a POSIX shell function. Binding checks that the
//! function is defined and that the unit parses (`sh -n`); every
//! invocation runs in a fresh interpreter process, so a failing or
//! misbehaving unit never touches the agent's own memory.
//!
//! Output is collected until the interpreter exits, plus a short grace
//! period. A program the function left running in the background may still
//! hold the pipes open; it does not keep the call waiting.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use evolv::{CapabilityId, CapabilityRuntime, DomainError, Invocable};

pub const DEFAULT_INTERPRETER: &str = "sh";

/// How long output is still read after the interpreter has exited
const OUTPUT_GRACE: Duration = Duration::from_millis(100);

pub struct ShellRuntime {
    interpreter: String,
}

impl ShellRuntime {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    async fn check_syntax(&self, id: &CapabilityId, source: &str) -> Result<(), DomainError> {
        let mut child = Command::new(&self.interpreter)
            .arg("-n")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DomainError::load(id, format!("cannot start {}: {}", self.interpreter, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(source.as_bytes())
                .await
                .map_err(|e| DomainError::load(id, e))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| DomainError::load(id, e))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(DomainError::load(
                id,
                format!(
                    "syntax error: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ))
        }
    }
}

impl Default for ShellRuntime {
    fn default() -> Self {
        Self::new(DEFAULT_INTERPRETER)
    }
}

/// A bound shell function
struct ShellFunction {
    interpreter: String,
    name: String,
    script: String,
}

/// Reads a child pipe on its own task so the caller can stop waiting
/// without losing what has already arrived.
struct PipeCollector {
    chunks: mpsc::UnboundedReceiver<Vec<u8>>,
    task: JoinHandle<()>,
}

impl PipeCollector {
    fn spawn<R>(mut reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, chunks) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });
        Self { chunks, task }
    }

    /// Wait up to `grace` for EOF, then return everything read so far
    async fn finish(&mut self, grace: Duration) -> String {
        if tokio::time::timeout(grace, &mut self.task).await.is_err() {
            self.task.abort();
        }
        let mut bytes = Vec::new();
        while let Ok(chunk) = self.chunks.try_recv() {
            bytes.extend_from_slice(&chunk);
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Drop for PipeCollector {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[async_trait]
impl Invocable for ShellFunction {
    async fn invoke(&self, args: &[String]) -> Result<String, DomainError> {
        let mut child = Command::new(&self.interpreter)
            .arg("-c")
            .arg(&self.script)
            .arg(&self.name)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DomainError::Execution(format!("cannot start {}: {}", self.interpreter, e)))?;

        let mut stdout = child.stdout.take().map(PipeCollector::spawn);
        let mut stderr = child.stderr.take().map(PipeCollector::spawn);

        let status = child
            .wait()
            .await
            .map_err(|e| DomainError::Execution(e.to_string()))?;

        let stdout = match stdout.as_mut() {
            Some(pipe) => pipe.finish(OUTPUT_GRACE).await,
            None => String::new(),
        };
        if status.success() {
            return Ok(stdout.trim_end().to_string());
        }

        let stderr = match stderr.as_mut() {
            Some(pipe) => pipe.finish(OUTPUT_GRACE).await,
            None => String::new(),
        };
        Err(DomainError::Execution(format!("{} ({})", stderr.trim(), status)))
    }
}

#[async_trait]
impl CapabilityRuntime for ShellRuntime {
    fn language(&self) -> &str {
        "POSIX shell (sh)"
    }

    fn extension(&self) -> &str {
        "sh"
    }

    fn defines_function(&self, source: &str, name: &str) -> bool {
        let pattern = format!(
            r"(?m)^\s*(?:function\s+)?{}\s*\(\s*\)",
            regex::escape(name)
        );
        Regex::new(&pattern)
            .map(|re| re.is_match(source))
            .unwrap_or(false)
    }

    async fn bind(
        &self,
        id: &CapabilityId,
        source: &str,
    ) -> Result<Arc<dyn Invocable>, DomainError> {
        if !self.defines_function(source, id.name()) {
            return Err(DomainError::load(
                id,
                format!("no function named '{}'", id.name()),
            ));
        }
        self.check_syntax(id, source).await?;

        Ok(Arc::new(ShellFunction {
            interpreter: self.interpreter.clone(),
            name: id.name().to_string(),
            script: format!("{}\n{} \"$@\"\n", source, id.name()),
        }))
    }

    fn builtin_source(&self, name: &str) -> Option<String> {
        let body = match name {
            "tell_the_time" => "    date '+%Y-%m-%d %H:%M:%S'",
            "tell_the_date" => "    date '+%Y-%m-%d'",
            "open_spotify" => concat!(
                "    if [ \"$(uname)\" = \"Darwin\" ]; then\n",
                "        open -a Spotify\n",
                "    else\n",
                "        nohup spotify >/dev/null 2>&1 &\n",
                "    fi\n",
                "    echo 'Spotify has been opened.'"
            ),
            _ => return None,
        };
        Some(format!("{}() {{\n{}\n}}\n", name, body))
    }

    fn stub_source(&self, name: &str) -> String {
        format!(
            "{}() {{\n    echo 'Fallback: Command not implemented.'\n}}\n",
            name
        )
    }
}
