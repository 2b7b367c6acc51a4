use crate::{RecordOptions, Recorder};
use parity_core::{
    now_rfc3339, transcript_id, ParityError, Source, Transcript, TranscriptEntry,
    TranscriptMetadata,
};
use parity_transcript::{parse_status_moves, DEFAULT_PROMPT_MARKER};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_KILL_TIMEOUT: Duration = Duration::from_secs(2);

/// How to launch and talk to a REPL interpreter.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    pub program: PathBuf,
    /// Passed before the game file.
    pub args: Vec<String>,
    pub game_file: Option<PathBuf>,
    pub prompt_marker: String,
    /// How long to wait for a clean exit after the quit sequence.
    pub kill_timeout: Duration,
    pub quit_sequence: Vec<String>,
}

impl RecorderConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            game_file: None,
            prompt_marker: DEFAULT_PROMPT_MARKER.into(),
            kill_timeout: DEFAULT_KILL_TIMEOUT,
            quit_sequence: vec!["quit".into(), "y".into()],
        }
    }

    pub fn with_game_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.game_file = Some(path.into());
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_prompt_marker(mut self, marker: impl Into<String>) -> Self {
        self.prompt_marker = marker.into();
        self
    }

    pub fn with_kill_timeout(mut self, timeout: Duration) -> Self {
        self.kill_timeout = timeout;
        self
    }

    pub fn with_quit_sequence(mut self, lines: Vec<String>) -> Self {
        self.quit_sequence = lines;
        self
    }

    fn label(&self) -> String {
        match &self.game_file {
            Some(g) => format!("{} {}", self.program.display(), g.display()),
            None => self.program.display().to_string(),
        }
    }
}

/// Drives a REPL subprocess: one command per stdin line, one response per
/// prompt on stdout.
#[derive(Debug, Clone)]
pub struct ProcessRecorder {
    source: Source,
    config: RecorderConfig,
}

impl ProcessRecorder {
    /// The legacy reference interpreter. A game file is required.
    pub fn reference(config: RecorderConfig) -> Self {
        Self {
            source: Source::Reference,
            config,
        }
    }

    /// The rewritten engine when it is only reachable as a REPL binary.
    pub fn model(config: RecorderConfig) -> Self {
        Self {
            source: Source::Model,
            config,
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    fn missing(&self) -> Option<String> {
        if !self.config.program.is_file() {
            return Some(format!(
                "interpreter not found at {}",
                self.config.program.display()
            ));
        }
        match &self.config.game_file {
            Some(g) if !g.is_file() => Some(format!("game file not found at {}", g.display())),
            None if self.source == Source::Reference => Some("no game file configured".into()),
            _ => None,
        }
    }

    async fn await_response<R: AsyncRead + Unpin>(
        &self,
        reader: &mut PromptReader<R>,
        command: &str,
        options: &RecordOptions,
        cancel: &CancellationToken,
    ) -> Result<Response, ParityError> {
        let timed_out = || ParityError::RecorderTimeout {
            recorder: self.source,
            command: command.to_string(),
            timeout_ms: options.timeout_ms(),
        };
        tokio::select! {
            r = reader.next_response() => r.map_err(ParityError::from),
            _ = tokio::time::sleep(options.command_timeout) => Err(timed_out()),
            _ = cancel.cancelled() => Err(timed_out()),
        }
    }

    async fn drive<R: AsyncRead + Unpin>(
        &self,
        stdin: &mut ChildStdin,
        reader: &mut PromptReader<R>,
        commands: &[String],
        options: &RecordOptions,
        cancel: &CancellationToken,
    ) -> Result<Session, ParityError> {
        let mut entries = Vec::with_capacity(commands.len() + 1);
        let first = self.await_response(reader, "", options, cancel).await?;
        let mut eof = first.eof;
        if !first.is_empty_eof() {
            entries.push(entry(0, "", first.text));
        }

        for (i, command) in commands.iter().enumerate() {
            if eof {
                break;
            }
            if let Err(e) = send_line(stdin, command).await {
                tracing::debug!(source = %self.source, error = %e, "interpreter stopped reading");
                eof = true;
                break;
            }
            let resp = self.await_response(reader, command, options, cancel).await?;
            eof = resp.eof;
            if !resp.is_empty_eof() {
                entries.push(entry(i + 1, command, resp.text));
            }
        }

        let terminated_early = eof && entries.len() < commands.len() + 1;
        if terminated_early {
            tracing::warn!(
                source = %self.source,
                recorded = entries.len(),
                expected = commands.len() + 1,
                "interpreter exited before the command list was exhausted"
            );
        }
        Ok(Session {
            entries,
            terminated_early,
        })
    }

    /// Quit politely, then wait; kill once the kill timeout passes.
    async fn shutdown(
        &self,
        child: &mut Child,
        mut stdin: ChildStdin,
        program: &str,
    ) -> Result<(), ParityError> {
        for line in &self.config.quit_sequence {
            if send_line(&mut stdin, line).await.is_err() {
                break;
            }
        }
        drop(stdin);
        match tokio::time::timeout(self.config.kill_timeout, child.wait()).await {
            Ok(Ok(status)) => {
                tracing::debug!(program, %status, "interpreter exited");
                Ok(())
            }
            Ok(Err(e)) => Err(ParityError::ProcessCleanup {
                program: program.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => {
                tracing::warn!(program, "interpreter ignored the quit sequence, killing");
                kill_and_reap(child, program).await
            }
        }
    }
}

#[async_trait::async_trait]
impl Recorder for ProcessRecorder {
    fn source(&self) -> Source {
        self.source
    }

    fn is_available(&self) -> bool {
        self.missing().is_none()
    }

    async fn record(
        &self,
        commands: &[String],
        options: &RecordOptions,
        cancel: CancellationToken,
    ) -> Result<Transcript, ParityError> {
        if let Some(reason) = self.missing() {
            return Err(ParityError::RecorderUnavailable {
                recorder: self.source,
                reason,
            });
        }
        let start_time = now_rfc3339();
        let program = self.config.program.display().to_string();

        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args);
        if let Some(game) = &self.config.game_file {
            cmd.arg(game);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| ParityError::ProcessSpawn {
            program: program.clone(),
            reason: e.to_string(),
        })?;
        let (Some(mut stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            kill_and_reap(&mut child, &program).await?;
            return Err(ParityError::ProcessSpawn {
                program,
                reason: "stdio was not captured".into(),
            });
        };
        tracing::debug!(
            source = %self.source,
            %program,
            commands = commands.len(),
            "interpreter started"
        );

        let mut reader = PromptReader::new(stdout, &self.config.prompt_marker);
        let session = self
            .drive(&mut stdin, &mut reader, commands, options, &cancel)
            .await;
        let cleanup = match &session {
            Ok(_) => self.shutdown(&mut child, stdin, &program).await,
            Err(_) => {
                drop(stdin);
                kill_and_reap(&mut child, &program).await
            }
        };
        drop(reader);

        let session = match (session, cleanup) {
            (Err(e), cleanup) => {
                if let Err(c) = cleanup {
                    tracing::warn!(error = %c, "cleanup after failed recording");
                }
                return Err(e);
            }
            (Ok(_), Err(c)) => return Err(c),
            (Ok(s), Ok(())) => s,
        };

        let label = self.config.label();
        tracing::debug!(
            source = %self.source,
            entries = session.entries.len(),
            "transcript recorded"
        );
        Ok(Transcript {
            id: transcript_id(self.source, options.seed, &label),
            source: self.source,
            start_time,
            end_time: now_rfc3339(),
            entries: session.entries,
            metadata: TranscriptMetadata {
                seed: options.seed,
                command_count: commands.len(),
                label: Some(label),
                terminated_early: session.terminated_early,
            },
        })
    }
}

struct Session {
    entries: Vec<TranscriptEntry>,
    terminated_early: bool,
}

fn entry(index: usize, command: &str, text: String) -> TranscriptEntry {
    let entry = match parse_status_moves(&text) {
        Some(turn) => TranscriptEntry::new(index, command, text, turn),
        None => TranscriptEntry::without_turn(index, command, text),
    };
    entry.with_timestamp(now_rfc3339())
}

async fn send_line(stdin: &mut ChildStdin, line: &str) -> std::io::Result<()> {
    stdin.write_all(line.as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.flush().await
}

async fn kill_and_reap(child: &mut Child, program: &str) -> Result<(), ParityError> {
    if let Ok(Some(_)) = child.try_wait() {
        return Ok(());
    }
    child.kill().await.map_err(|e| ParityError::ProcessCleanup {
        program: program.to_string(),
        reason: e.to_string(),
    })
}

// ── Prompt detection ──

#[derive(Debug, PartialEq, Eq)]
struct Response {
    text: String,
    /// Stream ended instead of a prompt.
    eof: bool,
}

impl Response {
    fn is_empty_eof(&self) -> bool {
        self.eof && self.text.is_empty()
    }
}

/// Splits a byte stream into responses at prompt lines. The last line of the
/// buffer counts even without a newline: the interpreter prints the prompt
/// and then blocks on input.
struct PromptReader<R> {
    inner: R,
    buf: Vec<u8>,
    marker: String,
    eof: bool,
}

impl<R: AsyncRead + Unpin> PromptReader<R> {
    fn new(inner: R, marker: &str) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            marker: marker.to_string(),
            eof: false,
        }
    }

    async fn next_response(&mut self) -> std::io::Result<Response> {
        loop {
            if let Some(text) = self.take_until_prompt() {
                return Ok(Response { text, eof: false });
            }
            if self.eof {
                let rest = std::mem::take(&mut self.buf);
                return Ok(Response {
                    text: String::from_utf8_lossy(&rest).into_owned(),
                    eof: true,
                });
            }
            let mut chunk = [0u8; 4096];
            let n = self.inner.read(&mut chunk).await?;
            if n == 0 {
                self.eof = true;
            } else {
                self.buf.extend_from_slice(&chunk[..n]);
            }
        }
    }

    fn take_until_prompt(&mut self) -> Option<String> {
        if self.marker.is_empty() {
            return None;
        }
        let mut start = 0;
        while start < self.buf.len() {
            let newline = self.buf[start..]
                .iter()
                .position(|&b| b == b'\n')
                .map(|p| start + p);
            let line_end = newline.unwrap_or(self.buf.len());
            if self.is_prompt(&self.buf[start..line_end]) {
                let text = String::from_utf8_lossy(&self.buf[..start]).into_owned();
                let consumed = newline.map_or(self.buf.len(), |n| n + 1);
                self.buf.drain(..consumed);
                return Some(text);
            }
            match newline {
                Some(n) => start = n + 1,
                None => break,
            }
        }
        None
    }

    fn is_prompt(&self, line: &[u8]) -> bool {
        std::str::from_utf8(line).is_ok_and(|l| l.trim_end() == self.marker)
    }
}
