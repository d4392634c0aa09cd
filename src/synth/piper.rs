//! Production [`SynthEngine`] driving the `piper` binary.
//!
//! Invocation: `piper --model <model> --output-raw --length-scale <speed>`,
//! text on stdin, raw PCM on stdout, diagnostics on stderr (one message per
//! line). Closing stdin signals end-of-input; piper exits on its own once
//! its output is flushed. Killing a process that lingers after the output
//! stream reaches end-of-file is a safety net, not the expected path.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

use super::{SynthEngine, SynthError, SynthesisRequest};
use crate::playback::AudioBuffer;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Subprocess-based synthesis engine.
pub struct PiperEngine {
    binary: PathBuf,
}

impl PiperEngine {
    /// `binary` must point at an existing piper executable; `main` verifies
    /// this once at startup.
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }

    fn command(&self, request: &SynthesisRequest) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--model")
            .arg(&request.model)
            .arg("--output-raw")
            .arg("--length-scale")
            .arg(request.speed.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Model paths in settings.conf are usually relative to the binary.
        if let Some(dir) = self.binary.parent() {
            cmd.current_dir(dir);
        }

        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        cmd
    }
}

#[async_trait]
impl SynthEngine for PiperEngine {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioBuffer, SynthError> {
        // Nothing to synthesize — never spawn a process for silence.
        if request.text.is_empty() {
            return Ok(AudioBuffer::default());
        }

        let mut child = self
            .command(request)
            .spawn()
            .map_err(|e| SynthError::Spawn(format!("{}: {e}", self.binary.display())))?;

        log::debug!(
            "piper started (model={}, length-scale={})",
            request.model,
            request.speed
        );

        // The pipes are always present with Stdio::piped; a missing handle
        // would be a tokio bug, treated as a spawn failure.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SynthError::Spawn("stdin handle missing".into()))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| SynthError::Spawn("stdout handle missing".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| SynthError::Spawn("stderr handle missing".into()))?;

        // Drain stderr line-by-line into the log, concurrently with the
        // stdout drain below. Informational only, never fatal.
        let stderr_drain = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if !line.is_empty() {
                    log::info!("piper: {line}");
                }
            }
        });

        // Feed the sanitized text and close stdin to signal end-of-input,
        // concurrently with the stdout drain — the engine may start
        // writing audio before it has consumed all of its input, and a
        // sequential write-then-read could deadlock on full pipes.
        let text = request.text.clone();
        let feed = async move {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| SynthError::Stdin(e.to_string()))?;
            stdin
                .write_all(b"\n")
                .await
                .map_err(|e| SynthError::Stdin(e.to_string()))?;
            stdin
                .shutdown()
                .await
                .map_err(|e| SynthError::Stdin(e.to_string()))?;
            // stdin drops here, closing the pipe.
            Ok::<_, SynthError>(())
        };

        // Drain stdout fully; end-of-stream means the buffer is complete.
        let mut audio = Vec::new();
        let drain = async {
            stdout
                .read_to_end(&mut audio)
                .await
                .map_err(|e| SynthError::Stdout(e.to_string()))
        };

        let (feed_result, read_result) = tokio::join!(feed, drain);
        // A broken pipe on stdin usually means the engine died early (bad
        // model); surface that after the child has been reaped below.

        // Safety net: the process should have exited once stdin closed and
        // stdout flushed. If it lingers, terminate it.
        if matches!(child.try_wait(), Ok(None)) {
            log::warn!("piper still running after output drain, terminating");
            if let Err(e) = child.kill().await {
                log::warn!("failed to terminate piper: {e}");
            }
        }

        match child.wait().await {
            Ok(status) => {
                log::info!("piper exited with {status}");
                // A non-zero exit does not discard audio that was already
                // received; it is logged above and playback proceeds.
            }
            Err(e) => log::warn!("failed to await piper exit: {e}"),
        }

        let _ = stderr_drain.await;

        feed_result?;
        read_result?;

        if audio.is_empty() {
            return Err(SynthError::EmptyAudio);
        }

        log::info!("received {} bytes of audio data", audio.len());
        Ok(AudioBuffer::from_bytes(audio))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> SynthesisRequest {
        SynthesisRequest {
            model: "voice.onnx".into(),
            speed: 1.0,
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn empty_text_is_a_no_op_and_spawns_nothing() {
        // A binary path that cannot possibly exist: if the engine tried to
        // spawn, this would fail with Spawn instead of returning Ok.
        let engine = PiperEngine::new(PathBuf::from("definitely/not/a/real/piper"));
        let audio = engine.synthesize(&request("")).await.expect("no-op");
        assert!(audio.is_empty());
    }

    #[tokio::test]
    async fn missing_binary_reports_spawn_error() {
        let engine = PiperEngine::new(PathBuf::from("definitely/not/a/real/piper"));
        let err = engine
            .synthesize(&request("hello"))
            .await
            .expect_err("binary does not exist");
        assert!(matches!(err, SynthError::Spawn(_)));
    }

    /// Write an executable shell script that stands in for piper.
    #[cfg(unix)]
    fn fake_engine(dir: &std::path::Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("piper");
        std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).expect("write script");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
            .expect("chmod script");
        script
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn collects_stdout_and_survives_stderr_chatter() {
        let dir = tempfile::tempdir().expect("temp dir");
        let script = fake_engine(
            dir.path(),
            "cat > /dev/null\necho 'loading model' >&2\nprintf 'PCMDATA'",
        );

        let engine = PiperEngine::new(script);
        let audio = engine
            .synthesize(&request("hello world"))
            .await
            .expect("synthesize");
        assert_eq!(audio.len(), 7);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn empty_engine_output_is_empty_audio_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let script = fake_engine(dir.path(), "cat > /dev/null");

        let engine = PiperEngine::new(script);
        let err = engine
            .synthesize(&request("hello"))
            .await
            .expect_err("no output produced");
        assert!(matches!(err, SynthError::EmptyAudio));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_does_not_discard_received_audio() {
        let dir = tempfile::tempdir().expect("temp dir");
        let script = fake_engine(dir.path(), "cat > /dev/null\nprintf 'DATA'\nexit 3");

        let engine = PiperEngine::new(script);
        let audio = engine
            .synthesize(&request("hello"))
            .await
            .expect("audio was received before the failure exit");
        assert_eq!(audio.len(), 4);
    }
}
