//! # tonearm-filter
//!
//! FFmpeg-backed filter pipelines for tonearm.
//!
//! A [`FilterChain`] builds [`Pipeline`]s from filter-spec strings (FFmpeg
//! `-af` syntax, e.g. `"bass=g=10"` or `"atempo=1.25"`). A pipeline feeds a
//! complete audio payload through an `ffmpeg` child process and collects raw
//! PCM (s16le, 48 kHz stereo) out, optionally entering the input at a seek
//! offset. The playback driver rebuilds its transport resource from that
//! output.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tonearm_core::{AudioSource, Error, Result};
use tracing::{debug, warn};

/// Output sample rate of every pipeline.
pub const OUTPUT_SAMPLE_RATE: u32 = 48_000;

/// Output channel count of every pipeline.
pub const OUTPUT_CHANNELS: u8 = 2;

/// Factory for FFmpeg filter pipelines.
#[derive(Debug, Clone)]
pub struct FilterChain {
    ffmpeg_path: PathBuf,
}

impl FilterChain {
    /// Use `ffmpeg` from `PATH`.
    pub fn new() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
        }
    }

    /// Use a specific `ffmpeg` binary.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: path.into(),
        }
    }

    /// Build a pipeline applying `specs` in order. An empty spec list yields
    /// a transcode-only pipeline (used for seeking without filters).
    pub fn create_pipeline(&self, specs: &[String]) -> Pipeline {
        let filter_arg = if specs.is_empty() {
            None
        } else {
            Some(specs.join(","))
        };
        Pipeline {
            ffmpeg_path: self.ffmpeg_path.clone(),
            filter_arg,
        }
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new()
    }
}

/// A constructed stream transform.
#[derive(Debug, Clone)]
pub struct Pipeline {
    ffmpeg_path: PathBuf,
    filter_arg: Option<String>,
}

impl Pipeline {
    /// The combined `-af` argument, if any filters are applied.
    pub fn filter_arg(&self) -> Option<&str> {
        self.filter_arg.as_deref()
    }

    /// Run `source` through the pipeline, optionally starting at `seek`.
    pub async fn process(
        &self,
        source: &AudioSource,
        seek: Option<Duration>,
    ) -> Result<AudioSource> {
        let mut command = Command::new(&self.ffmpeg_path);
        command
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error");
        if let Some(seek) = seek {
            command.arg("-ss").arg(format!("{:.3}", seek.as_secs_f64()));
        }
        command.arg("-i").arg("pipe:0");
        if let Some(filter) = &self.filter_arg {
            command.arg("-af").arg(filter);
        }
        command
            .arg("-f")
            .arg("s16le")
            .arg("-ar")
            .arg(OUTPUT_SAMPLE_RATE.to_string())
            .arg("-ac")
            .arg(OUTPUT_CHANNELS.to_string())
            .arg("pipe:1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            "spawning ffmpeg (filters: {})",
            self.filter_arg.as_deref().unwrap_or("none")
        );

        let mut child = command
            .spawn()
            .map_err(|e| Error::Filter(format!("failed to spawn ffmpeg: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Filter("failed to open ffmpeg stdin".to_string()))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Filter("failed to open ffmpeg stdout".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Filter("failed to open ffmpeg stderr".to_string()))?;

        // Feed stdin from a separate task so a full stdout pipe cannot
        // deadlock the write.
        let input = source.data.clone();
        let writer = tokio::spawn(async move {
            if let Err(e) = stdin.write_all(&input).await {
                warn!("ffmpeg stdin write ended early: {e}");
            }
            drop(stdin);
        });

        let mut output = Vec::new();
        stdout
            .read_to_end(&mut output)
            .await
            .map_err(|e| Error::Filter(format!("failed to read ffmpeg output: {e}")))?;

        let mut errors = String::new();
        let _ = stderr.read_to_string(&mut errors).await;

        let status = child
            .wait()
            .await
            .map_err(|e| Error::Filter(format!("failed to wait for ffmpeg: {e}")))?;
        let _ = writer.await;

        if !status.success() {
            let first_line = errors.lines().next().unwrap_or("unknown error");
            return Err(Error::Filter(format!("ffmpeg failed: {first_line}")));
        }
        if output.is_empty() {
            return Err(Error::Filter("ffmpeg produced no output".to_string()));
        }

        debug!("pipeline produced {} bytes of PCM", output.len());
        Ok(AudioSource::raw_pcm(output))
    }
}
