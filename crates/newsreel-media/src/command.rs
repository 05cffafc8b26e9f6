//! FFmpeg command model and runner.
//!
//! A [`TranscodeCommand`] carries the ordered input declarations (from an
//! [`InputRegistry`]), one filter-graph expression, stream mappings and the
//! output flags. It renders both an argv vector for spawning and a quoted
//! shell string, which is the artifact handed to the orchestrator.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use newsreel_models::EncodingConfig;

use crate::error::{MediaError, MediaResult};
use crate::graph::{InputRegistry, Pad};
use crate::progress::FfmpegProgress;

/// A fully-specified ffmpeg invocation.
#[derive(Debug)]
pub struct TranscodeCommand {
    inputs: InputRegistry,
    filter_complex: Option<String>,
    maps: Vec<String>,
    output_args: Vec<String>,
    duration_limit: Option<f64>,
    shortest: bool,
    output: PathBuf,
}

impl TranscodeCommand {
    pub fn new(inputs: InputRegistry, output: impl AsRef<Path>) -> Self {
        Self {
            inputs,
            filter_complex: None,
            maps: Vec::new(),
            output_args: Vec::new(),
            duration_limit: None,
            shortest: false,
            output: output.as_ref().to_path_buf(),
        }
    }

    /// Attach the filter-graph expression.
    pub fn filter_complex(mut self, graph: impl Into<String>) -> Self {
        self.filter_complex = Some(graph.into());
        self
    }

    /// Map a named graph pad to the output.
    pub fn map_pad(mut self, pad: &Pad) -> Self {
        self.maps.push(pad.map_target());
        self
    }

    /// Map a raw stream specifier (e.g. `1:a?`).
    pub fn map_stream(mut self, spec: impl Into<String>) -> Self {
        self.maps.push(spec.into());
        self
    }

    /// Append one output argument.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Append several output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Standard video re-encode flags.
    pub fn encode_video(self, enc: &EncodingConfig) -> Self {
        self.output_args(enc.video_args())
    }

    /// Standard audio encode flags.
    pub fn encode_audio(self, enc: &EncodingConfig) -> Self {
        self.output_args(enc.audio_args())
    }

    /// Copy all streams without re-encoding.
    pub fn copy_streams(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    /// Cap the output duration with `-t`.
    pub fn limit_duration(mut self, seconds: f64) -> Self {
        self.duration_limit = Some(seconds);
        self
    }

    /// Stop at the shortest input stream.
    pub fn shortest(mut self) -> Self {
        self.shortest = true;
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Build the argv vector (without the `ffmpeg` binary itself).
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-progress".to_string(),
            "pipe:2".to_string(),
        ];

        args.extend(self.inputs.to_args());

        if let Some(ref filter) = self.filter_complex {
            args.push("-filter_complex".to_string());
            args.push(filter.clone());
        }

        for map in &self.maps {
            args.push("-map".to_string());
            args.push(map.clone());
        }

        args.extend(self.output_args.iter().cloned());

        if let Some(limit) = self.duration_limit {
            args.push("-t".to_string());
            args.push(format!("{limit:.3}"));
        }
        if self.shortest {
            args.push("-shortest".to_string());
        }

        args.push(self.output.to_string_lossy().into_owned());
        args
    }

    /// Render the quoted shell form of the command.
    pub fn to_shell_string(&self) -> String {
        let mut parts = vec!["ffmpeg".to_string()];
        let mut args = self.build_args().into_iter().peekable();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-i" => {
                    parts.push(arg);
                    if let Some(path) = args.next() {
                        parts.push(quote(&path));
                    }
                }
                "-filter_complex" | "-map" => {
                    parts.push(arg);
                    if let Some(value) = args.next() {
                        parts.push(quote(&value));
                    }
                }
                _ if args.peek().is_none() => parts.push(quote(&arg)),
                _ => parts.push(arg),
            }
        }
        parts.join(" ")
    }
}

fn quote(s: &str) -> String {
    format!("\"{s}\"")
}

/// Runner for transcode commands with progress reporting.
#[derive(Debug, Default)]
pub struct FfmpegRunner;

impl FfmpegRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run a command to completion.
    pub async fn run(&self, cmd: &TranscodeCommand) -> MediaResult<()> {
        self.run_with_progress(cmd, |_| {}).await
    }

    /// Run a command, invoking the callback on each progress report.
    pub async fn run_with_progress<F>(
        &self,
        cmd: &TranscodeCommand,
        progress_callback: F,
    ) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr = child.stderr.take().expect("stderr not captured");
        let mut reader = BufReader::new(stderr).lines();

        // Progress lines and error output arrive interleaved on stderr;
        // non-progress lines are kept for the failure report.
        let log_handle = tokio::spawn(async move {
            let mut current = FfmpegProgress::default();
            let mut log = String::new();

            while let Ok(Some(line)) = reader.next_line().await {
                match parse_progress_line(&line, &mut current) {
                    Some(progress) => progress_callback(progress),
                    None if !line.contains('=') => {
                        log.push_str(&line);
                        log.push('\n');
                    }
                    None => {}
                }
            }
            log
        });

        let status = child.wait().await?;
        let stderr_log = log_handle.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            warn!(exit = ?status.code(), "FFmpeg exited with non-zero status");
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                (!stderr_log.is_empty()).then_some(stderr_log),
                status.code(),
            ))
        }
    }
}

/// Parse one line of `-progress pipe:2` output, returning a snapshot on each
/// `progress=` marker.
fn parse_progress_line(line: &str, current: &mut FfmpegProgress) -> Option<FfmpegProgress> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        "out_time_us" | "out_time_ms" => {
            if let Ok(us) = value.parse::<i64>() {
                current.out_time_ms = us / 1000;
            }
        }
        "frame" => {
            if let Ok(frame) = value.parse() {
                current.frame = frame;
            }
        }
        "fps" => {
            if let Ok(fps) = value.parse() {
                current.fps = fps;
            }
        }
        "speed" => {
            if let Some(speed) = value.strip_suffix('x').and_then(|s| s.parse().ok()) {
                current.speed = speed;
            }
        }
        "progress" => {
            current.is_complete = value == "end";
            return Some(current.clone());
        }
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{InputKey, InputSpec};

    fn single_input() -> InputRegistry {
        let mut reg = InputRegistry::new();
        reg.add(InputKey::Primary, InputSpec::media("in.mp4")).unwrap();
        reg
    }

    #[test]
    fn build_args_orders_sections() {
        let cmd = TranscodeCommand::new(single_input(), "out.mp4")
            .filter_complex("[0:v]null[v]")
            .map_stream("[v]")
            .encode_video(&EncodingConfig::default())
            .shortest();

        let args = cmd.build_args();
        let i_pos = args.iter().position(|a| a == "-i").unwrap();
        let f_pos = args.iter().position(|a| a == "-filter_complex").unwrap();
        let m_pos = args.iter().position(|a| a == "-map").unwrap();
        assert!(i_pos < f_pos && f_pos < m_pos);
        assert_eq!(args.last().unwrap(), "out.mp4");
        assert!(args.contains(&"-shortest".to_string()));
    }

    #[test]
    fn duration_limit_precedes_output() {
        let cmd = TranscodeCommand::new(single_input(), "out.mp4").limit_duration(4.0);
        let args = cmd.build_args();
        let t_pos = args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(args[t_pos + 1], "4.000");
        assert!(t_pos + 2 < args.len());
    }

    #[test]
    fn shell_string_quotes_paths_and_graph() {
        let cmd = TranscodeCommand::new(single_input(), "out dir/out.mp4")
            .filter_complex("[0:v]scale=10:10[v]")
            .map_stream("[v]");
        let shell = cmd.to_shell_string();
        assert!(shell.starts_with("ffmpeg -y"));
        assert!(shell.contains("-i \"in.mp4\""));
        assert!(shell.contains("-filter_complex \"[0:v]scale=10:10[v]\""));
        assert!(shell.contains("-map \"[v]\""));
        assert!(shell.ends_with("\"out dir/out.mp4\""));
    }

    #[test]
    fn progress_parsing() {
        let mut progress = FfmpegProgress::default();
        assert!(parse_progress_line("out_time_us=5000000", &mut progress).is_none());
        assert_eq!(progress.out_time_ms, 5000);

        parse_progress_line("speed=1.5x", &mut progress);
        assert!((progress.speed - 1.5).abs() < 0.01);

        let snapshot = parse_progress_line("progress=end", &mut progress).unwrap();
        assert!(snapshot.is_complete);
    }
}
