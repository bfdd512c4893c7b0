//! Docker source: streams a container's combined stdout/stderr log,
//! tagging each line with its configured source tag (usually `"docker"`).

use bollard::container::LogOutput;
use bollard::query_parameters::LogsOptions;
use bollard::Docker;
use futures_util::future::BoxFuture;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::pipeline::{PipelineError, RawLine, Source};

pub struct DockerSource {
    container_id: String,
    source_tag: String,
}

impl DockerSource {
    pub fn new(container_id: impl Into<String>, source_tag: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            source_tag: source_tag.into(),
        }
    }
}

impl Source for DockerSource {
    fn run<'a>(
        &'a self,
        cancel: CancellationToken,
        out: mpsc::Sender<RawLine>,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        Box::pin(async move {
            let client = Docker::connect_with_local_defaults()
                .map_err(|e| PipelineError::SourceIo(e.to_string()))?;

            let options = LogsOptions {
                follow: true,
                stdout: true,
                stderr: true,
                since: 0,
                until: 0,
                timestamps: false,
                tail: "all".to_string(),
            };
            let mut stream = client.logs(&self.container_id, Some(options));

            loop {
                let chunk = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    chunk = stream.next() => chunk,
                };
                let Some(chunk) = chunk else { break };
                let output = chunk.map_err(|e| PipelineError::SourceIo(e.to_string()))?;

                for line in lines_from_output(output) {
                    let raw = RawLine {
                        text: line,
                        source_tag: self.source_tag.clone(),
                    };
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Ok(()),
                        res = out.send(raw) => if res.is_err() { return Ok(()) },
                    }
                }
            }
            debug!(container_id = %self.container_id, "docker source exiting");
            Ok(())
        })
    }
}

/// Unwraps a stream chunk's stdout/stderr/stdin/console payload and splits
/// it into non-empty text lines, dropping the stream-origin tag (stdout vs.
/// stderr is not part of the normalized event schema).
fn lines_from_output(output: LogOutput) -> Vec<String> {
    let message = match output {
        LogOutput::StdOut { message } => message,
        LogOutput::StdErr { message } => message,
        LogOutput::StdIn { message } => message,
        LogOutput::Console { message } => message,
    };
    String::from_utf8_lossy(&message)
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn splits_multiline_chunk_into_separate_lines() {
        let output = LogOutput::StdOut {
            message: Bytes::from_static(b"first line\nsecond line\n"),
        };
        assert_eq!(
            lines_from_output(output),
            vec!["first line".to_string(), "second line".to_string()]
        );
    }

    #[test]
    fn blank_lines_are_dropped() {
        let output = LogOutput::StdErr {
            message: Bytes::from_static(b"one\n\ntwo\n"),
        };
        assert_eq!(
            lines_from_output(output),
            vec!["one".to_string(), "two".to_string()]
        );
    }

    #[test]
    fn stdout_and_stderr_both_carry_through() {
        let stdout = LogOutput::StdOut {
            message: Bytes::from_static(b"out\n"),
        };
        let stderr = LogOutput::StdErr {
            message: Bytes::from_static(b"err\n"),
        };
        assert_eq!(lines_from_output(stdout), vec!["out".to_string()]);
        assert_eq!(lines_from_output(stderr), vec!["err".to_string()]);
    }
}
