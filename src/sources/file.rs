//! File source: polls a file for appended lines, reopening it if it
//! gets replaced (log rotation). Deliberately minimal — an interval-driven
//! poll, not an inotify-driven tail.

use std::io::SeekFrom;

use futures_util::future::BoxFuture;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::pipeline::{PipelineError, RawLine, Source};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct FileSource {
    path: String,
    source_tag: String,
}

impl FileSource {
    pub fn new(path: impl Into<String>, source_tag: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source_tag: source_tag.into(),
        }
    }

    async fn open_at_end(&self) -> std::io::Result<(File, u64)> {
        let mut file = File::open(&self.path).await?;
        let len = file.metadata().await?.len();
        file.seek(SeekFrom::Start(len)).await?;
        Ok((file, len))
    }
}

impl Source for FileSource {
    fn run<'a>(
        &'a self,
        cancel: CancellationToken,
        out: mpsc::Sender<RawLine>,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        Box::pin(async move {
            let (mut file, mut pos) = self
                .open_at_end()
                .await
                .map_err(|e| PipelineError::SourceIo(e.to_string()))?;

            let mut ticker = interval(POLL_INTERVAL);
            let mut carry = String::new();

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let current_len = match file.metadata().await {
                    Ok(meta) => meta.len(),
                    Err(e) => return Err(PipelineError::SourceIo(e.to_string())),
                };

                if current_len < pos {
                    // Rotation: the file shrank out from under us. Reopen
                    // from the start and pick up whatever is there now.
                    warn!(path = %self.path, "file source detected rotation, reopening");
                    match File::open(&self.path).await {
                        Ok(reopened) => {
                            file = reopened;
                            pos = 0;
                        }
                        Err(e) => return Err(PipelineError::SourceIo(e.to_string())),
                    }
                    continue;
                }
                if current_len == pos {
                    continue;
                }

                let mut buf = vec![0u8; (current_len - pos) as usize];
                if let Err(e) = file.seek(SeekFrom::Start(pos)).await {
                    return Err(PipelineError::SourceIo(e.to_string()));
                }
                if let Err(e) = file.read_exact(&mut buf).await {
                    return Err(PipelineError::SourceIo(e.to_string()));
                }
                pos = current_len;

                carry.push_str(&String::from_utf8_lossy(&buf));
                while let Some(idx) = carry.find('\n') {
                    let line: String = carry.drain(..=idx).collect();
                    let line = line.trim_end_matches(['\n', '\r']).to_string();
                    if line.is_empty() {
                        continue;
                    }
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
            debug!(path = %self.path, "file source exiting");
            Ok(())
        })
    }
}
