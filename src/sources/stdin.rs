//! Stdin source: reads lines from standard input until EOF or
//! cancellation.

use futures_util::future::BoxFuture;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::pipeline::{PipelineError, RawLine, Source};

pub struct StdinSource {
    source_tag: String,
}

impl StdinSource {
    pub fn new(source_tag: impl Into<String>) -> Self {
        Self {
            source_tag: source_tag.into(),
        }
    }

    /// Line-reading loop, generic over the reader so it can be driven by an
    /// in-memory pipe in tests instead of the real process stdin.
    async fn run_with_reader<R: AsyncRead + Unpin>(
        &self,
        reader: R,
        cancel: CancellationToken,
        out: mpsc::Sender<RawLine>,
    ) -> Result<(), PipelineError> {
        let mut lines = BufReader::new(reader).lines();
        loop {
            let line = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                res = lines.next_line() => res.map_err(|e| PipelineError::SourceIo(e.to_string()))?,
            };
            let Some(text) = line else { break };

            let raw = RawLine {
                text,
                source_tag: self.source_tag.clone(),
            };
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                res = out.send(raw) => if res.is_err() { break },
            }
        }
        debug!(tag = %self.source_tag, "stdin source exiting");
        Ok(())
    }
}

impl Source for StdinSource {
    fn run<'a>(
        &'a self,
        cancel: CancellationToken,
        out: mpsc::Sender<RawLine>,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        Box::pin(self.run_with_reader(tokio::io::stdin(), cancel, out))
    }
}
