//! Stdout sink: serializes each `NormalizedEvent` as one JSON object
//! per line (or pretty-printed, per config) to standard output.

use futures_util::future::BoxFuture;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::event::NormalizedEvent;
use crate::pipeline::{PipelineError, Sink};

pub struct StdoutSink {
    pretty: bool,
}

impl StdoutSink {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn encode(&self, event: &NormalizedEvent) -> Result<String, PipelineError> {
        let result = if self.pretty {
            serde_json::to_string_pretty(event)
        } else {
            serde_json::to_string(event)
        };
        result.map_err(|e| PipelineError::SinkWrite(e.to_string()))
    }
}

impl Sink for StdoutSink {
    fn run<'a>(
        &'a self,
        cancel: CancellationToken,
        mut input: mpsc::Receiver<NormalizedEvent>,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        Box::pin(async move {
            let mut out = BufWriter::new(tokio::io::stdout());
            loop {
                let event = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    maybe = input.recv() => match maybe {
                        Some(event) => event,
                        None => break,
                    },
                };

                let line = self.encode(&event)?;
                out.write_all(line.as_bytes())
                    .await
                    .map_err(|e| PipelineError::SinkWrite(e.to_string()))?;
                out.write_all(b"\n")
                    .await
                    .map_err(|e| PipelineError::SinkWrite(e.to_string()))?;
                out.flush()
                    .await
                    .map_err(|e| PipelineError::SinkWrite(e.to_string()))?;
            }
            debug!("stdout sink exiting");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::NormalizedEvent;

    fn sample_event() -> NormalizedEvent {
        let mut e = NormalizedEvent::new("plain", "stdin");
        e.src_service = "auth-service".to_string();
        e.set_latency(std::time::Duration::from_millis(12));
        e
    }

    #[test]
    fn compact_encoding_is_single_line_json() {
        let sink = StdoutSink::new(false);
        let line = sink.encode(&sample_event()).unwrap();
        assert!(!line.contains('\n'));
        assert!(line.contains("\"latency\":12000000"));
        assert!(!line.contains("latency_ns"));
    }

    #[test]
    fn pretty_encoding_spans_multiple_lines() {
        let sink = StdoutSink::new(true);
        let line = sink.encode(&sample_event()).unwrap();
        assert!(line.contains('\n'));
        assert!(line.contains("\"latency\": 12000000"));
    }

    #[tokio::test]
    async fn run_drains_the_channel_and_exits_cleanly() {
        let sink = StdoutSink::new(false);
        let (tx, rx) = mpsc::channel(4);
        for _ in 0..3 {
            tx.send(sample_event()).await.unwrap();
        }
        drop(tx);

        let result = sink.run(CancellationToken::new(), rx).await;
        assert!(result.is_ok());
    }
}
