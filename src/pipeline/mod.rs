//! The pipeline runtime (C4): wires sources, an optional transform, the
//! resolver, and a sink together through bounded channels and drives them
//! to completion under a single shared cancellation token.

pub mod error;
pub mod stage;
pub mod traits;

pub use error::PipelineError;
pub use traits::{RawLine, Sink, Source, Transform};

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::event::NormalizedEvent;
use crate::resolve::Resolver;

const CHANNEL_CAPACITY: usize = 100;
const ERROR_CHANNEL_CAPACITY: usize = 8;

pub struct Pipeline {
    sources: Vec<Box<dyn Source>>,
    transform: Option<Arc<dyn Transform>>,
    resolver: Option<Arc<dyn Resolver>>,
    sink: Box<dyn Sink>,
}

impl Pipeline {
    /// Fails only on the zero-source configuration error;
    /// "exactly one sink" is enforced by `Config::validate` instead, since
    /// the type already only accepts a single `Box<dyn Sink>`.
    pub fn new(
        sources: Vec<Box<dyn Source>>,
        transform: Option<Arc<dyn Transform>>,
        resolver: Option<Arc<dyn Resolver>>,
        sink: Box<dyn Sink>,
    ) -> Result<Self, PipelineError> {
        if sources.is_empty() {
            return Err(PipelineError::Config(
                "at least one source is required".to_string(),
            ));
        }
        Ok(Self {
            sources,
            transform,
            resolver,
            sink,
        })
    }

    /// Drives every stage to completion and returns the first fatal error
    /// reported by a source or the sink. `Ok(())` covers both a clean drain
    /// and a cancellation requested by the caller.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), PipelineError> {
        let (fan_in_tx, fan_in_rx) = mpsc::channel::<RawLine>(CHANNEL_CAPACITY);
        let (parsed_tx, parsed_rx) = mpsc::channel::<NormalizedEvent>(CHANNEL_CAPACITY);
        let (sink_tx, sink_rx) = mpsc::channel::<NormalizedEvent>(CHANNEL_CAPACITY);
        let (err_tx, mut err_rx) = mpsc::channel::<PipelineError>(ERROR_CHANNEL_CAPACITY);

        let mut handles = Vec::new();

        // Sources share the fan-in sender; the channel only closes once
        // every clone (including every source task's) has dropped, which
        // the final `drop(fan_in_tx)` below accounts for.
        for source in self.sources {
            let tx = fan_in_tx.clone();
            let err = err_tx.clone();
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                if let Err(e) = source.run(cancel, tx).await {
                    let _ = err.send(e).await;
                }
            }));
        }
        drop(fan_in_tx);

        handles.push(tokio::spawn(stage::run_parse_stage(
            fan_in_rx,
            parsed_tx,
            cancel.clone(),
        )));

        let pre_enrich_rx = if let Some(transform) = self.transform {
            let (post_tx, post_rx) = mpsc::channel::<NormalizedEvent>(CHANNEL_CAPACITY);
            handles.push(tokio::spawn(stage::run_transform_stage(
                transform,
                parsed_rx,
                post_tx,
                cancel.clone(),
            )));
            post_rx
        } else {
            parsed_rx
        };

        handles.push(tokio::spawn(stage::run_enrich_stage(
            self.resolver,
            pre_enrich_rx,
            sink_tx,
            cancel.clone(),
        )));

        let sink_err = err_tx.clone();
        let sink_cancel = cancel.clone();
        let sink = self.sink;
        handles.push(tokio::spawn(async move {
            if let Err(e) = sink.run(sink_cancel, sink_rx).await {
                let _ = sink_err.send(e).await;
            }
        }));
        drop(err_tx);

        let mut first_error = None;
        while let Some(e) = err_rx.recv().await {
            if first_error.is_none() {
                error!(error = %e, "pipeline stage failed, cancelling");
                cancel.cancel();
                first_error = Some(e);
            }
        }

        for handle in handles {
            let _ = handle.await;
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use futures_util::future::BoxFuture;

    struct VecSource {
        tag: String,
        lines: Vec<String>,
    }

    impl Source for VecSource {
        fn run<'a>(
            &'a self,
            cancel: CancellationToken,
            out: mpsc::Sender<RawLine>,
        ) -> BoxFuture<'a, Result<(), PipelineError>> {
            Box::pin(async move {
                for text in &self.lines {
                    let raw = RawLine {
                        text: text.clone(),
                        source_tag: self.tag.clone(),
                    };
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        res = out.send(raw) => if res.is_err() { break },
                    }
                }
                Ok(())
            })
        }
    }

    /// Emits one line, then blocks on `cancel` forever, the way a tailed
    /// file or a Docker log stream would sit waiting for more input.
    struct OneLineThenBlockSource {
        tag: String,
    }

    impl Source for OneLineThenBlockSource {
        fn run<'a>(
            &'a self,
            cancel: CancellationToken,
            out: mpsc::Sender<RawLine>,
        ) -> BoxFuture<'a, Result<(), PipelineError>> {
            Box::pin(async move {
                let _ = out
                    .send(RawLine {
                        text: "first".to_string(),
                        source_tag: self.tag.clone(),
                    })
                    .await;
                cancel.cancelled().await;
                Ok(())
            })
        }
    }

    struct CollectingSink {
        collected: Arc<Mutex<Vec<NormalizedEvent>>>,
    }

    impl Sink for CollectingSink {
        fn run<'a>(
            &'a self,
            cancel: CancellationToken,
            mut input: mpsc::Receiver<NormalizedEvent>,
        ) -> BoxFuture<'a, Result<(), PipelineError>> {
            Box::pin(async move {
                loop {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        maybe = input.recv() => match maybe {
                            Some(event) => self.collected.lock().unwrap().push(event),
                            None => break,
                        },
                    }
                }
                Ok(())
            })
        }
    }

    fn message(event: &NormalizedEvent) -> String {
        event
            .raw
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn events_from_a_single_source_reach_the_sink_in_order() {
        let lines: Vec<String> = (0..10).map(|i| format!("line-{i}")).collect();
        let source: Box<dyn Source> = Box::new(VecSource {
            tag: "stdin".to_string(),
            lines: lines.clone(),
        });
        let collected = Arc::new(Mutex::new(Vec::new()));
        let sink: Box<dyn Sink> = Box::new(CollectingSink {
            collected: collected.clone(),
        });

        let pipeline = Pipeline::new(vec![source], None, None, sink).unwrap();
        pipeline.run(CancellationToken::new()).await.unwrap();

        let got: Vec<String> = collected.lock().unwrap().iter().map(message).collect();
        assert_eq!(got, lines);
    }

    #[tokio::test]
    async fn cancellation_drains_in_flight_events_and_admits_nothing_new() {
        let source: Box<dyn Source> = Box::new(OneLineThenBlockSource {
            tag: "stdin".to_string(),
        });
        let collected = Arc::new(Mutex::new(Vec::new()));
        let sink: Box<dyn Sink> = Box::new(CollectingSink {
            collected: collected.clone(),
        });
        let pipeline = Pipeline::new(vec![source], None, None, sink).unwrap();

        let cancel = CancellationToken::new();
        let cancel_after_delay = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            cancel_after_delay.cancel();
        });

        pipeline.run(cancel).await.unwrap();

        let got = collected.lock().unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(message(&got[0]), "first");
    }

    #[test]
    fn new_rejects_zero_sources() {
        let sink: Box<dyn Sink> = Box::new(CollectingSink {
            collected: Arc::new(Mutex::new(Vec::new())),
        });
        assert!(Pipeline::new(Vec::new(), None, None, sink).is_err());
    }
}
