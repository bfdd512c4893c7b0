//! The fixed middle of the topology: parse, optional transform, and
//! enrichment. Sources and sinks are supplied by the caller; fan-in is
//! implicit in how the channels are wired up in `mod.rs`.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::event::NormalizedEvent;
use crate::parse;
use crate::resolve::Resolver;

use super::traits::{RawLine, Transform};

/// Drains `fan_in`, runs format dispatch on each line, forwards the result.
/// Exits when the channel closes or cancellation fires; never blocks past
/// either.
pub async fn run_parse_stage(
    mut fan_in: mpsc::Receiver<RawLine>,
    out: mpsc::Sender<NormalizedEvent>,
    cancel: CancellationToken,
) {
    loop {
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            maybe = fan_in.recv() => match maybe {
                Some(line) => line,
                None => break,
            },
        };

        let event = parse::dispatch(&line.text, &line.source_tag);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            res = out.send(event) => if res.is_err() { break },
        }
    }
    debug!("parse stage exiting");
}

/// Applies a configured transform in place; a no-op pass-through when none
/// is configured (the caller then wires the parse output directly to the
/// enrich stage instead of spawning this one).
pub async fn run_transform_stage(
    transform: Arc<dyn Transform>,
    mut input: mpsc::Receiver<NormalizedEvent>,
    out: mpsc::Sender<NormalizedEvent>,
    cancel: CancellationToken,
) {
    loop {
        let mut event = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            maybe = input.recv() => match maybe {
                Some(event) => event,
                None => break,
            },
        };

        transform.apply(&mut event);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            res = out.send(event) => if res.is_err() { break },
        }
    }
    debug!("transform stage exiting");
}

/// Resolves `dst_service` and, when empty, `src_service`. A missing
/// resolver makes this stage a pure pass-through.
pub async fn run_enrich_stage(
    resolver: Option<Arc<dyn Resolver>>,
    mut input: mpsc::Receiver<NormalizedEvent>,
    out: mpsc::Sender<NormalizedEvent>,
    cancel: CancellationToken,
) {
    loop {
        let mut event = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            maybe = input.recv() => match maybe {
                Some(event) => event,
                None => break,
            },
        };

        if let Some(resolver) = &resolver {
            if !event.dst_service.is_empty() {
                let (resolved, found) = resolver.resolve(&event.dst_service).await;
                if found {
                    event.dst_service = resolved;
                }
            }
            if event.src_service.is_empty() {
                let (resolved, found) = resolver.resolve(&event.source_name).await;
                if found {
                    event.src_service = resolved;
                }
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            res = out.send(event) => if res.is_err() { break },
        }
    }
    debug!("enrich stage exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, tag: &str) -> RawLine {
        RawLine {
            text: text.to_string(),
            source_tag: tag.to_string(),
        }
    }

    fn message(event: &NormalizedEvent) -> &str {
        event.raw.get("message").and_then(|v| v.as_str()).unwrap()
    }

    #[tokio::test]
    async fn parse_stage_preserves_order_within_a_source() {
        let (tx, rx) = mpsc::channel(8);
        let (out_tx, mut out_rx) = mpsc::channel(8);
        let handle = tokio::spawn(run_parse_stage(rx, out_tx, CancellationToken::new()));

        let sent: Vec<String> = (0..5).map(|i| format!("line-{i}")).collect();
        for text in &sent {
            tx.send(line(text, "stdin")).await.unwrap();
        }
        drop(tx);

        let mut seen = Vec::new();
        while let Some(event) = out_rx.recv().await {
            seen.push(message(&event).to_string());
        }
        handle.await.unwrap();

        assert_eq!(seen, sent);
    }

    #[tokio::test]
    async fn cancellation_stops_admission_without_losing_the_in_flight_event() {
        let (tx, rx) = mpsc::channel(8);
        let (out_tx, mut out_rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_parse_stage(rx, out_tx, cancel.clone()));

        tx.send(line("in-flight", "stdin")).await.unwrap();
        let first = out_rx
            .recv()
            .await
            .expect("the event already admitted before cancellation must still be forwarded");
        assert_eq!(message(&first), "in-flight");

        cancel.cancel();
        // Enqueued only after cancellation fires: admission has already stopped, so this
        // must never reach `out_rx`.
        let _ = tx.send(line("after-cancel", "stdin")).await;

        handle.await.expect("stage task must exit cleanly on cancellation");
        assert!(
            out_rx.recv().await.is_none(),
            "no event sent after cancellation should be admitted"
        );
    }
}
