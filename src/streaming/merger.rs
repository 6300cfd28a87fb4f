//! Stream merger
//!
//! Fans one primary source (typically a model's output stream) and any
//! number of auxiliary sources (tool-execution streams) into one output
//! stream. Each source gets its own forwarding task; order is preserved
//! within a source and unspecified across sources.
//!
//! ```rust,ignore
//! let merger = StreamMerger::new(&ctx, model_stream, vec![tool_stream]);
//! let mut merged = merger.start();
//! while let Some(event) = merged.next().await { /* ... */ }
//! merger.stop().await;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;

use super::ReceiverStream;
use crate::context::CallContext;
use crate::error::LlmError;
use crate::types::ChatStreamEvent;

const DEFAULT_BUFFER: usize = 64;

/// Merger over chat event streams.
pub type ChatStreamMerger = StreamMerger<Result<ChatStreamEvent, LlmError>>;

/// Single-use fan-in of N event sources.
pub struct StreamMerger<T> {
    ctx: CallContext,
    sources: Mutex<Option<Vec<BoxStream<'static, T>>>>,
    source_count: usize,
    sender: Mutex<Option<mpsc::Sender<T>>>,
    output: ReceiverStream<T>,
    tracker: TaskTracker,
    started: AtomicBool,
}

impl<T: Send + 'static> StreamMerger<T> {
    /// Create a merger. Cancelling `parent` (or calling [`stop`](Self::stop))
    /// shuts every forwarding task down.
    pub fn new(
        parent: &CallContext,
        primary: BoxStream<'static, T>,
        auxiliary: Vec<BoxStream<'static, T>>,
    ) -> Self {
        let mut sources = Vec::with_capacity(auxiliary.len() + 1);
        sources.push(primary);
        sources.extend(auxiliary);

        let (tx, rx) = mpsc::channel(DEFAULT_BUFFER);
        Self {
            ctx: parent.child(),
            source_count: sources.len(),
            sources: Mutex::new(Some(sources)),
            sender: Mutex::new(Some(tx)),
            output: ReceiverStream::new(rx),
            tracker: TaskTracker::new(),
            started: AtomicBool::new(false),
        }
    }

    /// Set the output channel capacity. Must be called before `start`.
    pub fn with_buffer(mut self, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.sender = Mutex::new(Some(tx));
        self.output = ReceiverStream::new(rx);
        self
    }

    /// Number of sources handed to the merger, primary included.
    pub fn source_count(&self) -> usize {
        self.source_count
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Start forwarding and return the merged stream.
    ///
    /// Only the first call spawns tasks; later calls return another handle
    /// on the same output channel. Handles compete for items, and every
    /// handle ends once the output closes. Must be called inside a tokio
    /// runtime.
    pub fn start(&self) -> BoxStream<'static, T> {
        if !self.started.swap(true, Ordering::AcqRel) {
            let sources = self
                .sources
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
                .unwrap_or_default();
            let sender = self
                .sender
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(tx) = sender {
                self.spawn_forwarders(sources, tx);
            }
        }
        self.output.clone().boxed()
    }

    fn spawn_forwarders(&self, sources: Vec<BoxStream<'static, T>>, tx: mpsc::Sender<T>) {
        tracing::debug!(
            request_id = %self.ctx.request_id(),
            sources = sources.len(),
            "starting stream merger"
        );
        for (index, source) in sources.into_iter().enumerate() {
            self.tracker
                .spawn(forward(index, source, tx.clone(), self.ctx.clone()));
        }
        self.tracker.close();

        // The orchestrator owns the last sender; dropping it closes the
        // output once the forwarders are gone.
        let tracker = self.tracker.clone();
        let ctx = self.ctx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tracker.wait() => {
                    tracing::debug!(request_id = %ctx.request_id(), "all merged sources drained");
                }
                _ = ctx.cancelled() => {
                    tracing::debug!(request_id = %ctx.request_id(), "stream merger cancelled");
                }
            }
            drop(tx);
        });
    }

    /// Cancel forwarding and wait for every forwarding task to exit.
    pub async fn stop(&self) {
        self.ctx.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

async fn forward<T>(
    index: usize,
    mut source: BoxStream<'static, T>,
    tx: mpsc::Sender<T>,
    ctx: CallContext,
) {
    loop {
        let item = tokio::select! {
            biased;
            _ = ctx.cancelled() => break,
            item = source.next() => item,
        };
        let Some(item) = item else {
            tracing::trace!(source = index, "merged source finished");
            return;
        };
        tokio::select! {
            biased;
            _ = ctx.cancelled() => break,
            sent = tx.send(item) => {
                if sent.is_err() {
                    // Output dropped by the consumer
                    return;
                }
            }
        }
    }
    tracing::trace!(source = index, "merged source cancelled");
}

/// Merge `primary` and `auxiliary` into one stream.
///
/// The merger stops when every source ends or `ctx` is cancelled.
pub fn merge_streams<T: Send + 'static>(
    ctx: &CallContext,
    primary: BoxStream<'static, T>,
    auxiliary: Vec<BoxStream<'static, T>>,
) -> BoxStream<'static, T> {
    StreamMerger::new(ctx, primary, auxiliary).start()
}
