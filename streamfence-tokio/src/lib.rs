//! Tokio glue for `streamfence`.
//!
//! `MarkerStream` is runtime-agnostic and single-owner. This crate helps async producers feed it:
//!
//! - Coalesce tiny deltas into larger chunks (newline-gated and/or time-window flush).
//! - Run an actor task that owns a `MarkerStream` and emits owned `Update`s.

use std::time::Duration;

use streamfence::{MarkerStream, Update};
use tokio::sync::mpsc;
use tokio::time::Instant;

#[derive(Clone, Copy, Debug)]
pub struct CoalesceOptions {
    /// Flush once a newline is observed in the buffered text.
    pub flush_on_newline: bool,
    /// Flush if nothing was flushed for this long after the first buffered delta.
    pub max_delay: Duration,
    /// Flush when buffered bytes reach this limit.
    pub max_bytes: usize,
}

impl Default for CoalesceOptions {
    fn default() -> Self {
        Self {
            flush_on_newline: true,
            max_delay: Duration::from_millis(60),
            max_bytes: 8 * 1024,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlushReason {
    Newline,
    MaxDelay,
    MaxBytes,
    ChannelClosed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoalescedChunk {
    pub text: String,
    pub reason: FlushReason,
    /// Number of input deltas merged into this chunk.
    pub merged_messages: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoalesceStats {
    pub total_in_messages: u64,
    pub total_out_chunks: u64,
    pub total_out_bytes: u64,
    pub last_reason: Option<FlushReason>,
}

/// A receiver wrapper that merges high-frequency deltas into fewer, larger chunks.
pub struct CoalescingReceiver {
    rx: mpsc::Receiver<String>,
    opts: CoalesceOptions,
    buf: String,
    merged: usize,
    deadline: Option<Instant>,
    stats: CoalesceStats,
}

impl CoalescingReceiver {
    pub fn new(rx: mpsc::Receiver<String>, opts: CoalesceOptions) -> Self {
        Self {
            rx,
            opts,
            buf: String::new(),
            merged: 0,
            deadline: None,
            stats: CoalesceStats::default(),
        }
    }

    pub fn options(&self) -> CoalesceOptions {
        self.opts
    }

    pub fn stats(&self) -> CoalesceStats {
        self.stats
    }

    /// Receive the next coalesced chunk, or `None` once the channel is closed and drained.
    pub async fn recv(&mut self) -> Option<String> {
        self.recv_with_meta().await.map(|c| c.text)
    }

    pub async fn recv_with_meta(&mut self) -> Option<CoalescedChunk> {
        if self.buf.is_empty() {
            let first = self.rx.recv().await?;
            self.push(&first);
        }

        loop {
            if let Some(reason) = self.ready_reason() {
                return Some(self.flush(reason));
            }

            let deadline = *self
                .deadline
                .get_or_insert_with(|| Instant::now() + self.opts.max_delay);
            match tokio::time::timeout_at(deadline, self.rx.recv()).await {
                Ok(Some(delta)) => self.push(&delta),
                Ok(None) => return Some(self.flush(FlushReason::ChannelClosed)),
                Err(_) => return Some(self.flush(FlushReason::MaxDelay)),
            }
        }
    }

    fn push(&mut self, delta: &str) {
        if self.buf.is_empty() {
            self.deadline = Some(Instant::now() + self.opts.max_delay);
        }
        self.buf.push_str(delta);
        self.merged += 1;
    }

    fn ready_reason(&self) -> Option<FlushReason> {
        if self.buf.len() >= self.opts.max_bytes {
            return Some(FlushReason::MaxBytes);
        }
        if self.opts.flush_on_newline && self.buf.contains('\n') {
            return Some(FlushReason::Newline);
        }
        None
    }

    fn flush(&mut self, reason: FlushReason) -> CoalescedChunk {
        let text = std::mem::take(&mut self.buf);
        let merged_messages = std::mem::take(&mut self.merged);
        self.deadline = None;

        self.stats.total_in_messages = self
            .stats
            .total_in_messages
            .saturating_add(merged_messages as u64);
        self.stats.total_out_chunks = self.stats.total_out_chunks.saturating_add(1);
        self.stats.total_out_bytes = self.stats.total_out_bytes.saturating_add(text.len() as u64);
        self.stats.last_reason = Some(reason);

        CoalescedChunk {
            text,
            reason,
            merged_messages,
        }
    }
}

/// Spawn a task that owns `stream` and emits one owned `Update` per coalesced chunk.
///
/// The final update comes from `finalize` once every input sender is dropped. The task stops
/// early if the returned receiver is dropped.
pub fn spawn_marker_actor(
    mut stream: MarkerStream,
    rx: mpsc::Receiver<String>,
    opts: CoalesceOptions,
) -> mpsc::Receiver<Update> {
    let (tx_out, rx_out) = mpsc::channel::<Update>(64);

    tokio::spawn(async move {
        let mut rx = CoalescingReceiver::new(rx, opts);
        while let Some(chunk) = rx.recv().await {
            let update = stream.append(&chunk);
            if tx_out.send(update).await.is_err() {
                tracing::debug!("update receiver dropped; stopping marker actor");
                return;
            }
        }
        let update = stream.finalize();
        let _ = tx_out.send(update).await;
        tracing::debug!(stats = ?rx.stats(), "marker actor finished");
    });

    rx_out
}
