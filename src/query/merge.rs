//! Fan-out merge of live per-cell subscriptions.
//!
//! A [`FanOutMerge`] owns one subscription per covering cell and exposes them
//! as a single stream of merged snapshots.
//!
//! # Emission policy
//!
//! 1. **Barrier**: nothing is emitted until every cell has reported at least
//!    once, even if the report is an empty snapshot.
//! 2. **Steady state**: after the barrier, each cell notification produces one
//!    recombination of the latest snapshot from every cell, oldest report
//!    first. A document seen in several cells therefore appears last in its
//!    most recently reported form. Cells are polled round-robin.
//! 3. **Failure**: an error from any cell is emitted once, all cells are torn
//!    down, and the stream ends.
//! 4. **End**: the stream ends when every cell has ended, or when a cell ends
//!    before its first report (the barrier can no longer open).
//!
//! Duplicates across overlapping cells are passed through; the ranker owns
//! deduplication.
//!
//! ```text
//!   cell 0 ──┐
//!   cell 1 ──┤  slots[i].latest   ┌──────────┐
//!   ...      ├──────────────────▶ │  merged  │ ──▶ Vec<Document>
//!   cell n ──┘  (session lock)    └──────────┘
//! ```

use crate::error::{GeoError, Result};
use crate::storage::{Document, LiveStore, RangeQuery, SnapshotStream};
use futures::stream::FusedStream;
use futures::task::AtomicWaker;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

struct CellSlot {
    cell: String,
    stream: Option<SnapshotStream>,
    latest: Option<Vec<Document>>,
    /// Sequence number of the report that produced `latest`
    reported_at: u64,
}

enum Notification {
    Snapshot,
    Failed(GeoError),
    Ended,
}

struct SessionState {
    slots: Vec<CellSlot>,
    /// Cells that have delivered at least one snapshot
    reported: usize,
    /// Reports received so far, across all cells
    sequence: u64,
    next_poll: usize,
    cancelled: bool,
    finished: bool,
}

impl SessionState {
    fn barrier_open(&self) -> bool {
        self.reported == self.slots.len()
    }

    /// Takes every live subscription out of its slot. The caller drops them
    /// after releasing the session lock.
    fn take_streams(&mut self) -> Vec<SnapshotStream> {
        self.slots
            .iter_mut()
            .filter_map(|slot| slot.stream.take())
            .collect()
    }

    fn finish(&mut self) -> Vec<SnapshotStream> {
        self.finished = true;
        self.take_streams()
    }

    fn merged(&self) -> Vec<Document> {
        let mut reports: Vec<&CellSlot> = self.slots.iter().collect();
        reports.sort_by_key(|slot| slot.reported_at);
        reports
            .into_iter()
            .filter_map(|slot| slot.latest.as_ref())
            .flatten()
            .cloned()
            .collect()
    }

    /// Polls cells round-robin until one of them produces something.
    fn poll_notification(&mut self, cx: &mut Context<'_>) -> Poll<Notification> {
        let count = self.slots.len();
        let mut pending = 0;

        for offset in 0..count {
            let index = (self.next_poll + offset) % count;
            let slot = &mut self.slots[index];
            let Some(stream) = slot.stream.as_mut() else {
                continue;
            };

            match stream.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(docs))) => {
                    if slot.latest.is_none() {
                        self.reported += 1;
                    }
                    self.sequence += 1;
                    slot.latest = Some(docs);
                    slot.reported_at = self.sequence;
                    self.next_poll = (index + 1) % count;
                    return Poll::Ready(Notification::Snapshot);
                }
                Poll::Ready(Some(Err(source))) => {
                    return Poll::Ready(Notification::Failed(GeoError::UpstreamQuery {
                        cell: slot.cell.clone(),
                        source,
                    }));
                }
                Poll::Ready(None) => {
                    slot.stream = None;
                    if slot.latest.is_none() {
                        log::debug!("cell {} ended before reporting", slot.cell);
                        return Poll::Ready(Notification::Ended);
                    }
                }
                Poll::Pending => pending += 1,
            }
        }

        if pending == 0 {
            Poll::Ready(Notification::Ended)
        } else {
            Poll::Pending
        }
    }
}

struct Shared {
    state: Mutex<SessionState>,
    waker: AtomicWaker,
}

/// Cancels a search session from anywhere. Cheap to clone.
#[derive(Clone)]
pub struct CancelHandle {
    shared: Arc<Shared>,
}

impl CancelHandle {
    /// Releases every cell subscription of the session and wakes its consumer,
    /// which then sees the end of the stream. Calling this on a cancelled or
    /// finished session does nothing.
    pub fn cancel(&self) {
        let released = {
            let mut state = self.shared.state.lock();
            if state.cancelled || state.finished {
                return;
            }
            state.cancelled = true;
            state.take_streams()
        };
        log::debug!("search cancelled, released {} subscriptions", released.len());
        drop(released);
        self.shared.waker.wake();
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.state.lock().cancelled
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// One live stream of merged snapshots over a set of range queries.
pub struct FanOutMerge {
    shared: Arc<Shared>,
}

impl FanOutMerge {
    /// Subscribes to every query. If any subscription fails, those already
    /// opened are released before the error is returned.
    pub fn open<S: LiveStore + ?Sized>(store: &S, queries: &[RangeQuery]) -> Result<Self> {
        let mut slots = Vec::with_capacity(queries.len());
        for query in queries {
            let stream =
                store
                    .subscribe(query)
                    .map_err(|source| GeoError::UpstreamQuery {
                        cell: query.start.clone(),
                        source,
                    })?;
            slots.push(CellSlot {
                cell: query.start.clone(),
                stream: Some(stream),
                latest: None,
                reported_at: 0,
            });
        }

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState {
                    slots,
                    reported: 0,
                    sequence: 0,
                    next_poll: 0,
                    cancelled: false,
                    finished: false,
                }),
                waker: AtomicWaker::new(),
            }),
        })
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.state.lock().cancelled
    }

    pub fn cell_count(&self) -> usize {
        self.shared.state.lock().slots.len()
    }

    /// Cells that have delivered at least one snapshot.
    pub fn reported_count(&self) -> usize {
        self.shared.state.lock().reported
    }

    /// Cells whose subscription is still open.
    pub fn live_count(&self) -> usize {
        self.shared
            .state
            .lock()
            .slots
            .iter()
            .filter(|slot| slot.stream.is_some())
            .count()
    }
}

impl Stream for FanOutMerge {
    type Item = Result<Vec<Document>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.shared.waker.register(cx.waker());
        let mut state = self.shared.state.lock();

        loop {
            if state.cancelled || state.finished {
                return Poll::Ready(None);
            }

            match state.poll_notification(cx) {
                Poll::Ready(Notification::Snapshot) => {
                    if state.barrier_open() {
                        return Poll::Ready(Some(Ok(state.merged())));
                    }
                }
                Poll::Ready(Notification::Failed(e)) => {
                    let released = state.finish();
                    drop(state);
                    log::debug!("{}; released {} subscriptions", e, released.len());
                    drop(released);
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(Notification::Ended) => {
                    let released = state.finish();
                    drop(state);
                    drop(released);
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl FusedStream for FanOutMerge {
    fn is_terminated(&self) -> bool {
        let state = self.shared.state.lock();
        state.cancelled || state.finished
    }
}

impl Drop for FanOutMerge {
    fn drop(&mut self) {
        let released = {
            let mut state = self.shared.state.lock();
            if state.finished {
                return;
            }
            state.finish()
        };
        if !released.is_empty() {
            log::debug!("search dropped, released {} subscriptions", released.len());
        }
    }
}
