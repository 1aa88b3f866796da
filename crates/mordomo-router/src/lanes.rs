// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-actor serialization lanes.
//!
//! Every message for a given actor is processed to completion before the
//! next one starts: each actor id gets a dedicated worker task draining an
//! mpsc queue. Messages from different actors run fully in parallel. This
//! makes the at-most-one-pending and no-duplicate-punch invariants hold
//! under true concurrency instead of relying on event-loop ordering.

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::{mpsc, oneshot};
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

/// Queue depth per actor lane. Deep enough for replay bursts.
const LANE_CAPACITY: usize = 64;

type Job = BoxFuture<'static, ()>;

/// Set of per-actor worker lanes, created on demand.
pub struct ActorLanes {
    senders: DashMap<i64, mpsc::Sender<Job>>,
    tracker: TaskTracker,
}

impl Default for ActorLanes {
    fn default() -> Self {
        Self::new()
    }
}

impl ActorLanes {
    pub fn new() -> Self {
        Self {
            senders: DashMap::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// Enqueues a job on the actor's lane. Jobs on the same lane run
    /// strictly in order; the call returns once the job is queued, not once
    /// it has run.
    pub async fn dispatch<F>(&self, actor_id: i64, job: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let sender = self.sender_for(actor_id);
        if sender.send(Box::pin(job)).await.is_err() {
            warn!(actor_id, "actor lane closed, dropping job");
        }
    }

    /// Waits until every job queued on the actor's lane so far has run.
    pub async fn barrier(&self, actor_id: i64) {
        let (tx, rx) = oneshot::channel();
        self.dispatch(actor_id, async move {
            let _ = tx.send(());
        })
        .await;
        let _ = rx.await;
    }

    /// Closes all lanes and waits for in-flight jobs to finish.
    pub async fn shutdown(&self) {
        self.senders.clear();
        self.tracker.close();
        self.tracker.wait().await;
        debug!("actor lanes drained");
    }

    fn sender_for(&self, actor_id: i64) -> mpsc::Sender<Job> {
        self.senders
            .entry(actor_id)
            .or_insert_with(|| {
                let (tx, mut rx) = mpsc::channel::<Job>(LANE_CAPACITY);
                self.tracker.spawn(async move {
                    while let Some(job) = rx.recv().await {
                        job.await;
                    }
                    debug!(actor_id, "actor lane worker stopped");
                });
                tx
            })
            .clone()
    }
}
