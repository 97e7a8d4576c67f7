//! Cancellable delivery timers
//!
//! Each chat owns one scheduler. Every armed timer is a task in a `JoinSet`
//! tied to the current cancellation token; `cancel_all` cancels them and
//! starts a new generation so anything already in flight is recognisably
//! stale when it arrives. Dropping the scheduler aborts whatever is left.

use crate::flow::FlowId;
use crate::state_machine::Event;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

pub struct DeliveryScheduler {
    generation: u64,
    cancel: CancellationToken,
    tasks: JoinSet<()>,
    event_tx: mpsc::Sender<Event>,
}

impl DeliveryScheduler {
    pub fn new(event_tx: mpsc::Sender<Event>) -> Self {
        Self {
            generation: 0,
            cancel: CancellationToken::new(),
            tasks: JoinSet::new(),
            event_tx,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Fire `Event::DeliveryDue` for `flow`/`index` after `delay`
    pub fn schedule(&mut self, flow: FlowId, index: usize, delay: Duration) {
        self.reap();

        let generation = self.generation;
        let cancel = self.cancel.child_token();
        let event_tx = self.event_tx.clone();
        self.tasks.spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    let _ = event_tx
                        .send(Event::DeliveryDue { flow, index, generation })
                        .await;
                }
            }
        });
    }

    /// Cancel every pending timer. Returns how many were still pending.
    pub fn cancel_all(&mut self) -> usize {
        self.reap();
        let pending = self.tasks.len();

        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.tasks.abort_all();
        self.generation += 1;

        pending
    }

    /// Timers armed and not yet finished
    pub fn pending(&mut self) -> usize {
        self.reap();
        self.tasks.len()
    }

    fn reap(&mut self) {
        while self.tasks.try_join_next().is_some() {}
    }
}
