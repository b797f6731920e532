//! # Client Driver
//!
//! Runs a [`ClientCoordinator`] over TCP until its configured transactions are
//! done or the connection precondition fails.

use crate::adapters::TcpTransport;
use crate::container::ClientNodeConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use xs_03_client::{
    Action, ClientCoordinator, ClientError, ClientEvent, LatencySummary, RandomWorkload,
    RunReport, TimerId, TransactionSource,
};

/// Outcome of a client run.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientRunSummary {
    /// Completed/stalled counts and wall time.
    pub report: RunReport,
    /// Latency of completed transactions.
    pub latency: LatencySummary,
}

impl ClientRunSummary {
    /// Human-readable report printed at the end of a run.
    pub fn render(&self) -> String {
        let ms = |d: Duration| d.as_secs_f64() * 1000.0;
        format!(
            "transactions: {} completed, {} stalled\n\
             elapsed:      {:.3} s\n\
             throughput:   {:.2} tx/s\n\
             latency (ms): mean {:.3}  p50 {:.3}  p99 {:.3}  min {:.3}  max {:.3}",
            self.report.completed,
            self.report.stalled,
            self.report.elapsed.as_secs_f64(),
            self.report.throughput(),
            ms(self.latency.mean),
            ms(self.latency.p50),
            ms(self.latency.p99),
            ms(self.latency.min),
            ms(self.latency.max),
        )
    }
}

/// Armed timers. Each one is a sleeping task that posts `TimerFired`.
pub struct TimerSet {
    events: mpsc::UnboundedSender<ClientEvent>,
    armed: HashMap<TimerId, JoinHandle<()>>,
}

impl TimerSet {
    /// Timers posting into `events`.
    pub fn new(events: mpsc::UnboundedSender<ClientEvent>) -> Self {
        Self {
            events,
            armed: HashMap::new(),
        }
    }

    /// Post `TimerFired(id)` after `after`.
    pub fn arm(&mut self, id: TimerId, after: Duration) {
        self.armed.retain(|_, handle| !handle.is_finished());
        let events = self.events.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = events.send(ClientEvent::TimerFired(id));
        });
        if let Some(previous) = self.armed.insert(id, handle) {
            previous.abort();
        }
    }

    /// Abort a timer. Already fired timers are unaffected; the coordinator
    /// ignores their stale events.
    pub fn cancel(&mut self, id: TimerId) {
        if let Some(handle) = self.armed.remove(&id) {
            handle.abort();
        }
    }

    /// Timers not yet fired or cancelled.
    pub fn pending(&self) -> usize {
        self.armed.values().filter(|h| !h.is_finished()).count()
    }

    /// Abort everything.
    pub fn cancel_all(&mut self) {
        for (_, handle) in self.armed.drain() {
            handle.abort();
        }
    }
}

/// Run the client role with a random workload.
pub async fn run_client(config: ClientNodeConfig) -> Result<ClientRunSummary, ClientError> {
    let source: Box<dyn TransactionSource> = match config.seed {
        Some(seed) => Box::new(RandomWorkload::seeded(
            seed,
            config.inputs_per_tx,
            config.outputs_per_tx,
        )),
        None => Box::new(RandomWorkload::new(
            config.inputs_per_tx,
            config.outputs_per_tx,
        )),
    };
    run_client_with(config, source).await
}

/// Run the client role with an explicit transaction source.
pub async fn run_client_with(
    config: ClientNodeConfig,
    source: Box<dyn TransactionSource>,
) -> Result<ClientRunSummary, ClientError> {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let transport = Arc::new(TcpTransport::new());
    let mut coordinator = ClientCoordinator::new(
        config.client.clone(),
        &config.cluster,
        transport.clone(),
        source,
    )?;
    let mut timers = TimerSet::new(events_tx.clone());

    let mut outcome = apply(&mut timers, coordinator.start());
    let connections =
        transport.connect_all(&config.cluster, config.client.connect_timeout, events_tx);

    let result = loop {
        if let Some(report) = outcome.take() {
            break Ok(report);
        }
        let Some(event) = events_rx.recv().await else {
            break Ok(coordinator.report());
        };
        match coordinator.handle(event) {
            Ok(actions) => outcome = apply(&mut timers, actions),
            Err(e) => break Err(e),
        }
    };

    timers.cancel_all();
    transport.close_all();
    for task in connections {
        task.abort();
    }

    let report = result?;
    let summary = ClientRunSummary {
        report,
        latency: coordinator.stats().summary(),
    };
    info!(
        completed = summary.report.completed,
        stalled = summary.report.stalled,
        throughput = summary.report.throughput(),
        "[xs-03] Client run complete"
    );
    Ok(summary)
}

/// Execute timer actions; returns the report once the run finished.
fn apply(timers: &mut TimerSet, actions: Vec<Action>) -> Option<RunReport> {
    let mut finished = None;
    for action in actions {
        match action {
            Action::ArmTimer { id, after } => {
                debug!(?id, after_ms = after.as_millis() as u64, "[xs-03] Timer armed");
                timers.arm(id, after);
            }
            Action::CancelTimer(id) => timers.cancel(id),
            Action::Finished(report) => finished = Some(report),
        }
    }
    finished
}
