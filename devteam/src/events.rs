//! Run event fan-out with per-run history

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use devteam_sdk::RunEvent;
use tokio::sync::broadcast;

use crate::utils::lock;

const DEFAULT_CAPACITY: usize = 1000;
/// Events kept per run, oldest dropped first
const DEFAULT_EVENTS_PER_RUN: usize = 1000;
/// Finished runs whose history is kept, oldest evicted first
const DEFAULT_FINISHED_RUNS: usize = 100;

#[derive(Debug, Default)]
struct History {
    runs: HashMap<String, VecDeque<RunEvent>>,
    /// Finished run ids in the order they finished
    finished: VecDeque<String>,
}

/// Broadcasts run events to live subscribers and keeps recent events in a
/// per-run buffer for later retrieval. Clones share channel and buffers.
///
/// Buffers are bounded: each run keeps its latest events, and only the most
/// recently finished runs keep any history. Runs still in progress are never
/// evicted.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RunEvent>,
    history: Arc<Mutex<History>>,
    max_events_per_run: usize,
    max_finished_runs: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            history: Arc::new(Mutex::new(History::default())),
            max_events_per_run: DEFAULT_EVENTS_PER_RUN,
            max_finished_runs: DEFAULT_FINISHED_RUNS,
        }
    }

    pub fn with_limits(mut self, max_events_per_run: usize, max_finished_runs: usize) -> Self {
        self.max_events_per_run = max_events_per_run.max(1);
        self.max_finished_runs = max_finished_runs;
        self
    }

    pub fn publish(&self, event: RunEvent) {
        {
            let mut guard = lock(&self.history);
            let history = &mut *guard;
            let run_id = event.run_id().to_string();

            let buffer = history.runs.entry(run_id.clone()).or_default();
            if buffer.len() >= self.max_events_per_run {
                buffer.pop_front();
            }
            buffer.push_back(event.clone());

            if event.is_terminal() && !history.finished.contains(&run_id) {
                history.finished.push_back(run_id);
                while history.finished.len() > self.max_finished_runs {
                    if let Some(oldest) = history.finished.pop_front() {
                        tracing::debug!(run_id = %oldest, "Evicting event history");
                        history.runs.remove(&oldest);
                    }
                }
            }
        }

        // No subscribers is fine
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.tx.subscribe()
    }

    /// Buffered events of one run, keeping the most recent `limit`
    pub fn events(&self, run_id: &str, limit: Option<usize>) -> Option<Vec<RunEvent>> {
        let history = lock(&self.history);
        let buffer = history.runs.get(run_id)?;
        let skip = limit.map_or(0, |limit| buffer.len().saturating_sub(limit));
        Some(buffer.iter().skip(skip).cloned().collect())
    }

    /// Forget buffered events of one run
    pub fn clear_run(&self, run_id: &str) -> bool {
        let mut history = lock(&self.history);
        history.finished.retain(|id| id != run_id);
        history.runs.remove(run_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(run_id: &str) -> RunEvent {
        RunEvent::RunStarted {
            run_id: run_id.to_string(),
            total_steps: 2,
        }
    }

    fn completed(run_id: &str) -> RunEvent {
        RunEvent::RunCompleted {
            run_id: run_id.to_string(),
            total_cost: 0.0,
        }
    }

    #[test]
    fn test_events_are_buffered_per_run() {
        let bus = EventBus::default();
        bus.publish(started("a"));
        bus.publish(started("b"));
        bus.publish(completed("a"));

        assert_eq!(bus.events("a", None).unwrap(), vec![started("a"), completed("a")]);
        assert_eq!(bus.events("a", Some(1)).unwrap(), vec![completed("a")]);
        assert_eq!(bus.events("b", Some(10)).unwrap().len(), 1);
        assert!(bus.events("c", None).is_none());
    }

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(started("a"));

        assert_eq!(rx.recv().await.unwrap(), started("a"));
    }

    #[test]
    fn test_clear_run() {
        let bus = EventBus::default();
        bus.publish(started("a"));
        assert!(bus.clear_run("a"));
        assert!(bus.events("a", None).is_none());
    }

    #[test]
    fn test_run_buffer_keeps_latest_events() {
        let bus = EventBus::default().with_limits(3, 10);
        bus.publish(started("a"));
        for content in ["one ", "two ", "three"] {
            bus.publish(RunEvent::StreamChunk {
                run_id: "a".to_string(),
                step: 1,
                content: content.to_string(),
            });
        }

        let events = bus.events("a", None).unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], RunEvent::StreamChunk { content, .. } if content == "one "));
    }

    #[test]
    fn test_oldest_finished_runs_are_evicted() {
        let bus = EventBus::default().with_limits(100, 2);
        bus.publish(started("running"));
        for run_id in ["a", "b", "c"] {
            bus.publish(started(run_id));
            bus.publish(completed(run_id));
        }

        assert!(bus.events("a", None).is_none());
        assert_eq!(bus.events("b", None).unwrap().len(), 2);
        assert_eq!(bus.events("c", None).unwrap().len(), 2);
        assert_eq!(bus.events("running", None).unwrap(), vec![started("running")]);
    }
}
