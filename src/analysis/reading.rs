use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::{debug, info, warn};

use crate::fragments::SecondaryAnalysis;

use super::{AnalysisClient, AnalysisError, SecondaryRequest};

#[derive(Clone, Debug, Default, PartialEq)]
pub enum ReadingState {
    #[default]
    Idle,
    Loading,
    Ready(SecondaryAnalysis),
    Unavailable(String),
}

type Delivery = (u64, Result<SecondaryAnalysis, AnalysisError>);

/// Secondary readings keyed by a generation counter. Each new request or
/// cancellation bumps the generation, and responses tagged with an older
/// generation are dropped on arrival.
pub struct ReadingChannel {
    generation: u64,
    state: ReadingState,
    tx: Sender<Delivery>,
    rx: Receiver<Delivery>,
}

impl Default for ReadingChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingChannel {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            generation: 0,
            state: ReadingState::Idle,
            tx,
            rx,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> &ReadingState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == ReadingState::Loading
    }

    /// Marks a new request as in flight and returns its generation.
    pub fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.state = ReadingState::Loading;
        self.generation
    }

    /// Forgets whatever is in flight and returns to idle.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.state = ReadingState::Idle;
    }

    /// Applies a response if it belongs to the current generation.
    pub fn accept(
        &mut self,
        generation: u64,
        result: Result<SecondaryAnalysis, AnalysisError>,
    ) -> bool {
        if generation != self.generation {
            debug!(generation, current = self.generation, "discarding stale secondary reading");
            return false;
        }

        self.state = match result {
            Ok(reading) => {
                info!(
                    generation,
                    clusters = reading.clusters.len(),
                    threads = reading.threads.len(),
                    "secondary reading ready"
                );
                ReadingState::Ready(reading)
            }
            Err(err) => {
                warn!(generation, error = %err, "secondary reading failed");
                ReadingState::Unavailable(err.to_string())
            }
        };
        true
    }

    /// Starts a request on a worker thread. The response is picked up by [`Self::poll`].
    pub fn request(&mut self, client: Arc<dyn AnalysisClient>, request: SecondaryRequest) -> u64 {
        let generation = self.begin();
        let tx = self.tx.clone();
        debug!(generation, fragments = request.fragments.len(), "secondary reading requested");

        thread::spawn(move || {
            let result = client.analyze_secondary(&request);
            let _ = tx.send((generation, result));
        });

        generation
    }

    /// Drains delivered responses. Returns true when the visible state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok((generation, result)) = self.rx.try_recv() {
            changed |= self.accept(generation, result);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::analysis::{AnalyzeRequest, DescribeImageRequest};
    use crate::fragments::{Fragment, GraphData, ImageReading};

    fn reading(synthesis: &str) -> SecondaryAnalysis {
        SecondaryAnalysis {
            synthesis: synthesis.to_owned(),
            ..SecondaryAnalysis::default()
        }
    }

    #[test]
    fn later_requests_win_regardless_of_arrival_order() {
        let mut channel = ReadingChannel::new();
        let first = channel.begin();
        let second = channel.begin();

        assert!(channel.accept(second, Ok(reading("fresh"))));
        assert!(!channel.accept(first, Ok(reading("stale"))));
        assert_eq!(channel.state(), &ReadingState::Ready(reading("fresh")));
    }

    #[test]
    fn stale_failures_do_not_clobber_loading() {
        let mut channel = ReadingChannel::new();
        let first = channel.begin();
        channel.begin();

        assert!(!channel.accept(
            first,
            Err(AnalysisError::Unavailable("late".to_owned()))
        ));
        assert!(channel.is_loading());
    }

    #[test]
    fn failures_become_unavailable() {
        let mut channel = ReadingChannel::new();
        let generation = channel.begin();
        channel.accept(generation, Err(AnalysisError::Unavailable("offline".to_owned())));
        assert!(matches!(channel.state(), ReadingState::Unavailable(message) if message.contains("offline")));
    }

    #[test]
    fn cancel_ignores_responses_still_in_flight() {
        let mut channel = ReadingChannel::new();
        let generation = channel.begin();
        channel.cancel();

        assert!(!channel.accept(generation, Ok(reading("too late"))));
        assert_eq!(channel.state(), &ReadingState::Idle);
    }

    struct SlowFirst;

    impl AnalysisClient for SlowFirst {
        fn name(&self) -> &str {
            "slow-first"
        }

        fn analyze(&self, _request: &AnalyzeRequest) -> Result<GraphData, AnalysisError> {
            Err(AnalysisError::Unavailable("unused".to_owned()))
        }

        fn describe_image(&self, _request: &DescribeImageRequest) -> Result<ImageReading, AnalysisError> {
            Err(AnalysisError::Unavailable("unused".to_owned()))
        }

        fn analyze_secondary(&self, request: &SecondaryRequest) -> Result<SecondaryAnalysis, AnalysisError> {
            if request.fragments.len() == 1 {
                thread::sleep(Duration::from_millis(150));
            }
            Ok(reading(&format!("{} open", request.fragments.len())))
        }
    }

    #[test]
    fn worker_responses_arriving_out_of_order_keep_the_latest() {
        let fragments = vec![Fragment::text("f1", "a"), Fragment::text("f2", "b")];
        let primary = GraphData::default();
        let client: Arc<dyn AnalysisClient> = Arc::new(SlowFirst);
        let mut channel = ReadingChannel::new();

        let one = SecondaryRequest::for_open(&["f1".to_owned()], &fragments, &primary).unwrap();
        let two = SecondaryRequest::for_open(&["f1".to_owned(), "f2".to_owned()], &fragments, &primary)
            .unwrap();
        channel.request(Arc::clone(&client), one);
        let latest = channel.request(client, two);

        for _ in 0..50 {
            channel.poll();
            thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(channel.generation(), latest);
        assert_eq!(channel.state(), &ReadingState::Ready(reading("2 open")));
    }
}
