use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Instant;

use tracing::{error, info};

use crate::fragments::{GraphData, ImageReading};

use super::{AnalysisClient, AnalysisError, AnalyzeRequest, DescribeImageRequest};

fn poll_channel<T>(rx: &Receiver<Result<T, AnalysisError>>) -> Option<Result<T, AnalysisError>> {
    match rx.try_recv() {
        Ok(result) => Some(result),
        Err(TryRecvError::Empty) => None,
        Err(TryRecvError::Disconnected) => Some(Err(AnalysisError::Unavailable(
            "analysis worker disconnected".to_owned(),
        ))),
    }
}

/// A primary analysis running on its own thread.
pub struct PrimaryJob {
    rx: Receiver<Result<GraphData, AnalysisError>>,
    fragment_count: usize,
}

impl PrimaryJob {
    pub fn fragment_count(&self) -> usize {
        self.fragment_count
    }

    /// Non-blocking check for the result.
    pub fn poll(&self) -> Option<Result<GraphData, AnalysisError>> {
        poll_channel(&self.rx)
    }
}

pub fn spawn_primary(client: Arc<dyn AnalysisClient>, request: AnalyzeRequest) -> PrimaryJob {
    let (tx, rx) = mpsc::channel();
    let fragment_count = request.fragments.len();

    thread::spawn(move || {
        let started = Instant::now();
        info!(client = client.name(), fragments = request.fragments.len(), "primary analysis started");

        let result = client.analyze(&request);
        match &result {
            Ok(data) => info!(
                connections = data.connections.len(),
                ghosts = data.ghosts.len(),
                themes = data.themes.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "primary analysis finished"
            ),
            Err(err) => error!(error = %err, "primary analysis failed"),
        }

        let _ = tx.send(result);
    });

    PrimaryJob { rx, fragment_count }
}

/// An image reading for one fragment, running on its own thread.
pub struct ImageJob {
    rx: Receiver<Result<ImageReading, AnalysisError>>,
    fragment_id: String,
}

impl ImageJob {
    pub fn fragment_id(&self) -> &str {
        &self.fragment_id
    }

    pub fn poll(&self) -> Option<Result<ImageReading, AnalysisError>> {
        poll_channel(&self.rx)
    }
}

pub fn spawn_describe(
    client: Arc<dyn AnalysisClient>,
    fragment_id: String,
    request: DescribeImageRequest,
) -> ImageJob {
    let (tx, rx) = mpsc::channel();
    let id = fragment_id.clone();

    thread::spawn(move || {
        let started = Instant::now();
        info!(client = client.name(), fragment = %id, mime = %request.image.mime_type, "image reading started");

        let result = client.describe_image(&request);
        match &result {
            Ok(_) => info!(
                fragment = %id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "image reading finished"
            ),
            Err(err) => error!(fragment = %id, error = %err, "image reading failed"),
        }

        let _ = tx.send(result);
    });

    ImageJob { rx, fragment_id }
}
