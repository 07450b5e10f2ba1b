use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::fragments::{
    GraphData, ImageReading, SecondaryAnalysis, parse_graph_data, parse_image_reading,
    parse_secondary,
};

use super::{AnalysisClient, AnalysisError, AnalyzeRequest, DescribeImageRequest, SecondaryRequest};

/// Answers every request with a stored document. Useful offline and in tests.
#[derive(Clone, Debug, Default)]
pub struct FixtureAnalysisClient {
    primary: Option<String>,
    secondary: Option<String>,
    image: Option<String>,
}

impl FixtureAnalysisClient {
    pub fn new(primary: Option<String>, secondary: Option<String>) -> Self {
        Self {
            primary,
            secondary,
            image: None,
        }
    }

    /// Answers image readings with `raw`.
    pub fn with_image(mut self, raw: impl Into<String>) -> Self {
        self.image = Some(raw.into());
        self
    }

    pub fn load(primary: Option<&Path>, secondary: Option<&Path>, image: Option<&Path>) -> Result<Self> {
        let read = |path: &Path| {
            fs::read_to_string(path)
                .with_context(|| format!("failed to read fixture {}", path.display()))
        };

        Ok(Self {
            primary: primary.map(read).transpose()?,
            secondary: secondary.map(read).transpose()?,
            image: image.map(read).transpose()?,
        })
    }
}

impl AnalysisClient for FixtureAnalysisClient {
    fn name(&self) -> &str {
        "fixture"
    }

    fn analyze(&self, _request: &AnalyzeRequest) -> Result<GraphData, AnalysisError> {
        let raw = self
            .primary
            .as_deref()
            .ok_or_else(|| AnalysisError::Unavailable("no primary fixture loaded".to_owned()))?;
        Ok(parse_graph_data(raw)?)
    }

    fn analyze_secondary(&self, _request: &SecondaryRequest) -> Result<SecondaryAnalysis, AnalysisError> {
        let raw = self
            .secondary
            .as_deref()
            .ok_or_else(|| AnalysisError::Unavailable("no secondary fixture loaded".to_owned()))?;
        Ok(parse_secondary(raw)?)
    }

    fn describe_image(&self, _request: &DescribeImageRequest) -> Result<ImageReading, AnalysisError> {
        let raw = self
            .image
            .as_deref()
            .ok_or_else(|| AnalysisError::Unavailable("no image fixture loaded".to_owned()))?;
        Ok(parse_image_reading(raw)?)
    }
}
