//! Boundary to the language-model analysis service.
//!
//! The service is reached through an [`AnalysisClient`] constructed once at
//! launch and shared with background workers. Two implementations exist:
//! [`HttpAnalysisClient`] for the live service and [`FixtureAnalysisClient`]
//! for canned responses.

mod fixture;
mod http;
mod reading;
mod worker;

use serde::Serialize;

use crate::fragments::{
    Connection, Fragment, FragmentImage, FragmentInput, Ghost, GraphData, ImageReading, ParseError,
    SecondaryAnalysis,
};

pub use fixture::FixtureAnalysisClient;
pub use http::HttpAnalysisClient;
pub use reading::{ReadingChannel, ReadingState};
pub use worker::{ImageJob, PrimaryJob, spawn_describe, spawn_primary};

pub const MIN_PRIMARY_FRAGMENTS: usize = 2;
pub const MIN_SECONDARY_FRAGMENTS: usize = 1;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("response could not be parsed: {0}")]
    Parse(#[from] ParseError),
    #[error("analysis unavailable: {0}")]
    Unavailable(String),
}

fn validate(fragments: &[FragmentInput], minimum: usize) -> Result<(), AnalysisError> {
    if fragments.len() < minimum {
        return Err(AnalysisError::InvalidRequest(format!(
            "at least {minimum} fragment(s) required, got {}",
            fragments.len()
        )));
    }

    if let Some(fragment) = fragments.iter().find(|fragment| {
        fragment.id.trim().is_empty() || (fragment.text.trim().is_empty() && !fragment.has_image)
    }) {
        return Err(AnalysisError::InvalidRequest(format!(
            "fragment `{}` needs an id and either text or an image",
            fragment.id
        )));
    }

    Ok(())
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalyzeRequest {
    pub fragments: Vec<FragmentInput>,
}

impl AnalyzeRequest {
    pub fn new<'a>(fragments: impl IntoIterator<Item = &'a Fragment>) -> Result<Self, AnalysisError> {
        let fragments = fragments.into_iter().map(FragmentInput::from).collect::<Vec<_>>();
        validate(&fragments, MIN_PRIMARY_FRAGMENTS)?;
        Ok(Self { fragments })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PrimaryContext {
    pub connections: Vec<Connection>,
    pub ghosts: Vec<Ghost>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SecondaryRequest {
    pub fragments: Vec<FragmentInput>,
    pub analysis: PrimaryContext,
}

impl SecondaryRequest {
    /// Builds the request for the open fragments, in open order. Ids that do
    /// not name a known fragment are skipped.
    pub fn for_open(
        open: &[String],
        fragments: &[Fragment],
        primary: &GraphData,
    ) -> Result<Self, AnalysisError> {
        let fragments = open
            .iter()
            .filter_map(|id| fragments.iter().find(|fragment| &fragment.id == id))
            .map(FragmentInput::from)
            .collect::<Vec<_>>();
        validate(&fragments, MIN_SECONDARY_FRAGMENTS)?;

        Ok(Self {
            fragments,
            analysis: PrimaryContext {
                connections: primary.connections.clone(),
                ghosts: primary.ghosts.clone(),
            },
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    pub base64: String,
    pub mime_type: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DescribeImageRequest {
    pub image: ImagePayload,
}

impl DescribeImageRequest {
    pub fn new(image: &FragmentImage) -> Result<Self, AnalysisError> {
        if image.base64.trim().is_empty() || image.mime_type.trim().is_empty() {
            return Err(AnalysisError::InvalidRequest(
                "image needs both data and a mime type".to_owned(),
            ));
        }

        Ok(Self {
            image: ImagePayload {
                base64: image.base64.clone(),
                mime_type: image.mime_type.clone(),
            },
        })
    }
}

/// Blocking calls to the analysis service. Implementations are shared across
/// worker threads.
pub trait AnalysisClient: Send + Sync {
    fn name(&self) -> &str;

    fn analyze(&self, request: &AnalyzeRequest) -> Result<GraphData, AnalysisError>;

    fn analyze_secondary(&self, request: &SecondaryRequest) -> Result<SecondaryAnalysis, AnalysisError>;

    /// Reads an image the way a text fragment would be read.
    fn describe_image(&self, request: &DescribeImageRequest) -> Result<ImageReading, AnalysisError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragments::ConnectionType;

    #[test]
    fn primary_requests_need_two_complete_fragments() {
        let one = [Fragment::text("f1", "alone")];
        assert!(matches!(
            AnalyzeRequest::new(&one),
            Err(AnalysisError::InvalidRequest(_))
        ));

        let blank = [Fragment::text("f1", "a"), Fragment::text("f2", "  ")];
        assert!(AnalyzeRequest::new(&blank).is_err());

        let pair = [Fragment::text("f1", "a"), Fragment::text("f2", "b")];
        let request = AnalyzeRequest::new(&pair).unwrap();
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["fragments"][1]["id"], "f2");
        assert_eq!(body["fragments"][1]["hasImage"], false);
    }

    fn image_fragment(id: &str) -> Fragment {
        Fragment {
            id: id.to_owned(),
            text: String::new(),
            image: Some(FragmentImage {
                base64: "aGk=".to_owned(),
                mime_type: "image/png".to_owned(),
                thumbnail: String::new(),
                reading: None,
            }),
        }
    }

    #[test]
    fn image_fragments_count_without_text() {
        let fragments = [Fragment::text("f1", "a"), image_fragment("f2")];
        let request = AnalyzeRequest::new(&fragments).unwrap();
        assert!(request.fragments[1].has_image);
        assert!(request.fragments[1].text.is_empty());

        let nameless = [Fragment::text("f1", "a"), image_fragment(" ")];
        assert!(AnalyzeRequest::new(&nameless).is_err());
    }

    #[test]
    fn describe_requests_carry_the_image_payload() {
        let fragment = image_fragment("f1");
        let request = DescribeImageRequest::new(fragment.image.as_ref().unwrap()).unwrap();
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["image"]["base64"], "aGk=");
        assert_eq!(body["image"]["mimeType"], "image/png");

        let mut empty = fragment.image.unwrap();
        empty.base64.clear();
        assert!(matches!(
            DescribeImageRequest::new(&empty),
            Err(AnalysisError::InvalidRequest(_))
        ));
    }

    #[test]
    fn secondary_requests_follow_open_order_and_carry_primary_context() {
        let fragments = vec![
            Fragment::text("f1", "a"),
            Fragment::text("f2", "b"),
            Fragment::text("f3", "c"),
        ];
        let primary = GraphData {
            connections: vec![Connection {
                kind: ConnectionType::Bridge,
                source: "f1".to_owned(),
                target: "f3".to_owned(),
                strength: 0.4,
                description: "across".to_owned(),
            }],
            ..GraphData::default()
        };
        let open = vec!["f3".to_owned(), "g1".to_owned(), "f1".to_owned()];

        let request = SecondaryRequest::for_open(&open, &fragments, &primary).unwrap();
        let ids = request
            .fragments
            .iter()
            .map(|fragment| fragment.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["f3", "f1"]);

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["analysis"]["connections"][0]["type"], "bridge");
        assert!(body["analysis"]["ghosts"].as_array().unwrap().is_empty());

        assert!(SecondaryRequest::for_open(&[], &fragments, &primary).is_err());
    }
}
