use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Resonance,
    Tension,
    Genealogy,
    Metaphor,
    Bridge,
    Ghost,
}

impl ConnectionType {
    pub const ALL: [Self; 6] = [
        Self::Resonance,
        Self::Tension,
        Self::Genealogy,
        Self::Metaphor,
        Self::Bridge,
        Self::Ghost,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Resonance => "Resonance",
            Self::Tension => "Tension",
            Self::Genealogy => "Genealogy",
            Self::Metaphor => "Metaphor",
            Self::Bridge => "Bridge",
            Self::Ghost => "Ghost",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageReading {
    #[serde(default)]
    pub surface: String,
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub metaphor: String,
    #[serde(default)]
    pub fragment: String,
}

impl ImageReading {
    /// Text that stands in for an image fragment: the distilled line when the
    /// reading has one, otherwise the metaphor or the literal surface.
    pub fn fragment_text(&self) -> Option<&str> {
        [&self.fragment, &self.metaphor, &self.surface]
            .into_iter()
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentImage {
    pub base64: String,
    pub mime_type: String,
    pub thumbnail: String,
    #[serde(default)]
    pub reading: Option<ImageReading>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub image: Option<FragmentImage>,
}

impl Fragment {
    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            image: None,
        }
    }
}

/// What the analysis service sees of a fragment.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentInput {
    pub id: String,
    pub text: String,
    pub has_image: bool,
}

impl From<&Fragment> for FragmentInput {
    fn from(fragment: &Fragment) -> Self {
        Self {
            id: fragment.id.clone(),
            text: fragment.text.clone(),
            has_image: fragment.image.is_some(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Connection {
    #[serde(rename = "type")]
    pub kind: ConnectionType,
    pub source: String,
    pub target: String,
    pub strength: f32,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Ghost {
    pub id: String,
    pub label: String,
    pub description: String,
    pub connected_to: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FragmentSummary {
    pub id: String,
    pub summary: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Theme {
    pub name: String,
    pub color: String,
    pub fragment_ids: Vec<String>,
}

/// Primary analysis result. Every collection defaults to empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GraphData {
    pub connections: Vec<Connection>,
    pub ghosts: Vec<Ghost>,
    pub summaries: Vec<FragmentSummary>,
    pub themes: Vec<Theme>,
    pub field_reading: Option<String>,
    pub emergent_theme: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ThematicCluster {
    pub id: String,
    pub name: String,
    pub description: String,
    pub fragment_ids: Vec<String>,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NarrativeThread {
    pub id: String,
    pub name: String,
    pub description: String,
    pub sequence: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SecondaryAnalysis {
    pub clusters: Vec<ThematicCluster>,
    pub threads: Vec<NarrativeThread>,
    pub synthesis: String,
}

impl SecondaryAnalysis {
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty() && self.threads.is_empty() && self.synthesis.trim().is_empty()
    }
}
