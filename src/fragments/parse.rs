use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::model::{
    Connection, ConnectionType, Fragment, FragmentSummary, Ghost, GraphData, ImageReading,
    NarrativeThread, SecondaryAnalysis, Theme, ThematicCluster,
};

pub const THEME_PALETTE: [&str; 8] = [
    "#F472B6", "#38BDF8", "#FB923C", "#4ADE80", "#C084FC", "#FACC15", "#2DD4BF", "#F87171",
];

const DEFAULT_STRENGTH: f32 = 0.5;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("expected a JSON {expected}, found {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: &'static str,
    },
}

#[derive(Debug, Default, Deserialize)]
struct RawConnection {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    strength: Option<Value>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawGhost {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    connected_to: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSummary {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTheme {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    fragment_ids: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCluster {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    fragment_ids: Vec<Value>,
    #[serde(default)]
    color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawThread {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    sequence: Vec<Value>,
}

/// Returns the body of the first fenced code block, or the trimmed input.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };

    let after_open = &trimmed[start + 3..];
    let body = match after_open.find('\n') {
        Some(newline) => {
            let label = after_open[..newline].trim();
            if label.is_empty() || label.eq_ignore_ascii_case("json") {
                &after_open[newline + 1..]
            } else {
                after_open
            }
        }
        // ```json{...}``` with the label glued to the document
        None => after_open
            .find(|c: char| c == '{' || c == '[')
            .map_or(after_open, |index| &after_open[index..]),
    };

    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => trimmed,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_document(raw: &str) -> Result<Value, ParseError> {
    Ok(serde_json::from_str(strip_code_fences(raw))?)
}

fn array_field<'a>(object: &'a serde_json::Map<String, Value>, key: &str) -> &'a [Value] {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn string_field(object: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

fn id_list(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .collect()
}

fn decode_each<T>(values: &[Value], what: &str) -> Vec<T>
where
    T: for<'de> Deserialize<'de>,
{
    let mut decoded = Vec::with_capacity(values.len());
    for value in values {
        match T::deserialize(value) {
            Ok(entry) => decoded.push(entry),
            Err(error) => debug!(%error, what, "skipping malformed entry"),
        }
    }
    decoded
}

fn parse_strength(value: Option<&Value>) -> f32 {
    let strength = match value {
        Some(Value::Number(number)) => number.as_f64().map(|value| value as f32),
        Some(Value::String(text)) => text.trim().parse::<f32>().ok(),
        _ => None,
    };

    match strength {
        Some(value) if value.is_finite() => value.clamp(0.0, 1.0),
        _ => DEFAULT_STRENGTH,
    }
}

fn is_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    matches!(digits.len(), 3 | 6 | 8) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

fn connection_from_raw(raw: RawConnection) -> Option<Connection> {
    let kind = raw.kind.as_deref().and_then(ConnectionType::parse)?;
    let source = raw.source.filter(|value| !value.trim().is_empty())?;
    let target = raw.target.filter(|value| !value.trim().is_empty())?;

    Some(Connection {
        kind,
        source,
        target,
        strength: parse_strength(raw.strength.as_ref()),
        description: raw.description.unwrap_or_default(),
    })
}

/// Decodes a primary analysis document, defaulting anything missing or malformed.
pub fn graph_data_from_value(value: &Value) -> Result<GraphData, ParseError> {
    let object = value.as_object().ok_or(ParseError::UnexpectedShape {
        expected: "object",
        found: value_kind(value),
    })?;

    let connections = decode_each::<RawConnection>(array_field(object, "connections"), "connection")
        .into_iter()
        .filter_map(connection_from_raw)
        .collect();

    let ghosts = decode_each::<RawGhost>(array_field(object, "ghosts"), "ghost")
        .into_iter()
        .filter_map(|raw| {
            let id = raw.id.filter(|value| !value.trim().is_empty())?;
            Some(Ghost {
                label: raw.label.unwrap_or_else(|| id.clone()),
                id,
                description: raw.description.unwrap_or_default(),
                connected_to: id_list(&raw.connected_to),
            })
        })
        .collect();

    let summaries = decode_each::<RawSummary>(array_field(object, "summaries"), "summary")
        .into_iter()
        .filter_map(|raw| {
            Some(FragmentSummary {
                id: raw.id?,
                summary: raw.summary.unwrap_or_default(),
            })
        })
        .collect();

    let themes = decode_each::<RawTheme>(array_field(object, "themes"), "theme")
        .into_iter()
        .enumerate()
        .map(|(index, raw)| Theme {
            name: raw.name.unwrap_or_else(|| format!("Theme {}", index + 1)),
            color: raw
                .color
                .filter(|color| is_hex_color(color))
                .unwrap_or_else(|| THEME_PALETTE[index % THEME_PALETTE.len()].to_owned()),
            fragment_ids: id_list(&raw.fragment_ids),
        })
        .collect();

    Ok(GraphData {
        connections,
        ghosts,
        summaries,
        themes,
        field_reading: string_field(object, "field_reading"),
        emergent_theme: string_field(object, "emergent_theme"),
    })
}

pub fn parse_graph_data(raw: &str) -> Result<GraphData, ParseError> {
    graph_data_from_value(&parse_document(raw)?)
}

pub fn secondary_from_value(value: &Value) -> Result<SecondaryAnalysis, ParseError> {
    let object = value.as_object().ok_or(ParseError::UnexpectedShape {
        expected: "object",
        found: value_kind(value),
    })?;

    let clusters = decode_each::<RawCluster>(array_field(object, "clusters"), "cluster")
        .into_iter()
        .enumerate()
        .map(|(index, raw)| ThematicCluster {
            id: raw.id.unwrap_or_else(|| format!("cluster-{}", index + 1)),
            name: raw.name.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            fragment_ids: id_list(&raw.fragment_ids),
            color: raw
                .color
                .filter(|color| is_hex_color(color))
                .unwrap_or_else(|| THEME_PALETTE[index % THEME_PALETTE.len()].to_owned()),
        })
        .collect();

    let threads = decode_each::<RawThread>(array_field(object, "threads"), "thread")
        .into_iter()
        .enumerate()
        .map(|(index, raw)| NarrativeThread {
            id: raw.id.unwrap_or_else(|| format!("thread-{}", index + 1)),
            name: raw.name.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            sequence: id_list(&raw.sequence),
        })
        .collect();

    Ok(SecondaryAnalysis {
        clusters,
        threads,
        synthesis: string_field(object, "synthesis").unwrap_or_default(),
    })
}

pub fn parse_secondary(raw: &str) -> Result<SecondaryAnalysis, ParseError> {
    secondary_from_value(&parse_document(raw)?)
}

/// Reads the image description. Missing fields come back empty.
pub fn parse_image_reading(raw: &str) -> Result<ImageReading, ParseError> {
    let document = parse_document(raw)?;
    let object = document.as_object().ok_or(ParseError::UnexpectedShape {
        expected: "object",
        found: value_kind(&document),
    })?;

    Ok(ImageReading {
        surface: string_field(object, "surface").unwrap_or_default(),
        mood: string_field(object, "mood").unwrap_or_default(),
        metaphor: string_field(object, "metaphor").unwrap_or_default(),
        fragment: string_field(object, "fragment").unwrap_or_default(),
    })
}

/// Fragment files are a JSON array, or an object with a `fragments` array.
pub fn parse_fragments(raw: &str) -> Result<Vec<Fragment>, ParseError> {
    let document = parse_document(raw)?;
    let values = match &document {
        Value::Array(values) => values.as_slice(),
        Value::Object(object) => array_field(object, "fragments"),
        other => {
            return Err(ParseError::UnexpectedShape {
                expected: "array",
                found: value_kind(other),
            });
        }
    };

    Ok(decode_each::<Fragment>(values, "fragment")
        .into_iter()
        .filter(|fragment| !fragment.id.trim().is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fences() {
        let raw = "Here you go:\n```json\n{\"connections\": []}\n```\nthanks";
        assert_eq!(strip_code_fences(raw), "{\"connections\": []}");
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
    }

    #[test]
    fn strips_fences_with_the_label_on_the_document_line() {
        assert_eq!(strip_code_fences("```json{\"ghosts\": []}```"), "{\"ghosts\": []}");
        assert_eq!(strip_code_fences("```JSON [1, 2]```"), "[1, 2]");

        let data = parse_graph_data("```json{\"emergent_theme\": \"salt\"}```").unwrap();
        assert_eq!(data.emergent_theme.as_deref(), Some("salt"));
    }

    #[test]
    fn image_readings_default_missing_fields() {
        let reading = parse_image_reading(
            "```json\n{\"surface\": \"a loaf on a sill\", \"fragment\": \" Bread waits for light. \", \"mood\": 4}\n```",
        )
        .unwrap();
        assert_eq!(reading.surface, "a loaf on a sill");
        assert_eq!(reading.fragment, "Bread waits for light.");
        assert_eq!(reading.mood, "");
        assert_eq!(reading.metaphor, "");

        assert!(matches!(
            parse_image_reading("\"just words\""),
            Err(ParseError::UnexpectedShape { found: "string", .. })
        ));
    }

    #[test]
    fn missing_arrays_default_to_empty() {
        let data = parse_graph_data("{}").unwrap();
        assert!(data.connections.is_empty());
        assert!(data.ghosts.is_empty());
        assert!(data.summaries.is_empty());
        assert!(data.themes.is_empty());
        assert_eq!(data.field_reading, None);

        let data = parse_graph_data(r#"{"connections": null, "ghosts": "nope"}"#).unwrap();
        assert!(data.connections.is_empty());
        assert!(data.ghosts.is_empty());
    }

    #[test]
    fn malformed_connections_are_skipped_and_strength_clamped() {
        let raw = r#"{
            "connections": [
                {"type": "resonance", "source": "f1", "target": "f2", "strength": 1.7, "description": "x"},
                {"type": "telepathy", "source": "f1", "target": "f3", "strength": 0.4},
                {"type": "tension", "source": "f2"},
                {"type": "Bridge", "source": "f2", "target": "f3", "strength": "0.25"},
                {"type": "metaphor", "source": "f3", "target": "f4"},
                42
            ]
        }"#;
        let data = parse_graph_data(raw).unwrap();
        assert_eq!(data.connections.len(), 3);
        assert_eq!(data.connections[0].strength, 1.0);
        assert_eq!(data.connections[1].kind, ConnectionType::Bridge);
        assert!((data.connections[1].strength - 0.25).abs() < f32::EPSILON);
        assert_eq!(data.connections[2].strength, DEFAULT_STRENGTH);
        assert_eq!(data.connections[2].description, "");
    }

    #[test]
    fn themes_fall_back_to_palette_colors() {
        let raw = r##"{"themes": [
            {"name": "bread", "color": "#112233", "fragment_ids": ["f1", 7, "f2"]},
            {"color": "teal", "fragment_ids": ["f3"]}
        ]}"##;
        let data = parse_graph_data(raw).unwrap();
        assert_eq!(data.themes[0].fragment_ids, vec!["f1", "f2"]);
        assert_eq!(data.themes[0].color, "#112233");
        assert_eq!(data.themes[1].name, "Theme 2");
        assert_eq!(data.themes[1].color, THEME_PALETTE[1]);
    }

    #[test]
    fn non_object_documents_are_errors() {
        assert!(matches!(
            parse_graph_data("[1, 2]"),
            Err(ParseError::UnexpectedShape { found: "array", .. })
        ));
        assert!(matches!(
            parse_graph_data("not json"),
            Err(ParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn secondary_defaults_missing_fields() {
        let secondary = parse_secondary(r#"{"clusters": [{"name": "c", "fragment_ids": ["f1"]}]}"#)
            .unwrap();
        assert_eq!(secondary.clusters.len(), 1);
        assert_eq!(secondary.clusters[0].id, "cluster-1");
        assert!(secondary.threads.is_empty());
        assert_eq!(secondary.synthesis, "");
    }

    #[test]
    fn fragments_accept_array_or_wrapped_object() {
        let list = parse_fragments(r#"[{"id": "a", "text": "one"}, {"text": "no id"}]"#).unwrap();
        assert_eq!(list.len(), 1);

        let wrapped =
            parse_fragments(r#"{"fragments": [{"id": "a", "text": "one"}, {"id": "b", "text": "two"}]}"#)
                .unwrap();
        assert_eq!(wrapped.len(), 2);
        assert_eq!(wrapped[1].id, "b");
    }
}
