use std::collections::HashMap;

use tracing::debug;

use crate::fragments::{
    Connection, ConnectionType, Fragment, FragmentSummary, Ghost, GraphData, Theme,
};
use crate::util::truncate_words;

pub const FALLBACK_THEME_COLOR: &str = "#3B82F6";
pub const GHOST_COLOR: &str = "#6B7280";
pub const GHOST_LINK_STRENGTH: f32 = 0.5;
pub const LABEL_WORDS: usize = 12;

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub description: String,
    pub is_ghost: bool,
    pub connection_count: usize,
    pub theme_color: String,
    pub themes: Vec<String>,
    pub thumbnail: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    pub kind: ConnectionType,
    pub strength: f32,
    pub description: String,
}

/// Derived node/link lists plus index lookups. Rebuilt from scratch on every data change.
#[derive(Clone, Debug, Default)]
pub struct BuiltGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
    pub edges: Vec<(usize, usize)>,
    pub index_by_id: HashMap<String, usize>,
    pub adjacency: Vec<Vec<usize>>,
}

impl BuiltGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index_by_id.get(id).map(|&index| &self.nodes[index])
    }

    pub fn are_adjacent(&self, a: usize, b: usize) -> bool {
        self.adjacency
            .get(a)
            .is_some_and(|neighbors| neighbors.contains(&b))
    }
}

pub fn build_from_data(fragments: &[Fragment], data: &GraphData) -> BuiltGraph {
    build(
        fragments,
        &data.ghosts,
        &data.connections,
        &data.themes,
        &data.summaries,
    )
}

pub fn build(
    fragments: &[Fragment],
    ghosts: &[Ghost],
    connections: &[Connection],
    themes: &[Theme],
    summaries: &[FragmentSummary],
) -> BuiltGraph {
    let summary_by_id = summaries
        .iter()
        .filter(|entry| !entry.summary.trim().is_empty())
        .map(|entry| (entry.id.as_str(), entry.summary.trim()))
        .collect::<HashMap<_, _>>();

    let mut color_by_id: HashMap<&str, &str> = HashMap::new();
    let mut themes_by_id: HashMap<&str, Vec<String>> = HashMap::new();
    for theme in themes {
        for fragment_id in &theme.fragment_ids {
            color_by_id.insert(fragment_id.as_str(), theme.color.as_str());
            let names = themes_by_id.entry(fragment_id.as_str()).or_default();
            if !names.contains(&theme.name) {
                names.push(theme.name.clone());
            }
        }
    }

    let mut nodes = Vec::with_capacity(fragments.len() + ghosts.len());
    let mut index_by_id = HashMap::with_capacity(fragments.len() + ghosts.len());

    for fragment in fragments {
        if index_by_id.contains_key(&fragment.id) {
            debug!(id = %fragment.id, "skipping duplicate fragment node");
            continue;
        }

        let label = match summary_by_id.get(fragment.id.as_str()) {
            Some(summary) => (*summary).to_owned(),
            None => {
                let truncated = truncate_words(&fragment.text, LABEL_WORDS);
                if truncated.is_empty() {
                    fragment.id.clone()
                } else {
                    truncated
                }
            }
        };

        index_by_id.insert(fragment.id.clone(), nodes.len());
        nodes.push(GraphNode {
            id: fragment.id.clone(),
            label,
            description: fragment.text.clone(),
            is_ghost: false,
            connection_count: 0,
            theme_color: color_by_id
                .get(fragment.id.as_str())
                .copied()
                .unwrap_or(FALLBACK_THEME_COLOR)
                .to_owned(),
            themes: themes_by_id.remove(fragment.id.as_str()).unwrap_or_default(),
            thumbnail: fragment.image.as_ref().map(|image| image.thumbnail.clone()),
        });
    }

    for ghost in ghosts {
        if index_by_id.contains_key(&ghost.id) {
            debug!(id = %ghost.id, "skipping ghost whose id collides with an existing node");
            continue;
        }

        index_by_id.insert(ghost.id.clone(), nodes.len());
        nodes.push(GraphNode {
            id: ghost.id.clone(),
            label: ghost.label.clone(),
            description: ghost.description.clone(),
            is_ghost: true,
            connection_count: 0,
            theme_color: GHOST_COLOR.to_owned(),
            themes: Vec::new(),
            thumbnail: None,
        });
    }

    let candidates = connections
        .iter()
        .map(|connection| GraphLink {
            source: connection.source.clone(),
            target: connection.target.clone(),
            kind: connection.kind,
            strength: connection.strength.clamp(0.0, 1.0),
            description: connection.description.clone(),
        })
        .chain(ghosts.iter().flat_map(|ghost| {
            ghost.connected_to.iter().map(|fragment_id| GraphLink {
                source: ghost.id.clone(),
                target: fragment_id.clone(),
                kind: ConnectionType::Ghost,
                strength: GHOST_LINK_STRENGTH,
                description: ghost.description.clone(),
            })
        }));

    let mut links = Vec::new();
    let mut edges = Vec::new();
    let mut adjacency = vec![Vec::new(); nodes.len()];
    let mut dropped = 0usize;

    for link in candidates {
        let (Some(&source), Some(&target)) = (
            index_by_id.get(&link.source),
            index_by_id.get(&link.target),
        ) else {
            dropped += 1;
            continue;
        };

        if source == target {
            dropped += 1;
            continue;
        }

        nodes[source].connection_count += 1;
        nodes[target].connection_count += 1;
        if !adjacency[source].contains(&target) {
            adjacency[source].push(target);
            adjacency[target].push(source);
        }

        edges.push((source, target));
        links.push(link);
    }

    if dropped > 0 {
        debug!(dropped, kept = links.len(), "dropped unresolved or self-referencing links");
    }

    BuiltGraph {
        nodes,
        links,
        edges,
        index_by_id,
        adjacency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(kind: ConnectionType, source: &str, target: &str, strength: f32) -> Connection {
        Connection {
            kind,
            source: source.to_owned(),
            target: target.to_owned(),
            strength,
            description: String::new(),
        }
    }

    fn fragments() -> Vec<Fragment> {
        vec![
            Fragment::text("f1", "the crust is load bearing and the crumb is insulation for the whole loaf"),
            Fragment::text("f2", "structure and overflow"),
            Fragment::text("f3", "fermentation is a conversation"),
        ]
    }

    #[test]
    fn labels_prefer_summaries_then_truncated_text() {
        let summaries = vec![
            FragmentSummary {
                id: "f2".to_owned(),
                summary: "Negotiated overflow".to_owned(),
            },
            FragmentSummary {
                id: "f3".to_owned(),
                summary: "   ".to_owned(),
            },
        ];
        let graph = build(&fragments(), &[], &[], &[], &summaries);

        assert_eq!(
            graph.nodes[0].label,
            "the crust is load bearing and the crumb is insulation for the…"
        );
        assert_eq!(graph.nodes[1].label, "Negotiated overflow");
        assert_eq!(graph.nodes[2].label, "fermentation is a conversation");
    }

    #[test]
    fn theme_colors_resolve_with_fallback() {
        let themes = vec![Theme {
            name: "structure".to_owned(),
            color: "#F472B6".to_owned(),
            fragment_ids: vec!["f1".to_owned(), "f2".to_owned()],
        }];
        let graph = build(&fragments(), &[], &[], &themes, &[]);

        assert_eq!(graph.nodes[0].theme_color, "#F472B6");
        assert_eq!(graph.nodes[0].themes, vec!["structure".to_owned()]);
        assert_eq!(graph.nodes[2].theme_color, FALLBACK_THEME_COLOR);
        assert!(graph.nodes[2].themes.is_empty());
    }

    #[test]
    fn every_themed_fragment_gets_a_real_color() {
        let themes = vec![
            Theme {
                name: "a".to_owned(),
                color: "#F472B6".to_owned(),
                fragment_ids: vec!["f1".to_owned()],
            },
            Theme {
                name: "b".to_owned(),
                color: "#38BDF8".to_owned(),
                fragment_ids: vec!["f2".to_owned(), "f3".to_owned()],
            },
        ];
        let graph = build(&fragments(), &[], &[], &themes, &[]);
        assert!(
            graph
                .nodes
                .iter()
                .all(|node| node.theme_color != FALLBACK_THEME_COLOR)
        );
    }

    #[test]
    fn ghosts_expand_into_synthetic_links() {
        let ghosts = vec![Ghost {
            id: "g1".to_owned(),
            label: "implied".to_owned(),
            description: "absent center".to_owned(),
            connected_to: vec!["f1".to_owned(), "f2".to_owned(), "f99".to_owned()],
        }];
        let graph = build(&fragments(), &ghosts, &[], &[], &[]);

        assert_eq!(graph.nodes.len(), 4);
        assert!(graph.nodes[3].is_ghost);
        assert_eq!(graph.nodes[3].theme_color, GHOST_COLOR);
        assert_eq!(graph.links.len(), 2);
        for link in &graph.links {
            assert_eq!(link.kind, ConnectionType::Ghost);
            assert_eq!(link.strength, GHOST_LINK_STRENGTH);
            assert_eq!(link.source, "g1");
        }
        assert_eq!(graph.nodes[3].connection_count, 2);
    }

    #[test]
    fn dangling_links_are_dropped_and_counts_follow() {
        let connections = vec![
            connection(ConnectionType::Resonance, "f1", "f2", 0.9),
            connection(ConnectionType::Tension, "f1", "f99", 0.2),
            connection(ConnectionType::Metaphor, "f2", "f1", 0.4),
            connection(ConnectionType::Bridge, "f3", "f3", 0.5),
        ];
        let graph = build(&fragments(), &[], &connections, &[], &[]);

        assert_eq!(graph.links.len(), 2);
        assert_eq!(graph.nodes[0].connection_count, 2);
        assert_eq!(graph.nodes[1].connection_count, 2);
        assert_eq!(graph.nodes[2].connection_count, 0);
        assert!(graph.are_adjacent(0, 1));
        assert_eq!(graph.adjacency[0], vec![1]);
        for link in &graph.links {
            assert!(graph.index_by_id.contains_key(&link.source));
            assert!(graph.index_by_id.contains_key(&link.target));
        }
    }

    #[test]
    fn build_is_deterministic() {
        let connections = vec![connection(ConnectionType::Genealogy, "f1", "f3", 0.7)];
        let ghosts = vec![Ghost {
            id: "g1".to_owned(),
            label: "g".to_owned(),
            description: String::new(),
            connected_to: vec!["f2".to_owned(), "f3".to_owned()],
        }];
        let first = build(&fragments(), &ghosts, &connections, &[], &[]);
        let second = build(&fragments(), &ghosts, &connections, &[], &[]);

        assert_eq!(first.nodes, second.nodes);
        assert_eq!(first.links, second.links);
    }

    #[test]
    fn tolerates_empty_inputs() {
        let graph = build(&[], &[], &[], &[], &[]);
        assert!(graph.nodes.is_empty());
        assert!(graph.links.is_empty());
    }
}
