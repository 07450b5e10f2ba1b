use crate::graph::BuiltGraph;

use super::InteractionState;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeModifier {
    pub dimmed: bool,
    pub focused: bool,
    pub selected: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkModifier {
    pub dimmed: bool,
    /// Touches the focused node.
    pub highlighted: bool,
}

/// Per-node and per-link flags, index-aligned with the graph they were derived from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisualModifiers {
    pub nodes: Vec<NodeModifier>,
    pub links: Vec<LinkModifier>,
}

pub fn derive_modifiers(graph: &BuiltGraph, state: &InteractionState) -> VisualModifiers {
    let focus = state
        .focused
        .as_deref()
        .and_then(|id| graph.index_by_id.get(id).copied());

    let nodes = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let focused = focus == Some(index);
            let outside_focus = focus
                .is_some_and(|focus| !focused && !graph.are_adjacent(focus, index));
            let outside_themes = !state.active_themes.is_empty()
                && !node
                    .themes
                    .iter()
                    .any(|theme| state.active_themes.contains(theme));

            NodeModifier {
                dimmed: outside_focus || outside_themes,
                focused,
                selected: state.is_open(&node.id),
            }
        })
        .collect();

    let links = graph
        .links
        .iter()
        .zip(&graph.edges)
        .map(|(link, &(source, target))| {
            let touches_focus = focus.is_some_and(|focus| source == focus || target == focus);
            let outside_types = !state.active_connection_types.is_empty()
                && !state.active_connection_types.contains(&link.kind);

            LinkModifier {
                dimmed: (focus.is_some() && !touches_focus) || outside_types,
                highlighted: touches_focus && !outside_types,
            }
        })
        .collect();

    VisualModifiers { nodes, links }
}
