mod modifiers;

use std::collections::BTreeSet;

use crate::fragments::ConnectionType;

pub use modifiers::{LinkModifier, NodeModifier, VisualModifiers, derive_modifiers};

/// View state for one graph. Holds ids only, never positions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InteractionState {
    pub focused: Option<String>,
    /// Open fragments in the order they were opened.
    pub open: Vec<String>,
    pub active_themes: BTreeSet<String>,
    pub active_connection_types: BTreeSet<ConnectionType>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    ClickNode { id: String, is_ghost: bool },
    CloseNode(String),
    ToggleTheme(String),
    ToggleConnectionType(ConnectionType),
    ClearFocus,
    ClearFilters,
    Reset,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub state: InteractionState,
    /// The new open list, present only when it changed.
    pub opened: Option<Vec<String>>,
}

impl InteractionState {
    pub fn is_open(&self, id: &str) -> bool {
        self.open.iter().any(|open| open == id)
    }

    pub fn is_focused(&self, id: &str) -> bool {
        self.focused.as_deref() == Some(id)
    }

    pub fn has_filters(&self) -> bool {
        !self.active_themes.is_empty() || !self.active_connection_types.is_empty()
    }

    pub fn apply(&self, action: &Action) -> Transition {
        let mut next = self.clone();
        match action {
            Action::ClickNode { id, is_ghost } => {
                next.focused = if next.is_focused(id) {
                    None
                } else {
                    Some(id.clone())
                };
                if !is_ghost {
                    toggle_open(&mut next.open, id);
                }
            }
            Action::CloseNode(id) => {
                next.open.retain(|open| open != id);
            }
            Action::ToggleTheme(name) => {
                toggle_member(&mut next.active_themes, name.clone());
            }
            Action::ToggleConnectionType(kind) => {
                toggle_member(&mut next.active_connection_types, *kind);
            }
            Action::ClearFocus => next.focused = None,
            Action::ClearFilters => {
                next.active_themes.clear();
                next.active_connection_types.clear();
            }
            Action::Reset => next = Self::default(),
        }

        let opened = (next.open != self.open).then(|| next.open.clone());
        Transition {
            state: next,
            opened,
        }
    }
}

fn toggle_open(open: &mut Vec<String>, id: &str) {
    if let Some(position) = open.iter().position(|entry| entry == id) {
        open.remove(position);
    } else {
        open.push(id.to_owned());
    }
}

fn toggle_member<T: Ord>(set: &mut BTreeSet<T>, value: T) {
    if !set.remove(&value) {
        set.insert(value);
    }
}
