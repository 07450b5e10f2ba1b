use eframe::egui::{RichText, Ui};

use crate::fragments::ConnectionType;
use crate::interaction::Action;
use crate::render::style::{connection_color, hex_color};

use super::super::GraphView;
use super::swatch;

impl GraphView {
    pub(in crate::app) fn draw_legend(&mut self, ui: &mut Ui) {
        let mut pending = None;

        ui.heading("Connections");
        ui.small("Click to filter. Nothing selected shows everything.");
        ui.add_space(4.0);
        for kind in ConnectionType::ALL {
            let count = self.graph.links.iter().filter(|link| link.kind == kind).count();
            let active = self.interaction.active_connection_types.contains(&kind);
            ui.horizontal(|ui| {
                swatch(ui, connection_color(kind));
                if ui
                    .selectable_label(active, format!("{}  ({count})", kind.label()))
                    .clicked()
                {
                    pending = Some(Action::ToggleConnectionType(kind));
                }
            });
        }

        ui.separator();
        ui.heading("Themes");
        if self.data.themes.is_empty() {
            ui.label("No themes in this reading.");
        }
        for theme in &self.data.themes {
            let active = self.interaction.active_themes.contains(&theme.name);
            ui.horizontal(|ui| {
                swatch(ui, hex_color(&theme.color));
                let label = format!("{}  ({})", theme.name, theme.fragment_ids.len());
                if ui.selectable_label(active, label).clicked() {
                    pending = Some(Action::ToggleTheme(theme.name.clone()));
                }
            });
        }

        if self.data.ghosts.is_empty() {
            ui.add_space(4.0);
        } else {
            ui.separator();
            ui.heading("Ghosts");
            ui.small("Absences the fragments circle around.");
            for ghost in &self.data.ghosts {
                ui.label(RichText::new(ghost.label.as_str()).italics());
            }
        }

        if let Some(action) = pending {
            self.dispatch(action);
        }
    }
}
