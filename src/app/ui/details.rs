use eframe::egui::{self, RichText, Ui};

use crate::analysis::ReadingState;
use crate::fragments::SecondaryAnalysis;
use crate::interaction::Action;
use crate::render::style::{connection_color, hex_color};

use super::super::GraphView;
use super::swatch;

impl GraphView {
    fn label_for<'a>(&'a self, id: &'a str) -> &'a str {
        self.graph
            .node(id)
            .map(|node| node.label.as_str())
            .unwrap_or(id)
    }

    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        let mut pending = None;

        egui::ScrollArea::vertical()
            .id_salt("details_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading("Open fragments");
                ui.add_space(6.0);

                if self.interaction.open.is_empty() {
                    ui.label("Click a fragment in the graph to open it.");
                }

                for id in &self.interaction.open {
                    let Some(fragment) = self.fragments.iter().find(|fragment| &fragment.id == id) else {
                        continue;
                    };

                    ui.group(|ui| {
                        ui.horizontal(|ui| {
                            ui.label(RichText::new(self.label_for(id)).strong());
                            if ui.small_button("Close").clicked() {
                                pending = Some(Action::CloseNode(id.clone()));
                            }
                        });
                        ui.small(id.as_str());
                        if let Some(node) = self.graph.node(id)
                            && !node.themes.is_empty()
                        {
                            ui.small(format!("Themes: {}", node.themes.join(", ")));
                        }
                        ui.add_space(4.0);
                        ui.label(fragment.text.as_str());

                        if let Some(reading) = fragment.image.as_ref().and_then(|image| image.reading.as_ref()) {
                            ui.add_space(4.0);
                            for (name, value) in [
                                ("Surface", &reading.surface),
                                ("Mood", &reading.mood),
                                ("Metaphor", &reading.metaphor),
                            ] {
                                if !value.is_empty() {
                                    ui.small(format!("{name}: {value}"));
                                }
                            }
                        }

                        let links = self
                            .graph
                            .links
                            .iter()
                            .filter(|link| &link.source == id || &link.target == id)
                            .collect::<Vec<_>>();
                        if !links.is_empty() {
                            ui.add_space(4.0);
                            for link in links {
                                let other = if &link.source == id {
                                    &link.target
                                } else {
                                    &link.source
                                };
                                ui.horizontal_wrapped(|ui| {
                                    ui.colored_label(connection_color(link.kind), link.kind.label());
                                    ui.label(format!("{} ({:.2})", self.label_for(other), link.strength));
                                });
                                if !link.description.is_empty() {
                                    ui.small(link.description.as_str());
                                }
                            }
                        }
                    });
                    ui.add_space(4.0);
                }

                ui.separator();
                ui.heading("Secondary reading");
                ui.add_space(6.0);
                match self.reading.state() {
                    ReadingState::Idle => {
                        ui.label("Open fragments to read them together.");
                    }
                    ReadingState::Loading => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Reading the open fragments...");
                        });
                    }
                    ReadingState::Ready(reading) if !reading.is_empty() => {
                        self.draw_reading(ui, reading);
                    }
                    ReadingState::Ready(_) => {
                        ui.label("No secondary reading available.");
                    }
                    ReadingState::Unavailable(reason) => {
                        ui.label("No secondary reading available.");
                        ui.small(RichText::new(reason.as_str()).weak());
                    }
                }
            });

        if let Some(action) = pending {
            self.dispatch(action);
        }
    }

    fn draw_reading(&self, ui: &mut Ui, reading: &SecondaryAnalysis) {
        if !reading.synthesis.trim().is_empty() {
            ui.label(RichText::new(reading.synthesis.as_str()).italics());
            ui.add_space(6.0);
        }

        if !reading.clusters.is_empty() {
            ui.label(RichText::new("Clusters").strong());
            for cluster in &reading.clusters {
                ui.horizontal(|ui| {
                    swatch(ui, hex_color(&cluster.color));
                    ui.label(RichText::new(cluster.name.as_str()).strong());
                });
                if !cluster.description.is_empty() {
                    ui.label(cluster.description.as_str());
                }
                let members = cluster
                    .fragment_ids
                    .iter()
                    .map(|id| self.label_for(id))
                    .collect::<Vec<_>>();
                if !members.is_empty() {
                    ui.small(members.join(", "));
                }
                ui.add_space(4.0);
            }
        }

        if !reading.threads.is_empty() {
            ui.label(RichText::new("Threads").strong());
            for thread in &reading.threads {
                ui.label(RichText::new(thread.name.as_str()).strong());
                if !thread.description.is_empty() {
                    ui.label(thread.description.as_str());
                }
                let sequence = thread
                    .sequence
                    .iter()
                    .map(|id| self.label_for(id))
                    .collect::<Vec<_>>();
                if !sequence.is_empty() {
                    ui.small(sequence.join(" -> "));
                }
                ui.add_space(4.0);
            }
        }
    }
}
