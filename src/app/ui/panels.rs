use std::time::Duration;

use eframe::egui::{self, Align, Context, Layout};

use crate::interaction::{Action, InteractionState};
use crate::layout::{Dimensions, SettleReason};

use super::super::GraphView;

impl GraphView {
    /// Draws the graph screen. Returns true when the user asked to go back.
    pub(in crate::app) fn show(&mut self, ctx: &Context) -> bool {
        if self.reading.poll() {
            ctx.request_repaint();
        }
        if self.reading.is_loading() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        let mut back_requested = false;

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("rhizome");
                    ui.separator();
                    if ui.button("Fragments").clicked() {
                        back_requested = true;
                    }

                    let toggled = self.view_mode.toggled();
                    if ui
                        .button(format!("Switch to {}", toggled.label()))
                        .clicked()
                    {
                        self.set_view_mode(toggled);
                    }
                    if ui.button("Re-layout").clicked() {
                        self.relayout();
                    }
                    let settle = ui.add_enabled(
                        !self.simulation.is_settled(),
                        egui::Button::new("Settle now"),
                    );
                    if settle.clicked() {
                        self.settle_now();
                    }
                    if ui.button("Fit").clicked() {
                        self.needs_fit = true;
                    }
                    let clear_filters =
                        ui.add_enabled(self.interaction.has_filters(), egui::Button::new("Clear filters"));
                    if clear_filters.clicked() {
                        self.dispatch(Action::ClearFilters);
                    }
                    let reset = ui.add_enabled(
                        self.interaction != InteractionState::default(),
                        egui::Button::new("Reset view"),
                    );
                    if reset.clicked() {
                        self.dispatch(Action::Reset);
                    }

                    ui.separator();
                    ui.add(
                        egui::TextEdit::singleline(&mut self.search)
                            .hint_text("Search labels")
                            .desired_width(180.0),
                    );

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.layout_status_text());
                    });
                });

                if let Some(theme) = &self.data.emergent_theme {
                    ui.label(egui::RichText::new(format!("Emergent theme: {theme}")).strong());
                }
                if let Some(reading) = &self.data.field_reading {
                    ui.label(egui::RichText::new(reading.as_str()).italics());
                }
            });

        egui::SidePanel::left("legend")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| self.draw_legend(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(360.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));

        back_requested
    }

    fn layout_status_text(&self) -> String {
        let simulation = &self.simulation;
        let layout = match simulation.dimensions() {
            Dimensions::Two => "2D layout",
            Dimensions::Three => "3D layout",
        };
        let counts = format!("nodes: {}  links: {}", simulation.len(), self.graph.links.len());
        let mut status = match simulation.settle_reason() {
            None => format!(
                "settling (step {}, alpha {:.3})",
                simulation.iterations(),
                simulation.alpha()
            ),
            Some(SettleReason::Converged) => {
                format!("settled after {} steps", simulation.iterations())
            }
            Some(SettleReason::Cooled) => format!("cooled after {} steps", simulation.iterations()),
            Some(SettleReason::IterationCap) => {
                format!("stopped at {} steps", simulation.iterations())
            }
            Some(SettleReason::Precomputed) => "laid out in one pass".to_owned(),
        };
        let pins = simulation.overrides();
        if !simulation.is_settled() && !pins.is_empty() {
            status.push_str(&format!(", {} pinned", pins.len()));
        }

        format!("{} view | {layout} | {counts} | {status}", self.view_mode.label())
    }
}
