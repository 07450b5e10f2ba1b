use eframe::egui::{self, Align2, Color32, FontId, Painter, Rect, Sense, Ui, vec2};

use crate::interaction::derive_modifiers;
use crate::layout::Position;
use crate::render::{RenderFrame, paint_frame, project_frame};
use crate::util::truncate_words;

use super::super::{GraphView, Hover};

/// Largest distance of any node from the origin, which both cameras look at.
fn layout_extent(positions: &[Position]) -> f32 {
    positions
        .iter()
        .filter(|position| position.is_finite())
        .map(|position| position.length())
        .fold(0.0, f32::max)
}

impl GraphView {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        if self.simulation.is_empty() {
            self.backend().paint_background(&painter, rect);
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Nothing to lay out.",
                FontId::proportional(14.0),
                Color32::from_gray(180),
            );
            return;
        }

        if !self.simulation.is_settled() {
            self.simulation.step_frame();
            ui.ctx().request_repaint();
        }

        let positions = self.positions();
        if self.needs_fit {
            let extent = layout_extent(&positions);
            self.backend_mut().fit(rect, extent);
            if self.simulation.is_settled() {
                self.needs_fit = false;
            }
        }

        let modifiers = derive_modifiers(&self.graph, &self.interaction);
        let matches = self.cached_search_matches().unwrap_or_default();
        let mut frame = RenderFrame::compose(&self.graph, &positions, &modifiers, &matches);
        self.thumbnails.attach(ui.ctx(), &self.graph, &mut frame);
        let projected = project_frame(self.backend(), rect, &frame);

        self.handle_pointer(ui, rect, &response, &frame, &projected);

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pointer| rect.contains(*pointer));
        self.update_hover(pointer, &frame, &projected);
        if self.hovered_node().is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        self.backend().paint_background(&painter, rect);
        paint_frame(
            &painter,
            rect,
            self.view_mode,
            &frame,
            &projected,
            self.hovered_node(),
        );
        self.draw_hover_details(&painter, rect);
    }

    fn draw_hover_details(&self, painter: &Painter, rect: Rect) {
        let lines = match self.hovered {
            Some(Hover::Node(index)) => {
                let Some(node) = self.graph.nodes.get(index) else {
                    return;
                };
                let mut heading = node.label.clone();
                if node.is_ghost {
                    heading.push_str("  (ghost)");
                } else if !node.themes.is_empty() {
                    heading = format!("{heading}  |  {}", node.themes.join(", "));
                }
                if node.thumbnail.is_some() {
                    heading.push_str("  [image]");
                }
                vec![heading, truncate_words(&node.description, 28)]
            }
            Some(Hover::Link(index)) => {
                let Some(link) = self.graph.links.get(index) else {
                    return;
                };
                vec![
                    format!("{}  |  strength {:.2}", link.kind.label(), link.strength),
                    truncate_words(&link.description, 28),
                ]
            }
            None => return,
        };

        let mut cursor = rect.left_top() + vec2(10.0, 10.0);
        for (line_index, line) in lines.iter().filter(|line| !line.is_empty()).enumerate() {
            let (font, color) = if line_index == 0 {
                (FontId::proportional(13.0), Color32::from_gray(240))
            } else {
                (FontId::proportional(12.0), Color32::from_gray(180))
            };
            painter.text(cursor, Align2::LEFT_TOP, line, font, color);
            cursor.y += 18.0;
        }
    }
}
