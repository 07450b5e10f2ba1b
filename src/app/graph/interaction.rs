use eframe::egui::{self, Pos2, Rect, Response, Ui};

use crate::interaction::Action;
use crate::render::{Projected, RenderFrame, hit_test, hit_test_link};

use super::super::{GraphView, Hover};

impl GraphView {
    /// Node drags pin the node under the pointer; anything else goes to the camera.
    pub(super) fn handle_pointer(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &Response,
        frame: &RenderFrame,
        projected: &[Option<Projected>],
    ) {
        if response.drag_started_by(egui::PointerButton::Primary) {
            self.dragging = ui
                .input(|input| input.pointer.press_origin())
                .and_then(|origin| hit_test(frame, projected, origin));
        }

        if let Some(index) = self.dragging {
            if let (Some(pointer), Some(node)) = (response.interact_pointer_pos(), frame.nodes.get(index)) {
                let target = self.backend().unproject(rect, pointer, node.position);
                self.simulation.pin(&node.id, target);
            }
            if response.drag_stopped() {
                self.dragging = None;
            }
            ui.ctx().request_repaint();
        } else {
            let scrolled = response.hovered()
                && ui.input(|input| input.raw_scroll_delta.y.abs() > f32::EPSILON);
            if response.dragged() || scrolled {
                self.needs_fit = false;
            }
            self.backend_mut().handle_input(ui, rect, response);
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            let clicked = response
                .interact_pointer_pos()
                .and_then(|pointer| hit_test(frame, projected, pointer))
                .and_then(|index| frame.nodes.get(index));
            let action = match clicked {
                Some(node) => Action::ClickNode {
                    id: node.id.clone(),
                    is_ghost: node.is_ghost,
                },
                None => Action::ClearFocus,
            };
            self.dispatch(action);
        }
    }

    pub(super) fn update_hover(
        &mut self,
        pointer: Option<Pos2>,
        frame: &RenderFrame,
        projected: &[Option<Projected>],
    ) {
        self.hovered = match (self.dragging, pointer) {
            (Some(index), _) => Some(Hover::Node(index)),
            (None, Some(pointer)) => hit_test(frame, projected, pointer)
                .map(Hover::Node)
                .or_else(|| hit_test_link(frame, projected, pointer).map(Hover::Link)),
            (None, None) => None,
        };
    }

    pub(super) fn hovered_node(&self) -> Option<usize> {
        match self.hovered {
            Some(Hover::Node(index)) => Some(index),
            _ => None,
        }
    }
}
