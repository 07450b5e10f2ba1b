use eframe::egui::{self, Painter, Pos2, Rect, Response, Ui, Vec2, vec2};

use crate::layout::Position;

use super::style::draw_grid;
use super::{Projected, RenderBackend, ViewMode};

/// Flat view: pan and zoom over the x/y plane, depth ignored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Canvas2d {
    pub pan: Vec2,
    pub zoom: f32,
}

impl Default for Canvas2d {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Canvas2d {
    pub fn world_to_screen(&self, rect: Rect, world: Position) -> Pos2 {
        rect.center() + self.pan + (vec2(world.x, world.y) * self.zoom)
    }

    pub fn screen_to_world(&self, rect: Rect, screen: Pos2) -> Vec2 {
        (screen - rect.center() - self.pan) / self.zoom
    }

    /// Zooms around `pointer`, keeping the world point under it fixed.
    pub fn zoom_at(&mut self, rect: Rect, pointer: Pos2, scroll: f32) {
        let world_before = self.screen_to_world(rect, pointer);
        let factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * factor).clamp(0.05, 6.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }
}

impl RenderBackend for Canvas2d {
    fn mode(&self) -> ViewMode {
        ViewMode::Flat
    }

    fn project(&self, rect: Rect, world: Position) -> Option<Projected> {
        world.is_finite().then(|| Projected {
            screen: self.world_to_screen(rect, world),
            scale: self.zoom.powf(0.4),
            depth: 0.0,
            fade: 1.0,
        })
    }

    fn unproject(&self, rect: Rect, screen: Pos2, reference: Position) -> Position {
        let world = self.screen_to_world(rect, screen);
        Position::new(world.x, world.y, reference.z)
    }

    fn handle_input(&mut self, ui: &Ui, rect: Rect, response: &Response) {
        if response.hovered() {
            let scroll = ui.input(|input| input.raw_scroll_delta.y);
            if scroll.abs() > f32::EPSILON {
                let pointer = ui
                    .input(|input| input.pointer.hover_pos())
                    .unwrap_or_else(|| rect.center());
                self.zoom_at(rect, pointer, scroll);
            }
        }

        if response.dragged_by(egui::PointerButton::Primary)
            || response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    fn fit(&mut self, rect: Rect, extent: f32) {
        self.pan = Vec2::ZERO;
        let half = (rect.width().min(rect.height()) * 0.5).max(1.0);
        self.zoom = if extent > 1.0 {
            (half * 0.85 / extent).clamp(0.05, 2.0)
        } else {
            1.0
        };
    }

    fn paint_background(&self, painter: &Painter, rect: Rect) {
        draw_grid(painter, rect, self.pan, self.zoom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Rect {
        Rect::from_min_size(Pos2::new(20.0, 40.0), vec2(800.0, 600.0))
    }

    #[test]
    fn screen_mapping_inverts_and_keeps_depth() {
        let canvas = Canvas2d {
            pan: vec2(30.0, -12.0),
            zoom: 1.7,
        };
        let world = Position::new(-42.0, 18.5, 9.0);
        let projected = canvas.project(viewport(), world).unwrap();
        let back = canvas.unproject(viewport(), projected.screen, world);

        assert!((back.x - world.x).abs() < 1e-3);
        assert!((back.y - world.y).abs() < 1e-3);
        assert_eq!(back.z, 9.0);
    }

    #[test]
    fn zoom_keeps_the_pointer_anchored() {
        let rect = viewport();
        let mut canvas = Canvas2d::default();
        let pointer = Pos2::new(600.0, 200.0);
        let anchored = canvas.screen_to_world(rect, pointer);

        canvas.zoom_at(rect, pointer, 120.0);
        assert!(canvas.zoom > 1.0);
        let after = canvas.screen_to_world(rect, pointer);
        assert!((after - anchored).length() < 1e-3);
    }

    #[test]
    fn fit_scales_the_extent_into_view() {
        let rect = viewport();
        let mut canvas = Canvas2d {
            pan: vec2(300.0, 300.0),
            zoom: 4.0,
        };
        canvas.fit(rect, 1000.0);

        assert_eq!(canvas.pan, Vec2::ZERO);
        let edge = canvas.world_to_screen(rect, Position::planar(1000.0, 0.0));
        assert!(rect.contains(edge));
    }
}
