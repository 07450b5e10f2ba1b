use eframe::egui::{self, Color32, Painter, Pos2, Rect, Response, Stroke, Ui, vec2};

use crate::layout::Position;

use super::style::BACKGROUND;
use super::{Projected, RenderBackend, ViewMode};

const NEAR_PLANE: f32 = 1.0;
const MAX_PITCH: f32 = 1.45;

/// Orbit camera looking at the origin. Yaw turns around the vertical axis,
/// pitch tilts toward or away from the viewer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Perspective3d {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub focal_length: f32,
}

impl Default for Perspective3d {
    fn default() -> Self {
        Self {
            yaw: 0.5,
            pitch: -0.3,
            distance: 900.0,
            focal_length: 800.0,
        }
    }
}

impl Perspective3d {
    fn to_camera(&self, world: Position) -> Position {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();

        let x = (world.x * cos_yaw) + (world.z * sin_yaw);
        let z = (-world.x * sin_yaw) + (world.z * cos_yaw);
        let y = (world.y * cos_pitch) - (z * sin_pitch);
        let z = (world.y * sin_pitch) + (z * cos_pitch);
        Position::new(x, y, z + self.distance)
    }

    fn to_world(&self, camera: Position) -> Position {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();

        let z = camera.z - self.distance;
        let y = (camera.y * cos_pitch) + (z * sin_pitch);
        let z = (-camera.y * sin_pitch) + (z * cos_pitch);
        let x = (camera.x * cos_yaw) - (z * sin_yaw);
        let z = (camera.x * sin_yaw) + (z * cos_yaw);
        Position::new(x, y, z)
    }

    pub fn orbit(&mut self, delta: egui::Vec2) {
        self.yaw = (self.yaw + (delta.x * 0.008)).rem_euclid(std::f32::consts::TAU);
        self.pitch = (self.pitch - (delta.y * 0.008)).clamp(-MAX_PITCH, MAX_PITCH);
    }

    pub fn dolly(&mut self, scroll: f32) {
        let factor = (1.0 - (scroll * 0.0018)).clamp(0.85, 1.15);
        self.distance = (self.distance * factor).clamp(60.0, 20_000.0);
    }
}

impl RenderBackend for Perspective3d {
    fn mode(&self) -> ViewMode {
        ViewMode::Spatial
    }

    fn project(&self, rect: Rect, world: Position) -> Option<Projected> {
        let camera = self.to_camera(world);
        if camera.z < NEAR_PLANE || !camera.is_finite() {
            return None;
        }

        let scale = self.focal_length / camera.z;
        Some(Projected {
            screen: rect.center() + (vec2(camera.x, camera.y) * scale),
            scale,
            depth: camera.z,
            fade: (self.distance / camera.z).clamp(0.3, 1.0),
        })
    }

    fn unproject(&self, rect: Rect, screen: Pos2, reference: Position) -> Position {
        let depth = self.to_camera(reference).z.max(NEAR_PLANE);
        let offset = (screen - rect.center()) * (depth / self.focal_length);
        self.to_world(Position::new(offset.x, offset.y, depth))
    }

    fn handle_input(&mut self, ui: &Ui, _rect: Rect, response: &Response) {
        if response.hovered() {
            let scroll = ui.input(|input| input.raw_scroll_delta.y);
            if scroll.abs() > f32::EPSILON {
                self.dolly(scroll);
            }
        }

        if response.dragged_by(egui::PointerButton::Primary)
            || response.dragged_by(egui::PointerButton::Secondary)
        {
            self.orbit(response.drag_delta());
        }
    }

    fn fit(&mut self, rect: Rect, extent: f32) {
        let half = (rect.width().min(rect.height()) * 0.5).max(1.0);
        self.focal_length = half * 2.0;
        self.distance = ((extent.max(50.0) * self.focal_length) / (half * 0.8)).clamp(60.0, 20_000.0);
    }

    fn paint_background(&self, painter: &Painter, rect: Rect) {
        painter.rect_filled(rect, 0.0, BACKGROUND);

        let axis = Stroke::new(1.0, Color32::from_rgba_unmultiplied(90, 100, 120, 70));
        let reach = self.distance * 0.6;
        for end in [
            Position::planar(reach, 0.0),
            Position::planar(0.0, reach),
            Position::new(0.0, 0.0, reach),
        ] {
            if let (Some(origin), Some(tip)) =
                (self.project(rect, -end), self.project(rect, end))
            {
                painter.line_segment([origin.screen, tip.screen], axis);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(1000.0, 700.0))
    }

    #[test]
    fn closer_points_project_larger_and_in_front() {
        let camera = Perspective3d {
            yaw: 0.0,
            pitch: 0.0,
            ..Perspective3d::default()
        };
        let near = camera.project(viewport(), Position::new(10.0, 0.0, -200.0)).unwrap();
        let far = camera.project(viewport(), Position::new(10.0, 0.0, 200.0)).unwrap();

        assert!(near.scale > far.scale);
        assert!(near.depth < far.depth);
        assert!(near.fade >= far.fade);
        assert!(near.screen.x > far.screen.x);
    }

    #[test]
    fn points_behind_the_camera_are_culled() {
        let camera = Perspective3d {
            yaw: 0.0,
            pitch: 0.0,
            distance: 100.0,
            ..Perspective3d::default()
        };
        assert!(camera.project(viewport(), Position::new(0.0, 0.0, -150.0)).is_none());
    }

    #[test]
    fn unproject_recovers_the_point_at_its_depth() {
        let camera = Perspective3d {
            yaw: 1.1,
            pitch: -0.4,
            ..Perspective3d::default()
        };
        let world = Position::new(35.0, -60.0, 120.0);
        let projected = camera.project(viewport(), world).unwrap();
        let back = camera.unproject(viewport(), projected.screen, world);

        assert!(back.distance(world) < 0.05, "{back:?}");
    }

    #[test]
    fn flat_layouts_are_still_visible_in_depth() {
        let camera = Perspective3d::default();
        let projected = camera.project(viewport(), Position::planar(100.0, 40.0));
        assert!(projected.is_some());
    }

    #[test]
    fn orbit_clamps_pitch() {
        let mut camera = Perspective3d::default();
        camera.orbit(vec2(0.0, -10_000.0));
        assert_eq!(camera.pitch, MAX_PITCH);
        camera.dolly(1.0e6);
        assert_eq!(camera.distance, 900.0 * 0.85);
    }
}
