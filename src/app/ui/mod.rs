mod details;
mod legend;
mod panels;

use eframe::egui::{Color32, Sense, Ui, vec2};

/// Small filled dot used in front of legend and cluster rows.
fn swatch(ui: &mut Ui, color: Color32) {
    let (rect, _) = ui.allocate_exact_size(vec2(12.0, 12.0), Sense::hover());
    ui.painter().circle_filled(rect.center(), 5.0, color);
}
