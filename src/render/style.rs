use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::fragments::ConnectionType;
use crate::graph::FALLBACK_THEME_COLOR;

pub const BACKGROUND: Color32 = Color32::from_rgb(17, 20, 27);
pub const SELECTED: Color32 = Color32::from_rgb(245, 206, 93);
pub const SEARCH_MATCH: Color32 = Color32::from_rgb(103, 196, 255);

pub fn parse_hex_color(value: &str) -> Option<Color32> {
    let digits = value.trim().strip_prefix('#')?;
    let channel = |range: std::ops::Range<usize>| {
        digits
            .get(range)
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
    };

    match digits.len() {
        8 => Some(Color32::from_rgba_unmultiplied(
            channel(0..2)?,
            channel(2..4)?,
            channel(4..6)?,
            channel(6..8)?,
        )),
        6 => Some(Color32::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => {
            let short = |index: usize| channel(index..index + 1).map(|value| value * 17);
            Some(Color32::from_rgb(short(0)?, short(1)?, short(2)?))
        }
        _ => None,
    }
}

pub fn hex_color(value: &str) -> Color32 {
    parse_hex_color(value)
        .or_else(|| parse_hex_color(FALLBACK_THEME_COLOR))
        .unwrap_or(Color32::LIGHT_BLUE)
}

pub fn connection_color(kind: ConnectionType) -> Color32 {
    match kind {
        ConnectionType::Resonance => Color32::from_rgb(0x3B, 0x82, 0xF6),
        ConnectionType::Tension => Color32::from_rgb(0xEF, 0x44, 0x44),
        ConnectionType::Genealogy => Color32::from_rgb(0x22, 0xC5, 0x5E),
        ConnectionType::Metaphor => Color32::from_rgb(0xA8, 0x55, 0xF7),
        ConnectionType::Bridge => Color32::from_rgb(0xEA, 0xB3, 0x08),
        ConnectionType::Ghost => Color32::from_rgb(0x6B, 0x72, 0x80),
    }
}

/// Nodes that show a picture are drawn this much larger.
pub const THUMBNAIL_SCALE: f32 = 1.5;

pub fn node_radius(connection_count: usize, is_ghost: bool) -> f32 {
    let radius = 4.0 + (1.5 * connection_count as f32);
    if is_ghost { radius * 0.7 } else { radius }
}

pub fn link_width(strength: f32) -> f32 {
    (strength.clamp(0.0, 1.0) * 3.0) + 0.5
}

pub fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let mix = |from: u8, to: u8| ((from as f32 * (1.0 - amount)) + (to as f32 * amount)) as u8;

    Color32::from_rgba_unmultiplied(
        mix(base.r(), overlay.r()),
        mix(base.g(), overlay.g()),
        mix(base.b(), overlay.b()),
        mix(base.a(), overlay.a()),
    )
}

pub fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.35 + (factor * 0.65))) as u8,
    )
}

pub fn with_alpha(color: Color32, alpha: f32) -> Color32 {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    Color32::from_rgba_unmultiplied(r, g, b, (a as f32 * alpha.clamp(0.0, 1.0)) as u8)
}

pub fn draw_grid(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, BACKGROUND);

    let step = (64.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 84, 60));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(
            parse_hex_color("#F472B6"),
            Some(Color32::from_rgb(0xF4, 0x72, 0xB6))
        );
        assert_eq!(parse_hex_color("#fff"), Some(Color32::WHITE));
        assert_eq!(parse_hex_color("F472B6"), None);
        assert_eq!(parse_hex_color("#GGGGGG"), None);
        assert_eq!(hex_color("nope"), Color32::from_rgb(0x3B, 0x82, 0xF6));
    }

    #[test]
    fn every_theme_color_the_parser_keeps_is_drawable() {
        assert_eq!(
            parse_hex_color("#11223380"),
            Some(Color32::from_rgba_unmultiplied(0x11, 0x22, 0x33, 0x80))
        );

        let raw = r##"{"themes": [
            {"name": "a", "color": "#abc", "fragment_ids": ["f1"]},
            {"name": "b", "color": "#A855F7", "fragment_ids": ["f2"]},
            {"name": "c", "color": "#A855F7CC", "fragment_ids": ["f3"]}
        ]}"##;
        let data = crate::fragments::parse_graph_data(raw).unwrap();
        for theme in &data.themes {
            assert!(parse_hex_color(&theme.color).is_some(), "{}", theme.color);
        }
        assert_ne!(hex_color(&data.themes[2].color), hex_color("#3B82F6"));
    }

    #[test]
    fn sizes_follow_counts_and_strength() {
        assert_eq!(node_radius(0, false), 4.0);
        assert_eq!(node_radius(4, false), 10.0);
        assert!((node_radius(4, true) - 7.0).abs() < 1e-5);
        assert_eq!(link_width(0.0), 0.5);
        assert_eq!(link_width(1.0), 3.5);
        assert_eq!(link_width(7.0), 3.5);
    }

    #[test]
    fn dimming_darkens_and_fades() {
        let base = Color32::from_rgb(200, 100, 50);
        let dimmed = dim_color(base, 0.5);
        assert!(dimmed.r() < base.r());
        assert!(dimmed.a() < base.a());
        assert_eq!(blend_color(base, SELECTED, 0.0), base);
        assert_eq!(blend_color(base, SELECTED, 1.0), SELECTED);
    }
}
