mod canvas;
mod perspective;
pub mod style;
mod thumbnail;

use std::collections::HashSet;

use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Response, Shape, Stroke, Ui, vec2};

use crate::fragments::ConnectionType;
use crate::graph::BuiltGraph;
use crate::interaction::{LinkModifier, NodeModifier, VisualModifiers};
use crate::layout::{Dimensions, Position};
use crate::util::preview;

pub use canvas::Canvas2d;
pub use perspective::Perspective3d;
pub use thumbnail::{NodeImage, ThumbnailCache};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    Flat,
    Spatial,
}

impl ViewMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Flat => "2D",
            Self::Spatial => "3D",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Flat => Self::Spatial,
            Self::Spatial => Self::Flat,
        }
    }

    pub fn dimensions(self) -> Dimensions {
        match self {
            Self::Flat => Dimensions::Two,
            Self::Spatial => Dimensions::Three,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderNode {
    pub id: String,
    pub label: String,
    pub position: Position,
    pub radius: f32,
    pub color: Color32,
    pub is_ghost: bool,
    pub search_match: bool,
    pub modifier: NodeModifier,
    /// Set by [`ThumbnailCache::attach`] once the texture is uploaded.
    pub image: Option<NodeImage>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderLink {
    pub source: usize,
    pub target: usize,
    pub kind: ConnectionType,
    pub width: f32,
    pub color: Color32,
    pub modifier: LinkModifier,
}

/// Everything a backend needs to draw one frame. Built from already-derived
/// state; backends never look at the interaction state themselves.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderFrame {
    pub nodes: Vec<RenderNode>,
    pub links: Vec<RenderLink>,
}

impl RenderFrame {
    pub fn compose(
        graph: &BuiltGraph,
        positions: &[Position],
        modifiers: &VisualModifiers,
        search_matches: &HashSet<usize>,
    ) -> Self {
        let nodes = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| RenderNode {
                id: node.id.clone(),
                label: node.label.clone(),
                position: positions.get(index).copied().unwrap_or_default(),
                radius: style::node_radius(node.connection_count, node.is_ghost)
                    * if node.thumbnail.is_some() { style::THUMBNAIL_SCALE } else { 1.0 },
                color: style::hex_color(&node.theme_color),
                is_ghost: node.is_ghost,
                search_match: search_matches.contains(&index),
                modifier: modifiers.nodes.get(index).copied().unwrap_or_default(),
                image: None,
            })
            .collect();

        let links = graph
            .links
            .iter()
            .zip(&graph.edges)
            .enumerate()
            .map(|(index, (link, &(source, target)))| RenderLink {
                source,
                target,
                kind: link.kind,
                width: style::link_width(link.strength),
                color: style::connection_color(link.kind),
                modifier: modifiers.links.get(index).copied().unwrap_or_default(),
            })
            .collect();

        Self { nodes, links }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
    pub screen: Pos2,
    /// Multiplier applied to world radii and stroke widths.
    pub scale: f32,
    /// Larger is farther from the viewer.
    pub depth: f32,
    pub fade: f32,
}

/// A camera plus a drawing style. Both backends consume the same [`RenderFrame`].
pub trait RenderBackend {
    fn mode(&self) -> ViewMode;

    fn project(&self, rect: Rect, world: Position) -> Option<Projected>;

    /// Maps a screen point back into the world at the depth of `reference`.
    fn unproject(&self, rect: Rect, screen: Pos2, reference: Position) -> Position;

    /// Camera handling for scroll and background drags.
    fn handle_input(&mut self, ui: &Ui, rect: Rect, response: &Response);

    fn fit(&mut self, rect: Rect, extent: f32);

    fn paint_background(&self, painter: &Painter, rect: Rect);
}

pub fn project_frame(
    backend: &dyn RenderBackend,
    rect: Rect,
    frame: &RenderFrame,
) -> Vec<Option<Projected>> {
    frame
        .nodes
        .iter()
        .map(|node| backend.project(rect, node.position))
        .collect()
}

pub fn screen_radius(node: &RenderNode, projected: &Projected) -> f32 {
    (node.radius * projected.scale).clamp(2.0, 60.0)
}

/// Nearest node whose disc contains `pointer`, preferring whatever sits in front.
pub fn hit_test(frame: &RenderFrame, projected: &[Option<Projected>], pointer: Pos2) -> Option<usize> {
    frame
        .nodes
        .iter()
        .zip(projected)
        .enumerate()
        .filter_map(|(index, (node, projection))| {
            let projection = projection.as_ref()?;
            let distance = projection.screen.distance(pointer);
            let radius = screen_radius(node, projection).max(6.0);
            (distance <= radius).then_some((index, projection.depth, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.2.total_cmp(&b.2)))
        .map(|(index, _, _)| index)
}

fn distance_to_segment(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return point.distance(start);
    }

    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + (segment * t))
}

/// Link whose drawn segment passes within a few pixels of `pointer`.
pub fn hit_test_link(frame: &RenderFrame, projected: &[Option<Projected>], pointer: Pos2) -> Option<usize> {
    frame
        .links
        .iter()
        .enumerate()
        .filter(|(_, link)| !link.modifier.dimmed)
        .filter_map(|(index, link)| {
            let from = projected.get(link.source)?.as_ref()?;
            let to = projected.get(link.target)?.as_ref()?;
            let distance = distance_to_segment(pointer, from.screen, to.screen);
            (distance <= link.width + 4.0).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

/// Far-to-near node order so closer nodes paint over farther ones.
pub fn paint_order(projected: &[Option<Projected>]) -> Vec<usize> {
    let mut order = projected
        .iter()
        .enumerate()
        .filter_map(|(index, projection)| projection.map(|projection| (index, projection.depth)))
        .collect::<Vec<_>>();
    order.sort_by(|a, b| b.1.total_cmp(&a.1));
    order.into_iter().map(|(index, _)| index).collect()
}

pub fn paint_frame(
    painter: &Painter,
    rect: Rect,
    mode: ViewMode,
    frame: &RenderFrame,
    projected: &[Option<Projected>],
    hovered: Option<usize>,
) {
    for link in &frame.links {
        let (Some(Some(from)), Some(Some(to))) =
            (projected.get(link.source), projected.get(link.target))
        else {
            continue;
        };

        let fade = from.fade.min(to.fade);
        let scale = ((from.scale + to.scale) * 0.5).sqrt().clamp(0.5, 2.0);
        let (width, color) = if link.modifier.dimmed {
            (link.width * scale * 0.6, style::with_alpha(link.color, 0.12 * fade))
        } else if link.modifier.highlighted {
            (link.width * scale * 1.4, style::with_alpha(link.color, fade))
        } else {
            (link.width * scale, style::with_alpha(link.color, 0.7 * fade))
        };
        let stroke = Stroke::new(width, color);

        if link.kind == ConnectionType::Ghost {
            painter.extend(Shape::dashed_line(&[from.screen, to.screen], stroke, 6.0, 4.0));
        } else {
            painter.line_segment([from.screen, to.screen], stroke);
        }
    }

    for index in paint_order(projected) {
        let (Some(node), Some(Some(projection))) = (frame.nodes.get(index), projected.get(index)) else {
            continue;
        };
        let radius = screen_radius(node, projection);
        if !style::circle_visible(rect, projection.screen, radius + 80.0) {
            continue;
        }

        let is_hovered = hovered == Some(index);
        paint_node(painter, mode, node, projection, radius, is_hovered);
    }
}

fn paint_node(
    painter: &Painter,
    mode: ViewMode,
    node: &RenderNode,
    projection: &Projected,
    radius: f32,
    is_hovered: bool,
) {
    let modifier = node.modifier;
    let mut color = if modifier.dimmed {
        style::dim_color(node.color, 0.3)
    } else {
        node.color
    };
    if node.search_match && !modifier.dimmed {
        color = style::blend_color(color, style::SEARCH_MATCH, 0.45);
    }
    color = style::with_alpha(color, projection.fade);
    let center = projection.screen;

    if node.is_ghost {
        let outline = Stroke::new(1.5, color);
        let points = match mode {
            ViewMode::Flat => (0..=24)
                .map(|step| {
                    let angle = step as f32 / 24.0 * std::f32::consts::TAU;
                    center + vec2(angle.cos(), angle.sin()) * radius
                })
                .collect::<Vec<_>>(),
            ViewMode::Spatial => vec![
                center + vec2(0.0, -radius * 1.3),
                center + vec2(radius * 1.3, 0.0),
                center + vec2(0.0, radius * 1.3),
                center + vec2(-radius * 1.3, 0.0),
                center + vec2(0.0, -radius * 1.3),
            ],
        };
        painter.circle_filled(center, radius * 0.6, style::with_alpha(color, 0.25));
        painter.extend(Shape::dashed_line(&points, outline, 4.0, 3.0));
    } else if let Some(image) = node.image {
        let opacity = if modifier.dimmed { 0.3 } else { 1.0 };
        let tint = Color32::WHITE.gamma_multiply(opacity * projection.fade);
        painter.add(thumbnail::circle_image_mesh(image, center, radius, tint));

        let border = if modifier.dimmed {
            0.19
        } else if modifier.focused {
            1.0
        } else {
            0.53
        };
        painter.circle_stroke(
            center,
            radius,
            Stroke::new(1.5, style::with_alpha(node.color, border * projection.fade)),
        );
    } else {
        painter.circle_filled(center, radius, color);
        painter.circle_stroke(
            center,
            radius,
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(10, 10, 14, 200)),
        );
    }

    if modifier.selected {
        painter.circle_stroke(
            center,
            radius + 4.0,
            Stroke::new(2.0, style::with_alpha(style::SELECTED, projection.fade)),
        );
    }
    if modifier.focused || is_hovered {
        painter.circle_stroke(
            center,
            radius + 1.5,
            Stroke::new(1.6, Color32::from_gray(240)),
        );
    }

    let emphasized = modifier.focused || modifier.selected || is_hovered;
    let show_label = emphasized || (!modifier.dimmed && (node.search_match || projection.scale > 0.8));
    if show_label {
        let text = if emphasized {
            node.label.clone()
        } else {
            preview(&node.label)
        };
        let text_color = if modifier.dimmed {
            Color32::from_gray(110)
        } else {
            Color32::from_gray(232)
        };
        painter.text(
            center + vec2(radius + 5.0, 0.0),
            Align2::LEFT_CENTER,
            text,
            FontId::proportional(12.0),
            style::with_alpha(text_color, projection.fade),
        );
    }
}
