use std::collections::HashMap;

use eframe::egui::epaint::{Mesh, Vertex};
use eframe::egui::{Color32, ColorImage, Context, Pos2, Rect, TextureHandle, TextureId, pos2, vec2};
use tracing::warn;

use crate::fragments::decode_data_url;
use crate::graph::BuiltGraph;

use super::RenderFrame;

const FAN_SEGMENTS: usize = 32;

/// An uploaded thumbnail and the part of it that fills a node's disc.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeImage {
    pub texture: TextureId,
    pub uv: Rect,
}

/// Centered square crop, so wide and tall pictures fill the disc without
/// stretching.
pub fn cover_uv(size: [usize; 2]) -> Rect {
    let [width, height] = size.map(|edge| edge.max(1) as f32);
    let (half_u, half_v) = if width >= height {
        (0.5 * height / width, 0.5)
    } else {
        (0.5, 0.5 * width / height)
    };
    Rect::from_center_size(pos2(0.5, 0.5), vec2(half_u * 2.0, half_v * 2.0))
}

pub fn decode_thumbnail(data_url: &str) -> Option<ColorImage> {
    let bytes = decode_data_url(data_url)?;
    let pixels = image::load_from_memory(&bytes).ok()?.to_rgba8();
    let size = [pixels.width() as usize, pixels.height() as usize];
    if size[0] == 0 || size[1] == 0 {
        return None;
    }
    Some(ColorImage::from_rgba_unmultiplied(size, pixels.as_raw()))
}

/// Uploaded thumbnails keyed by fragment id. A thumbnail that fails to decode
/// is remembered as missing and not retried.
#[derive(Default)]
pub struct ThumbnailCache {
    textures: HashMap<String, Option<TextureHandle>>,
}

impl ThumbnailCache {
    pub fn image(&mut self, ctx: &Context, key: &str, data_url: &str) -> Option<NodeImage> {
        let handle = self.textures.entry(key.to_owned()).or_insert_with(|| {
            let Some(image) = decode_thumbnail(data_url) else {
                warn!(fragment = key, "thumbnail could not be decoded");
                return None;
            };
            Some(ctx.load_texture(format!("thumbnail-{key}"), image, Default::default()))
        });

        handle.as_ref().map(|handle| NodeImage {
            texture: handle.id(),
            uv: cover_uv(handle.size()),
        })
    }

    /// Fills in the image of every frame node whose fragment carries a thumbnail.
    pub fn attach(&mut self, ctx: &Context, graph: &BuiltGraph, frame: &mut RenderFrame) {
        for (node, rendered) in graph.nodes.iter().zip(&mut frame.nodes) {
            rendered.image = node
                .thumbnail
                .as_deref()
                .and_then(|url| self.image(ctx, &node.id, url));
        }
    }
}

/// A disc of `radius` around `center` showing `image`, as a triangle fan.
pub fn circle_image_mesh(image: NodeImage, center: Pos2, radius: f32, tint: Color32) -> Mesh {
    let mut mesh = Mesh::with_texture(image.texture);
    let uv_center = image.uv.center();
    let uv_half = image.uv.size() * 0.5;

    mesh.vertices.push(Vertex {
        pos: center,
        uv: uv_center,
        color: tint,
    });
    for step in 0..=FAN_SEGMENTS {
        let angle = step as f32 / FAN_SEGMENTS as f32 * std::f32::consts::TAU;
        let direction = vec2(angle.cos(), angle.sin());
        mesh.vertices.push(Vertex {
            pos: center + direction * radius,
            uv: uv_center + direction * uv_half,
            color: tint,
        });
    }
    for step in 1..=FAN_SEGMENTS as u32 {
        mesh.add_triangle(0, step, step + 1);
    }
    mesh
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    use super::*;
    use crate::fragments::{Fragment, FragmentImage, sample_png};
    use crate::graph::build;
    use crate::interaction::{InteractionState, derive_modifiers};
    use crate::layout::Position;

    fn png_url(width: u32, height: u32) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(sample_png(width, height)))
    }

    #[test]
    fn wide_and_tall_pictures_crop_to_a_centered_square() {
        let wide = cover_uv([200, 100]);
        assert!((wide.width() - 0.5).abs() < 1e-6);
        assert!((wide.height() - 1.0).abs() < 1e-6);
        assert_eq!(wide.center(), pos2(0.5, 0.5));

        let tall = cover_uv([50, 200]);
        assert!((tall.width() - 1.0).abs() < 1e-6);
        assert!((tall.height() - 0.25).abs() < 1e-6);

        assert_eq!(cover_uv([64, 64]), Rect::from_min_max(Pos2::ZERO, pos2(1.0, 1.0)));
    }

    #[test]
    fn disc_mesh_stays_inside_the_circle_and_the_crop() {
        let image = NodeImage {
            texture: TextureId::Managed(7),
            uv: cover_uv([200, 100]),
        };
        let center = pos2(40.0, 30.0);
        let mesh = circle_image_mesh(image, center, 12.0, Color32::WHITE);

        assert_eq!(mesh.texture_id, image.texture);
        assert_eq!(mesh.vertices.len(), FAN_SEGMENTS + 2);
        assert_eq!(mesh.indices.len(), FAN_SEGMENTS * 3);
        assert!(mesh.is_valid());
        for vertex in &mesh.vertices {
            assert!(vertex.pos.distance(center) <= 12.0 + 1e-3);
            assert!(image.uv.expand(1e-4).contains(vertex.uv));
        }
        assert_eq!(mesh.vertices[1].pos, pos2(52.0, 30.0));
    }

    #[test]
    fn cache_uploads_each_thumbnail_once_and_skips_broken_ones() {
        let ctx = Context::default();
        let mut cache = ThumbnailCache::default();
        let url = png_url(40, 20);

        let first = cache.image(&ctx, "f1", &url).unwrap();
        let again = cache.image(&ctx, "f1", &url).unwrap();
        assert_eq!(first, again);
        assert_eq!(first.uv, cover_uv([40, 20]));

        assert!(decode_thumbnail("data:image/png;base64,AAAA").is_none());
        assert!(cache.image(&ctx, "f2", "data:image/png;base64,AAAA").is_none());
        assert!(cache.textures.contains_key("f2"));
    }

    #[test]
    fn frames_pick_up_thumbnails_for_image_fragments() {
        let mut with_image = Fragment::text("f1", "a cracked bowl");
        with_image.image = Some(FragmentImage {
            base64: String::new(),
            mime_type: "image/png".to_owned(),
            thumbnail: png_url(16, 16),
            reading: None,
        });
        let graph = build(&[with_image, Fragment::text("f2", "b")], &[], &[], &[], &[]);
        let positions = vec![Position::ZERO, Position::planar(30.0, 0.0)];
        let modifiers = derive_modifiers(&graph, &InteractionState::default());
        let mut frame = RenderFrame::compose(&graph, &positions, &modifiers, &Default::default());

        let ctx = Context::default();
        ThumbnailCache::default().attach(&ctx, &graph, &mut frame);
        assert!(frame.nodes[0].image.is_some());
        assert!(frame.nodes[1].image.is_none());
    }
}
