use std::cmp::Reverse;
use std::collections::HashMap;
use std::f32::consts::TAU;

use rand::Rng;

use crate::graph::GraphNode;

use super::config::{Dimensions, LayoutConfig};
use super::position::Position;

pub(super) fn random_direction<R: Rng + ?Sized>(rng: &mut R, dimensions: Dimensions) -> Position {
    let angle = rng.gen_range(0.0..TAU);
    match dimensions {
        Dimensions::Two => Position::planar(angle.cos(), angle.sin()),
        Dimensions::Three => {
            let z: f32 = rng.gen_range(-1.0..=1.0);
            let ring = (1.0 - (z * z)).max(0.0).sqrt();
            Position::new(ring * angle.cos(), ring * angle.sin(), z)
        }
    }
}

/// Places each component around its own center, spread over a circle or sphere
/// whose radius grows with the node count. Inside a component the best-connected
/// node sits at the center and the rest fill shells outward.
pub(super) fn seed_positions<R: Rng + ?Sized>(
    components: &[Vec<&GraphNode>],
    index_by_id: &HashMap<String, usize>,
    node_count: usize,
    config: &LayoutConfig,
    dimensions: Dimensions,
    rng: &mut R,
) -> Vec<Position> {
    let spread = config.spread_radius(node_count);
    let per_shell = config.nodes_per_shell.max(1);
    let mut seeded: Vec<Option<Position>> = vec![None; node_count];

    for component in components {
        let center = if components.len() == 1 {
            Position::ZERO
        } else {
            random_direction(rng, dimensions) * (spread * rng.gen_range(0.55_f32..=1.0))
        };

        let mut ordered = component.clone();
        ordered.sort_by_key(|node| Reverse(node.connection_count));

        for (rank, node) in ordered.iter().enumerate() {
            let Some(&index) = index_by_id.get(&node.id) else {
                continue;
            };
            if seeded[index].is_some() {
                continue;
            }

            let position = if rank == 0 {
                center
            } else {
                let shell = ((rank - 1) / per_shell) + 1;
                let radius = shell as f32 * config.shell_spacing;
                center + (random_direction(rng, dimensions) * radius)
            };
            seeded[index] = Some(position);
        }
    }

    seeded
        .into_iter()
        .map(|position| {
            position.unwrap_or_else(|| {
                random_direction(rng, dimensions) * (spread * rng.gen_range(0.0_f32..=1.0))
            })
        })
        .collect()
}
