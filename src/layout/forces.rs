use super::config::Dimensions;
use super::position::Position;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Spring {
    pub(super) from: usize,
    pub(super) to: usize,
    pub(super) rest_length: f32,
    pub(super) stiffness: f32,
}

#[derive(Clone, Copy)]
pub(super) struct RepulsionParams {
    pub(super) strength: f32,
    pub(super) distance_min: f32,
    pub(super) distance_max: f32,
}

fn separation_direction(from: usize, to: usize, dimensions: Dimensions) -> Position {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    match dimensions {
        Dimensions::Two => Position::planar(angle.cos(), angle.sin()),
        Dimensions::Three => {
            let tilt = ((from + to) as f32 * 0.381_966).fract() * 2.0 - 1.0;
            let ring = (1.0 - (tilt * tilt)).sqrt();
            Position::new(ring * angle.cos(), ring * angle.sin(), tilt)
        }
    }
}

/// Inverse-square repulsion between every pair closer than `distance_max`.
pub(super) fn accumulate_repulsion(
    positions: &[Position],
    params: RepulsionParams,
    dimensions: Dimensions,
    forces: &mut [Position],
) {
    let max_distance_sq = params.distance_max * params.distance_max;
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            let delta = positions[i] - positions[j];
            let distance_sq = delta.length_sq();
            if distance_sq > max_distance_sq {
                continue;
            }

            let distance = distance_sq.sqrt();
            let direction = if distance > 0.0001 {
                delta / distance
            } else {
                separation_direction(i, j, dimensions)
            };

            let effective = distance.max(params.distance_min);
            let push = direction * (params.strength / (effective * effective));
            forces[i] += push;
            forces[j] -= push;
        }
    }
}

/// Pulls or pushes each spring's endpoints toward its rest length.
pub(super) fn accumulate_springs(
    positions: &[Position],
    springs: &[Spring],
    alpha: f32,
    forces: &mut [Position],
) {
    for spring in springs {
        let delta = positions[spring.to] - positions[spring.from];
        let distance = delta.length();
        if distance <= 0.0001 || spring.stiffness <= 0.0 {
            continue;
        }

        let stretch = ((distance - spring.rest_length) / distance) * spring.stiffness * alpha;
        let correction = delta * (stretch * 0.5);
        forces[spring.from] += correction;
        forces[spring.to] -= correction;
    }
}

pub(super) fn centroid(positions: &[Position]) -> Position {
    if positions.is_empty() {
        return Position::ZERO;
    }

    let mut sum = Position::ZERO;
    for position in positions {
        sum += *position;
    }
    sum / positions.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repulsion_is_symmetric_and_capped_by_distance() {
        let positions = vec![
            Position::planar(0.0, 0.0),
            Position::planar(10.0, 0.0),
            Position::planar(500.0, 0.0),
        ];
        let mut forces = vec![Position::ZERO; 3];
        accumulate_repulsion(
            &positions,
            RepulsionParams {
                strength: 100.0,
                distance_min: 1.0,
                distance_max: 100.0,
            },
            Dimensions::Two,
            &mut forces,
        );

        assert!(forces[0].x < 0.0);
        assert!(forces[1].x > 0.0);
        assert!((forces[0].x + forces[1].x).abs() < 1e-6);
        assert!((forces[0].x + 1.0).abs() < 1e-6);
        assert_eq!(forces[2], Position::ZERO);
    }

    #[test]
    fn coincident_nodes_still_separate() {
        let positions = vec![Position::new(3.0, 3.0, 3.0); 2];
        let mut forces = vec![Position::ZERO; 2];
        accumulate_repulsion(
            &positions,
            RepulsionParams {
                strength: 50.0,
                distance_min: 5.0,
                distance_max: 100.0,
            },
            Dimensions::Three,
            &mut forces,
        );

        assert!(forces[0].length() > 0.0);
        assert!(forces.iter().all(|force| force.is_finite()));
    }

    #[test]
    fn springs_pull_when_stretched_and_push_when_compressed() {
        let positions = vec![Position::planar(0.0, 0.0), Position::planar(100.0, 0.0)];
        let spring = Spring {
            from: 0,
            to: 1,
            rest_length: 40.0,
            stiffness: 0.5,
        };

        let mut forces = vec![Position::ZERO; 2];
        accumulate_springs(&positions, &[spring], 1.0, &mut forces);
        assert!(forces[0].x > 0.0 && forces[1].x < 0.0);

        let compressed = Spring {
            rest_length: 160.0,
            ..spring
        };
        let mut forces = vec![Position::ZERO; 2];
        accumulate_springs(&positions, &[compressed], 1.0, &mut forces);
        assert!(forces[0].x < 0.0 && forces[1].x > 0.0);

        let slack = Spring {
            stiffness: 0.0,
            ..spring
        };
        let mut forces = vec![Position::ZERO; 2];
        accumulate_springs(&positions, &[slack], 1.0, &mut forces);
        assert_eq!(forces, vec![Position::ZERO; 2]);
    }
}
