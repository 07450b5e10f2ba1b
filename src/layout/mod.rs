mod config;
mod forces;
mod position;
mod seed;

use std::collections::HashMap;

use rand::Rng;
use tracing::{debug, trace};

use crate::graph::{GraphLink, GraphNode};
use forces::{RepulsionParams, Spring, accumulate_repulsion, accumulate_springs, centroid};

pub use config::{Dimensions, LayoutConfig, LayoutProfiles};
pub use position::{Position, PositionOverrides};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettleReason {
    Converged,
    Cooled,
    IterationCap,
    /// Positions were computed elsewhere and handed in already at rest.
    Precomputed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepOutcome {
    Moving { max_displacement: f32 },
    Settled { iterations: usize, reason: SettleReason },
}

impl StepOutcome {
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Settled { .. })
    }
}

/// Incremental force simulation over one built graph.
///
/// Positions live in index order alongside the node list they were created from.
/// Pins are kept in a separate [`PositionOverrides`] table and always win over
/// simulated coordinates.
pub struct Simulation {
    ids: Vec<String>,
    index_by_id: HashMap<String, usize>,
    positions: Vec<Position>,
    velocities: Vec<Position>,
    forces: Vec<Position>,
    springs: Vec<Spring>,
    overrides: PositionOverrides,
    config: LayoutConfig,
    dimensions: Dimensions,
    alpha: f32,
    iterations: usize,
    settled: Option<SettleReason>,
}

impl Simulation {
    pub fn new<R: Rng + ?Sized>(
        nodes: &[GraphNode],
        links: &[GraphLink],
        components: &[Vec<&GraphNode>],
        config: &LayoutConfig,
        dimensions: Dimensions,
        rng: &mut R,
    ) -> Self {
        let mut simulation = Self::unseeded(nodes, links, config, dimensions);
        simulation.positions = seed::seed_positions(
            components,
            &simulation.index_by_id,
            simulation.ids.len(),
            config,
            dimensions,
            rng,
        );
        simulation
    }

    /// A simulation that is already at rest on `positions`, every node pinned.
    /// Nodes missing from the map start at the origin.
    pub fn settled(
        nodes: &[GraphNode],
        links: &[GraphLink],
        config: &LayoutConfig,
        dimensions: Dimensions,
        positions: &HashMap<String, Position>,
    ) -> Self {
        let mut simulation = Self::unseeded(nodes, links, config, dimensions);
        for (index, id) in simulation.ids.iter().enumerate() {
            if let Some(&position) = positions.get(id) {
                simulation.positions[index] = match dimensions {
                    Dimensions::Two => position.flattened(),
                    Dimensions::Three => position,
                };
            }
        }
        simulation.alpha = 0.0;
        simulation.settle(SettleReason::Precomputed);
        simulation
    }

    fn unseeded(
        nodes: &[GraphNode],
        links: &[GraphLink],
        config: &LayoutConfig,
        dimensions: Dimensions,
    ) -> Self {
        let mut ids = Vec::with_capacity(nodes.len());
        let mut index_by_id = HashMap::with_capacity(nodes.len());
        for node in nodes {
            if index_by_id.contains_key(&node.id) {
                continue;
            }
            index_by_id.insert(node.id.clone(), ids.len());
            ids.push(node.id.clone());
        }

        let mut springs = Vec::with_capacity(links.len());
        let mut skipped = 0usize;
        for link in links {
            let (Some(&from), Some(&to)) =
                (index_by_id.get(&link.source), index_by_id.get(&link.target))
            else {
                skipped += 1;
                continue;
            };
            if from == to {
                skipped += 1;
                continue;
            }

            springs.push(Spring {
                from,
                to,
                rest_length: config.rest_length(link.kind, link.strength),
                stiffness: config.stiffness(link.strength),
            });
        }
        if skipped > 0 {
            debug!(skipped, "links left out of the force system");
        }

        let node_count = ids.len();

        Self {
            ids,
            index_by_id,
            positions: vec![Position::ZERO; node_count],
            velocities: vec![Position::ZERO; node_count],
            forces: vec![Position::ZERO; node_count],
            springs,
            overrides: PositionOverrides::default(),
            config: config.clone(),
            dimensions,
            alpha: 1.0,
            iterations: 0,
            settled: None,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn spring_count(&self) -> usize {
        self.springs.len()
    }

    pub fn is_settled(&self) -> bool {
        self.settled.is_some()
    }

    pub fn settle_reason(&self) -> Option<SettleReason> {
        self.settled
    }

    pub fn overrides(&self) -> &PositionOverrides {
        &self.overrides
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    /// Current coordinate of a node, with its pin applied if it has one.
    pub fn position(&self, index: usize) -> Option<Position> {
        let id = self.ids.get(index)?;
        Some(
            self.overrides
                .get(id)
                .unwrap_or(self.positions[index]),
        )
    }

    pub fn position_of(&self, id: &str) -> Option<Position> {
        self.index_of(id).and_then(|index| self.position(index))
    }

    pub fn positions(&self) -> HashMap<String, Position> {
        self.ids
            .iter()
            .enumerate()
            .filter_map(|(index, id)| Some((id.clone(), self.position(index)?)))
            .collect()
    }

    /// Fixes a node in place. The pin holds until the simulation is rebuilt.
    pub fn pin(&mut self, id: &str, position: Position) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };

        let position = match self.dimensions {
            Dimensions::Two => position.flattened(),
            Dimensions::Three => position,
        };
        self.positions[index] = position;
        self.velocities[index] = Position::ZERO;
        self.overrides.pin(id, position);
        true
    }

    pub fn step(&mut self) -> StepOutcome {
        if let Some(reason) = self.settled {
            return StepOutcome::Settled {
                iterations: self.iterations,
                reason,
            };
        }

        let node_count = self.ids.len();
        self.forces.clear();
        self.forces.resize(node_count, Position::ZERO);

        accumulate_repulsion(
            &self.positions,
            RepulsionParams {
                strength: self.config.charge_strength * self.alpha,
                distance_min: self.config.distance_min.max(0.01),
                distance_max: self.config.distance_max,
            },
            self.dimensions,
            &mut self.forces,
        );
        accumulate_springs(&self.positions, &self.springs, self.alpha, &mut self.forces);

        let retain = (1.0 - self.config.velocity_decay).clamp(0.0, 1.0);
        let max_speed = self.config.max_speed.max(0.0);
        let mut max_displacement = 0.0_f32;

        for index in 0..node_count {
            if let Some(pinned) = self.overrides.get(&self.ids[index]) {
                self.positions[index] = pinned;
                self.velocities[index] = Position::ZERO;
                continue;
            }

            let mut velocity = (self.velocities[index] + self.forces[index]) * retain;
            let speed = velocity.length();
            if speed > max_speed && speed > 0.0 {
                velocity = velocity * (max_speed / speed);
            }
            if !velocity.is_finite() {
                velocity = Position::ZERO;
            }

            self.velocities[index] = velocity;
            self.positions[index] += velocity;
            max_displacement = max_displacement.max(velocity.length());
        }

        self.apply_centering();

        self.iterations += 1;
        self.alpha *= 1.0 - self.config.alpha_decay.clamp(0.0, 1.0);

        let reason = if max_displacement < self.config.convergence_epsilon {
            Some(SettleReason::Converged)
        } else if self.alpha < self.config.alpha_min {
            Some(SettleReason::Cooled)
        } else if self.iterations >= self.config.max_iterations {
            Some(SettleReason::IterationCap)
        } else {
            None
        };

        trace!(
            iteration = self.iterations,
            alpha = self.alpha,
            max_displacement,
            "layout step"
        );

        match reason {
            Some(reason) => {
                self.settle(reason);
                StepOutcome::Settled {
                    iterations: self.iterations,
                    reason,
                }
            }
            None => StepOutcome::Moving { max_displacement },
        }
    }

    /// Runs up to `steps_per_frame` steps so one animation frame stays short.
    pub fn step_frame(&mut self) -> StepOutcome {
        let mut outcome = StepOutcome::Moving {
            max_displacement: 0.0,
        };
        for _ in 0..self.config.steps_per_frame.max(1) {
            outcome = self.step();
            if outcome.is_settled() {
                break;
            }
        }
        outcome
    }

    pub fn run(&mut self) -> StepOutcome {
        loop {
            let outcome = self.step();
            if outcome.is_settled() {
                return outcome;
            }
        }
    }

    fn apply_centering(&mut self) {
        let strength = self.config.center_strength.clamp(0.0, 1.0);
        if strength <= 0.0 {
            return;
        }

        let free = self
            .positions
            .iter()
            .zip(&self.ids)
            .filter(|(_, id)| !self.overrides.contains(id))
            .map(|(position, _)| *position)
            .collect::<Vec<_>>();
        if free.is_empty() {
            return;
        }

        let shift = centroid(&free) * strength;
        for (index, position) in self.positions.iter_mut().enumerate() {
            if !self.overrides.contains(&self.ids[index]) {
                *position -= shift;
            }
        }
    }

    fn settle(&mut self, reason: SettleReason) {
        for (index, id) in self.ids.iter().enumerate() {
            if !self.overrides.contains(id) {
                self.overrides.pin(id.clone(), self.positions[index]);
            }
            self.velocities[index] = Position::ZERO;
        }
        self.settled = Some(reason);
        debug!(
            iterations = self.iterations,
            nodes = self.ids.len(),
            ?reason,
            "layout settled"
        );
    }
}

/// Seeds, relaxes to completion, and returns every node's final position.
pub fn layout<R: Rng + ?Sized>(
    nodes: &[GraphNode],
    links: &[GraphLink],
    components: &[Vec<&GraphNode>],
    config: &LayoutConfig,
    dimensions: Dimensions,
    rng: &mut R,
) -> HashMap<String, Position> {
    let mut simulation = Simulation::new(nodes, links, components, config, dimensions, rng);
    simulation.run();
    simulation.positions()
}
