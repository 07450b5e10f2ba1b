use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fragments::ConnectionType;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dimensions {
    Two,
    Three,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkDistances {
    pub resonance: f32,
    pub tension: f32,
    pub genealogy: f32,
    pub metaphor: f32,
    pub bridge: f32,
    pub ghost: f32,
}

impl LinkDistances {
    pub fn for_kind(&self, kind: ConnectionType) -> f32 {
        match kind {
            ConnectionType::Resonance => self.resonance,
            ConnectionType::Tension => self.tension,
            ConnectionType::Genealogy => self.genealogy,
            ConnectionType::Metaphor => self.metaphor,
            ConnectionType::Bridge => self.bridge,
            ConnectionType::Ghost => self.ghost,
        }
    }

    fn scaled(&self, factor: f32) -> Self {
        Self {
            resonance: self.resonance * factor,
            tension: self.tension * factor,
            genealogy: self.genealogy * factor,
            metaphor: self.metaphor * factor,
            bridge: self.bridge * factor,
            ghost: self.ghost * factor,
        }
    }
}

/// Tuning constants for one layout variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Seeding spread radius is `base_radius + radius_per_node * n`.
    pub base_radius: f32,
    pub radius_per_node: f32,
    pub nodes_per_shell: usize,
    pub shell_spacing: f32,
    pub charge_strength: f32,
    pub distance_min: f32,
    /// Pairs farther apart than this do not repel.
    pub distance_max: f32,
    pub link_distances: LinkDistances,
    /// Fraction of the type distance removed at full strength.
    pub strength_shrink: f32,
    pub spring_constant: f32,
    pub center_strength: f32,
    pub velocity_decay: f32,
    pub max_speed: f32,
    pub alpha_decay: f32,
    pub alpha_min: f32,
    pub max_iterations: usize,
    pub convergence_epsilon: f32,
    pub steps_per_frame: usize,
    /// Relax across frames on screen. When false the layout is computed in
    /// one pass before the graph is shown.
    pub animate: bool,
}

impl LayoutConfig {
    pub fn planar() -> Self {
        Self {
            base_radius: 120.0,
            radius_per_node: 12.0,
            nodes_per_shell: 3,
            shell_spacing: 45.0,
            charge_strength: 6_000.0,
            distance_min: 6.0,
            distance_max: 320.0,
            link_distances: LinkDistances {
                resonance: 60.0,
                tension: 190.0,
                genealogy: 70.0,
                metaphor: 110.0,
                bridge: 170.0,
                ghost: 100.0,
            },
            strength_shrink: 0.5,
            spring_constant: 0.7,
            center_strength: 0.1,
            velocity_decay: 0.4,
            max_speed: 40.0,
            alpha_decay: 0.0228,
            alpha_min: 0.001,
            max_iterations: 300,
            convergence_epsilon: 0.05,
            steps_per_frame: 4,
            animate: true,
        }
    }

    pub fn spatial() -> Self {
        let planar = Self::planar();
        Self {
            base_radius: 220.0,
            radius_per_node: 24.0,
            shell_spacing: 70.0,
            charge_strength: 30_000.0,
            distance_min: 10.0,
            distance_max: 900.0,
            link_distances: planar.link_distances.scaled(1.6),
            center_strength: 0.05,
            max_speed: 90.0,
            animate: false,
            ..planar
        }
    }

    pub fn spread_radius(&self, node_count: usize) -> f32 {
        self.base_radius + (self.radius_per_node * node_count as f32)
    }

    pub fn rest_length(&self, kind: ConnectionType, strength: f32) -> f32 {
        let strength = strength.clamp(0.0, 1.0);
        let shrink = self.strength_shrink.clamp(0.0, 0.95);
        self.link_distances.for_kind(kind) * (1.0 - (shrink * strength))
    }

    pub fn stiffness(&self, strength: f32) -> f32 {
        self.spring_constant * strength.clamp(0.0, 1.0)
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::planar()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutProfiles {
    pub two_d: LayoutConfig,
    pub three_d: LayoutConfig,
}

impl Default for LayoutProfiles {
    fn default() -> Self {
        Self {
            two_d: LayoutConfig::planar(),
            three_d: LayoutConfig::spatial(),
        }
    }
}

fn merge_values(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge_values(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

impl LayoutProfiles {
    pub fn for_dimensions(&self, dimensions: Dimensions) -> &LayoutConfig {
        match dimensions {
            Dimensions::Two => &self.two_d,
            Dimensions::Three => &self.three_d,
        }
    }

    /// Applies a partial JSON document over the built-in profiles.
    pub fn with_overrides(raw: &str) -> Result<Self> {
        let overrides: Value = serde_json::from_str(raw).context("layout config is not valid JSON")?;
        if !overrides.is_object() {
            return Err(anyhow!("layout config must be a JSON object"));
        }

        let mut merged =
            serde_json::to_value(Self::default()).context("failed to encode default layout")?;
        merge_values(&mut merged, overrides);
        serde_json::from_value(merged).context("layout config has invalid field values")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read layout config {}", path.display()))?;
        Self::with_overrides(&raw).with_context(|| format!("in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_length_depends_on_type_and_strength() {
        let config = LayoutConfig::planar();
        let tight = config.rest_length(ConnectionType::Resonance, 0.9);
        let loose = config.rest_length(ConnectionType::Tension, 0.2);
        assert!(tight < loose);

        let weak = config.rest_length(ConnectionType::Metaphor, 0.1);
        let strong = config.rest_length(ConnectionType::Metaphor, 0.9);
        assert!(strong < weak);

        assert_eq!(config.stiffness(0.0), 0.0);
        assert!(config.stiffness(1.0) > config.stiffness(0.2));
    }

    #[test]
    fn spatial_profile_spreads_wider() {
        let planar = LayoutConfig::planar();
        let spatial = LayoutConfig::spatial();
        assert!(spatial.charge_strength > planar.charge_strength);
        assert!(spatial.distance_max > planar.distance_max);
        assert!(spatial.spread_radius(10) > planar.spread_radius(10));
        assert!(planar.animate);
        assert!(!spatial.animate);
    }

    #[test]
    fn partial_overrides_keep_other_defaults() {
        let profiles = LayoutProfiles::with_overrides(
            r#"{"three_d": {"charge_strength": 12.5, "link_distances": {"tension": 400.0}}}"#,
        )
        .unwrap();

        assert_eq!(profiles.two_d, LayoutConfig::planar());
        assert_eq!(profiles.three_d.charge_strength, 12.5);
        assert_eq!(profiles.three_d.link_distances.tension, 400.0);
        assert_eq!(
            profiles.three_d.link_distances.resonance,
            LayoutConfig::spatial().link_distances.resonance
        );
        assert_eq!(
            profiles.three_d.distance_max,
            LayoutConfig::spatial().distance_max
        );
    }

    #[test]
    fn rejects_wrongly_typed_overrides() {
        assert!(LayoutProfiles::with_overrides(r#"{"two_d": {"max_iterations": "many"}}"#).is_err());
        assert!(LayoutProfiles::with_overrides("[]").is_err());
    }
}
