//! Scenario configuration loaded from an optional TOML file.
//!
//! Every field has a default mirroring the stock tuning, so a bare
//! invocation runs a sensible skirmish without any file at all.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use grid_skirmish_core::{AgentTuning, ChampionTuning, WorldPoint};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Scenario {
    pub(crate) grid: GridSection,
    pub(crate) agents: AgentSection,
    pub(crate) champion: ChampionSection,
    pub(crate) duel: DuelSection,
}

impl Scenario {
    /// Loads the scenario file when a path was given, otherwise the defaults.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = fs::read_to_string(path)
            .with_context(|| format!("reading scenario file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing scenario file {}", path.display()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GridSection {
    pub(crate) world_width: f32,
    pub(crate) world_height: f32,
    pub(crate) node_radius: f32,
    /// Probability that a cell center is covered by an obstacle.
    pub(crate) obstacle_density: f64,
    /// Probability that a cell center carries a walkability-restoring waypoint.
    pub(crate) waypoint_density: f64,
}

impl GridSection {
    pub(crate) fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.obstacle_density),
            "obstacle_density {} is not a probability",
            self.obstacle_density
        );
        ensure!(
            (0.0..=1.0).contains(&self.waypoint_density),
            "waypoint_density {} is not a probability",
            self.waypoint_density
        );
        Ok(())
    }
}

impl Default for GridSection {
    fn default() -> Self {
        Self {
            world_width: 10.0,
            world_height: 10.0,
            node_radius: 0.5,
            obstacle_density: 0.15,
            waypoint_density: 0.05,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct AgentSection {
    pub(crate) move_speed: f32,
    pub(crate) wait_at_waypoint_secs: f32,
    pub(crate) detection_range: f32,
    pub(crate) battle_range: f32,
    pub(crate) flee_range: f32,
    pub(crate) max_health: i32,
    pub(crate) attack_power: i32,
    pub(crate) attack_interval_secs: f32,
    pub(crate) low_health_threshold: f32,
    /// Grid cells agents spawn on at startup.
    pub(crate) spawn_cells: Vec<[i32; 2]>,
}

impl AgentSection {
    pub(crate) fn tuning(&self) -> Result<AgentTuning> {
        Ok(AgentTuning {
            move_speed: self.move_speed,
            wait_at_waypoint: seconds(self.wait_at_waypoint_secs, "wait_at_waypoint_secs")?,
            detection_range: self.detection_range,
            battle_range: self.battle_range,
            flee_range: self.flee_range,
            max_health: self.max_health,
            attack_power: self.attack_power,
            attack_interval: seconds(self.attack_interval_secs, "attack_interval_secs")?,
            low_health_threshold: self.low_health_threshold,
        })
    }
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            move_speed: 2.0,
            wait_at_waypoint_secs: 1.0,
            detection_range: 5.0,
            battle_range: 1.5,
            flee_range: 3.0,
            max_health: 50,
            attack_power: 1,
            attack_interval_secs: 1.5,
            low_health_threshold: 0.3,
            spawn_cells: vec![[1, 1], [8, 1], [1, 8]],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ChampionSection {
    pub(crate) max_health: i32,
    pub(crate) defend_duration_secs: f32,
    pub(crate) defend_cooldown_secs: f32,
    /// World-space position the champion holds for the whole run.
    pub(crate) start: [f32; 2],
    /// Health at or below which the champion defends as soon as it can.
    pub(crate) guard_below_health: i32,
}

impl ChampionSection {
    pub(crate) fn tuning(&self) -> Result<ChampionTuning> {
        Ok(ChampionTuning {
            max_health: self.max_health,
            defend_duration: seconds(self.defend_duration_secs, "defend_duration_secs")?,
            defend_cooldown: seconds(self.defend_cooldown_secs, "defend_cooldown_secs")?,
        })
    }

    pub(crate) fn start_position(&self) -> WorldPoint {
        WorldPoint::new(self.start[0], self.start[1])
    }
}

impl Default for ChampionSection {
    fn default() -> Self {
        Self {
            max_health: 100,
            defend_duration_secs: 2.0,
            defend_cooldown_secs: 5.0,
            start: [0.0, 0.0],
            guard_below_health: 50,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct DuelSection {
    pub(crate) attack_damage: i32,
    pub(crate) attack_interval_secs: f32,
    pub(crate) attack_range: f32,
    /// Whether the champion fights back at all.
    pub(crate) auto_attack: bool,
}

impl DuelSection {
    pub(crate) fn attack_interval(&self) -> Result<Duration> {
        seconds(self.attack_interval_secs, "attack_interval_secs")
    }
}

impl Default for DuelSection {
    fn default() -> Self {
        Self {
            attack_damage: 10,
            attack_interval_secs: 1.0,
            attack_range: 1.5,
            auto_attack: true,
        }
    }
}

fn seconds(value: f32, name: &str) -> Result<Duration> {
    Duration::try_from_secs_f32(value).with_context(|| format!("{name} = {value} is not a valid duration"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_survive_tuning_validation() {
        let scenario = Scenario::default();
        scenario.grid.validate().expect("grid section");
        let agents = scenario.agents.tuning().expect("agent tuning");
        agents.validate().expect("agent tuning validates");
        let champion = scenario.champion.tuning().expect("champion tuning");
        champion.validate().expect("champion tuning validates");
    }

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let scenario: Scenario = toml::from_str(
            r#"
            [agents]
            max_health = 80
            spawn_cells = [[2, 2]]
            "#,
        )
        .expect("partial scenario parses");

        assert_eq!(scenario.agents.max_health, 80);
        assert_eq!(scenario.agents.spawn_cells, vec![[2, 2]]);
        assert_eq!(scenario.champion.max_health, 100);
        assert_eq!(scenario.grid.world_width, 10.0);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: std::result::Result<Scenario, _> = toml::from_str(
            r#"
            [agents]
            max_helth = 80
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn negative_durations_are_reported() {
        let section = AgentSection {
            wait_at_waypoint_secs: -1.0,
            ..AgentSection::default()
        };
        assert!(section.tuning().is_err());
    }
}
