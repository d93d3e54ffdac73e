#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Champion auto-attack system.
//!
//! While attacking is enabled the champion swings at the nearest agent on a
//! fixed cadence; swings that fall outside attack range are wasted rather
//! than deferred. The system only proposes `ApplyDamage` commands; the
//! world decides what that damage does.

use std::time::Duration;

use grid_skirmish_core::{AgentId, AgentView, ChampionSnapshot, Command, Event, WorldPoint};

/// Configuration parameters required to construct the duel system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    attack_damage: i32,
    attack_interval: Duration,
    attack_range: f32,
}

impl Config {
    /// Creates a new configuration from the provided swing parameters.
    #[must_use]
    pub const fn new(attack_damage: i32, attack_interval: Duration, attack_range: f32) -> Self {
        Self {
            attack_damage,
            attack_interval,
            attack_range,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            attack_damage: 10,
            attack_interval: Duration::from_secs(1),
            attack_range: 1.5,
        }
    }
}

/// Pure system that drives the champion's recurring attack.
#[derive(Debug)]
pub struct Duel {
    config: Config,
    attacking: bool,
    ready_in: Duration,
    target: Option<AgentId>,
}

impl Duel {
    /// Creates a new duel system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            attacking: false,
            ready_in: Duration::ZERO,
            target: None,
        }
    }

    /// Enables or disables the champion's auto-attack.
    ///
    /// Enabling resets the swing timer so the first swing lands on the next
    /// tick.
    pub fn set_attacking(&mut self, attacking: bool) {
        if attacking && !self.attacking {
            self.ready_in = Duration::ZERO;
        }
        self.attacking = attacking;
    }

    /// Reports whether the auto-attack is currently enabled.
    #[must_use]
    pub const fn is_attacking(&self) -> bool {
        self.attacking
    }

    /// Consumes events and immutable views to emit damage commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        agents: &AgentView,
        champion: ChampionSnapshot,
        out: &mut Vec<Command>,
    ) {
        let mut dt = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt: advanced } = event {
                dt = dt.saturating_add(*advanced);
            }
        }

        if dt.is_zero() {
            return;
        }

        if champion.health.is_depleted() {
            self.attacking = false;
            self.target = None;
            return;
        }

        // A despawned target drops off the ledger; fall back to whichever
        // agent is nearest now.
        if let Some(target) = self.target {
            if agents.get(target).is_none() {
                self.target = None;
            }
        }
        if self.target.is_none() {
            self.target = nearest_agent(agents, champion.position);
        }

        if !self.attacking {
            return;
        }

        let Some(target) = self.target else {
            self.attacking = false;
            return;
        };

        if !self.ready_in.is_zero() {
            self.ready_in = self.ready_in.saturating_sub(dt);
            return;
        }

        let Some(snapshot) = agents.get(target) else {
            return;
        };

        if champion.position.distance_to(snapshot.position) <= self.config.attack_range {
            out.push(Command::ApplyDamage {
                agent: target,
                amount: self.config.attack_damage,
            });
        }
        self.ready_in = self.config.attack_interval;
    }
}

fn nearest_agent(agents: &AgentView, position: WorldPoint) -> Option<AgentId> {
    let mut best: Option<(AgentId, f32)> = None;

    for snapshot in agents.iter() {
        let distance = position.distance_to(snapshot.position);
        let closer = best.map_or(true, |(_, best_distance)| distance < best_distance);
        if closer {
            best = Some((snapshot.id, distance));
        }
    }

    best.map(|(agent, _)| agent)
}
