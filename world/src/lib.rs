#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Grid Skirmish.
//!
//! The world owns the immutable node grid, the collection of live agents,
//! and the champion the agents fight. All mutation flows through [`apply`];
//! systems observe the resulting [`Event`] stream together with the
//! read-only views exposed by [`query`].

mod grid;

pub use grid::{GridError, GridField};

use std::time::Duration;

use grid_skirmish_core::{
    AgentId, AgentTuning, BehaviorState, ChampionTuning, Command, Event, Health, TuningError,
    WorldPoint, ARRIVAL_TOLERANCE, WELCOME_BANNER,
};
use thiserror::Error;

/// Reasons world construction fails before the first tick.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum WorldError {
    /// The agent tuning parameters failed validation.
    #[error("invalid agent tuning: {0}")]
    AgentTuning(#[source] TuningError),
    /// The champion tuning parameters failed validation.
    #[error("invalid champion tuning: {0}")]
    ChampionTuning(#[source] TuningError),
}

/// Represents the authoritative Grid Skirmish world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    tuning: AgentTuning,
    champion_tuning: ChampionTuning,
    grid: GridField,
    agents: Vec<Agent>,
    champion: Champion,
    next_agent: u32,
}

impl World {
    /// Creates a new world around a constructed grid.
    ///
    /// Tuning parameters are validated here so no later code path has to
    /// branch on degenerate configuration; a failed validation aborts
    /// startup.
    pub fn new(
        grid: GridField,
        tuning: AgentTuning,
        champion_tuning: ChampionTuning,
    ) -> Result<Self, WorldError> {
        tuning.validate().map_err(WorldError::AgentTuning)?;
        champion_tuning
            .validate()
            .map_err(WorldError::ChampionTuning)?;

        Ok(Self {
            banner: WELCOME_BANNER,
            tuning,
            grid,
            agents: Vec::new(),
            champion: Champion::new(champion_tuning.max_health),
            champion_tuning,
            next_agent: 0,
        })
    }

    fn agent_index(&self, agent: AgentId) -> Option<usize> {
        self.agents.iter().position(|entry| entry.id == agent)
    }
}

#[derive(Clone, Copy, Debug)]
struct Agent {
    id: AgentId,
    state: BehaviorState,
    health: Health,
    position: WorldPoint,
    course: Option<grid_skirmish_core::GridCoord>,
    is_moving: bool,
}

#[derive(Clone, Copy, Debug)]
struct Champion {
    position: WorldPoint,
    health: Health,
    defending: bool,
    defend_remaining: Duration,
    cooldown_remaining: Duration,
}

impl Champion {
    fn new(max_health: i32) -> Self {
        Self {
            position: WorldPoint::new(0.0, 0.0),
            health: Health::new(max_health),
            defending: false,
            defend_remaining: Duration::ZERO,
            cooldown_remaining: Duration::ZERO,
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
            advance_defend_windows(world, dt, out_events);
        }
        Command::SpawnAgent { cell } => {
            let agent = AgentId::new(world.next_agent);
            world.next_agent = world.next_agent.saturating_add(1);

            let position = world.grid.spawn_position(cell);
            world.agents.push(Agent {
                id: agent,
                state: BehaviorState::Patrol,
                health: Health::new(world.tuning.max_health),
                position,
                course: None,
                is_moving: false,
            });

            out_events.push(Event::AgentSpawned {
                agent,
                cell,
                position,
            });
        }
        Command::PlaceChampion { position } => {
            world.champion.position = position;
            out_events.push(Event::ChampionPlaced { position });
        }
        Command::TransitionAgent { agent, to } => {
            if let Some(index) = world.agent_index(agent) {
                let from = world.agents[index].state;
                if from != to {
                    world.agents[index].state = to;
                    out_events.push(Event::BehaviorChanged { agent, from, to });
                }
            }
        }
        Command::SetCourse { agent, node } => {
            let walkable = world
                .grid
                .view()
                .node_at(node)
                .map_or(false, |candidate| candidate.walkable());
            if !walkable {
                return;
            }

            if let Some(index) = world.agent_index(agent) {
                world.agents[index].course = Some(node);
                world.agents[index].is_moving = true;
                out_events.push(Event::CourseSet { agent, node });
            }
        }
        Command::ClearCourse { agent } => {
            if let Some(index) = world.agent_index(agent) {
                let entry = &mut world.agents[index];
                let had_course = entry.course.take().is_some() || entry.is_moving;
                entry.is_moving = false;
                if had_course {
                    out_events.push(Event::CourseCleared { agent });
                }
            }
        }
        Command::MoveAgent { agent, to } => {
            let Some(index) = world.agent_index(agent) else {
                return;
            };

            let from = world.agents[index].position;
            world.agents[index].position = to;
            out_events.push(Event::AgentMoved { agent, from, to });

            resolve_arrival(world, index, out_events);
        }
        Command::Strike { agent } => {
            if world.agent_index(agent).is_none() || world.champion.health.is_depleted() {
                return;
            }

            let amount = world.tuning.attack_power;
            if world.champion.defending {
                out_events.push(Event::StrikeAbsorbed { amount });
                return;
            }

            let max = world.champion_tuning.max_health;
            let remaining = Health::new((world.champion.health.get() - amount).clamp(0, max));
            world.champion.health = remaining;
            out_events.push(Event::ChampionStruck { amount, remaining });

            if remaining.is_depleted() {
                out_events.push(Event::ChampionDefeated);
            }
        }
        Command::ApplyDamage { agent, amount } => {
            if amount < 0 {
                log::warn!(
                    "rejecting negative damage {amount} aimed at agent {}",
                    agent.get()
                );
                out_events.push(Event::DamageRejected { agent, amount });
                return;
            }

            let Some(index) = world.agent_index(agent) else {
                return;
            };

            let max = world.tuning.max_health;
            let remaining = Health::new((world.agents[index].health.get() - amount).clamp(0, max));
            world.agents[index].health = remaining;
            out_events.push(Event::AgentDamaged {
                agent,
                amount,
                remaining,
            });

            if remaining.is_depleted() {
                let _ = world.agents.remove(index);
                out_events.push(Event::AgentDespawned { agent });
            } else if f64::from(remaining.get())
                <= f64::from(max) * f64::from(world.tuning.low_health_threshold)
            {
                let from = world.agents[index].state;
                if from != BehaviorState::Defensive {
                    world.agents[index].state = BehaviorState::Defensive;
                    out_events.push(Event::BehaviorChanged {
                        agent,
                        from,
                        to: BehaviorState::Defensive,
                    });
                }
            }
        }
        Command::BeginDefend => {
            let champion = &mut world.champion;
            if champion.defending
                || !champion.cooldown_remaining.is_zero()
                || champion.health.is_depleted()
            {
                return;
            }

            champion.defending = true;
            champion.defend_remaining = world.champion_tuning.defend_duration;
            out_events.push(Event::DefendStarted);
        }
    }
}

fn advance_defend_windows(world: &mut World, dt: Duration, out_events: &mut Vec<Event>) {
    let champion = &mut world.champion;

    if champion.defending {
        if champion.defend_remaining <= dt {
            champion.defending = false;
            champion.defend_remaining = Duration::ZERO;
            champion.cooldown_remaining = world.champion_tuning.defend_cooldown;
            out_events.push(Event::DefendEnded);

            if champion.cooldown_remaining.is_zero() {
                out_events.push(Event::DefendReady);
            }
        } else {
            champion.defend_remaining -= dt;
        }
    } else if !champion.cooldown_remaining.is_zero() {
        if champion.cooldown_remaining <= dt {
            champion.cooldown_remaining = Duration::ZERO;
            out_events.push(Event::DefendReady);
        } else {
            champion.cooldown_remaining -= dt;
        }
    }
}

/// Snaps an agent onto its course node once within arrival tolerance.
///
/// Only patrol and aggressive movement performs node stepping; defensive
/// flee displacement must never "arrive" at a stale course node, so the
/// check is gated on the agent's current state.
fn resolve_arrival(world: &mut World, index: usize, out_events: &mut Vec<Event>) {
    let entry = world.agents[index];
    if !matches!(
        entry.state,
        BehaviorState::Patrol | BehaviorState::Aggressive
    ) {
        return;
    }

    let Some(course) = entry.course else {
        return;
    };

    let Some(node) = world.grid.view().node_at(course) else {
        return;
    };

    if entry.position.distance_to(node.position()) <= ARRIVAL_TOLERANCE {
        let entry = &mut world.agents[index];
        entry.position = node.position();
        entry.course = None;
        entry.is_moving = false;
        out_events.push(Event::AgentArrived {
            agent: entry.id,
            node: course,
        });
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use grid_skirmish_core::{
        AgentId, AgentSnapshot, AgentTuning, AgentView, ChampionSnapshot, GridView, WorldPoint,
    };

    /// Retrieves the welcome banner the adapter may display.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the agent tuning parameters.
    #[must_use]
    pub fn tuning(world: &World) -> &AgentTuning {
        &world.tuning
    }

    /// Captures a read-only view over the node grid.
    #[must_use]
    pub fn grid(world: &World) -> GridView<'_> {
        world.grid.view()
    }

    /// Captures a read-only view of the live agents.
    #[must_use]
    pub fn agent_view(world: &World) -> AgentView {
        let snapshots: Vec<AgentSnapshot> = world
            .agents
            .iter()
            .map(|agent| AgentSnapshot {
                id: agent.id,
                state: agent.state,
                health: agent.health,
                position: agent.position,
                course: agent.course,
                is_moving: agent.is_moving,
            })
            .collect();
        AgentView::from_snapshots(snapshots)
    }

    /// Captures the champion's current state.
    #[must_use]
    pub fn champion(world: &World) -> ChampionSnapshot {
        ChampionSnapshot {
            position: world.champion.position,
            health: world.champion.health,
            defending: world.champion.defending,
            defend_ready: !world.champion.defending && world.champion.cooldown_remaining.is_zero(),
        }
    }

    /// Finds the agent closest to the provided position.
    ///
    /// Returns `None` when no agents exist; ties resolve to the lowest
    /// agent id because agents are stored in spawn order.
    #[must_use]
    pub fn nearest_agent(world: &World, position: WorldPoint) -> Option<AgentId> {
        let mut best: Option<(AgentId, f32)> = None;

        for agent in &world.agents {
            let distance = position.distance_to(agent.position);
            let closer = best.map_or(true, |(_, best_distance)| distance < best_distance);
            if closer {
                best = Some((agent.id, distance));
            }
        }

        best.map(|(agent, _)| agent)
    }
}
