#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic agent behavior system.
//!
//! Every tick the system re-evaluates each agent's behavior state against
//! the champion's position, then runs the per-state action for the state
//! the agent ends up in. State changes, courses, steps, and strikes are all
//! proposed as commands; the world remains the single writer.

use std::time::Duration;

use grid_skirmish_core::{
    AgentId, AgentSnapshot, AgentTuning, AgentView, BehaviorState, ChampionSnapshot, Command,
    Event, GridView, Node, WorldPoint, ARRIVAL_TOLERANCE,
};

const RNG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const RNG_INCREMENT: u64 = 1;

/// Configuration parameters required to construct the behavior system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided random seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Pure system that drives agent state transitions and per-state actions.
#[derive(Debug)]
pub struct Behavior {
    rng_state: u64,
    ledgers: Vec<AgentLedger>,
}

/// Per-agent scratch state the system carries between ticks.
///
/// The ledger holds what the world deliberately does not: waypoint pause
/// countdowns, strike cadence, whether the attack loop has been entered,
/// and which state originally requested the agent's current course.
#[derive(Clone, Copy, Debug)]
struct AgentLedger {
    agent: AgentId,
    wait_remaining: Duration,
    attack_ready_in: Duration,
    attack_loop_active: bool,
    course_origin: Option<BehaviorState>,
}

impl AgentLedger {
    const fn new(agent: AgentId) -> Self {
        Self {
            agent,
            wait_remaining: Duration::ZERO,
            attack_ready_in: Duration::ZERO,
            attack_loop_active: false,
            course_origin: None,
        }
    }
}

impl Behavior {
    /// Creates a new behavior system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng_state: config.rng_seed,
            ledgers: Vec::new(),
        }
    }

    /// Consumes events and immutable views to emit behavior commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        agents: &AgentView,
        champion: ChampionSnapshot,
        grid: GridView<'_>,
        tuning: &AgentTuning,
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

        self.reconcile_ledgers(agents);

        for index in 0..self.ledgers.len() {
            let mut ledger = self.ledgers[index];
            let Some(snapshot) = agents.get(ledger.agent).copied() else {
                continue;
            };

            let state = resolve_transitions(&snapshot, champion.position, tuning, out, &mut ledger);

            match state {
                BehaviorState::Patrol => {
                    self.patrol_step(&mut ledger, &snapshot, grid, tuning, dt, out);
                }
                BehaviorState::Aggressive => {
                    aggressive_step(&mut ledger, &snapshot, &champion, grid, tuning, dt, out);
                }
                BehaviorState::Battle => {
                    battle_step(&mut ledger, &snapshot, &champion, tuning, dt, out);
                }
                BehaviorState::Defensive => {
                    defensive_step(&snapshot, &champion, tuning, dt, out);
                }
            }

            self.ledgers[index] = ledger;
        }
    }

    /// Aligns the ledger list with the live agents, in id order.
    ///
    /// Despawned agents drop their scratch state; new agents start with a
    /// fresh ledger.
    fn reconcile_ledgers(&mut self, agents: &AgentView) {
        let mut refreshed = Vec::with_capacity(self.ledgers.len());
        for snapshot in agents.iter() {
            let ledger = self
                .ledgers
                .iter()
                .find(|entry| entry.agent == snapshot.id)
                .copied()
                .unwrap_or_else(|| AgentLedger::new(snapshot.id));
            refreshed.push(ledger);
        }
        self.ledgers = refreshed;
    }

    fn patrol_step(
        &mut self,
        ledger: &mut AgentLedger,
        snapshot: &AgentSnapshot,
        grid: GridView<'_>,
        tuning: &AgentTuning,
        dt: Duration,
        out: &mut Vec<Command>,
    ) {
        let step = tuning.move_speed * dt.as_secs_f32();

        if snapshot.is_moving {
            if let Some(node) = snapshot.course.and_then(|coord| grid.node_at(coord)) {
                if step_towards(ledger.agent, snapshot.position, &node, step, out) {
                    ledger.wait_remaining = tuning.wait_at_waypoint;
                    ledger.course_origin = None;
                }
            }
            return;
        }

        if !ledger.wait_remaining.is_zero() {
            ledger.wait_remaining = ledger.wait_remaining.saturating_sub(dt);
            return;
        }

        let current = grid.locate(snapshot.position);
        let neighbors = grid.neighbors(current);
        let count = neighbors.len();
        if count == 0 {
            return;
        }

        let pick = (self.advance_rng() % count as u64) as usize;
        let Some(node) = neighbors.clone().nth(pick) else {
            return;
        };

        out.push(Command::SetCourse {
            agent: ledger.agent,
            node: node.coord(),
        });
        ledger.course_origin = Some(BehaviorState::Patrol);

        if step_towards(ledger.agent, snapshot.position, &node, step, out) {
            ledger.wait_remaining = tuning.wait_at_waypoint;
            ledger.course_origin = None;
        }
    }

    fn advance_rng(&mut self) -> u64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(RNG_MULTIPLIER)
            .wrapping_add(RNG_INCREMENT);
        self.rng_state
    }
}

/// Re-evaluates the transition rules and reports the state the agent acts in.
///
/// Rules run in a fixed order before any action: detection pulls non-battle
/// agents aggressive, losing detection returns them to patrol, and battle
/// range forces battle regardless of the prior state. A `TransitionAgent`
/// command is emitted only when the resolved state differs from the
/// snapshot's.
fn resolve_transitions(
    snapshot: &AgentSnapshot,
    champion_position: WorldPoint,
    tuning: &AgentTuning,
    out: &mut Vec<Command>,
    ledger: &mut AgentLedger,
) -> BehaviorState {
    let distance = snapshot.position.distance_to(champion_position);
    let mut state = snapshot.state;

    if distance <= tuning.detection_range
        && !matches!(state, BehaviorState::Aggressive | BehaviorState::Battle)
    {
        state = BehaviorState::Aggressive;
    } else if distance > tuning.detection_range && state != BehaviorState::Patrol {
        state = BehaviorState::Patrol;
    }

    if distance <= tuning.battle_range {
        state = BehaviorState::Battle;
    }

    if state != snapshot.state {
        out.push(Command::TransitionAgent {
            agent: snapshot.id,
            to: state,
        });
    }

    // Entering battle or defensive aborts a patrol course mid-step; a course
    // requested while aggressive keeps running to its node.
    if matches!(state, BehaviorState::Battle | BehaviorState::Defensive)
        && ledger.course_origin == Some(BehaviorState::Patrol)
        && snapshot.is_moving
    {
        out.push(Command::ClearCourse {
            agent: snapshot.id,
        });
        ledger.course_origin = None;
    }

    if state != BehaviorState::Patrol {
        ledger.wait_remaining = Duration::ZERO;
    }

    if state != BehaviorState::Battle {
        ledger.attack_loop_active = false;
    }

    state
}

fn aggressive_step(
    ledger: &mut AgentLedger,
    snapshot: &AgentSnapshot,
    champion: &ChampionSnapshot,
    grid: GridView<'_>,
    tuning: &AgentTuning,
    dt: Duration,
    out: &mut Vec<Command>,
) {
    let step = tuning.move_speed * dt.as_secs_f32();

    if snapshot.is_moving {
        if let Some(node) = snapshot.course.and_then(|coord| grid.node_at(coord)) {
            if step_towards(ledger.agent, snapshot.position, &node, step, out) {
                ledger.course_origin = None;
            }
        }
        return;
    }

    let current = grid.locate(snapshot.position);
    let target = grid.locate(champion.position);

    let mut best: Option<(Node, f32)> = None;
    for candidate in grid.neighbors(current) {
        // The target's own cell is excluded so the agent closes to an
        // adjacent cell instead of stacking onto the champion.
        if candidate.coord() == target.coord() {
            continue;
        }

        let distance = candidate.position().distance_to(target.position());
        let closer = best.map_or(true, |(_, best_distance)| distance < best_distance);
        if closer {
            best = Some((candidate, distance));
        }
    }

    let Some((node, _)) = best else {
        return;
    };

    out.push(Command::SetCourse {
        agent: ledger.agent,
        node: node.coord(),
    });
    ledger.course_origin = Some(BehaviorState::Aggressive);

    if step_towards(ledger.agent, snapshot.position, &node, step, out) {
        ledger.course_origin = None;
    }
}

/// Runs the recurring attack loop while the agent stays in battle.
///
/// The first strike after entering battle is immediate; subsequent strikes
/// wait out the attack interval. Depleted health on either side or falling
/// out of battle range leaves the loop, and re-entry starts it fresh.
fn battle_step(
    ledger: &mut AgentLedger,
    snapshot: &AgentSnapshot,
    champion: &ChampionSnapshot,
    tuning: &AgentTuning,
    dt: Duration,
    out: &mut Vec<Command>,
) {
    if !ledger.attack_loop_active {
        ledger.attack_loop_active = true;
        ledger.attack_ready_in = Duration::ZERO;
    }

    if snapshot.health.is_depleted() || champion.health.is_depleted() {
        ledger.attack_loop_active = false;
        return;
    }

    if snapshot.position.distance_to(champion.position) > tuning.battle_range {
        ledger.attack_loop_active = false;
        return;
    }

    if ledger.attack_ready_in.is_zero() {
        out.push(Command::Strike {
            agent: ledger.agent,
        });
        ledger.attack_ready_in = tuning.attack_interval;
    } else {
        ledger.attack_ready_in = ledger.attack_ready_in.saturating_sub(dt);
    }
}

fn defensive_step(
    snapshot: &AgentSnapshot,
    champion: &ChampionSnapshot,
    tuning: &AgentTuning,
    dt: Duration,
    out: &mut Vec<Command>,
) {
    if snapshot.position.distance_to(champion.position) >= tuning.flee_range {
        return;
    }

    let Some(direction) = snapshot.position.away_from(champion.position) else {
        return;
    };

    let step = tuning.move_speed * dt.as_secs_f32();
    out.push(Command::MoveAgent {
        agent: snapshot.id,
        to: snapshot
            .position
            .translate(direction.x() * step, direction.y() * step),
    });
}

/// Proposes one bounded step toward a course node.
///
/// Returns whether the step lands within arrival tolerance, which is the
/// system's cue to start a waypoint pause or drop its course bookkeeping;
/// the world performs the authoritative snap.
fn step_towards(
    agent: AgentId,
    position: WorldPoint,
    node: &Node,
    step: f32,
    out: &mut Vec<Command>,
) -> bool {
    let next = position.move_towards(node.position(), step);
    out.push(Command::MoveAgent { agent, to: next });
    next.distance_to(node.position()) <= ARRIVAL_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_skirmish_core::{GridCoord, Health};

    fn snapshot(id: u32, state: BehaviorState, position: WorldPoint) -> AgentSnapshot {
        AgentSnapshot {
            id: AgentId::new(id),
            state,
            health: Health::new(50),
            position,
            course: None,
            is_moving: false,
        }
    }

    #[test]
    fn detection_pulls_patrol_agents_aggressive_before_battle_range() {
        let snapshot = snapshot(0, BehaviorState::Patrol, WorldPoint::new(0.0, 0.0));
        let mut ledger = AgentLedger::new(snapshot.id);
        let mut out = Vec::new();

        let state = resolve_transitions(
            &snapshot,
            WorldPoint::new(4.0, 0.0),
            &AgentTuning::default(),
            &mut out,
            &mut ledger,
        );

        assert_eq!(state, BehaviorState::Aggressive);
        assert_eq!(
            out,
            vec![Command::TransitionAgent {
                agent: snapshot.id,
                to: BehaviorState::Aggressive,
            }],
        );
    }

    #[test]
    fn battle_range_forces_battle_from_any_state() {
        for prior in [
            BehaviorState::Patrol,
            BehaviorState::Aggressive,
            BehaviorState::Defensive,
        ] {
            let snapshot = snapshot(0, prior, WorldPoint::new(0.0, 0.0));
            let mut ledger = AgentLedger::new(snapshot.id);
            let mut out = Vec::new();

            let state = resolve_transitions(
                &snapshot,
                WorldPoint::new(1.0, 0.0),
                &AgentTuning::default(),
                &mut out,
                &mut ledger,
            );

            assert_eq!(state, BehaviorState::Battle, "prior state {prior:?}");
        }
    }

    #[test]
    fn losing_detection_returns_agents_to_patrol() {
        let snapshot = snapshot(0, BehaviorState::Aggressive, WorldPoint::new(0.0, 0.0));
        let mut ledger = AgentLedger::new(snapshot.id);
        let mut out = Vec::new();

        let state = resolve_transitions(
            &snapshot,
            WorldPoint::new(9.0, 0.0),
            &AgentTuning::default(),
            &mut out,
            &mut ledger,
        );

        assert_eq!(state, BehaviorState::Patrol);
    }

    #[test]
    fn battle_aborts_a_patrol_course_but_not_an_aggressive_one() {
        let mut moving = snapshot(0, BehaviorState::Aggressive, WorldPoint::new(0.0, 0.0));
        moving.course = Some(GridCoord::new(1, 0));
        moving.is_moving = true;

        let mut ledger = AgentLedger::new(moving.id);
        ledger.course_origin = Some(BehaviorState::Patrol);
        let mut out = Vec::new();
        let _ = resolve_transitions(
            &moving,
            WorldPoint::new(1.0, 0.0),
            &AgentTuning::default(),
            &mut out,
            &mut ledger,
        );
        assert!(out.contains(&Command::ClearCourse { agent: moving.id }));
        assert_eq!(ledger.course_origin, None);

        let mut ledger = AgentLedger::new(moving.id);
        ledger.course_origin = Some(BehaviorState::Aggressive);
        let mut out = Vec::new();
        let _ = resolve_transitions(
            &moving,
            WorldPoint::new(1.0, 0.0),
            &AgentTuning::default(),
            &mut out,
            &mut ledger,
        );
        assert!(!out.contains(&Command::ClearCourse { agent: moving.id }));
        assert_eq!(ledger.course_origin, Some(BehaviorState::Aggressive));
    }

    #[test]
    fn battle_strikes_immediately_then_waits_out_the_interval() {
        let agent = snapshot(0, BehaviorState::Battle, WorldPoint::new(0.0, 0.0));
        let mut ledger = AgentLedger::new(agent.id);
        let champion = ChampionSnapshot {
            position: WorldPoint::new(1.0, 0.0),
            health: Health::new(100),
            defending: false,
            defend_ready: true,
        };
        let tuning = AgentTuning::default();
        let dt = Duration::from_millis(500);

        let mut out = Vec::new();
        battle_step(&mut ledger, &agent, &champion, &tuning, dt, &mut out);
        assert_eq!(out, vec![Command::Strike { agent: agent.id }]);

        // Interval is 1500ms; two half-second ticks only count it down.
        out.clear();
        battle_step(&mut ledger, &agent, &champion, &tuning, dt, &mut out);
        battle_step(&mut ledger, &agent, &champion, &tuning, dt, &mut out);
        assert!(out.is_empty());

        battle_step(&mut ledger, &agent, &champion, &tuning, dt, &mut out);
        assert!(out.is_empty(), "third tick drains the interval");
        battle_step(&mut ledger, &agent, &champion, &tuning, dt, &mut out);
        assert_eq!(out, vec![Command::Strike { agent: agent.id }]);
    }

    #[test]
    fn leaving_battle_range_stops_the_attack_loop() {
        let agent = snapshot(0, BehaviorState::Battle, WorldPoint::new(0.0, 0.0));
        let mut ledger = AgentLedger::new(agent.id);
        let champion = ChampionSnapshot {
            position: WorldPoint::new(4.0, 0.0),
            health: Health::new(100),
            defending: false,
            defend_ready: true,
        };

        let mut out = Vec::new();
        battle_step(
            &mut ledger,
            &agent,
            &champion,
            &AgentTuning::default(),
            Duration::from_millis(100),
            &mut out,
        );

        assert!(out.is_empty());
        assert!(!ledger.attack_loop_active);
    }

    #[test]
    fn defensive_agents_flee_directly_away_from_a_close_champion() {
        let agent = snapshot(0, BehaviorState::Defensive, WorldPoint::new(1.0, 0.0));
        let champion = ChampionSnapshot {
            position: WorldPoint::new(0.0, 0.0),
            health: Health::new(100),
            defending: false,
            defend_ready: true,
        };
        let tuning = AgentTuning::default();

        let mut out = Vec::new();
        defensive_step(&agent, &champion, &tuning, Duration::from_secs(1), &mut out);

        assert_eq!(
            out,
            vec![Command::MoveAgent {
                agent: agent.id,
                to: WorldPoint::new(3.0, 0.0),
            }],
        );
    }

    #[test]
    fn defensive_agents_hold_position_outside_flee_range() {
        let agent = snapshot(0, BehaviorState::Defensive, WorldPoint::new(4.0, 0.0));
        let champion = ChampionSnapshot {
            position: WorldPoint::new(0.0, 0.0),
            health: Health::new(100),
            defending: false,
            defend_ready: true,
        };

        let mut out = Vec::new();
        defensive_step(
            &agent,
            &champion,
            &AgentTuning::default(),
            Duration::from_secs(1),
            &mut out,
        );

        assert!(out.is_empty());
    }

    #[test]
    fn despawned_agents_drop_their_ledgers() {
        let mut behavior = Behavior::new(Config::new(7));
        behavior.ledgers.push(AgentLedger::new(AgentId::new(0)));
        behavior.ledgers.push(AgentLedger::new(AgentId::new(1)));

        let survivors = AgentView::from_snapshots(vec![snapshot(
            1,
            BehaviorState::Patrol,
            WorldPoint::new(0.0, 0.0),
        )]);
        behavior.reconcile_ledgers(&survivors);

        assert_eq!(behavior.ledgers.len(), 1);
        assert_eq!(behavior.ledgers[0].agent, AgentId::new(1));
    }
}
