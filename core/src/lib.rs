#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Grid Skirmish engine.
//!
//! This crate defines the message surface that connects the adapter, the
//! authoritative world, and pure systems. The adapter and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable snapshots, and respond exclusively with new command
//! batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the simulation boots.
pub const WELCOME_BANNER: &str = "Welcome to Grid Skirmish.";

/// Distance below which an agent is considered to have reached a node.
pub const ARRIVAL_TOLERANCE: f32 = 0.1;

/// Cardinal neighbor offsets in contract order: up, right, down, left.
///
/// Downstream tie-breaking depends on this ordering, so it is part of the
/// grid's public contract rather than an implementation detail.
pub const CARDINAL_OFFSETS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// Unique identifier assigned to an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Behavior state driving an agent's per-tick action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BehaviorState {
    /// Wandering between random walkable neighbors with waypoint pauses.
    Patrol,
    /// Closing in on the detected target one neighbor at a time.
    Aggressive,
    /// Holding position and running the recurring attack loop.
    Battle,
    /// Retreating directly away from the target while it is close.
    Defensive,
}

/// Location of a single grid cell expressed as signed axis indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    x: i32,
    y: i32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the coordinate displaced by the provided axis deltas.
    #[must_use]
    pub const fn offset_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Continuous world-space position measured in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldPoint {
    x: f32,
    y: f32,
}

impl WorldPoint {
    /// Creates a new world-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal component of the point.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical component of the point.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance_to(&self, other: WorldPoint) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Steps toward `target` by at most `max_delta` world units.
    ///
    /// Reaching within `max_delta` of the target snaps onto it exactly, so
    /// repeated bounded steps terminate at the target rather than oscillating
    /// around it.
    #[must_use]
    pub fn move_towards(&self, target: WorldPoint, max_delta: f32) -> Self {
        let dx = target.x - self.x;
        let dy = target.y - self.y;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance <= max_delta || distance == 0.0 {
            return target;
        }

        Self {
            x: self.x + dx / distance * max_delta,
            y: self.y + dy / distance * max_delta,
        }
    }

    /// Unit vector pointing from `threat` toward this point.
    ///
    /// Returns `None` when the two points coincide and no direction exists.
    #[must_use]
    pub fn away_from(&self, threat: WorldPoint) -> Option<WorldPoint> {
        let dx = self.x - threat.x;
        let dy = self.y - threat.y;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance == 0.0 {
            return None;
        }

        Some(Self {
            x: dx / distance,
            y: dy / distance,
        })
    }

    /// Returns the point displaced by the provided deltas.
    #[must_use]
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Clamped hit-point count carried by agents and the champion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Health(i32);

impl Health {
    /// Creates a new health value, flooring negative inputs at zero.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(if value < 0 { 0 } else { value })
    }

    /// Retrieves the numeric hit-point count.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }

    /// Reports whether the hit-point count reached zero.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.0 == 0
    }
}

/// Single addressable grid cell with walkability and world-space center.
///
/// Nodes are immutable after construction; everything outside the grid holds
/// copies and identifies a node by its grid coordinate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    walkable: bool,
    position: WorldPoint,
    coord: GridCoord,
}

impl Node {
    /// Creates a new node with the provided walkability and placement.
    #[must_use]
    pub const fn new(walkable: bool, position: WorldPoint, coord: GridCoord) -> Self {
        Self {
            walkable,
            position,
            coord,
        }
    }

    /// Reports whether agents may traverse this cell.
    #[must_use]
    pub const fn walkable(&self) -> bool {
        self.walkable
    }

    /// World-space center of the cell.
    #[must_use]
    pub const fn position(&self) -> WorldPoint {
        self.position
    }

    /// Grid coordinate identifying the cell.
    #[must_use]
    pub const fn coord(&self) -> GridCoord {
        self.coord
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Spawns a new agent at the provided grid coordinate.
    SpawnAgent {
        /// Cell the agent materialises on, under the one-unit-per-cell
        /// spawn convention.
        cell: GridCoord,
    },
    /// Moves the champion to an absolute world-space position.
    PlaceChampion {
        /// Position the champion should occupy.
        position: WorldPoint,
    },
    /// Switches an agent's behavior state.
    TransitionAgent {
        /// Identifier of the agent changing state.
        agent: AgentId,
        /// State the agent should enter.
        to: BehaviorState,
    },
    /// Assigns the node an agent is incrementally moving toward.
    SetCourse {
        /// Identifier of the agent receiving the course.
        agent: AgentId,
        /// Destination node identified by its grid coordinate.
        node: GridCoord,
    },
    /// Aborts an agent's in-progress movement.
    ClearCourse {
        /// Identifier of the agent whose course is dropped.
        agent: AgentId,
    },
    /// Applies one bounded movement step, placing the agent at `to`.
    MoveAgent {
        /// Identifier of the agent being displaced.
        agent: AgentId,
        /// Position the agent occupies after the step.
        to: WorldPoint,
    },
    /// Delivers one attack from the agent to the champion.
    Strike {
        /// Identifier of the striking agent.
        agent: AgentId,
    },
    /// Delivers external damage to an agent.
    ApplyDamage {
        /// Identifier of the agent receiving damage.
        agent: AgentId,
        /// Hit points to subtract; negative amounts are rejected.
        amount: i32,
    },
    /// Opens a champion defend window if one is available.
    BeginDefend,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an agent was created.
    AgentSpawned {
        /// Identifier assigned to the new agent.
        agent: AgentId,
        /// Cell the agent spawned on.
        cell: GridCoord,
        /// World-space position derived from the spawn cell.
        position: WorldPoint,
    },
    /// Confirms that the champion was placed.
    ChampionPlaced {
        /// Position the champion now occupies.
        position: WorldPoint,
    },
    /// Announces that an agent entered a new behavior state.
    BehaviorChanged {
        /// Identifier of the agent that changed state.
        agent: AgentId,
        /// State the agent left.
        from: BehaviorState,
        /// State the agent entered.
        to: BehaviorState,
    },
    /// Confirms that an agent received a movement course.
    CourseSet {
        /// Identifier of the agent.
        agent: AgentId,
        /// Destination node of the course.
        node: GridCoord,
    },
    /// Confirms that an agent's movement was aborted.
    CourseCleared {
        /// Identifier of the agent.
        agent: AgentId,
    },
    /// Confirms that an agent moved between two positions.
    AgentMoved {
        /// Identifier of the agent that moved.
        agent: AgentId,
        /// Position the agent occupied before the step.
        from: WorldPoint,
        /// Position the agent occupies after the step.
        to: WorldPoint,
    },
    /// Announces that an agent reached its course node.
    AgentArrived {
        /// Identifier of the agent that arrived.
        agent: AgentId,
        /// Node the agent arrived at.
        node: GridCoord,
    },
    /// Confirms that an agent absorbed damage and survived or not.
    AgentDamaged {
        /// Identifier of the damaged agent.
        agent: AgentId,
        /// Hit points subtracted after clamping.
        amount: i32,
        /// Hit points remaining after the subtraction.
        remaining: Health,
    },
    /// Reports that a damage request carried a negative amount.
    DamageRejected {
        /// Identifier of the agent named by the request.
        agent: AgentId,
        /// Offending amount.
        amount: i32,
    },
    /// Announces that an agent was removed from the simulation.
    AgentDespawned {
        /// Identifier of the removed agent.
        agent: AgentId,
    },
    /// Confirms that a strike reduced the champion's health.
    ChampionStruck {
        /// Hit points subtracted.
        amount: i32,
        /// Champion hit points remaining.
        remaining: Health,
    },
    /// Reports that a defend window absorbed a strike.
    StrikeAbsorbed {
        /// Hit points the strike would have dealt.
        amount: i32,
    },
    /// Announces that the champion's health reached zero.
    ChampionDefeated,
    /// Confirms that a defend window opened.
    DefendStarted,
    /// Announces that the defend window closed and its cooldown began.
    DefendEnded,
    /// Announces that the defend cooldown elapsed.
    DefendReady,
}

/// Reasons a tuning parameter set fails construction-time validation.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum TuningError {
    /// A speed or range parameter was zero or negative.
    #[error("{name} must be positive, got {value}")]
    NonPositive {
        /// Name of the offending parameter.
        name: &'static str,
        /// Value supplied by the caller.
        value: f32,
    },
    /// A hit-point or damage parameter was zero or negative.
    #[error("{name} must be positive, got {value}")]
    NonPositiveCount {
        /// Name of the offending parameter.
        name: &'static str,
        /// Value supplied by the caller.
        value: i32,
    },
    /// The attack interval was zero.
    #[error("attack_interval must be non-zero")]
    ZeroAttackInterval,
    /// The low-health threshold fell outside `(0, 1]`.
    #[error("low_health_threshold must lie in (0, 1], got {value}")]
    ThresholdOutOfRange {
        /// Value supplied by the caller.
        value: f32,
    },
}

/// Static parameters governing one agent archetype.
///
/// Every field is fixed for the lifetime of the world; [`AgentTuning::validate`]
/// rejects degenerate values at construction so the simulation never has to
/// branch on them afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentTuning {
    /// Movement speed in world units per second.
    pub move_speed: f32,
    /// Pause inserted after arriving at a patrol waypoint.
    pub wait_at_waypoint: Duration,
    /// Distance at which the agent notices the champion.
    pub detection_range: f32,
    /// Distance at which the agent stops moving and fights.
    pub battle_range: f32,
    /// Distance the agent tries to keep from the champion while defensive.
    pub flee_range: f32,
    /// Hit points an agent spawns with.
    pub max_health: i32,
    /// Hit points subtracted per strike.
    pub attack_power: i32,
    /// Pause between successive strikes.
    pub attack_interval: Duration,
    /// Fraction of maximum health at or below which the agent turns defensive.
    pub low_health_threshold: f32,
}

impl AgentTuning {
    /// Checks every parameter, reporting the first degenerate one.
    pub fn validate(&self) -> Result<(), TuningError> {
        for (name, value) in [
            ("move_speed", self.move_speed),
            ("detection_range", self.detection_range),
            ("battle_range", self.battle_range),
            ("flee_range", self.flee_range),
        ] {
            if value <= 0.0 {
                return Err(TuningError::NonPositive { name, value });
            }
        }

        for (name, value) in [
            ("max_health", self.max_health),
            ("attack_power", self.attack_power),
        ] {
            if value <= 0 {
                return Err(TuningError::NonPositiveCount { name, value });
            }
        }

        if self.attack_interval.is_zero() {
            return Err(TuningError::ZeroAttackInterval);
        }

        if self.low_health_threshold <= 0.0 || self.low_health_threshold > 1.0 {
            return Err(TuningError::ThresholdOutOfRange {
                value: self.low_health_threshold,
            });
        }

        Ok(())
    }
}

impl Default for AgentTuning {
    fn default() -> Self {
        Self {
            move_speed: 2.0,
            wait_at_waypoint: Duration::from_secs(1),
            detection_range: 5.0,
            battle_range: 1.5,
            flee_range: 3.0,
            max_health: 50,
            attack_power: 1,
            attack_interval: Duration::from_millis(1500),
            low_health_threshold: 0.3,
        }
    }
}

/// Static parameters governing the champion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChampionTuning {
    /// Hit points the champion starts with.
    pub max_health: i32,
    /// Length of the invulnerability window opened by a defend.
    pub defend_duration: Duration,
    /// Recovery period before the next defend window may open.
    pub defend_cooldown: Duration,
}

impl ChampionTuning {
    /// Checks every parameter, reporting the first degenerate one.
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.max_health <= 0 {
            return Err(TuningError::NonPositiveCount {
                name: "max_health",
                value: self.max_health,
            });
        }

        Ok(())
    }
}

impl Default for ChampionTuning {
    fn default() -> Self {
        Self {
            max_health: 100,
            defend_duration: Duration::from_secs(2),
            defend_cooldown: Duration::from_secs(5),
        }
    }
}

/// Immutable representation of a single agent's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentSnapshot {
    /// Unique identifier assigned to the agent.
    pub id: AgentId,
    /// Behavior state the agent currently occupies.
    pub state: BehaviorState,
    /// Remaining hit points.
    pub health: Health,
    /// World-space position of the agent.
    pub position: WorldPoint,
    /// Node the agent is moving toward, if any.
    pub course: Option<GridCoord>,
    /// Indicates whether a movement course is in progress.
    pub is_moving: bool,
}

/// Read-only snapshot describing all agents in the simulation.
#[derive(Clone, Debug, Default)]
pub struct AgentView {
    snapshots: Vec<AgentSnapshot>,
}

impl AgentView {
    /// Creates a new agent view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<AgentSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic id order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot captured for the provided agent, if any.
    #[must_use]
    pub fn get(&self, agent: AgentId) -> Option<&AgentSnapshot> {
        self.snapshots
            .binary_search_by_key(&agent, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<AgentSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of the champion's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChampionSnapshot {
    /// World-space position of the champion.
    pub position: WorldPoint,
    /// Remaining hit points.
    pub health: Health,
    /// Indicates whether a defend window is currently open.
    pub defending: bool,
    /// Indicates whether a new defend window may open this tick.
    pub defend_ready: bool,
}

/// Read-only view into the dense node grid.
///
/// The view carries the grid's world-space geometry so it can answer
/// coordinate conversion without reaching back into the authoritative world.
#[derive(Clone, Copy, Debug)]
pub struct GridView<'a> {
    nodes: &'a [Node],
    size_x: i32,
    size_y: i32,
    world_width: f32,
    world_height: f32,
}

impl<'a> GridView<'a> {
    /// Captures a new grid view backed by the provided row-major node slice.
    ///
    /// Callers guarantee `nodes.len() == size_x * size_y` with both
    /// dimensions positive; the authoritative grid enforces this at
    /// construction time.
    #[must_use]
    pub fn new(
        nodes: &'a [Node],
        size_x: i32,
        size_y: i32,
        world_width: f32,
        world_height: f32,
    ) -> Self {
        debug_assert!(size_x > 0 && size_y > 0, "grid views require real grids");
        debug_assert_eq!(nodes.len(), (size_x as usize) * (size_y as usize));
        Self {
            nodes,
            size_x,
            size_y,
            world_width,
            world_height,
        }
    }

    /// Provides the grid dimensions in cells.
    #[must_use]
    pub const fn dimensions(&self) -> (i32, i32) {
        (self.size_x, self.size_y)
    }

    /// Returns the node at the provided coordinate, if it lies in bounds.
    #[must_use]
    pub fn node_at(&self, coord: GridCoord) -> Option<Node> {
        if coord.x() < 0 || coord.x() >= self.size_x || coord.y() < 0 || coord.y() >= self.size_y {
            return None;
        }

        let index = coord.y() as usize * self.size_x as usize + coord.x() as usize;
        self.nodes.get(index).copied()
    }

    /// Maps a world-space position onto the node covering it.
    ///
    /// The position is normalised into `[0, 1]` relative to the grid's
    /// bounding box and rounded to the nearest coordinate; out-of-bounds
    /// queries clamp to the nearest edge cell instead of failing.
    #[must_use]
    pub fn locate(&self, position: WorldPoint) -> Node {
        let percent_x =
            ((position.x() + self.world_width / 2.0) / self.world_width).clamp(0.0, 1.0);
        let percent_y =
            ((position.y() + self.world_height / 2.0) / self.world_height).clamp(0.0, 1.0);

        let x = ((self.size_x - 1) as f32 * percent_x).round() as i32;
        let y = ((self.size_y - 1) as f32 * percent_y).round() as i32;

        let index = y as usize * self.size_x as usize + x as usize;
        self.nodes[index]
    }

    /// Walkable cardinal neighbors of the provided node.
    ///
    /// Candidates are visited in [`CARDINAL_OFFSETS`] order (up, right,
    /// down, left); out-of-bounds and non-walkable cells are skipped, so the
    /// iterator yields at most four nodes.
    #[must_use]
    pub fn neighbors(&self, node: Node) -> Neighbors {
        let mut neighbors = Neighbors::default();

        for (dx, dy) in CARDINAL_OFFSETS {
            let Some(candidate) = self.node_at(node.coord().offset_by(dx, dy)) else {
                continue;
            };

            if candidate.walkable() {
                neighbors.push(candidate);
            }
        }

        neighbors
    }

    /// Number of walkable cells in the grid.
    #[must_use]
    pub fn walkable_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.walkable()).count()
    }

    /// Uniformly selects a walkable cell using the caller's random draw.
    ///
    /// Returns `None` when the grid has no walkable cells; absence is a
    /// branchable outcome, not an error.
    #[must_use]
    pub fn select_walkable(&self, draw: u64) -> Option<Node> {
        let count = self.walkable_count();
        if count == 0 {
            return None;
        }

        let index = (draw % count as u64) as usize;
        self.nodes
            .iter()
            .filter(|node| node.walkable())
            .nth(index)
            .copied()
    }

    /// Iterator over every node in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Node> + 'a {
        self.nodes.iter().copied()
    }
}

/// Fixed-capacity iterator over a node's walkable cardinal neighbors.
#[derive(Clone, Debug, Default)]
pub struct Neighbors {
    buffer: [Option<Node>; 4],
    len: usize,
    cursor: usize,
}

impl Neighbors {
    fn push(&mut self, node: Node) {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = Some(node);
            self.len += 1;
        }
    }

    /// Number of neighbors the iterator will yield in total.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Reports whether the node had no walkable neighbors.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Iterator for Neighbors {
    type Item = Node;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }

        let value = self.buffer[self.cursor];
        self.cursor += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_nodes(size_x: i32, size_y: i32, blocked: &[GridCoord]) -> Vec<Node> {
        let mut nodes = Vec::with_capacity((size_x * size_y) as usize);
        for y in 0..size_y {
            for x in 0..size_x {
                let coord = GridCoord::new(x, y);
                let walkable = !blocked.contains(&coord);
                nodes.push(Node::new(
                    walkable,
                    WorldPoint::new(x as f32, y as f32),
                    coord,
                ));
            }
        }
        nodes
    }

    #[test]
    fn move_towards_takes_bounded_steps() {
        let origin = WorldPoint::new(0.0, 0.0);
        let target = WorldPoint::new(3.0, 4.0);

        let stepped = origin.move_towards(target, 1.0);
        assert!((stepped.x() - 0.6).abs() < 1e-6);
        assert!((stepped.y() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn move_towards_snaps_onto_close_targets() {
        let origin = WorldPoint::new(0.0, 0.0);
        let target = WorldPoint::new(0.05, 0.0);

        assert_eq!(origin.move_towards(target, 1.0), target);
        assert_eq!(target.move_towards(target, 1.0), target);
    }

    #[test]
    fn away_from_normalises_the_offset() {
        let position = WorldPoint::new(3.0, 4.0);
        let threat = WorldPoint::new(0.0, 0.0);

        let direction = position.away_from(threat).expect("distinct points");
        assert!((direction.x() - 0.6).abs() < 1e-6);
        assert!((direction.y() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn away_from_coincident_points_is_absent() {
        let position = WorldPoint::new(1.0, 1.0);
        assert!(position.away_from(position).is_none());
    }

    #[test]
    fn health_floors_negative_values() {
        assert_eq!(Health::new(-5).get(), 0);
        assert!(Health::new(0).is_depleted());
        assert!(!Health::new(1).is_depleted());
    }

    #[test]
    fn locate_clamps_out_of_bounds_queries() {
        let nodes = grid_nodes(4, 3, &[]);
        let view = GridView::new(&nodes, 4, 3, 4.0, 3.0);

        let far = view.locate(WorldPoint::new(100.0, 100.0));
        assert_eq!(far.coord(), GridCoord::new(3, 2));

        let near = view.locate(WorldPoint::new(-100.0, -100.0));
        assert_eq!(near.coord(), GridCoord::new(0, 0));
    }

    #[test]
    fn neighbors_follow_cardinal_order() {
        let nodes = grid_nodes(3, 3, &[]);
        let view = GridView::new(&nodes, 3, 3, 3.0, 3.0);
        let center = view.node_at(GridCoord::new(1, 1)).expect("center node");

        let coords: Vec<GridCoord> = view.neighbors(center).map(|node| node.coord()).collect();
        assert_eq!(
            coords,
            vec![
                GridCoord::new(1, 2),
                GridCoord::new(2, 1),
                GridCoord::new(1, 0),
                GridCoord::new(0, 1),
            ],
        );
    }

    #[test]
    fn neighbors_skip_blocked_and_out_of_bounds_cells() {
        let blocked = [GridCoord::new(1, 0)];
        let nodes = grid_nodes(3, 3, &blocked);
        let view = GridView::new(&nodes, 3, 3, 3.0, 3.0);
        let corner = view.node_at(GridCoord::new(0, 0)).expect("corner node");

        let coords: Vec<GridCoord> = view.neighbors(corner).map(|node| node.coord()).collect();
        assert_eq!(coords, vec![GridCoord::new(0, 1)]);
    }

    #[test]
    fn select_walkable_reports_absence_without_error() {
        let blocked: Vec<GridCoord> = (0..2)
            .flat_map(|y| (0..2).map(move |x| GridCoord::new(x, y)))
            .collect();
        let nodes = grid_nodes(2, 2, &blocked);
        let view = GridView::new(&nodes, 2, 2, 2.0, 2.0);

        assert!(view.select_walkable(7).is_none());
    }

    #[test]
    fn select_walkable_wraps_the_draw() {
        let nodes = grid_nodes(2, 2, &[GridCoord::new(0, 0)]);
        let view = GridView::new(&nodes, 2, 2, 2.0, 2.0);

        assert_eq!(view.walkable_count(), 3);
        let chosen = view.select_walkable(4).expect("walkable cells exist");
        assert_eq!(chosen.coord(), GridCoord::new(0, 1));
    }

    #[test]
    fn tuning_rejects_non_positive_ranges() {
        let tuning = AgentTuning {
            detection_range: 0.0,
            ..AgentTuning::default()
        };

        assert_eq!(
            tuning.validate(),
            Err(TuningError::NonPositive {
                name: "detection_range",
                value: 0.0,
            }),
        );
    }

    #[test]
    fn tuning_rejects_out_of_range_threshold() {
        let tuning = AgentTuning {
            low_health_threshold: 1.5,
            ..AgentTuning::default()
        };

        assert_eq!(
            tuning.validate(),
            Err(TuningError::ThresholdOutOfRange { value: 1.5 }),
        );
    }

    #[test]
    fn default_tunings_validate() {
        assert_eq!(AgentTuning::default().validate(), Ok(()));
        assert_eq!(ChampionTuning::default().validate(), Ok(()));
    }

    #[test]
    fn agent_view_sorts_and_finds_snapshots() {
        let snapshot = |id: u32| AgentSnapshot {
            id: AgentId::new(id),
            state: BehaviorState::Patrol,
            health: Health::new(50),
            position: WorldPoint::new(0.0, 0.0),
            course: None,
            is_moving: false,
        };

        let view = AgentView::from_snapshots(vec![snapshot(4), snapshot(1), snapshot(2)]);
        let ids: Vec<u32> = view.iter().map(|snapshot| snapshot.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 4]);
        assert!(view.get(AgentId::new(2)).is_some());
        assert!(view.get(AgentId::new(3)).is_none());
    }
}
