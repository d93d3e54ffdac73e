#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs headless Grid Skirmish scenarios.
//!
//! The binary wires the authoritative world to the behavior and duel
//! systems, drives the tick loop, and prints a summary of the skirmish.

mod config;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use grid_skirmish_core::{Command, Event, GridCoord};
use grid_skirmish_system_behavior::{Behavior, Config as BehaviorConfig};
use grid_skirmish_system_duel::{Config as DuelConfig, Duel};
use grid_skirmish_world::{self as world, query, GridField, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use config::Scenario;

#[derive(Debug, Parser)]
#[command(name = "grid-skirmish", about = "Headless grid skirmish simulation")]
struct Args {
    /// Path to a TOML scenario file; built-in defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = 400)]
    ticks: u32,
    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 125)]
    tick_ms: u64,
    /// Seed for the obstacle layout and patrol wandering.
    #[arg(long, default_value_t = 7)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let scenario = Scenario::load(args.config.as_deref())?;

    let grid = build_grid(&scenario, args.seed)?;
    let spawn_cells = resolve_spawn_cells(&scenario, &grid, args.seed);
    let mut world = World::new(
        grid,
        scenario.agents.tuning()?,
        scenario.champion.tuning()?,
    )?;

    println!("{}", query::welcome_banner(&world));
    let (size_x, size_y) = query::grid(&world).dimensions();
    log::info!(
        "grid {size_x}x{size_y}, {} walkable cells",
        query::grid(&world).walkable_count()
    );

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::PlaceChampion {
            position: scenario.champion.start_position(),
        },
        &mut events,
    );
    for cell in spawn_cells {
        world::apply(&mut world, Command::SpawnAgent { cell }, &mut events);
    }

    let mut behavior = Behavior::new(BehaviorConfig::new(args.seed));
    let mut duel = Duel::new(DuelConfig::new(
        scenario.duel.attack_damage,
        scenario.duel.attack_interval()?,
        scenario.duel.attack_range,
    ));
    duel.set_attacking(scenario.duel.auto_attack);

    let dt = Duration::from_millis(args.tick_ms);
    let mut report = Report::default();
    let mut ticks_run = 0;

    for _ in 0..args.ticks {
        ticks_run += 1;
        events.clear();
        world::apply(&mut world, Command::Tick { dt }, &mut events);

        // Standing guard order: defend whenever health is low and the
        // cooldown allows it.
        let champion = query::champion(&world);
        if champion.defend_ready && champion.health.get() <= scenario.champion.guard_below_health {
            world::apply(&mut world, Command::BeginDefend, &mut events);
        }

        pump(&mut world, &mut behavior, &mut duel, &mut events, &mut report);

        if report.champion_defeated || query::agent_view(&world).iter().next().is_none() {
            break;
        }
    }

    let survivors = query::agent_view(&world).iter().count();
    let champion = query::champion(&world);
    println!("ticks simulated: {ticks_run}");
    println!("agents remaining: {survivors}");
    println!("champion health: {}", champion.health.get());
    println!(
        "strikes landed: {}, absorbed: {}, agents lost: {}",
        report.strikes_landed, report.strikes_absorbed, report.agents_lost
    );
    if report.champion_defeated {
        println!("the champion has fallen");
    }

    Ok(())
}

/// Builds the grid from seed-derived obstacle and waypoint layouts.
///
/// The predicates draw from independent streams so changing one density
/// never reshuffles the other layout.
fn build_grid(scenario: &Scenario, seed: u64) -> Result<GridField> {
    scenario.grid.validate()?;

    let mut obstacle_rng = ChaCha8Rng::seed_from_u64(seed);
    let mut waypoint_rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));
    let obstacle_density = scenario.grid.obstacle_density;
    let waypoint_density = scenario.grid.waypoint_density;

    let grid = GridField::build(
        scenario.grid.world_width,
        scenario.grid.world_height,
        scenario.grid.node_radius,
        |_| obstacle_rng.gen_bool(obstacle_density),
        |_| waypoint_rng.gen_bool(waypoint_density),
    )?;
    Ok(grid)
}

/// Spawn cells from the scenario, or random walkable cells when it names
/// none.
fn resolve_spawn_cells(scenario: &Scenario, grid: &GridField, seed: u64) -> Vec<GridCoord> {
    if !scenario.agents.spawn_cells.is_empty() {
        return scenario
            .agents
            .spawn_cells
            .iter()
            .map(|cell| GridCoord::new(cell[0], cell[1]))
            .collect();
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(2));
    let view = grid.view();
    (0..3)
        .filter_map(|_| view.select_walkable(rng.gen()).map(|node| node.coord()))
        .collect()
}

#[derive(Debug, Default)]
struct Report {
    strikes_landed: u32,
    strikes_absorbed: u32,
    agents_lost: u32,
    champion_defeated: bool,
}

/// Feeds system commands back into the world until the event stream settles.
fn pump(
    world: &mut World,
    behavior: &mut Behavior,
    duel: &mut Duel,
    events: &mut Vec<Event>,
    report: &mut Report,
) {
    loop {
        observe(events, report);

        let agents = query::agent_view(world);
        let champion = query::champion(world);
        let tuning = *query::tuning(world);
        let mut commands = Vec::new();
        behavior.handle(
            events,
            &agents,
            champion,
            query::grid(world),
            &tuning,
            &mut commands,
        );
        duel.handle(events, &agents, champion, &mut commands);

        if commands.is_empty() {
            break;
        }

        events.clear();
        for command in commands {
            world::apply(world, command, events);
        }
    }
}

fn observe(events: &[Event], report: &mut Report) {
    for event in events {
        match event {
            Event::ChampionStruck { remaining, .. } => {
                report.strikes_landed += 1;
                log::debug!("champion struck, {} health left", remaining.get());
            }
            Event::StrikeAbsorbed { .. } => report.strikes_absorbed += 1,
            Event::AgentDespawned { agent } => {
                report.agents_lost += 1;
                log::info!("agent {} despawned", agent.get());
            }
            Event::ChampionDefeated => report.champion_defeated = true,
            Event::DefendStarted => log::info!("champion defend window opened"),
            _ => {}
        }
    }
}
