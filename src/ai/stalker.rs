//! Stalker creature behavior
//!
//! A burrowing enemy that hunts player agents through the voxel grid. The
//! behavior is a five-state machine: far from the camera it sleeps, close
//! by it listens for players, and once it has a target it runs them down
//! and builds a cage of converted cells around them to finish the kill.

use std::fmt;

use glam::Vec3;
use hecs::Entity;

use crate::ai::chase::{CellClass, ChaseAgent};
use crate::ai::machine::{Machine, StateDef, Task};
use crate::ai::perception::{AgentSnapshot, collect_agents, query_agents};
use crate::core::{Events, GameEvent, SoundCue};
use crate::ecs::{Agent, Faction, Name, OperationalRadius, Transform, World};
use crate::renderer::{ParticleEmitter, PointLight};
use crate::voxel::{CellState, Coord, GridHandle, VoxelWorld};

const DEFAULT_SPEED: f32 = 5.0;
const CHASE_SPEED: f32 = 18.0;
const CLOSE_CHASE_SPEED: f32 = 12.0;
const CRUSH_SPEED: f32 = 125.0;

const CLOSE_CHASE_DISTANCE: f32 = 15.0;
const LOSE_TARGET_DISTANCE: f32 = 50.0;
const CHASE_TIMEOUT: f32 = 40.0;
const CRUSH_DISTANCE: f32 = 5.0;

const SIGHT_RADIUS: f32 = 50.0;
const IDLE_VERTICAL_BOUND: f32 = 20.0;
const ALERT_VERTICAL_BOUND: f32 = 30.0;
const ALERT_TIMEOUT: f32 = 3.0;

const RADIUS_CHECK_INTERVAL: f32 = 2.0;
const SEEK_INTERVAL: f32 = 1.0;
const TRACK_INTERVAL: f32 = 0.07;
const CRUSH_INTERVAL: f32 = 0.01;
const SECONDS_TO_KILL: f32 = 1.5;

const CAGE_SHELL_RADIUS: i32 = 2;
const CAGE_FOOT_RADIUS: i32 = 1;

const LIGHT_RADIUS: f32 = 20.0;
const CALM_LIGHT_COLOR: Vec3 = Vec3::new(1.0, 1.0, 1.0);
const ALERT_LIGHT_COLOR: Vec3 = Vec3::new(1.5, 1.5, 0.5);
const HUNT_LIGHT_COLOR: Vec3 = Vec3::new(1.5, 0.5, 0.5);

/// Behavioral state of a stalker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StalkerState {
    /// Beyond the operational radius; only the radius check runs
    Suspended,
    /// Listening for nearby players
    Idle,
    /// Heard something; movement frozen while it confirms
    Alert,
    /// Running down a confirmed target
    Chase,
    /// Caging and damaging a caught target
    Crush,
}

impl StalkerState {
    /// Human-readable state name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Suspended => "Suspended",
            Self::Idle => "Idle",
            Self::Alert => "Alert",
            Self::Chase => "Chase",
            Self::Crush => "Crush",
        }
    }
}

impl fmt::Display for StalkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Snapshot of the chased agent for one tick
#[derive(Debug, Clone, Copy)]
pub struct TargetSnapshot {
    /// Handle back into the world
    pub entity: Entity,
    /// Target position at snapshot time
    pub position: Vec3,
    /// Target health; tasks mutate this locally so same-tick checks see
    /// the damage they just dealt
    pub health: f32,
}

/// Requested change to the stored target handle
#[derive(Debug, Clone, Copy)]
pub enum TargetRequest {
    Set(Entity),
    Clear,
}

/// Context the behavior tasks operate on.
///
/// Owns the chase agent plus per-tick snapshots of everything else the
/// tasks read, so task handlers stay plain functions with no captured
/// engine state.
#[derive(Debug)]
pub struct StalkerCtx {
    /// The movement agent
    pub chase: ChaseAgent,
    /// Coordinate recorded when a crush began, restored on exit
    pub crush_coord: Coord,
    /// Own position this tick
    pub position: Vec3,
    /// Camera position this tick
    pub camera: Vec3,
    /// Suspension distance
    pub operational_radius: f32,
    /// Whether the home grid still exists
    pub grid_alive: bool,
    /// All perceivable agents this tick
    pub agents: Vec<AgentSnapshot>,
    /// Resolved target, if the stored handle is still valid
    pub target: Option<TargetSnapshot>,
    /// Target handle change requested by a task
    pub target_request: Option<TargetRequest>,
    /// Set when the entity should be removed from the world
    pub despawn: bool,
    /// Damage dealt to the target this tick, applied by the system
    pub damage: f32,
}

/// Brain component: the state machine plus its context and target handle
pub struct StalkerBrain {
    /// The behavior state machine
    pub machine: Machine<StalkerState, StalkerCtx>,
    /// Persistent task context
    pub ctx: StalkerCtx,
    /// Weak handle to the hunted agent, revalidated every tick
    pub target: Option<Entity>,
}

impl StalkerBrain {
    /// Build a brain around a movement agent
    #[must_use]
    pub fn new(chase: ChaseAgent) -> Self {
        let crush_coord = chase.coord;
        let position = chase.position;
        Self {
            machine: Machine::new(StalkerState::Idle, state_table()),
            ctx: StalkerCtx {
                chase,
                crush_coord,
                position,
                camera: Vec3::ZERO,
                operational_radius: OperationalRadius::default().0,
                grid_alive: true,
                agents: Vec::new(),
                target: None,
                target_request: None,
                despawn: false,
                damage: 0.0,
            },
            target: None,
        }
    }

    /// The active behavioral state
    #[must_use]
    pub fn state(&self) -> StalkerState {
        self.machine.current()
    }
}

/// Cell filter for stalker movement: the creature burrows through
/// ordinary and converted terrain, never air or rock.
#[must_use]
pub fn burrow_filter(state: CellState) -> CellClass {
    match state {
        CellState::Neutral | CellState::Infected => CellClass::Penetrable,
        _ => CellClass::Avoid,
    }
}

/// Spawn a stalker at `start` on the given grid
pub fn spawn_stalker(world: &mut World, grid: GridHandle, start: Coord) -> Entity {
    let mut chase = ChaseAgent::new(grid, start, burrow_filter);
    chase.speed = DEFAULT_SPEED;

    let light = PointLight {
        position: start.center(),
        color: CALM_LIGHT_COLOR,
        attenuation: LIGHT_RADIUS,
        enabled: true,
        suspended: false,
        shadowed: false,
    };

    world.spawn((
        Name::new("Stalker"),
        Transform::from_position(start.center()),
        Agent::new(Faction::Creature),
        OperationalRadius::default(),
        StalkerBrain::new(chase),
        light,
        ParticleEmitter::new(spark_config()),
    ))
}

/// Spark burst that trails the creature, over-bright so it blooms
fn spark_config() -> crate::renderer::EmitterConfig {
    crate::renderer::EmitterConfig {
        max_particles: 1000,
        spawn_rate: 100.0,
        lifetime: (1.0, 1.0),
        velocity_min: Vec3::new(-7.0, 0.0, -7.0),
        velocity_max: Vec3::new(7.0, 7.0, 7.0),
        size: (0.3, 0.7),
        end_size: (0.0, 0.0),
        start_color: glam::Vec4::new(2.0, 2.0, 2.0, 1.0),
        end_color: glam::Vec4::new(2.0, 2.0, 2.0, 0.0),
        gravity: Vec3::new(0.0, -10.0, 0.0),
        looping: true,
    }
}

// ---------------------------------------------------------------------------
// State table
// ---------------------------------------------------------------------------

fn state_table() -> Vec<StateDef<StalkerState, StalkerCtx>> {
    vec![
        StateDef::new(StalkerState::Suspended)
            .with_task(Task::every_tick(check_map))
            .with_task(Task::new(RADIUS_CHECK_INTERVAL, resume_when_near)),
        StateDef::new(StalkerState::Idle)
            .with_task(Task::every_tick(check_map))
            .with_task(Task::new(RADIUS_CHECK_INTERVAL, suspend_when_far))
            .with_task(Task::new(SEEK_INTERVAL, idle_seek)),
        StateDef::new(StalkerState::Alert)
            .on_enter(alert_enter)
            .on_exit(alert_exit)
            .with_task(Task::every_tick(check_map))
            .with_task(Task::new(RADIUS_CHECK_INTERVAL, suspend_when_far))
            .with_task(Task::new(SEEK_INTERVAL, alert_seek)),
        StateDef::new(StalkerState::Chase)
            .on_enter(chase_enter)
            .on_exit(chase_exit)
            .with_task(Task::every_tick(check_map))
            .with_task(Task::new(RADIUS_CHECK_INTERVAL, suspend_when_far))
            .with_task(Task::every_tick(check_target))
            .with_task(Task::new(TRACK_INTERVAL, chase_track)),
        StateDef::new(StalkerState::Crush)
            .on_enter(crush_enter)
            .on_exit(crush_exit)
            .with_task(Task::every_tick(check_map))
            .with_task(Task::new(RADIUS_CHECK_INTERVAL, suspend_when_far))
            .with_task(Task::every_tick(check_target))
            .with_task(Task::new(CRUSH_INTERVAL, crush_squeeze)),
    ]
}

fn check_map(ctx: &mut StalkerCtx, _time: f32) -> Option<StalkerState> {
    if !ctx.grid_alive {
        ctx.despawn = true;
    }
    None
}

fn suspend_when_far(ctx: &mut StalkerCtx, _time: f32) -> Option<StalkerState> {
    (ctx.position.distance(ctx.camera) >= ctx.operational_radius).then_some(StalkerState::Suspended)
}

fn resume_when_near(ctx: &mut StalkerCtx, _time: f32) -> Option<StalkerState> {
    (ctx.position.distance(ctx.camera) < ctx.operational_radius).then_some(StalkerState::Idle)
}

fn idle_seek(ctx: &mut StalkerCtx, _time: f32) -> Option<StalkerState> {
    query_agents(
        &ctx.agents,
        ctx.position,
        SIGHT_RADIUS,
        IDLE_VERTICAL_BOUND,
        Faction::Player,
    )
    .map(|_| StalkerState::Alert)
}

fn alert_seek(ctx: &mut StalkerCtx, time: f32) -> Option<StalkerState> {
    if time > ALERT_TIMEOUT {
        return Some(StalkerState::Idle);
    }
    let hit = query_agents(
        &ctx.agents,
        ctx.position,
        SIGHT_RADIUS,
        ALERT_VERTICAL_BOUND,
        Faction::Player,
    )?;
    ctx.target_request = Some(TargetRequest::Set(hit.entity));
    Some(StalkerState::Chase)
}

fn check_target(ctx: &mut StalkerCtx, _time: f32) -> Option<StalkerState> {
    if ctx.target.is_none() {
        ctx.target_request = Some(TargetRequest::Clear);
        return Some(StalkerState::Idle);
    }
    None
}

fn chase_track(ctx: &mut StalkerCtx, time: f32) -> Option<StalkerState> {
    // The target can vanish mid-tick after check_target already ran.
    let target = ctx.target?;
    let distance = target.position.distance(ctx.position);

    ctx.chase.speed = if distance < CLOSE_CHASE_DISTANCE {
        CLOSE_CHASE_SPEED
    } else {
        CHASE_SPEED
    };

    if distance > LOSE_TARGET_DISTANCE || time > CHASE_TIMEOUT {
        // He got away
        Some(StalkerState::Alert)
    } else if distance < CRUSH_DISTANCE {
        Some(StalkerState::Crush)
    } else {
        ctx.chase.target = Some(target.position);
        None
    }
}

fn crush_squeeze(ctx: &mut StalkerCtx, _time: f32) -> Option<StalkerState> {
    let target = ctx.target.as_mut()?;
    let amount = CRUSH_INTERVAL / SECONDS_TO_KILL;
    target.health -= amount;
    ctx.damage += amount;

    if target.health <= 0.0 {
        Some(StalkerState::Alert)
    } else if target.position.distance(ctx.position) > CRUSH_DISTANCE {
        // They're getting away
        Some(StalkerState::Chase)
    } else {
        None
    }
}

fn alert_enter(ctx: &mut StalkerCtx, _previous: StalkerState) {
    ctx.chase.enable_movement = false;
}

fn alert_exit(ctx: &mut StalkerCtx, _next: StalkerState) {
    ctx.chase.enable_movement = true;
}

fn chase_enter(ctx: &mut StalkerCtx, _previous: StalkerState) {
    ctx.chase.target_active = true;
    ctx.chase.speed = CHASE_SPEED;
}

fn chase_exit(ctx: &mut StalkerCtx, _next: StalkerState) {
    ctx.chase.target_active = false;
    ctx.chase.speed = DEFAULT_SPEED;
}

fn crush_enter(ctx: &mut StalkerCtx, _previous: StalkerState) {
    if let Some(target) = ctx.target {
        let center = Coord::from_world(target.position);
        for coord in cage_path(center) {
            ctx.chase.override_path.push_back(coord);
        }
    }
    ctx.chase.enable_pathfinding = false;
    ctx.chase.speed = CRUSH_SPEED;
    ctx.crush_coord = ctx.chase.coord;
}

fn crush_exit(ctx: &mut StalkerCtx, _next: StalkerState) {
    ctx.chase.enable_pathfinding = true;
    ctx.chase.speed = DEFAULT_SPEED;
    ctx.chase.snap_to(ctx.crush_coord);
    ctx.chase.override_path.clear();
}

/// Build the cage traversal path around a target coordinate.
///
/// The path plugs a floor under the target, walks a hollow shell of
/// radius 2 up through seven layers, and caps the top. Edges are emitted
/// independently, so shell corners appear twice; the path is a traversal
/// script, not a cell set.
#[must_use]
pub fn cage_path(center: Coord) -> Vec<Coord> {
    let mut path = Vec::new();

    // Floor plug below the target
    let foot = CAGE_FOOT_RADIUS;
    for x in center.x - foot..=center.x + foot {
        for z in center.z - foot..=center.z + foot {
            path.push(Coord::new(x, center.y - 4, z));
        }
    }

    // Hollow shell
    let r = CAGE_SHELL_RADIUS;
    for y in center.y - 3..=center.y + 3 {
        for z in center.z - r..=center.z + r {
            path.push(Coord::new(center.x - r, y, z));
        }
        for z in center.z - r..=center.z + r {
            path.push(Coord::new(center.x + r, y, z));
        }
        for x in center.x - r..=center.x + r {
            path.push(Coord::new(x, y, center.z - r));
        }
        for x in center.x - r..=center.x + r {
            path.push(Coord::new(x, y, center.z + r));
        }
    }

    // Cap
    for x in center.x - r..=center.x + r {
        for z in center.z - r..=center.z + r {
            path.push(Coord::new(x, center.y + 3, z));
        }
    }

    path
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Advance every stalker by one simulation tick.
///
/// Refreshes each brain's context from the world, ticks the state machine,
/// steps movement, and applies the side effects the tasks requested:
/// terrain conversion, target damage, despawns, and events.
pub fn update_stalkers(
    world: &mut World,
    voxels: &mut VoxelWorld,
    camera: Vec3,
    events: &mut Events,
    dt: f32,
) {
    let mut agents = Vec::new();
    collect_agents(world, &mut agents);

    let mut damages: Vec<(Entity, f32)> = Vec::new();
    let mut despawns: Vec<Entity> = Vec::new();

    for (entity, (brain, transform, radius)) in world
        .query_mut::<(&mut StalkerBrain, &mut Transform, &OperationalRadius)>()
    {
        let StalkerBrain {
            machine,
            ctx,
            target,
        } = brain;

        ctx.position = transform.position;
        ctx.camera = camera;
        ctx.operational_radius = radius.0;
        ctx.grid_alive = voxels.is_alive(ctx.chase.grid);
        ctx.agents.clone_from(&agents);
        ctx.target = target.and_then(|needle| {
            agents.iter().find(|a| a.entity == needle).map(|a| TargetSnapshot {
                entity: needle,
                position: a.position,
                health: a.health,
            })
        });
        ctx.target_request = None;
        ctx.damage = 0.0;

        let before = machine.current();
        machine.tick(dt, ctx);
        let state = machine.current();

        if state != StalkerState::Suspended {
            if let Some(grid) = voxels.get_mut(ctx.chase.grid) {
                let moves = ctx.chase.step(dt, grid);
                let converting = matches!(state, StalkerState::Chase | StalkerState::Crush);
                let mut changed = false;
                for &coord in &moves {
                    if converting {
                        let mut cell_changed = grid.empty(coord);
                        cell_changed |= grid.fill(coord, CellState::Infected);
                        changed |= cell_changed;
                    }
                    events.push(GameEvent::Sound {
                        cue: SoundCue::StalkerMove,
                        position: coord.center(),
                    });
                }
                if changed {
                    grid.regenerate();
                    events.push(GameEvent::GridChanged {
                        grid: ctx.chase.grid,
                    });
                }
            }
        }
        transform.position = ctx.chase.position;

        match ctx.target_request.take() {
            Some(TargetRequest::Set(hit)) => *target = Some(hit),
            Some(TargetRequest::Clear) => *target = None,
            None => {}
        }
        if ctx.damage > 0.0 {
            if let Some(snapshot) = ctx.target {
                damages.push((snapshot.entity, ctx.damage));
            }
        }
        if before != state {
            log::debug!("stalker {entity:?}: {before} -> {state}");
            events.push(GameEvent::StalkerStateChanged {
                entity,
                from: before,
                to: state,
            });
        }
        if ctx.despawn {
            despawns.push(entity);
        }
    }

    for (entity, amount) in damages {
        if let Ok(mut agent) = world.get_mut::<Agent>(entity) {
            let was_alive = agent.alive();
            agent.damage(amount);
            if was_alive && !agent.alive() {
                events.push(GameEvent::AgentKilled { entity });
            }
        }
    }
    for entity in despawns {
        log::warn!("stalker {entity:?} lost its grid, despawning");
        let _ = world.despawn(entity);
    }
}

/// Drive each stalker's light and spark emitter from its state
pub fn update_stalker_presentation(world: &mut World, dt: f32) {
    for (_entity, (brain, transform, light, emitter)) in world.query_mut::<(
        &StalkerBrain,
        &Transform,
        &mut PointLight,
        Option<&mut ParticleEmitter>,
    )>() {
        let state = brain.state();
        light.position = transform.position;
        light.enabled = state != StalkerState::Suspended;
        light.color = match state {
            StalkerState::Chase | StalkerState::Crush => HUNT_LIGHT_COLOR,
            StalkerState::Alert => ALERT_LIGHT_COLOR,
            _ => CALM_LIGHT_COLOR,
        };
        if let Some(emitter) = emitter {
            emitter.set_position(transform.position);
            if state == StalkerState::Suspended {
                emitter.stop();
            } else {
                emitter.start();
            }
            emitter.update(dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::VoxelGrid;

    fn test_brain(voxels: &mut VoxelWorld) -> StalkerBrain {
        let grid = voxels.insert(VoxelGrid::new());
        let mut chase = ChaseAgent::new(grid, Coord::new(0, 0, 0), burrow_filter);
        chase.speed = DEFAULT_SPEED;
        StalkerBrain::new(chase)
    }

    fn player_at(position: Vec3) -> AgentSnapshot {
        AgentSnapshot {
            entity: Entity::DANGLING,
            position,
            faction: Faction::Player,
            health: 1.0,
            suspended: false,
        }
    }

    #[test]
    fn test_cage_path_has_fixed_length() {
        // Floor 3x3, seven shell layers of four 5-cell edges, 5x5 cap.
        let path = cage_path(Coord::new(0, 0, 0));
        assert_eq!(path.len(), 9 + 7 * 20 + 25);
    }

    #[test]
    fn test_cage_path_geometry() {
        let center = Coord::new(10, 20, -5);
        let path = cage_path(center);

        // Floor plug sits four cells below the target.
        for coord in &path[..9] {
            assert_eq!(coord.y, center.y - 4);
            assert!((coord.x - center.x).abs() <= 1);
            assert!((coord.z - center.z).abs() <= 1);
        }

        // Every shell cell lies on the radius-2 boundary within the
        // seven-layer band.
        for coord in &path[9..9 + 7 * 20] {
            assert!(coord.y >= center.y - 3 && coord.y <= center.y + 3);
            let dx = (coord.x - center.x).abs();
            let dz = (coord.z - center.z).abs();
            assert_eq!(dx.max(dz), 2, "shell cell off boundary: {coord:?}");
        }

        // Cap covers the full 5x5 footprint at the top layer.
        let cap = &path[9 + 7 * 20..];
        assert_eq!(cap.len(), 25);
        assert!(cap.iter().all(|c| c.y == center.y + 3));
    }

    #[test]
    fn test_every_state_runs_shared_checks() {
        // Both the map check and the operational-radius check must be
        // present in every state's task list.
        type Action = fn(&mut StalkerCtx, f32) -> Option<StalkerState>;
        let map_check: Action = check_map;
        let suspend: Action = suspend_when_far;
        let resume: Action = resume_when_near;

        let table = state_table();
        assert_eq!(table.len(), 5);
        for def in &table {
            assert!(
                def.tasks.iter().any(|t| t.action == map_check),
                "{:?} missing map check",
                def.state
            );
            let radius_checked = def
                .tasks
                .iter()
                .any(|t| t.action == suspend || t.action == resume);
            assert!(radius_checked, "{:?} missing radius check", def.state);
        }
    }

    #[test]
    fn test_suspends_beyond_operational_radius() {
        let mut voxels = VoxelWorld::new();
        let mut brain = test_brain(&mut voxels);
        brain.ctx.camera = Vec3::new(150.0, 0.0, 0.0);

        let StalkerBrain { machine, ctx, .. } = &mut brain;
        machine.tick(RADIUS_CHECK_INTERVAL, ctx);
        assert_eq!(machine.current(), StalkerState::Suspended);

        // Camera moves back into range.
        ctx.camera = Vec3::new(50.0, 0.0, 0.0);
        machine.tick(RADIUS_CHECK_INTERVAL, ctx);
        assert_eq!(machine.current(), StalkerState::Idle);
    }

    #[test]
    fn test_idle_alerts_on_nearby_player() {
        let mut voxels = VoxelWorld::new();
        let mut brain = test_brain(&mut voxels);
        brain.ctx.agents = vec![player_at(Vec3::new(10.0, 0.0, 0.0))];

        let StalkerBrain { machine, ctx, .. } = &mut brain;
        machine.tick(SEEK_INTERVAL, ctx);
        assert_eq!(machine.current(), StalkerState::Alert);
        assert!(!ctx.chase.enable_movement);
    }

    #[test]
    fn test_idle_ignores_player_above_vertical_bound() {
        let mut voxels = VoxelWorld::new();
        let mut brain = test_brain(&mut voxels);
        brain.ctx.agents = vec![player_at(Vec3::new(10.0, 25.0, 0.0))];

        let StalkerBrain { machine, ctx, .. } = &mut brain;
        machine.tick(SEEK_INTERVAL, ctx);
        assert_eq!(machine.current(), StalkerState::Idle);
    }

    #[test]
    fn test_alert_acquires_target_with_wider_bound() {
        let mut voxels = VoxelWorld::new();
        let mut brain = test_brain(&mut voxels);
        // 25 above: invisible to Idle, visible to Alert.
        brain.ctx.agents = vec![player_at(Vec3::new(10.0, 25.0, 0.0))];

        let StalkerBrain { machine, ctx, .. } = &mut brain;
        machine.set_state(StalkerState::Alert, ctx);
        machine.tick(SEEK_INTERVAL, ctx);
        assert_eq!(machine.current(), StalkerState::Chase);
        assert!(matches!(ctx.target_request, Some(TargetRequest::Set(_))));
        assert!(ctx.chase.target_active);
        assert_eq!(ctx.chase.speed, CHASE_SPEED);
    }

    #[test]
    fn test_alert_times_out_back_to_idle() {
        let mut voxels = VoxelWorld::new();
        let mut brain = test_brain(&mut voxels);

        let StalkerBrain { machine, ctx, .. } = &mut brain;
        machine.set_state(StalkerState::Alert, ctx);
        for _ in 0..4 {
            machine.tick(SEEK_INTERVAL, ctx);
        }
        assert_eq!(machine.current(), StalkerState::Idle);
        assert!(ctx.chase.enable_movement);
    }

    fn chasing_brain(voxels: &mut VoxelWorld, target_pos: Vec3) -> StalkerBrain {
        let mut brain = test_brain(voxels);
        brain.ctx.target = Some(TargetSnapshot {
            entity: Entity::DANGLING,
            position: target_pos,
            health: 1.0,
        });
        let StalkerBrain { machine, ctx, .. } = &mut brain;
        machine.set_state(StalkerState::Chase, ctx);
        brain
    }

    #[test]
    fn test_chase_advances_to_crush_when_close() {
        let mut voxels = VoxelWorld::new();
        let mut brain = chasing_brain(&mut voxels, Vec3::new(3.0, 0.0, 0.0));
        let StalkerBrain { machine, ctx, .. } = &mut brain;
        machine.tick(TRACK_INTERVAL, ctx);
        assert_eq!(machine.current(), StalkerState::Crush);
    }

    #[test]
    fn test_chase_reverts_to_alert_when_target_escapes() {
        let mut voxels = VoxelWorld::new();
        let mut brain = chasing_brain(&mut voxels, Vec3::new(60.0, 0.0, 0.0));
        let StalkerBrain { machine, ctx, .. } = &mut brain;
        machine.tick(TRACK_INTERVAL, ctx);
        assert_eq!(machine.current(), StalkerState::Alert);
    }

    #[test]
    fn test_chase_times_out_after_forty_seconds() {
        let mut voxels = VoxelWorld::new();
        let mut brain = chasing_brain(&mut voxels, Vec3::new(30.0, 0.0, 0.0));
        let StalkerBrain { machine, ctx, .. } = &mut brain;
        machine.tick(41.0, ctx);
        assert_eq!(machine.current(), StalkerState::Alert);
    }

    #[test]
    fn test_chase_speed_tightens_up_close() {
        let mut voxels = VoxelWorld::new();
        let mut brain = chasing_brain(&mut voxels, Vec3::new(10.0, 0.0, 0.0));
        let StalkerBrain { machine, ctx, .. } = &mut brain;
        machine.tick(TRACK_INTERVAL, ctx);
        assert_eq!(machine.current(), StalkerState::Chase);
        assert_eq!(ctx.chase.speed, CLOSE_CHASE_SPEED);
        assert_eq!(ctx.chase.target, Some(Vec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_crush_enter_builds_cage_and_overrides_pathfinding() {
        let mut voxels = VoxelWorld::new();
        let mut brain = chasing_brain(&mut voxels, Vec3::new(3.0, 0.0, 0.0));
        let StalkerBrain { machine, ctx, .. } = &mut brain;
        machine.tick(TRACK_INTERVAL, ctx);
        assert_eq!(machine.current(), StalkerState::Crush);
        assert_eq!(ctx.chase.override_path.len(), 174);
        assert!(!ctx.chase.enable_pathfinding);
        assert_eq!(ctx.chase.speed, CRUSH_SPEED);
        assert_eq!(ctx.crush_coord, Coord::new(0, 0, 0));
    }

    #[test]
    fn test_crush_exit_restores_agent() {
        let mut voxels = VoxelWorld::new();
        let mut brain = chasing_brain(&mut voxels, Vec3::new(3.0, 0.0, 0.0));
        let StalkerBrain { machine, ctx, .. } = &mut brain;
        machine.tick(TRACK_INTERVAL, ctx);
        assert_eq!(machine.current(), StalkerState::Crush);

        // Target escapes; exit restores defaults and snaps home.
        ctx.target.as_mut().unwrap().position = Vec3::new(20.0, 0.0, 0.0);
        machine.tick(CRUSH_INTERVAL, ctx);
        assert_eq!(machine.current(), StalkerState::Chase);
        assert!(ctx.chase.enable_pathfinding);
        assert!(ctx.chase.override_path.is_empty());
        assert_eq!(ctx.chase.coord, ctx.crush_coord);
    }

    #[test]
    fn test_crush_kills_in_under_two_seconds() {
        let mut voxels = VoxelWorld::new();
        let mut brain = chasing_brain(&mut voxels, Vec3::new(3.0, 0.0, 0.0));
        let StalkerBrain { machine, ctx, .. } = &mut brain;
        machine.tick(TRACK_INTERVAL, ctx);
        assert_eq!(machine.current(), StalkerState::Crush);

        let mut ticks = 0;
        while machine.current() == StalkerState::Crush && ticks < 200 {
            machine.tick(CRUSH_INTERVAL, ctx);
            ticks += 1;
        }
        // A full-health agent dies in 1.5 s of sustained crushing.
        assert_eq!(machine.current(), StalkerState::Alert);
        assert!(ticks <= 151, "took {ticks} ticks");
        assert!(ctx.damage > 0.0);
    }

    #[test]
    fn test_system_hunts_player_and_converts_terrain() {
        let mut world = World::new();
        let mut voxels = VoxelWorld::new();
        let mut events = Events::new();

        let mut grid = VoxelGrid::new();
        grid.fill_box(Coord::new(0, 0, 0), Coord::new(19, 0, 19), CellState::Neutral);
        let handle = voxels.insert(grid);

        let player = world.spawn((
            Transform::from_position(Vec3::new(8.5, 0.5, 8.5)),
            Agent::new(Faction::Player),
        ));
        let stalker = spawn_stalker(&mut world, handle, Coord::new(2, 0, 2));

        let camera = Vec3::new(8.0, 2.0, 8.0);
        // Two slow ticks take it through Idle -> Alert -> Chase.
        update_stalkers(&mut world, &mut voxels, camera, &mut events, 1.0);
        update_stalkers(&mut world, &mut voxels, camera, &mut events, 1.0);
        assert_eq!(
            world.get::<StalkerBrain>(stalker).unwrap().state(),
            StalkerState::Chase
        );

        for _ in 0..30 {
            update_stalkers(&mut world, &mut voxels, camera, &mut events, 0.1);
        }

        let brain = world.get::<StalkerBrain>(stalker).unwrap();
        assert!(matches!(
            brain.state(),
            StalkerState::Chase | StalkerState::Crush
        ));
        assert_eq!(brain.target, Some(player));
        drop(brain);

        // The crawl converted terrain and posted movement cues.
        let grid = voxels.get(handle).unwrap();
        assert!(grid.revision() > 0);
        events.swap();
        let mut saw_sound = false;
        let mut saw_state_change = false;
        for event in events.iter() {
            match event {
                GameEvent::Sound { cue, .. } => saw_sound |= *cue == SoundCue::StalkerMove,
                GameEvent::StalkerStateChanged { .. } => saw_state_change = true,
                _ => {}
            }
        }
        assert!(saw_sound);
        assert!(saw_state_change);
    }

    #[test]
    fn test_system_despawns_when_grid_removed() {
        let mut world = World::new();
        let mut voxels = VoxelWorld::new();
        let mut events = Events::new();

        let handle = voxels.insert(VoxelGrid::new());
        let stalker = spawn_stalker(&mut world, handle, Coord::new(0, 0, 0));
        voxels.remove(handle);

        update_stalkers(&mut world, &mut voxels, Vec3::ZERO, &mut events, 0.1);
        assert!(!world.contains(stalker));
    }
}
