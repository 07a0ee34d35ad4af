//! Headless demo: a stalker hunting a scripted player
//!
//! Builds a small voxel arena, spawns one stalker and one player agent,
//! and runs the simulation at a fixed 60 Hz while the lighting manager
//! aggregates lights each frame. If a GPU adapter is available the shadow
//! passes run too; otherwise the demo stays CPU-only.

use umbra::prelude::*;
use umbra::renderer::RenderContext;
use umbra::wgpu;

fn main() {
    env_logger::init();

    let config = SimConfig::default()
        .with_title("umbra demo")
        .with_camera(Vec3::new(16.0, 10.0, 16.0));
    let mut sim = Simulation::new(&config);

    // A solid slab of terrain for the stalker to burrow through.
    let mut grid = VoxelGrid::new();
    grid.fill_box(Coord::new(0, 0, 0), Coord::new(31, 5, 31), CellState::Neutral);
    let arena = sim.voxels.insert(grid);

    let player = sim.world.spawn((
        Name::new("Player"),
        Transform::from_position(Vec3::new(24.5, 6.5, 24.5)),
        Agent::new(Faction::Player),
    ));
    let stalker = spawn_stalker(&mut sim.world, arena, Coord::new(4, 2, 4));
    log::info!("spawned stalker {stalker:?} hunting player {player:?}");

    // Lighting: a shadow-casting sun, a fill light, and ambient.
    let mut lights = LightSet::new();
    let mut manager = LightingManager::new();
    manager.set_quality(ShadowQuality::Medium);

    let mut camera = Camera::look_at(config.camera, Vec3::new(16.0, 4.0, 16.0), Vec3::Y);
    camera.far = 120.0;

    let gpu = match RenderContext::headless() {
        Ok(context) => Some(context),
        Err(e) => {
            log::warn!("no GPU available ({e}), running without shadow passes");
            None
        }
    };

    let audio = match umbra::audio::CueBank::new() {
        Ok(bank) => Some(bank),
        Err(e) => {
            log::warn!("audio disabled: {e}");
            None
        }
    };

    let dt = 1.0 / 60.0;
    for tick in 0..900u32 {
        // Script: the player holds still, then tries to run.
        if tick > 420 {
            if let Ok(mut transform) = sim.world.get_mut::<Transform>(player) {
                transform.position.x += 2.0 * dt;
            }
        }

        sim.update(dt);

        for event in sim.events.iter() {
            match event {
                GameEvent::StalkerStateChanged { from, to, .. } => {
                    log::info!("tick {tick}: stalker {from} -> {to}");
                }
                GameEvent::AgentKilled { entity } => {
                    log::warn!("tick {tick}: agent {entity:?} was crushed");
                }
                _ => {}
            }
        }
        if let Some(bank) = &audio {
            bank.drain(&sim.events);
        }

        // Rebuild the frame's light set and aggregate it.
        lights.clear();
        lights
            .directional
            .push(DirectionalLight::new(Vec3::new(-0.3, -1.0, -0.2), Vec3::splat(0.9)).with_shadow());
        lights.ambient.push(AmbientLight::new(Vec3::splat(0.15)));
        lights.spot.push(
            SpotLight::new(
                Vec3::new(16.0, 12.0, 16.0),
                Vec3::NEG_Y,
                Vec3::new(0.9, 0.8, 0.6),
                30.0,
            )
            .with_shadow(),
        );
        lights.gather_point_lights(&sim.world);
        manager.update_global_lights(&lights);

        if let Some(context) = &gpu {
            let mut encoder = context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("shadow_encoder"),
                });
            manager.render_shadow_maps(
                &context.device,
                &mut encoder,
                &camera,
                &lights,
                |_pass, _view_projection| {
                    // Scene geometry would be drawn here by the host.
                },
            );
            manager.upload_params(&context.queue, &camera);
            context.queue.submit(Some(encoder.finish()));
        }
    }

    let survivors = sim
        .world
        .get::<Agent>(player)
        .map(|agent| agent.alive())
        .unwrap_or(false);
    log::info!(
        "demo finished after {} ticks; player {}",
        sim.time.ticks(),
        if survivors { "escaped" } else { "did not make it" }
    );

    // Persist the end state the way the host engine would.
    let scene = Scene::capture("demo-end", &sim.world);
    let path = std::env::temp_dir().join("umbra_demo_scene.ron");
    match scene.save_ron(&path) {
        Ok(()) => log::info!("end-state scene written to {}", path.display()),
        Err(e) => log::warn!("scene save failed: {e}"),
    }
}
