//! Quad Breaker demo
//!
//! Drives the collision core through a short scripted rally against an
//! in-memory body set and logs what happened. Pass a tuning JSON file as
//! the first argument to override the defaults.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use glam::Vec2;
    use quad_breaker::Tuning;
    use quad_breaker::sim::{
        BodySet, BounceModel, BrickKind, Collaborators, Dispatcher, EntityId, PaddleEdge,
        PhysicsWorld, PowerUpKind, RawPair, Recorder, Scene, Stage,
    };

    env_logger::init();
    log::info!("Quad Breaker (native) starting...");

    let tuning = match std::env::args().nth(1) {
        Some(path) => Tuning::from_json(&std::fs::read_to_string(&path)?)?,
        None => Tuning::default(),
    };

    let mut scene = Scene::new(tuning)?;
    let mut world = BodySet::new();
    let recorder = Recorder::new();
    let mut dispatcher = Dispatcher::new(Collaborators::recording(&recorder));

    let (w, h) = (scene.tuning.playfield_width, scene.tuning.playfield_height);
    let top = scene.spawn_wall(&mut world, "wall_top", Vec2::new(w / 2.0, 0.0));
    scene.spawn_wall(&mut world, "wall_left", Vec2::new(0.0, h / 2.0));
    scene.spawn_wall(&mut world, "wall_right", Vec2::new(w, h / 2.0));
    let vault = scene.spawn_wall(&mut world, "vaultWall", Vec2::new(w / 2.0, h));

    let paddle = scene.spawn_paddle(
        &mut world,
        PaddleEdge::Bottom,
        BounceModel::Linear,
        Vec2::new(w / 2.0, h - 20.0),
        100.0,
        20.0,
    );
    let kinds = [BrickKind::Standard, BrickKind::Reinforced, BrickKind::Armored, BrickKind::Gold];
    let bricks: Vec<_> = kinds
        .iter()
        .enumerate()
        .map(|(i, &kind)| {
            let pos = Vec2::new(160.0 + i as f32 * 160.0, 100.0);
            scene.spawn_brick(&mut world, kind, pos, Vec2::new(30.0, 10.0))
        })
        .collect();
    let ball = scene.spawn_ball(&mut world, Vec2::new(165.0, 115.0), Vec2::new(3.0, -9.0));

    let body = |scene: &Scene, id: EntityId| {
        scene
            .ball(id)
            .and_then(|b| b.body)
            .or_else(|| scene.paddle(id).and_then(|p| p.body))
            .or_else(|| scene.brick(id).and_then(|b| b.body))
            .or_else(|| scene.wall(id).and_then(|w| w.body))
            .or_else(|| scene.power_up(id).and_then(|p| p.body))
    };
    let ball_body = body(&scene, ball).ok_or("ball has no body")?;

    // Rally: brick, top wall, paddle, vault
    let script = [bricks[0], top, paddle, vault];
    for (step, target) in script.into_iter().enumerate() {
        let Some(target_body) = body(&scene, target) else {
            continue;
        };
        let pair = RawPair::new(ball_body, target_body);
        let report = dispatcher.process_tick(&mut scene, &mut world, &[pair], Stage::Start);
        dispatcher.process_tick(&mut scene, &mut world, &[pair], Stage::End);
        dispatcher.advance_timers(&mut scene, 16);
        let velocity = world.body(ball_body).map(|b| b.velocity).unwrap_or_default();
        log::info!(
            "step {}: claimed by {:?}, ball velocity ({:.2}, {:.2})",
            step,
            report.claims.first().copied().flatten().map(|h| h.name()),
            velocity.x,
            velocity.y
        );
    }

    // Collect a power-up and let it run out
    let drop = scene.spawn_power_up(&mut world, PowerUpKind::Expand, Vec2::new(w / 2.0, h - 40.0));
    if let (Some(paddle_body), Some(drop_body)) = (body(&scene, paddle), body(&scene, drop)) {
        dispatcher.process_tick(
            &mut scene,
            &mut world,
            &[RawPair::new(drop_body, paddle_body)],
            Stage::Start,
        );
    }
    if let Some(p) = scene.paddle(paddle) {
        log::info!("paddle width with power-up: {:.1}", p.width);
    }
    let duration = scene.tuning.power_up_duration_ms;
    dispatcher.advance_timers(&mut scene, duration);
    if let Some(p) = scene.paddle(paddle) {
        log::info!("paddle width after expiry: {:.1}", p.width);
    }

    // Knock the ball off the field and let the watchdog catch it
    world.set_position(ball_body, Vec2::new(w + 120.0, h / 2.0))?;
    if let Some(wall_body) = body(&scene, top) {
        let report = dispatcher.process_tick(
            &mut scene,
            &mut world,
            &[RawPair::new(ball_body, wall_body)],
            Stage::End,
        );
        log::info!("watchdog recoveries: {}", report.recoveries);
    }

    let seen = recorder.snapshot();
    log::info!(
        "score {}, {} events, {} sounds, {} bricks left",
        seen.score,
        seen.events.len(),
        seen.sounds.len(),
        scene.bricks.len()
    );
    for event in &seen.events {
        log::info!("  {}", event.name());
    }

    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host game on the web
}
