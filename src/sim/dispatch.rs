//! Collision dispatcher
//!
//! Routes each reported pair to the first handler that claims it, forwards
//! balls to the watchdog on the end stage, and runs scene timers.

use super::body::{BodyKind, PhysicsWorld, RawPair, adapt};
use super::handlers::{Handler, HandlerContext};
use super::hooks::{Collaborators, GameEvent, SoundEffect};
use super::scheduler::ScheduledAction;
use super::state::{EntityId, Scene};
use super::watchdog;

/// Contact phase reported by the physics engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Bodies started touching this step
    Start,
    /// Still touching
    Active,
    /// Separated this step
    End,
}

/// What happened during one `process_tick` call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Pairs dropped because a body was gone or had no owner
    pub skipped: usize,
    /// Claiming handler for each processed pair, in input order
    pub claims: Vec<Option<Handler>>,
    /// Handler errors caught and logged
    pub failures: usize,
    pub watchdog_checks: usize,
    pub recoveries: usize,
}

pub struct Dispatcher {
    collab: Collaborators,
}

impl Dispatcher {
    pub fn new(collab: Collaborators) -> Self {
        Self { collab }
    }

    pub fn collaborators_mut(&mut self) -> &mut Collaborators {
        &mut self.collab
    }

    /// Process every pair the engine reported for one stage of a step
    ///
    /// Pairs are handled in the order given. A handler error is logged and
    /// treated as unclaimed; later handlers and later pairs still run.
    pub fn process_tick(
        &mut self,
        scene: &mut Scene,
        world: &mut dyn PhysicsWorld,
        pairs: &[RawPair],
        stage: Stage,
    ) -> TickReport {
        let mut report = TickReport::default();

        for &pair in pairs {
            let Some((a, b)) = adapt(&*world, pair) else {
                log::trace!("skipping pair {:?}/{:?}", pair.a, pair.b);
                report.skipped += 1;
                continue;
            };

            let mut claimed = None;
            for handler in Handler::PRIORITY {
                let mut ctx = HandlerContext {
                    scene: &mut *scene,
                    world: &mut *world,
                    collab: &mut self.collab,
                };
                match handler.handle(&mut ctx, a, b, stage) {
                    Ok(true) => {
                        log::debug!("{} claimed {:?}/{:?}", handler.name(), a.kind, b.kind);
                        claimed = Some(handler);
                        break;
                    }
                    Ok(false) => {}
                    Err(err) => {
                        log::warn!(
                            "{} handler failed on {:?}/{:?}: {}",
                            handler.name(),
                            a.kind,
                            b.kind,
                            err
                        );
                        report.failures += 1;
                    }
                }
            }
            report.claims.push(claimed);

            if stage == Stage::End {
                for view in [a, b] {
                    if view.kind == BodyKind::Ball {
                        self.run_watchdog(scene, world, view.owner, &mut report);
                    }
                }
            }
        }

        report
    }

    fn run_watchdog(
        &mut self,
        scene: &mut Scene,
        world: &mut dyn PhysicsWorld,
        ball: EntityId,
        report: &mut TickReport,
    ) {
        report.watchdog_checks += 1;
        match watchdog::check(scene, world, ball) {
            Ok(reasons) => {
                for reason in reasons {
                    report.recoveries += 1;
                    if let Err(err) = self.collab.emit(GameEvent::BallRecovered { ball, reason }) {
                        log::warn!("recovery event for ball {:?} not delivered: {}", ball, err);
                    }
                }
            }
            Err(err) => log::warn!("watchdog failed for ball {:?}: {}", ball, err),
        }
    }

    /// Advance the scene clock and run every timer that came due
    ///
    /// Targets destroyed since scheduling are skipped.
    pub fn advance_timers(&mut self, scene: &mut Scene, dt_ms: u64) {
        for task in scene.scheduler.advance(dt_ms) {
            match task.action {
                ScheduledAction::ExpirePowerUp { paddle, kind } => {
                    let Some(p) = scene.paddle_mut(paddle) else {
                        log::debug!("power-up {:?} expired on missing paddle {:?}", kind, paddle);
                        continue;
                    };
                    p.active_effects.retain(|(_, t)| *t != task.handle);

                    if let Some(effect) = self.collab.power_ups.handler(kind) {
                        effect.remove(scene, paddle);
                    }
                    let notified = self
                        .collab
                        .play(SoundEffect::PowerDown)
                        .and_then(|()| self.collab.emit(GameEvent::PowerUpExpired { paddle, kind }));
                    if let Err(err) = notified {
                        log::warn!("expiry of {:?} on paddle {:?} not delivered: {}", kind, paddle, err);
                    }
                }
                ScheduledAction::ClearBrickFlash { brick } => {
                    let Some(b) = scene.brick_mut(brick) else {
                        continue;
                    };
                    if b.flash_task == Some(task.handle) {
                        b.flashing = false;
                        b.flash_task = None;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::sim::body::{BodyDesc, BodyId, BodySet};
    use crate::error::CollisionError;
    use crate::sim::hooks::{Recorder, RecoveryReason, SoundSink};
    use crate::sim::response::{BounceModel, PaddleEdge};
    use crate::sim::state::{BrickKind, PowerUpKind};
    use crate::tuning::Tuning;

    struct Fixture {
        scene: Scene,
        world: BodySet,
        recorder: Recorder,
        dispatcher: Dispatcher,
    }

    impl Fixture {
        fn new(tuning: Tuning) -> Self {
            let recorder = Recorder::new();
            Self {
                scene: Scene::new(tuning).unwrap(),
                world: BodySet::new(),
                dispatcher: Dispatcher::new(Collaborators::recording(&recorder)),
                recorder,
            }
        }

        fn quiet() -> Self {
            Self::new(Tuning {
                power_up_drop_chance: 0.0,
                ..Default::default()
            })
        }

        fn tick(&mut self, pairs: &[RawPair], stage: Stage) -> TickReport {
            self.dispatcher
                .process_tick(&mut self.scene, &mut self.world, pairs, stage)
        }

        fn ball(&mut self, pos: Vec2, vel: Vec2) -> (EntityId, BodyId) {
            let id = self.scene.spawn_ball(&mut self.world, pos, vel);
            (id, self.scene.ball(id).unwrap().body.unwrap())
        }

        fn brick(&mut self, kind: BrickKind, pos: Vec2) -> (EntityId, BodyId) {
            let id = self
                .scene
                .spawn_brick(&mut self.world, kind, pos, Vec2::new(30.0, 10.0));
            (id, self.scene.brick(id).unwrap().body.unwrap())
        }

        fn wall(&mut self, label: &str) -> BodyId {
            let id = self.scene.spawn_wall(&mut self.world, label, Vec2::ZERO);
            self.scene.wall(id).unwrap().body.unwrap()
        }

        fn collect(&mut self, paddle: BodyId, kind: PowerUpKind) {
            let id = self
                .scene
                .spawn_power_up(&mut self.world, kind, Vec2::new(400.0, 570.0));
            let body = self.scene.power_up(id).unwrap().body.unwrap();
            let report = self.tick(&[RawPair::new(paddle, body)], Stage::Start);
            assert_eq!(report.claims, vec![Some(Handler::PaddlePowerUp)]);
        }

        fn paddle(&mut self) -> (EntityId, BodyId) {
            let id = self.scene.spawn_paddle(
                &mut self.world,
                PaddleEdge::Bottom,
                BounceModel::Linear,
                Vec2::new(400.0, 580.0),
                100.0,
                20.0,
            );
            (id, self.scene.paddle(id).unwrap().body.unwrap())
        }
    }

    #[test]
    fn test_single_claim() {
        let mut fx = Fixture::quiet();
        let (_, ball) = fx.ball(Vec2::new(105.0, 115.0), Vec2::new(6.0, -8.0));
        let (_, brick) = fx.brick(BrickKind::Armored, Vec2::new(100.0, 100.0));

        let report = fx.tick(&[RawPair::new(brick, ball)], Stage::Start);
        assert_eq!(report.claims, vec![Some(Handler::BallBrick)]);
        assert_eq!(report.failures, 0);

        let seen = fx.recorder.snapshot();
        assert_eq!(seen.count("ballBrickCollision"), 1);
        assert_eq!(seen.count("brickDamaged"), 1);
        assert_eq!(seen.events.len(), 2);
    }

    #[test]
    fn test_unmatched_pair_has_no_effects_but_watchdog_runs() {
        let mut fx = Fixture::quiet();
        let (_, ball) = fx.ball(Vec2::new(400.0, 300.0), Vec2::new(3.0, -4.0));
        let bumper = fx.world.add_body(
            &fx.scene.registry,
            BodyDesc::new("bumper").owner(EntityId(999)).fixed(),
        );

        let report = fx.tick(&[RawPair::new(ball, bumper)], Stage::Start);
        assert_eq!(report.claims, vec![None]);
        assert_eq!(report.watchdog_checks, 0);

        let report = fx.tick(&[RawPair::new(ball, bumper)], Stage::End);
        assert_eq!(report.claims, vec![None]);
        assert_eq!(report.watchdog_checks, 1);
        assert_eq!(report.recoveries, 0);

        let seen = fx.recorder.snapshot();
        assert!(seen.events.is_empty());
        assert!(seen.sounds.is_empty());
        assert_eq!(seen.score, 0);
    }

    #[test]
    fn test_ownerless_pair_skipped_entirely() {
        let mut fx = Fixture::quiet();
        let (_, ball) = fx.ball(Vec2::new(2000.0, 300.0), Vec2::ZERO);
        let sensor = fx
            .world
            .add_body(&fx.scene.registry, BodyDesc::new("wall_sensor").fixed());

        let report = fx.tick(&[RawPair::new(ball, sensor)], Stage::End);
        assert_eq!(report.skipped, 1);
        assert!(report.claims.is_empty());
        assert_eq!(report.watchdog_checks, 0);
    }

    #[test]
    fn test_failing_handler_does_not_stop_tick() {
        let mut fx = Fixture::quiet();
        let (_, stuck) = fx.ball(Vec2::new(105.0, 115.0), Vec2::ZERO);
        let (_, brick) = fx.brick(BrickKind::Standard, Vec2::new(100.0, 100.0));
        let (moving_id, moving) = fx.ball(Vec2::new(5.0, 300.0), Vec2::new(-5.0, 0.0));
        let wall = fx.scene.spawn_wall(&mut fx.world, "wall_left", Vec2::ZERO);
        let wall = fx.scene.wall(wall).unwrap().body.unwrap();
        fx.scene.ball_mut(moving_id).unwrap().hits = 3;

        let report = fx.tick(
            &[RawPair::new(stuck, brick), RawPair::new(moving, wall)],
            Stage::Start,
        );
        assert_eq!(report.failures, 1);
        assert_eq!(report.claims, vec![None, Some(Handler::BallWall)]);
        assert_eq!(fx.scene.ball(moving_id).unwrap().hits, 0);
    }

    #[test]
    fn test_destroyed_brick_skipped_later_in_tick() {
        let mut fx = Fixture::quiet();
        let (_, ball) = fx.ball(Vec2::new(105.0, 115.0), Vec2::new(6.0, -8.0));
        let (_, brick) = fx.brick(BrickKind::Standard, Vec2::new(100.0, 100.0));

        let pair = RawPair::new(ball, brick);
        let report = fx.tick(&[pair, pair], Stage::Start);
        assert_eq!(report.claims, vec![Some(Handler::BallBrick)]);
        assert_eq!(report.skipped, 1);
        assert_eq!(fx.recorder.snapshot().count("brickDestroyed"), 1);
    }

    #[test]
    fn test_active_stage_claims_nothing() {
        let mut fx = Fixture::quiet();
        let (_, ball) = fx.ball(Vec2::new(105.0, 115.0), Vec2::new(6.0, -8.0));
        let (_, brick) = fx.brick(BrickKind::Standard, Vec2::new(100.0, 100.0));

        let report = fx.tick(&[RawPair::new(ball, brick)], Stage::Active);
        assert_eq!(report.claims, vec![None]);
        assert!(fx.recorder.snapshot().events.is_empty());
    }

    #[test]
    fn test_end_stage_recovers_escaped_ball() {
        let mut fx = Fixture::quiet();
        let (ball_id, ball) = fx.ball(Vec2::new(860.0, 300.0), Vec2::new(8.0, 0.0));
        let (_, brick) = fx.brick(BrickKind::Standard, Vec2::new(100.0, 100.0));

        let report = fx.tick(&[RawPair::new(brick, ball)], Stage::End);
        assert_eq!(report.recoveries, 1);

        let body = fx.world.body(ball).unwrap();
        assert_eq!(body.position, Vec2::new(400.0, 300.0));
        assert!((body.velocity.length() - 5.0).abs() < 1e-4);
        assert_eq!(
            fx.recorder.snapshot().events,
            vec![GameEvent::BallRecovered {
                ball: ball_id,
                reason: RecoveryReason::OutOfBounds
            }]
        );
    }

    #[test]
    fn test_power_up_expires_on_schedule() {
        let mut fx = Fixture::quiet();
        let (paddle_id, paddle) = fx.paddle();
        let power_up = fx
            .scene
            .spawn_power_up(&mut fx.world, PowerUpKind::Sticky, Vec2::new(400.0, 570.0));
        let power_up = fx.scene.power_up(power_up).unwrap().body.unwrap();

        fx.tick(&[RawPair::new(paddle, power_up)], Stage::Start);
        assert!(fx.scene.paddle(paddle_id).unwrap().sticky);

        fx.dispatcher.advance_timers(&mut fx.scene, 9_999);
        assert!(fx.scene.paddle(paddle_id).unwrap().sticky);

        fx.dispatcher.advance_timers(&mut fx.scene, 1);
        let paddle = fx.scene.paddle(paddle_id).unwrap();
        assert!(!paddle.sticky);
        assert!(paddle.active_effects.is_empty());

        let seen = fx.recorder.snapshot();
        assert_eq!(seen.count("powerUpExpired"), 1);
        assert_eq!(seen.sounds.last().map(String::as_str), Some("power_down"));
    }

    #[test]
    fn test_expiry_for_removed_paddle_is_noop() {
        let mut fx = Fixture::quiet();
        let (paddle_id, paddle) = fx.paddle();
        let power_up = fx
            .scene
            .spawn_power_up(&mut fx.world, PowerUpKind::Expand, Vec2::ZERO);
        let power_up = fx.scene.power_up(power_up).unwrap().body.unwrap();
        fx.tick(&[RawPair::new(paddle, power_up)], Stage::Start);

        // Dropped without cancelling its timer
        fx.scene.paddles.retain(|p| p.id != paddle_id);
        fx.dispatcher.advance_timers(&mut fx.scene, 20_000);

        assert_eq!(fx.recorder.snapshot().count("powerUpExpired"), 0);
        assert_eq!(fx.scene.scheduler.pending(), 0);
    }

    #[test]
    fn test_brick_flash_clears() {
        let mut fx = Fixture::quiet();
        let (_, ball) = fx.ball(Vec2::new(105.0, 115.0), Vec2::new(6.0, -8.0));
        let (brick_id, brick) = fx.brick(BrickKind::Reinforced, Vec2::new(100.0, 100.0));

        fx.tick(&[RawPair::new(ball, brick)], Stage::Start);
        assert!(fx.scene.brick(brick_id).unwrap().flashing);

        fx.dispatcher.advance_timers(&mut fx.scene, 100);
        let brick = fx.scene.brick(brick_id).unwrap();
        assert!(!brick.flashing);
        assert!(brick.flash_task.is_none());
    }

    #[test]
    fn test_same_seed_same_outcome() {
        fn run() -> Vec<GameEvent> {
            let mut fx = Fixture::new(Tuning {
                power_up_drop_chance: 0.5,
                seed: 42,
                ..Default::default()
            });
            let mut pairs = Vec::new();
            for i in 0..10 {
                let x = 40.0 + i as f32 * 70.0;
                let (_, ball) = fx.ball(Vec2::new(x, 115.0), Vec2::new(1.0, -9.0));
                let (_, brick) = fx.brick(BrickKind::Standard, Vec2::new(x, 100.0));
                pairs.push(RawPair::new(ball, brick));
            }
            fx.tick(&pairs, Stage::Start);
            fx.recorder.snapshot().events
        }

        assert_eq!(run(), run());
    }

    struct OfflineAudio;

    impl SoundSink for OfflineAudio {
        fn play_sound(&mut self, name: &str) -> Result<(), CollisionError> {
            Err(CollisionError::Collaborator(format!("audio offline ({name})")))
        }
    }

    #[test]
    fn test_inverted_speed_range_does_not_stop_tick() {
        let mut fx = Fixture::quiet();
        let (bad_id, bad) = fx.ball(Vec2::new(105.0, 115.0), Vec2::new(6.0, -8.0));
        let (brick_id, brick) = fx.brick(BrickKind::Armored, Vec2::new(100.0, 100.0));
        {
            let ball = fx.scene.ball_mut(bad_id).unwrap();
            ball.min_speed = 20.0;
            ball.max_speed = 5.0;
        }
        let (good_id, good) = fx.ball(Vec2::new(5.0, 300.0), Vec2::new(-5.0, 0.0));
        let wall = fx.wall("wall_left");
        fx.scene.ball_mut(good_id).unwrap().hits = 4;

        let report = fx.tick(
            &[RawPair::new(bad, brick), RawPair::new(good, wall)],
            Stage::Start,
        );
        assert_eq!(report.failures, 1);
        assert_eq!(report.claims, vec![None, Some(Handler::BallWall)]);

        assert_eq!(fx.world.body(bad).unwrap().velocity, Vec2::new(6.0, -8.0));
        assert_eq!(fx.scene.brick(brick_id).unwrap().health, 3);
        assert_eq!(fx.scene.ball(good_id).unwrap().hits, 0);
    }

    #[test]
    fn test_unavailable_collaborator_does_not_stop_tick() {
        let mut fx = Fixture::quiet();
        fx.dispatcher.collaborators_mut().sound = Box::new(OfflineAudio);
        let (_, first) = fx.ball(Vec2::new(5.0, 300.0), Vec2::new(-5.0, 0.0));
        let (_, second) = fx.ball(Vec2::new(400.0, 5.0), Vec2::new(0.0, -5.0));
        let left = fx.wall("wall_left");
        let top = fx.wall("wall_top");

        let report = fx.tick(
            &[RawPair::new(first, left), RawPair::new(second, top)],
            Stage::Start,
        );
        assert_eq!(report.failures, 2);
        assert_eq!(report.claims, vec![None, None]);
        assert!(fx.recorder.snapshot().events.is_empty());
    }

    #[test]
    fn test_overlapping_size_effects() {
        let mut fx = Fixture::quiet();
        let (paddle_id, paddle) = fx.paddle();

        fx.collect(paddle, PowerUpKind::Expand);
        assert_eq!(fx.scene.paddle(paddle_id).unwrap().width, 150.0);
        fx.dispatcher.advance_timers(&mut fx.scene, 5_000);

        fx.collect(paddle, PowerUpKind::Shrink);
        assert_eq!(fx.scene.paddle(paddle_id).unwrap().width, 75.0);

        // Expand runs out while Shrink is still going
        fx.dispatcher.advance_timers(&mut fx.scene, 5_000);
        let p = fx.scene.paddle(paddle_id).unwrap();
        assert_eq!(p.width, 75.0);
        let kinds: Vec<_> = p.active_effects.iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, vec![PowerUpKind::Shrink]);

        fx.dispatcher.advance_timers(&mut fx.scene, 5_000);
        let p = fx.scene.paddle(paddle_id).unwrap();
        assert_eq!(p.width, 100.0);
        assert!(p.active_effects.is_empty());
        assert_eq!(fx.recorder.snapshot().count("powerUpExpired"), 2);
    }

    #[test]
    fn test_shrink_expiring_first_restores_expand() {
        let mut fx = Fixture::quiet();
        let (paddle_id, paddle) = fx.paddle();

        fx.collect(paddle, PowerUpKind::Shrink);
        fx.dispatcher.advance_timers(&mut fx.scene, 2_000);
        fx.collect(paddle, PowerUpKind::Expand);
        fx.collect(paddle, PowerUpKind::Slow);

        fx.dispatcher.advance_timers(&mut fx.scene, 8_000);
        let p = fx.scene.paddle(paddle_id).unwrap();
        assert_eq!(p.width, 150.0);
        assert_eq!(p.ball_speed_scale, 0.7);
    }
}
