use serde::Serialize;

use crate::config::AppConfig;
use crate::error::ConfigError;
use crate::game::audio::{AudioCue, AudioSink};
use crate::game::camera::CameraRig;
use crate::game::player::{DeathCause, MoveOutcome, PlayerController, PlayerState, Step};
use crate::game::prefs::{PrefsStore, COINS_KEY, HIGH_SCORE_KEY};
use crate::game::rng::RandomSource;
use crate::game::world::WorldGenerator;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum GameEvent {
    Jumped,
    CoinCollected { total: u32 },
    Died { cause: DeathCause },
    GameOver { steps: u32, high_score: u32, new_record: bool },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    pub steps: u32,
    pub coins: u32,
    pub high_score: u32,
    pub alive: bool,
    pub paused: bool,
    pub death: Option<DeathCause>,
}

/// One run of the game: the world, the player, the camera and the
/// collaborators they report to. Advanced one frame at a time by `tick`.
pub struct Session {
    config: AppConfig,
    world: WorldGenerator,
    player: PlayerController,
    camera: CameraRig,
    prefs: Box<dyn PrefsStore>,
    audio: Box<dyn AudioSink>,
    pending: Option<Step>,
    paused: bool,
    high_score: u32,
    record_at_start: u32,
    game_over_reported: bool,
    events: Vec<GameEvent>,
}

impl Session {
    /// Starts a run on a freshly generated world. `seed` wins over the
    /// configured one; with neither, the seed comes from entropy.
    pub fn new(
        config: AppConfig,
        seed: Option<u64>,
        prefs: Box<dyn PrefsStore>,
        audio: Box<dyn AudioSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let world = generate_world(&config, seed);
        Ok(Self::assemble(config, world, prefs, audio))
    }

    /// Starts a run on a world built by the caller.
    pub fn with_world(
        config: AppConfig,
        world: WorldGenerator,
        prefs: Box<dyn PrefsStore>,
        audio: Box<dyn AudioSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::assemble(config, world, prefs, audio))
    }

    fn assemble(
        config: AppConfig,
        world: WorldGenerator,
        prefs: Box<dyn PrefsStore>,
        audio: Box<dyn AudioSink>,
    ) -> Self {
        let player = PlayerController::new(config.level.player_bounds, prefs.get_u32(COINS_KEY));
        let camera = CameraRig::new(&config.camera, player.position());
        let high_score = prefs.get_u32(HIGH_SCORE_KEY);
        let mut session = Session {
            config,
            world,
            player,
            camera,
            prefs,
            audio,
            pending: None,
            paused: false,
            high_score,
            record_at_start: high_score,
            game_over_reported: false,
            events: Vec::new(),
        };
        session.audio.play(AudioCue::Music);
        session.audio.play(AudioCue::CarNoise);
        log::info!(
            "session started: seed {}, high score {}, coins {}",
            session.world.seed(),
            session.high_score,
            session.player.coins()
        );
        session
    }

    pub fn restart(&mut self, seed: Option<u64>) {
        self.audio.stop(AudioCue::Music);
        self.audio.stop(AudioCue::CarNoise);
        self.world = generate_world(&self.config, seed);
        self.player = PlayerController::new(self.config.level.player_bounds, self.prefs.get_u32(COINS_KEY));
        self.camera = CameraRig::new(&self.config.camera, self.player.position());
        self.pending = None;
        self.paused = false;
        self.record_at_start = self.high_score;
        self.game_over_reported = false;
        self.events.clear();
        self.audio.play(AudioCue::Music);
        self.audio.play(AudioCue::CarNoise);
        log::info!("session restarted with seed {}", self.world.seed());
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn world(&self) -> &WorldGenerator {
        &self.world
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn prefs(&self) -> &dyn PrefsStore {
        self.prefs.as_ref()
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_over(&self) -> bool {
        !self.player.is_alive()
    }

    /// Queues a step for the next frame. Only the latest press counts.
    pub fn queue_step(&mut self, step: Step) {
        if !self.paused && self.player.is_alive() {
            self.pending = Some(step);
        }
    }

    pub fn toggle_pause(&mut self) -> bool {
        if self.player.is_alive() {
            self.paused = !self.paused;
            self.pending = None;
        }
        self.paused
    }

    /// Stops the game-over zoom where it is.
    pub fn cancel_effects(&mut self) {
        self.camera.cancel_zoom();
    }

    /// Wipes the stored high score and coin total.
    pub fn reset_saved_progress(&mut self) {
        self.prefs.clear();
        self.high_score = 0;
        self.record_at_start = 0;
        self.player.reset_coins();
        log::info!("saved progress cleared");
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            seed: self.world.seed(),
            steps: self.player.steps(),
            coins: self.player.coins(),
            high_score: self.high_score,
            alive: self.player.is_alive(),
            paused: self.paused,
            death: match self.player.state() {
                PlayerState::Dead(cause) => Some(cause),
                _ => None,
            },
        }
    }

    pub fn tick(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        self.world.tick(dt);

        if self.player.is_alive() {
            self.player.follow_log(&self.world);
        }
        if let Some(step) = self.pending.take() {
            self.apply_step(step);
        }
        if self.player.is_alive() {
            let contacts = self.player.resolve_contacts(&mut self.world);
            if contacts.coins > 0 {
                let total = self.player.coins();
                self.prefs.set_int(COINS_KEY, total as i64);
                for _ in 0..contacts.coins {
                    self.audio.play(AudioCue::CoinPickup);
                }
                self.events.push(GameEvent::CoinCollected { total });
            }
        }

        if self.player.is_alive() {
            self.world.track_player(self.player.lane_index());
            self.camera.follow(self.player.position(), dt);
            if self.player.steps() > self.high_score {
                self.high_score = self.player.steps();
                self.prefs.set_int(HIGH_SCORE_KEY, self.high_score as i64);
            }
        } else if !self.game_over_reported {
            self.finish_run();
        }
        self.camera.tick_zoom(dt);
    }

    fn apply_step(&mut self, step: Step) {
        match self.player.try_move(step, &self.world) {
            MoveOutcome::Moved | MoveOutcome::Mounted(_) | MoveOutcome::Died(_) => {
                self.audio.play(AudioCue::Jump);
                self.events.push(GameEvent::Jumped);
            }
            MoveOutcome::Rejected(reason) => {
                log::trace!("step {:?} rejected: {:?}", step, reason);
            }
        }
    }

    fn finish_run(&mut self) {
        self.game_over_reported = true;
        self.pending = None;
        let cause = match self.player.state() {
            PlayerState::Dead(cause) => cause,
            _ => return,
        };
        let steps = self.player.steps();
        let new_record = steps > self.record_at_start;
        if steps > self.high_score {
            self.high_score = steps;
            self.prefs.set_int(HIGH_SCORE_KEY, steps as i64);
        }

        self.audio.play(AudioCue::Death);
        self.audio.stop(AudioCue::Music);
        self.audio.stop(AudioCue::CarNoise);
        self.camera.begin_game_over(self.player.position());

        self.events.push(GameEvent::Died { cause });
        self.events.push(GameEvent::GameOver { steps, high_score: self.high_score, new_record });
        if new_record {
            log::info!("new high score: {}", steps);
        }
        log::info!("game over after {} steps with {} coins ({:?})", steps, self.player.coins(), cause);
    }
}

fn generate_world(config: &AppConfig, seed: Option<u64>) -> WorldGenerator {
    let rng = match seed.or(config.level.seed) {
        Some(seed) => RandomSource::from_seed(seed),
        None => RandomSource::from_entropy(),
    };
    WorldGenerator::new(config.level.clone(), config.catalogue.clone(), rng)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::game::lane::LaneType;
    use crate::game::prefs::MemoryPrefs;
    use crate::game::audio::SilentAudio;

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<(bool, AudioCue)>>>);

    impl AudioSink for Recorder {
        fn play(&mut self, cue: AudioCue) {
            self.0.borrow_mut().push((true, cue));
        }

        fn stop(&mut self, cue: AudioCue) {
            self.0.borrow_mut().push((false, cue));
        }
    }

    fn scripted_world(config: &AppConfig) -> WorldGenerator {
        let mut world = WorldGenerator::empty(
            config.level.clone(),
            config.catalogue.clone(),
            RandomSource::from_seed(42),
        );
        world.place_lane(0, LaneType::Safe, 1, 1.0);
        world
    }

    #[test]
    fn start_plays_ambience_and_loads_prefs() {
        let recorder = Recorder::default();
        let mut prefs = MemoryPrefs::new();
        prefs.set_int(COINS_KEY, 7);
        prefs.set_int(HIGH_SCORE_KEY, 12);
        let session = Session::new(AppConfig::default(), Some(1), Box::new(prefs), Box::new(recorder.clone()))
            .expect("session");
        assert_eq!(session.player().coins(), 7);
        assert_eq!(session.high_score(), 12);
        assert_eq!(
            *recorder.0.borrow(),
            vec![(true, AudioCue::Music), (true, AudioCue::CarNoise)]
        );
    }

    #[test]
    fn invalid_config_fails_fast() {
        let mut config = AppConfig::default();
        config.catalogue.trees.clear();
        let result = Session::new(config, Some(1), Box::new(MemoryPrefs::new()), Box::new(SilentAudio));
        assert!(matches!(result, Err(ConfigError::EmptyCatalogue("tree"))));
    }

    #[test]
    fn death_reports_game_over_once() {
        let config = AppConfig::default();
        let mut world = scripted_world(&config);
        world.place_lane(1, LaneType::Water, 1, 1.0);
        world.spawn_log(1, 8.0, 2);
        let recorder = Recorder::default();
        let mut session =
            Session::with_world(config, world, Box::new(MemoryPrefs::new()), Box::new(recorder.clone()))
                .expect("session");

        session.queue_step(Step::Forward);
        session.tick(1.0 / 60.0);
        session.tick(1.0 / 60.0);

        let events = session.drain_events();
        assert_eq!(
            events,
            vec![
                GameEvent::Jumped,
                GameEvent::Died { cause: DeathCause::Drowned },
                GameEvent::GameOver { steps: 1, high_score: 1, new_record: true },
            ]
        );
        assert!(session.is_over());
        assert!(recorder.0.borrow().contains(&(true, AudioCue::Death)));
        assert!(recorder.0.borrow().contains(&(false, AudioCue::Music)));
        assert_eq!(session.camera().phase(), crate::game::camera::ZoomPhase::Zooming);
    }

    #[test]
    fn cancel_effects_freezes_zoom() {
        let config = AppConfig::default();
        let mut world = scripted_world(&config);
        world.place_lane(1, LaneType::Water, 1, 1.0);
        let mut session =
            Session::with_world(config, world, Box::new(MemoryPrefs::new()), Box::new(SilentAudio))
                .expect("session");

        session.queue_step(Step::Forward);
        session.tick(1.0 / 60.0);
        session.tick(1.0 / 60.0);
        session.cancel_effects();
        let size = session.camera().ortho_size();
        session.tick(1.0 / 60.0);
        assert_eq!(session.camera().phase(), crate::game::camera::ZoomPhase::Cancelled);
        assert_eq!(session.camera().ortho_size(), size);
    }

    #[test]
    fn coins_and_high_score_persist() {
        let config = AppConfig::default();
        let mut world = scripted_world(&config);
        world.place_lane(1, LaneType::Safe, 1, 1.0);
        world.spawn_coin(1, 0.0);
        let mut session =
            Session::with_world(config, world, Box::new(MemoryPrefs::new()), Box::new(SilentAudio))
                .expect("session");

        session.queue_step(Step::Forward);
        session.tick(1.0 / 60.0);

        assert_eq!(session.player().coins(), 1);
        assert_eq!(session.prefs().get_int(COINS_KEY), Some(1));
        assert_eq!(session.prefs().get_int(HIGH_SCORE_KEY), Some(1));
        assert_eq!(session.high_score(), 1);
        assert_eq!(
            session.drain_events(),
            vec![GameEvent::Jumped, GameEvent::CoinCollected { total: 1 }]
        );
    }

    #[test]
    fn pause_freezes_everything() {
        let config = AppConfig::default();
        let mut world = scripted_world(&config);
        world.place_lane(1, LaneType::Road, 1, 1.0);
        let car = world.spawn_vehicle(1, -5.0, 0).expect("car");
        let mut session =
            Session::with_world(config, world, Box::new(MemoryPrefs::new()), Box::new(SilentAudio))
                .expect("session");

        assert!(session.toggle_pause());
        session.queue_step(Step::Forward);
        session.tick(1.0);
        assert_eq!(session.world().entity(car).unwrap().position.x, -5.0);
        assert_eq!(session.player().position().z, 0.0);

        assert!(!session.toggle_pause());
        session.tick(1.0);
        assert_eq!(session.world().entity(car).unwrap().position.x, -4.0);
    }

    #[test]
    fn restart_resets_run_but_keeps_records() {
        let mut prefs = MemoryPrefs::new();
        prefs.set_int(HIGH_SCORE_KEY, 3);
        let mut session = Session::new(AppConfig::default(), Some(9), Box::new(prefs), Box::new(SilentAudio))
            .expect("session");
        session.restart(Some(10));
        assert_eq!(session.world().seed(), 10);
        assert_eq!(session.high_score(), 3);
        assert!(!session.is_over());
        assert_eq!(session.player().steps(), 0);
    }

    #[test]
    fn reset_saved_progress_clears_store() {
        let mut prefs = MemoryPrefs::new();
        prefs.set_int(HIGH_SCORE_KEY, 30);
        prefs.set_int(COINS_KEY, 30);
        let config = AppConfig::default();
        let mut world = scripted_world(&config);
        world.place_lane(1, LaneType::Safe, 1, 1.0);
        world.spawn_coin(1, 0.0);
        let mut session =
            Session::with_world(config, world, Box::new(prefs), Box::new(SilentAudio)).expect("session");
        assert_eq!(session.player().coins(), 30);

        session.reset_saved_progress();
        assert_eq!(session.high_score(), 0);
        assert_eq!(session.prefs().get_int(COINS_KEY), None);
        assert_eq!(session.summary().coins, 0);

        session.queue_step(Step::Forward);
        session.tick(1.0 / 60.0);
        assert_eq!(session.prefs().get_int(COINS_KEY), Some(1));
        assert_eq!(session.summary().coins, 1);
    }

    #[test]
    fn game_over_zoom_settles_on_death_tile() {
        let config = AppConfig::default();
        let offset = nalgebra::Vector3::from(config.camera.offset);
        let mut world = scripted_world(&config);
        world.place_lane(1, LaneType::Water, 1, 1.0);
        let mut session =
            Session::with_world(config, world, Box::new(MemoryPrefs::new()), Box::new(SilentAudio))
                .expect("session");

        session.queue_step(Step::Forward);
        session.tick(1.0 / 60.0);
        assert!(session.is_over());
        for _ in 0..10_000 {
            session.tick(1.0 / 60.0);
            if session.camera().phase() == crate::game::camera::ZoomPhase::Settled {
                break;
            }
        }
        assert_eq!(session.camera().phase(), crate::game::camera::ZoomPhase::Settled);
        let goal = session.player().position() + offset + nalgebra::Vector3::new(0.0, -1.0, 0.0);
        assert!((session.camera().position() - goal).norm() <= 0.1);
        assert!((session.camera().position().z - (1.0 + offset.z)).abs() <= 0.1);
    }
}
