use nalgebra::Vector3;
use serde::Serialize;

use crate::game::entity::{EntityId, EntityKind};
use crate::game::lane::LaneType;
use crate::game::world::WorldGenerator;

/// Half of the player's footprint along X.
pub const PLAYER_HALF_WIDTH: f32 = 0.35;
const PLAYER_Y: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Forward,
    Left,
    Right,
    Back,
}

impl Step {
    pub fn delta(&self) -> Vector3<f32> {
        match self {
            Step::Forward => Vector3::new(0.0, 0.0, 1.0),
            Step::Left => Vector3::new(-1.0, 0.0, 0.0),
            Step::Right => Vector3::new(1.0, 0.0, 0.0),
            Step::Back => Vector3::new(0.0, 0.0, -1.0),
        }
    }

    /// Yaw in degrees the player turns to when taking this step.
    pub fn facing(&self) -> f32 {
        match self {
            Step::Forward => 0.0,
            Step::Left => -90.0,
            Step::Right => 90.0,
            Step::Back => 180.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DeathCause {
    Drowned,
    HitByVehicle,
    SweptAway,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlayerState {
    Grounded,
    OnLog { log: EntityId, offset: f32 },
    Dead(DeathCause),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveRejection {
    NotAlive,
    OutOfBounds,
    BehindStart,
    UnknownLane,
    Blocked,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MoveOutcome {
    Moved,
    Mounted(EntityId),
    Died(DeathCause),
    Rejected(MoveRejection),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contacts {
    pub coins: u32,
    pub hit_by: Option<EntityId>,
}

pub struct PlayerController {
    position: Vector3<f32>,
    facing: f32,
    coins: u32,
    steps: u32,
    state: PlayerState,
    bounds: f32,
}

impl PlayerController {
    pub fn new(bounds: i32, coins: u32) -> Self {
        PlayerController {
            position: Vector3::new(0.0, PLAYER_Y, 0.0),
            facing: 0.0,
            coins,
            steps: 0,
            state: PlayerState::Grounded,
            bounds: bounds as f32,
        }
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn facing(&self) -> f32 {
        self.facing
    }

    pub fn coins(&self) -> u32 {
        self.coins
    }

    pub fn reset_coins(&mut self) {
        self.coins = 0;
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_alive(&self) -> bool {
        !matches!(self.state, PlayerState::Dead(_))
    }

    pub fn lane_index(&self) -> i32 {
        self.position.z.round() as i32
    }

    pub fn kill(&mut self, cause: DeathCause) {
        if self.is_alive() {
            log::info!("player died at {:?}: {:?}", self.position, cause);
            self.state = PlayerState::Dead(cause);
        }
    }

    /// Keeps a riding player glued to their log. Runs before input each frame.
    pub fn follow_log(&mut self, world: &WorldGenerator) {
        let PlayerState::OnLog { log, offset } = self.state else {
            return;
        };
        let Some(entity) = world.entity(log) else {
            self.kill(DeathCause::Drowned);
            return;
        };
        let x = entity.position.x + offset;
        self.position.x = x;
        if x < -self.bounds || x > self.bounds {
            self.kill(DeathCause::SweptAway);
        }
    }

    pub fn try_move(&mut self, step: Step, world: &WorldGenerator) -> MoveOutcome {
        if !self.is_alive() {
            return MoveOutcome::Rejected(MoveRejection::NotAlive);
        }
        let mut target = self.position + step.delta();
        if target.x <= -self.bounds || target.x >= self.bounds {
            return MoveOutcome::Rejected(MoveRejection::OutOfBounds);
        }
        if target.z < 0.0 {
            return MoveOutcome::Rejected(MoveRejection::BehindStart);
        }
        let lane_index = target.z.round() as i32;
        let Some(lane) = world.lane(lane_index) else {
            return MoveOutcome::Rejected(MoveRejection::UnknownLane);
        };
        if world.obstacle_at(lane_index, target.x).is_some() {
            return MoveOutcome::Rejected(MoveRejection::Blocked);
        }

        if lane.lane_type == LaneType::Water {
            return match world.log_covering(lane_index, target.x) {
                Some(log) => {
                    let Some((log_x, length)) = world.entity(log).and_then(|e| match e.kind {
                        EntityKind::Log { length } => Some((e.position.x, length)),
                        _ => None,
                    }) else {
                        return MoveOutcome::Rejected(MoveRejection::UnknownLane);
                    };
                    let slot = nearest_slot(log_x, length, target.x);
                    target.x = slot;
                    self.state = PlayerState::OnLog { log, offset: slot - log_x };
                    self.commit(target, step);
                    MoveOutcome::Mounted(log)
                }
                None => {
                    self.commit(target, step);
                    self.kill(DeathCause::Drowned);
                    MoveOutcome::Died(DeathCause::Drowned)
                }
            };
        }

        if let PlayerState::OnLog { .. } = self.state {
            target.x = target.x.round();
            if lane.lane_type == LaneType::Safe && world.obstacle_at(lane_index, target.x).is_some() {
                return MoveOutcome::Rejected(MoveRejection::Blocked);
            }
            self.state = PlayerState::Grounded;
        }

        self.commit(target, step);
        MoveOutcome::Moved
    }

    fn commit(&mut self, target: Vector3<f32>, step: Step) {
        self.position = target;
        self.facing = step.facing();
        let z = target.z.round().max(0.0) as u32;
        self.steps = self.steps.max(z);
    }

    /// Picks up coins and checks for vehicles in the player's lane.
    pub fn resolve_contacts(&mut self, world: &mut WorldGenerator) -> Contacts {
        let mut contacts = Contacts::default();
        if !self.is_alive() {
            return contacts;
        }
        let lane = self.lane_index();
        let x = self.position.x;
        for coin in world.coins_touching(lane, x, PLAYER_HALF_WIDTH) {
            if world.collect_coin(coin) {
                self.coins += 1;
                contacts.coins += 1;
            }
        }
        if let Some(&vehicle) = world.vehicles_touching(lane, x, PLAYER_HALF_WIDTH).first() {
            contacts.hit_by = Some(vehicle);
            self.kill(DeathCause::HitByVehicle);
        }
        contacts
    }
}

/// Centre of the log tile closest to `x`. A log of length `n` has `n`
/// unit tiles centred on the log.
fn nearest_slot(log_x: f32, length: f32, x: f32) -> f32 {
    let tiles = length.round().max(1.0);
    let first = log_x - (tiles - 1.0) / 2.0;
    let k = (x - first).round().clamp(0.0, tiles - 1.0);
    first + k
}
