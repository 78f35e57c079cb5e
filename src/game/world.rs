use std::collections::HashMap;

use nalgebra::Vector3;

use crate::config::{Catalogue, LevelConfig};
use crate::game::entity::{Arena, Bob, Entity, EntityId, EntityKind, Motion};
use crate::game::lane::{Lane, LaneType};
use crate::game::rng::RandomSource;

const VEHICLE_Y: f32 = 0.1;
const COIN_Y: f32 = 0.5;

/// Owns every lane and every entity in the level. Lanes are generated
/// lazily around the player and are only ever deactivated, never dropped.
pub struct WorldGenerator {
    level: LevelConfig,
    catalogue: Catalogue,
    rng: RandomSource,
    lanes: HashMap<i32, Lane>,
    entities: Arena,
    tracked_z: i32,
    time: f32,
}

impl WorldGenerator {
    /// Builds the generator and the initial lane window around Z = 0.
    pub fn new(level: LevelConfig, catalogue: Catalogue, rng: RandomSource) -> Self {
        let mut world = WorldGenerator {
            level,
            catalogue,
            rng,
            lanes: HashMap::new(),
            entities: Arena::new(),
            tracked_z: 0,
            time: 0.0,
        };
        for index in (-world.level.lanes_behind + 1)..world.level.lanes_ahead {
            world.generate_lane(index);
        }
        log::debug!(
            "world seeded with {} ({} lanes, {} entities)",
            world.rng.seed(),
            world.lanes.len(),
            world.entities.len()
        );
        world
    }

    /// Empty world with no lanes, for building scripted layouts.
    pub fn empty(level: LevelConfig, catalogue: Catalogue, rng: RandomSource) -> Self {
        WorldGenerator {
            level,
            catalogue,
            rng,
            lanes: HashMap::new(),
            entities: Arena::new(),
            tracked_z: 0,
            time: 0.0,
        }
    }

    pub fn level(&self) -> &LevelConfig {
        &self.level
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn lane(&self, index: i32) -> Option<&Lane> {
        self.lanes.get(&index)
    }

    pub fn lanes(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.values()
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Creates lane `index` on first call; later calls only reactivate it.
    pub fn generate_lane(&mut self, index: i32) {
        if let Some(lane) = self.lanes.get_mut(&index) {
            lane.active = true;
            return;
        }

        let lane_type = if index == 0 {
            LaneType::Safe
        } else {
            LaneType::ALL[self.rng.pick_index(LaneType::ALL.len())]
        };
        let direction = if self.rng.coin_flip() { -1 } else { 1 };
        let speed = self.rng.range_f32(self.level.min_speed, self.level.max_speed)
            + self.level.speed_step * index.max(0) as f32;

        self.place_lane(index, lane_type, direction, speed);

        let width = self.level.lane_width;
        let bounds = self.level.player_bounds;
        let mut vehicle_previous = false;
        let mut log_cooldown = 0;

        for slot in -width..width {
            let x = slot as f32;
            match lane_type {
                LaneType::Safe => {
                    let tree = self.rng.chance(self.level.obstacle_frequency);
                    if tree && index != 0 && slot != 0 {
                        let style = self.rng.pick_index(self.catalogue.trees.len());
                        self.spawn_tree(index, x, style);
                    } else if slot > -bounds
                        && slot < bounds
                        && index > 0
                        && self.rng.chance(self.level.collectible_frequency)
                    {
                        self.spawn_coin(index, x);
                    }
                }
                LaneType::Road => {
                    if self.rng.chance(self.level.vehicle_frequency) && !vehicle_previous {
                        vehicle_previous = true;
                        let style = self.rng.pick_index(self.catalogue.vehicles.len());
                        self.spawn_vehicle(index, x, style);
                    } else {
                        vehicle_previous = false;
                    }
                }
                LaneType::Water => {
                    if self.rng.chance(self.level.log_frequency) && log_cooldown <= 0 {
                        let length = self.rng.range_i32(self.level.log_length_min, self.level.log_length_max);
                        log_cooldown = length + self.level.log_gap;
                        self.spawn_log(index, x, length);
                    } else if log_cooldown > 0 {
                        log_cooldown -= 1;
                    }
                }
            }
        }

        // Every road and river must be crossable.
        let empty_traffic = self
            .lanes
            .get(&index)
            .map_or(false, |lane| lane.lane_type.is_traffic() && lane.vehicles.is_empty());
        if empty_traffic {
            match lane_type {
                LaneType::Road => {
                    let style = self.rng.pick_index(self.catalogue.vehicles.len());
                    self.spawn_vehicle(index, 0.0, style);
                }
                LaneType::Water => {
                    let length = self.rng.range_i32(self.level.log_length_min, self.level.log_length_max);
                    self.spawn_log(index, 0.0, length);
                }
                LaneType::Safe => {}
            }
        }

        if let Some(lane) = self.lanes.get(&index) {
            log::debug!(
                "lane {} {:?} dir {} speed {:.2}: {} obstacles, {} movers, {} coins",
                index,
                lane.lane_type,
                lane.direction,
                lane.speed,
                lane.obstacles.len(),
                lane.vehicles.len(),
                lane.collectibles.len()
            );
        }
    }

    /// Inserts an empty lane with its ground tile, replacing nothing if the
    /// index already exists.
    pub fn place_lane(&mut self, index: i32, lane_type: LaneType, direction: i32, speed: f32) -> bool {
        if self.lanes.contains_key(&index) {
            return false;
        }
        let width = (self.level.lane_width * 2) as f32;
        let ground = self.entities.insert(Entity::new(
            EntityKind::Ground { width },
            Vector3::new(-0.5, 0.0, index as f32),
        ));
        let mut lane = Lane::new(index, lane_type, direction, speed);
        lane.ground = Some(ground);
        self.lanes.insert(index, lane);
        true
    }

    pub fn spawn_tree(&mut self, lane: i32, x: f32, style: usize) -> Option<EntityId> {
        let lane_ref = self.lanes.get_mut(&lane)?;
        let id = self.entities.insert(Entity::new(
            EntityKind::Tree { style },
            Vector3::new(x, 0.0, lane as f32),
        ));
        lane_ref.obstacles.push(id);
        Some(id)
    }

    pub fn spawn_vehicle(&mut self, lane: i32, x: f32, style: usize) -> Option<EntityId> {
        let length = self.catalogue.vehicles.get(style).map_or(1.0, |s| s.length);
        let bound = self.level.lane_width as f32;
        let lane_ref = self.lanes.get_mut(&lane)?;
        let motion = Motion::new(lane_ref.direction, lane_ref.speed, bound);
        let id = self.entities.insert(
            Entity::new(EntityKind::Vehicle { style, length }, Vector3::new(x, VEHICLE_Y, lane as f32))
                .with_motion(motion),
        );
        lane_ref.vehicles.push(id);
        Some(id)
    }

    pub fn spawn_log(&mut self, lane: i32, x: f32, length: i32) -> Option<EntityId> {
        let bound = self.level.lane_width as f32;
        let lane_ref = self.lanes.get_mut(&lane)?;
        let motion = Motion::new(lane_ref.direction, lane_ref.speed, bound);
        let mut log = Entity::new(EntityKind::Log { length: length as f32 }, Vector3::new(x, 0.0, lane as f32))
            .with_motion(motion);
        // Logs lie across the lane; they don't turn to face their heading.
        log.rotation = 0.0;
        let id = self.entities.insert(log);
        lane_ref.vehicles.push(id);
        Some(id)
    }

    pub fn spawn_coin(&mut self, lane: i32, x: f32) -> Option<EntityId> {
        let lane_ref = self.lanes.get_mut(&lane)?;
        let id = self.entities.insert(
            Entity::new(EntityKind::Coin, Vector3::new(x, COIN_Y, lane as f32)).with_bob(Bob::coin(COIN_Y)),
        );
        lane_ref.collectibles.push(id);
        Some(id)
    }

    /// Removes a coin from its lane and the arena. Returns false if it was
    /// already gone.
    pub fn collect_coin(&mut self, id: EntityId) -> bool {
        let lane_index = match self.entities.get(id) {
            Some(entity) if entity.kind == EntityKind::Coin => entity.position.z.round() as i32,
            _ => return false,
        };
        if let Some(lane) = self.lanes.get_mut(&lane_index) {
            lane.collectibles.retain(|&c| c != id);
        }
        self.entities.remove(id).is_some()
    }

    pub fn deactivate_lane(&mut self, index: i32) -> bool {
        match self.lanes.get_mut(&index) {
            Some(lane) => {
                lane.active = false;
                true
            }
            None => false,
        }
    }

    /// Slides the lane window one step at a time until it is centred on `z`.
    pub fn track_player(&mut self, z: i32) {
        let ahead = self.level.lanes_ahead;
        let behind = self.level.lanes_behind;
        while self.tracked_z < z {
            self.tracked_z += 1;
            let step = self.tracked_z;
            self.deactivate_lane(step - behind);
            self.generate_lane(step + ahead - 1);
        }
        while self.tracked_z > z {
            self.tracked_z -= 1;
            let step = self.tracked_z;
            self.deactivate_lane(step + ahead);
            self.generate_lane(step - behind + 1);
        }
    }

    /// Advances moving and animated entities in active lanes.
    pub fn tick(&mut self, dt: f32) {
        self.time += dt;
        let time = self.time;
        for lane in self.lanes.values().filter(|lane| lane.active) {
            for id in lane.vehicles.iter().chain(&lane.collectibles) {
                if let Some(entity) = self.entities.get_mut(*id) {
                    entity.update(dt, time);
                }
            }
        }
    }

    pub fn obstacle_at(&self, lane: i32, x: f32) -> Option<EntityId> {
        let column = x.round();
        self.lane(lane)?
            .obstacles
            .iter()
            .copied()
            .find(|&id| self.entities.get(id).map_or(false, |e| e.position.x == column))
    }

    /// The first log in `lane` whose span contains `x`.
    pub fn log_covering(&self, lane: i32, x: f32) -> Option<EntityId> {
        self.lane(lane)?.vehicles.iter().copied().find(|&id| match self.entities.get(id) {
            Some(Entity { kind: EntityKind::Log { length }, position, .. }) => {
                (position.x - x).abs() <= length / 2.0
            }
            _ => false,
        })
    }

    pub fn vehicles_touching(&self, lane: i32, x: f32, half_width: f32) -> Vec<EntityId> {
        self.touching(lane, x, half_width, |lane| &lane.vehicles, |kind| {
            matches!(kind, EntityKind::Vehicle { .. })
        })
    }

    pub fn coins_touching(&self, lane: i32, x: f32, half_width: f32) -> Vec<EntityId> {
        self.touching(lane, x, half_width, |lane| &lane.collectibles, |kind| *kind == EntityKind::Coin)
    }

    fn touching(
        &self,
        lane: i32,
        x: f32,
        half_width: f32,
        list: impl Fn(&Lane) -> &Vec<EntityId>,
        wanted: impl Fn(&EntityKind) -> bool,
    ) -> Vec<EntityId> {
        let Some(lane) = self.lane(lane) else {
            return Vec::new();
        };
        list(lane)
            .iter()
            .copied()
            .filter(|&id| {
                self.entities
                    .get(id)
                    .map_or(false, |e| wanted(&e.kind) && e.touches(x, half_width))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world(seed: u64) -> WorldGenerator {
        WorldGenerator::new(LevelConfig::default(), Catalogue::default(), RandomSource::from_seed(seed))
    }

    #[test]
    fn initial_window_spans_behind_and_ahead() {
        let world = world(1);
        let level = LevelConfig::default();
        assert_eq!(world.lane_count() as i32, level.lanes_ahead + level.lanes_behind - 1);
        assert!(world.lane(-level.lanes_behind + 1).is_some());
        assert!(world.lane(level.lanes_ahead - 1).is_some());
        assert!(world.lane(level.lanes_ahead).is_none());
        assert!(world.lane(-level.lanes_behind).is_none());
    }

    #[test]
    fn lane_zero_is_safe_and_clear() {
        for seed in 0..20 {
            let world = world(seed);
            let lane = world.lane(0).expect("lane 0");
            assert_eq!(lane.lane_type, LaneType::Safe);
            assert!(lane.obstacles.is_empty());
            assert!(lane.collectibles.is_empty());
        }
    }

    #[test]
    fn start_column_never_blocked() {
        for seed in 0..20 {
            let world = world(seed);
            for lane in world.lanes() {
                assert!(world.obstacle_at(lane.index, 0.0).is_none(), "seed {seed} lane {}", lane.index);
            }
        }
    }

    #[test]
    fn traffic_lanes_always_have_movers() {
        for seed in 0..30 {
            let world = world(seed);
            for lane in world.lanes().filter(|l| l.lane_type.is_traffic()) {
                assert!(!lane.vehicles.is_empty(), "seed {seed} lane {}", lane.index);
            }
        }
    }

    #[test]
    fn regeneration_only_reactivates() {
        let mut world = world(5);
        let before = world.lane(7).cloned().expect("lane 7");
        let entities = world.entity_count();
        world.deactivate_lane(7);
        assert!(!world.lane(7).map_or(true, |l| l.active));

        world.generate_lane(7);
        let again = world.lane(7).cloned().expect("lane 7");
        assert!(again.active);
        assert_eq!(again.lane_type, before.lane_type);
        assert_eq!(again.direction, before.direction);
        assert_eq!(again.speed, before.speed);
        assert_eq!(again.vehicles, before.vehicles);
        assert_eq!(world.entity_count(), entities);
    }

    #[test]
    fn coins_only_inside_player_bounds_on_forward_safe_lanes() {
        let mut level = LevelConfig::default();
        level.collectible_frequency = 1.0;
        level.obstacle_frequency = 0.0;
        let world = WorldGenerator::new(level.clone(), Catalogue::default(), RandomSource::from_seed(11));
        for lane in world.lanes() {
            if lane.lane_type != LaneType::Safe || lane.index <= 0 {
                assert!(lane.collectibles.is_empty());
                continue;
            }
            assert_eq!(lane.collectibles.len() as i32, level.player_bounds * 2 - 1);
            for &id in &lane.collectibles {
                let x = world.entity(id).expect("coin").position.x;
                assert!(x.abs() < level.player_bounds as f32);
            }
        }
    }

    #[test]
    fn vehicles_never_in_adjacent_slots_at_spawn() {
        let mut level = LevelConfig::default();
        level.vehicle_frequency = 1.0;
        let world = WorldGenerator::new(level, Catalogue::default(), RandomSource::from_seed(3));
        for lane in world.lanes().filter(|l| l.lane_type == LaneType::Road) {
            let mut xs: Vec<f32> = lane
                .vehicles
                .iter()
                .filter_map(|&id| world.entity(id).map(|e| e.position.x))
                .collect();
            xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
            assert_eq!(xs.len(), 10);
            for pair in xs.windows(2) {
                assert!(pair[1] - pair[0] >= 2.0);
            }
        }
    }

    #[test]
    fn log_cooldown_spaces_logs_by_length_and_gap() {
        let mut level = LevelConfig::default();
        level.log_frequency = 1.0;
        level.log_length_min = 3;
        level.log_length_max = 3;
        level.log_gap = 2;
        let world = WorldGenerator::new(level, Catalogue::default(), RandomSource::from_seed(8));
        for lane in world.lanes().filter(|l| l.lane_type == LaneType::Water) {
            let xs: Vec<f32> = lane
                .vehicles
                .iter()
                .filter_map(|&id| world.entity(id).map(|e| e.position.x))
                .collect();
            assert_eq!(xs, vec![-10.0, -4.0, 2.0, 8.0]);
        }
    }

    #[test]
    fn forward_tracking_slides_window() {
        let mut world = world(2);
        let level = LevelConfig::default();
        world.track_player(1);
        assert!(!world.lane(1 - level.lanes_behind).map_or(true, |l| l.active));
        assert!(world.lane(level.lanes_ahead).map_or(false, |l| l.active));

        world.track_player(0);
        assert!(!world.lane(level.lanes_ahead).map_or(true, |l| l.active));
        assert!(world.lane(1 - level.lanes_behind).map_or(false, |l| l.active));
    }

    #[test]
    fn multi_step_tracking_generates_every_lane() {
        let mut world = world(4);
        world.track_player(15);
        let level = LevelConfig::default();
        for index in 15..(15 + level.lanes_ahead) {
            assert!(world.lane(index).map_or(false, |l| l.active), "lane {index}");
        }
        assert!(!world.lane(15 - level.lanes_behind).map_or(true, |l| l.active));
    }

    #[test]
    fn inactive_lanes_are_frozen() {
        let level = LevelConfig::default();
        let mut world = WorldGenerator::empty(level, Catalogue::default(), RandomSource::from_seed(0));
        world.place_lane(1, LaneType::Road, 1, 1.0);
        let car = world.spawn_vehicle(1, 0.0, 0).expect("car");
        world.tick(0.5);
        assert!((world.entity(car).unwrap().position.x - 0.5).abs() < 1e-6);
        world.deactivate_lane(1);
        world.tick(0.5);
        assert!((world.entity(car).unwrap().position.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn queries_on_unknown_lanes_are_empty() {
        let world = world(0);
        assert!(world.obstacle_at(999, 0.0).is_none());
        assert!(world.log_covering(999, 0.0).is_none());
        assert!(world.vehicles_touching(999, 0.0, 0.5).is_empty());
    }

    #[test]
    fn collecting_twice_is_a_no_op() {
        let mut world = WorldGenerator::empty(LevelConfig::default(), Catalogue::default(), RandomSource::from_seed(0));
        world.place_lane(2, LaneType::Safe, 1, 1.0);
        let coin = world.spawn_coin(2, 1.0).expect("coin");
        assert!(world.collect_coin(coin));
        assert!(!world.collect_coin(coin));
        assert!(world.lane(2).unwrap().collectibles.is_empty());
    }

    #[test]
    fn speed_grows_with_lane_index() {
        let mut level = LevelConfig::default();
        level.min_speed = 1.0;
        level.max_speed = 1.0;
        level.speed_step = 0.1;
        let world = WorldGenerator::new(level, Catalogue::default(), RandomSource::from_seed(0));
        assert!((world.lane(10).unwrap().speed - 2.0).abs() < 1e-5);
        assert!((world.lane(-3).unwrap().speed - 1.0).abs() < 1e-5);
    }
}
