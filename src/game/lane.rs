use crate::game::entity::EntityId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LaneType {
    Safe,
    Road,
    Water,
}

impl LaneType {
    pub const ALL: [LaneType; 3] = [LaneType::Safe, LaneType::Road, LaneType::Water];

    /// Road and water lanes must always carry something that moves.
    pub fn is_traffic(&self) -> bool {
        matches!(self, LaneType::Road | LaneType::Water)
    }
}

/// One row of the world at a fixed Z. Holds ids into the world's entity
/// arena, never the entities themselves.
#[derive(Clone, Debug)]
pub struct Lane {
    pub index: i32,
    pub lane_type: LaneType,
    pub direction: i32,
    pub speed: f32,
    pub ground: Option<EntityId>,
    pub obstacles: Vec<EntityId>,
    pub vehicles: Vec<EntityId>,
    pub collectibles: Vec<EntityId>,
    pub active: bool,
}

impl Lane {
    pub fn new(index: i32, lane_type: LaneType, direction: i32, speed: f32) -> Self {
        Lane {
            index,
            lane_type,
            direction,
            speed,
            ground: None,
            obstacles: Vec::new(),
            vehicles: Vec::new(),
            collectibles: Vec::new(),
            active: true,
        }
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.ground
            .iter()
            .chain(&self.obstacles)
            .chain(&self.vehicles)
            .chain(&self.collectibles)
            .copied()
    }
}
