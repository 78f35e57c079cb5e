use nalgebra::Vector3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EntityKind {
    Ground { width: f32 },
    Tree { style: usize },
    Vehicle { style: usize, length: f32 },
    Log { length: f32 },
    Coin,
}

impl EntityKind {
    /// Half of the footprint along X, used for contact tests.
    pub fn half_width(&self) -> f32 {
        match *self {
            EntityKind::Ground { width } => width / 2.0,
            EntityKind::Tree { .. } => 0.4,
            EntityKind::Vehicle { length, .. } => length / 2.0,
            EntityKind::Log { length } => length / 2.0,
            EntityKind::Coin => 0.25,
        }
    }
}

/// Constant-speed horizontal scrolling that wraps at `±bound`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motion {
    pub direction: f32,
    pub speed: f32,
    pub bound: f32,
}

impl Motion {
    pub fn new(direction: i32, speed: f32, bound: f32) -> Self {
        Motion { direction: if direction < 0 { -1.0 } else { 1.0 }, speed, bound }
    }

    pub fn advance(&self, x: f32, dt: f32) -> f32 {
        let x = x + self.direction * self.speed * dt;
        if self.direction < 0.0 && x < -self.bound {
            self.bound
        } else if self.direction > 0.0 && x > self.bound {
            -self.bound
        } else {
            x
        }
    }
}

/// Idle hover + spin for pickups.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bob {
    pub origin_y: f32,
    pub amplitude: f32,
    pub frequency: f32,
    pub spin: f32,
}

impl Bob {
    pub fn coin(origin_y: f32) -> Self {
        Bob { origin_y, amplitude: 0.2, frequency: 1.5, spin: 90.0 }
    }

    pub fn height_at(&self, time: f32) -> f32 {
        self.origin_y + (time * self.frequency).sin() * self.amplitude
    }
}

#[derive(Clone, Debug)]
pub struct Entity {
    pub kind: EntityKind,
    pub position: Vector3<f32>,
    /// Yaw in degrees.
    pub rotation: f32,
    pub motion: Option<Motion>,
    pub bob: Option<Bob>,
}

impl Entity {
    pub fn new(kind: EntityKind, position: Vector3<f32>) -> Self {
        Entity { kind, position, rotation: 0.0, motion: None, bob: None }
    }

    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.rotation = if motion.direction < 0.0 { -90.0 } else { 90.0 };
        self.motion = Some(motion);
        self
    }

    pub fn with_bob(mut self, bob: Bob) -> Self {
        self.bob = Some(bob);
        self
    }

    pub fn update(&mut self, dt: f32, time: f32) {
        if let Some(motion) = self.motion {
            self.position.x = motion.advance(self.position.x, dt);
        }
        if let Some(bob) = self.bob {
            self.position.y = bob.height_at(time);
            self.rotation = (self.rotation + bob.spin * dt) % 360.0;
        }
    }

    pub fn touches(&self, x: f32, half_width: f32) -> bool {
        (self.position.x - x).abs() < self.kind.half_width() + half_width
    }
}

/// Slot storage with stable ids. Removing an entity frees its slot for
/// good; ids are never reused within one arena.
#[derive(Default)]
pub struct Arena {
    slots: Vec<Option<Entity>>,
    live: usize,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.slots.len() as u32);
        self.slots.push(Some(entity));
        self.live += 1;
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let removed = self.slots.get_mut(id.0 as usize).and_then(Option::take);
        if removed.is_some() {
            self.live -= 1;
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}
