pub mod audio;
pub mod camera;
pub mod entity;
pub mod lane;
pub mod player;
pub mod prefs;
pub mod rng;
pub mod session;
pub mod world;

use nalgebra::{Matrix4, Orthographic3, Point3, Vector3};
use wasm_bindgen::JsValue;

use crate::engine::mesh::Mesh;
use crate::engine::renderer::{GpuMesh, Renderer};
use crate::game::entity::{Entity, EntityKind};
use crate::game::lane::{Lane, LaneType};
use crate::game::player::PlayerState;
use crate::game::session::Session;

const SKY: [f32; 3] = [0.55, 0.8, 0.95];
const GAME_OVER_SKY: [f32; 3] = [0.8, 0.1, 0.1];
const GRASS: [f32; 3] = [0.45, 0.75, 0.3];
const GRASS_ALT: [f32; 3] = [0.4, 0.7, 0.27];
const ASPHALT: [f32; 3] = [0.3, 0.3, 0.32];
const WATER: [f32; 3] = [0.25, 0.55, 0.9];
const LOG_BROWN: [f32; 3] = [0.45, 0.28, 0.12];
const GOLD: [f32; 3] = [1.0, 0.84, 0.0];
const PLAYER: [f32; 3] = [0.98, 0.98, 0.95];
const PLAYER_DEAD: [f32; 3] = [1.0, 0.2, 0.2];

/// A session wired to the WebGL renderer.
pub struct Game {
    pub session: Session,
    renderer: Renderer,
    car_model: Option<GpuMesh>,
    voxel_cars: Vec<GpuMesh>,
}

impl Game {
    pub fn new(renderer: Renderer, session: Session, car_mesh: Option<Mesh>) -> Result<Self, JsValue> {
        let car_model = match car_mesh {
            Some(mesh) => Some(renderer.upload(&mesh)?),
            None => None,
        };
        let voxel_cars = session
            .world()
            .catalogue()
            .vehicles
            .iter()
            .map(|style| renderer.upload(&Mesh::voxel_car(style.color)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Game { session, renderer, car_model, voxel_cars })
    }

    pub fn update(&mut self, dt: f32) {
        self.session.tick(dt);
    }

    pub fn render(&self) {
        let session = &self.session;
        let over = session.is_over();

        self.renderer.clear(if over { GAME_OVER_SKY } else { SKY });
        self.renderer.enable_depth_test();
        self.renderer.set_tint(if over { [1.0, 0.85, 0.85] } else { [1.0, 1.0, 1.0] });
        self.renderer.set_vignette(session.camera().vignette());

        let Some((width, height)) = self.renderer.fit_canvas() else {
            return;
        };
        let view_projection = self.view_projection(width as f32 / height.max(1) as f32);

        let world = session.world();
        for lane in world.lanes().filter(|lane| lane.active) {
            self.draw_lane(lane, &view_projection);
            for id in lane.entity_ids() {
                if let Some(entity) = world.entity(id) {
                    self.draw_entity(entity, &view_projection);
                }
            }
        }
        self.draw_player(&view_projection);
    }

    fn view_projection(&self, aspect: f32) -> Matrix4<f32> {
        let camera = self.session.camera();
        let eye = camera.position();
        let target = eye - camera.offset();
        let view = Matrix4::look_at_rh(&Point3::from(eye), &Point3::from(target), &Vector3::y());

        let half_h = camera.ortho_size();
        let half_w = half_h * aspect;
        let projection = Orthographic3::new(-half_w, half_w, -half_h, half_h, 0.1, 100.0).to_homogeneous();

        // look_at_rh puts world +X on the left when looking down +Z
        let mirror = Matrix4::new_nonuniform_scaling(&Vector3::new(-1.0, 1.0, 1.0));
        mirror * projection * view
    }

    fn draw_lane(&self, lane: &Lane, vp: &Matrix4<f32>) {
        let width = (self.session.world().level().lane_width * 2) as f32;
        let z = lane.index as f32;
        let color = match lane.lane_type {
            LaneType::Safe if lane.index % 2 == 0 => GRASS,
            LaneType::Safe => GRASS_ALT,
            LaneType::Road => ASPHALT,
            LaneType::Water => WATER,
        };
        let top = if lane.lane_type == LaneType::Water { -0.15 } else { 0.0 };
        self.renderer.draw_cube(
            Vector3::new(-0.5, top - 0.25, z),
            Vector3::new(width, 0.5, 1.0),
            color,
            vp,
        );

        match lane.lane_type {
            LaneType::Road => {
                for x in (-(width as i32) / 2..(width as i32) / 2).step_by(3) {
                    self.renderer.draw_cube(
                        Vector3::new(x as f32, 0.01, z + 0.48),
                        Vector3::new(1.2, 0.02, 0.05),
                        [0.85, 0.85, 0.5],
                        vp,
                    );
                }
            }
            LaneType::Water => {
                let time = self.session.world().time();
                for i in 0..6 {
                    let drift = (time * 0.8 + i as f32 * 1.7 + z).sin() * 0.3;
                    let x = -9.0 + i as f32 * 3.3 + drift;
                    self.renderer.draw_cube(
                        Vector3::new(x, top + 0.01, z + ((i % 3) as f32 - 1.0) * 0.25),
                        Vector3::new(0.8, 0.02, 0.08),
                        [0.6, 0.8, 1.0],
                        vp,
                    );
                }
            }
            LaneType::Safe => {}
        }
    }

    fn draw_entity(&self, entity: &Entity, vp: &Matrix4<f32>) {
        let pos = entity.position;
        let catalogue = self.session.world().catalogue();
        match entity.kind {
            EntityKind::Ground { .. } => {}
            EntityKind::Tree { style } => {
                let Some(style) = catalogue.trees.get(style) else {
                    return;
                };
                self.renderer.draw_cube(
                    Vector3::new(pos.x, 0.2, pos.z),
                    Vector3::new(0.25, 0.4, 0.25),
                    [0.45, 0.3, 0.15],
                    vp,
                );
                self.renderer.draw_cube(
                    Vector3::new(pos.x, 0.4 + style.height / 2.0, pos.z),
                    Vector3::new(0.75, style.height, 0.75),
                    style.color,
                    vp,
                );
            }
            EntityKind::Vehicle { style, length } => self.draw_vehicle(entity, style, length, vp),
            EntityKind::Log { length } => {
                self.renderer.draw_cube(
                    Vector3::new(pos.x, -0.05, pos.z),
                    Vector3::new(length, 0.2, 0.8),
                    LOG_BROWN,
                    vp,
                );
            }
            EntityKind::Coin => {
                let model = Matrix4::new_translation(&pos)
                    * Matrix4::from_euler_angles(0.0, entity.rotation.to_radians(), 0.0)
                    * Matrix4::new_nonuniform_scaling(&Vector3::new(0.4, 0.4, 0.1));
                self.renderer.draw(self.unit_cube(), &model, Some(GOLD), vp);
            }
        }
    }

    fn draw_vehicle(&self, entity: &Entity, style: usize, length: f32, vp: &Matrix4<f32>) {
        let pos = entity.position;
        let yaw = entity.rotation.to_radians();
        if let Some(mesh) = &self.car_model {
            let model_config = &self.session.config().car_model;
            let scale = model_config.scale;
            let model = Matrix4::new_translation(&Vector3::new(pos.x, pos.y + model_config.position_offset_y, pos.z))
                * Matrix4::from_euler_angles(
                    model_config.rotation_offset_x,
                    yaw + model_config.rotation_offset_y,
                    model_config.rotation_offset_z,
                )
                * Matrix4::new_scaling(scale);
            self.renderer.draw(mesh, &model, None, vp);
        } else if let Some(mesh) = self.voxel_cars.get(style) {
            let model = Matrix4::new_translation(&Vector3::new(pos.x, pos.y + 0.3, pos.z))
                * Matrix4::from_euler_angles(0.0, yaw, 0.0)
                * Matrix4::new_nonuniform_scaling(&Vector3::new(1.4, 1.4, length));
            self.renderer.draw(mesh, &model, None, vp);
        }
    }

    fn draw_player(&self, vp: &Matrix4<f32>) {
        let player = self.session.player();
        let dead = matches!(player.state(), PlayerState::Dead(_));
        let pos = player.position();
        let model = Matrix4::new_translation(&Vector3::new(pos.x, pos.y + 0.3, pos.z))
            * Matrix4::from_euler_angles(0.0, player.facing().to_radians(), 0.0)
            * Matrix4::new_nonuniform_scaling(&Vector3::new(0.6, if dead { 0.15 } else { 0.6 }, 0.6));
        self.renderer.draw(self.unit_cube(), &model, Some(if dead { PLAYER_DEAD } else { PLAYER }), vp);
        if !dead {
            // beak
            let beak = Matrix4::new_translation(&Vector3::new(pos.x, pos.y + 0.4, pos.z))
                * Matrix4::from_euler_angles(0.0, player.facing().to_radians(), 0.0)
                * Matrix4::new_translation(&Vector3::new(0.0, 0.0, 0.35))
                * Matrix4::new_nonuniform_scaling(&Vector3::new(0.15, 0.1, 0.15));
            self.renderer.draw(self.unit_cube(), &beak, Some([1.0, 0.6, 0.1]), vp);
        }
    }

    fn unit_cube(&self) -> &GpuMesh {
        self.renderer.unit_cube()
    }
}
