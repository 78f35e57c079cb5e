use nalgebra::Vector3;

use crate::config::CameraConfig;

/// Convergence threshold of the game-over zoom.
const ZOOM_EPSILON: f32 = 0.1;
const REFERENCE_FPS: f32 = 60.0;

/// Turns a per-frame lerp factor into one for an arbitrary `dt`.
fn frame_lerp(t: f32, dt: f32) -> f32 {
    1.0 - (1.0 - t).powf(dt * REFERENCE_FPS)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ZoomOut {
    goal_position: Vector3<f32>,
    goal_size: f32,
    goal_vignette: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ZoomPhase {
    Following,
    Zooming,
    Settled,
    Cancelled,
}

/// Forward-axis follow camera with a cosmetic zoom-in on game over.
pub struct CameraRig {
    position: Vector3<f32>,
    offset: Vector3<f32>,
    smoothing: f32,
    zoom_rate: f32,
    ortho_size: f32,
    base_ortho_size: f32,
    vignette: f32,
    last_target: Vector3<f32>,
    zoom: Option<ZoomOut>,
    phase: ZoomPhase,
}

impl CameraRig {
    pub fn new(config: &CameraConfig, target: Vector3<f32>) -> Self {
        let offset = Vector3::from(config.offset);
        CameraRig {
            position: target + offset,
            offset,
            smoothing: config.smoothing,
            zoom_rate: config.zoom_rate,
            ortho_size: config.ortho_size,
            base_ortho_size: config.ortho_size,
            vignette: config.vignette,
            last_target: target,
            zoom: None,
            phase: ZoomPhase::Following,
        }
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn offset(&self) -> Vector3<f32> {
        self.offset
    }

    pub fn ortho_size(&self) -> f32 {
        self.ortho_size
    }

    pub fn vignette(&self) -> f32 {
        self.vignette
    }

    pub fn phase(&self) -> ZoomPhase {
        self.phase
    }

    /// Follow lerp factor; the 0..1 slider maps onto 0.105..0.05.
    pub fn follow_factor(&self) -> f32 {
        0.105 - self.smoothing.clamp(0.0, 1.0) * 0.055
    }

    /// Eases the forward axis toward the target. Ignored once the zoom has
    /// started.
    pub fn follow(&mut self, target: Vector3<f32>, dt: f32) {
        if self.phase != ZoomPhase::Following {
            return;
        }
        let goal = target + self.offset;
        self.position.z = lerp(self.position.z, goal.z, frame_lerp(self.follow_factor(), dt));
        self.last_target = target;
    }

    /// Starts zooming in on `target`, the player's final position.
    pub fn begin_game_over(&mut self, target: Vector3<f32>) {
        if self.phase != ZoomPhase::Following {
            return;
        }
        self.last_target = target;
        self.zoom = Some(ZoomOut {
            goal_position: self.last_target + self.offset + Vector3::new(0.0, -1.0, 0.0),
            goal_size: self.base_ortho_size * 0.5,
            goal_vignette: self.vignette * 1.2,
        });
        self.phase = ZoomPhase::Zooming;
    }

    pub fn cancel_zoom(&mut self) {
        if self.phase == ZoomPhase::Zooming {
            self.zoom = None;
            self.phase = ZoomPhase::Cancelled;
        }
    }

    /// Advances the game-over zoom by one step. Returns true while still running.
    pub fn tick_zoom(&mut self, dt: f32) -> bool {
        let Some(zoom) = self.zoom else {
            return false;
        };
        let t = frame_lerp(self.zoom_rate, dt);
        self.ortho_size = lerp(self.ortho_size, zoom.goal_size, t);
        self.vignette = lerp(self.vignette, zoom.goal_vignette, t);
        self.position = self.position.lerp(&zoom.goal_position, t);

        let settled = (self.position - zoom.goal_position).norm() <= ZOOM_EPSILON
            && (self.ortho_size - zoom.goal_size).abs() <= ZOOM_EPSILON
            && (self.vignette - zoom.goal_vignette).abs() <= ZOOM_EPSILON;
        if settled {
            self.zoom = None;
            self.phase = ZoomPhase::Settled;
        }
        !settled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> CameraRig {
        CameraRig::new(&CameraConfig::default(), Vector3::zeros())
    }

    #[test]
    fn follow_factor_spans_slider() {
        let mut rig = rig();
        rig.smoothing = 0.0;
        assert!((rig.follow_factor() - 0.105).abs() < 1e-6);
        rig.smoothing = 1.0;
        assert!((rig.follow_factor() - 0.05).abs() < 1e-6);
        rig.smoothing = 7.0;
        assert!((rig.follow_factor() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn follow_moves_only_forward_axis() {
        let mut rig = rig();
        let start = rig.position();
        rig.follow(Vector3::new(4.0, 0.0, 10.0), 1.0 / 60.0);
        let pos = rig.position();
        assert_eq!(pos.x, start.x);
        assert_eq!(pos.y, start.y);
        let expected = start.z + (10.0 + rig.offset().z - start.z) * 0.0775;
        assert!((pos.z - expected).abs() < 1e-4);
    }

    #[test]
    fn follow_converges() {
        let mut rig = rig();
        let target = Vector3::new(0.0, 0.0, 5.0);
        for _ in 0..600 {
            rig.follow(target, 1.0 / 60.0);
        }
        assert!((rig.position().z - (5.0 + rig.offset().z)).abs() < 1e-3);
    }

    #[test]
    fn game_over_zoom_settles_on_targets() {
        let mut rig = rig();
        rig.follow(Vector3::new(0.0, 0.0, 3.0), 1.0 / 60.0);
        rig.begin_game_over(Vector3::new(0.0, 0.0, 3.0));
        assert_eq!(rig.phase(), ZoomPhase::Zooming);
        let mut frames = 0;
        while rig.tick_zoom(1.0 / 60.0) {
            frames += 1;
            assert!(frames < 10_000, "zoom never settled");
        }
        assert_eq!(rig.phase(), ZoomPhase::Settled);
        let config = CameraConfig::default();
        assert!((rig.ortho_size() - config.ortho_size * 0.5).abs() <= 0.1);
        assert!(rig.vignette() > config.vignette);
        let goal = Vector3::new(0.0, 0.0, 3.0) + Vector3::from(config.offset) + Vector3::new(0.0, -1.0, 0.0);
        assert!((rig.position() - goal).norm() <= 0.1);
        assert!(!rig.tick_zoom(1.0 / 60.0));
    }

    #[test]
    fn cancelling_keeps_partial_progress() {
        let mut rig = rig();
        rig.begin_game_over(Vector3::zeros());
        for _ in 0..10 {
            rig.tick_zoom(1.0 / 60.0);
        }
        let size = rig.ortho_size();
        rig.cancel_zoom();
        assert_eq!(rig.phase(), ZoomPhase::Cancelled);
        assert!(!rig.tick_zoom(1.0 / 60.0));
        assert_eq!(rig.ortho_size(), size);
        assert!(size < CameraConfig::default().ortho_size);
    }

    #[test]
    fn zoom_aims_at_final_position_not_last_followed() {
        let mut rig = rig();
        rig.follow(Vector3::new(0.0, 0.0, 0.0), 1.0 / 60.0);
        rig.begin_game_over(Vector3::new(1.0, 0.0, 1.0));
        while rig.tick_zoom(1.0 / 60.0) {}
        let goal = Vector3::new(1.0, 0.0, 1.0) + rig.offset() + Vector3::new(0.0, -1.0, 0.0);
        assert!((rig.position() - goal).norm() <= 0.1);
    }

    #[test]
    fn follow_stops_after_game_over() {
        let mut rig = rig();
        rig.begin_game_over(Vector3::zeros());
        let z = rig.position().z;
        rig.follow(Vector3::new(0.0, 0.0, 50.0), 1.0);
        assert_eq!(rig.position().z, z);
    }
}
