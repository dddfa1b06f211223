//! Camera, projection and orbit controls.
//!
//! The projection parameters (aspect, fov, near/far) are only ever written by
//! the viewport on resize; the view parameters (position, yaw, pitch) are
//! driven by [`OrbitControls`] during the tick sweep.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use instant::Duration;

use crate::frame::{FrameState, Updatable};

/// Pitch limit just shy of straight up/down to keep the view basis stable.
const MAX_ELEVATION: f32 = 1.54;

/// Perspective projection parameters.
#[derive(Clone, Debug)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    /// Recompute the aspect ratio. Callers guard against zero extents; see
    /// [`crate::world::Viewport`].
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// View state plus projection.
#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
    pub projection: Projection,
}

impl Camera {
    pub fn new<Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: Point3<f32>,
        yaw: Y,
        pitch: P,
        projection: Projection,
    ) -> Self {
        Self {
            position,
            yaw: yaw.into(),
            pitch: pitch.into(),
            projection,
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        Matrix4::look_to_rh(
            self.position,
            Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw).normalize(),
            Vector3::unit_y(),
        )
    }
}

/// Damped orbit around a fixed look-at target, fed from the per-frame mouse
/// deltas carried by the frame input state.
///
/// Velocities decay exponentially so a released drag coasts to a stop. The
/// integration is scaled by the elapsed time, keeping the feel independent of
/// the display refresh rate.
pub struct OrbitControls {
    target: Point3<f32>,
    distance: f32,
    azimuth: Rad<f32>,
    elevation: Rad<f32>,
    azimuth_vel: f32,
    elevation_vel: f32,
    sensitivity: f32,
    damping: f32,
}

impl OrbitControls {
    pub fn new(target: Point3<f32>, distance: f32) -> Self {
        Self {
            target,
            distance,
            azimuth: Rad(std::f32::consts::FRAC_PI_2),
            elevation: Rad(0.4),
            azimuth_vel: 0.0,
            elevation_vel: 0.0,
            sensitivity: 0.01,
            damping: 6.0,
        }
    }

    /// Write the orbit pose through to the camera: position on the orbit
    /// sphere, yaw/pitch facing the target.
    fn apply(&self, camera: &mut Camera) {
        let (sin_az, cos_az) = self.azimuth.0.sin_cos();
        let (sin_el, cos_el) = self.elevation.0.sin_cos();
        let offset = Vector3::new(cos_el * cos_az, sin_el, cos_el * sin_az) * self.distance;
        camera.position = self.target + offset;
        camera.yaw = self.azimuth + Rad(std::f32::consts::PI);
        camera.pitch = -self.elevation;
    }
}

impl Updatable for OrbitControls {
    fn tick(&mut self, frame: &mut FrameState<'_>, dt: Duration) -> anyhow::Result<()> {
        let dt = dt.as_secs_f32();
        if frame.input.orbiting {
            let (dx, dy) = frame.input.mouse_delta;
            self.azimuth_vel += dx as f32 * self.sensitivity;
            self.elevation_vel += dy as f32 * self.sensitivity;
        }
        self.azimuth += Rad(self.azimuth_vel * dt);
        self.elevation =
            Rad((self.elevation.0 + self.elevation_vel * dt).clamp(-MAX_ELEVATION, MAX_ELEVATION));
        let decay = (-self.damping * dt).exp();
        self.azimuth_vel *= decay;
        self.elevation_vel *= decay;
        self.apply(frame.camera);
        Ok(())
    }
}
