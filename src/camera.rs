//! Camera and projection.
//!
//! Two modes: a chase camera that follows the replayed vehicle from behind
//! and above, and a free camera that stays where it was put. The projection
//! carries the usual correction matrix mapping OpenGL clip space (z in -1..1)
//! to wgpu's (z in 0..1).

use cgmath::{Deg, EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};

use crate::telemetry::TrackPoint;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>, Y: Into<Rad<f32>>, T: Into<Rad<f32>>>(
        position: P,
        yaw: Y,
        pitch: T,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
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

#[derive(Debug, Clone, Copy)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
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

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// How the camera relates to the replayed vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    /// Chase the vehicle from behind and above.
    Follow,
    /// Stay where the camera currently is.
    Free,
}

/// Owns the camera and switches it between follow and free behavior.
#[derive(Debug, Clone, Copy)]
pub struct CameraRig {
    pub camera: Camera,
    pub mode: CameraMode,
    follow_distance: f32,
    follow_height: f32,
}

impl CameraRig {
    pub fn new(follow_distance: f32, follow_height: f32) -> Self {
        Self {
            camera: Camera::new((0.0, 30.0, 20.0), Deg(-90.0), Deg(-20.0)),
            mode: CameraMode::Follow,
            follow_distance,
            follow_height,
        }
    }

    pub fn switch_mode(&mut self) {
        self.mode = match self.mode {
            CameraMode::Follow => CameraMode::Free,
            CameraMode::Free => CameraMode::Follow,
        };
        log::info!("camera mode: {:?}", self.mode);
    }

    /// Update from the current track sample and return the view matrix.
    pub fn view_matrix(&mut self, point: &TrackPoint) -> Matrix4<f32> {
        match self.mode {
            CameraMode::Free => self.camera.calc_matrix(),
            CameraMode::Follow => {
                // Vehicle heading in renderer space: yaw 0 points north (-z).
                let forward = Vector3::new(point.yaw.sin(), 0.0, -point.yaw.cos());
                let eye = Point3::from_vec(
                    point.position - forward * self.follow_distance
                        + Vector3::unit_y() * self.follow_height,
                );
                self.camera.position = eye;
                Matrix4::look_at_rh(eye, Point3::from_vec(point.position), Vector3::unit_y())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_camera_sits_behind_and_above_the_vehicle() {
        let mut rig = CameraRig::new(10.0, 5.0);
        let point = TrackPoint {
            position: Vector3::new(0.0, 100.0, 0.0),
            yaw: 0.0,
            ..Default::default()
        };
        rig.view_matrix(&point);
        // Heading north (-z) puts the chase camera south (+z) and higher up.
        assert!((rig.camera.position.z - 10.0).abs() < 1e-5);
        assert!((rig.camera.position.y - 105.0).abs() < 1e-5);
    }

    #[test]
    fn free_mode_leaves_the_camera_where_it_is() {
        let mut rig = CameraRig::new(10.0, 5.0);
        rig.switch_mode();
        assert_eq!(rig.mode, CameraMode::Free);
        let before = rig.camera.position;
        rig.view_matrix(&TrackPoint {
            position: Vector3::new(500.0, 0.0, 500.0),
            ..Default::default()
        });
        assert_eq!(rig.camera.position, before);
    }

    #[test]
    fn mode_switch_toggles() {
        let mut rig = CameraRig::new(1.0, 1.0);
        assert_eq!(rig.mode, CameraMode::Follow);
        rig.switch_mode();
        rig.switch_mode();
        assert_eq!(rig.mode, CameraMode::Follow);
    }
}
