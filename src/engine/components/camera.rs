use glam::{Mat4, Vec3};

const PITCH_LIMIT: f32 = 89.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Vertical field of view in degrees
    Perspective { fov_y: f32, near: f32, far: f32 },
    /// `height` is the full visible height in world units
    Orthographic { height: f32, near: f32, far: f32 },
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Perspective {
            fov_y: 70.0,
            near: 0.01,
            far: 1000.0,
        }
    }
}

/// Viewer position and orientation plus the projection used for a layer.
///
/// Orientation is either free-look (pitch/yaw in degrees) or locked onto a
/// target with [`Camera::look_at`].
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    pitch: f32,
    yaw: f32,
    look_direction: Vec3,
    target: Option<Vec3>,
    projection: Projection,
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            pitch: 0.0,
            yaw: -90.0,
            look_direction: Vec3::NEG_Z,
            target: None,
            projection: Projection::default(),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
    }

    /// Free-look orientation; clears any look-at target
    pub fn set_rotation(&mut self, pitch: f32, yaw: f32) {
        self.target = None;
        self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.yaw = yaw;

        let (pitch, yaw) = (self.pitch.to_radians(), self.yaw.to_radians());
        self.look_direction = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos())
            .normalize();
    }

    /// Add rotation delta for mouse look
    pub fn add_rotation_delta(&mut self, pitch_delta: f32, yaw_delta: f32) {
        self.set_rotation(self.pitch + pitch_delta, self.yaw + yaw_delta);
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = Some(target);
    }

    pub fn look_direction(&self) -> Vec3 {
        match self.target {
            Some(target) => (target - self.position).normalize_or_zero(),
            None => self.look_direction,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        match self.target {
            Some(target) => Mat4::look_at_rh(self.position, target, Vec3::Y),
            None => Mat4::look_to_rh(self.position, self.look_direction, Vec3::Y),
        }
    }

    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        match self.projection {
            Projection::Perspective { fov_y, near, far } => {
                Mat4::perspective_rh_gl(fov_y.to_radians(), aspect_ratio, near, far)
            }
            Projection::Orthographic { height, near, far } => {
                let half_h = height / 2.0;
                let half_w = half_h * aspect_ratio;
                Mat4::orthographic_rh_gl(-half_w, half_w, -half_h, half_h, near, far)
            }
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}
