// Spatial primitives shared by waypoints, edges and bots.

use glam::{EulerRot, Quat, Vec3};

// Edge props are drawn slightly shorter than the gap so they do not poke into the markers.
const EDGE_SCALE_FACTOR: f32 = 0.85;

/// Position and orientation of an actor in app space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Pose {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Builds a pose from a position and Euler angles in degrees: `x` pitch, `y` yaw
    /// and `z` roll, applied yaw first.
    pub fn from_euler_degrees(position: Vec3, degrees: Vec3) -> Self {
        let rotation = Quat::from_euler(
            EulerRot::YXZ,
            degrees.y.to_radians(),
            degrees.x.to_radians(),
            degrees.z.to_radians(),
        );
        Self { position, rotation }
    }

    /// Pitch, yaw and roll of the rotation in degrees, in the layout
    /// `from_euler_degrees` takes.
    pub fn euler_degrees(&self) -> Vec3 {
        let (yaw, pitch, roll) = self.rotation.to_euler(EulerRot::YXZ);
        Vec3::new(pitch.to_degrees(), yaw.to_degrees(), roll.to_degrees())
    }

    pub fn distance(&self, other: &Pose) -> f32 {
        self.position.distance(other.position)
    }
}

/// Visual transform of the prop that connects two waypoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale_y: f32,
}

impl EdgeTransform {
    // Stretch a unit prop of `length` between two endpoints, oriented along +Y.
    pub fn between(source: Vec3, target: Vec3, length: f32) -> Self {
        let dif = target - source;
        let distance = dif.length();
        let scale_y = if length > 0.0 {
            distance / length * EDGE_SCALE_FACTOR
        } else {
            0.0
        };
        let rotation = if distance > f32::EPSILON {
            Quat::from_rotation_arc(Vec3::Y, dif / distance)
        } else {
            Quat::IDENTITY
        };

        Self {
            position: (source + target) * 0.5,
            rotation,
            scale_y,
        }
    }
}
