// Collision volumes attached to a bot; each reports a fixed damage amount when hit.

use glam::Vec3;

use crate::domain::graph::Dimensions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitShape {
    Sphere,
    Box,
    Capsule,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HitRegion {
    pub attach_point: String,
    pub shape: HitShape,
    pub dimensions: Dimensions,
    // Offset from the bot anchor.
    pub offset: Vec3,
    pub damage: i32,
}

impl HitRegion {
    fn new(attach_point: &str, shape: HitShape, size: [f32; 3], offset: [f32; 3], damage: i32) -> Self {
        Self {
            attach_point: attach_point.to_string(),
            shape,
            dimensions: Dimensions {
                width: size[0],
                height: size[1],
                depth: size[2],
            },
            offset: Vec3::from_array(offset),
            damage,
        }
    }
}

/// Head plus five chest plates; a head shot deals more damage.
pub fn default_bot_hit_regions() -> Vec<HitRegion> {
    vec![
        HitRegion::new("head", HitShape::Sphere, [0.3, 0.3, 0.3], [0.0, 1.1, 0.0], 100),
        HitRegion::new("chest-center", HitShape::Box, [0.2, 0.2, 0.2], [0.0, 0.485, 0.0], 80),
        HitRegion::new("chest-left", HitShape::Box, [0.2, 0.2, 0.2], [-0.182, 0.485, 0.0], 80),
        HitRegion::new("chest-right", HitShape::Box, [0.2, 0.2, 0.2], [0.182, 0.485, 0.0], 80),
        HitRegion::new("chest-top", HitShape::Box, [0.3, 0.1, 0.1], [0.0, 0.241, 0.0], 80),
        HitRegion::new("chest-bottom", HitShape::Box, [0.3, 0.1, 0.1], [0.0, 0.729, 0.0], 80),
    ]
}
