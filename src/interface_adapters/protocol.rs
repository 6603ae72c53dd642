use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::domain::{Pose, TopologyEntry, WayPointConfig};

// Plain xyz triple as stored in level files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3Dto {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for Vec3Dto {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Vec3Dto> for Vec3 {
    fn from(v: Vec3Dto) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

// Live pose of a waypoint; rotation is pitch, yaw and roll in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveTransformDto {
    pub position: Vec3Dto,
    #[serde(default)]
    pub rotation: Vec3Dto,
}

// One saved waypoint with its outgoing neighbours as dense indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelEntryDto {
    pub node_config: WayPointConfig,
    pub live_transform: LiveTransformDto,
    #[serde(default)]
    pub adjacency: Vec<usize>,
}

impl From<&TopologyEntry> for LevelEntryDto {
    fn from(entry: &TopologyEntry) -> Self {
        Self {
            node_config: entry.config.clone(),
            live_transform: LiveTransformDto {
                position: entry.pose.position.into(),
                rotation: entry.pose.euler_degrees().into(),
            },
            adjacency: entry.adjacency.clone(),
        }
    }
}

impl From<LevelEntryDto> for TopologyEntry {
    fn from(dto: LevelEntryDto) -> Self {
        Self {
            config: dto.node_config,
            pose: Pose::from_euler_degrees(
                dto.live_transform.position.into(),
                dto.live_transform.rotation.into(),
            ),
            adjacency: dto.adjacency,
        }
    }
}

pub fn encode_level(topology: &[TopologyEntry]) -> Result<String, serde_json::Error> {
    let entries: Vec<LevelEntryDto> = topology.iter().map(LevelEntryDto::from).collect();
    serde_json::to_string(&entries)
}

pub fn decode_level(json: &str) -> Result<Vec<TopologyEntry>, serde_json::Error> {
    let entries: Vec<LevelEntryDto> = serde_json::from_str(json)?;
    Ok(entries.into_iter().map(TopologyEntry::from).collect())
}
