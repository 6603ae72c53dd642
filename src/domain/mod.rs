// Domain layer: navigation graph, routing and bot rules with no runtime dependencies.

pub mod bot;
pub mod entities;
pub mod errors;
pub mod geometry;
pub mod graph;
pub mod hit_region;
pub mod occupancy;
pub mod ports;
pub mod routing;
pub mod tuning;

pub use bot::{BotStatus, BotVitals, Outcome};
pub use geometry::{EdgeTransform, Pose};
pub use graph::{EdgeInsert, NavGraph, NodeId, TopologyEntry, WayPoint, WayPointConfig, WayPointEdge};
pub use hit_region::HitRegion;
pub use routing::RoutingTable;
