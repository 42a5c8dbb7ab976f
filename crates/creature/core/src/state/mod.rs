//! Identity, position, and clock primitives shared by every module.
mod common;

pub use common::{EntityId, GameTime, Location, MapId, Point3D};
