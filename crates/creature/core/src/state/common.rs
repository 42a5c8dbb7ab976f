use std::fmt;
use std::ops::{Add, Sub};
use std::time::Duration;

/// Serial number of any mobile known to the world (creatures and players alike).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u32);

impl EntityId {
    /// Stored in place of a missing reference by the save codec.
    pub const NONE_RAW: i32 = -1;

    /// Decodes a stored reference; negative values mean "no entity".
    pub fn from_raw(raw: i32) -> Option<Self> {
        u32::try_from(raw).ok().map(Self)
    }

    pub fn to_raw(id: Option<Self>) -> i32 {
        id.map_or(Self::NONE_RAW, |id| id.0 as i32)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tile coordinate with altitude.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point3D {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Point3D {
    pub const ZERO: Self = Self { x: 0, y: 0, z: 0 };

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Square range check on the horizontal plane.
    pub fn in_range(&self, other: &Point3D, range: i32) -> bool {
        (self.x - other.x).abs() <= range && (self.y - other.y).abs() <= range
    }

    /// Euclidean distance on the horizontal plane.
    pub fn distance(&self, other: &Point3D) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// Chebyshev distance in tiles.
    pub fn tiles_to(&self, other: &Point3D) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Point mirrored through `self`, used when backing away from `other`.
    pub fn away_from(&self, other: &Point3D) -> Point3D {
        Point3D::new(
            self.x + (self.x - other.x).signum() * 2,
            self.y + (self.y - other.y).signum() * 2,
            self.z,
        )
    }
}

impl fmt::Display for Point3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Facet a mobile lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapId(pub u8);

impl MapId {
    pub const FELUCCA: Self = Self(0);
    pub const TRAMMEL: Self = Self(1);
    pub const ILSHENAR: Self = Self(2);
    pub const MALAS: Self = Self(3);
    pub const TOKUNO: Self = Self(4);
    /// Holding area for stabled and logged-out mobiles; nothing there is simulated.
    pub const INTERNAL: Self = Self(0x7F);

    pub const fn is_internal(self) -> bool {
        self.0 == Self::INTERNAL.0
    }
}

impl Default for MapId {
    fn default() -> Self {
        Self::FELUCCA
    }
}

/// Map plus point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub map: MapId,
    pub point: Point3D,
}

impl Location {
    pub const fn new(map: MapId, point: Point3D) -> Self {
        Self { map, point }
    }

    /// Same map and within `range` tiles.
    pub fn in_range(&self, other: &Location, range: i32) -> bool {
        self.map == other.map && self.point.in_range(&other.point, range)
    }
}

/// World clock in milliseconds since the shard started.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct GameTime(pub u64);

impl GameTime {
    pub const ZERO: Self = Self(0);

    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1_000)
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Time left until `self`, or zero if it already passed.
    pub fn remaining_from(self, now: GameTime) -> Duration {
        Duration::from_millis(self.0.saturating_sub(now.0))
    }

    /// Elapsed time since `earlier`, zero if `earlier` lies in the future.
    pub fn since(self, earlier: GameTime) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for GameTime {
    type Output = GameTime;

    fn add(self, rhs: Duration) -> GameTime {
        let ms = u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX);
        GameTime(self.0.saturating_add(ms))
    }
}

impl Sub<Duration> for GameTime {
    type Output = GameTime;

    fn sub(self, rhs: Duration) -> GameTime {
        let ms = u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX);
        GameTime(self.0.saturating_sub(ms))
    }
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_entity_references_round_trip() {
        assert_eq!(EntityId::from_raw(-1), None);
        assert_eq!(EntityId::from_raw(42), Some(EntityId(42)));
        assert_eq!(EntityId::to_raw(None), -1);
        assert_eq!(EntityId::to_raw(Some(EntityId(7))), 7);
    }

    #[test]
    fn range_checks_are_square() {
        let a = Point3D::new(10, 10, 0);
        assert!(a.in_range(&Point3D::new(13, 7, 20), 3));
        assert!(!a.in_range(&Point3D::new(14, 10, 0), 3));
        assert_eq!(a.tiles_to(&Point3D::new(13, 5, 0)), 5);
    }

    #[test]
    fn game_time_saturates() {
        let t = GameTime::from_secs(5);
        assert_eq!(t - Duration::from_secs(10), GameTime::ZERO);
        assert_eq!(t.remaining_from(GameTime::from_secs(9)), Duration::ZERO);
        assert_eq!((t + Duration::from_millis(250)).as_millis(), 5_250);
    }
}
