//! Little-endian binary stream used by save records.
//!
//! Fixed-width values are little-endian. Counts and flag masks use the 7-bit
//! variable-length encoding. Strings are a 7-bit length followed by UTF-8
//! bytes. Entity references are `i32` with `-1` for none. Points in time are
//! stored as signed millisecond offsets from the moment of saving, so a
//! record restored later keeps the same remaining durations.

use std::time::Duration;

use super::PersistError;
use crate::state::{EntityId, GameTime, Location, MapId, Point3D};

#[derive(Clone, Debug)]
pub struct SaveWriter {
    buf: Vec<u8>,
    saved_at: GameTime,
}

impl SaveWriter {
    pub fn new(saved_at: GameTime) -> Self {
        Self {
            buf: Vec::with_capacity(256),
            saved_at,
        }
    }

    pub fn saved_at(&self) -> GameTime {
        self.saved_at
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// 7 bits per byte, high bit set while more bytes follow.
    pub fn write_encoded_u32(&mut self, mut value: u32) {
        while value >= 0x80 {
            self.buf.push((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    pub fn write_encoded_len(&mut self, len: usize) {
        self.write_encoded_u32(u32::try_from(len).unwrap_or(u32::MAX));
    }

    pub fn write_str(&mut self, value: &str) {
        self.write_encoded_len(value.len());
        self.buf.extend_from_slice(value.as_bytes());
    }

    pub fn write_opt_str(&mut self, value: Option<&str>) {
        self.write_bool(value.is_some());
        if let Some(value) = value {
            self.write_str(value);
        }
    }

    pub fn write_entity(&mut self, id: Option<EntityId>) {
        self.write_i32(EntityId::to_raw(id));
    }

    pub fn write_entities(&mut self, ids: &[EntityId]) {
        self.write_encoded_len(ids.len());
        for id in ids {
            self.write_entity(Some(*id));
        }
    }

    pub fn write_point(&mut self, point: Point3D) {
        self.write_i32(point.x);
        self.write_i32(point.y);
        self.write_i32(point.z);
    }

    pub fn write_location(&mut self, location: Location) {
        self.write_u8(location.map.0);
        self.write_point(location.point);
    }

    /// Stores `at` relative to the save time.
    pub fn write_delta_time(&mut self, at: GameTime) {
        let delta = i128::from(at.as_millis()) - i128::from(self.saved_at.as_millis());
        self.write_i64(i64::try_from(delta).unwrap_or(i64::MAX));
    }

    pub fn write_duration(&mut self, duration: Duration) {
        self.write_i64(i64::try_from(duration.as_millis()).unwrap_or(i64::MAX));
    }
}

#[derive(Clone, Debug)]
pub struct SaveReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    loaded_at: GameTime,
}

impl<'a> SaveReader<'a> {
    pub fn new(bytes: &'a [u8], loaded_at: GameTime) -> Self {
        Self {
            bytes,
            pos: 0,
            loaded_at,
        }
    }

    pub fn loaded_at(&self) -> GameTime {
        self.loaded_at
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], PersistError> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(PersistError::UnexpectedEof { needed, remaining });
        }
        let slice = &self.bytes[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], PersistError> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, PersistError> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool, PersistError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_i32(&mut self) -> Result<i32, PersistError> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, PersistError> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, PersistError> {
        Ok(i64::from_le_bytes(self.take_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, PersistError> {
        Ok(f64::from_le_bytes(self.take_array()?))
    }

    pub fn read_encoded_u32(&mut self) -> Result<u32, PersistError> {
        let mut value: u32 = 0;
        for shift in (0..35).step_by(7) {
            let byte = self.read_u8()?;
            let bits = u32::from(byte & 0x7F);
            if shift == 28 && bits > 0x0F {
                return Err(PersistError::OverlongInt);
            }
            value |= bits << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(PersistError::OverlongInt)
    }

    pub fn read_encoded_len(&mut self) -> Result<usize, PersistError> {
        Ok(self.read_encoded_u32()? as usize)
    }

    pub fn read_str(&mut self) -> Result<String, PersistError> {
        let len = self.read_encoded_len()?;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| PersistError::InvalidUtf8)
    }

    pub fn read_opt_str(&mut self) -> Result<Option<String>, PersistError> {
        if self.read_bool()? {
            self.read_str().map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn read_entity(&mut self) -> Result<Option<EntityId>, PersistError> {
        Ok(EntityId::from_raw(self.read_i32()?))
    }

    /// Reads a list written by [`SaveWriter::write_entities`], dropping
    /// null references.
    pub fn read_entities(&mut self) -> Result<Vec<EntityId>, PersistError> {
        let len = self.read_encoded_len()?;
        let mut ids = Vec::with_capacity(len.min(self.remaining() / 4));
        for _ in 0..len {
            if let Some(id) = self.read_entity()? {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    pub fn read_point(&mut self) -> Result<Point3D, PersistError> {
        Ok(Point3D::new(self.read_i32()?, self.read_i32()?, self.read_i32()?))
    }

    pub fn read_location(&mut self) -> Result<Location, PersistError> {
        let map = MapId(self.read_u8()?);
        Ok(Location::new(map, self.read_point()?))
    }

    /// Inverse of [`SaveWriter::write_delta_time`], anchored at load time.
    /// Offsets reaching before the clock's origin clamp to zero.
    pub fn read_delta_time(&mut self) -> Result<GameTime, PersistError> {
        let delta = self.read_i64()?;
        let at = i128::from(self.loaded_at.as_millis()) + i128::from(delta);
        Ok(GameTime::from_millis(u64::try_from(at.max(0)).unwrap_or(u64::MAX)))
    }

    /// Negative durations read as zero.
    pub fn read_duration(&mut self) -> Result<Duration, PersistError> {
        let ms = self.read_i64()?;
        Ok(Duration::from_millis(u64::try_from(ms).unwrap_or(0)))
    }
}
