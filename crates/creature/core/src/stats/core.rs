//! Base attributes before any modifier is applied.

/// The three primary attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::EnumIter, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatKind {
    Str,
    Dex,
    Int,
}

/// Raw strength, dexterity and intelligence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoreStats {
    pub str: i32,
    pub dex: i32,
    pub int: i32,
}

impl CoreStats {
    pub const MIN: i32 = 1;

    pub fn new(str: i32, dex: i32, int: i32) -> Self {
        Self { str, dex, int }
    }

    pub fn get(&self, kind: StatKind) -> i32 {
        match kind {
            StatKind::Str => self.str,
            StatKind::Dex => self.dex,
            StatKind::Int => self.int,
        }
    }

    pub fn set(&mut self, kind: StatKind, value: i32) {
        let slot = match kind {
            StatKind::Str => &mut self.str,
            StatKind::Dex => &mut self.dex,
            StatKind::Int => &mut self.int,
        };
        *slot = value;
    }
}

impl Default for CoreStats {
    fn default() -> Self {
        Self::new(Self::MIN, Self::MIN, Self::MIN)
    }
}
