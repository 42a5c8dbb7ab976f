//! Food preferences and the item → food-group table.

use std::collections::BTreeMap;

bitflags::bitflags! {
    /// Food groups a species will eat.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct FoodType: u8 {
        const MEAT = 0x01;
        const FRUITS_AND_VEGGIES = 0x02;
        const GRAINS_AND_HAY = 0x04;
        const FISH = 0x08;
        const EGGS = 0x10;
        const GOLD = 0x20;
    }
}

impl Default for FoodType {
    fn default() -> Self {
        Self::empty()
    }
}

/// Maps item kinds to the food group they belong to.
///
/// Read-only after startup; injected wherever feeding is resolved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FoodTable {
    pub items: BTreeMap<String, FoodType>,
}

impl FoodTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, item: &str, food: FoodType) -> Self {
        self.items.insert(item.to_owned(), food);
        self
    }

    /// Food group of `item`, empty when the item is not food at all.
    pub fn classify(&self, item: &str) -> FoodType {
        self.items.get(item).copied().unwrap_or_default()
    }
}
