use bitflags::bitflags;

bitflags! {
    /// Fields present in a flagged record. Absent fields keep the value the
    /// species template gives a fresh creature.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct SaveFlags: u32 {
        const CURRENT_AI        = 1 << 0;
        const DEFAULT_AI        = 1 << 1;
        const PERCEPTION        = 1 << 2;
        const FIGHT_RANGE       = 1 << 3;
        const TEAM              = 1 << 4;
        const SPEEDS            = 1 << 5;
        const HOME              = 1 << 6;
        const RANGE_HOME        = 1 << 7;
        const ATTACK_SPELLS     = 1 << 8;
        const DEFENSE_SPELLS    = 1 << 9;
        const FIGHT_MODE        = 1 << 10;
        const CONTROL           = 1 << 11;
        const TAMING            = 1 << 12;
        const LOYALTY           = 1 << 13;
        const WAYPOINT          = 1 << 14;
        const SEEDS             = 1 << 15;
        const DAMAGE            = 1 << 16;
        const OWNERS            = 1 << 17;
        const GENERATED_LOOT    = 1 << 18;
        const FRIENDS           = 1 << 19;
        const REMOVAL           = 1 << 20;
        const DELETE_TIME       = 1 << 21;
        const CORPSE_NAME       = 1 << 22;

        // Added in version 20.
        const COOLDOWNS         = 1 << 23;
        const BARD              = 1 << 24;
        const SPAWNER           = 1 << 25;
        const SEEKS_HOME        = 1 << 26;
    }
}

impl SaveFlags {
    /// Every flag a record of `version` may carry.
    pub const fn allowed_in(version: i32) -> Self {
        if version >= 20 {
            Self::all()
        } else {
            Self::from_bits_truncate((1 << 23) - 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_19_lacks_the_newer_flags() {
        let v19 = SaveFlags::allowed_in(19);
        assert!(v19.contains(SaveFlags::CORPSE_NAME));
        assert!(!v19.intersects(SaveFlags::COOLDOWNS | SaveFlags::BARD | SaveFlags::SPAWNER));
        assert_eq!(SaveFlags::allowed_in(20), SaveFlags::all());
    }
}
