//! Species catalog loader.
//!
//! Loads species templates from RON files. Fields left out of an entry take
//! the values of [`SpeciesTemplate::default`].

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, bail};
use creature_core::{RollRange, SpeciesTemplate, SpellRegistry};

use crate::catalog::SpeciesCatalog;
use crate::loaders::{LoadResult, read_file};

/// Loader for species catalogs from RON files.
pub struct SpeciesLoader;

impl SpeciesLoader {
    /// Load a species catalog from a RON file.
    ///
    /// RON format: `Vec<(String, SpeciesTemplate)>`
    pub fn load(path: &Path) -> LoadResult<SpeciesCatalog> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("in {}", path.display()))
    }

    pub fn parse(content: &str) -> LoadResult<SpeciesCatalog> {
        let raw: Vec<(String, SpeciesTemplate)> =
            ron::from_str(content).context("Failed to parse species catalog RON")?;

        let mut seen = BTreeSet::new();
        for (key, template) in &raw {
            if !seen.insert(key.as_str()) {
                bail!("duplicate species key '{key}'");
            }
            validate(template).with_context(|| format!("species '{key}'"))?;
        }

        Ok(raw.into_iter().collect())
    }

    /// Spell keys referenced by the catalog that `spells` cannot build.
    ///
    /// Creatures still spawn with such keys; a mage simply never casts them.
    pub fn unknown_spells(catalog: &SpeciesCatalog, spells: &SpellRegistry) -> Vec<(String, String)> {
        catalog
            .iter()
            .flat_map(|(key, t)| {
                t.attack_spells
                    .iter()
                    .chain(&t.defense_spells)
                    .filter(|spell| !spells.contains(spell.as_str()))
                    .map(move |spell| (key.to_owned(), spell.to_string()))
            })
            .collect()
    }
}

fn validate(t: &SpeciesTemplate) -> LoadResult<()> {
    let ranges = [("str", Some(t.str)), ("dex", Some(t.dex)), ("int", Some(t.int))]
        .into_iter()
        .chain([("hits", t.hits), ("stam", t.stam), ("mana", t.mana)])
        .chain([("damage", Some(t.damage))]);
    for (name, range) in ranges {
        if let Some(RollRange { min, max }) = range {
            if min > max {
                bail!("{name} range {min}..={max} is empty");
            }
        }
    }
    for skill in &t.skills {
        if skill.min > skill.max {
            bail!("{} range {}..={} is empty", skill.skill, skill.min, skill.max);
        }
    }
    if t.active_speed <= 0.0 || t.passive_speed <= 0.0 {
        bail!("think speeds must be positive");
    }
    if t.control_slots == 0 && t.tamable {
        bail!("a tamable species needs at least one control slot");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use creature_core::{AiKind, FoodType, SkillName, SpeciesOracle};

    const WOLF: &str = r#"[
        ("wolf", (
            name: "a grey wolf",
            ai: Animal,
            str: (min: 56, max: 80),
            hits: Some((min: 34, max: 48)),
            skills: [(skill: Wrestling, min: 45.1, max: 60.0)],
            tamable: true,
            min_tame_skill: 53.1,
            food: "MEAT",
        )),
    ]"#;

    #[test]
    fn parses_entries_over_defaults() {
        let catalog = SpeciesLoader::parse(WOLF).unwrap();
        let wolf = catalog.template("wolf").unwrap();
        assert_eq!(wolf.ai, AiKind::Animal);
        assert_eq!(wolf.str, RollRange::new(56, 80));
        assert_eq!(wolf.hits, Some(RollRange::new(34, 48)));
        assert_eq!(wolf.skills[0].skill, SkillName::Wrestling);
        assert_eq!(wolf.food, FoodType::MEAT);
        assert_eq!(wolf.range_perception, SpeciesTemplate::default().range_perception);
    }

    #[test]
    fn rejects_duplicate_keys() {
        let err = SpeciesLoader::parse(r#"[("rat", (name: "a rat")), ("rat", (name: "a rat"))]"#).unwrap_err();
        assert!(err.to_string().contains("duplicate species key 'rat'"));
    }

    #[test]
    fn rejects_inverted_ranges() {
        let err = SpeciesLoader::parse(r#"[("rat", (dex: (min: 40, max: 20)))]"#).unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("species 'rat'"), "{chain}");
        assert!(chain.contains("dex range 40..=20"), "{chain}");
    }

    #[test]
    fn reports_spells_the_registry_cannot_build() {
        let catalog = SpeciesLoader::parse(
            r#"[("lich", (ai: Mage, attack_spells: ["magery.fireball", "necro.wither"]))]"#,
        )
        .unwrap();
        let unknown = SpeciesLoader::unknown_spells(&catalog, &SpellRegistry::with_magery());
        assert_eq!(unknown, vec![("lich".to_owned(), "necro.wither".to_owned())]);
    }
}
