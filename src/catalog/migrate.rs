use anyhow::{Result, anyhow};

use crate::model::MapEntry;

use super::data::builtin_entries;

/// One schema upgrade step. Steps are pure transforms keyed by name lookup,
/// safe to re-apply, and must never drop user star flags.
pub struct Migration {
    pub name: &'static str,
    pub apply: fn(Vec<MapEntry>) -> Result<Vec<MapEntry>>,
}

pub fn migrations() -> &'static [Migration] {
    &[
        Migration {
            name: "mage-tower-floor-names",
            apply: rename_mage_tower_floors,
        },
        Migration {
            name: "english-names",
            apply: fill_english_names,
        },
        Migration {
            name: "image-paths-and-new-maps",
            apply: refresh_images_and_append_new,
        },
    ]
}

pub struct MigrationOutcome {
    pub entries: Vec<MapEntry>,
    /// Index of the next unapplied migration after this run.
    pub version: usize,
    /// Set when a step aborted; the cursor stays on that step so it retries
    /// on next load, and `entries` hold the last fully-migrated data.
    pub error: Option<anyhow::Error>,
}

/// Apply every migration from the persisted cursor onward. The cursor only
/// advances past a step that fully succeeded.
pub fn run_pending(entries: Vec<MapEntry>, from: usize) -> MigrationOutcome {
    let chain = migrations();
    let mut entries = entries;
    let mut version = from.min(chain.len());

    for step in &chain[version..] {
        match (step.apply)(entries.clone()) {
            Ok(next) => {
                entries = next;
                version += 1;
            }
            Err(err) => {
                return MigrationOutcome {
                    entries,
                    version,
                    error: Some(err.context(format!("migration {:?}", step.name))),
                };
            }
        }
    }

    MigrationOutcome {
        entries,
        version,
        error: None,
    }
}

/// The tower floors were renamed from digit suffixes to the spelled-out
/// forms the rest of the catalog uses.
fn rename_mage_tower_floors(mut entries: Vec<MapEntry>) -> Result<Vec<MapEntry>> {
    const RENAMES: [(u32, &str, &str); 3] = [
        (77, "魔法師之塔1層", "魔法師之塔一層"),
        (78, "魔法師之塔2層", "魔法師之塔二層"),
        (79, "魔法師之塔3層", "魔法師之塔三層"),
    ];

    for (level, old, new) in RENAMES {
        if entries.iter().any(|m| m.level == level && m.name == new) {
            continue;
        }
        match entries
            .iter_mut()
            .find(|m| m.level == level && m.name == old)
        {
            Some(m) => m.name = new.to_string(),
            None => {
                return Err(anyhow!(
                    "level {} has neither {:?} nor {:?}",
                    level,
                    old,
                    new
                ));
            }
        }
    }
    Ok(entries)
}

/// Backfill `enName` from the shipped catalog by `(level, name)`. Entries
/// the shipped catalog does not know keep whatever they had.
fn fill_english_names(mut entries: Vec<MapEntry>) -> Result<Vec<MapEntry>> {
    let reference = builtin_entries();
    for m in &mut entries {
        if let Some(r) = reference
            .iter()
            .find(|r| r.level == m.level && r.name == m.name)
        {
            m.en_name = r.en_name.clone();
        }
    }
    Ok(entries)
}

/// Point image paths at the shipped assets and append any maps added since
/// the snapshot was taken. Existing rows keep their star flags.
fn refresh_images_and_append_new(mut entries: Vec<MapEntry>) -> Result<Vec<MapEntry>> {
    let reference = builtin_entries();
    for m in &mut entries {
        if let Some(r) = reference
            .iter()
            .find(|r| r.level == m.level && r.name == m.name)
        {
            m.image_path = r.image_path.clone();
            m.max_stages = r.max_stages;
            m.respawn_seconds = r.respawn_seconds;
        }
    }
    for r in reference {
        let known = entries
            .iter()
            .any(|m| m.level == r.level && m.name == r.name);
        if !known {
            entries.push(r);
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn old_snapshot() -> Vec<MapEntry> {
        // A pre-migration snapshot: digit floor names, no enName, one star.
        let mut entries = builtin_entries();
        for m in &mut entries {
            m.en_name = String::new();
            m.image_path = None;
        }
        entries
            .iter_mut()
            .find(|m| m.level == 77)
            .unwrap()
            .name = "魔法師之塔1層".to_string();
        entries
            .iter_mut()
            .find(|m| m.level == 78)
            .unwrap()
            .name = "魔法師之塔2層".to_string();
        entries
            .iter_mut()
            .find(|m| m.level == 79)
            .unwrap()
            .name = "魔法師之塔3層".to_string();
        entries
            .iter_mut()
            .find(|m| m.level == 83)
            .unwrap()
            .is_starred = true;
        entries
    }

    #[test]
    fn full_chain_upgrades_and_keeps_stars() {
        let out = run_pending(old_snapshot(), 0);
        assert!(out.error.is_none());
        assert_eq!(out.version, migrations().len());

        let m77 = out
            .entries
            .iter()
            .find(|m| m.level == 77)
            .unwrap();
        assert_eq!(m77.name, "魔法師之塔一層");
        assert_eq!(m77.en_name, "Mage Tower 1F");
        assert!(m77.image_path.is_some());

        let m83 = out
            .entries
            .iter()
            .find(|m| m.level == 83)
            .unwrap();
        assert!(m83.is_starred);
    }

    #[test]
    fn chain_is_idempotent() {
        let once = run_pending(old_snapshot(), 0);
        assert!(once.error.is_none());
        let twice = run_pending(once.entries.clone(), 0);
        assert!(twice.error.is_none());
        assert_eq!(once.entries, twice.entries);
    }

    #[test]
    fn failed_step_leaves_cursor_and_data_alone() {
        // Snapshot with the mage tower rows missing entirely: the rename
        // step cannot find its reference data and must abort.
        let snapshot: Vec<MapEntry> = old_snapshot()
            .into_iter()
            .filter(|m| !(77..=79).contains(&m.level))
            .collect();

        let out = run_pending(snapshot.clone(), 0);
        assert!(out.error.is_some());
        assert_eq!(out.version, 0);
        assert_eq!(out.entries, snapshot);
    }

    #[test]
    fn cursor_skips_already_applied_steps() {
        let upgraded = run_pending(old_snapshot(), 0);
        let again = run_pending(upgraded.entries.clone(), upgraded.version);
        assert!(again.error.is_none());
        assert_eq!(again.version, migrations().len());
        assert_eq!(again.entries, upgraded.entries);
    }
}
