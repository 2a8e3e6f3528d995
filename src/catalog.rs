use crate::model::MapEntry;

pub mod data;
pub mod migrate;

/// Read-only ordered list of map entries, queryable by level and by
/// `(level, name)`. The only user mutation is the star flag.
#[derive(Clone, Debug)]
pub struct Catalog {
    entries: Vec<MapEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<MapEntry>) -> Self {
        Self { entries }
    }

    pub fn builtin() -> Self {
        Self::new(data::builtin_entries())
    }

    pub fn entries(&self) -> &[MapEntry] {
        &self.entries
    }

    pub fn by_level(&self, level: u32) -> Vec<&MapEntry> {
        self.entries.iter().filter(|m| m.level == level).collect()
    }

    pub fn first_by_level(&self, level: u32) -> Option<&MapEntry> {
        self.entries.iter().find(|m| m.level == level)
    }

    pub fn find(&self, level: u32, name: &str) -> Option<&MapEntry> {
        self.entries
            .iter()
            .find(|m| m.level == level && m.name == name)
    }

    pub fn episodes(&self) -> Vec<u32> {
        let mut out: Vec<u32> = self.entries.iter().map(|m| m.episode).collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    pub fn by_episode(&self, episode: u32) -> Vec<&MapEntry> {
        self.entries
            .iter()
            .filter(|m| m.episode == episode)
            .collect()
    }

    pub fn starred(&self) -> Vec<&MapEntry> {
        self.entries.iter().filter(|m| m.is_starred).collect()
    }

    /// Flip the star on the first map at `level`. Returns the new value.
    pub fn toggle_star_by_level(&mut self, level: u32) -> Option<bool> {
        let entry = self.entries.iter_mut().find(|m| m.level == level)?;
        entry.is_starred = !entry.is_starred;
        Some(entry.is_starred)
    }

    /// Flip the star on an exact `(level, name)` match, for levels hosting
    /// several maps.
    pub fn toggle_star(&mut self, level: u32, name: &str) -> Option<bool> {
        let entry = self
            .entries
            .iter_mut()
            .find(|m| m.level == level && m.name == name)?;
        entry.is_starred = !entry.is_starred;
        Some(entry.is_starred)
    }

    /// English display/voice name, falling back to the native one.
    pub fn en_name(&self, level: u32, name: &str) -> String {
        match self.find(level, name) {
            Some(m) if !m.en_name.is_empty() => m.en_name.clone(),
            _ => name.to_string(),
        }
    }

    pub fn episode_of(&self, level: u32) -> Option<u32> {
        self.first_by_level(level).map(|m| m.episode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_70_hosts_two_maps() {
        let cat = Catalog::builtin();
        let hits = cat.by_level(70);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|m| m.episode == 8));
    }

    #[test]
    fn find_is_exact_on_level_and_name() {
        let cat = Catalog::builtin();
        assert!(cat.find(70, "水路橋地區").is_some());
        assert!(cat.find(70, "大教堂至聖所").is_none());
        assert!(cat.find(83, "大教堂至聖所").is_some());
    }

    #[test]
    fn star_toggle_by_name_only_touches_that_map() {
        let mut cat = Catalog::builtin();
        assert_eq!(cat.toggle_star(70, "阿雷魯諾男爵領"), Some(true));
        assert!(!cat.find(70, "水路橋地區").unwrap().is_starred);
        assert_eq!(cat.starred().len(), 1);
        assert_eq!(cat.toggle_star(70, "阿雷魯諾男爵領"), Some(false));
    }

    #[test]
    fn toggle_star_by_level_takes_first_match() {
        let mut cat = Catalog::builtin();
        cat.toggle_star_by_level(70);
        assert!(cat.find(70, "水路橋地區").unwrap().is_starred);
        assert!(!cat.find(70, "阿雷魯諾男爵領").unwrap().is_starred);
    }
}
