//! Duplicate detection over a fetched scene catalog.
//!
//! Four independent strategies, all pure functions of the scene list:
//! Stash ID, fuzzy title, `oshash` and `phash`. Groups borrow scenes from
//! the caller's snapshot and always hold at least two entries.

mod buckets;
mod fingerprint;
mod identifier;
mod name;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::error::Error;
use crate::stash::{Scene, OSHASH, PHASH};

pub use fingerprint::group_by_fingerprint_kind;
pub use identifier::group_by_identifier;
pub use name::{group_by_name, normalize_title, title_similarity, NAME_SIMILARITY_THRESHOLD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Strategy {
    #[serde(rename = "stashid")]
    Identifier,
    #[serde(rename = "name")]
    FuzzyName,
    #[serde(rename = "oshash")]
    ContentHash,
    #[serde(rename = "phash")]
    PerceptualHash,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Identifier,
        Strategy::FuzzyName,
        Strategy::ContentHash,
        Strategy::PerceptualHash,
    ];

    /// Selector used on the command line.
    pub fn slug(&self) -> &'static str {
        match self {
            Strategy::Identifier => "stashid",
            Strategy::FuzzyName => "name",
            Strategy::ContentHash => OSHASH,
            Strategy::PerceptualHash => PHASH,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Identifier => "Stash ID",
            Strategy::FuzzyName => "Name (Fuzzy Match)",
            Strategy::ContentHash => "OSHASH",
            Strategy::PerceptualHash => "PHASH",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.slug() == s)
            .ok_or_else(|| Error::UnknownStrategy(s.to_string()))
    }
}

/// Scenes considered duplicates of each other under one strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup<'a> {
    /// Stash ID, normalized title or fingerprint value
    pub key: String,
    /// In order of encounter; a scene may repeat for fingerprint groups
    pub scenes: Vec<&'a Scene>,
}

impl<'a> DuplicateGroup<'a> {
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn scene_ids(&self) -> Vec<&'a str> {
        self.scenes.iter().map(|s| s.id.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateReport<'a> {
    pub strategy: Strategy,
    pub groups: Vec<DuplicateGroup<'a>>,
    pub group_count: usize,
    /// Sum of group sizes; a scene counts once per group entry
    pub total_grouped_scene_count: usize,
}

impl<'a> DuplicateReport<'a> {
    pub fn new(strategy: Strategy, groups: Vec<DuplicateGroup<'a>>) -> Self {
        let total_grouped_scene_count = groups.iter().map(|g| g.len()).sum();
        Self {
            strategy,
            group_count: groups.len(),
            groups,
            total_grouped_scene_count,
        }
    }

    pub fn label(&self) -> &'static str {
        self.strategy.label()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Run one strategy over the whole catalog.
pub fn find_duplicates(scenes: &[Scene], strategy: Strategy) -> DuplicateReport<'_> {
    let groups = match strategy {
        Strategy::Identifier => group_by_identifier(scenes),
        Strategy::FuzzyName => group_by_name(scenes),
        Strategy::ContentHash => group_by_fingerprint_kind(scenes, OSHASH),
        Strategy::PerceptualHash => group_by_fingerprint_kind(scenes, PHASH),
    };

    let report = DuplicateReport::new(strategy, groups);
    info!(
        "{} strategy: {} groups, {} grouped scenes out of {}",
        strategy.label(),
        report.group_count,
        report.total_grouped_scene_count,
        scenes.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stash::FileRecord;

    fn sample_catalog() -> Vec<Scene> {
        vec![
            Scene::new("1", "Midnight Run")
                .with_file(FileRecord::default().with_fingerprint(OSHASH, "o1").with_fingerprint(PHASH, "p1")),
            Scene::new("2", "Heat")
                .with_external_id("st-99")
                .with_file(FileRecord::default().with_fingerprint(OSHASH, "o2").with_fingerprint(PHASH, "p2")),
            Scene::new("3", "midnight run")
                .with_file(FileRecord::default().with_fingerprint(OSHASH, "o3").with_fingerprint(PHASH, "p3")),
            Scene::new("4", "Ronin")
                .with_external_id("st-99")
                .with_file(FileRecord::default().with_fingerprint(OSHASH, "o4").with_fingerprint(PHASH, "p4")),
            Scene::new("5", "Collateral")
                .with_external_id("st-5")
                .with_file(FileRecord::default().with_fingerprint(OSHASH, "o5").with_fingerprint(PHASH, "p5")),
        ]
    }

    #[test]
    fn test_end_to_end_catalog() {
        let scenes = sample_catalog();

        let by_id = find_duplicates(&scenes, Strategy::Identifier);
        assert_eq!(by_id.group_count, 1);
        assert_eq!(by_id.total_grouped_scene_count, 2);
        assert_eq!(by_id.groups[0].key, "st-99");
        assert_eq!(by_id.groups[0].scene_ids(), vec!["2", "4"]);

        let by_name = find_duplicates(&scenes, Strategy::FuzzyName);
        assert_eq!(by_name.group_count, 1);
        assert_eq!(by_name.groups[0].key, "midnight run");
        assert_eq!(by_name.groups[0].scene_ids(), vec!["1", "3"]);

        assert!(find_duplicates(&scenes, Strategy::ContentHash).is_empty());
        let by_phash = find_duplicates(&scenes, Strategy::PerceptualHash);
        assert!(by_phash.is_empty());
        assert_eq!(by_phash.group_count, 0);
        assert_eq!(by_phash.total_grouped_scene_count, 0);
    }

    #[test]
    fn test_total_counts_scene_once_per_group() {
        let scenes = vec![
            Scene::new("1", "").with_external_id("A").with_external_id("B"),
            Scene::new("2", "").with_external_id("A"),
            Scene::new("3", "").with_external_id("B"),
        ];

        let report = find_duplicates(&scenes, Strategy::Identifier);
        assert_eq!(report.group_count, 2);
        assert_eq!(report.total_grouped_scene_count, 4);
    }

    #[test]
    fn test_total_includes_fingerprint_multiplicity() {
        let file = || FileRecord::default().with_fingerprint(OSHASH, "xyz");
        let scenes = vec![
            Scene::new("1", "").with_file(file()).with_file(file()),
            Scene::new("2", "").with_file(file()),
        ];

        let report = find_duplicates(&scenes, Strategy::ContentHash);
        assert_eq!(report.group_count, 1);
        assert_eq!(report.total_grouped_scene_count, 3);
    }

    #[test]
    fn test_every_group_has_at_least_two_entries() {
        let scenes = sample_catalog();
        for strategy in Strategy::ALL {
            let report = find_duplicates(&scenes, strategy);
            assert!(report.groups.iter().all(|g| g.len() >= 2), "{}", strategy);
        }
    }

    #[test]
    fn test_strategies_are_deterministic() {
        let mut scenes = sample_catalog();
        scenes.push(Scene::new("6", "Heat 2").with_external_id("st-5"));
        scenes.push(Scene::new("7", "heat").with_external_id("st-99"));

        for strategy in Strategy::ALL {
            let first = find_duplicates(&scenes, strategy);
            let second = find_duplicates(&scenes, strategy);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_parse_strategy() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.slug().parse::<Strategy>().unwrap(), strategy);
        }
        assert_eq!("name".parse::<Strategy>().unwrap().label(), "Name (Fuzzy Match)");
    }

    #[test]
    fn test_unknown_strategy_is_an_error() {
        match "md5".parse::<Strategy>() {
            Err(Error::UnknownStrategy(selector)) => assert_eq!(selector, "md5"),
            other => panic!("expected UnknownStrategy, got {:?}", other),
        }
        assert!("".parse::<Strategy>().is_err());
        assert!("OSHASH".parse::<Strategy>().is_err());
    }
}
