//! Title matching: exact buckets on the normalized title, then a single
//! seed-anchored fuzzy merge pass over the distinct titles.

use tracing::debug;

use super::buckets::Buckets;
use super::DuplicateGroup;
use crate::stash::Scene;

/// Titles must score strictly above this (0-100) to be merged.
pub const NAME_SIMILARITY_THRESHOLD: f64 = 85.0;

pub fn normalize_title(title: &str) -> String {
    title.to_lowercase().trim().to_string()
}

/// Indel-based similarity ratio on a 0-100 scale. Identical strings score 100.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    // rapidfuzz reports a normalized 0.0-1.0 score
    rapidfuzz::fuzz::ratio(a.chars(), b.chars()) * 100.0
}

/// Group scenes with equal or near-equal titles.
///
/// Distinct titles are walked in first-seen order. Each title not yet
/// consumed seeds a group and absorbs every later unconsumed title whose
/// similarity to the seed exceeds [`NAME_SIMILARITY_THRESHOLD`]. Absorbed
/// titles are never compared again, so matches do not chain through them.
/// Scenes with a blank title are ignored.
///
/// Quadratic in the number of distinct titles.
pub fn group_by_name(scenes: &[Scene]) -> Vec<DuplicateGroup<'_>> {
    let titled = scenes.iter().filter_map(|scene| {
        let title = normalize_title(&scene.title);
        (!title.is_empty()).then_some((title, scene))
    });
    let buckets = Buckets::from_pairs(titled).into_entries();

    let mut consumed = vec![false; buckets.len()];
    let mut groups = Vec::new();

    for (i, (seed, members)) in buckets.iter().enumerate() {
        if consumed[i] {
            continue;
        }

        let mut group = members.clone();

        for (j, (other, other_members)) in buckets.iter().enumerate().skip(i + 1) {
            if consumed[j] {
                continue;
            }

            let similarity = title_similarity(seed, other);
            if similarity > NAME_SIMILARITY_THRESHOLD {
                debug!("Merging {:?} into {:?} (similarity {:.1})", other, seed, similarity);
                group.extend(other_members.iter().copied());
                consumed[j] = true;
            }
        }

        consumed[i] = true;

        if group.len() >= 2 {
            groups.push(DuplicateGroup {
                key: seed.clone(),
                scenes: group,
            });
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titled(titles: &[&str]) -> Vec<Scene> {
        titles
            .iter()
            .enumerate()
            .map(|(i, t)| Scene::new(&(i + 1).to_string(), t))
            .collect()
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("The Great Escape"), "the great escape");
        assert_eq!(normalize_title("the great escape "), "the great escape");
        assert_eq!(normalize_title("   "), "");
    }

    #[test]
    fn test_similarity_scores() {
        assert_eq!(title_similarity("midnight run", "midnight run"), 100.0);
        assert!(title_similarity("summer vacation 2020", "summer vacation 2021") > 90.0);
        assert!(title_similarity("apple", "orange") < 50.0);
    }

    #[test]
    fn test_similarity_uses_percent_scale() {
        // 19 of 20 chars shared on each side: 1 - 2/40
        let score = title_similarity("summer vacation 2020", "summer vacation 2021");
        assert!((score - 95.0).abs() < 0.001, "score was {}", score);
        assert!(title_similarity("a", "b") >= 0.0);
        assert!(title_similarity("abc", "abd") > 1.0);
    }

    #[test]
    fn test_exact_match_after_normalization() {
        let scenes = titled(&["The Great Escape", "the great escape "]);

        let groups = group_by_name(&scenes);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "the great escape");
        assert_eq!(groups[0].scene_ids(), vec!["1", "2"]);
    }

    #[test]
    fn test_close_titles_merge() {
        let scenes = titled(&["Summer Vacation 2020", "Summer Vacation 2021"]);

        let groups = group_by_name(&scenes);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "summer vacation 2020");
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn test_distant_titles_stay_apart() {
        let scenes = titled(&["Apple", "Orange"]);
        assert!(group_by_name(&scenes).is_empty());
    }

    #[test]
    fn test_blank_titles_are_ignored() {
        let scenes = titled(&["", "  ", "", "Solo"]);
        assert!(group_by_name(&scenes).is_empty());
    }

    #[test]
    fn test_merge_does_not_chain_through_consumed_title() {
        // seed ~ middle (90), middle ~ tail (90), seed vs tail only 80
        let seed = "abcdefghijklmnopqrst";
        let middle = "abcdefghijklmnopqrzz";
        let tail = "abcdefghijklmnopzzzz";
        assert!(title_similarity(seed, middle) > NAME_SIMILARITY_THRESHOLD);
        assert!(title_similarity(middle, tail) > NAME_SIMILARITY_THRESHOLD);
        assert!(title_similarity(seed, tail) <= NAME_SIMILARITY_THRESHOLD);

        let upper_tail = tail.to_uppercase();
        let scenes = titled(&[seed, middle, tail, upper_tail.as_str()]);

        let groups = group_by_name(&scenes);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, seed);
        assert_eq!(groups[0].scene_ids(), vec!["1", "2"]);
        assert_eq!(groups[1].key, tail);
        assert_eq!(groups[1].scene_ids(), vec!["3", "4"]);
    }

    #[test]
    fn test_merged_bucket_members_follow_seed_members() {
        let scenes = titled(&["Midnight Run", "Midnight Runs", "midnight run"]);

        let groups = group_by_name(&scenes);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "midnight run");
        assert_eq!(groups[0].scene_ids(), vec!["1", "3", "2"]);
    }
}
