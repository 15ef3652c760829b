use super::buckets::Buckets;
use super::DuplicateGroup;
use crate::stash::Scene;

/// Group scenes sharing a Stash ID.
///
/// Identifiers are compared as-is (case-sensitive). Blank identifiers are
/// skipped, and a scene carrying several identifiers can show up in several
/// groups.
pub fn group_by_identifier(scenes: &[Scene]) -> Vec<DuplicateGroup<'_>> {
    let pairs = scenes.iter().flat_map(|scene| {
        scene
            .external_ids
            .iter()
            .filter(|id| !id.trim().is_empty())
            .map(move |id| (id.as_str(), scene))
    });

    Buckets::from_pairs(pairs).into_groups()
}
