use super::buckets::Buckets;
use super::DuplicateGroup;
use crate::stash::Scene;

/// Group scenes by exact fingerprint value of the given kind.
///
/// Every matching fingerprint contributes one entry, so a scene with two
/// files sharing a value fills a bucket on its own. Perceptual hashes are
/// compared as opaque strings, not by distance.
pub fn group_by_fingerprint_kind<'a>(scenes: &'a [Scene], kind: &str) -> Vec<DuplicateGroup<'a>> {
    let pairs = scenes.iter().flat_map(move |scene| {
        scene
            .fingerprints_of(kind)
            .filter(|value| !value.is_empty())
            .map(move |value| (value, scene))
    });

    Buckets::from_pairs(pairs).into_groups()
}
