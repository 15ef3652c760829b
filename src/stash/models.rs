//! Scene records as consumed by the duplicate finder.
//!
//! The wire shape of `findScenes` is slightly awkward (nullable titles,
//! Stash IDs wrapped in objects, `type` instead of `kind`), so responses are
//! deserialized into `Raw*` structs and normalized into the public types.

use serde::{Deserialize, Deserializer, Serialize};

/// Content hash fingerprint kind.
pub const OSHASH: &str = "oshash";
/// Perceptual hash fingerprint kind.
pub const PHASH: &str = "phash";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub id: String,
    pub title: String,
    pub external_ids: Vec<String>,
    pub files: Vec<FileRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileRecord {
    pub basename: Option<String>,
    pub path: Option<String>,
    pub size: Option<u64>,
    pub bit_rate: Option<u64>,
    pub height: Option<u32>,
    pub duration: Option<f64>,
    pub video_codec: Option<String>,
    pub fingerprints: Vec<Fingerprint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

/// One fetch of the whole catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SceneCatalog {
    /// Total reported by the server
    pub count: usize,
    pub scenes: Vec<Scene>,
}

impl Scene {
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            external_ids: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn with_external_id(mut self, id: &str) -> Self {
        self.external_ids.push(id.to_string());
        self
    }

    pub fn with_file(mut self, file: FileRecord) -> Self {
        self.files.push(file);
        self
    }

    /// Path of the first file, used when listing a scene.
    pub fn primary_path(&self) -> Option<&str> {
        self.files.first().and_then(|f| f.path.as_deref())
    }

    /// Every fingerprint value of `kind` across all files, in file order.
    pub fn fingerprints_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.files
            .iter()
            .flat_map(|f| f.fingerprints.iter())
            .filter(move |fp| fp.kind == kind)
            .map(|fp| fp.value.as_str())
    }
}

impl FileRecord {
    pub fn with_fingerprint(mut self, kind: &str, value: &str) -> Self {
        self.fingerprints.push(Fingerprint {
            kind: kind.to_string(),
            value: value.to_string(),
        });
        self
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct RawFindScenes {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub scenes: Vec<RawScene>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawScene {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub stash_ids: Vec<RawStashId>,
    #[serde(default)]
    pub files: Vec<RawFile>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawStashId {
    #[serde(default)]
    pub stash_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawFile {
    #[serde(default)]
    pub basename: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub size: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub bit_rate: Option<u64>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub video_codec: Option<String>,
    #[serde(default)]
    pub fingerprints: Vec<Fingerprint>,
}

impl From<RawFindScenes> for SceneCatalog {
    fn from(raw: RawFindScenes) -> Self {
        Self {
            count: raw.count,
            scenes: raw.scenes.into_iter().map(Scene::from).collect(),
        }
    }
}

impl From<RawScene> for Scene {
    fn from(raw: RawScene) -> Self {
        Self {
            id: raw.id,
            title: raw.title.unwrap_or_default(),
            external_ids: raw
                .stash_ids
                .into_iter()
                .map(|s| s.stash_id.unwrap_or_default())
                .collect(),
            files: raw.files.into_iter().map(FileRecord::from).collect(),
        }
    }
}

impl From<RawFile> for FileRecord {
    fn from(raw: RawFile) -> Self {
        Self {
            basename: raw.basename,
            path: raw.path,
            size: raw.size,
            bit_rate: raw.bit_rate,
            height: raw.height,
            duration: raw.duration,
            video_codec: raw.video_codec,
            fingerprints: raw.fingerprints,
        }
    }
}

/// Int64 scalars may be sent as numbers or as numeric strings.
fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(NumberOrString::Number(n)) => Some(n),
        Some(NumberOrString::Float(f)) if f >= 0.0 => Some(f as u64),
        Some(NumberOrString::Text(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalizes_raw_scene() {
        let raw: RawScene = serde_json::from_value(json!({
            "id": "12",
            "title": null,
            "stash_ids": [{ "stash_id": "st-1" }, { "stash_id": null }],
            "files": [{
                "path": "/media/a.mp4",
                "size": "1048576",
                "duration": 61.5,
                "fingerprints": [{ "type": "oshash", "value": "abc123" }]
            }]
        }))
        .unwrap();

        let scene = Scene::from(raw);
        assert_eq!(scene.title, "");
        assert_eq!(scene.external_ids, vec!["st-1".to_string(), String::new()]);
        assert_eq!(scene.files[0].size, Some(1_048_576));
        assert_eq!(scene.files[0].fingerprints[0].kind, OSHASH);
        assert_eq!(scene.primary_path(), Some("/media/a.mp4"));
    }

    #[test]
    fn test_fingerprints_of_filters_by_kind() {
        let scene = Scene::new("1", "a")
            .with_file(
                FileRecord::default()
                    .with_fingerprint(OSHASH, "o1")
                    .with_fingerprint(PHASH, "p1"),
            )
            .with_file(FileRecord::default().with_fingerprint(OSHASH, "o2"));

        let oshashes: Vec<&str> = scene.fingerprints_of(OSHASH).collect();
        assert_eq!(oshashes, vec!["o1", "o2"]);
        let phashes: Vec<&str> = scene.fingerprints_of(PHASH).collect();
        assert_eq!(phashes, vec!["p1"]);
    }
}
