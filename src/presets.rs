//! Profile documents on disk
//!
//! Profiles are JSON files mapping a key to a [`MappingSpec`]. Two document
//! shapes share the same format: hardware profiles key by control id
//! (`"encoder_1"`), functional profiles key by channel-function name
//! (`"EQ_LOW_FREQ"`). The store only reads and writes raw documents; the
//! engine decides what a document means.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::events::ControlId;
use crate::functions::ChannelFunction;
use crate::mapping::{Mapping, MappingMode, MappingTarget};

/// One mapping as stored in a profile document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingSpec {
    pub target: MappingTarget,
    #[serde(default = "default_mode")]
    pub mode: MappingMode,
    #[serde(default)]
    pub min_val: u8,
    #[serde(default = "default_max_val")]
    pub max_val: u8,
}

impl MappingSpec {
    pub fn from_mapping(mapping: &Mapping) -> Self {
        Self {
            target: mapping.target,
            mode: mapping.mode,
            min_val: mapping.min_val,
            max_val: mapping.max_val,
        }
    }

    /// Build a runtime mapping, taking the label from the caller since
    /// documents carry none. Inverted bounds in a hand-edited document are
    /// normalized by swapping; a bad profile must never reach `clamp` with
    /// `min > max`.
    pub fn into_mapping(self, label: String) -> Mapping {
        let (min_val, max_val) = if self.min_val <= self.max_val {
            (self.min_val, self.max_val)
        } else {
            (self.max_val, self.min_val)
        };
        Mapping {
            label,
            target: self.target,
            mode: self.mode,
            min_val,
            max_val,
            enabled: true,
        }
    }
}

/// Raw profile document as stored on disk.
pub type ProfileDoc = HashMap<String, MappingSpec>;

/// True when every key in the document names a channel function, i.e. the
/// document is a functional (plugin) profile rather than a hardware one.
pub fn is_functional(doc: &ProfileDoc) -> bool {
    !doc.is_empty() && doc.keys().all(|k| ChannelFunction::from_key(k).is_some())
}

/// Serialize a runtime mapping table back into document form, keyed by
/// control id.
pub fn doc_from_mappings(mappings: &HashMap<ControlId, Mapping>) -> ProfileDoc {
    mappings
        .iter()
        .map(|(id, m)| (id.to_string(), MappingSpec::from_mapping(m)))
        .collect()
}

/// Serialize a plugin parameter map back into document form, keyed by
/// function name.
pub fn doc_from_functions(map: &HashMap<ChannelFunction, MappingSpec>) -> ProfileDoc {
    map.iter()
        .map(|(f, spec)| (f.key().to_string(), spec.clone()))
        .collect()
}

/// Reduce a profile name to a stable filename stem: lowercase, alphanumerics
/// kept, everything else replaced with `_`.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "default".to_string()
    } else {
        cleaned
    }
}

/// Directory of profile documents.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_name(name)))
    }

    /// Load a profile document. `Ok(None)` when no file exists for the name;
    /// an error means the file exists but cannot be read or parsed.
    pub async fn load(&self, name: &str) -> Result<Option<ProfileDoc>> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read profile file: {}", path.display()))?;

        let doc: ProfileDoc = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse profile JSON: {}", path.display()))?;

        Ok(Some(doc))
    }

    /// Write a profile document, creating the profile directory on first use.
    pub async fn save(&self, name: &str, doc: &ProfileDoc) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create profile dir: {}", self.dir.display()))?;

        let json = serde_json::to_string_pretty(doc)
            .context("Failed to serialize profile to JSON")?;

        let path = self.path_for(name);
        fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write profile file: {}", path.display()))?;

        Ok(())
    }

    /// Names of all stored profiles (filename stems), sorted.
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(_) => return Ok(names), // no directory yet, nothing stored
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }
}

fn default_mode() -> MappingMode {
    MappingMode::Absolute
}

fn default_max_val() -> u8 {
    127
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::TargetKind;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Global"), "global");
        assert_eq!(sanitize_name("  My Synth!"), "my_synth_");
        assert_eq!(sanitize_name("TAL-U-NO-LX-V2"), "tal_u_no_lx_v2");
        assert_eq!(sanitize_name("   "), "default");
    }

    #[test]
    fn test_spec_defaults_from_wire() {
        // target only, everything else defaulted
        let spec: MappingSpec = serde_json::from_str(
            r#"{"target": {"type": "MIDI_CC", "channel": 0, "identifier": 10}}"#,
        )
        .unwrap();

        assert_eq!(spec.target, MappingTarget::cc(0, 10));
        assert_eq!(spec.mode, MappingMode::Absolute);
        assert_eq!(spec.min_val, 0);
        assert_eq!(spec.max_val, 127);
    }

    #[test]
    fn test_full_wire_document() {
        let json = r#"{
            "encoder_1": {
                "target": {"type": "MIDI_CC", "channel": 2, "identifier": 74},
                "mode": "ABSOLUTE",
                "min_val": 10,
                "max_val": 100
            },
            "button_1": {
                "target": {"type": "MIDI_NOTE", "channel": 0, "identifier": 40}
            }
        }"#;

        let doc: ProfileDoc = serde_json::from_str(json).unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc["encoder_1"].min_val, 10);
        assert_eq!(doc["button_1"].target.kind, TargetKind::MidiNote);
        assert!(!is_functional(&doc));
    }

    #[test]
    fn test_is_functional() {
        let mut doc = ProfileDoc::new();
        doc.insert(
            "EQ_LOW_FREQ".to_string(),
            MappingSpec {
                target: MappingTarget::cc(0, 20),
                mode: MappingMode::Absolute,
                min_val: 0,
                max_val: 127,
            },
        );
        assert!(is_functional(&doc));

        doc.insert(
            "encoder_3".to_string(),
            MappingSpec {
                target: MappingTarget::cc(0, 21),
                mode: MappingMode::Absolute,
                min_val: 0,
                max_val: 127,
            },
        );
        assert!(!is_functional(&doc)); // mixed keys are not functional

        assert!(!is_functional(&ProfileDoc::new()));
    }

    #[test]
    fn test_inverted_bounds_are_swapped() {
        let spec: MappingSpec = serde_json::from_str(
            r#"{
                "target": {"type": "MIDI_CC", "channel": 0, "identifier": 30},
                "min_val": 100,
                "max_val": 50
            }"#,
        )
        .unwrap();

        let mapping = spec.into_mapping("Cutoff".to_string());
        assert_eq!((mapping.min_val, mapping.max_val), (50, 100));
        assert_eq!(mapping.clamp(5), 50);
        assert_eq!(mapping.clamp(120), 100);
    }

    #[test]
    fn test_doc_from_functions_keys_by_name() {
        let mut map = HashMap::new();
        map.insert(
            ChannelFunction::EqLowFreq,
            MappingSpec {
                target: MappingTarget::cc(0, 80),
                mode: MappingMode::Absolute,
                min_val: 0,
                max_val: 127,
            },
        );

        let doc = doc_from_functions(&map);
        assert_eq!(doc.len(), 1);
        assert_eq!(doc["EQ_LOW_FREQ"].target, MappingTarget::cc(0, 80));
        assert!(is_functional(&doc));
    }

    #[test]
    fn test_mapping_roundtrip_keeps_range() {
        let mapping = Mapping::new("Cutoff".to_string(), MappingTarget::cc(1, 74));
        let spec = MappingSpec::from_mapping(&mapping);
        let back = spec.into_mapping("Cutoff".to_string());
        assert_eq!(back, mapping);
    }

    #[tokio::test]
    async fn test_store_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(tmp.path().join("profiles"));

        let mut doc = ProfileDoc::new();
        doc.insert(
            "encoder_1".to_string(),
            MappingSpec {
                target: MappingTarget::cc(0, 10),
                mode: MappingMode::Absolute,
                min_val: 0,
                max_val: 127,
            },
        );

        store.save("My Synth", &doc).await.unwrap();
        let loaded = store.load("My Synth").await.unwrap().unwrap();
        assert_eq!(loaded, doc);

        // sanitized stem on disk
        assert!(store.dir().join("my_synth.json").exists());
        assert_eq!(store.list().await.unwrap(), vec!["my_synth".to_string()]);
    }

    #[tokio::test]
    async fn test_store_missing_and_invalid() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(tmp.path());

        assert!(store.load("nothing").await.unwrap().is_none());

        tokio::fs::write(store.path_for("broken"), b"{not json")
            .await
            .unwrap();
        assert!(store.load("broken").await.is_err());
    }
}
