//! Static disease knowledge: label to cause, treatment, and prevention.
//!
//! Loaded once at startup and read-only thereafter. Lookup is a total
//! function: labels missing from the table resolve to the "Healthy"
//! entry, so every accepted diagnosis carries advisory text.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Label the fallback entry is keyed under. Every table must contain it.
pub const HEALTHY_LABEL: &str = "Healthy";

/// Advisory text for one disease label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub cause: String,
    pub treatment: String,
    pub prevention: String,
}

/// Immutable label-to-advice table consulted for accepted diagnoses.
#[derive(Debug)]
pub struct KnowledgeBase {
    entries: HashMap<String, KnowledgeEntry>,
}

impl KnowledgeBase {
    /// The built-in mango disease table.
    pub fn builtin() -> Self {
        let table: &[(&str, &str, &str, &str)] = &[
            (
                "Anthracnose",
                "Fungal infection causing dark sunken lesions on leaves and fruits.",
                "Spray Carbendazim 0.1% or Copper Oxychloride 0.3%",
                "Avoid overhead irrigation and prune infected parts",
            ),
            (
                "Bacterial Canker",
                "Bacterial disease causing cracking and oozing lesions.",
                "Spray Streptocycline (0.01%) with Copper fungicide",
                "Use disease-free planting material",
            ),
            (
                "Powdery Mildew",
                "White powdery fungal growth on leaves and panicles.",
                "Spray Sulphur 0.2% or Hexaconazole",
                "Maintain proper air circulation",
            ),
            (
                "Die Back",
                "Fungal disease causing drying of branches from tips.",
                "Prune affected branches and spray Carbendazim",
                "Apply Bordeaux paste on cut surfaces",
            ),
            (
                "Sooty Mould",
                "Fungal growth on honeydew secreted by insects.",
                "Control insects using Imidacloprid",
                "Manage aphids and scale insects",
            ),
            (
                "Gall Midge",
                "Insect pest damaging flowers and young shoots.",
                "Spray Thiamethoxam or Lambda-cyhalothrin",
                "Timely pest monitoring",
            ),
            (
                "Cutting Weevil",
                "Beetle cutting tender shoots and buds.",
                "Spray Chlorpyrifos 0.05%",
                "Remove and destroy affected shoots",
            ),
            (
                HEALTHY_LABEL,
                "No disease detected.",
                "No treatment required",
                "Maintain good orchard hygiene",
            ),
        ];

        let entries = table
            .iter()
            .map(|&(label, cause, treatment, prevention)| {
                (
                    label.to_string(),
                    KnowledgeEntry {
                        cause: cause.to_string(),
                        treatment: treatment.to_string(),
                        prevention: prevention.to_string(),
                    },
                )
            })
            .collect();

        Self { entries }
    }

    /// Build a table from deserialized entries.
    ///
    /// The "Healthy" entry anchors the fallback and must be present.
    pub fn from_entries(entries: HashMap<String, KnowledgeEntry>) -> Result<Self> {
        if !entries.contains_key(HEALTHY_LABEL) {
            return Err(Error::Config(format!(
                "knowledge table has no '{HEALTHY_LABEL}' entry"
            )));
        }
        Ok(Self { entries })
    }

    /// Load a replacement table from a JSON file mapping label to entry.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("read {}: {e}", path.display())))?;
        let entries: HashMap<String, KnowledgeEntry> = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("parse {}: {e}", path.display())))?;
        Self::from_entries(entries)
    }

    /// Advisory text for a label, falling back to the "Healthy" entry.
    ///
    /// The fallback can only fire when the classifier's label list and
    /// this table have drifted apart, so it is logged loudly.
    pub fn lookup(&self, label: &str) -> &KnowledgeEntry {
        if let Some(entry) = self.entries.get(label) {
            return entry;
        }
        warn!(label, "label missing from knowledge table, using the Healthy entry");
        &self.entries[HEALTHY_LABEL]
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}
