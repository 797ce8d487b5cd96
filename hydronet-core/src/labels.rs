//! Registry of user-visible labels.
//!
//! Labels are unique per asset type. Generated labels use a type prefix and
//! the lowest free index (`J1`, `P3`, `PU2`...), while labels derived from an
//! existing one (when a pipe is split) append a counter (`P1_1`, `P1_2`...).

use std::sync::LazyLock;

use fxhash::FxHashMap;
use regex::Regex;

use crate::asset::AssetType;
use crate::core::AssetId;

/// Maximum length of a derived label.
pub const MAX_LABEL_LENGTH: usize = 31;

static COUNTER_SUFFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)_(\d+)$").unwrap());

/// Label prefix for generated labels of each asset type.
#[must_use]
pub fn prefix(asset_type: AssetType) -> &'static str {
    match asset_type {
        AssetType::Pipe => "P",
        AssetType::Junction => "J",
        AssetType::Reservoir => "R",
        AssetType::Tank => "T",
        AssetType::Pump => "PU",
        AssetType::Valve => "V",
    }
}

/// Generates default labels for new assets.
pub trait LabelGenerator {
    /// Generates a label unused among assets of `asset_type` and registers it
    /// for `id`.
    fn generate_for(&mut self, asset_type: AssetType, id: AssetId) -> String;
}

/// Tracks which labels are in use, and by which assets.
#[derive(Debug, Clone, Default)]
pub struct LabelManager {
    /// Lowest index that may be free, per type.
    next_index: FxHashMap<AssetType, u32>,
    /// Owners of each label.
    owners: FxHashMap<String, Vec<(AssetType, AssetId)>>,
}

impl LabelManager {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the index of a generated label, e.g. `3` for `"PU3"`.
    fn generated_index(label: &str, asset_type: AssetType) -> Option<u32> {
        let digits = label.strip_prefix(prefix(asset_type))?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    fn lower_next_index(&mut self, label: &str, asset_type: AssetType) {
        if let Some(index) = Self::generated_index(label, asset_type) {
            let next = self.next_index.entry(asset_type).or_insert(1);
            *next = (*next).min(index);
        }
    }

    /// Records that `id` uses `label`. Registering the same pair twice has no
    /// effect.
    pub fn register(&mut self, label: &str, asset_type: AssetType, id: AssetId) {
        if self
            .owners
            .get(label)
            .is_some_and(|owners| owners.iter().any(|(_, owner)| *owner == id))
        {
            return;
        }
        self.lower_next_index(label, asset_type);
        self.owners
            .entry(label.to_owned())
            .or_default()
            .push((asset_type, id));
    }

    /// Records that `id` no longer uses `label`.
    pub fn remove(&mut self, label: &str, asset_type: AssetType, id: AssetId) {
        self.lower_next_index(label, asset_type);
        if let Some(owners) = self.owners.get_mut(label) {
            owners.retain(|(_, owner)| *owner != id);
            if owners.is_empty() {
                self.owners.remove(label);
            }
        }
    }

    /// Number of assets using `label`, of any type.
    #[must_use]
    pub fn count(&self, label: &str) -> usize {
        self.owners.get(label).map_or(0, Vec::len)
    }

    /// Whether an asset of `asset_type` uses `label`.
    #[must_use]
    pub fn is_taken(&self, label: &str, asset_type: AssetType) -> bool {
        self.owners
            .get(label)
            .is_some_and(|owners| owners.iter().any(|(t, _)| *t == asset_type))
    }

    /// Derives an unused label from `label` by appending or incrementing a
    /// `_N` counter, truncating the base so the result fits
    /// [`MAX_LABEL_LENGTH`]. The returned label is not registered.
    #[must_use]
    pub fn next_label(&self, label: &str) -> String {
        let (base, mut counter) = match COUNTER_SUFFIX_REGEX.captures(label) {
            Some(caps) => {
                let base = caps.get(1).map_or("", |m| m.as_str());
                let current: u64 = caps[2].parse().unwrap_or(0);
                (base, current + 1)
            }
            None => (label, 1),
        };
        loop {
            let suffix = format!("_{counter}");
            let max_base = MAX_LABEL_LENGTH.saturating_sub(suffix.len());
            let candidate: String = base.chars().take(max_base).chain(suffix.chars()).collect();
            if self.count(&candidate) == 0 {
                return candidate;
            }
            counter += 1;
        }
    }
}

impl LabelGenerator for LabelManager {
    fn generate_for(&mut self, asset_type: AssetType, id: AssetId) -> String {
        let mut index = self.next_index.get(&asset_type).copied().unwrap_or(1);
        let label = loop {
            let candidate = format!("{}{index}", prefix(asset_type));
            if !self.is_taken(&candidate, asset_type) {
                break candidate;
            }
            index += 1;
        };
        self.next_index.insert(asset_type, index);
        self.owners
            .entry(label.clone())
            .or_default()
            .push((asset_type, id));
        label
    }
}
