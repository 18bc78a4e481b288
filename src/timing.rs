//! Per-frame timing tables.
//!
//! A frame's visual transition is usually several staggered element animations (image crop,
//! cross-fade, text reveal). The coordinator only needs the total time until the last of them
//! finishes, which is what [`FrameTimings::total_duration`] derives.

use std::collections::BTreeMap;

use crate::foundation::core::Millis;

const DURATION_SUFFIX: &str = "_DURATION";
const DELAY_SUFFIX: &str = "_DELAY";

/// Named element timings for one frame, e.g. `TEXT_DURATION = 1000`, `TEXT_DELAY = 300`.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct FrameTimings(pub BTreeMap<String, u64>);

impl FrameTimings {
    /// Build from `(key, ms)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, u64)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect(),
        )
    }

    /// Return `true` when no timing entries are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Longest animation chain in the table.
    ///
    /// Every `X_DELAY` paired with an `X_DURATION` contributes `delay + duration`; every bare
    /// `X_DURATION` contributes itself. A delay with no matching duration contributes nothing.
    pub fn total_duration(&self) -> Millis {
        let mut max = 0u64;
        for (key, &value) in &self.0 {
            if let Some(base) = key.strip_suffix(DELAY_SUFFIX) {
                let duration_key = format!("{base}{DURATION_SUFFIX}");
                if let Some(&duration) = self.0.get(&duration_key) {
                    max = max.max(value.saturating_add(duration));
                }
            } else if key.ends_with(DURATION_SUFFIX) {
                max = max.max(value);
            }
        }
        Millis(max)
    }
}
