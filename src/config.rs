use std::collections::BTreeSet;
use std::path::Path;

use crate::foundation::core::{FrameId, Millis};
use crate::foundation::error::{SeqError, SeqResult};
use crate::timing::FrameTimings;

/// Static configuration of one frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameConfig {
    /// Stable identifier; sequence order is the list position, not this value.
    pub id: FrameId,
    /// Explicit completion delay. Takes precedence over `timings`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation_duration_ms: Option<u64>,
    /// Element timing table the completion delay is derived from when no explicit value is set.
    #[serde(default, skip_serializing_if = "FrameTimings::is_empty")]
    pub timings: FrameTimings,
    /// Initial element binding key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
}

impl FrameConfig {
    /// Frame with an explicit duration and no binding.
    pub fn new(id: u32, animation_duration_ms: u64) -> Self {
        Self {
            id: FrameId(id),
            animation_duration_ms: Some(animation_duration_ms),
            timings: FrameTimings::default(),
            element: None,
        }
    }

    /// Frame whose duration is derived from a timing table.
    pub fn from_timings(id: u32, timings: FrameTimings) -> Self {
        Self {
            id: FrameId(id),
            animation_duration_ms: None,
            timings,
            element: None,
        }
    }

    /// Attach an initial element binding.
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    /// Completion delay for this frame.
    pub fn resolved_duration(&self) -> SeqResult<Millis> {
        match self.animation_duration_ms {
            Some(ms) => Ok(Millis(ms)),
            None if !self.timings.is_empty() => Ok(self.timings.total_duration()),
            None => Err(SeqError::config(format!(
                "frame {} needs animation_duration_ms or timings",
                self.id
            ))),
        }
    }
}

/// Frame configuration after duration resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedFrame {
    /// Stable identifier.
    pub id: FrameId,
    /// Completion delay, always non-zero.
    pub animation_duration: Millis,
    /// Initial element binding key.
    pub element: Option<String>,
}

/// When a predecessor counts as satisfied for its successor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatePolicy {
    /// Predecessor is inactive, or active with its animation complete.
    #[default]
    InactiveOrComplete,
    /// Predecessor must be active with its animation complete.
    CompleteOnly,
}

/// What LEAVE does to the entry frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryLeavePolicy {
    /// Record the viewport change only.
    #[default]
    Retain,
    /// Deactivate the entry frame on any LEAVE.
    Deactivate,
}

/// What LEAVE does to frames after the entry frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeavePolicy {
    /// Deactivate (and drop any pending wait) only when leaving while scrolling up.
    #[default]
    LeaveUp,
    /// Deactivate on LEAVE in either direction.
    AnyLeave,
    /// Never deactivate on LEAVE; viewport flags are still tracked.
    Never,
}

/// How the whole sequence returns to its initial state.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ResetPolicy {
    /// Reset when the scroll position crosses below `threshold_px`.
    ScrollToTop {
        /// Scroll offset below which the page counts as "at the top".
        threshold_px: f64,
    },
    /// Only an explicit reset call resets the sequence.
    Manual,
    /// Resets are refused; the sequence only ever moves forward or deactivates per frame.
    Never,
}

impl Default for ResetPolicy {
    fn default() -> Self {
        Self::ScrollToTop { threshold_px: 10.0 }
    }
}

/// Named bundle of the behavioral choices that differ between page revisions.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SequencePolicy {
    /// Predecessor gating rule.
    pub gate: GatePolicy,
    /// Entry frame LEAVE handling.
    pub entry_leave: EntryLeavePolicy,
    /// LEAVE handling for frames after the entry frame.
    pub leave: LeavePolicy,
    /// Whole-sequence reset trigger.
    pub reset: ResetPolicy,
}

impl SequencePolicy {
    /// Reset on scroll-to-top, lenient gating, LEAVE_UP deactivation. This is the default.
    pub fn scroll_reset() -> Self {
        Self::default()
    }

    /// Same as [`SequencePolicy::scroll_reset`] but only an explicit reset call resets.
    pub fn manual_reset() -> Self {
        Self {
            reset: ResetPolicy::Manual,
            ..Self::default()
        }
    }

    /// Full completion required, entry frame deactivates on LEAVE, manual reset.
    pub fn strict() -> Self {
        Self {
            gate: GatePolicy::CompleteOnly,
            entry_leave: EntryLeavePolicy::Deactivate,
            leave: LeavePolicy::LeaveUp,
            reset: ResetPolicy::Manual,
        }
    }
}

/// Visual strategy used when a frame is deactivated. The state change is the same in every mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeactivateMode {
    /// Cut straight to the inactive look.
    #[default]
    Immediate,
    /// Fade out, then cut.
    FadeOut,
    /// Play the reverse transition.
    Animated,
}

fn default_settle_delay_ms() -> u64 {
    100
}

fn default_fade_out_ms() -> u64 {
    500
}

fn default_reset_settle_ms() -> u64 {
    100
}

fn default_reset_mode() -> DeactivateMode {
    DeactivateMode::FadeOut
}

/// Static configuration of one sequence of frames.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SequenceConfig {
    /// Frames in sequence order.
    pub frames: Vec<FrameConfig>,
    /// Behavioral policy.
    #[serde(default)]
    pub policy: SequencePolicy,
    /// Delay between attaching observers and the initial viewport reconciliation.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Length of the fade-out / animated deactivation transition.
    #[serde(default = "default_fade_out_ms")]
    pub fade_out_ms: u64,
    /// Extra settle time after a reset transition before frames are re-evaluated.
    #[serde(default = "default_reset_settle_ms")]
    pub reset_settle_ms: u64,
    /// Transition used for frames deactivated by a reset.
    #[serde(default = "default_reset_mode")]
    pub reset_mode: DeactivateMode,
}

impl SequenceConfig {
    /// Config with default policy and delays.
    pub fn new(frames: Vec<FrameConfig>) -> Self {
        Self {
            frames,
            policy: SequencePolicy::default(),
            settle_delay_ms: default_settle_delay_ms(),
            fade_out_ms: default_fade_out_ms(),
            reset_settle_ms: default_reset_settle_ms(),
            reset_mode: default_reset_mode(),
        }
    }

    /// Replace the policy.
    pub fn with_policy(mut self, policy: SequencePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Parse from a JSON string.
    pub fn from_json_str(s: &str) -> SeqResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Parse from a JSON file.
    pub fn from_path(path: &Path) -> SeqResult<Self> {
        let s = std::fs::read_to_string(path).map_err(|e| {
            SeqError::config(format!("read config '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&s)
    }

    /// Check structural constraints.
    pub fn validate(&self) -> SeqResult<()> {
        if self.frames.is_empty() {
            return Err(SeqError::config("sequence must contain at least one frame"));
        }
        let mut seen = BTreeSet::new();
        for frame in &self.frames {
            if !seen.insert(frame.id) {
                return Err(SeqError::config(format!(
                    "duplicate frame id {}",
                    frame.id
                )));
            }
            if frame.resolved_duration()?.is_zero() {
                return Err(SeqError::config(format!(
                    "frame {} animation duration must be > 0",
                    frame.id
                )));
            }
            if frame.element.as_deref().is_some_and(|e| e.trim().is_empty()) {
                return Err(SeqError::config(format!(
                    "frame {} element binding must be non-empty",
                    frame.id
                )));
            }
        }
        if self.settle_delay_ms == 0 {
            return Err(SeqError::config("settle_delay_ms must be > 0"));
        }
        if let ResetPolicy::ScrollToTop { threshold_px } = self.policy.reset
            && !(threshold_px.is_finite() && threshold_px >= 0.0)
        {
            return Err(SeqError::config(
                "scroll-to-top threshold must be a finite, non-negative offset",
            ));
        }
        Ok(())
    }

    /// Validate and resolve every frame's completion delay.
    pub fn resolve(&self) -> SeqResult<Vec<ResolvedFrame>> {
        self.validate()?;
        self.frames
            .iter()
            .map(|f| {
                Ok(ResolvedFrame {
                    id: f.id,
                    animation_duration: f.resolved_duration()?,
                    element: f.element.clone(),
                })
            })
            .collect()
    }

    /// Length of the reset transition for `mode`.
    pub fn transition_len(&self, mode: DeactivateMode) -> Millis {
        match mode {
            DeactivateMode::Immediate => Millis::ZERO,
            DeactivateMode::FadeOut | DeactivateMode::Animated => Millis(self.fade_out_ms),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
