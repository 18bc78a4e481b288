use crate::config::DeactivateMode;
use crate::foundation::core::{FrameId, Millis};

/// What happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FrameEventKind {
    /// Frame became active; its completion timer started.
    Activated,
    /// Frame's animation duration elapsed while it stayed active.
    Completed,
    /// Frame became inactive.
    Deactivated {
        /// Presentation strategy requested for the transition.
        mode: DeactivateMode,
    },
    /// Frame is waiting for its predecessor.
    WaitRegistered,
    /// A pending wait was torn down before it resolved.
    WaitCancelled,
    /// Frame has no element binding and is not observed.
    Skipped,
    /// A whole-sequence reset began.
    ResetStarted,
    /// A reset request arrived while another was in flight and was dropped.
    ResetDropped,
    /// A reset settled; frames were re-evaluated against the viewport.
    ResetFinished,
}

/// Output signal consumed by the rendering layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct FrameEvent {
    /// Clock time of the change.
    pub at: Millis,
    /// Sequence position; absent for sequence-wide events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    /// Stable frame id; absent for sequence-wide events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<FrameId>,
    /// Event payload.
    #[serde(flatten)]
    pub kind: FrameEventKind,
}

impl FrameEvent {
    pub(crate) fn frame(at: Millis, position: usize, id: FrameId, kind: FrameEventKind) -> Self {
        Self {
            at,
            position: Some(position),
            frame_id: Some(id),
            kind,
        }
    }

    pub(crate) fn sequence(at: Millis, kind: FrameEventKind) -> Self {
        Self {
            at,
            position: None,
            frame_id: None,
            kind,
        }
    }
}
