use crate::config::ResolvedFrame;
use crate::foundation::core::{FrameId, Millis};
use crate::schedule::TaskHandle;

/// One stage of the sequence.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Stable identifier from configuration.
    pub id: FrameId,
    pub(crate) is_active: bool,
    pub(crate) is_animation_complete: bool,
    pub(crate) animation_duration: Millis,
    pub(crate) binding: Option<String>,
    pub(crate) in_viewport: bool,
    pub(crate) skipped: bool,
    pub(crate) completion: Option<TaskHandle>,
}

impl Frame {
    fn new(resolved: &ResolvedFrame) -> Self {
        Self {
            id: resolved.id,
            is_active: false,
            is_animation_complete: false,
            animation_duration: resolved.animation_duration,
            binding: resolved.element.clone(),
            in_viewport: false,
            skipped: false,
            completion: None,
        }
    }

    /// Visual transition has been triggered.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// `animation_duration` has elapsed since the current activation.
    pub fn is_animation_complete(&self) -> bool {
        self.is_animation_complete
    }

    /// Completion delay.
    pub fn animation_duration(&self) -> Millis {
        self.animation_duration
    }

    /// Element binding key, if bound.
    pub fn binding(&self) -> Option<&str> {
        self.binding.as_deref()
    }

    /// Last known intersection state.
    pub fn in_viewport(&self) -> bool {
        self.in_viewport
    }

    /// Left unobserved at attach time because no element was bound.
    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    fn reset(&mut self) {
        self.is_active = false;
        self.is_animation_complete = false;
        self.completion = None;
    }
}

/// Serializable view of a frame for the rendering layer.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct FrameSnapshot {
    /// Position in the sequence.
    pub position: usize,
    /// Stable identifier.
    pub id: FrameId,
    /// Visual transition triggered.
    pub is_active: bool,
    /// Transition finished.
    pub is_animation_complete: bool,
    /// Last known intersection state.
    pub in_viewport: bool,
}

/// Ordered frame list. Order is fixed at construction.
#[derive(Clone, Debug)]
pub struct FrameStore {
    frames: Vec<Frame>,
}

impl FrameStore {
    /// Build the store from resolved configuration, all frames inactive.
    pub fn new(resolved: &[ResolvedFrame]) -> Self {
        Self {
            frames: resolved.iter().map(Frame::new).collect(),
        }
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Return `true` for a store with no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame at `position`.
    pub fn get(&self, position: usize) -> Option<&Frame> {
        self.frames.get(position)
    }

    pub(crate) fn get_mut(&mut self, position: usize) -> Option<&mut Frame> {
        self.frames.get_mut(position)
    }

    /// `false` for out-of-range positions.
    pub fn is_active(&self, position: usize) -> bool {
        self.get(position).is_some_and(Frame::is_active)
    }

    /// `false` for out-of-range positions.
    pub fn is_animation_complete(&self, position: usize) -> bool {
        self.get(position).is_some_and(Frame::is_animation_complete)
    }

    /// Position of the frame with `id`.
    pub fn position_of(&self, id: FrameId) -> Option<usize> {
        self.frames.iter().position(|f| f.id == id)
    }

    /// Iterate frames in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    pub(crate) fn set_binding(&mut self, position: usize, element: Option<String>) -> bool {
        match self.frames.get_mut(position) {
            Some(f) => {
                if element.is_some() {
                    f.skipped = false;
                }
                f.binding = element;
                true
            }
            None => false,
        }
    }

    pub(crate) fn mark_skipped(&mut self, position: usize) {
        if let Some(f) = self.frames.get_mut(position) {
            f.skipped = true;
        }
    }

    pub(crate) fn set_in_viewport(&mut self, position: usize, in_viewport: bool) {
        if let Some(f) = self.frames.get_mut(position) {
            f.in_viewport = in_viewport;
        }
    }

    /// Drop all state back to "inactive, incomplete". Timer handles are forgotten, not cancelled.
    pub(crate) fn reset_all(&mut self) {
        self.frames.iter_mut().for_each(Frame::reset);
    }

    /// Snapshot of every frame in order.
    pub fn snapshot(&self) -> Vec<FrameSnapshot> {
        self.frames
            .iter()
            .enumerate()
            .map(|(position, f)| FrameSnapshot {
                position,
                id: f.id,
                is_active: f.is_active,
                is_animation_complete: f.is_animation_complete,
                in_viewport: f.in_viewport,
            })
            .collect()
    }
}
