//! `seqframes` coordinates scroll-driven, multi-stage visual sequences.
//!
//! A sequence is an ordered list of frames. Each frame activates when its element enters the
//! viewport, but only once its predecessor has finished (or, under the lenient gate, is not
//! running at all). Completion is a cancellable timer per activation. Everything is
//! single-threaded and driven by the host:
//!
//! - Describe the page with a [`SequenceConfig`]
//! - Open a [`ScrollSession`] and register sequences
//! - Feed scroll offsets, intersection changes and clock advances
//! - Read per-frame state or drain [`FrameEvent`]s for the rendering layer
#![forbid(unsafe_code)]

mod foundation;

pub mod config;
mod frames;
pub mod replay;
pub mod schedule;
pub mod session;
pub mod timing;
pub mod viewport;

pub use crate::config::{
    DeactivateMode, EntryLeavePolicy, FrameConfig, GatePolicy, LeavePolicy, ResetPolicy,
    ResolvedFrame, SequenceConfig, SequencePolicy,
};
pub use crate::foundation::core::{FrameId, Millis};
pub use crate::foundation::error::{SeqError, SeqResult};
pub use crate::frames::coordinator::SequentialFrames;
pub use crate::frames::events::{FrameEvent, FrameEventKind};
pub use crate::frames::gate::can_activate;
pub use crate::frames::store::{Frame, FrameSnapshot, FrameStore};
pub use crate::frames::watch::{Watch, WatchDisposer, WatchId, WatchRegistry};
pub use crate::replay::{
    InMemoryTimeline, JsonLinesSink, ReplayScript, ReplayStats, ScriptStep, StepOp,
    TimelineSink, run_replay,
};
pub use crate::schedule::{Scheduler, TaskHandle};
pub use crate::session::{ScrollSession, SequenceKey, SessionEvent, SessionOpts};
pub use crate::timing::FrameTimings;
pub use crate::viewport::{Action, Direction, ScrollTracker, ViewportSignal};
