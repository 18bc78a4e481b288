//! Scripted host input for offline inspection of a sequence.
//!
//! A [`ReplayScript`] is a static configuration plus timestamped host events (scroll offsets,
//! intersection changes, binding and reset calls). Running it drives a [`ScrollSession`] and
//! streams the resulting frame events into a [`TimelineSink`].

use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::config::SequenceConfig;
use crate::foundation::core::Millis;
use crate::foundation::error::{SeqError, SeqResult};
use crate::frames::store::FrameSnapshot;
use crate::session::{ScrollSession, SessionEvent, SessionOpts};

const SEQUENCE_NAME: &str = "main";

/// One host operation.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StepOp {
    /// New scroll offset.
    Scroll {
        /// Offset in pixels.
        y: f64,
    },
    /// Intersection change for a frame position.
    Intersect {
        /// Sequence position.
        frame: usize,
        /// Whether the element now intersects the viewport.
        visible: bool,
    },
    /// Bind a frame to an element.
    Bind {
        /// Sequence position.
        frame: usize,
        /// Element key.
        element: String,
    },
    /// Attach observers.
    Attach,
    /// Explicit reset call.
    Reset,
    /// Let time pass without input.
    Advance,
}

/// A host operation at a point in time.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScriptStep {
    /// Clock time of the operation.
    pub at_ms: u64,
    /// The operation.
    #[serde(flatten)]
    pub op: StepOp,
}

/// Configuration plus ordered host input.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReplayScript {
    /// Sequence under test.
    pub config: SequenceConfig,
    /// Scroll offset at page load.
    #[serde(default)]
    pub initial_scroll_y: f64,
    /// Host input in non-decreasing time order.
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

impl ReplayScript {
    /// Parse from a JSON string.
    pub fn from_json_str(s: &str) -> SeqResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Parse from a JSON file.
    pub fn from_path(path: &Path) -> SeqResult<Self> {
        let s = std::fs::read_to_string(path).map_err(|e| {
            SeqError::replay(format!("read script '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&s)
    }

    /// Check step ordering and the embedded configuration.
    pub fn validate(&self) -> SeqResult<()> {
        self.config.validate()?;
        for pair in self.steps.windows(2) {
            if pair[1].at_ms < pair[0].at_ms {
                return Err(SeqError::replay(format!(
                    "steps must be in time order ({}ms after {}ms)",
                    pair[1].at_ms, pair[0].at_ms
                )));
            }
        }
        Ok(())
    }

    /// Time of the last step.
    pub fn last_step_at(&self) -> Millis {
        Millis(self.steps.last().map_or(0, |s| s.at_ms))
    }
}

/// Consumer of replay output.
///
/// `begin` is called once, `push` once per event in time order, `end` once with the final
/// frame states.
pub trait TimelineSink {
    /// Called before the first event.
    fn begin(&mut self, frames: usize) -> SeqResult<()>;
    /// Receive one event.
    fn push(&mut self, event: &SessionEvent) -> SeqResult<()>;
    /// Called after the last event.
    fn end(&mut self, final_state: &[FrameSnapshot]) -> SeqResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemoryTimeline {
    /// Events in the order received.
    pub events: Vec<SessionEvent>,
    /// Final frame states, set by `end`.
    pub final_state: Vec<FrameSnapshot>,
    began: bool,
}

impl InMemoryTimeline {
    /// Empty timeline.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimelineSink for InMemoryTimeline {
    fn begin(&mut self, _frames: usize) -> SeqResult<()> {
        self.began = true;
        Ok(())
    }

    fn push(&mut self, event: &SessionEvent) -> SeqResult<()> {
        if !self.began {
            return Err(SeqError::replay("push before begin"));
        }
        self.events.push(event.clone());
        Ok(())
    }

    fn end(&mut self, final_state: &[FrameSnapshot]) -> SeqResult<()> {
        self.final_state = final_state.to_vec();
        Ok(())
    }
}

/// Writes one JSON object per event, then one `final` record.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wrap a writer.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, value: &impl serde::Serialize) -> SeqResult<()> {
        serde_json::to_writer(&mut self.out, value)?;
        self.out
            .write_all(b"\n")
            .map_err(|e| SeqError::Other(e.into()))
    }
}

impl<W: Write> TimelineSink for JsonLinesSink<W> {
    fn begin(&mut self, _frames: usize) -> SeqResult<()> {
        Ok(())
    }

    fn push(&mut self, event: &SessionEvent) -> SeqResult<()> {
        self.write_line(event)
    }

    fn end(&mut self, final_state: &[FrameSnapshot]) -> SeqResult<()> {
        #[derive(serde::Serialize)]
        struct Final<'a> {
            r#final: &'a [FrameSnapshot],
        }
        self.write_line(&Final {
            r#final: final_state,
        })?;
        self.out.flush().map_err(|e| SeqError::Other(e.into()))
    }
}

/// Summary of a replay run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Script steps applied.
    pub steps: usize,
    /// Events emitted to the sink.
    pub events: usize,
    /// Clock time the run stopped at.
    pub end: Millis,
}

/// Run `script` until `until` (or its last step, whichever is later) and stream events.
#[tracing::instrument(level = "debug", skip(script, sink))]
pub fn run_replay(
    script: &ReplayScript,
    until: Option<Millis>,
    sink: &mut dyn TimelineSink,
) -> SeqResult<ReplayStats> {
    script.validate()?;

    let mut session = ScrollSession::open(SessionOpts {
        initial_scroll_y: script.initial_scroll_y,
    });
    let key = session.add_sequence(SEQUENCE_NAME, script.config.clone())?;
    sink.begin(session.sequence(key)?.len())?;

    let mut stats = ReplayStats::default();
    for step in &script.steps {
        session.advance_to(Millis(step.at_ms))?;
        flush(&mut session, sink, &mut stats)?;

        match &step.op {
            StepOp::Scroll { y } => session.scroll_to(*y)?,
            StepOp::Intersect { frame, visible } => session.intersect(key, *frame, *visible)?,
            StepOp::Bind { frame, element } => {
                if !session.bind(key, *frame, element)? {
                    debug!(frame, "bind step names an unknown frame");
                }
            }
            StepOp::Attach => session.attach(key)?,
            StepOp::Reset => {
                session.reset(key)?;
            }
            StepOp::Advance => {}
        }
        stats.steps += 1;
        flush(&mut session, sink, &mut stats)?;
    }

    let end = until
        .unwrap_or_else(|| script.last_step_at())
        .max(script.last_step_at());
    session.advance_to(end)?;
    flush(&mut session, sink, &mut stats)?;

    sink.end(&session.sequence(key)?.snapshot())?;
    let leftover = session.close()?;
    debug_assert!(leftover.is_empty());
    stats.end = end;
    Ok(stats)
}

fn flush(
    session: &mut ScrollSession,
    sink: &mut dyn TimelineSink,
    stats: &mut ReplayStats,
) -> SeqResult<()> {
    for event in session.drain_events() {
        sink.push(&event)?;
        stats.events += 1;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/replay.rs"]
mod tests;
