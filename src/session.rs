use std::collections::BTreeMap;

use tracing::debug;

use crate::config::SequenceConfig;
use crate::foundation::core::Millis;
use crate::foundation::error::{SeqError, SeqResult};
use crate::frames::coordinator::SequentialFrames;
use crate::frames::events::FrameEvent;

/// Options for [`ScrollSession::open`].
#[derive(Clone, Debug, Default)]
pub struct SessionOpts {
    /// Scroll offset at page load.
    pub initial_scroll_y: f64,
}

/// Handle to a sequence registered in a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SequenceKey(usize);

/// A frame event tagged with the sequence that produced it.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SessionEvent {
    /// Sequence name.
    pub sequence: String,
    /// The event itself.
    #[serde(flatten)]
    pub event: FrameEvent,
}

/// Explicitly owned scroll-animation session.
///
/// Holds the page clock, the scroll position and every frame sequence on the page. Nothing is
/// global: hosts construct a session, feed it input, and close it when the page goes away.
#[derive(Debug)]
pub struct ScrollSession {
    open: bool,
    now: Millis,
    scroll_y: f64,
    names: BTreeMap<String, SequenceKey>,
    sequences: Vec<(String, SequentialFrames)>,
}

impl ScrollSession {
    /// Open a session at clock time zero.
    pub fn open(opts: SessionOpts) -> Self {
        debug!(initial_scroll_y = opts.initial_scroll_y, "scroll session opened");
        Self {
            open: true,
            now: Millis::ZERO,
            scroll_y: opts.initial_scroll_y,
            names: BTreeMap::new(),
            sequences: Vec::new(),
        }
    }

    /// Return `true` until [`ScrollSession::close`] succeeds.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Session clock.
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Last scroll offset.
    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    /// Number of registered sequences.
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// Return `true` when no sequence is registered.
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Register a named sequence.
    #[tracing::instrument(level = "debug", skip(self, config))]
    pub fn add_sequence(&mut self, name: &str, config: SequenceConfig) -> SeqResult<SequenceKey> {
        self.ensure_open()?;
        if self.names.contains_key(name) {
            return Err(SeqError::session(format!(
                "sequence '{name}' is already registered"
            )));
        }

        let mut seq = SequentialFrames::new(config)?;
        seq.advance_to(self.now);
        seq.set_scroll_origin(self.scroll_y);

        let key = SequenceKey(self.sequences.len());
        self.sequences.push((name.to_owned(), seq));
        self.names.insert(name.to_owned(), key);
        Ok(key)
    }

    /// Look up a sequence by name.
    pub fn key(&self, name: &str) -> Option<SequenceKey> {
        self.names.get(name).copied()
    }

    /// Borrow a sequence. Reads stay available after close.
    pub fn sequence(&self, key: SequenceKey) -> SeqResult<&SequentialFrames> {
        self.sequences
            .get(key.0)
            .map(|(_, s)| s)
            .ok_or_else(|| SeqError::session("unknown sequence key"))
    }

    fn sequence_mut(&mut self, key: SequenceKey) -> SeqResult<&mut SequentialFrames> {
        self.ensure_open()?;
        self.sequences
            .get_mut(key.0)
            .map(|(_, s)| s)
            .ok_or_else(|| SeqError::session("unknown sequence key"))
    }

    /// Record a scroll offset for every sequence.
    pub fn scroll_to(&mut self, y: f64) -> SeqResult<()> {
        self.ensure_open()?;
        self.scroll_y = y;
        for (_, seq) in &mut self.sequences {
            seq.on_scroll(y);
        }
        Ok(())
    }

    /// Deliver a raw intersection change for one frame.
    pub fn intersect(&mut self, key: SequenceKey, position: usize, visible: bool) -> SeqResult<()> {
        self.sequence_mut(key)?.on_intersection(position, visible);
        Ok(())
    }

    /// Bind a frame to a rendered element. Returns `false` for unknown positions.
    pub fn bind(&mut self, key: SequenceKey, position: usize, element: &str) -> SeqResult<bool> {
        Ok(self.sequence_mut(key)?.bind(position, element))
    }

    /// Attach one sequence's observers.
    pub fn attach(&mut self, key: SequenceKey) -> SeqResult<()> {
        self.sequence_mut(key)?.attach();
        Ok(())
    }

    /// Attach every registered sequence.
    pub fn attach_all(&mut self) -> SeqResult<()> {
        self.ensure_open()?;
        for (_, seq) in &mut self.sequences {
            seq.attach();
        }
        Ok(())
    }

    /// Reset one sequence. `Ok(false)` when the request was dropped.
    pub fn reset(&mut self, key: SequenceKey) -> SeqResult<bool> {
        Ok(self.sequence_mut(key)?.reset_all())
    }

    /// Move the session clock to `t`.
    pub fn advance_to(&mut self, t: Millis) -> SeqResult<()> {
        self.ensure_open()?;
        if t < self.now {
            return Err(SeqError::session(format!(
                "clock cannot move backwards ({} -> {})",
                self.now, t
            )));
        }
        for (_, seq) in &mut self.sequences {
            seq.advance_to(t);
        }
        self.now = t;
        Ok(())
    }

    /// Move the session clock forward by `d`.
    pub fn advance_by(&mut self, d: Millis) -> SeqResult<()> {
        self.advance_to(self.now.saturating_add(d))
    }

    /// Take every recorded event, ordered by time and then by sequence registration.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut out = Vec::new();
        for (name, seq) in &mut self.sequences {
            out.extend(seq.drain_events().into_iter().map(|event| SessionEvent {
                sequence: name.clone(),
                event,
            }));
        }
        // Stable: per-sequence order survives for equal timestamps.
        out.sort_by_key(|e| e.event.at);
        out
    }

    /// Tear down every sequence and return the events that were not drained yet.
    pub fn close(&mut self) -> SeqResult<Vec<SessionEvent>> {
        self.ensure_open()?;
        let events = self.drain_events();
        for (_, seq) in &mut self.sequences {
            seq.teardown();
        }
        self.open = false;
        debug!(sequences = self.sequences.len(), "scroll session closed");
        Ok(events)
    }

    fn ensure_open(&self) -> SeqResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(SeqError::session("session is closed"))
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/session.rs"]
mod tests;
