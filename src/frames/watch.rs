use std::collections::BTreeMap;

/// Identity of one registration. Never reused within a registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WatchId(u64);

/// A suspended "activate me once my predecessor allows it".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Watch {
    /// Registration identity.
    pub id: WatchId,
    /// Position being observed.
    pub predecessor: usize,
}

/// Disposer returned by [`WatchRegistry::register`].
///
/// Disposing is a no-op when the watch it refers to was already replaced or disposed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct WatchDisposer {
    frame: usize,
    id: WatchId,
}

impl WatchDisposer {
    /// Position of the waiting frame.
    pub fn frame(&self) -> usize {
        self.frame
    }
}

/// Pending dependency watches keyed by the waiting frame's position.
///
/// At most one watch exists per frame: registering again replaces the previous one.
#[derive(Debug, Default)]
pub struct WatchRegistry {
    watches: BTreeMap<usize, Watch>,
    next_id: u64,
    replaced: u64,
}

impl WatchRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a watch for `frame` on `predecessor`, disposing any existing one first.
    pub fn register(&mut self, frame: usize, predecessor: usize) -> WatchDisposer {
        if self.dispose(frame) {
            self.replaced += 1;
        }
        let id = WatchId(self.next_id);
        self.next_id += 1;
        self.watches.insert(frame, Watch { id, predecessor });
        WatchDisposer { frame, id }
    }

    /// Remove the watch for `frame`. Returns `false` when there was none.
    pub fn dispose(&mut self, frame: usize) -> bool {
        self.watches.remove(&frame).is_some()
    }

    /// Remove the watch behind `disposer` if it is still the current one for its frame.
    pub fn dispose_handle(&mut self, disposer: WatchDisposer) -> bool {
        match self.watches.get(&disposer.frame) {
            Some(w) if w.id == disposer.id => self.dispose(disposer.frame),
            _ => false,
        }
    }

    /// Watch currently registered for `frame`.
    pub fn get(&self, frame: usize) -> Option<Watch> {
        self.watches.get(&frame).copied()
    }

    /// Return `true` while `frame` waits on its predecessor.
    pub fn contains(&self, frame: usize) -> bool {
        self.watches.contains_key(&frame)
    }

    /// Waiting frames observing `predecessor`, in position order.
    pub fn watching(&self, predecessor: usize) -> impl Iterator<Item = usize> + '_ {
        self.watches
            .iter()
            .filter(move |(_, w)| w.predecessor == predecessor)
            .map(|(&frame, _)| frame)
    }

    /// Number of pending watches.
    pub fn len(&self) -> usize {
        self.watches.len()
    }

    /// Return `true` when nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    /// How many registrations replaced a still-pending watch.
    pub fn replaced(&self) -> u64 {
        self.replaced
    }

    /// Dispose every watch.
    pub fn clear(&mut self) {
        self.watches.clear();
    }
}
