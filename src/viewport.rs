use std::fmt;

/// Intersection transition of a frame's element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// The element started intersecting the viewport.
    Enter,
    /// The element stopped intersecting the viewport.
    Leave,
}

/// Scroll direction at the moment of a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Scroll position decreased or did not change.
    Up,
    /// Scroll position increased.
    Down,
}

/// Classified viewport event for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ViewportSignal {
    /// Enter or leave.
    pub action: Action,
    /// Scroll direction when it happened.
    pub direction: Direction,
}

impl ViewportSignal {
    /// Build a signal.
    pub fn new(action: Action, direction: Direction) -> Self {
        Self { action, direction }
    }

    /// `ENTER_DOWN`, `LEAVE_UP`, ...
    pub fn state(self) -> &'static str {
        match (self.action, self.direction) {
            (Action::Enter, Direction::Up) => "ENTER_UP",
            (Action::Enter, Direction::Down) => "ENTER_DOWN",
            (Action::Leave, Direction::Up) => "LEAVE_UP",
            (Action::Leave, Direction::Down) => "LEAVE_DOWN",
        }
    }

    /// Return `true` for an enter in either direction.
    pub fn is_enter(self) -> bool {
        self.action == Action::Enter
    }

    /// Return `true` for a leave while scrolling up.
    pub fn is_leave_up(self) -> bool {
        self.action == Action::Leave && self.direction == Direction::Up
    }
}

impl fmt::Display for ViewportSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.state())
    }
}

/// Tracks the last two scroll samples to derive a direction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollTracker {
    y: f64,
    last_y: f64,
}

impl ScrollTracker {
    /// Tracker whose first sample is `y`.
    pub fn new(y: f64) -> Self {
        Self { y, last_y: y }
    }

    /// Current scroll offset.
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Previous scroll offset.
    pub fn last_y(&self) -> f64 {
        self.last_y
    }

    /// Record a new scroll offset.
    pub fn update(&mut self, y: f64) {
        self.last_y = self.y;
        self.y = y;
    }

    /// `Down` iff the latest sample moved further down the page.
    pub fn direction(&self) -> Direction {
        if self.y > self.last_y {
            Direction::Down
        } else {
            Direction::Up
        }
    }

    /// Classify a raw intersection flag against the current scroll direction.
    pub fn classify(&self, is_intersecting: bool) -> ViewportSignal {
        let action = if is_intersecting {
            Action::Enter
        } else {
            Action::Leave
        };
        ViewportSignal::new(action, self.direction())
    }
}
