//! Simulation time bookkeeping.

/// The time interval covered by one update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeSpan {
    start: f32,
    duration: f32,
}

impl TimeSpan {
    /// A span of `duration` seconds starting at `start`.
    pub const fn new(start: f32, duration: f32) -> Self {
        Self { start, duration }
    }

    /// Start of the span.
    pub fn start(&self) -> f32 {
        self.start
    }

    /// Length of the span.
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// End of the span.
    pub fn end(&self) -> f32 {
        self.start + self.duration
    }
}

/// Current simulation time and the update in progress, if any.
///
/// An update is opened with [`start_update`](Self::start_update) and closed
/// with [`end_update`](Self::end_update), which advances the clock by the
/// update's duration. Opening twice or closing while idle is a caller bug
/// and panics.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationTime {
    current: f32,
    update: Option<TimeSpan>,
    steps: u64,
}

impl SimulationTime {
    /// A clock at `start` with no update in progress.
    pub fn new(start: f32) -> Self {
        Self {
            current: start,
            update: None,
            steps: 0,
        }
    }

    /// Open an update of `dt` seconds at the current time.
    ///
    /// # Panics
    ///
    /// Panics if an update is already in progress.
    #[track_caller]
    pub fn start_update(&mut self, dt: f32) {
        assert!(
            self.update.is_none(),
            "start_update called while an update is already in progress"
        );
        self.update = Some(TimeSpan::new(self.current, dt));
    }

    /// Close the current update and advance the clock to its end.
    ///
    /// # Panics
    ///
    /// Panics if no update is in progress.
    #[track_caller]
    pub fn end_update(&mut self) {
        match self.update.take() {
            Some(span) => {
                self.current = span.end();
                self.steps += 1;
            }
            None => panic!("end_update called with no update in progress"),
        }
    }

    /// Drop the current update without advancing the clock.
    pub fn abandon_update(&mut self) {
        self.update = None;
    }

    /// Time at the start of the current update, or after the last one.
    pub fn current_time(&self) -> f32 {
        self.current
    }

    /// The span of the update in progress.
    ///
    /// # Panics
    ///
    /// Panics if no update is in progress.
    #[track_caller]
    pub fn update_span(&self) -> TimeSpan {
        match self.update {
            Some(span) => span,
            None => panic!("update_span called with no update in progress"),
        }
    }

    /// Whether an update is in progress.
    pub fn is_updating(&self) -> bool {
        self.update.is_some()
    }

    /// Number of completed updates.
    pub fn step_count(&self) -> u64 {
        self.steps
    }
}

impl Default for SimulationTime {
    fn default() -> Self {
        Self::new(0.0)
    }
}
