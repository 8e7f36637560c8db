/// Position within a run of steps, for progress bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepProgress {
    /// Zero-based index of the step on screen.
    pub position: usize,
    pub total: usize,
    pub is_complete: bool,
}

impl StepProgress {
    /// Share of the run reached, counting the step on screen as reached.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f32 {
        if self.is_complete {
            return 1.0;
        }
        if self.total == 0 {
            return 0.0;
        }
        (self.position + 1).min(self.total) as f32 / self.total as f32
    }
}
