use portal_core::model::ModuleId;

/// Completion of a single module, useful for UI.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleProgress {
    pub module_id: ModuleId,
    pub completed: usize,
    pub total: usize,
    pub percent: f64,
}

/// Aggregated view of course progress, useful for UI.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerProgress {
    pub completed: usize,
    pub total: usize,
    pub percent: f64,
    pub modules: Vec<ModuleProgress>,
    pub is_complete: bool,
}

/// Percentage of `done` over `total`, 0 when there is nothing to do.
#[must_use]
pub(crate) fn ratio(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let percent = done as f64 * 100.0 / total as f64;
    percent.clamp(0.0, 100.0)
}
