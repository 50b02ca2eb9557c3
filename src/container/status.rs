/// Lifecycle phase derived from the free-form status text reported by the
/// runtime, e.g. `"Up 3 days"` or `"Exited (0) 2 hours ago"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Running,
    Exited,
    /// Anything we do not recognise ("Created", "Paused", "Restarting", ...).
    Other,
}

/// Only the first whitespace-delimited token is inspected.
pub fn classify(status: &str) -> LifecyclePhase {
    match status.split_whitespace().next() {
        Some("Up") => LifecyclePhase::Running,
        Some("Exited") => LifecyclePhase::Exited,
        Some(_) | None => LifecyclePhase::Other,
    }
}
