use serde::Serialize;

use super::status::LifecyclePhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Start,
    Stop,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Start => write!(f, "start"),
            Action::Stop => write!(f, "stop"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Issue,
    Skip,
}

/// Start is only issued against an exited container and stop only against a
/// running one. `Other` never satisfies either precondition.
pub fn decide(phase: LifecyclePhase, action: Action) -> Verdict {
    match (action, phase) {
        (Action::Start, LifecyclePhase::Exited) => Verdict::Issue,
        (Action::Stop, LifecyclePhase::Running) => Verdict::Issue,
        _ => Verdict::Skip,
    }
}
