use serde::Serialize;

use super::action::{Action, Verdict, decide};
use super::snapshot::snapshot;
use super::status::classify;
use crate::error::CorralError;
use crate::runtime::RuntimeClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The runtime was asked to start or stop the container.
    Applied,
    /// The container was already in the requested state (or in a state the
    /// action does not apply to); the runtime was not contacted again.
    #[serde(rename = "noop")]
    NoOp,
}

/// Starts or stops the container whose name is exactly `name`.
///
/// Takes a snapshot including stopped containers, so at most one mutation is
/// issued per call. If the daemon reports the same name twice, the first
/// entry in its order wins.
pub async fn apply(
    runtime: &dyn RuntimeClient,
    name: &str,
    action: Action,
) -> Result<Outcome, CorralError> {
    let containers = snapshot(runtime, true).await?;

    let mut matches = containers
        .iter()
        .filter(|c| c.name.as_deref() == Some(name));
    let Some(container) = matches.next() else {
        return Err(CorralError::ContainerNotFound(name.to_string()));
    };
    let duplicates = matches.count();
    if duplicates > 0 {
        log::warn!(
            "Runtime reported {} containers named {}, using {}",
            duplicates + 1,
            name,
            container.id
        );
    }

    let phase = classify(&container.status);
    match decide(phase, action) {
        Verdict::Issue => {
            match action {
                Action::Start => runtime.start_container(&container.id).await?,
                Action::Stop => runtime.stop_container(&container.id).await?,
            }
            log::info!("Container {} ({}): {} issued", name, container.id, action);
            Ok(Outcome::Applied)
        }
        Verdict::Skip => {
            log::debug!(
                "Container {} is {:?} ({}), skipping {}",
                name,
                phase,
                container.status,
                action
            );
            Ok(Outcome::NoOp)
        }
    }
}
