use serde::{Deserialize, Serialize};

/// Width of the id prefix used as the storage primary key.
pub const STORED_ID_LEN: usize = 10;

/// One container, as reported by the runtime or as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRecord {
    pub id: String,
    pub image: String,
    pub image_id: String,
    pub name: Option<String>,
    pub command: String,
    pub created: i64,
    pub state: String,
    pub status: String,
}

impl ContainerRecord {
    /// The record as it is persisted: same columns, id cut down to its
    /// first [`STORED_ID_LEN`] characters. Shorter ids are kept whole.
    ///
    /// Distinct ids sharing a prefix collide on this key.
    pub fn truncated(&self) -> Self {
        Self {
            id: truncate_id(&self.id).to_string(),
            ..self.clone()
        }
    }
}

pub fn truncate_id(id: &str) -> &str {
    match id.char_indices().nth(STORED_ID_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Docker reports names with a leading `/`. Only that single separator is
/// removed.
pub fn normalize_name(raw: &str) -> &str {
    raw.strip_prefix('/').unwrap_or(raw)
}
