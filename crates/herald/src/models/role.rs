use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// The author of a message in the conversation history
///
/// The system instructions are never part of the history, providers place them
/// ahead of it on the wire.
pub enum Role {
    User,
    Assistant,
}
