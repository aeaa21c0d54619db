//! Request and response bodies.

use parley_common::DialogueId;
use serde::{Deserialize, Serialize};

/// Turn on the server's default dialogue. Both prompts are required.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default, alias = "sys_prompt")]
    pub system_prompt: String,
    #[serde(default)]
    pub user_prompt: String,
}

/// Turn on a specific dialogue. Without a system prompt this is a
/// follow-up turn, which needs a stateful dialogue.
#[derive(Debug, Deserialize)]
pub struct DialogueChatRequest {
    #[serde(default, alias = "sys_prompt")]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub user_prompt: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateDialogueRequest {
    #[serde(default)]
    pub stateful: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateDialogueResponse {
    pub id: DialogueId,
    pub stateful: bool,
}
