//! Request bodies for the dialogue endpoints.
//!
//! Absent or `null` fields decode to empty values. Only invalid JSON and
//! wrongly typed fields are rejected.

use serde::{Deserialize, Deserializer, Serialize};

use agora_llm::{Message, Role};

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn empty_role() -> Role {
    Role::Other(String::new())
}

fn role_or_empty<'de, D>(deserializer: D) -> Result<Role, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .map(Role::from)
        .unwrap_or_else(empty_role))
}

/// A prior turn as submitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ClientMessage {
    #[serde(default = "empty_role", deserialize_with = "role_or_empty")]
    #[schema(value_type = String, example = "user")]
    pub role: Role,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    /// Display name; accepted but not forwarded upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<ClientMessage> for Message {
    fn from(msg: ClientMessage) -> Self {
        Message {
            role: msg.role,
            content: msg.content,
        }
    }
}

/// Continue an existing dialogue.
///
/// The web client sends `selectedFigure` / `selectedTopic`; when both spellings
/// are present, `figure` / `topic` win.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(from = "ContinueBody")]
pub struct ContinueRequest {
    /// Newest user message (also expected as the last entry of `messages`).
    pub message: String,
    pub messages: Vec<ClientMessage>,
    pub mode: String,
    pub figure: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

#[derive(Deserialize)]
struct ContinueBody {
    #[serde(default, deserialize_with = "null_as_default")]
    message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    messages: Vec<ClientMessage>,
    #[serde(default, deserialize_with = "null_as_default")]
    mode: String,
    #[serde(default)]
    figure: Option<String>,
    #[serde(default, rename = "selectedFigure")]
    selected_figure: Option<String>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default, rename = "selectedTopic")]
    selected_topic: Option<String>,
}

impl From<ContinueBody> for ContinueRequest {
    fn from(body: ContinueBody) -> Self {
        ContinueRequest {
            message: body.message,
            messages: body.messages,
            mode: body.mode,
            figure: body.figure.or(body.selected_figure).unwrap_or_default(),
            topic: body.topic.or(body.selected_topic),
        }
    }
}

/// Open a new dialogue with no prior history.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct StartRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub figure: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}
