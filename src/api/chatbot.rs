//! Career-guidance chatbot sessions.

// crates.io
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	client::ApiClient,
	http::{ApiRequest, ApiTransport},
};

const SESSIONS: &str = "chatbot/sessions/";

/// Backend identifier of a chat session; numeric and string ids are both accepted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawSessionId", into = "String")]
pub struct ChatSessionId(String);
impl ChatSessionId {
	/// Wraps an identifier.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Returns the identifier as used in request paths.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for ChatSessionId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl From<ChatSessionId> for String {
	fn from(id: ChatSessionId) -> Self {
		id.0
	}
}
impl From<RawSessionId> for ChatSessionId {
	fn from(raw: RawSessionId) -> Self {
		match raw {
			RawSessionId::Number(n) => Self(n.to_string()),
			RawSessionId::Text(s) => Self(s),
		}
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSessionId {
	Number(u64),
	Text(String),
}

/// Chat session summary.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ChatSession {
	/// Session identifier.
	pub id: ChatSessionId,
	/// Optional title shown in the session list.
	#[serde(default)]
	pub title: Option<String>,
	/// Creation timestamp as sent by the backend.
	#[serde(default)]
	pub created_at: Option<String>,
	/// Every other field returned by the backend.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Single message in a session transcript.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatMessage {
	/// Author role (`user` or `assistant` on the current backend).
	#[serde(default, alias = "sender")]
	pub role: String,
	/// Message text.
	#[serde(alias = "message")]
	pub content: String,
	/// Creation timestamp as sent by the backend.
	#[serde(default)]
	pub created_at: Option<String>,
}

/// Session summary plus its transcript.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ChatSessionDetail {
	/// Session summary.
	#[serde(flatten)]
	pub session: ChatSession,
	/// Transcript in chronological order.
	#[serde(default)]
	pub messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct NewSession<'a> {
	#[serde(skip_serializing_if = "Option::is_none")]
	title: Option<&'a str>,
}

#[derive(Serialize)]
struct NewMessage<'a> {
	content: &'a str,
}

/// Chatbot endpoints bound to a shared [`ApiClient`].
pub struct ChatbotApi<C>
where
	C: ?Sized + ApiTransport,
{
	client: ApiClient<C>,
}
impl<C> ChatbotApi<C>
where
	C: ?Sized + ApiTransport,
{
	/// Wraps a client; the wrapper shares its store and refresh guard.
	pub fn new(client: ApiClient<C>) -> Self {
		Self { client }
	}

	/// Lists the signed-in user's sessions.
	pub async fn list_sessions(&self) -> Result<Vec<ChatSession>> {
		self.client.send_json(ApiRequest::get(SESSIONS)).await
	}

	/// Opens a new session.
	pub async fn create_session(&self, title: Option<&str>) -> Result<ChatSession> {
		self.client.send_json(ApiRequest::post(SESSIONS).json(&NewSession { title })?).await
	}

	/// Fetches a session with its transcript.
	pub async fn session(&self, id: &ChatSessionId) -> Result<ChatSessionDetail> {
		self.client.send_json(ApiRequest::get(session_path(id))).await
	}

	/// Deletes a session.
	pub async fn delete_session(&self, id: &ChatSessionId) -> Result<()> {
		self.client.send(ApiRequest::delete(session_path(id))).await?;

		Ok(())
	}

	/// Posts a user message and returns the assistant's reply.
	pub async fn send_message(&self, id: &ChatSessionId, content: &str) -> Result<ChatMessage> {
		let request =
			ApiRequest::post(format!("{}messages/", session_path(id))).json(&NewMessage { content })?;

		self.client.send_json(request).await
	}
}

fn session_path(id: &ChatSessionId) -> String {
	format!("{SESSIONS}{id}/")
}
