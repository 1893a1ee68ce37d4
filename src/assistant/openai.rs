//! OpenAI Assistants v2 client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::{ChatAssistant, Run, ThreadMessage};
use crate::errors::AssistantError;
use crate::message::Role;

const ASSISTANTS_BETA_HEADER: &str = "OpenAI-Beta";
const ASSISTANTS_BETA_VALUE: &str = "assistants=v2";
const RUN_LIST_LIMIT: &str = "20";
const MESSAGE_LIST_LIMIT: &str = "100";

#[derive(Debug, Deserialize)]
struct ObjectId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    id: String,
    role: Role,
    #[serde(default)]
    content: Vec<ContentPart>,
    #[serde(default)]
    run_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: TextValue },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    value: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl From<ApiMessage> for ThreadMessage {
    fn from(msg: ApiMessage) -> Self {
        let content = msg
            .content
            .into_iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.value),
                ContentPart::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");
        ThreadMessage {
            id: msg.id,
            role: msg.role,
            content,
            run_id: msg.run_id,
        }
    }
}

/// Client for the OpenAI Assistants API.
#[derive(Debug, Clone)]
pub struct OpenAiAssistant {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    assistant_id: String,
}

impl OpenAiAssistant {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        assistant_id: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("interviewer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            assistant_id: assistant_id.into(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_base, path))
            .bearer_auth(&self.api_key)
            .header(ASSISTANTS_BETA_HEADER, ASSISTANTS_BETA_VALUE)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, AssistantError> {
        let resp = builder.send().await?;
        let resp = check_status(resp).await?;
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| AssistantError::Malformed(e.to_string()))
    }
}

async fn check_status(resp: Response) -> Result<Response, AssistantError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| {
            if body.is_empty() {
                status.to_string()
            } else {
                body
            }
        });
    Err(AssistantError::Service {
        status: Some(status.as_u16()),
        message,
    })
}

#[async_trait]
impl ChatAssistant for OpenAiAssistant {
    async fn create_conversation(&self) -> Result<String, AssistantError> {
        let thread: ObjectId = self
            .send(self.request(Method::POST, "/threads").json(&json!({})))
            .await?;
        tracing::debug!(thread_id = %thread.id, "created thread");
        Ok(thread.id)
    }

    async fn append_message(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
    ) -> Result<String, AssistantError> {
        let path = format!("/threads/{}/messages", conversation_id);
        let message: ObjectId = self
            .send(
                self.request(Method::POST, &path)
                    .json(&json!({ "role": role.to_string(), "content": content })),
            )
            .await?;
        Ok(message.id)
    }

    async fn start_run(
        &self,
        conversation_id: &str,
        instructions: &str,
    ) -> Result<Run, AssistantError> {
        let path = format!("/threads/{}/runs", conversation_id);
        self.send(self.request(Method::POST, &path).json(&json!({
            "assistant_id": self.assistant_id,
            "instructions": instructions,
        })))
        .await
    }

    async fn get_run(&self, conversation_id: &str, run_id: &str) -> Result<Run, AssistantError> {
        let path = format!("/threads/{}/runs/{}", conversation_id, run_id);
        self.send(self.request(Method::GET, &path)).await
    }

    async fn cancel_run(&self, conversation_id: &str, run_id: &str) -> Result<Run, AssistantError> {
        let path = format!("/threads/{}/runs/{}/cancel", conversation_id, run_id);
        self.send(self.request(Method::POST, &path)).await
    }

    async fn list_runs(&self, conversation_id: &str) -> Result<Vec<Run>, AssistantError> {
        let path = format!("/threads/{}/runs", conversation_id);
        let list: ListResponse<Run> = self
            .send(
                self.request(Method::GET, &path)
                    .query(&[("limit", RUN_LIST_LIMIT), ("order", "desc")]),
            )
            .await?;
        Ok(list.data)
    }

    async fn list_messages(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<ThreadMessage>, AssistantError> {
        let path = format!("/threads/{}/messages", conversation_id);
        let list: ListResponse<ApiMessage> = self
            .send(
                self.request(Method::GET, &path)
                    .query(&[("limit", MESSAGE_LIST_LIMIT), ("order", "desc")]),
            )
            .await?;
        Ok(list.data.into_iter().map(ThreadMessage::from).collect())
    }
}
