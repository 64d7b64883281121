//! Assistant replies via the Bedrock Converse API.
//!
//! The whole transcript is sent on every call. Converse is stateless, and the
//! model needs the earlier questions and answers to avoid repeating itself.

use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, InferenceConfiguration, Message as ConverseMessage,
    SystemContentBlock,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use nerdherd_core::models::message::{Message, Sender};
use nerdherd_diagnosis::collaborators::{BoxFuture, Completer};
use nerdherd_diagnosis::error::DiagnosisError;

use crate::error::BedrockError;

// ── Types ────────────────────────────────────────────────────────────────────

/// Sampling parameters for every completion request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InferenceParams {
    pub temperature: f32,
    pub max_tokens: i32,
}

impl Default for InferenceParams {
    fn default() -> Self {
        Self {
            temperature: 0.6,
            max_tokens: 256,
        }
    }
}

impl InferenceParams {
    fn to_configuration(self) -> InferenceConfiguration {
        InferenceConfiguration::builder()
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
    }
}

// ── Conversion ───────────────────────────────────────────────────────────────

/// Map transcript messages onto Converse messages, oldest first.
pub fn to_converse_messages(history: &[Message]) -> Result<Vec<ConverseMessage>, BedrockError> {
    history
        .iter()
        .map(|msg| {
            let role = match msg.sender {
                Sender::User => ConversationRole::User,
                Sender::Assistant => ConversationRole::Assistant,
            };
            ConverseMessage::builder()
                .role(role)
                .content(ContentBlock::Text(msg.text.clone()))
                .build()
                .map_err(|e| BedrockError::Build(e.to_string()))
        })
        .collect()
}

/// Concatenate the text blocks of a reply, ignoring everything else.
pub fn reply_text(content: &[ContentBlock]) -> String {
    content
        .iter()
        .filter_map(|block| {
            if let ContentBlock::Text(text) = block {
                Some(text.as_str())
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("")
}

// ── Converse ─────────────────────────────────────────────────────────────────

/// Send the conversation to Bedrock and return the assistant's reply.
pub async fn chat_converse(
    client: &Client,
    model_id: &str,
    params: InferenceParams,
    system_prompt: &str,
    history: &[Message],
) -> Result<String, BedrockError> {
    let messages = to_converse_messages(history)?;

    debug!(model = model_id, messages = messages.len(), "sending converse request");

    let response = client
        .converse()
        .model_id(model_id)
        .system(SystemContentBlock::Text(system_prompt.to_string()))
        .set_messages(Some(messages))
        .inference_config(params.to_configuration())
        .send()
        .await
        .map_err(|e| BedrockError::Invocation(e.into_service_error().to_string()))?;

    let output_message = response
        .output()
        .and_then(|o| o.as_message().ok())
        .ok_or_else(|| BedrockError::ResponseParse("no message in response".to_string()))?;

    let text = reply_text(output_message.content());

    if let Some(usage) = response.usage() {
        info!(
            model = model_id,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            stop_reason = response.stop_reason().as_str(),
            "converse complete"
        );
    }

    Ok(text)
}

/// [`Completer`] backed by a Bedrock model.
#[derive(Clone)]
pub struct BedrockCompleter {
    client: Client,
    model_id: String,
    params: InferenceParams,
}

impl BedrockCompleter {
    pub fn new(config: &aws_config::SdkConfig, model_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(config),
            model_id: model_id.into(),
            params: InferenceParams::default(),
        }
    }

    pub fn with_params(mut self, params: InferenceParams) -> Self {
        self.params = params;
        self
    }
}

impl Completer for BedrockCompleter {
    fn complete<'a>(
        &'a self,
        system_instruction: &'a str,
        history: &'a [Message],
    ) -> BoxFuture<'a, Result<String, DiagnosisError>> {
        Box::pin(async move {
            chat_converse(
                &self.client,
                &self.model_id,
                self.params,
                system_instruction,
                history,
            )
            .await
            .map_err(BedrockError::into_completion)
        })
    }
}
