//! Input moderation via Bedrock Guardrails.
//!
//! User text is screened with `ApplyGuardrail` as `INPUT` content. The
//! guardrail's content and word filters decide what counts as inappropriate;
//! this side only reads whether it intervened.

use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::types::{
    GuardrailAction, GuardrailContentBlock, GuardrailContentSource, GuardrailTextBlock,
};
use tracing::{debug, info};

use nerdherd_diagnosis::collaborators::{BoxFuture, ModerationVerdict, Moderator};
use nerdherd_diagnosis::error::DiagnosisError;

use crate::error::BedrockError;

/// A guardrail that intervened means the input was flagged.
pub fn verdict_for(action: &GuardrailAction) -> ModerationVerdict {
    ModerationVerdict {
        flagged: *action == GuardrailAction::GuardrailIntervened,
    }
}

pub async fn apply_input_guardrail(
    client: &Client,
    guardrail_id: &str,
    guardrail_version: &str,
    text: &str,
) -> Result<ModerationVerdict, BedrockError> {
    let block = GuardrailTextBlock::builder()
        .text(text)
        .build()
        .map_err(|e| BedrockError::Build(e.to_string()))?;

    let response = client
        .apply_guardrail()
        .guardrail_identifier(guardrail_id)
        .guardrail_version(guardrail_version)
        .source(GuardrailContentSource::Input)
        .content(GuardrailContentBlock::Text(block))
        .send()
        .await
        .map_err(|e| BedrockError::Guardrail(e.into_service_error().to_string()))?;

    let verdict = verdict_for(response.action());
    if verdict.flagged {
        info!(guardrail_id, "guardrail intervened on user input");
    } else {
        debug!(guardrail_id, "guardrail passed user input");
    }

    Ok(verdict)
}

/// [`Moderator`] backed by a Bedrock guardrail.
#[derive(Clone)]
pub struct BedrockModerator {
    client: Client,
    guardrail_id: String,
    guardrail_version: String,
}

impl BedrockModerator {
    pub fn new(
        config: &aws_config::SdkConfig,
        guardrail_id: impl Into<String>,
        guardrail_version: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(config),
            guardrail_id: guardrail_id.into(),
            guardrail_version: guardrail_version.into(),
        }
    }
}

impl Moderator for BedrockModerator {
    fn moderate<'a>(
        &'a self,
        text: &'a str,
    ) -> BoxFuture<'a, Result<ModerationVerdict, DiagnosisError>> {
        Box::pin(async move {
            apply_input_guardrail(
                &self.client,
                &self.guardrail_id,
                &self.guardrail_version,
                text,
            )
            .await
            .map_err(BedrockError::into_moderation)
        })
    }
}
