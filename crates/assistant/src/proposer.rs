//! Turns admin chat into a candidate content plan.
//!
//! The proposer sends the conversation, the allow-listed table registry and
//! a snapshot of per-table statistics to the completion service together
//! with the `propose_content_plan` tool. A tool call becomes a
//! [`PlanDraft`] for the admin to review; prose is passed back as a reply.

use folio_core::access::{require_admin, Caller};
use folio_core::action::PLACEHOLDER_PREFIX;
use folio_core::error::CoreError;
use folio_core::plan::PlanDraft;
use folio_core::snapshot::SiteSnapshot;
use folio_core::tables::ContentTable;
use serde::Serialize;

use crate::client::{
    ChatMessage, ChatRole, CompletionClient, CompletionError, CompletionReply, CompletionRequest,
    ToolDefinition,
};

/// Name of the structured tool the model calls to propose a plan.
pub const PROPOSE_TOOL_NAME: &str = "propose_content_plan";

/// Most recent messages forwarded to the completion service.
const MAX_HISTORY_MESSAGES: usize = 40;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum Proposal {
    /// A candidate plan. Not persisted; the caller accepts it explicitly.
    Plan(PlanDraft),
    /// A free-text answer that proposes no change.
    Reply(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ProposeError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

pub struct PlanProposer<'a> {
    client: &'a dyn CompletionClient,
}

impl<'a> PlanProposer<'a> {
    pub fn new(client: &'a dyn CompletionClient) -> Self {
        Self { client }
    }

    pub async fn propose(
        &self,
        caller: &Caller,
        history: &[ChatMessage],
        snapshot: &SiteSnapshot,
    ) -> Result<Proposal, ProposeError> {
        require_admin(caller)?;
        if history.is_empty() {
            return Err(CoreError::Validation("Conversation must not be empty".to_string()).into());
        }
        // The system turn is built here from the registry and snapshot.
        if history.iter().any(|m| m.role == ChatRole::System) {
            return Err(CoreError::Validation(
                "Conversation may only contain user and assistant messages".to_string(),
            )
            .into());
        }

        let recent = &history[history.len().saturating_sub(MAX_HISTORY_MESSAGES)..];
        let request = CompletionRequest {
            system: system_prompt(snapshot),
            messages: recent.to_vec(),
            tools: vec![propose_tool()],
        };

        let proposal = match self.client.complete(request).await? {
            CompletionReply::Text(text) => Proposal::Reply(text),
            CompletionReply::ToolCall { name, arguments } => {
                if name != PROPOSE_TOOL_NAME {
                    return Err(CompletionError::InvalidResponse(format!(
                        "unknown tool '{name}'"
                    ))
                    .into());
                }
                let draft: PlanDraft = serde_json::from_value(arguments).map_err(|e| {
                    CompletionError::InvalidResponse(format!("malformed plan: {e}"))
                })?;
                Proposal::Plan(draft)
            }
        };

        match &proposal {
            Proposal::Plan(draft) => tracing::info!(
                actor = %caller.actor,
                title = %draft.title,
                action_count = draft.actions.len(),
                "Content plan proposed"
            ),
            Proposal::Reply(_) => tracing::debug!(actor = %caller.actor, "Assistant replied"),
        }
        Ok(proposal)
    }
}

fn system_prompt(snapshot: &SiteSnapshot) -> String {
    let tables: Vec<String> = ContentTable::ALL
        .iter()
        .map(|table| {
            let schema = table.schema();
            let mut line = format!("- {table} (required: {})", schema.required_fields.join(", "));
            if let Some(status) = schema.status_field {
                line.push_str(&format!("; status field: {status}"));
            }
            line
        })
        .collect();

    format!(
        "You are the content assistant of a personal website. Answer questions about the \
         site's content directly. When the admin asks for changes, call {PROPOSE_TOOL_NAME} \
         with a plan; never claim a change was made, the admin approves and runs plans.\n\n\
         Editable tables:\n{tables}\n\n\
         Current content:\n{snapshot}\n\n\
         Rules:\n\
         - Use only the tables above and never set the id field.\n\
         - update and delete actions need the record_id of an existing record.\n\
         - To reference a record created earlier in the same plan, use \"{PLACEHOLDER_PREFIX}N\" \
         where N is the zero-based index of that create action.\n\
         - Give every action a short description.",
        tables = tables.join("\n"),
        snapshot = snapshot.to_prompt_text(),
    )
}

fn propose_tool() -> ToolDefinition {
    let table_names: Vec<&str> = ContentTable::ALL.iter().map(|t| t.as_str()).collect();
    ToolDefinition {
        name: PROPOSE_TOOL_NAME.to_string(),
        description: "Propose an ordered plan of content changes for the admin to review."
            .to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "title": {"type": "string", "description": "Short plan title"},
                "summary": {"type": "string", "description": "What the plan does and why"},
                "actions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "type": {"type": "string", "enum": ["create", "update", "delete"]},
                            "table": {"type": "string", "enum": table_names},
                            "record_id": {
                                "type": "string",
                                "description": "Target record id for update/delete, or $action:N"
                            },
                            "data": {"type": "object", "description": "Field values to write"},
                            "description": {"type": "string"}
                        },
                        "required": ["type", "table", "description"]
                    }
                }
            },
            "required": ["title", "summary", "actions"]
        }),
    }
}
