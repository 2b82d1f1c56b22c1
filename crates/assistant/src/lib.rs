//! Conversational plan proposal for the folio content hub.
//!
//! [`client`] talks to an OpenAI-compatible chat-completion endpoint and
//! [`proposer`] turns admin chat plus a site snapshot into either a
//! candidate plan or a plain reply. Nothing here writes content.

pub mod client;
pub mod proposer;

pub use client::{
    ChatMessage, ChatRole, CompletionClient, CompletionError, CompletionReply, CompletionRequest,
    HttpCompletionClient, ToolDefinition,
};
pub use proposer::{PlanProposer, ProposeError, Proposal, PROPOSE_TOOL_NAME};
