// Query engine: local keyword resolver, LLM-backed resolver, prompt context,
// and the session record threaded through each interaction.
// All completion calls go through llm_client.

pub mod handlers;
pub mod local;
pub mod prompts;
pub mod resolver;
pub mod session;
