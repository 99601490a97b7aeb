// Post scoring pipeline: request validation, prompt assembly, oracle
// invocation, strict-then-fallback response parsing.
// All Gemini calls go through llm_client.

pub mod handlers;
pub mod models;
pub mod parser;
pub mod prompts;
pub mod validation;
