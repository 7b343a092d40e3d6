pub mod evaluation;
pub mod handlers;
pub mod orchestrator;
pub mod policy;
pub mod prompts;
pub mod transcript;
pub mod turn;
