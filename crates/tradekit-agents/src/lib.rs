pub mod claude_cli;
pub mod error;
pub mod model;
pub mod openai;
pub mod parser;
pub mod portfolio_manager;
pub mod prompts;
pub mod store;
pub mod tool_agent;
pub mod toolbox;

pub mod test_support;

pub use claude_cli::ClaudeCli;
pub use error::AgentError;
pub use model::{LanguageModel, ModelFactory, ModelProvider};
pub use openai::OpenAiChat;
pub use portfolio_manager::{max_shares, PortfolioManager};
pub use store::AgentStore;
pub use tool_agent::ToolAgent;
pub use toolbox::AgentToolbox;
