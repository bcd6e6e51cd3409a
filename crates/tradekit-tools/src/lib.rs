pub mod broker_tools;
pub mod error;
pub mod operation;
pub mod registry;

pub use broker_tools::{broker_tool_catalog, register_broker_tools, BrokerToolset};
pub use error::ToolError;
pub use operation::ToolOperation;
pub use registry::{ToolExecutor, ToolRegistry};
