//! Dispatches LLM-requested tool calls against the PMS connector or an
//! in-memory helper (§4.4).

pub mod dispatcher;
pub mod pms;
pub mod tool_name;

pub use dispatcher::{ToolContext, ToolDispatcher, ToolResult};
pub use pms::{PmsConnector, PmsConnectorFactory, PmsError, StubPmsConnector, StubPmsConnectorFactory};
pub use tool_name::ToolName;
