//! Injectable service interfaces. Every external dependency the orchestrator
//! touches — the LLM, web search, page extraction, artifact storage, and
//! execution-trace persistence — is abstracted behind an `async_trait` so
//! the master graph and sub-agents can be exercised against in-memory test
//! doubles without a network call: `Send + Sync`, boxed dynamic errors,
//! default no-op methods where a capability is optional.

pub mod extract;
pub mod llm;
pub mod object_store;
pub mod record_store;
pub mod search;

pub use extract::{ExtractClient, ExtractedPage};
pub use llm::{LlmClient, LlmMessage, LlmRole};
pub use object_store::ObjectStore;
pub use record_store::RecordStore;
pub use search::{SearchClient, SearchResult};
