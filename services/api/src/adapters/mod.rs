pub mod access;
pub mod db;
pub mod llm;

pub use access::OwnerPolicy;
pub use db::DbAdapter;
pub use llm::OpenAiTextModel;
