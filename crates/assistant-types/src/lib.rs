pub mod message;
pub mod mode;
pub mod history;
pub mod file;
pub mod event;
pub mod config;
pub mod error;


pub use error::AssistantError;
pub type Result<T> = std::result::Result<T, AssistantError>;
