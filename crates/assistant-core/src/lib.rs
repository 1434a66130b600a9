pub mod ports;
pub mod event_bus;
pub mod store;
pub mod dispatch;
pub mod orchestrator;
pub mod voice;
pub mod playback;
pub mod pcm;
pub mod persistence;


pub use event_bus::EventBus;
pub use orchestrator::Orchestrator;
pub use store::{SessionSnapshot, SessionStore};
