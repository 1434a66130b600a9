pub mod storage;
pub mod speech;
pub mod audio;
pub mod gateway;
pub mod wikipedia;


pub use audio::WebAudioOutput;
pub use gateway::JsGateways;
pub use speech::WebSpeechRecognition;
pub use wikipedia::WikipediaGateway;
