//! Concrete stage adapters, one per external tool.
pub mod animation;
pub mod mux;
pub mod tts;

pub use animation::AnimationStage;
pub use mux::MuxStage;
pub use tts::TtsStage;
