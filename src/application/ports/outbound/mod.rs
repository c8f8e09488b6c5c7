//! Outbound ports - Interfaces that the application requires from external systems

mod asset_store_port;
mod experience_store_port;
mod generation_ports;

pub use asset_store_port::{AssetStoreError, AssetStorePort};
pub use experience_store_port::{ExperienceStoreError, ExperienceStorePort};
pub use generation_ports::{
    BackendError, ImageGenerationPort, SpeechSynthesisPort, TextGenerationPort,
};
