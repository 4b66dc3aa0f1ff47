pub mod cleanup;
pub mod encoder;
pub mod notifier;
pub mod orchestrator;
pub mod playlist;
pub mod thumbnail;
pub mod uploader;
