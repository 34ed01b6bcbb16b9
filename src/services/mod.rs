pub mod analysis_client;
pub mod coordinator;
pub mod notifier;
