pub mod network;

pub use network::{test_config, StepEvents, TestClient, TestNetwork};
