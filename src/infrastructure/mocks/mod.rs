//! Mock implementations for testing.
//!
//! This module provides test doubles for the capability ports, enabling
//! controlled testing of application logic.

pub mod clock;
pub mod directory;
pub mod mirror;
pub mod push;
pub mod store;

pub use clock::MockClock;
pub use directory::StaticUserDirectory;
pub use mirror::FlakyMirror;
pub use push::RecordingPushTransport;
pub use store::FlakyDocumentStore;
