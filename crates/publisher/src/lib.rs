//! Clipcast Publisher
//!
//! Delivers a finished video to the publishing service:
//! - **Api:** The three remote calls behind a trait, plus the HTTP implementation
//! - **Machine:** Session init, contiguous chunk upload, and bounded status polling
//!
//! ```text
//! Idle ─► Initializing ─► Uploading ─► AwaitingPublish ─► Polling ─┬─► Published
//!              │              │               │               │    ├─► Failed
//!              └──────────────┴───────────────┴───────────────┘    └─► TimedOut
//!                                  (any error) ─► Failed
//! ```

pub mod api;
pub mod http;
pub mod machine;

pub use api::{InitRequest, InitResponse, PublishApi, PublishStatus, StatusReport};
pub use http::HttpPublishApi;
pub use machine::{PublishOutcome, PublishState, PublishStateMachine};
