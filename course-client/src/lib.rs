//! Course Client - HTTP client and structure editor for the course server
//!
//! - [`HttpClient`]: network calls to the course server API
//! - [`structure`]: optimistic drag-and-drop reordering with rollback
//! - [`notify`]: toast sink used by the structure editor

pub mod config;
pub mod error;
pub mod http;
pub mod notify;
pub mod structure;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
pub use notify::{Notifier, RecordingNotifier, Toast, ToastPhase, TracingNotifier};
pub use structure::{
    ConcurrencyMode, Dispatch, ReorderController, ReorderGateway, SharedController, Ticket,
};

// Re-export shared types for convenience
pub use shared::{ActionResponse, ApiResponse, CourseOutline, DragEvent, DragItem, ErrorKind};
