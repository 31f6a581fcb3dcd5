pub mod board;
pub mod config;
pub mod ids;
pub mod intent;
pub mod search;
pub mod selection;
pub mod session;
pub mod storage;
pub mod types;

pub use search::{highlight, matches, SearchMode, Span, SpanKind, TaskFilter};
pub use session::BoardSession;
pub use types::{AppState, Column, Task, TaskDraft, TaskPatch};
