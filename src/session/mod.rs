pub mod dispatcher;
pub mod manager;
pub mod settings;

pub use dispatcher::CaptureCommandDispatcher;
pub use manager::{ConnectionState, Session, SessionManager};
