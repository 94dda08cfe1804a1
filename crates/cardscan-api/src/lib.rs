//! CardScan API Library
//!
//! HTTP surface for the card scanner: upload, CSV export, Google contacts
//! sync, request-scoped sessions and application setup.

mod api_doc;
mod handlers;
mod telemetry;

pub mod error;
pub mod session;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use session::{InMemorySessionStore, Session, SessionData, SessionStore, SESSION_COOKIE};
pub use state::{AppState, GoogleSync};
