//! HTTP API for the interview client
//!
//! All routes except `/health` require `Authorization: Bearer <token>`:
//! - POST /interviews - Schedule an interview
//! - GET /interviews - List the caller's interviews
//! - GET /interviews/:room_id - Full session record
//! - POST /interviews/:room_id/start - Open the voice call
//! - POST /interviews/:room_id/events - Relay a provider call event
//! - PUT /interviews/:room_id/code - Editor snapshot
//! - PUT /interviews/:room_id/transcript - Replace the transcript
//! - POST /interviews/:room_id/analysis - Append a code analysis
//! - POST /interviews/:room_id/end - Finalize the interview
//! - POST /interviews/:room_id/cancel - Cancel the interview
//! - GET /users/me/stats - Aggregate statistics
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{ErrorResponse, Owner};
pub use routes::create_router;
pub use state::AppState;
