//! HTTP API handlers for tandem-server

pub mod health;
pub mod rooms;
pub mod sse;
pub mod ws;

pub use health::health_routes;
pub use rooms::{room_snapshot, room_stats};
pub use sse::event_stream;
pub use ws::ws_handler;
