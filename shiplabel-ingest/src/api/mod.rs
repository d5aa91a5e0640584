//! HTTP API handlers for shiplabel-ingest
//!
//! REST endpoints for imports, record listing and maintenance, plus an SSE
//! stream of user notifications.

pub mod health;
pub mod imports;
pub mod maintenance;
pub mod records;
pub mod sse;

pub use health::health_routes;
pub use imports::import_routes;
pub use maintenance::maintenance_routes;
pub use records::record_routes;
pub use sse::event_stream;
