//! HTTP adapter for the SSH gateway
//!
//! The server exposes the following endpoints:
//! - POST /api/ssh - Run one command on one host
//! - POST /api/ssh/batch - Run many commands, collecting every result
//! - GET /api/nodes/status - Fleet reachability
//! - POST /api/docker/status - Container listing for a host
//! - POST /api/deploy - Run a deployment profile
//! - POST /api/migrate/memory, POST /api/workflows/{name} - Fail-fast workflows
//! - GET /api/health - Health check endpoint
//! - GET /metrics - Prometheus metrics (when enabled)

pub mod handlers;
pub mod responses;
pub mod server;

pub use server::start_server;
