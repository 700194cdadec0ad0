// Infrastructure layer - External dependencies and adapters
pub mod advisory_csv;
pub mod config;
pub mod http_response;
pub mod loki_repository;
pub mod sheets_repository;
pub mod sse;
