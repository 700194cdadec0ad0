// Application layer - Use cases over the source traits
pub mod advisory_service;
pub mod snapshot_service;
pub mod source_error;
pub mod streaming_service;
pub mod telemetry_repository;

#[cfg(test)]
pub mod test_support;
