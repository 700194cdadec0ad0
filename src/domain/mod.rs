// Domain layer - Pure weather and advisory logic, no I/O
pub mod advisory;
pub mod board;
pub mod live_view;
pub mod runway;
pub mod telemetry;
