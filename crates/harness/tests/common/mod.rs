
/// Mock collaborators (core model, tracer).
pub mod mocks;
