
/// Tracer that records every sample for inspection.
pub mod tracer;
