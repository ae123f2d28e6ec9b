/// Manifest line parsing and skipping rules.
pub mod manifest;
