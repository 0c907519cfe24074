//! Profile extraction and proposal generation.

pub mod extractor;
pub mod generator;
pub mod model;

pub use extractor::ProfileExtractor;
pub use generator::ProposalGenerator;
