//! Core types for Faultline: accident cases, driver letter reports, webhook
//! payload normalisation, and the pipeline error taxonomy.

pub mod case;
pub mod error;
pub mod normalize;
pub mod report;

pub use case::CanonicalCase;
pub use error::{MalformedCase, PipelineError};
pub use normalize::{Normalized, PayloadShape, normalize};
pub use report::{
    CaseGroup, DocumentHandle, DriverLetterReport, DriverType, download_filename, group_by_case,
};
