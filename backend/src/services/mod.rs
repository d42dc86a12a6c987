//! Business logic services for the Pesticide Stock Management Platform

pub mod codes;
pub mod generation;
pub mod medicine;
pub mod reporting;
pub mod scan;
pub mod sequence;

pub use codes::CodeService;
pub use generation::GenerationService;
pub use medicine::MedicineService;
pub use reporting::ReportingService;
pub use scan::ScanService;
pub use sequence::SequenceService;
