pub mod errors;
pub mod factory;
pub mod service;

pub use errors::ServiceError;
pub use factory::AppFactory;
pub use service::{DenseBackend, NoteHit, NoteService, RebuildReport, Stats};
