//! Bundle import: parameters, validators, persistence and the pipeline

pub mod bundle;
pub mod notification;
pub mod params;
pub mod persistence;
pub mod pipeline;
pub mod validator;

pub use bundle::{BundleObject, ImportBundle};
pub use notification::{LoggingDispatcher, NotificationDispatcher, RecordingDispatcher};
pub use params::{AtomicMode, BundleMode, IdScheme, ImportMode, ImportParams, ValidationMode};
pub use persistence::{InMemoryStore, Persister};
pub use pipeline::{CancellationToken, ImportPipeline, PipelineState};
pub use validator::{ObjectValidator, ValidationContext};
