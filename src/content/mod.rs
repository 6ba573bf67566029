//! Content Collaborators Module
//!
//! The subsystems a pipeline run calls out to, and the content values
//! passed between them.
//!
//! # Structure
//!
//! - [`model`]: Content items at each pipeline stage
//! - [`collaborator`]: Traits the executor drives, plus their error type
//! - [`demo`]: Synthetic content source for demo mode
//! - [`local`]: Filesystem-backed fetch and publish
//! - [`rules`]: Keyword classification and text tidying

pub mod collaborator;
pub mod demo;
pub mod local;
pub mod model;
pub mod rules;

#[cfg(test)]
pub mod testing;

pub use collaborator::{
    Classifier, CollaboratorError, Collaborators, Fetcher, Publisher, Transformer,
};
pub use demo::DemoFetcher;
pub use local::{ArchivePublisher, DirectoryFetcher};
pub use model::{ClassifiedItem, ContentItem, ContentType, PolishedItem, PublishedId};
pub use rules::{KeywordClassifier, TidyTransformer};
