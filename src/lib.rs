// JSON Schema validation
//
// This crate provides a validation engine for JSON Schema instances
// across drafts 6, 7, 2019-09 and 2020-12: a keyword-based schema tree,
// a registry with anchor and dynamic-anchor indexes, a reference
// resolver with cycle detection, and an annotation-aware evaluator.

pub mod annotations;
pub mod draft;
pub mod error;
pub mod format;
pub mod output;
pub mod pointer;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod uri;
pub mod validator;
pub mod value;

pub use draft::Draft;
pub use error::{SchemaError, ValidationError, ValidationErrorKind};
pub use output::{Output, OutputFormat, OutputUnit};
pub use pointer::JsonPointer;
pub use registry::Registry;
pub use schema::Schema;
pub use validator::{validate, validate_inline, ContentDecoder, ValidateOptions};
