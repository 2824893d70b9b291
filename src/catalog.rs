//! Qt Linguist `.ts` catalogs: data model, XML reading and writing, lookup and checks.

pub mod error;
pub mod lookup;
pub mod model;
pub mod parser;
pub mod stats;
pub mod validation;
pub mod writer;

pub use error::CatalogError;
pub use lookup::Translator;
pub use model::{
    Catalog,
    Context,
    LineNumber,
    Message,
    MessageRef,
    SourceLocation,
    Translation,
    TranslationStatus,
};
pub use parser::{
    ParsedCatalog,
    parse_catalog,
};
pub use stats::{
    CatalogStatistics,
    ContextStatistics,
    StatusCounts,
};
pub use validation::{
    Finding,
    FindingKind,
    validate_catalog,
};
pub use writer::write_catalog;
