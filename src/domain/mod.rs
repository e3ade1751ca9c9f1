//! Domain layer: documents, identifiers, and the query model.

pub mod document;
pub mod query;

pub use document::{Document, DocumentId, document_id, relation_ids};
pub use query::{
    CompareOp, DEFAULT_PAGE_LIMIT, FilterNode, PagedResult, QuerySpec, sort_field,
};
