//! Record Store Module
//!
//! The backing store the caches read through, and an in-memory implementation.

mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::{InMemoryStore, StoreCalls};

/// Numeric record identifier.
pub type RecordId = u64;

// == Store Error ==
/// Errors raised by a record store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record with this id
    #[error("Record {0} not found")]
    NotFound(RecordId),

    /// A record with this id already exists
    #[error("Record {0} already exists")]
    Conflict(RecordId),

    /// The store could not be reached or failed mid-call
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

// == Record ==
/// An entity as returned by the store.
///
/// The cache never looks inside a record except through `id` and, for
/// exact-match filters, `field`.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> RecordId;

    /// String value of an exposed field, if the record has it.
    fn field(&self, name: &str) -> Option<String>;
}

// == Selection ==
/// Field projection requested from the store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Fields(Vec<String>),
}

impl Selection {
    pub fn fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::Fields(names.into_iter().map(Into::into).collect())
    }
}

// == Filter ==
/// Predicate for `find_by_filter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Exact match on an exposed field
    Equals { field: String, value: String },
}

impl Filter {
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches<R: Record>(&self, record: &R) -> bool {
        match self {
            Filter::Equals { field, value } => record.field(field).as_deref() == Some(value),
        }
    }
}

// == Record Store ==
/// Read interface of the backing store.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    type Record: Record;

    /// Fetches one record. A missing record is `Ok(None)`.
    async fn find_by_id(&self, id: RecordId) -> Result<Option<Self::Record>, StoreError>;

    /// Fetches the whole collection in the store's natural order.
    async fn find_all(&self, selection: &Selection) -> Result<Vec<Self::Record>, StoreError>;

    /// Fetches up to `limit` records matching `filter`.
    async fn find_by_filter(
        &self,
        filter: &Filter,
        limit: usize,
    ) -> Result<Vec<Self::Record>, StoreError>;
}
