//! DTO Mapping
//!
//! Traits for the mapped representation a cache stores, and shared mapping
//! helpers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{Record, RecordId, Selection};

/// A cacheable, immutable snapshot of a record.
pub trait Dto: Send + Sync + 'static {
    fn id(&self) -> RecordId;
}

/// A DTO that can also be looked up by slug.
pub trait SlugDto: Dto {
    fn slug(&self) -> &str;
}

// == Mapper ==
/// Maps store records to DTOs for one collection.
#[async_trait]
pub trait Mapper: Send + Sync + 'static {
    type Record: Record;
    type Dto: Dto;

    /// Fields the mapper reads; passed to the store as a projection.
    fn selection(&self) -> Selection {
        Selection::All
    }

    /// Maps a record. `None` rejects it, and it is left out of the cache.
    async fn to_dto(&self, record: &Self::Record) -> Option<Self::Dto>;
}

// == Image DTO ==
/// Client-facing view of a media relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDto {
    pub src: Option<String>,
    pub alt: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ImageDto {
    /// Maps a populated media relation.
    ///
    /// An unpopulated relation (a bare id, `null`) gives `None`.
    pub fn from_media(media: &Value) -> Option<Self> {
        let object = media.as_object()?;

        let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_owned);
        let dimension = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok())
        };

        Some(Self {
            src: text("url"),
            alt: text("alt"),
            width: dimension("width"),
            height: dimension("height"),
        })
    }
}
