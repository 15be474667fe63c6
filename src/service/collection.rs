//! Collection Service
//!
//! Uncached access to one collection: raw records straight from the store,
//! and DTOs mapped on every call.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::cache::{DtoSource, SLUG_FIELD};
use crate::error::Result;
use crate::mapper::Mapper;
use crate::store::{Filter, RecordId, RecordStore, Selection, StoreError};

pub struct CollectionService<S, M> {
    store: Arc<S>,
    mapper: Arc<M>,
    collection: String,
}

impl<S, M> CollectionService<S, M>
where
    S: RecordStore,
    M: Mapper<Record = S::Record>,
{
    pub fn new(store: Arc<S>, mapper: Arc<M>, collection: impl Into<String>) -> Self {
        Self {
            store,
            mapper,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn mapper(&self) -> &Arc<M> {
        &self.mapper
    }

    // == Raw Records ==
    /// Full record by id, straight from the store.
    pub async fn get_by_id(&self, id: RecordId) -> Result<Option<S::Record>> {
        match self.store.find_by_id(id).await {
            Ok(record) => Ok(record),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Every record, unprojected.
    pub async fn get_all(&self) -> Result<Vec<S::Record>> {
        Ok(self.store.find_all(&Selection::All).await?)
    }

    /// Full record by slug, straight from the store.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<S::Record>> {
        self.find_first(SLUG_FIELD, slug).await
    }

    async fn find_first(&self, field: &str, value: &str) -> Result<Option<S::Record>> {
        let mut found = self
            .store
            .find_by_filter(&Filter::equals(field, value), 1)
            .await?;
        Ok(if found.is_empty() {
            None
        } else {
            Some(found.swap_remove(0))
        })
    }

    // == Mapped, Uncached ==
    /// DTO by id, mapped on every call.
    pub async fn get_by_id_dto(&self, id: RecordId) -> Result<Option<M::Dto>> {
        Ok(match self.get_by_id(id).await? {
            Some(record) => self.mapper.to_dto(&record).await,
            None => None,
        })
    }

    /// Every accepted DTO, mapped on every call.
    pub async fn get_all_dto(&self) -> Result<Vec<M::Dto>> {
        let records = self.store.find_all(&self.mapper.selection()).await?;
        Ok(self.map_records(&records).await)
    }

    async fn map_records(&self, records: &[S::Record]) -> Vec<M::Dto> {
        join_all(records.iter().map(|record| self.mapper.to_dto(record)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}

#[async_trait]
impl<S, M> DtoSource<M::Dto> for CollectionService<S, M>
where
    S: RecordStore,
    M: Mapper<Record = S::Record>,
{
    async fn load_all(&self) -> Result<Vec<Arc<M::Dto>>> {
        let dtos = self.get_all_dto().await?;
        Ok(dtos.into_iter().map(Arc::new).collect())
    }

    async fn load_one(&self, id: RecordId) -> Result<Option<Arc<M::Dto>>> {
        Ok(self.get_by_id_dto(id).await?.map(Arc::new))
    }

    async fn load_by_field(&self, field: &str, value: &str) -> Result<Option<Arc<M::Dto>>> {
        Ok(match self.find_first(field, value).await? {
            Some(record) => self.mapper.to_dto(&record).await.map(Arc::new),
            None => None,
        })
    }
}
