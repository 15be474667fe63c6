//! Category Catalog
//!
//! The reference collection served by the demo server: categories with a
//! slug, an optional parent and an optional image.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::mapper::{Dto, ImageDto, Mapper, SlugDto};
use crate::service::CachedCollectionService;
use crate::store::{InMemoryStore, Record, RecordId, Selection};

/// Collection name used in logs and hooks.
pub const CATEGORIES: &str = "categories";

// == Category Record ==
/// A category as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: RecordId,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<RecordId>,
    /// Media relation: populated object, bare id, or null
    #[serde(default)]
    pub image: Value,
    /// Hidden categories are never served through the cache
    #[serde(default)]
    pub hidden: bool,
}

impl Record for Category {
    fn id(&self) -> RecordId {
        self.id
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "title" => Some(self.title.clone()),
            "slug" => Some(self.slug.clone()),
            "description" => self.description.clone(),
            "parent_id" => self.parent_id.map(|id| id.to_string()),
            _ => None,
        }
    }
}

// == Category DTO ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDto {
    pub id: RecordId,
    pub title: String,
    pub slug: String,
    pub parent_id: Option<RecordId>,
    pub image: Option<ImageDto>,
}

impl Dto for CategoryDto {
    fn id(&self) -> RecordId {
        self.id
    }
}

impl SlugDto for CategoryDto {
    fn slug(&self) -> &str {
        &self.slug
    }
}

// == Category Mapper ==
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryMapper;

#[async_trait]
impl Mapper for CategoryMapper {
    type Record = Category;
    type Dto = CategoryDto;

    fn selection(&self) -> Selection {
        Selection::fields(["id", "title", "slug", "parent_id", "image", "hidden"])
    }

    async fn to_dto(&self, record: &Category) -> Option<CategoryDto> {
        if record.hidden {
            return None;
        }

        Some(CategoryDto {
            id: record.id,
            title: record.title.clone(),
            slug: record.slug.clone(),
            parent_id: record.parent_id,
            image: ImageDto::from_media(&record.image),
        })
    }
}

pub type CategoryStore = InMemoryStore<Category>;
pub type CategoryService = CachedCollectionService<CategoryStore, CategoryMapper>;

/// Categories the demo server starts with.
pub fn seed_categories() -> Vec<Category> {
    vec![
        Category {
            id: 1,
            title: "Books".to_string(),
            slug: "books".to_string(),
            description: Some("Printed and digital books".to_string()),
            parent_id: None,
            image: json!({
                "id": 10,
                "url": "/media/books.jpg",
                "alt": "Stack of books",
                "width": 800,
                "height": 600
            }),
            hidden: false,
        },
        Category {
            id: 2,
            title: "Science Fiction".to_string(),
            slug: "science-fiction".to_string(),
            description: None,
            parent_id: Some(1),
            image: json!(11),
            hidden: false,
        },
        Category {
            id: 3,
            title: "Music".to_string(),
            slug: "music".to_string(),
            description: None,
            parent_id: None,
            image: Value::Null,
            hidden: false,
        },
        Category {
            id: 4,
            title: "Archive".to_string(),
            slug: "archive".to_string(),
            description: Some("Retired items".to_string()),
            parent_id: None,
            image: Value::Null,
            hidden: true,
        },
    ]
}
