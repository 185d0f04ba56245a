use crate::{
    db::DbPool,
    entities::page_content,
    errors::ServiceError,
    events::{EventBus, StoreEvent},
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PageSection {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMission {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpsertPageRequest {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub content: Option<String>,
    pub sections: Option<Vec<PageSection>>,
    pub mission: Option<PageMission>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageContentResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub page: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub content: String,
    pub sections: Vec<PageSection>,
    pub mission: Option<PageMission>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<page_content::Model> for PageContentResponse {
    type Error = ServiceError;

    fn try_from(m: page_content::Model) -> Result<Self, Self::Error> {
        let sections = serde_json::from_value(m.sections)?;
        let mission = m.mission.map(serde_json::from_value).transpose()?;
        Ok(Self {
            id: m.id,
            page: m.page,
            title: m.title,
            subtitle: m.subtitle,
            content: m.content,
            sections,
            mission,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

fn valid_slug(page: &str) -> bool {
    !page.is_empty()
        && page.len() <= 64
        && page
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[derive(Clone)]
pub struct PageService {
    db_pool: Arc<DbPool>,
    events: Arc<dyn EventBus>,
}

impl PageService {
    pub fn new(db_pool: Arc<DbPool>, events: Arc<dyn EventBus>) -> Self {
        Self { db_pool, events }
    }

    async fn find(&self, page: &str) -> Result<Option<page_content::Model>, ServiceError> {
        Ok(page_content::Entity::find()
            .filter(page_content::Column::Page.eq(page))
            .one(&*self.db_pool)
            .await?)
    }

    pub async fn get_page(&self, page: &str) -> Result<PageContentResponse, ServiceError> {
        self.find(page)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Content not found".to_string()))?
            .try_into()
    }

    /// Creates or merges a page and notifies open editors
    #[instrument(skip(self, request))]
    pub async fn upsert_page(
        &self,
        page: &str,
        request: UpsertPageRequest,
    ) -> Result<PageContentResponse, ServiceError> {
        if !valid_slug(page) {
            return Err(ServiceError::ValidationError("Invalid page name".to_string()));
        }
        let sections = request
            .sections
            .map(serde_json::to_value)
            .transpose()?;
        let mission = request
            .mission
            .map(serde_json::to_value)
            .transpose()?;

        let saved = match self.find(page).await? {
            Some(existing) => {
                let mut active: page_content::ActiveModel = existing.into();
                if let Some(title) = request.title {
                    active.title = Set(title);
                }
                if let Some(subtitle) = request.subtitle {
                    active.subtitle = Set(Some(subtitle));
                }
                if let Some(content) = request.content {
                    active.content = Set(content);
                }
                if let Some(sections) = sections {
                    active.sections = Set(sections);
                }
                if let Some(mission) = mission {
                    active.mission = Set(Some(mission));
                }
                active.update(&*self.db_pool).await?
            }
            None => {
                let title = request.title.ok_or_else(|| {
                    ServiceError::ValidationError("Title is required".to_string())
                })?;
                page_content::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    page: Set(page.to_string()),
                    title: Set(title),
                    subtitle: Set(request.subtitle),
                    content: Set(request.content.unwrap_or_default()),
                    sections: Set(sections.unwrap_or_else(|| serde_json::json!([]))),
                    mission: Set(mission),
                    ..Default::default()
                }
                .insert(&*self.db_pool)
                .await?
            }
        };

        let response = PageContentResponse::try_from(saved)?;
        self.events
            .publish(&StoreEvent::page_content_updated(page, &response));
        info!(page = %page, "Page content updated");
        Ok(response)
    }

    /// Inserts the default About page on first boot
    pub async fn seed_about_page(&self) -> Result<bool, ServiceError> {
        if self.find("about").await?.is_some() {
            return Ok(false);
        }
        let sections = vec![
            PageSection {
                title: "Passion for Beauty".to_string(),
                content: "We believe beauty is an art form and a way to express your unique self."
                    .to_string(),
                icon: Some("Heart".to_string()),
            },
            PageSection {
                title: "Quality First".to_string(),
                content: "Every product is carefully selected and tested to meet our high standards."
                    .to_string(),
                icon: Some("Sparkles".to_string()),
            },
            PageSection {
                title: "Trusted Service".to_string(),
                content: "Your satisfaction and trust are at the heart of everything we do."
                    .to_string(),
                icon: Some("ShieldCheck".to_string()),
            },
        ];
        let mission = PageMission {
            title: "Our Mission".to_string(),
            content: "At Saria Beauty, we believe that beauty is more than just skin deep. \
                      It's about confidence, elegance, and taking a moment for yourself in a busy world. \
                      Our mission is to deliver a luxurious shopping experience with trusted items and seamless service."
                .to_string(),
            image_url: Some("/images/about-mission.png".to_string()),
        };

        page_content::ActiveModel {
            id: Set(Uuid::new_v4()),
            page: Set("about".to_string()),
            title: Set("About Saria Beauty".to_string()),
            subtitle: Set(Some(
                "Redefining elegance and self-care through a curated collection of premium beauty products."
                    .to_string(),
            )),
            content: Set(String::new()),
            sections: Set(serde_json::to_value(sections)?),
            mission: Set(Some(serde_json::to_value(mission)?)),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;
        info!("Seeded About page content");
        Ok(true)
    }
}
