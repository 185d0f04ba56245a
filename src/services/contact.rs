use crate::{
    auth::AuthUser,
    db::DbPool,
    entities::message::{self, MessageStatus},
    errors::ServiceError,
    events::{EventBus, StoreEvent},
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateMessageRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplyRequest {
    pub reply: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubscribeRequest {
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessageResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub status: String,
    pub admin_reply: Option<String>,
    pub replied_at: Option<DateTime<Utc>>,
    pub unread_reply: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<message::Model> for ContactMessageResponse {
    fn from(m: message::Model) -> Self {
        Self {
            id: m.id,
            user: m.user_id,
            name: m.name,
            email: m.email,
            subject: m.subject,
            message: m.body,
            status: m.status,
            admin_reply: m.reply,
            replied_at: m.replied_at,
            unread_reply: m.unread_reply,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageCreatedResponse {
    pub success: bool,
    pub message: String,
    pub data: ContactMessageResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AckResponse {
    pub message: String,
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Contact form inbox and replies
#[derive(Clone)]
pub struct ContactService {
    db_pool: Arc<DbPool>,
    events: Arc<dyn EventBus>,
}

impl ContactService {
    pub fn new(db_pool: Arc<DbPool>, events: Arc<dyn EventBus>) -> Self {
        Self { db_pool, events }
    }

    /// Stores a contact form submission; the sender's account is linked when signed in
    #[instrument(skip(self, sender, request))]
    pub async fn create_message(
        &self,
        sender: Option<&AuthUser>,
        request: CreateMessageRequest,
    ) -> Result<MessageCreatedResponse, ServiceError> {
        let (Some(name), Some(email), Some(subject), Some(body)) = (
            required(request.name),
            required(request.email),
            required(request.subject),
            required(request.message),
        ) else {
            return Err(ServiceError::ValidationError(
                "Please fill all fields".to_string(),
            ));
        };
        if !validator::validate_email(email.as_str()) {
            return Err(ServiceError::ValidationError(
                "Please provide a valid email address".to_string(),
            ));
        }

        let created = message::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(sender.map(|u| u.user_id)),
            name: Set(name),
            email: Set(email.to_lowercase()),
            subject: Set(subject),
            body: Set(body),
            status: Set(MessageStatus::New.as_str().to_string()),
            reply: Set(None),
            replied_at: Set(None),
            unread_reply: Set(false),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        let data = ContactMessageResponse::from(created);
        self.events.publish(&StoreEvent::new_message(&data));
        info!(message_id = %data.id, "Contact message received");

        Ok(MessageCreatedResponse {
            success: true,
            message: "Message sent successfully".to_string(),
            data,
        })
    }

    /// Whole inbox, newest first
    pub async fn list_messages(&self) -> Result<Vec<ContactMessageResponse>, ServiceError> {
        let messages = message::Entity::find()
            .order_by_desc(message::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;
        Ok(messages.into_iter().map(Into::into).collect())
    }

    async fn find(&self, id: Uuid) -> Result<message::Model, ServiceError> {
        message::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Message not found".to_string()))
    }

    /// `new -> read`; replied messages keep their status
    #[instrument(skip(self))]
    pub async fn mark_read(&self, id: Uuid) -> Result<ContactMessageResponse, ServiceError> {
        let existing = self.find(id).await?;
        if MessageStatus::parse(&existing.status) != Some(MessageStatus::New) {
            return Ok(existing.into());
        }
        let mut active: message::ActiveModel = existing.into();
        active.status = Set(MessageStatus::Read.as_str().to_string());
        let saved = active.update(&*self.db_pool).await?;
        Ok(saved.into())
    }

    #[instrument(skip(self, request))]
    pub async fn reply(
        &self,
        id: Uuid,
        request: ReplyRequest,
    ) -> Result<ContactMessageResponse, ServiceError> {
        let reply = required(request.reply)
            .ok_or_else(|| ServiceError::ValidationError("Reply is required".to_string()))?;
        let existing = self.find(id).await?;

        let mut active: message::ActiveModel = existing.into();
        active.reply = Set(Some(reply));
        active.status = Set(MessageStatus::Replied.as_str().to_string());
        active.replied_at = Set(Some(Utc::now()));
        active.unread_reply = Set(true);
        let saved: ContactMessageResponse = active.update(&*self.db_pool).await?.into();

        self.events.publish(&StoreEvent::message_replied(&saved));
        info!(message_id = %id, "Contact message replied");
        Ok(saved)
    }

    /// Messages the signed-in user sent, newest first
    pub async fn list_mine(&self, user: &AuthUser) -> Result<Vec<ContactMessageResponse>, ServiceError> {
        let messages = message::Entity::find()
            .filter(message::Column::UserId.eq(user.user_id))
            .order_by_desc(message::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;
        Ok(messages.into_iter().map(Into::into).collect())
    }

    /// Sender acknowledges the reply
    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub async fn mark_seen(
        &self,
        user: &AuthUser,
        id: Uuid,
    ) -> Result<ContactMessageResponse, ServiceError> {
        let existing = self.find(id).await?;
        if existing.user_id != Some(user.user_id) {
            return Err(ServiceError::Forbidden(
                "Not authorized to update this message".to_string(),
            ));
        }
        if !existing.unread_reply {
            return Ok(existing.into());
        }
        let mut active: message::ActiveModel = existing.into();
        active.unread_reply = Set(false);
        Ok(active.update(&*self.db_pool).await?.into())
    }

    /// Newsletter sign-up; acknowledged and logged only
    pub fn subscribe(&self, request: SubscribeRequest) -> Result<AckResponse, ServiceError> {
        let email = required(request.email).ok_or_else(|| {
            ServiceError::ValidationError("Please provide an email address.".to_string())
        })?;
        if !validator::validate_email(email.as_str()) {
            return Err(ServiceError::ValidationError(
                "Please provide a valid email address".to_string(),
            ));
        }
        info!(email = %email, "Newsletter subscription");
        Ok(AckResponse {
            message: "Thank you for subscribing!".to_string(),
        })
    }
}
