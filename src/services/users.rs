use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::auth::password;
use crate::db::DbPool;
use crate::entities::{booking, user};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::geo::Coordinates;

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct SignupRequest {
    pub name: Option<String>,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    pub phone: Option<String>,
    pub current_location: Option<Coordinates>,
    pub vehicle: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub current_location: Option<Coordinates>,
    pub vehicle: Option<serde_json::Value>,
}

/// Public view of an account; never carries the password hash.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub current_location: Option<Coordinates>,
    pub vehicle: Option<serde_json::Value>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        let current_location = match (model.current_latitude, model.current_longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        };
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            current_location,
            vehicle: model.vehicle,
        }
    }
}

/// Account registration, authentication, and profile management.
#[derive(Clone)]
pub struct UserService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl UserService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Create an account. Fails with Conflict when the email is taken.
    #[instrument(skip(self, request))]
    pub async fn register(&self, request: SignupRequest) -> Result<user::Model, ServiceError> {
        request.validate()?;

        let (name, email, plain_password, phone) = match (
            request.name,
            request.email,
            request.password,
            request.phone,
        ) {
            (Some(name), Some(email), Some(password), Some(phone)) => {
                (name, email, password, phone)
            }
            _ => {
                return Err(ServiceError::ValidationError(
                    "Please provide all required fields: name, email, password, phone".to_string(),
                ))
            }
        };

        let db = &*self.db_pool;

        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(email.clone()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "User already exists with this email".to_string(),
            ));
        }

        let password_hash = password::hash_password(&plain_password)?;
        let (latitude, longitude) = match request.current_location {
            Some(point) => (Some(point.latitude), Some(point.longitude)),
            None => (None, None),
        };

        let model = user::ActiveModel {
            name: Set(name),
            email: Set(email),
            password_hash: Set(password_hash),
            phone: Set(phone),
            current_latitude: Set(latitude),
            current_longitude: Set(longitude),
            vehicle: Set(request.vehicle),
            ..Default::default()
        };

        let created = model.insert(db).await?;
        info!(user_id = %created.id, "user registered");

        if let Some(events) = &self.event_sender {
            let _ = events.send(Event::UserRegistered(created.id)).await;
        }

        Ok(created)
    }

    /// Check credentials. The same error covers unknown email and wrong
    /// password so the endpoint does not leak which accounts exist.
    #[instrument(skip(self, request))]
    pub async fn authenticate(&self, request: LoginRequest) -> Result<user::Model, ServiceError> {
        let (email, plain_password) = match (request.email, request.password) {
            (Some(email), Some(password)) => (email, password),
            _ => {
                return Err(ServiceError::ValidationError(
                    "Please provide email and password".to_string(),
                ))
            }
        };

        let db = &*self.db_pool;
        let user = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(db)
            .await?;

        match user {
            Some(user) if password::verify_password(&plain_password, &user.password_hash)? => {
                Ok(user)
            }
            _ => Err(ServiceError::Unauthorized(
                "Invalid email or password".to_string(),
            )),
        }
    }

    /// Fetch a profile with the account's bookings, newest first.
    #[instrument(skip(self))]
    pub async fn get_profile(
        &self,
        user_id: Uuid,
    ) -> Result<(user::Model, Vec<booking::Model>), ServiceError> {
        let db = &*self.db_pool;

        let user = user::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        let bookings = booking::Entity::find()
            .filter(booking::Column::UserId.eq(user_id))
            .order_by_desc(booking::Column::CreatedAt)
            .all(db)
            .await?;

        Ok((user, bookings))
    }

    /// Patch mutable profile fields; email is immutable here.
    #[instrument(skip(self, request))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<user::Model, ServiceError> {
        let db = &*self.db_pool;

        let user = user::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        let mut active: user::ActiveModel = user.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(phone) = request.phone {
            active.phone = Set(phone);
        }
        if let Some(point) = request.current_location {
            active.current_latitude = Set(Some(point.latitude));
            active.current_longitude = Set(Some(point.longitude));
        }
        if let Some(vehicle) = request.vehicle {
            active.vehicle = Set(Some(vehicle));
        }

        let updated = active.update(db).await?;
        Ok(updated)
    }
}
