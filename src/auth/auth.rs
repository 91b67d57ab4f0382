use crate::auth::{jwt::verify_token, session::token_from};
use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

/// The current session. Extraction fails with 401 when there is no valid session.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Already resolved by auth_middleware
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        ready(Self::from_token(req).map_err(Into::into))
    }
}

impl AuthUser {
    fn from_token(req: &HttpRequest) -> Result<Self, ApiError> {
        let config = req.app_data::<Data<Config>>().ok_or_else(|| {
            tracing::error!("Config missing from app data");
            ApiError::Internal
        })?;

        let token = token_from(req).ok_or(ApiError::Unauthorized)?;
        let claims =
            verify_token(&token, &config.jwt_secret).map_err(|_| ApiError::Unauthorized)?;

        Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.sub,
            role: claims.role,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_employee(&self) -> bool {
        self.role == Role::Employee
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden())
        }
    }

    /// Admins may act on anyone, employees only on themselves
    pub fn require_self_or_admin(&self, user_id: u64) -> Result<(), ApiError> {
        if self.is_admin() || self.user_id == user_id {
            Ok(())
        } else {
            Err(ApiError::forbidden())
        }
    }
}
