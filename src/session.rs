use tower_sessions::Session;

use crate::{AppError, AppResult};

pub const USER_ID: &str = "user_id";
pub const RETURN_URL: &str = "return_url";

pub async fn signed_in(session: &Session) -> AppResult<Option<String>> {
    Ok(session.get::<String>(USER_ID).await?)
}

pub async fn current_user(session: &Session) -> AppResult<String> {
    signed_in(session).await?.ok_or(AppError::Unauthorized)
}
