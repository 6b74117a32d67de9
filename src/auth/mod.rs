mod login;
mod logout;

use axum::{Router, routing::get};

use crate::AppState;

pub use login::login;
pub use logout::logout;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login::login_page).post(login::login))
        .route("/logout", get(logout::logout))
}
