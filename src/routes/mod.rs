mod auth;
mod health_check;

pub use auth::change_password;
pub use auth::get_current_user;
pub use auth::login;
pub use auth::logout;
pub use auth::refresh;
pub use health_check::health_check;
