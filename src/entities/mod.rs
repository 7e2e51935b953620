pub mod prelude;

pub mod contacts;
pub mod forgot_password_tokens;
pub mod refresh_tokens;
pub mod users;
