pub use super::contacts::Entity as Contacts;
pub use super::forgot_password_tokens::Entity as ForgotPasswordTokens;
pub use super::refresh_tokens::Entity as RefreshTokens;
pub use super::users::Entity as Users;
