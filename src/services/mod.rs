pub mod contact_service;
pub mod contact_service_impl;
pub use contact_service::{ContactError, ContactService};
pub use contact_service_impl::SeaOrmContactService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{AuthTokens, UserError, UserService};
pub use user_service_impl::SeaOrmUserService;

pub mod email_service;
pub use email_service::EmailService;

pub mod mailer;
pub use mailer::{EmailError, LogMailer, Mailer, OutgoingEmail, SmtpMailer, mailer_from_config};

pub mod similarity;

pub mod token_service;
pub use token_service::{AccessTokenClaims, TokenError, TokenService};
