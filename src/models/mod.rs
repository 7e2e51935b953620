pub mod contact;
pub mod page;
pub mod requests;
pub mod role;
pub mod user;

pub use contact::{Contact, ContactInput, ContactMatch};
pub use page::{PageRequest, Paged};
pub use requests::{
    ChangePasswordRequest, ContactRequest, CreateUserRequest, ForgotPasswordRequest,
    LoginRequest, RefreshRequest, RegisterRequest, ResetPasswordRequest, UpdateUserRequest,
};
pub use role::{InvalidRoleError, Role};
pub use user::{CurrentUser, NewUser, User, UserChanges};
