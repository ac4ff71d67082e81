pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{CredentialError, LoginUser, NewLoginUser};
pub use services::{CredentialService, PasswordSecurityService};
