//! Identity: accounts, portal sign-in and sessions

mod context;
mod service;
mod session;

pub use context::AuthContext;
pub use service::{AuthService, AuthSession, OwnerSignupRequest, ProfileUpdate, SignupRequest};
pub use session::{SessionStore, SharedSessionStore};
