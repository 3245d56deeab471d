//! Authentication: bearer-token signing/verification and the login
//! service behind the server-rendered credential form.

mod service;
mod token;

pub use service::{AuthService, LoginOutcome};
pub use token::{Claims, TokenKeys, TOKEN_TTL_SECS};
