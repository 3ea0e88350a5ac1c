pub mod claims;
pub mod codec;
pub mod config;
pub mod error;
pub mod global;
pub mod guards;
pub mod property;
pub mod roles;
pub mod session;
pub mod state;
pub mod temporal;

pub use claims::Claims;
pub use codec::{decode, sign, verify, ClaimsCodec, JwtCodec};
pub use config::{SignOptions, VerifyOptions};
pub use error::{GuardError, TokenError, TokenResult};
pub use guards::{ensure_role, ensure_valid};
pub use jsonwebtoken::Algorithm;
pub use property::PropertyPath;
pub use roles::{RoleExpression, RoleQuery};
pub use session::TokenSession;
pub use state::TokenState;
pub use temporal::{is_valid_at, unix_now};
