pub mod claims;
pub mod context;
pub mod middleware;
pub mod password;
pub mod tokens;

pub use claims::Claims;
pub use context::AuthContext;
pub use middleware::RequireAuth;
pub use tokens::{IssuedToken, TokenService};
