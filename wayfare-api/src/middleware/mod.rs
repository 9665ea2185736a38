pub mod auth;
pub mod rate_limit;

pub use auth::{caller_context_middleware, CustomerClaims, RequestId};
pub use rate_limit::rate_limit_middleware;
