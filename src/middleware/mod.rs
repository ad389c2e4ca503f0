/// Middleware module
///
/// Request-level authentication gate for protected routes.

mod jwt_middleware;

pub use jwt_middleware::JwtMiddleware;
