/// Router Module Index
///
/// Routes are split by access level, and access control is applied per module with
/// Axum layers so a protected endpoint cannot be exposed by accident.

/// Routes accessible to anonymous callers: health checks, registration and login.
pub mod public;

/// Routes protected by the `require_auth` layer. Requires a valid bearer token (or the
/// local `x-user-id` bypass).
pub mod authenticated;
