/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing
/// - [`jwt`]: JWT access/refresh token generation and validation
/// - [`middleware`]: Bearer authentication and the request [`Principal`](middleware::Principal)
/// - [`policy`]: Per-resource authorization rules with the admin bypass
///
/// # Example
///
/// ```no_run
/// use taskgate_shared::auth::middleware::Principal;
/// use taskgate_shared::auth::policy::Ability;
/// use taskgate_shared::models::task::Task;
///
/// fn can_edit(principal: &Principal, task: &Task) -> bool {
///     principal.authorize(Ability::Update, task).is_ok()
/// }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod policy;
