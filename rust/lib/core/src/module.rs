use axum::Router;

/// A service module that contributes HTTP routes.
///
/// Each business module (auth, isa) implements this trait to register
/// its API endpoints. The binary entry point collects all modules and
/// merges their routes into a single Router behind the authentication
/// layer.
pub trait Module: Send + Sync {
    /// Module name, used for logging.
    fn name(&self) -> &str;

    /// Return the module's routes. Paths are absolute; the binary merges
    /// them rather than nesting, so `/users/...` stays `/users/...`.
    fn routes(&self) -> Router;
}
