use thumbfm_core::Catalog;

/// Shared by every handler. The catalog owns the single store handle that
/// `main` opens at startup and closes at shutdown.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
}
