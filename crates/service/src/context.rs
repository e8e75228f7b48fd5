use std::sync::Arc;

use backend::{AuthApi, RowStore};
use common::notify::Notices;

use crate::cache::QueryCache;
use crate::entity::kinds::{DocenteKind, EmpleadoKind};
use crate::entity::EntityService;
use crate::session::AuthSession;

/// Everything the view layer consumes, built once at process start and
/// passed by reference. Both entity services share one cache and one notice
/// channel with the session.
pub struct AppContext<B: RowStore + AuthApi + 'static> {
    pub empleados: EntityService<EmpleadoKind, B>,
    pub docentes: EntityService<DocenteKind, B>,
    pub auth: AuthSession<B>,
    pub notices: Notices,
    pub cache: Arc<QueryCache>,
}

impl<B: RowStore + AuthApi + 'static> AppContext<B> {
    pub fn new(backend: Arc<B>) -> Self {
        let notices = Notices::new();
        let cache = Arc::new(QueryCache::new());
        Self {
            empleados: EntityService::new(
                Arc::clone(&backend),
                Arc::clone(&cache),
                notices.clone(),
            ),
            docentes: EntityService::new(
                Arc::clone(&backend),
                Arc::clone(&cache),
                notices.clone(),
            ),
            auth: AuthSession::new(backend, notices.clone()),
            notices,
            cache,
        }
    }

    /// Resolve any existing session and begin listening for auth changes.
    pub async fn start(&self) {
        self.auth.start().await;
    }
}
