//! Generic CRUD + statistics over one backend collection.
//!
//! Both entity kinds share the single implementation below; everything that
//! differs between them lives in an `EntityKind` configuration.

pub mod kinds;

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{error, instrument};
use uuid::Uuid;

use backend::{BackendError, RowStore};
use common::notify::Notices;
use models::errors::ModelError;
use models::estadisticas::Estadisticas;

use crate::cache::{CacheKey, QueryCache};
use crate::errors::ServiceError;

/// Field-mapping configuration for one entity kind: which collection it
/// lives in, how rows and view models translate, and which fields feed the
/// statistics and the list search.
pub trait EntityKind: Send + Sync + 'static {
    /// Backend collection name.
    const TABLE: &'static str;
    /// Column the list is ordered by.
    const ORDER_BY: &'static str;
    /// Labels used in user-facing notices.
    const LABEL: &'static str;
    const LABEL_PLURAL: &'static str;
    const LABEL_TITLE: &'static str;
    /// Whether the statistics snapshot tracks a specialty distribution.
    const HAS_ESPECIALIDADES: bool;

    type Row: Serialize + DeserializeOwned + Send;
    type Model: Clone + Serialize + DeserializeOwned + Send + Sync;
    type Form: Send + Sync;

    fn model_from_row(row: Self::Row) -> Result<Self::Model, ModelError>;
    fn row_from_form(form: &Self::Form) -> Self::Row;

    fn es_activo(model: &Self::Model) -> bool;
    fn departamento(model: &Self::Model) -> &str;
    fn salario(model: &Self::Model) -> f64;
    fn especialidad(_model: &Self::Model) -> Option<&str> {
        None
    }
    /// Fields the list search matches against.
    fn search_fields(model: &Self::Model) -> [&str; 5];
}

/// CRUD + statistics front for one collection. Owns no persistent state;
/// the backend is the sole source of truth and every returned value is an
/// independently owned copy.
pub struct EntityService<K: EntityKind, S: RowStore> {
    store: Arc<S>,
    cache: Arc<QueryCache>,
    notices: Notices,
    _kind: PhantomData<K>,
}

impl<K: EntityKind, S: RowStore> Clone for EntityService<K, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            notices: self.notices.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: EntityKind, S: RowStore> EntityService<K, S> {
    pub fn new(store: Arc<S>, cache: Arc<QueryCache>, notices: Notices) -> Self {
        Self {
            store,
            cache,
            notices,
            _kind: PhantomData,
        }
    }

    fn list_key() -> CacheKey {
        CacheKey::list(K::TABLE)
    }

    fn statistics_key() -> CacheKey {
        CacheKey::statistics(K::TABLE)
    }

    /// Dependent reads must observe every successful write.
    fn invalidate_reads(&self) {
        self.cache.invalidate(&Self::list_key());
        self.cache.invalidate(&Self::statistics_key());
    }

    async fn fetch_mapped(&self) -> Result<Vec<K::Model>, ServiceError> {
        let rows = self.store.fetch_all(K::TABLE, K::ORDER_BY).await?;
        rows.into_iter().map(decode_row::<K>).collect()
    }

    /// All records of this kind, ordered by first name. Backend failures
    /// are absorbed: the caller sees an empty list after a warning notice.
    /// Only successful results are cached.
    #[instrument(skip(self), fields(tabla = K::TABLE))]
    pub async fn list(&self) -> Vec<K::Model> {
        if let Some(cached) = self.cache.get::<Vec<K::Model>>(&Self::list_key()) {
            return cached;
        }
        match self.fetch_mapped().await {
            Ok(models) => {
                self.cache.put(Self::list_key(), &models);
                models
            }
            Err(e) => {
                error!(error = %e, "no se pudo obtener la lista");
                self.notices
                    .warn(format!("Error al cargar la lista de {}", K::LABEL_PLURAL));
                Vec::new()
            }
        }
    }

    /// One record by id; not-found, backend errors, and malformed rows all
    /// come back as `None` (error cases emit a warning notice first).
    #[instrument(skip(self), fields(tabla = K::TABLE, id = %id))]
    pub async fn get_by_id(&self, id: Uuid) -> Option<K::Model> {
        match self.store.fetch_one(K::TABLE, "id", id).await {
            Ok(value) => match decode_row::<K>(value) {
                Ok(model) => Some(model),
                Err(e) => {
                    error!(error = %e, "fila inválida");
                    self.notices
                        .warn(format!("Error al obtener los datos del {}", K::LABEL));
                    None
                }
            },
            Err(BackendError::RowNotFound) => None,
            Err(e) => {
                error!(error = %e, "no se pudo obtener el registro");
                self.notices
                    .warn(format!("Error al obtener los datos del {}", K::LABEL));
                None
            }
        }
    }

    #[instrument(skip(self, form), fields(tabla = K::TABLE))]
    pub async fn create(&self, form: &K::Form) -> Result<K::Model, ServiceError> {
        match self.try_create(form).await {
            Ok(model) => {
                self.notices
                    .success(format!("{} creado correctamente", K::LABEL_TITLE));
                self.invalidate_reads();
                Ok(model)
            }
            Err(e) => {
                error!(error = %e, "no se pudo crear el registro");
                self.notices.warn(format!("Error al crear el {}", K::LABEL));
                Err(e)
            }
        }
    }

    async fn try_create(&self, form: &K::Form) -> Result<K::Model, ServiceError> {
        let row = encode_row::<K>(form)?;
        let stored = self.store.insert(K::TABLE, row).await?;
        decode_row::<K>(stored)
    }

    /// Update the record matching `id`. A non-existent id propagates as a
    /// not-found failure and adds nothing.
    #[instrument(skip(self, form), fields(tabla = K::TABLE, id = %id))]
    pub async fn update(&self, id: Uuid, form: &K::Form) -> Result<K::Model, ServiceError> {
        match self.try_update(id, form).await {
            Ok(model) => {
                self.notices
                    .success(format!("{} actualizado correctamente", K::LABEL_TITLE));
                self.invalidate_reads();
                Ok(model)
            }
            Err(e) => {
                error!(error = %e, "no se pudo actualizar el registro");
                self.notices
                    .warn(format!("Error al actualizar el {}", K::LABEL));
                Err(e)
            }
        }
    }

    async fn try_update(&self, id: Uuid, form: &K::Form) -> Result<K::Model, ServiceError> {
        let row = encode_row::<K>(form)?;
        let stored = self
            .store
            .update(K::TABLE, id, row)
            .await
            .map_err(|e| match e {
                BackendError::RowNotFound => ServiceError::not_found(K::LABEL),
                e => ServiceError::Backend(e),
            })?;
        decode_row::<K>(stored)
    }

    /// Delete the record matching `id`. Deleting an already absent record
    /// counts as success.
    #[instrument(skip(self), fields(tabla = K::TABLE, id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        match self.store.delete(K::TABLE, id).await {
            Ok(()) => {
                self.notices
                    .success(format!("{} eliminado correctamente", K::LABEL_TITLE));
                self.invalidate_reads();
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "no se pudo eliminar el registro");
                self.notices.warn(format!("Error al eliminar el {}", K::LABEL));
                Err(e.into())
            }
        }
    }

    /// Aggregate snapshot over the full current set, recomputed on every
    /// uncached request. The underlying fetch failure is propagated after a
    /// warning notice.
    #[instrument(skip(self), fields(tabla = K::TABLE))]
    pub async fn statistics(&self) -> Result<Estadisticas, ServiceError> {
        if let Some(cached) = self.cache.get::<Estadisticas>(&Self::statistics_key()) {
            return Ok(cached);
        }
        match self.fetch_mapped().await {
            Ok(models) => {
                let snapshot = compute_estadisticas::<K>(&models);
                self.cache.put(Self::statistics_key(), &snapshot);
                Ok(snapshot)
            }
            Err(e) => {
                error!(error = %e, "no se pudieron calcular las estadísticas");
                self.notices.warn("Error al cargar las estadísticas");
                Err(e)
            }
        }
    }
}

fn decode_row<K: EntityKind>(value: Value) -> Result<K::Model, ServiceError> {
    let row: K::Row = serde_json::from_value(value)
        .map_err(|e| ModelError::Malformed(format!("{}: {}", K::TABLE, e)))?;
    Ok(K::model_from_row(row)?)
}

fn encode_row<K: EntityKind>(form: &K::Form) -> Result<Value, ServiceError> {
    serde_json::to_value(K::row_from_form(form))
        .map_err(|e| ModelError::Malformed(format!("{}: {}", K::TABLE, e)).into())
}

/// Totals, per-department counts, average salary, and a specialty
/// distribution where the kind tracks one.
pub fn compute_estadisticas<K: EntityKind>(models: &[K::Model]) -> Estadisticas {
    let total = models.len() as u64;
    let activos = models.iter().filter(|m| K::es_activo(m)).count() as u64;
    let mut departamentos: HashMap<String, u64> = HashMap::new();
    for model in models {
        *departamentos
            .entry(K::departamento(model).to_string())
            .or_insert(0) += 1;
    }
    let salario_promedio = if models.is_empty() {
        0.0
    } else {
        models.iter().map(|m| K::salario(m)).sum::<f64>() / models.len() as f64
    };
    let especialidades = K::HAS_ESPECIALIDADES.then(|| {
        let mut conteo: HashMap<String, u64> = HashMap::new();
        for model in models {
            if let Some(especialidad) = K::especialidad(model) {
                *conteo.entry(especialidad.to_string()).or_insert(0) += 1;
            }
        }
        conteo
    });
    Estadisticas {
        total,
        activos,
        inactivos: total - activos,
        departamentos,
        salario_promedio,
        especialidades,
    }
}
