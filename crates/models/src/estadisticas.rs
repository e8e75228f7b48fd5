use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Derived aggregate over the full current set of one entity kind.
/// Never persisted; recomputed from a fresh fetch on every uncached
/// request. `especialidades` is populated for instructors only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Estadisticas {
    pub total: u64,
    pub activos: u64,
    pub inactivos: u64,
    pub departamentos: HashMap<String, u64>,
    pub salario_promedio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub especialidades: Option<HashMap<String, u64>>,
}
