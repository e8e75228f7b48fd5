use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::campo_presente;
use crate::errors::ModelError;

/// Wire row of the `perfiles` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfilRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    pub nombre_completo: String,
    pub rol: Option<String>,
    pub avatar_url: Option<String>,
}

/// Profile attached to an authenticated user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perfil {
    pub user_id: Uuid,
    pub nombre_completo: String,
    pub rol: Option<String>,
    pub avatar_url: Option<String>,
}

pub fn from_row(row: PerfilRow) -> Result<Perfil, ModelError> {
    campo_presente("perfiles", "nombre_completo", &row.nombre_completo)?;
    Ok(Perfil {
        user_id: row.user_id,
        nombre_completo: row.nombre_completo,
        rol: row.rol,
        avatar_url: row.avatar_url,
    })
}

/// Wire shape for the profile row created at sign-up.
pub fn new_row(user_id: Uuid, nombre_completo: &str) -> PerfilRow {
    PerfilRow {
        id: None,
        user_id,
        nombre_completo: nombre_completo.trim().to_string(),
        rol: None,
        avatar_url: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_row_fields() {
        let user_id = Uuid::new_v4();
        let row = PerfilRow {
            id: Some(Uuid::new_v4()),
            user_id,
            nombre_completo: "Ana García".into(),
            rol: Some("admin".into()),
            avatar_url: None,
        };
        let perfil = from_row(row).expect("map");
        assert_eq!(perfil.user_id, user_id);
        assert_eq!(perfil.nombre_completo, "Ana García");
        assert_eq!(perfil.rol.as_deref(), Some("admin"));
    }

    #[test]
    fn empty_nombre_completo_is_rejected() {
        let row = PerfilRow {
            id: None,
            user_id: Uuid::new_v4(),
            nombre_completo: "  ".into(),
            rol: None,
            avatar_url: None,
        };
        assert!(matches!(from_row(row), Err(ModelError::Malformed(_))));
    }

    #[test]
    fn new_row_trims_the_name() {
        let row = new_row(Uuid::new_v4(), "  Ana García ");
        assert_eq!(row.nombre_completo, "Ana García");
        assert!(row.id.is_none());
    }
}
