//! Typed shapes for every backend collection plus the mapping boundary
//! between wire rows and application view models.
//!
//! The `from_row`/`to_row` pairs in each module are the only place where
//! structural validation happens; everything downstream works with already
//! validated view models.

pub mod docente;
pub mod empleado;
pub mod errors;
pub mod estadisticas;
pub mod perfil;

use errors::ModelError;

/// Reject a malformed row that is missing a required text field.
pub(crate) fn campo_presente(tabla: &str, campo: &str, valor: &str) -> Result<(), ModelError> {
    if valor.trim().is_empty() {
        return Err(ModelError::Malformed(format!("{tabla}: {campo} vacío")));
    }
    Ok(())
}

/// Required-field presence check for form submissions.
pub(crate) fn campo_obligatorio(campo: &str, valor: &str) -> Result<(), ModelError> {
    if valor.trim().is_empty() {
        return Err(ModelError::Validation(format!("{campo} es obligatorio")));
    }
    Ok(())
}

/// The backend stores absent phones as null or empty string; the view model
/// only keeps a phone that is actually there.
pub(crate) fn telefono_presente(telefono: Option<String>) -> Option<String> {
    telefono.filter(|t| !t.trim().is_empty())
}
