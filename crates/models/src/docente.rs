use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::{campo_obligatorio, campo_presente, telefono_presente};

/// Wire row of the `docentes` collection. Same contract as `empleados`
/// except for `especialidad`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocenteRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub especialidad: String,
    pub departamento: String,
    pub fecha_contratacion: NaiveDate,
    pub salario: f64,
    pub telefono: Option<String>,
    pub activo: Option<bool>,
}

/// Application view of an instructor record. Unlike `Empleado`, the status
/// stays a plain boolean here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Docente {
    pub id: Uuid,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub especialidad: String,
    pub departamento: String,
    pub fecha_contratacion: NaiveDate,
    pub salario: f64,
    pub telefono: Option<String>,
    pub activo: bool,
}

/// Form data accepted by create/update: an instructor without its identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocenteForm {
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub especialidad: String,
    pub departamento: String,
    pub fecha_contratacion: NaiveDate,
    pub salario: f64,
    pub telefono: Option<String>,
    pub activo: bool,
}

/// Map a backend row to the view model; sole validation boundary for rows
/// of this collection.
pub fn from_row(row: DocenteRow) -> Result<Docente, ModelError> {
    let id = row
        .id
        .ok_or_else(|| ModelError::Malformed("docentes: fila sin id".into()))?;
    campo_presente("docentes", "nombre", &row.nombre)?;
    campo_presente("docentes", "apellido", &row.apellido)?;
    campo_presente("docentes", "email", &row.email)?;
    if row.salario < 0.0 {
        return Err(ModelError::Malformed("docentes: salario negativo".into()));
    }
    Ok(Docente {
        id,
        nombre: row.nombre,
        apellido: row.apellido,
        email: row.email,
        especialidad: row.especialidad,
        departamento: row.departamento,
        fecha_contratacion: row.fecha_contratacion,
        salario: row.salario,
        telefono: telefono_presente(row.telefono),
        activo: row.activo.unwrap_or(false),
    })
}

/// Map form data to the wire shape for insert/update.
pub fn to_row(form: &DocenteForm) -> DocenteRow {
    DocenteRow {
        id: None,
        nombre: form.nombre.clone(),
        apellido: form.apellido.clone(),
        email: form.email.clone(),
        especialidad: form.especialidad.clone(),
        departamento: form.departamento.clone(),
        fecha_contratacion: form.fecha_contratacion,
        salario: form.salario,
        telefono: form.telefono.clone(),
        activo: Some(form.activo),
    }
}

/// Required-field presence check the form UI runs before submitting.
pub fn validate_form(form: &DocenteForm) -> Result<(), ModelError> {
    campo_obligatorio("nombre", &form.nombre)?;
    campo_obligatorio("apellido", &form.apellido)?;
    campo_obligatorio("email", &form.email)?;
    campo_obligatorio("especialidad", &form.especialidad)?;
    campo_obligatorio("departamento", &form.departamento)?;
    if form.salario < 0.0 {
        return Err(ModelError::Validation("salario debe ser no negativo".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> DocenteForm {
        DocenteForm {
            nombre: "Luis".into(),
            apellido: "Martínez".into(),
            email: "luis.martinez@example.com".into(),
            especialidad: "Matemáticas".into(),
            departamento: "Ciencias".into(),
            fecha_contratacion: NaiveDate::from_ymd_opt(2021, 9, 1).unwrap(),
            salario: 52000.0,
            telefono: None,
            activo: true,
        }
    }

    #[test]
    fn round_trip_preserves_every_field_except_id() {
        let f = form();
        let mut row = to_row(&f);
        row.id = Some(Uuid::new_v4());
        let doc = from_row(row).expect("map");

        assert_eq!(doc.nombre, f.nombre);
        assert_eq!(doc.apellido, f.apellido);
        assert_eq!(doc.email, f.email);
        assert_eq!(doc.especialidad, f.especialidad);
        assert_eq!(doc.departamento, f.departamento);
        assert_eq!(doc.fecha_contratacion, f.fecha_contratacion);
        assert_eq!(doc.salario, f.salario);
        assert_eq!(doc.telefono, f.telefono);
        assert_eq!(doc.activo, f.activo);
    }

    #[test]
    fn null_activo_maps_to_false() {
        let mut row = to_row(&form());
        row.id = Some(Uuid::new_v4());
        row.activo = None;
        let doc = from_row(row).expect("map");
        assert!(!doc.activo);
    }

    #[test]
    fn row_without_id_is_rejected() {
        let row = to_row(&form());
        assert!(matches!(from_row(row), Err(ModelError::Malformed(_))));
    }

    #[test]
    fn form_validation_requires_especialidad() {
        let mut f = form();
        f.especialidad = String::new();
        assert!(matches!(validate_form(&f), Err(ModelError::Validation(_))));
    }
}
