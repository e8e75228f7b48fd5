use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::{campo_obligatorio, campo_presente, telefono_presente};

/// Employment status surfaced to the application. The wire shape carries a
/// nullable boolean `activo`; the two are synchronized only in `from_row`
/// and `to_row`, never stored independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Estado {
    Activo,
    Inactivo,
}

impl Estado {
    pub fn from_activo(activo: bool) -> Self {
        if activo {
            Estado::Activo
        } else {
            Estado::Inactivo
        }
    }

    pub fn es_activo(self) -> bool {
        matches!(self, Estado::Activo)
    }
}

/// Wire row of the `empleados` collection, exactly as the backend declares
/// it. `id` is absent on insert and assigned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmpleadoRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub puesto: String,
    pub departamento: String,
    pub fecha_contratacion: NaiveDate,
    pub salario: f64,
    pub telefono: Option<String>,
    pub activo: Option<bool>,
}

/// Application view of an employee record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Empleado {
    pub id: Uuid,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub puesto: String,
    pub departamento: String,
    pub fecha_contratacion: NaiveDate,
    pub salario: f64,
    pub telefono: Option<String>,
    pub estado: Estado,
}

/// Form data accepted by create/update: an employee without its identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmpleadoForm {
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub puesto: String,
    pub departamento: String,
    pub fecha_contratacion: NaiveDate,
    pub salario: f64,
    pub telefono: Option<String>,
    pub estado: Estado,
}

/// Map a backend row to the view model. Sole validation boundary for rows
/// of this collection: a row without id or with empty personal fields is
/// rejected instead of leaking half-formed records into the app.
pub fn from_row(row: EmpleadoRow) -> Result<Empleado, ModelError> {
    let id = row
        .id
        .ok_or_else(|| ModelError::Malformed("empleados: fila sin id".into()))?;
    campo_presente("empleados", "nombre", &row.nombre)?;
    campo_presente("empleados", "apellido", &row.apellido)?;
    campo_presente("empleados", "email", &row.email)?;
    if row.salario < 0.0 {
        return Err(ModelError::Malformed("empleados: salario negativo".into()));
    }
    Ok(Empleado {
        id,
        nombre: row.nombre,
        apellido: row.apellido,
        email: row.email,
        puesto: row.puesto,
        departamento: row.departamento,
        fecha_contratacion: row.fecha_contratacion,
        salario: row.salario,
        telefono: telefono_presente(row.telefono),
        estado: Estado::from_activo(row.activo.unwrap_or(false)),
    })
}

/// Map form data to the wire shape for insert/update. Inverse of `from_row`
/// up to the identifier, which the backend owns.
pub fn to_row(form: &EmpleadoForm) -> EmpleadoRow {
    EmpleadoRow {
        id: None,
        nombre: form.nombre.clone(),
        apellido: form.apellido.clone(),
        email: form.email.clone(),
        puesto: form.puesto.clone(),
        departamento: form.departamento.clone(),
        fecha_contratacion: form.fecha_contratacion,
        salario: form.salario,
        telefono: form.telefono.clone(),
        activo: Some(form.estado.es_activo()),
    }
}

/// Required-field presence check the form UI runs before submitting; the
/// service operations do not re-validate.
pub fn validate_form(form: &EmpleadoForm) -> Result<(), ModelError> {
    campo_obligatorio("nombre", &form.nombre)?;
    campo_obligatorio("apellido", &form.apellido)?;
    campo_obligatorio("email", &form.email)?;
    campo_obligatorio("puesto", &form.puesto)?;
    campo_obligatorio("departamento", &form.departamento)?;
    if form.salario < 0.0 {
        return Err(ModelError::Validation("salario debe ser no negativo".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> EmpleadoForm {
        EmpleadoForm {
            nombre: "Ana".into(),
            apellido: "García".into(),
            email: "ana.garcia@example.com".into(),
            puesto: "Desarrolladora".into(),
            departamento: "Tecnología".into(),
            fecha_contratacion: NaiveDate::from_ymd_opt(2023, 5, 10).unwrap(),
            salario: 45000.0,
            telefono: Some("555-0101".into()),
            estado: Estado::Activo,
        }
    }

    #[test]
    fn round_trip_preserves_every_field_except_id() {
        let f = form();
        let mut row = to_row(&f);
        row.id = Some(Uuid::new_v4());
        let emp = from_row(row).expect("map");

        assert_eq!(emp.nombre, f.nombre);
        assert_eq!(emp.apellido, f.apellido);
        assert_eq!(emp.email, f.email);
        assert_eq!(emp.puesto, f.puesto);
        assert_eq!(emp.departamento, f.departamento);
        assert_eq!(emp.fecha_contratacion, f.fecha_contratacion);
        assert_eq!(emp.salario, f.salario);
        assert_eq!(emp.telefono, f.telefono);
        assert_eq!(emp.estado, f.estado);
    }

    #[test]
    fn estado_and_activo_always_agree() {
        for estado in [Estado::Activo, Estado::Inactivo] {
            let mut f = form();
            f.estado = estado;
            let mut row = to_row(&f);
            assert_eq!(row.activo, Some(estado.es_activo()));
            row.id = Some(Uuid::new_v4());
            let emp = from_row(row).expect("map");
            assert_eq!(emp.estado, estado);
        }
    }

    #[test]
    fn estado_serializes_as_lowercase_string() {
        assert_eq!(serde_json::to_string(&Estado::Activo).unwrap(), "\"activo\"");
        assert_eq!(serde_json::to_string(&Estado::Inactivo).unwrap(), "\"inactivo\"");
    }

    #[test]
    fn null_activo_maps_to_inactivo() {
        let mut row = to_row(&form());
        row.id = Some(Uuid::new_v4());
        row.activo = None;
        let emp = from_row(row).expect("map");
        assert_eq!(emp.estado, Estado::Inactivo);
    }

    #[test]
    fn empty_telefono_becomes_none() {
        let mut row = to_row(&form());
        row.id = Some(Uuid::new_v4());
        row.telefono = Some("  ".into());
        let emp = from_row(row).expect("map");
        assert_eq!(emp.telefono, None);
    }

    #[test]
    fn row_without_id_is_rejected() {
        let row = to_row(&form());
        assert!(matches!(from_row(row), Err(ModelError::Malformed(_))));
    }

    #[test]
    fn row_with_empty_nombre_is_rejected() {
        let mut row = to_row(&form());
        row.id = Some(Uuid::new_v4());
        row.nombre = String::new();
        assert!(matches!(from_row(row), Err(ModelError::Malformed(_))));
    }

    #[test]
    fn negative_salario_is_rejected() {
        let mut row = to_row(&form());
        row.id = Some(Uuid::new_v4());
        row.salario = -1.0;
        assert!(matches!(from_row(row), Err(ModelError::Malformed(_))));
    }

    #[test]
    fn decodes_wire_json() {
        let raw = r#"{
            "id": "6f9bd2c8-0f3e-4a55-9d6e-0d1b5b1f2a33",
            "nombre": "Ana",
            "apellido": "García",
            "email": "ana.garcia@example.com",
            "puesto": "Desarrolladora",
            "departamento": "Tecnología",
            "fecha_contratacion": "2023-05-10",
            "salario": 45000,
            "telefono": null,
            "activo": true
        }"#;
        let row: EmpleadoRow = serde_json::from_str(raw).expect("decode");
        let emp = from_row(row).expect("map");
        assert_eq!(emp.estado, Estado::Activo);
        assert_eq!(emp.telefono, None);
        assert_eq!(
            emp.fecha_contratacion,
            NaiveDate::from_ymd_opt(2023, 5, 10).unwrap()
        );
    }

    #[test]
    fn form_validation_requires_presence() {
        assert!(validate_form(&form()).is_ok());
        let mut f = form();
        f.email = "   ".into();
        assert!(matches!(validate_form(&f), Err(ModelError::Validation(_))));
    }
}
