//! The two entity kinds this application manages.

use models::docente::{self, Docente, DocenteForm, DocenteRow};
use models::empleado::{self, Empleado, EmpleadoForm, EmpleadoRow};
use models::errors::ModelError;

use super::EntityKind;

/// Mapping configuration for the `empleados` collection.
pub struct EmpleadoKind;

impl EntityKind for EmpleadoKind {
    const TABLE: &'static str = "empleados";
    const ORDER_BY: &'static str = "nombre";
    const LABEL: &'static str = "empleado";
    const LABEL_PLURAL: &'static str = "empleados";
    const LABEL_TITLE: &'static str = "Empleado";
    const HAS_ESPECIALIDADES: bool = false;

    type Row = EmpleadoRow;
    type Model = Empleado;
    type Form = EmpleadoForm;

    fn model_from_row(row: Self::Row) -> Result<Self::Model, ModelError> {
        empleado::from_row(row)
    }

    fn row_from_form(form: &Self::Form) -> Self::Row {
        empleado::to_row(form)
    }

    fn es_activo(model: &Self::Model) -> bool {
        model.estado.es_activo()
    }

    fn departamento(model: &Self::Model) -> &str {
        &model.departamento
    }

    fn salario(model: &Self::Model) -> f64 {
        model.salario
    }

    fn search_fields(model: &Self::Model) -> [&str; 5] {
        [
            &model.nombre,
            &model.apellido,
            &model.email,
            &model.puesto,
            &model.departamento,
        ]
    }
}

/// Mapping configuration for the `docentes` collection.
pub struct DocenteKind;

impl EntityKind for DocenteKind {
    const TABLE: &'static str = "docentes";
    const ORDER_BY: &'static str = "nombre";
    const LABEL: &'static str = "docente";
    const LABEL_PLURAL: &'static str = "docentes";
    const LABEL_TITLE: &'static str = "Docente";
    const HAS_ESPECIALIDADES: bool = true;

    type Row = DocenteRow;
    type Model = Docente;
    type Form = DocenteForm;

    fn model_from_row(row: Self::Row) -> Result<Self::Model, ModelError> {
        docente::from_row(row)
    }

    fn row_from_form(form: &Self::Form) -> Self::Row {
        docente::to_row(form)
    }

    fn es_activo(model: &Self::Model) -> bool {
        model.activo
    }

    fn departamento(model: &Self::Model) -> &str {
        &model.departamento
    }

    fn salario(model: &Self::Model) -> f64 {
        model.salario
    }

    fn especialidad(model: &Self::Model) -> Option<&str> {
        Some(&model.especialidad)
    }

    fn search_fields(model: &Self::Model) -> [&str; 5] {
        [
            &model.nombre,
            &model.apellido,
            &model.email,
            &model.especialidad,
            &model.departamento,
        ]
    }
}
