// Filas de la base de datos tal como las devuelve la API.

use chrono::NaiveDate;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::estado::{EstadoCiclo, EstadoEmpleadoCiclo};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Area {
    pub id_area: i64,
    pub nombre_area: String,
    pub activo: bool,
}

impl Area {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Area {
            id_area: row.get("id_area")?,
            nombre_area: row.get("nombre_area")?,
            activo: row.get("activo")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Empleado {
    pub id_empleado: i64,
    pub identificacion: String,
    pub nombre: String,
    pub apellido: String,
    pub cargo: Option<String>,
    pub id_area: Option<i64>,
    pub nombre_area: Option<String>,
    pub sueldo: f64,
    pub fecha_inicio: Option<NaiveDate>,
    pub activo: bool,
}

impl Empleado {
    /// Columnas esperadas: las de `empleado` más `nombre_area` (LEFT JOIN).
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Empleado {
            id_empleado: row.get("id_empleado")?,
            identificacion: row.get("identificacion")?,
            nombre: row.get("nombre")?,
            apellido: row.get("apellido")?,
            cargo: row.get("cargo")?,
            id_area: row.get("id_area")?,
            nombre_area: row.get("nombre_area")?,
            sueldo: row.get("sueldo")?,
            fecha_inicio: row.get("fecha_inicio")?,
            activo: row.get("activo")?,
        })
    }

    pub fn nombre_completo(&self) -> String {
        format!("{} {}", self.nombre, self.apellido).trim().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Categoria {
    pub id_categoria: i64,
    pub nombre_categoria: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Proveedor {
    pub id_proveedor: i64,
    pub nombre: String,
    pub telefono: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Talla {
    pub id_talla: i64,
    pub talla: String,
    pub tipo_articulo: Option<String>,
}

/// Talla que un empleado usa para una dotación.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TallaEmpleado {
    pub id_empleado: i64,
    pub id_dotacion: i64,
    pub nombre_dotacion: String,
    pub id_talla: i64,
    pub talla: String,
    pub fecha_actualizacion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TallaDisponible {
    pub id_talla: i64,
    pub talla: String,
    pub tipo_articulo: Option<String>,
    /// Unidades en bodega sumando todas las áreas; `None` si la talla no
    /// tiene fila de stock para la dotación.
    pub stock: Option<i64>,
    pub preferida: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dotacion {
    pub id_dotacion: i64,
    pub nombre_dotacion: String,
    pub descripcion: Option<String>,
    pub id_categoria: Option<i64>,
    pub nombre_categoria: Option<String>,
    pub id_proveedor: Option<i64>,
    pub nombre_proveedor: Option<String>,
    pub precio_unitario: f64,
    pub talla_requerida: bool,
    pub unidad_medida: Option<String>,
}

impl Dotacion {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Dotacion {
            id_dotacion: row.get("id_dotacion")?,
            nombre_dotacion: row.get("nombre_dotacion")?,
            descripcion: row.get("descripcion")?,
            id_categoria: row.get("id_categoria")?,
            nombre_categoria: row.get("nombre_categoria")?,
            id_proveedor: row.get("id_proveedor")?,
            nombre_proveedor: row.get("nombre_proveedor")?,
            precio_unitario: row.get("precio_unitario")?,
            talla_requerida: row.get("talla_requerida")?,
            unidad_medida: row.get("unidad_medida")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KitItem {
    pub id_dotacion: i64,
    pub nombre_dotacion: String,
    pub cantidad: i64,
    pub talla_requerida: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Kit {
    pub id_kit: i64,
    pub nombre: String,
    pub id_area: i64,
    pub activo: bool,
    pub items: Vec<KitItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockItem {
    pub id_stock: i64,
    pub id_dotacion: i64,
    pub nombre_dotacion: String,
    pub id_talla: Option<i64>,
    pub talla: Option<String>,
    pub id_area: Option<i64>,
    pub nombre_area: Option<String>,
    pub cantidad: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalarioMinimo {
    pub anio: i32,
    pub valor_mensual: f64,
    pub observaciones: Option<String>,
    pub fecha_actualizacion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CicloDotacion {
    pub id_ciclo: i64,
    pub nombre_ciclo: String,
    pub fecha_entrega: NaiveDate,
    pub fecha_inicio_ventana: NaiveDate,
    pub fecha_fin_ventana: NaiveDate,
    pub estado: EstadoCiclo,
    pub valor_smlv_aplicado: Option<f64>,
    pub total_empleados_elegibles: i64,
    pub observaciones: Option<String>,
    pub fecha_creacion: String,
}

impl CicloDotacion {
    pub const COLUMNAS: &'static str = "c.id_ciclo, c.nombre_ciclo, c.fecha_entrega, c.fecha_inicio_ventana, \
         c.fecha_fin_ventana, c.estado, c.valor_smlv_aplicado, c.total_empleados_elegibles, \
         c.observaciones, c.fecha_creacion";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(CicloDotacion {
            id_ciclo: row.get("id_ciclo")?,
            nombre_ciclo: row.get("nombre_ciclo")?,
            fecha_entrega: row.get("fecha_entrega")?,
            fecha_inicio_ventana: row.get("fecha_inicio_ventana")?,
            fecha_fin_ventana: row.get("fecha_fin_ventana")?,
            estado: row.get("estado")?,
            valor_smlv_aplicado: row.get("valor_smlv_aplicado")?,
            total_empleados_elegibles: row.get("total_empleados_elegibles")?,
            observaciones: row.get("observaciones")?,
            fecha_creacion: row.get("fecha_creacion")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmpleadoCiclo {
    pub id_empleado_ciclo: i64,
    pub id_empleado: i64,
    pub id_ciclo: i64,
    pub id_kit: Option<i64>,
    pub id_area: i64,
    pub estado: EstadoEmpleadoCiclo,
    pub fecha_asignacion: NaiveDate,
    pub fecha_entrega_real: Option<NaiveDate>,
    pub sueldo_al_momento: Option<f64>,
    pub observaciones: Option<String>,
    pub actualizado_por: Option<String>,
}

impl EmpleadoCiclo {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(EmpleadoCiclo {
            id_empleado_ciclo: row.get("id_empleado_ciclo")?,
            id_empleado: row.get("id_empleado")?,
            id_ciclo: row.get("id_ciclo")?,
            id_kit: row.get("id_kit")?,
            id_area: row.get("id_area")?,
            estado: row.get("estado")?,
            fecha_asignacion: row.get("fecha_asignacion")?,
            fecha_entrega_real: row.get("fecha_entrega_real")?,
            sueldo_al_momento: row.get("sueldo_al_momento")?,
            observaciones: row.get("observaciones")?,
            actualizado_por: row.get("actualizado_por")?,
        })
    }
}
