// Cuerpos de petición aceptados por las operaciones de escritura.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{SirdsError, SirdsResult};

pub(crate) fn requerido(valor: &str, campo: &str) -> SirdsResult<String> {
    let v = valor.trim();
    if v.is_empty() {
        return Err(SirdsError::validation(format!("el campo '{}' es obligatorio", campo)));
    }
    Ok(v.to_string())
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct NuevaDotacion {
    #[serde(default)]
    pub nombre_dotacion: String,
    pub descripcion: Option<String>,
    pub id_categoria: Option<i64>,
    pub id_proveedor: Option<i64>,
    #[serde(default)]
    pub precio_unitario: f64,
    #[serde(default)]
    pub talla_requerida: bool,
    pub unidad_medida: Option<String>,
}

impl NuevaDotacion {
    pub fn validar(&self) -> SirdsResult<()> {
        requerido(&self.nombre_dotacion, "nombre_dotacion")?;
        if !self.precio_unitario.is_finite() || self.precio_unitario < 0.0 {
            return Err(SirdsError::validation("precio_unitario debe ser mayor o igual a 0"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct NuevoEmpleado {
    #[serde(default)]
    pub identificacion: String,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub apellido: String,
    pub cargo: Option<String>,
    pub id_area: Option<i64>,
    #[serde(default)]
    pub sueldo: f64,
    pub fecha_inicio: Option<NaiveDate>,
}

impl NuevoEmpleado {
    pub fn validar(&self) -> SirdsResult<()> {
        requerido(&self.identificacion, "identificacion")?;
        requerido(&self.nombre, "nombre")?;
        if !self.sueldo.is_finite() || self.sueldo < 0.0 {
            return Err(SirdsError::validation("sueldo debe ser mayor o igual a 0"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NuevoKitItem {
    pub id_dotacion: i64,
    #[serde(default = "uno")]
    pub cantidad: i64,
}

fn uno() -> i64 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct NuevoKit {
    #[serde(default)]
    pub nombre: String,
    pub id_area: i64,
    #[serde(default)]
    pub items: Vec<NuevoKitItem>,
}

impl NuevoKit {
    pub fn validar(&self) -> SirdsResult<()> {
        requerido(&self.nombre, "nombre")?;
        if self.items.is_empty() {
            return Err(SirdsError::validation("el kit debe tener al menos una dotación"));
        }
        if self.items.iter().any(|i| i.cantidad < 1) {
            return Err(SirdsError::validation("la cantidad de cada dotación del kit debe ser al menos 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NuevoCiclo {
    #[serde(default)]
    pub nombre_ciclo: String,
    pub fecha_entrega: NaiveDate,
    pub fecha_inicio_ventana: Option<NaiveDate>,
    pub fecha_fin_ventana: Option<NaiveDate>,
    pub observaciones: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NuevaEntrega {
    #[serde(default)]
    pub identificacion: String,
    pub id_dotacion: i64,
    pub id_talla: Option<i64>,
    #[serde(default = "uno")]
    pub cantidad: i64,
    pub fecha_entrega: Option<NaiveDate>,
    pub observaciones: Option<String>,
    pub usuario: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AjusteStock {
    pub id_dotacion: i64,
    pub id_talla: Option<i64>,
    pub id_area: Option<i64>,
    /// Unidades a sumar; negativo para descontar.
    pub cantidad: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NuevaArea {
    #[serde(default)]
    pub nombre_area: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NuevaCategoria {
    #[serde(default)]
    pub nombre_categoria: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NuevoProveedor {
    #[serde(default)]
    pub nombre: String,
    pub telefono: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NuevaTalla {
    #[serde(default)]
    pub talla: String,
    pub tipo_articulo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NuevoSalarioMinimo {
    pub anio: i32,
    pub valor_mensual: f64,
    pub observaciones: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CambioEstadoCiclo {
    pub estado: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CambioEstadoAsignacion {
    pub estado: String,
    pub observaciones: Option<String>,
    pub actualizado_por: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CambioEstadoEmpleado {
    #[serde(alias = "estado")]
    pub activo: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct TallaPreferida {
    pub id_dotacion: i64,
    pub id_talla: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuardarTallas {
    pub id_empleado: i64,
    #[serde(default)]
    pub tallas: Vec<TallaPreferida>,
}

/// Corrección de una entrega ya registrada. Los campos ausentes conservan su
/// valor.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CambioEntrega {
    pub cantidad: Option<i64>,
    pub id_talla: Option<i64>,
    pub fecha_entrega: Option<NaiveDate>,
    pub observaciones: Option<String>,
    pub usuario: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct NuevoPedido {
    pub observaciones: Option<String>,
}

/// Artículo recibido. Se identifica por línea del pedido (`id_detalle`) o
/// por dotación y talla.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ItemRecepcion {
    #[serde(alias = "id_detalle_pedido")]
    pub id_detalle: Option<i64>,
    pub id_dotacion: Option<i64>,
    pub id_talla: Option<i64>,
    pub cantidad: i64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct NuevaRecepcion {
    pub id_proveedor: Option<i64>,
    pub documento_referencia: Option<String>,
    pub fecha_recepcion: Option<NaiveDate>,
    pub observaciones: Option<String>,
    pub usuario: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemRecepcion>,
}

/// Usuario responsable de un movimiento; vacío o ausente cuenta como
/// `sistema`.
pub(crate) fn usuario_o_sistema(usuario: Option<&str>) -> &str {
    usuario.map(str::trim).filter(|u| !u.is_empty()).unwrap_or("sistema")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotacion_sin_nombre_o_precio_negativo() {
        let mut d = NuevaDotacion { nombre_dotacion: "  ".into(), ..Default::default() };
        assert!(d.validar().is_err());
        d.nombre_dotacion = "Botas".into();
        d.precio_unitario = -1.0;
        assert!(d.validar().is_err());
        d.precio_unitario = 0.0;
        assert!(d.validar().is_ok());
    }

    #[test]
    fn estado_de_empleado_acepta_alias() {
        let c: CambioEstadoEmpleado = serde_json::from_str(r#"{"estado": false}"#).unwrap();
        assert!(!c.activo);
        let c: CambioEstadoEmpleado = serde_json::from_str(r#"{"activo": true}"#).unwrap();
        assert!(c.activo);
    }

    #[test]
    fn usuario_vacio_es_sistema() {
        assert_eq!(usuario_o_sistema(None), "sistema");
        assert_eq!(usuario_o_sistema(Some("  ")), "sistema");
        assert_eq!(usuario_o_sistema(Some(" bodega ")), "bodega");
    }

    #[test]
    fn entrega_cantidad_por_defecto() {
        let e: NuevaEntrega = serde_json::from_str(r#"{"identificacion":"1","id_dotacion":2}"#).unwrap();
        assert_eq!(e.cantidad, 1);
        assert!(e.id_talla.is_none());
    }
}
