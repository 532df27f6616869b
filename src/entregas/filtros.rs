use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::ciclos::Ventana;
use crate::error::{SirdsError, SirdsResult};
use crate::models::Paginacion;

/// Filtro por existencia de kit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FiltroKit {
    #[default]
    Todos,
    Con,
    Sin,
}

impl FiltroKit {
    pub fn as_str(&self) -> &'static str {
        match self {
            FiltroKit::Todos => "todos",
            FiltroKit::Con => "con",
            FiltroKit::Sin => "sin",
        }
    }
}

impl FromStr for FiltroKit {
    type Err = SirdsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "todos" | "all" => Ok(FiltroKit::Todos),
            "con" | "con_kit" => Ok(FiltroKit::Con),
            "sin" | "sin_kit" => Ok(FiltroKit::Sin),
            otro => Err(SirdsError::validation(format!("filtro de kit no válido: '{}'", otro))),
        }
    }
}

/// Filtros comunes de los listados de entregas. `estado` se interpreta según
/// el listado: vigencia en el historial de entregas, estado de la asignación
/// en el listado del ciclo activo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FiltroEntregas {
    pub search: Option<String>,
    pub estado: Option<String>,
    pub id_area: Option<i64>,
    pub kit: FiltroKit,
    pub solo_ciclo_activo: bool,
    pub fecha_inicio: Option<NaiveDate>,
    pub fecha_fin: Option<NaiveDate>,
}

pub(crate) fn no_vacio(q: &HashMap<String, String>, clave: &str) -> Option<String> {
    q.get(clave).map(|s| s.trim()).filter(|s| !s.is_empty()).map(|s| s.to_string())
}

pub(crate) fn numero<T: FromStr>(q: &HashMap<String, String>, clave: &str) -> SirdsResult<Option<T>> {
    match no_vacio(q, clave) {
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|_| SirdsError::validation(format!("parámetro '{}' no es un número válido: '{}'", clave, v))),
        None => Ok(None),
    }
}

pub(crate) fn fecha(q: &HashMap<String, String>, clave: &str) -> SirdsResult<Option<NaiveDate>> {
    match no_vacio(q, clave) {
        Some(v) => NaiveDate::parse_from_str(&v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| SirdsError::validation(format!("parámetro '{}' debe tener formato AAAA-MM-DD: '{}'", clave, v))),
        None => Ok(None),
    }
}

/// Patrón `LIKE` en minúsculas que contiene `texto` literalmente. `%`, `_`
/// y la barra invertida se escapan con `\`, así que la consulta debe declarar
/// `ESCAPE '\'`. Un texto vacío no produce patrón.
pub(crate) fn patron_like(texto: &str) -> Option<String> {
    let texto = texto.trim().to_lowercase();
    if texto.is_empty() {
        return None;
    }
    let mut patron = String::with_capacity(texto.len() + 2);
    patron.push('%');
    for c in texto.chars() {
        if matches!(c, '%' | '_' | '\\') {
            patron.push('\\');
        }
        patron.push(c);
    }
    patron.push('%');
    Some(patron)
}

pub(crate) fn bandera(q: &HashMap<String, String>, clave: &str) -> bool {
    matches!(
        no_vacio(q, clave).map(|v| v.to_lowercase()).as_deref(),
        Some("true") | Some("1") | Some("si") | Some("sí")
    )
}

impl FiltroEntregas {
    /// Lee los filtros de los parámetros de la URL.
    pub fn desde_query(q: &HashMap<String, String>) -> SirdsResult<Self> {
        let estado = no_vacio(q, "estado").filter(|e| !e.eq_ignore_ascii_case("todos"));
        Ok(FiltroEntregas {
            search: no_vacio(q, "search"),
            estado,
            id_area: numero(q, "id_area")?,
            kit: no_vacio(q, "kit").map(|k| k.parse::<FiltroKit>()).transpose()?.unwrap_or_default(),
            solo_ciclo_activo: bandera(q, "solo_ciclo_activo"),
            fecha_inicio: fecha(q, "fecha_inicio")?,
            fecha_fin: fecha(q, "fecha_fin")?,
        })
    }

    /// Patrón LIKE para la búsqueda libre; ver [`patron_like`].
    pub fn patron_busqueda(&self) -> Option<String> {
        self.search.as_deref().and_then(patron_like)
    }

    /// Rango de fechas a aplicar: las fechas explícitas tienen prioridad; si
    /// no hay y se pidió el ciclo activo, se usa su ventana (si existe).
    pub fn rango(&self, ventana_activa: Option<Ventana>) -> (Option<NaiveDate>, Option<NaiveDate>) {
        if self.fecha_inicio.is_some() || self.fecha_fin.is_some() {
            return (self.fecha_inicio, self.fecha_fin);
        }
        match (self.solo_ciclo_activo, ventana_activa) {
            (true, Some(v)) => (Some(v.inicio), Some(v.fin)),
            _ => (None, None),
        }
    }
}

impl Paginacion {
    /// Lee `page` y `limit` de la URL; valores no numéricos son un error.
    pub fn desde_query(q: &HashMap<String, String>, maximo: u32) -> SirdsResult<Self> {
        Ok(Paginacion::new(numero(q, "page")?, numero(q, "limit")?, maximo))
    }
}
