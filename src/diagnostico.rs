//! Diagnóstico de redundancia e integridad.
//!
//! Cuatro verificaciones de solo lectura e independientes entre sí. Con el
//! esquema actual ninguna debería encontrar nada, pero se ejecutan también
//! sobre bases heredadas creadas sin esas restricciones. No reparan nada.

use rusqlite::Connection;
use serde::Serialize;
use std::fmt;

use crate::error::SirdsResult;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IdentificacionDuplicada {
    pub identificacion: String,
    pub cantidad: i64,
    pub ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AsignacionDuplicada {
    pub id_empleado: i64,
    pub id_ciclo: i64,
    pub cantidad: i64,
    pub empleado: Option<String>,
    pub identificacion: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CicloHuerfano {
    pub id_ciclo: i64,
    pub cantidad: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AreasMultiples {
    pub id_empleado: i64,
    pub id_ciclo: i64,
    pub empleado: Option<String>,
    pub identificacion: Option<String>,
    pub cantidad_areas: i64,
    pub areas: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct ReporteDiagnostico {
    pub identificaciones_duplicadas: Vec<IdentificacionDuplicada>,
    pub asignaciones_duplicadas: Vec<AsignacionDuplicada>,
    pub ciclos_huerfanos: Vec<CicloHuerfano>,
    pub areas_multiples: Vec<AreasMultiples>,
}

impl ReporteDiagnostico {
    pub fn sin_problemas(&self) -> bool {
        self.identificaciones_duplicadas.is_empty()
            && self.asignaciones_duplicadas.is_empty()
            && self.ciclos_huerfanos.is_empty()
            && self.areas_multiples.is_empty()
    }

    pub fn total_problemas(&self) -> usize {
        self.identificaciones_duplicadas.len()
            + self.asignaciones_duplicadas.len()
            + self.ciclos_huerfanos.len()
            + self.areas_multiples.len()
    }
}

fn separar_ids(lista: &str) -> Vec<i64> {
    let mut ids: Vec<i64> = lista.split(',').filter_map(|s| s.trim().parse().ok()).collect();
    ids.sort_unstable();
    ids
}

fn separar_textos(lista: Option<String>) -> Vec<String> {
    let mut v: Vec<String> = lista
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    v.sort();
    v
}

/// 1. Empleados que comparten identificación.
pub fn identificaciones_duplicadas(conn: &Connection) -> SirdsResult<Vec<IdentificacionDuplicada>> {
    let mut stmt = conn.prepare(
        "SELECT identificacion, COUNT(*), GROUP_CONCAT(id_empleado)
         FROM empleado
         GROUP BY identificacion
         HAVING COUNT(*) > 1
         ORDER BY identificacion",
    )?;
    let rows = stmt.query_map([], |r| {
        let ids: String = r.get(2)?;
        Ok(IdentificacionDuplicada { identificacion: r.get(0)?, cantidad: r.get(1)?, ids: separar_ids(&ids) })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// 2. Pares (empleado, ciclo) repetidos en `empleado_ciclo`.
pub fn asignaciones_duplicadas(conn: &Connection) -> SirdsResult<Vec<AsignacionDuplicada>> {
    let mut stmt = conn.prepare(
        "SELECT ec.id_empleado, ec.id_ciclo, COUNT(*),
                TRIM(e.nombre || ' ' || e.apellido), e.identificacion
         FROM empleado_ciclo ec
         LEFT JOIN empleado e ON e.id_empleado = ec.id_empleado
         GROUP BY ec.id_empleado, ec.id_ciclo
         HAVING COUNT(*) > 1
         ORDER BY ec.id_ciclo, ec.id_empleado",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(AsignacionDuplicada {
            id_empleado: r.get(0)?,
            id_ciclo: r.get(1)?,
            cantidad: r.get(2)?,
            empleado: r.get(3)?,
            identificacion: r.get(4)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// 3. Asignaciones que apuntan a un ciclo inexistente.
pub fn ciclos_huerfanos(conn: &Connection) -> SirdsResult<Vec<CicloHuerfano>> {
    let mut stmt = conn.prepare(
        "SELECT ec.id_ciclo, COUNT(*)
         FROM empleado_ciclo ec
         LEFT JOIN ciclo_dotacion cd ON cd.id_ciclo = ec.id_ciclo
         WHERE cd.id_ciclo IS NULL
         GROUP BY ec.id_ciclo
         ORDER BY ec.id_ciclo",
    )?;
    let rows = stmt.query_map([], |r| Ok(CicloHuerfano { id_ciclo: r.get(0)?, cantidad: r.get(1)? }))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// 4. Empleados con más de un área distinta dentro del mismo ciclo.
pub fn areas_multiples(conn: &Connection) -> SirdsResult<Vec<AreasMultiples>> {
    let mut stmt = conn.prepare(
        "SELECT ec.id_empleado, ec.id_ciclo,
                TRIM(e.nombre || ' ' || e.apellido), e.identificacion,
                COUNT(DISTINCT ec.id_area), GROUP_CONCAT(DISTINCT a.nombre_area)
         FROM empleado_ciclo ec
         LEFT JOIN empleado e ON e.id_empleado = ec.id_empleado
         LEFT JOIN area a ON a.id_area = ec.id_area
         GROUP BY ec.id_empleado, ec.id_ciclo
         HAVING COUNT(DISTINCT ec.id_area) > 1
         ORDER BY ec.id_ciclo, ec.id_empleado",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(AreasMultiples {
            id_empleado: r.get(0)?,
            id_ciclo: r.get(1)?,
            empleado: r.get(2)?,
            identificacion: r.get(3)?,
            cantidad_areas: r.get(4)?,
            areas: separar_textos(r.get(5)?),
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Ejecuta las cuatro verificaciones.
pub fn diagnosticar(conn: &Connection) -> SirdsResult<ReporteDiagnostico> {
    let reporte = ReporteDiagnostico {
        identificaciones_duplicadas: identificaciones_duplicadas(conn)?,
        asignaciones_duplicadas: asignaciones_duplicadas(conn)?,
        ciclos_huerfanos: ciclos_huerfanos(conn)?,
        areas_multiples: areas_multiples(conn)?,
    };
    if reporte.sin_problemas() {
        log::info!("diagnóstico sin problemas");
    } else {
        log::warn!("diagnóstico encontró {} problemas", reporte.total_problemas());
    }
    Ok(reporte)
}

impl fmt::Display for ReporteDiagnostico {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "1. Empleados duplicados por identificación")?;
        if self.identificaciones_duplicadas.is_empty() {
            writeln!(f, "   OK")?;
        }
        for d in &self.identificaciones_duplicadas {
            let ids: Vec<String> = d.ids.iter().map(|i| i.to_string()).collect();
            writeln!(f, "   - identificación {}: {} registros (ids {})", d.identificacion, d.cantidad, ids.join(", "))?;
        }

        writeln!(f, "2. Asignaciones duplicadas en empleado_ciclo")?;
        if self.asignaciones_duplicadas.is_empty() {
            writeln!(f, "   OK")?;
        }
        for d in &self.asignaciones_duplicadas {
            writeln!(
                f,
                "   - {} ({}): ciclo {}, {} filas",
                d.empleado.as_deref().unwrap_or("empleado desconocido"),
                d.identificacion.as_deref().unwrap_or("-"),
                d.id_ciclo,
                d.cantidad
            )?;
        }

        writeln!(f, "3. Asignaciones con ciclo inexistente")?;
        if self.ciclos_huerfanos.is_empty() {
            writeln!(f, "   OK")?;
        }
        for h in &self.ciclos_huerfanos {
            writeln!(f, "   - ciclo {}: {} filas", h.id_ciclo, h.cantidad)?;
        }

        writeln!(f, "4. Empleados con varias áreas en el mismo ciclo")?;
        if self.areas_multiples.is_empty() {
            writeln!(f, "   OK")?;
        }
        for m in &self.areas_multiples {
            writeln!(
                f,
                "   - {} ({}): ciclo {}, áreas {}",
                m.empleado.as_deref().unwrap_or("empleado desconocido"),
                m.identificacion.as_deref().unwrap_or("-"),
                m.id_ciclo,
                m.areas.join(", ")
            )?;
        }
        Ok(())
    }
}
