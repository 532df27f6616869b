use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use super::gestion::obtener_ciclo;
use crate::error::{SirdsError, SirdsResult};
use crate::models::{EmpleadoCiclo, EstadoCiclo, EstadoEmpleadoCiclo, Pagina, Paginacion};

const COLUMNAS: &str = "ec.id_empleado_ciclo, ec.id_empleado, ec.id_ciclo, ec.id_kit, ec.id_area, ec.estado, \
     ec.fecha_asignacion, ec.fecha_entrega_real, ec.sueldo_al_momento, ec.observaciones, ec.actualizado_por";

/// Asignación junto con los datos del empleado, el área y el kit.
#[derive(Debug, Clone, Serialize)]
pub struct AsignacionDetalle {
    #[serde(flatten)]
    pub asignacion: EmpleadoCiclo,
    pub identificacion: String,
    pub nombre: String,
    pub apellido: String,
    pub cargo: Option<String>,
    pub nombre_area: Option<String>,
    pub nombre_kit: Option<String>,
}

pub fn obtener_asignacion(conn: &Connection, id_empleado_ciclo: i64) -> SirdsResult<EmpleadoCiclo> {
    let sql = format!("SELECT {} FROM empleado_ciclo ec WHERE ec.id_empleado_ciclo = ?1", COLUMNAS);
    conn.query_row(&sql, [id_empleado_ciclo], EmpleadoCiclo::from_row)
        .optional()?
        .ok_or_else(|| SirdsError::not_found(format!("asignación {} no encontrada", id_empleado_ciclo)))
}

/// Fila del empleado en un ciclo, si existe.
pub fn asignacion_en_ciclo(conn: &Connection, id_empleado: i64, id_ciclo: i64) -> SirdsResult<Option<EmpleadoCiclo>> {
    let sql = format!(
        "SELECT {} FROM empleado_ciclo ec WHERE ec.id_empleado = ?1 AND ec.id_ciclo = ?2",
        COLUMNAS
    );
    Ok(conn.query_row(&sql, [id_empleado, id_ciclo], EmpleadoCiclo::from_row).optional()?)
}

pub fn listar_empleados_ciclo(
    conn: &Connection,
    id_ciclo: i64,
    estado: Option<EstadoEmpleadoCiclo>,
    id_area: Option<i64>,
    pag: &Paginacion,
) -> SirdsResult<Pagina<AsignacionDetalle>> {
    obtener_ciclo(conn, id_ciclo)?;
    let filtro = "ec.id_ciclo = ?1 AND (?2 IS NULL OR ec.estado = ?2) AND (?3 IS NULL OR ec.id_area = ?3)";

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM empleado_ciclo ec WHERE {}", filtro),
        params![id_ciclo, estado, id_area],
        |r| r.get(0),
    )?;

    let sql = format!(
        "SELECT {}, e.identificacion, e.nombre, e.apellido, e.cargo, a.nombre_area, k.nombre AS nombre_kit
         FROM empleado_ciclo ec
         INNER JOIN empleado e ON e.id_empleado = ec.id_empleado
         LEFT JOIN area a ON a.id_area = ec.id_area
         LEFT JOIN kit k ON k.id_kit = ec.id_kit
         WHERE {}
         ORDER BY a.nombre_area, e.apellido, e.nombre
         LIMIT ?4 OFFSET ?5",
        COLUMNAS, filtro
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![id_ciclo, estado, id_area, i64::from(pag.limit), pag.offset() as i64],
        |row| {
            Ok(AsignacionDetalle {
                asignacion: EmpleadoCiclo::from_row(row)?,
                identificacion: row.get("identificacion")?,
                nombre: row.get("nombre")?,
                apellido: row.get("apellido")?,
                cargo: row.get("cargo")?,
                nombre_area: row.get("nombre_area")?,
                nombre_kit: row.get("nombre_kit")?,
            })
        },
    )?;
    let items = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(Pagina::new(items, total as u64, pag))
}

/// Cambia el estado de una asignación. Marcarla `entregado` fija
/// `fecha_entrega_real` (la primera vez); las observaciones se conservan si
/// no llegan nuevas.
pub fn actualizar_estado_asignacion(
    conn: &Connection,
    id_empleado_ciclo: i64,
    destino: EstadoEmpleadoCiclo,
    observaciones: Option<&str>,
    actualizado_por: Option<&str>,
    hoy: NaiveDate,
) -> SirdsResult<EmpleadoCiclo> {
    let actual = obtener_asignacion(conn, id_empleado_ciclo)?;
    actual.estado.validar_transicion(destino)?;

    let fecha_real = if destino == EstadoEmpleadoCiclo::Entregado {
        Some(actual.fecha_entrega_real.unwrap_or(hoy))
    } else {
        actual.fecha_entrega_real
    };
    conn.execute(
        "UPDATE empleado_ciclo
         SET estado = ?1,
             fecha_entrega_real = ?2,
             observaciones = COALESCE(?3, observaciones),
             actualizado_por = COALESCE(?4, actualizado_por),
             fecha_actualizacion = CURRENT_TIMESTAMP
         WHERE id_empleado_ciclo = ?5",
        params![destino, fecha_real, observaciones, actualizado_por, id_empleado_ciclo],
    )?;
    log::info!(
        "asignación {}: {} -> {}",
        id_empleado_ciclo,
        actual.estado,
        destino
    );
    obtener_asignacion(conn, id_empleado_ciclo)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResumenEstado {
    pub estado: EstadoEmpleadoCiclo,
    pub cantidad: usize,
    pub empleados: Vec<String>,
}

/// Empleados agrupados por estado dentro del ciclo.
pub fn resumen_estados(conn: &Connection, id_ciclo: i64) -> SirdsResult<Vec<ResumenEstado>> {
    obtener_ciclo(conn, id_ciclo)?;
    let mut stmt = conn.prepare(
        "SELECT ec.estado, TRIM(e.nombre || ' ' || e.apellido)
         FROM empleado_ciclo ec
         INNER JOIN empleado e ON e.id_empleado = ec.id_empleado
         WHERE ec.id_ciclo = ?1
         ORDER BY ec.estado, e.apellido, e.nombre",
    )?;
    let rows = stmt.query_map([id_ciclo], |r| {
        Ok((r.get::<_, EstadoEmpleadoCiclo>(0)?, r.get::<_, String>(1)?))
    })?;

    let mut out: Vec<ResumenEstado> = Vec::new();
    for r in rows {
        let (estado, nombre) = r?;
        match out.last_mut() {
            Some(g) if g.estado == estado => {
                g.cantidad += 1;
                g.empleados.push(nombre);
            }
            _ => out.push(ResumenEstado { estado, cantidad: 1, empleados: vec![nombre] }),
        }
    }
    Ok(out)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EstadisticasCiclo {
    pub id_ciclo: i64,
    pub total: i64,
    pub procesados: i64,
    pub entregados: i64,
    pub omitidos: i64,
    pub areas: i64,
    pub empleados: i64,
    pub por_estado: Vec<ResumenEstado>,
}

/// Contadores del ciclo junto con los empleados agrupados por estado.
pub fn estadisticas_ciclo(conn: &Connection, id_ciclo: i64) -> SirdsResult<EstadisticasCiclo> {
    let por_estado = resumen_estados(conn, id_ciclo)?;
    Ok(conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(CASE WHEN estado = 'procesado' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN estado = 'entregado' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN estado = 'omitido' THEN 1 ELSE 0 END), 0),
                COUNT(DISTINCT id_area),
                COUNT(DISTINCT id_empleado)
         FROM empleado_ciclo WHERE id_ciclo = ?1",
        [id_ciclo],
        |r| {
            Ok(EstadisticasCiclo {
                id_ciclo,
                total: r.get(0)?,
                procesados: r.get(1)?,
                entregados: r.get(2)?,
                omitidos: r.get(3)?,
                areas: r.get(4)?,
                empleados: r.get(5)?,
                por_estado,
            })
        },
    )?)
}

/// Asigna el kit activo del área a las filas pendientes (`procesado`) que no
/// tienen kit o que apuntan a uno desactivado. Devuelve cuántas cambiaron.
pub fn resincronizar_kits(conn: &Connection, id_ciclo: i64) -> SirdsResult<usize> {
    let ciclo = obtener_ciclo(conn, id_ciclo)?;
    if ciclo.estado == EstadoCiclo::Cerrado {
        return Err(SirdsError::validation(format!(
            "el ciclo '{}' está cerrado; no se pueden cambiar sus kits",
            ciclo.nombre_ciclo
        )));
    }
    let n = conn.execute(
        "UPDATE empleado_ciclo
         SET id_kit = (SELECT k.id_kit FROM kit k WHERE k.id_area = empleado_ciclo.id_area AND k.activo = 1),
             fecha_actualizacion = CURRENT_TIMESTAMP
         WHERE id_ciclo = ?1
           AND estado = 'procesado'
           AND (id_kit IS NULL OR id_kit NOT IN (SELECT id_kit FROM kit WHERE activo = 1))
           AND EXISTS (SELECT 1 FROM kit k WHERE k.id_area = empleado_ciclo.id_area AND k.activo = 1)",
        params![id_ciclo],
    )?;
    log::info!("ciclo {}: {} asignaciones con kit resincronizado", id_ciclo, n);
    Ok(n)
}
