use rusqlite::{params, Connection, OptionalExtension};

use crate::dotaciones::obtener_dotacion;
use crate::error::{SirdsError, SirdsResult};
use crate::models::{GuardarTallas, TallaDisponible, TallaEmpleado};

const SELECT_TALLA_EMPLEADO: &str = "
    SELECT et.id_empleado, et.id_dotacion, d.nombre_dotacion, et.id_talla, t.talla,
           et.fecha_actualizacion
    FROM empleado_talla et
    INNER JOIN dotacion d ON d.id_dotacion = et.id_dotacion
    INNER JOIN talla t ON t.id_talla = et.id_talla";

fn talla_empleado_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<TallaEmpleado> {
    Ok(TallaEmpleado {
        id_empleado: r.get(0)?,
        id_dotacion: r.get(1)?,
        nombre_dotacion: r.get(2)?,
        id_talla: r.get(3)?,
        talla: r.get(4)?,
        fecha_actualizacion: r.get(5)?,
    })
}

fn existe_empleado(conn: &Connection, id_empleado: i64) -> SirdsResult<bool> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM empleado WHERE id_empleado = ?1", [id_empleado], |r| r.get(0))?;
    Ok(n > 0)
}

pub fn tallas_empleado(conn: &Connection, id_empleado: i64) -> SirdsResult<Vec<TallaEmpleado>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE et.id_empleado = ?1 ORDER BY d.nombre_dotacion",
        SELECT_TALLA_EMPLEADO
    ))?;
    let rows = stmt.query_map([id_empleado], talla_empleado_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn talla_preferida(conn: &Connection, id_empleado: i64, id_dotacion: i64) -> SirdsResult<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT id_talla FROM empleado_talla WHERE id_empleado = ?1 AND id_dotacion = ?2",
            params![id_empleado, id_dotacion],
            |r| r.get(0),
        )
        .optional()?)
}

/// Guarda (o reemplaza) la talla del empleado para una dotación.
pub fn recordar_talla(conn: &Connection, id_empleado: i64, id_dotacion: i64, id_talla: i64) -> SirdsResult<()> {
    conn.execute(
        "INSERT INTO empleado_talla (id_empleado, id_dotacion, id_talla, fecha_actualizacion)
         VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)
         ON CONFLICT (id_empleado, id_dotacion)
         DO UPDATE SET id_talla = excluded.id_talla, fecha_actualizacion = CURRENT_TIMESTAMP",
        params![id_empleado, id_dotacion, id_talla],
    )?;
    Ok(())
}

/// Guarda el perfil de tallas de un empleado. Todas las tallas se escriben
/// o ninguna.
pub fn guardar_tallas_empleado(conn: &mut Connection, guardar: &GuardarTallas) -> SirdsResult<Vec<TallaEmpleado>> {
    if guardar.tallas.is_empty() {
        return Err(SirdsError::validation("no se recibieron tallas para guardar"));
    }
    let tx = conn.transaction()?;
    if !existe_empleado(&tx, guardar.id_empleado)? {
        return Err(SirdsError::not_found(format!("empleado {} no encontrado", guardar.id_empleado)));
    }
    for t in &guardar.tallas {
        let dotacion = obtener_dotacion(&tx, t.id_dotacion).map_err(|e| match e {
            SirdsError::NotFound(msg) => SirdsError::Validation(msg),
            otro => otro,
        })?;
        if !dotacion.talla_requerida {
            return Err(SirdsError::validation(format!(
                "'{}' no maneja tallas",
                dotacion.nombre_dotacion
            )));
        }
        recordar_talla(&tx, guardar.id_empleado, t.id_dotacion, t.id_talla)?;
    }
    tx.commit()?;
    log::info!("{} tallas guardadas para el empleado {}", guardar.tallas.len(), guardar.id_empleado);
    tallas_empleado(conn, guardar.id_empleado)
}

/// Tallas que se le pueden entregar a un empleado para una dotación: las que
/// tienen existencias o que aún no tienen fila de stock. Vacío si la dotación
/// no maneja tallas.
pub fn tallas_disponibles(conn: &Connection, id_dotacion: i64, id_empleado: i64) -> SirdsResult<Vec<TallaDisponible>> {
    let dotacion = obtener_dotacion(conn, id_dotacion)?;
    if !existe_empleado(conn, id_empleado)? {
        return Err(SirdsError::not_found(format!("empleado {} no encontrado", id_empleado)));
    }
    if !dotacion.talla_requerida {
        return Ok(Vec::new());
    }
    let preferida = talla_preferida(conn, id_empleado, id_dotacion)?;

    let mut stmt = conn.prepare(
        "SELECT id_talla, talla, tipo_articulo, stock FROM (
             SELECT t.id_talla, t.talla, t.tipo_articulo,
                    (SELECT SUM(s.cantidad) FROM stock s
                     WHERE s.id_talla = t.id_talla AND s.id_dotacion = ?1) AS stock
             FROM talla t
         )
         WHERE stock IS NULL OR stock > 0
         ORDER BY talla",
    )?;
    let rows = stmt.query_map([id_dotacion], |r| {
        let id_talla: i64 = r.get(0)?;
        Ok(TallaDisponible {
            id_talla,
            talla: r.get(1)?,
            tipo_articulo: r.get(2)?,
            stock: r.get(3)?,
            preferida: preferida == Some(id_talla),
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
