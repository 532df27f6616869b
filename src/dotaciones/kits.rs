use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{SirdsError, SirdsResult};
use crate::models::{requerido, Kit, KitItem, NuevoKit};

fn items_kit(conn: &Connection, id_kit: i64) -> SirdsResult<Vec<KitItem>> {
    let mut stmt = conn.prepare(
        "SELECT kd.id_dotacion, d.nombre_dotacion, kd.cantidad, d.talla_requerida
         FROM kit_dotacion kd
         INNER JOIN dotacion d ON d.id_dotacion = kd.id_dotacion
         WHERE kd.id_kit = ?1
         ORDER BY d.nombre_dotacion",
    )?;
    let rows = stmt.query_map([id_kit], |r| {
        Ok(KitItem {
            id_dotacion: r.get(0)?,
            nombre_dotacion: r.get(1)?,
            cantidad: r.get(2)?,
            talla_requerida: r.get(3)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn cargar_kit(conn: &Connection, where_sql: &str, id: i64) -> SirdsResult<Option<Kit>> {
    let sql = format!("SELECT id_kit, nombre, id_area, activo FROM kit WHERE {}", where_sql);
    let cabecera = conn
        .query_row(&sql, [id], |r| {
            Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?, r.get::<_, i64>(2)?, r.get::<_, bool>(3)?))
        })
        .optional()?;
    match cabecera {
        Some((id_kit, nombre, id_area, activo)) => Ok(Some(Kit {
            id_kit,
            nombre,
            id_area,
            activo,
            items: items_kit(conn, id_kit)?,
        })),
        None => Ok(None),
    }
}

pub fn obtener_kit(conn: &Connection, id_kit: i64) -> SirdsResult<Kit> {
    cargar_kit(conn, "id_kit = ?1", id_kit)?
        .ok_or_else(|| SirdsError::not_found(format!("kit {} no encontrado", id_kit)))
}

/// Kit activo del área, si tiene uno.
pub fn kit_activo_area(conn: &Connection, id_area: i64) -> SirdsResult<Option<Kit>> {
    cargar_kit(conn, "id_area = ?1 AND activo = 1", id_area)
}

pub fn kit_contiene(conn: &Connection, id_kit: i64, id_dotacion: i64) -> SirdsResult<bool> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM kit_dotacion WHERE id_kit = ?1 AND id_dotacion = ?2",
        [id_kit, id_dotacion],
        |r| r.get(0),
    )?;
    Ok(n > 0)
}

/// Crea el kit activo de un área. Si el área ya tenía uno, queda inactivo.
pub fn crear_kit(conn: &mut Connection, nuevo: &NuevoKit) -> SirdsResult<Kit> {
    nuevo.validar()?;
    let nombre = requerido(&nuevo.nombre, "nombre")?;
    let tx = conn.transaction()?;
    let reemplazados = tx.execute(
        "UPDATE kit SET activo = 0 WHERE id_area = ?1 AND activo = 1",
        [nuevo.id_area],
    )?;
    tx.execute(
        "INSERT INTO kit (nombre, id_area, activo) VALUES (?1, ?2, 1)",
        params![nombre, nuevo.id_area],
    )?;
    let id_kit = tx.last_insert_rowid();
    {
        let mut stmt = tx.prepare("INSERT INTO kit_dotacion (id_kit, id_dotacion, cantidad) VALUES (?1, ?2, ?3)")?;
        for item in &nuevo.items {
            stmt.execute(params![id_kit, item.id_dotacion, item.cantidad])?;
        }
    }
    tx.commit()?;
    if reemplazados > 0 {
        log::info!("kit {} reemplaza al kit activo del área {}", id_kit, nuevo.id_area);
    } else {
        log::info!("kit {} creado para el área {}", id_kit, nuevo.id_area);
    }
    obtener_kit(conn, id_kit)
}
