// Catálogo de dotaciones, kits por área y stock.

pub mod catalogos;
pub mod kits;
pub mod stock;
pub mod tallas;

pub use catalogos::*;
pub use kits::*;
pub use stock::*;
pub use tallas::*;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{SirdsError, SirdsResult};
use crate::models::{requerido, Dotacion, NuevaDotacion};

const SELECT_DOTACION: &str = "
    SELECT d.id_dotacion, d.nombre_dotacion, d.descripcion, d.id_categoria,
           c.nombre_categoria, d.id_proveedor, p.nombre AS nombre_proveedor,
           d.precio_unitario, d.talla_requerida, d.unidad_medida
    FROM dotacion d
    LEFT JOIN categoria c ON c.id_categoria = d.id_categoria
    LEFT JOIN proveedor p ON p.id_proveedor = d.id_proveedor";

pub fn listar_dotaciones(conn: &Connection) -> SirdsResult<Vec<Dotacion>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY d.nombre_dotacion", SELECT_DOTACION))?;
    let rows = stmt.query_map([], Dotacion::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn obtener_dotacion(conn: &Connection, id_dotacion: i64) -> SirdsResult<Dotacion> {
    conn.query_row(
        &format!("{} WHERE d.id_dotacion = ?1", SELECT_DOTACION),
        [id_dotacion],
        Dotacion::from_row,
    )
    .optional()?
    .ok_or_else(|| SirdsError::not_found(format!("dotación {} no encontrada", id_dotacion)))
}

pub fn crear_dotacion(conn: &Connection, nueva: &NuevaDotacion) -> SirdsResult<Dotacion> {
    nueva.validar()?;
    conn.execute(
        "INSERT INTO dotacion
             (nombre_dotacion, descripcion, id_categoria, id_proveedor,
              precio_unitario, talla_requerida, unidad_medida)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            requerido(&nueva.nombre_dotacion, "nombre_dotacion")?,
            nueva.descripcion,
            nueva.id_categoria,
            nueva.id_proveedor,
            nueva.precio_unitario,
            nueva.talla_requerida,
            nueva.unidad_medida
        ],
    )?;
    let id = conn.last_insert_rowid();
    log::info!("dotación {} creada", id);
    obtener_dotacion(conn, id)
}

pub fn actualizar_dotacion(conn: &Connection, id_dotacion: i64, datos: &NuevaDotacion) -> SirdsResult<Dotacion> {
    datos.validar()?;
    let n = conn.execute(
        "UPDATE dotacion
         SET nombre_dotacion = ?1, descripcion = ?2, id_categoria = ?3, id_proveedor = ?4,
             precio_unitario = ?5, talla_requerida = ?6, unidad_medida = ?7
         WHERE id_dotacion = ?8",
        params![
            requerido(&datos.nombre_dotacion, "nombre_dotacion")?,
            datos.descripcion,
            datos.id_categoria,
            datos.id_proveedor,
            datos.precio_unitario,
            datos.talla_requerida,
            datos.unidad_medida,
            id_dotacion
        ],
    )?;
    if n == 0 {
        return Err(SirdsError::not_found(format!("dotación {} no encontrada", id_dotacion)));
    }
    obtener_dotacion(conn, id_dotacion)
}

/// Elimina una dotación sin entregas registradas. Su stock y su presencia en
/// kits se eliminan en cascada.
pub fn eliminar_dotacion(conn: &Connection, id_dotacion: i64) -> SirdsResult<()> {
    obtener_dotacion(conn, id_dotacion)?;
    let entregas: i64 = conn.query_row(
        "SELECT COUNT(*) FROM entrega WHERE id_dotacion = ?1",
        [id_dotacion],
        |r| r.get(0),
    )?;
    if entregas > 0 {
        return Err(SirdsError::conflict(format!(
            "la dotación {} tiene {} entregas registradas",
            id_dotacion, entregas
        )));
    }
    conn.execute("DELETE FROM dotacion WHERE id_dotacion = ?1", [id_dotacion])?;
    log::info!("dotación {} eliminada", id_dotacion);
    Ok(())
}
