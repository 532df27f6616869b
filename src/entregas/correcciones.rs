use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::Serialize;

use crate::dotaciones::{descontar_stock, existe_talla, recordar_talla, reponer_stock};
use crate::error::{SirdsError, SirdsResult};
use crate::models::{usuario_o_sistema, CambioEntrega};

/// Fila de `entrega` con los datos que hacen falta para mover stock.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Entrega {
    pub id_entrega: i64,
    pub id_empleado: i64,
    pub id_dotacion: i64,
    pub id_talla: Option<i64>,
    pub cantidad: i64,
    pub fecha_entrega: NaiveDate,
    pub observaciones: Option<String>,
    #[serde(skip)]
    id_area: Option<i64>,
    #[serde(skip)]
    nombre_dotacion: String,
    #[serde(skip)]
    talla_requerida: bool,
}

pub fn obtener_entrega(conn: &Connection, id_entrega: i64) -> SirdsResult<Entrega> {
    conn.query_row(
        "SELECT en.id_entrega, en.id_empleado, en.id_dotacion, en.id_talla, en.cantidad,
                en.fecha_entrega, en.observaciones, e.id_area, d.nombre_dotacion, d.talla_requerida
         FROM entrega en
         INNER JOIN empleado e ON e.id_empleado = en.id_empleado
         INNER JOIN dotacion d ON d.id_dotacion = en.id_dotacion
         WHERE en.id_entrega = ?1",
        [id_entrega],
        |r| {
            Ok(Entrega {
                id_entrega: r.get(0)?,
                id_empleado: r.get(1)?,
                id_dotacion: r.get(2)?,
                id_talla: r.get(3)?,
                cantidad: r.get(4)?,
                fecha_entrega: r.get(5)?,
                observaciones: r.get(6)?,
                id_area: r.get(7)?,
                nombre_dotacion: r.get(8)?,
                talla_requerida: r.get(9)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| SirdsError::not_found(format!("entrega {} no encontrada", id_entrega)))
}

fn devolver_unidades(tx: &Transaction<'_>, entrega: &Entrega) -> SirdsResult<()> {
    if let Some(id_talla) = entrega.id_talla {
        reponer_stock(tx, entrega.id_dotacion, id_talla, entrega.id_area, entrega.cantidad)?;
    }
    Ok(())
}

fn anotar(tx: &Transaction<'_>, id_entrega: i64, tipo: &str, usuario: &str, detalle: String) -> SirdsResult<()> {
    tx.execute(
        "INSERT INTO historial_movimientos
             (tabla_modificada, id_registro, tipo_movimiento, usuario_responsable, detalle_cambio)
         VALUES ('entrega', ?1, ?2, ?3, ?4)",
        params![id_entrega, tipo, usuario, detalle],
    )?;
    Ok(())
}

/// Corrige cantidad, talla, fecha u observaciones de una entrega. Las
/// unidades anteriores vuelven al stock y las nuevas se descuentan con las
/// mismas reglas del registro; si no alcanzan no cambia nada.
pub fn actualizar_entrega(conn: &mut Connection, id_entrega: i64, cambio: &CambioEntrega) -> SirdsResult<Entrega> {
    if cambio.cantidad.is_some_and(|c| c < 1) {
        return Err(SirdsError::validation("la cantidad debe ser al menos 1"));
    }
    let tx = conn.transaction()?;
    let anterior = obtener_entrega(&tx, id_entrega)?;

    let id_talla = match cambio.id_talla {
        Some(_) if !anterior.talla_requerida => {
            return Err(SirdsError::validation(format!("'{}' no maneja tallas", anterior.nombre_dotacion)));
        }
        Some(id_talla) => {
            if !existe_talla(&tx, id_talla)? {
                return Err(SirdsError::not_found(format!("talla {} no encontrada", id_talla)));
            }
            Some(id_talla)
        }
        None => anterior.id_talla,
    };
    let cantidad = cambio.cantidad.unwrap_or(anterior.cantidad);
    let fecha = cambio.fecha_entrega.unwrap_or(anterior.fecha_entrega);
    let observaciones = cambio.observaciones.clone().or_else(|| anterior.observaciones.clone());

    devolver_unidades(&tx, &anterior)?;
    if let Some(id_talla) = id_talla {
        descontar_stock(&tx, anterior.id_dotacion, id_talla, anterior.id_area, cantidad)?;
        recordar_talla(&tx, anterior.id_empleado, anterior.id_dotacion, id_talla)?;
    }

    tx.execute(
        "UPDATE entrega SET id_talla = ?1, cantidad = ?2, fecha_entrega = ?3, observaciones = ?4
         WHERE id_entrega = ?5",
        params![id_talla, cantidad, fecha, observaciones, id_entrega],
    )?;
    anotar(
        &tx,
        id_entrega,
        "UPDATE",
        usuario_o_sistema(cambio.usuario.as_deref()),
        format!(
            "Entrega corregida: {} - Cantidad: {} -> {}",
            anterior.nombre_dotacion, anterior.cantidad, cantidad
        ),
    )?;
    let actualizada = obtener_entrega(&tx, id_entrega)?;
    tx.commit()?;
    log::info!("entrega {} corregida", id_entrega);
    Ok(actualizada)
}

/// Elimina una entrega devolviendo sus unidades al stock. La asignación del
/// ciclo conserva su estado.
pub fn eliminar_entrega(conn: &mut Connection, id_entrega: i64, usuario: Option<&str>) -> SirdsResult<()> {
    let tx = conn.transaction()?;
    let entrega = obtener_entrega(&tx, id_entrega)?;
    devolver_unidades(&tx, &entrega)?;
    tx.execute("DELETE FROM entrega WHERE id_entrega = ?1", [id_entrega])?;
    anotar(
        &tx,
        id_entrega,
        "DELETE",
        usuario_o_sistema(usuario),
        format!("Entrega eliminada: {} - Cantidad: {}", entrega.nombre_dotacion, entrega.cantidad),
    )?;
    tx.commit()?;
    log::info!("entrega {} eliminada; {} unidades devueltas", id_entrega, entrega.cantidad);
    Ok(())
}
