use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{SirdsError, SirdsResult};
use crate::models::{AjusteStock, StockItem};

const SELECT_STOCK: &str = "
    SELECT s.id_stock, s.id_dotacion, d.nombre_dotacion, s.id_talla, t.talla,
           s.id_area, a.nombre_area, s.cantidad
    FROM stock s
    INNER JOIN dotacion d ON d.id_dotacion = s.id_dotacion
    LEFT JOIN talla t ON t.id_talla = s.id_talla
    LEFT JOIN area a ON a.id_area = s.id_area";

fn stock_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<StockItem> {
    Ok(StockItem {
        id_stock: r.get(0)?,
        id_dotacion: r.get(1)?,
        nombre_dotacion: r.get(2)?,
        id_talla: r.get(3)?,
        talla: r.get(4)?,
        id_area: r.get(5)?,
        nombre_area: r.get(6)?,
        cantidad: r.get(7)?,
    })
}

/// Existencias disponibles (cantidad mayor que cero).
pub fn listar_stock(conn: &Connection) -> SirdsResult<Vec<StockItem>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE s.cantidad > 0 ORDER BY d.nombre_dotacion, t.talla, a.nombre_area",
        SELECT_STOCK
    ))?;
    let rows = stmt.query_map([], stock_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn obtener_stock(conn: &Connection, id_stock: i64) -> SirdsResult<StockItem> {
    conn.query_row(&format!("{} WHERE s.id_stock = ?1", SELECT_STOCK), [id_stock], stock_from_row)
        .optional()?
        .ok_or_else(|| SirdsError::not_found(format!("stock {} no encontrado", id_stock)))
}

/// Fila de stock que cubre una entrega de (dotación, talla): primero la del
/// área del empleado, después la que no tiene área.
pub fn stock_para_entrega(
    conn: &Connection,
    id_dotacion: i64,
    id_talla: i64,
    id_area: Option<i64>,
) -> SirdsResult<Option<(i64, i64)>> {
    Ok(conn
        .query_row(
            "SELECT id_stock, cantidad FROM stock
             WHERE id_dotacion = ?1 AND id_talla = ?2
               AND ((?3 IS NOT NULL AND id_area = ?3) OR id_area IS NULL)
             ORDER BY id_area IS NULL
             LIMIT 1",
            params![id_dotacion, id_talla, id_area],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?)
}

/// Descuenta `cantidad` unidades de la fila que cubre la entrega y devuelve
/// lo que queda en ella.
pub fn descontar_stock(
    conn: &Connection,
    id_dotacion: i64,
    id_talla: i64,
    id_area: Option<i64>,
    cantidad: i64,
) -> SirdsResult<i64> {
    let (id_stock, disponible) = stock_para_entrega(conn, id_dotacion, id_talla, id_area)?
        .ok_or_else(|| SirdsError::validation("no hay stock para esta dotación y talla"))?;
    if disponible < cantidad {
        return Err(SirdsError::validation(format!(
            "stock insuficiente: hay {} y se solicitan {}",
            disponible, cantidad
        )));
    }
    conn.execute(
        "UPDATE stock SET cantidad = cantidad - ?1 WHERE id_stock = ?2",
        params![cantidad, id_stock],
    )?;
    Ok(disponible - cantidad)
}

/// Devuelve unidades de una entrega a la fila de la que habrían salido; sin
/// esa fila van a la de bodega general (sin área).
pub fn reponer_stock(
    conn: &Connection,
    id_dotacion: i64,
    id_talla: i64,
    id_area: Option<i64>,
    cantidad: i64,
) -> SirdsResult<()> {
    match stock_para_entrega(conn, id_dotacion, id_talla, id_area)? {
        Some((id_stock, _)) => {
            conn.execute(
                "UPDATE stock SET cantidad = cantidad + ?1 WHERE id_stock = ?2",
                params![cantidad, id_stock],
            )?;
        }
        None => {
            ajustar_stock(
                conn,
                &AjusteStock { id_dotacion, id_talla: Some(id_talla), id_area: None, cantidad },
            )?;
        }
    }
    Ok(())
}

/// Suma (o resta, con cantidad negativa) unidades a la fila de stock de
/// (dotación, talla, área), creándola si no existe. Nunca deja el stock
/// por debajo de cero.
pub fn ajustar_stock(conn: &Connection, ajuste: &AjusteStock) -> SirdsResult<StockItem> {
    if ajuste.cantidad == 0 {
        return Err(SirdsError::validation("la cantidad a ajustar no puede ser 0"));
    }
    let actual: Option<(i64, i64)> = conn
        .query_row(
            "SELECT id_stock, cantidad FROM stock
             WHERE id_dotacion = ?1 AND id_talla IS ?2 AND id_area IS ?3",
            params![ajuste.id_dotacion, ajuste.id_talla, ajuste.id_area],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;

    let existente = actual.map(|(_, c)| c).unwrap_or(0);
    let nueva = existente.checked_add(ajuste.cantidad).ok_or_else(|| {
        SirdsError::validation(format!(
            "el ajuste de {} unidades excede la capacidad del stock (hay {})",
            ajuste.cantidad, existente
        ))
    })?;
    if nueva < 0 {
        return Err(SirdsError::validation(format!(
            "stock insuficiente: hay {} unidades y se intenta descontar {}",
            existente,
            ajuste.cantidad.unsigned_abs()
        )));
    }

    let id_stock = match actual {
        Some((id_stock, _)) => {
            conn.execute("UPDATE stock SET cantidad = ?1 WHERE id_stock = ?2", params![nueva, id_stock])?;
            id_stock
        }
        None => {
            conn.execute(
                "INSERT INTO stock (id_dotacion, id_talla, id_area, cantidad) VALUES (?1, ?2, ?3, ?4)",
                params![ajuste.id_dotacion, ajuste.id_talla, ajuste.id_area, nueva],
            )?;
            conn.last_insert_rowid()
        }
    };
    log::info!(
        "stock {} (dotación {}) ajustado en {} -> {}",
        id_stock,
        ajuste.id_dotacion,
        ajuste.cantidad,
        nueva
    );
    obtener_stock(conn, id_stock)
}

pub fn stock_total(conn: &Connection) -> SirdsResult<i64> {
    Ok(conn.query_row(
        "SELECT COALESCE(SUM(cantidad), 0) FROM stock WHERE cantidad > 0",
        [],
        |r| r.get(0),
    )?)
}
