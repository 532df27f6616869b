use std::collections::BTreeMap;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::Serialize;

use super::{cabecera_pedido, detalles_pedido, DetallePedido};
use crate::dotaciones::ajustar_stock;
use crate::error::{SirdsError, SirdsResult};
use crate::models::{usuario_o_sistema, AjusteStock, EstadoPedido, ItemRecepcion, NuevaRecepcion};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecepcionItem {
    pub id_detalle: i64,
    pub id_dotacion: i64,
    pub nombre_dotacion: String,
    pub talla: Option<String>,
    pub cantidad_recibida: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recepcion {
    pub id_recepcion: i64,
    pub id_pedido: i64,
    pub id_proveedor: Option<i64>,
    pub nombre_proveedor: Option<String>,
    pub documento_referencia: Option<String>,
    pub fecha_recepcion: NaiveDate,
    pub observaciones: Option<String>,
    pub usuario_registro: String,
    pub items: Vec<RecepcionItem>,
}

const SELECT_RECEPCION: &str = "
    SELECT r.id_recepcion, r.id_pedido, r.id_proveedor, p.nombre, r.documento_referencia,
           r.fecha_recepcion, r.observaciones, r.usuario_registro
    FROM recepcion_pedido r
    LEFT JOIN proveedor p ON p.id_proveedor = r.id_proveedor";

fn items_recepcion(conn: &Connection, id_recepcion: i64) -> SirdsResult<Vec<RecepcionItem>> {
    let mut stmt = conn.prepare(
        "SELECT dr.id_detalle, dp.id_dotacion, d.nombre_dotacion, t.talla, dr.cantidad_recibida
         FROM detalle_recepcion dr
         INNER JOIN detalle_pedido dp ON dp.id_detalle = dr.id_detalle
         INNER JOIN dotacion d ON d.id_dotacion = dp.id_dotacion
         LEFT JOIN talla t ON t.id_talla = dp.id_talla
         WHERE dr.id_recepcion = ?1
         ORDER BY dr.id_recepcion_detalle",
    )?;
    let rows = stmt.query_map([id_recepcion], |r| {
        Ok(RecepcionItem {
            id_detalle: r.get(0)?,
            id_dotacion: r.get(1)?,
            nombre_dotacion: r.get(2)?,
            talla: r.get(3)?,
            cantidad_recibida: r.get(4)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn cargar_recepciones(conn: &Connection, filtro: &str, id: i64) -> SirdsResult<Vec<Recepcion>> {
    let mut stmt = conn.prepare(&format!("{} WHERE {} = ?1 ORDER BY r.id_recepcion", SELECT_RECEPCION, filtro))?;
    let cabeceras = stmt
        .query_map([id], |r| {
            Ok(Recepcion {
                id_recepcion: r.get(0)?,
                id_pedido: r.get(1)?,
                id_proveedor: r.get(2)?,
                nombre_proveedor: r.get(3)?,
                documento_referencia: r.get(4)?,
                fecha_recepcion: r.get(5)?,
                observaciones: r.get(6)?,
                usuario_registro: r.get(7)?,
                items: Vec::new(),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    cabeceras
        .into_iter()
        .map(|mut rec| -> SirdsResult<Recepcion> {
            rec.items = items_recepcion(conn, rec.id_recepcion)?;
            Ok(rec)
        })
        .collect()
}

/// Recepciones de un pedido, la más antigua primero.
pub fn recepciones_pedido(conn: &Connection, id_pedido: i64) -> SirdsResult<Vec<Recepcion>> {
    cabecera_pedido(conn, id_pedido)?;
    cargar_recepciones(conn, "r.id_pedido", id_pedido)
}

/// Reparte los artículos recibidos entre las líneas del pedido. Un artículo
/// por `id_detalle` va a esa línea; uno por dotación se reparte en orden
/// entre las líneas de esa dotación (y talla, si se indica) que aún tienen
/// pendiente.
fn repartir(items: &[ItemRecepcion], lineas: &[DetallePedido]) -> SirdsResult<Vec<(usize, i64)>> {
    let mut pendiente: Vec<i64> = lineas.iter().map(DetallePedido::pendiente).collect();
    let mut asignado = Vec::new();
    for item in items {
        if item.cantidad < 1 {
            return Err(SirdsError::validation("la cantidad recibida debe ser al menos 1"));
        }
        match (item.id_detalle, item.id_dotacion) {
            (Some(id_detalle), _) => {
                let i = lineas
                    .iter()
                    .position(|l| l.id_detalle == id_detalle)
                    .ok_or_else(|| SirdsError::validation(format!("la línea {} no pertenece al pedido", id_detalle)))?;
                if item.cantidad > pendiente[i] {
                    return Err(SirdsError::validation(format!(
                        "'{}': se reciben {} pero solo quedan {} pendientes",
                        lineas[i].nombre_dotacion, item.cantidad, pendiente[i]
                    )));
                }
                pendiente[i] -= item.cantidad;
                asignado.push((i, item.cantidad));
            }
            (None, Some(id_dotacion)) => {
                let candidatas: Vec<usize> = (0..lineas.len())
                    .filter(|&i| lineas[i].id_dotacion == id_dotacion)
                    .filter(|&i| item.id_talla.is_none() || lineas[i].id_talla == item.id_talla)
                    .collect();
                if candidatas.is_empty() {
                    return Err(SirdsError::validation(format!(
                        "la dotación {} no hace parte del pedido",
                        id_dotacion
                    )));
                }
                let disponible: i64 = candidatas.iter().map(|&i| pendiente[i]).sum();
                if item.cantidad > disponible {
                    return Err(SirdsError::validation(format!(
                        "'{}': se reciben {} pero solo quedan {} pendientes",
                        lineas[candidatas[0]].nombre_dotacion, item.cantidad, disponible
                    )));
                }
                let mut resto = item.cantidad;
                for i in candidatas {
                    let toma = resto.min(pendiente[i]);
                    if toma > 0 {
                        pendiente[i] -= toma;
                        asignado.push((i, toma));
                        resto -= toma;
                    }
                }
            }
            (None, None) => {
                return Err(SirdsError::validation(
                    "cada artículo recibido debe indicar id_detalle o id_dotacion",
                ));
            }
        }
    }
    Ok(asignado)
}

/// Registra la llegada (total o parcial) de un pedido: suma lo recibido a
/// cada línea y a la bodega general, y deja el pedido en
/// `recibido_parcial` o `recibido_completo`.
pub fn registrar_recepcion(
    conn: &mut Connection,
    id_pedido: i64,
    nueva: &NuevaRecepcion,
    hoy: NaiveDate,
) -> SirdsResult<Recepcion> {
    if nueva.items.is_empty() {
        return Err(SirdsError::validation("la recepción no trae artículos"));
    }
    let usuario = usuario_o_sistema(nueva.usuario.as_deref());
    let tx = conn.transaction()?;
    let pedido = cabecera_pedido(&tx, id_pedido)?;
    if !pedido.estado.admite_recepcion() {
        return Err(SirdsError::conflict(format!(
            "el pedido {} ya fue recibido por completo",
            id_pedido
        )));
    }
    let lineas = detalles_pedido(&tx, id_pedido)?;
    let asignado = repartir(&nueva.items, &lineas)?;

    tx.execute(
        "INSERT INTO recepcion_pedido
             (id_pedido, id_proveedor, documento_referencia, fecha_recepcion, observaciones, usuario_registro)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id_pedido,
            nueva.id_proveedor,
            nueva.documento_referencia,
            nueva.fecha_recepcion.unwrap_or(hoy),
            nueva.observaciones,
            usuario
        ],
    )?;
    let id_recepcion = tx.last_insert_rowid();

    let mut por_linea: BTreeMap<usize, i64> = BTreeMap::new();
    for &(i, cantidad) in &asignado {
        *por_linea.entry(i).or_default() += cantidad;
    }
    for (&i, &cantidad) in &por_linea {
        let linea = &lineas[i];
        tx.execute(
            "INSERT INTO detalle_recepcion (id_recepcion, id_detalle, cantidad_recibida) VALUES (?1, ?2, ?3)",
            params![id_recepcion, linea.id_detalle, cantidad],
        )?;
        tx.execute(
            "UPDATE detalle_pedido SET cantidad_recibida = cantidad_recibida + ?1 WHERE id_detalle = ?2",
            params![cantidad, linea.id_detalle],
        )?;
        ajustar_stock(
            &tx,
            &AjusteStock { id_dotacion: linea.id_dotacion, id_talla: linea.id_talla, id_area: None, cantidad },
        )?;
    }

    let pendiente: i64 = tx.query_row(
        "SELECT COALESCE(SUM(cantidad_solicitada - cantidad_recibida), 0) FROM detalle_pedido WHERE id_pedido = ?1",
        [id_pedido],
        |r| r.get(0),
    )?;
    let estado = EstadoPedido::tras_recepcion(pendiente);
    tx.execute("UPDATE pedido SET estado = ?1 WHERE id_pedido = ?2", params![estado, id_pedido])?;

    let unidades: i64 = por_linea.values().sum();
    tx.execute(
        "INSERT INTO historial_movimientos
             (tabla_modificada, id_registro, tipo_movimiento, usuario_responsable, detalle_cambio)
         VALUES ('pedido', ?1, 'RECEPCION', ?2, ?3)",
        params![
            id_pedido,
            usuario,
            format!("Recepción {}: {} unidades; pedido {}", id_recepcion, unidades, estado)
        ],
    )?;
    tx.commit()?;
    log::info!("pedido {}: recepción {} con {} unidades, queda {}", id_pedido, id_recepcion, unidades, estado);

    cargar_recepciones(conn, "r.id_recepcion", id_recepcion)?
        .into_iter()
        .next()
        .ok_or_else(|| SirdsError::Internal(format!("recepción {} no encontrada tras guardarla", id_recepcion)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linea(id_detalle: i64, id_dotacion: i64, id_talla: Option<i64>, solicitada: i64, recibida: i64) -> DetallePedido {
        DetallePedido {
            id_detalle,
            id_dotacion,
            nombre_dotacion: format!("D{}", id_dotacion),
            nombre_categoria: None,
            id_talla,
            talla: None,
            cantidad_requerida: solicitada,
            stock_disponible: 0,
            cantidad_solicitada: solicitada,
            cantidad_recibida: recibida,
            precio_unitario: 0.0,
            subtotal: 0.0,
        }
    }

    fn por_dotacion(id_dotacion: i64, id_talla: Option<i64>, cantidad: i64) -> ItemRecepcion {
        ItemRecepcion { id_detalle: None, id_dotacion: Some(id_dotacion), id_talla, cantidad }
    }

    #[test]
    fn reparte_por_dotacion_en_orden() {
        let lineas = vec![linea(1, 7, Some(1), 3, 2), linea(2, 7, Some(2), 4, 0), linea(3, 8, None, 1, 0)];
        let r = repartir(&[por_dotacion(7, None, 3)], &lineas).unwrap();
        assert_eq!(r, vec![(0, 1), (1, 2)]);

        let r = repartir(&[por_dotacion(7, Some(2), 4)], &lineas).unwrap();
        assert_eq!(r, vec![(1, 4)]);
    }

    #[test]
    fn no_recibe_mas_de_lo_pendiente() {
        let lineas = vec![linea(1, 7, Some(1), 3, 2), linea(2, 7, Some(2), 4, 0)];
        assert!(repartir(&[por_dotacion(7, None, 6)], &lineas).is_err());
        let por_linea = ItemRecepcion { id_detalle: Some(1), cantidad: 1, ..Default::default() };
        // dos artículos sobre la misma línea comparten el pendiente
        assert!(repartir(&[por_linea.clone(), por_linea.clone()], &lineas).is_err());
        assert_eq!(repartir(&[por_linea], &lineas).unwrap(), vec![(0, 1)]);
        assert!(repartir(&[ItemRecepcion { id_detalle: Some(99), cantidad: 1, ..Default::default() }], &lineas).is_err());
        assert!(repartir(&[ItemRecepcion { cantidad: 1, ..Default::default() }], &lineas).is_err());
        assert!(repartir(&[por_dotacion(7, None, 0)], &lineas).is_err());
        assert!(repartir(&[por_dotacion(9, None, 1)], &lineas).is_err());
    }
}
