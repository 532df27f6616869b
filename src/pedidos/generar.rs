use std::collections::BTreeMap;

use chrono::NaiveDate;
use rusqlite::{params, Connection};

use super::{faltantes_en_ciclo, obtener_pedido, PedidoDetallado};
use crate::ciclos::ciclo_activo;
use crate::error::{SirdsError, SirdsResult};
use crate::models::NuevoPedido;

/// Cuántos nombres se muestran en un mensaje antes de resumir el resto.
const MAX_NOMBRES: usize = 10;

fn resumir(nombres: &[String]) -> String {
    if nombres.len() <= MAX_NOMBRES {
        nombres.join(", ")
    } else {
        format!("{} y {} más", nombres[..MAX_NOMBRES].join(", "), nombres.len() - MAX_NOMBRES)
    }
}

/// Necesidad agregada de una (dotación, talla) en el ciclo.
#[derive(Debug, Default)]
struct Necesidad {
    cantidad: i64,
    precio_unitario: f64,
}

/// Genera el pedido del ciclo activo con lo que falta en bodega para
/// entregar los kits de los empleados aún en `procesado`.
///
/// Cada empleado necesita kit y, para las dotaciones que manejan talla, una
/// talla guardada; de lo contrario responde con un conflicto que lista a
/// quién le falta. Las cantidades de los kits se suman por (dotación, talla),
/// se descuenta el stock de todas las áreas y solo se piden las diferencias
/// positivas.
pub fn generar_pedido(conn: &mut Connection, nuevo: &NuevoPedido, hoy: NaiveDate) -> SirdsResult<PedidoDetallado> {
    let tx = conn.transaction()?;
    let ciclo = ciclo_activo(&tx)?.ok_or_else(|| SirdsError::validation("no hay un ciclo activo para generar el pedido"))?;

    let pendientes: Vec<(String, Option<i64>)> = {
        let mut stmt = tx.prepare(
            "SELECT TRIM(e.nombre || ' ' || e.apellido) || ' (' || e.identificacion || ')', ec.id_kit
             FROM empleado_ciclo ec
             INNER JOIN empleado e ON e.id_empleado = ec.id_empleado
             WHERE ec.id_ciclo = ?1 AND ec.estado = 'procesado'
             ORDER BY e.apellido, e.nombre",
        )?;
        let rows = stmt.query_map([ciclo.id_ciclo], |r| Ok((r.get(0)?, r.get(1)?)))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
    };
    if pendientes.is_empty() {
        return Err(SirdsError::validation(format!(
            "el ciclo '{}' no tiene empleados pendientes de entrega",
            ciclo.nombre_ciclo
        )));
    }
    let sin_kit: Vec<String> = pendientes
        .iter()
        .filter(|(_, kit)| kit.is_none())
        .map(|(nombre, _)| nombre.clone())
        .collect();
    if !sin_kit.is_empty() {
        return Err(SirdsError::conflict(format!(
            "{} empleados sin kit asignado: {}",
            sin_kit.len(),
            resumir(&sin_kit)
        )));
    }
    let faltantes = faltantes_en_ciclo(&tx, ciclo.id_ciclo)?;
    if !faltantes.is_empty() {
        let nombres: Vec<String> = faltantes
            .iter()
            .map(|f| format!("{} ({})", f.nombre_completo, f.nombre_dotacion))
            .collect();
        return Err(SirdsError::conflict(format!(
            "faltan {} tallas por registrar: {}",
            faltantes.len(),
            resumir(&nombres)
        )));
    }

    let mut necesidades: BTreeMap<(i64, Option<i64>), Necesidad> = BTreeMap::new();
    {
        let mut stmt = tx.prepare(
            "SELECT kd.id_dotacion,
                    CASE WHEN d.talla_requerida = 1 THEN et.id_talla END,
                    kd.cantidad,
                    d.precio_unitario
             FROM empleado_ciclo ec
             INNER JOIN kit_dotacion kd ON kd.id_kit = ec.id_kit
             INNER JOIN dotacion d ON d.id_dotacion = kd.id_dotacion
             LEFT JOIN empleado_talla et ON et.id_empleado = ec.id_empleado AND et.id_dotacion = kd.id_dotacion
             WHERE ec.id_ciclo = ?1 AND ec.estado = 'procesado'",
        )?;
        let mut rows = stmt.query([ciclo.id_ciclo])?;
        while let Some(r) = rows.next()? {
            let necesidad = necesidades.entry((r.get(0)?, r.get(1)?)).or_default();
            necesidad.cantidad += r.get::<_, i64>(2)?;
            necesidad.precio_unitario = r.get(3)?;
        }
    }

    let mut lineas = Vec::new();
    for ((id_dotacion, id_talla), necesidad) in necesidades {
        let stock: i64 = tx.query_row(
            "SELECT COALESCE(SUM(cantidad), 0) FROM stock WHERE id_dotacion = ?1 AND id_talla IS ?2",
            params![id_dotacion, id_talla],
            |r| r.get(0),
        )?;
        let solicitada = necesidad.cantidad - stock;
        if solicitada > 0 {
            lineas.push((id_dotacion, id_talla, necesidad.cantidad, stock, solicitada, necesidad.precio_unitario));
        }
    }
    if lineas.is_empty() {
        return Err(SirdsError::validation(
            "el stock actual cubre todos los kits pendientes; no hay nada que pedir",
        ));
    }

    let total: f64 = lineas.iter().map(|l| l.4 as f64 * l.5).sum();
    tx.execute(
        "INSERT INTO pedido (id_ciclo, fecha, estado, observaciones, total_pedido)
         VALUES (?1, ?2, 'enviado', ?3, ?4)",
        params![ciclo.id_ciclo, hoy, nuevo.observaciones, total],
    )?;
    let id_pedido = tx.last_insert_rowid();
    for &(id_dotacion, id_talla, requerida, stock, solicitada, precio) in &lineas {
        tx.execute(
            "INSERT INTO detalle_pedido
                 (id_pedido, id_dotacion, id_talla, cantidad_requerida, stock_disponible,
                  cantidad_solicitada, precio_unitario, subtotal)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id_pedido,
                id_dotacion,
                id_talla,
                requerida,
                stock.max(0),
                solicitada,
                precio,
                solicitada as f64 * precio
            ],
        )?;
    }
    tx.commit()?;
    log::info!(
        "pedido {} generado para el ciclo '{}': {} líneas, total {:.2}",
        id_pedido,
        ciclo.nombre_ciclo,
        lineas.len(),
        total
    );
    obtener_pedido(conn, id_pedido)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resumir_corta_listas_largas() {
        let pocos: Vec<String> = vec!["Ana".into(), "Luis".into()];
        assert_eq!(resumir(&pocos), "Ana, Luis");
        let muchos: Vec<String> = (1..=12).map(|i| format!("E{}", i)).collect();
        let texto = resumir(&muchos);
        assert!(texto.starts_with("E1, E2"));
        assert!(texto.ends_with("E10 y 2 más"));
    }
}
