// Pedidos a proveedor: lo que falta para cubrir los kits del ciclo activo,
// recepciones parciales y tallas pendientes de registrar.

pub mod generar;
pub mod recepcion;

pub use generar::generar_pedido;
pub use recepcion::{recepciones_pedido, registrar_recepcion, Recepcion, RecepcionItem};

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::ciclos::ciclo_activo;
use crate::error::{SirdsError, SirdsResult};
use crate::models::EstadoPedido;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Pedido {
    pub id_pedido: i64,
    pub id_ciclo: Option<i64>,
    pub nombre_ciclo: Option<String>,
    pub fecha: NaiveDate,
    pub estado: EstadoPedido,
    pub observaciones: Option<String>,
    pub total_pedido: f64,
    pub total_lineas: i64,
    pub articulos_solicitados: i64,
}

const SELECT_PEDIDO: &str = "
    SELECT p.id_pedido, p.id_ciclo, c.nombre_ciclo, p.fecha, p.estado, p.observaciones, p.total_pedido,
           (SELECT COUNT(*) FROM detalle_pedido dp WHERE dp.id_pedido = p.id_pedido),
           (SELECT COALESCE(SUM(dp.cantidad_solicitada), 0) FROM detalle_pedido dp WHERE dp.id_pedido = p.id_pedido)
    FROM pedido p
    LEFT JOIN ciclo_dotacion c ON c.id_ciclo = p.id_ciclo";

impl Pedido {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Pedido {
            id_pedido: r.get(0)?,
            id_ciclo: r.get(1)?,
            nombre_ciclo: r.get(2)?,
            fecha: r.get(3)?,
            estado: r.get(4)?,
            observaciones: r.get(5)?,
            total_pedido: r.get(6)?,
            total_lineas: r.get(7)?,
            articulos_solicitados: r.get(8)?,
        })
    }
}

/// Línea de un pedido: una dotación (y talla, si la maneja).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DetallePedido {
    pub id_detalle: i64,
    pub id_dotacion: i64,
    pub nombre_dotacion: String,
    pub nombre_categoria: Option<String>,
    pub id_talla: Option<i64>,
    pub talla: Option<String>,
    pub cantidad_requerida: i64,
    pub stock_disponible: i64,
    pub cantidad_solicitada: i64,
    pub cantidad_recibida: i64,
    pub precio_unitario: f64,
    pub subtotal: f64,
}

impl DetallePedido {
    pub fn pendiente(&self) -> i64 {
        self.cantidad_solicitada - self.cantidad_recibida
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PedidoDetallado {
    #[serde(flatten)]
    pub pedido: Pedido,
    pub detalles: Vec<DetallePedido>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EstadisticasPedidos {
    pub total: i64,
    pub enviados: i64,
    pub recibidos_parcial: i64,
    pub recibidos_completos: i64,
    pub monto_total: f64,
    pub articulos_solicitados: i64,
    pub ultimo_pedido: Option<NaiveDate>,
}

/// Empleado del ciclo activo al que le falta registrar la talla de una
/// dotación de su kit.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FaltanteTalla {
    pub id_empleado: i64,
    pub identificacion: String,
    pub nombre_completo: String,
    pub nombre_area: Option<String>,
    pub id_dotacion: i64,
    pub nombre_dotacion: String,
}

pub fn listar_pedidos(conn: &Connection) -> SirdsResult<Vec<Pedido>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY p.fecha DESC, p.id_pedido DESC", SELECT_PEDIDO))?;
    let rows = stmt.query_map([], Pedido::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub(crate) fn cabecera_pedido(conn: &Connection, id_pedido: i64) -> SirdsResult<Pedido> {
    conn.query_row(&format!("{} WHERE p.id_pedido = ?1", SELECT_PEDIDO), [id_pedido], Pedido::from_row)
        .optional()?
        .ok_or_else(|| SirdsError::not_found(format!("pedido {} no encontrado", id_pedido)))
}

pub(crate) fn detalles_pedido(conn: &Connection, id_pedido: i64) -> SirdsResult<Vec<DetallePedido>> {
    let mut stmt = conn.prepare(
        "SELECT dp.id_detalle, dp.id_dotacion, d.nombre_dotacion, c.nombre_categoria, dp.id_talla, t.talla,
                dp.cantidad_requerida, dp.stock_disponible, dp.cantidad_solicitada, dp.cantidad_recibida,
                dp.precio_unitario, dp.subtotal
         FROM detalle_pedido dp
         INNER JOIN dotacion d ON d.id_dotacion = dp.id_dotacion
         LEFT JOIN categoria c ON c.id_categoria = d.id_categoria
         LEFT JOIN talla t ON t.id_talla = dp.id_talla
         WHERE dp.id_pedido = ?1
         ORDER BY dp.id_detalle",
    )?;
    let rows = stmt.query_map([id_pedido], |r| {
        Ok(DetallePedido {
            id_detalle: r.get(0)?,
            id_dotacion: r.get(1)?,
            nombre_dotacion: r.get(2)?,
            nombre_categoria: r.get(3)?,
            id_talla: r.get(4)?,
            talla: r.get(5)?,
            cantidad_requerida: r.get(6)?,
            stock_disponible: r.get(7)?,
            cantidad_solicitada: r.get(8)?,
            cantidad_recibida: r.get(9)?,
            precio_unitario: r.get(10)?,
            subtotal: r.get(11)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn obtener_pedido(conn: &Connection, id_pedido: i64) -> SirdsResult<PedidoDetallado> {
    let pedido = cabecera_pedido(conn, id_pedido)?;
    Ok(PedidoDetallado { detalles: detalles_pedido(conn, id_pedido)?, pedido })
}

pub fn estadisticas_pedidos(conn: &Connection) -> SirdsResult<EstadisticasPedidos> {
    let articulos_solicitados: i64 =
        conn.query_row("SELECT COALESCE(SUM(cantidad_solicitada), 0) FROM detalle_pedido", [], |r| r.get(0))?;
    Ok(conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(CASE WHEN estado = 'enviado' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN estado = 'recibido_parcial' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN estado = 'recibido_completo' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(total_pedido), 0),
                MAX(fecha)
         FROM pedido",
        [],
        |r| {
            Ok(EstadisticasPedidos {
                total: r.get(0)?,
                enviados: r.get(1)?,
                recibidos_parcial: r.get(2)?,
                recibidos_completos: r.get(3)?,
                monto_total: r.get(4)?,
                articulos_solicitados,
                ultimo_pedido: r.get(5)?,
            })
        },
    )?)
}

pub(crate) fn faltantes_en_ciclo(conn: &Connection, id_ciclo: i64) -> SirdsResult<Vec<FaltanteTalla>> {
    let mut stmt = conn.prepare(
        "SELECT e.id_empleado, e.identificacion, e.nombre, e.apellido, a.nombre_area,
                d.id_dotacion, d.nombre_dotacion
         FROM empleado_ciclo ec
         INNER JOIN empleado e ON e.id_empleado = ec.id_empleado
         LEFT JOIN area a ON a.id_area = ec.id_area
         INNER JOIN kit_dotacion kd ON kd.id_kit = ec.id_kit
         INNER JOIN dotacion d ON d.id_dotacion = kd.id_dotacion
         LEFT JOIN empleado_talla et ON et.id_empleado = ec.id_empleado AND et.id_dotacion = kd.id_dotacion
         WHERE ec.id_ciclo = ?1
           AND ec.estado = 'procesado'
           AND d.talla_requerida = 1
           AND et.id_talla IS NULL
         ORDER BY e.apellido, e.nombre, d.nombre_dotacion",
    )?;
    let rows = stmt.query_map([id_ciclo], |r| {
        let nombre: String = r.get(2)?;
        let apellido: String = r.get(3)?;
        Ok(FaltanteTalla {
            id_empleado: r.get(0)?,
            identificacion: r.get(1)?,
            nombre_completo: format!("{} {}", nombre, apellido).trim().to_string(),
            nombre_area: r.get(4)?,
            id_dotacion: r.get(5)?,
            nombre_dotacion: r.get(6)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Tallas pendientes de los empleados por entregar en el ciclo activo. Sin
/// ciclo activo no hay nada pendiente.
pub fn faltantes_tallas(conn: &Connection) -> SirdsResult<Vec<FaltanteTalla>> {
    match ciclo_activo(conn)? {
        Some(ciclo) => faltantes_en_ciclo(conn, ciclo.id_ciclo),
        None => Ok(Vec::new()),
    }
}
