use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::ciclos::ventana_activa;
use crate::dotaciones::stock_total;
use crate::entregas::{proximas_entregas, ReglasVigencia};
use crate::error::SirdsResult;

const MESES_REPORTE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrigenRango {
    Explicito,
    CicloActivo,
    Historico,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RangoReporte {
    pub fecha_inicio: Option<NaiveDate>,
    pub fecha_fin: Option<NaiveDate>,
    pub origen: OrigenRango,
}

/// Rango de los reportes: el pedido explícitamente, si no la ventana del
/// ciclo activo, si no todo el historial.
pub fn resolver_rango(
    conn: &Connection,
    fecha_inicio: Option<NaiveDate>,
    fecha_fin: Option<NaiveDate>,
) -> SirdsResult<RangoReporte> {
    if fecha_inicio.is_some() || fecha_fin.is_some() {
        return Ok(RangoReporte { fecha_inicio, fecha_fin, origen: OrigenRango::Explicito });
    }
    Ok(match ventana_activa(conn)? {
        Some(v) => RangoReporte {
            fecha_inicio: Some(v.inicio),
            fecha_fin: Some(v.fin),
            origen: OrigenRango::CicloActivo,
        },
        None => RangoReporte { fecha_inicio: None, fecha_fin: None, origen: OrigenRango::Historico },
    })
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Agregado {
    pub clave: String,
    pub total_entregas: i64,
    pub total_cantidad: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reportes {
    pub rango: RangoReporte,
    pub entregas_por_mes: Vec<Agregado>,
    pub entregas_por_categoria: Vec<Agregado>,
    pub entregas_por_area: Vec<Agregado>,
}

fn agrupar(conn: &Connection, clave_sql: &str, joins: &str, orden: &str, rango: &RangoReporte) -> SirdsResult<Vec<Agregado>> {
    let sql = format!(
        "SELECT {clave} AS clave, COUNT(en.id_entrega), COALESCE(SUM(en.cantidad), 0)
         FROM entrega en
         {joins}
         WHERE (?1 IS NULL OR en.fecha_entrega >= ?1)
           AND (?2 IS NULL OR en.fecha_entrega <= ?2)
         GROUP BY clave
         ORDER BY {orden}",
        clave = clave_sql,
        joins = joins,
        orden = orden
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![rango.fecha_inicio, rango.fecha_fin], |r| {
        Ok(Agregado { clave: r.get(0)?, total_entregas: r.get(1)?, total_cantidad: r.get(2)? })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Entregas agrupadas por mes (últimos 12 con datos), por categoría y por
/// área del empleado.
pub fn reportes(conn: &Connection, fecha_inicio: Option<NaiveDate>, fecha_fin: Option<NaiveDate>) -> SirdsResult<Reportes> {
    let rango = resolver_rango(conn, fecha_inicio, fecha_fin)?;
    let mut por_mes = agrupar(conn, "strftime('%Y-%m', en.fecha_entrega)", "", "clave DESC", &rango)?;
    por_mes.truncate(MESES_REPORTE);

    let por_categoria = agrupar(
        conn,
        "COALESCE(c.nombre_categoria, 'Sin categoría')",
        "INNER JOIN dotacion d ON d.id_dotacion = en.id_dotacion
         LEFT JOIN categoria c ON c.id_categoria = d.id_categoria",
        "COUNT(en.id_entrega) DESC, clave",
        &rango,
    )?;
    let por_area = agrupar(
        conn,
        "COALESCE(a.nombre_area, 'Sin área')",
        "INNER JOIN empleado e ON e.id_empleado = en.id_empleado
         LEFT JOIN area a ON a.id_area = e.id_area",
        "COUNT(en.id_entrega) DESC, clave",
        &rango,
    )?;

    Ok(Reportes {
        rango,
        entregas_por_mes: por_mes,
        entregas_por_categoria: por_categoria,
        entregas_por_area: por_area,
    })
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Kpis {
    pub total_dotaciones: i64,
    pub total_entregas: i64,
    pub proximas_entregas: i64,
    pub stock_total: i64,
}

/// Indicadores del tablero principal.
pub fn kpis(conn: &Connection, hoy: NaiveDate, reglas: &ReglasVigencia) -> SirdsResult<Kpis> {
    let (total_dotaciones, total_entregas): (i64, i64) = conn.query_row(
        "SELECT (SELECT COUNT(*) FROM dotacion), (SELECT COUNT(*) FROM entrega)",
        [],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;
    Ok(Kpis {
        total_dotaciones,
        total_entregas,
        proximas_entregas: proximas_entregas(conn, hoy, reglas)?.len() as i64,
        stock_total: stock_total(conn)?,
    })
}
