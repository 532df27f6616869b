use chrono::{Datelike, NaiveDate};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::BTreeMap;

use super::smlv::obtener_smlv;
use super::ventana::{validar_ventana, ValidacionVentana};
use crate::error::SirdsResult;
use crate::models::CicloDotacion;

/// Antigüedad mínima, en meses cumplidos a la fecha de entrega.
pub const ANTIGUEDAD_MINIMA_MESES: i64 = 3;
/// El sueldo debe estar entre 1 y este número de salarios mínimos.
pub const MAXIMO_SMLV: f64 = 2.0;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Elegible {
    pub id_empleado: i64,
    pub identificacion: String,
    pub nombre: String,
    pub apellido: String,
    pub cargo: Option<String>,
    pub id_area: i64,
    pub nombre_area: String,
    pub id_kit: i64,
    pub sueldo: f64,
    pub fecha_inicio: Option<NaiveDate>,
    pub antiguedad_meses: Option<i64>,
}

/// Meses completos transcurridos entre dos fechas.
pub fn meses_entre(desde: NaiveDate, hasta: NaiveDate) -> i64 {
    let mut meses = i64::from(hasta.year() - desde.year()) * 12
        + i64::from(hasta.month()) - i64::from(desde.month());
    if hasta.day() < desde.day() {
        meses -= 1;
    }
    meses
}

/// Criterios salariales y de antigüedad. Sin salario mínimo registrado no se
/// aplican; una fecha de ingreso desconocida no descarta al empleado.
pub fn cumple_criterios(sueldo: f64, fecha_inicio: Option<NaiveDate>, smlv: Option<f64>, fecha_entrega: NaiveDate) -> bool {
    let Some(smlv) = smlv else {
        return true;
    };
    if sueldo < smlv || sueldo > smlv * MAXIMO_SMLV {
        return false;
    }
    match fecha_inicio {
        Some(inicio) => meses_entre(inicio, fecha_entrega) >= ANTIGUEDAD_MINIMA_MESES,
        None => true,
    }
}

/// Empleados activos de áreas con kit activo que cumplen los criterios. Con
/// `excluir_ciclo` se omiten los que ya tienen fila en ese ciclo.
pub fn empleados_elegibles(
    conn: &Connection,
    excluir_ciclo: Option<i64>,
    smlv: Option<f64>,
    fecha_entrega: NaiveDate,
) -> SirdsResult<Vec<Elegible>> {
    let mut stmt = conn.prepare(
        "SELECT e.id_empleado, e.identificacion, e.nombre, e.apellido, e.cargo,
                a.id_area, a.nombre_area, k.id_kit, e.sueldo, e.fecha_inicio
         FROM empleado e
         INNER JOIN area a ON a.id_area = e.id_area
         INNER JOIN kit k ON k.id_area = a.id_area AND k.activo = 1
         WHERE e.activo = 1
           AND (?1 IS NULL OR NOT EXISTS (
               SELECT 1 FROM empleado_ciclo ec
               WHERE ec.id_empleado = e.id_empleado AND ec.id_ciclo = ?1))
         ORDER BY a.nombre_area, e.apellido, e.nombre",
    )?;
    let rows = stmt.query_map(params![excluir_ciclo], |row| {
        let fecha_inicio: Option<NaiveDate> = row.get(9)?;
        Ok(Elegible {
            id_empleado: row.get(0)?,
            identificacion: row.get(1)?,
            nombre: row.get(2)?,
            apellido: row.get(3)?,
            cargo: row.get(4)?,
            id_area: row.get(5)?,
            nombre_area: row.get(6)?,
            id_kit: row.get(7)?,
            sueldo: row.get(8)?,
            fecha_inicio,
            antiguedad_meses: fecha_inicio.map(|f| meses_entre(f, fecha_entrega)),
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        let e = r?;
        if cumple_criterios(e.sueldo, e.fecha_inicio, smlv, fecha_entrega) {
            out.push(e);
        }
    }
    Ok(out)
}

/// Inserta en el ciclo a los elegibles que aún no están. Devuelve cuántos
/// se agregaron. Debe llamarse dentro de una transacción.
pub(crate) fn asignar_elegibles(conn: &Connection, ciclo: &CicloDotacion, hoy: NaiveDate) -> SirdsResult<usize> {
    let elegibles = empleados_elegibles(conn, Some(ciclo.id_ciclo), ciclo.valor_smlv_aplicado, ciclo.fecha_entrega)?;
    let mut stmt = conn.prepare(
        "INSERT INTO empleado_ciclo
             (id_empleado, id_ciclo, id_kit, id_area, estado, fecha_asignacion,
              sueldo_al_momento, observaciones)
         VALUES (?1, ?2, ?3, ?4, 'procesado', ?5, ?6, 'Asignación automática por ciclo')",
    )?;
    for e in &elegibles {
        stmt.execute(params![e.id_empleado, ciclo.id_ciclo, e.id_kit, e.id_area, hoy, e.sueldo])?;
    }
    Ok(elegibles.len())
}

#[derive(Debug, Clone, Serialize)]
pub struct ElegiblesArea {
    pub id_area: i64,
    pub nombre_area: String,
    pub total: usize,
    pub empleados: Vec<Elegible>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewElegibles {
    pub fecha_entrega: NaiveDate,
    pub valor_smlv: Option<f64>,
    pub ventana: ValidacionVentana,
    pub total: usize,
    pub por_area: Vec<ElegiblesArea>,
}

/// Quiénes entrarían a un ciclo con esa fecha de entrega, agrupados por área.
/// No escribe nada.
pub fn preview_elegibles(conn: &Connection, fecha_entrega: NaiveDate, hoy: NaiveDate) -> SirdsResult<PreviewElegibles> {
    let valor_smlv = obtener_smlv(conn, fecha_entrega.year())?.map(|s| s.valor_mensual);
    let elegibles = empleados_elegibles(conn, None, valor_smlv, fecha_entrega)?;
    let total = elegibles.len();

    let mut grupos: BTreeMap<(String, i64), Vec<Elegible>> = BTreeMap::new();
    for e in elegibles {
        grupos.entry((e.nombre_area.clone(), e.id_area)).or_default().push(e);
    }
    let por_area = grupos
        .into_iter()
        .map(|((nombre_area, id_area), empleados)| ElegiblesArea {
            id_area,
            nombre_area,
            total: empleados.len(),
            empleados,
        })
        .collect();

    Ok(PreviewElegibles {
        fecha_entrega,
        valor_smlv,
        ventana: validar_ventana(fecha_entrega, hoy),
        total,
        por_area,
    })
}
