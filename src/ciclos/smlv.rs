use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{SirdsError, SirdsResult};
use crate::models::{NuevoSalarioMinimo, SalarioMinimo};

const ANIO_MIN: i32 = 2000;
const ANIO_MAX: i32 = 3000;

fn salario_from_row(row: &Row<'_>) -> rusqlite::Result<SalarioMinimo> {
    Ok(SalarioMinimo {
        anio: row.get(0)?,
        valor_mensual: row.get(1)?,
        observaciones: row.get(2)?,
        fecha_actualizacion: row.get(3)?,
    })
}

pub fn listar_smlv(conn: &Connection) -> SirdsResult<Vec<SalarioMinimo>> {
    let mut stmt = conn.prepare(
        "SELECT anio, valor_mensual, observaciones, fecha_actualizacion
         FROM salario_minimo ORDER BY anio DESC",
    )?;
    let rows = stmt.query_map([], salario_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn obtener_smlv(conn: &Connection, anio: i32) -> SirdsResult<Option<SalarioMinimo>> {
    let fila = conn
        .query_row(
            "SELECT anio, valor_mensual, observaciones, fecha_actualizacion
             FROM salario_minimo WHERE anio = ?1",
            [anio],
            salario_from_row,
        )
        .optional()?;
    Ok(fila)
}

/// Crea o reemplaza el salario mínimo de un año.
pub fn guardar_smlv(conn: &Connection, nuevo: &NuevoSalarioMinimo) -> SirdsResult<SalarioMinimo> {
    if !(ANIO_MIN..=ANIO_MAX).contains(&nuevo.anio) {
        return Err(SirdsError::validation(format!(
            "el año debe estar entre {} y {}",
            ANIO_MIN, ANIO_MAX
        )));
    }
    if !nuevo.valor_mensual.is_finite() || nuevo.valor_mensual <= 0.0 {
        return Err(SirdsError::validation("el valor mensual debe ser mayor que 0"));
    }
    conn.execute(
        "INSERT INTO salario_minimo (anio, valor_mensual, observaciones, fecha_actualizacion)
         VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)
         ON CONFLICT(anio) DO UPDATE SET
             valor_mensual = excluded.valor_mensual,
             observaciones = excluded.observaciones,
             fecha_actualizacion = CURRENT_TIMESTAMP",
        params![nuevo.anio, nuevo.valor_mensual, nuevo.observaciones],
    )?;
    log::info!("salario mínimo {} = {}", nuevo.anio, nuevo.valor_mensual);
    obtener_smlv(conn, nuevo.anio)?
        .ok_or_else(|| SirdsError::Internal(format!("salario mínimo {} no quedó guardado", nuevo.anio)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn conn() -> Connection {
        let c = Connection::open_in_memory().unwrap();
        init_schema(&c).unwrap();
        c
    }

    #[test]
    fn guardar_reemplaza_valor_del_anio() {
        let c = conn();
        let a = NuevoSalarioMinimo { anio: 2025, valor_mensual: 1_300_000.0, observaciones: None };
        guardar_smlv(&c, &a).unwrap();
        let b = NuevoSalarioMinimo { anio: 2025, valor_mensual: 1_423_500.0, observaciones: Some("decreto".into()) };
        let guardado = guardar_smlv(&c, &b).unwrap();
        assert_eq!(guardado.valor_mensual, 1_423_500.0);
        assert_eq!(listar_smlv(&c).unwrap().len(), 1);
    }

    #[test]
    fn rechaza_anio_o_valor_invalido() {
        let c = conn();
        let fuera = NuevoSalarioMinimo { anio: 1999, valor_mensual: 1.0, observaciones: None };
        assert!(matches!(guardar_smlv(&c, &fuera), Err(SirdsError::Validation(_))));
        let cero = NuevoSalarioMinimo { anio: 2024, valor_mensual: 0.0, observaciones: None };
        assert!(matches!(guardar_smlv(&c, &cero), Err(SirdsError::Validation(_))));
        assert!(obtener_smlv(&c, 2024).unwrap().is_none());
    }
}
