use chrono::{Datelike, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use super::elegibilidad::asignar_elegibles;
use super::smlv::obtener_smlv;
use super::ventana::{ventana_para_entrega, Ventana};
use crate::error::{SirdsError, SirdsResult};
use crate::models::{requerido, CicloDotacion, EstadoCiclo, NuevoCiclo, Pagina, Paginacion};

/// Ciclo con sus contadores por estado y la posición de `hoy` frente a la
/// ventana.
#[derive(Debug, Clone, Serialize)]
pub struct CicloResumen {
    #[serde(flatten)]
    pub ciclo: CicloDotacion,
    pub estado_ventana: &'static str,
    pub dias_ventana: i64,
    pub total_empleados: i64,
    pub procesados: i64,
    pub entregados: i64,
    pub omitidos: i64,
}

pub fn estado_ventana(ventana: &Ventana, hoy: NaiveDate) -> &'static str {
    if hoy < ventana.inicio {
        "fuera_ventana"
    } else if ventana.contiene(hoy) {
        "en_ventana"
    } else {
        "ventana_cerrada"
    }
}

pub fn obtener_ciclo(conn: &Connection, id_ciclo: i64) -> SirdsResult<CicloDotacion> {
    let sql = format!("SELECT {} FROM ciclo_dotacion c WHERE c.id_ciclo = ?1", CicloDotacion::COLUMNAS);
    conn.query_row(&sql, [id_ciclo], CicloDotacion::from_row)
        .optional()?
        .ok_or_else(|| SirdsError::not_found(format!("ciclo {} no encontrado", id_ciclo)))
}

/// El ciclo en estado `activo`, si lo hay. El índice parcial del esquema
/// impide que haya más de uno.
pub fn ciclo_activo(conn: &Connection) -> SirdsResult<Option<CicloDotacion>> {
    let sql = format!("SELECT {} FROM ciclo_dotacion c WHERE c.estado = 'activo' LIMIT 1", CicloDotacion::COLUMNAS);
    Ok(conn.query_row(&sql, [], CicloDotacion::from_row).optional()?)
}

/// Crea un ciclo en estado `pendiente`. La ventana se toma de la petición o
/// se deriva de la fecha de entrega; el salario mínimo del año queda fijado
/// en el ciclo si está registrado.
pub fn crear_ciclo(conn: &Connection, nuevo: &NuevoCiclo) -> SirdsResult<CicloDotacion> {
    let nombre = requerido(&nuevo.nombre_ciclo, "nombre_ciclo")?;
    let defecto = ventana_para_entrega(nuevo.fecha_entrega);
    let inicio = nuevo.fecha_inicio_ventana.unwrap_or(defecto.inicio);
    let fin = nuevo.fecha_fin_ventana.unwrap_or(defecto.fin);
    if inicio > fin {
        return Err(SirdsError::validation(
            "fecha_inicio_ventana no puede ser posterior a fecha_fin_ventana",
        ));
    }
    let smlv = obtener_smlv(conn, nuevo.fecha_entrega.year())?.map(|s| s.valor_mensual);
    if smlv.is_none() {
        log::warn!(
            "no hay salario mínimo para {}; el ciclo '{}' no aplicará criterio salarial",
            nuevo.fecha_entrega.year(),
            nombre
        );
    }

    conn.execute(
        "INSERT INTO ciclo_dotacion
             (nombre_ciclo, fecha_entrega, fecha_inicio_ventana, fecha_fin_ventana,
              estado, valor_smlv_aplicado, observaciones)
         VALUES (?1, ?2, ?3, ?4, 'pendiente', ?5, ?6)",
        params![nombre, nuevo.fecha_entrega, inicio, fin, smlv, nuevo.observaciones],
    )?;
    let id = conn.last_insert_rowid();
    log::info!("ciclo {} '{}' creado ({} a {})", id, nombre, inicio, fin);
    obtener_ciclo(conn, id)
}

/// Lista ciclos, más recientes primero, con contadores por estado.
pub fn listar_ciclos(
    conn: &Connection,
    estado: Option<EstadoCiclo>,
    anio: Option<i32>,
    pag: &Paginacion,
    hoy: NaiveDate,
) -> SirdsResult<Pagina<CicloResumen>> {
    let anio = anio.map(|a| format!("{:04}", a));
    let filtro = "(?1 IS NULL OR c.estado = ?1) AND (?2 IS NULL OR strftime('%Y', c.fecha_entrega) = ?2)";

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM ciclo_dotacion c WHERE {}", filtro),
        params![estado, anio],
        |r| r.get(0),
    )?;

    let sql = format!(
        "SELECT {},
            (SELECT COUNT(*) FROM empleado_ciclo ec WHERE ec.id_ciclo = c.id_ciclo) AS total_empleados,
            (SELECT COUNT(*) FROM empleado_ciclo ec WHERE ec.id_ciclo = c.id_ciclo AND ec.estado = 'procesado') AS procesados,
            (SELECT COUNT(*) FROM empleado_ciclo ec WHERE ec.id_ciclo = c.id_ciclo AND ec.estado = 'entregado') AS entregados,
            (SELECT COUNT(*) FROM empleado_ciclo ec WHERE ec.id_ciclo = c.id_ciclo AND ec.estado = 'omitido') AS omitidos
         FROM ciclo_dotacion c
         WHERE {}
         ORDER BY c.fecha_entrega DESC, c.id_ciclo DESC
         LIMIT ?3 OFFSET ?4",
        CicloDotacion::COLUMNAS,
        filtro
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![estado, anio, i64::from(pag.limit), pag.offset() as i64], |row| {
        let ciclo = CicloDotacion::from_row(row)?;
        let ventana = Ventana::new(ciclo.fecha_inicio_ventana, ciclo.fecha_fin_ventana);
        Ok(CicloResumen {
            estado_ventana: estado_ventana(&ventana, hoy),
            dias_ventana: (ventana.fin - ventana.inicio).num_days(),
            total_empleados: row.get("total_empleados")?,
            procesados: row.get("procesados")?,
            entregados: row.get("entregados")?,
            omitidos: row.get("omitidos")?,
            ciclo,
        })
    })?;
    let items = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(Pagina::new(items, total as u64, pag))
}

fn contar_asignados(conn: &Connection, id_ciclo: i64) -> SirdsResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM empleado_ciclo WHERE id_ciclo = ?1",
        [id_ciclo],
        |r| r.get(0),
    )?)
}

/// Cambia el estado de un ciclo. Al activarlo asigna a los empleados
/// elegibles; todo ocurre en una sola transacción.
pub fn actualizar_estado_ciclo(
    conn: &mut Connection,
    id_ciclo: i64,
    destino: EstadoCiclo,
    hoy: NaiveDate,
) -> SirdsResult<CicloDotacion> {
    let tx = conn.transaction()?;
    let ciclo = obtener_ciclo(&tx, id_ciclo)?;
    ciclo.estado.validar_transicion(destino)?;

    if destino == EstadoCiclo::Activo {
        if let Some(otro) = ciclo_activo(&tx)? {
            return Err(SirdsError::conflict(format!(
                "ya existe un ciclo activo ({}); ciérrelo antes de activar otro",
                otro.nombre_ciclo
            )));
        }
    }

    tx.execute(
        "UPDATE ciclo_dotacion SET estado = ?1 WHERE id_ciclo = ?2",
        params![destino, id_ciclo],
    )?;

    if destino == EstadoCiclo::Activo {
        let nuevos = asignar_elegibles(&tx, &ciclo, hoy)?;
        let total = contar_asignados(&tx, id_ciclo)?;
        tx.execute(
            "UPDATE ciclo_dotacion SET total_empleados_elegibles = ?1 WHERE id_ciclo = ?2",
            params![total, id_ciclo],
        )?;
        log::info!("ciclo {} activado, {} empleados asignados", id_ciclo, nuevos);
    } else {
        log::info!("ciclo {} pasa a {}", id_ciclo, destino);
    }

    tx.commit()?;
    obtener_ciclo(conn, id_ciclo)
}

/// Agrega al ciclo los elegibles que falten (por ejemplo, empleados
/// contratados después de activarlo).
pub fn sincronizar_elegibles(conn: &mut Connection, id_ciclo: i64, hoy: NaiveDate) -> SirdsResult<usize> {
    let tx = conn.transaction()?;
    let ciclo = obtener_ciclo(&tx, id_ciclo)?;
    if ciclo.estado == EstadoCiclo::Cerrado {
        return Err(SirdsError::validation("no se puede sincronizar un ciclo cerrado"));
    }
    let nuevos = asignar_elegibles(&tx, &ciclo, hoy)?;
    let total = contar_asignados(&tx, id_ciclo)?;
    tx.execute(
        "UPDATE ciclo_dotacion SET total_empleados_elegibles = ?1 WHERE id_ciclo = ?2",
        params![total, id_ciclo],
    )?;
    tx.commit()?;
    log::info!("ciclo {}: {} empleados agregados al sincronizar", id_ciclo, nuevos);
    Ok(nuevos)
}

/// Elimina un ciclo y sus asignaciones. Sin `force` solo procede si ninguna
/// asignación fue entregada u omitida. Las entregas registradas se conservan.
pub fn eliminar_ciclo(conn: &mut Connection, id_ciclo: i64, force: bool) -> SirdsResult<()> {
    let tx = conn.transaction()?;
    obtener_ciclo(&tx, id_ciclo)?;
    if !force {
        let gestionados: i64 = tx.query_row(
            "SELECT COUNT(*) FROM empleado_ciclo
             WHERE id_ciclo = ?1 AND estado IN ('entregado', 'omitido')",
            [id_ciclo],
            |r| r.get(0),
        )?;
        if gestionados > 0 {
            return Err(SirdsError::conflict(format!(
                "el ciclo tiene {} asignaciones gestionadas; use force=true para eliminarlo",
                gestionados
            )));
        }
    }
    tx.execute("DELETE FROM ciclo_dotacion WHERE id_ciclo = ?1", [id_ciclo])?;
    tx.commit()?;
    log::info!("ciclo {} eliminado (force={})", id_ciclo, force);
    Ok(())
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EstadisticasCiclos {
    pub total_ciclos: i64,
    pub activos: i64,
    pub cerrados: i64,
    pub pendientes: i64,
    pub total_empleados_asignados: i64,
    pub total_entregas_realizadas: i64,
}

pub fn estadisticas_ciclos(conn: &Connection) -> SirdsResult<EstadisticasCiclos> {
    Ok(conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(CASE WHEN estado = 'activo' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN estado = 'cerrado' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN estado = 'pendiente' THEN 1 ELSE 0 END), 0),
                (SELECT COUNT(*) FROM empleado_ciclo),
                (SELECT COUNT(*) FROM empleado_ciclo WHERE estado = 'entregado')
         FROM ciclo_dotacion",
        [],
        |r| {
            Ok(EstadisticasCiclos {
                total_ciclos: r.get(0)?,
                activos: r.get(1)?,
                cerrados: r.get(2)?,
                pendientes: r.get(3)?,
                total_empleados_asignados: r.get(4)?,
                total_entregas_realizadas: r.get(5)?,
            })
        },
    )?)
}
