use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::ciclos::{asignacion_en_ciclo, ciclo_activo};
use crate::dotaciones::{kit_activo_area, listar_tallas, obtener_kit, tallas_empleado};
use crate::entregas::filtros::patron_like;
use crate::entregas::{historial_empleado, EntregaDetalle, ReglasVigencia};
use crate::error::{SirdsError, SirdsResult};
use crate::models::{requerido, Empleado, EmpleadoCiclo, Kit, NuevoEmpleado, Talla, TallaEmpleado};

/// Caracteres mínimos para buscar empleados.
pub const MIN_BUSQUEDA: usize = 2;
const MAX_RESULTADOS_BUSQUEDA: u32 = 20;

const SELECT_EMPLEADO: &str = "
    SELECT e.id_empleado, e.identificacion, e.nombre, e.apellido, e.cargo, e.id_area,
           a.nombre_area, e.sueldo, e.fecha_inicio, e.activo
    FROM empleado e
    LEFT JOIN area a ON a.id_area = e.id_area";

pub fn listar_empleados(conn: &Connection) -> SirdsResult<Vec<Empleado>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY e.apellido, e.nombre", SELECT_EMPLEADO))?;
    let rows = stmt.query_map([], Empleado::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn obtener_empleado(conn: &Connection, id_empleado: i64) -> SirdsResult<Empleado> {
    conn.query_row(&format!("{} WHERE e.id_empleado = ?1", SELECT_EMPLEADO), [id_empleado], Empleado::from_row)
        .optional()?
        .ok_or_else(|| SirdsError::not_found(format!("empleado {} no encontrado", id_empleado)))
}

pub fn buscar_por_identificacion(conn: &Connection, identificacion: &str) -> SirdsResult<Option<Empleado>> {
    Ok(conn
        .query_row(
            &format!("{} WHERE e.identificacion = ?1", SELECT_EMPLEADO),
            [identificacion.trim()],
            Empleado::from_row,
        )
        .optional()?)
}

/// Registra un empleado. La identificación es única: repetirla devuelve un
/// conflicto.
pub fn crear_empleado(conn: &Connection, nuevo: &NuevoEmpleado) -> SirdsResult<Empleado> {
    nuevo.validar()?;
    let identificacion = requerido(&nuevo.identificacion, "identificacion")?;
    conn.execute(
        "INSERT INTO empleado (identificacion, nombre, apellido, cargo, id_area, sueldo, fecha_inicio, activo)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1)",
        params![
            identificacion,
            nuevo.nombre.trim(),
            nuevo.apellido.trim(),
            nuevo.cargo,
            nuevo.id_area,
            nuevo.sueldo,
            nuevo.fecha_inicio
        ],
    )
    .map_err(|e| identificacion_repetida(e, &identificacion))?;
    let id = conn.last_insert_rowid();
    log::info!("empleado {} registrado con identificación {}", id, identificacion);
    obtener_empleado(conn, id)
}

fn identificacion_repetida(e: rusqlite::Error, identificacion: &str) -> SirdsError {
    match SirdsError::from(e) {
        SirdsError::Conflict(_) => {
            SirdsError::conflict(format!("ya existe un empleado con identificación {}", identificacion))
        }
        otro => otro,
    }
}

/// Reemplaza los datos de un empleado. El estado `activo` no cambia aquí.
pub fn actualizar_empleado(conn: &Connection, id_empleado: i64, datos: &NuevoEmpleado) -> SirdsResult<Empleado> {
    datos.validar()?;
    let identificacion = requerido(&datos.identificacion, "identificacion")?;
    let n = conn
        .execute(
            "UPDATE empleado
             SET identificacion = ?1, nombre = ?2, apellido = ?3, cargo = ?4, id_area = ?5,
                 sueldo = ?6, fecha_inicio = ?7
             WHERE id_empleado = ?8",
            params![
                identificacion,
                datos.nombre.trim(),
                datos.apellido.trim(),
                datos.cargo,
                datos.id_area,
                datos.sueldo,
                datos.fecha_inicio,
                id_empleado
            ],
        )
        .map_err(|e| identificacion_repetida(e, &identificacion))?;
    if n == 0 {
        return Err(SirdsError::not_found(format!("empleado {} no encontrado", id_empleado)));
    }
    log::info!("empleado {} actualizado", id_empleado);
    obtener_empleado(conn, id_empleado)
}

pub fn cambiar_estado_empleado(conn: &Connection, id_empleado: i64, activo: bool) -> SirdsResult<Empleado> {
    let n = conn.execute(
        "UPDATE empleado SET activo = ?1 WHERE id_empleado = ?2",
        params![activo, id_empleado],
    )?;
    if n == 0 {
        return Err(SirdsError::not_found(format!("empleado {} no encontrado", id_empleado)));
    }
    log::info!("empleado {} {}", id_empleado, if activo { "activado" } else { "desactivado" });
    obtener_empleado(conn, id_empleado)
}

/// Empleados activos cuyo nombre, apellido o identificación contienen el
/// texto buscado, sin distinguir mayúsculas (también las acentuadas).
pub fn buscar_empleados(conn: &Connection, q: &str) -> SirdsResult<Vec<Empleado>> {
    if q.trim().chars().count() < MIN_BUSQUEDA {
        return Err(SirdsError::validation(format!(
            "la búsqueda debe tener al menos {} caracteres",
            MIN_BUSQUEDA
        )));
    }
    let patron = patron_like(q).unwrap_or_default();
    let mut stmt = conn.prepare(&format!(
        "{} WHERE e.activo = 1
           AND (minusculas(e.nombre) LIKE ?1 ESCAPE '\\'
                OR minusculas(e.apellido) LIKE ?1 ESCAPE '\\'
                OR minusculas(e.identificacion) LIKE ?1 ESCAPE '\\')
         ORDER BY e.apellido, e.nombre
         LIMIT ?2",
        SELECT_EMPLEADO
    ))?;
    let rows = stmt.query_map(params![patron, MAX_RESULTADOS_BUSQUEDA], Empleado::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn empleados_por_area(conn: &Connection, id_area: i64) -> SirdsResult<Vec<Empleado>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE e.id_area = ?1 AND e.activo = 1 ORDER BY e.apellido, e.nombre",
        SELECT_EMPLEADO
    ))?;
    let rows = stmt.query_map([id_area], Empleado::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Todo lo que el formulario de entrega necesita de un empleado.
#[derive(Debug, Clone, Serialize)]
pub struct FichaEmpleado {
    pub empleado: Empleado,
    pub asignacion_ciclo_activo: Option<EmpleadoCiclo>,
    pub kit: Option<Kit>,
    pub tallas_disponibles: Vec<Talla>,
    pub tallas_preferidas: Vec<TallaEmpleado>,
    pub historial_entregas: Vec<EntregaDetalle>,
}

/// Busca un empleado por documento. El kit es el de su asignación en el
/// ciclo activo o, si no tiene, el kit activo de su área.
pub fn ficha_por_documento(
    conn: &Connection,
    documento: &str,
    hoy: NaiveDate,
    reglas: &ReglasVigencia,
) -> SirdsResult<FichaEmpleado> {
    let documento = requerido(documento, "documento")?;
    let empleado = buscar_por_identificacion(conn, &documento)?
        .ok_or_else(|| SirdsError::not_found(format!("no existe un empleado con documento {}", documento)))?;

    let asignacion = match ciclo_activo(conn)? {
        Some(ciclo) => asignacion_en_ciclo(conn, empleado.id_empleado, ciclo.id_ciclo)?,
        None => None,
    };
    let kit = match asignacion.as_ref().and_then(|a| a.id_kit) {
        Some(id_kit) => Some(obtener_kit(conn, id_kit)?),
        None => match empleado.id_area {
            Some(id_area) => kit_activo_area(conn, id_area)?,
            None => None,
        },
    };

    Ok(FichaEmpleado {
        historial_entregas: historial_empleado(conn, empleado.id_empleado, hoy, reglas)?,
        tallas_disponibles: listar_tallas(conn)?,
        tallas_preferidas: tallas_empleado(conn, empleado.id_empleado)?,
        asignacion_ciclo_activo: asignacion,
        kit,
        empleado,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn nuevo(identificacion: &str, nombre: &str) -> NuevoEmpleado {
        NuevoEmpleado {
            identificacion: identificacion.into(),
            nombre: nombre.into(),
            apellido: "Prueba".into(),
            sueldo: 1_500_000.0,
            ..Default::default()
        }
    }

    #[test]
    fn identificacion_repetida_es_conflicto() {
        let c = Connection::open_in_memory().unwrap();
        init_schema(&c).unwrap();
        crear_empleado(&c, &nuevo("123", "Ana")).unwrap();
        let err = crear_empleado(&c, &nuevo("123", "Luis")).unwrap_err();
        assert!(matches!(err, SirdsError::Conflict(_)));
        assert_eq!(listar_empleados(&c).unwrap().len(), 1);
    }

    #[test]
    fn actualizar_respeta_identificacion_unica() {
        let c = Connection::open_in_memory().unwrap();
        init_schema(&c).unwrap();
        let ana = crear_empleado(&c, &nuevo("123", "Ana")).unwrap();
        crear_empleado(&c, &nuevo("456", "Luis")).unwrap();

        let err = actualizar_empleado(&c, ana.id_empleado, &nuevo("456", "Ana")).unwrap_err();
        assert!(matches!(err, SirdsError::Conflict(_)));
        // conservar la propia identificación no es conflicto
        let e = actualizar_empleado(&c, ana.id_empleado, &nuevo("123", "Ana María")).unwrap();
        assert_eq!(e.nombre, "Ana María");
        assert!(matches!(actualizar_empleado(&c, 999, &nuevo("789", "X")), Err(SirdsError::NotFound(_))));
    }

    #[test]
    fn busqueda_corta_o_inactivos() {
        let c = Connection::open_in_memory().unwrap();
        init_schema(&c).unwrap();
        let ana = crear_empleado(&c, &nuevo("123", "ÁNGELA")).unwrap();
        crear_empleado(&c, &nuevo("456", "Ángel")).unwrap();

        assert!(matches!(buscar_empleados(&c, " á "), Err(SirdsError::Validation(_))));
        assert_eq!(buscar_empleados(&c, "ánge").unwrap().len(), 2);
        cambiar_estado_empleado(&c, ana.id_empleado, false).unwrap();
        let r = buscar_empleados(&c, "ánge").unwrap();
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].identificacion, "456");
        assert!(buscar_empleados(&c, "4%").unwrap().is_empty());
        assert!(matches!(cambiar_estado_empleado(&c, 999, true), Err(SirdsError::NotFound(_))));
    }

    #[test]
    fn documento_desconocido() {
        let c = Connection::open_in_memory().unwrap();
        init_schema(&c).unwrap();
        let hoy = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let err = ficha_por_documento(&c, "999", hoy, &ReglasVigencia::default()).unwrap_err();
        assert!(matches!(err, SirdsError::NotFound(_)));
    }
}
