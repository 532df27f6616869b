use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::Serialize;

use super::filtros::{FiltroEntregas, FiltroKit};
use super::ReglasVigencia;
use crate::ciclos::{ciclo_activo, ventana_activa};
use crate::error::SirdsResult;
use crate::models::{dias_restantes, proxima_entrega, EstadoEmpleadoCiclo, Pagina, Paginacion, Vigencia};

pub const SIN_KIT: &str = "Sin kit asignado";
const HISTORIAL_MAXIMO: usize = 10;

/// Entrega con los datos del empleado, la dotación y su vigencia.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EntregaDetalle {
    pub id_entrega: i64,
    pub fecha_entrega: NaiveDate,
    pub cantidad: i64,
    pub observaciones: Option<String>,
    pub id_empleado: i64,
    pub identificacion: String,
    pub nombre: String,
    pub apellido: String,
    pub cargo: Option<String>,
    pub id_area: Option<i64>,
    pub nombre_area: Option<String>,
    pub id_dotacion: i64,
    pub nombre_dotacion: String,
    pub nombre_categoria: Option<String>,
    pub talla: Option<String>,
    pub id_ciclo: Option<i64>,
    pub nombre_kit: Option<String>,
    pub proxima_entrega: NaiveDate,
    pub dias_restantes: i64,
    pub vigencia: Vigencia,
}

impl EntregaDetalle {
    pub fn nombre_completo(&self) -> String {
        format!("{} {}", self.nombre, self.apellido).trim().to_string()
    }
}

#[derive(Debug, Default)]
struct Criterios {
    patron: Option<String>,
    id_area: Option<i64>,
    kit: FiltroKit,
    desde: Option<NaiveDate>,
    hasta: Option<NaiveDate>,
    id_empleado: Option<i64>,
}

fn consultar(conn: &Connection, c: &Criterios, hoy: NaiveDate, reglas: &ReglasVigencia) -> SirdsResult<Vec<EntregaDetalle>> {
    let mut stmt = conn.prepare(
        "SELECT en.id_entrega, en.fecha_entrega, en.cantidad, en.observaciones,
                e.id_empleado, e.identificacion, e.nombre, e.apellido, e.cargo,
                COALESCE(ec.id_area, e.id_area) AS id_area, a.nombre_area,
                d.id_dotacion, d.nombre_dotacion, c.nombre_categoria, t.talla,
                ec.id_ciclo, COALESCE(kec.nombre, ka.nombre) AS nombre_kit
         FROM entrega en
         INNER JOIN empleado e ON e.id_empleado = en.id_empleado
         INNER JOIN dotacion d ON d.id_dotacion = en.id_dotacion
         LEFT JOIN categoria c ON c.id_categoria = d.id_categoria
         LEFT JOIN talla t ON t.id_talla = en.id_talla
         LEFT JOIN empleado_ciclo ec ON ec.id_empleado_ciclo = en.id_empleado_ciclo
         LEFT JOIN area a ON a.id_area = COALESCE(ec.id_area, e.id_area)
         LEFT JOIN kit kec ON kec.id_kit = ec.id_kit
         LEFT JOIN kit ka ON ka.id_area = COALESCE(ec.id_area, e.id_area) AND ka.activo = 1
         WHERE (?1 IS NULL OR minusculas(e.nombre) LIKE ?1 ESCAPE '\\'
                OR minusculas(e.apellido) LIKE ?1 ESCAPE '\\'
                OR minusculas(e.identificacion) LIKE ?1 ESCAPE '\\'
                OR minusculas(COALESCE(e.cargo, '')) LIKE ?1 ESCAPE '\\')
           AND (?2 IS NULL OR COALESCE(ec.id_area, e.id_area) = ?2)
           AND (?3 = 'todos' OR (?3 = 'con') = (COALESCE(kec.id_kit, ka.id_kit) IS NOT NULL))
           AND (?4 IS NULL OR en.fecha_entrega >= ?4)
           AND (?5 IS NULL OR en.fecha_entrega <= ?5)
           AND (?6 IS NULL OR en.id_empleado = ?6)
         ORDER BY en.fecha_entrega DESC, en.id_entrega DESC",
    )?;
    let rows = stmt.query_map(
        params![c.patron, c.id_area, c.kit.as_str(), c.desde, c.hasta, c.id_empleado],
        |row| {
            let fecha: NaiveDate = row.get("fecha_entrega")?;
            Ok(EntregaDetalle {
                id_entrega: row.get("id_entrega")?,
                fecha_entrega: fecha,
                cantidad: row.get("cantidad")?,
                observaciones: row.get("observaciones")?,
                id_empleado: row.get("id_empleado")?,
                identificacion: row.get("identificacion")?,
                nombre: row.get("nombre")?,
                apellido: row.get("apellido")?,
                cargo: row.get("cargo")?,
                id_area: row.get("id_area")?,
                nombre_area: row.get("nombre_area")?,
                id_dotacion: row.get("id_dotacion")?,
                nombre_dotacion: row.get("nombre_dotacion")?,
                nombre_categoria: row.get("nombre_categoria")?,
                talla: row.get("talla")?,
                id_ciclo: row.get("id_ciclo")?,
                nombre_kit: row.get("nombre_kit")?,
                proxima_entrega: proxima_entrega(fecha, reglas.meses),
                dias_restantes: dias_restantes(fecha, hoy, reglas.meses),
                vigencia: Vigencia::calcular(fecha, hoy, reglas.meses, reglas.dias_alerta),
            })
        },
    )?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Entregas que cumplen el filtro, sin paginar. La vigencia se calcula con
/// la fecha `hoy` y se filtra después de la consulta.
pub fn filtrar_entregas(
    conn: &Connection,
    filtro: &FiltroEntregas,
    hoy: NaiveDate,
    reglas: &ReglasVigencia,
) -> SirdsResult<Vec<EntregaDetalle>> {
    let vigencia = filtro.estado.as_deref().map(str::parse::<Vigencia>).transpose()?;
    let ventana = if filtro.solo_ciclo_activo { ventana_activa(conn)? } else { None };
    let (desde, hasta) = filtro.rango(ventana);
    let criterios = Criterios {
        patron: filtro.patron_busqueda(),
        id_area: filtro.id_area,
        kit: filtro.kit,
        desde,
        hasta,
        id_empleado: None,
    };
    let mut filas = consultar(conn, &criterios, hoy, reglas)?;
    if let Some(v) = vigencia {
        filas.retain(|f| f.vigencia == v);
    }
    Ok(filas)
}

pub fn listar_entregas(
    conn: &Connection,
    filtro: &FiltroEntregas,
    pag: &Paginacion,
    hoy: NaiveDate,
    reglas: &ReglasVigencia,
) -> SirdsResult<Pagina<EntregaDetalle>> {
    Ok(pag.aplicar(filtrar_entregas(conn, filtro, hoy, reglas)?))
}

/// Entregas cuya renovación cae dentro de la ventana de alerta y aún no
/// vence, las más urgentes primero.
pub fn proximas_entregas(conn: &Connection, hoy: NaiveDate, reglas: &ReglasVigencia) -> SirdsResult<Vec<EntregaDetalle>> {
    let mut filas = consultar(conn, &Criterios::default(), hoy, reglas)?;
    filas.retain(|f| f.vigencia == Vigencia::Proxima);
    filas.sort_by_key(|f| (f.dias_restantes, f.id_entrega));
    Ok(filas)
}

/// Últimas entregas de un empleado.
pub fn historial_empleado(
    conn: &Connection,
    id_empleado: i64,
    hoy: NaiveDate,
    reglas: &ReglasVigencia,
) -> SirdsResult<Vec<EntregaDetalle>> {
    let criterios = Criterios { id_empleado: Some(id_empleado), ..Default::default() };
    let mut filas = consultar(conn, &criterios, hoy, reglas)?;
    filas.truncate(HISTORIAL_MAXIMO);
    Ok(filas)
}

/// Asignación del ciclo activo tal como la muestra el listado de entregas
/// del ciclo.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EntregaCicloActivo {
    pub id_empleado_ciclo: i64,
    pub id_ciclo: i64,
    pub nombre_ciclo: String,
    pub id_empleado: i64,
    pub identificacion: String,
    pub nombre_completo: String,
    pub cargo: Option<String>,
    pub id_area: i64,
    pub nombre_area: Option<String>,
    pub estado: EstadoEmpleadoCiclo,
    pub fecha_asignacion: NaiveDate,
    pub fecha_entrega_real: Option<NaiveDate>,
    pub observaciones: Option<String>,
    pub id_kit: Option<i64>,
    pub nombre_kit: String,
    pub articulos_entregados: i64,
}

/// Asignaciones del ciclo activo. Sin ciclo activo la página viene vacía.
/// `fecha_inicio`/`fecha_fin` se aplican a la fecha real de entrega.
pub fn listar_entregas_ciclo_activo(
    conn: &Connection,
    filtro: &FiltroEntregas,
    pag: &Paginacion,
) -> SirdsResult<Pagina<EntregaCicloActivo>> {
    let Some(ciclo) = ciclo_activo(conn)? else {
        return Ok(Pagina::new(Vec::new(), 0, pag));
    };
    let estado = filtro.estado.as_deref().map(str::parse::<EstadoEmpleadoCiclo>).transpose()?;
    let patron = filtro.patron_busqueda();

    let condiciones = "ec.id_ciclo = ?1
        AND (?2 IS NULL OR minusculas(e.nombre) LIKE ?2 ESCAPE '\\'
             OR minusculas(e.apellido) LIKE ?2 ESCAPE '\\'
             OR minusculas(e.identificacion) LIKE ?2 ESCAPE '\\'
             OR minusculas(COALESCE(e.cargo, '')) LIKE ?2 ESCAPE '\\')
        AND (?3 IS NULL OR ec.estado = ?3)
        AND (?4 IS NULL OR ec.id_area = ?4)
        AND (?5 = 'todos' OR (?5 = 'con') = (ec.id_kit IS NOT NULL))
        AND (?6 IS NULL OR ec.fecha_entrega_real >= ?6)
        AND (?7 IS NULL OR ec.fecha_entrega_real <= ?7)";

    let total: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM empleado_ciclo ec
             INNER JOIN empleado e ON e.id_empleado = ec.id_empleado
             WHERE {}",
            condiciones
        ),
        params![
            ciclo.id_ciclo,
            patron,
            estado,
            filtro.id_area,
            filtro.kit.as_str(),
            filtro.fecha_inicio,
            filtro.fecha_fin
        ],
        |r| r.get(0),
    )?;

    let sql = format!(
        "SELECT ec.id_empleado_ciclo, ec.id_ciclo, e.id_empleado, e.identificacion,
                TRIM(e.nombre || ' ' || e.apellido) AS nombre_completo, e.cargo,
                ec.id_area, a.nombre_area, ec.estado, ec.fecha_asignacion,
                ec.fecha_entrega_real, ec.observaciones, ec.id_kit,
                COALESCE(k.nombre, '{}') AS nombre_kit,
                (SELECT COUNT(*) FROM entrega en WHERE en.id_empleado_ciclo = ec.id_empleado_ciclo) AS articulos
         FROM empleado_ciclo ec
         INNER JOIN empleado e ON e.id_empleado = ec.id_empleado
         LEFT JOIN area a ON a.id_area = ec.id_area
         LEFT JOIN kit k ON k.id_kit = ec.id_kit
         WHERE {}
         ORDER BY a.nombre_area, e.apellido, e.nombre
         LIMIT ?8 OFFSET ?9",
        SIN_KIT, condiciones
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![
            ciclo.id_ciclo,
            patron,
            estado,
            filtro.id_area,
            filtro.kit.as_str(),
            filtro.fecha_inicio,
            filtro.fecha_fin,
            i64::from(pag.limit),
            pag.offset() as i64
        ],
        |row| {
            Ok(EntregaCicloActivo {
                id_empleado_ciclo: row.get("id_empleado_ciclo")?,
                id_ciclo: row.get("id_ciclo")?,
                nombre_ciclo: ciclo.nombre_ciclo.clone(),
                id_empleado: row.get("id_empleado")?,
                identificacion: row.get("identificacion")?,
                nombre_completo: row.get("nombre_completo")?,
                cargo: row.get("cargo")?,
                id_area: row.get("id_area")?,
                nombre_area: row.get("nombre_area")?,
                estado: row.get("estado")?,
                fecha_asignacion: row.get("fecha_asignacion")?,
                fecha_entrega_real: row.get("fecha_entrega_real")?,
                observaciones: row.get("observaciones")?,
                id_kit: row.get("id_kit")?,
                nombre_kit: row.get("nombre_kit")?,
                articulos_entregados: row.get("articulos")?,
            })
        },
    )?;
    let items = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(Pagina::new(items, total as u64, pag))
}
