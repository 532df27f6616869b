use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::ciclos::{asignacion_en_ciclo, ciclo_activo};
use crate::dotaciones::{
    descontar_stock, existe_talla, kit_activo_area, kit_contiene, obtener_dotacion, recordar_talla, talla_preferida,
};
use crate::empleados::buscar_por_identificacion;
use crate::error::{SirdsError, SirdsResult};
use crate::models::{requerido, usuario_o_sistema, EstadoEmpleadoCiclo, NuevaEntrega};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EntregaRegistrada {
    pub id_entrega: i64,
    pub id_empleado: i64,
    pub id_empleado_ciclo: Option<i64>,
    pub id_kit: i64,
    pub id_dotacion: i64,
    pub id_talla: Option<i64>,
    pub cantidad: i64,
    pub fecha_entrega: NaiveDate,
    pub stock_restante: Option<i64>,
}

/// Registra la entrega de una dotación a un empleado.
///
/// Valida cantidad, empleado, dotación, asignación en el ciclo activo, kit,
/// talla y stock; sin talla explícita se usa la que el empleado tiene
/// guardada para la dotación. Luego inserta la entrega, marca la asignación como
/// `entregado` y deja constancia en `historial_movimientos`. Todo ocurre en
/// una transacción: si un paso falla no queda nada escrito.
pub fn registrar_entrega(conn: &mut Connection, nueva: &NuevaEntrega, hoy: NaiveDate) -> SirdsResult<EntregaRegistrada> {
    if nueva.cantidad < 1 {
        return Err(SirdsError::validation("la cantidad debe ser al menos 1"));
    }
    let identificacion = requerido(&nueva.identificacion, "identificacion")?;
    let fecha = nueva.fecha_entrega.unwrap_or(hoy);

    let tx = conn.transaction()?;

    let empleado = buscar_por_identificacion(&tx, &identificacion)?
        .ok_or_else(|| SirdsError::not_found(format!("no existe un empleado con identificación {}", identificacion)))?;
    let dotacion = obtener_dotacion(&tx, nueva.id_dotacion)?;

    let asignacion = match ciclo_activo(&tx)? {
        Some(ciclo) => asignacion_en_ciclo(&tx, empleado.id_empleado, ciclo.id_ciclo)?,
        None => None,
    };
    if let Some(a) = &asignacion {
        if a.estado == EstadoEmpleadoCiclo::Omitido {
            return Err(SirdsError::validation(format!(
                "{} fue omitido en el ciclo activo; no se le pueden registrar entregas",
                empleado.nombre_completo()
            )));
        }
    }

    let id_kit = match asignacion.as_ref().and_then(|a| a.id_kit) {
        Some(id) => Some(id),
        None => match empleado.id_area {
            Some(id_area) => kit_activo_area(&tx, id_area)?.map(|k| k.id_kit),
            None => None,
        },
    };
    let id_kit = id_kit.ok_or_else(|| {
        SirdsError::validation(format!("{} no tiene kit asignado", empleado.nombre_completo()))
    })?;
    if !kit_contiene(&tx, id_kit, dotacion.id_dotacion)? {
        return Err(SirdsError::validation(format!(
            "'{}' no hace parte del kit del empleado",
            dotacion.nombre_dotacion
        )));
    }

    let id_talla = if dotacion.talla_requerida {
        let id_talla = match nueva.id_talla {
            Some(id_talla) => Some(id_talla),
            None => talla_preferida(&tx, empleado.id_empleado, dotacion.id_dotacion)?,
        };
        let id_talla = id_talla.ok_or_else(|| {
            SirdsError::validation(format!("'{}' requiere especificar una talla", dotacion.nombre_dotacion))
        })?;
        if !existe_talla(&tx, id_talla)? {
            return Err(SirdsError::not_found(format!("talla {} no encontrada", id_talla)));
        }
        Some(id_talla)
    } else {
        None
    };

    let stock_restante = match id_talla {
        Some(id_talla) => {
            let restante = descontar_stock(&tx, dotacion.id_dotacion, id_talla, empleado.id_area, nueva.cantidad)?;
            recordar_talla(&tx, empleado.id_empleado, dotacion.id_dotacion, id_talla)?;
            Some(restante)
        }
        None => None,
    };

    tx.execute(
        "INSERT INTO entrega
             (id_empleado, id_empleado_ciclo, id_dotacion, id_talla, cantidad, fecha_entrega, observaciones)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            empleado.id_empleado,
            asignacion.as_ref().map(|a| a.id_empleado_ciclo),
            dotacion.id_dotacion,
            id_talla,
            nueva.cantidad,
            fecha,
            nueva.observaciones
        ],
    )?;
    let id_entrega = tx.last_insert_rowid();

    let usuario = usuario_o_sistema(nueva.usuario.as_deref());

    if let Some(a) = &asignacion {
        a.estado.validar_transicion(EstadoEmpleadoCiclo::Entregado)?;
        tx.execute(
            "UPDATE empleado_ciclo
             SET estado = 'entregado',
                 fecha_entrega_real = COALESCE(fecha_entrega_real, ?1),
                 actualizado_por = ?2,
                 fecha_actualizacion = CURRENT_TIMESTAMP
             WHERE id_empleado_ciclo = ?3",
            params![fecha, usuario, a.id_empleado_ciclo],
        )?;
    }

    tx.execute(
        "INSERT INTO historial_movimientos
             (tabla_modificada, id_registro, tipo_movimiento, usuario_responsable, detalle_cambio)
         VALUES ('entrega', ?1, 'INSERT', ?2, ?3)",
        params![
            id_entrega,
            usuario,
            format!(
                "Entrega registrada: {} - Cantidad: {} - Empleado: {}",
                dotacion.nombre_dotacion,
                nueva.cantidad,
                empleado.nombre_completo()
            )
        ],
    )?;

    tx.commit()?;
    log::info!(
        "entrega {} registrada: {} x{} para {}",
        id_entrega,
        dotacion.nombre_dotacion,
        nueva.cantidad,
        identificacion
    );

    Ok(EntregaRegistrada {
        id_entrega,
        id_empleado: empleado.id_empleado,
        id_empleado_ciclo: asignacion.map(|a| a.id_empleado_ciclo),
        id_kit,
        id_dotacion: dotacion.id_dotacion,
        id_talla,
        cantidad: nueva.cantidad,
        fecha_entrega: fecha,
        stock_restante,
    })
}
