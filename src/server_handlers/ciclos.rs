use actix_web::{web, HttpResponse};

use super::{hoy, paginacion, Query};
use crate::api_json::{creado, ok, ok_con_mensaje, ApiResponse};
use crate::ciclos;
use crate::entregas::filtros::{bandera, fecha, numero};
use crate::error::SirdsError;
use crate::models::{
    CambioEstadoAsignacion, CambioEstadoCiclo, EstadoCiclo, EstadoEmpleadoCiclo, NuevoCiclo, NuevoSalarioMinimo,
};
use crate::server::AppState;

type Respuesta = Result<HttpResponse, SirdsError>;

/// GET /api/ciclos?estado=&anio=&page=&limit=
pub async fn listar_ciclos(state: web::Data<AppState>, query: Query) -> Respuesta {
    let q = query.into_inner();
    let estado = q
        .get("estado")
        .map(|e| e.trim())
        .filter(|e| !e.is_empty() && !e.eq_ignore_ascii_case("todos"))
        .map(str::parse::<EstadoCiclo>)
        .transpose()?;
    let anio = numero::<i32>(&q, "anio")?;
    let pag = paginacion(&state, &q)?;
    let hoy = hoy();
    let pagina = state
        .db
        .run(move |c| ciclos::listar_ciclos(c, estado, anio, &pag, hoy))
        .await?;
    Ok(ok(pagina))
}

/// GET /api/ciclos/activo
///
/// Sin ciclo activo responde `data: null`.
pub async fn ciclo_activo(state: web::Data<AppState>) -> Respuesta {
    let ciclo = state.db.run(|c| ciclos::ciclo_activo(c)).await?;
    Ok(match ciclo {
        Some(ciclo) => ok(ciclo),
        None => HttpResponse::Ok().json(ApiResponse::<()>::mensaje("No hay un ciclo activo")),
    })
}

/// GET /api/ciclos/estadisticas
pub async fn estadisticas(state: web::Data<AppState>) -> Respuesta {
    let datos = state.db.run(|c| ciclos::estadisticas_ciclos(c)).await?;
    Ok(ok(datos))
}

fn fecha_entrega_requerida(q: &std::collections::HashMap<String, String>) -> Result<chrono::NaiveDate, SirdsError> {
    fecha(q, "fecha_entrega")?.ok_or_else(|| SirdsError::validation("fecha_entrega es requerida"))
}

/// GET /api/ciclos/preview-elegibles?fecha_entrega=AAAA-MM-DD
pub async fn preview_elegibles(state: web::Data<AppState>, query: Query) -> Respuesta {
    let fecha_entrega = fecha_entrega_requerida(&query)?;
    let hoy = hoy();
    let preview = state
        .db
        .run(move |c| ciclos::preview_elegibles(c, fecha_entrega, hoy))
        .await?;
    Ok(ok(preview))
}

/// GET /api/ciclos/validar-ventana?fecha_entrega=AAAA-MM-DD
pub async fn validar_ventana(query: Query) -> Respuesta {
    let fecha_entrega = fecha_entrega_requerida(&query)?;
    Ok(ok(ciclos::validar_ventana(fecha_entrega, hoy())))
}

/// GET /api/ciclos/smlv
pub async fn listar_smlv(state: web::Data<AppState>) -> Respuesta {
    let filas = state.db.run(|c| ciclos::listar_smlv(c)).await?;
    Ok(ok(filas))
}

/// POST /api/ciclos/smlv
pub async fn guardar_smlv(state: web::Data<AppState>, body: web::Json<NuevoSalarioMinimo>) -> Respuesta {
    let nuevo = body.into_inner();
    let fila = state.db.run(move |c| ciclos::guardar_smlv(c, &nuevo)).await?;
    Ok(ok_con_mensaje(fila, "Salario mínimo guardado"))
}

/// POST /api/ciclos
pub async fn crear_ciclo(state: web::Data<AppState>, body: web::Json<NuevoCiclo>) -> Respuesta {
    let nuevo = body.into_inner();
    let ciclo = state.db.run(move |c| ciclos::crear_ciclo(c, &nuevo)).await?;
    Ok(creado(ciclo, "Ciclo creado en estado pendiente"))
}

/// GET /api/ciclos/{id}
pub async fn obtener_ciclo(state: web::Data<AppState>, path: web::Path<i64>) -> Respuesta {
    let id = path.into_inner();
    let ciclo = state.db.run(move |c| ciclos::obtener_ciclo(c, id)).await?;
    Ok(ok(ciclo))
}

/// PUT /api/ciclos/{id}/estado
pub async fn actualizar_estado(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<CambioEstadoCiclo>,
) -> Respuesta {
    let id = path.into_inner();
    let destino: EstadoCiclo = body.estado.parse()?;
    let hoy = hoy();
    let ciclo = state
        .db
        .run(move |c| ciclos::actualizar_estado_ciclo(c, id, destino, hoy))
        .await?;
    let mensaje = format!("Ciclo {} pasó a {}", ciclo.id_ciclo, ciclo.estado);
    Ok(ok_con_mensaje(ciclo, mensaje))
}

/// POST /api/ciclos/{id}/sync-elegibles
pub async fn sincronizar_elegibles(state: web::Data<AppState>, path: web::Path<i64>) -> Respuesta {
    let id = path.into_inner();
    let hoy = hoy();
    let agregados = state
        .db
        .run(move |c| ciclos::sincronizar_elegibles(c, id, hoy))
        .await?;
    Ok(ok_con_mensaje(
        serde_json::json!({ "agregados": agregados }),
        format!("{} empleados agregados al ciclo", agregados),
    ))
}

/// DELETE /api/ciclos/{id}?force=true
pub async fn eliminar_ciclo(state: web::Data<AppState>, path: web::Path<i64>, query: Query) -> Respuesta {
    let id = path.into_inner();
    let force = bandera(&query, "force");
    state.db.run(move |c| ciclos::eliminar_ciclo(c, id, force)).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::mensaje("Ciclo eliminado")))
}

/// GET /api/ciclos/{id}/empleados?estado=&id_area=&page=&limit=
pub async fn empleados_ciclo(state: web::Data<AppState>, path: web::Path<i64>, query: Query) -> Respuesta {
    let id = path.into_inner();
    let q = query.into_inner();
    let estado = q
        .get("estado")
        .map(|e| e.trim())
        .filter(|e| !e.is_empty() && !e.eq_ignore_ascii_case("todos"))
        .map(str::parse::<EstadoEmpleadoCiclo>)
        .transpose()?;
    let id_area = numero::<i64>(&q, "id_area")?;
    let pag = paginacion(&state, &q)?;
    let pagina = state
        .db
        .run(move |c| ciclos::listar_empleados_ciclo(c, id, estado, id_area, &pag))
        .await?;
    Ok(ok(pagina))
}

/// PUT /api/ciclos/empleados/{id_empleado_ciclo}
/// PUT /api/entregas-ciclo/{id}/estado
pub async fn actualizar_asignacion(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<CambioEstadoAsignacion>,
) -> Respuesta {
    let id = path.into_inner();
    let cambio = body.into_inner();
    let destino: EstadoEmpleadoCiclo = cambio.estado.parse()?;
    let hoy = hoy();
    let asignacion = state
        .db
        .run(move |c| {
            ciclos::actualizar_estado_asignacion(
                c,
                id,
                destino,
                cambio.observaciones.as_deref(),
                cambio.actualizado_por.as_deref(),
                hoy,
            )
        })
        .await?;
    Ok(ok_con_mensaje(asignacion, "Estado de la asignación actualizado"))
}
