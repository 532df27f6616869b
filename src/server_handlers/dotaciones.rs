use actix_web::{web, HttpResponse};

use super::{hoy, Query};
use crate::api_json::{creado, ok, ok_con_mensaje, ApiResponse};
use crate::dotaciones;
use crate::empleados::ficha_por_documento;
use crate::entregas::proximas_entregas as proximas;
use crate::entregas::filtros::fecha;
use crate::error::SirdsError;
use crate::models::{AjusteStock, GuardarTallas, NuevaDotacion};
use crate::reportes;
use crate::server::AppState;

type Respuesta = Result<HttpResponse, SirdsError>;

/// GET /api/dotaciones
pub async fn listar_dotaciones(state: web::Data<AppState>) -> Respuesta {
    let filas = state.db.run(|c| dotaciones::listar_dotaciones(c)).await?;
    Ok(ok(filas))
}

/// GET /api/dotaciones/{id}
pub async fn obtener_dotacion(state: web::Data<AppState>, path: web::Path<i64>) -> Respuesta {
    let id = path.into_inner();
    let dotacion = state.db.run(move |c| dotaciones::obtener_dotacion(c, id)).await?;
    Ok(ok(dotacion))
}

/// POST /api/dotaciones
pub async fn crear_dotacion(state: web::Data<AppState>, body: web::Json<NuevaDotacion>) -> Respuesta {
    let nueva = body.into_inner();
    let dotacion = state.db.run(move |c| dotaciones::crear_dotacion(c, &nueva)).await?;
    Ok(creado(dotacion, "Dotación creada exitosamente"))
}

/// PUT /api/dotaciones/{id}
pub async fn actualizar_dotacion(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<NuevaDotacion>,
) -> Respuesta {
    let id = path.into_inner();
    let datos = body.into_inner();
    let dotacion = state.db.run(move |c| dotaciones::actualizar_dotacion(c, id, &datos)).await?;
    Ok(ok_con_mensaje(dotacion, "Dotación actualizada"))
}

/// DELETE /api/dotaciones/{id}
pub async fn eliminar_dotacion(state: web::Data<AppState>, path: web::Path<i64>) -> Respuesta {
    let id = path.into_inner();
    state.db.run(move |c| dotaciones::eliminar_dotacion(c, id)).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::mensaje("Dotación eliminada")))
}

/// GET /api/dotaciones/stock
pub async fn listar_stock(state: web::Data<AppState>) -> Respuesta {
    let filas = state.db.run(|c| dotaciones::listar_stock(c)).await?;
    Ok(ok(filas))
}

/// POST /api/dotaciones/stock
pub async fn ajustar_stock(state: web::Data<AppState>, body: web::Json<AjusteStock>) -> Respuesta {
    let ajuste = body.into_inner();
    let fila = state.db.run(move |c| dotaciones::ajustar_stock(c, &ajuste)).await?;
    Ok(ok_con_mensaje(fila, "Stock actualizado"))
}

/// GET /api/dotaciones/kpis
pub async fn kpis(state: web::Data<AppState>) -> Respuesta {
    let reglas = state.reglas();
    let hoy = hoy();
    let kpis = state.db.run(move |c| reportes::kpis(c, hoy, &reglas)).await?;
    Ok(ok(kpis))
}

/// GET /api/dotaciones/proximas
pub async fn proximas_entregas(state: web::Data<AppState>) -> Respuesta {
    let reglas = state.reglas();
    let hoy = hoy();
    let filas = state.db.run(move |c| proximas(c, hoy, &reglas)).await?;
    Ok(ok(filas))
}

/// GET /api/dotaciones/reportes?fecha_inicio=&fecha_fin=
pub async fn reportes(state: web::Data<AppState>, query: Query) -> Respuesta {
    let q = query.into_inner();
    let desde = fecha(&q, "fecha_inicio")?;
    let hasta = fecha(&q, "fecha_fin")?;
    let datos = state.db.run(move |c| reportes::reportes(c, desde, hasta)).await?;
    Ok(ok(datos))
}

/// GET /api/dotaciones/empleado/{documento}
pub async fn empleado_por_documento(state: web::Data<AppState>, path: web::Path<String>) -> Respuesta {
    let documento = path.into_inner();
    let reglas = state.reglas();
    let hoy = hoy();
    let ficha = state.db.run(move |c| ficha_por_documento(c, &documento, hoy, &reglas)).await?;
    Ok(ok(ficha))
}

/// POST /api/dotaciones/guardar-tallas
pub async fn guardar_tallas(state: web::Data<AppState>, body: web::Json<GuardarTallas>) -> Respuesta {
    let guardar = body.into_inner();
    let tallas = state.db.run(move |c| dotaciones::guardar_tallas_empleado(c, &guardar)).await?;
    Ok(ok_con_mensaje(tallas, "Tallas guardadas"))
}

/// GET /api/dotaciones/tallas/{id_dotacion}/{id_empleado}
pub async fn tallas_disponibles(state: web::Data<AppState>, path: web::Path<(i64, i64)>) -> Respuesta {
    let (id_dotacion, id_empleado) = path.into_inner();
    let tallas = state
        .db
        .run(move |c| dotaciones::tallas_disponibles(c, id_dotacion, id_empleado))
        .await?;
    Ok(ok(tallas))
}
