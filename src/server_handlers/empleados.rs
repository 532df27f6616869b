use actix_web::{web, HttpResponse};

use super::Query;
use crate::api_json::{creado, ok, ok_con_mensaje};
use crate::dotaciones::tallas_empleado;
use crate::empleados;
use crate::error::SirdsError;
use crate::models::{CambioEstadoEmpleado, NuevoEmpleado};
use crate::server::AppState;

type Respuesta = Result<HttpResponse, SirdsError>;

pub async fn listar_empleados(state: web::Data<AppState>) -> Respuesta {
    Ok(ok(state.db.run(|c| empleados::listar_empleados(c)).await?))
}

pub async fn crear_empleado(state: web::Data<AppState>, body: web::Json<NuevoEmpleado>) -> Respuesta {
    let nuevo = body.into_inner();
    let empleado = state.db.run(move |c| empleados::crear_empleado(c, &nuevo)).await?;
    Ok(creado(empleado, "Empleado creado"))
}

/// GET /api/empleados/search?q=
pub async fn buscar_empleados(state: web::Data<AppState>, query: Query) -> Respuesta {
    let q = query.into_inner().remove("q").unwrap_or_default();
    let encontrados = state.db.run(move |c| empleados::buscar_empleados(c, &q)).await?;
    Ok(ok(encontrados))
}

/// GET /api/empleados/area/{id_area}
pub async fn empleados_por_area(state: web::Data<AppState>, path: web::Path<i64>) -> Respuesta {
    let id_area = path.into_inner();
    Ok(ok(state.db.run(move |c| empleados::empleados_por_area(c, id_area)).await?))
}

pub async fn obtener_empleado(state: web::Data<AppState>, path: web::Path<i64>) -> Respuesta {
    let id = path.into_inner();
    Ok(ok(state.db.run(move |c| empleados::obtener_empleado(c, id)).await?))
}

pub async fn actualizar_empleado(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<NuevoEmpleado>,
) -> Respuesta {
    let id = path.into_inner();
    let datos = body.into_inner();
    let empleado = state.db.run(move |c| empleados::actualizar_empleado(c, id, &datos)).await?;
    Ok(ok_con_mensaje(empleado, "Empleado actualizado"))
}

/// PATCH /api/empleados/{id}/estado
pub async fn cambiar_estado(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<CambioEstadoEmpleado>,
) -> Respuesta {
    let id = path.into_inner();
    let activo = body.into_inner().activo;
    let empleado = state.db.run(move |c| empleados::cambiar_estado_empleado(c, id, activo)).await?;
    let mensaje = if activo { "Empleado activado" } else { "Empleado desactivado" };
    Ok(ok_con_mensaje(empleado, mensaje))
}

/// GET /api/empleados/{id}/tallas
pub async fn tallas(state: web::Data<AppState>, path: web::Path<i64>) -> Respuesta {
    let id = path.into_inner();
    let tallas = state
        .db
        .run(move |c| {
            empleados::obtener_empleado(c, id)?;
            tallas_empleado(c, id)
        })
        .await?;
    Ok(ok(tallas))
}
