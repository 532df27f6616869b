use actix_web::{web, HttpResponse};

use super::{adjunto, hoy, paginacion, Query};
use crate::api_json::{creado, ok, ok_con_mensaje, ApiResponse};
use crate::ciclos::{estadisticas_ciclo as estadisticas, resincronizar_kits as resincronizar};
use crate::entregas::{self, FiltroEntregas};
use crate::error::SirdsError;
use crate::exportar::{exportar, FormatoExportacion};
use crate::models::{CambioEntrega, NuevaEntrega};
use crate::server::AppState;

type Respuesta = Result<HttpResponse, SirdsError>;

/// GET /api/dotaciones/entregas
pub async fn listar_entregas(state: web::Data<AppState>, query: Query) -> Respuesta {
    let q = query.into_inner();
    let filtro = FiltroEntregas::desde_query(&q)?;
    let pag = paginacion(&state, &q)?;
    let reglas = state.reglas();
    let hoy = hoy();
    let pagina = state
        .db
        .run(move |c| entregas::listar_entregas(c, &filtro, &pag, hoy, &reglas))
        .await?;
    Ok(ok(pagina))
}

/// GET /api/dotaciones/entregas/exportar?formato=xlsx|csv
///
/// Mismos filtros que el listado, sin paginación.
pub async fn exportar_entregas(state: web::Data<AppState>, query: Query) -> Respuesta {
    let q = query.into_inner();
    let filtro = FiltroEntregas::desde_query(&q)?;
    let formato = match q.get("formato").map(|f| f.trim()).filter(|f| !f.is_empty()) {
        Some(f) => f.parse::<FormatoExportacion>()?,
        None => FormatoExportacion::default(),
    };
    let reglas = state.reglas();
    let hoy = hoy();
    let archivo = state
        .db
        .run(move |c| {
            let filas = entregas::filtrar_entregas(c, &filtro, hoy, &reglas)?;
            exportar(&filas, formato, hoy)
        })
        .await?;
    Ok(adjunto(archivo))
}

/// POST /api/dotaciones/entregar
pub async fn registrar_entrega(state: web::Data<AppState>, body: web::Json<NuevaEntrega>) -> Respuesta {
    let nueva = body.into_inner();
    let hoy = hoy();
    let registrada = state.db.run(move |c| entregas::registrar_entrega(c, &nueva, hoy)).await?;
    Ok(creado(registrada, "Entrega registrada exitosamente"))
}

/// PUT /api/dotaciones/entregas/{id}
pub async fn actualizar_entrega(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<CambioEntrega>,
) -> Respuesta {
    let id = path.into_inner();
    let cambio = body.into_inner();
    let entrega = state.db.run(move |c| entregas::actualizar_entrega(c, id, &cambio)).await?;
    Ok(ok_con_mensaje(entrega, "Entrega actualizada"))
}

/// DELETE /api/dotaciones/entregas/{id}?usuario=
pub async fn eliminar_entrega(state: web::Data<AppState>, path: web::Path<i64>, query: Query) -> Respuesta {
    let id = path.into_inner();
    let usuario = query.into_inner().remove("usuario");
    state
        .db
        .run(move |c| entregas::eliminar_entrega(c, id, usuario.as_deref()))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::mensaje("Entrega eliminada; el stock fue repuesto")))
}

/// GET /api/entregas-ciclo
pub async fn listar_entregas_ciclo(state: web::Data<AppState>, query: Query) -> Respuesta {
    let q = query.into_inner();
    let filtro = FiltroEntregas::desde_query(&q)?;
    let pag = paginacion(&state, &q)?;
    let pagina = state
        .db
        .run(move |c| entregas::listar_entregas_ciclo_activo(c, &filtro, &pag))
        .await?;
    Ok(ok(pagina))
}

/// GET /api/entregas-ciclo/estadisticas/{id_ciclo}
pub async fn estadisticas_ciclo(state: web::Data<AppState>, path: web::Path<i64>) -> Respuesta {
    let id_ciclo = path.into_inner();
    let datos = state.db.run(move |c| estadisticas(c, id_ciclo)).await?;
    Ok(ok(datos))
}

/// POST /api/entregas-ciclo/resync/{id_ciclo}/kits
pub async fn resincronizar_kits(state: web::Data<AppState>, path: web::Path<i64>) -> Respuesta {
    let id_ciclo = path.into_inner();
    let actualizadas = state.db.run(move |c| resincronizar(c, id_ciclo)).await?;
    Ok(ok_con_mensaje(
        serde_json::json!({ "actualizadas": actualizadas }),
        format!("{} asignaciones con kit actualizado", actualizadas),
    ))
}
