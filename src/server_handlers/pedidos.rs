use actix_web::{web, HttpResponse};

use super::{adjunto, hoy};
use crate::api_json::{creado, ok};
use crate::error::SirdsError;
use crate::exportar::{exportar_faltantes, exportar_pedido};
use crate::models::{NuevaRecepcion, NuevoPedido};
use crate::pedidos;
use crate::server::AppState;

type Respuesta = Result<HttpResponse, SirdsError>;

/// GET /api/pedidos
pub async fn listar_pedidos(state: web::Data<AppState>) -> Respuesta {
    Ok(ok(state.db.run(|c| pedidos::listar_pedidos(c)).await?))
}

/// GET /api/pedidos/stats
pub async fn estadisticas(state: web::Data<AppState>) -> Respuesta {
    Ok(ok(state.db.run(|c| pedidos::estadisticas_pedidos(c)).await?))
}

/// POST /api/pedidos/generar
///
/// El cuerpo es opcional: `{ "observaciones": ... }`.
pub async fn generar_pedido(state: web::Data<AppState>, body: Option<web::Json<NuevoPedido>>) -> Respuesta {
    let nuevo = body.map(web::Json::into_inner).unwrap_or_default();
    let hoy = hoy();
    let pedido = state.db.run(move |c| pedidos::generar_pedido(c, &nuevo, hoy)).await?;
    let mensaje = format!(
        "Pedido {} generado con {} artículos",
        pedido.pedido.id_pedido, pedido.pedido.articulos_solicitados
    );
    Ok(creado(pedido, mensaje))
}

pub async fn obtener_pedido(state: web::Data<AppState>, path: web::Path<i64>) -> Respuesta {
    let id = path.into_inner();
    Ok(ok(state.db.run(move |c| pedidos::obtener_pedido(c, id)).await?))
}

/// GET /api/pedidos/{id}/export
pub async fn exportar(state: web::Data<AppState>, path: web::Path<i64>) -> Respuesta {
    let id = path.into_inner();
    let archivo = state
        .db
        .run(move |c| exportar_pedido(&pedidos::obtener_pedido(c, id)?))
        .await?;
    Ok(adjunto(archivo))
}

/// GET /api/pedidos/faltantes
pub async fn faltantes(state: web::Data<AppState>) -> Respuesta {
    Ok(ok(state.db.run(|c| pedidos::faltantes_tallas(c)).await?))
}

/// GET /api/pedidos/faltantes/export
///
/// 204 sin cuerpo cuando no falta ninguna talla.
pub async fn exportar_faltantes_tallas(state: web::Data<AppState>) -> Respuesta {
    let hoy = hoy();
    let archivo = state
        .db
        .run(move |c| {
            let faltantes = pedidos::faltantes_tallas(c)?;
            if faltantes.is_empty() {
                return Ok(None);
            }
            exportar_faltantes(&faltantes, hoy).map(Some)
        })
        .await?;
    Ok(match archivo {
        Some(archivo) => adjunto(archivo),
        None => HttpResponse::NoContent().finish(),
    })
}

/// GET /api/pedidos/{id}/recepciones
pub async fn listar_recepciones(state: web::Data<AppState>, path: web::Path<i64>) -> Respuesta {
    let id = path.into_inner();
    Ok(ok(state.db.run(move |c| pedidos::recepciones_pedido(c, id)).await?))
}

/// POST /api/pedidos/{id}/recepciones
pub async fn registrar_recepcion(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<NuevaRecepcion>,
) -> Respuesta {
    let id = path.into_inner();
    let nueva = body.into_inner();
    let hoy = hoy();
    let recepcion = state
        .db
        .run(move |c| pedidos::registrar_recepcion(c, id, &nueva, hoy))
        .await?;
    Ok(creado(recepcion, "Recepción registrada"))
}
