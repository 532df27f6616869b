//! Handlers HTTP agrupados por recurso. Cada handler extrae sus parámetros,
//! ejecuta la operación en el pool bloqueante y responde con la envoltura
//! de `api_json`.

pub mod catalogos;
pub mod ciclos;
pub mod diagnostico;
pub mod docs;
pub mod dotaciones;
pub mod empleados;
pub mod entregas;
pub mod pedidos;

use actix_web::http::header;
use actix_web::HttpResponse;
use chrono::NaiveDate;
use std::collections::HashMap;

use crate::exportar::Archivo;
use crate::models::Paginacion;
use crate::server::AppState;
use crate::error::SirdsResult;

pub(crate) type Query = actix_web::web::Query<HashMap<String, String>>;

/// Fecha local del servidor.
pub(crate) fn hoy() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub(crate) fn paginacion(state: &AppState, q: &HashMap<String, String>) -> SirdsResult<Paginacion> {
    Paginacion::desde_query(q, state.config.limite_pagina)
}

/// Respuesta de descarga con el nombre de archivo en `Content-Disposition`.
pub(crate) fn adjunto(archivo: Archivo) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(archivo.content_type)
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", archivo.nombre),
        ))
        .body(archivo.contenido)
}
