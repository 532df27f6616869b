use actix_web::{web, HttpResponse};

use crate::api_json::ok_con_mensaje;
use crate::diagnostico::diagnosticar;
use crate::error::SirdsError;
use crate::server::AppState;

/// GET /api/diagnostico/redundancia
pub async fn redundancia(state: web::Data<AppState>) -> Result<HttpResponse, SirdsError> {
    let reporte = state.db.run(|c| diagnosticar(c)).await?;
    let mensaje = if reporte.sin_problemas() {
        "No se encontraron redundancias".to_string()
    } else {
        format!("Se encontraron {} problemas", reporte.total_problemas())
    };
    Ok(ok_con_mensaje(reporte, mensaje))
}
