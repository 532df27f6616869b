use actix_web::{HttpResponse, Responder};
use serde_json::json;

/// GET /help
pub async fn help_handler() -> impl Responder {
    let registrar_ejemplo = json!({
        "identificacion": "1020304050",
        "id_dotacion": 3,
        "id_talla": 7,
        "cantidad": 1,
        "fecha_entrega": "2025-01-15",
        "observaciones": "Entrega de temporada",
        "usuario": "bodega"
    });
    let ciclo_ejemplo = json!({
        "nombre_ciclo": "Dotación enero 2025",
        "fecha_entrega": "2025-01-31",
        "observaciones": null
    });

    let help = json!({
        "description": "SIRDS: registro de entregas de dotación a empleados por ciclos. Todas las respuestas JSON usan la envoltura { success, data?, message? }.",
        "filtros_entregas": {
            "search": "texto libre sobre nombre, apellido, identificación y cargo",
            "estado": "vencida | proxima | vigente (historial); procesado | entregado | omitido (ciclo activo)",
            "id_area": "número",
            "kit": "todos | con | sin",
            "solo_ciclo_activo": "true para limitar a la ventana del ciclo activo",
            "fecha_inicio": "AAAA-MM-DD",
            "fecha_fin": "AAAA-MM-DD",
            "page": "desde 1",
            "limit": "1 a 100"
        },
        "post_entregar_example": registrar_ejemplo,
        "post_ciclo_example": ciclo_ejemplo,
        "routes": [
            "GET /api/dotaciones", "POST /api/dotaciones",
            "GET|PUT|DELETE /api/dotaciones/{id}",
            "GET /api/dotaciones/entregas", "GET /api/dotaciones/entregas/exportar?formato=xlsx|csv",
            "POST /api/dotaciones/entregar",
            "GET|POST /api/dotaciones/stock",
            "GET /api/dotaciones/kpis", "GET /api/dotaciones/proximas", "GET /api/dotaciones/reportes",
            "GET /api/dotaciones/empleado/{documento}",
            "PUT|DELETE /api/dotaciones/entregas/{id}",
            "POST /api/dotaciones/guardar-tallas", "GET /api/dotaciones/tallas/{id_dotacion}/{id_empleado}",
            "GET|POST /api/ciclos", "GET /api/ciclos/activo", "GET /api/ciclos/estadisticas",
            "GET /api/ciclos/preview-elegibles?fecha_entrega=", "GET /api/ciclos/validar-ventana?fecha_entrega=",
            "GET|POST /api/ciclos/smlv",
            "GET|DELETE /api/ciclos/{id}", "PUT /api/ciclos/{id}/estado", "POST /api/ciclos/{id}/sync-elegibles",
            "GET /api/ciclos/{id}/empleados", "PUT /api/ciclos/empleados/{id_empleado_ciclo}",
            "GET /api/entregas-ciclo", "PUT /api/entregas-ciclo/{id}/estado",
            "GET /api/entregas-ciclo/estadisticas/{id_ciclo}", "POST /api/entregas-ciclo/resync/{id_ciclo}/kits",
            "GET /api/pedidos", "GET /api/pedidos/stats", "POST /api/pedidos/generar",
            "GET /api/pedidos/faltantes", "GET /api/pedidos/faltantes/export",
            "GET /api/pedidos/{id}", "GET /api/pedidos/{id}/export", "GET|POST /api/pedidos/{id}/recepciones",
            "GET|POST /api/categorias", "GET|POST /api/proveedores", "GET|POST /api/areas",
            "GET|POST /api/tallas",
            "GET|POST /api/empleados", "GET /api/empleados/search?q=", "GET /api/empleados/area/{id_area}",
            "GET|PUT /api/empleados/{id}", "PATCH /api/empleados/{id}/estado", "GET /api/empleados/{id}/tallas",
            "GET /api/kits/area/{id_area}", "POST /api/kits",
            "GET /api/diagnostico/redundancia"
        ]
    });

    HttpResponse::Ok().json(help)
}
