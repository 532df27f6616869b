use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};

use crate::config::Config;
use crate::db::Db;
use crate::entregas::ReglasVigencia;
use crate::error::SirdsError;
use crate::server_handlers::{catalogos, ciclos, diagnostico, docs, dotaciones, empleados, entregas, pedidos};

/// Estado compartido por todos los handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Config,
}

impl AppState {
    pub fn new(db: Db, config: Config) -> Self {
        AppState { db, config }
    }

    pub fn reglas(&self) -> ReglasVigencia {
        ReglasVigencia::from(&self.config)
    }
}

/// Los cuerpos JSON inválidos responden con la misma envoltura que el resto
/// de errores.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| SirdsError::validation(format!("cuerpo JSON inválido: {}", err)).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| SirdsError::validation(format!("parámetros de consulta inválidos: {}", err)).into())
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, req| {
            SirdsError::validation(format!("segmento de ruta inválido en {}: {}", req.path(), err)).into()
        })
}

/// Registra todas las rutas. Las rutas fijas van antes que las que llevan
/// `{id}` en la misma posición.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .route("/help", web::get().to(docs::help_handler))
        // dotaciones
        .service(
            web::scope("/api/dotaciones")
                .route("/entregas/exportar", web::get().to(entregas::exportar_entregas))
                .route("/entregas", web::get().to(entregas::listar_entregas))
                .route("/entregas/{id}", web::put().to(entregas::actualizar_entrega))
                .route("/entregas/{id}", web::delete().to(entregas::eliminar_entrega))
                .route("/entregar", web::post().to(entregas::registrar_entrega))
                .route("/stock", web::get().to(dotaciones::listar_stock))
                .route("/stock", web::post().to(dotaciones::ajustar_stock))
                .route("/kpis", web::get().to(dotaciones::kpis))
                .route("/proximas", web::get().to(dotaciones::proximas_entregas))
                .route("/reportes", web::get().to(dotaciones::reportes))
                .route("/empleado/{documento}", web::get().to(dotaciones::empleado_por_documento))
                .route("/guardar-tallas", web::post().to(dotaciones::guardar_tallas))
                .route("/tallas/{id_dotacion}/{id_empleado}", web::get().to(dotaciones::tallas_disponibles))
                .route("", web::get().to(dotaciones::listar_dotaciones))
                .route("", web::post().to(dotaciones::crear_dotacion))
                .route("/{id}", web::get().to(dotaciones::obtener_dotacion))
                .route("/{id}", web::put().to(dotaciones::actualizar_dotacion))
                .route("/{id}", web::delete().to(dotaciones::eliminar_dotacion)),
        )
        // ciclos
        .service(
            web::scope("/api/ciclos")
                .route("/activo", web::get().to(ciclos::ciclo_activo))
                .route("/estadisticas", web::get().to(ciclos::estadisticas))
                .route("/preview-elegibles", web::get().to(ciclos::preview_elegibles))
                .route("/validar-ventana", web::get().to(ciclos::validar_ventana))
                .route("/smlv", web::get().to(ciclos::listar_smlv))
                .route("/smlv", web::post().to(ciclos::guardar_smlv))
                .route("/empleados/{id_empleado_ciclo}", web::put().to(ciclos::actualizar_asignacion))
                .route("", web::get().to(ciclos::listar_ciclos))
                .route("", web::post().to(ciclos::crear_ciclo))
                .route("/{id}/estado", web::put().to(ciclos::actualizar_estado))
                .route("/{id}/sync-elegibles", web::post().to(ciclos::sincronizar_elegibles))
                .route("/{id}/empleados", web::get().to(ciclos::empleados_ciclo))
                .route("/{id}", web::get().to(ciclos::obtener_ciclo))
                .route("/{id}", web::delete().to(ciclos::eliminar_ciclo)),
        )
        // entregas del ciclo activo
        .service(
            web::scope("/api/entregas-ciclo")
                .route("", web::get().to(entregas::listar_entregas_ciclo))
                .route("/estadisticas/{id_ciclo}", web::get().to(entregas::estadisticas_ciclo))
                .route("/resync/{id_ciclo}/kits", web::post().to(entregas::resincronizar_kits))
                .route("/{id}/estado", web::put().to(ciclos::actualizar_asignacion)),
        )
        // pedidos a proveedor
        .service(
            web::scope("/api/pedidos")
                .route("/stats", web::get().to(pedidos::estadisticas))
                .route("/generar", web::post().to(pedidos::generar_pedido))
                .route("/faltantes/export", web::get().to(pedidos::exportar_faltantes_tallas))
                .route("/faltantes", web::get().to(pedidos::faltantes))
                .route("", web::get().to(pedidos::listar_pedidos))
                .route("/{id}/export", web::get().to(pedidos::exportar))
                .route("/{id}/recepciones", web::get().to(pedidos::listar_recepciones))
                .route("/{id}/recepciones", web::post().to(pedidos::registrar_recepcion))
                .route("/{id}", web::get().to(pedidos::obtener_pedido)),
        )
        // empleados
        .service(
            web::scope("/api/empleados")
                .route("/search", web::get().to(empleados::buscar_empleados))
                .route("/area/{id_area}", web::get().to(empleados::empleados_por_area))
                .route("", web::get().to(empleados::listar_empleados))
                .route("", web::post().to(empleados::crear_empleado))
                .route("/{id}/estado", web::patch().to(empleados::cambiar_estado))
                .route("/{id}/tallas", web::get().to(empleados::tallas))
                .route("/{id}", web::get().to(empleados::obtener_empleado))
                .route("/{id}", web::put().to(empleados::actualizar_empleado)),
        )
        // catálogos
        .route("/api/categorias", web::get().to(catalogos::listar_categorias))
        .route("/api/categorias", web::post().to(catalogos::crear_categoria))
        .route("/api/proveedores", web::get().to(catalogos::listar_proveedores))
        .route("/api/proveedores", web::post().to(catalogos::crear_proveedor))
        .route("/api/areas", web::get().to(catalogos::listar_areas))
        .route("/api/areas", web::post().to(catalogos::crear_area))
        .route("/api/tallas", web::get().to(catalogos::listar_tallas))
        .route("/api/tallas", web::post().to(catalogos::crear_talla))
        .route("/api/kits/area/{id_area}", web::get().to(catalogos::kit_de_area))
        .route("/api/kits", web::post().to(catalogos::crear_kit))
        .route("/api/diagnostico/redundancia", web::get().to(diagnostico::redundancia));
}

/// Abre la base de datos y levanta el servidor HTTP.
pub async fn run_server(config: Config) -> std::io::Result<()> {
    let db = Db::open(&config.db_url).map_err(|e| std::io::Error::other(e.to_string()))?;
    let bind = config.bind.clone();
    let state = web::Data::new(AppState::new(db, config));

    log::info!("SIRDS escuchando en http://{}", bind);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&state.config.cors_origin)
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);
        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(bind)?
    .run()
    .await
}
