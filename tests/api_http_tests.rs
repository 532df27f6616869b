mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use common::*;
use serde_json::{json, Value};

use sirds::server::{configure, AppState};
use sirds::{Config, Db};

fn estado() -> (web::Data<AppState>, Escenario) {
    let db = Db::open_in_memory().expect("Debe abrir la base en memoria");
    let esc = db.with_conn(|c| Ok(escenario(c))).unwrap();
    (web::Data::new(AppState::new(db, Config::default())), esc)
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(App::new().app_data($state.clone()).configure(configure)).await
    };
}

#[actix_web::test]
async fn test_crear_area_y_listar() {
    let (state, _esc) = estado();
    let app = app!(state);

    let req = test::TestRequest::post().uri("/api/areas").set_json(json!({"nombre_area": "Logística"})).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["nombre_area"], "Logística");

    let req = test::TestRequest::get().uri("/api/areas").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn test_errores_con_envoltura() {
    let (state, esc) = estado();
    let app = app!(state);

    // Identificación duplicada
    let req = test::TestRequest::post()
        .uri("/api/empleados")
        .set_json(json!({"identificacion": "1001", "nombre": "Otra"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());

    let req = test::TestRequest::get().uri("/api/dotaciones/999").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/api/dotaciones/entregar")
        .set_json(json!({"identificacion": "1001", "id_dotacion": esc.id_guantes, "cantidad": 0}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/dotaciones")
        .insert_header(header::ContentType::json())
        .set_payload("{no es json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);

    let req = test::TestRequest::get().uri("/api/dotaciones/entregas?page=abc").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_ruta_y_consulta_malformadas_con_envoltura() {
    let (state, _esc) = estado();
    let app = app!(state);

    for uri in ["/api/ciclos/abc", "/api/dotaciones/xyz", "/api/kits/area/1.5"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false, "{}", uri);
        assert!(body["message"].as_str().expect("Debe traer mensaje").contains("ruta"));
    }
}

#[actix_web::test]
async fn test_flujo_ciclo_entrega_y_listados() {
    let (state, esc) = estado();
    let app = app!(state);

    let req = test::TestRequest::get().uri("/api/ciclos/activo").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert!(body.get("data").is_none());

    let req = test::TestRequest::post()
        .uri("/api/ciclos")
        .set_json(json!({
            "nombre_ciclo": "Dotación enero 2025",
            "fecha_entrega": "2025-01-31",
            "fecha_inicio_ventana": "2025-01-01",
            "fecha_fin_ventana": "2025-01-31"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let id_ciclo = body["data"]["id_ciclo"].as_i64().unwrap();
    assert_eq!(body["data"]["estado"], "pendiente");

    let req = test::TestRequest::put()
        .uri(&format!("/api/ciclos/{}/estado", id_ciclo))
        .set_json(json!({"estado": "activo"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["estado"], "activo");
    assert_eq!(body["data"]["total_empleados_elegibles"], 1);

    for (id_dotacion, id_talla, fecha) in [
        (esc.id_guantes, None, "2025-01-15"),
        (esc.id_camisa, Some(esc.id_talla), "2025-02-01"),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/dotaciones/entregar")
            .set_json(json!({
                "identificacion": "1001",
                "id_dotacion": id_dotacion,
                "id_talla": id_talla,
                "fecha_entrega": fecha
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get().uri("/api/dotaciones/entregas?solo_ciclo_activo=true").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["fecha_entrega"], "2025-01-15");

    let req = test::TestRequest::get().uri("/api/dotaciones/entregas?limit=1&page=2").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::get().uri("/api/entregas-ciclo?estado=entregado").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["nombre_kit"], "Kit Producción");

    let req = test::TestRequest::get().uri(&format!("/api/entregas-ciclo/estadisticas/{}", id_ciclo)).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["entregados"], 1);
    assert_eq!(body["data"]["por_estado"][0]["estado"], "entregado");

    let req = test::TestRequest::get().uri("/api/dotaciones/empleado/1001").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["empleado"]["identificacion"], "1001");
    assert_eq!(body["data"]["historial_entregas"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::delete().uri(&format!("/api/ciclos/{}", id_ciclo)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_exportar_csv() {
    let (state, esc) = estado();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/dotaciones/entregar")
        .set_json(json!({"identificacion": "1001", "id_dotacion": esc.id_guantes, "fecha_entrega": "2025-01-15"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::get().uri("/api/dotaciones/entregas/exportar?formato=csv").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let disposicion = resp.headers().get(header::CONTENT_DISPOSITION).unwrap().to_str().unwrap().to_string();
    assert!(disposicion.starts_with("attachment; filename=\"entregas_"));
    assert!(disposicion.ends_with(".csv\""));
    let cuerpo = test::read_body(resp).await;
    let texto = String::from_utf8(cuerpo.to_vec()).unwrap();
    assert_eq!(texto.lines().count(), 2);
    assert!(texto.contains("Guantes"));

    let req = test::TestRequest::get().uri("/api/dotaciones/entregas/exportar?formato=pdf").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_diagnostico_y_ayuda() {
    let (state, _esc) = estado();
    let app = app!(state);

    let req = test::TestRequest::get().uri("/api/diagnostico/redundancia").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["identificaciones_duplicadas"], json!([]));

    let req = test::TestRequest::get().uri("/help").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["routes"].as_array().unwrap().len() > 10);
}

#[actix_web::test]
async fn test_empleados_busqueda_edicion_y_estado() {
    let (state, esc) = estado();
    let app = app!(state);

    let req = test::TestRequest::get().uri("/api/empleados/search?q=P%C3%89R").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["identificacion"], "1001");

    let req = test::TestRequest::get().uri("/api/empleados/search?q=a").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::put()
        .uri(&format!("/api/empleados/{}", esc.id_empleado))
        .set_json(json!({
            "identificacion": "1001",
            "nombre": "Ana María",
            "apellido": "Pérez",
            "cargo": "Supervisora",
            "id_area": esc.id_area,
            "sueldo": 1800000.0
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["nombre"], "Ana María");
    assert_eq!(body["data"]["cargo"], "Supervisora");

    let req = test::TestRequest::patch()
        .uri(&format!("/api/empleados/{}/estado", esc.id_empleado))
        .set_json(json!({"estado": false}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["activo"], false);

    // inactiva: ya no sale en búsquedas ni en su área
    let req = test::TestRequest::get().uri("/api/empleados/search?q=ana").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"], json!([]));
    let req = test::TestRequest::get().uri(&format!("/api/empleados/area/{}", esc.id_area)).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"], json!([]));

    let req = test::TestRequest::get().uri(&format!("/api/empleados/{}", esc.id_empleado)).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["activo"], false);

    let req = test::TestRequest::get().uri("/api/empleados/999/tallas").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_corregir_y_eliminar_entrega() {
    let (state, esc) = estado();
    let app = app!(state);
    let stock = |state: &web::Data<AppState>| {
        state
            .db
            .with_conn(|c| Ok(c.query_row("SELECT cantidad FROM stock WHERE id_stock = 1", [], |r| r.get::<_, i64>(0))?))
            .unwrap()
    };

    let req = test::TestRequest::post()
        .uri("/api/dotaciones/entregar")
        .set_json(json!({
            "identificacion": "1001",
            "id_dotacion": esc.id_camisa,
            "id_talla": esc.id_talla,
            "cantidad": 2,
            "fecha_entrega": "2025-01-15"
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id_entrega = body["data"]["id_entrega"].as_i64().unwrap();
    assert_eq!(stock(&state), 8);

    let req = test::TestRequest::put()
        .uri(&format!("/api/dotaciones/entregas/{}", id_entrega))
        .set_json(json!({"cantidad": 3, "usuario": "bodega"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["cantidad"], 3);
    assert_eq!(stock(&state), 7);

    let req = test::TestRequest::put()
        .uri(&format!("/api/dotaciones/entregas/{}", id_entrega))
        .set_json(json!({"cantidad": 0}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/dotaciones/entregas/{}?usuario=bodega", id_entrega))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(stock(&state), 10);

    let req = test::TestRequest::delete().uri(&format!("/api/dotaciones/entregas/{}", id_entrega)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_pedido_de_punta_a_punta() {
    let (state, esc) = estado();
    let app = app!(state);
    let id_ciclo = state
        .db
        .with_conn(|c| {
            sirds::dotaciones::ajustar_stock(
                c,
                &sirds::models::AjusteStock {
                    id_dotacion: esc.id_camisa,
                    id_talla: Some(esc.id_talla),
                    id_area: None,
                    cantidad: -9,
                },
            )?;
            Ok(ciclo_enero_activo(c).id_ciclo)
        })
        .unwrap();

    let req = test::TestRequest::post().uri(&format!("/api/entregas-ciclo/resync/{}/kits", id_ciclo)).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["actualizadas"], 0);
    let req = test::TestRequest::post().uri("/api/entregas-ciclo/resync/999/kits").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    // sin talla de camisa el pedido queda bloqueado y hay faltantes para exportar
    let req = test::TestRequest::post().uri("/api/pedidos/generar").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
    let req = test::TestRequest::get().uri("/api/pedidos/faltantes/export").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let disposicion = resp.headers().get(header::CONTENT_DISPOSITION).unwrap().to_str().unwrap().to_string();
    assert!(disposicion.contains("faltantes_tallas_"));

    let req = test::TestRequest::post()
        .uri("/api/dotaciones/guardar-tallas")
        .set_json(json!({
            "id_empleado": esc.id_empleado,
            "tallas": [{"id_dotacion": esc.id_camisa, "id_talla": esc.id_talla}]
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/dotaciones/tallas/{}/{}", esc.id_camisa, esc.id_empleado))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"][0]["talla"], "M");
    assert_eq!(body["data"][0]["preferida"], true);

    let req = test::TestRequest::get().uri("/api/pedidos/faltantes/export").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::post().uri("/api/pedidos/generar").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let id_pedido = body["data"]["id_pedido"].as_i64().unwrap();
    assert_eq!(body["data"]["estado"], "enviado");
    assert_eq!(body["data"]["detalles"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::get().uri(&format!("/api/pedidos/{}/export", id_pedido)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let disposicion = resp.headers().get(header::CONTENT_DISPOSITION).unwrap().to_str().unwrap().to_string();
    assert!(disposicion.ends_with(".xlsx\""));

    let req = test::TestRequest::post()
        .uri(&format!("/api/pedidos/{}/recepciones", id_pedido))
        .set_json(json!({
            "documento_referencia": "FAC-77",
            "items": [
                {"id_dotacion": esc.id_camisa, "cantidad": 1},
                {"id_dotacion": esc.id_guantes, "cantidad": 1}
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["usuario_registro"], "sistema");

    let req = test::TestRequest::get().uri(&format!("/api/pedidos/{}", id_pedido)).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["estado"], "recibido_completo");

    let req = test::TestRequest::get().uri(&format!("/api/pedidos/{}/recepciones", id_pedido)).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"][0]["items"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::get().uri("/api/pedidos/stats").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["recibidos_completos"], 1);

    let req = test::TestRequest::get().uri("/api/pedidos").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
