mod common;

use common::*;
use rusqlite::Connection;

use sirds::dotaciones::{ajustar_stock, crear_talla};
use sirds::entregas::{actualizar_entrega, eliminar_entrega, obtener_entrega, registrar_entrega};
use sirds::error::SirdsError;
use sirds::models::{AjusteStock, CambioEntrega, NuevaTalla};

fn stock(conn: &Connection, id_dotacion: i64, id_talla: i64) -> i64 {
    conn.query_row(
        "SELECT COALESCE(SUM(cantidad), 0) FROM stock WHERE id_dotacion = ?1 AND id_talla = ?2",
        [id_dotacion, id_talla],
        |r| r.get(0),
    )
    .unwrap()
}

fn movimientos(conn: &Connection, id_entrega: i64) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT tipo_movimiento FROM historial_movimientos WHERE id_registro = ?1 ORDER BY id_movimiento")
        .unwrap();
    stmt.query_map([id_entrega], |r| r.get(0)).unwrap().map(|r| r.unwrap()).collect()
}

#[test]
fn test_corregir_cantidad_ajusta_stock() {
    let mut conn = conexion();
    let esc = escenario(&mut conn);
    ciclo_enero_activo(&mut conn);
    let r = registrar_entrega(&mut conn, &entrega("1001", esc.id_camisa, Some(esc.id_talla), 2, "2025-01-15"), d("2025-01-15"))
        .expect("Debe registrar");
    assert_eq!(stock(&conn, esc.id_camisa, esc.id_talla), 8);

    let cambio = CambioEntrega { cantidad: Some(5), observaciones: Some("ajuste".into()), ..Default::default() };
    let e = actualizar_entrega(&mut conn, r.id_entrega, &cambio).expect("Debe corregir la entrega");
    assert_eq!(e.cantidad, 5);
    assert_eq!(e.observaciones.as_deref(), Some("ajuste"));
    assert_eq!(e.fecha_entrega, d("2025-01-15"));
    assert_eq!(stock(&conn, esc.id_camisa, esc.id_talla), 5);
    assert_eq!(movimientos(&conn, r.id_entrega), vec!["INSERT", "UPDATE"]);
}

#[test]
fn test_corregir_talla_mueve_unidades_entre_tallas() {
    let mut conn = conexion();
    let esc = escenario(&mut conn);
    ciclo_enero_activo(&mut conn);
    let l = crear_talla(&conn, &NuevaTalla { talla: "L".into(), tipo_articulo: None }).unwrap();
    ajustar_stock(&conn, &AjusteStock { id_dotacion: esc.id_camisa, id_talla: Some(l.id_talla), id_area: None, cantidad: 1 })
        .unwrap();
    let r = registrar_entrega(&mut conn, &entrega("1001", esc.id_camisa, Some(esc.id_talla), 1, "2025-01-15"), d("2025-01-15"))
        .unwrap();

    let e = actualizar_entrega(&mut conn, r.id_entrega, &CambioEntrega { id_talla: Some(l.id_talla), ..Default::default() })
        .expect("Debe cambiar la talla");
    assert_eq!(e.id_talla, Some(l.id_talla));
    assert_eq!(stock(&conn, esc.id_camisa, esc.id_talla), 10);
    assert_eq!(stock(&conn, esc.id_camisa, l.id_talla), 0);
}

#[test]
fn test_correccion_sin_stock_no_cambia_nada() {
    let mut conn = conexion();
    let esc = escenario(&mut conn);
    ciclo_enero_activo(&mut conn);
    let r = registrar_entrega(&mut conn, &entrega("1001", esc.id_camisa, Some(esc.id_talla), 2, "2025-01-15"), d("2025-01-15"))
        .unwrap();

    let err = actualizar_entrega(&mut conn, r.id_entrega, &CambioEntrega { cantidad: Some(11), ..Default::default() })
        .expect_err("Debe faltar stock");
    assert!(matches!(err, SirdsError::Validation(_)), "{:?}", err);
    assert_eq!(obtener_entrega(&conn, r.id_entrega).unwrap().cantidad, 2);
    assert_eq!(stock(&conn, esc.id_camisa, esc.id_talla), 8);
    assert_eq!(movimientos(&conn, r.id_entrega), vec!["INSERT"]);

    let err = actualizar_entrega(&mut conn, r.id_entrega, &CambioEntrega { cantidad: Some(0), ..Default::default() })
        .expect_err("Debe rechazar cantidad 0");
    assert!(matches!(err, SirdsError::Validation(_)));
}

#[test]
fn test_talla_en_dotacion_sin_talla_es_invalida() {
    let mut conn = conexion();
    let esc = escenario(&mut conn);
    ciclo_enero_activo(&mut conn);
    let r = registrar_entrega(&mut conn, &entrega("1001", esc.id_guantes, None, 1, "2025-01-15"), d("2025-01-15")).unwrap();

    let err = actualizar_entrega(&mut conn, r.id_entrega, &CambioEntrega { id_talla: Some(esc.id_talla), ..Default::default() })
        .expect_err("Debe rechazar la talla");
    assert!(matches!(err, SirdsError::Validation(_)));

    let e = actualizar_entrega(&mut conn, r.id_entrega, &CambioEntrega { fecha_entrega: Some(d("2025-01-20")), ..Default::default() })
        .expect("Debe cambiar la fecha");
    assert_eq!(e.fecha_entrega, d("2025-01-20"));
    assert_eq!(e.id_talla, None);
}

#[test]
fn test_eliminar_devuelve_stock() {
    let mut conn = conexion();
    let esc = escenario(&mut conn);
    ciclo_enero_activo(&mut conn);
    let r = registrar_entrega(&mut conn, &entrega("1001", esc.id_camisa, Some(esc.id_talla), 3, "2025-01-15"), d("2025-01-15"))
        .unwrap();
    assert_eq!(stock(&conn, esc.id_camisa, esc.id_talla), 7);

    eliminar_entrega(&mut conn, r.id_entrega, Some("bodega")).expect("Debe eliminar la entrega");
    assert_eq!(stock(&conn, esc.id_camisa, esc.id_talla), 10);
    assert!(matches!(obtener_entrega(&conn, r.id_entrega), Err(SirdsError::NotFound(_))));
    assert_eq!(movimientos(&conn, r.id_entrega), vec!["INSERT", "DELETE"]);

    let err = eliminar_entrega(&mut conn, r.id_entrega, None).expect_err("Ya no existe");
    assert!(matches!(err, SirdsError::NotFound(_)));
}
