mod common;

use common::*;
use rusqlite::Connection;

use sirds::diagnostico::diagnosticar;

/// Tablas como estaban antes de las restricciones: sin UNIQUE ni claves
/// foráneas.
fn base_heredada() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE area (id_area INTEGER PRIMARY KEY, nombre_area TEXT);
         CREATE TABLE empleado (
             id_empleado INTEGER PRIMARY KEY, identificacion TEXT, nombre TEXT, apellido TEXT);
         CREATE TABLE ciclo_dotacion (id_ciclo INTEGER PRIMARY KEY, nombre_ciclo TEXT);
         CREATE TABLE empleado_ciclo (
             id_empleado_ciclo INTEGER PRIMARY KEY, id_empleado INTEGER, id_ciclo INTEGER, id_area INTEGER);

         INSERT INTO area VALUES (1, 'Planta'), (2, 'Bodega');
         INSERT INTO ciclo_dotacion VALUES (1, 'Enero');",
    )
    .unwrap();
    conn
}

#[test]
fn test_identificacion_duplicada_un_grupo() {
    let conn = base_heredada();
    conn.execute_batch(
        "INSERT INTO empleado VALUES (1, '123', 'Ana', 'Pérez'), (2, '123', 'Ana', 'Perez'), (3, '456', 'Luis', 'Gómez');",
    )
    .unwrap();

    let reporte = diagnosticar(&conn).unwrap();
    assert_eq!(reporte.identificaciones_duplicadas.len(), 1);
    let grupo = &reporte.identificaciones_duplicadas[0];
    assert_eq!(grupo.identificacion, "123");
    assert_eq!(grupo.cantidad, 2);
    assert_eq!(grupo.ids, vec![1, 2]);
    assert!(!reporte.sin_problemas());
    assert!(reporte.asignaciones_duplicadas.is_empty());
    assert!(reporte.ciclos_huerfanos.is_empty());
    assert!(reporte.areas_multiples.is_empty());
}

#[test]
fn test_asignaciones_duplicadas_huerfanas_y_areas() {
    let conn = base_heredada();
    conn.execute_batch(
        "INSERT INTO empleado VALUES (1, '123', 'Ana', 'Pérez'), (2, '456', 'Luis', 'Gómez');
         -- Ana dos veces en el ciclo 1, en áreas distintas
         INSERT INTO empleado_ciclo VALUES (1, 1, 1, 1), (2, 1, 1, 2);
         -- Luis en un ciclo que no existe
         INSERT INTO empleado_ciclo VALUES (3, 2, 42, 1), (4, 2, 42, 1);",
    )
    .unwrap();

    let reporte = diagnosticar(&conn).unwrap();
    assert!(reporte.identificaciones_duplicadas.is_empty());

    assert_eq!(reporte.asignaciones_duplicadas.len(), 2);
    let ana = &reporte.asignaciones_duplicadas[0];
    assert_eq!((ana.id_empleado, ana.id_ciclo, ana.cantidad), (1, 1, 2));
    assert_eq!(ana.empleado.as_deref(), Some("Ana Pérez"));

    assert_eq!(reporte.ciclos_huerfanos.len(), 1);
    assert_eq!(reporte.ciclos_huerfanos[0].id_ciclo, 42);
    assert_eq!(reporte.ciclos_huerfanos[0].cantidad, 2);

    assert_eq!(reporte.areas_multiples.len(), 1);
    let multiple = &reporte.areas_multiples[0];
    assert_eq!(multiple.id_empleado, 1);
    assert_eq!(multiple.cantidad_areas, 2);
    assert_eq!(multiple.areas, vec!["Bodega".to_string(), "Planta".to_string()]);

    assert_eq!(reporte.total_problemas(), 4);
    let texto = reporte.to_string();
    assert!(texto.contains("ciclo 42"));
}

#[test]
fn test_base_actual_sin_problemas() {
    let mut conn = conexion();
    let _esc = escenario(&mut conn);
    ciclo_enero_activo(&mut conn);

    let reporte = diagnosticar(&conn).unwrap();
    assert!(reporte.sin_problemas(), "{}", reporte);
}
