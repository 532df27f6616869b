mod common;

use common::*;

use sirds::entregas::{registrar_entrega, ReglasVigencia};
use sirds::reportes::{kpis, reportes, resolver_rango, OrigenRango};

#[test]
fn test_rango_segun_ciclo_activo() {
    let mut conn = conexion();
    let _esc = escenario(&mut conn);

    let rango = resolver_rango(&conn, None, None).unwrap();
    assert_eq!(rango.origen, OrigenRango::Historico);

    ciclo_enero_activo(&mut conn);
    let rango = resolver_rango(&conn, None, None).unwrap();
    assert_eq!(rango.origen, OrigenRango::CicloActivo);
    assert_eq!(rango.fecha_inicio, Some(d("2025-01-01")));
    assert_eq!(rango.fecha_fin, Some(d("2025-01-31")));

    let rango = resolver_rango(&conn, Some(d("2024-01-01")), None).unwrap();
    assert_eq!(rango.origen, OrigenRango::Explicito);
    assert_eq!(rango.fecha_fin, None);
}

#[test]
fn test_agrupaciones_dentro_de_la_ventana() {
    let mut conn = conexion();
    let esc = escenario(&mut conn);
    ciclo_enero_activo(&mut conn);
    registrar_entrega(&mut conn, &entrega("1001", esc.id_guantes, None, 3, "2025-01-15"), d("2025-01-15")).unwrap();
    registrar_entrega(
        &mut conn,
        &entrega("1001", esc.id_camisa, Some(esc.id_talla), 1, "2025-02-01"),
        d("2025-02-01"),
    )
    .unwrap();

    let r = reportes(&conn, None, None).unwrap();
    assert_eq!(r.entregas_por_mes.len(), 1);
    assert_eq!(r.entregas_por_mes[0].clave, "2025-01");
    assert_eq!(r.entregas_por_mes[0].total_cantidad, 3);
    assert_eq!(r.entregas_por_categoria[0].clave, "Ropa de trabajo");
    assert_eq!(r.entregas_por_area[0].clave, "Producción");

    let r = reportes(&conn, Some(d("2025-01-01")), Some(d("2025-12-31"))).unwrap();
    let meses: Vec<&str> = r.entregas_por_mes.iter().map(|a| a.clave.as_str()).collect();
    assert_eq!(meses, vec!["2025-02", "2025-01"]);
    assert_eq!(r.entregas_por_area[0].total_entregas, 2);
}

#[test]
fn test_kpis() {
    let mut conn = conexion();
    let esc = escenario(&mut conn);
    registrar_entrega(
        &mut conn,
        &entrega("1001", esc.id_camisa, Some(esc.id_talla), 4, "2025-01-15"),
        d("2025-01-15"),
    )
    .unwrap();

    let k = kpis(&conn, d("2025-05-01"), &ReglasVigencia::default()).unwrap();
    assert_eq!(k.total_dotaciones, 2);
    assert_eq!(k.total_entregas, 1);
    assert_eq!(k.proximas_entregas, 1);
    assert_eq!(k.stock_total, 6);
}
