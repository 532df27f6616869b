#![allow(dead_code)]

use chrono::NaiveDate;
use rusqlite::Connection;

use sirds::ciclos::{actualizar_estado_ciclo, crear_ciclo};
use sirds::db::init_schema;
use sirds::dotaciones::{ajustar_stock, crear_area, crear_categoria, crear_dotacion, crear_kit, crear_talla};
use sirds::empleados::crear_empleado;
use sirds::models::{
    AjusteStock, CicloDotacion, EstadoCiclo, NuevaDotacion, NuevaEntrega, NuevaTalla, NuevoCiclo, NuevoEmpleado,
    NuevoKit, NuevoKitItem,
};

pub fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("fecha de prueba inválida")
}

pub fn conexion() -> Connection {
    let conn = Connection::open_in_memory().expect("Debe abrir SQLite en memoria");
    init_schema(&conn).expect("Debe crear el esquema");
    conn
}

/// Catálogo mínimo: un área con kit (camisa con talla + guantes sin talla),
/// talla M con 10 camisas en bodega y un empleado "1001".
pub struct Escenario {
    pub id_area: i64,
    pub id_camisa: i64,
    pub id_guantes: i64,
    pub id_talla: i64,
    pub id_kit: i64,
    pub id_empleado: i64,
    pub identificacion: String,
}

pub fn escenario(conn: &mut Connection) -> Escenario {
    let area = crear_area(conn, "Producción").expect("área");
    let categoria = crear_categoria(conn, "Ropa de trabajo").expect("categoría");
    let camisa = crear_dotacion(
        conn,
        &NuevaDotacion {
            nombre_dotacion: "Camisa".into(),
            id_categoria: Some(categoria.id_categoria),
            precio_unitario: 35000.0,
            talla_requerida: true,
            ..Default::default()
        },
    )
    .expect("camisa");
    let guantes = crear_dotacion(
        conn,
        &NuevaDotacion { nombre_dotacion: "Guantes".into(), id_categoria: Some(categoria.id_categoria), ..Default::default() },
    )
    .expect("guantes");
    let talla = crear_talla(conn, &NuevaTalla { talla: "M".into(), tipo_articulo: Some("camisa".into()) }).expect("talla");
    let kit = crear_kit(
        conn,
        &NuevoKit {
            nombre: "Kit Producción".into(),
            id_area: area.id_area,
            items: vec![
                NuevoKitItem { id_dotacion: camisa.id_dotacion, cantidad: 2 },
                NuevoKitItem { id_dotacion: guantes.id_dotacion, cantidad: 1 },
            ],
        },
    )
    .expect("kit");
    ajustar_stock(
        conn,
        &AjusteStock { id_dotacion: camisa.id_dotacion, id_talla: Some(talla.id_talla), id_area: None, cantidad: 10 },
    )
    .expect("stock");
    let empleado = nuevo_empleado(conn, "1001", "Ana", "Pérez", Some(area.id_area));

    Escenario {
        id_area: area.id_area,
        id_camisa: camisa.id_dotacion,
        id_guantes: guantes.id_dotacion,
        id_talla: talla.id_talla,
        id_kit: kit.id_kit,
        id_empleado: empleado,
        identificacion: "1001".into(),
    }
}

pub fn nuevo_empleado(conn: &Connection, identificacion: &str, nombre: &str, apellido: &str, id_area: Option<i64>) -> i64 {
    crear_empleado(
        conn,
        &NuevoEmpleado {
            identificacion: identificacion.into(),
            nombre: nombre.into(),
            apellido: apellido.into(),
            cargo: Some("Operario".into()),
            id_area,
            sueldo: 1_500_000.0,
            fecha_inicio: Some(d("2020-03-01")),
        },
    )
    .expect("empleado")
    .id_empleado
}

/// Ciclo de enero 2025 con ventana 2025-01-01..2025-01-31, sin activar.
pub fn ciclo_enero(conn: &Connection) -> CicloDotacion {
    crear_ciclo(
        conn,
        &NuevoCiclo {
            nombre_ciclo: "Dotación enero 2025".into(),
            fecha_entrega: d("2025-01-31"),
            fecha_inicio_ventana: Some(d("2025-01-01")),
            fecha_fin_ventana: Some(d("2025-01-31")),
            observaciones: None,
        },
    )
    .expect("ciclo")
}

pub fn ciclo_enero_activo(conn: &mut Connection) -> CicloDotacion {
    let ciclo = ciclo_enero(conn);
    actualizar_estado_ciclo(conn, ciclo.id_ciclo, EstadoCiclo::Activo, d("2025-01-02")).expect("activar ciclo")
}

pub fn entrega(identificacion: &str, id_dotacion: i64, id_talla: Option<i64>, cantidad: i64, fecha: &str) -> NuevaEntrega {
    NuevaEntrega {
        identificacion: identificacion.into(),
        id_dotacion,
        id_talla,
        cantidad,
        fecha_entrega: Some(d(fecha)),
        observaciones: None,
        usuario: Some("bodega".into()),
    }
}
