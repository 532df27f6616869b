mod common;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use common::*;
use std::io::Cursor;

use sirds::entregas::{filtrar_entregas, registrar_entrega, EntregaDetalle, FiltroEntregas, ReglasVigencia};
use sirds::exportar::{entregas_csv, entregas_xlsx, exportar, FormatoExportacion, ENCABEZADOS};

fn filas() -> Vec<EntregaDetalle> {
    let mut conn = conexion();
    let esc = escenario(&mut conn);
    ciclo_enero_activo(&mut conn);
    registrar_entrega(
        &mut conn,
        &entrega("1001", esc.id_camisa, Some(esc.id_talla), 2, "2025-01-15"),
        d("2025-01-15"),
    )
    .unwrap();
    registrar_entrega(&mut conn, &entrega("1001", esc.id_guantes, None, 1, "2025-01-20"), d("2025-01-20")).unwrap();
    filtrar_entregas(&conn, &FiltroEntregas::default(), d("2025-02-01"), &ReglasVigencia::default()).unwrap()
}

#[test]
fn test_xlsx_hoja_entregas_con_encabezados() {
    let filas = filas();
    let bytes = entregas_xlsx(&filas).expect("Debe generar el XLSX");

    let mut libro: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).expect("Debe abrir el XLSX generado");
    let hoja = libro.worksheet_range("Entregas").expect("Debe existir la hoja Entregas");
    let filas_hoja: Vec<&[Data]> = hoja.rows().collect();
    assert_eq!(filas_hoja.len(), 3);

    let encabezados: Vec<String> = filas_hoja[0].iter().map(|c| c.to_string()).collect();
    assert_eq!(encabezados, ENCABEZADOS.iter().map(|s| s.to_string()).collect::<Vec<_>>());

    // Más reciente primero: guantes (2025-01-20), luego camisa talla M.
    let guantes: Vec<String> = filas_hoja[1].iter().map(|c| c.to_string()).collect();
    assert_eq!(guantes[1], "2025-01-20");
    assert_eq!(guantes[2], "1001");
    assert_eq!(guantes[3], "Ana Pérez");
    assert_eq!(guantes[6], "Guantes");
    assert_eq!(guantes[8], "");
    let camisa = filas_hoja[2];
    assert_eq!(camisa[8].to_string(), "M");
    assert_eq!(camisa[9], Data::Float(2.0));
    assert_eq!(camisa[10].to_string(), "Kit Producción");
}

#[test]
fn test_csv_con_encabezados() {
    let filas = filas();
    let bytes = entregas_csv(&filas).expect("Debe generar el CSV");

    let mut rdr = csv::Reader::from_reader(bytes.as_slice());
    let encabezados: Vec<String> = rdr.headers().unwrap().iter().map(|s| s.to_string()).collect();
    assert_eq!(encabezados.len(), ENCABEZADOS.len());
    assert_eq!(encabezados[0], "ID");

    let registros: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(registros.len(), 2);
    assert_eq!(&registros[1][6], "Camisa");
    assert_eq!(&registros[1][9], "2");
    assert_eq!(&registros[1][12], "vigente");
}

#[test]
fn test_libro_vacio_solo_encabezados() {
    let bytes = entregas_xlsx(&[]).unwrap();
    let mut libro: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
    let hoja = libro.worksheet_range("Entregas").unwrap();
    assert_eq!(hoja.rows().count(), 1);
}

#[test]
fn test_archivo_con_nombre_y_tipo() {
    let archivo = exportar(&filas(), FormatoExportacion::Csv, d("2025-02-01")).unwrap();
    assert_eq!(archivo.nombre, "entregas_2025-02-01.csv");
    assert!(archivo.content_type.starts_with("text/csv"));
    assert!(!archivo.contenido.is_empty());
}
