use std::io::Cursor;

use chrono::NaiveDate;
use umya_spreadsheet::{Spreadsheet, Worksheet};

use super::{Archivo, FormatoExportacion};
use crate::error::{SirdsError, SirdsResult};
use crate::pedidos::{FaltanteTalla, PedidoDetallado};

pub const HOJA_PEDIDO: &str = "Pedido";
pub const HOJA_FALTANTES: &str = "Faltantes tallas";

pub const ENCABEZADOS_PEDIDO: [&str; 6] =
    ["Artículo", "Categoría", "Talla", "Cantidad solicitada", "Precio unitario", "Subtotal"];
pub const ENCABEZADOS_FALTANTES: [&str; 4] = ["Identificación", "Empleado", "Área", "Dotación sin talla"];

fn hoja(libro: &mut Spreadsheet) -> SirdsResult<&mut Worksheet> {
    libro
        .get_sheet_mut(&0)
        .ok_or_else(|| SirdsError::Export("el libro no tiene hoja inicial".into()))
}

fn encabezados(hoja: &mut Worksheet, titulos: &[&str]) {
    for (i, titulo) in titulos.iter().enumerate() {
        hoja.get_cell_mut(((i + 1) as u32, 1)).set_value_string(*titulo);
    }
}

fn escribir(libro: &Spreadsheet) -> SirdsResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(libro, &mut buf)
        .map_err(|e| SirdsError::Export(format!("no se pudo escribir el XLSX: {}", e)))?;
    Ok(buf.into_inner())
}

/// Hoja "Pedido": una línea por artículo y una fila final con el total.
pub fn pedido_xlsx(pedido: &PedidoDetallado) -> SirdsResult<Vec<u8>> {
    let mut libro = umya_spreadsheet::new_file();
    let h = hoja(&mut libro)?;
    h.set_name(HOJA_PEDIDO);
    encabezados(h, &ENCABEZADOS_PEDIDO);

    for (r, l) in pedido.detalles.iter().enumerate() {
        let row = (r + 2) as u32;
        h.get_cell_mut((1, row)).set_value_string(l.nombre_dotacion.as_str());
        h.get_cell_mut((2, row)).set_value_string(l.nombre_categoria.as_deref().unwrap_or(""));
        h.get_cell_mut((3, row)).set_value_string(l.talla.as_deref().unwrap_or("N/A"));
        h.get_cell_mut((4, row)).set_value_number(l.cantidad_solicitada as f64);
        h.get_cell_mut((5, row)).set_value_number(l.precio_unitario);
        h.get_cell_mut((6, row)).set_value_number(l.subtotal);
    }
    let total = (pedido.detalles.len() + 2) as u32;
    h.get_cell_mut((5, total)).set_value_string("Total");
    h.get_cell_mut((6, total)).set_value_number(pedido.pedido.total_pedido);

    escribir(&libro)
}

pub fn faltantes_xlsx(faltantes: &[FaltanteTalla]) -> SirdsResult<Vec<u8>> {
    let mut libro = umya_spreadsheet::new_file();
    let h = hoja(&mut libro)?;
    h.set_name(HOJA_FALTANTES);
    encabezados(h, &ENCABEZADOS_FALTANTES);

    for (r, f) in faltantes.iter().enumerate() {
        let row = (r + 2) as u32;
        h.get_cell_mut((1, row)).set_value_string(f.identificacion.as_str());
        h.get_cell_mut((2, row)).set_value_string(f.nombre_completo.as_str());
        h.get_cell_mut((3, row)).set_value_string(f.nombre_area.as_deref().unwrap_or(""));
        h.get_cell_mut((4, row)).set_value_string(f.nombre_dotacion.as_str());
    }
    escribir(&libro)
}

pub fn exportar_pedido(pedido: &PedidoDetallado) -> SirdsResult<Archivo> {
    let contenido = pedido_xlsx(pedido)?;
    log::info!("pedido {} exportado ({} líneas)", pedido.pedido.id_pedido, pedido.detalles.len());
    Ok(Archivo {
        nombre: format!("pedido_{}_{}.xlsx", pedido.pedido.id_pedido, pedido.pedido.fecha.format("%F")),
        content_type: FormatoExportacion::Xlsx.content_type(),
        contenido,
    })
}

pub fn exportar_faltantes(faltantes: &[FaltanteTalla], hoy: NaiveDate) -> SirdsResult<Archivo> {
    let contenido = faltantes_xlsx(faltantes)?;
    log::info!("exportados {} faltantes de talla", faltantes.len());
    Ok(Archivo {
        nombre: format!("faltantes_tallas_{}.xlsx", hoy.format("%F")),
        content_type: FormatoExportacion::Xlsx.content_type(),
        contenido,
    })
}
