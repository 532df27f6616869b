use std::io::Cursor;

use crate::entregas::EntregaDetalle;
use crate::error::{SirdsError, SirdsResult};

use super::{celdas, ENCABEZADOS};

pub const HOJA: &str = "Entregas";

// Columnas numéricas: ID y Cantidad.
const NUMERICAS: [usize; 2] = [0, 9];

/// Libro con una hoja "Entregas": encabezados en la fila 1, una entrega por fila.
pub fn entregas_xlsx(filas: &[EntregaDetalle]) -> SirdsResult<Vec<u8>> {
    let mut libro = umya_spreadsheet::new_file();
    let hoja = libro
        .get_sheet_mut(&0)
        .ok_or_else(|| SirdsError::Export("el libro no tiene hoja inicial".into()))?;
    hoja.set_name(HOJA);

    for (i, titulo) in ENCABEZADOS.iter().enumerate() {
        hoja.get_cell_mut(((i + 1) as u32, 1)).set_value_string(*titulo);
    }

    for (r, fila) in filas.iter().enumerate() {
        let row = (r + 2) as u32;
        for (i, valor) in celdas(fila).iter().enumerate() {
            let celda = hoja.get_cell_mut(((i + 1) as u32, row));
            match valor.parse::<f64>() {
                Ok(n) if NUMERICAS.contains(&i) => {
                    celda.set_value_number(n);
                }
                _ => {
                    celda.set_value_string(valor.as_str());
                }
            }
        }
    }

    let mut buf = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&libro, &mut buf)
        .map_err(|e| SirdsError::Export(format!("no se pudo escribir el XLSX: {}", e)))?;
    Ok(buf.into_inner())
}
