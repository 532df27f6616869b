use crate::entregas::EntregaDetalle;
use crate::error::{SirdsError, SirdsResult};

use super::{celdas, ENCABEZADOS};

/// CSV con fila de encabezados, separado por comas.
pub fn entregas_csv(filas: &[EntregaDetalle]) -> SirdsResult<Vec<u8>> {
    let mut wtr = ::csv::Writer::from_writer(vec![]);
    wtr.write_record(ENCABEZADOS)?;
    for fila in filas {
        wtr.write_record(celdas(fila))?;
    }
    wtr.into_inner()
        .map_err(|e| SirdsError::Export(format!("no se pudo cerrar el CSV: {}", e)))
}
