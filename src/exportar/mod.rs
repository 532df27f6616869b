//! Exportación del libro de entregas a XLSX o CSV, y de pedidos a XLSX.

pub mod csv;
pub mod pedidos;
pub mod xlsx;

use chrono::NaiveDate;
use std::str::FromStr;

use crate::entregas::EntregaDetalle;
use crate::error::{SirdsError, SirdsResult};

pub use self::csv::entregas_csv;
pub use self::pedidos::{exportar_faltantes, exportar_pedido};
pub use self::xlsx::entregas_xlsx;

/// Encabezados comunes a ambos formatos, en el orden de las columnas.
pub const ENCABEZADOS: [&str; 13] = [
    "ID",
    "Fecha entrega",
    "Identificación",
    "Empleado",
    "Cargo",
    "Área",
    "Dotación",
    "Categoría",
    "Talla",
    "Cantidad",
    "Kit",
    "Próxima entrega",
    "Estado",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatoExportacion {
    #[default]
    Xlsx,
    Csv,
}

impl FormatoExportacion {
    pub fn extension(self) -> &'static str {
        match self {
            FormatoExportacion::Xlsx => "xlsx",
            FormatoExportacion::Csv => "csv",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            FormatoExportacion::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            FormatoExportacion::Csv => "text/csv; charset=utf-8",
        }
    }

    pub fn nombre_archivo(self, fecha: NaiveDate) -> String {
        format!("entregas_{}.{}", fecha.format("%F"), self.extension())
    }
}

impl FromStr for FormatoExportacion {
    type Err = SirdsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" | "excel" => Ok(FormatoExportacion::Xlsx),
            "csv" => Ok(FormatoExportacion::Csv),
            otro => Err(SirdsError::validation(format!("formato de exportación desconocido: '{}'", otro))),
        }
    }
}

/// Archivo generado listo para enviarse.
#[derive(Debug, Clone)]
pub struct Archivo {
    pub nombre: String,
    pub content_type: &'static str,
    pub contenido: Vec<u8>,
}

pub fn exportar(filas: &[EntregaDetalle], formato: FormatoExportacion, hoy: NaiveDate) -> SirdsResult<Archivo> {
    let contenido = match formato {
        FormatoExportacion::Xlsx => entregas_xlsx(filas)?,
        FormatoExportacion::Csv => entregas_csv(filas)?,
    };
    log::info!("exportadas {} entregas en formato {}", filas.len(), formato.extension());
    Ok(Archivo { nombre: formato.nombre_archivo(hoy), content_type: formato.content_type(), contenido })
}

/// Valores de texto de una fila, alineados con `ENCABEZADOS`.
pub(crate) fn celdas(e: &EntregaDetalle) -> [String; 13] {
    [
        e.id_entrega.to_string(),
        e.fecha_entrega.format("%F").to_string(),
        e.identificacion.clone(),
        e.nombre_completo(),
        e.cargo.clone().unwrap_or_default(),
        e.nombre_area.clone().unwrap_or_default(),
        e.nombre_dotacion.clone(),
        e.nombre_categoria.clone().unwrap_or_default(),
        e.talla.clone().unwrap_or_default(),
        e.cantidad.to_string(),
        e.nombre_kit.clone().unwrap_or_else(|| crate::entregas::SIN_KIT.to_string()),
        e.proxima_entrega.format("%F").to_string(),
        e.vigencia.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formato_desde_texto() {
        assert_eq!("XLSX".parse::<FormatoExportacion>().unwrap(), FormatoExportacion::Xlsx);
        assert_eq!(" csv ".parse::<FormatoExportacion>().unwrap(), FormatoExportacion::Csv);
        assert!("pdf".parse::<FormatoExportacion>().is_err());
    }

    #[test]
    fn nombre_con_fecha() {
        let f = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(FormatoExportacion::Csv.nombre_archivo(f), "entregas_2025-01-15.csv");
        assert_eq!(FormatoExportacion::Xlsx.nombre_archivo(f), "entregas_2025-01-15.xlsx");
    }
}
