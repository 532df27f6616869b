// Registro de entregas, listados filtrados y vigencia de cada entrega.

pub mod correcciones;
pub mod filtros;
pub mod listado;
pub mod registro;

pub use correcciones::{actualizar_entrega, eliminar_entrega, obtener_entrega, Entrega};
pub use filtros::{FiltroEntregas, FiltroKit};
pub use listado::*;
pub use registro::{registrar_entrega, EntregaRegistrada};

use crate::config::Config;

/// Parámetros para calcular la vigencia de una entrega.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReglasVigencia {
    /// Meses hasta la siguiente entrega.
    pub meses: u32,
    pub dias_alerta: i64,
}

impl Default for ReglasVigencia {
    fn default() -> Self {
        ReglasVigencia { meses: 4, dias_alerta: 30 }
    }
}

impl From<&Config> for ReglasVigencia {
    fn from(cfg: &Config) -> Self {
        ReglasVigencia { meses: cfg.proxima_entrega_meses, dias_alerta: cfg.dias_alerta }
    }
}
