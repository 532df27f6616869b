// Estructuras de datos principales

pub mod entidades;
pub mod entradas;
pub mod estado;

pub use entidades::*;
pub use entradas::*;
pub use estado::{dias_restantes, proxima_entrega, EstadoCiclo, EstadoEmpleadoCiclo, EstadoPedido, Vigencia};

use serde::Serialize;

pub const LIMITE_POR_DEFECTO: u32 = 10;
pub const LIMITE_MAXIMO: u32 = 100;

/// Página solicitada. `page` empieza en 1 y `limit` queda entre 1 y el
/// máximo configurado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginacion {
    pub page: u32,
    pub limit: u32,
}

impl Default for Paginacion {
    fn default() -> Self {
        Paginacion { page: 1, limit: LIMITE_POR_DEFECTO }
    }
}

impl Paginacion {
    /// Normaliza los valores recibidos: página 0 o ausente pasa a 1, límite
    /// ausente usa 10 y los límites fuera de rango se recortan.
    pub fn new(page: Option<u32>, limit: Option<u32>, maximo: u32) -> Self {
        let maximo = maximo.clamp(1, LIMITE_MAXIMO);
        Paginacion {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(LIMITE_POR_DEFECTO).clamp(1, maximo),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.limit))
    }

    /// Recorta en memoria una lista ya filtrada.
    pub fn aplicar<T>(&self, items: Vec<T>) -> Pagina<T> {
        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.limit as usize)
            .collect();
        Pagina::new(items, total, self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagina<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

impl<T> Pagina<T> {
    pub fn new(items: Vec<T>, total: u64, pag: &Paginacion) -> Self {
        Pagina { items, total, page: pag.page, limit: pag.limit, total_pages: pag.total_pages(total) }
    }
}
