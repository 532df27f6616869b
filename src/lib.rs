// Biblioteca raíz del crate `sirds`.
// Registro de dotación: ciclos de entrega, asignaciones, libro de entregas,
// catálogo, pedidos a proveedor, reportes y diagnóstico sobre SQLite,
// expuesto por HTTP.
pub mod api_json;
pub mod ciclos;
pub mod config;
pub mod db;
pub mod diagnostico;
pub mod dotaciones;
pub mod empleados;
pub mod entregas;
pub mod error;
pub mod exportar;
pub mod models;
pub mod pedidos;
pub mod reportes;
pub mod server;
pub mod server_handlers;

pub use config::Config;
pub use db::Db;
pub use error::{SirdsError, SirdsResult};
/// Ejecuta el servidor HTTP (reexport para facilitar uso desde `main`)
pub use server::run_server;
