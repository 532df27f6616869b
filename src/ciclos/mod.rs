// Ciclos de dotación: ventanas de entrega, elegibilidad, asignación de
// empleados y salario mínimo de referencia.

pub mod asignaciones;
pub mod elegibilidad;
pub mod gestion;
pub mod smlv;
pub mod ventana;

pub use asignaciones::*;
pub use elegibilidad::{cumple_criterios, empleados_elegibles, meses_entre, preview_elegibles, Elegible, PreviewElegibles};
pub use gestion::*;
pub use smlv::{guardar_smlv, listar_smlv, obtener_smlv};
pub use ventana::{validar_ventana, ventana_activa, ventana_para_entrega, ValidacionVentana, Ventana};
