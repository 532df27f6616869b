use chrono::{Months, NaiveDate};
use rusqlite::Connection;
use serde::Serialize;

use crate::error::SirdsResult;

/// Ventana de entrega de un ciclo, inclusiva en ambos extremos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ventana {
    pub inicio: NaiveDate,
    pub fin: NaiveDate,
}

impl Ventana {
    pub fn new(inicio: NaiveDate, fin: NaiveDate) -> Self {
        Ventana { inicio, fin }
    }

    pub fn contiene(&self, fecha: NaiveDate) -> bool {
        self.inicio <= fecha && fecha <= self.fin
    }
}

/// Ventana por defecto: desde un mes antes de la fecha de entrega hasta la
/// fecha de entrega. Si el mes anterior es más corto se usa su último día.
pub fn ventana_para_entrega(fecha_entrega: NaiveDate) -> Ventana {
    let inicio = fecha_entrega
        .checked_sub_months(Months::new(1))
        .unwrap_or(fecha_entrega);
    Ventana::new(inicio, fecha_entrega)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ValidacionVentana {
    pub puede_crear: bool,
    pub fecha_inicio_ventana: NaiveDate,
    pub fecha_fin_ventana: NaiveDate,
    pub dias_restantes: i64,
}

/// Indica si `hoy` cae en la ventana que tendría un ciclo con esa fecha de
/// entrega.
pub fn validar_ventana(fecha_entrega: NaiveDate, hoy: NaiveDate) -> ValidacionVentana {
    let v = ventana_para_entrega(fecha_entrega);
    ValidacionVentana {
        puede_crear: v.contiene(hoy),
        fecha_inicio_ventana: v.inicio,
        fecha_fin_ventana: v.fin,
        dias_restantes: (fecha_entrega - hoy).num_days(),
    }
}

/// Ventana del ciclo activo. Sin ciclo activo no hay filtro de ventana.
pub fn ventana_activa(conn: &Connection) -> SirdsResult<Option<Ventana>> {
    Ok(super::ciclo_activo(conn)?.map(|c| Ventana::new(c.fecha_inicio_ventana, c.fecha_fin_ventana)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn ventana_incluye_extremos() {
        let v = Ventana::new(d("2025-01-01"), d("2025-01-31"));
        assert!(v.contiene(d("2025-01-01")));
        assert!(v.contiene(d("2025-01-15")));
        assert!(v.contiene(d("2025-01-31")));
        assert!(!v.contiene(d("2025-02-01")));
        assert!(!v.contiene(d("2024-12-31")));
    }

    #[test]
    fn ventana_por_defecto_recorta_fin_de_mes() {
        let v = ventana_para_entrega(d("2025-03-31"));
        assert_eq!(v.inicio, d("2025-02-28"));
        assert_eq!(v.fin, d("2025-03-31"));
    }

    #[test]
    fn validar_ventana_calcula_dias() {
        let r = validar_ventana(d("2025-05-20"), d("2025-05-01"));
        assert!(r.puede_crear);
        assert_eq!(r.dias_restantes, 19);
        assert!(!validar_ventana(d("2025-05-20"), d("2025-04-01")).puede_crear);
    }
}
