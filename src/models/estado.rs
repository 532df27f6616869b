use chrono::{Months, NaiveDate};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SirdsError;

/// Estado de un ciclo de dotación.
///
/// Transiciones válidas: `pendiente -> activo`, `pendiente -> cerrado` y
/// `activo -> cerrado`. Un ciclo cerrado no vuelve a abrirse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstadoCiclo {
    Pendiente,
    Activo,
    Cerrado,
}

impl EstadoCiclo {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoCiclo::Pendiente => "pendiente",
            EstadoCiclo::Activo => "activo",
            EstadoCiclo::Cerrado => "cerrado",
        }
    }

    pub fn puede_pasar_a(self, destino: EstadoCiclo) -> bool {
        use EstadoCiclo::*;
        matches!((self, destino), (Pendiente, Activo) | (Pendiente, Cerrado) | (Activo, Cerrado))
    }

    pub fn validar_transicion(self, destino: EstadoCiclo) -> Result<(), SirdsError> {
        if self.puede_pasar_a(destino) {
            Ok(())
        } else {
            Err(SirdsError::validation(format!(
                "no se puede pasar un ciclo de '{}' a '{}'",
                self, destino
            )))
        }
    }
}

/// Estado de un empleado dentro de un ciclo.
///
/// `procesado` pasa a `entregado` o a `omitido`; volver a marcar `entregado`
/// no cambia nada (un empleado recibe varios artículos del kit). Ninguna
/// asignación regresa a `procesado`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstadoEmpleadoCiclo {
    Procesado,
    Entregado,
    Omitido,
}

impl EstadoEmpleadoCiclo {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoEmpleadoCiclo::Procesado => "procesado",
            EstadoEmpleadoCiclo::Entregado => "entregado",
            EstadoEmpleadoCiclo::Omitido => "omitido",
        }
    }

    pub fn puede_pasar_a(self, destino: EstadoEmpleadoCiclo) -> bool {
        use EstadoEmpleadoCiclo::*;
        matches!((self, destino), (Procesado, Entregado) | (Procesado, Omitido) | (Entregado, Entregado))
    }

    pub fn validar_transicion(self, destino: EstadoEmpleadoCiclo) -> Result<(), SirdsError> {
        if self.puede_pasar_a(destino) {
            Ok(())
        } else {
            Err(SirdsError::validation(format!(
                "no se puede pasar una asignación de '{}' a '{}'",
                self, destino
            )))
        }
    }
}

/// Estado de un pedido a proveedor. Pasa a `recibido_parcial` o
/// `recibido_completo` con cada recepción; un pedido completo ya no recibe
/// más.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstadoPedido {
    Enviado,
    RecibidoParcial,
    RecibidoCompleto,
}

impl EstadoPedido {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoPedido::Enviado => "enviado",
            EstadoPedido::RecibidoParcial => "recibido_parcial",
            EstadoPedido::RecibidoCompleto => "recibido_completo",
        }
    }

    pub fn admite_recepcion(self) -> bool {
        self != EstadoPedido::RecibidoCompleto
    }

    /// Estado tras una recepción según lo que queda pendiente.
    pub fn tras_recepcion(pendiente: i64) -> EstadoPedido {
        if pendiente > 0 {
            EstadoPedido::RecibidoParcial
        } else {
            EstadoPedido::RecibidoCompleto
        }
    }
}

/// Situación de una entrega respecto a la siguiente entrega que le toca al
/// empleado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vigencia {
    Vencida,
    Proxima,
    Vigente,
}

impl Vigencia {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vigencia::Vencida => "vencida",
            Vigencia::Proxima => "proxima",
            Vigencia::Vigente => "vigente",
        }
    }

    /// Clasifica una entrega: vencida si la próxima entrega ya pasó, próxima si
    /// cae dentro de `dias_alerta` días, vigente en otro caso.
    pub fn calcular(fecha_entrega: NaiveDate, hoy: NaiveDate, meses: u32, dias_alerta: i64) -> Vigencia {
        let dias = dias_restantes(fecha_entrega, hoy, meses);
        if dias < 0 {
            Vigencia::Vencida
        } else if dias <= dias_alerta {
            Vigencia::Proxima
        } else {
            Vigencia::Vigente
        }
    }
}

/// Fecha en la que corresponde la siguiente entrega.
pub fn proxima_entrega(fecha_entrega: NaiveDate, meses: u32) -> NaiveDate {
    fecha_entrega
        .checked_add_months(Months::new(meses))
        .unwrap_or(NaiveDate::MAX)
}

/// Días que faltan (negativo si ya pasó) para la siguiente entrega.
pub fn dias_restantes(fecha_entrega: NaiveDate, hoy: NaiveDate, meses: u32) -> i64 {
    (proxima_entrega(fecha_entrega, meses) - hoy).num_days()
}

macro_rules! texto_sql {
    ($tipo:ty, $nombre:literal, [$($variante:expr),+]) => {
        impl fmt::Display for $tipo {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $tipo {
            type Err = SirdsError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim().to_lowercase();
                $(
                    if s == $variante.as_str() {
                        return Ok($variante);
                    }
                )+
                Err(SirdsError::validation(format!("{} no válido: '{}'", $nombre, s)))
            }
        }

        impl ToSql for $tipo {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $tipo {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: SirdsError| FromSqlError::Other(e.to_string().into()))
            }
        }
    };
}

texto_sql!(EstadoCiclo, "estado de ciclo", [EstadoCiclo::Pendiente, EstadoCiclo::Activo, EstadoCiclo::Cerrado]);
texto_sql!(
    EstadoEmpleadoCiclo,
    "estado de asignación",
    [EstadoEmpleadoCiclo::Procesado, EstadoEmpleadoCiclo::Entregado, EstadoEmpleadoCiclo::Omitido]
);
texto_sql!(
    EstadoPedido,
    "estado de pedido",
    [EstadoPedido::Enviado, EstadoPedido::RecibidoParcial, EstadoPedido::RecibidoCompleto]
);
texto_sql!(Vigencia, "vigencia", [Vigencia::Vencida, Vigencia::Proxima, Vigencia::Vigente]);

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn ciclo_cerrado_es_terminal() {
        assert!(EstadoCiclo::Pendiente.puede_pasar_a(EstadoCiclo::Activo));
        assert!(EstadoCiclo::Activo.puede_pasar_a(EstadoCiclo::Cerrado));
        assert!(!EstadoCiclo::Cerrado.puede_pasar_a(EstadoCiclo::Activo));
        assert!(!EstadoCiclo::Activo.puede_pasar_a(EstadoCiclo::Pendiente));
        assert!(EstadoCiclo::Cerrado.validar_transicion(EstadoCiclo::Pendiente).is_err());
    }

    #[test]
    fn asignacion_no_vuelve_a_procesado() {
        use EstadoEmpleadoCiclo::*;
        assert!(Procesado.puede_pasar_a(Entregado));
        assert!(Procesado.puede_pasar_a(Omitido));
        assert!(Entregado.puede_pasar_a(Entregado));
        assert!(!Entregado.puede_pasar_a(Procesado));
        assert!(!Omitido.puede_pasar_a(Entregado));
        assert!(!Omitido.puede_pasar_a(Procesado));
    }

    #[test]
    fn parse_ignora_mayusculas() {
        assert_eq!("Activo".parse::<EstadoCiclo>().unwrap(), EstadoCiclo::Activo);
        assert_eq!(" omitido ".parse::<EstadoEmpleadoCiclo>().unwrap(), EstadoEmpleadoCiclo::Omitido);
        assert!("abierto".parse::<EstadoCiclo>().is_err());
    }

    #[test]
    fn pedido_completo_no_recibe_mas() {
        assert!(EstadoPedido::Enviado.admite_recepcion());
        assert!(EstadoPedido::RecibidoParcial.admite_recepcion());
        assert!(!EstadoPedido::RecibidoCompleto.admite_recepcion());
        assert_eq!(EstadoPedido::tras_recepcion(3), EstadoPedido::RecibidoParcial);
        assert_eq!(EstadoPedido::tras_recepcion(0), EstadoPedido::RecibidoCompleto);
        assert_eq!("RECIBIDO_PARCIAL".parse::<EstadoPedido>().unwrap(), EstadoPedido::RecibidoParcial);
    }

    #[test]
    fn vigencia_por_fecha() {
        let hoy = d("2025-06-15");
        // próxima entrega 2025-06-01: ya pasó
        assert_eq!(Vigencia::calcular(d("2025-02-01"), hoy, 4, 30), Vigencia::Vencida);
        // próxima entrega 2025-07-01: dentro de 30 días
        assert_eq!(Vigencia::calcular(d("2025-03-01"), hoy, 4, 30), Vigencia::Proxima);
        // próxima entrega 2025-10-01
        assert_eq!(Vigencia::calcular(d("2025-06-01"), hoy, 4, 30), Vigencia::Vigente);
        // el mismo día de la próxima entrega todavía no está vencida
        assert_eq!(Vigencia::calcular(d("2025-02-15"), hoy, 4, 30), Vigencia::Proxima);
    }
}
