use std::env;

/// Configuración del servidor, leída de variables de entorno (y de `.env` si
/// existe).
#[derive(Debug, Clone)]
pub struct Config {
    /// Dirección de escucha del servidor HTTP (`SIRDS_BIND`).
    pub bind: String,
    /// URL de la base de datos (`SIRDS_DB_URL`): `sqlite://ruta`, `file://ruta`,
    /// una ruta simple o `:memory:`.
    pub db_url: String,
    /// Origen permitido por CORS para el dashboard (`SIRDS_CORS_ORIGIN`).
    pub cors_origin: String,
    /// Meses entre una entrega y la siguiente (`SIRDS_PROXIMA_ENTREGA_MESES`).
    pub proxima_entrega_meses: u32,
    /// Días de anticipación para marcar una entrega como próxima (`SIRDS_DIAS_ALERTA`).
    pub dias_alerta: i64,
    /// Tamaño máximo de página en los listados (`SIRDS_LIMITE_PAGINA`).
    pub limite_pagina: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: "127.0.0.1:3001".to_string(),
            db_url: "sqlite://data/sirds.db".to_string(),
            cors_origin: "http://localhost:5173".to_string(),
            proxima_entrega_meses: 4,
            dias_alerta: 30,
            limite_pagina: 100,
        }
    }
}

impl Config {
    /// Carga `.env` (si existe) y luego lee las variables `SIRDS_*`.
    pub fn from_env() -> Self {
        let _ = dotenv::dotenv();
        Self::from_lookup(|k| env::var(k).ok())
    }

    /// Construye la configuración a partir de una función de búsqueda; permite
    /// probar el parseo sin tocar el entorno del proceso.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let text = |key: &str, default: String| -> String {
            match lookup(key) {
                Some(v) if !v.trim().is_empty() => v.trim().to_string(),
                _ => default,
            }
        };

        Config {
            bind: text("SIRDS_BIND", defaults.bind),
            db_url: text("SIRDS_DB_URL", defaults.db_url),
            cors_origin: text("SIRDS_CORS_ORIGIN", defaults.cors_origin),
            proxima_entrega_meses: parse_or(&lookup, "SIRDS_PROXIMA_ENTREGA_MESES", defaults.proxima_entrega_meses),
            dias_alerta: parse_or(&lookup, "SIRDS_DIAS_ALERTA", defaults.dias_alerta),
            limite_pagina: parse_or(&lookup, "SIRDS_LIMITE_PAGINA", defaults.limite_pagina).max(1),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                log::warn!("{}='{}' no es válido, se usa {}", key, raw, default);
                default
            }
        },
        None => default,
    }
}
