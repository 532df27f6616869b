pub mod schema;

use rusqlite::{Connection, OpenFlags};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::fmt;

use crate::error::{SirdsError, SirdsResult};

pub use schema::init_schema;

/// Destino de la base de datos resuelto a partir de `SIRDS_DB_URL`.
#[derive(Debug, Clone, PartialEq)]
pub enum DbTarget {
    Memoria,
    Archivo(PathBuf),
}

/// Interpreta la URL de la base de datos. Acepta `sqlite://`, `file://`,
/// rutas simples y `:memory:`; cualquier otro esquema se rechaza.
pub fn resolve_db_target(url: &str) -> SirdsResult<DbTarget> {
    let url = url.trim();
    if url.is_empty() || url == ":memory:" || url == "sqlite::memory:" {
        return Ok(DbTarget::Memoria);
    }
    if let Some(path) = url.strip_prefix("sqlite://") {
        return Ok(DbTarget::Archivo(PathBuf::from(path)));
    }
    if let Some(path) = url.strip_prefix("file://") {
        return Ok(DbTarget::Archivo(PathBuf::from(path)));
    }
    if url.contains("://") {
        return Err(SirdsError::validation(format!("SIRDS_DB_URL usa un esquema no soportado: {}", url)));
    }
    Ok(DbTarget::Archivo(PathBuf::from(url)))
}

/// Abre la base en solo lectura y sin aplicar el esquema, para inspeccionar
/// bases heredadas que no cumplen las restricciones actuales.
pub fn open_read_only(url: &str) -> SirdsResult<Connection> {
    match resolve_db_target(url)? {
        DbTarget::Memoria => {
            let conn = Connection::open_in_memory()?;
            init_schema(&conn)?;
            Ok(conn)
        }
        DbTarget::Archivo(path) => {
            if !path.exists() {
                return Err(SirdsError::not_found(format!("no existe la base {}", path.display())));
            }
            Ok(Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?)
        }
    }
}

/// Manejador compartido de la base de datos.
///
/// Una sola conexión protegida por un `Mutex`; los handlers HTTP la usan a
/// través de [`Db::run`], que ejecuta el trabajo en el pool bloqueante de
/// actix para no detener el runtime.
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Db(..)")
    }
}

impl Db {
    /// Abre (o crea) la base de datos indicada y aplica el esquema.
    pub fn open(url: &str) -> SirdsResult<Db> {
        let conn = match resolve_db_target(url)? {
            DbTarget::Memoria => Connection::open_in_memory()?,
            DbTarget::Archivo(path) => {
                if let Some(dir) = path.parent() {
                    if !dir.as_os_str().is_empty() && !dir.exists() {
                        fs::create_dir_all(dir)
                            .map_err(|e| SirdsError::Internal(format!("no se pudo crear {}: {}", dir.display(), e)))?;
                    }
                }
                log::info!("abriendo base de datos en {}", path.display());
                Connection::open(path)?
            }
        };
        Db::from_connection(conn)
    }

    pub fn open_in_memory() -> SirdsResult<Db> {
        Db::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> SirdsResult<Db> {
        init_schema(&conn)?;
        Ok(Db { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Ejecuta `f` con la conexión bloqueada en el hilo actual.
    ///
    /// Si una operación anterior entró en pánico con el bloqueo tomado, la
    /// conexión se recupera: la transacción abierta ya se deshizo al soltarse
    /// y SQLite sigue en un estado consistente.
    pub fn with_conn<T, F>(&self, f: F) -> SirdsResult<T>
    where
        F: FnOnce(&mut Connection) -> SirdsResult<T>,
    {
        let mut guard = self.conn.lock().unwrap_or_else(|envenenado| {
            log::error!("una operación anterior entró en pánico con la conexión tomada; se recupera la conexión");
            self.conn.clear_poison();
            envenenado.into_inner()
        });
        f(&mut *guard)
    }

    /// Versión asíncrona de [`Db::with_conn`] para los handlers.
    pub async fn run<T, F>(&self, f: F) -> SirdsResult<T>
    where
        F: FnOnce(&mut Connection) -> SirdsResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        actix_web::web::block(move || db.with_conn(f)).await?
    }
}
