use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

use crate::error::SirdsResult;

/// Nombre de la función SQL que pasa un texto a minúsculas con las reglas de
/// Unicode. `LOWER()` de SQLite solo convierte ASCII y deja "MUÑOZ" como
/// "muÑoz".
pub const FN_MINUSCULAS: &str = "minusculas";

/// Esquema completo. Las restricciones declarativas (UNIQUE, FOREIGN KEY,
/// CHECK e índices parciales) sustituyen a los scripts de diagnóstico: una
/// identificación repetida, un par (empleado, ciclo) duplicado, un ciclo
/// huérfano o dos ciclos activos se rechazan al escribir.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS area (
    id_area INTEGER PRIMARY KEY AUTOINCREMENT,
    nombre_area TEXT NOT NULL UNIQUE,
    activo INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS empleado (
    id_empleado INTEGER PRIMARY KEY AUTOINCREMENT,
    identificacion TEXT NOT NULL UNIQUE,
    nombre TEXT NOT NULL,
    apellido TEXT NOT NULL DEFAULT '',
    cargo TEXT,
    id_area INTEGER REFERENCES area(id_area) ON DELETE SET NULL,
    sueldo REAL NOT NULL DEFAULT 0 CHECK (sueldo >= 0),
    fecha_inicio TEXT,
    activo INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS categoria (
    id_categoria INTEGER PRIMARY KEY AUTOINCREMENT,
    nombre_categoria TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS proveedor (
    id_proveedor INTEGER PRIMARY KEY AUTOINCREMENT,
    nombre TEXT NOT NULL,
    telefono TEXT,
    email TEXT
);

CREATE TABLE IF NOT EXISTS dotacion (
    id_dotacion INTEGER PRIMARY KEY AUTOINCREMENT,
    nombre_dotacion TEXT NOT NULL,
    descripcion TEXT,
    id_categoria INTEGER REFERENCES categoria(id_categoria) ON DELETE SET NULL,
    id_proveedor INTEGER REFERENCES proveedor(id_proveedor) ON DELETE SET NULL,
    precio_unitario REAL NOT NULL DEFAULT 0 CHECK (precio_unitario >= 0),
    talla_requerida INTEGER NOT NULL DEFAULT 0,
    unidad_medida TEXT
);

CREATE TABLE IF NOT EXISTS talla (
    id_talla INTEGER PRIMARY KEY AUTOINCREMENT,
    talla TEXT NOT NULL,
    tipo_articulo TEXT
);

CREATE TABLE IF NOT EXISTS kit (
    id_kit INTEGER PRIMARY KEY AUTOINCREMENT,
    nombre TEXT NOT NULL,
    id_area INTEGER NOT NULL REFERENCES area(id_area) ON DELETE CASCADE,
    activo INTEGER NOT NULL DEFAULT 1
);
CREATE UNIQUE INDEX IF NOT EXISTS ux_kit_area_activo ON kit(id_area) WHERE activo = 1;

CREATE TABLE IF NOT EXISTS kit_dotacion (
    id_kit INTEGER NOT NULL REFERENCES kit(id_kit) ON DELETE CASCADE,
    id_dotacion INTEGER NOT NULL REFERENCES dotacion(id_dotacion) ON DELETE CASCADE,
    cantidad INTEGER NOT NULL DEFAULT 1 CHECK (cantidad >= 1),
    PRIMARY KEY (id_kit, id_dotacion)
);

CREATE TABLE IF NOT EXISTS stock (
    id_stock INTEGER PRIMARY KEY AUTOINCREMENT,
    id_dotacion INTEGER NOT NULL REFERENCES dotacion(id_dotacion) ON DELETE CASCADE,
    id_talla INTEGER REFERENCES talla(id_talla) ON DELETE CASCADE,
    id_area INTEGER REFERENCES area(id_area) ON DELETE CASCADE,
    cantidad INTEGER NOT NULL DEFAULT 0 CHECK (cantidad >= 0)
);
CREATE UNIQUE INDEX IF NOT EXISTS ux_stock_item
    ON stock(id_dotacion, IFNULL(id_talla, 0), IFNULL(id_area, 0));

CREATE TABLE IF NOT EXISTS salario_minimo (
    anio INTEGER PRIMARY KEY,
    valor_mensual REAL NOT NULL CHECK (valor_mensual > 0),
    observaciones TEXT,
    fecha_actualizacion TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS ciclo_dotacion (
    id_ciclo INTEGER PRIMARY KEY AUTOINCREMENT,
    nombre_ciclo TEXT NOT NULL,
    fecha_entrega TEXT NOT NULL,
    fecha_inicio_ventana TEXT NOT NULL,
    fecha_fin_ventana TEXT NOT NULL,
    estado TEXT NOT NULL DEFAULT 'pendiente'
        CHECK (estado IN ('pendiente', 'activo', 'cerrado')),
    valor_smlv_aplicado REAL,
    total_empleados_elegibles INTEGER NOT NULL DEFAULT 0,
    observaciones TEXT,
    fecha_creacion TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    CHECK (fecha_inicio_ventana <= fecha_fin_ventana)
);
CREATE UNIQUE INDEX IF NOT EXISTS ux_ciclo_unico_activo
    ON ciclo_dotacion(estado) WHERE estado = 'activo';

CREATE TABLE IF NOT EXISTS empleado_ciclo (
    id_empleado_ciclo INTEGER PRIMARY KEY AUTOINCREMENT,
    id_empleado INTEGER NOT NULL REFERENCES empleado(id_empleado) ON DELETE CASCADE,
    id_ciclo INTEGER NOT NULL REFERENCES ciclo_dotacion(id_ciclo) ON DELETE CASCADE,
    id_kit INTEGER REFERENCES kit(id_kit) ON DELETE SET NULL,
    id_area INTEGER NOT NULL REFERENCES area(id_area),
    estado TEXT NOT NULL DEFAULT 'procesado'
        CHECK (estado IN ('procesado', 'entregado', 'omitido')),
    fecha_asignacion TEXT NOT NULL,
    fecha_entrega_real TEXT,
    sueldo_al_momento REAL,
    observaciones TEXT,
    actualizado_por TEXT,
    fecha_actualizacion TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (id_empleado, id_ciclo)
);

CREATE TABLE IF NOT EXISTS entrega (
    id_entrega INTEGER PRIMARY KEY AUTOINCREMENT,
    id_empleado INTEGER NOT NULL REFERENCES empleado(id_empleado) ON DELETE CASCADE,
    id_empleado_ciclo INTEGER REFERENCES empleado_ciclo(id_empleado_ciclo) ON DELETE SET NULL,
    id_dotacion INTEGER NOT NULL REFERENCES dotacion(id_dotacion),
    id_talla INTEGER REFERENCES talla(id_talla),
    cantidad INTEGER NOT NULL CHECK (cantidad >= 1),
    fecha_entrega TEXT NOT NULL,
    observaciones TEXT
);
CREATE INDEX IF NOT EXISTS ix_entrega_fecha ON entrega(fecha_entrega);

CREATE TABLE IF NOT EXISTS empleado_talla (
    id_empleado INTEGER NOT NULL REFERENCES empleado(id_empleado) ON DELETE CASCADE,
    id_dotacion INTEGER NOT NULL REFERENCES dotacion(id_dotacion) ON DELETE CASCADE,
    id_talla INTEGER NOT NULL REFERENCES talla(id_talla) ON DELETE CASCADE,
    fecha_actualizacion TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (id_empleado, id_dotacion)
);

CREATE TABLE IF NOT EXISTS pedido (
    id_pedido INTEGER PRIMARY KEY AUTOINCREMENT,
    id_ciclo INTEGER REFERENCES ciclo_dotacion(id_ciclo) ON DELETE SET NULL,
    fecha TEXT NOT NULL,
    estado TEXT NOT NULL DEFAULT 'enviado'
        CHECK (estado IN ('enviado', 'recibido_parcial', 'recibido_completo')),
    observaciones TEXT,
    total_pedido REAL NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS detalle_pedido (
    id_detalle INTEGER PRIMARY KEY AUTOINCREMENT,
    id_pedido INTEGER NOT NULL REFERENCES pedido(id_pedido) ON DELETE CASCADE,
    id_dotacion INTEGER NOT NULL REFERENCES dotacion(id_dotacion),
    id_talla INTEGER REFERENCES talla(id_talla),
    cantidad_requerida INTEGER NOT NULL CHECK (cantidad_requerida >= 1),
    stock_disponible INTEGER NOT NULL DEFAULT 0 CHECK (stock_disponible >= 0),
    cantidad_solicitada INTEGER NOT NULL CHECK (cantidad_solicitada >= 1),
    cantidad_recibida INTEGER NOT NULL DEFAULT 0
        CHECK (cantidad_recibida >= 0 AND cantidad_recibida <= cantidad_solicitada),
    precio_unitario REAL NOT NULL DEFAULT 0,
    subtotal REAL NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS recepcion_pedido (
    id_recepcion INTEGER PRIMARY KEY AUTOINCREMENT,
    id_pedido INTEGER NOT NULL REFERENCES pedido(id_pedido) ON DELETE CASCADE,
    id_proveedor INTEGER REFERENCES proveedor(id_proveedor) ON DELETE SET NULL,
    documento_referencia TEXT,
    fecha_recepcion TEXT NOT NULL,
    observaciones TEXT,
    usuario_registro TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS detalle_recepcion (
    id_recepcion_detalle INTEGER PRIMARY KEY AUTOINCREMENT,
    id_recepcion INTEGER NOT NULL REFERENCES recepcion_pedido(id_recepcion) ON DELETE CASCADE,
    id_detalle INTEGER NOT NULL REFERENCES detalle_pedido(id_detalle) ON DELETE CASCADE,
    cantidad_recibida INTEGER NOT NULL CHECK (cantidad_recibida >= 1)
);

CREATE TABLE IF NOT EXISTS historial_movimientos (
    id_movimiento INTEGER PRIMARY KEY AUTOINCREMENT,
    tabla_modificada TEXT NOT NULL,
    id_registro INTEGER NOT NULL,
    tipo_movimiento TEXT NOT NULL,
    fecha_movimiento TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    usuario_responsable TEXT NOT NULL,
    detalle_cambio TEXT
);
";

/// Registra en la conexión las funciones SQL propias de SIRDS.
pub fn registrar_funciones(conn: &Connection) -> SirdsResult<()> {
    conn.create_scalar_function(
        FN_MINUSCULAS,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let texto: Option<String> = ctx.get(0)?;
            Ok(texto.map(|t| t.to_lowercase()))
        },
    )?;
    Ok(())
}

/// Activa las claves foráneas, registra las funciones y crea las tablas que
/// falten.
pub fn init_schema(conn: &Connection) -> SirdsResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    registrar_funciones(conn)?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'empleado_ciclo'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn minusculas_cubre_tildes_y_enie() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let (propia, nativa): (String, String) = conn
            .query_row("SELECT minusculas('JOSÉ MUÑOZ'), LOWER('JOSÉ MUÑOZ')", [], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap();
        assert_eq!(propia, "josé muñoz");
        assert_ne!(nativa, propia);
        let nulo: Option<String> = conn.query_row("SELECT minusculas(NULL)", [], |r| r.get(0)).unwrap();
        assert!(nulo.is_none());
    }

    #[test]
    fn only_one_active_cycle_allowed() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let insert = "INSERT INTO ciclo_dotacion (nombre_ciclo, fecha_entrega, fecha_inicio_ventana, fecha_fin_ventana, estado)
                      VALUES (?1, '2025-01-31', '2025-01-01', '2025-01-31', 'activo')";
        conn.execute(insert, ["A"]).unwrap();
        assert!(conn.execute(insert, ["B"]).is_err());
    }
}
