use rusqlite::{params, Connection};

use crate::error::SirdsResult;
use crate::models::{requerido, Area, Categoria, NuevoProveedor, NuevaTalla, Proveedor, Talla};

pub fn listar_areas(conn: &Connection) -> SirdsResult<Vec<Area>> {
    let mut stmt = conn.prepare("SELECT id_area, nombre_area, activo FROM area ORDER BY nombre_area")?;
    let rows = stmt.query_map([], Area::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn crear_area(conn: &Connection, nombre_area: &str) -> SirdsResult<Area> {
    let nombre = requerido(nombre_area, "nombre_area")?;
    conn.execute("INSERT INTO area (nombre_area) VALUES (?1)", [&nombre])?;
    Ok(Area { id_area: conn.last_insert_rowid(), nombre_area: nombre, activo: true })
}

pub fn listar_categorias(conn: &Connection) -> SirdsResult<Vec<Categoria>> {
    let mut stmt = conn.prepare("SELECT id_categoria, nombre_categoria FROM categoria ORDER BY nombre_categoria")?;
    let rows = stmt.query_map([], |r| {
        Ok(Categoria { id_categoria: r.get(0)?, nombre_categoria: r.get(1)? })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn crear_categoria(conn: &Connection, nombre_categoria: &str) -> SirdsResult<Categoria> {
    let nombre = requerido(nombre_categoria, "nombre_categoria")?;
    conn.execute("INSERT INTO categoria (nombre_categoria) VALUES (?1)", [&nombre])?;
    Ok(Categoria { id_categoria: conn.last_insert_rowid(), nombre_categoria: nombre })
}

pub fn listar_proveedores(conn: &Connection) -> SirdsResult<Vec<Proveedor>> {
    let mut stmt = conn.prepare("SELECT id_proveedor, nombre, telefono, email FROM proveedor ORDER BY nombre")?;
    let rows = stmt.query_map([], |r| {
        Ok(Proveedor {
            id_proveedor: r.get(0)?,
            nombre: r.get(1)?,
            telefono: r.get(2)?,
            email: r.get(3)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn crear_proveedor(conn: &Connection, nuevo: &NuevoProveedor) -> SirdsResult<Proveedor> {
    let nombre = requerido(&nuevo.nombre, "nombre")?;
    conn.execute(
        "INSERT INTO proveedor (nombre, telefono, email) VALUES (?1, ?2, ?3)",
        params![nombre, nuevo.telefono, nuevo.email],
    )?;
    Ok(Proveedor {
        id_proveedor: conn.last_insert_rowid(),
        nombre,
        telefono: nuevo.telefono.clone(),
        email: nuevo.email.clone(),
    })
}

pub fn listar_tallas(conn: &Connection) -> SirdsResult<Vec<Talla>> {
    let mut stmt = conn.prepare("SELECT id_talla, talla, tipo_articulo FROM talla ORDER BY tipo_articulo, talla")?;
    let rows = stmt.query_map([], |r| {
        Ok(Talla { id_talla: r.get(0)?, talla: r.get(1)?, tipo_articulo: r.get(2)? })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn crear_talla(conn: &Connection, nueva: &NuevaTalla) -> SirdsResult<Talla> {
    let talla = requerido(&nueva.talla, "talla")?;
    conn.execute(
        "INSERT INTO talla (talla, tipo_articulo) VALUES (?1, ?2)",
        params![talla, nueva.tipo_articulo],
    )?;
    Ok(Talla { id_talla: conn.last_insert_rowid(), talla, tipo_articulo: nueva.tipo_articulo.clone() })
}

pub fn existe_talla(conn: &Connection, id_talla: i64) -> SirdsResult<bool> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM talla WHERE id_talla = ?1", [id_talla], |r| r.get(0))?;
    Ok(n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::error::SirdsError;

    #[test]
    fn area_duplicada_es_conflicto() {
        let c = Connection::open_in_memory().unwrap();
        init_schema(&c).unwrap();
        crear_area(&c, "Producción").unwrap();
        assert!(matches!(crear_area(&c, "Producción"), Err(SirdsError::Conflict(_))));
        assert!(matches!(crear_area(&c, "   "), Err(SirdsError::Validation(_))));
        assert_eq!(listar_areas(&c).unwrap().len(), 1);
    }
}
