use actix_web::{web, HttpResponse};

use crate::api_json::{creado, ok};
use crate::dotaciones;
use crate::error::SirdsError;
use crate::models::{NuevaArea, NuevaCategoria, NuevaTalla, NuevoKit, NuevoProveedor};
use crate::server::AppState;

type Respuesta = Result<HttpResponse, SirdsError>;

pub async fn listar_categorias(state: web::Data<AppState>) -> Respuesta {
    Ok(ok(state.db.run(|c| dotaciones::listar_categorias(c)).await?))
}

pub async fn crear_categoria(state: web::Data<AppState>, body: web::Json<NuevaCategoria>) -> Respuesta {
    let nombre = body.into_inner().nombre_categoria;
    let categoria = state.db.run(move |c| dotaciones::crear_categoria(c, &nombre)).await?;
    Ok(creado(categoria, "Categoría creada"))
}

pub async fn listar_proveedores(state: web::Data<AppState>) -> Respuesta {
    Ok(ok(state.db.run(|c| dotaciones::listar_proveedores(c)).await?))
}

pub async fn crear_proveedor(state: web::Data<AppState>, body: web::Json<NuevoProveedor>) -> Respuesta {
    let nuevo = body.into_inner();
    let proveedor = state.db.run(move |c| dotaciones::crear_proveedor(c, &nuevo)).await?;
    Ok(creado(proveedor, "Proveedor creado"))
}

pub async fn listar_areas(state: web::Data<AppState>) -> Respuesta {
    Ok(ok(state.db.run(|c| dotaciones::listar_areas(c)).await?))
}

pub async fn crear_area(state: web::Data<AppState>, body: web::Json<NuevaArea>) -> Respuesta {
    let nombre = body.into_inner().nombre_area;
    let area = state.db.run(move |c| dotaciones::crear_area(c, &nombre)).await?;
    Ok(creado(area, "Área creada"))
}

pub async fn listar_tallas(state: web::Data<AppState>) -> Respuesta {
    Ok(ok(state.db.run(|c| dotaciones::listar_tallas(c)).await?))
}

pub async fn crear_talla(state: web::Data<AppState>, body: web::Json<NuevaTalla>) -> Respuesta {
    let nueva = body.into_inner();
    let talla = state.db.run(move |c| dotaciones::crear_talla(c, &nueva)).await?;
    Ok(creado(talla, "Talla creada"))
}

/// GET /api/kits/area/{id_area}
pub async fn kit_de_area(state: web::Data<AppState>, path: web::Path<i64>) -> Respuesta {
    let id_area = path.into_inner();
    let kit = state
        .db
        .run(move |c| {
            dotaciones::kit_activo_area(c, id_area)?
                .ok_or_else(|| SirdsError::not_found(format!("el área {} no tiene kit activo", id_area)))
        })
        .await?;
    Ok(ok(kit))
}

/// POST /api/kits
pub async fn crear_kit(state: web::Data<AppState>, body: web::Json<NuevoKit>) -> Respuesta {
    let nuevo = body.into_inner();
    let kit = state.db.run(move |c| dotaciones::crear_kit(c, &nuevo)).await?;
    Ok(creado(kit, "Kit creado"))
}
