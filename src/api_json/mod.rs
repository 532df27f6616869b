//! Envoltura JSON común a todas las respuestas de la API.
//!
//! ```json
//! { "success": true, "data": { ... }, "message": "opcional" }
//! { "success": false, "message": "descripción del error" }
//! ```

use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse { success: true, data: Some(data), message: None }
    }

    pub fn con_mensaje(data: T, message: impl Into<String>) -> Self {
        ApiResponse { success: true, data: Some(data), message: Some(message.into()) }
    }
}

impl ApiResponse<()> {
    pub fn mensaje(message: impl Into<String>) -> Self {
        ApiResponse { success: true, data: None, message: Some(message.into()) }
    }

    pub fn fallo(message: impl Into<String>) -> Self {
        ApiResponse { success: false, data: None, message: Some(message.into()) }
    }
}

/// 200 con `data`.
pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(data))
}

/// 201 con `data` y un mensaje para el usuario.
pub fn creado<T: Serialize>(data: T, message: impl Into<String>) -> HttpResponse {
    HttpResponse::Created().json(ApiResponse::con_mensaje(data, message))
}

/// 200 con `data` y un mensaje para el usuario.
pub fn ok_con_mensaje<T: Serialize>(data: T, message: impl Into<String>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::con_mensaje(data, message))
}
