#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use axum::Json;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::models::{
    account::{Account, LoginRequest, RegisterRequest},
    medicine::{CreateMedicineRequest, Medicine, UpdateMedicineRequest},
    StatusResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        register_doc,
        login_doc,
        verify_login_doc,
        logout_doc,
        create_medicine_doc,
        list_medicines_doc,
        update_medicine_doc,
        delete_medicine_doc
    ),
    components(
        schemas(
            // auth
            Account,
            RegisterRequest,
            LoginRequest,
            StatusResponse,
            // medicine
            Medicine,
            CreateMedicineRequest,
            UpdateMedicineRequest
        )
    ),
    modifiers(&SecuritySchemes),
    tags(
        (name = "Auth", description = "Registration and passwordless login"),
        (name = "Medicine", description = "Medicine records of the signed-in account")
    ),
    security(("SessionCookie" = []))
)]
pub struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("token"))),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created and login link mailed", body = Account),
        (status = 409, description = "Email already registered"),
        (status = 502, description = "Login link could not be delivered")
    ),
    tag = "Auth",
    security(())
)]
fn register_doc() {}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login link mailed", body = Account),
        (status = 404, description = "No account with that email")
    ),
    tag = "Auth",
    security(())
)]
fn login_doc() {}

#[utoipa::path(
    get,
    path = "/login/{token}",
    params(("token" = String, Path, description = "Token from the mailed link")),
    responses(
        (status = 200, description = "Session cookie set", body = StatusResponse),
        (status = 400, description = "Expired or malformed token"),
        (status = 401, description = "Signature invalid")
    ),
    tag = "Auth",
    security(())
)]
fn verify_login_doc() {}

#[utoipa::path(
    get,
    path = "/logout",
    responses((status = 200, description = "Session cookie cleared", body = StatusResponse)),
    tag = "Auth"
)]
fn logout_doc() {}

#[utoipa::path(
    post,
    path = "/medicine",
    request_body = CreateMedicineRequest,
    responses((status = 200, body = Medicine)),
    tag = "Medicine"
)]
fn create_medicine_doc() {}

#[utoipa::path(
    get,
    path = "/medicine/{userId}",
    params(("userId" = String, Path, description = "Account id")),
    responses((status = 200, body = [Medicine])),
    tag = "Medicine"
)]
fn list_medicines_doc() {}

#[utoipa::path(
    put,
    path = "/medicine",
    request_body = UpdateMedicineRequest,
    responses((status = 200, body = Medicine), (status = 404, description = "Unknown medicine")),
    tag = "Medicine"
)]
fn update_medicine_doc() {}

#[utoipa::path(
    delete,
    path = "/medicine/{id}",
    params(("id" = String, Path, description = "Medicine id")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Unknown medicine")),
    tag = "Medicine"
)]
fn delete_medicine_doc() {}
