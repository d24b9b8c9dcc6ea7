use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use service::employees::{Employee, EmployeePatch, NewEmployee};

use super::auth::ServerState;
use crate::errors::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub department: Option<String>,
}

#[utoipa::path(get, path = "/employees", tag = "employees",
    params(("department" = Option<String>, Query, description = "Only employees of this department")),
    responses((status = 200, description = "Employees", body = [crate::openapi::EmployeeDoc]), (status = 401, description = "Unauthenticated"), (status = 403, description = "Forbidden")))]
pub async fn list(State(state): State<ServerState>, Query(q): Query<ListQuery>) -> Result<Json<Vec<Employee>>, ApiError> {
    let department = q.department.as_deref().filter(|d| !d.is_empty());
    Ok(Json(state.employees.get_all(department).await?))
}

#[utoipa::path(get, path = "/employees/{id}", tag = "employees",
    params(("id" = String, Path, description = "Employee id")),
    responses((status = 200, description = "Employee", body = crate::openapi::EmployeeDoc), (status = 404, description = "Not found")))]
pub async fn get_one(State(state): State<ServerState>, Path(id): Path<String>) -> Result<Json<Employee>, ApiError> {
    Ok(Json(state.employees.get_employee(&id).await?))
}

#[utoipa::path(post, path = "/employees", tag = "employees", request_body = crate::openapi::EmployeeDoc,
    responses((status = 201, description = "Created", body = crate::openapi::EmployeeDoc), (status = 400, description = "Validation error"), (status = 409, description = "Already exists")))]
pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<NewEmployee>, JsonRejection>,
) -> Result<(StatusCode, Json<Employee>), ApiError> {
    let Json(input) = payload?;
    state.rules.validate_new(&input)?;
    let created = state.employees.add_employee(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(patch, path = "/employees/{id}", tag = "employees",
    params(("id" = String, Path, description = "Employee id")),
    request_body = crate::openapi::EmployeePatchDoc,
    responses((status = 200, description = "Updated", body = crate::openapi::EmployeeDoc), (status = 400, description = "Validation error"), (status = 404, description = "Not found")))]
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Result<Json<EmployeePatch>, JsonRejection>,
) -> Result<Json<Employee>, ApiError> {
    let Json(patch) = payload?;
    state.rules.validate_patch(&patch)?;
    Ok(Json(state.employees.update_employee(&id, patch).await?))
}

#[utoipa::path(delete, path = "/employees/{id}", tag = "employees",
    params(("id" = String, Path, description = "Employee id")),
    responses((status = 200, description = "Deleted record", body = crate::openapi::EmployeeDoc), (status = 404, description = "Not found")))]
pub async fn remove(State(state): State<ServerState>, Path(id): Path<String>) -> Result<Json<Employee>, ApiError> {
    Ok(Json(state.employees.delete_employee(&id).await?))
}
