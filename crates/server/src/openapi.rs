use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct LoginUserDoc { pub email: String, pub role: String }

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct LoginResponse { pub access_token: String, pub user: LoginUserDoc }

/// Employee record; `id` is generated when omitted on create.
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct EmployeeDoc {
    pub id: Option<String>,
    pub full_name: String,
    pub avatar: String,
    pub department: String,
    #[schema(example = "1990-05-20")]
    pub birth_date: String,
    pub salary: i64,
}

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct EmployeePatchDoc {
    pub full_name: Option<String>,
    pub avatar: Option<String>,
    pub department: Option<String>,
    pub birth_date: Option<String>,
    pub salary: Option<i64>,
}

#[derive(ToSchema)]
pub struct ErrorBodyDoc { pub name: String, pub message: String, pub status: u16 }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::employees::list,
        crate::routes::employees::get_one,
        crate::routes::employees::create,
        crate::routes::employees::update,
        crate::routes::employees::remove,
    ),
    components(
        schemas(
            HealthResponse,
            LoginRequest,
            LoginUserDoc,
            LoginResponse,
            EmployeeDoc,
            EmployeePatchDoc,
            ErrorBodyDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "employees")
    )
)]
pub struct ApiDoc;
