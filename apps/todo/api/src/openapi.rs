use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Todo API",
        version = "0.1.0",
        description = "Personal task management: accounts, todos with subtasks, categories and statistics"
    ),
    nest(
        (path = "/auth", api = domain_users::handlers::ApiDoc),
        (path = "/todos", api = domain_todos::handlers::ApiDoc),
        (path = "/categories", api = domain_todos::categories::handlers::ApiDoc)
    )
)]
pub struct ApiDoc;
