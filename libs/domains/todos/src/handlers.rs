use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use axum_helpers::{
    AuditEvent, AuditOutcome, AuthUser, IdPath, ValidatedJson, ValidatedQuery,
    errors::responses::{
        BadRequestPathResponse, BadRequestValidationResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
    extract_ip_from_headers, extract_user_agent,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::TodoResult;
use crate::models::{
    BatchDelete, BatchResult, BatchUpdate, CreateSubTask, CreateTodo, Priority, PriorityStats,
    Statistics, SubTask, Todo, TodoFilter, UpdateSubTask, UpdateTodo,
};
use crate::repository::TodoRepository;
use crate::service::TodoService;

const TAG: &str = "todos";

/// OpenAPI documentation for the todo endpoints
#[derive(OpenApi)]
#[openapi(
    paths(
        list_todos,
        create_todo,
        statistics,
        get_todo,
        update_todo,
        delete_todo,
        toggle_todo,
        batch_delete,
        batch_update,
        create_subtask,
        update_subtask,
        toggle_subtask,
        delete_subtask,
    ),
    components(
        schemas(
            Todo,
            SubTask,
            Priority,
            CreateTodo,
            CreateSubTask,
            UpdateTodo,
            UpdateSubTask,
            BatchDelete,
            BatchUpdate,
            BatchResult,
            Statistics,
            PriorityStats
        ),
        responses(
            NotFoundResponse,
            ForbiddenResponse,
            UnauthorizedResponse,
            BadRequestValidationResponse,
            BadRequestPathResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Todos, subtasks, batch operations and statistics")
    )
)]
pub struct ApiDoc;

/// Create the todo router. Mount it under `/todos` behind the auth gate.
pub fn router<R: TodoRepository + 'static>(service: TodoService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_todos).post(create_todo))
        .route("/statistics", get(statistics))
        .route("/batch", delete(batch_delete))
        .route("/batch/update", patch(batch_update))
        .route("/subtasks/{id}", patch(update_subtask).delete(delete_subtask))
        .route("/subtasks/{id}/toggle", patch(toggle_subtask))
        .route(
            "/{id}",
            get(get_todo).patch(update_todo).delete(delete_todo),
        )
        .route("/{id}/toggle", patch(toggle_todo))
        .route("/{id}/subtasks", post(create_subtask))
        .with_state(shared_service)
}

/// List the caller's todos, newest first
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    params(TodoFilter),
    responses(
        (status = 200, description = "Matching todos", body = Vec<Todo>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_todos<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    user: AuthUser,
    ValidatedQuery(filter): ValidatedQuery<TodoFilter>,
) -> TodoResult<Json<Vec<Todo>>> {
    let todos = service.list(user.id, filter).await?;
    Ok(Json(todos))
}

/// Create a todo, optionally with subtasks
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = CreateTodo,
    responses(
        (status = 201, description = "Todo created", body = Todo),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_todo<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<CreateTodo>,
) -> TodoResult<impl IntoResponse> {
    let todo = service.create(user.id, input).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

/// Totals, completion rate, priority split and overdue count
#[utoipa::path(
    get,
    path = "/statistics",
    tag = TAG,
    responses(
        (status = 200, description = "Statistics over the caller's todos", body = Statistics),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn statistics<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    user: AuthUser,
) -> TodoResult<Json<Statistics>> {
    let stats = service.statistics(user.id).await?;
    Ok(Json(stats))
}

/// Get a todo by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = i32, Path, description = "Todo ID")
    ),
    responses(
        (status = 200, description = "Todo found", body = Todo),
        (status = 400, response = BadRequestPathResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_todo<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    user: AuthUser,
    IdPath(id): IdPath,
) -> TodoResult<Json<Todo>> {
    let todo = service.get(user.id, id).await?;
    Ok(Json(todo))
}

/// Partially update a todo
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = i32, Path, description = "Todo ID")
    ),
    request_body = UpdateTodo,
    responses(
        (status = 200, description = "Todo updated", body = Todo),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_todo<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    user: AuthUser,
    IdPath(id): IdPath,
    ValidatedJson(changes): ValidatedJson<UpdateTodo>,
) -> TodoResult<Json<Todo>> {
    let todo = service.update(user.id, id, changes).await?;
    Ok(Json(todo))
}

/// Delete a todo with its subtasks and child todos
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = i32, Path, description = "Todo ID")
    ),
    responses(
        (status = 204, description = "Todo deleted"),
        (status = 400, response = BadRequestPathResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_todo<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    headers: HeaderMap,
    user: AuthUser,
    IdPath(id): IdPath,
) -> TodoResult<StatusCode> {
    service.delete(user.id, id).await?;

    AuditEvent::new(
        Some(user.id),
        "todo.delete",
        Some(format!("todo:{}", id)),
        AuditOutcome::Success,
    )
    .with_ip(extract_ip_from_headers(&headers))
    .with_user_agent(extract_user_agent(&headers))
    .log();

    Ok(StatusCode::NO_CONTENT)
}

/// Flip the completion flag of a todo
#[utoipa::path(
    patch,
    path = "/{id}/toggle",
    tag = TAG,
    params(
        ("id" = i32, Path, description = "Todo ID")
    ),
    responses(
        (status = 200, description = "Todo toggled", body = Todo),
        (status = 400, response = BadRequestPathResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn toggle_todo<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    user: AuthUser,
    IdPath(id): IdPath,
) -> TodoResult<Json<Todo>> {
    let todo = service.toggle(user.id, id).await?;
    Ok(Json(todo))
}

/// Delete several of the caller's todos
#[utoipa::path(
    delete,
    path = "/batch",
    tag = TAG,
    request_body = BatchDelete,
    responses(
        (status = 200, description = "Number of deleted todos", body = BatchResult),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn batch_delete<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    headers: HeaderMap,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<BatchDelete>,
) -> TodoResult<Json<BatchResult>> {
    let requested = input.ids.clone();
    let result = service.batch_delete(user.id, input.ids).await?;

    AuditEvent::new(
        Some(user.id),
        "todo.batch_delete",
        None,
        AuditOutcome::Success,
    )
    .with_ip(extract_ip_from_headers(&headers))
    .with_user_agent(extract_user_agent(&headers))
    .with_details(json!({ "ids": requested, "affected": result.affected }))
    .log();

    Ok(Json(result))
}

/// Apply the same changes to several of the caller's todos
#[utoipa::path(
    patch,
    path = "/batch/update",
    tag = TAG,
    request_body = BatchUpdate,
    responses(
        (status = 200, description = "Number of updated todos", body = BatchResult),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn batch_update<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<BatchUpdate>,
) -> TodoResult<Json<BatchResult>> {
    let result = service
        .batch_update(user.id, input.ids, input.changes)
        .await?;
    Ok(Json(result))
}

/// Add a subtask to a todo
#[utoipa::path(
    post,
    path = "/{id}/subtasks",
    tag = TAG,
    params(
        ("id" = i32, Path, description = "Todo ID")
    ),
    request_body = CreateSubTask,
    responses(
        (status = 201, description = "Subtask created", body = SubTask),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_subtask<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    user: AuthUser,
    IdPath(todo_id): IdPath,
    ValidatedJson(input): ValidatedJson<CreateSubTask>,
) -> TodoResult<impl IntoResponse> {
    let subtask = service.create_subtask(user.id, todo_id, input).await?;
    Ok((StatusCode::CREATED, Json(subtask)))
}

/// Partially update a subtask
#[utoipa::path(
    patch,
    path = "/subtasks/{id}",
    tag = TAG,
    params(
        ("id" = i32, Path, description = "Subtask ID")
    ),
    request_body = UpdateSubTask,
    responses(
        (status = 200, description = "Subtask updated", body = SubTask),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_subtask<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    user: AuthUser,
    IdPath(id): IdPath,
    ValidatedJson(changes): ValidatedJson<UpdateSubTask>,
) -> TodoResult<Json<SubTask>> {
    let subtask = service.update_subtask(user.id, id, changes).await?;
    Ok(Json(subtask))
}

/// Flip the completion flag of a subtask
#[utoipa::path(
    patch,
    path = "/subtasks/{id}/toggle",
    tag = TAG,
    params(
        ("id" = i32, Path, description = "Subtask ID")
    ),
    responses(
        (status = 200, description = "Subtask toggled", body = SubTask),
        (status = 400, response = BadRequestPathResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn toggle_subtask<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    user: AuthUser,
    IdPath(id): IdPath,
) -> TodoResult<Json<SubTask>> {
    let subtask = service.toggle_subtask(user.id, id).await?;
    Ok(Json(subtask))
}

/// Delete a subtask
#[utoipa::path(
    delete,
    path = "/subtasks/{id}",
    tag = TAG,
    params(
        ("id" = i32, Path, description = "Subtask ID")
    ),
    responses(
        (status = 204, description = "Subtask deleted"),
        (status = 400, response = BadRequestPathResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_subtask<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    user: AuthUser,
    IdPath(id): IdPath,
) -> TodoResult<StatusCode> {
    service.delete_subtask(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
