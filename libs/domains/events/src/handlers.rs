use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, put},
};
use axum_helpers::{
    AdminUser, AuthUser, MessageResponse, UuidPath, ValidatedJson, ValidatedQuery,
    errors::responses::{
        BadRequestResponse, BadRequestValidationResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
};
use domain_users::UserSummary;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::EventResult;
use crate::models::{
    ApproveEvent, CreateEvent, EventPage, EventQuery, EventResponse, EventStatus, PageQuery,
    UpdateEvent,
};
use crate::repository::EventRepository;
use crate::service::EventService;

#[derive(OpenApi)]
#[openapi(
    paths(
        list_events,
        create_event,
        my_events,
        pending_events,
        get_event,
        update_event,
        delete_event,
        approve_event,
        admin_update_event,
        admin_delete_event,
    ),
    components(
        schemas(
            EventResponse,
            EventPage,
            EventStatus,
            CreateEvent,
            UpdateEvent,
            ApproveEvent,
            UserSummary,
            MessageResponse,
        ),
        responses(
            BadRequestResponse,
            BadRequestValidationResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            NotFoundResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Events", description = "Event listings, ownership and admin approval")
    )
)]
pub struct ApiDoc;

/// Create the events router with all HTTP endpoints
pub fn router<R: EventRepository + 'static>(service: EventService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/my-events", get(my_events))
        .route("/pending", get(pending_events))
        .route(
            "/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/{id}/approve", put(approve_event))
        .route("/{id}/admin-edit", put(admin_update_event))
        .route("/{id}/admin-delete", delete(admin_delete_event))
        .with_state(shared_service)
}

/// List events
///
/// Public. When called with a session token every event also carries `hasJoined`.
#[utoipa::path(
    get,
    path = "",
    tag = "Events",
    params(EventQuery),
    responses(
        (status = 200, description = "Page of events", body = EventPage),
        (status = 400, response = BadRequestResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_events<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    viewer: Option<AuthUser>,
    ValidatedQuery(query): ValidatedQuery<EventQuery>,
) -> EventResult<Json<EventPage>> {
    Ok(Json(service.list_events(query, viewer.as_ref()).await?))
}

/// Create an event
///
/// The event stays `pending` until an admin approves it.
#[utoipa::path(
    post,
    path = "",
    tag = "Events",
    request_body = CreateEvent,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_event<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<CreateEvent>,
) -> EventResult<impl IntoResponse> {
    let event = service.create_event(input, &user).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

#[utoipa::path(
    get,
    path = "/my-events",
    tag = "Events",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Events created by the caller", body = Vec<EventResponse>),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn my_events<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    user: AuthUser,
) -> EventResult<Json<Vec<EventResponse>>> {
    Ok(Json(service.list_my_events(&user).await?))
}

#[utoipa::path(
    get,
    path = "/pending",
    tag = "Events",
    params(PageQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Events awaiting approval", body = EventPage),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn pending_events<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    _admin: AdminUser,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> EventResult<Json<EventPage>> {
    Ok(Json(service.list_pending(query.into()).await?))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Events",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event found", body = EventResponse),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_event<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    viewer: Option<AuthUser>,
    UuidPath(id): UuidPath,
) -> EventResult<Json<EventResponse>> {
    Ok(Json(service.get_event(id, viewer.as_ref()).await?))
}

/// Update an event
///
/// Only the owner or an admin may update.
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Events",
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = UpdateEvent,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_event<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    user: AuthUser,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateEvent>,
) -> EventResult<Json<EventResponse>> {
    Ok(Json(service.update_event(id, input, &user).await?))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Events",
    params(("id" = Uuid, Path, description = "Event ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Event deleted", body = MessageResponse),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_event<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    user: AuthUser,
    UuidPath(id): UuidPath,
) -> EventResult<Json<MessageResponse>> {
    service.delete_event(id, &user).await?;
    Ok(Json(MessageResponse::new("Event deleted successfully")))
}

/// Approve or reject a pending event
///
/// Approval notifies every invited user and participant by email.
#[utoipa::path(
    put,
    path = "/{id}/approve",
    tag = "Events",
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = ApproveEvent,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Decision recorded", body = MessageResponse),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn approve_event<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    _admin: AdminUser,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<ApproveEvent>,
) -> EventResult<Json<MessageResponse>> {
    let status = service.approve_event(id, &input.status).await?;
    Ok(Json(MessageResponse::new(format!("Event {}", status))))
}

#[utoipa::path(
    put,
    path = "/{id}/admin-edit",
    tag = "Events",
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = UpdateEvent,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn admin_update_event<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    _admin: AdminUser,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateEvent>,
) -> EventResult<Json<EventResponse>> {
    Ok(Json(service.admin_update_event(id, input).await?))
}

#[utoipa::path(
    delete,
    path = "/{id}/admin-delete",
    tag = "Events",
    params(("id" = Uuid, Path, description = "Event ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Event deleted", body = MessageResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn admin_delete_event<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    _admin: AdminUser,
    UuidPath(id): UuidPath,
) -> EventResult<Json<MessageResponse>> {
    service.admin_delete_event(id).await?;
    Ok(Json(MessageResponse::new("Event deleted successfully by admin")))
}
