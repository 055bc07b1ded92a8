use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use axum_helpers::{
    AuthUser, MessageResponse, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestResponse, BadRequestValidationResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
};
use domain_users::UserSummary;
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::ParticipantResult;
use crate::models::{
    EventSummary, InvitationAction, InvitationResponse, InvitationStatus, InviteUser, JoinEvent,
    ParticipantResponse, RespondToInvitation,
};
use crate::repository::ParticipantRepository;
use crate::service::ParticipantService;

#[derive(OpenApi)]
#[openapi(
    paths(
        join_event,
        participant_invitations,
        send_invitation,
        accept_invitation,
        decline_invitation,
        joined_events,
        list_participants,
        leave_event,
    ),
    components(
        schemas(
            JoinEvent,
            InviteUser,
            InvitationAction,
            ParticipantResponse,
            InvitationResponse,
            InvitationStatus,
            EventSummary,
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
        (name = "Participants", description = "Joining, leaving and answering invitations")
    )
)]
pub struct ApiDoc;

#[derive(OpenApi)]
#[openapi(
    paths(invite_user, respond_to_invitation, my_invitations),
    components(
        schemas(
            InviteUser,
            RespondToInvitation,
            InvitationResponse,
            InvitationStatus,
            EventSummary,
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
        (name = "Invitations", description = "Inviting users to owned events")
    )
)]
pub struct InvitationsApiDoc;

type SharedService<R> = Arc<ParticipantService<R>>;

/// Routes mounted under `/participants`
pub fn router<R: ParticipantRepository + 'static>(service: ParticipantService<R>) -> Router {
    Router::new()
        .route("/join", post(join_event))
        .route("/my-invitations", get(participant_invitations))
        .route("/send-invitation", post(send_invitation))
        .route("/accept-invitation", post(accept_invitation))
        .route("/decline-invitation", post(decline_invitation))
        .route("/joined-events", get(joined_events))
        .route("/{event_id}", get(list_participants))
        .route("/{event_id}/leave", delete(leave_event))
        .with_state(Arc::new(service))
}

/// Routes mounted under `/invitations`
pub fn invitations_router<R: ParticipantRepository + 'static>(
    service: ParticipantService<R>,
) -> Router {
    Router::new()
        .route("/invite", post(invite_user))
        .route("/respond", put(respond_to_invitation))
        .route("/my-invitations", get(my_invitations))
        .with_state(Arc::new(service))
}

/// Join an upcoming event
#[utoipa::path(
    post,
    path = "/join",
    tag = "Participants",
    request_body = JoinEvent,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Joined", body = MessageResponse),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn join_event<R: ParticipantRepository>(
    State(service): State<SharedService<R>>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<JoinEvent>,
) -> ParticipantResult<impl IntoResponse> {
    service.join(input.event_id, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Successfully joined event")),
    ))
}

#[utoipa::path(
    get,
    path = "/my-invitations",
    tag = "Participants",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending invitations to upcoming events", body = Vec<InvitationResponse>),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn participant_invitations<R: ParticipantRepository>(
    State(service): State<SharedService<R>>,
    user: AuthUser,
) -> ParticipantResult<Json<Vec<InvitationResponse>>> {
    Ok(Json(service.my_invitations(&user).await?))
}

#[utoipa::path(
    post,
    path = "/send-invitation",
    tag = "Participants",
    request_body = InviteUser,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Invitation created", body = MessageResponse),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn send_invitation<R: ParticipantRepository>(
    State(service): State<SharedService<R>>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<InviteUser>,
) -> ParticipantResult<impl IntoResponse> {
    invite(&service, input, &user).await
}

#[utoipa::path(
    post,
    path = "/accept-invitation",
    tag = "Participants",
    request_body = InvitationAction,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Invitation accepted", body = MessageResponse),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn accept_invitation<R: ParticipantRepository>(
    State(service): State<SharedService<R>>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<InvitationAction>,
) -> ParticipantResult<Json<MessageResponse>> {
    let row = service.accept(input.invitation_id, &user).await?;
    Ok(Json(answered(row.invitation_status)))
}

#[utoipa::path(
    post,
    path = "/decline-invitation",
    tag = "Participants",
    request_body = InvitationAction,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Invitation declined", body = MessageResponse),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn decline_invitation<R: ParticipantRepository>(
    State(service): State<SharedService<R>>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<InvitationAction>,
) -> ParticipantResult<Json<MessageResponse>> {
    let row = service.decline(input.invitation_id, &user).await?;
    Ok(Json(answered(row.invitation_status)))
}

#[utoipa::path(
    get,
    path = "/joined-events",
    tag = "Participants",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Events the caller has joined", body = Vec<InvitationResponse>),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn joined_events<R: ParticipantRepository>(
    State(service): State<SharedService<R>>,
    user: AuthUser,
) -> ParticipantResult<Json<Vec<InvitationResponse>>> {
    Ok(Json(service.joined_events(&user).await?))
}

/// Everyone attached to an event, invited or joined
#[utoipa::path(
    get,
    path = "/{event_id}",
    tag = "Participants",
    params(("event_id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Participants of the event", body = Vec<ParticipantResponse>),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_participants<R: ParticipantRepository>(
    State(service): State<SharedService<R>>,
    UuidPath(event_id): UuidPath,
) -> ParticipantResult<Json<Vec<ParticipantResponse>>> {
    Ok(Json(service.list_participants(event_id).await?))
}

#[utoipa::path(
    delete,
    path = "/{event_id}/leave",
    tag = "Participants",
    params(("event_id" = Uuid, Path, description = "Event ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Left the event", body = MessageResponse),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn leave_event<R: ParticipantRepository>(
    State(service): State<SharedService<R>>,
    user: AuthUser,
    UuidPath(event_id): UuidPath,
) -> ParticipantResult<Json<MessageResponse>> {
    service.leave(event_id, &user).await?;
    Ok(Json(MessageResponse::new("Successfully left event")))
}

/// Invite a user to an event you own
///
/// If the event is already approved the invitee is emailed right away;
/// otherwise the email goes out when an admin approves the event.
#[utoipa::path(
    post,
    path = "/invite",
    tag = "Invitations",
    request_body = InviteUser,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Invitation created", body = MessageResponse),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn invite_user<R: ParticipantRepository>(
    State(service): State<SharedService<R>>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<InviteUser>,
) -> ParticipantResult<impl IntoResponse> {
    invite(&service, input, &user).await
}

#[utoipa::path(
    put,
    path = "/respond",
    tag = "Invitations",
    request_body = RespondToInvitation,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Invitation answered", body = MessageResponse),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn respond_to_invitation<R: ParticipantRepository>(
    State(service): State<SharedService<R>>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<RespondToInvitation>,
) -> ParticipantResult<Json<MessageResponse>> {
    let row = service
        .respond(input.invitation_id, &user, &input.status)
        .await?;
    Ok(Json(answered(row.invitation_status)))
}

#[utoipa::path(
    get,
    path = "/my-invitations",
    tag = "Invitations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending invitations to upcoming events", body = Vec<InvitationResponse>),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn my_invitations<R: ParticipantRepository>(
    State(service): State<SharedService<R>>,
    user: AuthUser,
) -> ParticipantResult<Json<Vec<InvitationResponse>>> {
    Ok(Json(service.my_invitations(&user).await?))
}

async fn invite<R: ParticipantRepository>(
    service: &ParticipantService<R>,
    input: InviteUser,
    user: &AuthUser,
) -> ParticipantResult<(StatusCode, Json<MessageResponse>)> {
    service.invite(input, user).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User invited successfully")),
    ))
}

fn answered(status: InvitationStatus) -> MessageResponse {
    MessageResponse::new(format!("Invitation {}", status))
}
