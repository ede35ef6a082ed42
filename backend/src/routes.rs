use std::sync::Arc;
use rocket::{Build, Rocket, Responder, State, catchers, delete, get, post, put, routes};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use tracing::{error, instrument};
use poll_shared::models::*;
use poll_shared::session::SessionCookieName;
use crate::{
    auth::Caller,
    catchers::{bad_request, forbidden, internal_error, not_found, unauthorized, unprocessable},
    config::AppConfig,
    cors::CORS,
    error::ActionError,
    identity::IdentityProvider,
    processor::PollProcessor,
    store::PollStore,
    utils::parse_poll_id,
    views::{View, ViewCache},
};

pub const VIEW_GENERATION_HEADER: &str = "X-View-Generation";

pub struct AppState {
    pub store: Arc<dyn PollStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub views: ViewCache,
}

impl AppState {
    pub fn new(store: Arc<dyn PollStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            store,
            identity,
            views: ViewCache::new(),
        }
    }

    pub fn processor(&self) -> PollProcessor<'_> {
        PollProcessor::new(self.store.as_ref(), &self.views)
    }

    fn generation_header(&self, view: View) -> Header<'static> {
        Header::new(VIEW_GENERATION_HEADER, self.views.generation(view).to_string())
    }
}

#[derive(Responder)]
pub struct PollListing {
    inner: Json<Vec<PollView>>,
    generation: Header<'static>,
}

pub fn build(state: AppState, config: &AppConfig) -> Rocket<Build> {
    rocket::build()
        .attach(CORS::new(config.allowed_origins.clone()))
        .manage(state)
        .manage(SessionCookieName(config.session_cookie.clone()))
        .mount(
            "/api",
            routes![
                list_polls,
                user_polls,
                get_poll,
                current_vote,
                create_poll,
                update_poll,
                delete_poll,
                submit_vote,
                all_options
            ],
        )
        .register(
            "/",
            catchers![
                bad_request,
                unauthorized,
                forbidden,
                not_found,
                unprocessable,
                internal_error
            ],
        )
}

#[rocket::options("/<_..>")]
pub async fn all_options() -> Status {
    Status::Ok
}

#[get("/polls")]
pub async fn list_polls(state: &State<AppState>) -> Result<PollListing, ActionError> {
    let polls = state.processor().list_polls().await.map_err(|e| {
        error!("Listing polls failed: {:?}", e);
        e
    })?;

    Ok(PollListing {
        inner: Json(polls),
        generation: state.generation_header(View::PollList),
    })
}

#[get("/polls/mine")]
pub async fn user_polls(state: &State<AppState>, caller: Caller) -> Result<PollListing, ActionError> {
    let polls = state.processor().user_polls(caller.user_id()).await.map_err(|e| {
        error!("Listing dashboard polls failed: {:?}", e);
        e
    })?;

    Ok(PollListing {
        inner: Json(polls),
        generation: state.generation_header(View::Dashboard),
    })
}

#[get("/polls/<id>")]
pub async fn get_poll(state: &State<AppState>, id: &str) -> Result<Json<PollView>, ActionError> {
    let poll_id = parse_poll_id(id)?;
    state.processor().get_poll(poll_id).await.map(Json)
}

#[get("/polls/<id>/vote")]
pub async fn current_vote(state: &State<AppState>, id: &str, caller: Caller) -> Result<Json<CurrentVote>, ActionError> {
    let poll_id = parse_poll_id(id)?;
    let option_id = state.processor().current_vote(caller.user_id(), poll_id).await?;
    Ok(Json(CurrentVote { poll_id, option_id }))
}

#[instrument(skip(state, request, caller))]
#[post("/polls", format = "json", data = "<request>")]
pub async fn create_poll(
    state: &State<AppState>,
    request: Json<CreatePollRequest>,
    caller: Caller,
) -> Result<(Status, Json<ActionResponse>), ActionError> {
    let poll_id = state.processor().create_poll(caller.user_id(), &request).await?;
    Ok((Status::Created, Json(ActionResponse::created(poll_id))))
}

#[instrument(skip(state, request, caller), fields(poll_id = %id))]
#[put("/polls/<id>", format = "json", data = "<request>")]
pub async fn update_poll(
    state: &State<AppState>,
    id: &str,
    request: Json<UpdatePollRequest>,
    caller: Caller,
) -> Result<Json<ActionResponse>, ActionError> {
    let poll_id = parse_poll_id(id)?;
    state.processor().update_poll(caller.user_id(), poll_id, &request).await?;
    Ok(Json(ActionResponse::ok()))
}

#[instrument(skip(state, caller), fields(poll_id = %id))]
#[delete("/polls/<id>")]
pub async fn delete_poll(state: &State<AppState>, id: &str, caller: Caller) -> Result<Json<ActionResponse>, ActionError> {
    let poll_id = parse_poll_id(id)?;
    state.processor().delete_poll(caller.user_id(), poll_id).await?;
    Ok(Json(ActionResponse::ok()))
}

#[instrument(skip(state, request, caller))]
#[post("/votes", format = "json", data = "<request>")]
pub async fn submit_vote(
    state: &State<AppState>,
    request: Json<SubmitVoteRequest>,
    caller: Caller,
) -> Result<Json<ActionResponse>, ActionError> {
    state.processor().submit_vote(caller.user_id(), &request).await?;
    Ok(Json(ActionResponse::ok()))
}
