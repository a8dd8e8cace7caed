use rocket::{response::status::Created, serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::poll::{AggregateView, Poll, PollId, PollSpec, ResponseSpec};
use crate::service::PollService;

use super::response::ApiResponse;

pub fn routes() -> Vec<Route> {
    routes![
        create_poll,
        get_poll,
        submit_response,
        close_poll,
        get_aggregate,
    ]
}

#[post("/polls", data = "<spec>", format = "json")]
async fn create_poll(
    spec: Json<PollSpec>,
    service: &State<PollService>,
) -> Result<Created<Json<ApiResponse<Poll>>>> {
    let poll = service.create(spec.into_inner()).await?;
    let location = format!("/polls/{}", poll.id);
    Ok(Created::new(location).body(Json(ApiResponse::ok(poll))))
}

#[get("/polls/<poll_id>")]
async fn get_poll(
    poll_id: PollId,
    service: &State<PollService>,
) -> Result<Json<ApiResponse<Poll>>> {
    let poll = service.get(poll_id).await?;
    Ok(Json(ApiResponse::ok(poll)))
}

#[post("/polls/<poll_id>/responses", data = "<response>", format = "json")]
async fn submit_response(
    poll_id: PollId,
    response: Json<ResponseSpec>,
    service: &State<PollService>,
) -> Result<Json<ApiResponse<Poll>>> {
    let poll = service.submit_response(poll_id, &response.into_inner()).await?;
    Ok(Json(ApiResponse::ok(poll)))
}

#[post("/polls/<poll_id>/close")]
async fn close_poll(
    poll_id: PollId,
    service: &State<PollService>,
) -> Result<Json<ApiResponse<Poll>>> {
    let poll = service.close(poll_id).await?;
    Ok(Json(ApiResponse::ok(poll)))
}

#[get("/polls/<poll_id>/aggregate")]
async fn get_aggregate(
    poll_id: PollId,
    service: &State<PollService>,
) -> Result<Json<ApiResponse<AggregateView>>> {
    let view = service.aggregate(poll_id).await?;
    Ok(Json(ApiResponse::ok(view)))
}
