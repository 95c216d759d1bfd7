use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::Method,
    routing::{get, on, patch, post},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use donation::{
    client::NewSchedule,
    lifecycle::ScheduleEdit,
    slots::SlotAvailability,
};
use model::{
    blood_bank::BloodBank,
    schedule::{Donation, DonationSchedule},
    WithId,
};
use serde::Deserialize;
use utility::id::Id;

use crate::{
    common::{
        route_not_found, schema, HateoasResult, RouteErrorResponse, VecResponse,
        METHOD_FILTER_ALL,
    },
    hateoas,
    middleware::base_url::{base_url_middleware, BaseUrl},
    WebState,
};

macro_rules! resource {
    ($($arg:tt)*) => {
        crate::api::v1::resource!("/schedules{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/schema", get(schema::<DonationSchedule>))
        .route("/time-slots/availability", get(availability))
        .route("/:id/confirm", patch(confirm))
        .route("/:id/cancel", patch(cancel))
        .route("/:id/complete", patch(complete))
        .route("/:id", get(get_schedule).patch(edit))
        .route("/", post(create).get(get_schedules))
        .layer(axum::middleware::from_fn(base_url_middleware))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleListQuery {
    blood_bank_id: Id<BloodBank>,
    date: NaiveDate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilityQuery {
    blood_bank_id: Id<BloodBank>,
    date: NaiveDate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelBody {
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompleteBody {
    donation_id: Id<Donation>,
}

async fn create(
    OriginalUri(original_uri): OriginalUri,
    State(WebState {
        coordination_client,
    }): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    Json(request): Json<NewSchedule>,
) -> HateoasResult<DonationSchedule> {
    coordination_client
        .create_schedule(request)
        .await
        .map(|schedule| schedule_hateoas(schedule, base_url.clone()).json())
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::POST)
                .with_uri(original_uri.path())
        })
}

async fn get_schedules(
    OriginalUri(original_uri): OriginalUri,
    State(WebState {
        coordination_client,
    }): State<WebState>,
    Query(params): Query<ScheduleListQuery>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<VecResponse<hateoas::Response<DonationSchedule>>> {
    coordination_client
        .schedules_for(&params.blood_bank_id, params.date)
        .await
        .map(|schedules| {
            let schedules = schedules
                .into_iter()
                .map(|schedule| schedule_hateoas(schedule, base_url.clone()))
                .collect::<Vec<_>>();
            VecResponse::non_paginated(schedules).hateoas().json()
        })
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}

async fn get_schedule(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState {
        coordination_client,
    }): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<DonationSchedule> {
    coordination_client
        .get_schedule(Id::new(id))
        .await
        .map(|schedule| schedule_hateoas(schedule, base_url.clone()).json())
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}

async fn edit(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState {
        coordination_client,
    }): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    Json(request): Json<ScheduleEdit>,
) -> HateoasResult<DonationSchedule> {
    coordination_client
        .edit_schedule(Id::new(id), request)
        .await
        .map(|schedule| schedule_hateoas(schedule, base_url.clone()).json())
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::PATCH)
                .with_uri(original_uri.path())
        })
}

async fn confirm(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState {
        coordination_client,
    }): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<DonationSchedule> {
    coordination_client
        .confirm_schedule(Id::new(id))
        .await
        .map(|schedule| schedule_hateoas(schedule, base_url.clone()).json())
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::PATCH)
                .with_uri(original_uri.path())
        })
}

async fn cancel(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState {
        coordination_client,
    }): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    Json(body): Json<CancelBody>,
) -> HateoasResult<DonationSchedule> {
    coordination_client
        .cancel_schedule(Id::new(id), body.reason)
        .await
        .map(|schedule| schedule_hateoas(schedule, base_url.clone()).json())
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::PATCH)
                .with_uri(original_uri.path())
        })
}

async fn complete(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState {
        coordination_client,
    }): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    Json(body): Json<CompleteBody>,
) -> HateoasResult<DonationSchedule> {
    coordination_client
        .complete_schedule(Id::new(id), body.donation_id)
        .await
        .map(|schedule| schedule_hateoas(schedule, base_url.clone()).json())
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::PATCH)
                .with_uri(original_uri.path())
        })
}

async fn availability(
    OriginalUri(original_uri): OriginalUri,
    State(WebState {
        coordination_client,
    }): State<WebState>,
    Query(params): Query<AvailabilityQuery>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<VecResponse<SlotAvailability>> {
    coordination_client
        .slot_availability(&params.blood_bank_id, params.date)
        .await
        .map(|slots| {
            hateoas::Response::builder(
                VecResponse::non_paginated(slots),
                base_url,
            )
            .link(
                "self",
                resource!(
                    "/time-slots/availability?bloodBankId={}&date={}",
                    params.blood_bank_id.raw(),
                    params.date
                ),
            )
            .build()
            .json()
        })
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}

fn schedule_hateoas(
    schedule: WithId<DonationSchedule>,
    base_url: Arc<BaseUrl>,
) -> hateoas::Response<DonationSchedule> {
    let id = schedule.id.raw();
    let terminal = schedule.content.status.is_terminal();
    let bank = schedule.content.blood_bank.id.raw();
    let date = schedule.content.scheduled_date;
    hateoas::Response::builder(schedule.content, base_url)
        .link("self", resource!("/{}", id))
        .link_option(
            "confirm",
            (!terminal).then(|| resource!("/{}/confirm", id)),
        )
        .link_option(
            "cancel",
            (!terminal).then(|| resource!("/{}/cancel", id)),
        )
        .link(
            "availability",
            resource!(
                "/time-slots/availability?bloodBankId={}&date={}",
                bank,
                date
            ),
        )
        .build()
}
