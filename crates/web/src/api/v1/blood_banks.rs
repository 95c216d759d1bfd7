use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::Method,
    routing::{get, on},
    Extension, Router,
};
use model::{blood_bank::BloodBank, WithDistance, WithId};
use utility::id::Id;

use crate::{
    common::{
        route_not_found, schema, HateoasResult, PageParams, RouteErrorResponse,
        VecResponse, METHOD_FILTER_ALL,
    },
    hateoas,
    middleware::base_url::{base_url_middleware, BaseUrl},
    WebState,
};

use super::NearbyQuery;

macro_rules! resource {
    ($($arg:tt)*) => {
        crate::api::v1::resource!("/blood-banks{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/schema", get(schema::<BloodBank>))
        .route("/:id", get(get_blood_bank))
        .route("/", get(get_blood_banks))
        .route("/nearby", get(nearby))
        .layer(axum::middleware::from_fn(base_url_middleware))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

async fn get_blood_banks(
    OriginalUri(original_uri): OriginalUri,
    State(WebState {
        coordination_client,
    }): State<WebState>,
    Query(params): Query<PageParams>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<VecResponse<hateoas::Response<BloodBank>>> {
    coordination_client
        .get_blood_banks()
        .await
        .map(|banks| {
            let banks = banks
                .into_iter()
                .map(|bank| blood_bank_hateoas(bank, base_url.clone()))
                .collect::<Vec<_>>();
            VecResponse::page_of(banks, params.page(), params.page_size())
                .hateoas()
                .json()
        })
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}

async fn get_blood_bank(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState {
        coordination_client,
    }): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<BloodBank> {
    coordination_client
        .get_blood_bank(Id::new(id))
        .await
        .map(|bank| blood_bank_hateoas(bank, base_url.clone()).json())
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}

async fn nearby(
    OriginalUri(original_uri): OriginalUri,
    State(WebState {
        coordination_client,
    }): State<WebState>,
    Query(params): Query<NearbyQuery>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<VecResponse<hateoas::Response<WithDistance<BloodBank>>>> {
    let center = params.center().map_err(|why| {
        RouteErrorResponse::from(donation::RequestError::from(why))
            .with_method(&Method::GET)
            .with_uri(original_uri.path())
    })?;
    coordination_client
        .nearby_blood_banks(&center, params.radius_km())
        .await
        .map(|banks| {
            let banks = banks
                .into_iter()
                .map(|bank| blood_bank_with_distance_hateoas(bank, base_url.clone()))
                .collect::<Vec<_>>();
            VecResponse::non_paginated(banks).hateoas().json()
        })
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}

fn blood_bank_hateoas(
    bank: WithId<BloodBank>,
    base_url: Arc<BaseUrl>,
) -> hateoas::Response<BloodBank> {
    let id = bank.id.raw();
    hateoas::Response::builder(bank.content, base_url)
        .link("self", resource!("/{}", id))
        .link(
            "availability",
            super::schedules::resource!(
                "/time-slots/availability?bloodBankId={}",
                id
            ),
        )
        .build()
}

pub(crate) fn blood_bank_with_distance_hateoas(
    bank: WithDistance<WithId<BloodBank>>,
    base_url: Arc<BaseUrl>,
) -> hateoas::Response<WithDistance<BloodBank>> {
    let id = bank.content.id.clone();
    hateoas::Response::builder(
        WithDistance::new(bank.distance_km, bank.content.content),
        base_url,
    )
    .link("self", resource!("/{}", id.raw()))
    .link(
        "availability",
        super::schedules::resource!(
            "/time-slots/availability?bloodBankId={}",
            id.raw()
        ),
    )
    .build()
}
