use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::Method,
    routing::{get, on},
    Extension, Router,
};
use model::{donor::Donor, WithDistance, WithId};
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
        crate::api::v1::resource!("/donors{}", format_args!($($arg)*))
    };
}

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/schema", get(schema::<Donor>))
        .route("/:id", get(get_donor))
        .route("/", get(get_donors))
        .route("/nearby", get(nearby))
        .layer(axum::middleware::from_fn(base_url_middleware))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

async fn get_donors(
    OriginalUri(original_uri): OriginalUri,
    State(WebState {
        coordination_client,
    }): State<WebState>,
    Query(params): Query<PageParams>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<VecResponse<hateoas::Response<Donor>>> {
    coordination_client
        .get_donors()
        .await
        .map(|donors| {
            let donors = donors
                .into_iter()
                .map(|donor| donor_hateoas(donor, base_url.clone()))
                .collect::<Vec<_>>();
            VecResponse::page_of(donors, params.page(), params.page_size())
                .hateoas()
                .json()
        })
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}

async fn get_donor(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState {
        coordination_client,
    }): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<Donor> {
    coordination_client
        .get_donor(Id::new(id))
        .await
        .map(|donor| donor_hateoas(donor, base_url.clone()).json())
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
) -> HateoasResult<VecResponse<hateoas::Response<WithDistance<Donor>>>> {
    let center = params.center().map_err(|why| {
        RouteErrorResponse::from(donation::RequestError::from(why))
            .with_method(&Method::GET)
            .with_uri(original_uri.path())
    })?;
    coordination_client
        .nearby_donors(&center, params.radius_km())
        .await
        .map(|donors| {
            let donors = donors
                .into_iter()
                .map(|donor| donor_with_distance_hateoas(donor, base_url.clone()))
                .collect::<Vec<_>>();
            VecResponse::non_paginated(donors).hateoas().json()
        })
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}

fn donor_hateoas(
    donor: WithId<Donor>,
    base_url: Arc<BaseUrl>,
) -> hateoas::Response<Donor> {
    let location = donor.content.location;
    hateoas::Response::builder(donor.content, base_url)
        .link("self", resource!("/{}", donor.id.raw()))
        .link_option(
            "nearby",
            location.map(|location| {
                resource!(
                    "/nearby?latitude={}&longitude={}&radiusKm=1",
                    location.latitude(),
                    location.longitude()
                )
            }),
        )
        .build()
}

pub(crate) fn donor_with_distance_hateoas(
    donor: WithDistance<WithId<Donor>>,
    base_url: Arc<BaseUrl>,
) -> hateoas::Response<WithDistance<Donor>> {
    let id = donor.content.id.clone();
    hateoas::Response::builder(
        WithDistance::new(donor.distance_km, donor.content.content),
        base_url,
    )
    .link("self", resource!("/{}", id.raw()))
    .build()
}
