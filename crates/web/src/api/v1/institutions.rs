use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Query, State},
    http::Method,
    routing::{get, on},
    Extension, Router,
};
use model::{institution::MedicalInstitution, WithDistance, WithId};

use crate::{
    common::{
        route_not_found, schema, HateoasResult, RouteErrorResponse, VecResponse,
        METHOD_FILTER_ALL,
    },
    hateoas,
    middleware::base_url::{base_url_middleware, BaseUrl},
    WebState,
};

use super::NearbyQuery;

macro_rules! resource {
    ($($arg:tt)*) => {
        crate::api::v1::resource!("/institutions{}", format_args!($($arg)*))
    };
}

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/schema", get(schema::<MedicalInstitution>))
        .route("/", get(get_institutions))
        .route("/nearby", get(nearby))
        .layer(axum::middleware::from_fn(base_url_middleware))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

async fn get_institutions(
    OriginalUri(original_uri): OriginalUri,
    State(WebState {
        coordination_client,
    }): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<VecResponse<hateoas::Response<MedicalInstitution>>> {
    coordination_client
        .get_institutions()
        .await
        .map(|institutions| {
            let institutions = institutions
                .into_iter()
                .map(|institution| institution_hateoas(institution, base_url.clone()))
                .collect::<Vec<_>>();
            VecResponse::non_paginated(institutions).hateoas().json()
        })
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
) -> HateoasResult<VecResponse<hateoas::Response<WithDistance<MedicalInstitution>>>>
{
    let center = params.center().map_err(|why| {
        RouteErrorResponse::from(donation::RequestError::from(why))
            .with_method(&Method::GET)
            .with_uri(original_uri.path())
    })?;
    coordination_client
        .nearby_institutions(&center, params.radius_km())
        .await
        .map(|institutions| {
            let institutions = institutions
                .into_iter()
                .map(|institution| {
                    institution_with_distance_hateoas(institution, base_url.clone())
                })
                .collect::<Vec<_>>();
            VecResponse::non_paginated(institutions).hateoas().json()
        })
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}

fn institution_hateoas(
    institution: WithId<MedicalInstitution>,
    base_url: Arc<BaseUrl>,
) -> hateoas::Response<MedicalInstitution> {
    let id = institution.id.raw();
    let location = institution.content.location;
    hateoas::Response::builder(institution.content, base_url)
        .link("self", resource!("/{}", id))
        .link_option(
            "nearby-blood-banks",
            location.map(|location| {
                super::blood_banks::resource!(
                    "/nearby?latitude={}&longitude={}",
                    location.latitude(),
                    location.longitude()
                )
            }),
        )
        .build()
}

fn institution_with_distance_hateoas(
    institution: WithDistance<WithId<MedicalInstitution>>,
    base_url: Arc<BaseUrl>,
) -> hateoas::Response<WithDistance<MedicalInstitution>> {
    let id = institution.content.id.clone();
    hateoas::Response::builder(
        WithDistance::new(institution.distance_km, institution.content.content),
        base_url,
    )
    .link("self", resource!("/{}", id.raw()))
    .build()
}
