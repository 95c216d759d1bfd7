use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Query, State},
    http::Method,
    routing::{get, on},
    Extension, Router,
};
use model::map::{EntityKind, MapPoint};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::geo::{BoundingBox, GeoPoint};

use crate::{
    common::{
        route_not_found, HateoasResult, RouteErrorResponse, METHOD_FILTER_ALL,
    },
    hateoas,
    middleware::base_url::{base_url_middleware, BaseUrl},
    WebState,
};

macro_rules! resource {
    ($($arg:tt)*) => {
        crate::api::v1::resource!("/map{}", format_args!($($arg)*))
    };
}

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/points", get(points))
        .layer(axum::middleware::from_fn(base_url_middleware))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapPointsQuery {
    latitude: f64,
    longitude: f64,
    radius_km: Option<f64>,
    kind: Option<EntityKind>,
}

/// The points around a center plus the viewport bounds framing them. The
/// bounds are exact extents; the consumer applies its display padding.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct MapPointsDto {
    center: GeoPoint,
    radius_km: f64,
    points: Vec<MapPoint>,
    bounds: Option<BoundingBox>,
}

async fn points(
    OriginalUri(original_uri): OriginalUri,
    State(WebState {
        coordination_client,
    }): State<WebState>,
    Query(params): Query<MapPointsQuery>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<MapPointsDto> {
    let center = GeoPoint::new(params.longitude, params.latitude).map_err(|why| {
        RouteErrorResponse::from(donation::RequestError::from(why))
            .with_method(&Method::GET)
            .with_uri(original_uri.path())
    })?;
    let radius_km = params.radius_km.unwrap_or(super::DEFAULT_RADIUS_KM);

    coordination_client
        .map_points(&center, radius_km, params.kind)
        .await
        .map(|(points, bounds)| {
            let dto = MapPointsDto {
                center,
                radius_km,
                points,
                bounds,
            };
            hateoas::Response::builder(dto, base_url)
                .link(
                    "self",
                    resource!(
                        "/points?latitude={}&longitude={}&radiusKm={}",
                        center.latitude(),
                        center.longitude(),
                        radius_km
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
