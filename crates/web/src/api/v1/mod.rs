use axum::{
    routing::on,
    Router,
};

use crate::{
    common::{route_not_found, METHOD_FILTER_ALL},
    middleware::base_url::base_url_middleware,
    WebState,
};

mod blood_banks;
mod donors;
mod institutions;
mod map;
mod schedules;

macro_rules! resource {
    ($($arg:tt)*) => {
        crate::api::resource!("/v1{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .nest_service("/donors", donors::routes(state.clone()))
        .nest_service("/blood-banks", blood_banks::routes(state.clone()))
        .nest_service("/institutions", institutions::routes(state.clone()))
        .nest_service("/map", map::routes(state.clone()))
        .nest_service("/schedules", schedules::routes(state))
        .layer(axum::middleware::from_fn(base_url_middleware))
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

/// Nearby-search parameters shared by the entity routers. The radius is in
/// kilometers.
#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NearbyQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: Option<f64>,
}

pub(crate) const DEFAULT_RADIUS_KM: f64 = 10.0;

impl NearbyQuery {
    pub fn center(&self) -> Result<utility::geo::GeoPoint, utility::geo::InvalidCoordinate> {
        utility::geo::GeoPoint::new(self.longitude, self.latitude)
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km.unwrap_or(DEFAULT_RADIUS_KM)
    }
}
