use std::time::Duration;

use async_trait::async_trait;
use log::warn;
use utility::geo::GeoPoint;

pub const DEFAULT_ACQUISITION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeolocationError {
    /// The device has no positioning capability.
    Unavailable,
    /// The user declined the position request.
    Denied,
    Timeout,
}

impl std::fmt::Display for GeolocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeolocationError::Unavailable => write!(f, "geolocation unavailable"),
            GeolocationError::Denied => write!(f, "geolocation denied"),
            GeolocationError::Timeout => write!(f, "geolocation timed out"),
        }
    }
}

impl std::error::Error for GeolocationError {}

/// One-shot device position acquisition.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_position(&self) -> Result<GeoPoint, GeolocationError>;
}

/// Resolves the search center from the device position, waiting at most
/// `timeout`. Acquisition failure is never propagated; the configured
/// fallback center is used instead and the caller continues.
pub async fn resolve_center<S: LocationSource + ?Sized>(
    source: &S,
    timeout: Duration,
    fallback: GeoPoint,
) -> GeoPoint {
    let position = match tokio::time::timeout(timeout, source.current_position())
        .await
    {
        Ok(result) => result,
        Err(_) => Err(GeolocationError::Timeout),
    };
    match position {
        Ok(position) => position,
        Err(why) => {
            warn!("falling back to default center: {}", why);
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback() -> GeoPoint {
        GeoPoint::new(10.1228, 54.3233).unwrap()
    }

    struct Fixed(GeoPoint);

    #[async_trait]
    impl LocationSource for Fixed {
        async fn current_position(&self) -> Result<GeoPoint, GeolocationError> {
            Ok(self.0)
        }
    }

    struct Denying;

    #[async_trait]
    impl LocationSource for Denying {
        async fn current_position(&self) -> Result<GeoPoint, GeolocationError> {
            Err(GeolocationError::Denied)
        }
    }

    struct NeverResponding;

    #[async_trait]
    impl LocationSource for NeverResponding {
        async fn current_position(&self) -> Result<GeoPoint, GeolocationError> {
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn uses_the_device_position_when_available() {
        let position = GeoPoint::new(9.0, 53.0).unwrap();
        let center = resolve_center(
            &Fixed(position),
            DEFAULT_ACQUISITION_TIMEOUT,
            fallback(),
        )
        .await;
        assert_eq!(center, position);
    }

    #[tokio::test]
    async fn denied_acquisition_falls_back() {
        let center =
            resolve_center(&Denying, DEFAULT_ACQUISITION_TIMEOUT, fallback()).await;
        assert_eq!(center, fallback());
    }

    #[tokio::test(start_paused = true)]
    async fn acquisition_times_out_and_falls_back() {
        let center = resolve_center(
            &NeverResponding,
            Duration::from_millis(50),
            fallback(),
        )
        .await;
        assert_eq!(center, fallback());
    }
}
