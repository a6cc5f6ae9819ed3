//! Round-trip price estimates between two named places

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::time;

use super::client::RidesClient;
use crate::auth;
use crate::config::Paths;
use crate::models::{EstimateRequest, Product, RideEstimate};
use crate::places::{Place, Places, Route};

/// What to estimate on each poll
#[derive(Debug, Clone)]
pub struct EstimateOptions {
    pub from: String,
    pub to: String,
    pub detail: bool,
}

/// One direction of the round trip
#[derive(Debug, Clone)]
pub struct Leg {
    pub product: Product,
    pub estimate: RideEstimate,
    /// Fare display string, always present on a fetched leg
    pub fare: String,
}

/// List products at the origin and quote the first one to the destination.
pub async fn fetch_leg(client: &RidesClient, orig: Place, dest: Place) -> Result<Leg> {
    let products = client.get_products(orig.lat, orig.lng).await?.products;
    let product = products
        .into_iter()
        .next()
        .context("No products available at origin")?;

    let request = EstimateRequest {
        product_id: product.product_id.clone(),
        start_latitude: orig.lat,
        start_longitude: orig.lng,
        end_latitude: dest.lat,
        end_longitude: dest.lng,
        seat_count: 1,
    };
    let estimate = client.estimate_ride(&request).await?;
    let fare = estimate
        .fare_display()
        .context("Estimate response has no fare")?
        .to_string();

    Ok(Leg {
        product,
        estimate,
        fare,
    })
}

/// `{time}: {a}->{b}: {fare_ab}, {b}->{a}: {fare_ba}`
pub fn format_summary(time: &str, a: &str, b: &str, fare_ab: &str, fare_ba: &str) -> String {
    format!(
        "{time}: {a}->{b}: {fare_ab}, {b}->{a}: {fare_ba}",
        time = time,
        a = a,
        b = b,
        fare_ab = fare_ab,
        fare_ba = fare_ba
    )
}

/// First product and estimate body, exactly as the API returned them
fn detail_text(leg: &Leg) -> Result<String> {
    Ok(format!(
        "products[0]\n{}\nresponse\n{}",
        serde_json::to_string_pretty(&leg.product.raw)?,
        serde_json::to_string_pretty(&leg.estimate.raw)?
    ))
}

/// Places and API environment for this run. The app config is optional
/// here: a valid stored credential is enough to poll.
fn environment(paths: &Paths) -> Result<(Places, bool)> {
    match paths.app_config_optional()? {
        Some(app) => Ok((Places::with_overrides(&app.places), app.sandbox)),
        None => Ok((Places::default(), true)),
    }
}

/// Resolve the route up front so an unknown place fails before any I/O.
pub fn resolve_route(paths: &Paths, opts: &EstimateOptions) -> Result<(Route, bool)> {
    let (places, sandbox) = environment(paths)?;
    let route = places.route(&opts.from, &opts.to)?;
    Ok((route, sandbox))
}

async fn poll(paths: &Paths, route: &Route, sandbox: bool, detail: bool) -> Result<()> {
    let credential = match auth::session(paths).await? {
        Some(cred) => cred,
        None => return Ok(()),
    };
    let client = RidesClient::new(credential.access_token, sandbox);
    tracing::debug!("Using API at {}", client.base_url());

    let there = fetch_leg(&client, route.orig, route.dest).await?;
    let back = fetch_leg(&client, route.dest, route.orig).await?;

    let now = chrono::Local::now().format("%x %X").to_string();
    println!(
        "{}",
        format_summary(
            &now,
            &route.orig_name,
            &route.dest_name,
            &there.fare,
            &back.fare,
        )
    );

    if detail {
        println!("{}", detail_text(&there)?);
        println!("{}", detail_text(&back)?);
    }
    Ok(())
}

/// One round-trip estimate
pub async fn estimate_once(paths: &Paths, opts: &EstimateOptions) -> Result<()> {
    let (route, sandbox) = resolve_route(paths, opts)?;
    poll(paths, &route, sandbox, opts.detail).await
}

/// Poll every `interval` until interrupted
pub async fn watch(paths: &Paths, opts: &EstimateOptions, interval: Duration) -> Result<()> {
    let (route, sandbox) = resolve_route(paths, opts)?;
    tracing::info!(
        "Polling {} <-> {} every {}s",
        route.orig_name,
        route.dest_name,
        interval.as_secs()
    );

    loop {
        tokio::select! {
            res = poll(paths, &route, sandbox, opts.detail) => res?,
            _ = tokio::signal::ctrl_c() => exit_by_user(),
        }

        tokio::select! {
            _ = time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => exit_by_user(),
        }
    }
}

fn exit_by_user() -> ! {
    // A pending console read keeps the runtime from shutting down cleanly.
    eprintln!("exiting by user");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HOME: Place = Place {
        lat: 34.051876,
        lng: -118.461077,
    };
    const WORK: Place = Place {
        lat: 33.99214,
        lng: -118.473471,
    };

    fn paths_in(dir: &std::path::Path) -> Paths {
        Paths {
            config: Some(dir.join("config.toml")),
            store: dir.join("store.toml"),
        }
    }

    fn opts(from: &str, to: &str) -> EstimateOptions {
        EstimateOptions {
            from: from.to_string(),
            to: to.to_string(),
            detail: false,
        }
    }

    #[test]
    fn test_summary_contains_both_fares() {
        let line = format_summary("10/16/26 08:00:00", "home", "work", "$12-16", "$11-15");
        assert_eq!(
            line,
            "10/16/26 08:00:00: home->work: $12-16, work->home: $11-15"
        );
        assert!(line.contains("$12-16"));
        assert!(line.contains("$11-15"));
    }

    #[test]
    fn test_resolve_route_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let (route, sandbox) = resolve_route(&paths_in(dir.path()), &opts("home", "work")).unwrap();
        assert_eq!(route.orig_name, "home");
        assert_eq!(route.dest_name, "work");
        assert!(sandbox);
    }

    #[test]
    fn test_resolve_route_unknown_place() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_route(&paths_in(dir.path()), &opts("home", "atlantis")).unwrap_err();
        assert!(err.to_string().contains("one or both unknown place names"));
        assert!(err.to_string().contains("atlantis"));
    }

    #[test]
    fn test_resolve_route_config_places() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            r#"
client_id = "c"
client_secret = "s"
redirect_url = "http://localhost/cb"
sandbox = false

[places.beach]
lat = 34.0
lng = -118.5
"#,
        )
        .unwrap();

        let (route, sandbox) =
            resolve_route(&paths_in(dir.path()), &opts("beach", "home")).unwrap();
        assert_eq!(
            route.orig,
            Place {
                lat: 34.0,
                lng: -118.5,
            }
        );
        assert!(!sandbox);
    }

    #[tokio::test]
    async fn test_estimate_once_unknown_place_skips_auth() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_in(dir.path());
        let err = estimate_once(&paths, &opts("nowhere", "work"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nowhere"));
    }

    async fn mount_products(server: &MockServer, at: Place, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/v1.2/products"))
            .and(query_param("latitude", at.lat.to_string()))
            .and(query_param("longitude", at.lng.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch_leg_reverse_uses_swapped_coordinates() {
        let server = MockServer::start().await;
        mount_products(&server, WORK, json!({"products": [{"product_id": "p-work"}]})).await;
        Mock::given(method("POST"))
            .and(path("/v1.2/requests/estimate"))
            .and(body_json(json!({
                "product_id": "p-work",
                "start_latitude": WORK.lat,
                "start_longitude": WORK.lng,
                "end_latitude": HOME.lat,
                "end_longitude": HOME.lng,
                "seat_count": 1
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"fare": {"display": "$7.00"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = RidesClient::with_base_url("tok", &server.uri());
        let leg = fetch_leg(&client, WORK, HOME).await.unwrap();
        assert_eq!(leg.product.product_id, "p-work");
        assert_eq!(leg.fare, "$7.00");
    }

    #[tokio::test]
    async fn test_fetch_leg_no_products() {
        let server = MockServer::start().await;
        mount_products(&server, HOME, json!({"products": []})).await;

        let client = RidesClient::with_base_url("tok", &server.uri());
        let err = fetch_leg(&client, HOME, WORK).await.unwrap_err();
        assert!(err.to_string().contains("No products available"));
    }

    #[tokio::test]
    async fn test_fetch_leg_missing_fare_fails() {
        let server = MockServer::start().await;
        mount_products(&server, HOME, json!({"products": [{"product_id": "p1"}]})).await;
        Mock::given(method("POST"))
            .and(path("/v1.2/requests/estimate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pickup_estimate": 3})))
            .mount(&server)
            .await;

        let client = RidesClient::with_base_url("tok", &server.uri());
        let err = fetch_leg(&client, HOME, WORK).await.unwrap_err();
        assert_eq!(err.to_string(), "Estimate response has no fare");
    }

    #[tokio::test]
    async fn test_detail_prints_bodies_as_received() {
        let product_body = json!({"product_id": "p1", "display_name": "UberX", "shared": false});
        let estimate_body = json!({
            "fare": {"display": "$5.73", "breakdown": []},
            "trip": {
                "distance_unit": "mile",
                "duration_estimate": 540,
                "distance_estimate": 2.39,
                "surge": 1.2
            }
        });

        let server = MockServer::start().await;
        mount_products(&server, HOME, json!({"products": [product_body.clone()]})).await;
        Mock::given(method("POST"))
            .and(path("/v1.2/requests/estimate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(estimate_body.clone()))
            .mount(&server)
            .await;

        let client = RidesClient::with_base_url("tok", &server.uri());
        let leg = fetch_leg(&client, HOME, WORK).await.unwrap();
        let text = detail_text(&leg).unwrap();

        let expected = format!(
            "products[0]\n{}\nresponse\n{}",
            serde_json::to_string_pretty(&product_body).unwrap(),
            serde_json::to_string_pretty(&estimate_body).unwrap()
        );
        assert_eq!(text, expected);
        assert!(!text.contains("null"));
    }
}
