use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::sync::domain::{Bounds, EntityClass, EntityCollection};
use crate::sync::endpoints::{FetchError, HttpApi, MapApi};

/// Serves exactly one canned HTTP response on a local port.
///
/// Returns the api root and a receiver for the request line that was
/// received.
async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let text = String::from_utf8_lossy(&request);
        let _ = tx.send(text.lines().next().unwrap_or_default().to_string());

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });

    (format!("http://{}", addr), rx)
}

fn api(root: String) -> HttpApi {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    HttpApi::with_client(client, root)
}

fn bristol() -> Bounds {
    Bounds::new(-2.7, 51.4, -2.5, 51.5)
}

#[test]
fn root_gets_trailing_slash() {
    assert_eq!(HttpApi::new("https://bustimes.org").root(), "https://bustimes.org/");
    assert_eq!(HttpApi::new("https://bustimes.org/").root(), "https://bustimes.org/");
}

#[tokio::test]
async fn vehicles_are_fetched_with_bbox_query() {
    let body = r##"[
        {"id": 42, "coordinates": [-2.6, 51.45], "heading": 90,
         "vehicle": {"url": "/vehicles/42", "colour": "#ff0000"},
         "service": {"line_name": "72"}},
        {"id": 43, "coordinates": [-2.61, 51.46]}
    ]"##;
    let (root, request_line) = serve_once("200 OK", body).await;

    let collection = api(root)
        .fetch(EntityClass::Vehicles, bristol())
        .await
        .unwrap();

    let EntityCollection::Vehicles(vehicles) = collection else {
        panic!("expected vehicles");
    };
    assert_eq!(vehicles.len(), 2);
    assert_eq!(vehicles[0].id, 42);
    assert_eq!(vehicles[0].marker_colour(), "#ff0000");
    assert_eq!(vehicles[1].marker_colour(), "#fff");

    let line = request_line.await.unwrap();
    assert!(line.starts_with("GET /vehicles.json?ymax=51.5&xmax=-2.5&ymin=51.4&xmin=-2.7"), "{}", line);
}

#[tokio::test]
async fn stops_are_read_from_feature_collection() {
    let body = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature",
         "geometry": {"type": "Point", "coordinates": [-2.59, 51.45]},
         "properties": {"url": "/stops/0100BRP90310", "name": "Temple Meads", "bearing": 180}}
    ]}"#;
    let (root, request_line) = serve_once("200 OK", body).await;

    let collection = api(root).fetch(EntityClass::Stops, bristol()).await.unwrap();

    let EntityCollection::Stops(stops) = collection else {
        panic!("expected stops");
    };
    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0].id, "/stops/0100BRP90310");
    assert_eq!(stops[0].bearing, Some(180.0));
    assert!(request_line.await.unwrap().starts_with("GET /stops.json?"));
}

#[tokio::test]
async fn server_error_is_a_status_failure() {
    let (root, _) = serve_once("500 Internal Server Error", "{}").await;
    let err = api(root).fetch(EntityClass::Vehicles, bristol()).await.unwrap_err();
    assert_eq!(err, FetchError::Status(500));
}

#[tokio::test]
async fn garbage_body_is_malformed() {
    let (root, _) = serve_once("200 OK", "<html>").await;
    let err = api(root).fetch(EntityClass::Stops, bristol()).await.unwrap_err();
    assert!(matches!(err, FetchError::Malformed(_)), "{:?}", err);
}

#[tokio::test]
async fn refused_connection_is_a_transport_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = api(format!("http://{}", addr))
        .fetch(EntityClass::Vehicles, bristol())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)), "{:?}", err);
}

#[tokio::test]
async fn single_vehicle_lookup_takes_first_or_none() {
    let (root, request_line) = serve_once("200 OK", r#"[{"id": 7, "coordinates": [0.1, 52.2]}]"#).await;
    let vehicle = api(root).fetch_vehicle(7).await.unwrap();
    assert_eq!(vehicle.map(|v| v.id), Some(7));
    assert!(request_line.await.unwrap().starts_with("GET /vehicles.json?id=7 "));

    let (root, _) = serve_once("200 OK", "[]").await;
    assert_eq!(api(root).fetch_vehicle(7).await.unwrap(), None);
}

#[tokio::test]
async fn journey_detail_is_decoded() {
    let body = r#"{
        "datetime": "2024-05-01T08:00:00Z",
        "route_name": "72",
        "destination": "Temple Meads",
        "current": true,
        "stops": [
            {"atco_code": "0100A", "name": "A", "aimed_arrival_time": null,
             "aimed_departure_time": "08:00", "minor": false, "heading": 90,
             "coordinates": [-2.6, 51.45]},
            {"atco_code": "0100B", "name": "B", "minor": true, "coordinates": null}
        ],
        "locations": [
            {"coordinates": [-2.62, 51.44], "delta": 30, "direction": 80, "datetime": "2024-05-01T08:01:00Z"}
        ],
        "next": {"id": 11, "datetime": "2024-05-01T09:00:00Z"}
    }"#;
    let (root, request_line) = serve_once("200 OK", body).await;

    let journey = api(root).fetch_journey(10).await.unwrap();
    assert!(journey.current);
    assert_eq!(journey.stops.len(), 2);
    assert_eq!(journey.next.as_ref().map(|n| n.id), Some(11));
    assert!(journey.previous.is_none());
    assert_eq!(
        journey.fit_bounds(),
        Some(Bounds::new(-2.62, 51.44, -2.6, 51.45))
    );
    assert!(request_line.await.unwrap().starts_with("GET /journeys/10.json "));
}
