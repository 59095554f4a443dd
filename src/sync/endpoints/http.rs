use futures_util::FutureExt;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::sync::domain::{Bounds, EntityClass, EntityCollection, Vehicle};
use crate::sync::domain::entities::StopFeatureCollection;
use crate::sync::endpoints::api::{ApiFuture, FetchError, MapApi};
use crate::sync::journey::Journey;

/// [`MapApi`] over HTTP, rooted at the site serving `vehicles.json`,
/// `stops.json` and `journeys/<id>.json`.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    root: String,
}

impl HttpApi {
    pub fn new(root: impl Into<String>) -> Self {
        Self::with_client(Client::new(), root)
    }

    pub fn with_client(client: Client, root: impl Into<String>) -> Self {
        let mut root = root.into();
        if !root.ends_with('/') {
            root.push('/');
        }
        Self { client, root }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(format!("{}{}", self.root, path))
    }
}

impl MapApi for HttpApi {
    fn fetch(&self, class: EntityClass, bounds: Bounds) -> ApiFuture<EntityCollection> {
        let request = self
            .get(&format!("{}.json", class.endpoint()))
            .query(&bounds.query_pairs());
        log::trace!("[API] GET {} {:?}", class, bounds);

        async move {
            match class {
                EntityClass::Vehicles => {
                    let vehicles: Vec<Vehicle> = get_json(request).await?;
                    Ok(EntityCollection::Vehicles(vehicles))
                }
                EntityClass::Stops => {
                    let features: StopFeatureCollection = get_json(request).await?;
                    Ok(EntityCollection::Stops(features.into_stops()))
                }
            }
        }
        .boxed()
    }

    fn fetch_vehicle(&self, id: u64) -> ApiFuture<Option<Vehicle>> {
        let request = self.get("vehicles.json").query(&[("id", id)]);

        async move {
            let vehicles: Vec<Vehicle> = get_json(request).await?;
            Ok(vehicles.into_iter().next())
        }
        .boxed()
    }

    fn fetch_journey(&self, id: u64) -> ApiFuture<Journey> {
        let request = self.get(&format!("journeys/{}.json", id));
        get_json(request).boxed()
    }
}

/// Sends `request` and decodes a JSON body, keeping transport, status and
/// decoding failures apart.
async fn get_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, FetchError> {
    let response = request
        .send()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        log::debug!("[API] {} -> HTTP {}", response.url(), status);
        return Err(FetchError::Status(status.as_u16()));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    serde_json::from_slice(&body).map_err(|e| FetchError::Malformed(e.to_string()))
}
