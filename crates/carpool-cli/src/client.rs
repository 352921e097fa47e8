use carpool_schema::{TripRequest, TripStatus, TripView, User, UserProfile};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::Read;
use thiserror::Error;
use tracing::debug;

const CAR_OWNER_HEADER: &str = "car-owner-id";

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server understood the request and refused it.
    #[error("{message} ({kind})")]
    Rejected {
        status: u16,
        kind: String,
        message: String,
    },
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },
    #[error("cannot reach {url}: {message}")]
    Transport { url: String, message: String },
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("{0}")]
    InvalidInput(String),
}

impl ClientError {
    /// Domain error kind reported by the server, if the request was rejected.
    pub fn kind(&self) -> Option<&str> {
        match self {
            ClientError::Rejected { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct ErrorReply {
    error: String,
    message: String,
}

#[derive(Serialize)]
struct EnrollBody<'a> {
    user_id: &'a str,
}

/// Blocking HTTP client for the carpool server API.
pub struct CarpoolClient {
    base: String,
    agent: ureq::Agent,
}

impl CarpoolClient {
    pub fn new(base: &str) -> Self {
        // Error statuses carry a JSON body we want to read.
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            base: base.trim_end_matches('/').to_owned(),
            agent: ureq::Agent::new_with_config(config),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base)
    }

    fn finish<T: DeserializeOwned>(
        url: &str,
        result: Result<ureq::http::Response<ureq::Body>, ureq::Error>,
    ) -> Result<T, ClientError> {
        let resp = result.map_err(|e| ClientError::Transport {
            url: url.to_owned(),
            message: e.to_string(),
        })?;
        let status = resp.status().as_u16();
        let mut body = Vec::new();
        resp.into_body()
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| ClientError::Transport {
                url: url.to_owned(),
                message: e.to_string(),
            })?;
        debug!("{url}: HTTP {status}, {} bytes", body.len());

        if status >= 400 {
            return Err(match serde_json::from_slice::<ErrorReply>(&body) {
                Ok(reply) => ClientError::Rejected {
                    status,
                    kind: reply.error,
                    message: reply.message,
                },
                Err(_) => ClientError::Http {
                    status,
                    url: url.to_owned(),
                    body: String::from_utf8_lossy(&body).into_owned(),
                },
            });
        }
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode {
            url: url.to_owned(),
            message: e.to_string(),
        })
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.url(path);
        debug!("GET {url}");
        Self::finish(&url, self.agent.get(&url).call())
    }

    fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.url(path);
        debug!("DELETE {url}");
        Self::finish(&url, self.agent.delete(&url).call())
    }

    fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        create: bool,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.url(path);
        let data = serde_json::to_vec(body)
            .map_err(|e| ClientError::InvalidInput(format!("cannot encode request: {e}")))?;
        let result = if create {
            debug!("POST {url}");
            self.agent
                .post(&url)
                .header("Content-Type", "application/json")
                .send(&data[..])
        } else {
            debug!("PUT {url}");
            self.agent
                .put(&url)
                .header("Content-Type", "application/json")
                .send(&data[..])
        };
        Self::finish(&url, result)
    }

    pub fn list_users(&self) -> Result<Vec<User>, ClientError> {
        self.get("/users")
    }

    pub fn get_user(&self, user_id: &str) -> Result<User, ClientError> {
        self.get(&format!("/users/{user_id}"))
    }

    pub fn register_user(&self, user_id: &str, profile: &UserProfile) -> Result<User, ClientError> {
        self.send(true, &format!("/users/{user_id}"), profile)
    }

    pub fn update_user(&self, user_id: &str, profile: &UserProfile) -> Result<User, ClientError> {
        self.send(false, &format!("/users/{user_id}"), profile)
    }

    pub fn delete_user(&self, user_id: &str) -> Result<User, ClientError> {
        self.delete(&format!("/users/{user_id}"))
    }

    pub fn list_trips(&self) -> Result<Vec<TripView>, ClientError> {
        self.get("/trips")
    }

    pub fn get_trip(&self, trip_id: &str) -> Result<TripView, ClientError> {
        self.get(&format!("/trips/{trip_id}"))
    }

    /// Create (`create`) or update a trip.
    pub fn save_trip(
        &self,
        create: bool,
        trip_id: &str,
        request: &TripRequest,
    ) -> Result<TripView, ClientError> {
        self.send(create, &format!("/trips/{trip_id}"), request)
    }

    pub fn enroll(&self, trip_id: &str, user_id: &str) -> Result<TripView, ClientError> {
        self.send(
            false,
            &format!("/trips/{trip_id}/enroll"),
            &EnrollBody { user_id },
        )
    }

    pub fn start(&self, trip_id: &str, caller_id: &str) -> Result<TripView, ClientError> {
        let url = self.url(&format!("/trips/{trip_id}/start"));
        debug!("PUT {url} as {caller_id}");
        Self::finish(
            &url,
            self.agent
                .put(&url)
                .header(CAR_OWNER_HEADER, caller_id)
                .send_empty(),
        )
    }

    pub fn cancel(&self, trip_id: &str) -> Result<(), ClientError> {
        self.delete::<serde_json::Value>(&format!("/trips/{trip_id}"))
            .map(|_| ())
    }

    pub fn status(&self, trip_id: &str) -> Result<TripStatus, ClientError> {
        self.get(&format!("/trips/{trip_id}/status"))
    }
}
