//! Containers and other docker assets, backed by `docker inspect` JSON

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::session::Session;

/// Common surface of containers, images and volumes
pub trait Asset {
    /// Raw JSON as returned by the CLI
    fn json(&self) -> &Value;

    /// Human-readable name
    fn name(&self) -> Option<&str> {
        self.json().get("Name").and_then(Value::as_str)
    }

    fn to_json(&self) -> Value {
        self.json().clone()
    }
}

/// A docker container, its information and operations
#[derive(Clone)]
pub struct Container {
    json: Value,
    session: Option<Session>,
}

impl Container {
    /// Wrap inspect JSON without a session; lifecycle calls will fail
    pub fn from_json(json: Value) -> Self {
        Self {
            json,
            session: None,
        }
    }

    pub fn parse(json: &str) -> Result<Self> {
        Ok(Self::from_json(serde_json::from_str(json)?))
    }

    pub(crate) fn bound(json: Value, session: Session) -> Self {
        Self {
            json,
            session: Some(session),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Unique SHA256 container hash
    pub fn id(&self) -> Option<&str> {
        self.json.get("Id").and_then(Value::as_str)
    }

    /// First 12 characters of the id, as `docker ps` shows it
    pub fn short_id(&self) -> Option<String> {
        self.id().map(|id| id.chars().take(12).collect())
    }

    /// SHA256 hash of the image the container is derived from
    pub fn image(&self) -> Option<&str> {
        self.json.get("Image").and_then(Value::as_str)
    }

    /// running, exited, etc
    pub fn status(&self) -> Option<&str> {
        self.state("Status").and_then(Value::as_str)
    }

    /// PID of the main process
    pub fn pid(&self) -> Option<i64> {
        self.state("Pid").and_then(Value::as_i64)
    }

    pub fn exit_code(&self) -> Option<i64> {
        self.state("ExitCode").and_then(Value::as_i64)
    }

    pub fn is_running(&self) -> bool {
        self.state("Running")
            .and_then(Value::as_bool)
            .unwrap_or_else(|| self.status() == Some("running"))
    }

    pub fn created(&self) -> Option<DateTime<FixedOffset>> {
        self.json
            .get("Created")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    }

    pub fn kill(&self) -> Result<String> {
        let (session, id) = self.connection()?;
        session.kill(id, None)
    }

    pub fn rm(&self) -> Result<String> {
        let (session, id) = self.connection()?;
        session.rm(id, &Default::default())
    }

    pub fn start(&self) -> Result<String> {
        let (session, id) = self.connection()?;
        session.start(id, &Default::default())
    }

    pub fn stop(&self) -> Result<String> {
        let (session, id) = self.connection()?;
        session.stop(id, None)
    }

    fn state(&self, key: &str) -> Option<&Value> {
        self.json.get("State").and_then(|state| state.get(key))
    }

    fn connection(&self) -> Result<(&Session, &str)> {
        let session = self.session.as_ref().ok_or(Error::Disconnected)?;
        let id = self.id().ok_or(Error::MissingId)?;
        Ok((session, id))
    }
}

impl Asset for Container {
    fn json(&self) -> &Value {
        &self.json
    }

    /// Name minus the leading `/` docker adds
    fn name(&self) -> Option<&str> {
        self.json
            .get("Name")
            .and_then(Value::as_str)
            .map(|name| name.strip_prefix('/').unwrap_or(name))
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Container:{}", self.name().unwrap_or(""))
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("connected", &self.is_connected())
            .finish()
    }
}
