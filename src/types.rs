// src/types.rs
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::clock::iso8601;
use crate::error::{Error, Result, SchemaProblem};

pub const MEASUREMENT: &str = "server";

/// The `data` object of the `server` resource, strictly typed.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerStatus {
    pub total_time: i64,
    pub is_ready: bool,
    pub pirate_used_pcu: i64,
    pub simulation_cpu_load: f64,
    pub server_name: String,
    pub world_name: String,
    pub sim_speed: f64,
    pub players: i64,
    pub game: String,
    pub version: String,
    pub used_pcu: i64,
    pub server_id: i64,
}

impl ServerStatus {
    /// Project a full response body (`{"data": {...}}`).
    ///
    /// Fails on the first missing or mistyped field; nothing partial is returned.
    pub fn from_response(body: &Value) -> Result<Self> {
        let data = match body.get("data") {
            Some(Value::Object(map)) => map,
            Some(other) => return Err(wrong_type("data", "object", other)),
            None => return Err(missing("data")),
        };
        Self::from_data(data)
    }

    pub fn from_data(data: &Map<String, Value>) -> Result<Self> {
        let f = Fields(data);
        Ok(Self {
            total_time: f.integer("TotalTime")?,
            is_ready: f.boolean("IsReady")?,
            pirate_used_pcu: f.integer("PirateUsedPCU")?,
            simulation_cpu_load: f.float("SimulationCpuLoad")?,
            server_name: f.string("ServerName")?,
            world_name: f.string("WorldName")?,
            sim_speed: f.float("SimSpeed")?,
            players: f.integer("Players")?,
            game: f.string("Game")?,
            version: f.string("Version")?,
            used_pcu: f.integer("UsedPCU")?,
            server_id: f.integer("ServerId")?,
        })
    }

    /// Field set in the order the API documents them.
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        use FieldValue::*;
        vec![
            ("TotalTime", Integer(self.total_time)),
            ("IsReady", Boolean(self.is_ready)),
            ("PirateUsedPCU", Integer(self.pirate_used_pcu)),
            ("SimulationCpuLoad", Float(self.simulation_cpu_load)),
            ("ServerName", Text(self.server_name.clone())),
            ("WorldName", Text(self.world_name.clone())),
            ("SimSpeed", Float(self.sim_speed)),
            ("Players", Integer(self.players)),
            ("Game", Text(self.game.clone())),
            ("Version", Text(self.version.clone())),
            ("UsedPCU", Integer(self.used_pcu)),
            ("ServerId", Integer(self.server_id)),
        ]
    }
}

struct Fields<'a>(&'a Map<String, Value>);

impl<'a> Fields<'a> {
    fn get(&self, name: &'static str) -> Result<&'a Value> {
        match self.0.get(name) {
            None | Some(Value::Null) => Err(missing(name)),
            Some(v) => Ok(v),
        }
    }

    /// Integers as-is; finite floats truncate toward zero.
    fn integer(&self, name: &'static str) -> Result<i64> {
        let v = self.get(name)?;
        if let Some(i) = v.as_i64() {
            return Ok(i);
        }
        match v.as_f64() {
            Some(x) if x.is_finite() && x >= i64::MIN as f64 && x < i64::MAX as f64 => {
                Ok(x.trunc() as i64)
            }
            _ => Err(wrong_type(name, "integer", v)),
        }
    }

    fn float(&self, name: &'static str) -> Result<f64> {
        let v = self.get(name)?;
        v.as_f64().ok_or_else(|| wrong_type(name, "float", v))
    }

    fn boolean(&self, name: &'static str) -> Result<bool> {
        let v = self.get(name)?;
        v.as_bool().ok_or_else(|| wrong_type(name, "boolean", v))
    }

    fn string(&self, name: &'static str) -> Result<String> {
        let v = self.get(name)?;
        v.as_str()
            .map(str::to_owned)
            .ok_or_else(|| wrong_type(name, "string", v))
    }
}

fn missing(field: &'static str) -> Error {
    Error::SchemaMismatch {
        field,
        problem: SchemaProblem::Missing,
    }
}

fn wrong_type(field: &'static str, expected: &'static str, found: &Value) -> Error {
    let found = match found {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    Error::SchemaMismatch {
        field,
        problem: SchemaProblem::WrongType {
            expected,
            found: found.to_string(),
        },
    }
}

/// A server status reading stamped with the cycle's timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerStatusPoint {
    pub timestamp: DateTime<Utc>,
    pub status: ServerStatus,
}

impl ServerStatusPoint {
    pub fn timestamp_iso(&self) -> String {
        iso8601(self.timestamp)
    }

    pub fn to_point(&self) -> Point {
        Point {
            measurement: MEASUREMENT.to_string(),
            time: self.timestamp,
            fields: self
                .status
                .fields()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

/// A tag-less time-series point as handed to a sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub time: DateTime<Utc>,
    pub fields: Vec<(String, FieldValue)>,
}

impl Point {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}
