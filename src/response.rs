use serde::{de, Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use crate::error::ServiceError;

/// HTTP-style status of a run, serialized as its numeric code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    InternalServerError,
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::InternalServerError => 500,
        }
    }
}

impl Serialize for Status {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u16(self.code())
    }
}

struct StatusCodeVisitor;

impl<'de> de::Visitor<'de> for StatusCodeVisitor {
    type Value = Status;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("one of the status codes 200, 400 or 500")
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        match v {
            200 => Ok(Status::Ok),
            400 => Ok(Status::BadRequest),
            500 => Ok(Status::InternalServerError),
            value => Err(de::Error::custom(format!("unsupported status {value}"))),
        }
    }
}

impl<'de> de::Deserialize<'de> for Status {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_u16(StatusCodeVisitor)
    }
}

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePayload {
    pub status_code: Status,
    pub headers: Value,
    pub body: Value,
}

/// Wraps a run result in the `{ statusCode, headers, body }` envelope.
pub fn make_response_payload(
    result: Result<Value, ServiceError>,
) -> Result<Value, lambda_runtime::Error> {
    let headers = json!({
        "Content-Type": "application/json; charset=utf-8",
        "Access-Control-Allow-Origin": "*"
    });
    let response_payload = match result {
        Err(err) => ResponsePayload {
            status_code: err.status,
            headers,
            body: Value::String(err.msg),
        },
        Ok(body) => ResponsePayload {
            status_code: Status::Ok,
            headers,
            body,
        },
    };
    serde_json::to_value(response_payload).map_err(lambda_runtime::Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_payload() {
        let payload = make_response_payload(Ok(json!({ "duplicates": 2 }))).unwrap();
        assert_eq!(payload["statusCode"], 200);
        assert_eq!(payload["body"]["duplicates"], 2);
    }

    #[test]
    fn test_error_payload_carries_message() {
        let err = ServiceError::bad_request("threshold must be within [0, 100], got -1");
        let payload = make_response_payload(Err(err)).unwrap();
        assert_eq!(payload["statusCode"], 400);
        assert_eq!(payload["body"], "threshold must be within [0, 100], got -1");
    }

    #[test]
    fn test_status_round_trip_rejects_unknown() {
        let status: Status = serde_json::from_str("500").unwrap();
        assert_eq!(status, Status::InternalServerError);
        assert!(serde_json::from_str::<Status>("418").is_err());
    }
}
