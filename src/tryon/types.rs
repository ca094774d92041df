use std::fmt;

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_with::json::JsonString;
use serde_with::serde_as;

use crate::{ApiResponse, Result};

pub const FINISHED: &str = "finished";

/// One clothing item to dress the model in.
///
/// The image must be reachable from the public internet and between
/// 500x500 and 3000x3000 pixels.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Garment {
    pub image_url: String,
    /// Garment category such as `tops`.
    #[serde(rename = "type")]
    pub kind: String,
}

impl Garment {
    #[must_use]
    pub fn new<U: Into<String>, K: Into<String>>(image_url: U, kind: K) -> Self {
        Self {
            image_url: image_url.into(),
            kind: kind.into(),
        }
    }
}

/// Appearance of the generated model.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Builder)]
#[builder(on(String, into))]
pub struct ModelSpec {
    #[builder(default = String::from("General"))]
    pub base: String,
    #[builder(default = String::from("female"))]
    pub gender: String,
    #[builder(default = String::from("universal_1"))]
    pub style: String,
    #[builder(default = String::from("slim"))]
    pub body: String,
    #[builder(default = String::from("youngadult"))]
    pub age: String,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A single try-on job description.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct TryOnRequest {
    pub clothes_list: Vec<Garment>,
    #[builder(default)]
    pub model: ModelSpec,
    #[builder(default = String::from("fullbody"), into)]
    pub view_type: String,
    /// `1` asks the remote to reject low quality inputs.
    #[builder(default)]
    pub input_quality_detect: u8,
    #[builder(default = 1)]
    pub generate_count: u32,
}

/// Submit body: the descriptor array travels as a JSON-encoded string.
#[serde_as]
#[derive(Debug, Serialize)]
pub(crate) struct SubmitBody<'req> {
    #[serde(rename = "requestParams")]
    #[serde_as(as = "JsonString")]
    pub request_params: &'req [TryOnRequest],
}

/// Remote task reference returned by the submit call.
///
/// A submit response without `data.result.taskId` yields a handle with no
/// id. It is still sent to the results endpoint as `null`, where the remote
/// reports the lookup failure.
#[non_exhaustive]
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct TaskHandle {
    pub task_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SubmitEnvelope {
    data: Option<SubmitData>,
}

#[derive(Debug, Default, Deserialize)]
struct SubmitData {
    result: Option<SubmitResult>,
}

#[derive(Debug, Default, Deserialize)]
struct SubmitResult {
    #[serde(rename = "taskId")]
    task_id: Option<String>,
}

impl TaskHandle {
    #[must_use]
    pub fn new<S: Into<String>>(task_id: S) -> Self {
        Self {
            task_id: Some(task_id.into()),
        }
    }

    /// Reads `data.result.taskId`. Absent keys give a handle without an id.
    pub fn from_submit(response: &ApiResponse) -> Result<Self> {
        let envelope: SubmitEnvelope = response.decode()?;
        let task_id = envelope
            .data
            .and_then(|data| data.result)
            .and_then(|result| result.task_id);

        Ok(Self { task_id })
    }

    #[must_use]
    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }
}

/// Server-side progress of a task. Only `finished` is terminal.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TaskStatus {
    Finished,
    InProgress(String),
    /// The response carried no `data.taskStatus`.
    Missing,
}

#[derive(Debug, Default, Deserialize)]
struct StatusEnvelope {
    data: Option<StatusData>,
}

#[derive(Debug, Default, Deserialize)]
struct StatusData {
    #[serde(rename = "taskStatus")]
    task_status: Option<String>,
}

impl TaskStatus {
    /// Reads `data.taskStatus` from a results response.
    pub fn from_query(response: &ApiResponse) -> Result<Self> {
        let envelope: StatusEnvelope = response.decode()?;
        let status = envelope.data.and_then(|data| data.task_status);

        Ok(match status {
            Some(status) if status == FINISHED => TaskStatus::Finished,
            Some(status) => TaskStatus::InProgress(status),
            None => TaskStatus::Missing,
        })
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskStatus::Finished)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Finished => f.write_str(FINISHED),
            TaskStatus::InProgress(status) => f.write_str(status),
            TaskStatus::Missing => f.write_str("<missing>"),
        }
    }
}

/// How a poll loop ended.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub enum PollOutcome {
    /// The task finished; carries the finishing response verbatim.
    Finished(ApiResponse),
    /// The caller interrupted; carries the last response seen, if any.
    Interrupted(Option<ApiResponse>),
    /// `max_attempts` or `timeout` was reached first.
    Exhausted(Option<ApiResponse>),
}

impl PollOutcome {
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, PollOutcome::Finished(_))
    }

    #[must_use]
    pub fn last_response(&self) -> Option<&ApiResponse> {
        match self {
            PollOutcome::Finished(response) => Some(response),
            PollOutcome::Interrupted(last) | PollOutcome::Exhausted(last) => last.as_ref(),
        }
    }

    #[must_use]
    pub fn into_last_response(self) -> Option<ApiResponse> {
        match self {
            PollOutcome::Finished(response) => Some(response),
            PollOutcome::Interrupted(last) | PollOutcome::Exhausted(last) => last,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::error::Kind;

    fn response(body: &str) -> ApiResponse {
        ApiResponse::parse(body.to_owned()).expect("json body")
    }

    #[test]
    fn submit_body_should_encode_params_as_string() {
        let request = TryOnRequest::builder()
            .clothes_list(vec![Garment::new("https://img/shirt.jpg", "tops")])
            .build();
        let body = serde_json::to_value(SubmitBody {
            request_params: std::slice::from_ref(&request),
        })
        .expect("serializes");

        let encoded = body["requestParams"].as_str().expect("string param");
        let decoded: Value = serde_json::from_str(encoded).expect("inner json");

        assert_eq!(
            decoded,
            json!([{
                "clothesList": [{"imageUrl": "https://img/shirt.jpg", "type": "tops"}],
                "model": {
                    "base": "General",
                    "gender": "female",
                    "style": "universal_1",
                    "body": "slim",
                    "age": "youngadult"
                },
                "viewType": "fullbody",
                "inputQualityDetect": 0,
                "generateCount": 1
            }])
        );
    }

    #[test]
    fn task_handle_should_read_task_id() {
        let handle =
            TaskHandle::from_submit(&response(r#"{"data":{"result":{"taskId":"T1"}}}"#))
                .expect("decodes");

        assert_eq!(handle.task_id(), Some("T1"));
    }

    #[test]
    fn task_handle_should_tolerate_missing_keys() {
        for body in [
            "{}",
            r#"{"data":{}}"#,
            r#"{"data":{"result":{}}}"#,
            r#"{"data":null}"#,
            r#"{"code":"RESOURCE_EXHAUSTED","message":"Sorry, your calling resources have been exhausted"}"#,
        ] {
            let handle = TaskHandle::from_submit(&response(body)).expect("no error");
            assert_eq!(handle.task_id(), None, "body {body}");
        }
    }

    #[test]
    fn missing_handle_should_serialize_null_id() {
        let body = serde_json::to_value(TaskHandle::default()).expect("serializes");

        assert_eq!(body, json!({"task_id": null}));
    }

    #[test]
    fn task_handle_should_reject_wrong_shape() {
        let err = TaskHandle::from_submit(&response(r#"{"data":"oops"}"#)).unwrap_err();

        assert_eq!(err.kind(), Kind::Internal);
    }

    #[test]
    fn task_status_should_classify_values() {
        let finished = TaskStatus::from_query(&response(r#"{"data":{"taskStatus":"finished"}}"#))
            .expect("decodes");
        let running = TaskStatus::from_query(&response(r#"{"data":{"taskStatus":"processing"}}"#))
            .expect("decodes");
        let missing = TaskStatus::from_query(&response(r#"{"data":{}}"#)).expect("decodes");

        assert!(finished.is_finished(), "finished is terminal");
        assert_eq!(running, TaskStatus::InProgress("processing".to_owned()));
        assert!(!running.is_finished(), "processing is not terminal");
        assert_eq!(missing, TaskStatus::Missing);
        assert_eq!(running.to_string(), "processing");
    }

    #[test]
    fn task_status_should_be_case_sensitive() {
        let status = TaskStatus::from_query(&response(r#"{"data":{"taskStatus":"FINISHED"}}"#))
            .expect("decodes");

        assert!(!status.is_finished(), "only lowercase finished is terminal");
    }

    #[test]
    fn poll_outcome_should_expose_last_response() {
        let last = response(r#"{"data":{"taskStatus":"processing"}}"#);

        assert_eq!(
            PollOutcome::Interrupted(Some(last.clone())).last_response(),
            Some(&last)
        );
        assert_eq!(PollOutcome::Interrupted(None).into_last_response(), None);
        assert!(PollOutcome::Finished(last).is_finished(), "finished");
    }
}
