use crate::domain::models::{ScheduleRecord, Task};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::record_repository::ScheduleRecordRepository;
use crate::infrastructure::task_repository::TaskRepository;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use url::Url;

const TASKS_PATH: [&str; 2] = ["api", "tasks"];
const RECORDS_PATH: [&str; 2] = ["api", "schedule-records"];

/// Planner backend client implementing both repository traits over the
/// backend's REST surface, authenticated with an optional bearer token.
#[derive(Debug, Clone)]
pub struct RestPlannerClient {
    client: Client,
    base_url: Url,
    bearer_token: Option<String>,
}

impl RestPlannerClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: Client::new(),
            base_url,
            bearer_token: None,
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.bearer_token = Some(token.trim().to_string()).filter(|value| !value.is_empty());
        self
    }

    fn endpoint(&self, path: &[&str], resource_id: Option<&str>) -> Result<Url, InfraError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| InfraError::Api("planner api base URL cannot be a base".to_string()))?;
            for segment in path {
                segments.push(segment);
            }
            if let Some(resource_id) = resource_id {
                segments.push(resource_id);
            }
        }
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.bearer_token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn ensure_non_empty(value: &str, field: &str) -> Result<(), InfraError> {
        if value.trim().is_empty() {
            return Err(InfraError::Api(format!("{field} must not be empty")));
        }
        Ok(())
    }

    fn api_http_error(status: reqwest::StatusCode, body: &str) -> InfraError {
        let message = if body.trim().is_empty() {
            format!("planner api error: http {}", status.as_u16())
        } else {
            format!("planner api error: http {}; body={body}", status.as_u16())
        };
        InfraError::Api(message)
    }

    async fn read_success_body(
        response: reqwest::Response,
        context: &str,
    ) -> Result<String, InfraError> {
        let status = response.status();
        let body = response.text().await.map_err(|error| {
            InfraError::Api(format!("failed reading {context} response: {error}"))
        })?;
        if !status.is_success() {
            return Err(Self::api_http_error(status, &body));
        }
        Ok(body)
    }
}

#[async_trait]
impl TaskRepository for RestPlannerClient {
    async fn list(&self) -> Result<Vec<Task>, InfraError> {
        let endpoint = self.endpoint(&TASKS_PATH, None)?;
        let response = self
            .authorize(self.client.get(endpoint))
            .send()
            .await
            .map_err(|error| InfraError::Api(format!("network error while listing tasks: {error}")))?;
        let body = Self::read_success_body(response, "task list").await?;

        serde_json::from_str(&body)
            .map_err(|error| InfraError::Api(format!("invalid task list payload: {error}; body={body}")))
    }

    async fn create(&self, task: &Task) -> Result<Task, InfraError> {
        let endpoint = self.endpoint(&TASKS_PATH, None)?;
        let response = self
            .authorize(self.client.post(endpoint))
            .json(task)
            .send()
            .await
            .map_err(|error| InfraError::Api(format!("network error while creating task: {error}")))?;
        let body = Self::read_success_body(response, "task create").await?;

        serde_json::from_str(&body).map_err(|error| {
            InfraError::Api(format!("invalid task create payload: {error}; body={body}"))
        })
    }

    async fn update(&self, task_id: &str, task: &Task) -> Result<Task, InfraError> {
        Self::ensure_non_empty(task_id, "task id")?;

        let endpoint = self.endpoint(&TASKS_PATH, Some(task_id))?;
        let response = self
            .authorize(self.client.put(endpoint))
            .json(task)
            .send()
            .await
            .map_err(|error| InfraError::Api(format!("network error while updating task: {error}")))?;
        let body = Self::read_success_body(response, "task update").await?;

        serde_json::from_str(&body).map_err(|error| {
            InfraError::Api(format!("invalid task update payload: {error}; body={body}"))
        })
    }

    async fn delete(&self, task_id: &str) -> Result<(), InfraError> {
        Self::ensure_non_empty(task_id, "task id")?;

        let endpoint = self.endpoint(&TASKS_PATH, Some(task_id))?;
        let response = self
            .authorize(self.client.delete(endpoint))
            .send()
            .await
            .map_err(|error| InfraError::Api(format!("network error while deleting task: {error}")))?;
        Self::read_success_body(response, "task delete").await?;
        Ok(())
    }
}

#[async_trait]
impl ScheduleRecordRepository for RestPlannerClient {
    async fn query(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<ScheduleRecord>, InfraError> {
        let endpoint = self.endpoint(&RECORDS_PATH, None)?;
        let response = self
            .authorize(self.client.get(endpoint))
            .query(&[
                ("start_date", start.to_string()),
                ("end_date", end.to_string()),
            ])
            .send()
            .await
            .map_err(|error| {
                InfraError::Api(format!("network error while querying schedule records: {error}"))
            })?;
        let body = Self::read_success_body(response, "schedule record query").await?;

        serde_json::from_str(&body).map_err(|error| {
            InfraError::Api(format!(
                "invalid schedule record query payload: {error}; body={body}"
            ))
        })
    }

    async fn create(&self, record: &ScheduleRecord) -> Result<ScheduleRecord, InfraError> {
        let endpoint = self.endpoint(&RECORDS_PATH, None)?;
        let response = self
            .authorize(self.client.post(endpoint))
            .json(record)
            .send()
            .await
            .map_err(|error| {
                InfraError::Api(format!("network error while creating schedule record: {error}"))
            })?;
        let body = Self::read_success_body(response, "schedule record create").await?;

        serde_json::from_str(&body).map_err(|error| {
            InfraError::Api(format!(
                "invalid schedule record create payload: {error}; body={body}"
            ))
        })
    }

    async fn delete(&self, record_id: &str) -> Result<(), InfraError> {
        Self::ensure_non_empty(record_id, "record id")?;

        let endpoint = self.endpoint(&RECORDS_PATH, Some(record_id))?;
        let response = self
            .authorize(self.client.delete(endpoint))
            .send()
            .await
            .map_err(|error| {
                InfraError::Api(format!("network error while deleting schedule record: {error}"))
            })?;
        Self::read_success_body(response, "schedule record delete").await?;
        Ok(())
    }
}
