use super::{API_VERSION, get_password};
use crate::config::ServerConfig;
use crate::core::data::{
    Course, Credentials, Exercise, FeedbackAnswer, Review, SubmissionResult,
};
use crate::core::traits::ProtocolClient;
use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct CourseList {
    courses: Vec<Course>,
}

#[derive(Debug, Deserialize)]
struct CourseDetails {
    course: Course,
}

#[derive(Debug, Deserialize)]
struct ReviewList {
    reviews: Vec<Review>,
}

#[derive(Debug, Deserialize)]
struct SubmissionResponse {
    submission_url: String,
    #[serde(default)]
    paste_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct FeedbackRequest<'a> {
    answers: &'a [FeedbackAnswer],
}

pub struct HttpProtocol {
    client: Client,
    server_url: RwLock<String>,
    credentials: RwLock<Option<Credentials>>,
    poll_interval: Duration,
    poll_attempts: u32,
}

impl HttpProtocol {
    pub fn new(config: &ServerConfig) -> AppResult<Self> {
        let credentials = match (&config.username, config.password.clone().or_else(get_password)) {
            (Some(username), Some(password)) => Some(Credentials::new(username.clone(), password)),
            _ => None,
        };

        Ok(Self {
            client: Client::builder()
                .user_agent(concat!("tmc-core/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| AppError::Network(format!("Failed to create HTTP client: {}", e)))?,
            server_url: RwLock::new(config.url.trim_end_matches('/').to_string()),
            credentials: RwLock::new(credentials),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            poll_attempts: config.poll_attempts,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.server_url.read();
        let separator = if path.contains('?') { '&' } else { '?' };
        format!("{}/{}{}api_version={}", base, path, separator, API_VERSION)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.read().as_ref() {
            Some(creds) => request.basic_auth(&creds.username, Some(&creds.password)),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> AppResult<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| AppError::Network(format!("Failed to {}: {}", what, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Network(format!(
                "Failed to {}: {} - {}",
                what, status, error_text
            )));
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> AppResult<T> {
        debug!(url, "GET");
        let response = self.send(self.client.get(url), what).await?;
        response
            .json()
            .await
            .map_err(|e| AppError::Protocol(format!("Failed to parse response to {}: {}", what, e)))
    }

    fn return_url<'a>(&self, exercise: &'a Exercise) -> AppResult<&'a str> {
        exercise.return_url.as_deref().ok_or_else(|| {
            AppError::Protocol(format!("Exercise '{}' does not accept submissions", exercise.name))
        })
    }

    async fn upload(&self, exercise: &Exercise, archive: Vec<u8>, paste: bool) -> AppResult<SubmissionResponse> {
        let url = self.return_url(exercise)?;
        let part = Part::bytes(archive)
            .file_name("submission.zip")
            .mime_str("application/zip")
            .map_err(|e| AppError::System(format!("Failed to build submission: {}", e)))?;
        let mut form = Form::new().part("submission[file]", part);
        if paste {
            form = form.text("paste", "1");
        }

        let response = self
            .send(self.client.post(url).multipart(form), "upload submission")
            .await?;
        response
            .json()
            .await
            .map_err(|e| AppError::Protocol(format!("Failed to parse submission response: {}", e)))
    }

    /// Poll the submission until the server has finished processing it
    async fn wait_for_result(&self, submission_url: &str) -> AppResult<SubmissionResult> {
        for attempt in 0..self.poll_attempts {
            let mut result: SubmissionResult =
                self.get_json(submission_url, "fetch submission result").await?;
            if !result.is_processing() {
                result.submission_url = submission_url.to_string();
                return Ok(result);
            }
            debug!(attempt, "submission still processing");
            tokio::time::sleep(self.poll_interval).await;
        }

        Err(AppError::Network(format!(
            "Submission {} was not processed in time",
            submission_url
        )))
    }
}

#[async_trait]
impl ProtocolClient for HttpProtocol {
    async fn authenticate(&self, credentials: &Credentials) -> AppResult<bool> {
        let url = format!("{}/user", self.server_url.read());
        let response = self
            .client
            .get(&url)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .send()
            .await
            .map_err(|e| AppError::Network(format!("Failed to authenticate: {}", e)))?;

        match response.status() {
            status if status.is_success() => {
                *self.credentials.write() = Some(credentials.clone());
                Ok(true)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(false),
            status => Err(AppError::Network(format!("Failed to authenticate: {}", status))),
        }
    }

    async fn logout(&self) -> AppResult<()> {
        *self.credentials.write() = None;
        Ok(())
    }

    async fn choose_server(&self, url: &str) -> AppResult<()> {
        *self.server_url.write() = url.trim_end_matches('/').to_string();
        info!(server = url, "server selected");
        Ok(())
    }

    async fn fetch_courses(&self) -> AppResult<Vec<Course>> {
        let list: CourseList = self
            .get_json(&self.endpoint("courses.json"), "list courses")
            .await?;
        Ok(list.courses)
    }

    async fn fetch_course(&self, course_id: &str) -> AppResult<Course> {
        let url = self.endpoint(&format!("courses/{}.json", course_id));
        let details: CourseDetails = self.get_json(&url, "fetch course").await?;
        let mut course = details.course;
        for exercise in &mut course.exercises {
            exercise.course_name = course.name.clone();
        }
        Ok(course)
    }

    async fn fetch_exercises(&self, course: &Course) -> AppResult<Vec<Exercise>> {
        Ok(self.fetch_course(&course.id.to_string()).await?.exercises)
    }

    async fn download_exercise(&self, exercise: &Exercise) -> AppResult<Vec<u8>> {
        let url = exercise.zip_url.as_deref().ok_or_else(|| {
            AppError::Protocol(format!("Exercise '{}' has no download address", exercise.name))
        })?;
        let response = self.send(self.client.get(url), "download exercise").await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Network(format!("Failed to read exercise archive: {}", e)))?;
        Ok(bytes.to_vec())
    }

    async fn fetch_unread_reviews(&self, course: &Course) -> AppResult<Vec<Review>> {
        let url = match &course.reviews_url {
            Some(url) => url.clone(),
            None => self.endpoint(&format!("courses/{}/reviews.json", course.id)),
        };
        let list: ReviewList = self.get_json(&url, "fetch reviews").await?;
        Ok(list
            .reviews
            .into_iter()
            .filter(|review| !review.marked_as_read)
            .collect())
    }

    async fn submit(&self, exercise: &Exercise, archive: Vec<u8>) -> AppResult<SubmissionResult> {
        let response = self.upload(exercise, archive, false).await?;
        info!(exercise = %exercise.name, url = %response.submission_url, "submission uploaded");
        self.wait_for_result(&response.submission_url).await
    }

    async fn send_feedback(
        &self,
        answers: &[FeedbackAnswer],
        feedback_url: &str,
    ) -> AppResult<bool> {
        let request = self
            .client
            .post(feedback_url)
            .json(&FeedbackRequest { answers });
        self.send(request, "send feedback").await?;
        Ok(true)
    }

    async fn paste(&self, exercise: &Exercise, archive: Vec<u8>) -> AppResult<String> {
        let response = self.upload(exercise, archive, true).await?;
        response
            .paste_url
            .ok_or_else(|| AppError::Protocol("Server did not return a paste address".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_config() -> ServerConfig {
        ServerConfig {
            url: "https://tmc.example.org/".to_string(),
            username: Some("student".to_string()),
            password: Some("secret".to_string()),
            poll_interval_ms: 10,
            poll_attempts: 3,
        }
    }

    #[test]
    fn test_endpoint_appends_api_version() {
        let protocol = HttpProtocol::new(&server_config()).unwrap();

        assert_eq!(
            protocol.endpoint("courses.json"),
            "https://tmc.example.org/courses.json?api_version=7"
        );
        assert_eq!(
            protocol.endpoint("courses/21/reviews.json?unread=1"),
            "https://tmc.example.org/courses/21/reviews.json?unread=1&api_version=7"
        );
    }

    #[tokio::test]
    async fn test_choose_server_and_logout_update_session() {
        let protocol = HttpProtocol::new(&server_config()).unwrap();
        assert!(protocol.credentials.read().is_some());

        protocol.choose_server("http://localhost:3000/").await.unwrap();
        protocol.logout().await.unwrap();

        assert_eq!(
            protocol.endpoint("courses.json"),
            "http://localhost:3000/courses.json?api_version=7"
        );
        assert!(protocol.credentials.read().is_none());
    }

    #[tokio::test]
    async fn test_submit_without_return_url_is_protocol_error() {
        let protocol = HttpProtocol::new(&server_config()).unwrap();
        let exercise = Exercise::new(1, "viikko1-Tehtava1", "abc");

        let err = protocol.submit(&exercise, Vec::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Protocol(_)));
    }
}
