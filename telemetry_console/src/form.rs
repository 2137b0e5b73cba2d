use std::sync::Arc;

use serde_json::Value;
use telemetry_shared::model::TrayectoRequest;
use thiserror::Error;
use url::Url;

use crate::handles::{SubmitEvent, TextInput, TextOutput};

#[derive(Error, Debug)]
pub enum FormError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

/// Bridges a submit action on the trayecto form to the gateway and renders
/// the raw JSON result.
///
/// The handler owns no state of its own: the input it reads and the output it
/// writes are injected at construction.
pub struct FormSubmissionHandler {
    endpoint: Url,
    client: reqwest::Client,
    input: Arc<dyn TextInput>,
    output: Arc<dyn TextOutput>,
}

impl FormSubmissionHandler {
    pub fn new(endpoint: Url, input: Arc<dyn TextInput>, output: Arc<dyn TextOutput>) -> Self {
        FormSubmissionHandler {
            endpoint,
            client: reqwest::Client::new(),
            input,
            output,
        }
    }

    /// One submission: prevent the form's default action, read the current
    /// input value as-is, post `{"trayecto": <value>}`, render the parsed
    /// reply as indented JSON, replacing the output's previous content.
    ///
    /// A failed request or a non-JSON body is returned to the caller
    /// untouched: nothing is written to the output and nothing is retried.
    /// Submissions are not cancelled either; when two overlap, the response
    /// that completes last wins the output write.
    pub async fn handle_submit(&self, event: &mut SubmitEvent) -> Result<(), FormError> {
        event.prevent_default();

        let trayecto = self.input.value();

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&TrayectoRequest { trayecto })
            .send()
            .await?;

        // An HTTP error status is not a failure: the body is rendered
        // whatever the status was.
        let result: Value = response.json().await?;

        self.output.set_text(&serde_json::to_string_pretty(&result)?);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use rstest::rstest;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct StaticInput(&'static str);

    impl TextInput for StaticInput {
        fn value(&self) -> String {
            self.0.to_string()
        }
    }

    /// Returns a different value on each read, for overlapping submissions.
    struct QueuedInput(Mutex<VecDeque<&'static str>>);

    impl QueuedInput {
        fn new(values: [&'static str; 2]) -> Self {
            QueuedInput(Mutex::new(values.into_iter().collect()))
        }
    }

    impl TextInput for QueuedInput {
        fn value(&self) -> String {
            self.0.lock().unwrap().pop_front().unwrap().to_string()
        }
    }

    #[derive(Default)]
    struct SharedOutput(Mutex<String>);

    impl SharedOutput {
        fn with_text(text: &str) -> Self {
            SharedOutput(Mutex::new(text.to_string()))
        }

        fn text(&self) -> String {
            self.0.lock().unwrap().clone()
        }
    }

    impl TextOutput for SharedOutput {
        fn set_text(&self, text: &str) {
            *self.0.lock().unwrap() = text.to_string();
        }
    }

    fn handler(
        endpoint: Url,
        input: Arc<dyn TextInput>,
        output: Arc<dyn TextOutput>,
    ) -> FormSubmissionHandler {
        FormSubmissionHandler::new(endpoint, input, output)
    }

    fn start_endpoint(mock_server: &MockServer) -> Url {
        Url::parse(&format!("{}/start", mock_server.uri())).unwrap()
    }

    #[rstest]
    #[case::a_trayecto("Trayecto 1")]
    #[case::the_empty_string("")]
    #[tokio::test]
    async fn test_submission_posts_exactly_the_input_value(#[case] value: &'static str) {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/start"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"trayecto": value})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let handler = handler(
            start_endpoint(&mock_server),
            Arc::new(StaticInput(value)),
            Arc::new(SharedOutput::default()),
        );

        let mut event = SubmitEvent::new();
        handler.handle_submit(&mut event).await.unwrap();

        assert!(event.default_prevented());

        // The body is the serialized one-key object and nothing else.
        let received = mock_server.received_requests().await.unwrap();
        assert_eq!(
            received.first().unwrap().body,
            format!(r#"{{"trayecto":{}}}"#, json!(value)).into_bytes()
        );
    }

    #[rstest]
    #[case::an_object(json!({"status": "ok"}), "{\n  \"status\": \"ok\"\n}")]
    #[case::an_array(json!([1, 2, 3]), "[\n  1,\n  2,\n  3\n]")]
    #[tokio::test]
    async fn test_response_is_rendered_as_indented_json(#[case] response: Value, #[case] expected: &str) {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/start"))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .mount(&mock_server)
            .await;

        let output = Arc::new(SharedOutput::with_text("previous content"));
        let handler = handler(
            start_endpoint(&mock_server),
            Arc::new(StaticInput("Trayecto 1")),
            output.clone(),
        );

        handler.handle_submit(&mut SubmitEvent::new()).await.unwrap();

        assert_eq!(output.text(), expected);
    }

    #[tokio::test]
    async fn test_an_http_error_status_still_renders_the_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/start"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
            .mount(&mock_server)
            .await;

        let output = Arc::new(SharedOutput::default());
        let handler = handler(
            start_endpoint(&mock_server),
            Arc::new(StaticInput("Trayecto 1")),
            output.clone(),
        );

        handler.handle_submit(&mut SubmitEvent::new()).await.unwrap();

        assert_eq!(output.text(), "{\n  \"error\": \"boom\"\n}");
    }

    #[tokio::test]
    async fn test_a_network_failure_leaves_the_output_untouched() {
        // Nothing listens on the endpoint, so the request itself fails.
        let endpoint = Url::parse("http://127.0.0.1:9/start").unwrap();

        let output = Arc::new(SharedOutput::with_text("previous content"));
        let handler = handler(endpoint, Arc::new(StaticInput("Trayecto 1")), output.clone());

        let mut event = SubmitEvent::new();
        let error = handler.handle_submit(&mut event).await.unwrap_err();

        // The default action is prevented regardless of the outcome.
        assert!(event.default_prevented());
        assert!(matches!(error, FormError::Request(_)));
        assert_eq!(output.text(), "previous content");
    }

    #[tokio::test]
    async fn test_a_non_json_response_leaves_the_output_untouched() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/start"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let output = Arc::new(SharedOutput::with_text("previous content"));
        let handler = handler(
            start_endpoint(&mock_server),
            Arc::new(StaticInput("Trayecto 1")),
            output.clone(),
        );

        let error = handler.handle_submit(&mut SubmitEvent::new()).await.unwrap_err();

        assert!(matches!(error, FormError::Request(_)));
        assert_eq!(output.text(), "previous content");
    }

    #[tokio::test]
    async fn test_overlapping_submissions_are_won_by_the_last_completion() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/start"))
            .and(body_json(json!({"trayecto": "slow"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"winner": "slow"}))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/start"))
            .and(body_json(json!({"trayecto": "fast"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"winner": "fast"})))
            .mount(&mock_server)
            .await;

        let output = Arc::new(SharedOutput::default());
        let handler = handler(
            start_endpoint(&mock_server),
            Arc::new(QueuedInput::new(["slow", "fast"])),
            output.clone(),
        );

        let (mut first, mut second) = (SubmitEvent::new(), SubmitEvent::new());
        let (first_result, second_result) = tokio::join!(
            handler.handle_submit(&mut first),
            handler.handle_submit(&mut second)
        );
        first_result.unwrap();
        second_result.unwrap();

        // Two independent requests raced; the slow one was sent first but
        // completed last, so its response owns the output.
        assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
        assert_eq!(output.text(), "{\n  \"winner\": \"slow\"\n}");
    }
}
