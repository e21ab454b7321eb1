//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use tallyline_domain::TallyError;
use url::ParseError as UrlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub TallyError);

impl From<InfraError> for TallyError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<TallyError> for InfraError {
    fn from(value: TallyError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoTallyError {
    fn into_tally(self) -> TallyError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TallyError */
/* -------------------------------------------------------------------------- */

impl IntoTallyError for HttpError {
    fn into_tally(self) -> TallyError {
        if self.is_builder() {
            return TallyError::InvalidRequest(format!("cannot build HTTP request: {self}"));
        }

        if self.is_timeout() {
            return TallyError::Transport("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return TallyError::Transport(format!("HTTP connection failure: {self}"));
        }

        if self.is_decode() {
            return TallyError::Decode(self.to_string());
        }

        TallyError::Transport(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_tally())
    }
}

/* -------------------------------------------------------------------------- */
/* url::ParseError → TallyError */
/* -------------------------------------------------------------------------- */

impl IntoTallyError for UrlError {
    fn into_tally(self) -> TallyError {
        TallyError::InvalidRequest(format!("invalid request URL: {self}"))
    }
}

impl From<UrlError> for InfraError {
    fn from(value: UrlError) -> Self {
        Self(value.into_tally())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error (body decompression) → TallyError */
/* -------------------------------------------------------------------------- */

impl IntoTallyError for std::io::Error {
    fn into_tally(self) -> TallyError {
        TallyError::Decode(format!("cannot decompress response body: {self}"))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        Self(value.into_tally())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::time::Duration;

    use reqwest::Client;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn connection_refused_maps_to_transport() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(format!("http://{addr}")).send().await.unwrap_err();

        let mapped: TallyError = InfraError::from(error).into();
        match mapped {
            TallyError::Transport(msg) => assert!(msg.contains("connection")),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn timeout_maps_to_transport() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client =
            Client::builder().no_proxy().timeout(Duration::from_millis(50)).build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap_err();

        let mapped: TallyError = InfraError::from(error).into();
        assert_eq!(mapped, TallyError::Transport("HTTP request timed out".into()));
    }

    #[test]
    fn url_parse_error_maps_to_invalid_request() {
        let error = url::Url::parse("not a url").unwrap_err();
        let mapped: TallyError = InfraError::from(error).into();
        assert!(matches!(mapped, TallyError::InvalidRequest(_)));
    }

    #[test]
    fn io_error_maps_to_decode() {
        let error = std::io::Error::new(std::io::ErrorKind::InvalidData, "corrupt deflate stream");
        let mapped: TallyError = InfraError::from(error).into();
        match mapped {
            TallyError::Decode(msg) => assert!(msg.contains("corrupt deflate stream")),
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
