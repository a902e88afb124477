/// Blocking HTTP client for the airport user API.
use std::time::Duration;

use serde_json::Value;

use super::errors::AirportError;
use super::payload::Resource;
use super::registry::AirportProfile;

/// Global request timeout. One call per invocation, so this bounds the whole run.
const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the URL for `resource` on `host`.
#[must_use]
pub fn resource_url(host: &str, resource: Resource) -> String {
    format!("https://{host}/api/v1/user/{}", resource.path())
}

/// GET `resource` for `profile` and parse the body as JSON.
///
/// Sends `Authorization: <token>` and, only when the profile has one,
/// `Cookie: <value>`. No retries.
///
/// # Errors
///
/// Returns `AirportError::RemoteRequest` on transport failure or a non-2xx
/// status, and `AirportError::MalformedResponse` if the body is not JSON.
pub fn fetch(profile: &AirportProfile, resource: Resource) -> Result<Value, AirportError> {
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(API_TIMEOUT))
        .http_status_as_error(false)
        .build()
        .into();

    let url = resource_url(&profile.host, resource);
    tracing::debug!(%url, cookie = profile.cookie.is_some(), "requesting");

    let mut request = agent.get(url.as_str());
    for (name, value) in request_headers(profile) {
        request = request.header(name, value);
    }

    let transport_error = |e: ureq::Error| AirportError::RemoteRequest {
        host: profile.host.clone(),
        status: None,
        cause: e.to_string(),
    };

    let mut response = request.call().map_err(transport_error)?;
    let status = response.status().as_u16();
    tracing::debug!(status, "response received");
    check_status(&profile.host, status)?;

    let body = response.body_mut().read_to_string().map_err(transport_error)?;
    parse_body(resource, &body)
}

/// Headers sent with every request. `Cookie` is included only when configured.
fn request_headers(profile: &AirportProfile) -> Vec<(&'static str, String)> {
    let mut headers = vec![
        ("User-Agent", format!("airq/{}", env!("CARGO_PKG_VERSION"))),
        ("Authorization", profile.authorization.clone()),
    ];
    if let Some(cookie) = &profile.cookie {
        headers.push(("Cookie", cookie.clone()));
    }
    headers
}

fn check_status(host: &str, status: u16) -> Result<(), AirportError> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    Err(AirportError::RemoteRequest {
        host: host.to_owned(),
        status: Some(status),
        cause: format!("HTTP {status}"),
    })
}

fn parse_body(resource: Resource, body: &str) -> Result<Value, AirportError> {
    serde_json::from_str(body).map_err(|e| {
        AirportError::malformed(resource.path(), format!("body is not valid JSON: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_urls() {
        assert_eq!(
            resource_url("air.example", Resource::Subscribe),
            "https://air.example/api/v1/user/getSubscribe"
        );
        assert_eq!(
            resource_url("air.example", Resource::Servers),
            "https://air.example/api/v1/user/server/fetch"
        );
        assert_eq!(
            resource_url("air.example:8443", Resource::TrafficLog),
            "https://air.example:8443/api/v1/user/stat/getTrafficLog"
        );
    }

    fn profile(cookie: Option<&str>) -> AirportProfile {
        AirportProfile {
            host: "air.example".to_owned(),
            authorization: "tok".to_owned(),
            cookie: cookie.map(str::to_owned),
        }
    }

    fn header<'a>(headers: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_cookie_sent_only_when_configured() {
        let without = request_headers(&profile(None));
        assert_eq!(header(&without, "Authorization"), Some("tok"));
        assert_eq!(header(&without, "Cookie"), None);

        let with = request_headers(&profile(Some("sid=1")));
        assert_eq!(header(&with, "Authorization"), Some("tok"));
        assert_eq!(header(&with, "Cookie"), Some("sid=1"));
    }

    #[test]
    fn test_non_success_status() {
        assert!(check_status("air.example", 200).is_ok());
        assert!(check_status("air.example", 204).is_ok());
        match check_status("air.example", 403) {
            Err(AirportError::RemoteRequest { host, status, .. }) => {
                assert_eq!(host, "air.example");
                assert_eq!(status, Some(403));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(
            check_status("air.example", 302),
            Err(AirportError::RemoteRequest { status: Some(302), .. })
        ));
    }

    #[test]
    fn test_html_body_is_malformed() {
        match parse_body(Resource::Servers, "<html>blocked</html>") {
            Err(AirportError::MalformedResponse { resource, detail }) => {
                assert_eq!(resource, "server/fetch");
                assert!(detail.starts_with("body is not valid JSON"), "{detail}");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(
            parse_body(Resource::Subscribe, r#"{"data": {}}"#).unwrap(),
            serde_json::json!({"data": {}})
        );
    }
}
