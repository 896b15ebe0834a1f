//! REST client for the issues endpoints of one repository.

use std::time::Duration;

use async_trait::async_trait;
use pipeline::{
    IssueDraft, IssueTracker, IssueUrl, RepositoryId, RetryPolicy, Timestamp, TrackerError,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::credentials::AuthToken;
use crate::rate_limit::rate_limit_reset;
use crate::GithubError;

/// Public GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Retries granted to a rate-limited request before giving up.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

const API_VERSION: &str = "2022-11-28";
const PER_PAGE: usize = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`GithubClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubConfig {
    /// Base URL of the REST API, without a trailing slash.
    pub api_url: String,
    /// How often a rate-limited request is retried.
    pub max_retries: u32,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            user_agent: concat!("review-filer/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IssueSummary {
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedIssue {
    html_url: String,
}

#[derive(Debug, Serialize)]
struct NewIssue<'a> {
    title: &'a str,
    body: &'a str,
    labels: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Issues API of a single repository.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    issues_url: String,
    repository: RepositoryId,
    max_retries: u32,
}

impl GithubClient {
    /// Builds a client authenticated with `token`.
    ///
    /// # Errors
    ///
    /// [`GithubError::InvalidApiUrl`] if `config.api_url` is not an http(s)
    /// URL, and [`GithubError::NoToken`] if the token cannot be sent as a
    /// header.
    pub fn new(
        config: GithubConfig,
        repository: RepositoryId,
        token: &AuthToken,
    ) -> Result<Self, GithubError> {
        let base = Url::parse(&config.api_url)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .ok_or_else(|| GithubError::InvalidApiUrl(config.api_url.clone()))?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
            .map_err(|_| GithubError::NoToken("token contains invalid characters".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let http = Client::builder()
            .user_agent(config.user_agent)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let issues_url = format!(
            "{}/repos/{}/{}/issues",
            base.as_str().trim_end_matches('/'),
            repository.owner(),
            repository.name()
        );

        Ok(Self {
            http,
            issues_url,
            repository,
            max_retries: config.max_retries,
        })
    }

    /// The repository issues are filed into.
    pub fn repository(&self) -> &RepositoryId {
        &self.repository
    }

    /// Sends the request built by `build`, waiting out rate limits.
    ///
    /// `build` is called once per attempt.
    async fn send(&self, build: impl Fn() -> RequestBuilder) -> Result<Response, GithubError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let response = build().send().await?;
            let status = response.status();
            let now = Timestamp::now();

            if let Some(reset) = rate_limit_reset(status, response.headers(), now) {
                if attempts > self.max_retries {
                    return Err(GithubError::RateLimited { reset, attempts });
                }
                let wait = match RetryPolicy::until_reset(reset, now) {
                    RetryPolicy::Retryable { after } => after.unwrap_or(Duration::ZERO),
                    RetryPolicy::NonRetryable => Duration::ZERO,
                };
                warn!(
                    %reset,
                    attempt = attempts,
                    wait_secs = wait.as_secs_f64(),
                    "Rate limited, retrying after the reset"
                );
                sleep(wait).await;
                continue;
            }

            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiErrorBody>(&text)
                    .map(|body| body.message)
                    .unwrap_or_else(|_| text.chars().take(200).collect());
                return Err(GithubError::Api {
                    status: status.as_u16(),
                    message,
                });
            }
            return Ok(response);
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, GithubError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| GithubError::Decode(e.to_string()))
    }

    /// Fetches the bodies of all issues, open and closed, page by page.
    pub async fn fetch_issue_bodies(&self) -> Result<Vec<String>, GithubError> {
        let mut bodies = Vec::new();
        let mut page = 1usize;
        loop {
            let page_param = page.to_string();
            let per_page = PER_PAGE.to_string();
            let response = self
                .send(|| {
                    self.http.get(&self.issues_url).query(&[
                        ("state", "all"),
                        ("per_page", per_page.as_str()),
                        ("page", page_param.as_str()),
                    ])
                })
                .await?;
            let issues: Vec<IssueSummary> = Self::decode(response).await?;
            let count = issues.len();
            debug!(page, count, "Fetched issue page");
            bodies.extend(issues.into_iter().filter_map(|issue| issue.body));
            if count < PER_PAGE {
                break;
            }
            page += 1;
        }
        debug!(
            repository = %self.repository,
            issues = bodies.len(),
            "Fetched existing issue bodies"
        );
        Ok(bodies)
    }

    /// Creates an issue and returns its `html_url`.
    pub async fn post_issue(&self, draft: &IssueDraft) -> Result<IssueUrl, GithubError> {
        let payload = NewIssue {
            title: &draft.title,
            body: &draft.body,
            labels: draft.labels.iter().map(|label| label.name()).collect(),
        };
        let response = self
            .send(|| self.http.post(&self.issues_url).json(&payload))
            .await?;
        let created: CreatedIssue = Self::decode(response).await?;
        IssueUrl::new(created.html_url)
            .ok_or_else(|| GithubError::Decode("created issue has an empty html_url".into()))
    }
}

#[async_trait]
impl IssueTracker for GithubClient {
    async fn list_issue_bodies(&self) -> Result<Vec<String>, TrackerError> {
        Ok(self.fetch_issue_bodies().await?)
    }

    async fn create_issue(&self, draft: &IssueDraft) -> Result<IssueUrl, TrackerError> {
        Ok(self.post_issue(draft).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::{IdentityHash, Label};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ISSUES_PATH: &str = "/repos/acme/widget/issues";

    fn client(server: &MockServer, max_retries: u32) -> GithubClient {
        let config = GithubConfig {
            api_url: server.uri(),
            max_retries,
            ..GithubConfig::default()
        };
        GithubClient::new(
            config,
            RepositoryId::new("acme", "widget").expect("valid repository"),
            &AuthToken::new("t0k"),
        )
        .expect("client")
    }

    fn draft() -> IssueDraft {
        IssueDraft {
            title: "§5: Typo".into(),
            body: "<!-- id: abc -->\nbody".into(),
            labels: vec![Label::Technical, Label::Editorial],
            hash: IdentityHash::compute("Typo", "Fix", ""),
        }
    }

    /// A rate-limit reset already in the past, so the retry wait is zero.
    fn past_reset() -> String {
        (Timestamp::now().as_datetime().timestamp() - 10).to_string()
    }

    #[tokio::test]
    async fn lists_bodies_across_pages() {
        let server = MockServer::start().await;
        let full_page: Vec<_> = (0..100)
            .map(|i| {
                if i % 10 == 0 {
                    json!({ "body": null })
                } else {
                    json!({ "body": format!("issue {i}") })
                }
            })
            .collect();
        Mock::given(method("GET"))
            .and(path(ISSUES_PATH))
            .and(query_param("state", "all"))
            .and(query_param("per_page", "100"))
            .and(query_param("page", "1"))
            .and(header("authorization", "Bearer t0k"))
            .and(header("x-github-api-version", API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(full_page)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(ISSUES_PATH))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "body": "last" }])))
            .expect(1)
            .mount(&server)
            .await;

        let bodies = client(&server, 0).fetch_issue_bodies().await.expect("bodies");
        assert_eq!(bodies.len(), 91);
        assert_eq!(bodies.last().map(String::as_str), Some("last"));
    }

    #[tokio::test]
    async fn creates_issue_with_label_names() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ISSUES_PATH))
            .and(body_json(json!({
                "title": "§5: Typo",
                "body": "<!-- id: abc -->\nbody",
                "labels": ["technical", "editorial"],
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "number": 7,
                "html_url": "https://github.com/acme/widget/issues/7",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let url = client(&server, 0).create_issue(&draft()).await.expect("created");
        assert_eq!(url.as_str(), "https://github.com/acme/widget/issues/7");
    }

    #[tokio::test]
    async fn waits_out_a_rate_limit_and_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ISSUES_PATH))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header("x-ratelimit-remaining", "0")
                    .insert_header("x-ratelimit-reset", past_reset())
                    .set_body_json(json!({ "message": "API rate limit exceeded" })),
            )
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(ISSUES_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "html_url": "https://github.com/acme/widget/issues/8",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let url = client(&server, 3).create_issue(&draft()).await.expect("created");
        assert_eq!(url.as_str(), "https://github.com/acme/widget/issues/8");
    }

    #[tokio::test]
    async fn gives_up_after_the_retry_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ISSUES_PATH))
            .respond_with(
                ResponseTemplate::new(429).insert_header("x-ratelimit-reset", past_reset()),
            )
            .expect(3)
            .mount(&server)
            .await;

        let err = client(&server, 2).list_issue_bodies().await.expect_err("rate limited");
        assert!(matches!(err, TrackerError::RateLimited { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn api_errors_carry_the_github_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ISSUES_PATH))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({ "message": "Validation Failed" })),
            )
            .mount(&server)
            .await;

        let err = client(&server, 10).create_issue(&draft()).await.expect_err("rejected");
        assert_eq!(
            err,
            TrackerError::Api {
                status: 422,
                message: "Validation Failed".into()
            }
        );
    }

    #[tokio::test]
    async fn malformed_listing_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ISSUES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server, 0).list_issue_bodies().await.expect_err("bad body");
        assert!(matches!(err, TrackerError::Decode(_)));
    }

    #[test]
    fn rejects_non_http_api_urls() {
        let config = GithubConfig {
            api_url: "ftp://example.com".into(),
            ..GithubConfig::default()
        };
        let err = GithubClient::new(
            config,
            RepositoryId::new("acme", "widget").expect("valid repository"),
            &AuthToken::new("t0k"),
        )
        .expect_err("invalid url");
        assert!(matches!(err, GithubError::InvalidApiUrl(_)));
    }
}
