use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use crate::aggregator::{Aggregator, Item};
use crate::cache::TtlCache;
use crate::error::AllSourcesFailed;
use crate::pagination::{paginate, Page};

pub struct AppState {
    pub aggregator: Aggregator,
    pub cache: TtlCache<Vec<Item>>,
    pub page_size: usize,
}

// Template structs
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub page: Page,
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

// Custom error type: the only failure a request can surface is a refresh
// with no cached feed to fall back on
pub struct AppError(AllSourcesFailed);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("No feed available: {}", self.0);
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "News is temporarily unavailable, please try again shortly.",
        )
            .into_response()
    }
}

impl From<AllSourcesFailed> for AppError {
    fn from(err: AllSourcesFailed) -> Self {
        AppError(err)
    }
}

#[derive(Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

// Route handlers
pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let feed = state
        .cache
        .get_or_refresh(|| state.aggregator.aggregate())
        .await?;

    let page = paginate(&feed, query.page, state.page_size);

    Ok(HtmlTemplate(IndexTemplate { page }))
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Source;
    use crate::fetcher::Fetcher;
    use axum::{body::Body, http::Request, routing::get, Router};
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rss_body(channel: &str, items: &[(&str, Option<&str>)]) -> String {
        let mut body = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <rss version=\"2.0\"><channel><title>{}</title>",
            channel
        );
        for (title, pub_date) in items {
            body.push_str(&format!(
                "<item><title>{}</title><link>https://{}.example.com/{}</link>",
                title,
                channel.to_lowercase(),
                title.to_lowercase()
            ));
            if let Some(date) = pub_date {
                body.push_str(&format!("<pubDate>{}</pubDate>", date));
            }
            body.push_str("</item>");
        }
        body.push_str("</channel></rss>");
        body
    }

    async fn mock_feed_server(channel: &str, items: &[(&str, Option<&str>)]) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(rss_body(channel, items), "application/rss+xml"),
            )
            .mount(&server)
            .await;
        server
    }

    fn create_test_app(sources: Vec<Source>, page_size: usize) -> Router {
        let aggregator = Aggregator::new(Arc::new(Fetcher::new()), sources);
        let state = Arc::new(AppState {
            aggregator,
            cache: TtlCache::new(Duration::from_secs(60)),
            page_size,
        });

        Router::new()
            .route("/", get(index))
            .route("/health", get(health))
            .with_state(state)
    }

    fn source_for(server: &MockServer, id: usize, name: &str) -> Source {
        Source {
            id,
            name: name.to_string(),
            url: format!("{}/rss", server.uri()),
        }
    }

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    mod health_tests {
        use super::*;

        #[tokio::test]
        async fn test_health_endpoint() {
            let app = create_test_app(Vec::new(), 20);

            let response = app
                .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);

            let body = response.into_body().collect().await.unwrap().to_bytes();
            assert_eq!(&body[..], b"OK");
        }
    }

    mod index_tests {
        use super::*;

        #[tokio::test]
        async fn test_index_renders_merged_items() {
            let server = mock_feed_server(
                "Tech",
                &[
                    ("Newest", Some("Mon, 09 Dec 2024 12:00:00 GMT")),
                    ("Older", Some("Mon, 09 Dec 2024 10:00:00 GMT")),
                ],
            )
            .await;
            let app = create_test_app(vec![source_for(&server, 0, "Tech")], 20);

            let response = app
                .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);

            let body = body_string(response).await;
            assert!(body.contains("Newest"));
            assert!(body.contains("Older"));
            assert!(body.contains("Tech"));
        }

        #[tokio::test]
        async fn test_index_partial_outage_renders_without_error() {
            let healthy = mock_feed_server("Up", &[("Works", None)]).await;

            let broken = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/rss"))
                .respond_with(ResponseTemplate::new(500))
                .mount(&broken)
                .await;

            let app = create_test_app(
                vec![source_for(&healthy, 0, "Up"), source_for(&broken, 1, "Down")],
                20,
            );

            let response = app
                .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);

            let body = body_string(response).await;
            assert!(body.contains("Works"));
            assert!(!body.contains("unavailable"));
        }

        #[tokio::test]
        async fn test_index_all_sources_down_is_503() {
            let broken = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/rss"))
                .respond_with(ResponseTemplate::new(500))
                .mount(&broken)
                .await;

            let app = create_test_app(vec![source_for(&broken, 0, "Down")], 20);

            let response = app
                .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

            let body = body_string(response).await;
            assert!(body.contains("temporarily unavailable"));
        }

        #[tokio::test]
        async fn test_index_page_beyond_range_is_ok_and_empty() {
            let server = mock_feed_server("Tech", &[("Only", None)]).await;
            let app = create_test_app(vec![source_for(&server, 0, "Tech")], 20);

            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/?page=99")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);

            let body = body_string(response).await;
            assert!(!body.contains("Only"));
        }

        #[tokio::test]
        async fn test_index_pagination_splits_items() {
            let server = mock_feed_server(
                "Tech",
                &[
                    ("First", Some("Mon, 09 Dec 2024 12:00:00 GMT")),
                    ("Second", Some("Mon, 09 Dec 2024 11:00:00 GMT")),
                    ("Third", Some("Mon, 09 Dec 2024 10:00:00 GMT")),
                ],
            )
            .await;
            let app = create_test_app(vec![source_for(&server, 0, "Tech")], 2);

            let response = app
                .clone()
                .oneshot(Request::builder().uri("/?page=2").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);

            let body = body_string(response).await;
            assert!(body.contains("Third"));
            assert!(!body.contains("First"));
        }
    }

    mod page_query_tests {
        use super::*;

        #[test]
        fn test_page_query_defaults_to_one() {
            let query: PageQuery = serde_urlencoded::from_str("").unwrap();
            assert_eq!(query.page, 1);
        }

        #[test]
        fn test_page_query_with_value() {
            let query: PageQuery = serde_urlencoded::from_str("page=4").unwrap();
            assert_eq!(query.page, 4);
        }
    }
}
