use crate::config::Config;
use crate::helper::page_helpers::{self, PageError, PageSettings};
use crate::helper::text_helpers::LinkStyle;
use crate::models::post_store;
use crate::AppState;
use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use tera::Tera;

const HTML: &str = "text/html; charset=utf-8";

#[derive(Deserialize)]
pub struct PostQuery {
    slug: Option<String>,
}

pub fn config_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/is_server_active", web::get().to(is_server_active))
            .route("/format", web::post().to(format_preview))
            .route("/reload", web::post().to(reload_posts)),
    )
    .route("/", web::get().to(listing_page))
    .route("/post", web::get().to(post_page));
}

fn page_settings(config: &Config) -> PageSettings<'_> {
    PageSettings {
        site_title: &config.site_title,
        excerpt_length: config.excerpt_length,
        link_style: LinkStyle::Query,
        static_prefix: "/static",
        home_link: "/",
    }
}

async fn is_server_active() -> impl Responder {
    HttpResponse::Ok().body("active")
}

async fn format_preview(body: String, state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().content_type(HTML).body(state.formatter.format(&body))
}

async fn reload_posts(state: web::Data<AppState>, config: web::Data<Config>) -> impl Responder {
    match post_store::load_posts(&config.posts_path) {
        Ok(posts) => {
            let count = state.replace_posts(posts);
            log::info!("Reloaded {} post(s)", count);
            HttpResponse::Ok().json(json!({ "posts": count }))
        }
        Err(e) => {
            log::error!("Failed to reload posts: {}", e);
            HttpResponse::InternalServerError().json(json!({ "error": e.to_string() }))
        }
    }
}

async fn listing_page(state: web::Data<AppState>, config: web::Data<Config>) -> impl Responder {
    let settings = page_settings(&config);
    let posts = state.posts();

    match page_helpers::render_listing(&state.tera, &posts, &settings) {
        Ok(html) => HttpResponse::Ok().content_type(HTML).body(html),
        Err(e) => error_page(&state.tera, &e, &settings),
    }
}

async fn post_page(
    state: web::Data<AppState>,
    config: web::Data<Config>,
    query: web::Query<PostQuery>,
) -> impl Responder {
    let settings = page_settings(&config);
    let posts = state.posts();

    let rendered = page_helpers::resolve_post(&posts, query.slug.as_deref())
        .and_then(|post| page_helpers::render_post(&state.tera, post, &state.formatter, &settings));

    match rendered {
        Ok(html) => HttpResponse::Ok().content_type(HTML).body(html),
        Err(e) => error_page(&state.tera, &e, &settings),
    }
}

fn error_page(tera: &Tera, error: &PageError, settings: &PageSettings) -> HttpResponse {
    let (status, message) = match error {
        PageError::MissingSlug => (StatusCode::BAD_REQUEST, error.to_string()),
        PageError::NotFound(slug) => {
            log::debug!("No post with slug '{}'", slug);
            (StatusCode::NOT_FOUND, error.to_string())
        }
        PageError::Template(e) => {
            log::error!("Failed to render page: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong while rendering this page.".to_string(),
            )
        }
    };

    match page_helpers::render_error(tera, &message, settings) {
        Ok(html) => HttpResponse::build(status).content_type(HTML).body(html),
        Err(e) => {
            log::error!("Failed to render error page: {}", e);
            HttpResponse::build(status).content_type("text/plain").body(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::{EscapePolicy, Formatter};
    use crate::models::Post;
    use actix_web::{test, App};
    use std::fs;
    use tempfile::tempdir;

    fn post(slug: &str, created_at: &str) -> Post {
        Post {
            title: format!("Title {slug}"),
            slug: slug.to_string(),
            content: format!("# Heading {slug}\n\nBody with **bold**"),
            created_at: created_at.to_string(),
            likes: Some(1),
            views: Some(5),
        }
    }

    fn state(posts: Vec<Post>, policy: EscapePolicy) -> web::Data<AppState> {
        let tera = page_helpers::build_tera().unwrap();
        web::Data::new(AppState::new(posts, Formatter::with_policy(policy), tera))
    }

    fn config() -> web::Data<Config> {
        web::Data::new(Config {
            site_title: "Preview".to_string(),
            ..Config::default()
        })
    }

    macro_rules! app {
        ($state:expr, $config:expr) => {
            test::init_service(
                App::new()
                    .app_data($state.clone())
                    .app_data($config.clone())
                    .configure(config_api),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_is_server_active() {
        let app = app!(state(vec![], EscapePolicy::Trusted), config());
        let req = test::TestRequest::get().uri("/api/is_server_active").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "active");
    }

    #[actix_web::test]
    async fn test_listing_is_newest_first() {
        let posts = vec![post("old", "2024-01-01T00:00:00Z"), post("new", "2025-01-01T00:00:00Z")];
        let app = app!(state(posts, EscapePolicy::Trusted), config());

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("<title>Preview</title>"));
        let new = body.find("/post?slug=new").unwrap();
        let old = body.find("/post?slug=old").unwrap();
        assert!(new < old);
    }

    #[actix_web::test]
    async fn test_post_page_statuses() {
        let app = app!(state(vec![post("hello", "2025-01-01T00:00:00Z")], EscapePolicy::Trusted), config());

        let req = test::TestRequest::get().uri("/post?slug=hello").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("<h1>Heading hello</h1>"));
        assert!(body.contains("<strong>bold</strong>"));

        let req = test::TestRequest::get().uri("/post").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("No post specified in URL. Please check the link."));

        let req = test::TestRequest::get().uri("/post?slug=missing").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("Post not found."));
    }

    #[actix_web::test]
    async fn test_format_preview_uses_policy() {
        let app = app!(state(vec![], EscapePolicy::Escape), config());
        let req = test::TestRequest::post()
            .uri("/api/format")
            .set_payload("*hi* <script>")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, "<p><em>hi</em> &lt;script&gt;</p>");
    }

    #[actix_web::test]
    async fn test_reload_posts() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("posts.json");
        fs::write(
            &file,
            r#"[{"title":"Fresh","slug":"fresh","content":"New body","created_at":"2025-03-01"}]"#,
        )
        .unwrap();

        let state = state(vec![], EscapePolicy::Trusted);
        let config = web::Data::new(Config {
            posts_path: file,
            ..Config::default()
        });
        let app = app!(state, config);

        let req = test::TestRequest::post().uri("/api/reload").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "posts": 1 }));

        let req = test::TestRequest::get().uri("/post?slug=fresh").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_reload_failure_keeps_posts() {
        let dir = tempdir().unwrap();
        let state = state(vec![post("kept", "2025-01-01")], EscapePolicy::Trusted);
        let config = web::Data::new(Config {
            posts_path: dir.path().join("gone.json"),
            ..Config::default()
        });
        let app = app!(state, config);

        let req = test::TestRequest::post().uri("/api/reload").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(state.posts().len(), 1);
    }
}
