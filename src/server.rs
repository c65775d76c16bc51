//! Actix Web HTTP server.
//!
//! Endpoints:
//! - `GET /api/analysis/stream` — live panel analysis over SSE
//! - `POST /api/analysis/start` — background batch over a stored paper
//! - `GET /api/knowledge/search` — concept snippets from the knowledge base
//! - `GET /health`

use std::sync::Arc;

use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::AnalysisError;
use crate::orchestrator::{AnalysisRequest, Orchestrator};
use crate::store::{KnowledgeBase, PaperStore};
use crate::stream::stream_analysis;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub papers: Arc<dyn PaperStore>,
    pub knowledge: Arc<dyn KnowledgeBase>,
}

pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{port}");
    info!(addr = %addr, "conclave listening");

    let data = web::Data::new(state);

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .route("/health", web::get().to(health_check))
            .route("/api/analysis/stream", web::get().to(handle_stream))
            .route("/api/analysis/start", web::post().to(handle_start))
            .route("/api/knowledge/search", web::get().to(handle_knowledge_search))
    })
    .bind(&addr)
    .with_context(|| format!("failed to bind {addr}"))?
    .run()
    .await
    .context("server error")
}

async fn health_check() -> &'static str {
    "OK"
}

fn require_param(value: Option<String>, name: &str) -> Result<String, AnalysisError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AnalysisError::Validation(format!("{name} is required")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamParams {
    pub paper_content: Option<String>,
    pub paper_title: Option<String>,
}

/// Open the SSE analysis stream
///
/// Validation failures answer 400 before the stream opens. Once open, the
/// response ends only after the stream's single terminal event; a client
/// disconnect drops the body stream, which cancels the producer.
async fn handle_stream(
    state: web::Data<AppState>,
    query: web::Query<StreamParams>,
) -> HttpResponse {
    let params = query.into_inner();
    let (content, title) = match (
        require_param(params.paper_content, "paperContent"),
        require_param(params.paper_title, "paperTitle"),
    ) {
        (Ok(content), Ok(title)) => (content, title),
        _ => return HttpResponse::BadRequest().body("Missing required parameters"),
    };

    let mut analysis = stream_analysis(Arc::clone(&state.orchestrator), content, title);

    let body = async_stream::stream! {
        while let Some(event) = analysis.next_event().await {
            yield Ok::<_, actix_web::Error>(web::Bytes::from(event.to_sse()));
        }
    };

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache, no-store, must-revalidate"))
        .insert_header(("Connection", "keep-alive"))
        .streaming(body)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAnalysisBody {
    pub paper_id: Option<String>,
    #[serde(default)]
    pub analysis_types: Option<Vec<String>>,
}

/// Start a background batch analysis of a stored paper
async fn handle_start(
    state: web::Data<AppState>,
    body: web::Json<StartAnalysisBody>,
) -> HttpResponse {
    let body = body.into_inner();

    let paper_id = match require_param(body.paper_id, "paperId") {
        Ok(id) => id,
        Err(_) => {
            return HttpResponse::BadRequest().json(json!({ "error": "Paper ID is required" }))
        }
    };

    let paper = match state.papers.get_paper(&paper_id).await {
        Ok(Some(paper)) => paper,
        Ok(None) => {
            return HttpResponse::NotFound().json(json!({ "error": "Paper not found" }))
        }
        Err(e) => {
            error!(error = %e, paper_id = %paper_id, "paper lookup failed");
            return HttpResponse::InternalServerError()
                .json(json!({ "error": "Failed to start analysis" }));
        }
    };

    let request = AnalysisRequest {
        paper_id,
        paper,
        analysis_types: body.analysis_types,
    };

    let analysis_id = Uuid::new_v4();
    let orchestrator = Arc::clone(&state.orchestrator);

    // Results are logged; persistence is the store collaborator's concern.
    tokio::spawn(async move {
        let results = orchestrator
            .analyze_with_all_agents(&request.paper.content, &request.paper.title)
            .await;
        info!(
            analysis_id = %analysis_id,
            paper_id = %request.paper_id,
            results = results.len(),
            "background analysis finished"
        );
    });

    HttpResponse::Ok().json(json!({
        "success": true,
        "analysisId": analysis_id,
        "message": "Analysis started successfully",
    }))
}

#[derive(Debug, Deserialize)]
pub struct KnowledgeParams {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

async fn handle_knowledge_search(
    state: web::Data<AppState>,
    query: web::Query<KnowledgeParams>,
) -> HttpResponse {
    let params = query.into_inner();

    let q = match require_param(params.q, "q") {
        Ok(q) => q,
        Err(e) => return HttpResponse::BadRequest().json(json!({ "error": e.to_string() })),
    };
    let limit = params.limit.unwrap_or(5);

    match state.knowledge.search(&q, limit).await {
        Ok(results) => HttpResponse::Ok().json(json!({ "results": results })),
        Err(e) => {
            error!(error = %e, "knowledge search failed");
            HttpResponse::InternalServerError().json(json!({ "error": "Search failed" }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limiter::RateLimiter;
    use crate::model::{GenerationRequest, ModelClient, ModelError};
    use crate::registry::Agent;
    use crate::store::{ConceptSnippet, MemoryStore, PaperRecord};
    use actix_web::{http::StatusCode, test};

    struct EchoClient;

    #[async_trait::async_trait]
    impl ModelClient for EchoClient {
        async fn generate(&self, _request: GenerationRequest) -> Result<String, ModelError> {
            Ok("a short test analysis".to_string())
        }
    }

    fn test_state() -> AppState {
        let agents = vec![
            Agent::new("a1", "Agent One", "Test", "prompt"),
            Agent::new("a2", "Agent Two", "Test", "prompt"),
        ];
        let orchestrator = Arc::new(Orchestrator::with_agents(
            agents,
            Arc::new(EchoClient),
            RateLimiter::new(std::time::Duration::ZERO),
        ));

        let store = Arc::new(MemoryStore::new());
        store.insert_paper(
            "p1",
            PaperRecord {
                title: "A Paper".into(),
                content: "body".into(),
                authors: None,
                abstract_text: None,
                field: None,
                keywords: None,
            },
        );
        store.insert_concept(ConceptSnippet {
            content: "quantum decoherence".into(),
            field: "physics".into(),
            difficulty: "advanced".into(),
        });

        AppState {
            orchestrator,
            papers: store.clone(),
            knowledge: store,
        }
    }

    macro_rules! test_app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(test_state()))
                    .route("/health", web::get().to(health_check))
                    .route("/api/analysis/stream", web::get().to(handle_stream))
                    .route("/api/analysis/start", web::post().to(handle_start))
                    .route(
                        "/api/knowledge/search",
                        web::get().to(handle_knowledge_search),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_health() {
        let app = test_app!();
        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request())
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_stream_requires_both_params() {
        let app = test_app!();

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/analysis/stream?paperTitle=t")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/analysis/stream?paperContent=c")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_stream_emits_sse_frames() {
        let app = test_app!();

        let req = test::TestRequest::get()
            .uri("/api/analysis/stream?paperContent=c&paperTitle=t")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "text/event-stream"
        );
        assert_eq!(
            resp.headers().get("Cache-Control").unwrap(),
            "no-cache, no-store, must-revalidate"
        );

        let body = test::read_body(resp).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("data: {\"type\":\"analysis-start\""));
        assert!(text.contains("\"type\":\"agent-complete\""));
        assert!(text.contains("\"type\":\"analysis-complete\""));
        // One blank line terminates each frame.
        for frame in text.trim_end().split("\n\n") {
            assert!(frame.starts_with("data: "));
        }
    }

    #[actix_web::test]
    async fn test_start_validates_and_looks_up() {
        let app = test_app!();

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/analysis/start")
                .set_json(json!({}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/analysis/start")
                .set_json(json!({ "paperId": "missing" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/analysis/start")
                .set_json(json!({ "paperId": "p1" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert!(body["analysisId"].is_string());
    }

    #[actix_web::test]
    async fn test_knowledge_search() {
        let app = test_app!();

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/knowledge/search")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/knowledge/search?q=quantum")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["results"].as_array().unwrap().len(), 1);
    }
}
