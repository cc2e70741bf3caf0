use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::Deserialize;

use timetable_solver::config::OptimizationConfig;
use timetable_solver::data::{InstitutionData, OptimizationResult};
use timetable_solver::solver;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub institution: InstitutionData,
    #[serde(default)]
    pub config: Option<OptimizationConfig>,
}

async fn generate_handler(
    Json(request): Json<GenerateRequest>,
) -> Result<Json<OptimizationResult>, (StatusCode, String)> {
    // The search is CPU bound; keep it off the async workers.
    let outcome = tokio::task::spawn_blocking(move || {
        solver::generate(&request.institution, request.config)
    })
    .await;

    match outcome {
        Ok(Ok(result)) => Ok(Json(result)),
        Ok(Err(e)) => Err((StatusCode::BAD_REQUEST, e.to_string())),
        Err(e) => {
            error!("Timetable generation task failed: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "timetable generation failed".to_string()))
        }
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

pub fn router() -> Router {
    Router::new()
        .route("/v1/timetable/generate", post(generate_handler))
        .route("/health", get(health_handler))
}

pub async fn run_server(addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);
    axum::serve(listener, router()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn institution() -> Value {
        json!({
            "branches": [{ "id": "CS", "name": "Computer Science", "totalStudents": 40, "sections": 2 }],
            "teachers": [{ "id": "T1", "name": "Ada", "subjectIds": ["ALG"] }],
            "subjects": [{ "id": "ALG", "name": "Algebra", "branchId": "CS", "theoryHours": 1 }],
            "rooms": [{ "id": "R1", "name": "Room 1", "type": "classroom", "capacity": 40 }],
            "preferences": {
                "startTime": "09:00",
                "endTime": "11:00",
                "workingDays": ["Monday"]
            }
        })
    }

    fn post_json(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/timetable/generate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_generate_returns_schedule() {
        let request = post_json(json!({
            "institution": institution(),
            "config": { "maxIterations": 20, "populationSize": 6, "seed": 1 }
        }));
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let result: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(result["statistics"]["totalSessions"], 2);
        assert_eq!(result["conflicts"].as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn test_invalid_input_is_bad_request() {
        let mut institution = institution();
        institution["rooms"] = json!([]);
        let response = router()
            .oneshot(post_json(json!({ "institution": institution })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let message = String::from_utf8(body.to_vec()).unwrap();
        assert!(message.contains("no rooms defined"));
    }

    #[tokio::test]
    async fn test_oversized_period_is_bad_request() {
        let mut institution = institution();
        institution["preferences"]["periodDuration"] = json!(u32::MAX);
        let response = router()
            .oneshot(post_json(json!({ "institution": institution })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let message = String::from_utf8(body.to_vec()).unwrap();
        assert!(message.contains("exceeds the 120-minute working day"));
    }
}
