use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
    routing::{get, put},
};
use roller_motion::{CommandError, CommandInterface, RollerState};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

pub type AppState = Arc<CommandInterface>;

/// Body sent by home-automation clients that PUT to `/set_pos` directly.
#[derive(Debug, Deserialize)]
pub struct SetPosBody {
    pub target_pos: i64,
}

pub fn router(command: AppState) -> Router {
    Router::new()
        .route("/state", get(state))
        .route("/set_pos", put(set_pos_body))
        .route("/set_pos/{pos}", put(set_pos))
        .with_state(command)
}

async fn state(State(command): State<AppState>) -> Json<RollerState> {
    Json(command.get_state())
}

async fn set_pos(State(command): State<AppState>, pos: Result<Path<i64>, PathRejection>) -> StatusCode {
    match pos {
        Ok(Path(pos)) => apply(&command, pos),
        Err(e) => {
            warn!("Rejected position: {}", e.body_text());
            StatusCode::BAD_REQUEST
        }
    }
}

// Clients send the JSON body without a usable content type, so parse it raw.
async fn set_pos_body(State(command): State<AppState>, body: Bytes) -> StatusCode {
    match serde_json::from_slice::<SetPosBody>(&body) {
        Ok(body) => apply(&command, body.target_pos),
        Err(e) => {
            warn!("Rejected position body: {}", e);
            StatusCode::BAD_REQUEST
        }
    }
}

fn apply(command: &CommandInterface, pos: i64) -> StatusCode {
    match command.set_target(pos) {
        Ok(_) => StatusCode::OK,
        Err(e @ CommandError::OutOfRange(_)) => {
            warn!(pos, "Rejected position: {}", e);
            StatusCode::BAD_REQUEST
        }
        Err(e @ CommandError::ShuttingDown) => {
            warn!(pos, "Rejected position: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request},
    };
    use roller_motion::{Blackboard, SharedBoard};
    use tower::ServiceExt;

    fn app_state() -> (AppState, SharedBoard) {
        let board: SharedBoard = Arc::new(Blackboard::new());
        (Arc::new(CommandInterface::new(Arc::clone(&board), 192.0)), board)
    }

    async fn send(command: &AppState, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = router(Arc::clone(command)).oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body)
    }

    fn put(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method(Method::PUT)
            .uri(uri)
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_state_reports_percentages() {
        let (command, _) = app_state();
        command.set_target(30).unwrap();

        let request = Request::builder().uri("/state").body(Body::empty()).unwrap();
        let (status, body) = send(&command, request).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "current_pos": 0, "target_pos": 30, "state": 1 }));
    }

    #[tokio::test]
    async fn test_set_pos_path_status_codes() {
        let (command, board) = app_state();

        assert_eq!(send(&command, put("/set_pos/0", "")).await, (StatusCode::OK, Bytes::new()));
        assert_eq!(send(&command, put("/set_pos/100", "")).await, (StatusCode::OK, Bytes::new()));
        assert_eq!(board.snapshot().target, 19200);

        for uri in ["/set_pos/101", "/set_pos/-1", "/set_pos/abc", "/set_pos/50.5"] {
            assert_eq!(
                send(&command, put(uri, "")).await,
                (StatusCode::BAD_REQUEST, Bytes::new()),
                "{uri}"
            );
        }
        assert_eq!(board.snapshot().target, 19200);
    }

    #[tokio::test]
    async fn test_set_pos_body_accepts_home_automation_client() {
        let (command, board) = app_state();

        // The home-automation plugin sends a misspelled header and no Content-Type.
        let request = Request::builder()
            .method(Method::PUT)
            .uri("/set_pos")
            .header("content_type", "application/json")
            .body(Body::from(r#"{"target_pos":50}"#))
            .unwrap();
        assert_eq!(send(&command, request).await, (StatusCode::OK, Bytes::new()));
        assert_eq!(board.snapshot().target, 9600);

        let request = Request::builder()
            .method(Method::PUT)
            .uri("/set_pos")
            .header("content-type", "text/plain;charset=UTF-8")
            .body(Body::from(r#"{"target_pos":25}"#))
            .unwrap();
        assert_eq!(send(&command, request).await, (StatusCode::OK, Bytes::new()));
        assert_eq!(board.snapshot().target, 4800);
    }

    #[tokio::test]
    async fn test_set_pos_body_rejections_are_bare_bad_request() {
        let (command, board) = app_state();
        command.set_target(50).unwrap();

        for body in [
            r#"{"target_pos":150}"#,
            r#"{"target_pos":50.0}"#,
            r#"{"target_pos":"50"}"#,
            r#"{"position":50}"#,
            "not json",
            "",
        ] {
            assert_eq!(
                send(&command, put("/set_pos", body)).await,
                (StatusCode::BAD_REQUEST, Bytes::new()),
                "{body}"
            );
        }
        assert_eq!(board.snapshot().target, 9600);
    }

    #[tokio::test]
    async fn test_set_pos_refused_during_shutdown() {
        let (command, board) = app_state();
        board.request_halt();

        assert_eq!(
            send(&command, put("/set_pos/40", "")).await,
            (StatusCode::SERVICE_UNAVAILABLE, Bytes::new())
        );
        assert_eq!(
            send(&command, put("/set_pos", r#"{"target_pos":40}"#)).await,
            (StatusCode::SERVICE_UNAVAILABLE, Bytes::new())
        );
        assert_eq!(board.snapshot().target, 0);
    }
}
