use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde_json::json;

use crate::config::Config;
use crate::utils::change_feed::{ChangeEvent, ChangeFeed};

pub const SECRET_HEADER: &str = "x-webhook-secret";

/// Row-change notification pushed by the hosted database
#[utoipa::path(
    post,
    path = "/hooks/changes",
    request_body = ChangeEvent,
    params(
        ("x-webhook-secret" = String, Header, description = "Shared webhook secret")
    ),
    responses(
        (status = 202, description = "Event accepted", body = Object, example = json!({
            "delivered": 1
        })),
        (status = 401, description = "Missing or wrong secret")
    ),
    tag = "Hooks"
)]
pub async fn receive_change(
    req: HttpRequest,
    config: web::Data<Config>,
    feed: web::Data<ChangeFeed>,
    payload: web::Json<ChangeEvent>,
) -> actix_web::Result<impl Responder> {
    let secret = req
        .headers()
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok());

    if secret != Some(config.webhook_secret.as_str()) {
        tracing::warn!("Change hook called with a missing or wrong secret");
        return Ok(HttpResponse::Unauthorized().json(json!({
            "message": "Invalid webhook secret"
        })));
    }

    let event = payload.into_inner();
    tracing::debug!(table = ?event.table, kind = ?event.kind, "Change hook received");
    let delivered = feed.publish(event);

    Ok(HttpResponse::Accepted().json(json!({ "delivered": delivered })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::change_feed::{ChangeKind, WatchedTable};
    use actix_web::http::StatusCode;
    use actix_web::{App, test};

    fn body() -> serde_json::Value {
        json!({
            "table": "attendance",
            "kind": "update",
            "subject_id": "user-1",
            "date": "2024-04-15"
        })
    }

    #[actix_web::test]
    async fn accepted_events_reach_subscribers() {
        let feed = web::Data::new(ChangeFeed::new(8));
        let mut rx = feed.subscribe();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Config::for_tests("jwt")))
                .app_data(feed.clone())
                .route("/hooks/changes", web::post().to(receive_change)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/hooks/changes")
            .insert_header((SECRET_HEADER, "hook-secret"))
            .set_json(body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.table, WatchedTable::Attendance);
        assert_eq!(event.kind, ChangeKind::Update);
        assert_eq!(event.subject_id.as_deref(), Some("user-1"));
    }

    #[actix_web::test]
    async fn wrong_secret_is_rejected() {
        let feed = web::Data::new(ChangeFeed::new(8));
        let mut rx = feed.subscribe();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Config::for_tests("jwt")))
                .app_data(feed.clone())
                .route("/hooks/changes", web::post().to(receive_change)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/hooks/changes")
            .insert_header((SECRET_HEADER, "nope"))
            .set_json(body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(rx.try_recv().is_err());
    }
}
