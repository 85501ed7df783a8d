//! Integration tests for the user API endpoints.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use padron_registry::{UserRegistry, EMAIL_INVALID, EMAIL_IN_USE, NAME_REQUIRED, USER_NOT_FOUND};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::server::{build_router, AppState};

    fn test_router() -> Router {
        let state = AppState::new(Arc::new(UserRegistry::new()));
        build_router(Arc::new(state))
    }

    async fn send(
        router: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = match body {
            Some(body) => Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }

    #[tokio::test]
    async fn register_returns_created_user() {
        let router = test_router();

        let (status, body) = send(
            &router,
            Method::POST,
            "/usuarios",
            Some(json!({"name": "Ana", "email": "ana@example.com", "age": 30})),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            body,
            json!({"id": 1, "name": "Ana", "email": "ana@example.com", "age": 30})
        );
    }

    #[tokio::test]
    async fn register_without_age_omits_the_key() {
        let router = test_router();

        let (status, body) = send(
            &router,
            Method::POST,
            "/usuarios",
            Some(json!({"name": "Ana", "email": "ana@example.com"})),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            body,
            json!({"id": 1, "name": "Ana", "email": "ana@example.com"})
        );
    }

    #[tokio::test]
    async fn register_with_empty_body_reports_both_fields() {
        let router = test_router();

        let (status, body) = send(&router, Method::POST, "/usuarios", Some(json!({}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"errores": [
                {"field": "name", "message": NAME_REQUIRED},
                {"field": "email", "message": EMAIL_INVALID},
            ]})
        );
    }

    #[tokio::test]
    async fn register_with_bad_email_reports_the_email_field() {
        let router = test_router();

        let (status, body) = send(
            &router,
            Method::POST,
            "/usuarios",
            Some(json!({"name": "Ana", "email": "no-es-un-correo"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"errores": [{"field": "email", "message": EMAIL_INVALID}]})
        );
    }

    #[tokio::test]
    async fn register_duplicate_email_reports_the_conflict() {
        let router = test_router();
        send(
            &router,
            Method::POST,
            "/usuarios",
            Some(json!({"name": "Ana", "email": "ana@example.com"})),
        )
        .await;

        let (status, body) = send(
            &router,
            Method::POST,
            "/usuarios",
            Some(json!({"name": "Otra Ana", "email": "ana@example.com"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": EMAIL_IN_USE}));
    }

    #[tokio::test]
    async fn list_returns_users_in_registration_order() {
        let router = test_router();
        for (name, email) in [("Ana", "ana@example.com"), ("Luis", "luis@example.com")] {
            send(
                &router,
                Method::POST,
                "/usuarios",
                Some(json!({"name": name, "email": email})),
            )
            .await;
        }

        let (status, body) = send(&router, Method::GET, "/usuarios", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {"id": 1, "name": "Ana", "email": "ana@example.com"},
                {"id": 2, "name": "Luis", "email": "luis@example.com"},
            ])
        );
    }

    #[tokio::test]
    async fn get_returns_the_requested_user() {
        let router = test_router();
        send(
            &router,
            Method::POST,
            "/usuarios",
            Some(json!({"name": "Ana", "email": "ana@example.com", "age": 30})),
        )
        .await;

        let (status, body) = send(&router, Method::GET, "/usuarios/1", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"id": 1, "name": "Ana", "email": "ana@example.com", "age": 30})
        );
    }

    #[tokio::test]
    async fn get_unknown_id_returns_not_found() {
        let router = test_router();

        let (status, body) = send(&router, Method::GET, "/usuarios/99", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": USER_NOT_FOUND}));
    }

    #[tokio::test]
    async fn non_numeric_ids_behave_like_missing_users() {
        let router = test_router();

        for uri in ["/usuarios/abc", "/usuarios/1.5", "/usuarios/-1"] {
            let (status, body) = send(&router, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "GET {uri}");
            assert_eq!(body, json!({"error": USER_NOT_FOUND}), "GET {uri}");
        }

        let (status, body) = send(&router, Method::DELETE, "/usuarios/abc", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": USER_NOT_FOUND}));
    }

    #[tokio::test]
    async fn update_overwrites_only_supplied_fields() {
        let router = test_router();
        send(
            &router,
            Method::POST,
            "/usuarios",
            Some(json!({"name": "Ana", "email": "ana@example.com", "age": 30})),
        )
        .await;

        let (status, body) = send(
            &router,
            Method::PUT,
            "/usuarios/1",
            Some(json!({"name": "Ana María"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"id": 1, "name": "Ana María", "email": "ana@example.com", "age": 30})
        );
    }

    #[tokio::test]
    async fn update_unknown_id_returns_not_found() {
        let router = test_router();

        let (status, body) = send(
            &router,
            Method::PUT,
            "/usuarios/7",
            Some(json!({"name": "Ana"})),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": USER_NOT_FOUND}));
    }

    #[tokio::test]
    async fn update_validation_wins_over_missing_ids() {
        let router = test_router();

        // Unknown numeric id and non-numeric id alike: a bad payload is
        // reported before the lookup.
        for uri in ["/usuarios/99", "/usuarios/abc"] {
            let (status, body) = send(
                &router,
                Method::PUT,
                uri,
                Some(json!({"email": "no-es-un-correo"})),
            )
            .await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "PUT {uri}");
            assert_eq!(
                body,
                json!({"errores": [{"field": "email", "message": EMAIL_INVALID}]}),
                "PUT {uri}"
            );
        }
    }

    #[tokio::test]
    async fn update_may_store_a_duplicate_email() {
        let router = test_router();
        for (name, email) in [("Ana", "ana@example.com"), ("Luis", "luis@example.com")] {
            send(
                &router,
                Method::POST,
                "/usuarios",
                Some(json!({"name": name, "email": email})),
            )
            .await;
        }

        let (status, body) = send(
            &router,
            Method::PUT,
            "/usuarios/2",
            Some(json!({"email": "ana@example.com"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ana@example.com");
    }

    #[tokio::test]
    async fn delete_returns_no_content_and_forgets_the_user() {
        let router = test_router();
        send(
            &router,
            Method::POST,
            "/usuarios",
            Some(json!({"name": "Ana", "email": "ana@example.com"})),
        )
        .await;

        let (status, body) = send(&router, Method::DELETE, "/usuarios/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, _) = send(&router, Method::GET, "/usuarios/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_unknown_id_returns_not_found() {
        let router = test_router();

        let (status, body) = send(&router, Method::DELETE, "/usuarios/1", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": USER_NOT_FOUND}));
    }

    #[tokio::test]
    async fn health_reports_service_and_user_count() {
        let router = test_router();
        send(
            &router,
            Method::POST,
            "/usuarios",
            Some(json!({"name": "Ana", "email": "ana@example.com"})),
        )
        .await;

        let (status, body) = send(&router, Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "padron-rpc");
        assert_eq!(body["user_count"], 1);
        assert_eq!(body["req_total"], 2);
    }

    #[tokio::test]
    async fn index_lists_the_user_routes() {
        let router = test_router();

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/html"));

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let page = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(page.contains("GET /usuarios"));
        assert!(page.contains("DELETE /usuarios/:id"));
    }

    // Full lifecycle over the wire: register, read, update, delete.
    #[tokio::test]
    async fn user_lifecycle_end_to_end() {
        let router = test_router();

        let (status, created) = send(
            &router,
            Method::POST,
            "/usuarios",
            Some(json!({"name": "Ana", "email": "ana@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            created,
            json!({"id": 1, "name": "Ana", "email": "ana@example.com"})
        );

        let (status, listed) = send(&router, Method::GET, "/usuarios", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().map(Vec::len), Some(1));

        let (status, updated) = send(
            &router,
            Method::PUT,
            "/usuarios/1",
            Some(json!({"age": 30})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["age"], 30);
        assert_eq!(updated["name"], "Ana");

        let (status, _) = send(&router, Method::DELETE, "/usuarios/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&router, Method::GET, "/usuarios/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": USER_NOT_FOUND}));

        // A fresh registration never reuses the deleted id
        let (status, reborn) = send(
            &router,
            Method::POST,
            "/usuarios",
            Some(json!({"name": "Luis", "email": "luis@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(reborn["id"], 2);
    }
}
