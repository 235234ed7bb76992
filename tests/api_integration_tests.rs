// API Integration Tests
//
// Purpose: Drive the Axum router end to end (validation, status mapping,
// response shapes) with an in-memory engine.
// Run with: cargo test --features api --test api_integration_tests

#[cfg(feature = "api")]
mod api_tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use crop_yield_engine::{
        create_router, AppState, CandidateVocabulary, FeatureRow, InferenceError, TreeEnsemble,
        YieldEngine, YieldModel,
    };
    use serde_json::{json, Value};
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt; // for oneshot

    /// Fixed yield per crop; unknown crops make inference fail
    struct LookupModel;

    impl YieldModel for LookupModel {
        fn predict(&self, rows: &[FeatureRow<'_>]) -> Result<Vec<f64>, InferenceError> {
            rows.iter()
                .map(|r| match r.item {
                    "maize" => Ok(15_000.0),
                    "wheat" => Ok(12_000.0),
                    "potatoes" => Ok(200_000.0),
                    "sorghum" => Ok(9_000.0),
                    other => Err(InferenceError::Backend(format!("unknown category '{}'", other))),
                })
                .collect()
        }
    }

    /// Blocks longer than any test deadline
    struct SlowModel;

    impl YieldModel for SlowModel {
        fn predict(&self, rows: &[FeatureRow<'_>]) -> Result<Vec<f64>, InferenceError> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(vec![1.0; rows.len()])
        }
    }

    fn test_app_with(model: Arc<dyn YieldModel>, timeout: Duration) -> axum::Router {
        let candidates = CandidateVocabulary::new(
            ["maize", "wheat", "potatoes", "sorghum"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap();
        let engine = YieldEngine::new(model, candidates);
        create_router(AppState::with_engine(engine, timeout))
    }

    fn test_app() -> axum::Router {
        test_app_with(Arc::new(LookupModel), Duration::from_secs(5))
    }

    async fn post_json(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    fn context() -> Value {
        json!({
            "area": "France",
            "year": 2026,
            "avg_rain_mm": 650.0,
            "pesticides_tonnes": 5000.0,
            "avg_temp": 15.0,
            "irrigation": false,
            "fertilizer": false
        })
    }

    fn with(mut base: Value, extra: Value) -> Value {
        let obj = base.as_object_mut().unwrap();
        for (k, v) in extra.as_object().unwrap() {
            obj.insert(k.clone(), v.clone());
        }
        base
    }

    // =========================================================================
    // Section 1: Health Check
    // =========================================================================

    #[tokio::test]
    async fn test_health_check() {
        let response = test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["status"], "running");
        assert!(body["endpoints"]
            .as_array()
            .unwrap()
            .contains(&json!("/predict")));
        assert!(body["timestamp"].is_string());
    }

    // =========================================================================
    // Section 2: /predict
    // =========================================================================

    #[tokio::test]
    async fn test_predict_with_price() {
        let body = with(
            context(),
            json!({"item": "maize", "price_value": 200, "price_unit": "eur_per_t"}),
        );
        let (status, data) = post_json(test_app(), "/predict", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(data["item"], "maize");
        assert_eq!(data["pred_yield_hg_ha"], 15000.0);
        assert_eq!(data["pred_yield_t_ha"], 1.5);
        assert_eq!(data["revenue_per_ha"], 300.0);
    }

    #[tokio::test]
    async fn test_predict_without_price_with_scenario() {
        let body = with(
            context(),
            json!({"item": "wheat", "irrigation": true, "fertilizer": true}),
        );
        let (status, data) = post_json(test_app(), "/predict", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(data["pred_yield_hg_ha"], 39000.0);
        assert!(data["revenue_per_ha"].is_null());
    }

    #[tokio::test]
    async fn test_predict_scenario_flags_default_to_off() {
        let body = json!({
            "area": "France",
            "item": "maize",
            "year": 2026,
            "avg_rain_mm": 650.0,
            "pesticides_tonnes": 5000.0,
            "avg_temp": 15.0,
            "irrigation": true
        });
        let (status, data) = post_json(test_app(), "/predict", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(data["pred_yield_hg_ha"], 27000.0);
    }

    #[tokio::test]
    async fn test_predict_accepts_zero_price() {
        let body = with(context(), json!({"item": "maize", "price_value": 0}));
        let (status, data) = post_json(test_app(), "/predict", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(data["revenue_per_ha"], 0.0);
    }

    #[tokio::test]
    async fn test_predict_unit_synonym() {
        let body = with(
            context(),
            json!({"item": "maize", "price_value": 2, "price_unit": " €/KG "}),
        );
        let (status, data) = post_json(test_app(), "/predict", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(data["revenue_per_ha"], 3000.0);
    }

    #[tokio::test]
    async fn test_predict_invalid_data() {
        let body = with(context(), json!({"item": "maize", "year": 2200, "avg_rain_mm": -10.0}));
        let (status, data) = post_json(test_app(), "/predict", body).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let msg = data["error"].as_str().unwrap();
        assert!(msg.contains("year"));
        assert!(msg.contains("avg_rain_mm"));
    }

    #[tokio::test]
    async fn test_predict_missing_field() {
        let body = json!({"area": "France", "item": "maize", "year": 2026});
        let (status, data) = post_json(test_app(), "/predict", body).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let msg = data["error"].as_str().expect("error body should be JSON");
        assert!(msg.contains("avg_rain_mm"));
    }

    #[tokio::test]
    async fn test_predict_wrong_field_type() {
        let body = with(context(), json!({"item": "maize", "year": "next year"}));
        let (status, data) = post_json(test_app(), "/predict", body).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(data["error"].is_string());
    }

    #[tokio::test]
    async fn test_predict_malformed_json() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/predict")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{\"area\": \"France\","))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_predict_unsupported_unit() {
        let body = with(
            context(),
            json!({"item": "maize", "price_value": 200, "price_unit": "bogus"}),
        );
        let (status, data) = post_json(test_app(), "/predict", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(data["error"].as_str().unwrap().contains("bogus"));
    }

    #[tokio::test]
    async fn test_predict_model_error() {
        let body = with(context(), json!({"item": "dragonfruit"}));
        let (status, data) = post_json(test_app(), "/predict", body).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(data["error"].as_str().unwrap().contains("dragonfruit"));
    }

    #[tokio::test]
    async fn test_predict_inference_deadline() {
        let app = test_app_with(Arc::new(SlowModel), Duration::from_millis(20));
        let body = with(context(), json!({"item": "maize"}));
        let (status, _) = post_json(app, "/predict", body).await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    }

    // =========================================================================
    // Section 3: /recommend/yield
    // =========================================================================

    #[tokio::test]
    async fn test_recommend_yield_success() {
        let body = with(context(), json!({"top_k": 2}));
        let (status, data) = post_json(test_app(), "/recommend/yield", body).await;

        assert_eq!(status, StatusCode::OK);
        let results = data["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["item"], "potatoes");
        assert_eq!(results[0]["pred_yield_t_ha"], 20.0);
        assert_eq!(results[1]["item"], "maize");
        assert!(results[1]["revenue_per_ha"].is_null());
    }

    #[tokio::test]
    async fn test_recommend_yield_default_top_k() {
        let (status, data) = post_json(test_app(), "/recommend/yield", context()).await;

        assert_eq!(status, StatusCode::OK);
        // 4 candidates < default top_k of 5
        assert_eq!(data["results"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_recommend_yield_top_k_out_of_range() {
        for top_k in [0, 21] {
            let body = with(context(), json!({"top_k": top_k}));
            let (status, _) = post_json(test_app(), "/recommend/yield", body).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "top_k = {}", top_k);
        }
    }

    // =========================================================================
    // Section 4: /recommend/revenue
    // =========================================================================

    #[tokio::test]
    async fn test_recommend_revenue_success() {
        let body = with(context(), json!({
            "top_k": 1,
            "price_unit": "eur_per_t",
            "prices": {"maize": 200, "wheat": 180}
        }));
        let (status, data) = post_json(test_app(), "/recommend/revenue", body).await;

        assert_eq!(status, StatusCode::OK);
        let results = data["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["item"], "maize");
        assert_eq!(results[0]["revenue_per_ha"], 300.0);
        assert_eq!(results[0]["price_value"], 200.0);
        assert_eq!(results[0]["price_unit"], "eur_per_t");
    }

    #[tokio::test]
    async fn test_recommend_revenue_no_prices() {
        let body = with(context(), json!({"top_k": 5, "prices": {}}));
        let (status, _) = post_json(test_app(), "/recommend/revenue", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_recommend_revenue_invalid_prices() {
        let body = with(context(), json!({"top_k": 5, "prices": {"maize": -100, "wheat": 0}}));
        let (status, data) = post_json(test_app(), "/recommend/revenue", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let msg = data["error"].as_str().unwrap();
        assert!(msg.contains("maize"));
        assert!(msg.contains("wheat"));
    }

    #[tokio::test]
    async fn test_recommend_revenue_no_overlap() {
        let body = with(context(), json!({"prices": {"cotton": 500}}));
        let (status, _) = post_json(test_app(), "/recommend/revenue", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_recommend_revenue_missing_prices_field() {
        let (status, data) = post_json(test_app(), "/recommend/revenue", context()).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let msg = data["error"].as_str().expect("error body should be JSON");
        assert!(msg.contains("prices"));
    }

    // =========================================================================
    // Section 5: Bundled artifact
    // =========================================================================

    #[tokio::test]
    async fn test_bundled_model_serves_requests() {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let model = TreeEnsemble::load(root.join("model/yield_model.json")).unwrap();
        let candidates =
            CandidateVocabulary::load(root.join("inputs/candidate_items.json")).unwrap();
        let app = create_router(AppState::with_engine(
            YieldEngine::new(Arc::new(model), candidates),
            Duration::from_secs(5),
        ));

        let body = with(context(), json!({"top_k": 3}));
        let (status, data) = post_json(app, "/recommend/yield", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(data["results"][0]["item"], "potatoes");
        assert_eq!(data["results"][1]["item"], "cassava");
    }
}
