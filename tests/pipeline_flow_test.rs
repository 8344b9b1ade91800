use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as JsonValue};
use talento_ats::middleware::auth::{encode_token, Claims};
use tower::ServiceExt;
use uuid::Uuid;

const BOUNDARY: &str = "talento-flow-boundary";

/// Runs only against a real database; returns `None` when none is configured.
async fn setup_app() -> Option<(Router, sqlx::PgPool)> {
    dotenvy::dotenv().ok();
    if env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping database flow test");
        return None;
    }
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("JWT_SECRET", "test_secret_key");
    env::set_var("PUBLIC_RPS", "1000");
    env::set_var("ADMIN_RPS", "1000");
    let _ = talento_ats::config::init_config();

    let pool = talento_ats::database::pool::create_pool()
        .await
        .expect("pool");
    talento_ats::database::pool::run_migrations(&pool)
        .await
        .expect("migrations");

    let state = talento_ats::AppState::new(pool.clone()).expect("state");
    Some((talento_ats::routes::router(state), pool))
}

fn bearer() -> String {
    let claims = Claims {
        sub: "ana.rh".into(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        role: Some("recruiter".into()),
    };
    let token = encode_token(&claims, &talento_ats::config::get_config().jwt_secret).unwrap();
    format!("Bearer {}", token)
}

/// Valid CPF built from random base digits.
fn random_cpf() -> String {
    let seed = Uuid::new_v4().as_u128();
    let mut digits: Vec<u32> = (0..9).map(|i| ((seed >> (i * 8)) % 10) as u32).collect();
    digits[0] = 1 + digits[0] % 9;
    digits[1] = (digits[0] + 1) % 10;
    for len in [9usize, 10] {
        let sum: u32 = digits
            .iter()
            .enumerate()
            .map(|(i, d)| d * (len as u32 + 1 - i as u32))
            .sum();
        let rest = (sum * 10) % 11;
        digits.push(if rest == 10 { 0 } else { rest });
    }
    digits.iter().map(|d| char::from_digit(*d, 10).unwrap()).collect()
}

fn intake_request(fields: &[(&str, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    Request::builder()
        .method("POST")
        .uri("/api/candidates")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::from(body))
        .unwrap()
}

fn recruiter(method: &str, uri: &str, body: Option<JsonValue>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", bearer());
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(resp: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn history_len(pool: &sqlx::PgPool, application_id: Uuid) -> i64 {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM stage_history WHERE application_id = $1")
            .bind(application_id)
            .fetch_one(pool)
            .await
            .unwrap();
    count
}

async fn remove_candidate_by_cpf(pool: &sqlx::PgPool, cpf: &str) {
    for sql in [
        "DELETE FROM notification_logs WHERE application_id IN (SELECT a.id FROM applications a JOIN candidates c ON c.id = a.candidate_id WHERE c.cpf = $1)",
        "DELETE FROM stage_history WHERE application_id IN (SELECT a.id FROM applications a JOIN candidates c ON c.id = a.candidate_id WHERE c.cpf = $1)",
        "DELETE FROM applications WHERE candidate_id IN (SELECT id FROM candidates WHERE cpf = $1)",
        "DELETE FROM candidates WHERE cpf = $1",
    ] {
        sqlx::query(sql).bind(cpf).execute(pool).await.unwrap();
    }
}

#[tokio::test]
async fn intake_creates_candidate_and_blocks_duplicate_cpf() {
    let Some((app, pool)) = setup_app().await else {
        return;
    };
    remove_candidate_by_cpf(&pool, "11144477735").await;

    let email = format!("maria.{}@email.com", Uuid::new_v4().simple());
    let fields = [
        ("full_name", "Maria Silva Santos"),
        ("cpf", "111.444.777-35"),
        ("email", email.as_str()),
        ("phone", "(11) 98765-4321"),
        ("state", "sp"),
        ("lgpd_consent", "true"),
    ];
    let resp = app.clone().oneshot(intake_request(&fields)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    assert_eq!(body["created"], true);
    assert_eq!(body["candidate"]["cpf"], "11144477735");
    assert_eq!(body["candidate"]["consent_ip"], "203.0.113.7");
    assert_eq!(body["application"]["current_stage"], "APPLIED");
    assert_eq!(
        body["application"]["job_id"],
        "00000000-0000-0000-0000-000000000001"
    );
    let application_id = body["application"]["id"].as_str().unwrap().to_string();

    // Same CPF, no identity confirmation.
    let resp = app.clone().oneshot(intake_request(&fields)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body = json_body(resp).await;
    assert!(body["challenge"]["masked_email"]
        .as_str()
        .unwrap()
        .starts_with("m*"));
    assert_eq!(body["challenge"]["masked_phone"], "(**) *****-**21");

    let check = Request::builder()
        .uri("/api/candidates/check?cpf=11144477735")
        .body(Body::empty())
        .unwrap();
    let body = json_body(app.clone().oneshot(check).await.unwrap()).await;
    assert_eq!(body["exists"], true);

    // Confirmed resubmission updates in place and returns the same application.
    let mut confirmed = fields.to_vec();
    confirmed.push(("confirm_phone", "11987654321"));
    confirmed[0] = ("full_name", "Maria Silva Santos Oliveira");
    let resp = app.clone().oneshot(intake_request(&confirmed)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["created"], false);
    assert_eq!(body["candidate"]["full_name"], "Maria Silva Santos Oliveira");
    assert_eq!(body["application"]["id"], application_id.as_str());

    let (candidates,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM candidates WHERE cpf = $1")
        .bind("11144477735")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(candidates, 1);
}

#[tokio::test]
async fn transitions_and_rejection_keep_the_audit_trail() {
    let Some((app, pool)) = setup_app().await else {
        return;
    };

    let job_title = format!("Desenvolvedor Rust {}", &Uuid::new_v4().simple().to_string()[..6]);
    let resp = app
        .clone()
        .oneshot(recruiter(
            "POST",
            "/api/jobs",
            Some(json!({
                "title": job_title,
                "department": "Tecnologia",
                "company_name": "Talento",
                "city": "São Paulo",
                "state": "SP",
                "work_mode": "HIBRIDO",
                "salary_min": "9000",
                "salary_max": "12000",
                "salary_budget": "15000",
                "status": "OPEN",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let job = json_body(resp).await;
    let job_id = job["id"].as_str().unwrap().to_string();
    assert!(job.get("salary_budget").is_some());

    let public = Request::builder()
        .uri("/api/jobs/public")
        .body(Body::empty())
        .unwrap();
    let listing = json_body(app.clone().oneshot(public).await.unwrap()).await;
    let items = listing["items"].as_array().unwrap();
    assert!(items.iter().any(|j| j["id"] == job_id.as_str()));
    assert!(items.iter().all(|j| j.get("salary_budget").is_none()));

    let cpf = random_cpf();
    let email = format!("joao.{}@email.com", Uuid::new_v4().simple());
    let fields = [
        ("full_name", "João Pedro Almeida"),
        ("cpf", cpf.as_str()),
        ("email", email.as_str()),
        ("phone", "(21) 99876-5432"),
        ("job_id", job_id.as_str()),
        ("lgpd_consent", "true"),
    ];
    let resp = app.clone().oneshot(intake_request(&fields)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    assert_eq!(body["application"]["job_id"], job_id.as_str());
    let app_id: Uuid = body["application"]["id"].as_str().unwrap().parse().unwrap();
    assert_eq!(history_len(&pool, app_id).await, 0);

    let stage_uri = format!("/api/applications/{}/stage", app_id);
    let resp = app
        .clone()
        .oneshot(recruiter("PATCH", &stage_uri, Some(json!({ "stage": "SCREENING" }))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let moved = json_body(resp).await;
    assert_eq!(moved["current_stage"], "SCREENING");
    assert_eq!(moved["previous_stage"], "APPLIED");
    assert_eq!(history_len(&pool, app_id).await, 1);

    for stage in ["SCREENING", "REJECTED"] {
        let resp = app
            .clone()
            .oneshot(recruiter("PATCH", &stage_uri, Some(json!({ "stage": stage }))))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
    assert_eq!(history_len(&pool, app_id).await, 1);

    let history_uri = format!("/api/applications/{}/history", app_id);
    let history = json_body(
        app.clone()
            .oneshot(recruiter("GET", &history_uri, None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(history[0]["from_stage"], "APPLIED");
    assert_eq!(history[0]["to_stage"], "SCREENING");
    assert_eq!(history[0]["changed_by"], "ana.rh");

    let rejection_uri = format!("/api/applications/{}/rejection", app_id);
    let preview = json_body(
        app.clone()
            .oneshot(recruiter("GET", &rejection_uri, None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(preview["validations"]["name"], "João");
    let preview_text = preview["preview"].as_str().unwrap().to_string();
    assert!(preview_text.contains(&job_title));

    // A notice addressed to someone else must not go out.
    let misfire = preview_text.replace("João", "Carla");
    let resp = app
        .clone()
        .oneshot(recruiter(
            "POST",
            &rejection_uri,
            Some(json!({
                "rejection_reason": "Perfil técnico abaixo do esperado",
                "email_content": misfire,
            })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["validations"]["candidate_name_match"], false);
    assert_eq!(body["validations"]["job_title_match"], true);

    let detail_uri = format!("/api/applications/{}", app_id);
    let detail = json_body(
        app.clone()
            .oneshot(recruiter("GET", &detail_uri, None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(detail["current_stage"], "SCREENING");
    assert_eq!(history_len(&pool, app_id).await, 1);

    let resp = app
        .clone()
        .oneshot(recruiter(
            "POST",
            &rejection_uri,
            Some(json!({
                "rejection_reason": "Perfil técnico abaixo do esperado",
                "email_content": preview_text,
            })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["application"]["current_stage"], "REJECTED");
    assert_eq!(body["application"]["previous_stage"], "SCREENING");
    assert_eq!(
        body["application"]["rejection_reason"],
        "Perfil técnico abaixo do esperado"
    );
    assert_eq!(history_len(&pool, app_id).await, 2);

    let (note,): (String,) = sqlx::query_as(
        "SELECT content FROM notes WHERE application_id = $1 AND created_by = 'system'",
    )
    .bind(app_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(note.contains(&job_title));

    let (logs,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM notification_logs WHERE application_id = $1")
            .bind(app_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(logs, 1);

    let resp = app
        .clone()
        .oneshot(recruiter(
            "POST",
            &rejection_uri,
            Some(json!({
                "rejection_reason": "Duplicado",
                "email_content": preview_text,
            })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let job_uri = format!("/api/jobs/{}", job_id);
    let resp = app
        .oneshot(recruiter("DELETE", &job_uri, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}
