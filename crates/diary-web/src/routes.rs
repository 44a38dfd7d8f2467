use std::hash::{Hash, Hasher};
use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Extension, Form, Json, Router};
use chrono::Utc;
use diary_core::forms::{EntryForm, FieldErrors, InquiryForm};
use diary_core::services::{DatabaseService, DiaryService};
use diary_core::session::SessionKeys;
use diary_core::{EntryId, Notice, PageRequest};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::auth::{authenticate, login_redirect_target, AuthenticatedUser};
use crate::backup::{BackupOutcome, BackupRunner};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::flash::{self, IncomingNotices};
use crate::mail::{MailTransport, OutgoingMail};
use crate::pages::{self, EntryFormKind};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    diary: DiaryService,
    session_keys: Arc<SessionKeys>,
    mailer: MailTransport,
    backup: BackupRunner,
}

impl AppState {
    pub fn from_config(config: Arc<AppConfig>, db: DatabaseService) -> Result<Self, AppError> {
        let session_keys = SessionKeys::new(&config.session_secret, config.auth_clock_skew)
            .map_err(|error| AppError::Config(error.to_string()))?;
        let backup = BackupRunner::from_argv(&config.backup_command)
            .ok_or_else(|| AppError::Config("DIARY_BACKUP_COMMAND is empty".to_string()))?
            .with_database_path(db.db_path());
        let diary = DiaryService::new(db)
            .with_page_size(config.page_size)
            .with_owner_scope(config.owner_scope);

        Ok(Self {
            mailer: MailTransport::from_config(&config),
            session_keys: Arc::new(session_keys),
            diary,
            backup,
            config,
        })
    }
}

pub fn app_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/diary/", get(list_entries))
        .route("/diary/create/", get(create_form).post(create_entry))
        .route("/diary/backup/", get(run_backup))
        .route("/diary/{id}/", get(entry_detail))
        .route("/diary/{id}/update/", get(update_form).post(update_entry))
        .route("/diary/{id}/delete/", get(delete_confirm).post(delete_entry))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/", get(index))
        .route("/inquiry/", get(inquiry_form).post(submit_inquiry))
        .route("/healthz", get(healthz))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
    })
}

async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match authenticate(&state.session_keys, request.headers()) {
        Ok(user) => {
            tracing::debug!(
                user = user_fingerprint(&user.user_id),
                session = user.session_id.as_deref().unwrap_or("none"),
                "Authenticated request"
            );
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        Err(failure) => {
            let requested = request
                .uri()
                .path_and_query()
                .map_or("/", |path_and_query| path_and_query.as_str());
            tracing::debug!(?failure, path = requested, "Redirecting to login");
            Err(AppError::Unauthorized(login_redirect_target(
                &state.config.login_url,
                requested,
            )))
        }
    }
}

async fn index(notices: IncomingNotices) -> Response {
    flash::render(StatusCode::OK, &notices, pages::index_page(&notices.0))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    page: Option<String>,
}

async fn list_entries(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    notices: IncomingNotices,
    Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
    let request = PageRequest::parse(query.page.as_deref())?;
    let page = state.diary.list_for_user(&user.user_id, request).await?;
    tracing::debug!(
        endpoint = "list_entries",
        user = user_fingerprint(&user.user_id),
        page = page.number(),
        "Listed diary entries"
    );
    Ok(flash::render(
        StatusCode::OK,
        &notices,
        pages::entry_list_page(&page, &notices.0),
    ))
}

async fn entry_detail(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    notices: IncomingNotices,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_entry_id(&id)?;
    let entry = state.diary.get_detail(&id, &user.user_id).await?;
    Ok(flash::render(
        StatusCode::OK,
        &notices,
        pages::entry_detail_page(&entry, &notices.0),
    ))
}

async fn create_form(notices: IncomingNotices) -> Response {
    let body = pages::entry_form_page(
        EntryFormKind::Create,
        &EntryForm::default(),
        &FieldErrors::default(),
        &notices.0,
    );
    flash::render(StatusCode::OK, &notices, body)
}

async fn create_entry(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    notices: IncomingNotices,
    form: Result<Form<EntryForm>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(form) = form.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    match state.diary.create(&user.user_id, &form).await {
        Ok(entry) => {
            tracing::info!(
                endpoint = "create_entry",
                user = user_fingerprint(&user.user_id),
                entry = %entry.id,
                "Diary entry created"
            );
            Ok(flash::redirect_with_notice("/diary/", &Notice::entry_created()))
        }
        Err(diary_core::Error::Validation(errors)) => Ok(render_entry_form(
            EntryFormKind::Create,
            &form,
            &errors,
            &notices,
            Notice::entry_create_failed(),
        )),
        Err(error) => Err(error.into()),
    }
}

async fn update_form(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    notices: IncomingNotices,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_entry_id(&id)?;
    let entry = state.diary.get_detail(&id, &user.user_id).await?;
    let body = pages::entry_form_page(
        EntryFormKind::Update(id),
        &EntryForm::from_entry(&entry),
        &FieldErrors::default(),
        &notices.0,
    );
    Ok(flash::render(StatusCode::OK, &notices, body))
}

async fn update_entry(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    notices: IncomingNotices,
    Path(id): Path<String>,
    form: Result<Form<EntryForm>, FormRejection>,
) -> Result<Response, AppError> {
    let id = parse_entry_id(&id)?;
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            // An unknown entry is still a 404, whatever was posted
            state.diary.get_detail(&id, &user.user_id).await?;
            return Err(AppError::BadRequest(rejection.body_text()));
        }
    };

    match state.diary.update(&id, &user.user_id, &form).await {
        Ok(entry) => {
            tracing::info!(
                endpoint = "update_entry",
                user = user_fingerprint(&user.user_id),
                entry = %entry.id,
                "Diary entry updated"
            );
            Ok(flash::redirect_with_notice(
                &format!("/diary/{}/", entry.id),
                &Notice::entry_updated(),
            ))
        }
        Err(diary_core::Error::Validation(errors)) => Ok(render_entry_form(
            EntryFormKind::Update(id),
            &form,
            &errors,
            &notices,
            Notice::entry_update_failed(),
        )),
        Err(error) => Err(error.into()),
    }
}

async fn delete_confirm(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    notices: IncomingNotices,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_entry_id(&id)?;
    let entry = state.diary.get_detail(&id, &user.user_id).await?;
    Ok(flash::render(
        StatusCode::OK,
        &notices,
        pages::delete_confirm_page(&entry, &notices.0),
    ))
}

async fn delete_entry(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_entry_id(&id)?;
    state.diary.delete(&id, &user.user_id).await?;
    tracing::info!(
        endpoint = "delete_entry",
        user = user_fingerprint(&user.user_id),
        entry = %id,
        "Diary entry deleted"
    );
    Ok(flash::redirect_with_notice("/diary/", &Notice::entry_deleted()))
}

async fn inquiry_form(notices: IncomingNotices) -> Response {
    let body = pages::inquiry_page(&InquiryForm::default(), &FieldErrors::default(), &notices.0);
    flash::render(StatusCode::OK, &notices, body)
}

async fn submit_inquiry(
    State(state): State<AppState>,
    notices: IncomingNotices,
    form: Result<Form<InquiryForm>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(form) = form.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let inquiry = match form.validate() {
        Ok(inquiry) => inquiry,
        Err(errors) => {
            let body = pages::inquiry_page(&form, &errors, &notices.0);
            return Ok(flash::render(StatusCode::OK, &notices, body));
        }
    };

    let mail = OutgoingMail::for_inquiry(&inquiry, &state.config.mail);
    match state.mailer.send(&mail).await {
        Ok(()) => {
            tracing::info!(endpoint = "inquiry", sender = %inquiry.name, "Inquiry sent");
            Ok(flash::redirect_with_notice("/inquiry/", &Notice::inquiry_sent()))
        }
        Err(error) => {
            tracing::error!(endpoint = "inquiry", sender = %inquiry.name, "{error}");
            let mut shown = notices.0.clone();
            shown.push(Notice::inquiry_failed());
            let body = pages::inquiry_page(&form, &FieldErrors::default(), &shown);
            Ok(flash::render(StatusCode::OK, &notices, body))
        }
    }
}

async fn run_backup(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    notices: IncomingNotices,
) -> Response {
    let outcome = state.backup.run().await;
    tracing::info!(
        endpoint = "backup",
        user = user_fingerprint(&user.user_id),
        succeeded = matches!(outcome, BackupOutcome::Succeeded { .. }),
        "Backup requested"
    );
    let body = match &outcome {
        BackupOutcome::Succeeded { file_name } => {
            pages::backup_result_page(&Notice::backup_succeeded(), Some(file_name), &notices.0)
        }
        BackupOutcome::Failed => pages::backup_result_page(&Notice::backup_failed(), None, &notices.0),
    };
    flash::render(StatusCode::OK, &notices, body)
}

fn render_entry_form(
    kind: EntryFormKind,
    form: &EntryForm,
    errors: &FieldErrors,
    incoming: &IncomingNotices,
    failure: Notice,
) -> Response {
    let mut shown = incoming.0.clone();
    shown.push(failure);
    flash::render(
        StatusCode::OK,
        incoming,
        pages::entry_form_page(kind, form, errors, &shown),
    )
}

fn parse_entry_id(raw: &str) -> Result<EntryId, AppError> {
    raw.parse()
        .map_err(|_| AppError::not_found(format!("diary entry {raw}")))
}

fn user_fingerprint(user_id: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    user_id.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use axum::routing::post;
    use diary_core::backup::todays_backup_file_name;
    use pretty_assertions::assert_eq;
    use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};

    use super::*;

    const SECRET: &str = "routes-test-session-secret";

    struct TestApp {
        base: String,
        client: reqwest::Client,
        keys: SessionKeys,
        diary: DiaryService,
    }

    impl TestApp {
        fn token(&self, user_id: &str) -> String {
            self.keys.issue(user_id, Duration::from_secs(600)).unwrap()
        }

        fn url(&self, path: &str) -> String {
            format!("{}{path}", self.base)
        }

        async fn get_as(&self, user_id: &str, path: &str) -> reqwest::Response {
            self.client
                .get(self.url(path))
                .bearer_auth(self.token(user_id))
                .send()
                .await
                .unwrap()
        }

        async fn post_as(&self, user_id: &str, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
            self.client
                .post(self.url(path))
                .bearer_auth(self.token(user_id))
                .form(form)
                .send()
                .await
                .unwrap()
        }

        async fn titles_of(&self, title: &str) -> usize {
            self.diary
                .database()
                .list_all_entries()
                .await
                .unwrap()
                .iter()
                .filter(|entry| entry.title == title)
                .count()
        }
    }

    async fn spawn_app(overrides: &[(&str, &str)]) -> TestApp {
        spawn_app_on(overrides, DatabaseService::open_in_memory().unwrap()).await
    }

    async fn spawn_app_on(overrides: &[(&str, &str)], db: DatabaseService) -> TestApp {
        let mut values = vec![
            ("DIARY_SESSION_SECRET".to_string(), SECRET.to_string()),
            ("DIARY_BACKUP_COMMAND".to_string(), "true".to_string()),
        ];
        values.extend(
            overrides
                .iter()
                .map(|(key, value)| ((*key).to_string(), (*value).to_string())),
        );
        let config = AppConfig::from_lookup(|name| {
            values
                .iter()
                .rev()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        })
        .unwrap();

        let state = AppState::from_config(Arc::new(config), db).unwrap();
        let diary = state.diary.clone();
        let keys = SessionKeys::new(SECRET, Duration::from_secs(60)).unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app_router(state)).await.unwrap();
        });

        TestApp {
            base: format!("http://{addr}"),
            client: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .unwrap(),
            keys,
            diary,
        }
    }

    type Captured = Arc<Mutex<Vec<serde_json::Value>>>;

    async fn spawn_mail_relay(status: StatusCode) -> (String, Captured) {
        let captured: Captured = Arc::default();
        let sink = captured.clone();
        let relay = Router::new().route(
            "/send",
            post(move |Json(body): Json<serde_json::Value>| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(body);
                    status
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, relay).await.unwrap();
        });
        (format!("http://{addr}/send"), captured)
    }

    fn titled(title: &str) -> EntryForm {
        EntryForm {
            title: Some(title.to_string()),
            ..EntryForm::default()
        }
    }

    fn location(response: &reqwest::Response) -> &str {
        response.headers()[LOCATION].to_str().unwrap()
    }

    fn flash_cookie(response: &reqwest::Response) -> String {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with("diary_messages="))
            .and_then(|value| value.split(';').next())
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn public_pages_need_no_session() {
        let app = spawn_app(&[]).await;

        let index = app.client.get(app.url("/")).send().await.unwrap();
        assert_eq!(index.status(), StatusCode::OK);

        let health = app.client.get(app.url("/healthz")).send().await.unwrap();
        assert_eq!(health.status(), StatusCode::OK);
        let body: serde_json::Value = health.json().await.unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn protected_pages_redirect_to_login() {
        let app = spawn_app(&[]).await;

        let response = app.client.get(app.url("/diary/?page=2")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            location(&response),
            "/accounts/login/?next=%2Fdiary%2F%3Fpage%3D2"
        );

        let forged = app
            .client
            .get(app.url("/diary/backup/"))
            .bearer_auth("not-a-token")
            .send()
            .await
            .unwrap();
        assert_eq!(forged.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn session_cookie_is_accepted() {
        let app = spawn_app(&[]).await;
        let response = app
            .client
            .get(app.url("/diary/"))
            .header(COOKIE, format!("diary_session={}", app.token("alice")))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn create_stores_entry_and_redirects_to_list() {
        let app = spawn_app(&[]).await;

        let response = app
            .post_as("alice", "/diary/create/", &[("title", "testTitle")])
            .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/diary/");
        assert_eq!(app.titles_of("testTitle").await, 1);

        let cookie = flash_cookie(&response);
        let list = app
            .client
            .get(app.url("/diary/"))
            .bearer_auth(app.token("alice"))
            .header(COOKIE, cookie)
            .send()
            .await
            .unwrap();
        assert_eq!(list.status(), StatusCode::OK);
        let body = list.text().await.unwrap();
        assert!(body.contains("Diary entry created."));
        assert!(body.contains("testTitle"));
    }

    #[tokio::test]
    async fn invalid_create_rerenders_form() {
        let app = spawn_app(&[]).await;
        let long_title = "x".repeat(41);

        let response = app
            .post_as("alice", "/diary/create/", &[("title", long_title.as_str())])
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.text().await.unwrap();
        assert!(body.contains("Failed to create the diary entry."));
        assert!(body.contains("errorlist"));
        assert_eq!(app.titles_of(&long_title).await, 0);

        let missing = app.post_as("alice", "/diary/create/", &[]).await;
        assert_eq!(missing.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn update_changes_title_and_redirects_to_detail() {
        let app = spawn_app(&[]).await;
        let entry = app
            .diary
            .create("alice", &titled("beforeUpdate"))
            .await
            .unwrap();

        let path = format!("/diary/{}/update/", entry.id);
        let form_page = app.get_as("alice", &path).await;
        assert!(form_page.text().await.unwrap().contains("beforeUpdate"));

        let response = app.post_as("alice", &path, &[("title", "afterUpdate")]).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), format!("/diary/{}/", entry.id));

        let detail = app.get_as("alice", &format!("/diary/{}/", entry.id)).await;
        assert_eq!(detail.status(), StatusCode::OK);
        assert!(detail.text().await.unwrap().contains("afterUpdate"));
    }

    #[tokio::test]
    async fn invalid_update_rerenders_form() {
        let app = spawn_app(&[]).await;
        let entry = app
            .diary
            .create("alice", &titled("keep"))
            .await
            .unwrap();

        let response = app
            .post_as("alice", &format!("/diary/{}/update/", entry.id), &[("title", "")])
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .text()
            .await
            .unwrap()
            .contains("Failed to update the diary entry."));
        assert_eq!(app.titles_of("keep").await, 1);
    }

    #[tokio::test]
    async fn unknown_entries_are_not_found() {
        let app = spawn_app(&[]).await;
        let missing = EntryId::new();

        for path in [
            format!("/diary/{missing}/"),
            format!("/diary/{missing}/update/"),
            format!("/diary/{missing}/delete/"),
            "/diary/not-a-uuid/".to_string(),
        ] {
            assert_eq!(app.get_as("alice", &path).await.status(), StatusCode::NOT_FOUND);
        }

        let update = app
            .post_as("alice", &format!("/diary/{missing}/update/"), &[])
            .await;
        assert_eq!(update.status(), StatusCode::NOT_FOUND);

        let delete = app
            .post_as("alice", &format!("/diary/{missing}/delete/"), &[])
            .await;
        assert_eq!(delete.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_removes_entry_and_redirects_to_list() {
        let app = spawn_app(&[]).await;
        let entry = app
            .diary
            .create("alice", &titled("doomed"))
            .await
            .unwrap();
        let path = format!("/diary/{}/delete/", entry.id);

        let confirm = app.get_as("alice", &path).await;
        assert_eq!(confirm.status(), StatusCode::OK);
        assert_eq!(app.titles_of("doomed").await, 1);

        let response = app.post_as("alice", &path, &[]).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/diary/");
        assert_eq!(app.titles_of("doomed").await, 0);

        let detail = app.get_as("alice", &format!("/diary/{}/", entry.id)).await;
        assert_eq!(detail.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_is_paginated_and_owner_filtered() {
        let app = spawn_app(&[]).await;
        for title in ["alice-1", "alice-2", "alice-3"] {
            app.diary
                .create("alice", &titled(title))
                .await
                .unwrap();
        }
        app.diary
            .create("bob", &titled("bob-secret"))
            .await
            .unwrap();

        let first = app.get_as("alice", "/diary/").await.text().await.unwrap();
        assert!(first.contains("alice-3"));
        assert!(first.contains("alice-2"));
        assert!(!first.contains("alice-1"));
        assert!(!first.contains("bob-secret"));
        assert!(first.contains("Page 1 of 2"));

        let last = app.get_as("alice", "/diary/?page=last").await.text().await.unwrap();
        assert!(last.contains("alice-1"));
        assert!(!last.contains("bob-secret"));

        assert_eq!(
            app.get_as("alice", "/diary/?page=3").await.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            app.get_as("alice", "/diary/?page=abc").await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn owner_scoping_is_configurable() {
        let form = titled("alice-only");

        let open = spawn_app(&[]).await;
        let entry = open.diary.create("alice", &form).await.unwrap();
        assert_eq!(
            open.get_as("bob", &format!("/diary/{}/", entry.id)).await.status(),
            StatusCode::OK
        );

        let scoped = spawn_app(&[("DIARY_OWNER_SCOPED_ACCESS", "true")]).await;
        let entry = scoped.diary.create("alice", &form).await.unwrap();
        assert_eq!(
            scoped.get_as("bob", &format!("/diary/{}/", entry.id)).await.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            scoped
                .post_as("bob", &format!("/diary/{}/delete/", entry.id), &[])
                .await
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(scoped.titles_of("alice-only").await, 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn backup_success_shows_file_name() {
        let app = spawn_app(&[("DIARY_BACKUP_COMMAND", "true")]).await;
        let response = app.get_as("alice", "/diary/backup/").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.text().await.unwrap();
        assert!(body.contains("Backup completed successfully."));
        assert!(body.contains(&todays_backup_file_name()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn backup_process_uses_the_served_database() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("served.db");
        let seen = dir.path().join("seen");
        let script = dir.path().join("backup.sh");
        std::fs::write(
            &script,
            format!("printf %s \"$DIARY_DATABASE_PATH\" > {}\n", seen.display()),
        )
        .unwrap();
        let command = format!("sh {}", script.display());

        let db = DatabaseService::open_path(&db_path).unwrap();
        let app = spawn_app_on(&[("DIARY_BACKUP_COMMAND", command.as_str())], db).await;
        let response = app.get_as("alice", "/diary/backup/").await;
        assert!(response.text().await.unwrap().contains("Backup completed successfully."));

        assert_eq!(
            std::fs::read_to_string(&seen).unwrap(),
            db_path.display().to_string()
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn backup_failure_shows_message_only() {
        let app = spawn_app(&[("DIARY_BACKUP_COMMAND", "false")]).await;
        let response = app.get_as("alice", "/diary/backup/").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.text().await.unwrap();
        assert!(body.contains("Backup failed."));
        assert!(!body.contains("backupdiary"));
    }

    #[tokio::test]
    async fn inquiry_is_relayed_then_confirmed() {
        let (relay_url, captured) = spawn_mail_relay(StatusCode::ACCEPTED).await;
        let app = spawn_app(&[
            ("MAIL_RELAY_URL", relay_url.as_str()),
            ("INQUIRY_RECIPIENTS", "owner@example.com"),
        ])
        .await;

        let response = app
            .client
            .post(app.url("/inquiry/"))
            .form(&[
                ("name", "Taro"),
                ("email", "taro@example.com"),
                ("title", "Hello"),
                ("message", "Nice diary"),
            ])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/inquiry/");

        let sent = captured.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["subject"], "Hello");
        assert_eq!(sent[0]["to"], serde_json::json!(["owner@example.com"]));
        assert_eq!(sent[0]["cc"], serde_json::json!(["taro@example.com"]));

        let follow_up = app
            .client
            .get(app.url("/inquiry/"))
            .header(COOKIE, flash_cookie(&response))
            .send()
            .await
            .unwrap();
        assert_eq!(follow_up.status(), StatusCode::OK);
        assert!(follow_up
            .text()
            .await
            .unwrap()
            .contains("Your message has been sent."));
    }

    #[tokio::test]
    async fn invalid_inquiry_sends_nothing() {
        let (relay_url, captured) = spawn_mail_relay(StatusCode::ACCEPTED).await;
        let app = spawn_app(&[("MAIL_RELAY_URL", relay_url.as_str())]).await;

        let response = app
            .client
            .post(app.url("/inquiry/"))
            .form(&[("name", "Taro"), ("email", "not-an-address")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.text().await.unwrap().contains("errorlist"));
        assert!(captured.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn relay_failure_is_reported_on_the_form() {
        let (relay_url, _captured) = spawn_mail_relay(StatusCode::INTERNAL_SERVER_ERROR).await;
        let app = spawn_app(&[("MAIL_RELAY_URL", relay_url.as_str())]).await;

        let response = app
            .client
            .post(app.url("/inquiry/"))
            .form(&[
                ("name", "Taro"),
                ("email", "taro@example.com"),
                ("title", "Hello"),
                ("message", "Nice diary"),
            ])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .text()
            .await
            .unwrap()
            .contains("Your message could not be sent."));
    }
}
