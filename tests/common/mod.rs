#![allow(dead_code)]

//! An in-process stand-in for the task-tracking REST service.
//!
//! The server runs on a random local port and counts the calls the tests care
//! about. Flags on [`MockApi`] make individual endpoints misbehave.

use actix_web::http::header;
use actix_web::{rt, web, App, HttpRequest, HttpResponse, HttpServer};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use taskboard::models::{
    Comment, CommentDraft, MoveRequest, Project, ProjectDraft, Sprint, SprintDraft, SprintStatus, Task, TaskDraft,
    TaskPatch, TaskPriority, TaskStatus, UserProfile,
};
use taskboard::session::{Credential, CredentialStore, SessionStorage};
use taskboard::{ApiClient, ClientConfig};
use uuid::Uuid;

pub const EMAIL: &str = "ada@example.com";
pub const PASSWORD: &str = "correct horse battery";
pub const REFRESH_TOKEN: &str = "refresh-1";

pub struct MockApi {
    pub project_id: Uuid,
    pub sprint_id: Uuid,
    pub projects: Mutex<Vec<Project>>,
    pub sprints: Mutex<Vec<Sprint>>,
    pub tasks: Mutex<Vec<Task>>,
    pub comments: Mutex<Vec<Comment>>,
    valid_tokens: Mutex<HashSet<String>>,
    issued: AtomicUsize,

    pub refresh_calls: AtomicUsize,
    pub task_list_calls: AtomicUsize,
    pub move_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,

    /// Every bearer token is refused, including freshly issued ones.
    pub reject_all_tokens: AtomicBool,
    pub reject_refresh: AtomicBool,
    pub reject_moves: AtomicBool,
    pub fail_task_list: AtomicBool,
    pub fail_logout: AtomicBool,
    pub refresh_delay_ms: AtomicU64,
    pub list_delay_ms: AtomicU64,
}

impl MockApi {
    pub fn new() -> Arc<Self> {
        let project_id = Uuid::new_v4();
        let sprint_id = Uuid::new_v4();
        let project = Project {
            id: project_id,
            name: "Apollo".to_string(),
            description: "Moon shot".to_string(),
        };
        let sprints = vec![
            Sprint {
                id: Uuid::new_v4(),
                name: "Sprint 1".to_string(),
                project_id,
                start_date: None,
                end_date: None,
                status: SprintStatus::Completed,
                goal: String::new(),
            },
            Sprint {
                id: sprint_id,
                name: "Sprint 2".to_string(),
                project_id,
                start_date: chrono::NaiveDate::from_ymd_opt(2026, 10, 5),
                end_date: chrono::NaiveDate::from_ymd_opt(2026, 10, 19),
                status: SprintStatus::Active,
                goal: "Ship the board".to_string(),
            },
        ];
        Arc::new(Self {
            project_id,
            sprint_id,
            projects: Mutex::new(vec![project]),
            sprints: Mutex::new(sprints),
            tasks: Mutex::new(Vec::new()),
            comments: Mutex::new(Vec::new()),
            valid_tokens: Mutex::new(HashSet::new()),
            issued: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            task_list_calls: AtomicUsize::new(0),
            move_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            reject_all_tokens: AtomicBool::new(false),
            reject_refresh: AtomicBool::new(false),
            reject_moves: AtomicBool::new(false),
            fail_task_list: AtomicBool::new(false),
            fail_logout: AtomicBool::new(false),
            refresh_delay_ms: AtomicU64::new(0),
            list_delay_ms: AtomicU64::new(0),
        })
    }

    pub fn accept_token(&self, token: &str) {
        self.valid_tokens.lock().insert(token.to_string());
    }

    /// Adds a task in the project's active sprint.
    pub fn seed(&self, title: &str, status: TaskStatus) -> Task {
        let mut tasks = self.tasks.lock();
        let order = tasks.iter().filter(|task| task.status == status).count() as i32;
        let task = Task {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            status,
            priority: TaskPriority::Medium,
            story_points: Some(3),
            sprint_id: Some(self.sprint_id),
            project_id: self.project_id,
            order,
            assigned_to: None,
            comments_count: 0,
            created_at: None,
            updated_at: None,
        };
        tasks.push(task.clone());
        task
    }

    pub fn status_of(&self, task_id: Uuid) -> Option<TaskStatus> {
        self.tasks
            .lock()
            .iter()
            .find(|task| task.id == task_id)
            .map(|task| task.status)
    }

    pub fn task_on_server(&self, task_id: Uuid) -> Option<Task> {
        self.tasks.lock().iter().find(|task| task.id == task_id).cloned()
    }

    pub fn sprint_status(&self, sprint_id: Uuid) -> Option<SprintStatus> {
        self.sprints
            .lock()
            .iter()
            .find(|sprint| sprint.id == sprint_id)
            .map(|sprint| sprint.status)
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn issue_token(&self) -> String {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let token = format!("access-{}", n);
        self.accept_token(&token);
        token
    }

    fn authorized(&self, req: &HttpRequest) -> bool {
        if self.reject_all_tokens.load(Ordering::SeqCst) {
            return false;
        }
        req.headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|token| self.valid_tokens.lock().contains(token))
    }
}

pub fn user() -> UserProfile {
    UserProfile {
        id: 7,
        email: EMAIL.to_string(),
        first_name: Some("Ada".to_string()),
        last_name: Some("Lovelace".to_string()),
    }
}

fn token_rejected() -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({
        "detail": "Given token not valid for any token type",
        "code": "token_not_valid"
    }))
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "detail": "Not found." }))
}

macro_rules! require_auth {
    ($api:expr, $req:expr) => {
        if !$api.authorized(&$req) {
            return token_rejected();
        }
    };
}

async fn login(api: web::Data<MockApi>, body: web::Json<Value>) -> HttpResponse {
    if body["email"] != EMAIL || body["password"] != PASSWORD {
        return HttpResponse::Unauthorized().json(json!({
            "detail": "No active account found with the given credentials"
        }));
    }
    HttpResponse::Ok().json(json!({
        "access": api.issue_token(),
        "refresh": REFRESH_TOKEN,
        "user": user(),
    }))
}

async fn register(api: web::Data<MockApi>, body: web::Json<Value>) -> HttpResponse {
    if body["email"] == EMAIL {
        return HttpResponse::BadRequest().json(json!({
            "email": ["A user is already registered with this e-mail address."]
        }));
    }
    HttpResponse::Created().json(json!({
        "access_token": api.issue_token(),
        "refresh_token": REFRESH_TOKEN,
        "user": {
            "id": 8,
            "email": body["email"],
            "first_name": body["first_name"],
            "last_name": body["last_name"],
        },
    }))
}

async fn refresh(api: web::Data<MockApi>, body: web::Json<Value>) -> HttpResponse {
    api.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let delay = api.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        rt::time::sleep(Duration::from_millis(delay)).await;
    }
    if api.reject_refresh.load(Ordering::SeqCst) || body["refresh"] != REFRESH_TOKEN {
        return HttpResponse::Unauthorized().json(json!({
            "detail": "Token is invalid or expired",
            "code": "token_not_valid"
        }));
    }
    HttpResponse::Ok().json(json!({ "access": api.issue_token() }))
}

async fn logout(api: web::Data<MockApi>) -> HttpResponse {
    api.logout_calls.fetch_add(1, Ordering::SeqCst);
    if api.fail_logout.load(Ordering::SeqCst) {
        return HttpResponse::InternalServerError().finish();
    }
    HttpResponse::Ok().json(json!({ "detail": "Successfully logged out." }))
}

async fn current_user(api: web::Data<MockApi>, req: HttpRequest) -> HttpResponse {
    require_auth!(api, req);
    HttpResponse::Ok().json(user())
}

async fn list_projects(api: web::Data<MockApi>, req: HttpRequest) -> HttpResponse {
    require_auth!(api, req);
    HttpResponse::Ok().json(api.projects.lock().clone())
}

async fn get_project(api: web::Data<MockApi>, req: HttpRequest, path: web::Path<Uuid>) -> HttpResponse {
    require_auth!(api, req);
    let project_id = path.into_inner();
    match api.projects.lock().iter().find(|project| project.id == project_id) {
        Some(project) => HttpResponse::Ok().json(project),
        None => not_found(),
    }
}

async fn create_project(api: web::Data<MockApi>, req: HttpRequest, draft: web::Json<ProjectDraft>) -> HttpResponse {
    require_auth!(api, req);
    let draft = draft.into_inner();
    if draft.name.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({ "name": ["This field may not be blank."] }));
    }
    let project = Project {
        id: Uuid::new_v4(),
        name: draft.name,
        description: draft.description,
    };
    api.projects.lock().push(project.clone());
    HttpResponse::Created().json(project)
}

async fn list_sprints(
    api: web::Data<MockApi>,
    req: HttpRequest,
    query: web::Query<HashMap<String, String>>,
) -> HttpResponse {
    require_auth!(api, req);
    let project = query.get("project_id").and_then(|raw| raw.parse::<Uuid>().ok());
    let sprints: Vec<Sprint> = api
        .sprints
        .lock()
        .iter()
        .filter(|sprint| project.is_none() || Some(sprint.project_id) == project)
        .cloned()
        .collect();
    HttpResponse::Ok().json(sprints)
}

async fn create_sprint(api: web::Data<MockApi>, req: HttpRequest, draft: web::Json<SprintDraft>) -> HttpResponse {
    require_auth!(api, req);
    let draft = draft.into_inner();
    if draft.end_date <= draft.start_date {
        return HttpResponse::BadRequest().json(json!({
            "non_field_errors": ["End date must be after start date."]
        }));
    }
    let sprint = Sprint {
        id: Uuid::new_v4(),
        name: draft.name,
        project_id: draft.project_id,
        start_date: Some(draft.start_date),
        end_date: Some(draft.end_date),
        status: draft.status,
        goal: draft.goal,
    };
    api.sprints.lock().push(sprint.clone());
    HttpResponse::Created().json(sprint)
}

async fn set_active_sprint(api: web::Data<MockApi>, req: HttpRequest, path: web::Path<Uuid>) -> HttpResponse {
    require_auth!(api, req);
    let sprint_id = path.into_inner();
    let mut sprints = api.sprints.lock();
    let Some(project_id) = sprints.iter().find(|sprint| sprint.id == sprint_id).map(|sprint| sprint.project_id) else {
        return not_found();
    };
    for sprint in sprints.iter_mut().filter(|sprint| sprint.project_id == project_id) {
        if sprint.id == sprint_id {
            sprint.status = SprintStatus::Active;
        } else if sprint.status == SprintStatus::Active {
            sprint.status = SprintStatus::Planning;
        }
    }
    match sprints.iter().find(|sprint| sprint.id == sprint_id) {
        Some(sprint) => HttpResponse::Ok().json(sprint),
        None => not_found(),
    }
}

async fn complete_sprint(api: web::Data<MockApi>, req: HttpRequest, path: web::Path<Uuid>) -> HttpResponse {
    require_auth!(api, req);
    let sprint_id = path.into_inner();
    let mut sprints = api.sprints.lock();
    let Some(sprint) = sprints.iter_mut().find(|sprint| sprint.id == sprint_id) else {
        return not_found();
    };
    sprint.status = SprintStatus::Completed;
    for task in api
        .tasks
        .lock()
        .iter_mut()
        .filter(|task| task.sprint_id == Some(sprint_id) && task.status != TaskStatus::Deployed)
    {
        task.sprint_id = None;
    }
    HttpResponse::Ok().json(sprint.clone())
}

async fn list_tasks(
    api: web::Data<MockApi>,
    req: HttpRequest,
    query: web::Query<HashMap<String, String>>,
) -> HttpResponse {
    api.task_list_calls.fetch_add(1, Ordering::SeqCst);
    require_auth!(api, req);
    let delay = api.list_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        rt::time::sleep(Duration::from_millis(delay)).await;
    }
    if api.fail_task_list.load(Ordering::SeqCst) {
        return HttpResponse::InternalServerError().json(json!({ "detail": "database unavailable" }));
    }

    let project = query.get("project_id").and_then(|raw| raw.parse::<Uuid>().ok());
    let sprint = query.get("sprint_id").and_then(|raw| raw.parse::<Uuid>().ok());
    let tasks: Vec<Task> = api
        .tasks
        .lock()
        .iter()
        .filter(|task| Some(task.project_id) == project)
        .filter(|task| sprint.is_none() || task.sprint_id == sprint)
        .cloned()
        .collect();
    HttpResponse::Ok().json(tasks)
}

async fn create_task(api: web::Data<MockApi>, req: HttpRequest, draft: web::Json<TaskDraft>) -> HttpResponse {
    require_auth!(api, req);
    let draft = draft.into_inner();
    if draft.title.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({ "title": ["This field may not be blank."] }));
    }
    let mut tasks = api.tasks.lock();
    let task = Task {
        id: Uuid::new_v4(),
        order: tasks.iter().filter(|task| task.status == draft.status).count() as i32,
        title: draft.title,
        description: draft.description,
        status: draft.status,
        priority: draft.priority,
        story_points: draft.story_points,
        sprint_id: draft.sprint_id,
        project_id: draft.project_id,
        assigned_to: None,
        comments_count: 0,
        created_at: None,
        updated_at: None,
    };
    tasks.push(task.clone());
    HttpResponse::Created().json(task)
}

async fn update_task(
    api: web::Data<MockApi>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    patch: web::Json<TaskPatch>,
) -> HttpResponse {
    require_auth!(api, req);
    let task_id = path.into_inner();
    let patch = patch.into_inner();
    let mut tasks = api.tasks.lock();
    let Some(task) = tasks.iter_mut().find(|task| task.id == task_id) else {
        return not_found();
    };
    if let Some(title) = patch.title {
        task.title = title;
    }
    if let Some(description) = patch.description {
        task.description = description;
    }
    if let Some(status) = patch.status {
        task.status = status;
    }
    if let Some(priority) = patch.priority {
        task.priority = priority;
    }
    if let Some(points) = patch.story_points {
        task.story_points = points;
    }
    if let Some(sprint) = patch.sprint_id {
        task.sprint_id = sprint;
    }
    if let Some(assignee) = patch.assigned_to {
        task.assigned_to = assignee;
    }
    HttpResponse::Ok().json(task.clone())
}

async fn get_task(api: web::Data<MockApi>, req: HttpRequest, path: web::Path<Uuid>) -> HttpResponse {
    require_auth!(api, req);
    match api.task_on_server(path.into_inner()) {
        Some(task) => HttpResponse::Ok().json(task),
        None => not_found(),
    }
}

async fn move_task(
    api: web::Data<MockApi>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<MoveRequest>,
) -> HttpResponse {
    require_auth!(api, req);
    api.move_calls.fetch_add(1, Ordering::SeqCst);
    if api.reject_moves.load(Ordering::SeqCst) {
        return HttpResponse::Forbidden().json(json!({
            "detail": "You do not have permission to move this task."
        }));
    }
    let task_id = path.into_inner();
    let mut tasks = api.tasks.lock();
    let order = tasks
        .iter()
        .filter(|task| task.status == body.status && task.id != task_id)
        .count() as i32;
    let Some(task) = tasks.iter_mut().find(|task| task.id == task_id) else {
        return not_found();
    };
    task.status = body.status;
    task.order = order;
    HttpResponse::Ok().json(task.clone())
}

async fn delete_task(api: web::Data<MockApi>, req: HttpRequest, path: web::Path<Uuid>) -> HttpResponse {
    require_auth!(api, req);
    let task_id = path.into_inner();
    let mut tasks = api.tasks.lock();
    let before = tasks.len();
    tasks.retain(|task| task.id != task_id);
    if tasks.len() == before {
        return not_found();
    }
    HttpResponse::NoContent().finish()
}

async fn list_comments(
    api: web::Data<MockApi>,
    req: HttpRequest,
    query: web::Query<HashMap<String, String>>,
) -> HttpResponse {
    require_auth!(api, req);
    let task = query.get("task_id").and_then(|raw| raw.parse::<Uuid>().ok());
    let comments: Vec<Comment> = api
        .comments
        .lock()
        .iter()
        .filter(|comment| Some(comment.task_id) == task)
        .cloned()
        .collect();
    HttpResponse::Ok().json(comments)
}

async fn create_comment(api: web::Data<MockApi>, req: HttpRequest, draft: web::Json<CommentDraft>) -> HttpResponse {
    require_auth!(api, req);
    let draft = draft.into_inner();
    let mut tasks = api.tasks.lock();
    let Some(task) = tasks.iter_mut().find(|task| task.id == draft.task_id) else {
        return HttpResponse::BadRequest().json(json!({ "task": ["Invalid pk - object does not exist."] }));
    };
    task.comments_count += 1;
    let comment = Comment {
        id: Uuid::new_v4(),
        task_id: draft.task_id,
        user: Some(user()),
        text: draft.text,
        created_at: Some(chrono::Utc::now()),
    };
    api.comments.lock().push(comment.clone());
    HttpResponse::Created().json(comment)
}

async fn update_comment(
    api: web::Data<MockApi>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    draft: web::Json<CommentDraft>,
) -> HttpResponse {
    require_auth!(api, req);
    let comment_id = path.into_inner();
    let mut comments = api.comments.lock();
    let Some(comment) = comments.iter_mut().find(|comment| comment.id == comment_id) else {
        return not_found();
    };
    comment.text = draft.into_inner().text;
    HttpResponse::Ok().json(comment.clone())
}

async fn delete_comment(api: web::Data<MockApi>, req: HttpRequest, path: web::Path<Uuid>) -> HttpResponse {
    require_auth!(api, req);
    let comment_id = path.into_inner();
    let removed = {
        let mut comments = api.comments.lock();
        let Some(index) = comments.iter().position(|comment| comment.id == comment_id) else {
            return not_found();
        };
        comments.remove(index)
    };
    if let Some(task) = api.tasks.lock().iter_mut().find(|task| task.id == removed.task_id) {
        task.comments_count = task.comments_count.saturating_sub(1);
    }
    HttpResponse::NoContent().finish()
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth/login", web::post().to(login))
        .route("/auth/registration", web::post().to(register))
        .route("/auth/token/refresh", web::post().to(refresh))
        .route("/auth/logout", web::post().to(logout))
        .route("/auth/user", web::get().to(current_user))
        .route("/projects", web::get().to(list_projects))
        .route("/projects", web::post().to(create_project))
        .route("/projects/{id}", web::get().to(get_project))
        .route("/sprints", web::get().to(list_sprints))
        .route("/sprints", web::post().to(create_sprint))
        .route("/sprints/{id}/set_active", web::patch().to(set_active_sprint))
        .route("/sprints/{id}/complete", web::patch().to(complete_sprint))
        .route("/tasks", web::get().to(list_tasks))
        .route("/tasks", web::post().to(create_task))
        .route("/tasks/{id}", web::get().to(get_task))
        .route("/tasks/{id}", web::put().to(update_task))
        .route("/tasks/{id}", web::delete().to(delete_task))
        .route("/tasks/{id}/move", web::patch().to(move_task))
        .route("/comments", web::get().to(list_comments))
        .route("/comments", web::post().to(create_comment))
        .route("/comments/{id}", web::put().to(update_comment))
        .route("/comments/{id}", web::delete().to(delete_comment));
}

/// Starts the mock server and returns its base URL.
pub fn spawn_server(api: Arc<MockApi>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let data = web::Data::from(api);
    let server = HttpServer::new(move || App::new().app_data(data.clone()).configure(routes))
        .workers(1)
        .disable_signals()
        .listen(listener)
        .expect("Failed to start mock server")
        .run();
    rt::spawn(server);

    format!("http://127.0.0.1:{}", port)
}

pub fn client_with(base_url: &str, credentials: Arc<CredentialStore>) -> Arc<ApiClient> {
    Arc::new(ApiClient::new(ClientConfig::new(base_url), credentials).expect("Failed to build client"))
}

/// A client with no session.
pub fn anonymous_client(base_url: &str) -> Arc<ApiClient> {
    client_with(base_url, Arc::new(CredentialStore::in_memory()))
}

/// A client whose store already holds `access_token`. The server only accepts it
/// if the test has called [`MockApi::accept_token`].
pub fn client_with_token(base_url: &str, access_token: &str) -> Arc<ApiClient> {
    let credentials = Arc::new(CredentialStore::in_memory());
    credentials
        .set(Credential::new(access_token, REFRESH_TOKEN), user())
        .expect("Failed to seed credentials");
    client_with(base_url, credentials)
}

pub fn open_store(storage: Arc<dyn SessionStorage>) -> Arc<CredentialStore> {
    Arc::new(CredentialStore::open(storage).expect("Failed to open credential store"))
}
