use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TodoBody {
    id: String,
    title: String,
    priority: String,
    status: String,
    repo_name: Option<String>,
    project_id: Option<String>,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("gh_pulse_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/health")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let unreachable_github = format!("http://127.0.0.1:{}", pick_free_port());
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_gh_pulse"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("GITHUB_API_URL", unreachable_github)
        .env_remove("GITHUB_TOKEN")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

#[tokio::test]
async fn http_missing_parameters_are_rejected() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/api/github/user", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, "Missing username");

    let response = client
        .get(format!("{}/api/github/repo-status?username=octocat", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, "Missing username or repo");
}

#[tokio::test]
async fn http_unreachable_github_is_a_network_error() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/api/github/user?username=octocat", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 502);
    let body: ErrorBody = response.json().await.unwrap();
    assert!(body.error.starts_with("Network error"), "{}", body.error);
}

#[tokio::test]
async fn http_todo_lifecycle() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/todos", server.base_url))
        .json(&serde_json::json!({
            "title": "Add a deploy workflow",
            "priority": "high",
            "repoName": "busy",
            "projectId": "lifecycle"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let created: TodoBody = response.json().await.unwrap();
    assert_eq!(created.title, "Add a deploy workflow");
    assert_eq!(created.priority, "high");
    assert_eq!(created.status, "todo");
    assert_eq!(created.repo_name.as_deref(), Some("busy"));

    let updated: TodoBody = client
        .patch(format!("{}/api/todos/{}", server.base_url, created.id))
        .json(&serde_json::json!({ "status": "in-progress" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated.status, "in-progress");

    let listed: Vec<TodoBody> = client
        .get(format!("{}/api/todos?projectId=lifecycle", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].project_id.as_deref(), Some("lifecycle"));

    let response = client
        .delete(format!("{}/api/todos/{}", server.base_url, created.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = client
        .delete(format!("{}/api/todos/{}", server.base_url, created.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn http_notification_settings_round_trip() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let saved: serde_json::Value = client
        .put(format!("{}/api/notification-settings", server.base_url))
        .json(&serde_json::json!({ "inactivityAlerts": false, "loadAlerts": true }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(saved["inactivityAlerts"], false);

    let current: serde_json::Value = client
        .get(format!("{}/api/notification-settings", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current["loadAlerts"], true);
    assert_eq!(current["inactivityAlerts"], false);
}
