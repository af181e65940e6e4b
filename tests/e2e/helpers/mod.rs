use podcast_studio::domain::assembly::AudioAssembler;
use podcast_studio::domain::pipeline::{PipelineDriver, PipelineOptions};
use podcast_studio::domain::script::Speaker;
use podcast_studio::domain::synthesis::{JobOrchestrator, OrchestratorSettings};
use podcast_studio::domain::voice::VoiceMap;
use podcast_studio::infrastructure::http::build_router;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use test_context::AsyncTestContext;
use tokio::net::TcpListener;

pub mod api_client;
pub mod fakes;
pub mod fixtures;

use api_client::TestClient;
use fakes::{FakeConcatenator, FakeJobClient};
use fixtures::TestFixtures;

pub const DATE: &str = "2025-02-05";

pub struct TestContext {
    pub client: TestClient,
    pub fixtures: TestFixtures,
    pub tts: Arc<FakeJobClient>,
    pub concatenator: Arc<FakeConcatenator>,
    _root: TempDir,
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            let root = tempfile::tempdir().expect("Failed to create output root");
            let tts = Arc::new(FakeJobClient::default());
            let concatenator = Arc::new(FakeConcatenator::default());

            let voices = VoiceMap::new([
                (Speaker::Luoyonghao, "voice-luo"),
                (Speaker::Wangziru, "voice-wang"),
            ]);
            let settings = OrchestratorSettings {
                poll_interval: Duration::from_millis(5),
                ..Default::default()
            };
            let options = PipelineOptions {
                intro_path: None,
                default_rss_url: "https://example.com/feed".to_string(),
                ..Default::default()
            };

            let driver = PipelineDriver::new(
                root.path().to_path_buf(),
                AudioAssembler::new(concatenator.clone()),
                options,
            )
            .with_orchestrator(JobOrchestrator::new(tts.clone(), voices, settings));

            let app = build_router(Arc::new(driver));

            // Start server
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind listener");
            let addr = listener.local_addr().expect("Failed to get local addr");
            let base_url = format!("http://{}", addr);

            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            // Wait for server to be ready
            tokio::time::sleep(Duration::from_millis(50)).await;

            Self {
                client: TestClient::new(&base_url),
                fixtures: TestFixtures::new(root.path()),
                tts,
                concatenator,
                _root: root,
            }
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async {
            // Output directory is removed when the TempDir drops
        }
    }
}

impl TestContext {
    /// Poll the status endpoint until the background run leaves `running`
    pub async fn wait_for_run(&self, date: &str) -> Value {
        for _ in 0..200 {
            let response = self
                .client
                .get(&format!("/api/episodes/{}", date))
                .await
                .unwrap();
            let body = response.body.clone().expect("Missing status body");
            if body.get("run_status").and_then(|v| v.as_str()) != Some("running") {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Run for {} did not finish in time", date);
    }
}
