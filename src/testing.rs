use anyhow::Result;
use axum_test::TestServer;
use blob_store::BlobStorageConfig;

use crate::{
    config::ServerConfig,
    routes::{create_routes, RouteState},
    service::Service,
};

pub struct TestService {
    pub service: Service,
    pub server: TestServer,
    _temp_dir: tempfile::TempDir,
}

impl TestService {
    pub async fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let blob_path = temp_dir.path().join("blob_store");
        std::fs::create_dir_all(&blob_path)?;

        let cfg = ServerConfig {
            blob_storage: BlobStorageConfig {
                path: format!("file://{}", blob_path.display()),
            },
            ..Default::default()
        };
        let service = Service::new(cfg).await?;

        let server = TestServer::new(create_routes(RouteState {
            blob_storage: service.blob_storage.clone(),
        }))?;

        Ok(Self {
            service,
            server,
            _temp_dir: temp_dir,
        })
    }
}
