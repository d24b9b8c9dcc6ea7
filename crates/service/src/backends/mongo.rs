use std::{process::Stdio, sync::Arc, time::Duration};

use async_trait::async_trait;
use configs::MongoConfig;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_document, Document},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument},
    Client, Collection, IndexModel,
};
use tokio::{
    process::{Child, Command},
    sync::{Mutex, RwLock},
};
use tracing::{debug, info, warn};

use crate::employees::backend::{resolve_id, EmployeesBackend};
use crate::employees::{BackendDeps, BackendRegistry, Employee, EmployeeError, EmployeePatch, NewEmployee, RegistryError};

const DUPLICATE_KEY: i32 = 11000;
const CLIENT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
const MONGOD_START_TIMEOUT: Duration = Duration::from_secs(30);

struct MongoHandle {
    client: Client,
    collection: Collection<Employee>,
}

/// Document-store backend. `mongoInMemory` additionally owns a throwaway
/// `mongod` process which is stopped in `save`.
pub struct MongoEmployees {
    handle: RwLock<Option<MongoHandle>>,
    server: Mutex<Option<EphemeralMongod>>,
}

fn mongo_err(e: MongoError) -> EmployeeError {
    EmployeeError::storage(e)
}

fn is_duplicate_key(e: &MongoError) -> bool {
    matches!(&*e.kind, ErrorKind::Write(WriteFailure::WriteError(w)) if w.code == DUPLICATE_KEY)
}

fn by_id(id: &str) -> Document {
    doc! { "id": id }
}

impl MongoEmployees {
    /// Connect to `uri` and ensure the indexes exist.
    pub async fn connect(uri: &str, cfg: &MongoConfig) -> anyhow::Result<Self> {
        Self::connect_with_server(uri, cfg, None).await
    }

    async fn connect_with_server(uri: &str, cfg: &MongoConfig, server: Option<EphemeralMongod>) -> anyhow::Result<Self> {
        let client = Client::with_uri_str(uri).await?;
        let collection = client.database(&cfg.db_name).collection::<Employee>(&cfg.collection);

        let unique_id = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        collection.create_index(unique_id, None).await?;
        collection.create_index(IndexModel::builder().keys(doc! { "department": "hashed" }).build(), None).await?;
        info!(db = %cfg.db_name, collection = %cfg.collection, "mongo collection ready");

        Ok(Self { handle: RwLock::new(Some(MongoHandle { client, collection })), server: Mutex::new(server) })
    }

    /// Spawn a private `mongod` and connect to it.
    pub async fn in_memory(cfg: &MongoConfig) -> anyhow::Result<Self> {
        let server = EphemeralMongod::start(&cfg.mongod_path).await?;
        let uri = server.uri();
        Self::connect_with_server(&uri, cfg, Some(server)).await
    }

    async fn collection(&self) -> Result<Collection<Employee>, EmployeeError> {
        self.handle.read().await.as_ref().map(|h| h.collection.clone()).ok_or(EmployeeError::Closed)
    }
}

#[async_trait]
impl EmployeesBackend for MongoEmployees {
    async fn get_all(&self, department: Option<&str>) -> Result<Vec<Employee>, EmployeeError> {
        let coll = self.collection().await?;
        let filter = match department {
            Some(dep) => doc! { "department": dep },
            None => Document::new(),
        };
        let cursor = coll.find(filter, None).await.map_err(mongo_err)?;
        cursor.try_collect().await.map_err(mongo_err)
    }

    async fn get_employee(&self, id: &str) -> Result<Employee, EmployeeError> {
        let coll = self.collection().await?;
        coll.find_one(by_id(id), None)
            .await
            .map_err(mongo_err)?
            .ok_or_else(|| EmployeeError::NotFound(id.to_string()))
    }

    async fn add_employee(&self, input: NewEmployee) -> Result<Employee, EmployeeError> {
        let coll = self.collection().await?;
        let id = resolve_id(input.id.as_deref());
        let record = input.into_employee(id);
        match coll.insert_one(&record, None).await {
            Ok(_) => Ok(record),
            Err(e) if is_duplicate_key(&e) => Err(EmployeeError::AlreadyExists(record.id)),
            Err(e) => Err(mongo_err(e)),
        }
    }

    async fn update_employee(&self, id: &str, patch: EmployeePatch) -> Result<Employee, EmployeeError> {
        if patch.is_empty() {
            return self.get_employee(id).await;
        }
        let coll = self.collection().await?;
        let set = to_document(&patch).map_err(EmployeeError::storage)?;
        let options = FindOneAndUpdateOptions::builder().return_document(ReturnDocument::After).build();
        coll.find_one_and_update(by_id(id), doc! { "$set": set }, options)
            .await
            .map_err(mongo_err)?
            .ok_or_else(|| EmployeeError::NotFound(id.to_string()))
    }

    async fn delete_employee(&self, id: &str) -> Result<Employee, EmployeeError> {
        let coll = self.collection().await?;
        coll.find_one_and_delete(by_id(id), None)
            .await
            .map_err(mongo_err)?
            .ok_or_else(|| EmployeeError::NotFound(id.to_string()))
    }

    async fn save(&self) -> Result<(), EmployeeError> {
        let handle = self.handle.write().await.take();
        let client_result = match handle {
            Some(MongoHandle { client, collection }) => {
                drop(collection);
                match tokio::time::timeout(CLIENT_SHUTDOWN_TIMEOUT, client.shutdown()).await {
                    Ok(()) => {
                        info!("mongo client closed");
                        Ok(())
                    }
                    Err(_) => Err(EmployeeError::Storage("timed out closing mongo client".into())),
                }
            }
            None => {
                warn!("mongo backend already closed");
                Ok(())
            }
        };

        // the spawned server is stopped even when closing the client failed
        if let Some(server) = self.server.lock().await.take() {
            server.stop().await;
        }
        client_result
    }
}

/// A `mongod` child process bound to a free local port, with its data in a
/// temp dir removed on drop.
pub struct EphemeralMongod {
    child: Child,
    port: u16,
    _data_dir: tempfile::TempDir,
}

impl EphemeralMongod {
    pub async fn start(mongod_path: &str) -> anyhow::Result<Self> {
        let data_dir = tempfile::tempdir()?;
        let port = free_port()?;
        let mut child = Command::new(mongod_path)
            .arg("--dbpath")
            .arg(data_dir.path())
            .args(["--port", &port.to_string(), "--bind_ip", "127.0.0.1", "--quiet"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| anyhow::anyhow!("failed to spawn {mongod_path}: {e}"))?;

        let deadline = tokio::time::Instant::now() + MONGOD_START_TIMEOUT;
        loop {
            if tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
                break;
            }
            if let Some(status) = child.try_wait()? {
                anyhow::bail!("mongod exited early with {status}");
            }
            if tokio::time::Instant::now() >= deadline {
                let _ = child.kill().await;
                anyhow::bail!("mongod did not accept connections on port {port}");
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        info!(port, "ephemeral mongod started");
        Ok(Self { child, port, _data_dir: data_dir })
    }

    pub fn uri(&self) -> String {
        format!("mongodb://127.0.0.1:{}/?directConnection=true", self.port)
    }

    pub async fn stop(mut self) {
        match self.child.kill().await {
            Ok(()) => info!(port = self.port, "ephemeral mongod stopped"),
            Err(e) => warn!(port = self.port, error = %e, "failed to stop mongod"),
        }
    }
}

fn free_port() -> std::io::Result<u16> {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0))?;
    Ok(listener.local_addr()?.port())
}

async fn open_external(deps: BackendDeps) -> anyhow::Result<Arc<dyn EmployeesBackend>> {
    let uri = deps
        .mongo
        .uri
        .clone()
        .ok_or_else(|| anyhow::anyhow!("mongo backend needs MONGO_URI (or mongo.uri)"))?;
    debug!(db = %deps.mongo.db_name, "connecting to mongo");
    Ok(Arc::new(MongoEmployees::connect(&uri, &deps.mongo).await?) as Arc<dyn EmployeesBackend>)
}

async fn open_in_memory(deps: BackendDeps) -> anyhow::Result<Arc<dyn EmployeesBackend>> {
    Ok(Arc::new(MongoEmployees::in_memory(&deps.mongo).await?) as Arc<dyn EmployeesBackend>)
}

/// Register `mongo` and `mongoInMemory`.
pub fn register(registry: &mut BackendRegistry) -> Result<(), RegistryError> {
    registry.register("mongo", open_external)?;
    registry.register("mongoInMemory", open_in_memory)?;
    Ok(())
}
