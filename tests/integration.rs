use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use remote_storage::config::ServerConfig;
use remote_storage::document::FilesystemDocumentStore;
use remote_storage::metadata::{DatabaseMetadataStore, MetadataDatabase};
use remote_storage::{RemoteStorage, Server, StoragePath};

type DiskStorage = RemoteStorage<DatabaseMetadataStore, FilesystemDocumentStore>;

fn open_storage(dir: &std::path::Path) -> (Arc<MetadataDatabase>, DiskStorage) {
    let database = Arc::new(MetadataDatabase::open(dir.join("metadata.json")).unwrap());
    let documents = FilesystemDocumentStore::new(dir.join("storage")).unwrap();
    let storage = RemoteStorage::new(DatabaseMetadataStore::new(Arc::clone(&database)), documents);
    (database, storage)
}

fn path(raw: &str) -> StoragePath {
    StoragePath::parse(raw).unwrap()
}

#[test]
fn test_versions_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let doc = path("/admin/contacts/work/colleagues.vcf");

    {
        let (database, storage) = open_storage(dir.path());
        storage.put_document(&doc, "text/vcard", b"v1").unwrap();
        storage.put_document(&doc, "text/vcard", b"v2").unwrap();
        database.close().unwrap();
    }

    let (_database, storage) = open_storage(dir.path());
    assert_eq!(storage.get_version(&doc).unwrap(), Some(2));
    assert_eq!(storage.get_document(&doc).unwrap(), b"v2");
    assert_eq!(storage.get_version(&StoragePath::storage_root()).unwrap(), Some(2));

    assert_eq!(storage.put_document(&doc, "text/vcard", b"v3").unwrap(), 3);
    let listing = storage.get_folder(&path("/admin/contacts/")).unwrap();
    assert_eq!(listing.items["work/"].etag, Some(3));
}

#[test]
fn test_delete_removes_bytes_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let (_database, storage) = open_storage(dir.path());
    let doc = path("/admin/public/photos/p.jpg");

    storage.put_document(&doc, "image/jpeg", b"jpeg").unwrap();
    storage.delete_document(&doc).unwrap();

    assert_eq!(storage.get_version(&doc).unwrap(), None);
    assert_eq!(storage.get_version(&path("/admin/public/photos/")).unwrap(), None);
    assert!(!dir.path().join("storage/admin/public/photos").exists());

    let public = StoragePath::user_root("admin", true).unwrap();
    assert!(storage.get_folder(&public).unwrap().items.is_empty());
}

struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: std::net::SocketAddr) -> (Self, String) {
        let (read_half, writer) = TcpStream::connect(addr).await.unwrap().into_split();
        let mut client = Self {
            reader: BufReader::new(read_half),
            writer,
        };
        let greeting = client.read_line().await;
        (client, greeting)
    }

    async fn read_line(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).await.unwrap();
        line.trim_end().to_string()
    }

    async fn send(&mut self, line: &str, body: &[u8]) -> String {
        let mut request = format!("{}\r\n", line).into_bytes();
        request.extend_from_slice(body);
        self.writer.write_all(&request).await.unwrap();
        self.writer.flush().await.unwrap();
        self.read_line().await
    }

    async fn is_closed(&mut self) -> bool {
        let mut rest = String::new();
        self.reader.read_line(&mut rest).await.unwrap_or(0) == 0
    }

    async fn read_body(&mut self, length: usize) -> Vec<u8> {
        let mut body = vec![0u8; length];
        self.reader.read_exact(&mut body).await.unwrap();
        body
    }
}

async fn serve(config: ServerConfig) -> (tempfile::TempDir, std::net::SocketAddr) {
    let dir = tempfile::tempdir().unwrap();
    let (_database, storage) = open_storage(dir.path());
    let server = Server::bind(config, Arc::new(storage)).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move { server.start().await });
    (dir, addr)
}

fn test_config() -> ServerConfig {
    ServerConfig {
        port: 0,
        ..ServerConfig::default()
    }
}

#[tokio::test]
async fn test_session_put_get_list_delete() {
    let (_dir, addr) = serve(test_config()).await;
    let (mut client, greeting) = Client::connect(addr).await;
    assert!(greeting.starts_with("220 "));

    let put = client
        .send("PUT /admin/notes/todo.txt text/plain 5", b"hello")
        .await;
    assert_eq!(put, "201 1");

    let get = client.send("GET /admin/notes/todo.txt", b"").await;
    assert_eq!(get, "200 5 1 text/plain");
    assert_eq!(client.read_body(5).await, b"hello");

    let head = client.send("HEAD /admin/", b"").await;
    assert_eq!(head, "200 1 -");

    let list = client.send("GET /admin/notes/", b"").await;
    let length: usize = list.split(' ').nth(1).unwrap().parse().unwrap();
    assert!(list.ends_with("application/ld+json"));
    let listing: serde_json::Value =
        serde_json::from_slice(&client.read_body(length).await).unwrap();
    assert_eq!(
        listing["@context"],
        "http://remotestorage.io/spec/folder-description"
    );
    assert_eq!(listing["items"]["todo.txt"]["ETag"], 1);
    assert_eq!(listing["items"]["todo.txt"]["Content-Type"], "text/plain");

    assert_eq!(client.send("DELETE /admin/notes/todo.txt", b"").await, "200 Deleted");
    assert!(client.send("GET /admin/notes/todo.txt", b"").await.starts_with("404 "));
    assert!(client.send("GET /admin", b"").await.starts_with("400 "));

    assert!(client.send("QUIT", b"").await.starts_with("221 "));
}

#[tokio::test]
async fn test_oversized_body_is_refused() {
    let config = ServerConfig {
        max_document_size: 4,
        ..test_config()
    };
    let (_dir, addr) = serve(config).await;
    let (mut client, _) = Client::connect(addr).await;

    let reply = client.send("PUT /admin/notes/big.txt text/plain 10", b"").await;
    assert!(reply.starts_with("413 "));
}

#[tokio::test]
async fn test_connection_limit() {
    let config = ServerConfig {
        max_clients: 1,
        ..test_config()
    };
    let (_dir, addr) = serve(config).await;

    let (_first, greeting) = Client::connect(addr).await;
    assert!(greeting.starts_with("220 "));

    let (_second, refusal) = Client::connect(addr).await;
    assert!(refusal.starts_with("421 "));
}

#[tokio::test]
async fn test_long_put_line_does_not_run_its_body() {
    let config = ServerConfig {
        max_command_length: 64,
        ..test_config()
    };
    let (_dir, addr) = serve(config).await;

    let (mut client, _) = Client::connect(addr).await;
    assert_eq!(
        client.send("PUT /admin/m/keep.txt text/plain 4", b"keep").await,
        "201 1"
    );

    let content_type = format!("text/plain;{}", "x".repeat(80));
    let line = format!("PUT /admin/m/new.txt {} 26", content_type);
    let reply = client.send(&line, b"DELETE /admin/m/keep.txt\r\n").await;
    assert_eq!(reply, "500 Command too long");
    assert!(client.is_closed().await);

    let (mut other, _) = Client::connect(addr).await;
    assert_eq!(other.send("HEAD /admin/m/keep.txt", b"").await, "200 1 text/plain");
    assert!(other.send("HEAD /admin/m/new.txt", b"").await.starts_with("404 "));
}

#[tokio::test]
async fn test_unterminated_line_is_cut_off() {
    let config = ServerConfig {
        max_command_length: 64,
        ..test_config()
    };
    let (_dir, addr) = serve(config).await;
    let (mut client, _) = Client::connect(addr).await;

    client
        .writer
        .write_all("G".repeat(4096).as_bytes())
        .await
        .unwrap();
    assert_eq!(client.read_line().await, "500 Command too long");
    assert!(client.is_closed().await);
}
