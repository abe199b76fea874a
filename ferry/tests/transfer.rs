//! End-to-end transfers against a server on a loopback port.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use ferry::{Client, Error, Op, Packet, Server, ServerConfig};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::oneshot;

/// Starts a server rooted at `root` and returns its address and a stop handle.
async fn start(root: &Path) -> (SocketAddr, oneshot::Sender<()>) {
    let config = ServerConfig::default()
        .with_listen(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
        .with_root(root);
    let server = Server::bind(&config).await.unwrap();
    let addr = server.local_addr().unwrap();

    let (stop, stopped) = oneshot::channel::<()>();
    tokio::spawn(server.run_until(async move {
        let _ = stopped.await;
    }));
    (addr, stop)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn upload_then_download() {
    let root = tempfile::tempdir().unwrap();
    let (addr, _stop) = start(root.path()).await;

    let mut client = Client::connect(addr).await.unwrap();
    let ack = client.upload("a.txt", b"hello".to_vec()).await.unwrap();
    assert_eq!(ack, "upload successful");
    assert_eq!(std::fs::read(root.path().join("a.txt")).unwrap(), b"hello");

    // Same connection, next request.
    assert_eq!(client.download("a.txt").await.unwrap(), b"hello");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn download_missing_keeps_connection_usable() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("present.txt"), b"here").unwrap();
    let (addr, _stop) = start(root.path()).await;

    let mut client = Client::connect(addr).await.unwrap();
    let err = client.download("missing.txt").await.unwrap_err();
    assert!(matches!(err, Error::Remote(ref m) if m.contains("missing.txt")), "{err}");

    assert_eq!(client.download("present.txt").await.unwrap(), b"here");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn repeated_downloads_are_identical() {
    let root = tempfile::tempdir().unwrap();
    let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(root.path().join("blob.bin"), &data).unwrap();
    let (addr, _stop) = start(root.path()).await;

    let mut client = Client::connect(addr).await.unwrap();
    let first = client.download("blob.bin").await.unwrap();
    let second = client.download("blob.bin").await.unwrap();
    assert_eq!(first, data);
    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_uploads_do_not_interfere() {
    let root = tempfile::tempdir().unwrap();
    let (addr, _stop) = start(root.path()).await;

    let mut tasks = Vec::new();
    for i in 0..8u8 {
        tasks.push(tokio::spawn(async move {
            let mut client = Client::connect(addr).await.unwrap();
            let name = format!("dir{}/file{i}.bin", i % 2);
            let data = vec![i; 64 * 1024 + usize::from(i)];
            client.upload(&name, data.clone()).await.unwrap();
            (name, data)
        }));
    }

    for task in tasks {
        let (name, data) = task.await.unwrap();
        assert_eq!(std::fs::read(root.path().join(&name)).unwrap(), data, "{name}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn truncated_upload_writes_nothing() {
    let root = tempfile::tempdir().unwrap();
    let (addr, _stop) = start(root.path()).await;

    let buf = Packet::upload("partial.txt", vec![1u8; 1000]).encode().unwrap();
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(&buf[..500]).await.unwrap();
    stream.shutdown().await.unwrap();

    // The server closes its side without answering.
    let resp = ferry_proto::recv(&mut stream).await.unwrap();
    assert!(resp.is_none());
    assert!(!root.path().join("partial.txt").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_op_gets_error_packet() {
    let root = tempfile::tempdir().unwrap();
    let (addr, _stop) = start(root.path()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    ferry_proto::send(&mut stream, &Packet::new(Op::Unknown(7), "", ""))
        .await
        .unwrap();
    let resp = ferry_proto::recv(&mut stream).await.unwrap().unwrap();
    assert_eq!(resp.op, Op::Error);
    assert_eq!(resp.message(), "unknown operation");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn file_helpers_roundtrip() {
    let root = tempfile::tempdir().unwrap();
    let local = tempfile::tempdir().unwrap();
    let (addr, _stop) = start(root.path()).await;

    let src = local.path().join("src.txt");
    std::fs::write(&src, b"file contents").unwrap();

    let mut client = Client::connect(addr).await.unwrap();
    client.upload_file(&src, "nested/copy.txt").await.unwrap();

    let dst = local.path().join("out/dir/copy.txt");
    let n = client.download_file("nested/copy.txt", &dst).await.unwrap();
    assert_eq!(n, 13);
    assert_eq!(std::fs::read(&dst).unwrap(), b"file contents");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stopped_server_refuses_connections() {
    let root = tempfile::tempdir().unwrap();
    let (addr, stop) = start(root.path()).await;

    let mut client = Client::connect(addr).await.unwrap();
    client.upload("before.txt", b"x".to_vec()).await.unwrap();

    stop.send(()).unwrap();
    // Wait for the accept loop to drop the listener.
    for _ in 0..50 {
        if TcpStream::connect(addr).await.is_err() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    panic!("listener still accepting after shutdown");
}
