//! One HTTP exchange, then raw bytes on the same socket.
//!
//! Spins up a local server that answers a GET with `101 Switching Protocols`
//! and then speaks a trivial echo protocol. The client issues the request,
//! takes ownership of the connection, and trades bytes over it directly.

use hijackhttp::{HijackClient, Request};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await?;

        let mut head = Vec::new();
        let mut byte = [0u8; 1];
        while !head.ends_with(b"\r\n\r\n") {
            socket.read_exact(&mut byte).await?;
            head.push(byte[0]);
        }

        socket
            .write_all(
                b"HTTP/1.1 101 Switching Protocols\r\n\
                  Upgrade: echo\r\nConnection: Upgrade\r\n\r\n",
            )
            .await?;

        let mut buf = [0u8; 4];
        socket.read_exact(&mut buf).await?;
        socket.write_all(&buf).await?;
        Ok::<_, std::io::Error>(())
    });

    let client = HijackClient::new();
    let request = Request::get(&format!("http://{}/echo", addr))?
        .header("Connection", "Upgrade")
        .header("Upgrade", "echo");
    let response = client.send_request(request).await?;
    println!("{} {}", response.protocol, response.status);

    let mut raw = response.into_stream();
    raw.write_all(b"ping").await?;
    let mut reply = [0u8; 4];
    raw.read_exact(&mut reply).await?;
    println!("echoed: {}", String::from_utf8_lossy(&reply));

    server.await??;
    Ok(())
}
