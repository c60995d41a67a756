use gallery_core::Result;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use tracing::{info, warn};

const LIVENESS_BODY: &str = "Art Blocks sales bot is running";

/// Single-route liveness responder: every request gets `200 OK` with a fixed
/// plain-text body. A bind failure is returned to the caller and is fatal.
pub fn spawn_health_server(bind: &str) -> Result<()> {
    let listener = TcpListener::bind(bind)?;
    let bind = bind.to_string();
    thread::spawn(move || {
        info!(%bind, "health server listening");
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(err) = respond(stream) {
                        warn!(?err, "health check response failed");
                    }
                }
                Err(err) => {
                    warn!(?err, "health server accept failed");
                }
            }
        }
    });
    Ok(())
}

fn respond(mut stream: TcpStream) -> std::io::Result<()> {
    let mut buffer = [0u8; 512];
    let _ = stream.read(&mut buffer);
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
        LIVENESS_BODY.len(),
        LIVENESS_BODY
    );
    stream.write_all(response.as_bytes())
}
