use clap::Parser;
use server::network::{decode_datagram, MAX_DATAGRAM};
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;

/// Line-mode client for poking at a running server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server hostname or IP address
    host: String,
    /// Server port
    port: u16,
    /// Player name; joins as the spectator when omitted
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let server_addr: SocketAddr = tokio::net::lookup_host((args.host.as_str(), args.port))
        .await?
        .next()
        .ok_or("could not resolve server address")?;

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    println!("Client socket bound to {}", socket.local_addr()?);

    let hello = match &args.name {
        Some(name) => format!("PLAY {}", name),
        None => "SPECTATE".to_string(),
    };
    println!("Sending {:?} to {}", hello, server_addr);
    socket.send_to(hello.as_bytes(), server_addr).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut buf = vec![0u8; MAX_DATAGRAM];
    let mut stdin_open = true;

    loop {
        tokio::select! {
            received = socket.recv_from(&mut buf) => {
                let (len, from) = received?;
                if from != server_addr {
                    continue;
                }
                let text = decode_datagram(&buf[..len]);
                println!("{}", text);
                if text.starts_with("QUIT") {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                let line = match line? {
                    Some(line) => line,
                    None => {
                        // Stdin closed, leave the game politely
                        stdin_open = false;
                        socket.send_to(b"KEY Q", server_addr).await?;
                        continue;
                    }
                };
                for key in line.chars().filter(|c| !c.is_whitespace()) {
                    socket.send_to(format!("KEY {}", key).as_bytes(), server_addr).await?;
                }
            }
        }
    }

    println!("Test client finished");
    Ok(())
}
