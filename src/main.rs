//! Entry point for `snw-arq`.
//!
//! Parses CLI arguments and dispatches into either **server** or **client**
//! mode.  All actual protocol work is delegated to library modules; `main.rs`
//! owns only process setup (logging, signal handling, argument parsing).
//!
//! The server reliably receives units and echoes them back to their sender;
//! the client reads stdin lines, delivers each reliably, and prints the echo.
//! `--lossy` runs both directions of this process over a channel that drops
//! one in four outbound datagrams, which is what the protocol is for.

use std::error::Error;
use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use snw_arq::link::{ArqConfig, ArqError, Link, SendOutcome};
use snw_arq::lossy::{DropPolicy, LossyChannel};
use snw_arq::packet::MAX_PAYLOAD;
use snw_arq::session::SessionTable;
use snw_arq::socket::{Channel, Socket};

/// Stop-and-wait ARQ demo: reliable echo over lossy UDP.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Ack wait per send attempt, in milliseconds.
    #[arg(long, default_value_t = 200)]
    timeout_ms: u64,

    /// Retransmissions per unit before giving up.
    #[arg(long, default_value_t = 3)]
    max_resend: u32,

    /// Per-unit payload ceiling in bytes.
    #[arg(long, default_value_t = MAX_PAYLOAD)]
    max_payload: usize,

    /// Drop 1 in 4 outbound datagrams (bursts of two) to exercise the ARQ.
    #[arg(long)]
    lossy: bool,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Run the echo server.
    Server {
        /// Local address to bind; port 0 picks an ephemeral port.
        #[arg(short, long, default_value = "0.0.0.0:0")]
        bind: SocketAddr,
    },
    /// Send stdin lines to a server and print the echoes.
    Client {
        /// Remote server address (e.g. 127.0.0.1:9000).
        #[arg(short, long)]
        server: SocketAddr,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();
    let config = ArqConfig {
        timeout: Duration::from_millis(cli.timeout_ms),
        max_resend: cli.max_resend,
        max_payload: cli.max_payload,
    };

    match cli.mode {
        Mode::Server { bind } => {
            let socket = Socket::bind(bind).await?;
            let local = socket.local_addr;
            log::info!("server on {local} (lossy={})", cli.lossy);
            if cli.lossy {
                run_server(Link::new(burst_lossy(socket), config), local).await?;
            } else {
                run_server(Link::new(socket, config), local).await?;
            }
        }
        Mode::Client { server } => {
            let socket = Socket::bind("0.0.0.0:0".parse()?).await?;
            log::info!("client {} → {server} (lossy={})", socket.local_addr, cli.lossy);
            if cli.lossy {
                run_client(Link::new(burst_lossy(socket), config), server).await?;
            } else {
                run_client(Link::new(socket, config), server).await?;
            }
        }
    }
    Ok(())
}

fn burst_lossy(socket: Socket) -> LossyChannel<Socket> {
    LossyChannel::new(socket, DropPolicy::Burst)
}

/// Echo loop: reliably receive a unit, reliably send it back to its source.
async fn run_server<C: Channel>(link: Link<C>, local: SocketAddr) -> Result<(), ArqError> {
    println!("listening on {local}");
    let mut sessions = SessionTable::new();

    loop {
        let (data, peer) = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("interrupted; shutting down");
                return Ok(());
            }
            res = link.recv_reliable(&mut sessions, MAX_PAYLOAD) => res?,
        };
        log::info!("{} bytes from {peer}", data.len());

        match link
            .send_all(&mut sessions.peer_mut(peer).send, &data, peer)
            .await?
        {
            SendOutcome::Delivered(_) => {}
            SendOutcome::GaveUp => {
                log::warn!("{peer} stopped acknowledging; dropping echo");
                sessions.reset(peer);
            }
        }
    }
}

/// Send each stdin line reliably, then collect and print the echo.
async fn run_client<C: Channel>(link: Link<C>, server: SocketAddr) -> Result<(), ArqError> {
    let mut sessions = SessionTable::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match link
            .send_all(&mut sessions.peer_mut(server).send, line.as_bytes(), server)
            .await?
        {
            SendOutcome::GaveUp => {
                eprintln!("server unresponsive; line not delivered");
                continue;
            }
            SendOutcome::Delivered(_) => {}
        }

        // The server echoes unit-for-unit; gather until the line is whole.
        let mut echo = Vec::new();
        while echo.len() < line.len() {
            let (chunk, _from) = link.recv_reliable(&mut sessions, MAX_PAYLOAD).await?;
            echo.extend_from_slice(&chunk);
        }
        println!("{}", String::from_utf8_lossy(&echo));
    }
    Ok(())
}
