//! sysattr_agent: serves host resource attribution over HTTP and WebSocket.

mod api;
mod apps;
mod state;
mod ws;

use anyhow::{bail, Context};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use sysattr::HostSource;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::apps::{default_apps_path, load_apps, ConfigRegistry};
use crate::state::AppState;

const DEFAULT_PORT: u16 = 3000;
const CGROUP_MOUNT: &str = "sys/fs/cgroup";

#[derive(Debug, PartialEq)]
struct Config {
    port: u16,
    bind: IpAddr,
    data_dir: PathBuf,
    apps: Option<PathBuf>,
}

#[derive(Debug, PartialEq)]
enum ArgError {
    Help(String),
    Invalid(String),
}

fn usage(prog: &str) -> String {
    format!(
        "Usage: {prog} --data-directory DIR|-d DIR [--apps FILE|-a FILE] [--port PORT|-p PORT] [--bind ADDR]"
    )
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Config, ArgError> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "sysattr_agent".into());
    let mut port: Option<String> = None;
    let mut bind: Option<String> = None;
    let mut data_dir: Option<String> = None;
    let mut apps: Option<String> = None;

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(ArgError::Help(usage(&prog))),
            "--port" | "-p" => port = it.next(),
            "--bind" => bind = it.next(),
            "--data-directory" | "-d" => data_dir = it.next(),
            "--apps" | "-a" => apps = it.next(),
            _ => {
                let Some((flag, v)) = arg.split_once('=') else {
                    return Err(ArgError::Invalid(format!(
                        "Unexpected argument {arg:?}. {}",
                        usage(&prog)
                    )));
                };
                let v = Some(v.to_string());
                match flag {
                    "--port" => port = v,
                    "--bind" => bind = v,
                    "--data-directory" => data_dir = v,
                    "--apps" => apps = v,
                    _ => {
                        return Err(ArgError::Invalid(format!(
                            "Unexpected argument {arg:?}. {}",
                            usage(&prog)
                        )))
                    }
                }
            }
        }
    }

    let port = match port {
        None => DEFAULT_PORT,
        Some(p) => p
            .parse::<u16>()
            .map_err(|_| ArgError::Invalid(format!("invalid port {p:?}")))?,
    };
    let bind = match bind {
        None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        Some(b) => b
            .parse::<IpAddr>()
            .map_err(|_| ArgError::Invalid(format!("invalid bind address {b:?}")))?,
    };
    let data_dir = match data_dir {
        Some(d) if !d.is_empty() => PathBuf::from(d),
        _ => {
            return Err(ArgError::Invalid(format!(
                "--data-directory is required. {}",
                usage(&prog)
            )))
        }
    };
    Ok(Config {
        port,
        bind,
        data_dir,
        apps: apps.map(PathBuf::from),
    })
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/api/system/disk-usage", get(api::disk_usage))
        .route("/api/system/memory-usage", get(api::memory_usage))
        .route("/api/system/cpu-usage", get(api::cpu_usage))
        .route("/api/system/system-disk-usage", get(api::system_disk_usage))
        .route("/api/system/system-memory-usage", get(api::system_memory_usage))
        .route("/api/system/cpu-temperature", get(api::cpu_temperature))
        .route("/api/system/device", get(api::device))
        .route("/api/system/ip-addresses", get(api::ip_addresses))
        .route("/api/system/cpu-governor", post(api::set_cpu_governor))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_token,
        ))
        .with_state(state)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("received Ctrl-C, shutting down");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match parse_args(std::env::args()) {
        Ok(c) => c,
        Err(ArgError::Help(msg)) => {
            println!("{msg}");
            return Ok(());
        }
        Err(ArgError::Invalid(msg)) => bail!(msg),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let root = std::env::var_os("SYSATTR_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/"));
    let source = HostSource::with_root(&root);

    let apps_path = config.apps.clone().unwrap_or_else(default_apps_path);
    let apps_file = load_apps(&apps_path)?;
    let registry = ConfigRegistry::new(apps_file, root.join(CGROUP_MOUNT));
    info!(apps = registry.app_count(), path = %apps_path.display(), "loaded app registry");

    let auth_token = std::env::var("SYSATTR_AUTH_TOKEN")
        .ok()
        .filter(|t| !t.is_empty());

    let state = AppState {
        source: Arc::new(source),
        registry: Arc::new(registry),
        data_dir: Arc::new(config.data_dir.clone()),
        auth_token,
    };

    let addr = SocketAddr::new(config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(
        addr = %listener.local_addr()?,
        data_dir = %config.data_dir.display(),
        "sysattr agent listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn args(a: &[&str]) -> Vec<String> {
        std::iter::once("agent")
            .chain(a.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn port_long_short_and_assign() {
        let p = |a: &[&str]| parse_args(args(a)).map(|c| c.port);
        assert_eq!(p(&["-d", "/data", "--port", "9001"]), Ok(9001));
        assert_eq!(p(&["-d", "/data", "-p", "9002"]), Ok(9002));
        assert_eq!(p(&["-d", "/data", "--port=9003"]), Ok(9003));
        assert_eq!(p(&["-d", "/data"]), Ok(DEFAULT_PORT));
        assert!(matches!(p(&["-d", "/data", "-p", "nope"]), Err(ArgError::Invalid(_))));
    }

    #[test]
    fn data_directory_is_required_and_non_empty() {
        assert!(matches!(parse_args(args(&[])), Err(ArgError::Invalid(_))));
        assert!(matches!(
            parse_args(args(&["--data-directory="])),
            Err(ArgError::Invalid(_))
        ));
        let c = parse_args(args(&["--data-directory=/home/umbrel/umbrel"])).unwrap();
        assert_eq!(c.data_dir, PathBuf::from("/home/umbrel/umbrel"));
        assert_eq!(c.bind, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert!(c.apps.is_none());
    }

    #[test]
    fn apps_and_bind() {
        let c = parse_args(args(&[
            "-d",
            "/data",
            "-a",
            "/etc/sysattr/apps.json",
            "--bind",
            "127.0.0.1",
        ]))
        .unwrap();
        assert_eq!(c.apps, Some(PathBuf::from("/etc/sysattr/apps.json")));
        assert_eq!(c.bind, IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn help_and_unknown_flags() {
        assert!(matches!(parse_args(args(&["--help"])), Err(ArgError::Help(_))));
        assert!(matches!(
            parse_args(args(&["-d", "/data", "--verbose"])),
            Err(ArgError::Invalid(_))
        ));
        assert!(matches!(
            parse_args(args(&["-d", "/data", "--colour=red"])),
            Err(ArgError::Invalid(_))
        ));
    }

    async fn spawn_agent(state: AppState) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router(state)).await.unwrap() });
        addr
    }

    async fn status_of(addr: SocketAddr, path: &str) -> u16 {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let req = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(req.as_bytes()).await.unwrap();
        let mut resp = String::new();
        stream.read_to_string(&mut resp).await.unwrap();
        resp.split_whitespace().nth(1).unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn token_is_required_when_configured() {
        let td = tempfile::tempdir().unwrap();
        let addr = spawn_agent(AppState::rooted_at(td.path(), Some("s3cret"))).await;
        assert_eq!(status_of(addr, "/api/system/device").await, 401);
        assert_eq!(status_of(addr, "/api/system/device?token=bad").await, 401);
        assert_eq!(status_of(addr, "/api/system/device?token=s3cret").await, 200);
    }

    #[tokio::test]
    async fn no_token_configured_allows_requests() {
        let td = tempfile::tempdir().unwrap();
        let addr = spawn_agent(AppState::rooted_at(td.path(), None)).await;
        assert_eq!(status_of(addr, "/api/system/device").await, 200);
        assert_eq!(status_of(addr, "/api/system/missing").await, 404);
    }
}
