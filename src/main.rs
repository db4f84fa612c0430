mod announcements;
mod attendance;
mod config;
mod error;
mod ipc;
mod library;
mod model;
mod repo;
mod schedules;
mod seed;
mod session;
mod store;
mod users;
mod workflow;

use std::io::{self, BufRead, Write};

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let config = match config::Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}; falling back to defaults");
            config::Config::default()
        }
    };

    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let mut state = ipc::AppState::new(config);
    if let Some(path) = state.config.workspace.clone() {
        match ipc::open_workspace(&mut state, &path) {
            Ok(_) => info!(workspace = %path.display(), "opened workspace from environment"),
            Err(e) => error!(workspace = %path.display(), code = e.code, error = %e.message, "could not open workspace"),
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to echo back.
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() },
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    info!("stdin closed; exiting");
}
