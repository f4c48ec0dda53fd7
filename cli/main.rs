// ft: point-to-point file transfer, server or client role
mod config;

use anyhow::Context;
use clap::Parser;
use config::{Cli, Role, Tuning};
use env_logger::Env;
use ft_client::ExitCode;
use ft_daemon::ServerConfig;
use log::error;
use std::process;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too
            let code = if e.use_stderr() {
                ExitCode::Failure
            } else {
                ExitCode::Success
            };
            let _ = e.print();
            process::exit(code.code());
        }
    };

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let role = match Role::resolve(cli, Tuning::from_env()) {
        Ok(role) => role,
        Err(e) => {
            error!("{:#}", e);
            process::exit(ExitCode::Failure.code());
        }
    };

    match role {
        Role::Server(config) => {
            if let Err(e) = run_server(config) {
                error!("{:#}", e);
                process::exit(ExitCode::Failure.code());
            }
        }
        Role::Client(config) => process::exit(ft_client::run_to_exit_code(&config).code()),
    }
}

fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let bind = config.bind;
    let outdir = config.receive.outdir.clone();
    let server = ft_daemon::bind_tcp(config).with_context(|| {
        format!(
            "cannot serve on {} into {}",
            bind,
            outdir.display()
        )
    })?;
    server.serve().context("listener stopped")
}
