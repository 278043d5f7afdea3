//! `canping`: send a counter frame on a CAN interface every half second.
//!
//! ```text
//! canping -n can0 [-i 0x7FF] [-c timing.json]
//! ```
//!
//! Runs until SIGINT/SIGTERM (exit 0).  Usage errors and failure to open
//! the interface exit 1.

use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use log::{error, info};

use canpingpong::adapters::log_sink::LogEventSink;
use canpingpong::adapters::socketcan::SocketCanBus;
use canpingpong::app::ports::NullIndicator;
use canpingpong::app::service::HeartbeatService;
use canpingpong::cli::{self, PingCli, Tool, USAGE_EXIT_CODE, UsageExit};
use canpingpong::config::RolePolicy;
use canpingpong::events::EventQueue;
use canpingpong::runtime::host::{self, TickSchedule};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli: PingCli = match cli::parse(std::env::args()) {
        Ok(cli) => cli,
        Err(usage) => return Ok(usage_exit(&usage)),
    };
    let interface = match cli.common.interface() {
        Ok(name) => name.to_owned(),
        Err(usage) => return Ok(usage_exit(&usage)),
    };
    let config = match cli.common.protocol_config() {
        Ok(config) => config,
        Err(e) => return Ok(usage_exit(&UsageExit::Invalid(e.to_string()))),
    };

    println!("using interface {} and id {:02X}", interface, config.target_id);

    let bus = SocketCanBus::open(&interface)?;
    info!("transmitting on {}", bus.interface());
    let schedule = TickSchedule::from_config(&config);

    let queue = Arc::new(EventQueue::new());
    host::install_termination_handler(Arc::clone(&queue), thread::current())
        .context("installing signal handler")?;

    let mut sink = LogEventSink::new();
    let service =
        HeartbeatService::bind(config, RolePolicy::host_ping(), bus, NullIndicator, NullIndicator)?;
    let report = host::run_ping(service, queue, schedule, &mut sink);
    info!(
        "sent {} pings ({} short writes, {} failed)",
        report.stats.ticks, report.stats.short_writes, report.stats.transmit_failures
    );
    Ok(ExitCode::from(report.reason.exit_code()))
}

fn usage_exit(usage: &UsageExit) -> ExitCode {
    usage.print(Tool::Ping);
    ExitCode::from(USAGE_EXIT_CODE)
}
