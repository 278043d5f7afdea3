//! `canpong`: listen for counter frames and mirror their parity on an LED.
//!
//! ```text
//! canpong -n can0 [-i 0x7FF] [-l /sys/class/leds/.../brightness] [--keep-going]
//! ```
//!
//! A malformed frame exits 1 unless `--keep-going`, in which case the
//! fault is latched and listening continues.  SIGINT/SIGTERM turn the
//! LED off and exit 0.

use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use log::{error, info};

use canpingpong::adapters::log_sink::LogEventSink;
use canpingpong::adapters::socketcan::SocketCanBus;
use canpingpong::adapters::sysfs_led::SysfsLed;
use canpingpong::app::ports::NullIndicator;
use canpingpong::app::service::HeartbeatService;
use canpingpong::cli::{self, PongCli, Tool, USAGE_EXIT_CODE, UsageExit};
use canpingpong::config::RolePolicy;
use canpingpong::events::EventQueue;
use canpingpong::runtime::host;

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
    let cli: PongCli = match cli::parse(std::env::args()) {
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

    let led = SysfsLed::open(&cli.led)?;
    let bus = SocketCanBus::open(&interface)?;
    info!("listening on {} (LED {})", bus.interface(), led.path().display());

    let queue = Arc::new(EventQueue::new());
    host::install_termination_handler(Arc::clone(&queue), thread::current())
        .context("installing signal handler")?;

    let mut sink = LogEventSink::new();
    let service = HeartbeatService::bind(
        config,
        RolePolicy::host_pong(cli.keep_going),
        bus,
        led,
        NullIndicator,
    )?;
    let report = host::run_pong(service, &queue, &mut sink);
    info!(
        "accepted {} pongs ({} foreign, {} malformed)",
        report.receive.accepted, report.receive.foreign, report.receive.malformed
    );
    Ok(ExitCode::from(report.reason.exit_code()))
}

fn usage_exit(usage: &UsageExit) -> ExitCode {
    usage.print(Tool::Pong);
    ExitCode::from(USAGE_EXIT_CODE)
}
