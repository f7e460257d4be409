mod args;

use std::process::ExitCode;

use am7p_bridge::{
    bridge::{Bridge, BridgeConfig, DEFAULT_RECV_TIMEOUT},
    clock::SystemClock,
    config::Options,
    mqtt::MqttBus,
    shutdown::{ShutdownSignal, spawn_signal_listener},
    udp::UdpSource,
};
use anyhow::{Context as _, Result};
use args::Args;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        eprintln!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let options = Options::load(&args.options).context("failed to load options")?;

    log::info!(
        "mqtt_host={}:{} udp_port={} online_timeout_s={} meta_publish_every_s={}",
        options.mqtt_host,
        options.mqtt_port,
        options.udp_port,
        options.online_timeout_s,
        options.meta_publish_every_s
    );
    let address_book = options.address_book();
    for (addr, name) in address_book.iter() {
        log::info!("{addr} -> {name}");
    }
    log::info!("unmapped senders -> {}", address_book.default_name());

    let shutdown = ShutdownSignal::new();
    spawn_signal_listener(shutdown.clone());

    let source = UdpSource::bind(options.udp_port)
        .await
        .context("failed to open UDP listener")?;
    log::info!("listening for AM7P datagrams on {}", source.local_addr()?);
    let bus = MqttBus::connect(&options.mqtt_settings(&args.client_id));

    let config = BridgeConfig {
        address_book,
        topics: options.topic_scheme(),
        online_timeout_s: options.online_timeout_s,
        sweep_interval: options.sweep_interval(),
        recv_timeout: DEFAULT_RECV_TIMEOUT,
    };

    Bridge::new(source, bus, SystemClock, config, shutdown)?
        .run()
        .await
}
