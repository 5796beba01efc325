use std::process::exit;

use clap::Parser;
use ekspose_core::{config::ExposeConfig, kubernetes::operations::create_local_client};
use kube::Client;
use log::LevelFilter;

use crate::{cli::Cli, controller::main_controller};

mod cli;
mod cluster;
mod controller;
mod helpers;
mod informer;
mod queue;

#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    configure_logger(cli.verbose_logging);

    let client = create_client(&cli).await;
    let config = get_config();

    main_controller(client, config).await;
}

async fn create_client(cli: &Cli) -> Client {
    match create_local_client(&cli.kube_config, &cli.kube_context).await {
        Ok(client) => client,
        Err(error) => {
            log::error!("Couldn't create client! {error:?}");
            exit(6)
        }
    }
}

fn get_config() -> ExposeConfig {
    match ExposeConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            log::error!("Couldn't read configuration! {error}");
            exit(7)
        }
    }
}

fn configure_logger(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::builder()
        .default_format()
        .format_module_path(false)
        .filter_level(level)
        .parse_default_env()
        .init()
}
