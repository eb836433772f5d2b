// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `netcfg device` -- registry management.

use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use netcfg_adapters::CredentialVault;
use netcfg_core::{Device, DeviceType, Protocol};
use netcfg_daemon::lifecycle::ProdOrchestrator;
use netcfg_engine::EngineConfig;

use crate::output::OutputFormat;
use crate::table::{Column, Table};

#[derive(Args)]
pub struct DeviceArgs {
    #[command(subcommand)]
    pub command: DeviceCommand,
}

#[derive(Subcommand)]
pub enum DeviceCommand {
    /// Register a new device
    Add(AddArgs),
    /// List registered devices
    List {
        /// Include inactive devices
        #[arg(long)]
        all: bool,
    },
}

#[derive(Args)]
pub struct AddArgs {
    /// Management IP or hostname
    #[arg(long)]
    ip_address: String,
    /// Friendly name; defaults to the IP if omitted
    #[arg(long)]
    alias: Option<String>,
    #[arg(long, default_value_t = Device::default_port())]
    port: u16,
    #[arg(long, default_value = "ssh")]
    protocol: String,
    #[arg(long, default_value = "cisco_ios")]
    device_type: String,
    #[arg(long)]
    username: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    enable_password: Option<String>,
    #[arg(long, default_value = "show running-config")]
    command: String,
}

pub async fn handle(command: DeviceCommand, orchestrator: &ProdOrchestrator, format: OutputFormat) -> Result<()> {
    match command {
        DeviceCommand::Add(args) => add(args, orchestrator, format).await,
        DeviceCommand::List { all } => list(all, orchestrator, format).await,
    }
}

async fn add(args: AddArgs, orchestrator: &ProdOrchestrator, format: OutputFormat) -> Result<()> {
    let protocol = Protocol::from_str(&args.protocol).map_err(anyhow::Error::msg)?;
    let device_type = DeviceType::from_str(&args.device_type).map_err(anyhow::Error::msg)?;

    let config = EngineConfig::from_env();
    let vault = CredentialVault::from_env(config.vault_mode).map_err(anyhow::Error::msg)?;
    let password_encrypted = vault.encrypt(&args.password);
    let enable_password_encrypted = args.enable_password.as_deref().map(|p| vault.encrypt(p));

    let device = orchestrator
        .register_device(
            args.alias,
            args.ip_address,
            args.port,
            protocol,
            device_type,
            args.username,
            password_encrypted,
            enable_password_encrypted,
            args.command,
        )
        .await
        .context("registering device")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&device)?),
        OutputFormat::Text => println!("registered device {} ({})", device.id, device.slug()),
    }
    Ok(())
}

async fn list(all: bool, orchestrator: &ProdOrchestrator, format: OutputFormat) -> Result<()> {
    let devices = orchestrator.list_devices(!all).await.context("listing devices")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&devices)?),
        OutputFormat::Text => {
            let mut table = Table::new(vec![
                Column::left("ID"),
                Column::left("ALIAS"),
                Column::left("ADDRESS"),
                Column::left("TYPE"),
                Column::status("LAST BACKUP"),
            ]);
            for device in &devices {
                table.row(vec![
                    device.id.short(8).to_string(),
                    device.alias.clone().unwrap_or_default(),
                    format!("{}:{}", device.ip_address, device.port),
                    device.device_type.as_str().to_string(),
                    device
                        .last_backup_status
                        .map(|s| s.as_str().to_string())
                        .unwrap_or_else(|| "never".to_string()),
                ]);
            }
            let mut out = std::io::stdout();
            table.render(&mut out);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
