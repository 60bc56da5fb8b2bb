// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! VTap rebalancer administration CLI
//!
//! Previews or applies probe rebalance plans and lists the analyzers
//! eligible for each availability zone.

mod client;

use anyhow::Result;
use clap::{Parser, Subcommand};

use vtap_rebalance_api::RebalanceQuery;
use vtap_rebalance_types::{AzAnalyzers, RebalanceType, VTapRebalanceResult};

use crate::client::Client;

#[derive(Parser)]
#[command(name = "vtap-rebalance-adm")]
#[command(about = "VTap rebalancer client utility", long_about = None)]
#[command(version)]
struct Cli {
    /// Base URL of the VTap rebalancer service
    #[arg(long, default_value = "http://localhost:20417", env = "VTAP_REBALANCER_URL")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a rebalance plan, and optionally apply it
    Rebalance {
        /// Weight measurement: weight or traffic (service default if omitted)
        #[arg(short = 't', long = "type")]
        rebalance_type: Option<RebalanceType>,

        /// Traffic window length in seconds
        #[arg(short, long)]
        data_duration: Option<u64>,

        /// End of the traffic window as unix seconds (default: now)
        #[arg(short, long)]
        end_time: Option<i64>,

        /// Write the plan to the inventory
        #[arg(long, conflicts_with = "preview")]
        apply: bool,

        /// Only report the plan, even if the service applies by default
        #[arg(long)]
        preview: bool,

        /// Print the raw JSON result
        #[arg(long)]
        json: bool,
    },

    /// List the analyzers eligible for each AZ
    AzAnalyzers {
        /// Print the raw JSON result
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new(&cli.url)?;

    match cli.command {
        Commands::Rebalance {
            rebalance_type,
            data_duration,
            end_time,
            apply,
            preview,
            json,
        } => {
            let query = RebalanceQuery {
                rebalance_type,
                data_duration,
                end_time,
                apply: apply_flag(apply, preview),
            };

            let result = client
                .rebalance(&query)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to rebalance: {}", e))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_rebalance(&result);
            }
        }

        Commands::AzAnalyzers { json } => {
            let azs = client
                .az_analyzers()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to list AZ analyzers: {}", e))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&azs)?);
            } else {
                print_az_analyzers(&azs);
            }
        }
    }

    Ok(())
}

/// `--apply` and `--preview` force the choice; neither defers to the service.
fn apply_flag(apply: bool, preview: bool) -> Option<bool> {
    match (apply, preview) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn print_rebalance(result: &VTapRebalanceResult) {
    if result.details.is_empty() {
        println!("No probes to rebalance.");
        return;
    }

    println!(
        "{:<38} {:<16} {:<6} {:>7} {:>7} {:>7} {:>9} {:>9}",
        "AZ", "ANALYZER", "STATE", "BEFORE", "AFTER", "SWITCH", "W_BEFORE", "W_AFTER"
    );
    println!("{}", "-".repeat(106));
    for host in &result.details {
        println!(
            "{:<38} {:<16} {:<6} {:>7} {:>7} {:>7} {:>9.2} {:>9.2}",
            host.az,
            host.ip,
            format_state(host.state),
            host.before_vtap_num,
            host.after_vtap_num,
            host.switch_vtap_num,
            host.before_vtap_weights,
            host.after_vtap_weights,
        );
    }
    println!();
    println!("Probes switched: {}", result.total_switch_vtap_num);
}

fn print_az_analyzers(azs: &[AzAnalyzers]) {
    if azs.is_empty() {
        println!("No AZ analyzer connections found.");
        return;
    }

    println!("{:<38} {:<16} {:<10} {}", "AZ", "ANALYZER", "STATE", "NAME");
    println!("{}", "-".repeat(80));
    for az in azs {
        for analyzer in &az.analyzers {
            println!(
                "{:<38} {:<16} {:<10} {}",
                az.az, analyzer.ip, analyzer.state, analyzer.name
            );
        }
    }
}

fn format_state(code: i32) -> &'static str {
    match code {
        1 => "up",
        _ => "down",
    }
}
