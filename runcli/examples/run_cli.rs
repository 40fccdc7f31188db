//! Bulk command run example
//!
//! Runs the same commands on a list of hosts, or per-host commands loaded
//! from a JSON file, and prints a summary. Ctrl-C stops the run and tears
//! down the session in flight.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example run_cli -- --hosts sw1,sw2 --type arista \
//!     --command "show version" --command "show ip int brief" --password secret
//! ```
//!
//! Per-host commands:
//! ```bash
//! cargo run --example run_cli -- --hosts-file hosts.json --key ~/.ssh/id_ed25519
//! ```
//!
//! where `hosts.json` looks like:
//! ```json
//! {
//!   "sw1": {"type": "arista", "global_commands": ["show version"]},
//!   "mx1": {"type": "junos", "commands": ["show chassis hardware"]}
//! }
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use indexmap::IndexMap;
use runcli::{HostDescriptor, HostPlan, OrchestratorBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let plan = match &args.hosts_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let map: IndexMap<String, HostDescriptor> = serde_json::from_str(&text)?;
            HostPlan::per_host(map)
        }
        None => HostPlan::uniform(args.hosts.clone(), args.device_type.clone(), args.commands.clone()),
    };

    let mut builder = OrchestratorBuilder::new(&args.user)
        .command_timeout(Duration::from_secs(args.timeout))
        .write_individual_files(args.individual)
        .concurrency(args.concurrency);

    if let Some(key_path) = &args.key {
        builder = builder.private_key(key_path);
    } else if let Some(password) = &args.password {
        builder = builder.password(password);
    } else {
        eprintln!("Error: Must provide either --password or --key");
        std::process::exit(1);
    }
    if let Some(dir) = &args.log_dir {
        builder = builder.log_dir(dir);
    }

    let orchestrator = builder.build()?;

    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let report = orchestrator.run_until(&plan, interrupt).await;

    println!("\n=== Summary ===\n");
    for host in report.succeeded_hosts() {
        println!("ok      {}", host);
    }
    for host in report.failed_hosts() {
        if let Some(failure) = report.failure(host) {
            println!("FAILED  {} ({:?}): {}", host, failure.kind, failure.message);
        }
    }
    for host in report.not_attempted() {
        println!("skipped {}", host);
    }

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

struct Args {
    hosts: Vec<String>,
    hosts_file: Option<PathBuf>,
    device_type: String,
    commands: Vec<String>,
    user: String,
    password: Option<String>,
    key: Option<PathBuf>,
    timeout: u64,
    individual: bool,
    concurrency: usize,
    log_dir: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut parsed = Args {
            hosts: Vec::new(),
            hosts_file: None,
            device_type: "arista".to_string(),
            commands: Vec::new(),
            user: env::var("USER").unwrap_or_else(|_| "admin".to_string()),
            password: env::var("RUNCLI_PASSWORD").ok(),
            key: None,
            timeout: 180,
            individual: false,
            concurrency: 1,
            log_dir: None,
        };

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1).cloned();
            match args[i].as_str() {
                "--hosts" | "-H" => {
                    if let Some(v) = value {
                        parsed.hosts = v.split(',').map(|h| h.trim().to_string()).collect();
                    }
                    i += 1;
                }
                "--hosts-file" | "-f" => {
                    parsed.hosts_file = value.map(PathBuf::from);
                    i += 1;
                }
                "--type" | "-T" => {
                    if let Some(v) = value {
                        parsed.device_type = v;
                    }
                    i += 1;
                }
                "--command" | "-c" => {
                    parsed.commands.extend(value);
                    i += 1;
                }
                "--user" | "-u" => {
                    if let Some(v) = value {
                        parsed.user = v;
                    }
                    i += 1;
                }
                "--password" | "-P" => {
                    parsed.password = value;
                    i += 1;
                }
                "--key" | "-k" => {
                    parsed.key = value.map(PathBuf::from);
                    i += 1;
                }
                "--timeout" | "-t" => {
                    parsed.timeout = value.and_then(|v| v.parse().ok()).unwrap_or(180);
                    i += 1;
                }
                "--concurrency" | "-j" => {
                    parsed.concurrency = value.and_then(|v| v.parse().ok()).unwrap_or(1);
                    i += 1;
                }
                "--log-dir" | "-l" => {
                    parsed.log_dir = value.map(PathBuf::from);
                    i += 1;
                }
                "--individual" | "-i" => parsed.individual = true,
                "--help" => {
                    println!("Usage: run_cli [OPTIONS]");
                    println!();
                    println!("Options:");
                    println!("  -H, --hosts <LIST>        Comma-separated hosts");
                    println!("  -f, --hosts-file <FILE>   JSON map of host to descriptor");
                    println!("  -T, --type <TYPE>         Device type for --hosts (default: arista)");
                    println!("  -c, --command <CMD>       Command to run (repeatable)");
                    println!("  -u, --user <USER>         Username (default: $USER)");
                    println!("  -P, --password <PASS>     Password (or RUNCLI_PASSWORD)");
                    println!("  -k, --key <PATH>          Private key file");
                    println!("  -t, --timeout <SECS>      Per-command timeout (default: 180)");
                    println!("  -j, --concurrency <N>     Hosts at once (default: 1)");
                    println!("  -l, --log-dir <DIR>       Log directory (default: ~/logs)");
                    println!("  -i, --individual          One output file per command");
                    std::process::exit(0);
                }
                _ => {}
            }
            i += 1;
        }

        parsed
    }
}
