// Thu Aug 27 2026 - Alex

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use memprobe::{
    Command, Config, Envelope, MessageChannel, RegionEnumerator, ScanService, ValueType,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author = "Alex")]
#[command(version = "1.0.0")]
#[command(about = "Process memory scanner over shared memory channels", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Create both channels and answer scan requests until killed
    Serve {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Attach to a running service and search for a value
    Find {
        /// Value to search for, interpreted according to --value-type
        value: String,

        #[arg(short = 't', long, default_value = "bytearray")]
        value_type: String,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        json: bool,

        #[arg(long)]
        no_progress: bool,
    },
    /// Enumerate and print the memory regions of a process
    Regions {
        /// Target pid, defaults to this process
        #[arg(short, long)]
        pid: Option<i32>,
    },
}

fn main() {
    env_logger::init();

    let args = Args::parse();

    let result = match args.command {
        CliCommand::Serve { config } => run_serve(config),
        CliCommand::Find {
            value,
            value_type,
            config,
            json,
            no_progress,
        } => run_find(&value, &value_type, config, json, no_progress),
        CliCommand::Regions { pid } => run_regions(pid),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "[!]".red(), e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(p) => Config::load(&p).with_context(|| format!("loading config {}", p.display())),
        None => Ok(Config::default()),
    }
}

fn run_serve(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_threads)
        .build_global()
        .context("building scan thread pool")?;

    println!("{}", "memprobe service".cyan().bold());
    println!("{}", "=".repeat(50).cyan());

    let requests = MessageChannel::create(&config.request_channel, config.channel_capacity)
        .with_context(|| format!("creating request channel {}", config.request_channel))?;
    println!(
        "{} Request channel {} ({} bytes)",
        "[+]".green(),
        config.request_channel,
        config.channel_capacity
    );

    let replies = MessageChannel::create(&config.reply_channel, config.channel_capacity)
        .with_context(|| format!("creating reply channel {}", config.reply_channel))?;
    println!(
        "{} Reply channel {} ({} bytes)",
        "[+]".green(),
        config.reply_channel,
        config.channel_capacity
    );

    println!("{} Serving scan requests...", "[*]".blue());

    let service = ScanService::new(requests, replies);
    service.run();

    Ok(())
}

fn run_find(
    value: &str,
    value_type: &str,
    config_path: Option<PathBuf>,
    json: bool,
    no_progress: bool,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let value_type = ValueType::from_str(value_type)?;
    let bytes = memprobe::proto::parse_value(value, value_type)?;

    let requests = MessageChannel::attach(&config.request_channel)
        .with_context(|| format!("attaching to request channel {}", config.request_channel))?;
    let replies = MessageChannel::attach(&config.reply_channel)
        .with_context(|| format!("attaching to reply channel {}", config.reply_channel))?;

    let spinner = if !no_progress && !json {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Scanning for {} value...", value_type));
        Some(pb)
    } else {
        None
    };

    let start_time = Instant::now();

    let request = Envelope::new(Command::Find {
        value_type,
        value: bytes,
    });
    if !requests.send(&request.encode()) {
        bail!("request channel closed before the command was sent");
    }

    let reply = match replies.receive() {
        Some(payload) => Envelope::decode(&payload)?,
        None => bail!("reply channel closed before a response arrived"),
    };

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let (echoed_type, echoed_value, occurrences) = match reply.command {
        Command::FindAck {
            value_type,
            value,
            occurrences,
        } => (value_type, value, occurrences),
        other => bail!("unexpected reply: {:?}", other.id()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&occurrences)?);
        return Ok(());
    }

    let elapsed = start_time.elapsed();

    println!("{}", "Scan Results".cyan().bold());
    println!("{}", "-".repeat(40).cyan());
    println!(
        "  Searched for: {} ({})",
        memprobe::proto::render_value(&echoed_value, echoed_type).cyan(),
        echoed_type
    );
    println!(
        "  Occurrences found: {}",
        occurrences.len().to_string().green()
    );
    println!();

    for occ in &occurrences {
        println!(
            "  {} {} region, base 0x{:x} ({} bytes)",
            format!("0x{:016x}", occ.address()).cyan(),
            occ.kind,
            occ.base_address,
            occ.region_size
        );
    }

    if !occurrences.is_empty() {
        println!();
    }
    println!(
        "{} Scan complete in {:.2}s",
        "[+]".green(),
        elapsed.as_secs_f64()
    );

    Ok(())
}

fn run_regions(pid: Option<i32>) -> anyhow::Result<()> {
    let enumerator = match pid {
        Some(p) => RegionEnumerator::new(p),
        None => RegionEnumerator::current_process(),
    };

    let regions = enumerator.enumerate();
    if regions.is_empty() {
        bail!("no regions found for pid {}", enumerator.pid());
    }

    println!(
        "{} {} regions in pid {}",
        "[+]".green(),
        regions.len(),
        enumerator.pid()
    );
    println!();

    let mut in_scope = 0usize;
    for region in &regions {
        if region.is_in_scope() {
            in_scope += 1;
            println!("  {}", region.to_string().green());
        } else {
            println!("  {}", region.to_string().dimmed());
        }
    }

    println!();
    println!("{} {} regions in scan scope", "[*]".blue(), in_scope);

    Ok(())
}
