use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "seqframes", version)]
struct Cli {
    /// Log coordinator decisions to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a sequence configuration.
    Validate(ConfigArgs),
    /// Print every frame's resolved completion delay.
    Durations(ConfigArgs),
    /// Run a replay script and write the event timeline as JSON lines.
    Replay(ReplayArgs),
}

#[derive(Parser, Debug)]
struct ConfigArgs {
    /// Sequence configuration JSON.
    #[arg(long)]
    config: PathBuf,
}

#[derive(Parser, Debug)]
struct ReplayArgs {
    /// Replay script JSON (configuration plus timestamped steps).
    #[arg(long)]
    script: PathBuf,

    /// Stop the clock at this time (ms); never earlier than the last step.
    #[arg(long)]
    until: Option<u64>,

    /// Output path. Defaults to stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }

    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Durations(args) => cmd_durations(args),
        Command::Replay(args) => cmd_replay(args),
    }
}

fn read_config(args: &ConfigArgs) -> anyhow::Result<seqframes::SequenceConfig> {
    seqframes::SequenceConfig::from_path(&args.config)
        .with_context(|| format!("load config '{}'", args.config.display()))
}

fn cmd_validate(args: ConfigArgs) -> anyhow::Result<()> {
    let cfg = read_config(&args)?;
    cfg.validate()?;
    eprintln!("ok: {} frames", cfg.frames.len());
    Ok(())
}

fn cmd_durations(args: ConfigArgs) -> anyhow::Result<()> {
    let cfg = read_config(&args)?;
    let frames = cfg.resolve()?;
    let mut out = std::io::stdout().lock();
    for (position, frame) in frames.iter().enumerate() {
        writeln!(
            out,
            "{position}\tid={}\t{}",
            frame.id.0,
            frame.animation_duration.as_css_time()
        )?;
    }
    Ok(())
}

fn cmd_replay(args: ReplayArgs) -> anyhow::Result<()> {
    let script = seqframes::ReplayScript::from_path(&args.script)
        .with_context(|| format!("load script '{}'", args.script.display()))?;
    let until = args.until.map(seqframes::Millis);

    let stats = match &args.out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            let f = File::create(path)
                .with_context(|| format!("create timeline '{}'", path.display()))?;
            let mut sink = seqframes::JsonLinesSink::new(BufWriter::new(f));
            seqframes::run_replay(&script, until, &mut sink)?
        }
        None => {
            let mut sink = seqframes::JsonLinesSink::new(std::io::stdout().lock());
            seqframes::run_replay(&script, until, &mut sink)?
        }
    };

    eprintln!(
        "replayed {} steps, {} events, clock at {}",
        stats.steps, stats.events, stats.end
    );
    Ok(())
}
