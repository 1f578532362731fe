use std::env;
use std::fs;
use std::process;

use tonetype::config::EngineConfig;
use tonetype::playback::{RecordingSynth, VirtualTimers};
use tonetype::{parse_document, Session, ToneTypeError};

const USAGE: &str = "Usage: tonetype [--config <config.yaml>] [--seconds <N>] <input.txt>";
const DEFAULT_SECONDS: f64 = 4.0;

struct Args {
    input_path: String,
    config_path: Option<String>,
    seconds: f64,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut input_path = None;
    let mut config_path = None;
    let mut seconds = DEFAULT_SECONDS;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().ok_or("--config needs a path")?;
                config_path = Some(path.clone());
            }
            "--seconds" => {
                let value = iter.next().ok_or("--seconds needs a value")?;
                seconds = value
                    .parse::<f64>()
                    .ok()
                    .filter(|s| s.is_finite() && *s >= 0.0)
                    .ok_or_else(|| format!("Invalid --seconds value '{}'", value))?;
            }
            flag if flag.starts_with("--") => return Err(format!("Unknown option '{}'", flag)),
            path => {
                if input_path.replace(path.to_string()).is_some() {
                    return Err("Only one input file may be given".to_string());
                }
            }
        }
    }

    let input_path = input_path.ok_or("Missing input file")?;
    Ok(Args {
        input_path,
        config_path,
        seconds,
    })
}

fn run(args: &Args) -> Result<String, ToneTypeError> {
    let config = match &args.config_path {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    let source = fs::read_to_string(&args.input_path)?;
    let document = parse_document(&source)?;

    let mut session = Session::new(config, RecordingSynth::new(), VirtualTimers::new());
    let one_shots = session.edit(document);
    let loops = session.advance(args.seconds);
    log::info!(
        "{} one-shot and {} loop playbacks in {}s",
        one_shots.len(),
        loops.len(),
        args.seconds
    );

    Ok(serde_yaml::to_string(session.synth().events())?)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let argv: Vec<String> = env::args().collect();
    let args = match parse_args(&argv) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    match run(&args) {
        Ok(yaml) => print!("{}", yaml),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
