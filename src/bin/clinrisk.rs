use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use clinrisk::api::{ApiResponse, Services};
use clinrisk::common::log::init_tracing;
use clinrisk::{AppCfg, Domain};
use serde_json::{json, Value};

#[derive(Debug, Parser)]
#[command(
    name = "clinrisk",
    version,
    about = "Score clinical risk payloads against the trained domain models",
    long_about = "clinrisk loads the trained artifacts of each domain and scores\n\
        JSON payloads (anemia, osteoporosis, pcos, thyroid) or ultrasound\n\
        images (breast-cancer).\n\n\
        EXAMPLES:\n\
        \n  clinrisk predict anemia patient.json        Score a JSON payload\n\
        \n  clinrisk predict breast-cancer scan.png     Score an ultrasound image\n\
        \n  clinrisk check                              Report which models load"
)]
struct Cli {
    /// Directory holding one sub-directory of artifacts per domain
    #[arg(long, value_name = "DIR", global = true)]
    models_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score one payload and print the response body as JSON
    Predict(PredictArgs),

    /// Load every domain and print its health report
    Check,
}

#[derive(Debug, Args)]
struct PredictArgs {
    /// anemia, osteoporosis, pcos, thyroid or breast-cancer
    #[arg(value_name = "DOMAIN", value_parser = parse_domain)]
    domain: Domain,

    /// JSON payload or image file (reads stdin if not provided)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,
}

fn parse_domain(raw: &str) -> Result<Domain, String> {
    Domain::from_slug(raw).ok_or_else(|| {
        let known: Vec<&str> = Domain::ALL.iter().map(|d| d.slug()).collect();
        format!("unknown domain '{raw}' (expected one of: {})", known.join(", "))
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut cfg = match AppCfg::load() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };
    if let Some(root) = cli.models_root {
        cfg.models_root = root;
    }
    init_tracing(&cfg);

    match cli.command {
        Command::Predict(args) => match predict(&Services::load_only(&cfg, &[args.domain]), &args) {
            Ok(resp) => print_response(&resp),
            Err(err) => {
                eprintln!("error: {err}");
                ExitCode::from(2)
            }
        },
        Command::Check => check(&Services::load(&cfg)),
    }
}

fn predict(services: &Services, args: &PredictArgs) -> io::Result<ApiResponse> {
    let bytes = read_input(args.input.as_ref())?;
    if args.domain == Domain::BreastCancer {
        return Ok(services.predict_image(&bytes));
    }

    let payload = if bytes.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
    };
    Ok(services.predict_json(args.domain, &payload))
}

fn read_input(path: Option<&PathBuf>) -> io::Result<Vec<u8>> {
    match path {
        Some(path) => fs::read(path),
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

fn check(services: &Services) -> ExitCode {
    let report: Vec<Value> = Domain::ALL
        .iter()
        .map(|domain| {
            let mut health = services.health(*domain).body;
            if let Some(reason) = services.failure(*domain) {
                health["reason"] = json!(reason);
            }
            health
        })
        .collect();
    println!("{}", render(&Value::Array(report)));

    if Domain::ALL.iter().all(|d| services.is_loaded(*d)) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_response(resp: &ApiResponse) -> ExitCode {
    println!("{}", render(&resp.body));
    if resp.is_success() {
        ExitCode::SUCCESS
    } else {
        eprintln!("status {}", resp.status);
        ExitCode::FAILURE
    }
}

fn render(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
