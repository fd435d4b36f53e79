use std::collections::BTreeMap;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use apiprobe::cli::{Cli, Command, ListArgs, OutputFormat, RunArgs, SuiteArgs};
use apiprobe::collections::{ResolveOptions, Suite};
use apiprobe::environment::parse_override;
use apiprobe::http::executor::resolve_url;
use apiprobe::report::summary_line;
use apiprobe::{
    JsonReporter, ReportSink, ReqwestClient, RunMode, ScenarioRunner, SuiteError, TextReporter,
    storage,
};

const EXIT_FAILED: u8 = 1;
const EXIT_ERROR: u8 = 2;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .with(
            EnvFilter::try_from_env("APIPROBE_LOG")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args).await,
        Command::List(args) => list(args),
    }
}

fn load_suite(args: &SuiteArgs) -> Result<Suite, SuiteError> {
    let overrides = args
        .variables
        .iter()
        .map(|raw| parse_override(raw))
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    let document = storage::load_suite(&args.suite)?;
    document.resolve(&ResolveOptions {
        environment: args.environment.clone(),
        overrides,
    })
}

fn suite_title(suite: &Suite, args: &SuiteArgs) -> String {
    if suite.name.trim().is_empty() {
        args.suite.display().to_string()
    } else {
        suite.name.clone()
    }
}

fn make_sink<W: Write + 'static>(format: OutputFormat, out: W, title: String) -> Box<dyn ReportSink> {
    match format {
        OutputFormat::Text => Box::new(TextReporter::new(out).with_title(title)),
        OutputFormat::Json => Box::new(JsonReporter::new(out).with_title(title)),
    }
}

async fn run(args: RunArgs) -> ExitCode {
    let suite = match load_suite(&args.suite) {
        Ok(suite) => suite,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let options = suite.options.clone().merge(&args.overrides());
    if args.concurrency.is_some() && options.mode == RunMode::Serial {
        warn!("--concurrency has no effect in serial mode");
    }
    let client = match ReqwestClient::with_timeout(options.request_timeout()) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let title = suite_title(&suite, &args.suite);
    info!(suite = %title, scenarios = suite.scenarios.len(), "suite loaded");
    let runner = ScenarioRunner::new(Arc::new(client), options);

    let sink = match &args.report {
        Some(path) => match storage::create_report_file(path) {
            Ok(file) => make_sink(args.format, BufWriter::new(file), title),
            Err(err) => {
                eprintln!("error: Failed to create report file `{}`: {err}", path.display());
                return ExitCode::from(EXIT_ERROR);
            }
        },
        None => make_sink(args.format, io::stdout(), title),
    };

    match runner.run_and_report(&suite.scenarios, sink.as_ref()).await {
        Ok(result) => {
            if let Some(path) = &args.report {
                println!("{}", summary_line(&result.summary()));
                println!("report written to {}", path.display());
            }
            if result.passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_FAILED)
            }
        }
        Err(err) => {
            error!(error = %err, "publishing report failed");
            eprintln!("error: {err}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn list(args: ListArgs) -> ExitCode {
    let suite = match load_suite(&args.suite) {
        Ok(suite) => suite,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    println!("{}", suite_title(&suite, &args.suite));
    for scenario in &suite.scenarios {
        let request = scenario.request();
        let target = resolve_url(request).unwrap_or_else(|err| format!("<{err}>"));
        println!("  {}", scenario.name());
        println!(
            "      {} {target} ({} assertions)",
            request.method(),
            scenario.assertions().len()
        );
    }
    ExitCode::SUCCESS
}
