use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use s3_audit::runner::{AuditArgs, AuditResult, run};

#[derive(Parser, Clone)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Subcommand)]
enum Command {
    /// Audit every bucket visible to the current credentials
    Audit {
        /// AWS region used for the API calls (default: from the environment)
        #[arg(short, long)]
        region: Option<String>,

        /// Named AWS profile to load credentials from
        #[arg(short, long)]
        profile: Option<String>,

        /// Only audit this bucket (may be repeated)
        #[arg(short, long = "bucket")]
        buckets: Vec<String>,

        /// Run the checks of each bucket one at a time
        #[arg(long)]
        sequential_checks: bool,

        /// Report format written to stdout
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,

        /// Quiet mode - no progress display, only warnings are logged
        #[arg(short, long)]
        quiet: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    match args.command {
        Command::Audit {
            region,
            profile,
            buckets,
            sequential_checks,
            output,
            quiet,
        } => {
            init_tracing(quiet);

            let audit_args = AuditArgs {
                region,
                profile,
                buckets,
                sequential_checks,
                quiet,
            };

            let result = run(audit_args).await?;
            print_result(&result, output)?;

            if result.is_clean() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn init_tracing(quiet: bool) {
    use s3_audit::runner::{LOG_FILTER, QUIET_LOG_FILTER};
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    // Logs go to stderr so that JSON on stdout stays machine readable
    let filter = if quiet {
        EnvFilter::new(QUIET_LOG_FILTER)
    } else {
        EnvFilter::new(LOG_FILTER)
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn print_result(result: &AuditResult, output: OutputFormat) -> anyhow::Result<()> {
    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        OutputFormat::Text => {
            println!();
            print!("{}", result.report.render_text());

            let failing = result.report.failing_checks();
            if !failing.is_empty() {
                println!();
                println!("Failing checks");
                println!("==============");
                for (bucket, checks) in failing {
                    println!("  {}: {}", bucket, checks.join(", "));
                }
            }

            if result.cancelled {
                println!();
                println!("Audit was interrupted; skipped checks were not evaluated.");
            }

            println!();
            println!("Run ID: {}", result.run_id);
            println!("Duration: {:.2}s", result.duration_secs);
        }
    }
    Ok(())
}
