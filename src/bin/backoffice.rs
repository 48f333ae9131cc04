use anyhow::{Context, Result, bail};
use backoffice::schema::{DateRange, ReportFormat, ReportRequest};
use backoffice::{
    AppContext, Config, PgContractStore, PgNotifier, Scheduler, generate_contract_report,
    setup_database,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use sqlx::PgPool;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

/// Contract notification jobs and reports
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Database URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Run the database migrations before anything else
    #[arg(long)]
    migrate: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the notification checks periodically
    Notify {
        /// Run a single pass and exit
        #[arg(long)]
        once: bool,
    },
    /// Write a contract report to a file
    Report {
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Pdf)]
        format: Format,

        /// Destination file
        #[arg(short, long)]
        output: PathBuf,

        /// Only contracts of this client
        #[arg(long)]
        client_id: Option<Uuid>,

        /// Only contracts of this service
        #[arg(long)]
        service_id: Option<Uuid>,

        /// Only this contract
        #[arg(long)]
        contract_id: Option<Uuid>,

        /// Only contracts starting on or after this day (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,

        /// Only contracts starting on or before this day (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Pdf,
    Excel,
}

impl From<Format> for ReportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Pdf => Self::Pdf,
            Format::Excel => Self::Excel,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,backoffice=info".into()),
        )
        .compact()
        .init();

    let args = Args::parse();
    let config = Config::from_env().context("Invalid configuration")?;

    let pool = PgPool::connect(&args.database_url)
        .await
        .context("Failed to connect to the database")?;
    if args.migrate {
        info!("Running database migrations…");
        setup_database(&pool).await?;
    }

    let context = AppContext::new(
        PgContractStore::new(pool.clone()),
        PgNotifier::new(pool),
        config,
    );

    match args.command {
        Command::Notify { once: true } => {
            let report = backoffice::run_all(&context).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Notify { once: false } => {
            let handle = Scheduler::new(context).start();
            tokio::signal::ctrl_c().await?;
            info!("Interrupted, stopping the scheduler…");
            handle.shutdown().await;
        }
        Command::Report {
            format,
            output,
            client_id,
            service_id,
            contract_id,
            from,
            to,
        } => {
            let date_range = match (from, to) {
                (Some(start), Some(end)) => Some(DateRange { start, end }),
                (None, None) => None,
                _ => bail!("--from and --to must be given together"),
            };
            let request = ReportRequest {
                client_id,
                service_id,
                contract_id,
                format: format.into(),
                date_range,
            };

            let document = generate_contract_report(&context, &request)
                .await
                .map_err(|error| anyhow::Error::new(error).context("Failed to generate report"))?;
            tokio::fs::write(&output, &document.bytes)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!(path = %output.display(), bytes = document.bytes.len(), "Report written");
        }
    }

    Ok(())
}
