//! Schoolhub - local-first school records with remote sync.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use schoolhub as app;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use app::access::{Action, Viewer};
use app::config::{AppConfig, ConfigLoadResult, LoggingConfig};
use app::entities::sea_orm_active_enums::MessageChannel;
use app::events::{Collection, DataChange, SyncStatus};
use app::messaging::{self, NoticeOptions};
use app::remote::HttpBackend;
use app::stats::{self, AttendanceSummary, DateRange};
use app::store::StorageService;
use app::sync::SyncService;

/// Local-first school records, attendance and grading with remote sync.
#[derive(Parser)]
#[command(name = "schoolhub", version)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use config.toml from current directory (dev mode)
    #[arg(long, global = true)]
    dev: bool,

    /// Act as this account (phone or national id); limits what is shown and allowed
    #[arg(long = "as", global = true, value_name = "LOGIN")]
    as_login: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file and create the local database
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Refetch every collection from the remote backend
    Sync,
    /// Run auto sync and push local changes until Ctrl+C
    Watch,
    /// List students
    Students {
        #[arg(long)]
        class: Option<String>,
        /// Match against name or national id
        #[arg(long)]
        search: Option<String>,
    },
    /// Attendance summary per student of a class
    AttendanceReport {
        #[arg(long)]
        class: String,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Evaluation composite per student of a class
    Evaluate {
        #[arg(long)]
        class: String,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Export a class to Excel
    Export {
        #[arg(long)]
        class: String,
        #[arg(long, value_enum, default_value_t = ExportKind::Report)]
        kind: ExportKind,
        /// Output file (defaults to a timestamped name in the current directory)
        #[arg(long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Write every collection as JSON
    Dump {
        /// Output file (defaults to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Queue absence notices to parents for a class and day
    NotifyAbsences {
        #[arg(long)]
        class: String,
        /// Day to notify for (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t = ChannelArg::Sms)]
        channel: ChannelArg,
        /// Print the messages without queuing them
        #[arg(long)]
        dry_run: bool,
    },
}

/// Date scope: explicit bounds, else the current term (or one of its periods), else everything.
#[derive(clap::Args)]
struct RangeArgs {
    #[arg(long)]
    from: Option<NaiveDate>,
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Period name within the current term
    #[arg(long)]
    period: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportKind {
    Report,
    Attendance,
}

#[derive(Clone, Copy, ValueEnum)]
enum ChannelArg {
    Sms,
    Whatsapp,
    App,
}

impl From<ChannelArg> for MessageChannel {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::Sms => MessageChannel::Sms,
            ChannelArg::Whatsapp => MessageChannel::Whatsapp,
            ChannelArg::App => MessageChannel::App,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Determine config path based on mode
    let config_path = match (&cli.config, cli.dev) {
        (Some(path), _) => path.clone(),
        (None, true) => PathBuf::from("config.toml"),
        (None, false) => AppConfig::default_path(),
    };

    // A missing or broken config is what init fixes.
    if let Command::Init { force } = cli.command {
        let _guard = init_logging(&LoggingConfig::default());
        return init(&config_path, force).await;
    }

    let config = match AppConfig::try_load(&config_path) {
        ConfigLoadResult::Loaded(config) => config,
        ConfigLoadResult::Missing => {
            bail!("Config not found at {}; run `schoolhub init` first", config_path.display())
        }
        ConfigLoadResult::Invalid(e) => bail!("Config at {} is invalid: {e}", config_path.display()),
    };
    let _guard = init_logging(&config.logging);
    tracing::info!("Config path: {:?}", config_path);

    let store = StorageService::open(&config.database)
        .await
        .context("Failed to open local database")?;
    let counts = store.table_counts().await?;
    tracing::info!(
        "Tables: {} students, {} users, {} attendance, {} performance, {} messages",
        counts.students,
        counts.users,
        counts.attendance_records,
        counts.performance_records,
        counts.messages
    );

    let viewer = match &cli.as_login {
        Some(login) => {
            let user = store
                .find_user_by_login(login)
                .await?
                .with_context(|| format!("No account with login {login}"))?;
            tracing::info!("Acting as {} ({:?})", user.name, user.role);
            Some(Viewer::from(&user))
        }
        None => None,
    };
    let require = |action: Action| -> anyhow::Result<()> {
        if let Some(viewer) = &viewer {
            viewer.require(action)?;
        }
        Ok(())
    };

    let school_id = config.school.school_id.as_str();
    match cli.command {
        Command::Init { force } => init(&config_path, force).await?,
        Command::Sync => {
            let sync = sync_service(&config, store)?;
            let result = sync.force_refresh_data().await?;
            println!("{}", result.summary());
        }
        Command::Watch => watch(&config, store).await?,
        Command::Students { class, search } => {
            let students = match (class, search) {
                (_, Some(query)) => store.search_students(school_id, &query).await?,
                (Some(class), None) => store.get_students_by_class(school_id, &class).await?,
                (None, None) => store.get_students(school_id).await?,
            };
            let students = match &viewer {
                Some(viewer) => viewer.visible_students(students),
                None => students,
            };
            for s in &students {
                println!(
                    "{:<36}  {:<6}  {:<12}  {}",
                    s.id,
                    s.class_name,
                    s.national_id,
                    s.name
                );
            }
            println!("{} students", students.len());
        }
        Command::AttendanceReport { class, range } => {
            require(Action::ViewReports)?;
            let range = resolve_range(&store, school_id, &range).await?;
            let roster = store.get_students_by_class(school_id, &class).await?;
            let records = store.get_class_attendance(school_id, &class, range).await?;
            for student in &roster {
                let summary =
                    AttendanceSummary::from_records(records.iter().filter(|r| r.student_id == student.id));
                println!(
                    "{:<30}  present {:>3}  absent {:>3}  late {:>3}  excused {:>3}  rate {:>5.1}%",
                    student.name,
                    summary.present,
                    summary.absent,
                    summary.late,
                    summary.excused,
                    summary.rate()
                );
            }
            let class_total = AttendanceSummary::from_records(&records);
            println!(
                "Class {class} {} to {}: {:.1}% over {} records",
                range.start,
                range.end,
                class_total.rate(),
                class_total.total()
            );
        }
        Command::Evaluate { class, range } => {
            require(Action::ViewReports)?;
            let range = resolve_range(&store, school_id, &range).await?;
            let roster = store.get_students_by_class(school_id, &class).await?;
            let performance = store.get_class_performance(school_id, &class, range).await?;
            let attendance = store.get_class_attendance(school_id, &class, range).await?;
            let rows = stats::class_report(&roster, &performance, &attendance, &config.grading);
            for row in &rows {
                println!(
                    "{:<30}  hw {:>5.2}  act {:>5.2}  att {:>5.2}  exam {:>5.2}  total {:>5.2}/{:<4}{}",
                    row.name,
                    row.evaluation.homework,
                    row.evaluation.activity,
                    row.evaluation.attendance,
                    row.evaluation.exam,
                    row.evaluation.total,
                    row.evaluation.max_total,
                    if row.at_risk { "  AT RISK" } else { "" }
                );
            }
            let at_risk = rows.iter().filter(|r| r.at_risk).count();
            println!("{} students, {at_risk} at risk", rows.len());
        }
        Command::Export {
            class,
            kind,
            output,
            range,
        } => {
            require(Action::ViewReports)?;
            let range = resolve_range(&store, school_id, &range).await?;
            let roster = store.get_students_by_class(school_id, &class).await?;
            let attendance = store.get_class_attendance(school_id, &class, range).await?;
            let path = match (output, kind) {
                (Some(path), _) => path,
                (None, ExportKind::Report) => PathBuf::from(app::export::generate_export_filename("class_report")),
                (None, ExportKind::Attendance) => PathBuf::from(app::export::generate_export_filename("attendance")),
            };
            match kind {
                ExportKind::Report => {
                    let performance = store.get_class_performance(school_id, &class, range).await?;
                    let rows = stats::class_report(&roster, &performance, &attendance, &config.grading);
                    app::export::export_class_report_to_excel(&rows, &path)?;
                }
                ExportKind::Attendance => app::export::export_attendance_to_excel(&attendance, &roster, &path)?,
            }
            println!("Exported to {}", path.display());
        }
        Command::Dump { output } => {
            require(Action::ViewReports)?;
            let export = store.export_json().await?;
            match output {
                Some(path) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    serde_json::to_writer_pretty(std::io::BufWriter::new(file), &export)?;
                    println!("Wrote {} collections to {}", export.len(), path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&export)?),
            }
        }
        Command::NotifyAbsences {
            class,
            date,
            channel,
            dry_run,
        } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let roster = store.get_students_by_class(school_id, &class).await?;
            if let Some(viewer) = &viewer {
                for student in &roster {
                    viewer.require_student(Action::SendMessages, student)?;
                }
            }
            let records = store.get_attendance_for_class(school_id, &class, date).await?;
            let options = NoticeOptions {
                school_id,
                sender_id: viewer.as_ref().map(|v| v.user_id.as_str()),
                channel: channel.into(),
                template: messaging::DEFAULT_ABSENCE_TEMPLATE,
            };
            let notices = messaging::absence_notices(&roster, &records, date, &options);
            for notice in notices.iter() {
                println!("{}: {}", notice.recipient_phone, notice.body);
            }
            if !dry_run {
                let mut queued = Vec::with_capacity(notices.len());
                for notice in notices.iter().cloned() {
                    let message = store.queue_message(notice).await?;
                    queued.push(DataChange::upserted(Collection::Messages, message.id));
                }
                // A one-shot command has no listener running; hand the new
                // messages to the backend directly.
                if config.remote.is_enabled() && config.sync.push_on_change && !queued.is_empty() {
                    let sync = sync_service(&config, store)?;
                    let pushed = sync.push_changes(&queued).await;
                    if pushed < queued.len() {
                        tracing::warn!("{} of {} notices were not pushed", queued.len() - pushed, queued.len());
                    }
                }
            }
            println!(
                "{} absence notices {}",
                notices.len(),
                if dry_run { "composed" } else { "queued" }
            );
        }
    }

    Ok(())
}

/// Install the stdout subscriber and, when configured, a daily log file.
fn init_logging(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let default_level = logging.level.as_deref().unwrap_or("info");
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match &logging.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "schoolhub.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false).with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(filter()))
        .with(file_layer)
        .init();

    guard
}

/// Write a default config (unless one exists) and create the database schema.
async fn init(config_path: &Path, force: bool) -> anyhow::Result<()> {
    let config = if config_path.exists() && !force {
        match AppConfig::try_load(config_path) {
            ConfigLoadResult::Loaded(config) => {
                tracing::info!("Keeping existing config at {:?}", config_path);
                config
            }
            ConfigLoadResult::Invalid(e) => bail!("Existing config is invalid ({e}); use --force to overwrite"),
            ConfigLoadResult::Missing => AppConfig::default(),
        }
    } else {
        let config = AppConfig::default();
        config.save(config_path).context("Failed to write config")?;
        tracing::info!("Wrote default config to {:?}", config_path);
        config
    };

    let store = StorageService::open(&config.database)
        .await
        .context("Failed to create local database")?;
    app::db::test_connection(store.connection()).await?;
    println!("Config: {}", config_path.display());
    println!("Database: {}", config.database.path.display());
    Ok(())
}

fn sync_service(config: &AppConfig, store: StorageService) -> anyhow::Result<Arc<SyncService<HttpBackend>>> {
    let backend = HttpBackend::new(&config.remote, &config.school.school_id)?;
    Ok(Arc::new(SyncService::new(store, Arc::new(backend), config.sync.clone())))
}

/// Run the background sync tasks until Ctrl+C.
async fn watch(config: &AppConfig, store: StorageService) -> anyhow::Result<()> {
    let sync = sync_service(config, store)?;
    if !sync.test_connection().await.unwrap_or(false) {
        tracing::warn!("Remote backend at {} is not answering", config.remote.base_url);
    }

    let mut status = sync.store().subscribe_to_sync_status();
    let handle = Arc::clone(&sync).spawn();
    tracing::info!("Watching; press Ctrl+C to stop");

    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = status.borrow_and_update().clone();
                match current {
                    SyncStatus::Error(_) => tracing::warn!("Sync {}", current.label()),
                    _ => tracing::info!("Sync {}", current.label()),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

/// Resolve the date scope of a report command.
async fn resolve_range(store: &StorageService, school_id: &str, args: &RangeArgs) -> anyhow::Result<DateRange> {
    if args.from.is_some() || args.to.is_some() {
        let full = DateRange::unbounded();
        let range = DateRange::new(args.from.unwrap_or(full.start), args.to.unwrap_or(full.end));
        if range.start > range.end {
            bail!("--from must not be after --to");
        }
        return Ok(range);
    }

    let today = Local::now().date_naive();
    let Some(term) = store.current_term(school_id, today).await? else {
        if args.period.is_some() {
            bail!("No current term to take the period from");
        }
        return Ok(DateRange::unbounded());
    };

    match &args.period {
        Some(name) => DateRange::from_period(&term, name)
            .with_context(|| format!("Term '{}' has no period named '{name}'", term.name)),
        None => Ok(DateRange::from_term(&term)),
    }
}
