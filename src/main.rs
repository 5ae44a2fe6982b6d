//! Pistech Admin - CLI
//!
//! Command-line front end over the Pistech backend: session handling,
//! record listing and maintenance, per-project balances and the dashboard.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use pistech_admin::cache::EntityCache;
use pistech_admin::models::{
    is_blank, is_valid_amount, ClientCharge, Currency, Entity, EntityKind, ListFilters, LogEntry,
    LogFilters, Note, NoteDraft, Partner, PartnerPayment, Project, ProjectDraft, ProjectStatus,
};
use pistech_admin::views::RECENT_DEFAULT;
use pistech_admin::{AppContext, Config};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pistech")]
#[command(about = "Pistech administration dashboard CLI")]
struct Cli {
    /// Path to config.yaml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login(CredentialArgs),

    /// Create an account and log in
    Register(CredentialArgs),

    /// Forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Notes
    Notes {
        #[command(subcommand)]
        action: NoteAction,
    },

    /// Projects
    Projects {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Client charges
    Charges {
        #[command(subcommand)]
        action: RecordAction,
    },

    /// Partner payments
    Payments {
        #[command(subcommand)]
        action: RecordAction,
    },

    /// Partners
    Partners {
        #[command(subcommand)]
        action: RecordAction,
    },

    /// Totals and recent activity
    Dashboard,

    /// Audit log
    Logs {
        /// Only entries about this record id
        #[arg(long, conflicts_with_all = ["user", "kind"])]
        entity: Option<String>,

        /// Only entries by this user id
        #[arg(long, conflicts_with = "kind")]
        user: Option<String>,

        /// Only entries for this entity type (note, project, client-charge, ...)
        #[arg(long = "type")]
        kind: Option<EntityKind>,
    },
}

#[derive(Args)]
struct CredentialArgs {
    #[arg(short, long, env = "PISTECH_EMAIL")]
    email: String,

    #[arg(short, long, env = "PISTECH_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Subcommand)]
enum RecordAction {
    /// List one page of records
    List {
        #[arg(long, default_value = "1")]
        page: u32,

        /// Page size (defaults to cache.page_size)
        #[arg(long)]
        limit: Option<u32>,

        /// Include soft-deleted records (marked with *)
        #[arg(long)]
        include_deleted: bool,
    },

    /// Show one record as JSON
    Show { id: String },

    /// Soft delete (restorable)
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },

    /// Undo a soft delete
    Restore { id: String },

    /// Permanently delete
    Purge {
        id: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum NoteAction {
    /// Create a note
    Add {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        content: String,

        /// Comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },

    #[command(flatten)]
    Record(RecordAction),
}

#[derive(Subcommand)]
enum ProjectAction {
    /// Create a project
    Add {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        amount: f64,

        #[arg(long, default_value = "ARS")]
        currency: Currency,

        #[arg(long, default_value = "active")]
        status: ProjectStatus,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Charges, payments and balances of one project
    Summary { id: String },

    #[command(flatten)]
    Record(RecordAction),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,pistech_admin=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_yaml_and_env(cli.config.as_deref())?;
    let ctx = AppContext::new(config);

    if let Err(e) = ctx.session().restore() {
        tracing::warn!("Could not restore session: {}", e);
    }

    let result = run(&ctx, cli.command).await;

    // Persist a session the gateway ended during this run
    ctx.session().sync();
    result
}

async fn run(ctx: &AppContext, command: Commands) -> Result<()> {
    let page_size = ctx.config.page_size;
    match command {
        Commands::Login(creds) => {
            ctx.session().login(&creds.email, &creds.password).await?;
            println!("Logged in as {}", display_user(ctx));
            Ok(())
        }
        Commands::Register(creds) => {
            ctx.session()
                .register(&creds.email, &creds.password)
                .await?;
            println!("Registered and logged in as {}", display_user(ctx));
            Ok(())
        }
        Commands::Logout => {
            ctx.logout();
            println!("Logged out");
            Ok(())
        }
        Commands::Whoami => {
            if !authenticate(ctx).await {
                println!("Not logged in");
                return Ok(());
            }
            match ctx.session().user() {
                Some(user) => println!("{} ({:?}) id={}", user.email, user.role, user.id),
                None => println!("Logged in (no profile cached)"),
            }
            Ok(())
        }
        Commands::Notes { action } => {
            require_session(ctx).await?;
            let stores = ctx.stores()?;
            match action {
                NoteAction::Add {
                    title,
                    content,
                    tags,
                } => {
                    let tags: Vec<String> = tags.into_iter().filter(|t| !is_blank(t)).collect();
                    let draft = NoteDraft {
                        title,
                        content,
                        tags: (!tags.is_empty()).then_some(tags),
                    };
                    if !draft.is_submittable() {
                        println!("Title and content are required");
                        return Ok(());
                    }
                    let note = stores.notes.create(&draft).await?;
                    println!("Created note: {}", note.id);
                    Ok(())
                }
                NoteAction::Record(action) => run_records(&stores.notes, action, page_size).await,
            }
        }
        Commands::Projects { action } => {
            require_session(ctx).await?;
            let stores = ctx.stores()?;
            match action {
                ProjectAction::Add {
                    name,
                    amount,
                    currency,
                    status,
                    description,
                } => {
                    let draft = ProjectDraft {
                        name,
                        description: description.filter(|d| !is_blank(d)),
                        status,
                        amount,
                        currency,
                    };
                    if is_blank(&draft.name) {
                        println!("Project name is required");
                        return Ok(());
                    }
                    if !is_valid_amount(draft.amount) {
                        println!("Amount must be a number >= 0");
                        return Ok(());
                    }
                    let project = stores.projects.create(&draft).await?;
                    println!("Created project: {}", project.id);
                    Ok(())
                }
                ProjectAction::Summary { id } => project_summary(ctx, &id).await,
                ProjectAction::Record(action) => {
                    run_records(&stores.projects, action, page_size).await
                }
            }
        }
        Commands::Charges { action } => {
            require_session(ctx).await?;
            run_records(&ctx.stores()?.charges, action, page_size).await
        }
        Commands::Payments { action } => {
            require_session(ctx).await?;
            run_records(&ctx.stores()?.payments, action, page_size).await
        }
        Commands::Partners { action } => {
            require_session(ctx).await?;
            run_records(&ctx.stores()?.partners, action, page_size).await
        }
        Commands::Dashboard => dashboard(ctx).await,
        Commands::Logs { entity, user, kind } => logs(ctx, entity, user, kind).await,
    }
}

// ============================================================================
// Session helpers
// ============================================================================

/// Validate the restored token once; false when there is no usable session
async fn authenticate(ctx: &AppContext) -> bool {
    ctx.session().token().is_some() && ctx.session().validate_token().await
}

async fn require_session(ctx: &AppContext) -> Result<()> {
    if !authenticate(ctx).await {
        bail!("Not logged in. Run `pistech login` first.");
    }
    Ok(())
}

fn display_user(ctx: &AppContext) -> String {
    ctx.session()
        .user()
        .map(|u| u.email)
        .unwrap_or_else(|| "<unknown user>".into())
}

fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read confirmation")?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

// ============================================================================
// Generic record commands
// ============================================================================

/// One table line per record
trait Row {
    const HEADER: &'static str;
    fn row(&self) -> String;
}

async fn run_records<E>(cache: &EntityCache<E>, action: RecordAction, page_size: u32) -> Result<()>
where
    E: Entity + Row,
{
    match action {
        RecordAction::List {
            page,
            limit,
            include_deleted,
        } => {
            let mut filters = E::Filters::default();
            let paging = filters.paging_mut();
            paging.page = Some(page);
            paging.limit = Some(limit.unwrap_or(page_size));
            paging.include_deleted = include_deleted.then_some(true);

            let result = cache.load_paginated(&filters).await?;
            if result.records.is_empty() {
                println!("No {} records", E::KIND);
                return Ok(());
            }
            println!("  {}", E::HEADER);
            println!("{}", "-".repeat(100));
            for record in &result.records {
                let marker = if record.is_deleted() { '*' } else { ' ' };
                println!("{} {}", marker, record.row());
            }
            println!(
                "{} of {} (page {})",
                result.records.len(),
                result.total,
                filters.paging().page_or_default()
            );
            Ok(())
        }
        RecordAction::Show { id } => {
            if is_blank(&id) {
                println!("An id is required");
                return Ok(());
            }
            let record = cache.get(&id).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        RecordAction::Delete { id, yes } => {
            if is_blank(&id) || !confirm(&format!("Delete {} {}?", E::KIND, id), yes)? {
                println!("Nothing deleted");
                return Ok(());
            }
            cache.delete(&id).await?;
            println!("Deleted {} {} (restorable)", E::KIND, id);
            Ok(())
        }
        RecordAction::Restore { id } => {
            if is_blank(&id) {
                println!("An id is required");
                return Ok(());
            }
            cache.restore(&id).await?;
            println!("Restored {} {}", E::KIND, id);
            Ok(())
        }
        RecordAction::Purge { id, yes } => {
            let prompt = format!("Permanently delete {} {}? This cannot be undone.", E::KIND, id);
            if is_blank(&id) || !confirm(&prompt, yes)? {
                println!("Nothing deleted");
                return Ok(());
            }
            cache.hard_delete(&id).await?;
            println!("Permanently deleted {} {}", E::KIND, id);
            Ok(())
        }
    }
}

impl Row for Note {
    const HEADER: &'static str = "ID                                    TITLE                          TAGS";
    fn row(&self) -> String {
        format!(
            "{:<37} {:<30} {}",
            self.id,
            truncate(&self.title, 30),
            self.tags.as_deref().unwrap_or_default().join(",")
        )
    }
}

impl Row for Project {
    const HEADER: &'static str = "ID                                    NAME                           STATUS      AMOUNT";
    fn row(&self) -> String {
        format!(
            "{:<37} {:<30} {:<11} {:.2} {}",
            self.id,
            truncate(&self.name, 30),
            self.status,
            self.amount,
            self.currency
        )
    }
}

impl Row for ClientCharge {
    const HEADER: &'static str = "ID                                    PROJECT                               DATE        AMOUNT";
    fn row(&self) -> String {
        format!(
            "{:<37} {:<37} {:<11} {:.2} {} ({})",
            self.id,
            self.project_id,
            self.date.format("%Y-%m-%d"),
            self.amount,
            self.currency,
            self.payment_method
        )
    }
}

impl Row for PartnerPayment {
    const HEADER: &'static str = "ID                                    PARTNER              DATE        AMOUNT";
    fn row(&self) -> String {
        format!(
            "{:<37} {:<20} {:<11} {:.2} {}",
            self.id,
            truncate(&self.partner_name, 20),
            self.date.format("%Y-%m-%d"),
            self.amount,
            self.currency
        )
    }
}

impl Row for Partner {
    const HEADER: &'static str = "ID                                    NAME                      NICKNAME        ROLE";
    fn row(&self) -> String {
        format!(
            "{:<37} {:<25} {:<15} {} / {}",
            self.id,
            truncate(&self.full_name, 25),
            truncate(&self.nickname, 15),
            self.partner_role,
            self.pistech_role
        )
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

// ============================================================================
// Views
// ============================================================================

async fn project_summary(ctx: &AppContext, id: &str) -> Result<()> {
    let stores = ctx.stores()?;
    futures::join!(
        stores.projects.load(),
        stores.charges.load(),
        stores.payments.load()
    );
    if let Some(err) = stores
        .projects
        .error()
        .or_else(|| stores.charges.error())
        .or_else(|| stores.payments.error())
    {
        return Err(err).context("Failed to load project data");
    }

    let (Some(charges), Some(payments)) = (stores.project_charges(id), stores.project_payments(id))
    else {
        println!("No project with id {}", id);
        return Ok(());
    };

    let project = &charges.project;
    let cur = project.currency;
    println!("{} [{}] {:.2} {}", project.name, project.status, project.amount, cur);
    println!("{}", "-".repeat(60));
    println!("Charged:   {:>14.2} {}", charges.total_charged, cur);
    println!("Remaining: {:>14.2} {}", charges.remaining, cur);
    println!("Paid out:  {:>14.2} {}", payments.total_paid, cur);
    println!("Available: {:>14.2} {}", payments.available, cur);
    if !charges.currencies_consistent || !payments.currencies_consistent {
        println!("warning: records in other currencies were summed without conversion");
    }

    println!("\nRecent charges:");
    for charge in charges.recent(RECENT_DEFAULT) {
        println!(
            "  {}  {:.2} {}",
            charge.date.format("%Y-%m-%d"),
            charge.amount,
            charge.currency
        );
    }
    println!("Recent payments:");
    for payment in payments.recent(RECENT_DEFAULT) {
        println!(
            "  {}  {:.2} {}  {}",
            payment.date.format("%Y-%m-%d"),
            payment.amount,
            payment.currency,
            payment.partner_name
        );
    }
    Ok(())
}

async fn dashboard(ctx: &AppContext) -> Result<()> {
    require_session(ctx).await?;
    ctx.load_all().await?;
    let stores = ctx.stores()?;
    if let Some(err) = [
        stores.notes.error(),
        stores.projects.error(),
        stores.charges.error(),
        stores.payments.error(),
    ]
    .into_iter()
    .flatten()
    .next()
    {
        return Err(err).context("Failed to load dashboard data");
    }
    let summary = stores.dashboard();

    println!("Notes:            {}", summary.total_notes);
    println!("Projects:         {}", summary.total_projects);
    println!("Client charges:   {}", summary.total_client_charges);
    println!("Partner payments: {}", summary.total_partner_payments);
    println!("Revenue:  {:>14.2}", summary.total_revenue);
    println!("Expenses: {:>14.2}", summary.total_expenses);
    println!("Net:      {:>14.2}", summary.net_amount);

    println!("\nRecent activity:");
    for item in &summary.recent_activity {
        let amount = match (item.amount, item.currency) {
            (Some(a), Some(c)) => format!("  {:.2} {}", a, c),
            _ => String::new(),
        };
        println!("  {}  {}{}", item.date.format("%Y-%m-%d"), item.title, amount);
    }
    Ok(())
}

async fn logs(
    ctx: &AppContext,
    entity: Option<String>,
    user: Option<String>,
    kind: Option<EntityKind>,
) -> Result<()> {
    require_session(ctx).await?;
    let client = ctx.client();
    let entries: Vec<LogEntry> = match (entity, user, kind) {
        (Some(id), _, _) => client.logs_by_entity(&id).await?,
        (_, Some(id), _) => client.logs_by_user(&id).await?,
        (_, _, Some(kind)) => client.logs_by_type(kind).await?,
        _ => client.list_logs(&LogFilters::default()).await?,
    };

    if entries.is_empty() {
        println!("No log entries");
        return Ok(());
    }
    for entry in &entries {
        println!(
            "{}  {:<6} {:<14} {}  by {}",
            entry.created_at.format("%Y-%m-%d %H:%M"),
            entry.action,
            entry.entity_type,
            entry.entity_id,
            entry.user_id
        );
    }
    Ok(())
}
