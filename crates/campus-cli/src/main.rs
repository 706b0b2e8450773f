//! Campus operator CLI.
//!
//! Applies schema migrations and prints progress reads as JSON. Every
//! progress command runs under an explicit tenant, caller and role.

use anyhow::{Context, Result};
use campus_core::context::{RequestContext, Role};
use campus_core::repository::TenantRepository;
use campus_db::repository::{SurrealProgressSource, SurrealTenantRepository};
use campus_db::{DbConfig, DbManager};
use campus_progress::{ProgressConfig, ProgressService, TenantProgressQuery};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use surrealdb::Connection;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "campus", about = "Campus training progress tools")]
struct Cli {
    /// SurrealDB endpoint (`ws://host:port`, or `mem://` for a scratch database)
    #[arg(long, env = "CAMPUS_DB_URL", default_value = "ws://127.0.0.1:8000")]
    db_url: String,

    #[arg(long, env = "CAMPUS_DB_NAMESPACE", default_value = "campus")]
    db_namespace: String,

    #[arg(long, env = "CAMPUS_DB_DATABASE", default_value = "main")]
    db_database: String,

    #[arg(long, env = "CAMPUS_DB_USER", default_value = "root")]
    db_user: String,

    #[arg(long, env = "CAMPUS_DB_PASSWORD", default_value = "root", hide_env_values = true)]
    db_password: String,

    /// Maximum distinct modules accepted by one user-progress call
    #[arg(long, default_value_t = 500)]
    max_modules: usize,

    /// Include Draft and Archived modules in reports and dashboards
    #[arg(long)]
    include_unpublished: bool,

    /// Batches slower than this many milliseconds are logged as warnings
    #[arg(long, default_value_t = 250)]
    slow_batch_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

/// Who the command runs as.
#[derive(Args)]
struct Caller {
    /// Tenant id or slug
    #[arg(long, env = "CAMPUS_TENANT")]
    tenant: String,

    /// Calling user; defaults to the subject user where one is given
    #[arg(long = "as")]
    as_user: Option<Uuid>,

    #[arg(long, value_enum, default_value_t = RoleArg::Admin)]
    role: RoleArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Employee,
    Manager,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Employee => Role::Employee,
            RoleArg::Manager => Role::Manager,
            RoleArg::Admin => Role::Admin,
        }
    }
}

impl Caller {
    async fn context<C: Connection>(
        &self,
        tenants: &SurrealTenantRepository<C>,
        subject: Option<Uuid>,
    ) -> Result<RequestContext> {
        let user_id = self
            .as_user
            .or(subject)
            .context("--as is required when no subject user is given")?;
        let tenant = match Uuid::parse_str(&self.tenant) {
            Ok(id) => tenants.get_by_id(id).await,
            Err(_) => tenants.get_by_slug(&self.tenant).await,
        }
        .with_context(|| format!("resolving tenant {}", self.tenant))?;
        Ok(RequestContext::new(tenant.id, user_id, self.role.into()))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,
    /// Progress of one user across the given modules
    UserProgress {
        #[command(flatten)]
        caller: Caller,
        #[arg(long)]
        user: Uuid,
        /// Module id; repeat for several
        #[arg(long = "module", required = true)]
        modules: Vec<Uuid>,
    },
    /// Progress of every assigned (user, module) pair in the tenant
    TenantReport {
        #[command(flatten)]
        caller: Caller,
        #[arg(long)]
        group: Option<Uuid>,
        #[arg(long)]
        module: Option<Uuid>,
        /// Print per-module counts instead of individual entries
        #[arg(long)]
        summary: bool,
    },
    /// The caller's assigned modules in dashboard order
    Dashboard {
        #[command(flatten)]
        caller: Caller,
    },
}

impl Cli {
    fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.db_url.clone(),
            namespace: self.db_namespace.clone(),
            database: self.db_database.clone(),
            username: self.db_user.clone(),
            password: self.db_password.clone(),
        }
    }

    fn progress_config(&self) -> ProgressConfig {
        ProgressConfig {
            max_modules_per_request: self.max_modules,
            include_unpublished: self.include_unpublished,
            slow_batch_threshold_ms: self.slow_batch_ms,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("campus=info,warn")),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let manager = DbManager::connect(&cli.db_config())
        .await
        .context("connecting to SurrealDB")?;
    let db = manager.client().clone();

    if let Commands::Migrate = cli.command {
        let applied = campus_db::run_migrations(&db).await?;
        info!(applied, latest = campus_db::latest_version(), "Migrations finished");
        return Ok(());
    }

    let tenants = SurrealTenantRepository::new(db.clone());
    let service = ProgressService::new(SurrealProgressSource::new(db), cli.progress_config());

    let output = match &cli.command {
        Commands::Migrate => return Ok(()),
        Commands::UserProgress {
            caller,
            user,
            modules,
        } => {
            let ctx = caller.context(&tenants, Some(*user)).await?;
            let progress = service.user_progress(&ctx, *user, modules).await?;
            serde_json::to_value(progress)?
        }
        Commands::TenantReport {
            caller,
            group,
            module,
            summary,
        } => {
            let ctx = caller.context(&tenants, None).await?;
            let query = TenantProgressQuery {
                group_id: *group,
                module_id: *module,
            };
            let report = service.tenant_progress(&ctx, query).await?;
            if *summary {
                json!({
                    "tenant_id": report.tenant_id,
                    "modules": report.module_summaries(Utc::now()),
                })
            } else {
                json!({
                    "tenant_id": report.tenant_id,
                    "entries": report.entries_for_display(),
                    "user_names": report.user_names,
                    "module_titles": report.module_titles,
                    "group_names": report.group_names,
                })
            }
        }
        Commands::Dashboard { caller } => {
            let ctx = caller.context(&tenants, None).await?;
            serde_json::to_value(service.user_dashboard(&ctx).await?)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
