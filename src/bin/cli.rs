use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::debug;

use itam_console::config::ConsoleConfig;
use itam_console::dashboard::{self, format_timestamp};
use itam_console::gate::{self, ADMIN_LANDING};
use itam_console::models::{
    AdminLogFilter, AllocationFilter, AssetFilter, EmployeeFilter, Identity, RequestFilter,
};
use itam_console::query::{numeric_filter, text_filter, ListQuery, Sort, SortOrder};
use itam_console::resources::{
    parse_key, AdminLogs, Allocations, Assets, AuditRequests, Employees, Resource,
    ResourceService, ServiceRequests, Updatable,
};
use itam_console::storage::SledTokenStore;
use itam_console::telemetry::init_tracing;
use itam_console::{ConsoleError, ConsoleResult, RestClient, SessionManager};

#[derive(Parser)]
#[command(name = "itam-cli")]
#[command(about = "Admin console for the IT asset-management backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL (overrides ITAM_API_BASE_URL)
    #[arg(short, long)]
    url: Option<String>,

    /// Where the session is kept (overrides ITAM_STATE_DIR)
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Emit logs as JSON on stderr
    #[arg(long)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
        /// Sign in again even if a session exists
        #[arg(long)]
        force: bool,
    },
    Logout,
    /// Show the identity carried by the stored token
    Whoami,
    /// Resolve where a navigation to PATH would land
    Open { path: String },
    Dashboard,
    Assets {
        #[command(subcommand)]
        action: CrudAction,
    },
    Employees {
        #[command(subcommand)]
        action: CrudAction,
    },
    /// Allocation keys are written ASSET:EMPLOYEE
    Allocations {
        #[command(subcommand)]
        action: CrudAction,
    },
    ServiceRequests {
        #[command(subcommand)]
        action: CrudAction,
    },
    AuditRequests {
        #[command(subcommand)]
        action: CrudAction,
    },
    AdminLogs {
        #[command(subcommand)]
        action: CrudAction,
    },
    /// Service requests of one employee or one asset
    ServiceHistory {
        #[arg(long, conflicts_with = "asset", required_unless_present = "asset")]
        employee: Option<i64>,
        #[arg(long)]
        asset: Option<i64>,
    },
    /// Audit requests of one employee
    AuditHistory {
        #[arg(long)]
        employee: i64,
    },
    /// Recent admin activity, or everything done by one admin
    Activity {
        #[arg(long)]
        admin: Option<i64>,
    },
    Categories,
    Statuses,
    /// Allocations of the signed-in employee
    MyAssets,
}

#[derive(Subcommand)]
enum CrudAction {
    /// One page of a filtered, sorted search
    Search(SearchArgs),
    List,
    Get {
        key: String,
    },
    Create {
        /// Record as JSON
        #[arg(long)]
        json: String,
    },
    Update {
        key: String,
        #[arg(long)]
        json: String,
    },
    Delete {
        key: String,
    },
}

#[derive(Args)]
struct SearchArgs {
    /// Filter as FIELD=VALUE; blank values are ignored
    #[arg(short, long = "filter", value_parser = parse_pair)]
    filters: Vec<(String, String)>,
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long)]
    page_size: Option<u32>,
    #[arg(long)]
    sort_by: Option<String>,
    #[arg(long, value_enum, default_value_t = Order::Asc)]
    order: Order,
}

#[derive(Clone, Copy, ValueEnum)]
enum Order {
    Asc,
    Desc,
}

impl From<Order> for SortOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Asc => SortOrder::Asc,
            Order::Desc => SortOrder::Desc,
        }
    }
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_owned(), value.to_owned()))
        .ok_or_else(|| format!("expected FIELD=VALUE, got {raw:?}"))
}

/// Filter sets that can be built from `--filter FIELD=VALUE` pairs.
trait FromPairs: Sized + Default {
    fn apply(&mut self, field: &str, value: &str) -> bool;

    fn from_pairs(pairs: &[(String, String)]) -> ConsoleResult<Self> {
        let mut filters = Self::default();
        for (field, value) in pairs {
            if !filters.apply(&field_key(field), value) {
                return Err(ConsoleError::Validation(format!("unknown filter {field:?}")));
            }
        }
        Ok(filters)
    }
}

/// `AssetName`, `asset_name` and `asset-name` all name the same field.
fn field_key(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase()
}

impl FromPairs for AssetFilter {
    fn apply(&mut self, field: &str, value: &str) -> bool {
        match field {
            "name" | "assetname" => self.asset_name = text_filter(value),
            "model" | "assetmodel" => self.asset_model = text_filter(value),
            "category" | "categoryid" => self.category_id = numeric_filter(value),
            "status" | "statusid" => self.status_id = numeric_filter(value),
            _ => return false,
        }
        true
    }
}

impl FromPairs for EmployeeFilter {
    fn apply(&mut self, field: &str, value: &str) -> bool {
        match field {
            "firstname" => self.first_name = text_filter(value),
            "lastname" => self.last_name = text_filter(value),
            "email" => self.email = text_filter(value),
            "role" | "roleid" => self.role_id = numeric_filter(value),
            "phone" | "phonenumber" => self.phone_number = text_filter(value),
            "gender" => self.gender = text_filter(value),
            _ => return false,
        }
        true
    }
}

impl FromPairs for AllocationFilter {
    fn apply(&mut self, field: &str, value: &str) -> bool {
        match field {
            "asset" | "assetid" => self.asset_id = numeric_filter(value),
            "employee" | "employeeid" => self.employee_id = numeric_filter(value),
            _ => return false,
        }
        true
    }
}

impl FromPairs for RequestFilter {
    fn apply(&mut self, field: &str, value: &str) -> bool {
        match field {
            "asset" | "assetid" => self.asset_id = numeric_filter(value),
            "employee" | "employeeid" => self.employee_id = numeric_filter(value),
            "status" | "statusid" => self.status_id = numeric_filter(value),
            _ => return false,
        }
        true
    }
}

impl FromPairs for AdminLogFilter {
    fn apply(&mut self, field: &str, value: &str) -> bool {
        match field {
            "admin" | "adminid" => self.admin_id = numeric_filter(value),
            "action" => self.action = text_filter(value),
            "entity" | "entityaffected" => self.entity_affected = text_filter(value),
            _ => return false,
        }
        true
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match ConsoleConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(url) = &cli.url {
        config = config.with_api_base_url(url);
    }
    if let Some(state_dir) = &cli.state_dir {
        config = config.with_state_dir(state_dir);
    }
    let _log_guard = init_tracing(cli.log_json, config.log_dir.as_deref());

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.redirect() {
                Some(path) => eprintln!("{err}\nContinue at {path}"),
                None => eprintln!("error: {err}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &ConsoleConfig) -> ConsoleResult<()> {
    let store = SledTokenStore::open(&config.state_dir)?;
    let session = SessionManager::new(Arc::new(store));
    let client = RestClient::new(config, session.clone())?;
    debug!(base_url = client.base_url(), "console ready");

    match command {
        Commands::Login {
            username,
            password,
            force,
        } => {
            let identity = session.identity();
            if !force && identity.is_some() {
                let landing = gate::navigate(gate::default_landing(identity.as_ref()), identity.as_ref());
                println!("Already signed in. Continue at {landing}");
                return Ok(());
            }
            let outcome = client.login(&username, &password).await?;
            let name = session.display_name()?.unwrap_or(username);
            println!("Signed in as {name}. Continue at {}", outcome.landing);
        }
        Commands::Logout => {
            client.logout()?;
            println!("Signed out.");
        }
        Commands::Whoami => match session.identity() {
            Some(identity) => {
                print_json(&identity)?;
                if let Some(name) = session.display_name()? {
                    println!("Display name: {name}");
                }
            }
            None => println!("Not signed in."),
        },
        Commands::Open { path } => {
            let identity = session.identity();
            println!("{}", gate::navigate(&path, identity.as_ref()));
        }
        Commands::Dashboard => {
            enter(&session, ADMIN_LANDING)?;
            show_dashboard(&client).await?;
        }
        Commands::Assets { action } => {
            enter(&session, "/admin/assets")?;
            crud(client.resource::<Assets>(), action).await?;
        }
        Commands::Employees { action } => {
            enter(&session, "/admin/employees")?;
            crud(client.resource::<Employees>(), action).await?;
        }
        Commands::Allocations { action } => {
            enter(&session, "/admin/allocations")?;
            crud(client.resource::<Allocations>(), action).await?;
        }
        Commands::ServiceRequests { action } => {
            enter(&session, "/admin/service-requests")?;
            crud(client.resource::<ServiceRequests>(), action).await?;
        }
        Commands::AuditRequests { action } => {
            enter(&session, "/admin/audit-requests")?;
            crud(client.resource::<AuditRequests>(), action).await?;
        }
        Commands::AdminLogs { action } => {
            enter(&session, "/admin/admin-logs")?;
            read_write(client.resource::<AdminLogs>(), action).await?;
        }
        Commands::ServiceHistory { employee, asset } => {
            enter(&session, "/admin/service-requests")?;
            let requests = client.resource::<ServiceRequests>();
            let history = match (employee, asset) {
                (Some(employee), _) => requests.by_employee(employee).await?,
                (None, Some(asset)) => requests.by_asset(asset).await?,
                (None, None) => {
                    return Err(ConsoleError::Validation(
                        "pass --employee or --asset".to_owned(),
                    ))
                }
            };
            print_json(&history)?;
        }
        Commands::AuditHistory { employee } => {
            enter(&session, "/admin/audit-requests")?;
            print_json(&client.resource::<AuditRequests>().by_employee(employee).await?)?;
        }
        Commands::Activity { admin } => {
            enter(&session, "/admin/admin-logs")?;
            let logs = client.resource::<AdminLogs>();
            let entries = match admin {
                Some(admin) => logs.by_admin(admin).await?,
                None => logs.recent().await?,
            };
            for entry in &entries {
                println!(
                    "{}  {} {}  {}",
                    entry.timestamp.as_deref().map(format_timestamp).unwrap_or_default(),
                    entry.action.as_deref().unwrap_or("-"),
                    entry.entity_affected.as_deref().unwrap_or("-"),
                    entry.description.as_deref().unwrap_or(""),
                );
            }
        }
        Commands::Categories => {
            enter(&session, "/admin/assets")?;
            print_json(&client.resource::<Assets>().categories().await?)?;
        }
        Commands::Statuses => {
            enter(&session, "/admin/assets")?;
            print_json(&client.resource::<Assets>().statuses().await?)?;
        }
        Commands::MyAssets => {
            let identity = enter(&session, "/employee/my-assets")?;
            let employee_id = identity.user_id.ok_or_else(|| {
                ConsoleError::Validation("the session carries no employee id".to_owned())
            })?;
            let allocations = client.resource::<Allocations>();
            let page = allocations.for_employee(employee_id).await?;
            print_json(&page.items)?;
            print_page_footer(1, page.page_count(Allocations::DEFAULT_PAGE_SIZE), page.total_count);
        }
    }

    Ok(())
}

/// Runs the access gate for a screen before any request is made.
fn enter(session: &SessionManager, path: &str) -> ConsoleResult<Identity> {
    let identity = session.identity();
    let route = gate::require(path, identity.as_ref())?;
    debug!(screen = route.title, "entering screen");
    Ok(identity.unwrap_or_default())
}

async fn crud<R>(service: ResourceService<R>, action: CrudAction) -> ConsoleResult<()>
where
    R: Updatable,
    R::Filter: FromPairs,
{
    match action {
        CrudAction::Update { key, json } => {
            let key = parse_key::<R>(&key)?;
            let record: R::Record = serde_json::from_str(&json)?;
            let saved = service
                .update(&key, &record)
                .await
                .map_err(|err| with_fallback(err, "Save failed"))?;
            print_saved(saved.as_ref())
        }
        other => read_write(service, other).await,
    }
}

async fn read_write<R>(service: ResourceService<R>, action: CrudAction) -> ConsoleResult<()>
where
    R: Resource,
    R::Filter: FromPairs,
{
    match action {
        CrudAction::Search(args) => {
            let page_size = args.page_size.unwrap_or(R::DEFAULT_PAGE_SIZE);
            let sort = match args.sort_by {
                Some(field) => Some(Sort::new(field, args.order.into())),
                None => R::default_sort(),
            };
            let mut query = ListQuery::new(R::Filter::default(), page_size, sort);
            query.set_filters(R::Filter::from_pairs(&args.filters)?);
            query.go_to_page(args.page)?;

            let page = service.search(&query.request()).await?;
            print_json(&page.items)?;
            print_page_footer(
                query.page_number(),
                page.page_count(query.page_size()),
                page.total_count,
            );
            Ok(())
        }
        CrudAction::List => print_json(&service.list().await?),
        CrudAction::Get { key } => print_json(&service.get(&parse_key::<R>(&key)?).await?),
        CrudAction::Create { json } => {
            let record: R::Record = serde_json::from_str(&json)?;
            let saved = service
                .create(&record)
                .await
                .map_err(|err| with_fallback(err, "Save failed"))?;
            print_saved(saved.as_ref())
        }
        CrudAction::Update { .. } => Err(ConsoleError::Validation(format!(
            "{} cannot be edited",
            R::COLLECTION.trim_start_matches('/')
        ))),
        CrudAction::Delete { key } => {
            service
                .remove(&parse_key::<R>(&key)?)
                .await
                .map_err(|err| with_fallback(err, "Delete failed"))?;
            println!("Deleted.");
            Ok(())
        }
    }
}

/// Keeps the server's wording for a failed save/delete, else `fallback`.
fn with_fallback(err: ConsoleError, fallback: &str) -> ConsoleError {
    if let ConsoleError::Api { status, .. } = &err {
        return ConsoleError::Api {
            status: *status,
            message: Some(err.user_message(fallback)),
        };
    }
    err
}

async fn show_dashboard(client: &RestClient) -> ConsoleResult<()> {
    let snapshot = dashboard::load(client).await?;
    println!("Total assets:       {}", snapshot.total_assets);
    println!("Allocated:          {}", snapshot.allocated_assets);
    println!("Pending requests:   {}", snapshot.pending_requests);
    println!("Ongoing audits:     {}", snapshot.ongoing_audits);

    println!("\nAssets by category");
    for slice in &snapshot.asset_distribution {
        println!("  {:<24} {}", slice.name, slice.value);
    }
    println!("\nService requests per month");
    for point in &snapshot.requests_trend {
        println!("  {:<10} {}", point.month, point.requests);
    }
    println!("\nRecent activity");
    for entry in &snapshot.recent_activity {
        println!(
            "  {}  {} {}",
            entry.timestamp.as_deref().map(format_timestamp).unwrap_or_default(),
            entry.action.as_deref().unwrap_or("-"),
            entry.entity_affected.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> ConsoleResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_saved<T: Serialize>(saved: Option<&T>) -> ConsoleResult<()> {
    match saved {
        Some(record) => print_json(record),
        None => {
            println!("Saved.");
            Ok(())
        }
    }
}

fn print_page_footer(page: u32, pages: u32, total: u64) {
    if total == 0 {
        println!("No results.");
    } else {
        println!("Page {page} of {pages} ({total} total)");
    }
}
