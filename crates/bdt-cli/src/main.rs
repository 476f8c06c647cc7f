use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use bdt_connect::outreach::{self, PartyInfo, SenderInfo, TemplateName};
use bdt_connect::{
    companies_by_sector, connection_statistics, filter_by_status, initiate, next_actions,
    parse_notes, ConnectionStats,
};
use bdt_core::{
    BudgetRange, BusinessNeed, Company, CompanySize, Connection, ConnectionStatus, Contact,
    ContactRole, NeedType, Priority, Sector, Timeline,
};
use bdt_match::{MatchRanker, RankerConfig};
use bdt_store::{
    delete_company, AuditLog, AuditSink, DataStore, DatasetTotals, LogEntry, StoreConfig,
};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "bdt")]
#[command(about = "Business development tool: match needs to companies and track outreach")]
struct Cli {
    /// Data file (overrides BDT_DATA_FILE)
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,
    /// Operations log (overrides BDT_AUDIT_LOG)
    #[arg(long, global = true)]
    audit_log: Option<PathBuf>,
    /// Sector affinity YAML (overrides BDT_SECTORS_FILE)
    #[arg(long, global = true)]
    sectors_file: Option<PathBuf>,
    /// Print JSON instead of text where supported
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load the bundled sample dataset
    Seed,
    /// Remove every record from the data file
    Clear {
        #[arg(long)]
        yes: bool,
    },
    Companies {
        #[arg(long)]
        sector: Option<String>,
    },
    AddCompany(CompanyArgs),
    Contacts {
        #[arg(long)]
        company: Option<String>,
    },
    AddContact(ContactArgs),
    Needs {
        /// Include inactive needs
        #[arg(long)]
        all: bool,
    },
    AddNeed(NeedArgs),
    /// Rank the catalog against a business need
    Matches { need_id: Uuid },
    /// Score breakdown for one need/company pairing
    Explain { need_id: Uuid, company: String },
    /// Open a connection for a ranked match
    Connect { need_id: Uuid, company: String },
    Connections {
        #[arg(long)]
        status: Option<String>,
    },
    Status { connection_id: Uuid, status: String },
    Note { connection_id: Uuid, text: String },
    Notes { connection_id: Uuid },
    /// Suggested next steps for a stage
    Actions { status: String },
    Stats,
    /// Placeholders a template needs
    Variables { template: String },
    Render {
        template: String,
        /// key=value, repeatable
        #[arg(long = "var", value_parser = parse_key_val)]
        vars: Vec<(String, String)>,
    },
    /// Draft the initial outreach email for a connection
    Outreach {
        connection_id: Uuid,
        #[command(flatten)]
        sender: SenderArgs,
    },
    /// Schedule a follow-up and draft its email
    FollowUp {
        connection_id: Uuid,
        #[arg(long, default_value_t = 7)]
        days: i64,
        #[arg(long, default_value_t = 1)]
        ordinal: u32,
        #[arg(long)]
        sender_name: String,
    },
    /// Draft an email introducing both sides of a connection
    Introduce {
        connection_id: Uuid,
        #[arg(long)]
        introducer: String,
    },
    DeleteCompany {
        name: String,
        #[arg(long)]
        reason: String,
        #[arg(long)]
        actor: Option<String>,
    },
    Logs {
        #[arg(long, default_value_t = 20)]
        lines: usize,
        #[arg(long)]
        search: Option<String>,
    },
}

#[derive(Debug, Args)]
struct CompanyArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    sector: Option<String>,
    #[arg(long)]
    size: Option<CompanySize>,
    #[arg(long, default_value = "")]
    location: String,
    #[arg(long, default_value = "")]
    website: String,
    #[arg(long)]
    founded_year: Option<i32>,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, value_delimiter = ',')]
    tags: Vec<String>,
    /// Free-form note recorded in the operations log
    #[arg(long, default_value = "")]
    note: String,
}

#[derive(Debug, Args)]
struct ContactArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    company: String,
    #[arg(long, default_value = "")]
    position: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long)]
    role: Option<ContactRole>,
    #[arg(long, default_value = "")]
    note: String,
}

#[derive(Debug, Args)]
struct NeedArgs {
    #[arg(long)]
    company: String,
    #[arg(long)]
    title: String,
    #[arg(long = "type")]
    need_type: String,
    #[arg(long)]
    looking_for: Option<String>,
    #[arg(long, value_delimiter = ',')]
    target_sectors: Vec<String>,
    #[arg(long)]
    budget: Option<BudgetRange>,
    #[arg(long)]
    timeline: Option<Timeline>,
    #[arg(long, default_value = "Medium")]
    priority: Priority,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    note: String,
}

#[derive(Debug, Args)]
struct SenderArgs {
    #[arg(long)]
    sender_name: String,
    #[arg(long, default_value = "")]
    sender_title: String,
    #[arg(long, default_value = "")]
    sender_email: String,
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("BDT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Serialize)]
struct StatsReport<'a> {
    totals: DatasetTotals,
    connections: &'a ConnectionStats,
    companies_by_sector: &'a BTreeMap<String, usize>,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("serializing output")?
    );
    Ok(())
}

/// Audit writes never fail the command that triggered them.
async fn record(audit: &AuditLog, entry: LogEntry) {
    if let Err(err) = audit.record_event(&entry).await {
        warn!(operation = %entry.operation, error = %err, "audit write failed");
    }
}

fn require_need(store: &DataStore, id: Uuid) -> Result<&BusinessNeed> {
    store
        .business_need_by_id(id)
        .with_context(|| format!("no business need with id {id}"))
}

fn require_company<'a>(store: &'a DataStore, name: &str) -> Result<&'a Company> {
    store
        .company_by_name(name)
        .with_context(|| format!("no company named `{name}`"))
}

fn require_connection(store: &DataStore, id: Uuid) -> Result<&Connection> {
    store
        .connection_by_id(id)
        .with_context(|| format!("no connection with id {id}"))
}

fn print_email(email: &outreach::RenderedEmail) {
    println!("Subject: {}\n\n{}", email.subject, email.body);
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = StoreConfig::from_env();
    if let Some(path) = cli.data_file {
        config.data_file = path;
    }
    if let Some(path) = cli.audit_log {
        config.audit_log = path;
    }
    if cli.sectors_file.is_some() {
        config.sectors_file = cli.sectors_file;
    }

    let mut store = DataStore::open(&config.data_file).await?;
    let audit = AuditLog::new(&config.audit_log);
    let ranker = MatchRanker::with_table(
        config
            .sector_table()
            .context("loading sector affinity table")?,
    );

    match cli.command {
        Commands::Seed => {
            let summary = store.load_sample_data().await?;
            println!(
                "seeded: companies={} contacts={} needs={} connections={}",
                summary.companies, summary.contacts, summary.business_needs, summary.connections
            );
        }
        Commands::Clear { yes } => {
            if !yes {
                bail!("refusing to clear {} without --yes", store.path().display());
            }
            store.clear().await?;
            println!("cleared {}", store.path().display());
        }
        Commands::Companies { sector } => {
            let wanted = sector.as_deref().map(Sector::parse);
            let companies: Vec<&Company> = store
                .companies()
                .iter()
                .filter(|c| wanted.as_ref().map_or(true, |w| c.sector() == Some(w)))
                .collect();
            if cli.json {
                print_json(&companies)?;
            } else {
                for c in companies {
                    println!(
                        "{:<28} {:<14} {:<9} {}",
                        c.name,
                        c.sector().map(Sector::as_str).unwrap_or("-"),
                        c.size.map(|s| s.as_str()).unwrap_or("-"),
                        c.location
                    );
                }
            }
        }
        Commands::AddCompany(args) => {
            let mut company = Company::new(args.name.trim())
                .with_location(args.location)
                .with_description(args.description)
                .with_tags(
                    args.tags
                        .iter()
                        .map(|t| t.trim())
                        .filter(|t| !t.is_empty()),
                );
            if let Some(sector) = args.sector {
                company = company.with_sector(sector);
            }
            if let Some(size) = args.size {
                company = company.with_size(size);
            }
            company.website = args.website;
            company.founded_year = args.founded_year;

            let entry = LogEntry::company_created(&company, &args.note);
            store.add_company(company).await?;
            record(&audit, entry).await;
            println!("added company {}", args.name.trim());
        }
        Commands::Contacts { company } => {
            let contacts: Vec<&Contact> = match &company {
                Some(name) => store.contacts_for(name),
                None => store.contacts().iter().collect(),
            };
            if cli.json {
                print_json(&contacts)?;
            } else {
                for c in contacts {
                    println!("{}  {:<20} {:<36} {}", c.id, c.name, c.email, c.company_name);
                }
            }
        }
        Commands::AddContact(args) => {
            if store.company_by_name(&args.company).is_none() {
                warn!(company = %args.company, "contact added for a company not in the catalog");
            }
            let mut contact = Contact::new(args.name, args.email, args.company);
            contact.position = args.position;
            contact.phone = args.phone;
            contact.role_type = args.role;

            let entry = LogEntry::contact_created(&contact, &args.note);
            let id = contact.id;
            store.add_contact(contact).await?;
            record(&audit, entry).await;
            println!("added contact {id}");
        }
        Commands::Needs { all } => {
            let needs: Vec<&BusinessNeed> = if all {
                store.business_needs().iter().collect()
            } else {
                store.active_needs()
            };
            if cli.json {
                print_json(&needs)?;
            } else {
                for n in needs {
                    println!(
                        "{}  [{}] {:<24} {} ({})",
                        n.id,
                        n.status.as_str(),
                        n.company_name,
                        n.title,
                        n.role().map(|r| r.as_str()).unwrap_or("-")
                    );
                }
            }
        }
        Commands::AddNeed(args) => {
            let mut need =
                BusinessNeed::new(args.company, args.title, NeedType::parse(&args.need_type))
                    .with_target_sectors(
                        args.target_sectors
                            .iter()
                            .map(|s| s.trim())
                            .filter(|s| !s.is_empty()),
                    )
                    .with_priority(args.priority)
                    .with_description(args.description);
            if let Some(role) = args.looking_for {
                need = need.looking_for(role);
            }
            if let Some(budget) = args.budget {
                need = need.with_budget(budget);
            }
            if let Some(timeline) = args.timeline {
                need = need.with_timeline(timeline);
            }

            let entry = LogEntry::business_need_created(&need, &args.note);
            let id = need.id;
            store.add_business_need(need).await?;
            record(&audit, entry).await;
            println!("added business need {id}");
        }
        Commands::Matches { need_id } => {
            let need = require_need(&store, need_id)?;
            let matches = ranker.find_matches(need, store.companies());
            if cli.json {
                print_json(&matches)?;
            } else if matches.is_empty() {
                println!(
                    "no companies scored above {:.0}%",
                    RankerConfig::default().min_score * 100.0
                );
            } else {
                for m in &matches {
                    println!("{:>5.1}%  {}", m.score * 100.0, m.company.name);
                    for reason in &m.reasons {
                        println!("        - {reason}");
                    }
                }
            }
        }
        Commands::Explain { need_id, company } => {
            let need = require_need(&store, need_id)?;
            let company = require_company(&store, &company)?;
            print!("{}", ranker.scorer().explain(need, company));
        }
        Commands::Connect { need_id, company } => {
            let need = require_need(&store, need_id)?.clone();
            let Some(accepted) = ranker
                .find_matches(&need, store.companies())
                .into_iter()
                .find(|m| m.company.name == company)
            else {
                bail!("`{company}` is not among the ranked matches for this need");
            };
            let connection = initiate(&need, &accepted, Utc::now());
            let entry = LogEntry::connection_created(&connection, "");
            let id = connection.id;
            store.add_connection(connection).await?;
            record(&audit, entry).await;
            info!(connection_id = %id, score = accepted.score, "connection opened");
            println!("opened connection {id} ({:.0}%)", accepted.score * 100.0);
        }
        Commands::Connections { status } => {
            let connections: Vec<&Connection> = match status {
                Some(label) => filter_by_status(store.connections(), label.parse()?),
                None => store.connections().iter().collect(),
            };
            if cli.json {
                print_json(&connections)?;
            } else {
                for c in connections {
                    println!(
                        "{}  {:<18} {:>4.0}%  {} -> {}",
                        c.id,
                        c.status.as_str(),
                        c.match_score * 100.0,
                        c.from_entity,
                        c.to_entity
                    );
                }
            }
        }
        Commands::Status {
            connection_id,
            status,
        } => {
            if !store.update_connection_status(connection_id, &status).await? {
                bail!("no connection with id {connection_id}");
            }
            println!("connection {connection_id} is now {}", status.trim());
        }
        Commands::Note {
            connection_id,
            text,
        } => {
            if !store
                .add_connection_note(connection_id, &text, Utc::now())
                .await?
            {
                bail!("no connection with id {connection_id}");
            }
            println!("note added");
        }
        Commands::Notes { connection_id } => {
            let connection = require_connection(&store, connection_id)?;
            for entry in parse_notes(&connection.notes) {
                match entry.timestamp {
                    Some(ts) => println!("[{}] {}", ts.format("%Y-%m-%d %H:%M"), entry.text),
                    None => println!("{}", entry.text),
                }
            }
        }
        Commands::Actions { status } => {
            let status: ConnectionStatus = status.parse()?;
            for action in next_actions(status) {
                println!("- {action}");
            }
        }
        Commands::Stats => {
            let stats = connection_statistics(store.connections());
            let sectors = companies_by_sector(store.companies());
            let totals = store.totals();
            if cli.json {
                print_json(&StatsReport {
                    totals,
                    connections: &stats,
                    companies_by_sector: &sectors,
                })?;
            } else {
                println!("companies: {}", totals.companies);
                println!("contacts: {}", totals.contacts);
                println!("active needs: {}", totals.active_needs);
                println!("connections: {}", stats.total);
                println!("success rate: {:.1}%", stats.success_rate);
                println!("average match score: {:.1}%", stats.average_score);
                for (status, count) in &stats.by_status {
                    println!("  {status:<18} {count}");
                }
                println!("companies by sector:");
                for (sector, count) in &sectors {
                    println!("  {sector:<18} {count}");
                }
            }
        }
        Commands::Variables { template } => {
            let template: TemplateName = template.parse()?;
            for name in outreach::required_variables(template) {
                println!("{name}");
            }
        }
        Commands::Render { template, vars } => {
            let template: TemplateName = template.parse()?;
            let vars: BTreeMap<String, String> = vars.into_iter().collect();
            let missing = outreach::missing_variables(template, &vars);
            if !missing.is_empty() {
                bail!("missing variables: {}", missing.join(", "));
            }
            print_email(&outreach::render(template, &vars)?);
        }
        Commands::Outreach {
            connection_id,
            sender,
        } => {
            let connection = require_connection(&store, connection_id)?;
            let need = require_need(&store, connection.business_need_id)?;
            let target = require_company(&store, &connection.to_entity)?;
            let contact = store.contacts_for(&target.name).into_iter().next();
            let sender = SenderInfo {
                name: sender.sender_name,
                title: sender.sender_title,
                email: sender.sender_email,
            };
            print_email(&outreach::initial_outreach(need, target, &sender, contact)?);
        }
        Commands::FollowUp {
            connection_id,
            days,
            ordinal,
            sender_name,
        } => {
            let Some(task) = store
                .schedule_follow_up(connection_id, days, Utc::now())
                .await?
            else {
                bail!("no connection with id {connection_id}");
            };
            let connection = require_connection(&store, connection_id)?;
            let contact = store
                .contacts_for(&connection.to_entity)
                .into_iter()
                .next()
                .map(|c| c.name.as_str());
            println!(
                "follow-up {} scheduled for {}\n",
                task.id,
                task.scheduled_date.format("%Y-%m-%d")
            );
            print_email(&outreach::follow_up(
                connection,
                ordinal.max(1),
                contact,
                &sender_name,
            )?);
        }
        Commands::Introduce {
            connection_id,
            introducer,
        } => {
            let connection = require_connection(&store, connection_id)?;
            let party = |name: &str| PartyInfo {
                name: name.to_string(),
                description: store
                    .company_by_name(name)
                    .map(|c| c.description.clone())
                    .unwrap_or_default(),
            };
            let email = outreach::introduction(
                connection,
                &party(&connection.from_entity),
                &party(&connection.to_entity),
                &introducer,
            )?;
            print_email(&email);
        }
        Commands::DeleteCompany {
            name,
            reason,
            actor,
        } => {
            match delete_company(&mut store, &audit, &name, &reason, actor.as_deref()).await? {
                Some(report) => {
                    if cli.json {
                        print_json(&report)?;
                    } else {
                        println!(
                            "deleted {}: contacts removed={} needs deactivated={} audited={}",
                            report.company.name,
                            report.contacts_removed,
                            report.needs_deactivated,
                            report.audit_recorded
                        );
                    }
                }
                None => bail!("no company named `{name}`"),
            }
        }
        Commands::Logs { lines, search } => {
            let entries = match search {
                Some(term) => audit.search(&term).await?,
                None => audit.recent(lines).await?,
            };
            if cli.json {
                print_json(&entries)?;
            } else if entries.is_empty() {
                println!("no matching entries found");
            } else {
                for e in entries {
                    let actor = e.actor.as_deref().unwrap_or("-");
                    println!(
                        "[{}] {:<22} {:<28} by {actor}  {}",
                        e.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        e.operation.as_str(),
                        e.subject_name,
                        e.note
                    );
                }
            }
        }
    }

    Ok(())
}
