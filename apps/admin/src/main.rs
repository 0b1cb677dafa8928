use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    load_dashboard, AutoConfirm, CollectionEndpoint, Confirmation, Entity, EntityScreen,
    FieldKind, HttpCollectionEndpoint, NotificationLevel, ScreenEvent,
};
use shared::{
    domain::EntityKind,
    format::format_active,
    protocol::{Course, Enrollment, Person},
};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    sync::broadcast,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, normalize_base_url, DEFAULT_CONFIG_FILE};

/// Terminal front end for the La Música school back office.
#[derive(Parser, Debug)]
#[command(name = "admin", version)]
struct Args {
    /// Overrides the configured API base url.
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Totals for people, courses and enrollments.
    Dashboard,
    List {
        entity: EntityArg,
        #[arg(long)]
        filter: Option<String>,
    },
    Create {
        entity: EntityArg,
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },
    Update {
        entity: EntityArg,
        id: i64,
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },
    Delete {
        entity: EntityArg,
        id: i64,
        /// Skips the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Flips a course between active and inactive.
    ToggleStatus { id: i64 },
    /// Lists the form fields accepted by `--set`.
    Fields { entity: EntityArg },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EntityArg {
    People,
    Courses,
    Enrollments,
}

impl From<EntityArg> for EntityKind {
    fn from(arg: EntityArg) -> Self {
        match arg {
            EntityArg::People => EntityKind::Person,
            EntityArg::Courses => EntityKind::Course,
            EntityArg::Enrollments => EntityKind::Enrollment,
        }
    }
}

/// Per-entity commands; run through [`run_entity`] for the matching record type.
#[derive(Debug)]
enum EntityAction {
    List { filter: Option<String> },
    Create { set: Vec<(String, String)> },
    Update { id: i64, set: Vec<(String, String)> },
    Delete { id: i64, yes: bool },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = load_settings(&args.config)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let raw_url = args.api_url.as_deref().unwrap_or(&settings.api_base_url);
    let base_url = normalize_base_url(raw_url)?;
    info!(%base_url, "using API");
    let endpoint: Arc<dyn CollectionEndpoint> = Arc::new(
        HttpCollectionEndpoint::new(&base_url)
            .with_context(|| format!("cannot use API base url '{base_url}'"))?,
    );

    match args.command {
        Command::Dashboard => print_dashboard(endpoint.as_ref()).await,
        Command::Fields { entity } => {
            print_fields(entity.into());
            Ok(())
        }
        Command::ToggleStatus { id } => toggle_course(endpoint, id).await,
        Command::List { entity, filter } => {
            dispatch(endpoint, entity, EntityAction::List { filter }).await
        }
        Command::Create { entity, set } => {
            dispatch(endpoint, entity, EntityAction::Create { set }).await
        }
        Command::Update { entity, id, set } => {
            dispatch(endpoint, entity, EntityAction::Update { id, set }).await
        }
        Command::Delete { entity, id, yes } => {
            dispatch(endpoint, entity, EntityAction::Delete { id, yes }).await
        }
    }
}

async fn dispatch(
    endpoint: Arc<dyn CollectionEndpoint>,
    entity: EntityArg,
    action: EntityAction,
) -> Result<()> {
    match entity {
        EntityArg::People => run_entity::<Person>(endpoint, action).await,
        EntityArg::Courses => run_entity::<Course>(endpoint, action).await,
        EntityArg::Enrollments => run_entity::<Enrollment>(endpoint, action).await,
    }
}

async fn run_entity<E: Entity>(
    endpoint: Arc<dyn CollectionEndpoint>,
    action: EntityAction,
) -> Result<()> {
    let mut screen = EntityScreen::<E>::new(endpoint);
    let mut events = screen.subscribe();
    let loaded = screen.load().await;
    report(&mut events);
    loaded.with_context(|| format!("failed to load {}", E::KIND.plural_label()))?;

    let result = match action {
        EntityAction::List { filter } => {
            let visible = screen.filter(filter.as_deref().unwrap_or_default());
            print!("{}", render_table(E::columns(), visible.iter().map(|r| r.cells())));
            eprintln!("{} of {} {}", visible.len(), screen.records().len(), E::KIND.plural_label());
            Ok(())
        }
        EntityAction::Create { set } => {
            screen.start_create();
            submit_with(&mut screen, &set).await
        }
        EntityAction::Update { id, set } => {
            if !screen.start_edit_by_id(id) {
                bail!("no {} with id {id}", E::KIND.singular_label());
            }
            submit_with(&mut screen, &set).await
        }
        EntityAction::Delete { id, yes } => {
            let confirmation: &dyn Confirmation = if yes { &AutoConfirm } else { &StdinConfirmation };
            screen.remove(id, confirmation).await.map(|_| ())
        }
    };
    report(&mut events);
    result.map_err(Into::into)
}

async fn submit_with<E: Entity>(
    screen: &mut EntityScreen<E>,
    assignments: &[(String, String)],
) -> client_core::error::Result<()> {
    for (field, value) in assignments {
        screen.set_field(field, value.as_str())?;
    }
    screen.submit().await.map(|_| ())
}

async fn toggle_course(endpoint: Arc<dyn CollectionEndpoint>, id: i64) -> Result<()> {
    let mut screen = EntityScreen::<Course>::new(endpoint);
    let mut events = screen.subscribe();
    let loaded = screen.load().await;
    report(&mut events);
    loaded.context("failed to load courses")?;

    let Some(course) = screen.record(id).cloned() else {
        bail!("no course with id {id}");
    };
    let result = screen.toggle_status(&course).await;
    report(&mut events);
    let active = result?;
    println!("{} is now {}", course.name, format_active(active));
    Ok(())
}

async fn print_dashboard(endpoint: &dyn CollectionEndpoint) -> Result<()> {
    let stats = load_dashboard(endpoint)
        .await
        .context("failed to load dashboard")?;
    let rows = [
        ("Total de Pessoas", stats.total_people),
        ("Total de Cursos", stats.total_courses),
        ("Cursos Ativos", stats.active_courses),
        ("Total de Matrículas", stats.total_enrollments),
    ]
    .into_iter()
    .map(|(label, value)| vec![label.to_string(), value.to_string()]);
    print!("{}", render_table(&["Indicador", "Total"], rows));
    Ok(())
}

fn print_fields(kind: EntityKind) {
    let fields = match kind {
        EntityKind::Person => Person::form_fields(),
        EntityKind::Course => Course::form_fields(),
        EntityKind::Enrollment => Enrollment::form_fields(),
    };
    let rows = fields.iter().map(|field| {
        vec![
            field.name.to_string(),
            field.label.to_string(),
            describe_kind(field.kind),
            if field.required { "yes" } else { "no" }.to_string(),
            field.default.to_string(),
        ]
    });
    print!(
        "{}",
        render_table(&["Field", "Label", "Kind", "Required", "Default"], rows)
    );
}

fn describe_kind(kind: FieldKind) -> String {
    match kind {
        FieldKind::Text => "text".into(),
        FieldKind::Date => "date (yyyy-mm-dd)".into(),
        FieldKind::Decimal => "decimal".into(),
        FieldKind::Integer => "integer".into(),
        FieldKind::Reference(target) => format!("{} id", target.singular_label()),
        FieldKind::Choice(choices) => choices.join("|"),
        FieldKind::Flag => "true|false".into(),
    }
}

/// Prints pending notifications to stderr.
fn report(events: &mut broadcast::Receiver<ScreenEvent>) {
    while let Ok(event) = events.try_recv() {
        if let ScreenEvent::Notification(notification) = event {
            let marker = match notification.level {
                NotificationLevel::Success => "ok",
                NotificationLevel::Error => "!!",
            };
            eprintln!(
                "[{marker}] {}: {}",
                notification.title, notification.description
            );
        }
    }
}

/// Left-aligned text table; column widths count characters, not bytes.
fn render_table<I>(headers: &[&str], rows: I) -> String
where
    I: IntoIterator<Item = Vec<String>>,
{
    let rows: Vec<Vec<String>> = rows.into_iter().collect();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    let mut out = render_line(headers.iter().copied(), &widths);
    out.push_str(&render_line(rule.iter().map(String::as_str), &widths));
    for row in &rows {
        out.push_str(&render_line(row.iter().map(String::as_str), &widths));
    }
    out
}

fn render_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell}{}", " ".repeat(width - cell.chars().count())))
        .collect();
    format!("{}\n", padded.join("  ").trim_end())
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected FIELD=VALUE, got '{raw}'")),
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "s" | "sim"
    )
}

/// Reads a `[y/N]` answer from stdin; anything but yes declines.
struct StdinConfirmation;

#[async_trait]
impl Confirmation for StdinConfirmation {
    async fn confirm(&self, prompt: &str) -> bool {
        let mut stderr = tokio::io::stderr();
        if stderr
            .write_all(format!("{prompt} [y/N] ").as_bytes())
            .await
            .is_err()
        {
            return false;
        }
        let _ = stderr.flush().await;

        let mut answer = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        match stdin.read_line(&mut answer).await {
            Ok(_) => is_affirmative(&answer),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
