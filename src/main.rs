// src/main.rs
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use shiftboard_core::config::Config;
use shiftboard_core::group_assigner::GroupRangeRule;
use shiftboard_core::schedule_parser::serialize;
use shiftboard_core::schedule_state::{
    current_day_label, status_message, ScheduleState, StatusOutcome,
};
use shiftboard_core::server::{self, AppState};
use shiftboard_core::storage::JsonFileStore;
use shiftboard_core::views::{
    compare_view, daily_summary, individual_view, table_rows, CompareRow, DailySummary, DayCell,
    IndividualView, TableRow,
};
use shiftboard_core::work_stats::{monthly_norm, WorkStats};

const TICK_INTERVAL: Duration = Duration::from_secs(60);

// --- CLI Definition ---

#[derive(Parser, Debug)]
#[command(name = "shiftboard", version, about = "Monthly shift schedule viewer")]
struct Cli {
    /// JSON file backing the local store (overrides SHIFTBOARD_STORE_PATH)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a semicolon-delimited schedule export
    Import { file: PathBuf },
    /// Print the full table, optionally filtered by name
    Table {
        #[arg(long, default_value = "")]
        filter: String,
    },
    /// Daily summary for a day (defaults to the current work day)
    Day { day: Option<u32> },
    /// Individual view for one employee
    Employee { name: String },
    /// Compare two or more employees
    Compare {
        #[arg(required = true, num_args = 1..)]
        names: Vec<String>,
    },
    /// Switch the displayed month
    Month { year: i32, month: u32 },
    /// List group rules
    Groups,
    /// Edit a group rule: "1-6", "last:24" or "before:14:Y"
    SetGroup {
        code: String,
        #[arg(value_parser = parse_rule)]
        rule: GroupRangeRule,
    },
    /// Restore the default group rules
    ResetGroups,
    /// Toggle light/dark theme
    Theme,
    /// Remove the stored schedule
    Clear,
    /// Write the roster back out in import format
    Export { file: Option<PathBuf> },
    /// Follow the work-day clock and reprint the summary when it changes
    Watch,
    /// Serve the JSON API
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
}

fn parse_rule(raw: &str) -> Result<GroupRangeRule, String> {
    let parts: Vec<&str> = raw.split(':').collect();
    let number = |s: &str| {
        s.trim()
            .parse::<u32>()
            .map_err(|_| format!("'{}' is not a positive number", s))
    };

    match parts.as_slice() {
        ["last", count] => Ok(GroupRangeRule::LastN {
            count: number(*count)?,
        }),
        ["before", count, reference] => Ok(GroupRangeRule::BeforeGroup {
            count: number(*count)?,
            reference: reference.trim().to_string(),
        }),
        [range] => {
            let range: &str = range;
            let (from, to) = range.split_once('-').unwrap_or((range, range));
            Ok(GroupRangeRule::Fixed {
                from: number(from)?,
                to: number(to)?,
            })
        }
        _ => Err(format!("unrecognized rule '{}'", raw)),
    }
}

// --- Main Application Logic ---

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // --- Setup ---
    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(store) = cli.store {
        config.store_path = store;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Setting default subscriber failed")?;

    let mut store = JsonFileStore::open(&config.store_path);
    let now = chrono::Local::now().naive_local();
    let mut state = ScheduleState::load(&store, config.default_month, now)
        .context("Failed to restore schedule state")?;
    if state.has_data() {
        info!("{}", status_message(&StatusOutcome::Restored(state.roster().len())));
    }

    match cli.command {
        Command::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let filename = file.file_name().and_then(|n| n.to_str());
            match state.import(&mut store, &text, filename, now) {
                Ok(count) => println!("{}", status_message(&StatusOutcome::Imported(count))),
                Err(e) => {
                    println!("{}", status_message(&StatusOutcome::Failed(e.to_string())));
                    return Err(e.into());
                }
            }
        }
        Command::Table { filter } => {
            ensure_data(&state)?;
            let rows = table_rows(state.roster(), state.month(), state.rules(), &filter);
            if rows.is_empty() {
                println!("Nie znaleziono pracownika o podanej nazwie.");
            }
            print_table(&rows);
        }
        Command::Day { day } => {
            ensure_data(&state)?;
            if let Some(day) = day {
                state.select_day(day)?;
            }
            println!("{}", current_day_label(now));
            let summary =
                daily_summary(state.roster(), state.selected_day(), state.month(), state.rules())?;
            print_day(&summary, state.month().month);
        }
        Command::Employee { name } => {
            let view = individual_view(state.roster(), &name, state.month())?;
            print_employee(&view);
        }
        Command::Compare { names } => {
            for name in &names {
                state.select(name)?;
            }
            if !state.can_compare() {
                bail!("Select at least two distinct employees to compare");
            }
            let rows = compare_view(state.roster(), state.selected(), state.month(), state.rules())?;
            print_compare(&rows);
        }
        Command::Month { year, month } => {
            state.set_month(&mut store, year, month)?;
            let ctx = state.month();
            println!("{}/{}: {} days", ctx.month, ctx.year, ctx.days_in_month);
        }
        Command::Groups => {
            for rule in state.rules().iter() {
                let range = state.rules().resolve_range(&rule.rule, state.roster().len());
                println!(
                    "{:<3} {:?} -> rows {}..{}",
                    rule.code,
                    rule.rule,
                    range.start + 1,
                    range.end
                );
            }
        }
        Command::SetGroup { code, rule } => {
            state.update_group_rule(&mut store, &code, rule)?;
            println!("Updated group {}", code);
        }
        Command::ResetGroups => {
            state.reset_group_rules(&mut store);
            println!("Group rules restored to defaults");
        }
        Command::Theme => {
            let theme = state.toggle_theme(&mut store);
            println!("Theme: {}", theme.as_str());
        }
        Command::Clear => {
            if !state.has_data() {
                warn!("Nothing to clear");
                return Ok(());
            }
            state.clear(&mut store);
            println!("{}", status_message(&StatusOutcome::Cleared));
        }
        Command::Export { file } => {
            ensure_data(&state)?;
            let text = serialize(state.roster(), state.month())?;
            match file {
                Some(path) => {
                    std::fs::write(&path, text)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Exported {} employees to {}", state.roster().len(), path.display());
                }
                None => print!("{}", text),
            }
        }
        Command::Watch => {
            ensure_data(&state)?;
            watch(&mut state).await?;
        }
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server_port = port;
            }
            let addr = config.bind_address();
            let app_state = AppState::new(state, Box::new(store));
            server::serve(app_state, &addr).await?;
        }
    }

    Ok(())
}

fn ensure_data(state: &ScheduleState) -> anyhow::Result<()> {
    if !state.has_data() {
        bail!("Brak danych. Użyj polecenia 'import' aby załadować harmonogram.");
    }
    Ok(())
}

async fn watch(state: &mut ScheduleState) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(TICK_INTERVAL);
    let mut first = true;
    info!("Watching work day, checking every {:?}", TICK_INTERVAL);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = chrono::Local::now().naive_local();
                if state.tick(now) || first {
                    first = false;
                    println!("{}", current_day_label(now));
                    let summary = daily_summary(
                        state.roster(),
                        state.selected_day(),
                        state.month(),
                        state.rules(),
                    )?;
                    print_day(&summary, state.month().month);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping watch");
                return Ok(());
            }
        }
    }
}

// --- Output ---

fn group_badge(group: Option<&str>) -> String {
    group
        .map(|g| format!("[{}]", g))
        .unwrap_or_default()
}

fn print_schedule_line(group: Option<&str>, name: &str, stats: &WorkStats, cells: &[DayCell]) {
    let tokens: Vec<&str> = cells
        .iter()
        .map(|c| if c.token.is_empty() { "." } else { c.token.as_str() })
        .collect();
    println!(
        "{:<4}{:<28}{:>3}dni • {:>3}h  {}",
        group_badge(group),
        name,
        stats.work_days,
        stats.total_hours,
        tokens.join(" ")
    );
}

fn print_table(rows: &[TableRow]) {
    for row in rows {
        print_schedule_line(row.group.as_deref(), &row.name, &row.stats, &row.cells);
    }
}

fn print_day(summary: &DailySummary, month: u32) {
    let month_name = monthly_norm(month).map(|n| n.name).unwrap_or_default();
    println!("Podsumowanie dzienne: {} {}", summary.day, month_name);
    if summary.buckets.is_empty() {
        println!("Brak danych dla tego dnia.");
        return;
    }
    for bucket in &summary.buckets {
        println!("{} ({})", bucket.label, bucket.entries.len());
        for entry in &bucket.entries {
            println!("  {}{} {}", group_badge(entry.group.as_deref()), entry.name, entry.token);
        }
    }
}

fn print_employee(view: &IndividualView) {
    println!("{}", view.name);
    println!(
        "Dni pracy: {}  Suma godzin: {}h",
        view.stats.work_days, view.stats.total_hours
    );
    if let Some(norm) = &view.norm {
        println!(
            "Norma {}: {}h ({} dni po 12h)",
            norm.name,
            norm.hours,
            norm.shift_days()
        );
    }
    for (label, tally) in view.breakdown.chart_entries() {
        if tally.days > 0 {
            println!("  {:<26} {} dni • {}h", label, tally.days, tally.hours);
        }
    }

    let mut line = "    ".repeat(view.leading_blanks as usize);
    for cell in &view.calendar {
        let token = if cell.token.is_empty() { "-" } else { cell.token.as_str() };
        line.push_str(&format!("{:>2}:{:<4}", cell.day, token));
        if (view.leading_blanks + cell.day) % 7 == 0 {
            println!("{}", line.trim_end());
            line.clear();
        }
    }
    if !line.is_empty() {
        println!("{}", line.trim_end());
    }
}

fn print_compare(rows: &[CompareRow]) {
    println!("Porównanie harmonogramów ({} pracowników)", rows.len());
    for row in rows {
        print_schedule_line(row.group.as_deref(), &row.name, &row.stats, &row.cells);
    }
}
