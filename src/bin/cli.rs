use anyhow::Context;
use chrono::NaiveDate;
use household_scheduler::{
    DayDisposition, DaySchedule, HouseholdStore, PersistenceError, PlannerConfig, PlannerService,
    SharedPlanner, SqliteHouseholdStore, Task, cyprus_holidays, import_household,
    load_household_from_json, logging, save_days_to_csv, save_days_to_json,
};
use std::io::{self, Write};
use std::sync::Arc;

const TASK_COLUMNS: [&str; 7] = ["id", "kind", "time", "end", "minutes", "title", "done"];

fn task_row(task: &Task) -> Vec<String> {
    vec![
        task.id.to_string(),
        task.kind.to_string(),
        task.time.clone().unwrap_or_default(),
        task.end_time.clone().unwrap_or_default(),
        task.duration_minutes.to_string(),
        if task.description.is_empty() {
            task.title.clone()
        } else {
            format!("{} ({})", task.title, task.description)
        },
        if task.completed { "x" } else { "" }.to_string(),
    ]
}

fn render_row(widths: &[usize], cells: &[&str]) -> String {
    let mut line = String::from("|");
    for (cell, width) in cells.iter().zip(widths) {
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(width.saturating_sub(cell.chars().count())));
        line.push_str(" |");
    }
    line
}

fn render_tasks_as_text_table(tasks: &[Task]) -> String {
    let rows: Vec<Vec<String>> = tasks.iter().map(task_row).collect();

    let mut widths: Vec<usize> = TASK_COLUMNS.iter().map(|name| name.len()).collect();
    for row in &rows {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&widths, &TASK_COLUMNS));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&render_row(&widths, &cells));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_day(day: &DaySchedule) {
    println!(
        "Schedule for {} ({} tasks, {} done)",
        day.date,
        day.tasks.len(),
        day.completed_count()
    );
    print!("{}", render_tasks_as_text_table(&day.tasks));
}

fn print_help() {
    println!(
        "Commands:\n  help                                     Show this help\n  import <json_path>                       Import household configuration\n  holidays <year>                          Seed national holidays for a year\n  generate <YYYY-MM-DD>                    Generate one day\n  next <n>                                 Generate the next n days from today\n  show <YYYY-MM-DD>                        Show a day's tasks\n  complete <task_id>                       Mark a task done\n  uncomplete <task_id>                     Mark a task not done\n  regenerate <n>                           Clear and regenerate the next n days\n  export <json|csv> <path> <YYYY-MM-DD> <days>\n                                           Export stored days to a file\n  quit|exit                                Exit"
    );
}

fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    value.and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
}

fn print_disposition(disposition: &DayDisposition) {
    match disposition {
        DayDisposition::Generated(day) => {
            println!(
                "Generated {}: {} tasks ({} meals, {} cleaning, {} childcare)",
                day.date,
                day.total_tasks(),
                day.meal_tasks,
                day.cleaning_tasks,
                day.childcare_tasks
            );
            for warning in &day.warnings {
                println!("  warning: {warning}");
            }
        }
        DayDisposition::SkippedHoliday { date, reason } => {
            println!("Skipped {date}: {reason}");
        }
        DayDisposition::SkippedDuplicate { date } => {
            println!("Schedule for {date} already exists.");
        }
    }
}

fn set_completed(planner: &SharedPlanner, id_s: Option<&str>, completed: bool) {
    let Some(id) = id_s.and_then(|s| s.parse::<i64>().ok()) else {
        println!(
            "Usage: {} <task_id>",
            if completed { "complete" } else { "uncomplete" }
        );
        return;
    };
    let result = if completed {
        planner.complete_task(id)
    } else {
        planner.uncomplete_task(id)
    };
    match result {
        Ok(task) if task.completed => println!("Task {id} marked complete."),
        Ok(_) => println!("Task {id} marked not complete."),
        Err(PersistenceError::TaskNotFound(_)) => println!("Task {id} not found."),
        Err(e) => println!("Error: {e}"),
    }
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let config = PlannerConfig::from_env()?;
    let store = SqliteHouseholdStore::new(&config.database_path)
        .with_context(|| format!("opening database {}", config.database_path.display()))?;
    let store: Arc<dyn HouseholdStore> = Arc::new(store);
    let planner: SharedPlanner = PlannerService::new(store);

    println!(
        "Household Planner (CLI) - database {} - type 'help' for commands\n",
        config.database_path.display()
    );

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "import" => match parts.next() {
                Some(path) => match load_household_from_json(path)
                    .and_then(|snapshot| import_household(planner.store().as_ref(), snapshot))
                {
                    Ok(summary) => println!("Imported {}", summary.to_cli_summary()),
                    Err(e) => println!("Import error: {e}"),
                },
                None => println!("Usage: import <json_path>"),
            },
            "holidays" => match parts.next().and_then(|s| s.parse::<i32>().ok()) {
                Some(year) => match planner.seed_holidays(cyprus_holidays(year)) {
                    Ok(added) => println!("Seeded {added} holidays for {year}."),
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Usage: holidays <year>"),
            },
            "generate" => match parse_date(parts.next()) {
                Some(date) => match planner.generate_for_date(date) {
                    Ok(disposition) => print_disposition(&disposition),
                    Err(e) => println!(
                        "Generation error for {} during {}: {}",
                        e.date(),
                        e.step(),
                        e.persistence_error()
                    ),
                },
                None => println!("Usage: generate <YYYY-MM-DD>"),
            },
            "next" => match parts.next().and_then(|s| s.parse::<u32>().ok()) {
                Some(days) => {
                    let report = planner.generate_for_next_days(days);
                    println!("Done ({})", report.to_cli_summary());
                }
                None => println!("Usage: next <n>"),
            },
            "regenerate" => match parts.next().and_then(|s| s.parse::<u32>().ok()) {
                Some(days) => match planner.regenerate(planner.today(), days) {
                    Ok(result) => println!(
                        "Cleared {} day(s); regenerated ({})",
                        result.cleared,
                        result.report.to_cli_summary()
                    ),
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Usage: regenerate <n>"),
            },
            "show" => match parse_date(parts.next()) {
                Some(date) => match planner.day(date) {
                    Ok(Some(day)) => print_day(&day),
                    Ok(None) => println!("No schedule for {date}."),
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Usage: show <YYYY-MM-DD>"),
            },
            "complete" => set_completed(&planner, parts.next(), true),
            "uncomplete" => set_completed(&planner, parts.next(), false),
            "export" => {
                let fmt = parts.next();
                let path = parts.next();
                let start = parse_date(parts.next());
                let days = parts.next().and_then(|s| s.parse::<u32>().ok());
                match (fmt, path, start, days) {
                    (Some(fmt @ ("json" | "csv")), Some(path), Some(start), Some(days)) => {
                        let result = planner.upcoming(start, days).and_then(|schedules| {
                            if fmt == "json" {
                                save_days_to_json(&schedules, path)?;
                            } else {
                                save_days_to_csv(&schedules, path)?;
                            }
                            Ok(schedules.len())
                        });
                        match result {
                            Ok(count) => println!("Exported {count} day(s) to {path}"),
                            Err(e) => println!("Export error: {e}"),
                        }
                    }
                    _ => println!("Usage: export <json|csv> <path> <YYYY-MM-DD> <days>"),
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }

    Ok(())
}
