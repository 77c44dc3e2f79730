use std::path::Path;

use clap::Args;
use exercise_snack_core::{status, Config, MessagePool, ReminderScheduler};

use super::{resolve_now, CliResult};

#[derive(Args)]
pub struct StatusArgs {
    /// Evaluate at this time instead of now (RFC 3339 or HH:MM)
    #[arg(long)]
    at: Option<String>,
    /// Print the status as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(config_path: &Path, args: StatusArgs) -> CliResult {
    let config = Config::load_from(config_path)?;
    let now = resolve_now(args.at.as_deref())?;

    let mut scheduler = ReminderScheduler::new(MessagePool::with_default_catalog(None));
    scheduler.reschedule(&config.schedule, &now);
    let current = status(&config.schedule, &scheduler, &now);

    if args.json {
        let value = serde_json::json!({
            "state": current,
            "text": current.to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{current}");
    }
    Ok(())
}
