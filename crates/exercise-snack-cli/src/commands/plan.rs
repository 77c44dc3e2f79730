use std::path::Path;

use chrono::Local;
use clap::Args;
use exercise_snack_core::{Config, MessagePool, NotificationRequest, ReminderScheduler, Trigger};

use super::{resolve_now, CliResult};

#[derive(Args)]
pub struct PlanArgs {
    /// Evaluate at this time instead of now (RFC 3339 or HH:MM)
    #[arg(long)]
    at: Option<String>,
    /// Fix the message rotation seed
    #[arg(long)]
    seed: Option<u64>,
    /// Print notification descriptors as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(config_path: &Path, args: PlanArgs) -> CliResult {
    let config = Config::load_from(config_path)?;
    let now = resolve_now(args.at.as_deref())?;

    let mut scheduler = ReminderScheduler::new(MessagePool::with_default_catalog(args.seed));
    scheduler.reschedule(&config.schedule, &now);
    let requests: Vec<NotificationRequest> = scheduler
        .pending()
        .sorted()
        .into_iter()
        .map(NotificationRequest::for_slot)
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&requests)?);
        return Ok(());
    }

    if requests.is_empty() {
        println!("No reminders left today.");
        return Ok(());
    }
    for request in &requests {
        let when = match request.trigger {
            Trigger::At(at) => at.with_timezone(&Local).format("%H:%M").to_string(),
            Trigger::Immediate => "now".to_string(),
        };
        println!("{when}  {:<12}  {:<24}  {}", request.identifier, request.title, request.body);
    }
    Ok(())
}
