use clap::Args;
use meeetimer_core::validate;

use crate::duration::parse_duration;

#[derive(Args)]
pub struct ValidateArgs {
    /// Total duration (e.g. "20m", "1h30m", "90s", "600")
    #[arg(short, long, value_parser = parse_duration, allow_hyphen_values = true)]
    duration: i64,
    /// Remaining time at which to alert; repeatable
    #[arg(short, long = "alert", value_parser = parse_duration, allow_hyphen_values = true)]
    alerts: Vec<i64>,
}

/// Print the canonical form of the given settings.
pub fn run(args: ValidateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = validate(args.duration, &args.alerts)?;
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}
