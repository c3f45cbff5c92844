use chrono::{DateTime, TimeDelta, Utc};
use kalends_core::config::load_config;
use kalends_core::types::{SeriesId, ShownAs, TimeRange};
use kalends_recur::generator;
use kalends_recur::model::SeriesMaster;
use kalends_recur::rule::{RecurrenceRule, Terminator};

fn demo_series(start: DateTime<Utc>) -> SeriesMaster {
    let days = [chrono::Weekday::Mon, chrono::Weekday::Wed];
    SeriesMaster {
        id: SeriesId::random(),
        title: "team sync".to_string(),
        location: Some("room 2".to_string()),
        note: None,
        start_utc: start,
        end_utc: start + TimeDelta::minutes(45),
        timezone: chrono_tz::Europe::Berlin,
        full_time: false,
        shown_as: ShownAs::Busy,
        rule: Some(RecurrenceRule::weekly(1, &days, Terminator::Count(10))),
        participants: vec![],
    }
}

fn main() {
    tracing_subscriber::fmt::init();
    let settings = match load_config() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Failed to load configuration: {err}");
            std::process::exit(1);
        }
    };

    let start = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<DateTime<Utc>>().ok())
        .unwrap_or_else(Utc::now);
    let master = demo_series(start);
    let range = TimeRange {
        start,
        end: start + TimeDelta::days(60),
    };

    match generator::expand(&master, range, &settings.recurrence) {
        Ok(occurrences) => match serde_json::to_string_pretty(&occurrences) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("Failed to serialize occurrences: {err}");
                std::process::exit(1);
            }
        },
        Err(err) => {
            eprintln!("Failed to expand series: {err}");
            std::process::exit(1);
        }
    }
}
