use super::models::{CalendarEvent, ClassifiedEvents};
use super::time::parse_event_start;
use crate::config::InvalidStartPolicy;
use crate::error::{AppResult, Error};
use chrono::NaiveDate;
use tracing::warn;

/// Split events into important and regular buckets
///
/// Every event lands in `regular`. It is also pushed to `important` when its
/// lowercased title contains one of `phrases` and its UTC start date is not
/// before `today`. `phrases` are expected to be lowercase already.
pub fn classify_events(
    events: Vec<CalendarEvent>,
    phrases: &[String],
    today: NaiveDate,
    on_invalid_start: InvalidStartPolicy,
) -> AppResult<ClassifiedEvents> {
    let mut classified = ClassifiedEvents::default();

    for event in events {
        let start = match event.start_value().map(parse_event_start) {
            Some(Ok(start)) => start,
            Some(Err(e)) => match on_invalid_start {
                InvalidStartPolicy::Skip => {
                    warn!("Skipping event '{}': {}", event.summary(), e);
                    continue;
                }
                InvalidStartPolicy::Reject => return Err(e),
            },
            None => match on_invalid_start {
                InvalidStartPolicy::Skip => {
                    warn!("Skipping event '{}' without a start", event.summary());
                    continue;
                }
                InvalidStartPolicy::Reject => {
                    return Err(Error::ParseFailed(format!(
                        "Event '{}' has no start",
                        event.summary()
                    )))
                }
            },
        };

        let title = event.summary().to_lowercase();
        let matches_phrase = phrases.iter().any(|phrase| title.contains(phrase.as_str()));

        if matches_phrase && start.date_naive() >= today {
            classified.important.push(event.clone());
        }

        classified.regular.push(event);
    }

    Ok(classified)
}
