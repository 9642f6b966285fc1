//! Heuristic text venue page adapter
//!
//! For venue calendars with no machine-readable markup. The page is reduced
//! to its visible text, one `|`-separated segment per element, and each
//! date found is paired with the nearest plausible name segment after it.
//! Output quality depends on the page layout staying put.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use super::fetcher::PageFetcher;
use super::structured_data::PageSourceSettings;
use crate::error::{SyncError, SyncResult};
use crate::models::RawCandidate;
use crate::services::dates::{MONTH_PATTERN, WEEKDAY_PATTERN};

/// Longest name accepted after a date
const MAX_NAME_CHARS: usize = 120;

static HIDDEN_BLOCKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style|noscript)\b[^>]*>.*?</(script|style|noscript)>|<!--.*?-->")
        .expect("valid hidden block pattern")
});

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag pattern"));

static DATE_IN_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:{}\.?,?\s+)?{}\.?\s+\d{{1,2}}(?:st|nd|rd|th)?\b(?:,?\s+\d{{4}}\b)?",
        WEEKDAY_PATTERN, MONTH_PATTERN
    ))
    .expect("valid date-in-text pattern")
});

/// Segments that sit next to dates on calendars but are never show names
static NOISE_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:\d{1,2}(?::\d{2})?\s*(?:am|pm)\b.*|doors\b.*|show\s*:?\s*\d.*|(?:buy\s+)?tickets?|more\s+info|details|rsvp|sold\s+out|free|all\s+ages|\d+\+|\$\s*\d.*)$",
    )
    .expect("valid noise pattern")
});

/// Heuristic text page adapter
pub struct HeuristicTextSource {
    settings: PageSourceSettings,
    fetcher: Arc<dyn PageFetcher>,
}

impl HeuristicTextSource {
    pub fn new(settings: PageSourceSettings, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { settings, fetcher }
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    pub fn venue(&self) -> &str {
        &self.settings.venue
    }

    pub async fn fetch(&self) -> SyncResult<Vec<RawCandidate>> {
        let page = self
            .fetcher
            .get_text(&self.settings.url, &[])
            .await
            .map_err(|e| SyncError::source_unavailable(&self.settings.name, e))?;

        let candidates = extract_text_events(&page)
            .into_iter()
            .map(|c| c.with_ticket_url(self.settings.url.as_str()))
            .collect::<Vec<_>>();

        tracing::info!(
            source = %self.settings.name,
            venue = %self.settings.venue,
            count = candidates.len(),
            "Extracted heuristic text events"
        );

        Ok(candidates)
    }
}

/// Flatten HTML to `" | "`-joined visible text segments
pub fn flatten_page_text(page: &str) -> String {
    let visible = HIDDEN_BLOCKS.replace_all(page, " ");
    let with_breaks = TAG.replace_all(&visible, "\n");

    with_breaks
        .lines()
        .map(|line| decode_entities(&line.split_whitespace().collect::<Vec<_>>().join(" ")))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Pair each date in the page text with the name that follows it
pub fn extract_text_events(page: &str) -> Vec<RawCandidate> {
    let text = flatten_page_text(page);
    let dates: Vec<_> = DATE_IN_TEXT.find_iter(&text).collect();

    let mut candidates = Vec::new();
    for (i, date) in dates.iter().enumerate() {
        let region_end = dates.get(i + 1).map(|next| next.start()).unwrap_or(text.len());
        let region = &text[date.end()..region_end];

        match name_after_date(region) {
            Some(name) => candidates.push(RawCandidate::new(name, date.as_str().trim())),
            None => tracing::debug!(date = %date.as_str(), "No name found after date"),
        }
    }

    candidates
}

/// First segment of `region` that looks like a show name
fn name_after_date(region: &str) -> Option<String> {
    region
        .split('|')
        .map(|segment| segment.trim().trim_matches(|c: char| matches!(c, '-' | '–' | '—' | ':' | ',' | '@')).trim())
        .filter(|segment| !segment.is_empty())
        .find(|segment| !NOISE_SEGMENT.is_match(segment))
        .map(|segment| segment.chars().take(MAX_NAME_CHARS).collect::<String>().trim().to_string())
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CALENDAR: &str = r#"
        <html><head><style>.x { color: red }</style>
        <script>var shows = "Jan 1";</script></head>
        <body>
          <div class="event">
            <span class="date">Fri, Jan 23</span>
            <span class="time">8:00 PM</span>
            <a href="/e/1">High On Fire</a>
            <p>w/ HOT RAM &amp; Cheap Cigar</p>
            <a href="/e/1">Buy Tickets</a>
          </div>
          <div class="event">
            <span class="date">Sat, Jan 24</span> <h3>Graveyard Hours</h3>
          </div>
          <footer>Updated January 2 by staff</footer>
        </body></html>
    "#;

    #[test]
    fn test_flatten_drops_scripts_and_styles() {
        let text = flatten_page_text(CALENDAR);
        assert!(!text.contains("color"));
        assert!(!text.contains("var shows"));
        assert!(text.contains("Fri, Jan 23 | 8:00 PM | High On Fire"));
        assert!(text.contains("HOT RAM & Cheap Cigar"));
    }

    #[test]
    fn test_dates_paired_with_following_names() {
        let events = extract_text_events(CALENDAR);

        assert_eq!(events.len(), 3, "got {:?}", events);
        assert_eq!(events[0].date_text, "Fri, Jan 23");
        assert_eq!(events[0].name, "High On Fire");
        assert_eq!(events[1].date_text, "Sat, Jan 24");
        assert_eq!(events[1].name, "Graveyard Hours");
        // Footer text after a date is still picked up; the normalizer decides
        assert_eq!(events[2].date_text, "January 2");
    }

    #[test]
    fn test_date_with_only_noise_after_it_yields_nothing() {
        let events = extract_text_events("<p>Thu, Jan 29</p><p>Doors 7pm</p><p>Tickets</p>");
        assert!(events.is_empty());
    }

    #[test]
    fn test_long_names_are_capped() {
        let long = "A".repeat(300);
        let events = extract_text_events(&format!("<p>Jan 30</p><p>{}</p>", long));
        assert_eq!(events[0].name.chars().count(), MAX_NAME_CHARS);
    }
}
