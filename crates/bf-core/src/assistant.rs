//! Keyword-routed care assistant.
//!
//! Messages are matched against a fixed priority table of topics. The first
//! topic with a keyword starting a word of the lower-cased message renders a
//! reply built from the last 24 hours of events. Nothing here can fail.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, FixedOffset};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::event_type::EventType;
use crate::recommend::{analyze_sleep_pattern, recommendations_for};
use crate::store::TimeWindow;

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<FixedOffset>,
}

/// Elapsed time after which the last feeding or diaper change is mentioned.
const OVERDUE_MINUTES: i64 = 180;

/// Event context shared by every topic renderer.
struct Context<'a> {
    events: &'a [Event],
    now: DateTime<FixedOffset>,
    cries: usize,
    feedings: usize,
    diapers: usize,
    last_feeding: Option<DateTime<FixedOffset>>,
    last_diaper: Option<DateTime<FixedOffset>>,
}

impl<'a> Context<'a> {
    fn new(events: &'a [Event], now: DateTime<FixedOffset>) -> Self {
        let day = TimeWindow::ending_at(now, Duration::hours(24));
        let count = |t: EventType| day.select(events).filter(|e| e.is(t)).count();
        let latest = |t: EventType| {
            day.select(events)
                .filter(|e| e.is(t))
                .map(|e| e.timestamp)
                .max()
        };
        Self {
            events,
            now,
            cries: count(EventType::Cried),
            feedings: count(EventType::Fed),
            diapers: count(EventType::DiaperChanged),
            last_feeding: latest(EventType::Fed),
            last_diaper: latest(EventType::DiaperChanged),
        }
    }

    /// Whole hours since `ts`, if more than the overdue threshold has passed.
    fn overdue_hours(&self, ts: Option<DateTime<FixedOffset>>) -> Option<i64> {
        let minutes = (self.now - ts?).num_minutes();
        (minutes > OVERDUE_MINUTES).then(|| (minutes + 30) / 60)
    }
}

struct Topic {
    name: &'static str,
    /// Regex fragments, each anchored at a word start when matched.
    keywords: &'static [&'static str],
    render: fn(&Context<'_>) -> String,
}

static TOPICS: &[Topic] = &[
    Topic {
        name: "crying",
        keywords: &["chor", "cry"],
        render: render_crying,
    },
    Topic {
        name: "sleep",
        keywords: &["sono", "dormi", "sleep", r"naps?\b"],
        render: render_sleep,
    },
    Topic {
        name: "feeding",
        keywords: &["alimenta", "mamada", "fome", "feed", "hungry"],
        render: render_feeding,
    },
    Topic {
        name: "diaper",
        keywords: &["fralda", "cocô", "xixi", "diaper", "napp", "poop"],
        render: render_diaper,
    },
    Topic {
        name: "vaccine",
        keywords: &["vacina", "vaccin"],
        render: render_vaccine,
    },
];

fn render_crying(ctx: &Context<'_>) -> String {
    let mut out = format!(
        "I understand your concern. In the last 24 hours I recorded {} crying episodes. ",
        ctx.cries
    );
    if let Some(hours) = ctx.overdue_hours(ctx.last_feeding) {
        out.push_str(&format!(
            "The last feeding was {hours} hours ago, the baby may be hungry. "
        ));
    }
    if let Some(hours) = ctx.overdue_hours(ctx.last_diaper) {
        out.push_str(&format!(
            "The last diaper change was {hours} hours ago, check whether it needs changing. "
        ));
    }
    out.push_str(
        "\n\nCommon causes of crying:\n\
         - Hunger (feeding every 2-3 hours is normal)\n\
         - A dirty or wet diaper\n\
         - Discomfort (heat, cold, tight clothes)\n\
         - Tiredness or overstimulation\n\
         - Colic (more common at night)\n\
         - Need for contact and affection\n\n\
         Try soothing with gentle motion, white noise or skin-to-skin contact.",
    );
    out
}

fn render_sleep(ctx: &Context<'_>) -> String {
    let analysis = analyze_sleep_pattern(ctx.events, ctx.now);
    let mut out = format!(
        "Sleep over the last 7 days:\n\n\
         Total sleep: {:.1}h (average {:.1}h/day)\n\
         Quality: {}\n\
         Naps per day: {:.0}\n\n\
         Recommendations:\n",
        analysis.total_sleep_minutes / 60.0,
        analysis.daily_average_minutes / 60.0,
        analysis.quality,
        analysis.sessions_per_day.round()
    );
    for (i, rec) in recommendations_for(&analysis).iter().enumerate() {
        out.push_str(&format!("{}. {rec}\n", i + 1));
    }
    out
}

fn render_feeding(ctx: &Context<'_>) -> String {
    let mut out = format!("About feeding:\n\nLast 24 hours: {} feedings\n\n", ctx.feedings);
    out.push_str(match ctx.feedings {
        0..=5 => "This is below what is usually recommended. Newborns typically need 8-12 feedings a day.\n\n",
        6..=12 => "This frequency is adequate for the age.\n\n",
        _ => "A high frequency is normal in the first months with feeding on demand.\n\n",
    });
    out.push_str(
        "Hunger cues:\n\
         - Bringing hands to the mouth\n\
         - Sucking motions\n\
         - Restlessness\n\
         - Crying (a late cue)\n\n\
         Tip: offer the breast or bottle before crying starts.",
    );
    out
}

fn render_diaper(ctx: &Context<'_>) -> String {
    let mut out = format!("About diaper changes:\n\nLast 24 hours: {} changes\n\n", ctx.diapers);
    if ctx.diapers < 6 {
        out.push_str("This may be below expected. Newborns usually need 6-10 changes a day.\n\n");
    }
    if let Some(hours) = ctx.overdue_hours(ctx.last_diaper) {
        out.push_str(&format!("The last change was {hours} hours ago.\n\n"));
    }
    out.push_str(
        "Typical frequency:\n\
         - Newborn: 8-10 diapers/day\n\
         - 1-3 months: 6-8 diapers/day\n\
         - 3-6 months: 5-7 diapers/day\n\n\
         Warning signs:\n\
         - Fewer than 6 wet diapers a day\n\
         - Very dark or strong-smelling urine\n\
         - Bloody or very watery stools\n\
         - Persistent diaper rash",
    );
    out
}

fn render_vaccine(_: &Context<'_>) -> String {
    "About vaccines:\n\n\
     It is normal for the baby to show:\n\
     - Mild fever (up to 38°C)\n\
     - Irritability\n\
     - Sleepiness\n\
     - Redness at the injection site\n\n\
     These symptoms usually last 24-48 hours.\n\n\
     Seek care if:\n\
     - Fever goes above 39°C\n\
     - Symptoms last more than 3 days\n\
     - The baby is very listless or has trouble breathing\n\n\
     Tip: cold compresses on the site and plenty of cuddles help."
        .to_owned()
}

const CAPABILITIES: &str = "Hi! I am the BabyFlow assistant.\n\n\
    I can help with questions about:\n\
    - Sleep patterns and routine\n\
    - Feeding and breastfeeding\n\
    - Crying and how to soothe\n\
    - Diaper changes\n\
    - Reactions after vaccines\n\n\
    My answers are based on your baby's records.\n\n\
    How can I help today?";

/// One pattern per entry of [`TOPICS`], in the same order.
static TOPIC_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    TOPICS
        .iter()
        .map(|topic| {
            let pattern = format!(r"\b(?:{})", topic.keywords.join("|"));
            Regex::new(&pattern).expect("topic keyword pattern is valid")
        })
        .collect()
});

fn find_topic(text: &str) -> Option<&'static Topic> {
    let lower = text.to_lowercase();
    TOPICS
        .iter()
        .zip(TOPIC_PATTERNS.iter())
        .find(|(_, pattern)| pattern.is_match(&lower))
        .map(|(topic, _)| topic)
}

/// Name of the topic a message routes to, if any.
pub fn route_topic(text: &str) -> Option<&'static str> {
    find_topic(text).map(|topic| topic.name)
}

/// Answers a free-text question using the recorded events.
///
/// `history` is accepted for future context-aware routing but does not
/// currently influence the reply.
pub fn respond_to_message(
    text: &str,
    events: &[Event],
    history: &[ChatMessage],
    now: DateTime<FixedOffset>,
) -> String {
    let topic = find_topic(text);

    tracing::debug!(
        topic = topic.map_or("none", |t| t.name),
        history_len = history.len(),
        "routing assistant message"
    );

    match topic {
        Some(topic) => (topic.render)(&Context::new(events, now)),
        None => CAPABILITIES.to_owned(),
    }
}
