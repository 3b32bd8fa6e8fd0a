//! Storage key generation.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::sync::{Arc, Mutex, PoisonError};

const PREFIX_LEN: usize = 5;
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Prefixes handed out during the current millisecond.
struct IssuedNames {
    millis: i64,
    prefixes: Vec<String>,
}

// Only the random-name step runs under this lock.
static ISSUED: Mutex<IssuedNames> = Mutex::new(IssuedNames {
    millis: i64::MIN,
    prefixes: Vec::new(),
});

/// Directory layout placed in front of a generated key.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::EnumIter,
    strum::EnumString,
    derive_more::Display,
)]
#[strum(ascii_case_insensitive)]
pub enum KeyLayout {
    /// The name is used as the key unchanged
    #[display("flat")]
    #[strum(serialize = "flat", serialize = "plain")]
    Flat,
    /// `YYYY/MM/DD/name`
    #[default]
    #[display("by-date")]
    #[strum(serialize = "by-date", serialize = "by_date", serialize = "date")]
    ByDate,
    /// `YYYY/MM/DD/HH/MM/SS/name`
    #[display("by-date-time")]
    #[strum(
        serialize = "by-date-time",
        serialize = "by_date_time",
        serialize = "by-datetime",
        serialize = "datetime"
    )]
    ByDateTime,
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Generates keys for new objects.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use stowage_core::{KeyGenerator, KeyLayout};
///
/// let keys = KeyGenerator::with_clock(|| Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap());
///
/// assert_eq!(keys.new_key(Some("pic.jpg"), KeyLayout::ByDate), "2024/03/05/pic.jpg");
/// assert_eq!(keys.new_key(Some("pic.jpg"), KeyLayout::ByDateTime), "2024/03/05/14/07/09/pic.jpg");
/// assert_eq!(keys.new_key(Some("pic.jpg"), KeyLayout::Flat), "pic.jpg");
/// ```
#[derive(Clone)]
pub struct KeyGenerator {
    clock: Clock,
}

impl KeyGenerator {
    /// Generator reading the system clock.
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    /// Generator reading the given clock.
    pub fn with_clock(clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        Self {
            clock: Arc::new(clock),
        }
    }

    /// Build a key from an optional name and a layout.
    ///
    /// A blank or missing name is replaced by [`generate_name`](Self::generate_name).
    pub fn new_key(&self, name: Option<&str>, layout: KeyLayout) -> String {
        let now = (self.clock)();
        let name = match name {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => self.name_at(now),
        };

        match layout {
            KeyLayout::Flat => name,
            KeyLayout::ByDate => format!("{}/{}", now.format("%Y/%m/%d"), name),
            KeyLayout::ByDateTime => format!("{}/{}", now.format("%Y/%m/%d/%H/%M/%S"), name),
        }
    }

    /// Random name: five ASCII letters followed by the epoch milliseconds.
    ///
    /// Names are unique within the process even when generated in the same
    /// millisecond.
    pub fn generate_name(&self) -> String {
        self.name_at((self.clock)())
    }

    fn name_at(&self, now: DateTime<Utc>) -> String {
        let mut issued = ISSUED.lock().unwrap_or_else(PoisonError::into_inner);
        let millis = now.timestamp_millis();
        if issued.millis != millis {
            issued.millis = millis;
            issued.prefixes.clear();
        }

        let mut rng = rand::thread_rng();
        let prefix = loop {
            let candidate: String = (0..PREFIX_LEN)
                .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
                .collect();
            if !issued.prefixes.contains(&candidate) {
                break candidate;
            }
        };
        issued.prefixes.push(prefix.clone());

        format!("{}{}", prefix, millis)
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KeyGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyGenerator").finish_non_exhaustive()
    }
}
