//! Relay envelope codec.
//!
//! A relayed WhatsApp message travels through Telegram as plain text:
//!
//! ```text
//! SasaBot|2024-05-01 09:30:00 +0700|
//! MESSAGE_ID:3EB0C431C26A1916E07A|
//! PHONE:62811|
//! FROM:Sari ✅ |
//!
//! MESSAGE:
//! Hello
//! ```
//!
//! The Telegram message is the only record of which contact a thread belongs
//! to, so decoding an agent's reply target must recover the phone exactly.
//! The body and name are best-effort: reserved tokens inside them are stripped
//! and line breaks are flattened.

use chrono::{DateTime, TimeZone};
use regex::Regex;

use crate::domain::ChatEvent;

pub const DEFAULT_MARKER: &str = "SasaBot";
pub const CHECK_MARK: &str = "\u{2705}";

pub const MESSAGE_ID_LABEL: &str = "MESSAGE_ID:";
pub const PHONE_LABEL: &str = "PHONE:";
pub const FROM_LABEL: &str = "FROM:";
pub const MESSAGE_LABEL: &str = "MESSAGE:";

const FIELD_DELIMITER: char = '|';
const MIN_FIELDS: usize = 5;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Named fields recovered from a relay envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedEnvelope {
    pub timestamp: String,
    pub message_id: String,
    pub phone: String,
    pub name: String,
    /// Everything after the name block, flattened to one line.
    pub remainder: String,
}

#[derive(Clone, Debug)]
pub struct RelayCodec {
    marker: String,
    fields: Regex,
}

impl Default for RelayCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER)
    }
}

impl RelayCodec {
    /// `marker` is validated by the config layer (non-empty, no `|`, no line breaks).
    pub fn new(marker: impl Into<String>) -> Self {
        let fields = Regex::new(
            r"^(?P<timestamp>[^|]*)\|(?P<message_id>[^|]*)\|(?P<phone>[^|]*)\|(?P<name>[^|]*)\|(?P<remainder>.*)$",
        )
        .expect("valid regex");
        Self {
            marker: marker.into(),
            fields,
        }
    }

    pub fn encode<Tz>(
        &self,
        timestamp: &DateTime<Tz>,
        message_id: &str,
        phone: &str,
        name: &str,
        body: &str,
    ) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        format!(
            "{marker}|{ts}|\n\
             {MESSAGE_ID_LABEL}{message_id}|\n\
             {PHONE_LABEL}{phone}|\n\
             {FROM_LABEL}{name} {CHECK_MARK} |\n\n\
             {MESSAGE_LABEL}\n{body}",
            marker = self.marker,
            ts = timestamp.format(TIMESTAMP_FORMAT),
        )
    }

    pub fn encode_event(&self, event: &ChatEvent) -> String {
        self.encode(
            &event.timestamp,
            &event.id,
            &event.sender_phone,
            &event.sender_name,
            &event.body,
        )
    }

    /// Returns `None` when `text` is not a relay envelope (fewer than five
    /// fields once the decoration is stripped). Never fails otherwise.
    pub fn decode(&self, text: &str) -> Option<DecodedEnvelope> {
        let flat = self.flatten(text);
        if flat.split(FIELD_DELIMITER).count() < MIN_FIELDS {
            return None;
        }

        let caps = self.fields.captures(&flat)?;
        let field = |name: &str| {
            caps.name(name)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        };

        Some(DecodedEnvelope {
            timestamp: field("timestamp"),
            message_id: field("message_id"),
            phone: field("phone"),
            name: field("name"),
            remainder: field("remainder"),
        })
    }

    /// Strip the marker, labels, checkmark decoration and line breaks (in that order).
    fn flatten(&self, text: &str) -> String {
        let marker_prefix = format!("{}{FIELD_DELIMITER}", self.marker);
        let check = format!(" {CHECK_MARK} ");

        [
            marker_prefix.as_str(),
            MESSAGE_ID_LABEL,
            PHONE_LABEL,
            FROM_LABEL,
            check.as_str(),
            MESSAGE_LABEL,
            "\r",
            "\n",
        ]
        .iter()
        .fold(text.to_string(), |acc, token| acc.replace(token, ""))
    }
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;

    fn ts() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 1, 9, 30, 0)
            .unwrap()
    }

    #[test]
    fn encode_is_byte_stable() {
        let codec = RelayCodec::default();
        let out = codec.encode(&ts(), "abc", "62811", "Sari", "Hello");
        assert_eq!(
            out,
            "SasaBot|2024-05-01 09:30:00 +0700|\nMESSAGE_ID:abc|\nPHONE:62811|\nFROM:Sari \u{2705} |\n\nMESSAGE:\nHello"
        );
        assert_eq!(out, codec.encode(&ts(), "abc", "62811", "Sari", "Hello"));
    }

    #[test]
    fn encoded_event_carries_labelled_fields() {
        let codec = RelayCodec::default();
        let event = ChatEvent {
            id: "abc".to_string(),
            sender_phone: "62811".to_string(),
            sender_name: "Sari".to_string(),
            timestamp: ts(),
            body: "Hello".to_string(),
        };

        let text = codec.encode_event(&event);
        assert!(text.contains("MESSAGE_ID:abc"));
        assert!(text.contains("PHONE:62811"));
        assert!(text.ends_with("MESSAGE:\nHello"));
    }

    #[test]
    fn round_trip_recovers_named_fields() {
        let codec = RelayCodec::default();
        let text = codec.encode(&ts(), "3EB0C431", "628123456789", "Budi Santoso", "Halo kak");

        let env = codec.decode(&text).unwrap();
        assert_eq!(env.phone, "628123456789");
        assert_eq!(env.message_id, "3EB0C431");
        assert_eq!(env.name, "Budi Santoso");
        assert_eq!(env.remainder, "Halo kak");
        assert_eq!(env.timestamp, "2024-05-01 09:30:00 +0700");
    }

    #[test]
    fn round_trip_with_empty_name() {
        let codec = RelayCodec::default();
        let text = codec.encode(&ts(), "id1", "62899", "", "hi");
        let env = codec.decode(&text).unwrap();
        assert_eq!(env.phone, "62899");
        assert_eq!(env.name, "");
    }

    #[test]
    fn multiline_body_is_flattened() {
        let codec = RelayCodec::default();
        let text = codec.encode(&ts(), "id1", "62811", "Sari", "line one\nline two");
        let env = codec.decode(&text).unwrap();
        assert_eq!(env.phone, "62811");
        assert_eq!(env.remainder, "line oneline two");
    }

    #[test]
    fn pipes_in_body_stay_in_remainder() {
        let codec = RelayCodec::default();
        let text = codec.encode(&ts(), "id1", "62811", "Sari", "a|b|c");
        let env = codec.decode(&text).unwrap();
        assert_eq!(env.phone, "62811");
        assert_eq!(env.remainder, "a|b|c");
    }

    #[test]
    fn too_few_fields_is_not_an_envelope() {
        let codec = RelayCodec::default();
        assert_eq!(codec.decode(""), None);
        assert_eq!(codec.decode("hello there"), None);
        assert_eq!(codec.decode("a|b|c|d"), None);
        assert_eq!(codec.decode("SasaBot|ts|\nMESSAGE_ID:x|\nPHONE:1|"), None);
    }

    #[test]
    fn any_five_fields_are_accepted() {
        let codec = RelayCodec::default();
        let env = codec.decode("a|b|c|d|e").unwrap();
        assert_eq!(env.phone, "c");
    }

    #[test]
    fn custom_marker_round_trips() {
        let codec = RelayCodec::new("CsBot");
        let text = codec.encode(&ts(), "m1", "6281", "Ana", "ok");
        assert!(text.starts_with("CsBot|"));
        assert_eq!(codec.decode(&text).unwrap().phone, "6281");

        // A default codec leaves the foreign marker in place, shifting the fields.
        let other = RelayCodec::default().decode(&text).unwrap();
        assert_eq!(other.phone, "m1");
    }

    mod properties {
        use chrono::{TimeZone, Utc};
        use proptest::prelude::*;

        use crate::codec::{RelayCodec, TIMESTAMP_FORMAT};

        proptest! {
            #[test]
            fn envelope_fields_survive_encoding(
                secs in 0i64..4_000_000_000,
                message_id in "[A-Za-z0-9]{1,32}",
                phone in "[0-9]{5,15}",
                name in "[A-Za-z0-9 .'-]{0,40}",
                body in any::<String>(),
            ) {
                let codec = RelayCodec::default();
                let at = Utc.timestamp_opt(secs, 0).unwrap();
                let text = codec.encode(&at, &message_id, &phone, &name, &body);

                let env = codec.decode(&text).expect("encoded text decodes");
                prop_assert_eq!(env.phone, phone);
                prop_assert_eq!(env.message_id, message_id);
                prop_assert_eq!(env.name, name);
                prop_assert_eq!(env.timestamp, at.format(TIMESTAMP_FORMAT).to_string());
            }

            #[test]
            fn decode_accepts_any_input(text in any::<String>()) {
                let _ = RelayCodec::default().decode(&text);
            }

            #[test]
            fn text_without_delimiters_is_never_an_envelope(text in "[^|]*") {
                prop_assert_eq!(RelayCodec::default().decode(&text), None);
            }
        }
    }
}
