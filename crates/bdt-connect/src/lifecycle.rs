//! Status transitions and the append-only notes log of a connection.
//!
//! Any status may follow any other; nothing here enforces forward-only
//! progression. Every write stamps `updated_date`.

use std::sync::OnceLock;

use bdt_core::{BusinessNeed, Connection, ConnectionStatus, FollowUpTask};
use bdt_match::Match;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use regex::Regex;
use uuid::Uuid;

pub const NOTE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn transition(connection: &mut Connection, status: ConnectionStatus, at: DateTime<Utc>) {
    connection.status = status;
    connection.updated_date = at;
}

pub fn update_status(connection: &mut Connection, status: ConnectionStatus) {
    transition(connection, status, Utc::now());
}

/// `existing` followed by a newline and a `[stamp] text` entry. Prior text is
/// kept byte for byte.
pub fn append_note_text(existing: &str, text: &str, at: DateTime<Utc>) -> String {
    format!("{existing}\n[{}] {text}", at.format(NOTE_TIMESTAMP_FORMAT))
}

pub fn append_note(connection: &mut Connection, text: &str, at: DateTime<Utc>) {
    connection.notes = append_note_text(&connection.notes, text, at);
    connection.updated_date = at;
}

pub fn add_note(connection: &mut Connection, text: &str) {
    append_note(connection, text, Utc::now());
}

/// One entry of the parsed notes view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEntry {
    pub timestamp: Option<NaiveDateTime>,
    pub text: String,
}

fn note_line_regex() -> &'static Regex {
    static NOTE_LINE_RE: OnceLock<Regex> = OnceLock::new();
    NOTE_LINE_RE.get_or_init(|| {
        Regex::new(r"^\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2})\] ?(.*)$")
            .expect("note line regex should compile")
    })
}

/// Splits the flat notes string into entries. Lines without a stamp continue
/// the previous entry, or start an unstamped one at the top. Derived only;
/// `Connection::notes` stays authoritative.
pub fn parse_notes(notes: &str) -> Vec<NoteEntry> {
    let mut entries: Vec<NoteEntry> = Vec::new();
    for line in notes.lines() {
        if let Some(caps) = note_line_regex().captures(line) {
            let timestamp = NaiveDateTime::parse_from_str(&caps[1], NOTE_TIMESTAMP_FORMAT).ok();
            entries.push(NoteEntry {
                timestamp,
                text: caps[2].to_string(),
            });
            continue;
        }
        match entries.last_mut() {
            Some(last) => {
                last.text.push('\n');
                last.text.push_str(line);
            }
            None if line.trim().is_empty() => {}
            None => entries.push(NoteEntry {
                timestamp: None,
                text: line.to_string(),
            }),
        }
    }
    entries
}

/// Advisory next steps for a stage.
pub fn next_actions(status: ConnectionStatus) -> &'static [&'static str] {
    match status {
        ConnectionStatus::Initiated => &[
            "Send initial outreach email",
            "Research contact information",
            "Prepare company overview",
        ],
        ConnectionStatus::Contacted => &[
            "Wait for response (3-5 business days)",
            "Prepare for potential meeting",
            "Research their recent news/updates",
        ],
        ConnectionStatus::Responded => &[
            "Schedule introductory call",
            "Prepare meeting agenda",
            "Send calendar invite",
        ],
        ConnectionStatus::MeetingScheduled => &[
            "Prepare presentation materials",
            "Research attendees",
            "Confirm meeting details",
        ],
        ConnectionStatus::MeetingCompleted => &[
            "Send follow-up summary",
            "Share relevant documents",
            "Schedule next steps",
        ],
        ConnectionStatus::Connected => &[
            "Monitor relationship progress",
            "Schedule regular check-ins",
            "Track mutual value creation",
        ],
        ConnectionStatus::Closed => &[
            "Document lessons learned",
            "Update contact information",
            "Consider future opportunities",
        ],
    }
}

/// Opens a connection for an accepted match, seeding the notes with the
/// match reasons.
pub fn initiate(need: &BusinessNeed, accepted: &Match, at: DateTime<Utc>) -> Connection {
    let mut connection = Connection::new(
        need.id,
        need.company_name.clone(),
        accepted.company.name.clone(),
        accepted.score,
        at,
    );
    connection.notes = format!("Auto-matched based on: {}", accepted.reasons.join(", "));
    connection
}

pub fn schedule_follow_up(connection_id: Uuid, days_from_now: i64, now: DateTime<Utc>) -> FollowUpTask {
    FollowUpTask {
        id: Uuid::new_v4(),
        connection_id,
        scheduled_date: now + Duration::days(days_from_now),
        status: "scheduled".to_string(),
        kind: "follow_up".to_string(),
        created_date: now,
    }
}

pub fn filter_by_status(connections: &[Connection], status: ConnectionStatus) -> Vec<&Connection> {
    connections.iter().filter(|c| c.status == status).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bdt_core::{Company, NeedType};
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).single().unwrap()
    }

    fn connection() -> Connection {
        Connection::new(Uuid::new_v4(), "TechStart Inc.", "FinanceFlow", 0.75, at(9, 0))
    }

    #[test]
    fn status_update_refreshes_timestamp_even_when_unchanged() {
        let mut conn = connection();
        transition(&mut conn, ConnectionStatus::Initiated, at(10, 30));
        assert_eq!(conn.status, ConnectionStatus::Initiated);
        assert_eq!(conn.updated_date, at(10, 30));
    }

    #[test]
    fn any_status_is_reachable_from_any_other() {
        let mut conn = connection();
        transition(&mut conn, ConnectionStatus::Closed, at(10, 0));
        transition(&mut conn, ConnectionStatus::Contacted, at(11, 0));
        assert_eq!(conn.status, ConnectionStatus::Contacted);
        assert_eq!(conn.match_score, 0.75);
        assert_eq!(conn.created_date, at(9, 0));
    }

    #[test]
    fn notes_append_keeps_prior_text_as_prefix() {
        let mut conn = connection();
        conn.notes = "Auto-matched based on: Exact sector match (Finance)".to_string();
        let before = conn.notes.clone();

        append_note(&mut conn, "Sent intro email", at(14, 5));
        assert!(conn.notes.starts_with(&before));
        assert_eq!(
            conn.notes,
            format!("{before}\n[2026-03-02 14:05] Sent intro email")
        );
        assert_eq!(conn.updated_date, at(14, 5));

        let after_first = conn.notes.clone();
        append_note(&mut conn, "Call booked", at(15, 0));
        assert!(conn.notes.starts_with(&after_first));
        assert!(conn.notes.len() > after_first.len());
    }

    #[test]
    fn parsed_view_recovers_entries() {
        let notes = "Auto-matched based on: Keyword match: ai\n[2026-03-01 08:15] First call\nwent well\n[2026-03-02 09:00] Sent deck";
        let entries = parse_notes(notes);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].timestamp, None);
        assert_eq!(entries[1].text, "First call\nwent well");
        assert_eq!(
            entries[2].timestamp,
            NaiveDateTime::parse_from_str("2026-03-02 09:00", NOTE_TIMESTAMP_FORMAT).ok()
        );
        assert_eq!(entries[2].text, "Sent deck");
    }

    #[test]
    fn parsed_view_of_note_added_to_empty_log() {
        let notes = append_note_text("", "hello", at(7, 45));
        assert_eq!(notes, "\n[2026-03-02 07:45] hello");
        let entries = parse_notes(&notes);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "hello");
    }

    #[test]
    fn every_stage_has_three_actions() {
        for status in ConnectionStatus::ALL {
            assert_eq!(next_actions(status).len(), 3, "{status}");
        }
        assert_eq!(next_actions(ConnectionStatus::Initiated)[0], "Send initial outreach email");
    }

    #[test]
    fn initiate_records_match_reasons() {
        let need = BusinessNeed::new("TechStart Inc.", "Series A", NeedType::SignificantBusinessEvent);
        let accepted = Match {
            company: Company::new("FinanceFlow"),
            score: 0.64,
            reasons: vec!["Related sector (Finance ↔ Technology)".into(), "Good fit".into()],
        };
        let conn = initiate(&need, &accepted, at(12, 0));
        assert_eq!(conn.business_need_id, need.id);
        assert_eq!(conn.from_entity, "TechStart Inc.");
        assert_eq!(conn.to_entity, "FinanceFlow");
        assert_eq!(conn.status, ConnectionStatus::Initiated);
        assert_eq!(conn.updated_date, conn.created_date);
        assert_eq!(
            conn.notes,
            "Auto-matched based on: Related sector (Finance ↔ Technology), Good fit"
        );
    }

    #[test]
    fn follow_up_is_scheduled_days_ahead() {
        let conn = connection();
        let task = schedule_follow_up(conn.id, 7, at(9, 0));
        assert_eq!(task.connection_id, conn.id);
        assert_eq!(task.scheduled_date - task.created_date, Duration::days(7));
        assert_eq!(task.status, "scheduled");
    }

    #[test]
    fn filter_keeps_matching_status_only() {
        let mut a = connection();
        let b = connection();
        transition(&mut a, ConnectionStatus::Connected, at(10, 0));
        let all = vec![a, b];
        let connected = filter_by_status(&all, ConnectionStatus::Connected);
        assert_eq!(connected.len(), 1);
        assert_eq!(connected[0].id, all[0].id);
    }
}
