use std::collections::BTreeMap;

use bdt_core::{Company, Connection};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    /// Percentage of connections that reached `connected` or `meeting_completed`.
    pub success_rate: f64,
    /// Mean match score, as a percentage.
    pub average_score: f64,
}

pub fn connection_statistics(connections: &[Connection]) -> ConnectionStats {
    let total = connections.len();
    let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
    let mut successful = 0usize;
    let mut score_sum = 0.0;

    for connection in connections {
        *by_status
            .entry(connection.status.as_str().to_string())
            .or_default() += 1;
        if connection.status.is_successful() {
            successful += 1;
        }
        score_sum += connection.match_score;
    }

    let (success_rate, average_score) = if total == 0 {
        (0.0, 0.0)
    } else {
        (
            successful as f64 / total as f64 * 100.0,
            score_sum / total as f64 * 100.0,
        )
    };

    ConnectionStats {
        total,
        by_status,
        success_rate,
        average_score,
    }
}

/// Company counts per sector label; companies without one count as `Unknown`.
pub fn companies_by_sector(companies: &[Company]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for company in companies {
        let label = company
            .sector()
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        *counts.entry(label).or_default() += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use bdt_core::{ConnectionStatus, Sector};
    use chrono::Utc;
    use uuid::Uuid;

    fn conn(status: ConnectionStatus, score: f64) -> Connection {
        let mut c = Connection::new(Uuid::new_v4(), "A", "B", score, Utc::now());
        c.status = status;
        c
    }

    #[test]
    fn empty_list_has_zero_rates() {
        let stats = connection_statistics(&[]);
        assert_eq!(stats.total, 0);
        assert!(stats.by_status.is_empty());
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.average_score, 0.0);
    }

    #[test]
    fn one_connected_out_of_four_is_25_percent() {
        let stats = connection_statistics(&[
            conn(ConnectionStatus::Connected, 0.8),
            conn(ConnectionStatus::Initiated, 0.4),
            conn(ConnectionStatus::Closed, 0.6),
            conn(ConnectionStatus::Contacted, 0.2),
        ]);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.success_rate, 25.0);
        assert!((stats.average_score - 50.0).abs() < 1e-9);
        assert_eq!(stats.by_status.get("closed"), Some(&1));
    }

    #[test]
    fn completed_meetings_count_as_success() {
        let stats = connection_statistics(&[
            conn(ConnectionStatus::MeetingCompleted, 0.5),
            conn(ConnectionStatus::MeetingCompleted, 0.5),
            conn(ConnectionStatus::Responded, 0.5),
        ]);
        assert_eq!(stats.by_status.get("meeting_completed"), Some(&2));
        assert!((stats.success_rate - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn sector_distribution_counts_unknown() {
        let counts = companies_by_sector(&[
            Company::new("A").with_sector(Sector::Finance),
            Company::new("B").with_sector(Sector::Finance),
            Company::new("C"),
        ]);
        assert_eq!(counts.get("Finance"), Some(&2));
        assert_eq!(counts.get("Unknown"), Some(&1));
    }
}
