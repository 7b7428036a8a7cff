//! Display formatting for CLI output
//!
//! SBIO pattern: Pure functions that format data for display

use chrono::{DateTime, Utc};

use crate::cluster::{ClusterStatus, Operation};

// ============================================================================
// Table formatting helpers
// ============================================================================

/// Format a simple table with headers and rows
pub fn format_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    if rows.is_empty() {
        return "No clusters found.\n".to_string();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let mut output = String::new();

    for (i, header) in headers.iter().enumerate() {
        if i > 0 {
            output.push_str("   ");
        }
        output.push_str(&format!(
            "{:width$}",
            header.to_uppercase(),
            width = widths[i]
        ));
    }
    output.push('\n');

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                output.push_str("   ");
            }
            if i < widths.len() {
                output.push_str(&format!("{:width$}", cell, width = widths[i]));
            } else {
                output.push_str(cell);
            }
        }
        output.push('\n');
    }

    output
}

/// Format an age as a short human-readable string
pub fn format_age(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - since).num_seconds().max(0);
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d{}h", secs / 86400, (secs % 86400) / 3600)
    }
}

// ============================================================================
// Cluster display
// ============================================================================

/// Format listed pages as one table; the PAGE column keeps the batch boundaries
pub fn format_cluster_pages(pages: &[Vec<ClusterStatus>], now: DateTime<Utc>) -> String {
    let headers = &["PAGE", "NAME", "STATE", "SINCE"];
    let rows: Vec<Vec<String>> = pages
        .iter()
        .enumerate()
        .flat_map(|(page, clusters)| {
            clusters.iter().map(move |c| {
                vec![
                    (page + 1).to_string(),
                    c.cluster_name.clone(),
                    c.state().to_string(),
                    c.status
                        .state_start_time
                        .map(|t| format_age(t, now))
                        .unwrap_or_else(|| "-".to_string()),
                ]
            })
        })
        .collect();

    format_table(headers, rows)
}

/// Format a single cluster for detailed display
pub fn format_cluster_detail(cluster: &ClusterStatus) -> String {
    let mut output = String::new();

    output.push_str(&format!("Name:   {}\n", cluster.cluster_name));
    if let Some(ref uuid) = cluster.cluster_uuid {
        output.push_str(&format!("UUID:   {}\n", uuid));
    }
    output.push_str(&format!("State:  {}\n", cluster.state()));
    if let Some(ref detail) = cluster.status.detail {
        output.push_str(&format!("Detail: {}\n", detail));
    }
    if let Some(ts) = cluster.status.state_start_time {
        output.push_str(&format!("Since:  {}\n", ts.to_rfc3339()));
    }

    output
}

/// Format the submission result of a create or delete
pub fn format_operation(verb: &str, cluster: &str, operation: &Operation) -> String {
    format!("Cluster {} {} (operation {})\n", cluster, verb, operation.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterState;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_format_table_empty() {
        assert_eq!(format_table(&["NAME"], vec![]), "No clusters found.\n");
    }

    #[test]
    fn test_format_table_aligns_columns() {
        let out = format_table(
            &["name", "state"],
            vec![
                vec!["a".to_string(), "RUNNING".to_string()],
                vec!["longer-name".to_string(), "ERROR".to_string()],
            ],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "NAME          STATE  ");
        assert!(lines[1].starts_with("a             RUNNING"));
        assert!(lines[2].starts_with("longer-name   ERROR"));
    }

    #[test]
    fn test_format_age() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(format_age(now - Duration::seconds(42), now), "42s");
        assert_eq!(format_age(now - Duration::seconds(125), now), "2m5s");
        assert_eq!(format_age(now - Duration::minutes(190), now), "3h10m");
        assert_eq!(format_age(now - Duration::hours(50), now), "2d2h");
        // Clock skew never shows negative ages
        assert_eq!(format_age(now + Duration::seconds(5), now), "0s");
    }

    #[test]
    fn test_format_cluster_pages() {
        let now = Utc::now();
        let mut running = ClusterStatus::new("alpha", ClusterState::Running);
        running.status.state_start_time = Some(now - Duration::seconds(30));

        let pages = vec![
            vec![running],
            vec![ClusterStatus::new("beta", ClusterState::Creating)],
        ];
        let out = format_cluster_pages(&pages, now);

        assert!(out.contains("alpha"));
        assert!(out.contains("30s"));
        let beta = out.lines().find(|l| l.contains("beta")).unwrap();
        assert!(beta.starts_with('2'));
        assert!(beta.contains("CREATING"));
        assert!(beta.trim_end().ends_with('-'));
    }

    #[test]
    fn test_format_cluster_detail() {
        let mut cluster = ClusterStatus::new("c1", ClusterState::Error);
        cluster.status.detail = Some("Quota exceeded".to_string());

        let out = format_cluster_detail(&cluster);
        assert!(out.contains("Name:   c1"));
        assert!(out.contains("State:  ERROR"));
        assert!(out.contains("Detail: Quota exceeded"));
        assert!(!out.contains("UUID"));
    }

    #[test]
    fn test_format_operation() {
        let op = Operation {
            name: "projects/p/regions/r/operations/abc".to_string(),
            ..Default::default()
        };
        assert_eq!(
            format_operation("created", "c1", &op),
            "Cluster c1 created (operation projects/p/regions/r/operations/abc)\n"
        );
    }
}
