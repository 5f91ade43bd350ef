//! Reminder digest formatting.
//!
//! Pure functions from the ledger's due-installment feed to the WhatsApp
//! message body. One digest per run: installments grouped by how many days
//! remain until their due date, closest group first, with a grand total at
//! the bottom.

use chrono::NaiveDate;

use rubia_core::Money;
use rubia_db::repository::report::DueReceivable;

/// Installments sharing the same days-until-due distance.
#[derive(Debug, Clone)]
pub struct ReminderGroup {
    pub days_until_due: i64,
    pub installments: Vec<DueReceivable>,
}

/// Groups the due feed by distance from `today`, closest first.
///
/// Overdue rows never reach this function: the feed only contains dates
/// from the configured look-ahead set.
pub fn group_by_days_until_due(items: Vec<DueReceivable>, today: NaiveDate) -> Vec<ReminderGroup> {
    let mut groups: Vec<ReminderGroup> = Vec::new();

    for item in items {
        let days = (item.due_date - today).num_days();
        match groups.iter_mut().find(|g| g.days_until_due == days) {
            Some(group) => group.installments.push(item),
            None => groups.push(ReminderGroup {
                days_until_due: days,
                installments: vec![item],
            }),
        }
    }

    groups.sort_by_key(|g| g.days_until_due);
    groups
}

/// Renders the digest message, or `None` when nothing is due.
pub fn format_digest(groups: &[ReminderGroup], today: NaiveDate) -> Option<String> {
    if groups.iter().all(|g| g.installments.is_empty()) {
        return None;
    }

    let mut message = format!("🔔 *RUBIA JOIAS REMINDERS* - {}\n\n", today.format("%d/%m"));

    for group in groups {
        if group.installments.is_empty() {
            continue;
        }

        message.push_str(&format!(
            "{} ({}):\n",
            group_heading(group.days_until_due),
            group.installments.len()
        ));
        for item in &group.installments {
            message.push_str(&format!("• {} - {}\n", item.client_name, item.amount()));
        }
        message.push('\n');
    }

    let total: Money = groups
        .iter()
        .flat_map(|g| g.installments.iter())
        .map(|i| i.amount())
        .sum();
    message.push_str(&format!("💰 *Total coming due:* {}\n\n", total));
    message.push_str("---\n_Sent automatically by Rubia POS_");

    Some(message)
}

fn group_heading(days: i64) -> String {
    match days {
        0 => "🔴 *DUE TODAY*".to_string(),
        1 => "⚠️ *DUE TOMORROW*".to_string(),
        d => format!("📅 *DUE IN {} DAYS*", d),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn due(client: &str, cents: i64, due_date: NaiveDate) -> DueReceivable {
        DueReceivable {
            installment_id: format!("i-{}-{}", client, cents),
            sale_id: "s1".to_string(),
            client_name: client.to_string(),
            number: 1,
            amount_cents: cents,
            due_date,
        }
    }

    #[test]
    fn test_grouping_sorts_closest_first() {
        let today = day(2026, 8, 6);
        let items = vec![
            due("Ana", 10000, day(2026, 8, 9)),
            due("Maria", 8000, today),
            due("Carla", 5000, day(2026, 8, 9)),
        ];

        let groups = group_by_days_until_due(items, today);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].days_until_due, 0);
        assert_eq!(groups[0].installments.len(), 1);
        assert_eq!(groups[1].days_until_due, 3);
        assert_eq!(groups[1].installments.len(), 2);
    }

    #[test]
    fn test_digest_contents() {
        let today = day(2026, 8, 6);
        let items = vec![
            due("Maria Silva", 8000, today),
            due("Ana Souza", 10000, day(2026, 8, 8)),
        ];

        let groups = group_by_days_until_due(items, today);
        let message = format_digest(&groups, today).unwrap();

        assert!(message.starts_with("🔔 *RUBIA JOIAS REMINDERS* - 06/08"));
        assert!(message.contains("🔴 *DUE TODAY* (1):"));
        assert!(message.contains("• Maria Silva - R$ 80.00"));
        assert!(message.contains("📅 *DUE IN 2 DAYS* (1):"));
        assert!(message.contains("• Ana Souza - R$ 100.00"));
        assert!(message.contains("💰 *Total coming due:* R$ 180.00"));
        assert!(message.ends_with("_Sent automatically by Rubia POS_"));
    }

    #[test]
    fn test_digest_tomorrow_heading() {
        let today = day(2026, 8, 6);
        let groups = group_by_days_until_due(vec![due("Maria", 100, day(2026, 8, 7))], today);
        let message = format_digest(&groups, today).unwrap();
        assert!(message.contains("⚠️ *DUE TOMORROW* (1):"));
    }

    #[test]
    fn test_empty_feed_produces_no_message() {
        let today = day(2026, 8, 6);
        assert!(format_digest(&[], today).is_none());

        let groups = group_by_days_until_due(Vec::new(), today);
        assert!(format_digest(&groups, today).is_none());
    }
}
