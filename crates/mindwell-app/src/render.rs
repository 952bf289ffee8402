//! Plain-text rendering of archived chats.

use std::fmt::Write;

use mindwell_core::types::{Role, SessionRecord};
use mindwell_storage::{ArchiveEntry, ArchiveStats};

const WIDE_RULE: usize = 80;
const NARROW_RULE: usize = 40;

/// One block per chat: file name, user, message count, time.
pub fn list(entries: &[ArchiveEntry]) -> String {
    let mut out = format!("\nFound {} chat file(s):\n\n", entries.len());
    for entry in entries {
        let _ = writeln!(out, "- {}", entry.file_name);
        let _ = writeln!(out, "  User: {}", entry.record.user_id);
        let _ = writeln!(out, "  Messages: {}", entry.record.message_count);
        let _ = writeln!(out, "  Time: {}", entry.record.timestamp);
        out.push('\n');
    }
    out
}

/// Header, numbered transcript, and the diagnosis if there is one.
pub fn chat(record: &SessionRecord) -> String {
    let rule = "=".repeat(WIDE_RULE);
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "User: {}", record.user_id);
    let _ = writeln!(out, "Thread: {}", record.thread_id);
    let _ = writeln!(out, "Timestamp: {}", record.timestamp);
    let _ = writeln!(out, "Total Messages: {}", record.message_count);
    let _ = writeln!(out, "{}\n", rule);

    for (i, message) in record.messages.iter().enumerate() {
        let speaker = match message.role {
            Role::User => "USER",
            Role::Assistant => "ASSISTANT",
        };
        let _ = writeln!(out, "{}. {}", i + 1, speaker);
        let _ = writeln!(out, "   {}\n", message.content);
    }

    if let Some(diagnosis) = &record.diagnosis {
        let _ = writeln!(out, "Diagnosis ({})", diagnosis.timestamp);
        let _ = writeln!(out, "   Score: {}", diagnosis.score);
        let _ = writeln!(out, "   Analysis: {}", diagnosis.content);
        let _ = writeln!(out, "   Assessment: {}\n", diagnosis.total_guess);
    }
    out
}

pub fn stats(stats: &ArchiveStats) -> String {
    let rule = "=".repeat(NARROW_RULE);
    let mut out = String::new();
    let _ = writeln!(out, "\nChat Statistics");
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Total Chat Sessions: {}", stats.sessions);
    let _ = writeln!(out, "Unique Users: {}", stats.unique_users);
    let _ = writeln!(out, "Total Messages: {}", stats.total_messages);
    if let Some(avg) = stats.average_messages() {
        let _ = writeln!(out, "Avg Messages per Chat: {:.1}", avg);
    }
    let _ = writeln!(out, "{}", rule);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindwell_core::types::{ChatMessage, Diagnosis, SessionKey};

    fn record(diagnosis: Option<&Diagnosis>) -> SessionRecord {
        let key = SessionKey::new("user_abc12345", "abc12345-0000");
        SessionRecord::snapshot(
            &key,
            &[
                ChatMessage::user("Tôi thấy lo lắng"),
                ChatMessage::assistant("Bạn có thể kể thêm không?"),
            ],
            diagnosis,
        )
    }

    #[test]
    fn test_chat_numbers_turns_and_keeps_unicode() {
        let text = chat(&record(None));
        assert!(text.contains("User: user_abc12345"));
        assert!(text.contains("Total Messages: 2"));
        assert!(text.contains("1. USER\n   Tôi thấy lo lắng"));
        assert!(text.contains("2. ASSISTANT\n   Bạn có thể kể thêm không?"));
        assert!(!text.contains("Diagnosis"));
    }

    #[test]
    fn test_chat_includes_diagnosis() {
        let diagnosis =
            Diagnosis::new("6/10", "mild anxiety symptoms", "Generalized Anxiety, mild");
        let text = chat(&record(Some(&diagnosis)));
        assert!(text.contains("   Score: 6/10"));
        assert!(text.contains("   Assessment: Generalized Anxiety, mild"));
    }

    #[test]
    fn test_list() {
        let entries = vec![ArchiveEntry {
            file_name: "user_abc12345_abc12345-0000.json".to_string(),
            record: record(None),
        }];
        let text = list(&entries);
        assert!(text.contains("Found 1 chat file(s)"));
        assert!(text.contains(
            "- user_abc12345_abc12345-0000.json\n  User: user_abc12345\n  Messages: 2"
        ));
    }

    #[test]
    fn test_stats_average_one_decimal() {
        let text = stats(&ArchiveStats {
            sessions: 3,
            unique_users: 2,
            total_messages: 10,
        });
        assert!(text.contains("Total Chat Sessions: 3"));
        assert!(text.contains("Avg Messages per Chat: 3.3"));
    }
}
