//! Plain-text rendering for command output

use fieldops_chat::{ChatEvent, ConnectionState, Message};
use fieldops_session::{GuardDecision, Locale, Theme, UserProfile};

/// `[2024-05-01 10:00] Jan Kowalski: hello`
pub fn format_message(message: &Message, show_timestamps: bool) -> String {
    let sender = if message.sender_name.is_empty() {
        format!("#{}", message.sender_id)
    } else {
        message.sender_name.clone()
    };

    match message.sent_at().filter(|_| show_timestamps) {
        Some(at) => format!(
            "[{}] {}: {}",
            at.format("%Y-%m-%d %H:%M"),
            sender,
            message.content
        ),
        None => format!("{}: {}", sender, message.content),
    }
}

pub fn format_profile(profile: &UserProfile) -> String {
    let role = match (&profile.technician_profile, profile.is_admin()) {
        (None, _) => "not activated".to_string(),
        (Some(t), true) => format!("administrator of company {}", t.company),
        (Some(t), false) => format!("technician in company {}", t.company),
    };

    let mut lines = vec![
        format!("{} ({})", profile.display_name(), profile.username),
        format!("Role:  {}", role),
    ];
    if !profile.email.is_empty() {
        lines.push(format!("Email: {}", profile.email));
    }
    lines.join("\n")
}

pub fn format_decision(target: &str, decision: &GuardDecision) -> String {
    match decision {
        GuardDecision::Allow => format!("{}: allowed", target),
        GuardDecision::Redirect(to) => format!("{}: redirected to {}", target, to),
    }
}

pub fn format_preferences(locale: Locale, theme: Theme) -> String {
    format!("Locale: {}\nTheme:  {}", locale, theme)
}

/// One line per chat event; `None` for events not worth printing
pub fn format_event(event: &ChatEvent, show_timestamps: bool) -> Option<String> {
    match event {
        ChatEvent::MessageReceived(message) => Some(format_message(message, show_timestamps)),
        ChatEvent::StateChanged(ConnectionState::Open) => Some("-- connected --".to_string()),
        ChatEvent::StateChanged(ConnectionState::Closed) => Some("-- disconnected --".to_string()),
        ChatEvent::StateChanged(_) => None,
        ChatEvent::HistoryLoaded { added, has_more } => Some(format!(
            "-- loaded {} older messages{} --",
            added,
            if *has_more { "" } else { ", no more history" }
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldops_session::{NavigationTarget, RouteName, TechnicianProfile};

    fn message(timestamp: &str) -> Message {
        Message {
            id: 1,
            sender_id: 3,
            sender_name: "Jan Kowalski".to_string(),
            content: "hello".to_string(),
            timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn test_format_message() {
        let m = message("2024-05-01T10:00:00.123456+00:00");
        assert_eq!(format_message(&m, true), "[2024-05-01 10:00] Jan Kowalski: hello");
        assert_eq!(format_message(&m, false), "Jan Kowalski: hello");

        // Unparsable timestamps are left out
        assert_eq!(format_message(&message("yesterday"), true), "Jan Kowalski: hello");
    }

    #[test]
    fn test_format_message_without_name() {
        let mut m = message("");
        m.sender_name.clear();
        assert_eq!(format_message(&m, true), "#3: hello");
    }

    #[test]
    fn test_format_profile() {
        let mut profile = UserProfile {
            id: 1,
            username: "jan".to_string(),
            email: String::new(),
            first_name: "Jan".to_string(),
            last_name: "Kowalski".to_string(),
            technician_profile: None,
        };
        assert!(format_profile(&profile).contains("not activated"));

        profile.technician_profile = Some(TechnicianProfile {
            id: 2,
            company: 9,
            is_admin: true,
        });
        let text = format_profile(&profile);
        assert!(text.starts_with("Jan Kowalski (jan)"));
        assert!(text.contains("administrator of company 9"));
        assert!(!text.contains("Email"));
    }

    #[test]
    fn test_format_decision() {
        let redirect = GuardDecision::Redirect(
            NavigationTarget::route(RouteName::Login).with_redirect("/tickets"),
        );
        assert_eq!(
            format_decision("/tickets", &redirect),
            "/tickets: redirected to login (redirect=/tickets)"
        );
        assert_eq!(format_decision("home", &GuardDecision::Allow), "home: allowed");
    }

    #[test]
    fn test_format_event() {
        assert!(format_event(&ChatEvent::StateChanged(ConnectionState::Connecting), true).is_none());
        assert_eq!(
            format_event(&ChatEvent::HistoryLoaded { added: 3, has_more: false }, true),
            Some("-- loaded 3 older messages, no more history --".to_string())
        );
    }
}
