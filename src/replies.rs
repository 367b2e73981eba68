//! Canned assistant messages
//!
//! Every fixed text the controller can emit lives here so the state
//! machine and its tests agree on the exact wording.

use crate::age::{display_age, AgeBand};

pub const DETECTING_AGE: &str = "Hi! I'm Ager, your health AI assistant. I'm detecting your age to provide personalized health guidance...";

pub const NEED_AGE_FIRST: &str = "I need to know your age to provide appropriate health advice. Please go back to the home page and complete the age prediction first.";

pub const CHAT_UNAVAILABLE: &str = "I'm having trouble connecting to my AI system right now. Please try again in a moment, or ask me a different health-related question.";

pub const PARENTING_QUESTION: &str = "Before we start: are you a parent or caregiver? I can switch to parenting mode and focus on your child's health and development. Please answer yes or no.";

pub const PARENTING_REPROMPT: &str = "Please answer yes or no: are you a parent or caregiver?";

/// Topic areas covered in parenting mode, in the order they are announced
pub const PARENTING_TOPICS: [&str; 7] = [
    "child nutrition and feeding",
    "growth and developmental milestones",
    "sleep routines",
    "screen time and digital wellness",
    "physical activity and play",
    "safety and childproofing",
    "behavior and positive parenting",
];

pub const PARENTING_DECLINED: &str = "No problem! I'll keep the focus on your own health. You can switch to parenting mode any time.";

pub const MODE_SWITCHED_TO_HEALTH: &str = "Switched back to health mode. I'll focus on your personal health and wellness again.";

/// Greeting for a freshly detected (or restored) age
pub fn welcome(years: f64) -> String {
    let age = display_age(years);
    match AgeBand::from_years(years) {
        AgeBand::Child => format!("Hi there! I've analyzed your facial features and can see you're {age} years old. Based on your facial development, I'll give you personalized health advice perfect for building healthy habits early!"),
        AgeBand::Teen => format!("Hey! My AI analysis shows you're {age} years old with developing facial features. I'll provide teen-friendly health guidance that considers your unique development stage!"),
        AgeBand::YoungAdult => format!("Hello! My facial analysis indicates you're {age} years old with mature facial features. I'll focus on building sustainable health routines tailored to your development stage!"),
        AgeBand::Midlife => format!("Welcome! My AI analysis shows you're {age} with well-developed facial characteristics. I'll emphasize preventive care and managing age-related changes!"),
        AgeBand::Mature => format!("Greetings! My facial analysis reveals you're {age} years young with mature facial features. I'll focus on maintaining mobility and cognitive health!"),
    }
}

/// Confirmation sent when parenting mode is switched on
pub fn parenting_enabled() -> String {
    let topics = PARENTING_TOPICS
        .iter()
        .enumerate()
        .map(|(i, topic)| format!("{}. {topic}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Parenting mode is on! I'll focus on guidance for raising healthy children, including:\n{topics}\nWhat would you like to know?")
}

/// Notice for the manual mode toggle
pub fn mode_switched(parenting: bool) -> String {
    if parenting {
        parenting_enabled()
    } else {
        MODE_SWITCHED_TO_HEALTH.to_string()
    }
}
