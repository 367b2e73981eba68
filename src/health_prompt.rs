//! Health chat prompt construction
//!
//! Builds the single-turn prompt sent to the model for each user message:
//! who the user is (age, group, mode), what was discussed recently, which
//! health areas to focus on, and how to answer.

use crate::age::AgeBand;
use crate::llm::ChatRequest;
use std::fmt::Write;

/// How many past exchanges feed the repeated-topic check
const RECENT_TOPIC_WINDOW: usize = 3;

const PARENTING_FOCUS: &str = r"You are now in PARENTING MODE. Focus on providing expert guidance for parents/caregivers about child development, including:
- Child nutrition and feeding (breastfeeding, solid foods, healthy eating habits)
- Physical development milestones and activities
- Sleep routines and schedules for different ages
- Screen time management and digital wellness
- Physical activities, play, and exercise for children
- Safety and childproofing tips
- Behavioral guidance and positive parenting
- Health and wellness for children and infants
- Age-appropriate activities and learning
- Common parenting challenges and solutions";

const MINOR_SAFETY: &str = "ALWAYS prioritize safety. Use simple, encouraging language. Never suggest dangerous activities. Encourage talking to trusted adults.";

const ADULT_SAFETY: &str =
    "Provide comprehensive health information while maintaining professional tone.";

const RESPONSE_RULES: &str = r"RESPONSE REQUIREMENTS (be concise):
1. ONLY respond to health-related topics - if the question is NOT health-related, politely redirect to health topics
2. Provide direct, personalized answers to their specific health question
3. Consider their age and development stage when relevant
4. Be conversational and natural - avoid repetitive formats or always giving tips
5. Only provide tips when specifically asked or when they would be genuinely helpful
6. Use age-appropriate language and safety considerations
7. For minors: Use encouraging, simple language and emphasize talking to trusted adults
8. For adults: Provide comprehensive information while recommending professional consultation when appropriate
9. Vary your response style - don't always follow the same structure

IMPORTANT (style):
- Don't always give tips unless specifically requested
- Focus on answering their question directly
- Only include safety disclaimers when relevant to the specific question
- If this is a repetitive topic, acknowledge it briefly and provide new insights or different angles
- Use the conversation history to provide continuity without repetition

CONCISENESS:
- Keep the response brief: 3-6 short sentences, ideally under 120 words.
- If listing steps, use max 3 bullets, each very short.";

fn band_focus(band: AgeBand) -> &'static str {
    match band {
        AgeBand::Child => "Focus on: basic hygiene, healthy eating habits, physical activity, sleep routines, and safety.",
        AgeBand::Teen => "Focus on: nutrition for growth, exercise for development, mental health awareness, sleep hygiene, and avoiding risky behaviors.",
        AgeBand::YoungAdult => "Focus on: establishing healthy routines, stress management, fitness goals, career-related health, and preventive care.",
        AgeBand::Midlife => "Focus on: maintaining fitness, managing stress, preventive screenings, work-life balance, and addressing age-related changes.",
        AgeBand::Mature => "Focus on: maintaining mobility, cognitive health, chronic disease management, social connections, and preventive care.",
    }
}

/// Build the full prompt for one chat request
pub fn build_health_prompt(request: &ChatRequest) -> String {
    let minor = request.age_group.is_minor();
    let recent_topics = request.recent_topics(RECENT_TOPIC_WINDOW);
    let repetitive = request.is_repetitive(&recent_topics);

    let focus = if request.parenting_mode {
        PARENTING_FOCUS
    } else {
        band_focus(AgeBand::from_years(request.age))
    };

    let mut prompt = String::from(
        "You are Ager, an AI health assistant that knows the user's estimated age. You provide personalized, dynamic health guidance.\n\n",
    );

    let _ = writeln!(prompt, "USER ANALYSIS:");
    let _ = writeln!(prompt, "- Age: {} years old", request.age);
    let _ = writeln!(
        prompt,
        "- Age Group: {} ({})",
        request.age_group,
        if minor { "minor" } else { "adult" }
    );
    let _ = writeln!(
        prompt,
        "- Mode: {}",
        if request.parenting_mode {
            "PARENTING MODE - Focus on child development and parenting guidance"
        } else {
            "HEALTH MODE - Focus on personal health guidance"
        }
    );
    let _ = writeln!(
        prompt,
        "- Safety Level: {}\n",
        if minor {
            "HIGH - User is a minor"
        } else {
            "Standard adult guidance"
        }
    );

    let _ = writeln!(prompt, "CONVERSATION CONTEXT:");
    if recent_topics.is_empty() {
        let _ = writeln!(prompt, "- Recent topics discussed: None");
    } else {
        let _ = writeln!(
            prompt,
            "- Recent topics discussed: {}",
            recent_topics.join("; ")
        );
    }
    let _ = writeln!(
        prompt,
        "- Is this a repetitive topic: {}",
        if repetitive {
            "Yes - avoid repeating previous advice"
        } else {
            "No - fresh topic"
        }
    );
    let _ = writeln!(prompt, "- User's current question: \"{}\"\n", request.message);

    let _ = writeln!(prompt, "HEALTH FOCUS:\n{focus}\n");
    let _ = writeln!(
        prompt,
        "SAFETY GUIDELINES:\n{}\n",
        if minor { MINOR_SAFETY } else { ADULT_SAFETY }
    );
    let _ = writeln!(prompt, "{RESPONSE_RULES}\n");
    if request.parenting_mode {
        let _ = writeln!(prompt, "In PARENTING MODE: focus on child development, nutrition, activities, safety, and parenting challenges. Provide practical, evidence-based advice for raising healthy children.\n");
    }
    let _ = write!(
        prompt,
        "USER QUESTION: \"{}\"\n\nProvide a direct, helpful response to their health question. Be conversational and natural.",
        request.message
    );

    prompt
}

/// Strip markdown decoration the chat UI would show literally
pub fn clean_markdown(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| !matches!(c, '*' | '_' | '`' | '#'))
        .collect();
    stripped.replace("  ", " ").trim().to_string()
}
