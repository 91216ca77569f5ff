//! Canned content for the mock Session API: sample conversations and a
//! keyword-driven responder standing in for retrieval and generation.

use chrono::{DateTime, Duration, Utc};
use regex::{Regex, RegexBuilder};
use tracing::warn;
use uuid::Uuid;

use crate::session::{Conversation, Message, RetrievedContext, Role};

/// A passage the responder can cite.
struct Passage {
    content: &'static str,
    score: f64,
    source: &'static str,
}

/// One answerable subject.
struct Topic {
    pattern: &'static str,
    answer: &'static str,
    passages: &'static [Passage],
}

const UNIFORM: Topic = Topic {
    pattern: r"\b(uniforms?|dress|attire|grooming)\b",
    answer: "## Uniform Requirements\n\
All naval personnel must wear the **prescribed uniform** appropriate to their rank and duty assignment.\n\
- Uniforms are kept *clean* and in serviceable condition\n\
- Working uniforms may be worn while commuting\n\
- Commanding officers may prescribe uniforms within their command\n\n\
Specific requirements are found in sections 2201-2215.",
    passages: &[
        Passage {
            content: "Section 2201: All naval personnel must maintain their uniforms in a clean, serviceable condition. Uniforms shall be properly fitted and conform to current regulations.",
            score: 0.95,
            source: "Navy Regulations Part II, Chapter 22",
        },
        Passage {
            content: "Section 2203: Working uniforms are authorized for wear while commuting and conducting normal business.",
            score: 0.85,
            source: "Navy Regulations Part II, Chapter 22",
        },
        Passage {
            content: "Section 2205: Commanding officers may prescribe appropriate uniforms for personnel within their command.",
            score: 0.75,
            source: "Navy Regulations Part II, Chapter 22",
        },
    ],
};

const LEAVE: Topic = Topic {
    pattern: r"\b(leave|vacation|absence)\b",
    answer: "## Leave Policies\n\
Leave accrues at $2.5$ days per month of active service.\n\
1. Submit the request through your **commanding officer**\n\
2. Attach supporting documentation\n\
3. Await approval before departure\n\n\
*Emergency leave* may be granted for up to 30 days in cases of immediate family emergencies.",
    passages: &[
        Passage {
            content: "Section 3301: Emergency leave may be granted for up to 30 days in cases of immediate family emergencies.",
            score: 0.92,
            source: "Navy Regulations Part II, Chapter 33",
        },
        Passage {
            content: "Section 3302: Extensions beyond 30 days require commanding officer approval and supporting documentation.",
            score: 0.88,
            source: "Navy Regulations Part II, Chapter 33",
        },
    ],
};

const CHAIN_OF_COMMAND: Topic = Topic {
    pattern: r"\b(chain of command|hierarchy|bypass(ing)?|whistleblower)\b",
    answer: "# Chain of Command\n\
All personnel must communicate through **official channels**, following the established hierarchy.\n\
## Exceptions\n\
- Whistleblower complaints\n\
- Equal opportunity complaints\n\
- Reports of illegal activities\n\n\
Unauthorized bypassing may result in *disciplinary action*.",
    passages: &[
        Passage {
            content: "Section 1020: Communication through the chain of command is mandatory except in specified circumstances.",
            score: 0.96,
            source: "Navy Regulations Part II, Chapter 10",
        },
        Passage {
            content: "Section 1021: Exceptions to chain of command include whistleblower complaints and reports of illegal activities.",
            score: 0.89,
            source: "Navy Regulations Part II, Chapter 10",
        },
    ],
};

const CONDUCT: Topic = Topic {
    pattern: r"\b(conduct|behaviou?r|discipline|ethics)\b",
    answer: "## Conduct Expectations\n\
Personnel are expected to uphold the **highest standards** of integrity on and off duty.\n\
- Obey lawful orders promptly\n\
- Treat all persons with dignity and respect\n\
- Avoid conduct that discredits the service",
    passages: &[Passage {
        content: "Section 1101: Persons in the naval service are required to show in themselves a good example of virtue, honor, patriotism and subordination.",
        score: 0.91,
        source: "Navy Regulations Part II, Chapter 11",
    }],
};

static TOPICS: [&Topic; 4] = [&UNIFORM, &LEAVE, &CHAIN_OF_COMMAND, &CONDUCT];

const FALLBACK_ANSWER: &str = "I could not find a regulation that matches this question. \
Try asking about *uniforms*, *leave*, the *chain of command* or *conduct*.";

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn contexts_for(topic: &Topic) -> Vec<RetrievedContext> {
    topic
        .passages
        .iter()
        .map(|p| RetrievedContext {
            id: new_id(),
            content: p.content.to_string(),
            relevance_score: p.score,
            source: p.source.to_string(),
        })
        .collect()
}

/// Picks a canned answer by keyword.
pub struct Responder {
    rules: Vec<(Regex, &'static Topic)>,
}

impl Default for Responder {
    fn default() -> Self {
        Self::new()
    }
}

impl Responder {
    /// Compile the keyword rules.
    #[must_use]
    pub fn new() -> Self {
        let rules = TOPICS
            .iter()
            .filter_map(|&topic| {
                RegexBuilder::new(topic.pattern)
                    .case_insensitive(true)
                    .build()
                    .inspect_err(|e| warn!("Skipping responder rule {}: {}", topic.pattern, e))
                    .ok()
                    .map(|re| (re, topic))
            })
            .collect();
        Self { rules }
    }

    /// Assistant reply to `question`, timestamped `now`.
    #[must_use]
    pub fn reply(&self, question: &str, now: DateTime<Utc>) -> Message {
        let topic = self
            .rules
            .iter()
            .find(|(re, _)| re.is_match(question))
            .map(|&(_, topic)| topic);

        Message {
            id: new_id(),
            role: Role::Assistant,
            content: topic.map_or(FALLBACK_ANSWER, |t| t.answer).to_string(),
            timestamp: now,
            contexts: topic.map(contexts_for).unwrap_or_default(),
        }
    }
}

/// Create a message from the user.
#[must_use]
pub fn user_message(text: &str, now: DateTime<Utc>) -> Message {
    Message {
        id: new_id(),
        role: Role::User,
        content: text.to_string(),
        timestamp: now,
        contexts: Vec::new(),
    }
}

/// The three sample conversations, dated relative to `now`.
#[must_use]
pub fn sample_conversations(responder: &Responder, now: DateTime<Utc>) -> Vec<Conversation> {
    [
        (
            "Uniform Regulations",
            "What are the general regulations regarding uniform requirements?",
            5,
        ),
        (
            "Leave Policies",
            "Can you explain the emergency leave policy?",
            30,
        ),
        (
            "Chain of Command",
            "What does the regulation say about bypassing the chain of command?",
            60,
        ),
    ]
    .into_iter()
    .map(|(title, question, minutes_ago)| {
        let asked = now - Duration::minutes(minutes_ago);
        let answered = asked + Duration::seconds(30);
        Conversation {
            id: new_id(),
            title: title.to_string(),
            messages: vec![
                user_message(question, asked),
                responder.reply(question, answered),
            ],
            created_at: asked,
            updated_at: answered,
        }
    })
    .collect()
}
