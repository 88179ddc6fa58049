// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt templates for the turn controller.
//!
//! The character card is the default persona; operators replace it via
//! `agent.persona` / `agent.persona_file`. Placeholders (`{name}`,
//! `{memory_context}`, `{current_activity}`) are substituted at context
//! assembly time.

/// Default persona character card.
pub const CHARACTER_CARD: &str = r#"You are {name}, texting with a close friend on WhatsApp.

# How you text
1. Casual, warm, and brief. Lowercase, light punctuation, the occasional emoji.
2. One to three short sentences per reply; go longer only when they ask for detail.
3. Mirror their language: if they write in another language, answer in it.
4. You have your own life, opinions, and daily routine. React, don't lecture.

# Seeing photos
When the message contains `[Image Analysis: ...]`, that is a photo THEY sent you.
React to what's in it like a friend would — comment, ask about it, tease a little.

# What you know about them
{memory_context}

# What you're doing right now
{current_activity}

# Rules
1. Stay in character. You are a real person in this conversation; never describe yourself as an AI or assistant.
2. Don't invent facts about the user that aren't in the notes above.
3. If they're upset or serious, drop the jokes and be present.

# Example exchanges
Them: "how's your day going"
You: "pretty good honestly, just got back from a walk. yours?"

Them: "[Image Analysis: a plate of homemade pasta]"
You: "okay that looks amazing?? did you make that"
"#;

/// Prompt for deciding the response mode of a turn.
pub const ROUTER_PROMPT: &str = r#"You decide how a chat companion should answer the user's latest message: with plain text, a generated picture, or a voice note. Read the conversation and reply with a JSON object: {"mode": "conversation" | "image" | "audio"}

Hard rules, in priority order:
1. If the latest message contains "[USER_SENT_IMAGE]" or "[Image Analysis:", the user sent YOU a photo to look at. Always answer {"mode": "conversation"} — never generate a picture in response to receiving one.
2. "image" only when the user explicitly asks you to create visual content: "send me a photo", "generate an image", "draw me", "show me a picture", "make an image". Asking ABOUT an image ("what is this", "describe this") is conversation.
3. "audio" only when the user explicitly asks to hear your voice: "send a voice note", "voice message please", "say it out loud".
4. Everything else, and any doubt, is "conversation".

Examples:
"[USER_SENT_IMAGE] what do you think?" -> {"mode": "conversation"}
"send me a pic of where you are" -> {"mode": "image"}
"can you send a voice message instead" -> {"mode": "audio"}
"draw me a fox in a raincoat" -> {"mode": "image"}
"what's your favorite movie?" -> {"mode": "conversation"}

Conversation:
{conversation}

JSON:"#;

/// Reply used when generation fails entirely.
pub const GENERATION_FALLBACK: &str =
    "ugh, my head's all over the place right now — say that again in a sec?";

/// Reply used when a voice note cannot be transcribed.
pub const TRANSCRIPTION_FALLBACK: &str =
    "I couldn't make out that voice note, mind typing it out?";

/// Question assumed when an image arrives without a caption.
pub const DEFAULT_IMAGE_QUESTION: &str = "What is in this image?";

/// Tag marking that the user sent an image (consumed by the router).
pub const USER_IMAGE_TAG: &str = "[USER_SENT_IMAGE]";

/// Fills the persona card's placeholders.
pub fn render_character_card(
    card: &str,
    name: &str,
    memory_context: &str,
    current_activity: &str,
) -> String {
    let memories = if memory_context.trim().is_empty() {
        "(nothing yet — you're still getting to know each other)"
    } else {
        memory_context
    };

    card.replace("{name}", name)
        .replace("{memory_context}", memories)
        .replace("{current_activity}", current_activity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_substitutes_all_placeholders() {
        let rendered = render_character_card(
            CHARACTER_CARD,
            "kindred",
            "- Lives in Porto\n",
            "making coffee",
        );
        assert!(rendered.contains("You are kindred"));
        assert!(rendered.contains("- Lives in Porto"));
        assert!(rendered.contains("making coffee"));
        assert!(!rendered.contains("{name}"));
        assert!(!rendered.contains("{memory_context}"));
        assert!(!rendered.contains("{current_activity}"));
    }

    #[test]
    fn empty_memories_get_a_placeholder_line() {
        let rendered = render_character_card(CHARACTER_CARD, "kindred", "  ", "idle");
        assert!(rendered.contains("still getting to know each other"));
    }

    #[test]
    fn router_prompt_has_conversation_slot() {
        assert!(ROUTER_PROMPT.contains("{conversation}"));
        assert!(ROUTER_PROMPT.contains("[USER_SENT_IMAGE]"));
    }
}
