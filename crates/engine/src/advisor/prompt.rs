use giftwise_common::types::GiftRequest;

use crate::llm::types::Message;
use crate::tools::handlers::ANALYZE_GIFT_DATE;

/// Build the opening log for a run: the system prompt followed by one user
/// message describing the recipient.
pub fn build_initial_messages(system_prompt: &str, request: &GiftRequest) -> Vec<Message> {
    vec![
        Message::system(system_prompt),
        Message::user(format_recipient_message(request)),
    ]
}

fn format_recipient_message(request: &GiftRequest) -> String {
    let mut message = format!(
        "## Gift Request\n\n**Recipient:** {}\n**Age:** {}\n**Hobbies/Interests:** {}\n**Occasion:** {}\n",
        request.name,
        request.age,
        request.hobbies.as_deref().unwrap_or("not specified"),
        request.occasion,
    );

    match &request.gift_date {
        Some(date) => {
            message.push_str(&format!("**Gift Date:** {}\n", date));
            message.push_str(&format!(
                "\nBefore suggesting anything, call `{}` with giftDate \"{}\" and use the season, weather, and timing it returns.\n",
                ANALYZE_GIFT_DATE, date
            ));
        }
        None => message.push_str("\nNo gift date was given, so do not assume a season.\n"),
    }

    message.push_str(
        "\nSuggest exactly 5 gifts ranked by fit. Respond with only a JSON object of the form \
         {\"gifts\": [{\"name\": string, \"description\": string, \"fit_score\": integer 1-100, \"reasoning\": string}]} \
         and no other text.\n",
    );

    message
}
