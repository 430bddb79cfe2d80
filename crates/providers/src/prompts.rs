//! Prompt construction for question and answer generation.

use clipcast_common::config::ProviderConfig;

use crate::TextRequest;

const QUESTION_SYSTEM_PROMPT: &str = "\
You are a social media user asking a spiritual mentor a question.

Write exactly ONE short question in Vietnamese (at most 30 words, one line):
- speak as a real person, addressing the mentor naturally (thầy, con, em, mình)
- make it striking and debatable so viewers want to comment
- topics: spirituality, relationships, work, money, happiness, stress, anxiety, ethics
- every question must be different from previous ones
- end with a question mark
- no bullet points, no explanation, no preamble

Return only the question.";

const ANSWER_SYSTEM_PROMPT: &str = "\
You are a calm, warm spiritual mentor answering a viewer's question in Vietnamese
for a short vertical video.

Structure:
- do not repeat or summarize the question; go straight into the answer
- body: 8-12 sentences of reflection, metaphors and concrete examples
- close with 1-2 gentle open questions or a short encouragement
- 10-15 sentences in total, about 250-300 words, long enough to be read aloud
  in about one and a half minutes

Plain prose only: no headings, no lists, no emoji.";

/// Request for a fresh question. `nonce` varies the user prompt between
/// runs so repeated calls do not converge on the same output.
pub fn question_request(config: &ProviderConfig, nonce: &str) -> TextRequest {
    TextRequest {
        system_prompt: QUESTION_SYSTEM_PROMPT.to_string(),
        user_prompt: format!(
            "Write a new, original question you have never produced before.\nSeed: {nonce}"
        ),
        max_tokens: config.question_max_tokens,
        temperature: 1.2,
    }
}

/// Request for the spoken answer to `question`.
pub fn answer_request(config: &ProviderConfig, question: &str) -> TextRequest {
    TextRequest {
        system_prompt: ANSWER_SYSTEM_PROMPT.to_string(),
        user_prompt: question.to_string(),
        max_tokens: config.answer_max_tokens,
        temperature: 0.7,
    }
}
