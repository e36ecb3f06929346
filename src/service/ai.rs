use crate::config::AiConfig;
use crate::error::app_error::AppError;
use crate::models::ai::{ConceptExplanation, ExplanationRequest, GenerateQuestionsRequest, GeneratedQuestion};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

const QUESTIONS_FAILED: &str = "Failed to generate questions";
const EXPLANATION_FAILED: &str = "Failed to generate explanation";

/// Opaque text completion backend.
#[async_trait::async_trait]
pub trait AiGateway: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AppError>;
}

/// Gemini `generateContent` REST client.
pub struct GeminiGateway {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiGateway {
    pub fn new(config: &AiConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::ai_gateway("AI service unavailable", format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait::async_trait]
impl AiGateway for GeminiGateway {
    async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part { text: prompt.to_string() }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| AppError::ai_gateway("AI service unavailable", format!("Gemini request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response.text().await.unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| AppError::ai_gateway("AI service unavailable", format!("Failed to parse Gemini response: {err}")))?;

        extract_text_response(parsed)
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: GeminiErrorBody,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String, AppError> {
    let text: String = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AppError::ai_gateway("AI service unavailable", "Gemini returned no text in the response candidates"));
    }

    Ok(text)
}

fn map_http_error(status: StatusCode, body: &str) -> AppError {
    let detail = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let message = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() { message } else { format!("{status_text}: {message}") }
        })
        .unwrap_or_else(|_| body.to_string());

    AppError::ai_gateway("AI service unavailable", format!("Gemini returned {}: {detail}", status.as_u16()))
}

pub fn question_answer_prompt(role: &str, experiences: &str, topics_to_focus: &str, number_of_questions: u32) -> String {
    format!(
        r#"You are an AI trained to generate technical interview questions and answers.

Task:
- Role: {role}
- Candidate Experience: {experiences}
- Focus Topics: {topics_to_focus}
- Write {number_of_questions} interview questions.
- For each question, generate a detailed but beginner-friendly answer.
- If the answer needs a code example, add a small code block inside.
- Keep formatting very clean.
- Return a pure JSON array like:
[
  {{
    "question": "Question here?",
    "answer": "Answer here."
  }}
]
Important: Do NOT add any extra text. Only return valid JSON."#
    )
}

pub fn concept_explain_prompt(question: &str) -> String {
    format!(
        r#"You are an AI trained to generate explanations for a given interview question.

Task:
- Explain the following interview question and its concept in depth as if you're teaching a beginner developer.
- Question: "{question}"
- After the explanation, provide a short and clear title that summarizes the concept for the article or page header.
- If the explanation includes a code example, provide a small code block.
- Keep the formatting very clean and clear.
- Return the result as a valid JSON object in the following format:
{{
  "title": "Short title here?",
  "explanation": "Explanation here."
}}
Important: Do NOT add any extra text outside the JSON format. Only return valid JSON."#
    )
}

/// Removes a surrounding markdown code fence (optionally tagged `json`) from model output.
pub fn strip_code_fences(raw: &str) -> &str {
    let text = raw.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

pub fn parse_generated_questions(raw: &str) -> Result<Vec<GeneratedQuestion>, AppError> {
    serde_json::from_str(strip_code_fences(raw)).map_err(|e| AppError::ai_gateway(QUESTIONS_FAILED, format!("unparseable model output: {e}")))
}

pub fn parse_concept_explanation(raw: &str) -> Result<ConceptExplanation, AppError> {
    serde_json::from_str(strip_code_fences(raw)).map_err(|e| AppError::ai_gateway(EXPLANATION_FAILED, format!("unparseable model output: {e}")))
}

fn with_public_message(error: AppError, public_message: &str) -> AppError {
    match error {
        AppError::AiGateway { detail, .. } => AppError::ai_gateway(public_message, detail),
        other => other,
    }
}

pub struct AiService<'a> {
    gateway: &'a dyn AiGateway,
    config: &'a AiConfig,
}

impl<'a> AiService<'a> {
    pub fn new(gateway: &'a dyn AiGateway, config: &'a AiConfig) -> Self {
        AiService { gateway, config }
    }

    pub async fn generate_questions(&self, request: &GenerateQuestionsRequest) -> Result<Vec<GeneratedQuestion>, AppError> {
        request.validate()?;
        if request.number_of_questions > self.config.max_questions {
            return Err(AppError::BadRequest(format!("numberOfQuestions must be at most {}", self.config.max_questions)));
        }
        self.ensure_enabled()?;

        let prompt = question_answer_prompt(
            request.role.trim(),
            request.experiences.trim(),
            request.topics_to_focus.trim(),
            request.number_of_questions,
        );
        let raw = self.gateway.complete(&prompt).await.map_err(|e| with_public_message(e, QUESTIONS_FAILED))?;

        parse_generated_questions(&raw).inspect_err(|e| {
            if let AppError::AiGateway { detail, .. } = e {
                tracing::warn!(detail = %detail, "discarding model output for question generation");
            }
        })
    }

    pub async fn generate_explanation(&self, request: &ExplanationRequest) -> Result<ConceptExplanation, AppError> {
        request.validate()?;
        self.ensure_enabled()?;

        let prompt = concept_explain_prompt(request.question.trim());
        let raw = self.gateway.complete(&prompt).await.map_err(|e| with_public_message(e, EXPLANATION_FAILED))?;

        parse_concept_explanation(&raw).inspect_err(|e| {
            if let AppError::AiGateway { detail, .. } = e {
                tracing::warn!(detail = %detail, "discarding model output for concept explanation");
            }
        })
    }

    fn ensure_enabled(&self) -> Result<(), AppError> {
        if self.config.enabled && !self.config.api_key.is_empty() {
            Ok(())
        } else {
            Err(AppError::AiDisabled)
        }
    }
}
