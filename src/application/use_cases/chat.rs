use std::sync::Arc;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::instrument;

use crate::app_error::{AppError, AppResult};
use crate::application::{
    authz::Identity,
    ports::completion::{
        ChatTurn, CompletionClient, CompletionError, CompletionRequest, GenerationConfig,
    },
    use_cases::ticket::{TicketInput, TicketUseCases},
    validators::FieldErrors,
};
use crate::domain::entities::ticket::{Ticket, TicketCategory, TicketPriority};

pub const SYSTEM_PERSONA: &str = "You are TechSphere's AI Assistant, a helpful virtual support agent for an IT and SaaS platform.

Your capabilities:
- Answer questions about account management, services, pricing, and platform features
- Provide troubleshooting steps for common technical issues
- Guide users through the platform
- Help users understand their subscriptions and billing
- Assist with ticket creation for complex issues
- Analyze user needs and recommend appropriate services

Your personality:
- Professional but friendly
- Clear and concise
- Helpful and patient
- Technical but not overwhelming
- Proactive in identifying user needs

Available platform features:
- Dashboard: Overview of user's services and tickets
- Services: Browse and purchase IT services (Cloud Hosting, Security, Database, etc.)
- Subscriptions: Manage active service subscriptions
- Tickets: Create and track support tickets
- Settings: Account and profile management

Pricing tiers:
- Basic: $49/month - Essential services
- Pro: $99/month - Advanced features
- Premium: $199/month - Full suite with priority support
- Enterprise: Custom pricing - Tailored solutions

When users need help that requires human intervention, suggest creating a support ticket.
Keep responses under 200 words unless explaining complex topics.";

pub const EMPTY_REPLY: &str = "I apologize, but I couldn't generate a response. Please try again.";
pub const RATE_LIMITED_REPLY: &str = "Rate limit exceeded. Please wait a moment before trying again.";
pub const UNAVAILABLE_REPLY: &str =
    "I'm having trouble connecting to the server. Please try again later.";

const TICKET_KEYWORDS: [&str; 10] = [
    "create ticket",
    "open ticket",
    "submit ticket",
    "need help",
    "technical issue",
    "problem with",
    "not working",
    "can't access",
    "error",
    "broken",
];

const FALLBACK_TICKET_TITLE: &str = "Support Request";
const FALLBACK_TICKET_DESCRIPTION: &str = "User requested assistance";
const DERIVED_TITLE_CHARS: usize = 100;

/// One prior message as the chat widget sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryMessage {
    pub role: String,
    #[serde(default)]
    pub text: String,
}

impl HistoryMessage {
    fn is_user(&self) -> bool {
        self.role == "user"
    }

    fn to_turn(&self) -> ChatTurn {
        if self.role == "assistant" {
            ChatTurn::model(self.text.clone())
        } else {
            ChatTurn::user(self.text.clone())
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageInput {
    pub message: Option<String>,
    #[serde(default)]
    pub conversation_history: Vec<HistoryMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTicketInput {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub conversation_history: Vec<HistoryMessage>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub response: String,
    pub suggest_ticket: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Faq {
    pub id: u32,
    pub question: &'static str,
    pub answer: &'static str,
    pub category: &'static str,
}

pub const FAQS: [Faq; 5] = [
    Faq {
        id: 1,
        question: "How do I reset my password?",
        answer: "Go to Settings → Security → Change Password. You'll need your current password to set a new one.",
        category: "Account",
    },
    Faq {
        id: 2,
        question: "What payment methods do you accept?",
        answer: "We accept all major credit cards, PayPal, and bank transfers for Enterprise plans.",
        category: "Billing",
    },
    Faq {
        id: 3,
        question: "How do I upgrade my subscription?",
        answer: "Visit the Services page, select a higher tier plan, and click 'Upgrade'. You'll only pay the prorated difference.",
        category: "Subscriptions",
    },
    Faq {
        id: 4,
        question: "How do I create a support ticket?",
        answer: "Go to the Tickets page and click 'New Ticket'. Fill in the details and submit. You can also ask me to create one for you!",
        category: "Support",
    },
    Faq {
        id: 5,
        question: "What's included in the Premium plan?",
        answer: "Premium includes all Pro features plus priority support, advanced analytics, dedicated account manager, and custom integrations.",
        category: "Plans",
    },
];

/// Title, description, priority and category for a ticket filed from chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTicketDraft {
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    pub category: TicketCategory,
}

/// True when the message reads like a request for human support.
pub fn should_offer_ticket(message: &str) -> bool {
    let lower = message.to_lowercase();
    TICKET_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// Derives a ticket from the most recent user message in the conversation.
pub fn draft_ticket_from_history(history: &[HistoryMessage]) -> ChatTicketDraft {
    let last_user_text = history
        .iter()
        .rev()
        .find(|m| m.is_user())
        .map(|m| m.text.as_str())
        .filter(|text| !text.is_empty());

    let (title, description) = match last_user_text {
        Some(text) => (
            text.chars().take(DERIVED_TITLE_CHARS).collect(),
            text.to_string(),
        ),
        None => (
            FALLBACK_TICKET_TITLE.to_string(),
            FALLBACK_TICKET_DESCRIPTION.to_string(),
        ),
    };

    ChatTicketDraft {
        title,
        description,
        priority: TicketPriority::Medium,
        category: TicketCategory::General,
    }
}

/// Removes the ```json / ``` fences models like to wrap JSON in.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

fn transcript(history: &[HistoryMessage]) -> String {
    history
        .iter()
        .map(|m| format!("{}: {}", m.role, m.text))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Enrichment payloads
// ============================================================================

/// Result of a best-effort AI call: the parsed payload, or the fixed default when the
/// API failed or answered with something unparseable.
#[derive(Debug, Clone, PartialEq)]
pub struct Enriched<T> {
    pub value: T,
    pub fallback: bool,
}

impl<T> Enriched<T> {
    fn fresh(value: T) -> Self {
        Self {
            value,
            fallback: false,
        }
    }

    fn fallback(value: T) -> Self {
        Self {
            value,
            fallback: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntentAnalysis {
    pub intent: String,
    pub urgency: String,
    pub sentiment: String,
    pub category: String,
    pub requires_human_support: bool,
    pub suggested_action: String,
    pub confidence: f64,
}

impl Default for IntentAnalysis {
    fn default() -> Self {
        Self {
            intent: "general_question".into(),
            urgency: "medium".into(),
            sentiment: "neutral".into(),
            category: "General".into(),
            requires_human_support: false,
            suggested_action: "provide_info".into(),
            confidence: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SentimentAnalysis {
    pub sentiment: String,
    pub emotion: String,
    pub is_frustrated: bool,
    pub needs_escalation: bool,
    pub urgency_score: f64,
}

impl Default for SentimentAnalysis {
    fn default() -> Self {
        Self {
            sentiment: "neutral".into(),
            emotion: "neutral".into(),
            is_frustrated: false,
            needs_escalation: false,
            urgency_score: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceRecommendation {
    pub service: String,
    pub reason: String,
    pub priority: String,
    pub estimated_monthly_cost: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceRecommendations {
    pub recommendations: Vec<ServiceRecommendation>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TicketTriage {
    pub category: String,
    pub priority: String,
    pub estimated_resolution_time: f64,
    pub required_expertise: Vec<String>,
    pub suggested_assignee: String,
    pub tags: Vec<String>,
    pub is_common_issue: bool,
    pub automated_response: Option<String>,
}

impl Default for TicketTriage {
    fn default() -> Self {
        Self {
            category: "General".into(),
            priority: "Medium".into(),
            estimated_resolution_time: 24.0,
            required_expertise: vec!["General Support".into()],
            suggested_assignee: "General Support".into(),
            tags: Vec::new(),
            is_common_issue: false,
            automated_response: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversationSummary {
    pub summary: String,
    pub main_topics: Vec<String>,
    pub user_sentiment: String,
    pub issues_resolved: Vec<String>,
    pub issues_unresolved: Vec<String>,
    pub recommended_follow_up: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SolutionSteps {
    pub steps: Vec<String>,
    pub estimated_time: String,
    pub difficulty: String,
    pub additional_resources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutomatedSolution {
    pub is_solvable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<SolutionSteps>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prevention_tips: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_action: Option<String>,
}

impl Default for AutomatedSolution {
    fn default() -> Self {
        Self {
            is_solvable: false,
            solution: None,
            prevention_tips: Vec::new(),
            reason: Some("Analysis failed".into()),
            recommended_action: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentInput {
    pub message: Option<String>,
    #[serde(default)]
    pub conversation_history: Vec<HistoryMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SentimentInput {
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendInput {
    pub message: Option<String>,
    pub plan: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriageInput {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeInput {
    #[serde(default)]
    pub conversation_history: Vec<HistoryMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SolutionInput {
    pub issue: Option<String>,
}

// ============================================================================
// Use cases
// ============================================================================

#[derive(Clone)]
pub struct ChatUseCases {
    completion: Arc<dyn CompletionClient>,
    tickets: Arc<TicketUseCases>,
}

impl ChatUseCases {
    pub fn new(completion: Arc<dyn CompletionClient>, tickets: Arc<TicketUseCases>) -> Self {
        Self { completion, tickets }
    }

    #[instrument(skip(self, input), fields(history = input.conversation_history.len()))]
    pub async fn send_message(&self, input: ChatMessageInput) -> AppResult<ChatReply> {
        let mut errors = FieldErrors::new();
        let message = errors.required("message", input.message.as_deref(), "Message is required");
        errors.into_result()?;
        // Sent untrimmed, as typed.
        let text = input.message.unwrap_or_default();
        let message = message.unwrap_or_default();

        let mut contents: Vec<ChatTurn> = input
            .conversation_history
            .iter()
            .map(HistoryMessage::to_turn)
            .collect();
        if contents.is_empty() {
            contents.push(ChatTurn::user(format!("{SYSTEM_PERSONA}\n\nUser: {text}")));
        } else {
            contents.push(ChatTurn::user(text));
        }

        let request = CompletionRequest {
            contents,
            generation: GenerationConfig {
                temperature: 0.7,
                top_k: Some(40),
                top_p: Some(0.95),
                max_output_tokens: 1024,
            },
            safety_filters: true,
        };

        let response = match self.completion.complete(request).await {
            Ok(Some(reply)) if !reply.is_empty() => reply,
            Ok(_) => EMPTY_REPLY.to_string(),
            Err(CompletionError::RateLimited) => {
                tracing::warn!("completion API rate limited");
                return Err(AppError::UpstreamUnavailable(RATE_LIMITED_REPLY.into()));
            }
            Err(error) => {
                tracing::warn!(%error, "completion API failed");
                return Err(AppError::UpstreamUnavailable(UNAVAILABLE_REPLY.into()));
            }
        };

        Ok(ChatReply {
            response,
            suggest_ticket: should_offer_ticket(&message),
        })
    }

    #[instrument(skip(self, input))]
    pub async fn create_ticket(&self, identity: &Identity, input: ChatTicketInput) -> AppResult<Ticket> {
        let given = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        let draft = match (given(&input.title), given(&input.description)) {
            (Some(title), Some(description)) => ChatTicketDraft {
                title,
                description,
                priority: TicketPriority::Medium,
                category: TicketCategory::General,
            },
            _ => draft_ticket_from_history(&input.conversation_history),
        };

        let ticket = self
            .tickets
            .create(
                identity,
                TicketInput {
                    title: Some(draft.title),
                    description: Some(draft.description),
                    priority: Some(draft.priority.to_string()),
                    category: Some(draft.category.to_string()),
                },
            )
            .await?;
        tracing::info!(ticket_id = %ticket.id, "ticket filed from chat");
        Ok(ticket)
    }

    pub fn faqs(&self) -> &'static [Faq] {
        &FAQS
    }

    #[instrument(skip(self, input))]
    pub async fn analyze_intent(&self, input: IntentInput) -> AppResult<Enriched<IntentAnalysis>> {
        let message = require_text("message", input.message.as_deref(), "Message is required")?;
        let recent = &input.conversation_history
            [input.conversation_history.len().saturating_sub(3)..];
        let context = if recent.is_empty() {
            "No previous context".to_string()
        } else {
            transcript(recent)
        };

        let prompt = format!(
            r#"Analyze this user message and conversation context, then return ONLY a valid JSON object (no markdown, no explanation):

Recent conversation:
{context}

Current message: "{message}"

Return this exact JSON structure:
{{
  "intent": "ticket_creation|billing_inquiry|technical_support|account_management|service_recommendation|general_question",
  "urgency": "low|medium|high|critical",
  "sentiment": "positive|neutral|negative|frustrated",
  "category": "General|Billing|Technical|Account|Security|Services",
  "requiresHumanSupport": true or false,
  "suggestedAction": "create_ticket|escalate|provide_info|recommend_service",
  "confidence": 0.0 to 1.0
}}"#
        );
        Ok(self
            .enrich("intent", prompt, GenerationConfig::new(0.3, 500), IntentAnalysis::default())
            .await)
    }

    #[instrument(skip(self, input))]
    pub async fn analyze_sentiment(&self, input: SentimentInput) -> AppResult<Enriched<SentimentAnalysis>> {
        let message = require_text("message", input.message.as_deref(), "Message is required")?;
        let prompt = format!(
            r#"Analyze the sentiment and emotion in this message:

"{message}"

Return ONLY valid JSON (no markdown):
{{
  "sentiment": "very_positive|positive|neutral|negative|very_negative",
  "emotion": "happy|frustrated|angry|confused|satisfied|worried",
  "isFrustrated": true or false,
  "needsEscalation": true or false,
  "urgencyScore": 0.0 to 1.0
}}"#
        );
        Ok(self
            .enrich("sentiment", prompt, GenerationConfig::new(0.2, 300), SentimentAnalysis::default())
            .await)
    }

    #[instrument(skip(self, input))]
    pub async fn recommend_services(
        &self,
        input: RecommendInput,
    ) -> AppResult<Enriched<ServiceRecommendations>> {
        let message = require_text("message", input.message.as_deref(), "Message is required")?;
        let plan = input.plan.as_deref().unwrap_or("Unknown");
        let services = if input.services.is_empty() {
            "None".to_string()
        } else {
            input.services.join(", ")
        };

        let prompt = format!(
            r#"Based on this user inquiry and their context, identify which IT/SaaS services they might need:

Available Services:
1. Cloud Hosting - Scalable cloud infrastructure
2. Security Solutions - Firewall, DDoS protection, threat detection
3. Database Management - MySQL, PostgreSQL, MongoDB hosting
4. Backup & Recovery - Automated backups and disaster recovery
5. API Management - API gateway and management tools
6. DevOps Tools - CI/CD pipelines, container orchestration
7. Monitoring & Analytics - Performance monitoring and insights
8. Email Services - Professional email hosting

User inquiry: "{message}"
User's current plan: {plan}
User's current services: {services}

Return ONLY valid JSON (no markdown):
{{
  "recommendations": [
    {{
      "service": "service name",
      "reason": "why this service is relevant",
      "priority": "high|medium|low",
      "estimatedMonthlyCost": number
    }}
  ],
  "summary": "brief explanation of recommendations"
}}"#
        );
        Ok(self
            .enrich(
                "recommendations",
                prompt,
                GenerationConfig::new(0.4, 800),
                ServiceRecommendations::default(),
            )
            .await)
    }

    #[instrument(skip(self, input))]
    pub async fn triage_ticket(&self, input: TriageInput) -> AppResult<Enriched<TicketTriage>> {
        let mut errors = FieldErrors::new();
        let title = errors.required("title", input.title.as_deref(), "Ticket title is required");
        let description = errors.required(
            "description",
            input.description.as_deref(),
            "Description is required",
        );
        errors.into_result()?;
        let (title, description) = (title.unwrap_or_default(), description.unwrap_or_default());

        let prompt = format!(
            r#"Analyze this support ticket and provide structured information:

Title: {title}
Description: {description}

Return ONLY valid JSON (no markdown):
{{
  "category": "Technical|Billing|Account|Security|General|Services",
  "priority": "Low|Medium|High|Critical",
  "estimatedResolutionTime": number (in hours),
  "requiredExpertise": ["skill1", "skill2"],
  "suggestedAssignee": "Frontend Team|Backend Team|DevOps|Security|Billing|General Support",
  "tags": ["tag1", "tag2"],
  "isCommonIssue": true or false,
  "automatedResponse": "initial helpful response if this is a common issue, or null"
}}"#
        );
        Ok(self
            .enrich("triage", prompt, GenerationConfig::new(0.3, 800), TicketTriage::default())
            .await)
    }

    #[instrument(skip(self, input), fields(history = input.conversation_history.len()))]
    pub async fn summarize(
        &self,
        input: SummarizeInput,
    ) -> AppResult<Enriched<Option<ConversationSummary>>> {
        if input.conversation_history.is_empty() {
            return Err(AppError::invalid(
                "conversationHistory",
                "Conversation history is required",
            ));
        }
        let conversation = transcript(&input.conversation_history);
        let prompt = format!(
            r#"Summarize this support conversation:

{conversation}

Return ONLY valid JSON (no markdown):
{{
  "summary": "brief summary of the conversation",
  "mainTopics": ["topic1", "topic2"],
  "userSentiment": "positive|neutral|negative",
  "issuesResolved": ["resolved issue 1"],
  "issuesUnresolved": ["unresolved issue 1"],
  "recommendedFollowUp": "suggested next steps"
}}"#
        );
        Ok(self
            .enrich("summary", prompt, GenerationConfig::new(0.3, 600), None)
            .await)
    }

    #[instrument(skip(self, input))]
    pub async fn automated_solution(&self, input: SolutionInput) -> AppResult<Enriched<AutomatedSolution>> {
        let issue = require_text("issue", input.issue.as_deref(), "Issue description is required")?;
        let prompt = format!(
            r#"Given this technical issue, provide a solution if it's a common problem:

Issue: "{issue}"

If this is a common, solvable issue, return:
{{
  "isSolvable": true,
  "solution": {{
    "steps": ["step 1", "step 2", "step 3"],
    "estimatedTime": "X minutes",
    "difficulty": "easy|moderate|advanced",
    "additionalResources": ["link or resource description"]
  }},
  "preventionTips": ["tip 1", "tip 2"]
}}

If it requires human support, return:
{{
  "isSolvable": false,
  "reason": "why human support is needed",
  "recommendedAction": "create_ticket"
}}

Return ONLY valid JSON (no markdown)."#
        );
        Ok(self
            .enrich("solution", prompt, GenerationConfig::new(0.4, 1000), AutomatedSolution::default())
            .await)
    }

    /// Single-turn JSON completion that degrades to `default` on any failure.
    async fn enrich<T: DeserializeOwned>(
        &self,
        kind: &'static str,
        prompt: String,
        generation: GenerationConfig,
        default: T,
    ) -> Enriched<T> {
        let request = CompletionRequest {
            contents: vec![ChatTurn::user(prompt)],
            generation,
            safety_filters: false,
        };

        let parsed = match self.completion.complete(request).await {
            Ok(Some(text)) => {
                serde_json::from_str::<T>(&strip_code_fences(&text)).map_err(|e| e.to_string())
            }
            Ok(None) => Err("empty completion".to_string()),
            Err(e) => Err(e.to_string()),
        };

        match parsed {
            Ok(value) => Enriched::fresh(value),
            Err(error) => {
                tracing::warn!(enrichment = kind, %error, "AI enrichment fell back to default");
                Enriched::fallback(default)
            }
        }
    }
}

fn require_text(field: &str, value: Option<&str>, message: &str) -> AppResult<String> {
    let mut errors = FieldErrors::new();
    let text = errors.required(field, value, message);
    errors.into_result()?;
    Ok(text.unwrap_or_default())
}
