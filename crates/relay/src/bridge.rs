//! Orchestrator bridge: one bounded agent run per answered event.

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use zaprelay_config::{AgentConfig, DispatchConfig};
use zaprelay_core::error::OrchestratorError;
use zaprelay_core::orchestrator::{Orchestrator, OrchestratorRequest};
use zaprelay_core::turn::ConversationTurn;

/// Built-in persona when `agent.system_prompt` is not set.
pub fn default_persona(name: &str) -> String {
    format!(
        "Você é {name} e responde mensagens de WhatsApp em nome próprio, para contatos \
         individuais e grupos. Seja direto e breve, em frases curtas, sem emojis e sem \
         formalidades. Não faça perguntas de volta e não ofereça ajuda extra. Nunca diga \
         que é uma IA, um robô ou uma automação. Quando precisar de dados atuais, como o \
         clima, ou de uma ação, como enviar uma mensagem, use as ferramentas disponíveis \
         sem pedir permissão. Mensagens podem chegar como texto, transcrição de áudio ou \
         descrição de imagem; trate todas como mensagens comuns, comentando imagens como \
         se você as tivesse visto. O histórico abaixo traz remetente, horário e tipo de \
         cada mensagem: use-o como contexto e o horário quando for relevante."
    )
}

pub struct OrchestratorBridge {
    orchestrator: Arc<dyn Orchestrator>,
    system_prompt: String,
    timeout: Duration,
    failure_text: String,
}

impl OrchestratorBridge {
    pub fn new(
        orchestrator: Arc<dyn Orchestrator>,
        system_prompt: impl Into<String>,
        timeout: Duration,
        failure_text: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator,
            system_prompt: system_prompt.into(),
            timeout,
            failure_text: failure_text.into(),
        }
    }

    pub fn from_config(
        orchestrator: Arc<dyn Orchestrator>,
        agent: &AgentConfig,
        dispatch: &DispatchConfig,
    ) -> Self {
        let prompt = agent
            .system_prompt
            .clone()
            .unwrap_or_else(|| default_persona(&agent.persona_name));
        Self::new(
            orchestrator,
            prompt,
            Duration::from_secs(agent.timeout_secs),
            &dispatch.failure_text,
        )
    }

    /// Persona, then one line per turn, then the closing instruction.
    pub fn directive(&self, sender_name: &str, turns: &[ConversationTurn]) -> String {
        let history = turns
            .iter()
            .map(ConversationTurn::context_line)
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "{}\n\n{history}\n\nAgora responda apenas à última mensagem que chegou de {sender_name}:",
            self.system_prompt
        )
    }

    /// Run the agent once. Any failure is logged and replaced by the fallback text.
    pub async fn invoke(&self, user_text: &str, sender_name: &str, turns: &[ConversationTurn]) -> String {
        match self.try_invoke(user_text, sender_name, turns).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(sender = %sender_name, error = %e, "Agent run failed, sending fallback reply");
                self.failure_text.clone()
            }
        }
    }

    async fn try_invoke(
        &self,
        user_text: &str,
        sender_name: &str,
        turns: &[ConversationTurn],
    ) -> Result<String, OrchestratorError> {
        let request = OrchestratorRequest {
            instructions: self.directive(sender_name, turns),
            message: user_text.to_string(),
            sender_name: sender_name.to_string(),
        };

        let started = std::time::Instant::now();
        let reply = tokio::time::timeout(self.timeout, self.orchestrator.orchestrate(request))
            .await
            .map_err(|_| OrchestratorError::Timeout(self.timeout.as_secs()))??;

        info!(
            sender = %sender_name,
            duration_ms = started.elapsed().as_millis() as u64,
            "Agent replied"
        );
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockOrchestrator;
    use chrono::NaiveDateTime;
    use zaprelay_core::turn::TIMESTAMP_FORMAT;

    const FALLBACK: &str = "Não consegui responder agora, tente novamente mais tarde.";

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
    }

    fn turns() -> Vec<ConversationTurn> {
        vec![
            ConversationTurn::user("vai chover?", "Maria", "chat", ts("2025-05-01 10:00:00")),
            ConversationTurn::assistant("Não.", "Arthur", ts("2025-05-01 10:00:00")),
            ConversationTurn::user("e amanhã?", "Maria", "ptt", ts("2025-05-01 10:05:00")),
        ]
    }

    fn bridge(orchestrator: Arc<MockOrchestrator>, timeout: Duration) -> OrchestratorBridge {
        OrchestratorBridge::new(orchestrator, "Você é Arthur.", timeout, FALLBACK)
    }

    #[test]
    fn directive_layout() {
        let b = bridge(Arc::new(MockOrchestrator::replying("ok")), Duration::from_secs(1));
        assert_eq!(
            b.directive("Maria", &turns()),
            "Você é Arthur.\n\n\
             User (Maria, 2025-05-01 10:00:00, chat): vai chover?\n\
             Assistant (Arthur, 2025-05-01 10:00:00, chat): Não.\n\
             User (Maria, 2025-05-01 10:05:00, ptt): e amanhã?\n\n\
             Agora responda apenas à última mensagem que chegou de Maria:"
        );
    }

    #[tokio::test]
    async fn passes_message_and_returns_reply() {
        let orchestrator = Arc::new(MockOrchestrator::replying("Amanhã sol."));
        let reply = bridge(orchestrator.clone(), Duration::from_secs(5))
            .invoke("e amanhã?", "Maria", &turns())
            .await;
        assert_eq!(reply, "Amanhã sol.");

        let requests = orchestrator.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].message, "e amanhã?");
        assert_eq!(requests[0].sender_name, "Maria");
        assert!(requests[0].instructions.starts_with("Você é Arthur."));
    }

    #[tokio::test]
    async fn failure_substitutes_fallback() {
        let orchestrator = Arc::new(MockOrchestrator::failing());
        let reply = bridge(orchestrator.clone(), Duration::from_secs(5))
            .invoke("oi", "Maria", &[])
            .await;
        assert_eq!(reply, FALLBACK);
        // no retry
        assert_eq!(orchestrator.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_substitutes_fallback() {
        let mut slow = MockOrchestrator::replying("tarde demais");
        slow.delay = Some(Duration::from_secs(300));
        let reply = bridge(Arc::new(slow), Duration::from_secs(120))
            .invoke("oi", "Maria", &[])
            .await;
        assert_eq!(reply, FALLBACK);
    }

    #[test]
    fn config_prompt_overrides_persona() {
        let agent = AgentConfig {
            system_prompt: Some("Seja breve.".into()),
            ..AgentConfig::default()
        };
        let b = OrchestratorBridge::from_config(
            Arc::new(MockOrchestrator::replying("ok")),
            &agent,
            &DispatchConfig::default(),
        );
        assert!(b.directive("Ana", &[]).starts_with("Seja breve.\n\n"));

        let b = OrchestratorBridge::from_config(
            Arc::new(MockOrchestrator::replying("ok")),
            &AgentConfig::default(),
            &DispatchConfig::default(),
        );
        assert!(b.directive("Ana", &[]).starts_with("Você é Arthur"));
        assert_eq!(b.timeout, Duration::from_secs(120));
    }
}
