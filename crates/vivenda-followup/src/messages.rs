//! Message composition: AI generation with deterministic fallbacks.
//!
//! A lead whose stage is due always gets a send attempt; if the provider is
//! down or returns garbage, the fixed Portuguese template for that stage
//! goes out instead.

use vivenda_ai::ProviderClient;
use vivenda_db::LeadRow;

use crate::nurturing::TOPICS;
use crate::reengagement;

const SYSTEM_PROMPT: &str = "Você é um assistente de uma imobiliária brasileira. Escreva mensagens \
     curtas de WhatsApp (no máximo duas frases), cordiais e sem pressão de \
     venda agressiva. Responda apenas com o texto da mensagem.";

const STAGE_TONES: [&str; 4] = [
    "um lembrete leve e simpático",
    "uma oferta de ajuda destacando opções de imóveis",
    "um toque de urgência educado sobre a procura pelos imóveis",
    "uma despedida cordial deixando a porta aberta",
];

/// Copy for a re-engagement stage, generated or templated.
pub async fn reengagement_message(ai: &ProviderClient, lead: &LeadRow, stage: i32) -> String {
    #[allow(clippy::cast_sign_loss)]
    let tone = STAGE_TONES[(stage.clamp(0, 3)) as usize];
    let name = lead.name.as_deref().unwrap_or("o cliente");
    let interest = lead
        .property_type
        .as_deref()
        .map_or_else(String::new, |t| format!(" interessado em {t}"));
    let instruction = format!(
        "Escreva {tone} para {name}{interest}, que parou de responder no chat do site. \
         Estágio {stage_n} de 4 do follow-up.",
        stage_n = stage + 1
    );

    match ai.generate(SYSTEM_PROMPT, &instruction).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(lead_id = lead.id, stage, error = %e, "scheduler: generation failed, using template");
            reengagement::fallback_message(stage, lead.name.as_deref())
        }
    }
}

/// Copy for a nurturing topic, generated or templated.
pub async fn nurturing_message(ai: &ProviderClient, lead: &LeadRow, topic_index: usize) -> String {
    let (topic, template) = TOPICS[topic_index.min(TOPICS.len() - 1)];
    let name = lead.name.as_deref().unwrap_or("o cliente");
    let instruction = format!(
        "Escreva uma mensagem educativa sobre o tema '{topic}' para {name}, um lead \
         frio que está em um fluxo de nutrição de longo prazo. Base: {template}"
    );

    match ai.generate(SYSTEM_PROMPT, &instruction).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(lead_id = lead.id, topic, error = %e, "scheduler: generation failed, using template");
            template.to_owned()
        }
    }
}
