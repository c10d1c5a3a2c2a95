//! Prompt templates. Everything here is pure string building.

/// How much the model should lean on retrieved documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// Answer only from the documents.
    Strict,
    /// Prefer the documents, fall back to general supermarket knowledge.
    Hybrid,
    /// No documents and no history; used for the context-free retry.
    Bare,
}

#[derive(Debug, Clone)]
pub struct PromptComposer {
    store_name: String,
}

impl PromptComposer {
    pub fn new(store_name: impl Into<String>) -> Self {
        Self {
            store_name: store_name.into(),
        }
    }

    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    /// Build the prompt text. Identical inputs give byte-identical output.
    pub fn compose(&self, question: &str, history: &str, retrieved: &str, mode: PromptMode) -> String {
        match mode {
            PromptMode::Bare => self.bare(question),
            PromptMode::Strict => self.grounded(question, history, retrieved, STRICT_SECTION, STRICT_RULES),
            PromptMode::Hybrid => self.grounded(question, history, retrieved, HYBRID_SECTION, HYBRID_RULES),
        }
    }

    fn bare(&self, question: &str) -> String {
        format!(
            "Eres un asistente de {}. Responde de manera amigable y profesional.\n\n\
             Pregunta: {question}\n\n\
             Respuesta breve y útil:",
            self.store_name
        )
    }

    fn grounded(&self, question: &str, history: &str, retrieved: &str, section: &str, rules: &str) -> String {
        let history_block = if history.trim().is_empty() {
            String::new()
        } else {
            format!("Historial de conversación:\n{history}\n")
        };
        format!(
            "Eres un asistente de {store}, una cadena de supermercados. \
             Tu trabajo es ayudar a los clientes respondiendo preguntas sobre:\n\
             - Productos disponibles, precios y stock\n\
             - Ubicación de productos dentro de la tienda (góndolas y secciones)\n\
             - Información de sucursales (horarios, direcciones)\n\n\
             {section}\n{retrieved}\n\n\
             {history_block}\n\
             Pregunta actual del cliente: {question}\n\n\
             Instrucciones:\n{rules}\n\n\
             Respuesta:",
            store = self.store_name,
        )
    }
}

const STRICT_SECTION: &str = "Contexto relevante de documentos:";
const HYBRID_SECTION: &str = "Información de documentos:";

const STRICT_RULES: &str = "\
- Responde de manera amigable y profesional
- Mantén coherencia con la conversación anterior si existe
- Si la información no está disponible en el contexto, dilo claramente
- Para preguntas sobre precios, incluye el símbolo $ y el valor exacto
- Para ubicaciones, menciona la góndola o sección específica
- Para horarios, menciona días y horas completas
- Si el cliente hace referencia a algo mencionado anteriormente, úsalo como contexto
- Si no puedes responder completamente, sugiere contactar con el personal de la tienda";

const HYBRID_RULES: &str = "\
- Responde de manera amigable y profesional
- Mantén coherencia con la conversación anterior si existe
- Si la información específica no está disponible en los documentos, usa tu conocimiento general sobre supermercados
- Para preguntas sobre precios, incluye el símbolo $ y proporciona rangos realistas
- Para ubicaciones, menciona secciones típicas de supermercado
- Si el cliente hace referencia a algo mencionado anteriormente, úsalo como contexto
- Si no puedes responder completamente, sugiere contactar con el personal de la tienda";
