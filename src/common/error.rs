use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

// Nosso tipo de erro central, com `thiserror` para melhor ergonomia.
// Erros de linha NÃO passam por aqui: eles são acumulados no resumo do lote
// (veja models::imports::RowError). AppError cobre só o que rejeita a
// requisição inteira.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Arquivo vazio ou ilegível")]
    EmptyFile,

    #[error("Planilha inválida: {0}")]
    SpreadsheetParse(String),

    #[error("XML inválido: {0}")]
    XmlParse(String),

    #[error("Tipo de arquivo não reconhecido pelos cabeçalhos")]
    UnrecognizedFileType,

    #[error("Coluna obrigatória ausente: {0}")]
    MissingRequiredColumn(&'static str),

    // Guarda de arquivo duplicado: devolvemos a referência da importação
    // anterior para o operador.
    #[error("Arquivo já importado")]
    DuplicateFile {
        import_id: Uuid,
        imported_at: Option<DateTime<Utc>>,
    },

    #[error("Violação de ordem de upload: {0}")]
    UploadOrderViolation(&'static str),

    #[error("Nenhum registro encontrado no arquivo")]
    NoRecordsFound,

    #[error("Importação não encontrada")]
    ImportNotFound,

    #[error("Importação já processada")]
    ImportAlreadyProcessed,

    #[error("Log de upload não encontrado (ou sem erros)")]
    UploadLogNotFound,

    #[error("Cliente não encontrado")]
    CustomerNotFound,

    #[error("Fatura não encontrada")]
    InvoiceNotFound,

    #[error("Solicitação de vínculo não encontrada")]
    LinkRequestNotFound,

    // Regra de negócio da quitação: devolvemos os números atuais para o
    // chamador poder se corrigir.
    #[error("Pagamento excede o valor em aberto da fatura")]
    SettlementExceedsDue {
        remaining_due: Decimal,
        total_paid: Decimal,
        invoice_total: Decimal,
    },

    #[error("Pagamento idêntico já registrado para esta fatura")]
    DuplicateSettlement { existing_payment_id: Uuid },

    #[error("Valor do pagamento deve ser maior que zero")]
    InvalidSettlementAmount,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                (
                    StatusCode::BAD_REQUEST,
                    json!({ "error": "Um ou mais campos são inválidos.", "details": details }),
                )
            }

            AppError::DuplicateFile { import_id, imported_at } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "Este arquivo já foi importado.",
                    "importId": import_id,
                    "importedAt": imported_at,
                }),
            ),

            AppError::UploadOrderViolation(details) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Violação de ordem de upload.", "details": details }),
            ),

            AppError::SettlementExceedsDue { remaining_due, total_paid, invoice_total } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "O pagamento excede o valor em aberto da fatura.",
                    "remainingDue": remaining_due,
                    "totalPaid": total_paid,
                    "invoiceTotal": invoice_total,
                }),
            ),

            AppError::DuplicateSettlement { existing_payment_id } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Já existe um pagamento com o mesmo valor e data para esta fatura.",
                    "existingPaymentId": existing_payment_id,
                }),
            ),

            AppError::EmptyFile
            | AppError::SpreadsheetParse(_)
            | AppError::XmlParse(_)
            | AppError::UnrecognizedFileType
            | AppError::MissingRequiredColumn(_)
            | AppError::NoRecordsFound
            | AppError::ImportAlreadyProcessed
            | AppError::InvalidSettlementAmount => {
                (StatusCode::BAD_REQUEST, json!({ "error": self.to_string() }))
            }

            AppError::ImportNotFound
            | AppError::UploadLogNotFound
            | AppError::CustomerNotFound
            | AppError::InvoiceNotFound
            | AppError::LinkRequestNotFound => {
                (StatusCode::NOT_FOUND, json!({ "error": self.to_string() }))
            }

            // DatabaseError e InternalServerError viram 500. O `tracing` loga
            // a mensagem detalhada; o cliente recebe o genérico.
            e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Ocorreu um erro inesperado." }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
