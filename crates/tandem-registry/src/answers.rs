//! Answers to the fixed relationship prompts.

use chrono::Utc;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use tandem_shared::{HeartCode, QuestionAnswer, UserId};

use crate::error::{RegistryError, Result};
use crate::registry::HeartRegistry;
use crate::store::RegistryStore;

impl<S: RegistryStore> HeartRegistry<S> {
    pub async fn submit_answer(
        &self,
        code: &HeartCode,
        question_id: &str,
        question: &str,
        user_id: &UserId,
        user_name: &str,
        answer: &str,
    ) -> Result<QuestionAnswer> {
        if user_id.is_empty() {
            return Err(RegistryError::Unauthenticated);
        }
        self.ensure_paired(code).await?;

        let answer = QuestionAnswer {
            id: Uuid::new_v4(),
            heart_code: code.clone(),
            question_id: question_id.to_string(),
            question: question.to_string(),
            user_id: user_id.clone(),
            user_name: user_name.to_string(),
            answer: answer.to_string(),
            created_at: Utc::now(),
        };

        self.store().add_answer(answer.clone()).await?;
        info!(code = %code, question = question_id, "answer submitted");
        Ok(answer)
    }

    pub async fn answers_for(&self, code: &HeartCode) -> Result<Vec<QuestionAnswer>> {
        self.store().answers_for(code).await
    }

    pub async fn watch_answers(
        &self,
        code: &HeartCode,
    ) -> Result<watch::Receiver<Vec<QuestionAnswer>>> {
        self.store().watch_answers(code).await
    }
}
