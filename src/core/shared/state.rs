use std::sync::Arc;

use crate::auth::password_codes::CodeSender;
use crate::classifier::Classifier;
use crate::core::config::AppConfig;
use crate::core::shared::utils::DbPool;
use crate::security::JwtManager;
use crate::tickets::service::TicketService;
use crate::tickets::storage::PgStore;

pub struct AppState {
    pub conn: DbPool,
    pub config: AppConfig,
    pub jwt: JwtManager,
    pub classifier: Arc<dyn Classifier>,
    pub store: PgStore,
    pub tickets: TicketService,
    pub code_sender: Arc<dyn CodeSender>,
}
