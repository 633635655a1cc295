use crate::{config::AppConfig, db::OrmConn};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(orm: OrmConn, config: AppConfig) -> Self {
        Self { orm, config }
    }
}
