use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config, notifications::PointsAssignedNotifier, repository::ExamRepository,
};

#[derive(Clone)]
pub struct AppState {
    pub exams: Arc<dyn ExamRepository>,
    pub notifier: Arc<PointsAssignedNotifier>,
    pub config: Config,
}

impl FromRef<AppState> for Arc<dyn ExamRepository> {
    fn from_ref(state: &AppState) -> Self {
        state.exams.clone()
    }
}

impl FromRef<AppState> for Arc<PointsAssignedNotifier> {
    fn from_ref(state: &AppState) -> Self {
        state.notifier.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
