use std::sync::Arc;

use crate::config::Config;
use crate::rate_limit::ResetRateLimiter;
use crate::reset::ResetService;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub reset: ResetService,
    pub reset_limiter: ResetRateLimiter,
}
