//! Post-response policy: failed-login and 404-scan heuristics.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::{Method, StatusCode};

use crate::detection::heuristics::{
    Threshold, EVENT_FAILED_LOGIN, EVENT_NOT_FOUND, REASON_BRUTE_FORCE, REASON_DIR_SCAN,
};
use crate::detection::tracker::TrackerStore;
use crate::store::{ActivityLog, BlockLedger};

/// Outcome of inspecting an origin response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseDecision {
    /// Hand the origin's response to the client unmodified.
    PassThrough,
    /// Replace the response with 403 and this message.
    Override(&'static str),
}

/// Runs on every response except bypassed dashboard routes.
pub struct ResponseGate {
    ledger: Arc<BlockLedger>,
    activity: Arc<ActivityLog>,
    trackers: Arc<TrackerStore>,
    failed_login: Threshold,
    not_found: Threshold,
    block_duration: Duration,
    login_path: String,
}

impl ResponseGate {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ledger: Arc<BlockLedger>,
        activity: Arc<ActivityLog>,
        trackers: Arc<TrackerStore>,
        failed_login: Threshold,
        not_found: Threshold,
        block_duration: Duration,
        login_path: String,
    ) -> Self {
        Self {
            ledger,
            activity,
            trackers,
            failed_login,
            not_found,
            block_duration,
            login_path,
        }
    }

    /// Decide whether the origin's response may pass to the client.
    ///
    /// The two checks are independent and run in order; a block from the
    /// first check stops processing.
    pub fn inspect(
        &self,
        identity: &str,
        method: &Method,
        path: &str,
        status: StatusCode,
        now: Instant,
    ) -> ResponseDecision {
        // 1. Brute force detection (failed logins)
        if path == self.login_path && method == Method::POST && status == StatusCode::UNAUTHORIZED {
            let count =
                self.trackers
                    .failed_login
                    .record_and_count(identity, now, self.failed_login.window);
            if self.failed_login.exceeded(count) {
                self.ledger
                    .block(identity, REASON_BRUTE_FORCE, self.block_duration);
                self.trackers.failed_login.reset(identity);
                return ResponseDecision::Override(
                    "Too many failed login attempts. Your IP is blocked.",
                );
            }
            self.activity.record(identity, EVENT_FAILED_LOGIN, path);
        }

        // 2. Directory scan detection (404s)
        if status == StatusCode::NOT_FOUND {
            let count = self
                .trackers
                .not_found
                .record_and_count(identity, now, self.not_found.window);
            if self.not_found.exceeded(count) {
                self.ledger
                    .block(identity, REASON_DIR_SCAN, self.block_duration);
                self.trackers.not_found.reset(identity);
                return ResponseDecision::Override("Too many 404s (Not Found). Your IP is blocked.");
            }
            self.activity.record(identity, EVENT_NOT_FOUND, path);
        }

        ResponseDecision::PassThrough
    }
}
