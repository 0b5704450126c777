// src/notifications.rs

use std::sync::Arc;

use axum::http::{HeaderMap, header};
use url::Url;

use crate::{
    config::Config,
    models::notification::{SubmissionInfo, UserInfo},
    utils::{
        html::escape_text,
        mail::{Email, Mailer},
    },
};

pub const POINTS_ASSIGNED_SUBJECT: &str = "[Kelvin] Obodování úlohy / solution scored";

/// The parts of the inbound request needed to build absolute links.
#[derive(Debug, Clone)]
pub struct RequestContext {
    origin: Url,
}

impl RequestContext {
    pub fn new(origin: Url) -> Self {
        Self { origin }
    }

    /// Origin of links for this request.
    ///
    /// The request `Host` is used only when it is in `allowed_hosts`, and the
    /// scheme comes from `X-Forwarded-Proto` only with `trust_forwarded_proto`.
    /// Anything else yields `public_base_url`.
    pub fn from_headers(headers: &HeaderMap, config: &Config) -> Self {
        let fallback = &config.public_base_url;

        let scheme = headers
            .get("x-forwarded-proto")
            .filter(|_| config.trust_forwarded_proto)
            .and_then(|value| value.to_str().ok())
            .filter(|proto| matches!(*proto, "http" | "https"))
            .unwrap_or(fallback.scheme());

        let origin = headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .filter(|host| !host.is_empty())
            .and_then(|host| Url::parse(&format!("{}://{}/", scheme, host)).ok())
            .filter(|url| is_allowed_origin(url, &config.allowed_hosts))
            .unwrap_or_else(|| {
                if headers.contains_key(header::HOST) && !config.allowed_hosts.is_empty() {
                    tracing::warn!("Request host not in ALLOWED_HOSTS, linking to {}", fallback);
                }
                fallback.clone()
            });

        Self { origin }
    }

    /// Absolute URL of the task detail page of `login`; segments are percent-encoded.
    pub fn task_detail_url(&self, assignment_id: i64, login: &str) -> Option<Url> {
        let mut url = self.origin.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .push("task")
            .push(&assignment_id.to_string())
            .push(login);
        Some(url)
    }
}

/// A bare `scheme://host[:port]/` whose host (with or without port) is allowed.
fn is_allowed_origin(url: &Url, allowed_hosts: &[String]) -> bool {
    if !url.username().is_empty() || url.password().is_some() || url.path() != "/" {
        return false;
    }
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    let with_port = url.port().map(|port| format!("{}:{}", host, port));

    allowed_hosts
        .iter()
        .any(|allowed| *allowed == host || Some(allowed) == with_port.as_ref())
}

/// Two decimals, then trailing zeros and a dangling point are dropped.
pub fn format_points(points: f64) -> String {
    format!("{:.2}", points)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Sends the "solution scored" email to students.
///
/// Delivery is fire-and-forget: failures are logged and never returned.
// TODO: route through a persistent queue with per-student debouncing so repeated regrading does not spam.
pub struct PointsAssignedNotifier {
    mailer: Arc<dyn Mailer>,
    from: String,
}

impl PointsAssignedNotifier {
    pub fn new(mailer: Arc<dyn Mailer>, from: impl Into<String>) -> Self {
        Self {
            mailer,
            from: from.into(),
        }
    }

    pub async fn send_points_assigned(
        &self,
        ctx: &RequestContext,
        teacher: &UserInfo,
        student: &UserInfo,
        submission: &SubmissionInfo,
        points: f64,
    ) {
        let Some(url) = ctx.task_detail_url(submission.assignment_id, &student.username)
        else {
            tracing::warn!(
                "Cannot build task link for submission {}, origin is not a base URL",
                submission.id
            );
            return;
        };

        let email = Email {
            from: self.from.clone(),
            to: vec![student.email.clone()],
            subject: POINTS_ASSIGNED_SUBJECT.to_string(),
            html: render_points_assigned(teacher, student, submission, points, &url),
        };

        match self.mailer.send(&email).await {
            Ok(()) => tracing::info!(
                "Sent points notification for submission {} to {}",
                submission.id,
                student.username
            ),
            Err(e) => tracing::warn!(
                "Failed to send points notification for submission {}: {}",
                submission.id,
                e
            ),
        }
    }
}

/// Renders the bilingual body of the "points assigned" message.
pub fn render_points_assigned(
    teacher: &UserInfo,
    student: &UserInfo,
    submission: &SubmissionInfo,
    points: f64,
    url: &Url,
) -> String {
    let teacher_name = escape_text(teacher.display_name());
    let student_name = escape_text(student.display_name());
    let task = escape_text(&submission.task_name);
    let points = format_points(points);
    let max_points = submission
        .max_points
        .map(format_points)
        .unwrap_or_else(|| "-".to_string());
    let href = url.as_str().replace('"', "%22");

    format!(
        r#"<p>Dobrý den {student_name},</p>
<p>vyučující {teacher_name} ohodnotil(a) vaše řešení úlohy <strong>{task}</strong>: <strong>{points}</strong> / {max_points} bodů.</p>
<p>Hello {student_name},</p>
<p>teacher {teacher_name} scored your solution of <strong>{task}</strong>: <strong>{points}</strong> / {max_points} points.</p>
<p><a href="{href}">{href}</a></p>
"#
    )
}
