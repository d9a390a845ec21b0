//! Dashboard handlers and activity-bar scaling.

use axum::{extract::State, response::Response, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::http::handlers::views::NodeSummary;
use crate::http::response::redirect;
use crate::http::server::AppState;
use crate::registry::{Node, NodeLog, RegistrySnapshot};
use crate::security::CurrentUser;

/// Widths of the two segments of a node's activity bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UserActivity {
    /// Log entries authored by the user.
    pub ua_count: usize,
    /// Width of the user's segment.
    pub ua: f64,
    /// Width of everyone else's segment.
    pub non_ua: f64,
}

#[derive(Debug, Serialize)]
pub struct DashboardNode {
    #[serde(flatten)]
    pub summary: NodeSummary,
    pub user_activity: UserActivity,
}

#[derive(Debug, Serialize)]
pub struct DashboardNodes {
    pub nodes: Vec<DashboardNode>,
    pub rescale_ratio: f64,
}

/// Largest log count among the nodes `user_id` may view, 0 when none.
pub fn rescale_ratio(nodes: &[&Node], user_id: Option<&str>) -> f64 {
    nodes
        .iter()
        .filter(|n| n.can_view(user_id))
        .map(|n| n.logs.len())
        .max()
        .map(|max| max as f64)
        .unwrap_or(0.0)
}

/// Scale a node's activity bar against `rescale_ratio`.
pub fn user_activity(
    snapshot: &RegistrySnapshot,
    node: &Node,
    user_id: &str,
    rescale_ratio: f64,
    max_width: f64,
) -> UserActivity {
    let total = node.logs.len();
    let ua_count = snapshot
        .node_logs(node)
        .filter(|log| log.user == user_id)
        .count();
    let non_ua_count = total.saturating_sub(ua_count);

    if rescale_ratio <= 0.0 {
        return UserActivity {
            ua_count,
            ua: 0.0,
            non_ua: 0.0,
        };
    }
    UserActivity {
        ua_count,
        ua: ua_count as f64 / rescale_ratio * max_width,
        non_ua: non_ua_count as f64 / rescale_ratio * max_width,
    }
}

/// Projects the user contributes to, excluding deleted nodes and registrations.
pub fn contributed_projects<'a>(snapshot: &'a RegistrySnapshot, user_id: &str) -> Vec<&'a Node> {
    let mut nodes: Vec<&Node> = snapshot
        .nodes()
        .filter(|n| {
            n.category == "project"
                && !n.is_deleted
                && !n.is_registration
                && n.is_contributor(user_id)
        })
        .collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));
    nodes
}

/// `/dashboard/`.
pub async fn dashboard(CurrentUser(_user): CurrentUser) -> Json<Value> {
    Json(json!({}))
}

/// `/api/v1/dashboard/get_nodes/`.
pub async fn dashboard_nodes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Json<DashboardNodes> {
    let snapshot = state.registry.snapshot();
    let max_width = state.config.dashboard.user_activity_max_width;

    let nodes = contributed_projects(&snapshot, &user.user_id);
    let ratio = rescale_ratio(&nodes, Some(&user.user_id));
    let rendered = nodes
        .iter()
        .map(|node| DashboardNode {
            summary: NodeSummary::from(*node),
            user_activity: user_activity(&snapshot, node, &user.user_id, ratio, max_width),
        })
        .collect();

    Json(DashboardNodes {
        nodes: rendered,
        rescale_ratio: ratio,
    })
}

fn serialize_log(snapshot: &RegistrySnapshot, log: &NodeLog) -> Value {
    json!({
        "id": log.id,
        "action": log.action,
        "node": log.node_id,
        "user": {
            "id": log.user,
            "fullname": snapshot.user(&log.user).map(|u| u.fullname.as_str()),
        },
        "date": log.date.to_rfc3339(),
    })
}

/// `/api/v1/watched/logs/`.
pub async fn watched_logs(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Json<Value> {
    let snapshot = state.registry.snapshot();
    let logs: Vec<Value> = snapshot
        .user(&user.user_id)
        .map(|profile| {
            profile
                .watched_logs
                .iter()
                .filter_map(|id| snapshot.log(id))
                .map(|log| serialize_log(&snapshot, log))
                .collect()
        })
        .unwrap_or_default();

    Json(json!({ "logs": logs }))
}

/// `/reproducibility/`.
pub async fn reproducibility(State(state): State<AppState>) -> Response {
    redirect(
        state.redirect_status(),
        &state.config.dashboard.reproducibility_target,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Entity, RedirectMode};
    use chrono::{TimeZone, Utc};

    fn node(id: &str, logs: &[&str], contributors: &[&str]) -> Node {
        Node {
            id: id.to_string(),
            title: id.to_string(),
            category: "project".to_string(),
            is_public: false,
            is_deleted: false,
            is_registration: false,
            contributors: contributors.iter().map(|c| c.to_string()).collect(),
            logs: logs.iter().map(|l| l.to_string()).collect(),
            redirect_mode: RedirectMode::Proxy,
        }
    }

    fn log(id: &str, node_id: &str, user: &str) -> NodeLog {
        NodeLog {
            id: id.to_string(),
            node_id: node_id.to_string(),
            action: "project_created".to_string(),
            user: user.to_string(),
            date: Utc.with_ymd_and_hms(2014, 3, 1, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_rescale_ratio() {
        let a = node("a", &["l1", "l2", "l3"], &["u1"]);
        let b = node("b", &["l4"], &["u1"]);
        let hidden = node("c", &["x1", "x2", "x3", "x4", "x5"], &["u2"]);

        assert_eq!(rescale_ratio(&[&a, &b, &hidden], Some("u1")), 3.0);
        assert_eq!(rescale_ratio(&[&hidden], Some("u1")), 0.0);
        assert_eq!(rescale_ratio(&[], Some("u1")), 0.0);
    }

    #[test]
    fn test_user_activity_widths() {
        let mut snap = RegistrySnapshot::new();
        let a = node("a", &["l1", "l2", "l3", "l4"], &["u1", "u2"]);
        snap.insert_log(log("l1", "a", "u1"));
        snap.insert_log(log("l2", "a", "u2"));
        snap.insert_log(log("l3", "a", "u1"));
        snap.insert_log(log("l4", "a", "u2"));
        snap.insert_entity(Entity::Node(a.clone()));

        let activity = user_activity(&snap, &a, "u1", 4.0, 100.0);
        assert_eq!(activity.ua_count, 2);
        assert_eq!(activity.ua, 50.0);
        assert_eq!(activity.non_ua, 50.0);
    }

    #[test]
    fn test_zero_ratio_yields_zero_widths() {
        let snap = RegistrySnapshot::new();
        let a = node("a", &[], &["u1"]);
        let activity = user_activity(&snap, &a, "u1", 0.0, 325.0);
        assert_eq!(activity.ua, 0.0);
        assert_eq!(activity.non_ua, 0.0);
    }

    #[test]
    fn test_contributed_projects_filters() {
        let mut snap = RegistrySnapshot::new();
        let mut deleted = node("d", &[], &["u1"]);
        deleted.is_deleted = true;
        let mut registration = node("r", &[], &["u1"]);
        registration.is_registration = true;
        let mut component = node("c", &[], &["u1"]);
        component.category = "data".to_string();
        for n in [
            node("p2", &[], &["u1"]),
            node("p1", &[], &["u1"]),
            node("other", &[], &["u2"]),
            deleted,
            registration,
            component,
        ] {
            snap.insert_entity(Entity::Node(n));
        }

        let ids: Vec<&str> = contributed_projects(&snap, "u1")
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }
}
