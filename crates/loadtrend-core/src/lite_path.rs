//! Expansion of `A>B>C` lite paths into report queries.
//!
//! A lite path names a statistic either under the virtual users tree
//! (`UserPath>Actions>Login`, one `statistic-item` per segment) or under a
//! monitored host (`host/Counter/Name`, where the text before the first `/`
//! is the host name and the whole path is the counter name).

use crate::graph::StatisticKind;

const VIRTUAL_USER_ROOT: &str = "/report/virtual-users";
const MONITOR_ROOT: &str = "/report/monitors/monitored-host[@name='";

/// Query addressing a virtual-user statistic.
#[must_use]
pub fn virtual_user_query(lite_path: &str, statistic: StatisticKind) -> String {
    let trimmed = lite_path.strip_prefix('/').unwrap_or(lite_path);
    let mut query = String::from(VIRTUAL_USER_ROOT);
    for segment in trimmed.split('>') {
        query.push_str("/statistic-item[@name='");
        query.push_str(segment);
        query.push_str("']");
    }
    query.push_str(statistic.query_suffix());
    query
}

/// Query addressing a monitor counter, or `None` when the path names no host.
#[must_use]
pub fn monitor_query(lite_path: &str, statistic: StatisticKind) -> Option<String> {
    let trimmed = lite_path.strip_prefix('/').unwrap_or(lite_path);
    let (host, _) = trimmed.split_once('/')?;
    Some(format!(
        "{MONITOR_ROOT}{host}']/monitor/counters/statistic-item[@name='{lite_path}']{}",
        statistic.query_suffix()
    ))
}

/// All queries for a lite path, in the order they are tried.
#[must_use]
pub fn expand(lite_path: &str, statistic: StatisticKind) -> Vec<String> {
    let mut queries = vec![virtual_user_query(lite_path, statistic)];
    queries.extend(monitor_query(lite_path, statistic));
    queries
}
