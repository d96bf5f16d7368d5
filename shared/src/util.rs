/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a stable resource id for courses, modules and lessons.
///
/// Ids are UUID v4 strings and are never reused, so a deleted module's id
/// can't collide with a later one on a stale client mirror.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
