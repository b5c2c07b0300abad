//! Shared building blocks used by every crate in the workspace: logging
//! bootstrap, runtime environment checks, and small response types.

pub mod types;
pub mod utils;
pub mod env;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_serializes_status() {
        let h = types::Health::ok();
        let json = serde_json::to_value(&h).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[test]
    fn error_body_omits_absent_field() {
        let body = types::ErrorBody::new("not found");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "not found");
        assert!(json.get("field").is_none());
        assert!(json.get("reason").is_none());
    }
}
