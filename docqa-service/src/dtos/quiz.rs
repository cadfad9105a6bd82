use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMcqRequest {
    #[serde(default, alias = "session_id")]
    pub session_id: Option<String>,

    /// Number of questions; the configured default applies when absent.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub count: Option<u32>,

    /// Topic to narrow the quiz to. Blank means no narrowing.
    #[serde(default)]
    pub context: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_camel_case_and_optional_fields() {
        let request: GenerateMcqRequest =
            serde_json::from_value(json!({"sessionId": "s-1"})).unwrap();

        assert_eq!(request.session_id.as_deref(), Some("s-1"));
        assert!(request.count.is_none());
        assert!(request.context.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn zero_count_fails_validation() {
        let request: GenerateMcqRequest =
            serde_json::from_value(json!({"sessionId": "s-1", "count": 0})).unwrap();
        assert!(request.validate().is_err());
    }
}
